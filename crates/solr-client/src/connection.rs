//! A single engine connection bound to the thread that created it.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use std::thread::{self, ThreadId};

use tracing::debug;
use ulid::Ulid;

use crate::error::ConnectionError;
use crate::transport::{SolrRequest, SolrResponse, Transport};

/// Transport handle owned by exactly one thread.
///
/// Handles are created by [`crate::ConnectionManager::get_connection`]. Sending
/// from any thread other than the owner, or after the handle was closed,
/// fails with a [`ConnectionError`].
pub struct SolrConnection {
    id: Ulid,
    owner: ThreadId,
    transport: Mutex<Box<dyn Transport>>,
    closed: AtomicBool,
    requests: AtomicU64,
}

impl SolrConnection {
    /// Create a handle owned by the calling thread.
    pub(crate) fn new(transport: Box<dyn Transport>) -> Self {
        Self {
            id: Ulid::new(),
            owner: thread::current().id(),
            transport: Mutex::new(transport),
            closed: AtomicBool::new(false),
            requests: AtomicU64::new(0),
        }
    }

    pub fn id(&self) -> Ulid {
        self.id
    }

    pub fn owner(&self) -> ThreadId {
        self.owner
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Number of requests sent through this handle.
    pub fn request_count(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    /// Send one request and block until the engine answers.
    pub fn send(&self, request: &SolrRequest) -> Result<SolrResponse, ConnectionError> {
        if self.is_closed() {
            return Err(ConnectionError::Closed(self.id.to_string()));
        }
        let caller = thread::current().id();
        if caller != self.owner {
            return Err(ConnectionError::ForeignThread {
                id: self.id.to_string(),
                owner: format!("{:?}", self.owner),
                caller: format!("{:?}", caller),
            });
        }

        let mut transport = self
            .transport
            .lock()
            .map_err(|e| ConnectionError::Transport(e.to_string()))?;
        self.requests.fetch_add(1, Ordering::Relaxed);
        debug!(connection = %self.id, method = %request.method, path = %request.path, "Engine request");
        transport.send(request)
    }

    /// Replace the underlying channel, returning the previous one.
    ///
    /// Lets an existing handle be pointed at another channel, such as a
    /// scripted mock, without changing its identity.
    pub fn swap_transport(
        &self,
        transport: Box<dyn Transport>,
    ) -> Result<Box<dyn Transport>, ConnectionError> {
        let mut current = self
            .transport
            .lock()
            .map_err(|e| ConnectionError::Transport(e.to_string()))?;
        Ok(std::mem::replace(&mut *current, transport))
    }

    /// Mark the handle closed and release the channel. Idempotent.
    pub(crate) fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Ok(mut transport) = self.transport.lock() {
            transport.close();
        }
        debug!(connection = %self.id, requests = self.request_count(), "Connection closed");
    }
}

impl std::fmt::Debug for SolrConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SolrConnection")
            .field("id", &self.id)
            .field("owner", &self.owner)
            .field("closed", &self.is_closed())
            .field("requests", &self.request_count())
            .finish()
    }
}
