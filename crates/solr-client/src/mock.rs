//! Scripted transport for tests and dry runs.
//!
//! A [`MockTransport`] answers requests from a queue of canned responses and
//! records every request it serves. A request arriving with nothing left in
//! the queue is an error, so an idle connection stays provably idle.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::connection::SolrConnection;
use crate::error::ConnectionError;
use crate::transport::{SolrRequest, SolrResponse, Transport, TransportFactory};

/// Typical body of a successful update response.
pub const UPDATE_SUCCESS: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<response>\n<lst name=\"responseHeader\"><int name=\"status\">0</int><int name=\"QTime\">4</int></lst>\n</response>\n";

/// HTTP 200 carrying [`UPDATE_SUCCESS`].
pub fn update_success() -> SolrResponse {
    SolrResponse::ok(UPDATE_SUCCESS)
}

/// Shared record of the requests a mock has served, oldest first.
#[derive(Debug, Clone, Default)]
pub struct RequestLog {
    inner: Arc<Mutex<VecDeque<SolrRequest>>>,
}

impl RequestLog {
    fn push(&self, request: SolrRequest) {
        if let Ok(mut log) = self.inner.lock() {
            log.push_back(request);
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|log| log.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove and return the oldest recorded request.
    pub fn pop(&self) -> Option<SolrRequest> {
        self.inner.lock().ok().and_then(|mut log| log.pop_front())
    }

    /// Snapshot of every recorded request.
    pub fn requests(&self) -> Vec<SolrRequest> {
        self.inner
            .lock()
            .map(|log| log.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// All recorded requests rendered and concatenated.
    pub fn text(&self) -> String {
        self.requests()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Transport answering from a fixed script of responses.
#[derive(Debug, Default)]
pub struct MockTransport {
    responses: VecDeque<SolrResponse>,
    log: RequestLog,
}

impl MockTransport {
    pub fn new(responses: Vec<SolrResponse>) -> Self {
        Self {
            responses: responses.into(),
            log: RequestLog::default(),
        }
    }

    /// A mock that fails any request.
    pub fn unscripted() -> Self {
        Self::default()
    }

    /// Handle on the log of served requests.
    pub fn log(&self) -> RequestLog {
        self.log.clone()
    }
}

impl Transport for MockTransport {
    fn send(&mut self, request: &SolrRequest) -> Result<SolrResponse, ConnectionError> {
        let response = self
            .responses
            .pop_front()
            .ok_or_else(|| ConnectionError::Unexpected(format!("{} {}", request.method, request.path)))?;
        self.log.push(request.clone());
        Ok(response)
    }
}

/// Script `responses` onto an existing connection and return its request log.
pub fn fake(conn: &SolrConnection, responses: Vec<SolrResponse>) -> Result<RequestLog, ConnectionError> {
    let mock = MockTransport::new(responses);
    let log = mock.log();
    conn.swap_transport(Box::new(mock))?;
    Ok(log)
}

/// Factory handing out unscripted mocks; counts how many it created.
#[derive(Debug, Default)]
pub struct MockTransportFactory {
    created: AtomicUsize,
}

impl MockTransportFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

impl TransportFactory for MockTransportFactory {
    fn create(&self) -> Result<Box<dyn Transport>, ConnectionError> {
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockTransport::unscripted()))
    }
}
