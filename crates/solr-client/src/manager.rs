//! Connection manager: per-thread handles and the shared schema cache.
//!
//! Every thread gets its own [`SolrConnection`], created on first use and kept
//! until that thread calls [`ConnectionManager::close_connection`] or exits.
//! The schema is shared by all threads and fetched at most once per manager
//! lifetime.

use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock, Weak};
use std::thread::{self, ThreadId};

use tracing::{debug, info};

use solr_types::Settings;

use crate::connection::SolrConnection;
use crate::error::{ConnectionError, SchemaError};
use crate::schema::Schema;
use crate::transport::{HttpTransportFactory, SolrRequest, TransportFactory};

type Registry = Mutex<HashMap<ThreadId, Arc<SolrConnection>>>;

thread_local! {
    static SLOTS: RefCell<Vec<ThreadSlot>> = const { RefCell::new(Vec::new()) };
}

/// The calling thread's claim on a handle registered with one manager.
///
/// Dropped by `close_connection` or when the thread exits; either way the
/// handle is closed and its registry entry removed.
struct ThreadSlot {
    registry: Weak<Registry>,
    thread: ThreadId,
    conn: Arc<SolrConnection>,
}

impl ThreadSlot {
    fn belongs_to(&self, registry: &Arc<Registry>) -> bool {
        Weak::as_ptr(&self.registry) == Arc::as_ptr(registry)
    }

    fn is_stale(&self) -> bool {
        self.conn.is_closed() || self.registry.strong_count() == 0
    }
}

impl Drop for ThreadSlot {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            let mut map = registry.lock().unwrap_or_else(|e| e.into_inner());
            if map
                .get(&self.thread)
                .is_some_and(|c| Arc::ptr_eq(c, &self.conn))
            {
                map.remove(&self.thread);
            }
        }
        self.conn.close();
    }
}

/// Owns one engine connection per thread and the cached schema.
pub struct ConnectionManager {
    settings: Settings,
    active: AtomicBool,
    factory: Arc<dyn TransportFactory>,
    connections: Arc<Registry>,
    schema: RwLock<Option<Arc<Schema>>>,
}

impl ConnectionManager {
    /// Create a manager talking HTTP to the engine described by `settings`.
    pub fn new(settings: Settings) -> Result<Self, ConnectionError> {
        settings
            .validate()
            .map_err(|e| ConnectionError::Config(e.to_string()))?;
        let factory = Arc::new(HttpTransportFactory::from_settings(&settings));
        Ok(Self::with_factory(settings, factory))
    }

    /// Create a manager with a custom transport factory.
    pub fn with_factory(settings: Settings, factory: Arc<dyn TransportFactory>) -> Self {
        let active = settings.active;
        Self {
            settings,
            active: AtomicBool::new(active),
            factory,
            connections: Arc::new(Mutex::new(HashMap::new())),
            schema: RwLock::new(None),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Switch engine access on or off for every thread.
    pub fn set_host(&self, active: bool) {
        let previous = self.active.swap(active, Ordering::AcqRel);
        if previous != active {
            info!(active, "Indexing engine access toggled");
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// The calling thread's connection, created on first use.
    ///
    /// Returns `Ok(None)` while the manager is inactive.
    pub fn get_connection(&self) -> Result<Option<Arc<SolrConnection>>, ConnectionError> {
        if !self.is_active() {
            debug!("Indexing inactive, no connection handed out");
            return Ok(None);
        }

        let thread = thread::current().id();
        let conn = {
            let mut connections = self.lock_connections();
            if let Some(conn) = connections.get(&thread) {
                return Ok(Some(Arc::clone(conn)));
            }
            let conn = Arc::new(SolrConnection::new(self.factory.create()?));
            connections.insert(thread, Arc::clone(&conn));
            conn
        };
        debug!(connection = %conn.id(), ?thread, "Created engine connection");

        // Registered outside the map lock: dropping stale slots takes it.
        self.track(thread, &conn);
        Ok(Some(conn))
    }

    /// Like [`get_connection`](Self::get_connection), but inactivity is an error.
    pub fn connection(&self) -> Result<Arc<SolrConnection>, ConnectionError> {
        self.get_connection()?.ok_or(ConnectionError::Inactive)
    }

    /// The engine schema, fetched over the calling thread's connection on
    /// first use and cached for every thread afterwards.
    ///
    /// Returns `Ok(None)` when nothing is cached and the manager is inactive.
    pub fn get_schema(&self) -> Result<Option<Arc<Schema>>, SchemaError> {
        if let Some(schema) = self.cached_schema() {
            return Ok(Some(schema));
        }
        if !self.is_active() {
            return Ok(None);
        }

        // The write lock is held across the fetch, so concurrent first
        // callers (and cached_schema readers) wait for one GET, bounded by
        // the transport timeout.
        let mut slot = self.schema.write().unwrap_or_else(|e| e.into_inner());
        // Another thread may have filled the cache while we waited.
        if let Some(schema) = slot.as_ref() {
            return Ok(Some(Arc::clone(schema)));
        }

        let conn = self.connection()?;
        let response = conn.send(&SolrRequest::get(self.settings.schema_path()))?;
        if !response.is_success() {
            return Err(SchemaError::Status(response.status));
        }

        let schema = Arc::new(Schema::parse(&response.body)?);
        info!(
            fields = schema.len(),
            unique_key = schema.unique_key().unwrap_or("-"),
            "Loaded engine schema"
        );
        *slot = Some(Arc::clone(&schema));
        Ok(Some(schema))
    }

    /// Schema already in the cache, without any network access.
    pub fn cached_schema(&self) -> Option<Arc<Schema>> {
        self.schema
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .map(Arc::clone)
    }

    /// Close and forget the calling thread's connection. Idempotent.
    pub fn close_connection(&self) {
        let released: Vec<ThreadSlot> = SLOTS
            .try_with(|slots| {
                let mut slots = slots.borrow_mut();
                let (mine, others) = slots.drain(..).partition(|s| s.belongs_to(&self.connections));
                *slots = others;
                mine
            })
            .unwrap_or_default();
        drop(released);

        let thread = thread::current().id();
        let removed = self.lock_connections().remove(&thread);
        if let Some(conn) = removed {
            conn.close();
        }
    }

    /// Close every thread's connection and drop the cached schema.
    pub fn reset(&self) {
        let drained: Vec<Arc<SolrConnection>> =
            self.lock_connections().drain().map(|(_, c)| c).collect();
        for conn in &drained {
            conn.close();
        }
        *self.schema.write().unwrap_or_else(|e| e.into_inner()) = None;
        info!(closed = drained.len(), "Connection manager reset");
    }

    /// Number of threads currently holding a connection.
    pub fn connection_count(&self) -> usize {
        self.lock_connections().len()
    }

    fn track(&self, thread: ThreadId, conn: &Arc<SolrConnection>) {
        let slot = ThreadSlot {
            registry: Arc::downgrade(&self.connections),
            thread,
            conn: Arc::clone(conn),
        };
        // Fails only while the thread is tearing down its locals; the handle
        // then stays registered until close_connection, reset or drop.
        let _ = SLOTS.try_with(move |slots| {
            let stale: Vec<ThreadSlot> = {
                let mut slots = slots.borrow_mut();
                let (stale, live) = slots.drain(..).partition(ThreadSlot::is_stale);
                *slots = live;
                slots.push(slot);
                stale
            };
            drop(stale);
        });
    }

    // The map holds complete entries only, so a panic elsewhere cannot leave
    // it half-updated; recover the guard instead of propagating poison.
    fn lock_connections(&self) -> MutexGuard<'_, HashMap<ThreadId, Arc<SolrConnection>>> {
        self.connections.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        for conn in self.lock_connections().values() {
            conn.close();
        }
    }
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("active", &self.is_active())
            .field("base_url", &self.settings.base_url())
            .field("connections", &self.connection_count())
            .field("schema_cached", &self.cached_schema().is_some())
            .finish()
    }
}
