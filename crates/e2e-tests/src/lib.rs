//! End-to-end test infrastructure for solr-sync.
//!
//! Provides a shared TestHarness wiring a connection manager, a queue
//! processor and scripted transports, plus content fixtures.

use std::sync::Arc;

use chrono::{FixedOffset, TimeZone};

use solr_client::mock::{fake, update_success, MockTransportFactory, RequestLog};
use solr_client::{ConnectionManager, SolrResponse};
use solr_indexing::IndexQueueProcessor;
use solr_types::{Document, Settings};

/// Engine schema used by every scenario.
pub const SCHEMA_XML: &str = include_str!("../data/schema.xml");

/// Shared test harness for E2E tests.
pub struct TestHarness {
    pub manager: Arc<ConnectionManager>,
    pub processor: IndexQueueProcessor,
    pub factory: Arc<MockTransportFactory>,
}

impl TestHarness {
    /// Harness with an active manager.
    pub fn new() -> Self {
        Self::with_settings(Settings {
            active: true,
            ..Settings::default()
        })
    }

    /// Harness whose manager starts inactive.
    pub fn inactive() -> Self {
        Self::with_settings(Settings::default())
    }

    pub fn with_settings(settings: Settings) -> Self {
        let factory = Arc::new(MockTransportFactory::new());
        let manager = Arc::new(ConnectionManager::with_factory(settings, factory.clone()));
        let processor = IndexQueueProcessor::new(Arc::clone(&manager));
        Self {
            manager,
            processor,
            factory,
        }
    }

    /// Script responses onto the calling thread's connection.
    pub fn script(&self, responses: Vec<SolrResponse>) -> RequestLog {
        let conn = self
            .manager
            .connection()
            .expect("Failed to open test connection");
        fake(&conn, responses).expect("Failed to install mock transport")
    }

    /// Script the schema fetch followed by `updates` successful updates.
    pub fn script_with_schema(&self, updates: usize) -> RequestLog {
        let mut responses = vec![schema_response()];
        responses.extend((0..updates).map(|_| update_success()));
        self.script(responses)
    }

    /// Load the schema into the manager's cache through a scripted fetch.
    pub fn load_schema(&self) {
        let log = self.script(vec![schema_response()]);
        self.manager
            .get_schema()
            .expect("Failed to load test schema");
        assert_eq!(log.len(), 1);
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

pub fn schema_response() -> SolrResponse {
    SolrResponse::ok(SCHEMA_XML)
}

/// The canonical "python test doc" content object.
pub fn test_document() -> Document {
    Document::new()
        .with("id", "500")
        .with("name", "python test doc")
}

/// A fully populated product document.
pub fn product_document(id: &str) -> Document {
    let berlin = FixedOffset::east_opt(2 * 3600).expect("valid offset");
    let timestamp = berlin
        .with_ymd_and_hms(1972, 5, 11, 5, 45, 0)
        .single()
        .expect("valid timestamp");

    Document::new()
        .with("id", id)
        .with("name", "foo")
        .with("price", 42.0)
        .with("popularity", 3i64)
        .with("inStock", true)
        .with("cat", vec!["electronics", "memory"])
        .with("timestamp", timestamp)
        .with("allowedRolesAndUsers", vec!["user:test_user_1_", "Manager"])
}

/// Build a [`Document`] from a JSON object literal.
pub fn json_document(value: serde_json::Value) -> Document {
    Document::from_json(&value).expect("Fixture is not a JSON object")
}
