//! Queue processor: the public index/reindex/unindex/commit surface.
//!
//! The processor holds nothing but a handle to the [`ConnectionManager`].
//! Every network operation is one round trip over the calling thread's
//! connection, or a no-op while the manager is inactive. The schema is
//! fetched through the manager on first use and then served from its cache.

use std::sync::Arc;

use tracing::{debug, info};

use solr_client::{
    parse_update_response, ConnectionManager, EngineStatus, Schema, SolrConnection, SolrRequest,
};
use solr_types::{ContentObject, DEFAULT_ACCESS_CONTROL_FIELD};

use crate::error::{IndexError, MarshalError, Operation};
use crate::prepare::{DataPreparer, PreparedData};
use crate::request::{add_request, commit_request, delete_request, optimize_request, CommitOptions};

const INDEX_TARGET: &str = "index";

/// Builds and sends update requests for content objects.
///
/// Cheap to clone; clones share the same manager.
#[derive(Debug, Clone, Default)]
pub struct IndexQueueProcessor {
    manager: Option<Arc<ConnectionManager>>,
}

impl IndexQueueProcessor {
    pub fn new(manager: Arc<ConnectionManager>) -> Self {
        Self {
            manager: Some(manager),
        }
    }

    /// A processor with no manager. Only [`prepare_data`](Self::prepare_data)
    /// works; network operations fail with [`IndexError::Unbound`].
    pub fn detached() -> Self {
        Self::default()
    }

    pub fn manager(&self) -> Option<&Arc<ConnectionManager>> {
        self.manager.as_ref()
    }

    /// Marshal `object` into field values without touching the network.
    ///
    /// Uses the manager's cached schema if one is loaded.
    pub fn prepare_data<O: ContentObject + ?Sized>(
        &self,
        object: &O,
        attributes: Option<&[&str]>,
    ) -> Result<PreparedData, MarshalError> {
        let schema = self.manager.as_ref().and_then(|m| m.cached_schema());
        let acl = self.access_control_fields();
        DataPreparer::new(schema.as_deref(), &acl).prepare(object, attributes)
    }

    /// Add `object` to the index, or replace its stored version.
    ///
    /// With `attributes`, only those fields (plus the unique key) are sent.
    pub fn index<O: ContentObject + ?Sized>(
        &self,
        object: &O,
        attributes: Option<&[&str]>,
    ) -> Result<(), IndexError> {
        self.add(Operation::Index, object, attributes)
    }

    /// Same request as [`index`](Self::index).
    pub fn reindex<O: ContentObject + ?Sized>(
        &self,
        object: &O,
        attributes: Option<&[&str]>,
    ) -> Result<(), IndexError> {
        self.add(Operation::Reindex, object, attributes)
    }

    /// Delete `object` from the index by its unique key.
    pub fn unindex<O: ContentObject + ?Sized>(&self, object: &O) -> Result<(), IndexError> {
        let operation = Operation::Unindex;
        let manager = self.bound(operation)?;
        let Some(conn) = self.open(manager, operation, "document")? else {
            return Ok(());
        };
        let schema = self.schema(manager, operation)?;
        let key = unique_key(manager, schema.as_deref());
        let acl = self.access_control_fields();
        let preparer = DataPreparer::new(schema.as_deref(), &acl);
        let id = document_id(&preparer, object, operation, &key)?;
        let target = format!("document {}", id);

        self.send(manager, &conn, operation, &target, delete_request(&id))?;
        debug!(doc_id = %id, "Unindexed document");
        Ok(())
    }

    /// Make pending adds and deletes visible to searchers.
    pub fn commit(&self) -> Result<(), IndexError> {
        self.directive(Operation::Commit, commit_request(CommitOptions::default()))
    }

    /// Commit and merge index segments.
    pub fn optimize(&self) -> Result<(), IndexError> {
        self.directive(Operation::Optimize, optimize_request(CommitOptions::default()))
    }

    fn add<O: ContentObject + ?Sized>(
        &self,
        operation: Operation,
        object: &O,
        attributes: Option<&[&str]>,
    ) -> Result<(), IndexError> {
        let manager = self.bound(operation)?;
        let Some(conn) = self.open(manager, operation, "document")? else {
            return Ok(());
        };
        let schema = self.schema(manager, operation)?;
        let key = unique_key(manager, schema.as_deref());
        let acl = self.access_control_fields();
        let preparer = DataPreparer::new(schema.as_deref(), &acl);
        let id = document_id(&preparer, object, operation, &key)?;
        let target = format!("document {}", id);

        let mut data = preparer
            .prepare(object, attributes)
            .map_err(|source| IndexError::Marshal {
                operation,
                target: target.clone(),
                source,
            })?;
        if !data.contains(&key) {
            data.prepend(key.clone(), vec![id.clone()]);
        }

        self.send(manager, &conn, operation, &target, add_request(&data))?;
        debug!(doc_id = %id, fields = data.len(), %operation, "Indexed document");
        Ok(())
    }

    fn directive(&self, operation: Operation, body: String) -> Result<(), IndexError> {
        let manager = self.bound(operation)?;
        let Some(conn) = self.open(manager, operation, INDEX_TARGET)? else {
            return Ok(());
        };
        let status = self.send(manager, &conn, operation, INDEX_TARGET, body)?;
        info!(%operation, qtime = ?status.qtime, "Index directive accepted");
        Ok(())
    }

    fn bound(&self, operation: Operation) -> Result<&Arc<ConnectionManager>, IndexError> {
        self.manager
            .as_ref()
            .ok_or(IndexError::Unbound { operation })
    }

    fn open(
        &self,
        manager: &ConnectionManager,
        operation: Operation,
        target: &str,
    ) -> Result<Option<Arc<SolrConnection>>, IndexError> {
        let conn = manager
            .get_connection()
            .map_err(|source| IndexError::Connection {
                operation,
                target: target.to_string(),
                source,
            })?;
        if conn.is_none() {
            debug!(%operation, "Indexing inactive, skipping");
        }
        Ok(conn)
    }

    fn schema(
        &self,
        manager: &ConnectionManager,
        operation: Operation,
    ) -> Result<Option<Arc<Schema>>, IndexError> {
        manager.get_schema().map_err(|source| IndexError::Schema {
            operation,
            target: "document".to_string(),
            source,
        })
    }

    fn send(
        &self,
        manager: &ConnectionManager,
        conn: &SolrConnection,
        operation: Operation,
        target: &str,
        body: String,
    ) -> Result<EngineStatus, IndexError> {
        let request = SolrRequest::post_xml(manager.settings().update_path(), body);
        let response = conn
            .send(&request)
            .map_err(|source| IndexError::Connection {
                operation,
                target: target.to_string(),
                source,
            })?;
        parse_update_response(&response).map_err(|source| IndexError::Response {
            operation,
            target: target.to_string(),
            source,
        })
    }

    fn access_control_fields(&self) -> Vec<String> {
        match &self.manager {
            Some(m) => m.settings().access_control_fields.clone(),
            None => vec![DEFAULT_ACCESS_CONTROL_FIELD.to_string()],
        }
    }
}

fn unique_key(manager: &ConnectionManager, schema: Option<&Schema>) -> String {
    schema
        .and_then(Schema::unique_key)
        .unwrap_or(manager.settings().unique_key_fallback.as_str())
        .to_string()
}

/// The rendered identifier of `object`.
fn document_id<O: ContentObject + ?Sized>(
    preparer: &DataPreparer<'_>,
    object: &O,
    operation: Operation,
    key: &str,
) -> Result<String, IndexError> {
    let missing = || IndexError::MissingKey {
        operation,
        key: key.to_string(),
    };
    let value = object.attribute(key).ok_or_else(missing)?;
    let rendered = preparer
        .render(key, &value)
        .map_err(|source| IndexError::Marshal {
            operation,
            target: "document".to_string(),
            source,
        })?;
    rendered.into_iter().next().ok_or_else(missing)
}
