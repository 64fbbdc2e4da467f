//! Request dispatch onto the platform.

use crate::error::{ApiError, ApiResult};
use crate::protocol::{Request, Response};
use loamdb_core::{IndexStatus, Platform, Record};
use serde_json::Value;
use std::sync::Arc;

/// Dispatches client requests onto a shared [`Platform`].
///
/// Writes are validated and enqueued, never applied inline; the platform's
/// write consumer applies them on its own thread.
#[derive(Clone)]
pub struct RequestHandler {
    platform: Arc<Platform>,
}

impl RequestHandler {
    /// Creates a handler over a platform.
    #[must_use]
    pub fn new(platform: Arc<Platform>) -> Self {
        Self { platform }
    }

    /// Returns the underlying platform.
    #[must_use]
    pub fn platform(&self) -> &Arc<Platform> {
        &self.platform
    }

    /// Handles one request, folding errors into an error response.
    #[must_use]
    pub fn handle(&self, request: Request) -> Response {
        let result = self.dispatch(request);
        match result {
            Ok(response) => response,
            Err(err) => {
                if err.is_server_error() {
                    tracing::error!(%err, "request failed");
                } else {
                    tracing::debug!(%err, "request rejected");
                }
                Response::from_error(&err)
            }
        }
    }

    fn dispatch(&self, request: Request) -> ApiResult<Response> {
        match request {
            Request::CreateWorkspace { name } => {
                let ws = self.platform.create_workspace(&name)?;
                Ok(Response::Workspace {
                    id: ws.id.as_u32(),
                    name: ws.name,
                })
            }
            Request::CreateCollection { workspace, name } => {
                let col = self.platform.create_collection(&workspace, &name)?;
                Ok(Response::Collection {
                    id: col.id.as_u32(),
                    name: col.name,
                })
            }
            Request::CreateIndex {
                workspace,
                collection,
                index_name,
                fields,
                index_type,
                data_type,
                is_unique,
            } => {
                let def = self.platform.create_index(
                    &workspace,
                    &collection,
                    &index_name,
                    fields,
                    index_type,
                    data_type,
                    is_unique,
                )?;
                Ok(Response::Index {
                    id: def.id.as_u32(),
                    name: def.name,
                    status: def.status,
                })
            }
            Request::SetIndexStatus { index_id, status } => {
                if status == IndexStatus::Building {
                    return Err(ApiError::InvalidRequest(
                        "an index cannot be put back into building".to_string(),
                    ));
                }
                self.platform
                    .set_index_status(loamdb_core::IndexId::new(index_id), status)?;
                Ok(Response::Ok)
            }
            Request::Write {
                workspace,
                collection,
                record,
            } => self.write(&workspace, &collection, record, false),
            Request::ForceWrite {
                workspace,
                collection,
                record,
            } => self.write(&workspace, &collection, record, true),
            Request::Read {
                workspace,
                collection,
                key,
            } => {
                let record = self.platform.read(&workspace, &collection, &key)?;
                Ok(Response::Record {
                    record: Value::Object(record.fields().clone()),
                })
            }
            Request::FindByIndex {
                workspace,
                collection,
                index,
                value,
            } => {
                let records = self
                    .platform
                    .find_by_index(&workspace, &collection, &index, &value)?;
                Ok(Response::Records {
                    records: records
                        .into_iter()
                        .map(|r| Value::Object(r.fields().clone()))
                        .collect(),
                })
            }
            Request::ListCollections { workspace } => {
                let collections = self.platform.list_collections(&workspace)?;
                Ok(Response::Collections {
                    collections: collections.into_iter().map(|c| c.name).collect(),
                })
            }
        }
    }

    fn write(
        &self,
        workspace: &str,
        collection: &str,
        record: Value,
        force: bool,
    ) -> ApiResult<Response> {
        let record = Record::from_value(record)
            .map_err(|err| ApiError::InvalidRequest(err.to_string()))?;
        let key = record.key().map(str::to_string)?;
        let info = self.platform.get_collection(workspace, collection)?;
        if force {
            self.platform.write_direct(info.collection.id, &record)?;
        } else {
            self.platform.enqueue_write(info.collection.id, record)?;
        }
        Ok(Response::Accepted { key })
    }
}
