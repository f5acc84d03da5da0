//! Production-tracking (ftrack) side: entity model, schema resolution,
//! queries and the session port.

pub mod codec;
pub mod entity;
pub mod ftrack;
pub mod memory;
pub mod query;
pub mod schema;

pub use codec::decode_entity;
pub use entity::{CalendarEventEntity, EntityKind, PmEntity, Project, Resource, TaskEntity};
pub use ftrack::FtrackSession;
pub use memory::InMemoryPmSession;
pub use query::{Filter, Query};
pub use schema::{resolve_schema_id, EntitySchema};

use crate::error::Result;

/// Read access to the PM system.
///
/// Records are returned in their raw JSON shape; decoding happens per
/// entity so one malformed record cannot fail a whole query.
pub trait PmSession {
    /// The schema list used to translate notification type names.
    fn schemas(&self) -> Result<Vec<EntitySchema>>;

    /// Run a query and return the matching records.
    fn query(&self, query: &Query) -> Result<Vec<serde_json::Value>>;

    /// Fetch a single record, `None` when it does not exist.
    fn get(&self, schema_id: &str, entity_id: &str) -> Result<Option<serde_json::Value>> {
        Ok(self
            .query(&Query::by_id(schema_id, entity_id))?
            .into_iter()
            .next())
    }
}
