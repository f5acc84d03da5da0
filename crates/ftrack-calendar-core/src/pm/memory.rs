//! In-memory PM session for offline replay and tests.
//!
//! Records use the ftrack wire shape. Filters are evaluated against
//! `project.id` and an optional `ancestors: [{"id": ..}]` list; the project
//! counts as an ancestor.

use std::collections::HashSet;

use serde_json::Value;

use super::query::{Filter, Query};
use super::schema::EntitySchema;
use super::PmSession;
use crate::error::{Result, SyncError};

#[derive(Debug, Default)]
pub struct InMemoryPmSession {
    records: Vec<Value>,
    schemas: Vec<EntitySchema>,
    failing_schemas: HashSet<String>,
}

impl InMemoryPmSession {
    pub fn new(records: Vec<Value>) -> Self {
        Self {
            records,
            schemas: default_schemas(),
            failing_schemas: HashSet::new(),
        }
    }

    /// Load records from a JSON array, or from `{"records": [...], "schemas": [...]}`.
    pub fn from_json(raw: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(raw)?;
        match value {
            Value::Array(records) => Ok(Self::new(records)),
            Value::Object(mut obj) => {
                let records = match obj.remove("records") {
                    Some(Value::Array(records)) => records,
                    _ => Vec::new(),
                };
                let mut session = Self::new(records);
                if let Some(schemas) = obj.remove("schemas") {
                    session.schemas = serde_json::from_value(schemas)?;
                }
                Ok(session)
            }
            _ => Err(SyncError::Mapping(
                "offline records must be a JSON array or object".into(),
            )),
        }
    }

    pub fn with_schemas(mut self, schemas: Vec<EntitySchema>) -> Self {
        self.schemas = schemas;
        self
    }

    /// Make every query against `schema` fail with a remote error.
    pub fn fail_queries_for(mut self, schema: &str) -> Self {
        self.failing_schemas.insert(schema.to_string());
        self
    }

    pub fn push(&mut self, record: Value) {
        self.records.push(record);
    }

    fn matches(record: &Value, query: &Query) -> bool {
        if record["__entity_type__"].as_str() != Some(query.schema.as_str()) {
            return false;
        }
        match &query.filter {
            Filter::IdIs(id) => record["id"].as_str() == Some(id.as_str()),
            Filter::ProjectIn(ids) => record["project"]["id"]
                .as_str()
                .is_some_and(|project| ids.iter().any(|id| id == project)),
            Filter::AncestorIn(ids) => ancestor_ids(record).any(|a| ids.iter().any(|id| id == a)),
        }
    }
}

fn ancestor_ids(record: &Value) -> impl Iterator<Item = &str> {
    record["ancestors"]
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|a| a["id"].as_str())
        .chain(record["project"]["id"].as_str())
}

/// Schemas mirroring a stock ftrack server for the calendarable types.
fn default_schemas() -> Vec<EntitySchema> {
    vec![
        EntitySchema::plain("Task"),
        EntitySchema::plain("Milestone"),
        EntitySchema::plain("CalendarEvent"),
    ]
}

impl PmSession for InMemoryPmSession {
    fn schemas(&self) -> Result<Vec<EntitySchema>> {
        Ok(self.schemas.clone())
    }

    fn query(&self, query: &Query) -> Result<Vec<Value>> {
        if self.failing_schemas.contains(&query.schema) {
            return Err(SyncError::remote(
                "ftrack",
                format!("query against {} failed", query.schema),
            ));
        }
        Ok(self
            .records
            .iter()
            .filter(|record| Self::matches(record, query))
            .cloned()
            .collect())
    }
}
