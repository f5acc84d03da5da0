//! Per-entity sync results.

use serde::Serialize;

use crate::error::SyncError;
use crate::reconciler::UpsertOutcome;
use crate::registry::ProvisionWarning;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EntityOutcome {
    Synced {
        calendar_id: String,
        #[serde(flatten)]
        upsert: UpsertOutcome,
        #[serde(skip_serializing_if = "Option::is_none")]
        color_id: Option<String>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        warnings: Vec<ProvisionWarning>,
    },
    /// Nothing to do for this entity.
    Skipped { reason: String },
    /// The entity should have synced but did not.
    Failed { error: String },
}

impl EntityOutcome {
    /// Classify an error from the pipeline.
    pub fn from_error(error: &SyncError) -> Self {
        if error.is_skip() {
            EntityOutcome::Skipped {
                reason: error.to_string(),
            }
        } else {
            EntityOutcome::Failed {
                error: error.to_string(),
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityReport {
    pub entity_type: String,
    pub entity_id: String,
    #[serde(flatten)]
    pub outcome: EntityOutcome,
}

/// A query that could not be run during a bulk sync.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedSet {
    pub entity_type: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SyncReport {
    pub entities: Vec<EntityReport>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failed_sets: Vec<FailedSet>,
}

impl SyncReport {
    pub fn push(&mut self, entity_type: &str, entity_id: &str, outcome: EntityOutcome) {
        self.entities.push(EntityReport {
            entity_type: entity_type.to_string(),
            entity_id: entity_id.to_string(),
            outcome,
        });
    }

    pub fn synced(&self) -> usize {
        self.count(|o| matches!(o, EntityOutcome::Synced { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, EntityOutcome::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, EntityOutcome::Failed { .. }))
    }

    /// Whether anything failed, counting failed bulk queries.
    pub fn has_failures(&self) -> bool {
        self.failed() > 0 || !self.failed_sets.is_empty()
    }

    fn count(&self, predicate: impl Fn(&EntityOutcome) -> bool) -> usize {
        self.entities.iter().filter(|e| predicate(&e.outcome)).count()
    }
}
