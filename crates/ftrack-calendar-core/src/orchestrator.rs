//! Sync entry points.
//!
//! Both entry points run every entity through the same pipeline:
//!
//! 1. Resolve the project color against the live palette (cosmetic, never fatal)
//! 2. Map the entity to an event
//! 3. Ensure the target calendar exists
//! 4. Create or update the event
//!
//! Each entity ends up in the report as synced, skipped or failed. No error
//! escapes a batch.

use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};

use crate::calendar::CalendarApi;
use crate::color::resolve_color;
use crate::config::CalendarConfig;
use crate::error::{Result, SyncError};
use crate::hook::EntityRef;
use crate::mapper;
use crate::pm::{decode_entity, resolve_schema_id, EntityKind, EntitySchema, PmEntity, PmSession, Query};
use crate::reconciler::Reconciler;
use crate::registry::CalendarRegistry;
use crate::report::{EntityOutcome, FailedSet, SyncReport};

pub struct SyncOrchestrator<'a> {
    pm: &'a dyn PmSession,
    calendar: &'a dyn CalendarApi,
    settings: &'a CalendarConfig,
}

impl<'a> SyncOrchestrator<'a> {
    pub fn new(
        pm: &'a dyn PmSession,
        calendar: &'a dyn CalendarApi,
        settings: &'a CalendarConfig,
    ) -> Self {
        Self {
            pm,
            calendar,
            settings,
        }
    }

    /// Handle an update notification.
    #[instrument(skip_all, fields(entities = entities.len()))]
    pub fn on_entity_changed(&self, entities: &[EntityRef]) -> SyncReport {
        info!("received update notification");
        let mut report = SyncReport::default();
        // Fetched on the first calendarable entity, then reused for the batch.
        let mut schemas: Option<std::result::Result<Vec<EntitySchema>, String>> = None;

        for entity in entities {
            if !entity.is_calendarable() {
                debug!(entity_type = %entity.entity_type, entity_id = %entity.entity_id, "passing on entity");
                report.push(
                    &entity.entity_type,
                    &entity.entity_id,
                    EntityOutcome::Skipped {
                        reason: format!("'{}' notifications are not synced", entity.entity_type),
                    },
                );
                continue;
            }

            let fetched = schemas.get_or_insert_with(|| {
                self.pm.schemas().map_err(|e| {
                    error!(error = %e, "failed to fetch ftrack schemas");
                    e.to_string()
                })
            });
            let outcome = match fetched {
                Ok(schemas) => self.outcome(
                    &entity.entity_type,
                    &entity.entity_id,
                    self.changed_entity(entity, schemas),
                ),
                Err(message) => EntityOutcome::Failed {
                    error: message.clone(),
                },
            };
            report.push(&entity.entity_type, &entity.entity_id, outcome);
        }

        info!(
            synced = report.synced(),
            skipped = report.skipped(),
            failed = report.failed(),
            "update notification handled"
        );
        report
    }

    /// Sync every calendarable entity under the selected nodes.
    ///
    /// The three query sets are independent: a set whose query fails is
    /// recorded in [`SyncReport::failed_sets`] and the others still run.
    #[instrument(skip_all, fields(selection = selection.len()))]
    pub fn on_bulk_sync_requested(&self, selection: &[String]) -> SyncReport {
        info!("received bulk sync request");
        let mut report = SyncReport::default();
        if selection.is_empty() {
            warn!("bulk sync requested with an empty selection");
            return report;
        }

        for (kind, query) in Query::bulk_sync_sets(selection) {
            let records = match self.pm.query(&query) {
                Ok(records) => records,
                Err(e) => {
                    error!(entity_type = %kind, error = %e, "error querying entity set, skipping it");
                    report.failed_sets.push(FailedSet {
                        entity_type: kind.as_str().to_string(),
                        error: e.to_string(),
                    });
                    continue;
                }
            };

            debug!(entity_type = %kind, count = records.len(), "processing entity set");
            for record in &records {
                let entity_id = record["id"].as_str().unwrap_or_default();
                let result = decode_entity(record).and_then(|entity| self.sync_entity(&entity));
                let outcome = self.outcome(kind.as_str(), entity_id, result);
                report.push(kind.as_str(), entity_id, outcome);
            }
        }

        info!(
            synced = report.synced(),
            skipped = report.skipped(),
            failed = report.failed(),
            failed_sets = report.failed_sets.len(),
            "bulk sync finished"
        );
        report
    }

    /// Run the pipeline for an already-decoded entity.
    pub fn sync_entity(&self, entity: &PmEntity) -> Result<EntityOutcome> {
        debug!(entity_type = %entity.kind(), entity_id = entity.id(), name = entity.name(), "putting entity on calendar");

        let color_id = self.project_color(entity);
        let event = mapper::map(entity, color_id.as_deref())?;

        let calendar = CalendarRegistry::new(self.calendar, self.settings).ensure(&self.settings.name)?;
        let upsert = Reconciler::new(self.calendar).upsert(&calendar.id, &event)?;

        Ok(EntityOutcome::Synced {
            calendar_id: calendar.id,
            upsert,
            color_id: event.color_id,
            warnings: calendar.warnings,
        })
    }

    /// Resolve a notification to a record and sync it.
    fn changed_entity(&self, entity: &EntityRef, schemas: &[EntitySchema]) -> Result<EntityOutcome> {
        let schema_id = resolve_schema_id(
            schemas,
            &entity.entity_type,
            entity.object_type_id.as_deref(),
        )?;
        // `task` notifications cover shots, sequences and other typed contexts.
        if EntityKind::from_entity_type(&schema_id).is_none() {
            return Err(SyncError::NotCalendarable(schema_id));
        }

        let record: Value = self
            .pm
            .get(&schema_id, &entity.entity_id)?
            .ok_or_else(|| SyncError::EntityNotFound {
                entity_type: schema_id.clone(),
                entity_id: entity.entity_id.clone(),
            })?;
        self.sync_entity(&decode_entity(&record)?)
    }

    /// Closest palette color to the project color, if any can be found.
    fn project_color(&self, entity: &PmEntity) -> Option<String> {
        let Some(project) = entity.project() else {
            debug!(entity_id = entity.id(), "no project, no color");
            return None;
        };
        let Some(raw) = project.color.as_deref() else {
            debug!(project = %project.full_name, "project has no color");
            return None;
        };

        let palette = match self.calendar.colors() {
            Ok(colors) => colors.event_palette(),
            Err(e) => {
                warn!(error = %e, "couldn't get colors list, continuing without color");
                return None;
            }
        };

        match resolve_color(raw, &palette) {
            Ok(Some(found)) => {
                debug!(project_color = raw, color_id = %found.color_id, score = found.score, "determined best color");
                Some(found.color_id)
            }
            Ok(None) => {
                warn!("calendar palette is empty, continuing without color");
                None
            }
            Err(e) => {
                warn!(project_color = raw, error = %e, "issue with picking color, continuing without color");
                None
            }
        }
    }

    fn outcome(&self, entity_type: &str, entity_id: &str, result: Result<EntityOutcome>) -> EntityOutcome {
        match result {
            Ok(outcome) => outcome,
            Err(e) if e.is_skip() => {
                info!(entity_type, entity_id, reason = %e, "skipping entity");
                EntityOutcome::from_error(&e)
            }
            Err(e) => {
                error!(entity_type, entity_id, error = %e, "failed to sync entity");
                EntityOutcome::from_error(&e)
            }
        }
    }
}
