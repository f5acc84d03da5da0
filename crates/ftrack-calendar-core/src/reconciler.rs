//! Create-or-update of a single event keyed by its correlation.

use serde::Serialize;
use tracing::{debug, info};

use crate::calendar::CalendarApi;
use crate::error::{Result, SyncError};
use crate::event::Event;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum UpsertOutcome {
    Created { event_id: String },
    Updated { event_id: String },
}

impl UpsertOutcome {
    pub fn event_id(&self) -> &str {
        match self {
            UpsertOutcome::Created { event_id } | UpsertOutcome::Updated { event_id } => event_id,
        }
    }
}

pub struct Reconciler<'a> {
    api: &'a dyn CalendarApi,
}

impl<'a> Reconciler<'a> {
    pub fn new(api: &'a dyn CalendarApi) -> Self {
        Self { api }
    }

    /// Insert `event`, or replace the one remote event sharing its
    /// correlation. More than one match is an error and nothing is written.
    pub fn upsert(&self, calendar_id: &str, event: &Event) -> Result<UpsertOutcome> {
        let correlation = event.correlation().ok_or_else(|| {
            SyncError::Reconciliation("event carries no correlation properties".into())
        })?;
        let filter = correlation.private_properties();

        let matches = self.find(calendar_id, &filter)?;
        match matches.as_slice() {
            [] => {
                let event_id = self.api.insert_event(calendar_id, event)?;
                info!(calendar_id, %event_id, entity_id = %correlation.entity_id, "inserted event");
                Ok(UpsertOutcome::Created { event_id })
            }
            [existing] => {
                self.api.update_event(calendar_id, existing, event)?;
                info!(calendar_id, event_id = %existing, entity_id = %correlation.entity_id, "updated event");
                Ok(UpsertOutcome::Updated {
                    event_id: existing.clone(),
                })
            }
            many => Err(SyncError::Reconciliation(format!(
                "ambiguous correlation: {} events match {} {}",
                many.len(),
                correlation.entity_type,
                correlation.entity_id
            ))),
        }
    }

    /// Ids of every event matching `filter`, across all pages.
    fn find(&self, calendar_id: &str, filter: &[(String, String)]) -> Result<Vec<String>> {
        let mut ids = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let page = self
                .api
                .list_events(calendar_id, filter, page_token.as_deref())?;
            ids.extend(page.items.into_iter().map(|event| event.id));
            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }
        debug!(calendar_id, matches = ids.len(), "correlation lookup");
        Ok(ids)
    }
}
