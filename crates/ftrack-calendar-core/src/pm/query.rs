//! Typed queries against the PM system and their ftrack expression form.

use super::entity::EntityKind;

/// Attributes fetched for tasks and milestones.
pub const TASK_PROJECTIONS: &[&str] = &[
    "id",
    "name",
    "description",
    "start_date",
    "end_date",
    "project.id",
    "project.full_name",
    "project.color",
    "assignments.resource.first_name",
    "assignments.resource.email",
];

/// Attributes fetched for calendar events (leave included).
pub const CALENDAR_EVENT_PROJECTIONS: &[&str] = &[
    "id",
    "name",
    "start",
    "end",
    "leave",
    "project.id",
    "project.full_name",
    "project.color",
    "calendar_event_resources.resource.first_name",
    "calendar_event_resources.resource.email",
];

/// Row filter of a [`Query`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// Exactly one entity by id.
    IdIs(String),
    /// Entities whose project is one of the ids.
    ProjectIn(Vec<String>),
    /// Entities with any of the ids among their ancestors.
    AncestorIn(Vec<String>),
}

/// A query over one schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub schema: String,
    pub filter: Filter,
}

impl Query {
    pub fn by_id(schema: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            filter: Filter::IdIs(id.into()),
        }
    }

    /// The three bulk-sync query sets for a selection, in processing order.
    pub fn bulk_sync_sets(selection: &[String]) -> Vec<(EntityKind, Query)> {
        vec![
            (
                EntityKind::CalendarEvent,
                Query {
                    schema: EntityKind::CalendarEvent.as_str().to_string(),
                    filter: Filter::ProjectIn(selection.to_vec()),
                },
            ),
            (
                EntityKind::Milestone,
                Query {
                    schema: EntityKind::Milestone.as_str().to_string(),
                    filter: Filter::AncestorIn(selection.to_vec()),
                },
            ),
            (
                EntityKind::Task,
                Query {
                    schema: EntityKind::Task.as_str().to_string(),
                    filter: Filter::AncestorIn(selection.to_vec()),
                },
            ),
        ]
    }

    pub fn projections(&self) -> &'static [&'static str] {
        if self.schema == EntityKind::CalendarEvent.as_str() {
            CALENDAR_EVENT_PROJECTIONS
        } else {
            TASK_PROJECTIONS
        }
    }

    /// Render as an ftrack query expression.
    pub fn expression(&self) -> String {
        let condition = match &self.filter {
            Filter::IdIs(id) => format!("id is {}", quote(id)),
            Filter::ProjectIn(ids) => format!("project has ({})", any_id(ids)),
            Filter::AncestorIn(ids) => format!("ancestors any ({})", any_id(ids)),
        };
        format!(
            "select {} from {} where {}",
            self.projections().join(", "),
            self.schema,
            condition
        )
    }
}

fn any_id(ids: &[String]) -> String {
    ids.iter()
        .map(|id| format!("id is {}", quote(id)))
        .collect::<Vec<_>>()
        .join(" or ")
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}
