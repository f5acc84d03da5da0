//! Read-only views of the ftrack entities that can go on a calendar.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Calendarable entity variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Task,
    Milestone,
    CalendarEvent,
}

impl EntityKind {
    /// The ftrack schema id, also written as the correlation type.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Task => "Task",
            EntityKind::Milestone => "Milestone",
            EntityKind::CalendarEvent => "CalendarEvent",
        }
    }

    /// Parse an ftrack `__entity_type__` / schema id.
    pub fn from_entity_type(entity_type: &str) -> Option<Self> {
        match entity_type {
            "Task" => Some(EntityKind::Task),
            "Milestone" => Some(EntityKind::Milestone),
            "CalendarEvent" => Some(EntityKind::CalendarEvent),
            _ => None,
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Project {
    pub id: Option<String>,
    pub full_name: String,
    /// Project color as stored in ftrack, usually `#rrggbb`.
    pub color: Option<String>,
}

/// A user (or other resource) booked on an entity.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Resource {
    pub first_name: Option<String>,
    pub email: Option<String>,
}

/// Task-shaped entity. Milestones share this shape.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TaskEntity {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub project: Option<Project>,
    /// Resources from the assignment list, in ftrack order.
    pub assignees: Vec<Resource>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CalendarEventEntity {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub leave: bool,
    pub project: Option<Project>,
    /// Resources from `calendar_event_resources`, in ftrack order.
    pub resources: Vec<Resource>,
}

/// An ftrack entity that can be projected onto a calendar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PmEntity {
    Task(TaskEntity),
    Milestone(TaskEntity),
    CalendarEvent(CalendarEventEntity),
}

impl PmEntity {
    pub fn kind(&self) -> EntityKind {
        match self {
            PmEntity::Task(_) => EntityKind::Task,
            PmEntity::Milestone(_) => EntityKind::Milestone,
            PmEntity::CalendarEvent(_) => EntityKind::CalendarEvent,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            PmEntity::Task(t) | PmEntity::Milestone(t) => &t.id,
            PmEntity::CalendarEvent(e) => &e.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            PmEntity::Task(t) | PmEntity::Milestone(t) => &t.name,
            PmEntity::CalendarEvent(e) => &e.name,
        }
    }

    pub fn project(&self) -> Option<&Project> {
        match self {
            PmEntity::Task(t) | PmEntity::Milestone(t) => t.project.as_ref(),
            PmEntity::CalendarEvent(e) => e.project.as_ref(),
        }
    }
}
