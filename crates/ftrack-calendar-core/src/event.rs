//! Normalized calendar event derived from a PM entity.
//!
//! [`Event`] is the value the mapper produces and the reconciler writes. Its
//! wire form is the Google Calendar v3 event resource, so it serializes
//! directly as a request body.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::pm::EntityKind;

/// Private extended property holding the ftrack entity id.
pub const CORRELATION_ID_KEY: &str = "ftrack_id";
/// Private extended property holding the ftrack entity type.
pub const CORRELATION_TYPE_KEY: &str = "ftrack_type";

/// Link between a PM entity and its calendar counterpart.
///
/// Ids are only unique per entity type, so both halves form the key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Correlation {
    pub entity_id: String,
    pub entity_type: EntityKind,
}

impl Correlation {
    pub fn new(entity_id: impl Into<String>, entity_type: EntityKind) -> Self {
        Self {
            entity_id: entity_id.into(),
            entity_type,
        }
    }

    /// Key/value pairs as stored in `extendedProperties.private`.
    pub fn private_properties(&self) -> Vec<(String, String)> {
        vec![
            (CORRELATION_ID_KEY.to_string(), self.entity_id.clone()),
            (
                CORRELATION_TYPE_KEY.to_string(),
                self.entity_type.as_str().to_string(),
            ),
        ]
    }

    /// Read a correlation back from a remote event's private properties.
    pub fn from_private_properties(private: &BTreeMap<String, String>) -> Option<Self> {
        let entity_id = private.get(CORRELATION_ID_KEY)?;
        let entity_type = EntityKind::from_entity_type(private.get(CORRELATION_TYPE_KEY)?)?;
        Some(Self::new(entity_id.clone(), entity_type))
    }
}

/// Start or end of an event: either a whole day or an instant in a zone.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDateTime {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

impl EventDateTime {
    pub fn all_day(date: NaiveDate) -> Self {
        Self {
            date: Some(date.format("%Y-%m-%d").to_string()),
            ..Default::default()
        }
    }

    pub fn timed(at: DateTime<Utc>, time_zone: &str) -> Self {
        Self {
            date_time: Some(at.to_rfc3339_opts(SecondsFormat::Secs, true)),
            time_zone: Some(time_zone.to_string()),
            ..Default::default()
        }
    }

    pub fn is_all_day(&self) -> bool {
        self.date.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminders {
    pub use_default: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attendee {
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExtendedProperties {
    #[serde(default)]
    pub private: BTreeMap<String, String>,
}

/// A calendar event ready to be written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub summary: String,
    pub location: String,
    pub description: String,
    pub start: EventDateTime,
    pub end: EventDateTime,
    pub reminders: Reminders,
    pub attendees: Vec<Attendee>,
    pub extended_properties: ExtendedProperties,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_id: Option<String>,
}

impl Event {
    /// Correlation embedded in the private properties, if intact.
    pub fn correlation(&self) -> Option<Correlation> {
        Correlation::from_private_properties(&self.extended_properties.private)
    }

    pub fn attendee_emails(&self) -> Vec<&str> {
        self.attendees.iter().map(|a| a.email.as_str()).collect()
    }
}
