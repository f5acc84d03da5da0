//! Google Calendar v3 resources used by the sync.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::color::{Palette, Rgb};
use crate::event::ExtendedProperties;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AccessRole {
    Owner,
    Writer,
    Reader,
    FreeBusyReader,
}

/// Entry of the service account's calendar list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarListEntry {
    pub id: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_role: Option<AccessRole>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

/// One page of `calendarList.list`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarListPage {
    #[serde(default)]
    pub items: Vec<CalendarListEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

/// Body of `calendars.insert`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCalendar {
    pub summary: String,
    pub time_zone: String,
}

/// A calendar as returned by `calendars.insert`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarResource {
    pub id: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AclScope {
    #[serde(rename = "type")]
    pub scope_type: String,
    pub value: String,
}

/// Body of `acl.insert`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AclRule {
    pub scope: AclScope,
    pub role: String,
}

impl AclRule {
    /// Grant `role` to a group address.
    pub fn group(address: &str, role: &str) -> Self {
        Self {
            scope: AclScope {
                scope_type: "group".to_string(),
                value: address.to_string(),
            },
            role: role.to_string(),
        }
    }
}

/// The parts of a remote event the reconciler looks at.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteEvent {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extended_properties: Option<ExtendedProperties>,
}

/// One page of `events.list`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventListPage {
    #[serde(default)]
    pub items: Vec<RemoteEvent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ColorDefinition {
    pub background: String,
    pub foreground: String,
}

/// Response of `colors.get`. Maps keep the order the service sent.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ColorPalette {
    #[serde(default)]
    pub calendar: IndexMap<String, ColorDefinition>,
    #[serde(default)]
    pub event: IndexMap<String, ColorDefinition>,
}

impl ColorPalette {
    /// Event swatches by background color; unparseable swatches are skipped.
    pub fn event_palette(&self) -> Palette {
        self.event
            .iter()
            .filter_map(|(id, definition)| match Rgb::parse(&definition.background) {
                Ok(rgb) => Some((id.clone(), rgb)),
                Err(e) => {
                    warn!(color_id = %id, error = %e, "skipping unparseable palette entry");
                    None
                }
            })
            .collect()
    }
}
