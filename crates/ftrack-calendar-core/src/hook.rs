//! Event-hub payloads: update notifications and the action
//! discover/launch protocol.
//!
//! Payloads are accepted either bare (`{"entities": [...]}`) or wrapped the
//! way the event hub delivers them (`{"topic": ..., "data": {...}}`).

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;

pub const ACTION_IDENTIFIER: &str = "make-project-events";
pub const ACTION_LABEL: &str = "Make Calendar Events";

/// Notification entity types that can carry a calendarable entity.
/// `task` covers every typed context, milestones included.
pub const CALENDARABLE_NOTIFICATION_TYPES: &[&str] = &["calendarevent", "task"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionDescriptor {
    pub label: String,
    pub action_identifier: String,
    pub action_data: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoverResponse {
    pub items: Vec<ActionDescriptor>,
}

/// Answer to an action discovery request.
pub fn discover() -> DiscoverResponse {
    DiscoverResponse {
        items: vec![ActionDescriptor {
            label: ACTION_LABEL.to_string(),
            action_identifier: ACTION_IDENTIFIER.to_string(),
            action_data: Map::new(),
        }],
    }
}

/// One changed entity in an update notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityRef {
    pub entity_type: String,
    pub entity_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_type_id: Option<String>,
}

impl EntityRef {
    pub fn new(entity_type: impl Into<String>, entity_id: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            entity_id: entity_id.into(),
            object_type_id: None,
        }
    }

    pub fn with_object_type(mut self, object_type_id: impl Into<String>) -> Self {
        self.object_type_id = Some(object_type_id.into());
        self
    }

    pub fn is_calendarable(&self) -> bool {
        CALENDARABLE_NOTIFICATION_TYPES
            .iter()
            .any(|t| t.eq_ignore_ascii_case(&self.entity_type))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateNotification {
    #[serde(default)]
    pub entities: Vec<EntityRef>,
}

impl UpdateNotification {
    pub fn from_json(raw: &str) -> Result<Self> {
        parse_payload(raw)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionItem {
    pub entity_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,
}

/// An action invocation from the ftrack UI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionLaunch {
    #[serde(default)]
    pub action_identifier: Option<String>,
    #[serde(default)]
    pub selection: Vec<SelectionItem>,
}

impl ActionLaunch {
    pub fn from_json(raw: &str) -> Result<Self> {
        parse_payload(raw)
    }

    /// The node ids to bulk sync, or `None` when the launch targets another
    /// action. A launch without an identifier is taken as ours.
    pub fn bulk_selection(&self) -> Option<Vec<String>> {
        match self.action_identifier.as_deref() {
            Some(id) if id != ACTION_IDENTIFIER => None,
            _ => Some(self.selection.iter().map(|s| s.entity_id.clone()).collect()),
        }
    }
}

/// Decode `T` from the payload itself or from its `data` field.
fn parse_payload<T: DeserializeOwned>(raw: &str) -> Result<T> {
    let mut value: Value = serde_json::from_str(raw)?;
    if let Some(data) = value.get_mut("data").filter(|d| d.is_object()) {
        return Ok(serde_json::from_value(data.take())?);
    }
    Ok(serde_json::from_value(value)?)
}
