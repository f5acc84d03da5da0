//! Decoding of ftrack API records into [`PmEntity`] values.
//!
//! The ftrack JSON API tags every record with `__entity_type__` and encodes
//! datetimes as `{"__type__": "datetime", "value": "..."}`. Plain strings
//! are accepted as well so hand-written records (offline replay, tests)
//! decode the same way.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

use super::entity::{CalendarEventEntity, PmEntity, Project, Resource, TaskEntity};
use crate::error::{Result, SyncError};

/// Decode one ftrack record.
pub fn decode_entity(record: &Value) -> Result<PmEntity> {
    let entity_type = record["__entity_type__"]
        .as_str()
        .ok_or_else(|| SyncError::Mapping("record has no __entity_type__".into()))?;

    match entity_type {
        "Task" => Ok(PmEntity::Task(decode_task(record)?)),
        "Milestone" => Ok(PmEntity::Milestone(decode_task(record)?)),
        "CalendarEvent" => Ok(PmEntity::CalendarEvent(decode_calendar_event(record)?)),
        other => Err(SyncError::NotCalendarable(other.to_string())),
    }
}

fn decode_task(record: &Value) -> Result<TaskEntity> {
    Ok(TaskEntity {
        id: required_str(record, "id")?,
        name: optional_str(&record["name"]).unwrap_or_default(),
        description: optional_str(&record["description"]),
        start_date: decode_datetime(&record["start_date"])?,
        end_date: decode_datetime(&record["end_date"])?,
        project: decode_project(&record["project"]),
        assignees: decode_resources(&record["assignments"]),
    })
}

fn decode_calendar_event(record: &Value) -> Result<CalendarEventEntity> {
    Ok(CalendarEventEntity {
        id: required_str(record, "id")?,
        name: optional_str(&record["name"]).unwrap_or_default(),
        description: optional_str(&record["description"]),
        start: decode_datetime(&record["start"])?,
        end: decode_datetime(&record["end"])?,
        leave: record["leave"].as_bool().unwrap_or(false),
        project: decode_project(&record["project"]),
        resources: decode_resources(&record["calendar_event_resources"]),
    })
}

fn required_str(record: &Value, key: &str) -> Result<String> {
    optional_str(&record[key]).ok_or_else(|| SyncError::Mapping(format!("record has no {key}")))
}

fn optional_str(value: &Value) -> Option<String> {
    value.as_str().map(str::to_string)
}

fn decode_project(value: &Value) -> Option<Project> {
    if !value.is_object() {
        return None;
    }
    Some(Project {
        id: optional_str(&value["id"]),
        full_name: optional_str(&value["full_name"])
            .or_else(|| optional_str(&value["name"]))
            .unwrap_or_default(),
        color: optional_str(&value["color"]),
    })
}

/// Pull `resource` out of each link record (assignment or booking).
fn decode_resources(links: &Value) -> Vec<Resource> {
    links
        .as_array()
        .map(|items| {
            items
                .iter()
                .map(|link| &link["resource"])
                .filter(|resource| resource.is_object())
                .map(|resource| Resource {
                    first_name: optional_str(&resource["first_name"]),
                    email: optional_str(&resource["email"]),
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Decode an ftrack datetime; `null` and absent values are `None`.
pub fn decode_datetime(value: &Value) -> Result<Option<DateTime<Utc>>> {
    let raw = match value {
        Value::Null => return Ok(None),
        Value::String(s) => s.as_str(),
        Value::Object(obj) => match obj.get("value") {
            Some(Value::String(s)) => s.as_str(),
            Some(Value::Null) | None => return Ok(None),
            Some(other) => {
                return Err(SyncError::Mapping(format!("unexpected datetime value {other}")))
            }
        },
        other => return Err(SyncError::Mapping(format!("unexpected datetime value {other}"))),
    };

    if raw.trim().is_empty() {
        return Ok(None);
    }
    parse_datetime(raw).map(Some)
}

/// Parse the datetime spellings ftrack emits. Naive values are UTC.
pub fn parse_datetime(raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }

    Err(SyncError::Mapping(format!("invalid datetime '{raw}'")))
}
