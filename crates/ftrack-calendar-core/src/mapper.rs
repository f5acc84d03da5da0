//! Entity to calendar event mapping.
//!
//! Pure: the color id is resolved by the caller and passed in.

use chrono::{DateTime, Duration, Utc};
use tracing::warn;

use crate::error::{Result, SyncError};
use crate::event::{
    Attendee, Correlation, Event, EventDateTime, ExtendedProperties, Reminders,
};
use crate::pm::{CalendarEventEntity, PmEntity, Project, Resource, TaskEntity};

/// Color category used for leave (grey in the stock Google palette).
pub const LEAVE_COLOR_ID: &str = "8";
/// Time zone attached to timed events; instants are always emitted in UTC.
pub const TIMED_ZONE: &str = "UTC";
/// Length of the window synthesized around a single task date.
pub const SYNTHETIC_WINDOW_MINUTES: i64 = 30;

/// Build the calendar event for `entity`.
pub fn map(entity: &PmEntity, color_id: Option<&str>) -> Result<Event> {
    let correlation = Correlation::new(entity.id(), entity.kind());
    match entity {
        PmEntity::Task(task) | PmEntity::Milestone(task) => {
            map_task(task, correlation, color_id)
        }
        PmEntity::CalendarEvent(event) => map_calendar_event(event, correlation, color_id),
    }
}

fn map_task(task: &TaskEntity, correlation: Correlation, color_id: Option<&str>) -> Result<Event> {
    let (start, end) = task_window(task.start_date, task.end_date)?;
    let summary = project_summary(&task.name, task.project.as_ref())?;

    Ok(build(
        summary,
        task.description.as_deref(),
        EventDateTime::timed(start, TIMED_ZONE),
        EventDateTime::timed(end, TIMED_ZONE),
        attendees(&task.assignees, &task.id),
        correlation,
        color_id.map(str::to_string),
    ))
}

/// Start and end of a task, synthesizing a short window when one side is
/// missing. No minimum duration is enforced when both are set.
fn task_window(
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let window = Duration::minutes(SYNTHETIC_WINDOW_MINUTES);
    match (start, end) {
        (Some(start), Some(end)) => Ok((start, end)),
        (Some(start), None) => Ok((start, start + window)),
        (None, Some(end)) => Ok((end, end + window)),
        (None, None) => Err(SyncError::Mapping("missing both dates".into())),
    }
}

fn map_calendar_event(
    event: &CalendarEventEntity,
    correlation: Correlation,
    color_id: Option<&str>,
) -> Result<Event> {
    let (Some(start), Some(end)) = (event.start, event.end) else {
        return Err(SyncError::Mapping("calendar event needs start and end".into()));
    };
    let start_day = start.date_naive();
    let mut end_day = end.date_naive();
    // All-day ranges are end-exclusive.
    if end_day <= start_day {
        end_day = start_day + Duration::days(1);
    }

    let (summary, color_id) = if event.leave {
        let names: Vec<&str> = event
            .resources
            .iter()
            .filter_map(|r| r.first_name.as_deref())
            .collect();
        (
            format!("LEAVE: {} | {}", names.join(", "), event.name),
            Some(LEAVE_COLOR_ID.to_string()),
        )
    } else {
        (
            project_summary(&event.name, event.project.as_ref())?,
            color_id.map(str::to_string),
        )
    };

    Ok(build(
        summary,
        event.description.as_deref(),
        EventDateTime::all_day(start_day),
        EventDateTime::all_day(end_day),
        attendees(&event.resources, &event.id),
        correlation,
        color_id,
    ))
}

fn project_summary(name: &str, project: Option<&Project>) -> Result<String> {
    let project = project.ok_or_else(|| SyncError::Mapping("entity has no project".into()))?;
    Ok(format!("{} | {}", name, project.full_name))
}

fn attendees(resources: &[Resource], entity_id: &str) -> Vec<Attendee> {
    resources
        .iter()
        .filter_map(|resource| match &resource.email {
            Some(email) if !email.trim().is_empty() => Some(Attendee {
                email: email.clone(),
            }),
            _ => {
                warn!(
                    entity_id,
                    first_name = resource.first_name.as_deref().unwrap_or(""),
                    "resource has no e-mail, not inviting"
                );
                None
            }
        })
        .collect()
}

fn build(
    summary: String,
    description: Option<&str>,
    start: EventDateTime,
    end: EventDateTime,
    attendees: Vec<Attendee>,
    correlation: Correlation,
    color_id: Option<String>,
) -> Event {
    Event {
        summary,
        location: String::new(),
        description: description.unwrap_or_default().to_string(),
        start,
        end,
        reminders: Reminders { use_default: false },
        attendees,
        extended_properties: ExtendedProperties {
            private: correlation.private_properties().into_iter().collect(),
        },
        color_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pm::EntityKind;
    use chrono::TimeZone;

    fn project() -> Option<Project> {
        Some(Project {
            id: Some("p1".into()),
            full_name: "Big Show".into(),
            color: Some("#00BCD4".into()),
        })
    }

    fn resource(first_name: &str, email: Option<&str>) -> Resource {
        Resource {
            first_name: Some(first_name.into()),
            email: email.map(String::from),
        }
    }

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 1, 1, h, m, 0).unwrap()
    }

    fn task(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> TaskEntity {
        TaskEntity {
            id: "t1".into(),
            name: "Comp".into(),
            description: None,
            start_date: start,
            end_date: end,
            project: project(),
            assignees: vec![resource("Ann", Some("ann@example.com"))],
        }
    }

    #[test]
    fn test_end_only_gets_thirty_minute_window() {
        let event = map(&PmEntity::Task(task(None, Some(at(10, 0)))), None).unwrap();
        assert_eq!(event.start.date_time.as_deref(), Some("2020-01-01T10:00:00Z"));
        assert_eq!(event.end.date_time.as_deref(), Some("2020-01-01T10:30:00Z"));
        assert_eq!(event.start.time_zone.as_deref(), Some("UTC"));
    }

    #[test]
    fn test_start_only_gets_thirty_minute_window() {
        let event = map(&PmEntity::Task(task(Some(at(9, 15)), None)), None).unwrap();
        assert_eq!(event.start.date_time.as_deref(), Some("2020-01-01T09:15:00Z"));
        assert_eq!(event.end.date_time.as_deref(), Some("2020-01-01T09:45:00Z"));
    }

    #[test]
    fn test_both_dates_used_verbatim() {
        let event = map(&PmEntity::Task(task(Some(at(9, 0)), Some(at(9, 5)))), None).unwrap();
        assert_eq!(event.end.date_time.as_deref(), Some("2020-01-01T09:05:00Z"));
    }

    #[test]
    fn test_missing_both_dates() {
        let err = map(&PmEntity::Task(task(None, None)), None).unwrap_err();
        assert!(matches!(err, SyncError::Mapping(ref m) if m == "missing both dates"));
    }

    #[test]
    fn test_task_fields() {
        let mut t = task(None, Some(at(10, 0)));
        t.description = Some("notes".into());
        t.assignees.push(resource("Bob", None));
        let event = map(&PmEntity::Milestone(t), Some("7")).unwrap();

        assert_eq!(event.summary, "Comp | Big Show");
        assert_eq!(event.description, "notes");
        assert_eq!(event.location, "");
        assert!(!event.reminders.use_default);
        assert_eq!(event.attendee_emails(), vec!["ann@example.com"]);
        assert_eq!(event.color_id.as_deref(), Some("7"));
        assert_eq!(
            event.correlation(),
            Some(Correlation::new("t1", EntityKind::Milestone))
        );
    }

    #[test]
    fn test_task_without_project_is_mapping_error() {
        let mut t = task(Some(at(9, 0)), None);
        t.project = None;
        assert!(matches!(
            map(&PmEntity::Task(t), None),
            Err(SyncError::Mapping(_))
        ));
    }

    fn leave_event(leave: bool) -> CalendarEventEntity {
        CalendarEventEntity {
            id: "c1".into(),
            name: "Holiday".into(),
            description: None,
            start: Some(Utc.with_ymd_and_hms(2021, 7, 1, 0, 0, 0).unwrap()),
            end: Some(Utc.with_ymd_and_hms(2021, 7, 3, 0, 0, 0).unwrap()),
            leave,
            project: if leave { None } else { project() },
            resources: vec![
                resource("Ann", Some("ann@example.com")),
                resource("Bob", Some("bob@example.com")),
            ],
        }
    }

    #[test]
    fn test_leave_overrides_color_and_summary() {
        let event = map(&PmEntity::CalendarEvent(leave_event(true)), Some("3")).unwrap();
        assert_eq!(event.color_id.as_deref(), Some(LEAVE_COLOR_ID));
        assert_eq!(event.summary, "LEAVE: Ann, Bob | Holiday");
        assert_eq!(event.start.date.as_deref(), Some("2021-07-01"));
        assert_eq!(event.end.date.as_deref(), Some("2021-07-03"));
        assert_eq!(event.attendees.len(), 2);
    }

    #[test]
    fn test_calendar_event_keeps_project_color() {
        let event = map(&PmEntity::CalendarEvent(leave_event(false)), Some("3")).unwrap();
        assert_eq!(event.summary, "Holiday | Big Show");
        assert_eq!(event.color_id.as_deref(), Some("3"));
        assert!(event.start.is_all_day());
    }

    #[test]
    fn test_same_day_calendar_event_spans_one_day() {
        let mut e = leave_event(false);
        e.end = e.start;
        let event = map(&PmEntity::CalendarEvent(e), None).unwrap();
        assert_eq!(event.start.date.as_deref(), Some("2021-07-01"));
        assert_eq!(event.end.date.as_deref(), Some("2021-07-02"));
    }
}
