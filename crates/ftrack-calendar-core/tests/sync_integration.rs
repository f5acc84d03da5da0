//! Integration tests for the sync pipeline.
//!
//! These run the public entry points against the in-memory adapters and
//! check the guarantees callers rely on: no writes for foreign notification
//! types, idempotent upserts, refusal to guess on ambiguous state, stable
//! calendar provisioning and isolation of bulk query sets.

use chrono::{TimeZone, Utc};
use serde_json::json;

use ftrack_calendar_core::calendar::{CalendarApi, CalendarOp};
use ftrack_calendar_core::color::{best_color, Palette, Rgb};
use ftrack_calendar_core::mapper::{self, LEAVE_COLOR_ID};
use ftrack_calendar_core::pm::{CalendarEventEntity, EntityKind, Project, Resource, TaskEntity};
use ftrack_calendar_core::{
    CalendarConfig, CalendarRegistry, EntityOutcome, EntityRef, InMemoryCalendar,
    InMemoryPmSession, PmEntity, Reconciler, SyncError, SyncOrchestrator, UpdateNotification,
    UpsertOutcome,
};

fn settings() -> CalendarConfig {
    CalendarConfig {
        share_group: Some("calendar-share@example.com".into()),
        ..CalendarConfig::default()
    }
}

fn task_record(id: &str) -> serde_json::Value {
    json!({
        "__entity_type__": "Task",
        "id": id,
        "name": "Lighting",
        "end_date": "2020-01-01T10:00:00Z",
        "project": {"id": "show-1", "full_name": "Show", "color": "#dc2127"},
        "assignments": []
    })
}

#[test]
fn test_foreign_notification_types_never_write() {
    let pm = InMemoryPmSession::new(vec![task_record("t1")]);
    let calendar = InMemoryCalendar::new();
    let settings = settings();
    let orchestrator = SyncOrchestrator::new(&pm, &calendar, &settings);

    let notification = UpdateNotification::from_json(
        r#"{"data": {"entities": [
            {"entityType": "assetversion", "entityId": "t1"},
            {"entityType": "note", "entityId": "n1"},
            {"entityType": "list", "entityId": "l1"}
        ]}}"#,
    )
    .unwrap();
    let report = orchestrator.on_entity_changed(&notification.entities);

    assert_eq!(report.skipped(), 3);
    assert!(calendar.writes().is_empty());
}

#[test]
fn test_upsert_twice_inserts_once() {
    let calendar = InMemoryCalendar::new();
    let cal = calendar.add_calendar("ftrack");
    let entity = PmEntity::Task(TaskEntity {
        id: "t1".into(),
        name: "Lighting".into(),
        end_date: Some(Utc.with_ymd_and_hms(2020, 1, 1, 10, 0, 0).unwrap()),
        project: Some(Project {
            id: None,
            full_name: "Show".into(),
            color: None,
        }),
        ..TaskEntity::default()
    });
    let event = mapper::map(&entity, None).unwrap();
    let reconciler = Reconciler::new(&calendar);

    let first = reconciler.upsert(&cal, &event).unwrap();
    let second = reconciler.upsert(&cal, &event).unwrap();

    assert!(matches!(first, UpsertOutcome::Created { .. }));
    assert!(matches!(second, UpsertOutcome::Updated { .. }));
    let writes: Vec<_> = calendar.writes().iter().map(CalendarOp::method).collect();
    assert_eq!(writes, vec!["events.insert", "events.update"]);

    let stored = calendar.events(&cal);
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].1, event);
}

#[test]
fn test_ambiguous_correlation_is_refused() {
    let calendar = InMemoryCalendar::new();
    let cal = calendar.add_calendar("ftrack");
    let entity = PmEntity::CalendarEvent(CalendarEventEntity {
        id: "c1".into(),
        name: "Offsite".into(),
        start: Some(Utc.with_ymd_and_hms(2020, 5, 1, 0, 0, 0).unwrap()),
        end: Some(Utc.with_ymd_and_hms(2020, 5, 2, 0, 0, 0).unwrap()),
        project: Some(Project::default()),
        ..CalendarEventEntity::default()
    });
    let event = mapper::map(&entity, None).unwrap();
    calendar.add_event(&cal, event.clone());
    calendar.add_event(&cal, event.clone());
    calendar.add_event(&cal, event.clone());

    let err = Reconciler::new(&calendar).upsert(&cal, &event).unwrap_err();
    assert!(matches!(err, SyncError::Reconciliation(_)));
    assert!(calendar.writes().is_empty());
}

#[test]
fn test_exact_palette_color_scores_zero() {
    let colors = calendar_palette();
    for (id, rgb) in &colors {
        let found = best_color(rgb, &colors).unwrap();
        assert_eq!(&found.color_id, id);
        assert_eq!(found.score, 0.0);
    }
}

fn calendar_palette() -> Palette {
    InMemoryCalendar::new().colors().unwrap().event_palette()
}

#[test]
fn test_leave_is_grey_whatever_the_project_color() {
    let entity = PmEntity::CalendarEvent(CalendarEventEntity {
        id: "c7".into(),
        name: "Vacation".into(),
        start: Some(Utc.with_ymd_and_hms(2020, 8, 3, 0, 0, 0).unwrap()),
        end: Some(Utc.with_ymd_and_hms(2020, 8, 8, 0, 0, 0).unwrap()),
        leave: true,
        resources: vec![Resource {
            first_name: Some("Kim".into()),
            email: Some("kim@example.com".into()),
        }],
        ..CalendarEventEntity::default()
    });

    for color in [None, Some("1"), Some("11")] {
        let event = mapper::map(&entity, color).unwrap();
        assert_eq!(event.color_id.as_deref(), Some(LEAVE_COLOR_ID));
        assert_eq!(event.summary, "LEAVE: Kim | Vacation");
    }
    let red = best_color(&Rgb::new(0xdc, 0x21, 0x27), &calendar_palette()).unwrap();
    assert_eq!(red.color_id, "11");
}

#[test]
fn test_ensure_twice_returns_same_calendar() {
    let calendar = InMemoryCalendar::new().with_page_size(2);
    calendar.add_calendar("Editorial");
    calendar.add_calendar("Holidays");
    calendar.add_calendar("Renders");
    let settings = settings();
    let registry = CalendarRegistry::new(&calendar, &settings);

    let first = registry.ensure("ftrack").unwrap();
    let second = registry.ensure("ftrack").unwrap();

    assert!(first.created);
    assert!(!second.created);
    assert_eq!(first.id, second.id);
    assert_eq!(calendar.calendar_count(), 4);
}

#[test]
fn test_bulk_sync_isolates_failing_query_set() {
    let pm = InMemoryPmSession::new(vec![
        task_record("t1"),
        json!({
            "__entity_type__": "CalendarEvent",
            "id": "c1",
            "name": "Screening",
            "start": "2020-01-10",
            "end": "2020-01-11",
            "leave": false,
            "project": {"id": "show-1", "full_name": "Show"},
            "calendar_event_resources": []
        }),
        json!({"__entity_type__": "Milestone", "id": "m1", "project": {"id": "show-1"}}),
    ])
    .fail_queries_for("Milestone");
    let calendar = InMemoryCalendar::new();
    let settings = settings();
    let orchestrator = SyncOrchestrator::new(&pm, &calendar, &settings);

    let report = orchestrator.on_bulk_sync_requested(&["show-1".to_string()]);

    assert_eq!(report.failed_sets.len(), 1);
    let synced: Vec<_> = report
        .entities
        .iter()
        .filter(|e| matches!(e.outcome, EntityOutcome::Synced { .. }))
        .map(|e| (e.entity_type.as_str(), e.entity_id.as_str()))
        .collect();
    assert_eq!(synced, vec![("CalendarEvent", "c1"), ("Task", "t1")]);
}

#[test]
fn test_notification_then_bulk_share_one_event() {
    let pm = InMemoryPmSession::new(vec![task_record("t1")]);
    let calendar = InMemoryCalendar::new();
    let settings = settings();
    let orchestrator = SyncOrchestrator::new(&pm, &calendar, &settings);

    orchestrator.on_entity_changed(&[EntityRef::new("task", "t1")]);
    let report = orchestrator.on_bulk_sync_requested(&["show-1".to_string()]);

    let EntityOutcome::Synced {
        calendar_id,
        upsert,
        color_id,
        ..
    } = &report.entities[0].outcome
    else {
        panic!("expected synced outcome: {report:?}");
    };
    assert!(matches!(upsert, UpsertOutcome::Updated { .. }));
    assert_eq!(color_id.as_deref(), Some("11"));
    let events = calendar.events(calendar_id);
    assert_eq!(events.len(), 1);
    assert_eq!(
        events[0].1.correlation().map(|c| c.entity_type),
        Some(EntityKind::Task)
    );
}
