//! Tests for orchestrator module.

#[cfg(test)]
mod tests {
    use crate::calendar::InMemoryCalendar;
    use crate::config::CalendarConfig;
    use crate::event::{Correlation, Event, EventDateTime, ExtendedProperties, Reminders};
    use crate::hook::EntityRef;
    use crate::orchestrator::SyncOrchestrator;
    use crate::pm::{EntityKind, EntitySchema, InMemoryPmSession};
    use crate::reconciler::UpsertOutcome;
    use crate::registry::ProvisionWarning;
    use crate::report::{EntityOutcome, SyncReport};
    use serde_json::{json, Value};

    const MILESTONE_TYPE: &str = "01decb2c-5b1d-11e5-9f9c-00000000000a";
    const SHOT_TYPE: &str = "bad911de-3bd6-47b9-8b46-3476e237cb36";

    fn settings() -> CalendarConfig {
        CalendarConfig {
            share_group: Some("calendar-share@example.com".into()),
            ..CalendarConfig::default()
        }
    }

    fn project() -> Value {
        json!({"id": "p1", "full_name": "Big Show", "color": "#00BCD4"})
    }

    fn task(id: &str) -> Value {
        json!({
            "__entity_type__": "Task",
            "id": id,
            "name": format!("Comp {id}"),
            "start_date": null,
            "end_date": {"__type__": "datetime", "value": "2020-01-01T10:00:00"},
            "project": project(),
            "ancestors": [{"id": "seq-1"}],
            "assignments": [{"resource": {"first_name": "Ann", "email": "ann@example.com"}}]
        })
    }

    fn milestone(id: &str) -> Value {
        json!({
            "__entity_type__": "Milestone",
            "id": id,
            "name": "Delivery",
            "end_date": "2020-02-01T18:00:00Z",
            "project": project(),
            "assignments": []
        })
    }

    fn calendar_event(id: &str, leave: bool) -> Value {
        json!({
            "__entity_type__": "CalendarEvent",
            "id": id,
            "name": "Review",
            "start": "2020-03-02T00:00:00",
            "end": "2020-03-04T00:00:00",
            "leave": leave,
            "project": project(),
            "calendar_event_resources": [
                {"resource": {"first_name": "Bo", "email": "bo@example.com"}}
            ]
        })
    }

    fn records() -> Vec<Value> {
        vec![
            task("t1"),
            task("t2"),
            milestone("m1"),
            calendar_event("c1", false),
        ]
    }

    fn correlated_event(id: &str, kind: EntityKind) -> Event {
        let day = chrono::NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        Event {
            summary: "stale".into(),
            location: String::new(),
            description: String::new(),
            start: EventDateTime::all_day(day),
            end: EventDateTime::all_day(day),
            reminders: Reminders { use_default: false },
            attendees: Vec::new(),
            extended_properties: ExtendedProperties {
                private: Correlation::new(id, kind)
                    .private_properties()
                    .into_iter()
                    .collect(),
            },
            color_id: None,
        }
    }

    fn outcome<'r>(report: &'r SyncReport, entity_id: &str) -> &'r EntityOutcome {
        &report
            .entities
            .iter()
            .find(|e| e.entity_id == entity_id)
            .unwrap()
            .outcome
    }

    #[test]
    fn test_non_calendarable_notifications_touch_nothing() {
        let pm = InMemoryPmSession::new(records());
        let calendar = InMemoryCalendar::new();
        let settings = settings();
        let orchestrator = SyncOrchestrator::new(&pm, &calendar, &settings);

        let report = orchestrator.on_entity_changed(&[
            EntityRef::new("assetversion", "t1"),
            EntityRef::new("show", "p1"),
        ]);

        assert_eq!(report.skipped(), 2);
        assert!(calendar.ops().is_empty());
    }

    #[test]
    fn test_task_notification_creates_colored_event() {
        let pm = InMemoryPmSession::new(records());
        let calendar = InMemoryCalendar::new();
        let settings = settings();
        let orchestrator = SyncOrchestrator::new(&pm, &calendar, &settings);

        let report = orchestrator.on_entity_changed(&[EntityRef::new("task", "t1")]);
        assert_eq!(report.synced(), 1);

        let EntityOutcome::Synced {
            calendar_id,
            upsert,
            color_id,
            warnings,
        } = outcome(&report, "t1")
        else {
            panic!("expected synced outcome: {report:?}");
        };
        assert!(matches!(upsert, UpsertOutcome::Created { .. }));
        assert_eq!(color_id.as_deref(), Some("7"));
        assert!(warnings.is_empty());

        let events = calendar.events(calendar_id);
        assert_eq!(events.len(), 1);
        let event = &events[0].1;
        assert_eq!(event.summary, "Comp t1 | Big Show");
        assert_eq!(event.start.date_time.as_deref(), Some("2020-01-01T10:00:00Z"));
        assert_eq!(event.end.date_time.as_deref(), Some("2020-01-01T10:30:00Z"));
        assert_eq!(event.attendee_emails(), vec!["ann@example.com"]);
        assert_eq!(
            calendar.acl_rules(calendar_id)[0].scope.value,
            "calendar-share@example.com"
        );
    }

    #[test]
    fn test_repeated_notification_updates_in_place() {
        let pm = InMemoryPmSession::new(records());
        let calendar = InMemoryCalendar::new();
        let settings = settings();
        let orchestrator = SyncOrchestrator::new(&pm, &calendar, &settings);

        orchestrator.on_entity_changed(&[EntityRef::new("task", "t1")]);
        let second = orchestrator.on_entity_changed(&[EntityRef::new("Task", "t1")]);

        let EntityOutcome::Synced {
            calendar_id, upsert, ..
        } = outcome(&second, "t1")
        else {
            panic!("expected synced outcome: {second:?}");
        };
        assert!(matches!(upsert, UpsertOutcome::Updated { .. }));
        assert_eq!(calendar.events(calendar_id).len(), 1);
        assert_eq!(calendar.calendar_count(), 1);
    }

    #[test]
    fn test_milestone_resolved_through_classifier_alias() {
        let pm = InMemoryPmSession::new(records()).with_schemas(vec![
            EntitySchema::classified("Task", "Task", None),
            EntitySchema::classified("Milestone", "Task", Some(MILESTONE_TYPE)),
            EntitySchema::plain("CalendarEvent"),
        ]);
        let calendar = InMemoryCalendar::new();
        let settings = settings();
        let orchestrator = SyncOrchestrator::new(&pm, &calendar, &settings);

        let report = orchestrator
            .on_entity_changed(&[EntityRef::new("task", "m1").with_object_type(MILESTONE_TYPE)]);

        let EntityOutcome::Synced { calendar_id, .. } = outcome(&report, "m1") else {
            panic!("expected synced outcome: {report:?}");
        };
        let (_, event) = &calendar.events(calendar_id)[0];
        assert_eq!(
            event.correlation(),
            Some(Correlation::new("m1", EntityKind::Milestone))
        );
    }

    #[test]
    fn test_typed_context_that_is_not_calendarable_is_skipped() {
        let pm = InMemoryPmSession::new(records()).with_schemas(vec![
            EntitySchema::classified("Shot", "Task", Some(SHOT_TYPE)),
            EntitySchema::plain("Task"),
        ]);
        let calendar = InMemoryCalendar::new();
        let settings = settings();
        let orchestrator = SyncOrchestrator::new(&pm, &calendar, &settings);

        let report =
            orchestrator.on_entity_changed(&[EntityRef::new("task", "sh1").with_object_type(SHOT_TYPE)]);
        assert_eq!(report.skipped(), 1);
        assert!(calendar.writes().is_empty());
    }

    #[test]
    fn test_unresolvable_type_and_missing_entity_are_skipped() {
        let pm = InMemoryPmSession::new(records()).with_schemas(vec![EntitySchema::plain("Task")]);
        let calendar = InMemoryCalendar::new();
        let settings = settings();
        let orchestrator = SyncOrchestrator::new(&pm, &calendar, &settings);

        let report = orchestrator.on_entity_changed(&[
            EntityRef::new("calendarevent", "c1"),
            EntityRef::new("task", "gone"),
        ]);
        assert_eq!(report.skipped(), 2);
        assert!(calendar.writes().is_empty());
    }

    #[test]
    fn test_one_failure_does_not_abort_the_batch() {
        let pm = InMemoryPmSession::new(records());
        let calendar = InMemoryCalendar::new();
        let cal = calendar.add_calendar("ftrack");
        calendar.add_event(&cal, correlated_event("t1", EntityKind::Task));
        calendar.add_event(&cal, correlated_event("t1", EntityKind::Task));
        let settings = settings();
        let orchestrator = SyncOrchestrator::new(&pm, &calendar, &settings);

        let report = orchestrator.on_entity_changed(&[
            EntityRef::new("task", "t1"),
            EntityRef::new("task", "t2"),
        ]);

        assert!(matches!(outcome(&report, "t1"), EntityOutcome::Failed { error } if error.contains("ambiguous correlation")));
        assert!(matches!(outcome(&report, "t2"), EntityOutcome::Synced { .. }));
        assert!(report.has_failures());
    }

    #[test]
    fn test_entity_without_dates_is_skipped_without_writes() {
        let mut undated = task("t9");
        undated["end_date"] = Value::Null;
        let pm = InMemoryPmSession::new(vec![undated]);
        let calendar = InMemoryCalendar::new();
        let settings = settings();
        let orchestrator = SyncOrchestrator::new(&pm, &calendar, &settings);

        let report = orchestrator.on_entity_changed(&[EntityRef::new("task", "t9")]);
        assert!(matches!(outcome(&report, "t9"), EntityOutcome::Skipped { reason } if reason.contains("missing both dates")));
        assert!(calendar.writes().is_empty());
    }

    #[test]
    fn test_color_lookup_failure_is_cosmetic() {
        let pm = InMemoryPmSession::new(records());
        let calendar = InMemoryCalendar::new();
        calendar.fail_method("colors.get");
        let settings = settings();
        let orchestrator = SyncOrchestrator::new(&pm, &calendar, &settings);

        let report = orchestrator.on_entity_changed(&[EntityRef::new("task", "t1")]);
        assert!(matches!(
            outcome(&report, "t1"),
            EntityOutcome::Synced { color_id: None, .. }
        ));
    }

    #[test]
    fn test_bulk_sync_processes_all_sets() {
        let mut pm = InMemoryPmSession::new(records());
        pm.push(calendar_event("c2", true));
        let calendar = InMemoryCalendar::new();
        let settings = settings();
        let orchestrator = SyncOrchestrator::new(&pm, &calendar, &settings);

        let report = orchestrator.on_bulk_sync_requested(&["p1".to_string()]);
        let order: Vec<_> = report
            .entities
            .iter()
            .map(|e| e.entity_id.as_str())
            .collect();
        assert_eq!(order, vec!["c1", "c2", "m1", "t1", "t2"]);
        assert_eq!(report.synced(), 5);
        assert!(matches!(
            outcome(&report, "c2"),
            EntityOutcome::Synced { color_id: Some(c), .. } if c == "8"
        ));
    }

    #[test]
    fn test_bulk_sync_survives_failing_milestone_query() {
        let pm = InMemoryPmSession::new(records()).fail_queries_for("Milestone");
        let calendar = InMemoryCalendar::new();
        let settings = settings();
        let orchestrator = SyncOrchestrator::new(&pm, &calendar, &settings);

        let report = orchestrator.on_bulk_sync_requested(&["p1".to_string()]);
        assert_eq!(report.failed_sets.len(), 1);
        assert_eq!(report.failed_sets[0].entity_type, "Milestone");
        assert_eq!(report.synced(), 3);
        assert!(report.entities.iter().all(|e| e.entity_type != "Milestone"));
    }

    #[test]
    fn test_bulk_sync_by_intermediate_ancestor() {
        let pm = InMemoryPmSession::new(records());
        let calendar = InMemoryCalendar::new();
        let settings = settings();
        let orchestrator = SyncOrchestrator::new(&pm, &calendar, &settings);

        let report = orchestrator.on_bulk_sync_requested(&["seq-1".to_string()]);
        let ids: Vec<_> = report.entities.iter().map(|e| e.entity_id.as_str()).collect();
        assert_eq!(ids, vec!["t1", "t2"]);
    }

    #[test]
    fn test_empty_selection_does_nothing() {
        let pm = InMemoryPmSession::new(records());
        let calendar = InMemoryCalendar::new();
        let settings = settings();
        let report = SyncOrchestrator::new(&pm, &calendar, &settings).on_bulk_sync_requested(&[]);
        assert!(report.entities.is_empty());
        assert!(calendar.ops().is_empty());
    }

    #[test]
    fn test_unshared_calendar_is_reported_on_outcome() {
        let pm = InMemoryPmSession::new(records());
        let calendar = InMemoryCalendar::new();
        let settings = CalendarConfig::default();
        let orchestrator = SyncOrchestrator::new(&pm, &calendar, &settings);

        let report = orchestrator.on_entity_changed(&[EntityRef::new("task", "t1")]);

        let EntityOutcome::Synced { warnings, .. } = outcome(&report, "t1") else {
            panic!("expected synced outcome: {report:?}");
        };
        assert!(matches!(
            warnings.as_slice(),
            [ProvisionWarning::ShareSkipped { .. }]
        ));
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["entities"][0]["warnings"][0]["step"], "share_skipped");
    }
}
