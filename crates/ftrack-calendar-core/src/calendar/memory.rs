//! In-memory calendar service.
//!
//! Behaves like the remote service for every call the sync makes: calendars
//! created through `calendars.insert` only become visible in the list after
//! `calendarList.insert`, listings are paged, and `events.list` filters on
//! private extended properties. Every call is logged so tests and the CLI's
//! dry-run mode can report what would have been written.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

use serde::Serialize;

use super::types::{
    AclRule, CalendarListEntry, CalendarListPage, CalendarResource, ColorDefinition, ColorPalette,
    EventListPage, NewCalendar, RemoteEvent,
};
use super::CalendarApi;
use crate::error::{Result, SyncError};
use crate::event::Event;

const SERVICE: &str = "google";
const DEFAULT_PAGE_SIZE: usize = 100;

/// One recorded call against the in-memory calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum CalendarOp {
    ListCalendars,
    InsertCalendar { summary: String },
    InsertCalendarListEntry { calendar_id: String },
    InsertAcl { calendar_id: String, principal: String },
    ListEvents { calendar_id: String },
    InsertEvent { calendar_id: String, event_id: String },
    UpdateEvent { calendar_id: String, event_id: String },
    Colors,
}

impl CalendarOp {
    /// API method name, as used by [`InMemoryCalendar::fail_method`].
    pub fn method(&self) -> &'static str {
        match self {
            CalendarOp::ListCalendars => "calendarList.list",
            CalendarOp::InsertCalendar { .. } => "calendars.insert",
            CalendarOp::InsertCalendarListEntry { .. } => "calendarList.insert",
            CalendarOp::InsertAcl { .. } => "acl.insert",
            CalendarOp::ListEvents { .. } => "events.list",
            CalendarOp::InsertEvent { .. } => "events.insert",
            CalendarOp::UpdateEvent { .. } => "events.update",
            CalendarOp::Colors => "colors.get",
        }
    }

    pub fn is_write(&self) -> bool {
        !matches!(
            self,
            CalendarOp::ListCalendars | CalendarOp::ListEvents { .. } | CalendarOp::Colors
        )
    }
}

#[derive(Debug)]
struct StoredCalendar {
    id: String,
    summary: String,
    time_zone: Option<String>,
    listed: bool,
}

#[derive(Debug)]
struct StoredEvent {
    calendar_id: String,
    id: String,
    event: Event,
}

#[derive(Debug)]
struct State {
    calendars: Vec<StoredCalendar>,
    acls: Vec<(String, AclRule)>,
    events: Vec<StoredEvent>,
    palette: ColorPalette,
    ops: Vec<CalendarOp>,
    failing: HashSet<&'static str>,
    next_id: u64,
}

impl State {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }
}

/// Calendar service held entirely in process memory.
#[derive(Debug)]
pub struct InMemoryCalendar {
    state: Mutex<State>,
    page_size: usize,
}

impl Default for InMemoryCalendar {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryCalendar {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                calendars: Vec::new(),
                acls: Vec::new(),
                events: Vec::new(),
                palette: google_event_colors(),
                ops: Vec::new(),
                failing: HashSet::new(),
                next_id: 0,
            }),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Number of items per list page.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_palette(self, palette: ColorPalette) -> Self {
        self.lock().palette = palette;
        self
    }

    /// Make every call to `method` (e.g. `"acl.insert"`) fail.
    pub fn fail_method(&self, method: &'static str) {
        self.lock().failing.insert(method);
    }

    /// Seed a calendar already present in the account's list.
    pub fn add_calendar(&self, summary: &str) -> String {
        let mut state = self.lock();
        let id = state.next_id("cal");
        state.calendars.push(StoredCalendar {
            id: id.clone(),
            summary: summary.to_string(),
            time_zone: None,
            listed: true,
        });
        id
    }

    /// Seed an event without recording a write.
    pub fn add_event(&self, calendar_id: &str, event: Event) -> String {
        let mut state = self.lock();
        let id = state.next_id("evt");
        state.events.push(StoredEvent {
            calendar_id: calendar_id.to_string(),
            id: id.clone(),
            event,
        });
        id
    }

    /// Every call made so far, in order.
    pub fn ops(&self) -> Vec<CalendarOp> {
        self.lock().ops.clone()
    }

    pub fn writes(&self) -> Vec<CalendarOp> {
        self.lock().ops.iter().filter(|op| op.is_write()).cloned().collect()
    }

    pub fn clear_ops(&self) {
        self.lock().ops.clear();
    }

    /// Events stored in a calendar, with their ids.
    pub fn events(&self, calendar_id: &str) -> Vec<(String, Event)> {
        self.lock()
            .events
            .iter()
            .filter(|stored| stored.calendar_id == calendar_id)
            .map(|stored| (stored.id.clone(), stored.event.clone()))
            .collect()
    }

    pub fn acl_rules(&self, calendar_id: &str) -> Vec<AclRule> {
        self.lock()
            .acls
            .iter()
            .filter(|(id, _)| id == calendar_id)
            .map(|(_, rule)| rule.clone())
            .collect()
    }

    /// Calendars that exist, listed or not.
    pub fn calendar_count(&self) -> usize {
        self.lock().calendars.len()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Record `op` and fail it when its method was marked failing.
    fn record(&self, state: &mut State, op: CalendarOp) -> Result<()> {
        let method = op.method();
        state.ops.push(op);
        if state.failing.contains(method) {
            return Err(SyncError::RemoteService {
                service: SERVICE,
                status: 500,
                message: format!("{method} failed"),
            });
        }
        Ok(())
    }

    /// Slice one page out of `items` using a numeric offset token.
    fn page<T: Clone>(&self, items: &[T], page_token: Option<&str>) -> Result<(Vec<T>, Option<String>)> {
        let offset = match page_token {
            Some(token) => token.parse::<usize>().map_err(|_| SyncError::RemoteService {
                service: SERVICE,
                status: 400,
                message: format!("invalid page token '{token}'"),
            })?,
            None => 0,
        };
        let end = (offset + self.page_size).min(items.len());
        let page = items.get(offset..end).unwrap_or_default().to_vec();
        let next = (end < items.len()).then(|| end.to_string());
        Ok((page, next))
    }

    fn not_found(what: &str, id: &str) -> SyncError {
        SyncError::RemoteService {
            service: SERVICE,
            status: 404,
            message: format!("{what} {id} not found"),
        }
    }
}

impl CalendarApi for InMemoryCalendar {
    fn list_calendars(&self, page_token: Option<&str>) -> Result<CalendarListPage> {
        let mut state = self.lock();
        self.record(&mut state, CalendarOp::ListCalendars)?;

        let listed: Vec<CalendarListEntry> = state
            .calendars
            .iter()
            .filter(|c| c.listed)
            .map(|c| CalendarListEntry {
                id: c.id.clone(),
                summary: c.summary.clone(),
                access_role: None,
                time_zone: c.time_zone.clone(),
            })
            .collect();
        let (items, next_page_token) = self.page(&listed, page_token)?;
        Ok(CalendarListPage {
            items,
            next_page_token,
        })
    }

    fn insert_calendar(&self, calendar: &NewCalendar) -> Result<CalendarResource> {
        let mut state = self.lock();
        self.record(
            &mut state,
            CalendarOp::InsertCalendar {
                summary: calendar.summary.clone(),
            },
        )?;

        let id = state.next_id("cal");
        state.calendars.push(StoredCalendar {
            id: id.clone(),
            summary: calendar.summary.clone(),
            time_zone: Some(calendar.time_zone.clone()),
            listed: false,
        });
        Ok(CalendarResource {
            id,
            summary: calendar.summary.clone(),
            time_zone: Some(calendar.time_zone.clone()),
        })
    }

    fn insert_calendar_list_entry(&self, calendar_id: &str) -> Result<()> {
        let mut state = self.lock();
        self.record(
            &mut state,
            CalendarOp::InsertCalendarListEntry {
                calendar_id: calendar_id.to_string(),
            },
        )?;

        let calendar = state
            .calendars
            .iter_mut()
            .find(|c| c.id == calendar_id)
            .ok_or_else(|| Self::not_found("calendar", calendar_id))?;
        calendar.listed = true;
        Ok(())
    }

    fn insert_acl(&self, calendar_id: &str, rule: &AclRule) -> Result<()> {
        let mut state = self.lock();
        self.record(
            &mut state,
            CalendarOp::InsertAcl {
                calendar_id: calendar_id.to_string(),
                principal: rule.scope.value.clone(),
            },
        )?;

        if !state.calendars.iter().any(|c| c.id == calendar_id) {
            return Err(Self::not_found("calendar", calendar_id));
        }
        // One rule per scope; a repeated grant replaces the role.
        match state
            .acls
            .iter_mut()
            .find(|(id, existing)| id == calendar_id && existing.scope == rule.scope)
        {
            Some((_, existing)) => existing.role = rule.role.clone(),
            None => state.acls.push((calendar_id.to_string(), rule.clone())),
        }
        Ok(())
    }

    fn list_events(
        &self,
        calendar_id: &str,
        private_properties: &[(String, String)],
        page_token: Option<&str>,
    ) -> Result<EventListPage> {
        let mut state = self.lock();
        self.record(
            &mut state,
            CalendarOp::ListEvents {
                calendar_id: calendar_id.to_string(),
            },
        )?;

        let matching: Vec<RemoteEvent> = state
            .events
            .iter()
            .filter(|stored| stored.calendar_id == calendar_id)
            .filter(|stored| {
                let private = &stored.event.extended_properties.private;
                private_properties
                    .iter()
                    .all(|(key, value)| private.get(key) == Some(value))
            })
            .map(|stored| RemoteEvent {
                id: stored.id.clone(),
                summary: Some(stored.event.summary.clone()),
                status: Some("confirmed".to_string()),
                extended_properties: Some(stored.event.extended_properties.clone()),
            })
            .collect();
        let (items, next_page_token) = self.page(&matching, page_token)?;
        Ok(EventListPage {
            items,
            next_page_token,
        })
    }

    fn insert_event(&self, calendar_id: &str, event: &Event) -> Result<String> {
        let mut state = self.lock();
        let event_id = state.next_id("evt");
        self.record(
            &mut state,
            CalendarOp::InsertEvent {
                calendar_id: calendar_id.to_string(),
                event_id: event_id.clone(),
            },
        )?;

        if !state.calendars.iter().any(|c| c.id == calendar_id) {
            return Err(Self::not_found("calendar", calendar_id));
        }
        state.events.push(StoredEvent {
            calendar_id: calendar_id.to_string(),
            id: event_id.clone(),
            event: event.clone(),
        });
        Ok(event_id)
    }

    fn update_event(&self, calendar_id: &str, event_id: &str, event: &Event) -> Result<()> {
        let mut state = self.lock();
        self.record(
            &mut state,
            CalendarOp::UpdateEvent {
                calendar_id: calendar_id.to_string(),
                event_id: event_id.to_string(),
            },
        )?;

        let stored = state
            .events
            .iter_mut()
            .find(|stored| stored.calendar_id == calendar_id && stored.id == event_id)
            .ok_or_else(|| Self::not_found("event", event_id))?;
        stored.event = event.clone();
        Ok(())
    }

    fn colors(&self) -> Result<ColorPalette> {
        let mut state = self.lock();
        self.record(&mut state, CalendarOp::Colors)?;
        Ok(state.palette.clone())
    }
}

/// The stock Google Calendar event swatches.
pub fn google_event_colors() -> ColorPalette {
    const EVENT_BACKGROUNDS: &[(&str, &str)] = &[
        ("1", "#a4bdfc"),
        ("2", "#7ae7bf"),
        ("3", "#dbadff"),
        ("4", "#ff887c"),
        ("5", "#fbd75b"),
        ("6", "#ffb878"),
        ("7", "#46d6db"),
        ("8", "#e1e1e1"),
        ("9", "#5484ed"),
        ("10", "#51b749"),
        ("11", "#dc2127"),
    ];

    ColorPalette {
        calendar: Default::default(),
        event: EVENT_BACKGROUNDS
            .iter()
            .map(|(id, background)| {
                (
                    id.to_string(),
                    ColorDefinition {
                        background: background.to_string(),
                        foreground: "#1d1d1d".to_string(),
                    },
                )
            })
            .collect(),
    }
}
