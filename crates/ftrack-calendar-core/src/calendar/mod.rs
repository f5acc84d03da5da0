//! Calendar side: wire types, the calendar port and its adapters.

pub mod google;
pub mod memory;
pub mod types;

pub use google::GoogleCalendarClient;
pub use memory::{CalendarOp, InMemoryCalendar};
pub use types::{
    AclRule, AclScope, CalendarListEntry, CalendarListPage, CalendarResource, ColorDefinition,
    ColorPalette, EventListPage, NewCalendar, RemoteEvent,
};

use crate::error::Result;
use crate::event::Event;

/// The subset of the Google Calendar v3 API the sync uses.
///
/// One method per remote call; paging is left to the caller so that the
/// registry and reconciler can decide when to stop.
pub trait CalendarApi {
    /// `calendarList.list`
    fn list_calendars(&self, page_token: Option<&str>) -> Result<CalendarListPage>;

    /// `calendars.insert`
    fn insert_calendar(&self, calendar: &NewCalendar) -> Result<CalendarResource>;

    /// `calendarList.insert`
    fn insert_calendar_list_entry(&self, calendar_id: &str) -> Result<()>;

    /// `acl.insert`
    fn insert_acl(&self, calendar_id: &str, rule: &AclRule) -> Result<()>;

    /// `events.list` restricted to events carrying every given private
    /// extended property.
    fn list_events(
        &self,
        calendar_id: &str,
        private_properties: &[(String, String)],
        page_token: Option<&str>,
    ) -> Result<EventListPage>;

    /// `events.insert`, returns the new event id.
    fn insert_event(&self, calendar_id: &str, event: &Event) -> Result<String>;

    /// `events.update` (full replacement).
    fn update_event(&self, calendar_id: &str, event_id: &str, event: &Event) -> Result<()>;

    /// `colors.get`
    fn colors(&self) -> Result<ColorPalette>;
}
