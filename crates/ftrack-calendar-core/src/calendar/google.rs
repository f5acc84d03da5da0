//! Google Calendar v3 REST client.

use reqwest::{Client, Method};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::types::{
    AclRule, CalendarListPage, CalendarResource, ColorPalette, EventListPage, NewCalendar,
    RemoteEvent,
};
use super::CalendarApi;
use crate::auth::GoogleAuth;
use crate::error::{ConfigError, Result};
use crate::event::Event;
use crate::transport;

pub const DEFAULT_API_BASE: &str = "https://www.googleapis.com/calendar/v3";
const SERVICE: &str = "google";

/// Calendar API client acting as the configured account.
pub struct GoogleCalendarClient {
    base_url: Url,
    http_client: Client,
    auth: GoogleAuth,
    runtime: tokio::runtime::Runtime,
}

impl GoogleCalendarClient {
    pub fn new(auth: GoogleAuth) -> Result<Self> {
        Self::with_base_url(auth, DEFAULT_API_BASE)
    }

    pub fn with_base_url(auth: GoogleAuth, base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url).map_err(|e| {
            ConfigError::ParseFailed(format!("invalid calendar api base '{base_url}': {e}"))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ConfigError::ParseFailed(format!(
                "calendar api base '{base_url}' cannot carry a path"
            ))
            .into());
        }
        Ok(Self {
            base_url,
            http_client: Client::new(),
            auth,
            runtime: transport::runtime()?,
        })
    }

    /// Base URL with `segments` appended, each percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn send<T: DeserializeOwned>(&self, method: Method, url: Url, body: Option<Value>) -> Result<T> {
        debug!(%method, %url, "calendar request");
        self.runtime.block_on(async {
            let token = self.auth.access_token(&self.http_client).await?;
            let mut request = self.http_client.request(method, url).bearer_auth(token);
            if let Some(body) = body {
                request = request.json(&body);
            }
            let response = request.send().await?;
            transport::read_json(response, SERVICE).await
        })
    }
}

fn with_page_token(url: &mut Url, page_token: Option<&str>) {
    if let Some(token) = page_token {
        url.query_pairs_mut().append_pair("pageToken", token);
    }
}

/// Writes never notify attendees.
fn without_notifications(url: &mut Url) {
    url.query_pairs_mut().append_pair("sendUpdates", "none");
}

impl CalendarApi for GoogleCalendarClient {
    fn list_calendars(&self, page_token: Option<&str>) -> Result<CalendarListPage> {
        let mut url = self.endpoint(&["users", "me", "calendarList"]);
        with_page_token(&mut url, page_token);
        self.send(Method::GET, url, None)
    }

    fn insert_calendar(&self, calendar: &NewCalendar) -> Result<CalendarResource> {
        let url = self.endpoint(&["calendars"]);
        self.send(Method::POST, url, Some(serde_json::to_value(calendar)?))
    }

    fn insert_calendar_list_entry(&self, calendar_id: &str) -> Result<()> {
        let url = self.endpoint(&["users", "me", "calendarList"]);
        let _: IgnoredAny = self.send(
            Method::POST,
            url,
            Some(serde_json::json!({ "id": calendar_id })),
        )?;
        Ok(())
    }

    fn insert_acl(&self, calendar_id: &str, rule: &AclRule) -> Result<()> {
        let url = self.endpoint(&["calendars", calendar_id, "acl"]);
        let _: IgnoredAny = self.send(Method::POST, url, Some(serde_json::to_value(rule)?))?;
        Ok(())
    }

    fn list_events(
        &self,
        calendar_id: &str,
        private_properties: &[(String, String)],
        page_token: Option<&str>,
    ) -> Result<EventListPage> {
        let mut url = self.endpoint(&["calendars", calendar_id, "events"]);
        {
            let mut query = url.query_pairs_mut();
            for (key, value) in private_properties {
                query.append_pair("privateExtendedProperty", &format!("{key}={value}"));
            }
        }
        with_page_token(&mut url, page_token);
        self.send(Method::GET, url, None)
    }

    fn insert_event(&self, calendar_id: &str, event: &Event) -> Result<String> {
        let mut url = self.endpoint(&["calendars", calendar_id, "events"]);
        without_notifications(&mut url);
        let created: RemoteEvent =
            self.send(Method::POST, url, Some(serde_json::to_value(event)?))?;
        Ok(created.id)
    }

    fn update_event(&self, calendar_id: &str, event_id: &str, event: &Event) -> Result<()> {
        let mut url = self.endpoint(&["calendars", calendar_id, "events", event_id]);
        without_notifications(&mut url);
        let _: IgnoredAny = self.send(Method::PUT, url, Some(serde_json::to_value(event)?))?;
        Ok(())
    }

    fn colors(&self) -> Result<ColorPalette> {
        let url = self.endpoint(&["colors"]);
        self.send(Method::GET, url, None)
    }
}

impl std::fmt::Debug for GoogleCalendarClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleCalendarClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}
