//! Calendar provisioning: find the named calendar or create it, and keep it
//! shared with the configured group.

use serde::Serialize;
use tracing::{error, info, warn};

use crate::calendar::{AclRule, CalendarApi, NewCalendar};
use crate::config::CalendarConfig;
use crate::error::Result;

/// A provisioning step that failed after the calendar itself was usable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum ProvisionWarning {
    /// The new calendar is missing from the account's own list, so later
    /// lookups will not find it.
    ListInsertFailed { message: String },
    /// The calendar is not accessible to the share group.
    ShareFailed { message: String },
    /// No share group is configured, so the calendar stays private.
    ShareSkipped { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvisionedCalendar {
    pub name: String,
    pub id: String,
    pub created: bool,
    pub warnings: Vec<ProvisionWarning>,
}

pub struct CalendarRegistry<'a> {
    api: &'a dyn CalendarApi,
    settings: &'a CalendarConfig,
}

impl<'a> CalendarRegistry<'a> {
    pub fn new(api: &'a dyn CalendarApi, settings: &'a CalendarConfig) -> Self {
        Self { api, settings }
    }

    /// Return the id of the calendar called `name`, creating it if needed.
    ///
    /// Only the creation itself can fail; list insertion and sharing
    /// failures are returned as warnings together with the id.
    pub fn ensure(&self, name: &str) -> Result<ProvisionedCalendar> {
        if let Some(id) = self.find(name)? {
            info!(calendar = name, calendar_id = %id, "found existing calendar");
            let warnings = self.share(&id).into_iter().collect();
            return Ok(ProvisionedCalendar {
                name: name.to_string(),
                id,
                created: false,
                warnings,
            });
        }

        warn!(calendar = name, "calendar not found, creating it");
        let created = self.api.insert_calendar(&NewCalendar {
            summary: name.to_string(),
            time_zone: self.settings.time_zone.clone(),
        })?;
        info!(calendar = name, calendar_id = %created.id, "created calendar");

        let mut warnings = Vec::new();
        if let Err(e) = self.api.insert_calendar_list_entry(&created.id) {
            error!(calendar_id = %created.id, error = %e, "failed to add calendar to the account list, it may be in a bad state");
            warnings.push(ProvisionWarning::ListInsertFailed {
                message: e.to_string(),
            });
        }
        warnings.extend(self.share(&created.id));

        Ok(ProvisionedCalendar {
            name: name.to_string(),
            id: created.id,
            created: true,
            warnings,
        })
    }

    /// Page through the whole calendar list; the first exact match wins.
    fn find(&self, name: &str) -> Result<Option<String>> {
        let mut matches = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let page = self.api.list_calendars(page_token.as_deref())?;
            matches.extend(
                page.items
                    .into_iter()
                    .filter(|entry| entry.summary == name)
                    .map(|entry| entry.id),
            );
            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        if matches.len() > 1 {
            warn!(
                calendar = name,
                count = matches.len(),
                chosen = %matches[0],
                "duplicate calendars share this name, using the first listed"
            );
        }
        Ok(matches.into_iter().next())
    }

    /// Grant the share group access. Repeating the grant is harmless.
    fn share(&self, calendar_id: &str) -> Option<ProvisionWarning> {
        let Some(group) = self.settings.share_group.as_deref() else {
            warn!(calendar_id, "no share group configured, calendar stays private");
            return Some(ProvisionWarning::ShareSkipped {
                reason: "calendar.share_group is not set".into(),
            });
        };

        let rule = AclRule::group(group, &self.settings.share_role);
        match self.api.insert_acl(calendar_id, &rule) {
            Ok(()) => None,
            Err(e) => {
                error!(calendar_id, group, error = %e, "couldn't share calendar");
                Some(ProvisionWarning::ShareFailed {
                    message: e.to_string(),
                })
            }
        }
    }
}
