//! # ftrack-calendar Core Library
//!
//! Projects ftrack tasks, milestones and calendar events onto a shared
//! Google Calendar. The library holds all sync logic; the CLI binary only
//! wires configuration, credentials and logging around it.
//!
//! ## Architecture
//!
//! - **PM side** ([`pm`]): entity model, ftrack record decoding, schema alias
//!   resolution, query building and the [`PmSession`] port
//! - **Calendar side** ([`calendar`]): Calendar v3 wire types and the
//!   [`CalendarApi`] port
//! - **Sync**: color matching, event mapping, calendar provisioning,
//!   correlation-keyed reconciliation, and the orchestrator that ties them
//!   together per entity
//!
//! Both ports come with an HTTP adapter and an in-memory adapter; the
//! orchestrator receives them by reference and holds no state between calls.
//!
//! ## Key Components
//!
//! - [`SyncOrchestrator`]: notification and bulk-sync entry points
//! - [`CalendarRegistry`]: find-or-create of the shared calendar
//! - [`Reconciler`]: create-or-update keyed by private event properties
//! - [`Config`]: application configuration management

pub mod auth;
pub mod calendar;
pub mod color;
pub mod config;
pub mod error;
pub mod event;
pub mod hook;
pub mod mapper;
pub mod orchestrator;
pub mod pm;
pub mod reconciler;
pub mod registry;
pub mod report;
mod transport;

#[cfg(test)]
mod orchestrator_tests;

pub use auth::{GoogleAuth, GoogleCredentials};
pub use calendar::{CalendarApi, GoogleCalendarClient, InMemoryCalendar};
pub use color::{best_color, resolve_color, ColorMatch, Palette, Rgb};
pub use config::{CalendarConfig, Config, FtrackCredentials};
pub use error::{AuthError, ConfigError, Result, SyncError};
pub use event::{Correlation, Event};
pub use hook::{ActionLaunch, EntityRef, UpdateNotification};
pub use orchestrator::SyncOrchestrator;
pub use pm::{FtrackSession, InMemoryPmSession, PmEntity, PmSession};
pub use reconciler::{Reconciler, UpsertOutcome};
pub use registry::{CalendarRegistry, ProvisionWarning, ProvisionedCalendar};
pub use report::{EntityOutcome, SyncReport};
