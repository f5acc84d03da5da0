//! Core error types for ftrack-calendar-core.
//!
//! Every failure a single entity can hit while being projected onto the
//! calendar is a [`SyncError`] variant. The orchestrator decides per variant
//! whether the entity counts as skipped or failed; no variant aborts a batch.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for ftrack-calendar-core.
#[derive(Error, Debug)]
pub enum SyncError {
    /// The entity lacks data required to build a calendar event.
    #[error("Mapping error: {0}")]
    Mapping(String),

    /// The project color could not be matched to a palette entry.
    #[error("Color resolution error: {0}")]
    ColorResolution(String),

    /// Remote calendar state does not allow a safe create-or-update.
    #[error("Reconciliation error: {0}")]
    Reconciliation(String),

    /// A notification type string has no queryable schema.
    #[error("Unable to translate entity type '{entity_type}'")]
    UnresolvableType { entity_type: String },

    /// The entity is not a task, milestone or calendar event.
    #[error("Entity type '{0}' cannot be put on a calendar")]
    NotCalendarable(String),

    /// The PM system returned no entity for a notification.
    #[error("{entity_type} {entity_id} not found")]
    EntityNotFound {
        entity_type: String,
        entity_id: String,
    },

    /// Remote service answered with an error (calendar or PM system).
    #[error("Remote error from {service} ({status}): {message}")]
    RemoteService {
        service: &'static str,
        status: u16,
        message: String,
    },

    /// Transport failure talking to a remote service.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Credential errors
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SyncError {
    /// Build a remote error for a service that reported failure without an
    /// HTTP status of its own (e.g. an ftrack `exception` payload).
    pub fn remote(service: &'static str, message: impl Into<String>) -> Self {
        SyncError::RemoteService {
            service,
            status: 0,
            message: message.into(),
        }
    }

    /// Whether this error means "leave the entity alone" rather than
    /// "the entity should have synced but did not".
    pub fn is_skip(&self) -> bool {
        matches!(
            self,
            SyncError::Mapping(_)
                | SyncError::UnresolvableType { .. }
                | SyncError::NotCalendarable(_)
                | SyncError::EntityNotFound { .. }
        )
    }
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Missing required configuration key
    #[error("Missing required configuration key: {0}")]
    MissingKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    /// Home directory could not be determined
    #[error("Could not determine the configuration directory")]
    NoConfigDir,
}

/// Credential errors.
#[derive(Error, Debug)]
pub enum AuthError {
    /// No credential blob in the environment.
    #[error("Google credentials not configured (set {0})")]
    CredentialsNotConfigured(&'static str),

    /// The blob is not JSON or has an unknown shape.
    #[error("Invalid Google credentials: {0}")]
    InvalidCredentials(String),

    /// A credential type that cannot mint Calendar tokens.
    #[error("Unsupported credential type '{0}': provide an access_token, authorized_user or service_account credential")]
    UnsupportedCredentialType(String),

    /// The service account's private key could not sign an assertion.
    #[error("Invalid service account key: {0}")]
    InvalidServiceAccountKey(String),

    /// Token refresh failed
    #[error("Token refresh failed: {0}")]
    TokenRefreshFailed(String),
}

/// Result type alias for SyncError
pub type Result<T, E = SyncError> = std::result::Result<T, E>;
