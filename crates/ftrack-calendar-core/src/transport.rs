//! Blocking bridge over the async HTTP client.
//!
//! The sync pipeline is synchronous end to end; each HTTP adapter owns a
//! current-thread runtime and blocks on it per request.

use reqwest::Response;
use serde::de::DeserializeOwned;

use crate::error::{Result, SyncError};

/// Build the runtime an adapter blocks on.
pub(crate) fn runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?)
}

/// Decode a JSON response, turning non-2xx statuses into
/// [`SyncError::RemoteService`].
pub(crate) async fn read_json<T: DeserializeOwned>(
    response: Response,
    service: &'static str,
) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(SyncError::RemoteService {
            service,
            status: status.as_u16(),
            message,
        });
    }

    let bytes = response.bytes().await?;
    if bytes.is_empty() {
        // Endpoints such as calendarList.insert may answer 204.
        return Ok(serde_json::from_str("null")?);
    }
    Ok(serde_json::from_slice(&bytes)?)
}
