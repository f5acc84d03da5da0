//! ftrack JSON API session.
//!
//! Every call is a POST of an operation list to `{server}/api`, authenticated
//! with the `ftrack-user` / `ftrack-api-key` headers. Results come back as a
//! list in operation order; server-side failures come back as an object with
//! an `exception` field instead.

use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

use super::query::Query;
use super::schema::EntitySchema;
use super::PmSession;
use crate::error::{Result, SyncError};
use crate::transport;

const SERVICE: &str = "ftrack";

/// Session against an ftrack server.
pub struct FtrackSession {
    server_url: String,
    api_user: String,
    api_key: String,
    http_client: Client,
    runtime: tokio::runtime::Runtime,
}

impl FtrackSession {
    /// Create a new session. No request is made until first use.
    pub fn new(server_url: &str, api_user: &str, api_key: &str) -> Result<Self> {
        Ok(Self {
            server_url: server_url.trim_end_matches('/').to_string(),
            api_user: api_user.to_string(),
            api_key: api_key.to_string(),
            http_client: Client::new(),
            runtime: transport::runtime()?,
        })
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    /// Run a single operation and return its result.
    fn call(&self, operation: Value) -> Result<Value> {
        let url = format!("{}/api", self.server_url);
        let request = self
            .http_client
            .post(&url)
            .header("ftrack-user", &self.api_user)
            .header("ftrack-api-key", &self.api_key)
            .header("Accept", "application/json")
            .json(&json!([operation]));

        let body: Value = self.runtime.block_on(async {
            let response = request.send().await?;
            transport::read_json(response, SERVICE).await
        })?;

        if let Some(exception) = body.get("exception") {
            let content = body["content"].as_str().unwrap_or_default();
            return Err(SyncError::remote(
                SERVICE,
                format!("{}: {}", exception.as_str().unwrap_or("ServerError"), content),
            ));
        }

        match body {
            Value::Array(mut results) if !results.is_empty() => Ok(results.swap_remove(0)),
            other => Err(SyncError::remote(
                SERVICE,
                format!("unexpected response shape: {other}"),
            )),
        }
    }
}

impl PmSession for FtrackSession {
    fn schemas(&self) -> Result<Vec<EntitySchema>> {
        let result = self.call(json!({"action": "query_schemas"}))?;
        Ok(serde_json::from_value(result)?)
    }

    fn query(&self, query: &Query) -> Result<Vec<Value>> {
        let expression = query.expression();
        debug!(%expression, "ftrack query");

        let result = self.call(json!({"action": "query", "expression": expression}))?;
        match result.get("data") {
            Some(Value::Array(data)) => Ok(data.clone()),
            _ => Err(SyncError::remote(
                SERVICE,
                format!("query result without data for {}", query.schema),
            )),
        }
    }
}
