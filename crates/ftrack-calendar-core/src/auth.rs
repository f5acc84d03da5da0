//! Google credentials and access tokens.
//!
//! The credential blob comes from the `GOOGLE_SERVICE_AUTH` environment
//! variable. Three shapes are usable:
//!
//! 1. `{"type": "service_account", "client_email", "private_key"}`: the
//!    sync's own identity. An RS256-signed JWT assertion scoped to the
//!    Calendar API is exchanged at the token endpoint.
//! 2. `{"type": "authorized_user", "client_id", "client_secret", "refresh_token"}`:
//!    exchanged with a refresh-token grant
//! 3. `{"access_token": "..."}`: a bearer token minted elsewhere
//!
//! Exchanged tokens are cached until shortly before expiry.

use std::fmt;
use std::sync::Mutex;

use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{AuthError, Result, SyncError};

/// Environment variable holding the credential blob.
pub const GOOGLE_AUTH_ENV: &str = "GOOGLE_SERVICE_AUTH";
pub const DEFAULT_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const CALENDAR_SCOPE: &str = "https://www.googleapis.com/auth/calendar";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
/// Longest assertion lifetime the token endpoint accepts.
const ASSERTION_LIFETIME_SECS: i64 = 3600;
/// Seconds before expiry at which a cached token is refreshed.
const EXPIRY_BUFFER_SECS: i64 = 60;

/// Parsed credential blob.
#[derive(Clone, PartialEq, Eq)]
pub enum GoogleCredentials {
    AccessToken(String),
    AuthorizedUser {
        client_id: String,
        client_secret: String,
        refresh_token: String,
        token_uri: String,
    },
    ServiceAccount {
        client_email: String,
        /// PEM-encoded RSA key.
        private_key: String,
        token_uri: String,
    },
}

impl fmt::Debug for GoogleCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AccessToken(_) => f.write_str("AccessToken([redacted])"),
            Self::AuthorizedUser {
                client_id,
                token_uri,
                ..
            } => f
                .debug_struct("AuthorizedUser")
                .field("client_id", client_id)
                .field("token_uri", token_uri)
                .finish_non_exhaustive(),
            Self::ServiceAccount {
                client_email,
                token_uri,
                ..
            } => f
                .debug_struct("ServiceAccount")
                .field("client_email", client_email)
                .field("token_uri", token_uri)
                .finish_non_exhaustive(),
        }
    }
}

impl GoogleCredentials {
    /// Read and parse the blob from [`GOOGLE_AUTH_ENV`].
    pub fn from_env() -> Result<Self, AuthError> {
        let raw = std::env::var(GOOGLE_AUTH_ENV)
            .map_err(|_| AuthError::CredentialsNotConfigured(GOOGLE_AUTH_ENV))?;
        Self::parse(&raw)
    }

    /// Parse a blob. Single quotes are accepted in place of double quotes,
    /// since the variable is commonly exported that way from shell scripts.
    pub fn parse(raw: &str) -> Result<Self, AuthError> {
        let normalized = raw.trim().replace('\'', "\"");
        if normalized.is_empty() {
            return Err(AuthError::CredentialsNotConfigured(GOOGLE_AUTH_ENV));
        }
        let blob: Value = serde_json::from_str(&normalized)
            .map_err(|e| AuthError::InvalidCredentials(e.to_string()))?;

        if let Some(token) = blob.get("access_token").and_then(Value::as_str) {
            return Ok(GoogleCredentials::AccessToken(token.to_string()));
        }

        let field = |name: &str| {
            blob.get(name)
                .and_then(Value::as_str)
                .map(String::from)
                .ok_or_else(|| AuthError::InvalidCredentials(format!("missing '{name}'")))
        };
        let token_uri = blob
            .get("token_uri")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_TOKEN_URL)
            .to_string();

        match blob.get("type").and_then(Value::as_str) {
            Some("service_account") => Ok(GoogleCredentials::ServiceAccount {
                client_email: field("client_email")?,
                private_key: field("private_key")?,
                token_uri,
            }),
            Some("authorized_user") => Ok(GoogleCredentials::AuthorizedUser {
                client_id: field("client_id")?,
                client_secret: field("client_secret")?,
                refresh_token: field("refresh_token")?,
                token_uri,
            }),
            Some(other) => Err(AuthError::UnsupportedCredentialType(other.to_string())),
            None => Err(AuthError::InvalidCredentials(
                "expected 'access_token' or 'type'".into(),
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthTokens {
    pub access_token: String,
    pub expires_at: Option<i64>, // Unix timestamp
    pub token_type: String,
}

/// Check if a token is expired (with 60s buffer).
pub fn is_expired(tokens: &OAuthTokens) -> bool {
    match tokens.expires_at {
        Some(exp) => chrono::Utc::now().timestamp() > exp - EXPIRY_BUFFER_SECS,
        None => false,
    }
}

/// Claims of a service-account JWT-bearer assertion.
#[derive(Debug, Serialize, Deserialize)]
struct AssertionClaims {
    iss: String,
    scope: String,
    aud: String,
    iat: i64,
    exp: i64,
}

/// Sign the assertion a service account trades for an access token.
fn service_account_assertion(
    client_email: &str,
    private_key: &str,
    token_uri: &str,
    issued_at: i64,
) -> Result<String, AuthError> {
    let key = EncodingKey::from_rsa_pem(private_key.as_bytes())
        .map_err(|e| AuthError::InvalidServiceAccountKey(e.to_string()))?;
    let claims = AssertionClaims {
        iss: client_email.to_string(),
        scope: CALENDAR_SCOPE.to_string(),
        aud: token_uri.to_string(),
        iat: issued_at,
        exp: issued_at + ASSERTION_LIFETIME_SECS,
    };
    jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &key)
        .map_err(|e| AuthError::InvalidServiceAccountKey(e.to_string()))
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<i64>,
    token_type: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

/// Hands out bearer tokens, refreshing them when needed.
#[derive(Debug)]
pub struct GoogleAuth {
    credentials: GoogleCredentials,
    cached: Mutex<Option<OAuthTokens>>,
}

impl GoogleAuth {
    pub fn new(credentials: GoogleCredentials) -> Self {
        Self {
            credentials,
            cached: Mutex::new(None),
        }
    }

    /// A bearer token valid for at least the expiry buffer.
    pub async fn access_token(&self, client: &Client) -> Result<String> {
        if let GoogleCredentials::AccessToken(token) = &self.credentials {
            return Ok(token.clone());
        }

        if let Some(tokens) = self.cached_tokens() {
            if !is_expired(&tokens) {
                return Ok(tokens.access_token);
            }
            debug!("cached Google token expired");
        }

        let tokens = self.exchange(client).await?;
        let access_token = tokens.access_token.clone();
        *self.cached.lock().unwrap_or_else(|p| p.into_inner()) = Some(tokens);
        Ok(access_token)
    }

    async fn exchange(&self, client: &Client) -> Result<OAuthTokens> {
        match &self.credentials {
            GoogleCredentials::AccessToken(token) => Ok(OAuthTokens {
                access_token: token.clone(),
                expires_at: None,
                token_type: "Bearer".to_string(),
            }),
            GoogleCredentials::AuthorizedUser {
                client_id,
                client_secret,
                refresh_token,
                token_uri,
            } => {
                let params = [
                    ("client_id", client_id.as_str()),
                    ("client_secret", client_secret.as_str()),
                    ("refresh_token", refresh_token.as_str()),
                    ("grant_type", "refresh_token"),
                ];
                request_token(client, token_uri, &params).await
            }
            GoogleCredentials::ServiceAccount {
                client_email,
                private_key,
                token_uri,
            } => {
                let assertion = service_account_assertion(
                    client_email,
                    private_key,
                    token_uri,
                    chrono::Utc::now().timestamp(),
                )?;
                debug!(client_email = %client_email, "requesting service account token");
                let params = [("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())];
                request_token(client, token_uri, &params).await
            }
        }
    }

    fn cached_tokens(&self) -> Option<OAuthTokens> {
        self.cached
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }
}

/// Post a token grant and read the token response.
async fn request_token(
    client: &Client,
    token_uri: &str,
    params: &[(&str, &str)],
) -> Result<OAuthTokens> {
    let resp = client.post(token_uri).form(params).send().await?;
    let status = resp.status();
    let body: TokenResponse = resp.json().await.map_err(|e| {
        SyncError::Auth(AuthError::TokenRefreshFailed(format!(
            "unreadable token response ({status}): {e}"
        )))
    })?;

    if let Some(error) = body.error {
        let detail = body.error_description.unwrap_or_default();
        return Err(AuthError::TokenRefreshFailed(format!("{error} {detail}").trim().to_string()).into());
    }
    let access_token = body
        .access_token
        .ok_or_else(|| AuthError::TokenRefreshFailed(format!("no access_token in response ({status})")))?;

    info!("obtained Google access token");
    Ok(OAuthTokens {
        access_token,
        expires_at: body
            .expires_in
            .map(|secs| chrono::Utc::now().timestamp() + secs),
        token_type: body.token_type.unwrap_or_else(|| "Bearer".to_string()),
    })
}
