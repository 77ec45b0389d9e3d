//! Calendar credential session management.
//!
//! The durable credential is a refresh token obtained from the one-time
//! authorization handshake and supplied through configuration. At runtime it
//! is exchanged for short-lived access tokens, cached here as an explicit
//! session with a known expiry and refreshed ahead of it. Without a refresh
//! token every calendar operation fails as upstream-unavailable.

use careslot_domain::{CalendarConfig, CareslotError, Result};
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::debug;

/// Configuration for the calendar credential exchange.
#[derive(Debug, Clone)]
pub struct CalendarAuthSettings {
    pub token_endpoint: String,
    pub client_id: String,
    pub client_secret: Option<String>,
    pub refresh_token: Option<String>,
    /// Refresh when the cached token expires within this many seconds.
    pub refresh_threshold_seconds: i64,
}

impl From<&CalendarConfig> for CalendarAuthSettings {
    fn from(config: &CalendarConfig) -> Self {
        Self {
            token_endpoint: config.token_endpoint.clone(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            refresh_token: config.refresh_token.clone(),
            refresh_threshold_seconds: config.refresh_threshold_seconds,
        }
    }
}

/// A live access token with its expiry instant.
#[derive(Debug, Clone)]
pub struct CalendarSession {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

impl CalendarSession {
    fn expires_within(&self, threshold_seconds: i64) -> bool {
        self.expires_at - Utc::now() <= Duration::seconds(threshold_seconds)
    }
}

/// Credential manager for the calendar integration.
pub struct CalendarAuthenticator {
    settings: CalendarAuthSettings,
    http: Client,
    session: Mutex<Option<CalendarSession>>,
}

impl CalendarAuthenticator {
    /// Create a new authenticator from settings.
    pub fn new(settings: CalendarAuthSettings) -> Self {
        Self { settings, http: Client::new(), session: Mutex::new(None) }
    }

    /// Whether the authorization handshake has been completed.
    pub fn is_authorized(&self) -> bool {
        self.settings.refresh_token.is_some()
    }

    /// Current access token, refreshing the session when needed.
    pub async fn access_token(&self) -> Result<String> {
        let refresh_token = self.settings.refresh_token.as_deref().ok_or_else(|| {
            CareslotError::Upstream("calendar authorization handshake not completed".to_string())
        })?;

        let mut guard = self.session.lock().await;
        if let Some(session) = guard.as_ref() {
            if !session.expires_within(self.settings.refresh_threshold_seconds) {
                return Ok(session.access_token.clone());
            }
        }

        let session = self.refresh(refresh_token).await?;
        let access_token = session.access_token.clone();
        *guard = Some(session);

        Ok(access_token)
    }

    async fn refresh(&self, refresh_token: &str) -> Result<CalendarSession> {
        debug!("refreshing calendar access token");

        let mut form = vec![
            ("client_id", self.settings.client_id.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];
        if let Some(secret) = self.settings.client_secret.as_deref() {
            form.push(("client_secret", secret));
        }

        let response = self
            .http
            .post(&self.settings.token_endpoint)
            .form(&form)
            .send()
            .await
            .map_err(|err| {
                CareslotError::Upstream(format!("token refresh request failed: {err}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_else(|_| "unknown error".to_string());
            return Err(CareslotError::Upstream(format!(
                "token refresh failed ({status}): {error_text}"
            )));
        }

        let refreshed: TokenRefreshResponse = response.json().await.map_err(|err| {
            CareslotError::Upstream(format!("failed to parse token response: {err}"))
        })?;

        Ok(CalendarSession {
            access_token: refreshed.access_token,
            expires_at: Utc::now() + Duration::seconds(refreshed.expires_in),
        })
    }
}

#[derive(Debug, Deserialize)]
struct TokenRefreshResponse {
    access_token: String,
    expires_in: i64,
}
