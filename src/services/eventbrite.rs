// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Eventbrite API client.
//!
//! Handles:
//! - OAuth authorization code exchange
//! - Event listing for the connected organizer
//! - Paginated attendee roster fetches
//! - Single-attendee hydration from a webhook `api_url`
//!
//! Nothing here touches the attendee repository.

use crate::config::Config;
use crate::error::AppError;
use crate::services::credentials::CredentialStore;
use serde::Deserialize;
use serde_json::Value;

/// Upper bound on roster pages followed for one event.
const MAX_ROSTER_PAGES: usize = 100;

/// Eventbrite HTTP client (credential supplied per call).
#[derive(Clone)]
pub struct EventbriteClient {
    http: reqwest::Client,
    api_url: String,
    oauth_url: String,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
}

impl EventbriteClient {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(config.upstream_timeout)
            .build()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("HTTP client init failed: {}", e)))?;

        Ok(Self {
            http,
            api_url: config.eventbrite_api_url.clone(),
            oauth_url: config.eventbrite_oauth_url.clone(),
            client_id: config.eventbrite_client_id.clone(),
            client_secret: config.eventbrite_client_secret.clone(),
            redirect_uri: config.eventbrite_redirect_uri.clone(),
        })
    }

    /// URL of the Eventbrite consent page for the given signed state.
    pub fn authorize_url(&self, state: &str) -> String {
        format!(
            "{}/authorize?response_type=code&client_id={}&redirect_uri={}&state={}",
            self.oauth_url,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_uri),
            urlencoding::encode(state)
        )
    }

    /// Exchange an authorization code for tokens.
    ///
    /// Returns the raw token payload so callers can hand it back unchanged.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenExchange, AppError> {
        let response = self
            .http
            .post(format!("{}/token", self.oauth_url))
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("code", code),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| AppError::UpstreamUnavailable(format!("Token exchange failed: {}", e)))?;

        let raw: Value = check_response_json(response).await?;
        let tokens: TokenResponse = serde_json::from_value(raw.clone()).map_err(|e| {
            AppError::UpstreamUnavailable(format!("Failed to parse token response: {}", e))
        })?;

        Ok(TokenExchange { tokens, raw })
    }

    /// Events owned by the connected organizer.
    pub async fn list_events(&self, access_token: &str) -> Result<Vec<Value>, AppError> {
        let url = format!("{}/users/me/owned_events/", self.api_url);
        let page: EventsPage = self.get_json(&url, access_token, &[]).await?;
        Ok(page.events)
    }

    /// Every attendee of one event, following continuation tokens.
    pub async fn fetch_roster(
        &self,
        event_id: &str,
        access_token: &str,
    ) -> Result<Vec<Value>, AppError> {
        let url = format!(
            "{}/events/{}/attendees/",
            self.api_url,
            urlencoding::encode(event_id)
        );

        let mut attendees = Vec::new();
        let mut continuation: Option<String> = None;

        for page_number in 1..=MAX_ROSTER_PAGES {
            let query: Vec<(&str, String)> = continuation
                .iter()
                .map(|c| ("continuation", c.clone()))
                .collect();
            let page: RosterPage = self.get_json(&url, access_token, &query).await?;
            attendees.extend(page.attendees);

            match page.pagination {
                Some(Pagination {
                    has_more_items: true,
                    continuation: Some(next),
                }) => continuation = Some(next),
                _ => return Ok(attendees),
            }

            tracing::debug!(event_id, page_number, "Fetching next roster page");
        }

        tracing::warn!(
            event_id,
            pages = MAX_ROSTER_PAGES,
            fetched = attendees.len(),
            "Roster page limit reached, returning partial roster"
        );
        Ok(attendees)
    }

    /// Fetch one attendee by the `api_url` carried in a webhook.
    ///
    /// Only locators under the configured API base are followed, so a forged
    /// webhook cannot make us send the bearer token elsewhere.
    pub async fn fetch_by_reference(
        &self,
        api_url: &str,
        access_token: &str,
    ) -> Result<Value, AppError> {
        if !self.is_api_locator(api_url) {
            return Err(AppError::BadRequest(format!(
                "Reference locator outside Eventbrite API: {}",
                api_url
            )));
        }
        self.get_json(api_url, access_token, &[]).await
    }

    /// True if `locator` points into the configured API base.
    pub fn is_api_locator(&self, locator: &str) -> bool {
        locator
            .strip_prefix(&self.api_url)
            .is_some_and(|rest| rest.starts_with('/'))
    }

    /// Generic GET request with JSON response.
    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        access_token: &str,
        query: &[(&str, String)],
    ) -> Result<T, AppError> {
        let response = self
            .http
            .get(url)
            .bearer_auth(access_token)
            .query(query)
            .send()
            .await
            .map_err(|e| AppError::UpstreamUnavailable(e.to_string()))?;

        check_response_json(response).await
    }
}

/// Check response and parse JSON body.
async fn check_response_json<T: for<'de> Deserialize<'de>>(
    response: reqwest::Response,
) -> Result<T, AppError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();

        // Eventbrite answers a bad or revoked token with 401 (and a bad
        // authorization code with 400 invalid_grant).
        if status.as_u16() == 401 || status.as_u16() == 403 || body.contains("invalid_grant") {
            return Err(AppError::UpstreamAuth(format!("HTTP {}: {}", status, body)));
        }

        if status.as_u16() == 429 {
            tracing::warn!("Eventbrite rate limit hit (429)");
        }

        return Err(AppError::UpstreamUnavailable(format!(
            "HTTP {}: {}",
            status, body
        )));
    }

    response
        .json()
        .await
        .map_err(|e| AppError::UpstreamUnavailable(format!("JSON parse error: {}", e)))
}

/// Token exchange response from Eventbrite OAuth.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// Parsed tokens plus the untouched payload.
#[derive(Debug, Clone)]
pub struct TokenExchange {
    pub tokens: TokenResponse,
    pub raw: Value,
}

#[derive(Deserialize)]
struct EventsPage {
    #[serde(default)]
    events: Vec<Value>,
}

#[derive(Deserialize)]
struct RosterPage {
    #[serde(default)]
    attendees: Vec<Value>,
    #[serde(default)]
    pagination: Option<Pagination>,
}

#[derive(Deserialize)]
struct Pagination {
    #[serde(default)]
    has_more_items: bool,
    #[serde(default)]
    continuation: Option<String>,
}

/// Attendee resource as Eventbrite returns it (only the fields we mirror).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpstreamAttendee {
    #[serde(default, deserialize_with = "string_or_number")]
    pub id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub checked_in: Option<bool>,
    #[serde(default)]
    pub profile: Option<UpstreamProfile>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub event_id: Option<String>,
    #[serde(default)]
    pub answers: Option<Vec<UpstreamAnswer>>,
    /// Flat fields some hand-written and legacy payloads carry instead of `profile`.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpstreamProfile {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamAnswer {
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub answer: Option<String>,
}

impl UpstreamAttendee {
    pub fn display_name(&self) -> Option<&str> {
        self.profile
            .as_ref()
            .and_then(|p| p.name.as_deref())
            .or(self.name.as_deref())
            .filter(|n| !n.is_empty())
    }

    pub fn email(&self) -> Option<&str> {
        self.profile
            .as_ref()
            .and_then(|p| p.email.as_deref())
            .or(self.email.as_deref())
            .filter(|e| !e.is_empty())
    }

    /// Answers that name their question, in upstream order.
    pub fn answers(&self) -> Option<Vec<crate::models::Answer>> {
        self.answers.as_ref().map(|answers| {
            answers
                .iter()
                .filter_map(|a| {
                    a.question.as_ref().map(|q| crate::models::Answer {
                        question: q.clone(),
                        answer: a.answer.clone(),
                    })
                })
                .collect()
        })
    }
}

/// Eventbrite IDs are strings, but hand-written payloads often use numbers.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) if !s.is_empty() => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// EventbriteService - client calls bound to the active credential
// ─────────────────────────────────────────────────────────────────────────────

/// Eventbrite calls authenticated with whatever credential is active.
///
/// Every authenticated call reads the credential first and fails with
/// `Unauthenticated` before any network I/O when none is set.
#[derive(Clone)]
pub struct EventbriteService {
    client: EventbriteClient,
    credentials: CredentialStore,
}

impl EventbriteService {
    pub fn new(client: EventbriteClient, credentials: CredentialStore) -> Self {
        Self {
            client,
            credentials,
        }
    }

    pub fn client(&self) -> &EventbriteClient {
        &self.client
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    /// Exchange an authorization code and make the result the active credential.
    pub async fn connect(&self, code: &str) -> Result<Value, AppError> {
        let exchange = self.client.exchange_code(code).await?;
        self.credentials
            .set_credential(exchange.tokens.access_token, exchange.tokens.refresh_token)
            .await?;
        Ok(exchange.raw)
    }

    pub async fn list_events(&self) -> Result<Vec<Value>, AppError> {
        let credential = self.credentials.require().await?;
        self.client.list_events(&credential.access_token).await
    }

    pub async fn fetch_roster(&self, event_id: &str) -> Result<Vec<Value>, AppError> {
        let credential = self.credentials.require().await?;
        self.client
            .fetch_roster(event_id, &credential.access_token)
            .await
    }

    pub async fn fetch_by_reference(&self, api_url: &str) -> Result<UpstreamAttendee, AppError> {
        let credential = self.credentials.require().await?;
        let raw = self
            .client
            .fetch_by_reference(api_url, &credential.access_token)
            .await?;
        serde_json::from_value(raw).map_err(|e| {
            AppError::UpstreamUnavailable(format!("Unexpected attendee payload: {}", e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> EventbriteClient {
        let config = Config {
            eventbrite_api_url: "https://www.eventbriteapi.com/v3".to_string(),
            ..Config::default()
        };
        EventbriteClient::new(&config).unwrap()
    }

    #[test]
    fn test_api_locator_confinement() {
        let client = client();
        assert!(client.is_api_locator("https://www.eventbriteapi.com/v3/events/1/attendees/2/"));
        assert!(!client.is_api_locator("https://evil.example.com/v3/events/1/attendees/2/"));
        assert!(!client.is_api_locator("https://www.eventbriteapi.com/v3.evil.com/x"));
    }

    #[test]
    fn test_authorize_url_encodes_parameters() {
        let url = client().authorize_url("abc");
        assert!(url.contains("response_type=code"));
        assert!(url.contains("client_id=test_client_id"));
        assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A5173%2Feventbrite-callback.html"));
        assert!(url.ends_with("state=abc"));
    }

    #[test]
    fn test_upstream_attendee_accepts_numeric_ids_and_flat_fields() {
        let attendee: UpstreamAttendee = serde_json::from_value(serde_json::json!({
            "id": 42,
            "event_id": "777",
            "name": "Flat Name",
            "email": ""
        }))
        .unwrap();
        assert_eq!(attendee.id.as_deref(), Some("42"));
        assert_eq!(attendee.event_id.as_deref(), Some("777"));
        assert_eq!(attendee.display_name(), Some("Flat Name"));
        assert_eq!(attendee.email(), None);
    }

    #[test]
    fn test_answers_keep_order_and_skip_unnamed() {
        let attendee: UpstreamAttendee = serde_json::from_value(serde_json::json!({
            "id": "a1",
            "answers": [
                {"question": "T-shirt size", "answer": "M"},
                {"answer": "orphan"},
                {"question": "Diet"}
            ]
        }))
        .unwrap();
        let answers = attendee.answers().unwrap();
        assert_eq!(answers.len(), 2);
        assert_eq!(answers[0].question, "T-shirt size");
        assert_eq!(answers[1].answer, None);
    }
}
