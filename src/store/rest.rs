//! HTTP adapter for a hosted PostgREST-style ticket table.
//!
//! # Security Note - Logging
//!
//! The backend API key is protected from request logging by the
//! `RedactedHeader` wrapper, which formats as `[REDACTED]` if reqwest
//! debug logging is ever enabled.
//!
//! The backend also exposes a websocket realtime feed; that transport
//! stays external. This adapter bridges it by polling the table on an
//! interval and diffing row ids, which preserves the consumer-facing
//! contract: unordered insert/delete events that may duplicate an
//! in-flight `list()` response.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretBox};
use serde::Deserialize;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use url::Url;

use crate::config::Config;
use crate::error::{FrontdeskError, Result};
use crate::types::{NewTicket, Ticket, TicketPatch};

use super::{CHANGE_CHANNEL_CAPACITY, ChangeEvent, TicketStore};

const TICKETS_PATH: &str = "/rest/v1/tickets";
const MEMBER_JOIN_SELECT: &str = "*,users(email,first_name,last_name)";

/// Default interval for the change-feed poller.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Wrapper for sensitive header values that redacts the value when
/// formatted, so keys never reach logs.
struct RedactedHeader {
    value: String,
}

impl RedactedHeader {
    fn new(value: &str) -> Self {
        Self {
            value: value.to_string(),
        }
    }

    fn as_header_value(&self) -> Result<header::HeaderValue> {
        header::HeaderValue::from_str(&self.value)
            .map_err(|_| FrontdeskError::Auth("API key contains invalid header characters".to_string()))
    }
}

impl fmt::Display for RedactedHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl fmt::Debug for RedactedHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedactedHeader")
            .field("value", &"[REDACTED]")
            .finish()
    }
}

/// Raw ticket row with the embedded member relation, as the backend
/// returns it from a select-with-join.
#[derive(Debug, Deserialize)]
struct TicketRow {
    id: String,
    title: String,
    description: String,
    status: crate::types::TicketStatus,
    priority: crate::types::TicketPriority,
    created_by: String,
    created_at: String,
    #[serde(default)]
    users: Option<MemberRow>,
}

#[derive(Debug, Deserialize)]
struct MemberRow {
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    last_name: Option<String>,
}

impl TicketRow {
    fn into_ticket(self) -> Ticket {
        let (member_email, first_name, last_name) = match self.users {
            Some(member) => (member.email, member.first_name, member.last_name),
            None => (None, None, None),
        };

        Ticket {
            id: self.id,
            title: self.title,
            description: self.description,
            status: self.status,
            priority: self.priority,
            created_by: self.created_by,
            created_at: self.created_at,
            member_email,
            first_name,
            last_name,
        }
    }
}

#[derive(serde::Serialize)]
struct InsertRow<'a> {
    title: &'a str,
    description: &'a str,
    priority: crate::types::TicketPriority,
    status: crate::types::TicketStatus,
    created_by: &'a str,
}

pub struct RestTicketStore {
    client: Client,
    base: Url,
    api_key: SecretBox<String>,
    sender: broadcast::Sender<ChangeEvent>,
}

impl RestTicketStore {
    /// Create an adapter for the given backend base URL.
    ///
    /// Configures the HTTP client with a 30s connect timeout and 60s total
    /// timeout.
    pub fn new(base_url: &str, api_key: &str) -> Result<Self> {
        let base = Url::parse(base_url)
            .map_err(|e| FrontdeskError::Config(format!("invalid backend URL '{base_url}': {e}")))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .connect_timeout(Duration::from_secs(30))
            .build()?;

        let (sender, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);

        Ok(Self {
            client,
            base,
            api_key: SecretBox::new(Box::new(api_key.to_string())),
            sender,
        })
    }

    /// Create an adapter from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let url = config.backend_url().ok_or_else(|| {
            FrontdeskError::Config(
                "backend URL not configured. Set FRONTDESK_BACKEND_URL or backend.url".to_string(),
            )
        })?;
        let api_key = config.backend_api_key().ok_or_else(|| {
            FrontdeskError::Auth(
                "backend API key not configured. Set FRONTDESK_API_KEY or backend.api_key".to_string(),
            )
        })?;
        Self::new(&url, &api_key)
    }

    fn tickets_url(&self) -> Result<Url> {
        self.base
            .join(TICKETS_PATH)
            .map_err(|e| FrontdeskError::Config(format!("invalid tickets endpoint: {e}")))
    }

    fn request(&self, method: Method, url: Url) -> Result<RequestBuilder> {
        let api_key_header = RedactedHeader::new(self.api_key.expose_secret());
        let bearer_header =
            RedactedHeader::new(&format!("Bearer {}", self.api_key.expose_secret()));
        Ok(self
            .client
            .request(method, url)
            .header("apikey", api_key_header.as_header_value()?)
            .header(header::AUTHORIZATION, bearer_header.as_header_value()?))
    }

    async fn read_rows(response: reqwest::Response) -> Result<Vec<Ticket>> {
        let rows: Vec<TicketRow> = response.json().await?;
        Ok(rows.into_iter().map(TicketRow::into_ticket).collect())
    }

    fn check_status(response: &reqwest::Response) -> Result<()> {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(60);
            return Err(FrontdeskError::RateLimited(retry_after));
        }

        Err(FrontdeskError::Api(format!("backend error: HTTP {status}")))
    }

    /// Start the change-feed poller. The feed diffs the table's row ids on
    /// each tick and broadcasts inserts and deletes to every subscriber.
    ///
    /// The returned handle must be kept alive; dropping it stops the feed.
    /// Poll failures are logged and the previous snapshot is kept, so a
    /// transient outage produces no spurious delete events.
    pub fn start_feed(store: Arc<Self>, poll_interval: Duration) -> FeedHandle {
        let sender = store.sender.clone();

        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(poll_interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            let mut snapshot: Option<HashMap<String, Ticket>> = None;

            loop {
                interval.tick().await;

                let rows = match store.list().await {
                    Ok(rows) => rows,
                    Err(e) => {
                        tracing::warn!("change feed poll failed: {e}");
                        continue;
                    }
                };

                let current: HashMap<String, Ticket> =
                    rows.into_iter().map(|t| (t.id.clone(), t)).collect();

                if let Some(previous) = &snapshot {
                    for event in diff_snapshots(previous, &current) {
                        let _ = sender.send(event);
                    }
                }

                // The first successful poll only seeds the baseline; rows
                // that already existed are not replayed as inserts.
                snapshot = Some(current);
            }
        });

        FeedHandle { task }
    }
}

#[async_trait::async_trait]
impl TicketStore for RestTicketStore {
    async fn list(&self) -> Result<Vec<Ticket>> {
        let response = self
            .request(Method::GET, self.tickets_url()?)?
            .query(&[("select", MEMBER_JOIN_SELECT), ("order", "created_at.desc")])
            .send()
            .await?;
        Self::check_status(&response)?;
        Self::read_rows(response).await
    }

    async fn get(&self, id: &str) -> Result<Ticket> {
        let id_filter = format!("eq.{id}");
        let response = self
            .request(Method::GET, self.tickets_url()?)?
            .query(&[("select", MEMBER_JOIN_SELECT), ("id", id_filter.as_str())])
            .send()
            .await?;
        Self::check_status(&response)?;

        Self::read_rows(response)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| FrontdeskError::TicketNotFound(id.to_string()))
    }

    async fn create(&self, new: NewTicket) -> Result<Ticket> {
        let created_by = new.created_by.as_deref().ok_or_else(|| {
            FrontdeskError::Validation("a created_by identity reference is required".to_string())
        })?;

        let body = InsertRow {
            title: &new.title,
            description: &new.description,
            priority: new.priority,
            status: new.status,
            created_by,
        };

        let response = self
            .request(Method::POST, self.tickets_url()?)?
            .query(&[("select", MEMBER_JOIN_SELECT)])
            .header("Prefer", "return=representation")
            .json(&body)
            .send()
            .await?;
        Self::check_status(&response)?;

        Self::read_rows(response)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| FrontdeskError::Api("insert returned no representation".to_string()))
    }

    async fn update(&self, id: &str, patch: TicketPatch) -> Result<Ticket> {
        let id_filter = format!("eq.{id}");
        let response = self
            .request(Method::PATCH, self.tickets_url()?)?
            .query(&[("select", MEMBER_JOIN_SELECT), ("id", id_filter.as_str())])
            .header("Prefer", "return=representation")
            .json(&patch)
            .send()
            .await?;
        Self::check_status(&response)?;

        // PATCH with an eq filter on a missing row succeeds with an empty
        // representation; surface that as not-found.
        Self::read_rows(response)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| FrontdeskError::TicketNotFound(id.to_string()))
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let id_filter = format!("eq.{id}");
        let response = self
            .request(Method::DELETE, self.tickets_url()?)?
            .query(&[("id", id_filter.as_str())])
            .send()
            .await?;
        Self::check_status(&response)
    }

    fn subscribe_changes(&self) -> broadcast::Receiver<ChangeEvent> {
        self.sender.subscribe()
    }
}

/// Row-id diff between two poll snapshots, as feed events. Ids present in
/// `current` but not `previous` are inserts; the reverse are deletes.
/// Rows present in both are ignored even if their fields changed, since
/// the consumers only track membership.
fn diff_snapshots(
    previous: &HashMap<String, Ticket>,
    current: &HashMap<String, Ticket>,
) -> Vec<ChangeEvent> {
    let mut events = Vec::new();
    for (id, ticket) in current {
        if !previous.contains_key(id) {
            events.push(ChangeEvent::Inserted(ticket.clone()));
        }
    }
    for id in previous.keys() {
        if !current.contains_key(id) {
            events.push(ChangeEvent::Deleted(id.clone()));
        }
    }
    events
}

/// Handle to the running change-feed poller. This field is never read
/// directly, but it **must** be kept alive: dropping the handle aborts the
/// poll task and stops all event delivery.
pub struct FeedHandle {
    task: JoinHandle<()>,
}

impl Drop for FeedHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{TicketPriority, TicketStatus};

    #[test]
    fn test_row_with_join_into_ticket() {
        let json = r#"{
            "id": "7f3a",
            "title": "Printer jam",
            "description": "It chews paper",
            "status": "open",
            "priority": "medium",
            "created_by": "u1",
            "created_at": "2024-01-15T09:30:00Z",
            "users": {"email": "jo@example.com", "first_name": "Jo", "last_name": "Doe"}
        }"#;

        let row: TicketRow = serde_json::from_str(json).unwrap();
        let ticket = row.into_ticket();
        assert_eq!(ticket.status, TicketStatus::Open);
        assert_eq!(ticket.priority, TicketPriority::Medium);
        assert_eq!(ticket.member_email.as_deref(), Some("jo@example.com"));
        assert_eq!(ticket.last_name.as_deref(), Some("Doe"));
    }

    #[test]
    fn test_row_without_join_leaves_email_absent() {
        let json = r#"{
            "id": "7f3a",
            "title": "Printer jam",
            "description": "It chews paper",
            "status": "in_progress",
            "priority": "low",
            "created_by": "u1",
            "created_at": "2024-01-15T09:30:00Z",
            "users": null
        }"#;

        let row: TicketRow = serde_json::from_str(json).unwrap();
        let ticket = row.into_ticket();
        assert!(ticket.member_email.is_none());
        assert_eq!(ticket.member_email_or_placeholder(), "Unknown");
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        assert!(RestTicketStore::new("not a url", "key").is_err());
    }

    #[test]
    fn test_redacted_header_never_prints_value() {
        let header = RedactedHeader::new("super-secret");
        assert_eq!(header.to_string(), "[REDACTED]");
        assert!(!format!("{header:?}").contains("super-secret"));
    }

    #[test]
    fn test_patch_serializes_only_set_fields() {
        let patch = TicketPatch::status(TicketStatus::Solved);
        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(json, serde_json::json!({"status": "solved"}));
    }

    fn snapshot(ids: &[&str]) -> HashMap<String, Ticket> {
        ids.iter()
            .map(|id| {
                let ticket = Ticket {
                    id: id.to_string(),
                    title: format!("Ticket {id}"),
                    description: String::new(),
                    status: TicketStatus::Open,
                    priority: TicketPriority::Low,
                    created_by: "u1".to_string(),
                    created_at: "2024-01-15T09:30:00Z".to_string(),
                    member_email: None,
                    first_name: None,
                    last_name: None,
                };
                (id.to_string(), ticket)
            })
            .collect()
    }

    #[test]
    fn test_diff_reports_inserts_and_deletes() {
        let events = diff_snapshots(&snapshot(&["a", "b"]), &snapshot(&["b", "c"]));

        let inserted: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                ChangeEvent::Inserted(t) => Some(t.id.as_str()),
                ChangeEvent::Deleted(_) => None,
            })
            .collect();
        let deleted: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                ChangeEvent::Deleted(id) => Some(id.as_str()),
                ChangeEvent::Inserted(_) => None,
            })
            .collect();

        assert_eq!(inserted, vec!["c"]);
        assert_eq!(deleted, vec!["a"]);
    }

    #[test]
    fn test_diff_of_identical_snapshots_is_quiet() {
        assert!(diff_snapshots(&snapshot(&["a"]), &snapshot(&["a"])).is_empty());
    }
}
