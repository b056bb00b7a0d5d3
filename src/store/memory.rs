//! In-memory reference implementation of the ticket store.
//!
//! Backs tests and acts as executable documentation of the store contract:
//! ids are assigned on insert, the member join is resolved from a local
//! member registry, and every insert/delete is broadcast on the change
//! feed. A failure switch simulates backend outages for the paths that
//! must degrade rather than corrupt state.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::RwLock;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::error::{FrontdeskError, Result};
use crate::types::{NewTicket, Ticket, TicketPatch};

use super::{CHANGE_CHANNEL_CAPACITY, ChangeEvent, TicketStore};

/// A registered member, the join target for `created_by`.
#[derive(Debug, Clone)]
pub struct Member {
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

pub struct MemoryTicketStore {
    tickets: RwLock<Vec<Ticket>>,
    members: RwLock<HashMap<String, Member>>,
    sender: broadcast::Sender<ChangeEvent>,
    failing: AtomicBool,
}

impl Default for MemoryTicketStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryTicketStore {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            tickets: RwLock::new(Vec::new()),
            members: RwLock::new(HashMap::new()),
            sender,
            failing: AtomicBool::new(false),
        }
    }

    /// Register a member so tickets created by `id` can join display fields.
    pub async fn insert_member(&self, id: impl Into<String>, member: Member) {
        self.members.write().await.insert(id.into(), member);
    }

    /// Push a pre-built ticket directly, bypassing validation and the
    /// change feed. Intended for seeding fixtures.
    pub async fn seed(&self, ticket: Ticket) {
        self.tickets.write().await.insert(0, ticket);
    }

    /// Make every subsequent operation fail with an API error, simulating
    /// a backend outage.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(FrontdeskError::Api(
                "backend unavailable (simulated)".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl TicketStore for MemoryTicketStore {
    async fn list(&self) -> Result<Vec<Ticket>> {
        self.check_available()?;
        let mut tickets = self.tickets.read().await.clone();
        // Insertion keeps newest-first order already; the sort makes the
        // ordering contract hold for seeded fixtures too.
        tickets.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(tickets)
    }

    async fn get(&self, id: &str) -> Result<Ticket> {
        self.check_available()?;
        self.tickets
            .read()
            .await
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or_else(|| FrontdeskError::TicketNotFound(id.to_string()))
    }

    async fn create(&self, new: NewTicket) -> Result<Ticket> {
        self.check_available()?;

        let created_by = new.created_by.ok_or_else(|| {
            FrontdeskError::Validation(
                "a created_by identity reference is required".to_string(),
            )
        })?;

        let members = self.members.read().await;
        let member = members.get(&created_by).ok_or_else(|| {
            FrontdeskError::Validation(format!(
                "created_by '{created_by}' does not reference a known member"
            ))
        })?;

        let ticket = Ticket {
            id: Uuid::new_v4().to_string(),
            title: new.title,
            description: new.description,
            status: new.status,
            priority: new.priority,
            created_by,
            created_at: jiff::Timestamp::now().to_string(),
            member_email: Some(member.email.clone()),
            first_name: member.first_name.clone(),
            last_name: member.last_name.clone(),
        };
        drop(members);

        self.tickets.write().await.insert(0, ticket.clone());
        let _ = self.sender.send(ChangeEvent::Inserted(ticket.clone()));
        Ok(ticket)
    }

    async fn update(&self, id: &str, patch: TicketPatch) -> Result<Ticket> {
        self.check_available()?;

        let mut tickets = self.tickets.write().await;
        let ticket = tickets
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| FrontdeskError::TicketNotFound(id.to_string()))?;

        if let Some(status) = patch.status {
            ticket.status = status;
        }
        if let Some(priority) = patch.priority {
            ticket.priority = priority;
        }

        Ok(ticket.clone())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.check_available()?;

        let mut tickets = self.tickets.write().await;
        let before = tickets.len();
        tickets.retain(|t| t.id != id);

        // Deleting an id the backend no longer has is not an error; the
        // feed only announces rows that actually disappeared.
        if tickets.len() < before {
            let _ = self.sender.send(ChangeEvent::Deleted(id.to_string()));
        }
        Ok(())
    }

    fn subscribe_changes(&self) -> broadcast::Receiver<ChangeEvent> {
        self.sender.subscribe()
    }
}
