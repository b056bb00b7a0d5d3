//! Ticket store adapters.
//!
//! The backend's storage engine, auth, and realtime transport are external
//! systems; this module is the narrow contract the views consume them
//! through. `TicketStore` covers the row operations plus a live change
//! subscription. Consumers must tolerate a change event and an in-flight
//! `list()` response describing the same row, and de-duplicate by id.

pub mod memory;
pub mod rest;

pub use memory::MemoryTicketStore;
pub use rest::{DEFAULT_POLL_INTERVAL, FeedHandle, RestTicketStore};

use tokio::sync::broadcast;

use crate::error::Result;
use crate::types::{NewTicket, Ticket, TicketPatch};

/// Capacity of the change-feed broadcast channel. A receiver that lags this
/// far behind loses the oldest events, matching the feed's best-effort
/// delivery semantics.
pub const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// A row-level change pushed by the backend's change feed.
#[derive(Debug, Clone)]
pub enum ChangeEvent {
    /// A row appeared. Carries the full view-facing ticket.
    Inserted(Ticket),
    /// A row disappeared. Carries only the removed id.
    Deleted(String),
}

#[async_trait::async_trait]
pub trait TicketStore: Send + Sync {
    /// All tickets, newest first, each enriched with the requester's
    /// display fields. A failed member join leaves the email absent rather
    /// than failing the list.
    async fn list(&self) -> Result<Vec<Ticket>>;

    /// A single ticket by id.
    async fn get(&self, id: &str) -> Result<Ticket>;

    /// Insert a ticket and return the stored row. Fails with a validation
    /// error when the identity reference is absent.
    async fn create(&self, new: NewTicket) -> Result<Ticket>;

    /// Apply a partial update and return the updated row.
    async fn update(&self, id: &str, patch: TicketPatch) -> Result<Ticket>;

    /// Delete by id. Deleting does not announce anything to other views;
    /// the caller publishes on the notification bus after this succeeds.
    async fn delete(&self, id: &str) -> Result<()>;

    /// Open a live change subscription scoped to the ticket entity.
    /// No ordering guarantee is made relative to a concurrent `list()`.
    fn subscribe_changes(&self) -> broadcast::Receiver<ChangeEvent>;
}
