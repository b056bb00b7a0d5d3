//! Shared helpers for the integration suites: fixture tickets, a seeded
//! in-memory store, and recording/failing mailer doubles.

#![allow(dead_code)]

use std::sync::Arc;

use parking_lot::Mutex;

use frontdesk::store::memory::Member;
use frontdesk::{
    EmailReceipt, FrontdeskError, Mailer, MemoryTicketStore, OutboundEmail, Result, Ticket,
    TicketPriority, TicketStatus,
};

/// Build a fixture ticket. Timestamps are spaced by `seq` so ordering
/// assertions have distinct values to compare.
pub fn ticket(
    id: &str,
    status: TicketStatus,
    priority: TicketPriority,
    creator: &str,
    seq: u8,
) -> Ticket {
    Ticket {
        id: id.to_string(),
        title: format!("Ticket {id}"),
        description: format!("Description for {id}"),
        status,
        priority,
        created_by: creator.to_string(),
        created_at: format!("2024-01-15T09:{seq:02}:00Z"),
        member_email: Some(format!("{creator}@example.com")),
        first_name: Some("Jo".to_string()),
        last_name: Some("Doe".to_string()),
    }
}

pub fn open_ticket(id: &str, seq: u8) -> Ticket {
    ticket(id, TicketStatus::Open, TicketPriority::Medium, "u1", seq)
}

/// Store with the member `u1` registered, ready for create calls.
pub async fn store_with_member() -> Arc<MemoryTicketStore> {
    let store = Arc::new(MemoryTicketStore::new());
    store
        .insert_member(
            "u1",
            Member {
                email: "u1@example.com".to_string(),
                first_name: Some("Jo".to_string()),
                last_name: Some("Doe".to_string()),
            },
        )
        .await;
    store
}

/// Mailer double that records every payload and always succeeds.
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<OutboundEmail>>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().len()
    }
}

#[async_trait::async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: &OutboundEmail) -> Result<EmailReceipt> {
        self.sent.lock().push(email.clone());
        Ok(EmailReceipt::default())
    }
}

/// Mailer double that always fails with a service error.
pub struct FailingMailer;

#[async_trait::async_trait]
impl Mailer for FailingMailer {
    async fn send(&self, _email: &OutboundEmail) -> Result<EmailReceipt> {
        Err(FrontdeskError::Api(
            "email service error: delivery refused".to_string(),
        ))
    }
}
