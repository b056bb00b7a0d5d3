//! Outbound email collaborator.
//!
//! Delivery happens in a hosted serverless function; this module only
//! builds the JSON payload that function accepts and surfaces its result.
//! The payload carries every ticket field plus a `type` tag so the
//! function can pick the right template: `notification` for new tickets
//! (routed to the support inbox) and `reply` for agent responses (routed
//! to the member).

pub mod http;

pub use http::HttpMailer;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::{Ticket, TicketPriority, TicketStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailKind {
    Notification,
    Reply,
}

/// The email function's request body.
#[derive(Debug, Clone, Serialize)]
pub struct OutboundEmail {
    pub title: String,
    pub description: String,
    pub priority: TicketPriority,
    pub status: TicketStatus,
    pub created_by: String,
    pub member_email: String,
    #[serde(rename = "type")]
    pub kind: EmailKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_text: Option<String>,
}

impl OutboundEmail {
    /// New-ticket notification for the support inbox.
    pub fn notification(ticket: &Ticket, member_email: &str) -> Self {
        Self {
            title: ticket.title.clone(),
            description: ticket.description.clone(),
            priority: ticket.priority,
            status: ticket.status,
            created_by: ticket.created_by.clone(),
            member_email: member_email.to_string(),
            kind: EmailKind::Notification,
            reply_text: None,
        }
    }

    /// Agent reply routed to the member.
    pub fn reply(ticket: &Ticket, member_email: &str, reply_text: &str) -> Self {
        Self {
            title: ticket.title.clone(),
            description: ticket.description.clone(),
            priority: ticket.priority,
            status: ticket.status,
            created_by: ticket.created_by.clone(),
            member_email: member_email.to_string(),
            kind: EmailKind::Reply,
            reply_text: Some(reply_text.to_string()),
        }
    }
}

/// Delivery confirmation from the email function. `data` carries whatever
/// the downstream provider returned; callers only need the success signal.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmailReceipt {
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

#[async_trait::async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutboundEmail) -> Result<EmailReceipt>;
}
