//! Ticket detail conversation state.
//!
//! The controller owns one ticket's transient message thread. The thread
//! is never persisted: the opening message is synthesized from the ticket
//! itself, and agent replies live only in memory (the outbound email is
//! the durable record). Opening the same ticket again reconstructs only
//! the seed message.
//!
//! Both operations reconcile optimistically against confirmed remote
//! results: the reply is appended only after the email function accepts
//! it, and the status field changes only to the row the store returns.
//! The controller's ticket is replaced wholesale on update, never mutated
//! through a shared reference.

use std::fmt;

use uuid::Uuid;

use crate::error::{FrontdeskError, Result};
use crate::mailer::{Mailer, OutboundEmail};
use crate::store::TicketStore;
use crate::types::{OpState, Ticket, TicketPatch, TicketStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    Customer,
    Agent,
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sender::Customer => write!(f, "customer"),
            Sender::Agent => write!(f, "agent"),
        }
    }
}

/// One entry in the conversation thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: String,
    pub text: String,
    pub sender: Sender,
    pub timestamp: String,
}

pub struct ConversationModel {
    ticket: Ticket,
    messages: Vec<Message>,
    draft: String,
    reply_state: OpState,
    status_state: OpState,
}

impl ConversationModel {
    /// Open a conversation for a ticket. The thread is seeded with exactly
    /// one customer message built from the ticket's description and
    /// creation time; the message reuses the ticket id.
    pub fn new(ticket: Ticket) -> Self {
        let seed = Message {
            id: ticket.id.clone(),
            text: ticket.description.clone(),
            sender: Sender::Customer,
            timestamp: ticket.created_at.clone(),
        };

        Self {
            ticket,
            messages: vec![seed],
            draft: String::new(),
            reply_state: OpState::Idle,
            status_state: OpState::Idle,
        }
    }

    pub fn ticket(&self) -> &Ticket {
        &self.ticket
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    pub fn reply_state(&self) -> &OpState {
        &self.reply_state
    }

    pub fn status_state(&self) -> &OpState {
        &self.status_state
    }

    /// Send the current draft as an agent reply.
    ///
    /// A draft that trims to empty is a no-op: nothing is appended and no
    /// call is issued. A reply already in flight is likewise a no-op. On
    /// success the reply is appended with a locally generated id and the
    /// draft is cleared; on failure the thread is left untouched and the
    /// failure is recorded without any automatic retry.
    pub async fn submit_reply(&mut self, mailer: &dyn Mailer) -> Result<()> {
        let text = self.draft.trim().to_string();
        if text.is_empty() || self.reply_state.is_pending() {
            return Ok(());
        }

        self.reply_state = OpState::Pending;

        let Some(member_email) = self.ticket.member_email.clone() else {
            let reason = "ticket has no member email on file".to_string();
            self.reply_state = OpState::Failed(reason.clone());
            return Err(FrontdeskError::Validation(reason));
        };

        let outbound = OutboundEmail::reply(&self.ticket, &member_email, &text);
        match mailer.send(&outbound).await {
            Ok(_) => {
                self.messages.push(Message {
                    id: Uuid::new_v4().to_string(),
                    text,
                    sender: Sender::Agent,
                    timestamp: jiff::Timestamp::now().to_string(),
                });
                self.draft.clear();
                self.reply_state = OpState::Succeeded;
                Ok(())
            }
            Err(e) => {
                tracing::warn!("reply to ticket {} failed: {e}", self.ticket.id);
                self.reply_state = OpState::Failed(e.to_string());
                Err(e)
            }
        }
    }

    /// Transition the ticket to a new status. All statuses are reachable
    /// from all others; this is a label set, not a lifecycle.
    ///
    /// The stored row is re-read before writing, so a ticket deleted under
    /// us fails cleanly as not-found instead of resurrecting the row. On
    /// success the controller's ticket is replaced with the row the store
    /// returned; on failure it is left exactly as it was.
    pub async fn change_status(
        &mut self,
        store: &dyn TicketStore,
        new_status: TicketStatus,
    ) -> Result<()> {
        if self.status_state.is_pending() {
            return Ok(());
        }
        self.status_state = OpState::Pending;

        let stored = match store.get(&self.ticket.id).await {
            Ok(stored) => stored,
            Err(e) => {
                self.status_state = OpState::Failed(e.to_string());
                return Err(e);
            }
        };
        tracing::debug!(
            ticket = %self.ticket.id,
            from = %stored.status,
            to = %new_status,
            "changing ticket status"
        );

        match store
            .update(&self.ticket.id, TicketPatch::status(new_status))
            .await
        {
            Ok(updated) => {
                self.ticket = updated;
                self.status_state = OpState::Succeeded;
                Ok(())
            }
            Err(e) => {
                self.status_state = OpState::Failed(e.to_string());
                Err(e)
            }
        }
    }
}
