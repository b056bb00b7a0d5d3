use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::error::FrontdeskError;

/// Display fallback for tickets whose member join returned nothing.
pub const MEMBER_EMAIL_PLACEHOLDER: &str = "Unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    #[default]
    Open,
    InProgress,
    Solved,
    Closed,
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TicketStatus::Open => write!(f, "open"),
            TicketStatus::InProgress => write!(f, "in_progress"),
            TicketStatus::Solved => write!(f, "solved"),
            TicketStatus::Closed => write!(f, "closed"),
        }
    }
}

impl FromStr for TicketStatus {
    type Err = FrontdeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "open" => Ok(TicketStatus::Open),
            "in_progress" => Ok(TicketStatus::InProgress),
            "solved" => Ok(TicketStatus::Solved),
            "closed" => Ok(TicketStatus::Closed),
            _ => Err(FrontdeskError::InvalidStatus(s.to_string())),
        }
    }
}

pub const VALID_STATUSES: &[&str] = &["open", "in_progress", "solved", "closed"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TicketPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl fmt::Display for TicketPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TicketPriority::Low => write!(f, "low"),
            TicketPriority::Medium => write!(f, "medium"),
            TicketPriority::High => write!(f, "high"),
        }
    }
}

impl FromStr for TicketPriority {
    type Err = FrontdeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(TicketPriority::Low),
            "medium" => Ok(TicketPriority::Medium),
            "high" => Ok(TicketPriority::High),
            _ => Err(FrontdeskError::InvalidPriority(s.to_string())),
        }
    }
}

pub const VALID_PRIORITIES: &[&str] = &["low", "medium", "high"];

/// A support ticket as the views consume it: the stored row enriched with
/// the requester's display fields joined from the member relation.
///
/// `created_at` keeps the backend's ISO 8601 string form, so lexicographic
/// order is chronological order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    pub id: String,
    pub title: String,
    pub description: String,
    pub status: TicketStatus,
    pub priority: TicketPriority,
    pub created_by: String,
    pub created_at: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub member_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

impl Ticket {
    /// Email to show for the requester. The member join can fail without
    /// failing the whole list, in which case a placeholder is displayed.
    /// Reply submission checks `member_email` directly and refuses to send
    /// to the placeholder.
    pub fn member_email_or_placeholder(&self) -> &str {
        self.member_email.as_deref().unwrap_or(MEMBER_EMAIL_PLACEHOLDER)
    }
}

/// Fields for creating a ticket. `created_by` stays optional at the type
/// level so the store can reject a missing identity reference with a
/// validation error instead of a panic.
#[derive(Debug, Clone, Serialize)]
pub struct NewTicket {
    pub title: String,
    pub description: String,
    pub priority: TicketPriority,
    pub status: TicketStatus,
    pub created_by: Option<String>,
}

impl NewTicket {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        priority: TicketPriority,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            priority,
            status: TicketStatus::Open,
            created_by: None,
        }
    }

    pub fn created_by(mut self, member_id: impl Into<String>) -> Self {
        self.created_by = Some(member_id.into());
        self
    }
}

/// Partial update applied to a stored ticket. Only status transitions are
/// issued by the observed flows; priority is included for completeness.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TicketPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TicketStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<TicketPriority>,
}

impl TicketPatch {
    pub fn status(status: TicketStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.priority.is_none()
    }
}

/// Aggregate counts shown above the ticket table. Recomputed from the full
/// list on every mutation, never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TicketStats {
    /// Tickets with status `open`.
    pub open_tickets: usize,
    /// Tickets with status `closed` (displayed under the "Solved" label).
    pub solved: usize,
    /// Tickets with priority `low` (displayed under the "Good" label).
    pub good: usize,
    /// Distinct `created_by` values (displayed under the "Groups" label).
    pub groups: usize,
}

impl TicketStats {
    pub fn compute(tickets: &[Ticket]) -> Self {
        let mut stats = TicketStats::default();
        let mut creators: HashSet<&str> = HashSet::new();

        for ticket in tickets {
            if ticket.status == TicketStatus::Open {
                stats.open_tickets += 1;
            }
            if ticket.status == TicketStatus::Closed {
                stats.solved += 1;
            }
            if ticket.priority == TicketPriority::Low {
                stats.good += 1;
            }
            creators.insert(ticket.created_by.as_str());
        }

        stats.groups = creators.len();
        stats
    }
}

/// Explicit per-operation state for user-initiated async actions, replacing
/// an implicit "button disabled while a request is in flight" convention.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum OpState {
    #[default]
    Idle,
    Pending,
    Succeeded,
    Failed(String),
}

impl OpState {
    pub fn is_pending(&self) -> bool {
        matches!(self, OpState::Pending)
    }

    pub fn failure(&self) -> Option<&str> {
        match self {
            OpState::Failed(reason) => Some(reason),
            _ => None,
        }
    }
}
