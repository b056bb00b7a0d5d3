use std::fmt;

/// Events fanned out across views within one session.
///
/// Deletion is the only event the observed flows need: the view performing
/// the delete announces it so every mounted list drops the row from its own
/// local copy. Updates travel through the store's change feed instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeskEvent {
    /// A ticket was deleted through some view in this session.
    TicketDeleted { id: String },
}

impl fmt::Display for DeskEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeskEvent::TicketDeleted { id } => write!(f, "ticket-deleted({id})"),
        }
    }
}
