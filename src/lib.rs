pub mod auth;
pub mod board;
pub mod config;
pub mod conversation;
pub mod error;
pub mod events;
pub mod mailer;
pub mod portal;
pub mod shell;
pub mod store;
pub mod types;

pub use auth::{IdentityProvider, SessionUser, StaticIdentity};
pub use board::{BoardModel, LoadState, mount_on_bus};
pub use config::Config;
pub use conversation::{ConversationModel, Message, Sender};
pub use error::{FrontdeskError, Result};
pub use events::{DeskEvent, EventBus, Subscription};
pub use mailer::{EmailKind, EmailReceipt, HttpMailer, Mailer, OutboundEmail};
pub use portal::{SubmitOutcome, SupportRequest, submit_support_request};
pub use shell::{SettingsSection, Shell, View};
pub use store::{
    ChangeEvent, FeedHandle, MemoryTicketStore, RestTicketStore, TicketStore,
};
pub use types::{
    NewTicket, OpState, Ticket, TicketPatch, TicketPriority, TicketStats, TicketStatus,
    VALID_PRIORITIES, VALID_STATUSES,
};
