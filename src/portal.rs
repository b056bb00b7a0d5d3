//! Member portal submission flow.
//!
//! Submitting a support request is a two-step flow: insert the ticket,
//! then notify the support inbox by email. The insert is the operation
//! that must succeed; a notification failure after a successful insert is
//! a partial success (the ticket exists, the email did not go out) and is
//! reported as such rather than rolled back.

use crate::auth::IdentityProvider;
use crate::error::{FrontdeskError, Result};
use crate::mailer::{Mailer, OutboundEmail};
use crate::store::TicketStore;
use crate::types::{NewTicket, Ticket, TicketPriority};

/// The support form's fields. Status is not a choice; submissions always
/// open as `open`.
#[derive(Debug, Clone)]
pub struct SupportRequest {
    pub title: String,
    pub description: String,
    pub priority: TicketPriority,
}

#[derive(Debug)]
pub struct SubmitOutcome {
    pub ticket: Ticket,
    /// False when the ticket was created but the notification email
    /// failed to send.
    pub email_sent: bool,
}

/// Submit a member's support request.
///
/// Fails with a validation error when no member is signed in; the store
/// additionally rejects identities it cannot resolve. The notification is
/// addressed with the session user's email, not the joined row, so a
/// stale member join cannot misroute it.
pub async fn submit_support_request(
    store: &dyn TicketStore,
    mailer: &dyn Mailer,
    identity: &dyn IdentityProvider,
    request: SupportRequest,
) -> Result<SubmitOutcome> {
    let user = identity.current_user().ok_or_else(|| {
        FrontdeskError::Validation("a signed-in member is required to submit a request".to_string())
    })?;

    let ticket = store
        .create(
            NewTicket::new(request.title, request.description, request.priority)
                .created_by(user.id),
        )
        .await?;

    let notification = OutboundEmail::notification(&ticket, &user.email);
    let email_sent = match mailer.send(&notification).await {
        Ok(_) => true,
        Err(e) => {
            tracing::warn!(
                "ticket {} created, but the notification email failed: {e}",
                ticket.id
            );
            false
        }
    };

    Ok(SubmitOutcome { ticket, email_sent })
}
