mod common;

use common::{FailingMailer, RecordingMailer, store_with_member};
use frontdesk::{
    EmailKind, FrontdeskError, SessionUser, StaticIdentity, SupportRequest, TicketPriority,
    TicketStatus, TicketStore, submit_support_request,
};

fn member_session() -> StaticIdentity {
    StaticIdentity::signed_in(SessionUser {
        id: "u1".to_string(),
        email: "u1@example.com".to_string(),
        first_name: Some("Jo".to_string()),
        last_name: Some("Doe".to_string()),
    })
}

fn request() -> SupportRequest {
    SupportRequest {
        title: "Treadmill squeaks".to_string(),
        description: "Belt squeaks above 8 km/h".to_string(),
        priority: TicketPriority::Low,
    }
}

#[tokio::test]
async fn test_submit_creates_ticket_and_notifies() {
    let store = store_with_member().await;
    let mailer = RecordingMailer::new();

    let outcome = submit_support_request(store.as_ref(), &mailer, &member_session(), request())
        .await
        .unwrap();

    assert!(outcome.email_sent);
    assert_eq!(outcome.ticket.status, TicketStatus::Open);
    assert_eq!(outcome.ticket.created_by, "u1");

    let listed = store.list().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, outcome.ticket.id);

    let sent = mailer.sent.lock();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].kind, EmailKind::Notification);
    assert_eq!(sent[0].member_email, "u1@example.com");
    assert_eq!(sent[0].title, "Treadmill squeaks");
    assert!(sent[0].reply_text.is_none());
}

#[tokio::test]
async fn test_signed_out_submission_is_rejected() {
    let store = store_with_member().await;
    let mailer = RecordingMailer::new();

    let err = submit_support_request(
        store.as_ref(),
        &mailer,
        &StaticIdentity::signed_out(),
        request(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, FrontdeskError::Validation(_)));
    assert!(store.list().await.unwrap().is_empty());
    assert_eq!(mailer.sent_count(), 0);
}

#[tokio::test]
async fn test_unknown_member_is_rejected_by_store() {
    let store = store_with_member().await;
    let mailer = RecordingMailer::new();
    let stranger = StaticIdentity::signed_in(SessionUser {
        id: "u9".to_string(),
        email: "u9@example.com".to_string(),
        first_name: None,
        last_name: None,
    });

    let err = submit_support_request(store.as_ref(), &mailer, &stranger, request())
        .await
        .unwrap_err();

    assert!(matches!(err, FrontdeskError::Validation(_)));
    assert_eq!(mailer.sent_count(), 0);
}

#[tokio::test]
async fn test_email_failure_is_partial_success() {
    let store = store_with_member().await;

    let outcome = submit_support_request(store.as_ref(), &FailingMailer, &member_session(), request())
        .await
        .unwrap();

    // The ticket survives even though the notification did not go out.
    assert!(!outcome.email_sent);
    assert_eq!(store.list().await.unwrap().len(), 1);
}
