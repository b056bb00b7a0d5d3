mod common;

use common::{FailingMailer, RecordingMailer, open_ticket, store_with_member, ticket};
use frontdesk::{
    ConversationModel, EmailKind, FrontdeskError, NewTicket, OpState, Sender, TicketPriority,
    TicketStatus, TicketStore,
};

// ============================================================================
// Reply submission
// ============================================================================

#[tokio::test]
async fn test_empty_and_whitespace_replies_are_noops() {
    let mailer = RecordingMailer::new();
    let mut conversation = ConversationModel::new(open_ticket("t-1", 1));

    conversation.set_draft("");
    conversation.submit_reply(&mailer).await.unwrap();

    conversation.set_draft("   \n\t  ");
    conversation.submit_reply(&mailer).await.unwrap();

    assert_eq!(conversation.messages().len(), 1);
    assert_eq!(mailer.sent_count(), 0);
    assert_eq!(*conversation.reply_state(), OpState::Idle);
}

#[tokio::test]
async fn test_successful_reply_appends_agent_message() {
    let mailer = RecordingMailer::new();
    let mut conversation = ConversationModel::new(open_ticket("t-1", 1));

    conversation.set_draft("  We are on it.  ");
    conversation.submit_reply(&mailer).await.unwrap();

    let messages = conversation.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].sender, Sender::Agent);
    assert_eq!(messages[1].text, "We are on it.");
    assert_ne!(messages[1].id, messages[0].id);

    assert_eq!(conversation.draft(), "");
    assert_eq!(*conversation.reply_state(), OpState::Succeeded);

    let sent = mailer.sent.lock();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].kind, EmailKind::Reply);
    assert_eq!(sent[0].reply_text.as_deref(), Some("We are on it."));
    assert_eq!(sent[0].member_email, "u1@example.com");
    assert_eq!(sent[0].title, "Ticket t-1");
}

#[tokio::test]
async fn test_reply_without_member_email_is_validation_failure() {
    let mailer = RecordingMailer::new();
    let mut no_email = open_ticket("t-1", 1);
    no_email.member_email = None;
    let mut conversation = ConversationModel::new(no_email);

    conversation.set_draft("Hello?");
    let err = conversation.submit_reply(&mailer).await.unwrap_err();

    assert!(matches!(err, FrontdeskError::Validation(_)));
    assert_eq!(mailer.sent_count(), 0);
    assert_eq!(conversation.messages().len(), 1);
    assert!(conversation.reply_state().failure().is_some());
}

#[tokio::test]
async fn test_failed_reply_leaves_thread_and_draft_untouched() {
    let mut conversation = ConversationModel::new(open_ticket("t-1", 1));

    conversation.set_draft("Please try turning it off and on.");
    let err = conversation.submit_reply(&FailingMailer).await.unwrap_err();

    assert!(matches!(err, FrontdeskError::Api(_)));
    assert_eq!(conversation.messages().len(), 1);
    assert_eq!(conversation.draft(), "Please try turning it off and on.");
    assert!(
        conversation
            .reply_state()
            .failure()
            .unwrap()
            .contains("delivery refused")
    );
}

#[tokio::test]
async fn test_failed_reply_can_be_resubmitted() {
    let mut conversation = ConversationModel::new(open_ticket("t-1", 1));
    conversation.set_draft("Second try");

    conversation.submit_reply(&FailingMailer).await.unwrap_err();

    let mailer = RecordingMailer::new();
    conversation.submit_reply(&mailer).await.unwrap();
    assert_eq!(conversation.messages().len(), 2);
    assert_eq!(mailer.sent_count(), 1);
}

// ============================================================================
// Status transitions
// ============================================================================

#[tokio::test]
async fn test_every_status_reachable_from_every_other() {
    let store = store_with_member().await;
    let all = [
        TicketStatus::Open,
        TicketStatus::InProgress,
        TicketStatus::Solved,
        TicketStatus::Closed,
    ];

    for from in all {
        for to in all {
            let created = store
                .create(
                    NewTicket::new("Status walk", "", TicketPriority::Low).created_by("u1"),
                )
                .await
                .unwrap();
            store
                .update(&created.id, frontdesk::TicketPatch::status(from))
                .await
                .unwrap();

            let mut conversation =
                ConversationModel::new(store.get(&created.id).await.unwrap());
            conversation.change_status(store.as_ref(), to).await.unwrap();

            assert_eq!(conversation.ticket().status, to);
            assert_eq!(store.get(&created.id).await.unwrap().status, to);
            assert_eq!(*conversation.status_state(), OpState::Succeeded);

            store.delete(&created.id).await.unwrap();
        }
    }
}

#[tokio::test]
async fn test_status_unchanged_on_remote_failure() {
    let store = store_with_member().await;
    let created = store
        .create(NewTicket::new("Stuck", "", TicketPriority::Low).created_by("u1"))
        .await
        .unwrap();
    let mut conversation = ConversationModel::new(created.clone());

    store.set_failing(true);
    let err = conversation
        .change_status(store.as_ref(), TicketStatus::Closed)
        .await
        .unwrap_err();

    assert!(matches!(err, FrontdeskError::Api(_)));
    assert_eq!(conversation.ticket().status, TicketStatus::Open);
    assert!(conversation.status_state().failure().is_some());

    store.set_failing(false);
    assert_eq!(store.get(&created.id).await.unwrap().status, TicketStatus::Open);
}

#[tokio::test]
async fn test_status_change_on_deleted_ticket_is_not_found() {
    let store = store_with_member().await;
    let created = store
        .create(NewTicket::new("Gone", "", TicketPriority::Low).created_by("u1"))
        .await
        .unwrap();
    let mut conversation = ConversationModel::new(created.clone());

    store.delete(&created.id).await.unwrap();
    let err = conversation
        .change_status(store.as_ref(), TicketStatus::Solved)
        .await
        .unwrap_err();

    assert!(matches!(err, FrontdeskError::TicketNotFound(_)));
    assert_eq!(conversation.ticket().status, TicketStatus::Open);
}

#[tokio::test]
async fn test_status_change_picks_up_joined_fields_from_store() {
    let store = store_with_member().await;
    let created = store
        .create(NewTicket::new("Fresh join", "", TicketPriority::Low).created_by("u1"))
        .await
        .unwrap();

    // The controller starts from a list row that lost its join.
    let mut stale = created.clone();
    stale.member_email = None;
    let mut conversation = ConversationModel::new(stale);

    conversation
        .change_status(store.as_ref(), TicketStatus::InProgress)
        .await
        .unwrap();

    // The replacement row carries the store's join fields again.
    assert_eq!(
        conversation.ticket().member_email.as_deref(),
        Some("u1@example.com")
    );
}

#[tokio::test]
async fn test_seed_message_matches_ticket_fields() {
    let fixture = ticket("t-9", TicketStatus::InProgress, TicketPriority::High, "u2", 5);
    let conversation = ConversationModel::new(fixture.clone());

    let seed = &conversation.messages()[0];
    assert_eq!(seed.id, fixture.id);
    assert_eq!(seed.text, fixture.description);
    assert_eq!(seed.timestamp, fixture.created_at);
    assert_eq!(seed.sender, Sender::Customer);
}
