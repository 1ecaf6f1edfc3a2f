//! End-to-end tests for [`inbox_sync::SyncService`]: a mockito Graph API on
//! one side, an in-memory SQLite database on the other, the whole pipeline in
//! between.

use std::sync::Arc;

use chrono::Utc;
use facebook_graph::GraphClient;
use inbox_core::{MessageKind, NormalizedMessage, SyncError};
use inbox_sync::{BulkPersister, SyncService};
use mockito::Matcher;
use storage::{
    ChannelRecord, ChannelRepository, ConversationRecord, ConversationRepository,
    MessageRepository, SqlitePoolManager,
};

const COMPANY: &str = "company-1";
const PAGE: &str = "page-1";
const PSID: &str = "psid-1";

struct Fixture {
    service: SyncService,
    conversations: ConversationRepository,
    channels: ChannelRepository,
    messages: MessageRepository,
    conversation_id: String,
}

/// One conversation pinned to `page-1` (via metadata) with a connected
/// channel, wired to a GraphClient pointing at the given mock server.
async fn setup(server: &mockito::ServerGuard) -> Fixture {
    let pool = SqlitePoolManager::new("sqlite::memory:")
        .await
        .expect("Failed to create pool");
    let conversations = ConversationRepository::new(pool.clone())
        .await
        .expect("Failed to create conversation repository");
    let channels = ChannelRepository::new(pool.clone())
        .await
        .expect("Failed to create channel repository");
    let messages = MessageRepository::new(pool)
        .await
        .expect("Failed to create message repository");

    let channel = ChannelRecord::new(
        PAGE.to_string(),
        COMPANY.to_string(),
        "Test Page".to_string(),
        "page-token".to_string(),
    );
    channels.save(&channel).await.expect("Failed to save channel");

    let conversation = ConversationRecord::new(
        COMPANY.to_string(),
        "facebook".to_string(),
        Some(PSID.to_string()),
        Some(format!(r#"{{"pageId":"{}"}}"#, PAGE)),
    );
    conversations
        .save(&conversation)
        .await
        .expect("Failed to save conversation");

    let api = Arc::new(GraphClient::with_base_url(
        server.url(),
        "v19.0".to_string(),
    ));
    let service = SyncService::new(
        conversations.clone(),
        channels.clone(),
        messages.clone(),
        api,
    );

    Fixture {
        service,
        conversations,
        channels,
        messages,
        conversation_id: conversation.id,
    }
}

async fn mock_conversation_lookup(server: &mut mockito::ServerGuard) -> mockito::Mock {
    server
        .mock("GET", format!("/v19.0/{}/conversations", PAGE).as_str())
        .match_query(Matcher::UrlEncoded("user_id".into(), PSID.into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"data":[{"id":"t_100"}]}"#)
        .create_async()
        .await
}

const TWO_TEXTS_PAGE: &str = r#"{
    "data": [
        {
            "id": "m_1",
            "message": "hi, is my order ready?",
            "from": {"id": "psid-1"},
            "to": {"data": [{"id": "page-1"}]},
            "created_time": "2024-03-01T08:00:00+0000"
        },
        {
            "id": "m_2",
            "message": "yes, shipping today",
            "from": {"id": "page-1"},
            "to": {"data": [{"id": "psid-1"}]},
            "created_time": "2024-03-01T08:05:00+0000"
        }
    ],
    "paging": {"cursors": {"after": "a1"}}
}"#;

/// **Scenario: happy path.** Two text records, one from the customer and one
/// from the page. Both save; directionality follows the sender id.
#[tokio::test]
async fn test_happy_path_two_texts() {
    let mut server = mockito::Server::new_async().await;
    mock_conversation_lookup(&mut server).await;
    server
        .mock("GET", "/v19.0/t_100/messages")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(TWO_TEXTS_PAGE)
        .create_async()
        .await;

    let fixture = setup(&server).await;
    let report = fixture
        .service
        .sync_conversation(COMPANY, &fixture.conversation_id)
        .await
        .expect("sync must succeed");

    assert_eq!(report.total_fetched, 2);
    assert_eq!(report.saved, 2);
    assert_eq!(report.skipped, 0);
    assert_eq!(report.errors, 0);
    assert_eq!(report.direction_fallbacks, 0);

    let stored = fixture
        .messages
        .get_messages_by_conversation(&fixture.conversation_id)
        .await
        .expect("Failed to load messages");
    assert_eq!(stored.len(), 2);

    let customer_msg = stored
        .iter()
        .find(|m| m.remote_id.as_deref() == Some("m_1"))
        .expect("customer message stored");
    assert!(customer_msg.is_from_customer);
    assert!(!customer_msg.is_read);
    assert_eq!(customer_msg.kind, "TEXT");
    assert_eq!(customer_msg.content, "hi, is my order ready?");

    let page_msg = stored
        .iter()
        .find(|m| m.remote_id.as_deref() == Some("m_2"))
        .expect("page message stored");
    assert!(!page_msg.is_from_customer);

    // Metadata bag keeps the remote id for audit.
    let metadata: serde_json::Value =
        serde_json::from_str(customer_msg.metadata.as_deref().expect("metadata present"))
            .expect("metadata is JSON");
    assert_eq!(metadata["fbMessageId"], "m_1");
    assert_eq!(metadata["from"], "psid-1");
}

/// **Scenario: idempotence.** Running the sync twice on an unchanged remote
/// conversation saves nothing the second time; every record is recognized by
/// its remote id.
#[tokio::test]
async fn test_second_run_skips_everything() {
    let mut server = mockito::Server::new_async().await;
    mock_conversation_lookup(&mut server).await;
    server
        .mock("GET", "/v19.0/t_100/messages")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(TWO_TEXTS_PAGE)
        .create_async()
        .await;

    let fixture = setup(&server).await;
    let first = fixture
        .service
        .sync_conversation(COMPANY, &fixture.conversation_id)
        .await
        .expect("first sync must succeed");
    assert_eq!(first.saved, 2);

    let second = fixture
        .service
        .sync_conversation(COMPANY, &fixture.conversation_id)
        .await
        .expect("second sync must succeed");
    assert_eq!(second.total_fetched, 2);
    assert_eq!(second.saved, 0);
    assert_eq!(second.skipped, 2);

    let count = fixture
        .messages
        .count_for_conversation(&fixture.conversation_id)
        .await
        .expect("Failed to count");
    assert_eq!(count, 2);
}

/// **Scenario: image with missing URL.** No URL anywhere, no attachment id,
/// and the message-detail fallback fails. The record still persists as IMAGE
/// with an empty URL portion after the caption.
#[tokio::test]
async fn test_image_without_url_still_persists() {
    let mut server = mockito::Server::new_async().await;
    mock_conversation_lookup(&mut server).await;
    server
        .mock("GET", "/v19.0/t_100/messages")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{
                "data": [
                    {
                        "id": "m_img",
                        "message": "my receipt",
                        "from": {"id": "psid-1"},
                        "created_time": "2024-03-02T10:00:00+0000",
                        "attachments": {"data": [{"type": "image"}]}
                    }
                ]
            }"#,
        )
        .create_async()
        .await;
    // The URL-recovery fetch by message id fails; classification swallows it.
    server
        .mock("GET", "/v19.0/m_img")
        .match_query(Matcher::Any)
        .with_status(500)
        .with_body(r#"{"error":{"message":"boom","code":1}}"#)
        .create_async()
        .await;

    let fixture = setup(&server).await;
    let report = fixture
        .service
        .sync_conversation(COMPANY, &fixture.conversation_id)
        .await
        .expect("sync must succeed");

    assert_eq!(report.saved, 1);
    assert_eq!(report.errors, 0);

    let stored = fixture
        .messages
        .get_messages_by_conversation(&fixture.conversation_id)
        .await
        .expect("Failed to load messages");
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].kind, "IMAGE");
    assert_eq!(stored[0].content, "my receipt |IMAGE_URL|");
}

/// **Scenario: remote permission error.** Facebook answers with code 100;
/// the run fails with a 403-mapped error carrying Facebook's message.
#[tokio::test]
async fn test_permission_error_maps_to_403() {
    let mut server = mockito::Server::new_async().await;
    mock_conversation_lookup(&mut server).await;
    server
        .mock("GET", "/v19.0/t_100/messages")
        .match_query(Matcher::Any)
        .with_status(400)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"error":{"message":"(#100) Requires pages_messaging permission","type":"GraphMethodException","code":100}}"#,
        )
        .create_async()
        .await;

    let fixture = setup(&server).await;
    let err = fixture
        .service
        .sync_conversation(COMPANY, &fixture.conversation_id)
        .await
        .expect_err("sync must fail");

    assert_eq!(err.http_status(), 403);
    match &err {
        SyncError::RemoteApi { message, code, .. } => {
            assert!(message.contains("pages_messaging"));
            assert_eq!(*code, Some(100));
        }
        other => panic!("Expected RemoteApi, got {:?}", other),
    }

    let count = fixture
        .messages
        .count_for_conversation(&fixture.conversation_id)
        .await
        .expect("Failed to count");
    assert_eq!(count, 0);
}

/// **Scenario: no remote conversation.** The participant-filtered lookup
/// returns an empty list; the run fails with a 404-mapped error and writes
/// nothing.
#[tokio::test]
async fn test_no_remote_conversation_maps_to_404() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", format!("/v19.0/{}/conversations", PAGE).as_str())
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"data":[]}"#)
        .create_async()
        .await;

    let fixture = setup(&server).await;
    let err = fixture
        .service
        .sync_conversation(COMPANY, &fixture.conversation_id)
        .await
        .expect_err("sync must fail");

    assert!(matches!(err, SyncError::RemoteConversationNotFound));
    assert_eq!(err.http_status(), 404);

    let count = fixture
        .messages
        .count_for_conversation(&fixture.conversation_id)
        .await
        .expect("Failed to count");
    assert_eq!(count, 0);
}

/// **Scenario: page-cap enforcement.** The remote always reports a next page;
/// the fetcher stops after 3 requests regardless.
#[tokio::test]
async fn test_page_cap_stops_at_three_pages() {
    fn page_body(id: &str, after: &str) -> String {
        format!(
            r#"{{
                "data": [{{
                    "id": "{id}",
                    "message": "msg {id}",
                    "from": {{"id": "psid-1"}},
                    "created_time": "2024-03-01T08:00:00+0000"
                }}],
                "paging": {{
                    "cursors": {{"after": "{after}"}},
                    "next": "https://graph.facebook.com/next"
                }}
            }}"#
        )
    }

    let mut server = mockito::Server::new_async().await;
    mock_conversation_lookup(&mut server).await;

    // mockito gives the last registered matching mock priority, so the
    // cursor-specific mocks are registered after the first-page catch-all.
    server
        .mock("GET", "/v19.0/t_100/messages")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(page_body("m_p1", "a1"))
        .create_async()
        .await;
    server
        .mock("GET", "/v19.0/t_100/messages")
        .match_query(Matcher::UrlEncoded("after".into(), "a1".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(page_body("m_p2", "a2"))
        .create_async()
        .await;
    server
        .mock("GET", "/v19.0/t_100/messages")
        .match_query(Matcher::UrlEncoded("after".into(), "a2".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(page_body("m_p3", "a3"))
        .create_async()
        .await;
    let fourth_page = server
        .mock("GET", "/v19.0/t_100/messages")
        .match_query(Matcher::UrlEncoded("after".into(), "a3".into()))
        .expect(0)
        .create_async()
        .await;

    let fixture = setup(&server).await;
    let report = fixture
        .service
        .sync_conversation(COMPANY, &fixture.conversation_id)
        .await
        .expect("sync must succeed");

    assert_eq!(report.total_fetched, 3);
    assert_eq!(report.saved, 3);
    fourth_page.assert_async().await;
}

/// **Scenario: ambiguous directionality.** A record whose sender matches
/// neither party defaults to the business side and is counted as a fallback.
#[tokio::test]
async fn test_ambiguous_direction_is_counted() {
    let mut server = mockito::Server::new_async().await;
    mock_conversation_lookup(&mut server).await;
    server
        .mock("GET", "/v19.0/t_100/messages")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{
                "data": [{
                    "id": "m_odd",
                    "message": "who sent this?",
                    "from": {"id": "someone-else"},
                    "created_time": "2024-03-01T08:00:00+0000"
                }]
            }"#,
        )
        .create_async()
        .await;

    let fixture = setup(&server).await;
    let report = fixture
        .service
        .sync_conversation(COMPANY, &fixture.conversation_id)
        .await
        .expect("sync must succeed");

    assert_eq!(report.direction_fallbacks, 1);

    let stored = fixture
        .messages
        .get_messages_by_conversation(&fixture.conversation_id)
        .await
        .expect("Failed to load messages");
    assert!(!stored[0].is_from_customer);
}

/// **Test: Resolution failures map to the documented statuses.**
///
/// Unknown conversation → 404; conversation without a PSID → 400;
/// disconnected channel → 404. No Graph call is made for any of them.
#[tokio::test]
async fn test_resolution_failures() {
    let server = mockito::Server::new_async().await;
    let fixture = setup(&server).await;

    let err = fixture
        .service
        .sync_conversation(COMPANY, "no-such-conversation")
        .await
        .expect_err("sync must fail");
    assert!(matches!(err, SyncError::ConversationNotFound(_)));
    assert_eq!(err.http_status(), 404);

    let no_psid = ConversationRecord::new(
        COMPANY.to_string(),
        "facebook".to_string(),
        None,
        Some(format!(r#"{{"pageId":"{}"}}"#, PAGE)),
    );
    fixture
        .conversations
        .save(&no_psid)
        .await
        .expect("Failed to save conversation");
    let err = fixture
        .service
        .sync_conversation(COMPANY, &no_psid.id)
        .await
        .expect_err("sync must fail");
    assert!(matches!(err, SyncError::MissingCustomerIdentity));
    assert_eq!(err.http_status(), 400);

    let mut disconnected = ChannelRecord::new(
        PAGE.to_string(),
        COMPANY.to_string(),
        "Test Page".to_string(),
        "stale-token".to_string(),
    );
    disconnected.status = "disconnected".to_string();
    fixture
        .channels
        .save(&disconnected)
        .await
        .expect("Failed to save channel");
    let err = fixture
        .service
        .sync_conversation(COMPANY, &fixture.conversation_id)
        .await
        .expect_err("sync must fail");
    assert!(matches!(err, SyncError::CredentialUnavailable(_)));
    assert_eq!(err.http_status(), 404);
}

/// **Test: Channel fallback.** A conversation without a pinned pageId uses
/// the company's most recently connected channel.
#[tokio::test]
async fn test_resolver_falls_back_to_latest_channel() {
    let mut server = mockito::Server::new_async().await;
    mock_conversation_lookup(&mut server).await;
    server
        .mock("GET", "/v19.0/t_100/messages")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(TWO_TEXTS_PAGE)
        .create_async()
        .await;

    let fixture = setup(&server).await;
    let unpinned = ConversationRecord::new(
        COMPANY.to_string(),
        "facebook".to_string(),
        Some(PSID.to_string()),
        None,
    );
    fixture
        .conversations
        .save(&unpinned)
        .await
        .expect("Failed to save conversation");

    let report = fixture
        .service
        .sync_conversation(COMPANY, &unpinned.id)
        .await
        .expect("sync must succeed");
    assert_eq!(report.saved, 2);
}

/// **Scenario: malformed attachment payload.** One record carries a
/// wrong-typed attachment field. The run succeeds, the bad record persists
/// with placeholder content and is counted as an error, and its sibling is
/// untouched.
#[tokio::test]
async fn test_malformed_attachment_does_not_abort_batch() {
    let mut server = mockito::Server::new_async().await;
    mock_conversation_lookup(&mut server).await;
    server
        .mock("GET", "/v19.0/t_100/messages")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{
                "data": [
                    {
                        "id": "m_ok",
                        "message": "hello",
                        "from": {"id": "psid-1"},
                        "created_time": "2024-03-01T08:00:00+0000"
                    },
                    {
                        "id": "m_bad",
                        "from": {"id": "psid-1"},
                        "created_time": "2024-03-01T08:01:00+0000",
                        "attachments": {"data": [{"type": "image", "image_data": "oops-not-an-object"}]}
                    }
                ]
            }"#,
        )
        .create_async()
        .await;

    let fixture = setup(&server).await;
    let report = fixture
        .service
        .sync_conversation(COMPANY, &fixture.conversation_id)
        .await
        .expect("sync must succeed");

    assert_eq!(report.total_fetched, 2);
    assert_eq!(report.saved, 2);
    assert_eq!(report.errors, 1);

    let stored = fixture
        .messages
        .get_messages_by_conversation(&fixture.conversation_id)
        .await
        .expect("Failed to load messages");
    assert_eq!(stored.len(), 2);

    let bad = stored
        .iter()
        .find(|m| m.remote_id.as_deref() == Some("m_bad"))
        .expect("malformed record stored");
    assert_eq!(bad.kind, "TEXT");
    assert_eq!(bad.content, "[Message]");

    let ok = stored
        .iter()
        .find(|m| m.remote_id.as_deref() == Some("m_ok"))
        .expect("well-formed record stored");
    assert_eq!(ok.content, "hello");
}

/// **Scenario: bulk failure falls back to row inserts.** A batch with one row
/// referencing a nonexistent conversation fails the bulk statement wholesale;
/// the fallback saves the valid row and counts the bad one.
#[tokio::test]
async fn test_bulk_failure_falls_back_to_row_inserts() {
    let pool = SqlitePoolManager::new("sqlite::memory:")
        .await
        .expect("Failed to create pool");
    let conversations = ConversationRepository::new(pool.clone())
        .await
        .expect("Failed to create conversation repository");
    let messages = MessageRepository::new(pool)
        .await
        .expect("Failed to create message repository");

    let conversation = ConversationRecord::new(
        COMPANY.to_string(),
        "facebook".to_string(),
        Some(PSID.to_string()),
        None,
    );
    conversations
        .save(&conversation)
        .await
        .expect("Failed to save conversation");

    let good = NormalizedMessage::new(
        conversation.id.clone(),
        MessageKind::Text,
        "hello".to_string(),
        true,
        Some("m_ok".to_string()),
        None,
        Utc::now(),
    );
    let bad = NormalizedMessage::new(
        "no-such-conversation".to_string(),
        MessageKind::Text,
        "orphan".to_string(),
        true,
        Some("m_bad".to_string()),
        None,
        Utc::now(),
    );

    let persister = BulkPersister::new(messages.clone(), conversations.clone());
    let outcome = persister
        .persist(&conversation.id, &[good, bad])
        .await
        .expect("persist must succeed");

    assert_eq!(outcome.saved, 1);
    assert_eq!(outcome.errors, 1);

    let count = messages
        .count_for_conversation(&conversation.id)
        .await
        .expect("Failed to count");
    assert_eq!(count, 1);
}
