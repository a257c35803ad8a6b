use assert_matches::assert_matches;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use notification_cell::*;

fn message() -> EmailMessage {
    EmailMessage {
        from: "noreply@slotbook.local".to_string(),
        to: "ada@example.com".to_string(),
        subject: "Booking received".to_string(),
        text: "See you soon".to_string(),
    }
}

#[tokio::test]
async fn test_http_sender_posts_message_with_bearer_key() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/emails"))
        .and(header("authorization", "Bearer mail-key"))
        .and(body_partial_json(json!({ "to": "ada@example.com", "subject": "Booking received" })))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;

    let sender = HttpEmailSender::new(&format!("{}/emails", server.uri()), "mail-key");

    sender.send(&message()).await.unwrap();
}

#[tokio::test]
async fn test_http_sender_reports_provider_errors() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/emails"))
        .respond_with(ResponseTemplate::new(422).set_body_string("invalid recipient"))
        .mount(&server)
        .await;

    let sender = HttpEmailSender::new(&format!("{}/emails", server.uri()), "mail-key");

    let result = sender.send(&message()).await;

    assert_matches!(result, Err(NotificationError::Delivery(msg)) if msg.contains("invalid recipient"));
}
