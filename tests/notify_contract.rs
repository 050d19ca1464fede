//! Notification channel contract tests.
//!
//! Verify the template-send request format: endpoint path, service
//! account fields, and the named template parameters an expiry warning
//! carries.

use serde_json::json;
use warden::WardenError;
use warden::config::NotifyConfig;
use warden::notify::{EmailNotifier, ExpiryWarning, Notifier};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn notify_config(server: &MockServer) -> NotifyConfig {
    NotifyConfig {
        base_url: server.uri(),
        service_id: "service_1".to_owned(),
        template_id: "template_expiry".to_owned(),
        public_key: "public_key_1".to_owned(),
    }
}

fn warning(days_left: i64) -> ExpiryWarning {
    ExpiryWarning {
        to_email: "owner@example.com".to_owned(),
        to_name: "Owner".to_owned(),
        domain_name: "example.com".to_owned(),
        days_left,
    }
}

#[tokio::test]
async fn send_posts_service_account_and_template_params() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1.0/email/send"))
        .and(body_partial_json(json!({
            "service_id": "service_1",
            "template_id": "template_expiry",
            "user_id": "public_key_1",
            "template_params": {
                "to_email": "owner@example.com",
                "to_name": "Owner",
                "domain_name": "example.com",
                "days_left": "30",
                "urgency_level": "warning",
                "subject": "example.com expires in 30 days"
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
        .expect(1)
        .mount(&server)
        .await;

    let notifier = EmailNotifier::new(&notify_config(&server));
    notifier.send_expiry_warning(&warning(30)).await.expect("send");
}

#[tokio::test]
async fn last_day_warning_is_critical() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1.0/email/send"))
        .and(body_partial_json(json!({
            "template_params": {
                "days_left": "1",
                "urgency_level": "critical",
                "subject": "example.com expires in 1 day"
            }
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let notifier = EmailNotifier::new(&notify_config(&server));
    notifier.send_expiry_warning(&warning(1)).await.expect("send");
}

#[tokio::test]
async fn rejected_send_is_a_notify_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1.0/email/send"))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
        .mount(&server)
        .await;

    let notifier = EmailNotifier::new(&notify_config(&server));
    let result = notifier.send_expiry_warning(&warning(30)).await;
    match result {
        Err(WardenError::Notify(msg)) => assert!(msg.contains("429"), "message was: {msg}"),
        other => panic!("expected notify error, got {other:?}"),
    }
}
