//! Linking a device end to end.

mod support;

use std::time::Duration;

use distrack_domain::constants::{LINK_FINISH_PATH, LINK_START_PATH, ME_PATH};
use distrack_infra::{LinkError, LinkSession};
use serde_json::json;
use support::Stack;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, ResponseTemplate};

fn quick_session(expires_in: u64) -> LinkSession {
    LinkSession {
        poll_token: "P".to_string(),
        link_code: "ABC-123".to_string(),
        verification_url: None,
        expires_in,
        poll_interval: Duration::from_millis(20),
    }
}

/// Validates the happy linking path.
///
/// Assertions:
/// - `start` reports the code and server poll interval.
/// - Polling continues through pending answers until tokens arrive.
/// - Stored tokens authorize the next API call.
#[tokio::test]
async fn link_then_call_api() {
    let stack = Stack::new().await;
    let device_id = stack.services.tokens.device_id().unwrap();

    Mock::given(method("POST"))
        .and(path(LINK_START_PATH))
        .and(body_json(json!({"device_id": device_id})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "poll_token": "P",
            "link_code": "ABC-123",
            "verification_url": "https://distrack.test/link",
            "expires_in": 600,
            "poll_interval": 1
        })))
        .expect(1)
        .mount(&stack.server)
        .await;
    Mock::given(method("POST"))
        .and(path(LINK_FINISH_PATH))
        .respond_with(ResponseTemplate::new(425))
        .up_to_n_times(2)
        .expect(2)
        .mount(&stack.server)
        .await;
    Mock::given(method("POST"))
        .and(path(LINK_FINISH_PATH))
        .and(body_json(json!({"device_id": device_id, "poll_token": "P"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "A",
            "refresh_token": "R",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&stack.server)
        .await;
    Mock::given(method("GET"))
        .and(path(ME_PATH))
        .and(header("Authorization", "Bearer A"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"userId": "1", "username": "n"})),
        )
        .expect(1)
        .mount(&stack.server)
        .await;

    let link = &stack.services.link;
    let started = link.start(&device_id).await.unwrap();
    assert_eq!(started.link_code, "ABC-123");
    assert_eq!(started.poll_interval, Duration::from_secs(1));

    let session = LinkSession { poll_interval: Duration::from_millis(20), ..started };
    link.wait_for_link(&stack.services.tokens, &session, &CancellationToken::new())
        .await
        .unwrap();

    assert!(stack.services.tokens.has_linked_account().await.unwrap());
    assert_eq!(stack.refresh_token().as_deref(), Some("R"));
    stack.services.account.profile().await.unwrap();
}

#[tokio::test]
async fn server_expiry_stops_polling() {
    let stack = Stack::new().await;
    Mock::given(method("POST"))
        .and(path(LINK_FINISH_PATH))
        .respond_with(ResponseTemplate::new(410))
        .expect(1)
        .mount(&stack.server)
        .await;

    let result = stack
        .services
        .link
        .wait_for_link(&stack.services.tokens, &quick_session(600), &CancellationToken::new())
        .await;

    assert!(matches!(result, Err(LinkError::Expired)));
    assert!(!stack.services.tokens.has_linked_account().await.unwrap());
}

#[tokio::test]
async fn code_lifetime_bounds_polling() {
    let stack = Stack::new().await;
    Mock::given(method("POST"))
        .and(path(LINK_FINISH_PATH))
        .respond_with(ResponseTemplate::new(404))
        .mount(&stack.server)
        .await;
    let session = LinkSession { poll_interval: Duration::from_millis(400), ..quick_session(1) };

    let result = stack
        .services
        .link
        .wait_for_link(&stack.services.tokens, &session, &CancellationToken::new())
        .await;

    assert!(matches!(result, Err(LinkError::Expired)));
}

#[tokio::test]
async fn cancellation_stops_polling() {
    let stack = Stack::new().await;
    Mock::given(method("POST"))
        .and(path(LINK_FINISH_PATH))
        .respond_with(ResponseTemplate::new(409))
        .mount(&stack.server)
        .await;
    let cancel = CancellationToken::new();
    let trigger = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            cancel.cancel();
        })
    };

    let session = quick_session(600);
    let result = stack.services.link.wait_for_link(&stack.services.tokens, &session, &cancel).await;
    trigger.await.unwrap();

    assert!(matches!(result, Err(LinkError::Cancelled)));
}
