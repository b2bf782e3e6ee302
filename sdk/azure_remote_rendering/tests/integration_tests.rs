//! Integration tests for azure_remote_rendering.
//!
//! These tests require a live Remote Rendering account.
//! Run with: `cargo test --features integration-tests`
//!
//! Required environment variables:
//! - `AZURE_REMOTE_RENDERING_ENDPOINT`: The regional service endpoint URL
//! - `AZURE_REMOTE_RENDERING_ACCOUNT_ID`: The account identifier
//! - `AZURE_REMOTE_RENDERING_ACCOUNT_KEY`: The account key

#![cfg(feature = "integration-tests")]

use azure_remote_rendering::models::{CreateSessionSettings, SessionSize, SessionStatus};
use azure_remote_rendering::session;
use azure_remote_rendering_core::auth::RemoteRenderingCredential;
use azure_remote_rendering_core::client::RemoteRenderingClient;
use azure_remote_rendering_core::polling::PollingOptions;
use std::time::Duration;

fn get_client() -> RemoteRenderingClient {
    let endpoint = std::env::var("AZURE_REMOTE_RENDERING_ENDPOINT")
        .expect("AZURE_REMOTE_RENDERING_ENDPOINT not set");
    let key = std::env::var("AZURE_REMOTE_RENDERING_ACCOUNT_KEY")
        .expect("AZURE_REMOTE_RENDERING_ACCOUNT_KEY not set");

    RemoteRenderingClient::builder()
        .endpoint(endpoint)
        .credential(RemoteRenderingCredential::account_key(key))
        .build()
        .expect("failed to build client")
}

fn get_account_id() -> String {
    std::env::var("AZURE_REMOTE_RENDERING_ACCOUNT_ID")
        .expect("AZURE_REMOTE_RENDERING_ACCOUNT_ID not set")
}

#[tokio::test]
async fn test_session_lifecycle() {
    let client = get_client();
    let account_id = get_account_id();
    let session_id = format!("it-session-{}", std::process::id());

    let poller = session::begin_session_with_options(
        &client,
        &account_id,
        &session_id,
        CreateSessionSettings {
            size: SessionSize::Standard,
            max_lease_time_minutes: 5,
        },
        PollingOptions {
            interval: Duration::from_secs(5),
            deadline: Some(Duration::from_secs(600)),
            ..PollingOptions::default()
        },
    )
    .await
    .expect("create session");

    let session = poller.wait().await.expect("session should reach Ready");
    assert_eq!(session.status, Some(SessionStatus::Ready));
    assert!(session.hostname.is_some());

    session::stop_session(&client, &account_id, &session_id)
        .await
        .expect("stop session");

    let stopped = session::get_session(&client, &account_id, &session_id)
        .await
        .expect("get session");
    assert!(matches!(
        stopped.status,
        Some(SessionStatus::Stopped) | Some(SessionStatus::Expired)
    ));
}

#[tokio::test]
async fn test_list_sessions() {
    let client = get_client();
    let account_id = get_account_id();

    let mut pager = session::list_sessions(&client, &account_id).expect("build pager");
    while let Some(session) = pager.next_item().await.expect("page sessions") {
        assert!(!session.id.is_empty());
    }
    assert!(pager.finished());
}
