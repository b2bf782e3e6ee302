//! Rendering session operations.
//!
//! A rendering session leases a server that the client runtime connects to.
//! Creating a session starts server-side provisioning that is observed
//! through a poller until the session reaches `Expired`, `Error`, `Stopped`
//! or `Ready`. `Ready` counts as terminal: the poller's job ends when the
//! session becomes usable, not when it stops existing.
//!
//! ## Example
//!
//! ```rust,no_run
//! use azure_remote_rendering::models::{CreateSessionSettings, SessionSize};
//! use azure_remote_rendering::session;
//! use azure_remote_rendering_core::auth::RemoteRenderingCredential;
//! use azure_remote_rendering_core::client::RemoteRenderingClient;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = RemoteRenderingClient::builder()
//!     .endpoint("https://remoterendering.eastus2.mixedreality.azure.com")
//!     .credential(RemoteRenderingCredential::account_key("your-key"))
//!     .build()?;
//!
//! let settings = CreateSessionSettings {
//!     size: SessionSize::Standard,
//!     max_lease_time_minutes: 30,
//! };
//! let poller = session::begin_session(&client, "acc-1", "sess-1", settings).await?;
//! let session = poller.wait().await?;
//! println!("connect to {:?}", session.hostname);
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use std::collections::HashMap;

use azure_remote_rendering_core::client::{HttpRequest, RemoteRenderingClient};
use azure_remote_rendering_core::continuation::ContinuationToken;
use azure_remote_rendering_core::error::Result;
use azure_remote_rendering_core::paging::{BasicPaging, PageSettings, Pager};
use azure_remote_rendering_core::polling::{OperationPoller, PollStrategy, PollingOptions};

use crate::models::{
    CreateSessionSettings, RenderingSession, SessionStatus, UpdateSessionSettings,
};

fn session_path(account_id: &str, session_id: &str) -> String {
    format!("/accounts/{}/sessions/{}", account_id, session_id)
}

/// Polling strategy for rendering sessions.
///
/// Probes `GET /accounts/{account_id}/sessions/{session_id}`; terminal on
/// `Expired`, `Error`, `Stopped` or `Ready`.
pub struct SessionPolling {
    account_id: String,
    session_id: String,
}

impl SessionPolling {
    /// Strategy bound to one session.
    pub fn new(account_id: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            session_id: session_id.into(),
        }
    }

    /// Rebuild a strategy from an opaque continuation token.
    ///
    /// # Errors
    ///
    /// Fails when the token is malformed or was produced by a
    /// different/newer client version.
    pub fn from_continuation_token(token: &str) -> Result<Self> {
        let decoded = ContinuationToken::decode(token)?;
        Ok(Self::new(decoded.account_id, decoded.resource_id))
    }
}

#[async_trait]
impl PollStrategy for SessionPolling {
    type Output = RenderingSession;
    type Status = SessionStatus;

    async fn query_status(&self, client: &RemoteRenderingClient) -> Result<RenderingSession> {
        let url = client.url(&session_path(&self.account_id, &self.session_id))?;
        let response = client
            .execute_checked(&HttpRequest::get(url), &HashMap::new())
            .await?;
        response.json()
    }

    fn status(&self, resource: &RenderingSession) -> Option<SessionStatus> {
        resource.status
    }

    fn is_terminated(&self, status: &SessionStatus) -> bool {
        matches!(
            status,
            SessionStatus::Expired
                | SessionStatus::Error
                | SessionStatus::Stopped
                | SessionStatus::Ready
        )
    }

    fn continuation_token(&self) -> ContinuationToken {
        ContinuationToken::new(&self.account_id, &self.session_id)
    }
}

/// Start a new rendering session and return a poller observing it.
///
/// # Tracing
///
/// Emits a span named `remote_rendering::sessions::begin` with fields
/// `account_id` and `session_id`.
#[tracing::instrument(
    name = "remote_rendering::sessions::begin",
    skip(client, settings),
    fields(account_id = %account_id, session_id = %session_id)
)]
pub async fn begin_session(
    client: &RemoteRenderingClient,
    account_id: &str,
    session_id: &str,
    settings: CreateSessionSettings,
) -> Result<OperationPoller<SessionPolling>> {
    begin_session_with_options(
        client,
        account_id,
        session_id,
        settings,
        PollingOptions::default(),
    )
    .await
}

/// Start a new rendering session with explicit polling options.
pub async fn begin_session_with_options(
    client: &RemoteRenderingClient,
    account_id: &str,
    session_id: &str,
    settings: CreateSessionSettings,
    options: PollingOptions,
) -> Result<OperationPoller<SessionPolling>> {
    tracing::debug!("creating session");

    let url = client.url(&session_path(account_id, session_id))?;
    let body = serde_json::to_value(settings)?;
    let response = client
        .execute_checked(&HttpRequest::put(url, body), &HashMap::new())
        .await?;
    let initial: RenderingSession = response.json()?;

    tracing::debug!(status = ?initial.status, "session created");

    Ok(OperationPoller::with_options(
        client.clone(),
        SessionPolling::new(account_id, session_id),
        initial,
        options,
    ))
}

/// Return the properties of a previously created rendering session.
#[tracing::instrument(
    name = "remote_rendering::sessions::get",
    skip(client),
    fields(account_id = %account_id, session_id = %session_id)
)]
pub async fn get_session(
    client: &RemoteRenderingClient,
    account_id: &str,
    session_id: &str,
) -> Result<RenderingSession> {
    let url = client.url(&session_path(account_id, session_id))?;
    let response = client
        .execute_checked(&HttpRequest::get(url), &HashMap::new())
        .await?;
    response.json()
}

/// Extend the lease time of a running rendering session.
///
/// The new lease time has to be strictly larger than the previous one.
#[tracing::instrument(
    name = "remote_rendering::sessions::update",
    skip(client, settings),
    fields(account_id = %account_id, session_id = %session_id)
)]
pub async fn update_session(
    client: &RemoteRenderingClient,
    account_id: &str,
    session_id: &str,
    settings: UpdateSessionSettings,
) -> Result<RenderingSession> {
    let url = client.url(&session_path(account_id, session_id))?;
    let body = serde_json::to_value(settings)?;
    let response = client
        .execute_checked(&HttpRequest::patch(url, body), &HashMap::new())
        .await?;
    response.json()
}

/// Stop a rendering session. Stopped sessions cannot be restarted.
#[tracing::instrument(
    name = "remote_rendering::sessions::stop",
    skip(client),
    fields(account_id = %account_id, session_id = %session_id)
)]
pub async fn stop_session(
    client: &RemoteRenderingClient,
    account_id: &str,
    session_id: &str,
) -> Result<()> {
    let url = client.url(&format!(
        "{}/:stop",
        session_path(account_id, session_id)
    ))?;
    client
        .execute_checked(&HttpRequest::post(url), &HashMap::new())
        .await?;
    Ok(())
}

/// List the rendering sessions of an account as a lazily-fetched sequence.
///
/// Only sessions in the `Starting` or `Ready` state are returned by the
/// service; stopped and failed sessions are not listed.
pub fn list_sessions(
    client: &RemoteRenderingClient,
    account_id: &str,
) -> Result<Pager<RenderingSession>> {
    let url = client.url(&format!("/accounts/{}/sessions", account_id))?;
    let strategy = BasicPaging::new(
        HttpRequest::get(url),
        PageSettings::new()
            .item_name("sessions")
            .next_link_name("nextLink"),
    );
    Ok(Pager::new(client.clone(), Box::new(strategy)))
}

/// Resume observing a session from an opaque continuation token.
///
/// One fresh probe is issued against the `(account_id, session_id)` pair
/// carried by the token.
#[tracing::instrument(name = "remote_rendering::sessions::resume", skip(client, token))]
pub async fn resume_session_polling(
    client: &RemoteRenderingClient,
    token: &str,
) -> Result<OperationPoller<SessionPolling>> {
    let strategy = SessionPolling::from_continuation_token(token)?;
    OperationPoller::resume(client.clone(), strategy).await
}
