//! # Azure Remote Rendering
//!
//! Client for the Azure Remote Rendering service.
//!
//! This crate provides asset conversion and rendering session management on
//! top of the generic paging and polling engines in
//! [`azure_remote_rendering_core`]. Conversions turn source models into the
//! runtime's asset format; sessions lease rendering servers the client
//! runtime connects to. Both are long-running operations observed through
//! pollers, and both can be listed through pagers.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use azure_remote_rendering::models::{CreateSessionSettings, SessionSize};
//! use azure_remote_rendering::session;
//! use azure_remote_rendering_core::auth::RemoteRenderingCredential;
//! use azure_remote_rendering_core::client::RemoteRenderingClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = RemoteRenderingClient::builder()
//!         .endpoint("https://remoterendering.eastus2.mixedreality.azure.com")
//!         .credential(RemoteRenderingCredential::account_key("your-key"))
//!         .build()?;
//!
//!     let settings = CreateSessionSettings {
//!         size: SessionSize::Standard,
//!         max_lease_time_minutes: 30,
//!     };
//!     let poller = session::begin_session(&client, "account-id", "my-session", settings).await?;
//!     let session = poller.wait().await?;
//!     println!("session ready at {:?}", session.hostname);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Core Concepts
//!
//! - **Conversion**: server-side transformation of a source model into a
//!   `.arrAsset`, terminal on `Failed` or `Succeeded`.
//! - **Rendering session**: a leased rendering server, terminal (for the
//!   poller) on `Expired`, `Error`, `Stopped` or `Ready`.
//! - **Continuation token**: an opaque string from which polling can be
//!   resumed in another process without replaying the creation request.
//!
//! ## Modules
//!
//! - [`conversion`] - Start, retrieve, list and observe asset conversions
//! - [`session`] - Start, retrieve, update, stop, list and observe sessions
//! - [`models`] - Wire types shared by both

pub mod conversion;
pub mod models;
pub mod session;

/// Test utilities shared across modules.
#[cfg(test)]
pub(crate) mod test_utils {
    use azure_remote_rendering_core::auth::RemoteRenderingCredential;
    use azure_remote_rendering_core::client::RemoteRenderingClient;
    use wiremock::MockServer;

    /// Test account key (not a real key).
    pub const TEST_ACCOUNT_KEY: &str = "test-account-key";

    /// Account identifier used in test paths.
    pub const TEST_ACCOUNT: &str = "acc-1";

    /// Create a test client connected to a mock server.
    pub async fn setup_mock_client(server: &MockServer) -> RemoteRenderingClient {
        RemoteRenderingClient::builder()
            .endpoint(server.uri())
            .credential(RemoteRenderingCredential::account_key(TEST_ACCOUNT_KEY))
            .build()
            .expect("should build client")
    }
}
