//! Asset conversion operations.
//!
//! A conversion turns a source model (for example FBX or glTF) into the
//! `.arrAsset` format the rendering runtime consumes. Creating a conversion
//! starts server-side work that is observed through a poller until it
//! reaches `Failed` or `Succeeded`.
//!
//! ## Example
//!
//! ```rust,no_run
//! use azure_remote_rendering::conversion;
//! use azure_remote_rendering::models::{
//!     ConversionInputSettings, ConversionOutputSettings, ConversionSettings,
//! };
//! use azure_remote_rendering_core::auth::RemoteRenderingCredential;
//! use azure_remote_rendering_core::client::RemoteRenderingClient;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = RemoteRenderingClient::builder()
//!     .endpoint("https://remoterendering.eastus2.mixedreality.azure.com")
//!     .credential(RemoteRenderingCredential::account_key("your-key"))
//!     .build()?;
//!
//! let settings = ConversionSettings {
//!     input_location: ConversionInputSettings {
//!         storage_container_uri: "https://storage/input".into(),
//!         storage_container_read_list_sas: None,
//!         blob_prefix: None,
//!         relative_input_asset_path: "model.fbx".into(),
//!     },
//!     output_location: ConversionOutputSettings {
//!         storage_container_uri: "https://storage/output".into(),
//!         storage_container_write_sas: None,
//!         blob_prefix: None,
//!         output_asset_filename: Some("model.arrAsset".into()),
//!     },
//! };
//!
//! let poller = conversion::begin_conversion(&client, "acc-1", "conv-1", settings).await?;
//! let conversion = poller.wait().await?;
//! println!("converted: {:?}", conversion.output);
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

use crate::models::{Conversion, ConversionSettings, ConversionStatus, CreateConversionSettings};

fn conversion_path(account_id: &str, conversion_id: &str) -> String {
    format!("/accounts/{}/conversions/{}", account_id, conversion_id)
}

/// Polling strategy for asset conversions.
///
/// Probes `GET /accounts/{account_id}/conversions/{conversion_id}`;
/// terminal on `Failed` or `Succeeded`.
pub struct ConversionPolling {
    account_id: String,
    conversion_id: String,
}

impl ConversionPolling {
    /// Strategy bound to one conversion.
    pub fn new(account_id: impl Into<String>, conversion_id: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            conversion_id: conversion_id.into(),
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
impl PollStrategy for ConversionPolling {
    type Output = Conversion;
    type Status = ConversionStatus;

    async fn query_status(&self, client: &RemoteRenderingClient) -> Result<Conversion> {
        let url = client.url(&conversion_path(&self.account_id, &self.conversion_id))?;
        let response = client
            .execute_checked(&HttpRequest::get(url), &HashMap::new())
            .await?;
        response.json()
    }

    fn status(&self, resource: &Conversion) -> Option<ConversionStatus> {
        resource.status
    }

    fn is_terminated(&self, status: &ConversionStatus) -> bool {
        matches!(
            status,
            ConversionStatus::Failed | ConversionStatus::Succeeded
        )
    }

    fn continuation_token(&self) -> ContinuationToken {
        ContinuationToken::new(&self.account_id, &self.conversion_id)
    }
}

/// Start a new asset conversion and return a poller observing it.
///
/// The conversion ID is case sensitive, can contain alphanumeric
/// characters, hyphens and underscores, and cannot exceed 256 characters.
///
/// # Tracing
///
/// Emits a span named `remote_rendering::conversions::begin` with fields
/// `account_id` and `conversion_id`.
#[tracing::instrument(
    name = "remote_rendering::conversions::begin",
    skip(client, settings),
    fields(account_id = %account_id, conversion_id = %conversion_id)
)]
pub async fn begin_conversion(
    client: &RemoteRenderingClient,
    account_id: &str,
    conversion_id: &str,
    settings: ConversionSettings,
) -> Result<OperationPoller<ConversionPolling>> {
    begin_conversion_with_options(
        client,
        account_id,
        conversion_id,
        settings,
        PollingOptions::default(),
    )
    .await
}

/// Start a new asset conversion with explicit polling options.
pub async fn begin_conversion_with_options(
    client: &RemoteRenderingClient,
    account_id: &str,
    conversion_id: &str,
    settings: ConversionSettings,
    options: PollingOptions,
) -> Result<OperationPoller<ConversionPolling>> {
    tracing::debug!("creating conversion");

    let url = client.url(&conversion_path(account_id, conversion_id))?;
    let body = serde_json::to_value(CreateConversionSettings { settings })?;
    let response = client
        .execute_checked(&HttpRequest::put(url, body), &HashMap::new())
        .await?;
    let initial: Conversion = response.json()?;

    tracing::debug!(status = ?initial.status, "conversion created");

    Ok(OperationPoller::with_options(
        client.clone(),
        ConversionPolling::new(account_id, conversion_id),
        initial,
        options,
    ))
}

/// Retrieve the state of a previously created conversion.
///
/// # Tracing
///
/// Emits a span named `remote_rendering::conversions::get`.
#[tracing::instrument(
    name = "remote_rendering::conversions::get",
    skip(client),
    fields(account_id = %account_id, conversion_id = %conversion_id)
)]
pub async fn get_conversion(
    client: &RemoteRenderingClient,
    account_id: &str,
    conversion_id: &str,
) -> Result<Conversion> {
    let url = client.url(&conversion_path(account_id, conversion_id))?;
    let response = client
        .execute_checked(&HttpRequest::get(url), &HashMap::new())
        .await?;
    response.json()
}

/// List the conversions of an account as a lazily-fetched sequence.
///
/// # Example
///
/// ```rust,no_run
/// # use azure_remote_rendering_core::client::RemoteRenderingClient;
/// # use azure_remote_rendering::conversion;
/// # async fn example(client: &RemoteRenderingClient) -> azure_remote_rendering_core::error::Result<()> {
/// let mut conversions = conversion::list_conversions(client, "acc-1")?;
/// while let Some(c) = conversions.next_item().await? {
///     println!("{} {:?}", c.id, c.status);
/// }
/// # Ok(())
/// # }
/// ```
pub fn list_conversions(
    client: &RemoteRenderingClient,
    account_id: &str,
) -> Result<Pager<Conversion>> {
    let url = client.url(&format!("/accounts/{}/conversions", account_id))?;
    let strategy = BasicPaging::new(
        HttpRequest::get(url),
        PageSettings::new()
            .item_name("conversions")
            .next_link_name("nextLink"),
    );
    Ok(Pager::new(client.clone(), Box::new(strategy)))
}

/// Resume observing a conversion from an opaque continuation token,
/// typically produced by [`OperationPoller::continuation_token`] in
/// another process.
///
/// One fresh probe is issued against the `(account_id, conversion_id)`
/// pair carried by the token; nothing else crosses the token boundary.
#[tracing::instrument(name = "remote_rendering::conversions::resume", skip(client, token))]
pub async fn resume_conversion_polling(
    client: &RemoteRenderingClient,
    token: &str,
) -> Result<OperationPoller<ConversionPolling>> {
    let strategy = ConversionPolling::from_continuation_token(token)?;
    OperationPoller::resume(client.clone(), strategy).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ConversionInputSettings, ConversionOutputSettings};
    use crate::test_utils::{setup_mock_client, TEST_ACCOUNT};
    use azure_remote_rendering_core::error::RemoteRenderingError;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_settings() -> ConversionSettings {
        ConversionSettings {
            input_location: ConversionInputSettings {
                storage_container_uri: "https://storage/input".into(),
                storage_container_read_list_sas: None,
                blob_prefix: None,
                relative_input_asset_path: "model.fbx".into(),
            },
            output_location: ConversionOutputSettings {
                storage_container_uri: "https://storage/output".into(),
                storage_container_write_sas: None,
                blob_prefix: None,
                output_asset_filename: Some("model.arrAsset".into()),
            },
        }
    }

    fn fast_options() -> PollingOptions {
        PollingOptions {
            interval: Duration::from_millis(5),
            ..PollingOptions::default()
        }
    }

    #[tokio::test]
    async fn begin_conversion_sends_wrapped_settings() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/accounts/acc-1/conversions/conv-1"))
            .and(header("Authorization", "Bearer test-account-key"))
            .and(body_json(serde_json::json!({
                "settings": {
                    "inputLocation": {
                        "storageContainerUri": "https://storage/input",
                        "relativeInputAssetPath": "model.fbx"
                    },
                    "outputLocation": {
                        "storageContainerUri": "https://storage/output",
                        "outputAssetFilename": "model.arrAsset"
                    }
                }
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "id": "conv-1",
                "status": "notStarted"
            })))
            .mount(&server)
            .await;

        let client = setup_mock_client(&server).await;
        let poller = begin_conversion(&client, TEST_ACCOUNT, "conv-1", test_settings())
            .await
            .expect("should create");

        assert_eq!(poller.status(), Some(ConversionStatus::NotStarted));
        assert!(!poller.finished());
        assert!(poller.resource().is_none());
    }

    #[tokio::test]
    async fn conversion_polls_to_succeeded() {
        let server = MockServer::start().await;
        let probes = Arc::new(AtomicU32::new(0));

        Mock::given(method("PUT"))
            .and(path("/accounts/acc-1/conversions/conv-1"))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "id": "conv-1",
                "status": "running"
            })))
            .mount(&server)
            .await;

        let counter = probes.clone();
        Mock::given(method("GET"))
            .and(path("/accounts/acc-1/conversions/conv-1"))
            .respond_with(move |_req: &wiremock::Request| {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                if n == 0 {
                    ResponseTemplate::new(200).set_body_json(serde_json::json!({
                        "id": "conv-1",
                        "status": "running"
                    }))
                } else {
                    ResponseTemplate::new(200).set_body_json(serde_json::json!({
                        "id": "conv-1",
                        "status": "succeeded",
                        "output": { "outputAssetUri": "https://storage/output/model.arrAsset" }
                    }))
                }
            })
            .mount(&server)
            .await;

        let client = setup_mock_client(&server).await;
        let poller = begin_conversion_with_options(
            &client,
            TEST_ACCOUNT,
            "conv-1",
            test_settings(),
            fast_options(),
        )
        .await
        .expect("should create");

        let conversion = poller.wait().await.expect("should finish");

        assert_eq!(conversion.status, Some(ConversionStatus::Succeeded));
        assert_eq!(
            conversion.output.unwrap().output_asset_uri.as_deref(),
            Some("https://storage/output/model.arrAsset")
        );
        assert_eq!(probes.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failed_is_terminal_too() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/accounts/acc-1/conversions/conv-bad"))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "id": "conv-bad",
                "status": "running"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/accounts/acc-1/conversions/conv-bad"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "conv-bad",
                "status": "failed",
                "error": { "code": "InvalidInput", "message": "unsupported format" }
            })))
            .mount(&server)
            .await;

        let client = setup_mock_client(&server).await;
        let poller = begin_conversion_with_options(
            &client,
            TEST_ACCOUNT,
            "conv-bad",
            test_settings(),
            fast_options(),
        )
        .await
        .expect("should create");

        let conversion = poller.wait().await.expect("terminal, not an error");
        assert_eq!(conversion.status, Some(ConversionStatus::Failed));
        assert_eq!(conversion.error.unwrap().code, "InvalidInput");
    }

    #[tokio::test]
    async fn conflicting_conversion_id_maps_to_conflict() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/accounts/acc-1/conversions/conv-1"))
            .respond_with(ResponseTemplate::new(409).set_body_string("id already in use"))
            .mount(&server)
            .await;

        let client = setup_mock_client(&server).await;
        let err = begin_conversion(&client, TEST_ACCOUNT, "conv-1", test_settings())
            .await
            .unwrap_err();

        assert!(matches!(err, RemoteRenderingError::Conflict(_)));
    }

    #[tokio::test]
    async fn get_conversion_returns_current_state() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/accounts/acc-1/conversions/conv-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "conv-1",
                "status": "running"
            })))
            .mount(&server)
            .await;

        let client = setup_mock_client(&server).await;
        let conversion = get_conversion(&client, TEST_ACCOUNT, "conv-1")
            .await
            .expect("should get");

        assert_eq!(conversion.id, "conv-1");
        assert_eq!(conversion.status, Some(ConversionStatus::Running));
    }

    #[tokio::test]
    async fn list_conversions_pages_through_next_links() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/accounts/acc-1/conversions"))
            .respond_with(move |req: &wiremock::Request| {
                if req.url.query().is_some_and(|q| q.contains("skipToken")) {
                    ResponseTemplate::new(200).set_body_json(serde_json::json!({
                        "conversions": [{"id": "conv-3", "status": "running"}],
                        "nextLink": null
                    }))
                } else {
                    ResponseTemplate::new(200).set_body_json(serde_json::json!({
                        "conversions": [
                            {"id": "conv-1", "status": "succeeded"},
                            {"id": "conv-2", "status": "failed"}
                        ],
                        "nextLink": "/accounts/acc-1/conversions?skipToken=abc"
                    }))
                }
            })
            .mount(&server)
            .await;

        let client = setup_mock_client(&server).await;
        let mut pager = list_conversions(&client, TEST_ACCOUNT).expect("should build pager");

        let mut ids = Vec::new();
        while let Some(conversion) = pager.next_item().await.expect("should page") {
            ids.push(conversion.id);
        }

        assert_eq!(ids, vec!["conv-1", "conv-2", "conv-3"]);
        assert!(pager.finished());
    }

    #[tokio::test]
    async fn continuation_token_roundtrips_through_resume() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/accounts/acc-1/conversions/conv-1"))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "id": "conv-1",
                "status": "running"
            })))
            .mount(&server)
            .await;
        // The resumed poller must probe exactly this path.
        Mock::given(method("GET"))
            .and(path("/accounts/acc-1/conversions/conv-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "conv-1",
                "status": "succeeded"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = setup_mock_client(&server).await;
        let poller = begin_conversion(&client, TEST_ACCOUNT, "conv-1", test_settings())
            .await
            .expect("should create");
        let token = poller.continuation_token();
        drop(poller);

        let resumed = resume_conversion_polling(&client, &token)
            .await
            .expect("should resume");

        assert!(resumed.finished());
        assert_eq!(
            resumed.resource().unwrap().status,
            Some(ConversionStatus::Succeeded)
        );
    }

    #[tokio::test]
    async fn resume_rejects_foreign_token_versions() {
        let server = MockServer::start().await;
        let client = setup_mock_client(&server).await;

        // "2:acc-1:conv-1" base64-encoded.
        let foreign = "MjphY2MtMTpjb252LTE=";
        let err = resume_conversion_polling(&client, foreign).await.unwrap_err();

        assert!(matches!(err, RemoteRenderingError::Compatibility(_)));
    }
}
