//! HTTP client for the Azure Remote Rendering service.
//!
//! This module provides [`RemoteRenderingClient`], the execution context
//! shared by every pager and poller. The client handles authentication
//! headers, endpoint management, and the single-attempt transport exchange.
//!
//! The client deliberately performs **no** internal retries and **no**
//! status-code checking: [`RemoteRenderingClient::execute`] returns whatever
//! status the service produced, and the calling engine classifies
//! non-success codes through the shared error map before any body
//! deserialization happens. Retry policy, if desired, belongs to a wrapper
//! around the transport, not inside it.
//!
//! # Examples
//!
//! ```rust,no_run
//! use azure_remote_rendering_core::client::RemoteRenderingClient;
//! use azure_remote_rendering_core::auth::RemoteRenderingCredential;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = RemoteRenderingClient::builder()
//!     .endpoint("https://remoterendering.eastus2.mixedreality.azure.com")
//!     .credential(RemoteRenderingCredential::account_key("your-key"))
//!     .build()?;
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use reqwest::Client as HttpClient;
use reqwest::Method;
use serde::de::DeserializeOwned;
use url::Url;

use crate::auth::RemoteRenderingCredential;
use crate::error::{RemoteRenderingError, Result};

/// Default API version for the Remote Rendering REST API.
pub const DEFAULT_API_VERSION: &str = "2021-01-01";

/// Default connection timeout (10 seconds).
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default read/response timeout (60 seconds).
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(60);

/// A prepared HTTP request.
///
/// Paging strategies hold on to these: the basic strategy produces the next
/// page by rewriting the URL of the previous request while keeping its
/// method and body.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    pub body: Option<serde_json::Value>,
}

impl HttpRequest {
    /// Prepare a GET request.
    pub fn get(url: Url) -> Self {
        Self {
            method: Method::GET,
            url,
            body: None,
        }
    }

    /// Prepare a PUT request with a JSON body.
    pub fn put(url: Url, body: serde_json::Value) -> Self {
        Self {
            method: Method::PUT,
            url,
            body: Some(body),
        }
    }

    /// Prepare a PATCH request with a JSON body.
    pub fn patch(url: Url, body: serde_json::Value) -> Self {
        Self {
            method: Method::PATCH,
            url,
            body: Some(body),
        }
    }

    /// Prepare a POST request without a body.
    pub fn post(url: Url) -> Self {
        Self {
            method: Method::POST,
            url,
            body: None,
        }
    }

    /// Return a copy of this request pointed at a different URL, keeping
    /// method and body.
    pub fn with_url(&self, url: Url) -> Self {
        Self {
            method: self.method.clone(),
            url,
            body: self.body.clone(),
        }
    }
}

/// An HTTP response as observed by the engines: a status code and an
/// unparsed body.
#[derive(Debug, Clone)]
pub struct RawResponse {
    status_code: u16,
    body: Vec<u8>,
}

impl RawResponse {
    /// Construct a response from its parts.
    pub fn new(status_code: u16, body: Vec<u8>) -> Self {
        Self { status_code, body }
    }

    /// The HTTP status code.
    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    /// Whether the status code is in the success range `[200, 300)`.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    /// The raw body bytes.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// The body as lossy UTF-8 text, for error reporting.
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Deserialize the body as a JSON value.
    pub fn json_value(&self) -> Result<serde_json::Value> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Deserialize the body into a typed object.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

/// The execution context for Remote Rendering API calls.
///
/// The client is cheaply cloneable and can be shared read-only across many
/// concurrent pagers and pollers; each engine owns its own mutable state.
#[derive(Debug, Clone)]
pub struct RemoteRenderingClient {
    http: HttpClient,
    endpoint: Url,
    credential: RemoteRenderingCredential,
    api_version: String,
}

/// Builder for constructing a [`RemoteRenderingClient`].
///
/// Use [`RemoteRenderingClient::builder()`] to create a new builder.
#[derive(Debug, Default)]
pub struct RemoteRenderingClientBuilder {
    endpoint: Option<String>,
    credential: Option<RemoteRenderingCredential>,
    api_version: Option<String>,
    http_client: Option<HttpClient>,
    connect_timeout: Option<Duration>,
    read_timeout: Option<Duration>,
}

impl RemoteRenderingClient {
    /// Create a new builder for configuring a `RemoteRenderingClient`.
    pub fn builder() -> RemoteRenderingClientBuilder {
        RemoteRenderingClientBuilder::default()
    }

    /// Get the base endpoint URL.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Get the API version being used.
    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    /// Build a full URL for an API path.
    ///
    /// # Errors
    ///
    /// Returns an error if the path cannot be joined to the endpoint URL.
    pub fn url(&self, path: &str) -> Result<Url> {
        self.endpoint.join(path).map_err(|e| {
            RemoteRenderingError::InvalidEndpoint(format!("failed to construct URL: {e}"))
        })
    }

    /// Execute a prepared request and return the raw response.
    ///
    /// Exactly one attempt is made. Authentication and API version headers
    /// are added automatically. Any status code is returned as `Ok`; it is
    /// the caller's job to classify non-success codes (see
    /// [`crate::error::map_error`]).
    ///
    /// # Errors
    ///
    /// Returns an error only when the exchange itself fails at the
    /// transport level (connection, timeout, body read).
    pub async fn execute(&self, request: &HttpRequest) -> Result<RawResponse> {
        let auth = self.credential.resolve();

        let mut builder = self
            .http
            .request(request.method.clone(), request.url.clone())
            .header("Authorization", &auth)
            .header("api-version", &self.api_version);

        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status_code = response.status().as_u16();
        let body = response.bytes().await?.to_vec();

        tracing::trace!(
            method = %request.method,
            url = %request.url,
            status = status_code,
            "request executed"
        );

        Ok(RawResponse::new(status_code, body))
    }

    /// Execute a prepared request and classify any non-success status
    /// through the shared error map (caller overrides win over the default
    /// 401/404/409 table).
    ///
    /// The failed body is carried as raw text in the error; it is never
    /// deserialized. Both the paging and polling engines go through this
    /// path.
    pub async fn execute_checked(
        &self,
        request: &HttpRequest,
        error_map: &std::collections::HashMap<u16, crate::error::ErrorKind>,
    ) -> Result<RawResponse> {
        let response = self.execute(request).await?;
        if !response.is_success() {
            return Err(crate::error::map_error(
                response.status_code(),
                &response.body_text(),
                error_map,
            ));
        }
        Ok(response)
    }
}

impl RemoteRenderingClientBuilder {
    /// Set the Remote Rendering service endpoint URL.
    ///
    /// This determines the region requests are routed to, for example
    /// `https://remoterendering.eastus2.mixedreality.azure.com`.
    ///
    /// If not set, the builder will check the
    /// `AZURE_REMOTE_RENDERING_ENDPOINT` environment variable.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the credential to use for authentication.
    ///
    /// If not set, the builder will use
    /// [`RemoteRenderingCredential::from_env()`].
    pub fn credential(mut self, credential: RemoteRenderingCredential) -> Self {
        self.credential = Some(credential);
        self
    }

    /// Set the API version.
    ///
    /// Defaults to [`DEFAULT_API_VERSION`].
    pub fn api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = Some(version.into());
        self
    }

    /// Set a custom HTTP client.
    ///
    /// **Note:** If you provide a custom HTTP client, any timeout
    /// configuration via [`connect_timeout`](Self::connect_timeout) or
    /// [`read_timeout`](Self::read_timeout) will be ignored.
    pub fn http_client(mut self, client: HttpClient) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Set the connection timeout.
    ///
    /// This is the maximum time allowed for establishing a connection to
    /// the server.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Set the read timeout.
    ///
    /// This is the maximum time allowed for receiving a response from the
    /// server, covering the entire request/response cycle.
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }

    /// Build the `RemoteRenderingClient`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No endpoint is provided and `AZURE_REMOTE_RENDERING_ENDPOINT` is not set
    /// - The endpoint URL is invalid
    /// - No credential is provided and the environment holds none
    pub fn build(self) -> Result<RemoteRenderingClient> {
        let http = self.http_client.unwrap_or_else(|| {
            let connect_timeout = self.connect_timeout.unwrap_or(DEFAULT_CONNECT_TIMEOUT);
            let read_timeout = self.read_timeout.unwrap_or(DEFAULT_READ_TIMEOUT);

            reqwest::Client::builder()
                .connect_timeout(connect_timeout)
                .timeout(read_timeout)
                .build()
                .expect("failed to build HTTP client")
        });

        let endpoint_str = self
            .endpoint
            .or_else(|| std::env::var("AZURE_REMOTE_RENDERING_ENDPOINT").ok())
            .ok_or_else(|| {
                RemoteRenderingError::MissingConfig(
                    "endpoint is required. Set it via builder or AZURE_REMOTE_RENDERING_ENDPOINT \
                     env var."
                        .into(),
                )
            })?;

        let endpoint = Url::parse(&endpoint_str).map_err(|e| {
            RemoteRenderingError::InvalidEndpoint(format!("invalid endpoint URL: {e}"))
        })?;

        let credential = self
            .credential
            .map(Ok)
            .unwrap_or_else(RemoteRenderingCredential::from_env)?;

        Ok(RemoteRenderingClient {
            http,
            endpoint,
            credential,
            api_version: self
                .api_version
                .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
        })
    }
}
