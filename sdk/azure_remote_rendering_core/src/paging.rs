//! The pagination engine.
//!
//! List operations against the service return pages: a body with an item
//! array under a configurable field name (default `"value"`) and an optional
//! next-link field pointing at the rest of the sequence. [`Pager`] drives
//! repeated page fetches through a [`PageFetchStrategy`] until the server
//! signals the end, yielding one continuous logical sequence of items.
//!
//! Three strategies cover the request-shaping patterns the service uses:
//!
//! - [`BasicPaging`]: the continuation token *is* the next URL; the next
//!   request is the previous one with its URL rewritten.
//! - [`NextOperationPaging`]: a caller-supplied closure prepares the next
//!   request, and declares up front whether it consumes the token.
//! - [`InitialResponsePaging`]: the first page was already fetched (for
//!   example by the operation that started a long-running job); only
//!   subsequent pages hit the wire.
//!
//! A strategy instance is bound to exactly one pagination run. Page fetches
//! are strictly sequential per pager; exhausting a pager requires building a
//! new one, optionally seeded from a saved continuation token.
//!
//! # Examples
//!
//! ```rust,no_run
//! use azure_remote_rendering_core::client::{HttpRequest, RemoteRenderingClient};
//! use azure_remote_rendering_core::paging::{BasicPaging, PageSettings, Pager};
//!
//! # async fn example(client: RemoteRenderingClient) -> azure_remote_rendering_core::error::Result<()> {
//! let initial = HttpRequest::get(client.url("/accounts/acc-1/conversions")?);
//! let settings = PageSettings::new()
//!     .item_name("conversions")
//!     .next_link_name("nextLink");
//!
//! let mut pager: Pager<serde_json::Value> =
//!     Pager::new(client, Box::new(BasicPaging::new(initial, settings)));
//! while let Some(conversion) = pager.next_item().await? {
//!     println!("{conversion}");
//! }
//! # Ok(())
//! # }
//! ```

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use futures::stream::Stream;
use serde::de::DeserializeOwned;

use crate::client::{HttpRequest, RawResponse, RemoteRenderingClient};
use crate::error::{ErrorKind, RemoteRenderingError, Result};

/// Callback applied to each extracted page before its items are yielded.
pub type PageTransform<T> = Box<dyn Fn(Vec<T>) -> Vec<T> + Send + Sync>;

/// Configuration shared by every paging strategy: where to find the items
/// and the next link in a page body, how to classify failing status codes,
/// and an optional per-page result transform.
pub struct PageSettings<T> {
    item_name: String,
    next_link_name: Option<String>,
    error_map: HashMap<u16, ErrorKind>,
    transform: Option<PageTransform<T>>,
}

impl<T> Default for PageSettings<T> {
    fn default() -> Self {
        Self {
            item_name: "value".to_string(),
            next_link_name: None,
            error_map: HashMap::new(),
            transform: None,
        }
    }
}

impl<T> PageSettings<T> {
    /// Settings with the default item field (`"value"`) and no next link,
    /// i.e. a single-page response.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the field name holding the page's item array.
    pub fn item_name(mut self, name: impl Into<String>) -> Self {
        self.item_name = name.into();
        self
    }

    /// Set the field name holding the continuation token. Leaving this
    /// unset declares the operation single-page.
    pub fn next_link_name(mut self, name: impl Into<String>) -> Self {
        self.next_link_name = Some(name.into());
        self
    }

    /// Override how a specific status code is classified. Overrides win
    /// over the default 401/404/409 table.
    pub fn error_override(mut self, status: u16, kind: ErrorKind) -> Self {
        self.error_map.insert(status, kind);
        self
    }

    /// Apply a transform to each page's items before they are yielded.
    pub fn transform(mut self, f: impl Fn(Vec<T>) -> Vec<T> + Send + Sync + 'static) -> Self {
        self.transform = Some(Box::new(f));
        self
    }
}

/// Execute a request and classify a non-success status through the
/// strategy's error map, without touching the body of a failed response.
async fn execute_checked<T>(
    client: &RemoteRenderingClient,
    request: &HttpRequest,
    settings: &PageSettings<T>,
) -> Result<RawResponse> {
    client.execute_checked(request, &settings.error_map).await
}

/// Resolve a continuation token into a URL: absolute next links are used
/// as-is, relative ones are joined onto the client endpoint.
fn next_link_url(client: &RemoteRenderingClient, token: &str) -> Result<url::Url> {
    match url::Url::parse(token) {
        Ok(url) => Ok(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => client.url(token),
        Err(e) => Err(RemoteRenderingError::Schema(format!(
            "continuation token is not a usable next link: {e}"
        ))),
    }
}

/// How a single pagination kind shapes its requests.
///
/// The [`Pager`] drives this: `fetch_page(client, None)` for the very first
/// page, `fetch_page(client, Some(token))` for every page after it.
/// Extraction is shared across strategies and driven by [`PageSettings`].
#[async_trait]
pub trait PageFetchStrategy<T>: Send
where
    T: DeserializeOwned + Send + 'static,
{
    /// The settings this strategy was configured with.
    fn settings(&self) -> &PageSettings<T>;

    /// Fetch one page. `token` is `None` for the first call of the run and
    /// the previously extracted continuation token afterwards.
    ///
    /// Implementations classify non-success status codes through the error
    /// map *before* anything reads the body.
    async fn fetch_page(
        &mut self,
        client: &RemoteRenderingClient,
        token: Option<&str>,
    ) -> Result<RawResponse>;

    /// Pull `(next_token, items)` out of a successful page response.
    ///
    /// # Errors
    ///
    /// Returns a schema error when the configured item field, or a
    /// configured next-link field, is missing from the body. These indicate
    /// a page-shape mismatch between client and service, not a transient
    /// fault.
    fn extract_data(&self, response: &RawResponse) -> Result<(Option<String>, Vec<T>)> {
        let settings = self.settings();
        let body = response.json_value()?;

        let items_value = body.get(&settings.item_name).ok_or_else(|| {
            RemoteRenderingError::Schema(format!(
                "the response object does not have property '{}' to extract element list from",
                settings.item_name
            ))
        })?;
        let items: Vec<T> = serde_json::from_value(items_value.clone())?;
        let items = match &settings.transform {
            Some(f) => f(items),
            None => items,
        };

        let next_token = match &settings.next_link_name {
            None => None,
            Some(name) => match body.get(name) {
                None => {
                    return Err(RemoteRenderingError::Schema(format!(
                        "the response object does not have property '{name}' to extract \
                         continuation token from"
                    )))
                }
                Some(serde_json::Value::Null) => None,
                Some(serde_json::Value::String(link)) => Some(link.clone()),
                Some(other) => {
                    return Err(RemoteRenderingError::Schema(format!(
                        "continuation token property '{name}' is not a string: {other}"
                    )))
                }
            },
        };

        Ok((next_token, items))
    }
}

// ---------------------------------------------------------------------------
// Strategy: basic (continuation token is the next link)
// ---------------------------------------------------------------------------

/// The most common paging strategy: the next page request is the previous
/// request with its URL rewritten to the continuation token, preserving
/// method and body.
pub struct BasicPaging<T> {
    settings: PageSettings<T>,
    initial_request: HttpRequest,
    last_request: Option<HttpRequest>,
}

impl<T> BasicPaging<T> {
    /// Create a strategy from the prepared initial request.
    pub fn new(initial_request: HttpRequest, settings: PageSettings<T>) -> Self {
        Self {
            settings,
            initial_request,
            last_request: None,
        }
    }
}

#[async_trait]
impl<T> PageFetchStrategy<T> for BasicPaging<T>
where
    T: DeserializeOwned + Send + 'static,
{
    fn settings(&self) -> &PageSettings<T> {
        &self.settings
    }

    async fn fetch_page(
        &mut self,
        client: &RemoteRenderingClient,
        token: Option<&str>,
    ) -> Result<RawResponse> {
        let request = match token {
            None => self.initial_request.clone(),
            Some(token) => {
                let base = self.last_request.as_ref().unwrap_or(&self.initial_request);
                base.with_url(next_link_url(client, token)?)
            }
        };
        let response = execute_checked(client, &request, &self.settings).await?;
        self.last_request = Some(request);
        Ok(response)
    }
}

// ---------------------------------------------------------------------------
// Strategy: different next operation
// ---------------------------------------------------------------------------

/// A caller-supplied closure that prepares the next page request.
///
/// Which variant the caller constructs declares, once and at configuration
/// time, whether the closure consumes the continuation token. The engine
/// never discovers this by failed invocation.
pub enum NextRequestFn {
    /// The next operation takes the continuation token.
    WithToken(Box<dyn Fn(&str) -> Result<HttpRequest> + Send>),
    /// The next operation takes no arguments.
    WithoutToken(Box<dyn Fn() -> Result<HttpRequest> + Send>),
}

impl NextRequestFn {
    /// Whether this closure consumes the continuation token.
    pub fn accepts_continuation_token(&self) -> bool {
        matches!(self, Self::WithToken(_))
    }

    fn prepare(&self, token: &str) -> Result<HttpRequest> {
        match self {
            Self::WithToken(f) => f(token),
            Self::WithoutToken(f) => f(),
        }
    }
}

/// Paging strategy for operations whose next page is fetched through a
/// different operation than the first one.
///
/// Built through [`NextOperationPaging::builder`]; building fails with a
/// configuration error when the next-request closure is absent.
pub struct NextOperationPaging<T> {
    settings: PageSettings<T>,
    initial_request: HttpRequest,
    prepare_next: NextRequestFn,
}

/// Builder for [`NextOperationPaging`].
pub struct NextOperationPagingBuilder<T> {
    settings: PageSettings<T>,
    initial_request: Option<HttpRequest>,
    prepare_next: Option<NextRequestFn>,
}

impl<T> std::fmt::Debug for NextOperationPaging<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NextOperationPaging")
            .field("initial_request", &self.initial_request)
            .field(
                "prepare_next",
                &self.prepare_next.accepts_continuation_token(),
            )
            .finish_non_exhaustive()
    }
}

impl<T> NextOperationPaging<T> {
    /// Create a new builder.
    pub fn builder() -> NextOperationPagingBuilder<T> {
        NextOperationPagingBuilder {
            settings: PageSettings::default(),
            initial_request: None,
            prepare_next: None,
        }
    }
}

impl<T> NextOperationPagingBuilder<T> {
    /// Set the prepared initial request.
    ///
    /// **Required.**
    pub fn initial_request(mut self, request: HttpRequest) -> Self {
        self.initial_request = Some(request);
        self
    }

    /// Set the closure preparing each next-page request.
    ///
    /// **Required.**
    pub fn prepare_next_request(mut self, f: NextRequestFn) -> Self {
        self.prepare_next = Some(f);
        self
    }

    /// Set the page settings.
    pub fn settings(mut self, settings: PageSettings<T>) -> Self {
        self.settings = settings;
        self
    }

    /// Build the strategy.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `initial_request` or
    /// `prepare_next_request` was not supplied.
    pub fn build(self) -> Result<NextOperationPaging<T>> {
        let initial_request = self.initial_request.ok_or_else(|| {
            RemoteRenderingError::Configuration(
                "NextOperationPaging is missing required option 'initial_request'".into(),
            )
        })?;
        let prepare_next = self.prepare_next.ok_or_else(|| {
            RemoteRenderingError::Configuration(
                "NextOperationPaging is missing required option 'prepare_next_request'".into(),
            )
        })?;
        Ok(NextOperationPaging {
            settings: self.settings,
            initial_request,
            prepare_next,
        })
    }
}

#[async_trait]
impl<T> PageFetchStrategy<T> for NextOperationPaging<T>
where
    T: DeserializeOwned + Send + 'static,
{
    fn settings(&self) -> &PageSettings<T> {
        &self.settings
    }

    async fn fetch_page(
        &mut self,
        client: &RemoteRenderingClient,
        token: Option<&str>,
    ) -> Result<RawResponse> {
        let request = match token {
            None => self.initial_request.clone(),
            Some(token) => self.prepare_next.prepare(token)?,
        };
        execute_checked(client, &request, &self.settings).await
    }
}

// ---------------------------------------------------------------------------
// Strategy: initial response already in hand
// ---------------------------------------------------------------------------

/// Paging strategy for runs whose first page was already fetched, for
/// example as the immediate response of the operation that produced the
/// sequence. The stored response is consumed exactly once; later pages go
/// through the next-operation closure.
pub struct InitialResponsePaging<T> {
    settings: PageSettings<T>,
    initial_response: Option<RawResponse>,
    prepare_next: Option<NextRequestFn>,
}

/// Builder for [`InitialResponsePaging`].
pub struct InitialResponsePagingBuilder<T> {
    settings: PageSettings<T>,
    initial_response: Option<RawResponse>,
    prepare_next: Option<NextRequestFn>,
}

impl<T> std::fmt::Debug for InitialResponsePaging<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InitialResponsePaging")
            .field("initial_response", &self.initial_response)
            .field(
                "prepare_next",
                &self
                    .prepare_next
                    .as_ref()
                    .map(NextRequestFn::accepts_continuation_token),
            )
            .finish_non_exhaustive()
    }
}

impl<T> InitialResponsePaging<T> {
    /// Create a new builder.
    pub fn builder() -> InitialResponsePagingBuilder<T> {
        InitialResponsePagingBuilder {
            settings: PageSettings::default(),
            initial_response: None,
            prepare_next: None,
        }
    }
}

impl<T> InitialResponsePagingBuilder<T> {
    /// Set the already-fetched first page.
    ///
    /// **Required.**
    pub fn initial_response(mut self, response: RawResponse) -> Self {
        self.initial_response = Some(response);
        self
    }

    /// Set the closure preparing each next-page request. Only needed when
    /// the operation can return more than one page.
    pub fn prepare_next_request(mut self, f: NextRequestFn) -> Self {
        self.prepare_next = Some(f);
        self
    }

    /// Set the page settings.
    pub fn settings(mut self, settings: PageSettings<T>) -> Self {
        self.settings = settings;
        self
    }

    /// Build the strategy.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `initial_response` was not supplied.
    pub fn build(self) -> Result<InitialResponsePaging<T>> {
        let initial_response = self.initial_response.ok_or_else(|| {
            RemoteRenderingError::Configuration(
                "InitialResponsePaging is missing required option 'initial_response'".into(),
            )
        })?;
        Ok(InitialResponsePaging {
            settings: self.settings,
            initial_response: Some(initial_response),
            prepare_next: self.prepare_next,
        })
    }
}

#[async_trait]
impl<T> PageFetchStrategy<T> for InitialResponsePaging<T>
where
    T: DeserializeOwned + Send + 'static,
{
    fn settings(&self) -> &PageSettings<T> {
        &self.settings
    }

    async fn fetch_page(
        &mut self,
        client: &RemoteRenderingClient,
        token: Option<&str>,
    ) -> Result<RawResponse> {
        match token {
            None => self.initial_response.take().ok_or_else(|| {
                RemoteRenderingError::Configuration(
                    "initial response was already consumed; a strategy is bound to one run".into(),
                )
            }),
            Some(token) => {
                let prepare = self.prepare_next.as_ref().ok_or_else(|| {
                    RemoteRenderingError::Configuration(
                        "InitialResponsePaging received a continuation token but has no \
                         'prepare_next_request' option"
                            .into(),
                    )
                })?;
                execute_checked(client, &prepare.prepare(token)?, &self.settings).await
            }
        }
    }
}

// ---------------------------------------------------------------------------
// The pager
// ---------------------------------------------------------------------------

/// Where a pagination run currently stands.
#[derive(Debug, Clone, PartialEq, Eq)]
enum PagerState {
    /// No fetch has happened yet.
    NotStarted,
    /// At least one page was extracted; `token` drives the next fetch.
    Running { token: Option<String> },
    /// A page without a continuation token was extracted; no further
    /// fetch will be issued.
    Done,
}

/// A lazy, forward-only, single-pass sequence of items spanning every page
/// of a list operation.
///
/// The pager owns its strategy and a buffer of extracted-but-not-yet-yielded
/// items, and refills the buffer by fetching the next page whenever it runs
/// dry. It is not restartable: construct a new pager (optionally seeded from
/// [`Pager::continuation_token`]) to iterate again.
pub struct Pager<T>
where
    T: DeserializeOwned + Send + 'static,
{
    client: RemoteRenderingClient,
    strategy: Box<dyn PageFetchStrategy<T>>,
    state: PagerState,
    buffer: VecDeque<T>,
}

impl<T> Pager<T>
where
    T: DeserializeOwned + Send + 'static,
{
    /// Create a pager that starts from the strategy's initial request.
    pub fn new(client: RemoteRenderingClient, strategy: Box<dyn PageFetchStrategy<T>>) -> Self {
        Self {
            client,
            strategy,
            state: PagerState::NotStarted,
            buffer: VecDeque::new(),
        }
    }

    /// Create a pager resuming mid-sequence from a saved continuation
    /// token. The first fetch goes through the strategy's next-request
    /// path, not the initial request.
    pub fn resume(
        client: RemoteRenderingClient,
        strategy: Box<dyn PageFetchStrategy<T>>,
        continuation_token: impl Into<String>,
    ) -> Self {
        Self {
            client,
            strategy,
            state: PagerState::Running {
                token: Some(continuation_token.into()),
            },
            buffer: VecDeque::new(),
        }
    }

    /// Whether the server has signalled the end of the sequence.
    ///
    /// This is `false` before the first fetch: a pager that has not been
    /// driven yet cannot know the sequence is empty.
    pub fn finished(&self) -> bool {
        self.state == PagerState::Done
    }

    /// The token that would resume the sequence after the last extracted
    /// page, if the sequence is still open.
    pub fn continuation_token(&self) -> Option<&str> {
        match &self.state {
            PagerState::Running { token } => token.as_deref(),
            _ => None,
        }
    }

    /// Fetch and extract the next page, advancing the pager state.
    ///
    /// Returns `None` without issuing a request once the sequence is done.
    pub async fn next_page(&mut self) -> Result<Option<Vec<T>>> {
        let token = match &self.state {
            PagerState::Done => return Ok(None),
            PagerState::NotStarted => None,
            PagerState::Running { token } => match token {
                Some(token) => Some(token.clone()),
                // An open run without a token only happens transiently; the
                // state machine moves to Done before this is observable.
                None => return Ok(None),
            },
        };

        let response = self
            .strategy
            .fetch_page(&self.client, token.as_deref())
            .await?;
        let (next_token, items) = self.strategy.extract_data(&response)?;

        tracing::debug!(
            items = items.len(),
            has_next = next_token.is_some(),
            "page extracted"
        );

        self.state = match next_token {
            Some(token) => PagerState::Running { token: Some(token) },
            None => PagerState::Done,
        };

        Ok(Some(items))
    }

    /// Yield the next item, fetching pages as needed.
    ///
    /// Returns `None` once every page has been drained. Empty pages in the
    /// middle of a sequence are skipped transparently.
    pub async fn next_item(&mut self) -> Result<Option<T>> {
        loop {
            if let Some(item) = self.buffer.pop_front() {
                return Ok(Some(item));
            }
            match self.next_page().await? {
                Some(items) => self.buffer.extend(items),
                None => return Ok(None),
            }
        }
    }

    /// Adapt the pager into a `Stream` of items.
    pub fn into_stream(self) -> impl Stream<Item = Result<T>> + Send {
        futures::stream::try_unfold(self, |mut pager| async move {
            match pager.next_item().await? {
                Some(item) => Ok(Some((item, pager))),
                None => Ok(None),
            }
        })
    }
}
