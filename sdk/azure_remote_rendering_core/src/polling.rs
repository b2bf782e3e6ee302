//! The long-running-operation polling engine.
//!
//! Operations like asset conversion or session startup return immediately
//! with a resource snapshot whose `status` field advances server-side.
//! [`OperationPoller`] drives repeated status probes through a
//! [`PollStrategy`] until the strategy's terminal-status predicate holds,
//! sleeping a fixed interval between probes.
//!
//! A poller can be suspended and resumed across processes through an opaque
//! continuation token carrying only the `(account_id, resource_id)` pair;
//! resuming re-fetches fresh resource state rather than trusting serialized
//! snapshots (see [`crate::continuation`]).
//!
//! Probes are strictly sequential; the interval is a delay between probes,
//! not a deadline, so probe timing drifts by the cost of each probe call.
//! Dropping the future returned by [`OperationPoller::run`] cancels the
//! loop at either suspension point. By default the loop has no bound — a
//! resource stuck in a non-terminal status is polled indefinitely, matching
//! the service contract — but [`PollingOptions::deadline`] and
//! [`PollingOptions::max_probes`] can bound it.

use std::time::Duration;

use async_trait::async_trait;

use crate::client::RemoteRenderingClient;
use crate::continuation::ContinuationToken;
use crate::error::{RemoteRenderingError, Result};

/// The protocol-specific half of a poller: how to probe one resource kind
/// and when to stop.
///
/// A strategy instance is bound to exactly one operation; it carries the
/// identifiers its probe is issued against.
#[async_trait]
pub trait PollStrategy: Send + Sync {
    /// The resource snapshot type this strategy observes.
    type Output: Send;

    /// The status value carried by the snapshot.
    type Status: PartialEq + std::fmt::Debug + Send + Sync;

    /// Fetch a fresh snapshot of the operation's resource.
    async fn query_status(&self, client: &RemoteRenderingClient) -> Result<Self::Output>;

    /// Read the status field from a snapshot. `None` while the service has
    /// not yet assigned a status.
    fn status(&self, resource: &Self::Output) -> Option<Self::Status>;

    /// Whether a status value is terminal for this resource kind.
    ///
    /// Terminal means the poller's job is done, not that the resource
    /// stopped existing: a session in `Ready` keeps running afterwards.
    fn is_terminated(&self, status: &Self::Status) -> bool;

    /// The identifier pair a resumed poller would probe.
    fn continuation_token(&self) -> ContinuationToken;
}

/// Tuning knobs for the polling drive loop.
#[derive(Debug, Clone)]
pub struct PollingOptions {
    /// Fixed delay between consecutive probes.
    pub interval: Duration,

    /// Give up with [`RemoteRenderingError::PollingTimeout`] when a single
    /// `run()` call exceeds this duration. `None` keeps the base
    /// unbounded behavior.
    pub deadline: Option<Duration>,

    /// Give up with [`RemoteRenderingError::PollingTimeout`] after this
    /// many probes in total. `None` keeps the base unbounded behavior.
    pub max_probes: Option<u32>,
}

impl Default for PollingOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            deadline: None,
            max_probes: None,
        }
    }
}

/// Observable lifecycle of a poller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerState {
    /// Holding the initial snapshot; no probe issued yet.
    Initialized,
    /// At least one probe issued; latest status is not terminal.
    Polling,
    /// The latest snapshot's status satisfies the terminal predicate.
    Terminal,
}

/// Drives status probes for one long-running operation until its resource
/// reaches a terminal status.
///
/// The poller owns its strategy and the latest snapshot exclusively; the
/// client is shared read-only with any number of sibling engines.
///
/// # Examples
///
/// ```rust,ignore
/// let mut poller = begin_conversion(&client, "acc-1", "conv-1", settings).await?;
/// let token = poller.continuation_token();
/// let conversion = poller.wait().await?;
/// ```
pub struct OperationPoller<S: PollStrategy> {
    client: RemoteRenderingClient,
    strategy: S,
    snapshot: S::Output,
    options: PollingOptions,
    probes: u32,
}

impl<S: PollStrategy> std::fmt::Debug for OperationPoller<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationPoller")
            .field("probes", &self.probes)
            .finish_non_exhaustive()
    }
}

impl<S: PollStrategy> OperationPoller<S> {
    /// Create a poller from the creation call's immediate response.
    pub fn new(client: RemoteRenderingClient, strategy: S, initial_response: S::Output) -> Self {
        Self::with_options(client, strategy, initial_response, PollingOptions::default())
    }

    /// Create a poller with explicit polling options.
    pub fn with_options(
        client: RemoteRenderingClient,
        strategy: S,
        initial_response: S::Output,
        options: PollingOptions,
    ) -> Self {
        Self {
            client,
            strategy,
            snapshot: initial_response,
            options,
            probes: 0,
        }
    }

    /// Rebuild a poller from a resumed strategy by fetching one fresh
    /// snapshot of its resource.
    pub async fn resume(client: RemoteRenderingClient, strategy: S) -> Result<Self> {
        Self::resume_with_options(client, strategy, PollingOptions::default()).await
    }

    /// Rebuild a poller with explicit polling options.
    pub async fn resume_with_options(
        client: RemoteRenderingClient,
        strategy: S,
        options: PollingOptions,
    ) -> Result<Self> {
        let snapshot = strategy.query_status(&client).await?;
        Ok(Self {
            client,
            strategy,
            snapshot,
            options,
            probes: 0,
        })
    }

    /// The latest observed status, if the service has assigned one.
    pub fn status(&self) -> Option<S::Status> {
        self.strategy.status(&self.snapshot)
    }

    /// Whether the latest snapshot's status is terminal.
    ///
    /// `false` while the status field is still absent.
    pub fn finished(&self) -> bool {
        match self.strategy.status(&self.snapshot) {
            None => false,
            Some(status) => self.strategy.is_terminated(&status),
        }
    }

    /// Where the poller stands in its lifecycle.
    pub fn state(&self) -> PollerState {
        if self.finished() {
            PollerState::Terminal
        } else if self.probes == 0 {
            PollerState::Initialized
        } else {
            PollerState::Polling
        }
    }

    /// The terminal snapshot, once polling has finished.
    ///
    /// Returns `None` until then, so callers cannot observe a non-terminal
    /// resource as if it were final.
    pub fn resource(&self) -> Option<&S::Output> {
        if self.finished() {
            Some(&self.snapshot)
        } else {
            None
        }
    }

    /// Number of status probes issued so far (the initial snapshot does
    /// not count).
    pub fn probes(&self) -> u32 {
        self.probes
    }

    /// An opaque token from which polling can be resumed in another
    /// process, without replaying the original creation request.
    pub fn continuation_token(&self) -> String {
        self.strategy.continuation_token().encode()
    }

    /// Issue a single status probe and refresh the snapshot.
    ///
    /// Returns whether the operation is now finished. Does nothing once
    /// the poller is terminal.
    pub async fn poll_once(&mut self) -> Result<bool> {
        if self.finished() {
            return Ok(true);
        }
        self.snapshot = self.strategy.query_status(&self.client).await?;
        self.probes += 1;
        tracing::trace!(
            probes = self.probes,
            status = ?self.strategy.status(&self.snapshot),
            "status probe completed"
        );
        Ok(self.finished())
    }

    /// Drive the poll loop until the resource reaches a terminal status.
    ///
    /// Safe to call repeatedly: each call continues from the latest
    /// snapshot, and a call on an already-terminal poller returns
    /// immediately without issuing any probe.
    ///
    /// # Errors
    ///
    /// Propagates probe failures unchanged, and returns
    /// [`RemoteRenderingError::PollingTimeout`] when a configured deadline
    /// or probe budget runs out first.
    pub async fn run(&mut self) -> Result<()> {
        let started = tokio::time::Instant::now();

        while !self.finished() {
            if let Some(deadline) = self.options.deadline {
                if started.elapsed() >= deadline {
                    return Err(RemoteRenderingError::PollingTimeout {
                        probes: self.probes,
                    });
                }
            }
            if let Some(max_probes) = self.options.max_probes {
                if self.probes >= max_probes {
                    return Err(RemoteRenderingError::PollingTimeout {
                        probes: self.probes,
                    });
                }
            }

            self.poll_once().await?;
            if !self.finished() {
                tokio::time::sleep(self.options.interval).await;
            }
        }

        tracing::debug!(
            probes = self.probes,
            status = ?self.strategy.status(&self.snapshot),
            "operation reached terminal status"
        );
        Ok(())
    }

    /// Run to completion and return the terminal resource snapshot.
    pub async fn wait(mut self) -> Result<S::Output> {
        self.run().await?;
        Ok(self.snapshot)
    }
}
