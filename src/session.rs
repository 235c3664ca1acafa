// Copyright 2026 Fundlens Contributors
// SPDX-License-Identifier: Apache-2.0

//! Remote browser session over CDP.
//!
//! Owns the single connection to the remote browser-automation endpoint
//! (a WebSocket CDP URL, e.g. a browserless instance). No other component
//! touches the connection handle directly; fetchers borrow it through
//! [`RemoteSession::browser`] for the duration of one attempt.

use anyhow::{Context, Result};
use chromiumoxide::browser::Browser;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Error-message fragments that indicate the CDP connection (or the tab
/// it was serving) is gone and a reconnect is needed. Matching is
/// case-insensitive on the full error chain.
const CONNECTION_LOSS_SIGNATURES: &[&str] = &[
    "connection closed",
    "connection reset",
    "protocol error",
    "target closed",
    "session closed",
    "browser closed",
    "websocket",
    "channel closed",
];

/// Classify an error as a connection loss.
///
/// String matching on error messages is fragile by nature, so the
/// signature table lives in one place and the classifier is independently
/// testable rather than being inlined into the retry loop.
pub fn is_connection_loss(err: &anyhow::Error) -> bool {
    let msg = format!("{err:#}").to_lowercase();
    CONNECTION_LOSS_SIGNATURES.iter().any(|sig| msg.contains(sig))
}

/// The session seam the retry/orchestration core works against.
///
/// [`RemoteSession`] is the production implementation; tests substitute
/// stubs so retry and orchestration behavior can be exercised without a
/// browser endpoint.
#[async_trait::async_trait]
pub trait Session: Send {
    /// Reconnect if the current handle is dead; no-op otherwise.
    async fn ensure_connected(&mut self) -> Result<()>;

    /// Forget the current handle without closing it, forcing the next
    /// `ensure_connected()` to reconnect.
    fn invalidate(&mut self);

    /// Release the connection. Idempotent, never errors.
    async fn disconnect(&mut self);

    /// Borrow the live browser handle. Errors if not connected.
    fn browser(&self) -> Result<&Browser>;

    /// Classify an error as a connection loss requiring reconnect.
    fn is_connection_loss(&self, err: &anyhow::Error) -> bool {
        is_connection_loss(err)
    }
}

/// The live connection to the remote browser endpoint.
///
/// At most one handle is held at a time. A new `connect()` supersedes a
/// previous handle the caller already knows is dead without closing it.
pub struct RemoteSession {
    ws_url: String,
    browser: Option<Browser>,
    handler_task: Option<JoinHandle<()>>,
}

impl RemoteSession {
    /// Create a disconnected session for the given CDP WebSocket URL.
    pub fn new(ws_url: impl Into<String>) -> Self {
        Self {
            ws_url: ws_url.into(),
            browser: None,
            handler_task: None,
        }
    }

    /// Establish a connection to the remote endpoint.
    ///
    /// Supersedes any previous handle. Fails if the endpoint is
    /// unreachable or rejects the handshake.
    pub async fn connect(&mut self) -> Result<()> {
        self.drop_handle();

        let endpoint = url::Url::parse(&self.ws_url)
            .with_context(|| format!("invalid browser endpoint URL: {}", self.ws_url))?;
        if !matches!(endpoint.scheme(), "ws" | "wss") {
            anyhow::bail!(
                "browser endpoint must be a ws:// or wss:// URL, got {}",
                self.ws_url
            );
        }

        let (browser, mut handler) = Browser::connect(&self.ws_url)
            .await
            .with_context(|| format!("failed to connect to browser endpoint {}", self.ws_url))?;

        // Drain CDP events until the connection ends; the task finishing
        // is our liveness signal.
        let task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                let _ = event;
            }
            debug!("browser event stream ended");
        });

        info!("connected to browser endpoint {}", self.ws_url);
        self.browser = Some(browser);
        self.handler_task = Some(task);
        Ok(())
    }

    /// Whether the last-known connection handle is still usable.
    ///
    /// Never errors. The handler task finishing means the remote end
    /// closed the WebSocket, even if the `Browser` handle still exists.
    pub fn is_alive(&self) -> bool {
        match (&self.browser, &self.handler_task) {
            (Some(_), Some(task)) => !task.is_finished(),
            _ => false,
        }
    }

    /// Reconnect if the current handle is dead; no-op otherwise.
    ///
    /// Called before every fetch attempt, which is what makes the system
    /// self-healing after a silent disconnect.
    pub async fn ensure_connected(&mut self) -> Result<()> {
        if self.is_alive() {
            return Ok(());
        }
        self.connect().await
    }

    /// Forget the current handle without closing it, forcing the next
    /// `ensure_connected()` to reconnect. Used after a classified
    /// connection-loss error, when the remote end is already gone.
    pub fn invalidate(&mut self) {
        if self.browser.is_some() {
            warn!("invalidating browser session after connection loss");
        }
        self.drop_handle();
    }

    /// Release the connection. Idempotent; errors from a non-responsive
    /// remote end are swallowed.
    pub async fn disconnect(&mut self) {
        if let Some(mut browser) = self.browser.take() {
            if let Err(e) = browser.close().await {
                debug!("browser close failed (ignored): {e}");
            }
        }
        if let Some(task) = self.handler_task.take() {
            task.abort();
        }
    }

    /// Borrow the live browser handle. Errors if not connected.
    pub fn browser(&self) -> Result<&Browser> {
        self.browser
            .as_ref()
            .context("browser session is not connected")
    }

    fn drop_handle(&mut self) {
        self.browser = None;
        if let Some(task) = self.handler_task.take() {
            task.abort();
        }
    }
}

#[async_trait::async_trait]
impl Session for RemoteSession {
    async fn ensure_connected(&mut self) -> Result<()> {
        RemoteSession::ensure_connected(self).await
    }

    fn invalidate(&mut self) {
        RemoteSession::invalidate(self)
    }

    async fn disconnect(&mut self) {
        RemoteSession::disconnect(self).await
    }

    fn browser(&self) -> Result<&Browser> {
        RemoteSession::browser(self)
    }
}

impl Drop for RemoteSession {
    fn drop(&mut self) {
        if let Some(task) = self.handler_task.take() {
            task.abort();
        }
    }
}
