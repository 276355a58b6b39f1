//! Intent verification handshake.
//!
//! Before a subscribe or unsubscribe takes effect the hub proves the callback
//! is controlled by the requester: it GETs the callback with a fresh challenge
//! and only a `200` echoing the challenge byte-for-byte confirms the intent.
//!
//! Per attempt: `Pending -> Confirmed | Denied | Failed`.
//! - `Confirmed`: the continuation runs (the only path that mutates the store).
//! - `Denied`: a `hub.mode=denied` notice is sent to the callback.
//! - `Failed`: no response at all; the attempt is logged and dropped.

use std::fmt;

use rand::RngCore;
use tracing::{debug, error, info, warn};

use crate::error::Result;
use crate::http::{HttpClient, SharedHttpClient};
use crate::tasks::TaskPool;

/// Intent being verified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VerifyMode {
    /// Create or renew a subscription.
    Subscribe,
    /// Remove a subscription.
    Unsubscribe,
}

impl VerifyMode {
    /// Wire value of `hub.mode`.
    pub fn as_str(&self) -> &'static str {
        match self {
            VerifyMode::Subscribe => "subscribe",
            VerifyMode::Unsubscribe => "unsubscribe",
        }
    }
}

impl fmt::Display for VerifyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal state of one verification attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationOutcome {
    /// Challenge echoed; the continuation was invoked.
    Confirmed,
    /// Wrong status or body; a denial notice was sent.
    Denied,
    /// No response was received.
    Failed,
}

/// Generate a fresh unguessable challenge token.
pub fn generate_challenge() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Runs verification handshakes against subscriber callbacks.
#[derive(Clone)]
pub struct VerificationEngine {
    http: SharedHttpClient,
    pool: TaskPool,
}

impl VerificationEngine {
    /// Create an engine issuing calls through `http` and running on `pool`.
    pub fn new(http: SharedHttpClient, pool: TaskPool) -> Self {
        Self { http, pool }
    }

    /// Schedule a verification attempt without waiting for it.
    ///
    /// `on_confirmed(callback_url, topic_url)` runs only if the subscriber
    /// echoes the challenge.
    pub fn verify<F>(&self, callback_url: String, topic_url: String, mode: VerifyMode, on_confirmed: F)
    where
        F: FnOnce(&str, &str) -> Result<()> + Send + 'static,
    {
        let engine = self.clone();
        self.pool.spawn(async move {
            engine.run(&callback_url, &topic_url, mode, on_confirmed).await;
        });
    }

    /// Perform one verification attempt and report how it ended.
    pub async fn run<F>(
        &self,
        callback_url: &str,
        topic_url: &str,
        mode: VerifyMode,
        on_confirmed: F,
    ) -> VerificationOutcome
    where
        F: FnOnce(&str, &str) -> Result<()>,
    {
        let challenge = generate_challenge();
        info!(
            callback = callback_url,
            topic = topic_url,
            mode = %mode,
            "verifying subscriber intent"
        );

        let query = [
            ("hub.mode", mode.as_str()),
            ("hub.topic", topic_url),
            ("hub.challenge", challenge.as_str()),
            ("hub.lease_seconds", "0"),
        ];
        let response = match self.http.get(callback_url, &query).await {
            Ok(response) => response,
            Err(e) => {
                warn!(
                    callback = callback_url,
                    topic = topic_url,
                    mode = %mode,
                    error = %e,
                    "verification request failed, attempt dropped"
                );
                return VerificationOutcome::Failed;
            }
        };

        if response.status == 200 && response.body.as_ref() == challenge.as_bytes() {
            info!(
                callback = callback_url,
                topic = topic_url,
                mode = %mode,
                "challenge echoed, intent verified"
            );
            if let Err(e) = on_confirmed(callback_url, topic_url) {
                error!(
                    callback = callback_url,
                    topic = topic_url,
                    mode = %mode,
                    error = %e,
                    "failed to apply verified intent"
                );
            }
            return VerificationOutcome::Confirmed;
        }

        info!(
            callback = callback_url,
            topic = topic_url,
            mode = %mode,
            status = response.status,
            "challenge not echoed, intent denied"
        );
        notify_denied(self.http.as_ref(), callback_url, topic_url).await;
        VerificationOutcome::Denied
    }
}

/// Tell the subscriber its request was denied. The outcome is not observed.
async fn notify_denied(http: &dyn HttpClient, callback_url: &str, topic_url: &str) {
    let query = [
        ("hub.mode", "denied"),
        ("hub.topic", topic_url),
        ("hub.reason", "challenge"),
    ];
    if let Err(e) = http.get(callback_url, &query).await {
        debug!(callback = callback_url, error = %e, "denial notice not delivered");
    }
}
