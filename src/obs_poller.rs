use anyhow::{Context, Result};
use serde::Deserialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;

use crate::overlay_presenter::OverlayPresenter;

/// Shown when the detection server stops answering.
const CONNECTION_ERROR_TEXT: &str = "Waiting for detection server...";

/// Consecutive failures tolerated before the overlay degrades to the
/// connection-error display.
const ERROR_THRESHOLD: u32 = 3;

/// Nested detection record, present in the richer payload shape.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DetectionRecord {
    #[serde(default)]
    pub gesture: Option<String>,
    #[serde(default)]
    pub confidence: Option<f32>,
    #[serde(default)]
    pub is_new: bool,
}

/// The `/api/current` response. The server has shipped two shapes over time
/// (flat fields and a nested `detection` object), so both are tolerated.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DetectionPayload {
    #[serde(default)]
    pub gesture: Option<String>,
    #[serde(default)]
    pub confidence: Option<f32>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub detection: Option<DetectionRecord>,
}

impl DetectionPayload {
    /// Current gesture text, favouring the nested record when present.
    pub fn text(&self) -> &str {
        self.detection
            .as_ref()
            .and_then(|d| d.gesture.as_deref())
            .or(self.gesture.as_deref())
            .unwrap_or("")
    }

    pub fn confidence_value(&self) -> f32 {
        self.detection
            .as_ref()
            .and_then(|d| d.confidence)
            .or(self.confidence)
            .unwrap_or(0.0)
    }

    /// Whether this payload carries a fresh detection. Flat payloads have no
    /// freshness marker and always count as new.
    pub fn is_new(&self) -> bool {
        self.detection.as_ref().map_or(true, |d| d.is_new)
    }
}

/// One polling round, separated from the HTTP client so the reaction logic
/// stays testable.
#[derive(Debug, Clone)]
pub enum PollOutcome {
    Payload(DetectionPayload),
    RateLimited,
    Failed(String),
}

/// Poll pacing: a nominal interval that doubles on rate limiting up to a
/// ceiling and snaps back on the first success.
#[derive(Debug, Clone)]
pub struct PollBackoff {
    nominal: Duration,
    ceiling: Duration,
    current: Duration,
}

impl PollBackoff {
    pub fn new(nominal: Duration, ceiling: Duration) -> Self {
        Self {
            nominal,
            ceiling,
            current: nominal,
        }
    }

    #[inline]
    pub fn interval(&self) -> Duration {
        self.current
    }

    pub fn on_rate_limited(&mut self) {
        self.current = (self.current * 2).min(self.ceiling);
    }

    pub fn on_success(&mut self) {
        self.current = self.nominal;
    }
}

impl Default for PollBackoff {
    fn default() -> Self {
        Self::new(Duration::from_millis(250), Duration::from_millis(2000))
    }
}

/// Drives the browser-source overlay by polling the detection server over
/// HTTP instead of receiving pushed events.
pub struct ObsOverlayPoller {
    client: reqwest::Client,
    endpoint: Url,
    presenter: OverlayPresenter,
    backoff: PollBackoff,
    consecutive_errors: u32,
    cache_token: u64,
}

impl ObsOverlayPoller {
    pub fn new(
        base_url: &str,
        presenter: OverlayPresenter,
        poll_interval: Duration,
    ) -> Result<Self> {
        let endpoint = Url::parse(base_url)
            .and_then(|u| u.join("/api/current"))
            .with_context(|| format!("Invalid detection server URL: {}", base_url))?;
        let ceiling = Duration::from_millis(2000).max(poll_interval);
        Ok(Self {
            client: reqwest::Client::new(),
            endpoint,
            presenter,
            backoff: PollBackoff::new(poll_interval, ceiling),
            consecutive_errors: 0,
            cache_token: 0,
        })
    }

    pub fn presenter(&self) -> &OverlayPresenter {
        &self.presenter
    }

    #[inline]
    pub fn interval(&self) -> Duration {
        self.backoff.interval()
    }

    /// React to one polling round.
    pub fn apply(&mut self, outcome: PollOutcome, now: Instant) {
        match outcome {
            PollOutcome::Payload(payload) => {
                self.consecutive_errors = 0;
                self.backoff.on_success();

                let text = payload.text().to_string();
                if text.is_empty() {
                    self.presenter.hide();
                } else if payload.is_new() || text != self.presenter.frame().text {
                    // A repeated detection of the same gesture must not keep
                    // restarting the auto-hide countdown.
                    self.presenter
                        .update(&text, payload.confidence_value(), None, now);
                }
            }
            PollOutcome::RateLimited => {
                // Not a failure: the server is alive, just throttling us.
                self.backoff.on_rate_limited();
            }
            PollOutcome::Failed(message) => {
                self.consecutive_errors += 1;
                if cfg!(debug_assertions) {
                    eprintln!("Detection poll failed: {}", message);
                }
                if self.consecutive_errors >= ERROR_THRESHOLD {
                    self.presenter.update(CONNECTION_ERROR_TEXT, 0.0, None, now);
                }
            }
        }
        self.presenter.tick(now);
    }

    /// One HTTP round against `/api/current`.
    async fn poll_once(&mut self) -> PollOutcome {
        self.cache_token = self.cache_token.wrapping_add(1);
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("_", &self.cache_token.to_string());

        let response = self
            .client
            .get(url)
            .header("Cache-Control", "no-cache")
            .header("Pragma", "no-cache")
            .send()
            .await;

        match response {
            Ok(response) if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS => {
                PollOutcome::RateLimited
            }
            Ok(response) if response.status().is_success() => {
                match response.json::<DetectionPayload>().await {
                    Ok(payload) => PollOutcome::Payload(payload),
                    Err(e) => PollOutcome::Failed(format!("malformed payload: {}", e)),
                }
            }
            Ok(response) => PollOutcome::Failed(format!("status {}", response.status())),
            Err(e) => PollOutcome::Failed(e.to_string()),
        }
    }

    /// Poll until `running` clears.
    pub async fn run(mut self, running: Arc<AtomicBool>) {
        println!("Polling detection server at {}", self.endpoint);
        while running.load(Ordering::SeqCst) {
            let outcome = self.poll_once().await;
            self.apply(outcome, Instant::now());
            tokio::time::sleep(self.backoff.interval()).await;
        }
    }
}
