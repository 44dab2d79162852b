//! WebSocket transport to the relay and reconnect backoff

use std::time::Duration;

use rand::Rng;
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::info;

/// Connected relay stream
pub type RelayStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Transport errors
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Failed to connect to {url}: {source}")]
    Connect {
        url: String,
        #[source]
        source: tokio_tungstenite::tungstenite::Error,
    },

    #[error("WebSocket error: {0}")]
    Socket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("Gave up after {0} consecutive failed connection attempts")]
    RetriesExhausted(u32),
}

/// Open a websocket to the relay
pub async fn connect(url: &str) -> Result<RelayStream, TransportError> {
    let (stream, response) = connect_async(url)
        .await
        .map_err(|source| TransportError::Connect {
            url: url.to_string(),
            source,
        })?;

    info!(url = %url, status = %response.status(), "Connected to relay");
    Ok(stream)
}

/// Reconnect policy settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    /// Consecutive failures tolerated before giving up; 0 means retry forever
    pub max_attempts: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
            max_attempts: 0,
        }
    }
}

/// Maximum fraction of random jitter added to each delay
const JITTER_FRACTION: f64 = 0.2;

/// Exponential backoff state for reconnecting
#[derive(Debug, Clone)]
pub struct Backoff {
    policy: ReconnectPolicy,
    failures: u32,
}

impl Backoff {
    pub fn new(policy: ReconnectPolicy) -> Self {
        Self { policy, failures: 0 }
    }

    /// Consecutive failures so far
    pub fn failures(&self) -> u32 {
        self.failures
    }

    /// Forget past failures after a successful connection
    pub fn reset(&mut self) {
        self.failures = 0;
    }

    /// Base delay (without jitter) for the current failure count
    pub fn base_delay(&self) -> Duration {
        let exponent = self.failures.saturating_sub(1).min(31);
        self.policy
            .initial_delay
            .saturating_mul(1u32 << exponent)
            .min(self.policy.max_delay)
    }

    /// Record a failure and return how long to wait before the next attempt,
    /// or an error once the attempt budget is spent
    pub fn next_delay(&mut self) -> Result<Duration, TransportError> {
        self.failures = self.failures.saturating_add(1);

        if self.policy.max_attempts != 0 && self.failures > self.policy.max_attempts {
            return Err(TransportError::RetriesExhausted(self.policy.max_attempts));
        }

        let base = self.base_delay();
        let jitter = rand::thread_rng().gen_range(0.0..=JITTER_FRACTION);
        Ok(base.mul_f64(1.0 + jitter))
    }
}
