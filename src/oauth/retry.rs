//! Bounded retry envelopes
//!
//! Two envelopes guard the login pipeline: a per-hop envelope around each
//! network call (linear backoff, capped) and a pipeline-level envelope around
//! the whole exchange (exponential backoff). Both consult the same
//! classifier; both are strictly sequential, so at most one attempt is in
//! flight at any time.

use std::future::Future;
use std::time::Duration;

use log::warn;

use crate::oauth::classifier::is_retryable;
use crate::oauth::AuthError;

/// Attempts per network hop before the hop's failure surfaces
pub const HOP_MAX_ATTEMPTS: u32 = 3;

/// Attempts for the whole exchange pipeline before redirecting with an error
pub const PIPELINE_MAX_ATTEMPTS: u32 = 3;

const HOP_BACKOFF_BASE: Duration = Duration::from_millis(1000);
const HOP_BACKOFF_CAP: Duration = Duration::from_millis(5000);
const PIPELINE_BACKOFF_BASE: Duration = Duration::from_millis(1000);

/// Backoff schedule for a retry envelope
#[derive(Debug, Clone, Copy)]
pub enum Backoff {
    /// `base × attempt`, capped
    Linear { base: Duration, cap: Duration },
    /// `base × 2^(attempt-1)`
    Exponential { base: Duration },
}

impl Backoff {
    /// Delay to sleep after the given failed attempt (1-based)
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Duration {
        match self {
            Self::Linear { base, cap } => base.saturating_mul(attempt).min(*cap),
            Self::Exponential { base } => base.saturating_mul(2_u32.saturating_pow(attempt - 1)),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Backoff,
}

impl RetryPolicy {
    /// Envelope for a single network hop: a dropped connection to the
    /// provider should not force re-deriving the whole pipeline.
    #[must_use]
    pub const fn per_hop() -> Self {
        Self {
            max_attempts: HOP_MAX_ATTEMPTS,
            backoff: Backoff::Linear {
                base: HOP_BACKOFF_BASE,
                cap: HOP_BACKOFF_CAP,
            },
        }
    }

    /// Envelope for the whole exchange pipeline: recovers from failures after
    /// a token or profile has already been obtained (e.g. a store write).
    #[must_use]
    pub const fn pipeline() -> Self {
        Self {
            max_attempts: PIPELINE_MAX_ATTEMPTS,
            backoff: Backoff::Exponential {
                base: PIPELINE_BACKOFF_BASE,
            },
        }
    }

    /// Run `op` under this policy. Terminal errors surface immediately;
    /// retryable ones are retried until attempts run out.
    ///
    /// # Errors
    ///
    /// Returns the last error once attempts are exhausted, or the first error
    /// the classifier marks terminal.
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T, AuthError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, AuthError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        for attempt in 1..=max_attempts {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if attempt < max_attempts && is_retryable(&err) => {
                    let delay = self.backoff.delay(attempt);
                    warn!(
                        "{label} failed on attempt {attempt}/{max_attempts}, retrying in {}ms: {err}",
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }

        unreachable!("max_attempts is always >= 1, so the loop always returns")
    }
}
