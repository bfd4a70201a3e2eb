//! Download driver: walks the constituent list one company at a time.
//!
//! Each fetch attempt is classified into a [`Transition`]:
//! - connection reset: retry the same company after the current backoff
//! - rate limited / no data: grow the backoff by [`BACKOFF_STEP`], then retry
//! - parsed series: record it, tick progress, move to the next company
//! - anything else: retry after the current backoff, give up on the run
//!   after [`MAX_UNCLASSIFIED_ATTEMPTS`] in a row for the same company
//!
//! The backoff starts at zero and only ever grows. It is not reset between
//! companies, so every rate-limit event slows the rest of the run.

use super::provider::{DownloadProgress, FetchError, Pause, PriceProvider};
use crate::domain::{AggregateOutput, Company, SymbolSeries};
use std::time::Duration;
use thiserror::Error;

/// Added to the backoff on every rate-limit / no-data response.
pub const BACKOFF_STEP: Duration = Duration::from_millis(5000);

/// Consecutive unclassified failures on one company before the run aborts.
pub const MAX_UNCLASSIFIED_ATTEMPTS: u32 = 3;

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("giving up on {symbol} after {attempts} failed attempts: {last_error}")]
    Stalled {
        symbol: String,
        attempts: u32,
        #[source]
        last_error: FetchError,
    },
}

/// Monotonic wait between attempts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Backoff(Duration);

impl Backoff {
    pub fn current(&self) -> Duration {
        self.0
    }

    /// Grow by one step and return the new wait.
    pub fn increase(&mut self) -> Duration {
        self.0 += BACKOFF_STEP;
        self.0
    }
}

/// What a single fetch attempt means for the driver.
#[derive(Debug)]
pub enum Transition {
    Advance(SymbolSeries),
    RetryImmediate(FetchError),
    RetryBackoff(FetchError),
    Unclassified(FetchError),
}

/// Map a provider result onto a driver transition.
pub fn classify(result: Result<SymbolSeries, FetchError>) -> Transition {
    match result {
        Ok(series) if series.is_empty() => Transition::RetryBackoff(FetchError::NoData),
        Ok(series) => Transition::Advance(series),
        Err(e @ FetchError::ConnectionReset(_)) => Transition::RetryImmediate(e),
        Err(e @ (FetchError::RateLimited { .. } | FetchError::NoData)) => {
            Transition::RetryBackoff(e)
        }
        Err(e) => Transition::Unclassified(e),
    }
}

/// What the loop does after a transition has been applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Wait, then request the company at the (possibly new) index.
    Wait(Duration),
    Done,
}

/// Mutable state of one run.
#[derive(Debug, Default)]
pub struct DriverState {
    index: usize,
    backoff: Backoff,
    output: AggregateOutput,
    unclassified: u32,
    attempts: usize,
    waited: Duration,
}

impl DriverState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn backoff(&self) -> Backoff {
        self.backoff
    }

    pub fn output(&self) -> &AggregateOutput {
        &self.output
    }

    /// Apply one transition for `companies[self.index()]`.
    ///
    /// Once the index has run past the list, every transition is `Done`.
    pub fn apply(
        &mut self,
        transition: Transition,
        companies: &[Company],
        progress: &dyn DownloadProgress,
    ) -> Result<Step, DownloadError> {
        let total = companies.len();
        let Some(company) = companies.get(self.index) else {
            return Ok(Step::Done);
        };
        let symbol = company.symbol.as_str();

        match transition {
            Transition::Advance(series) => {
                self.unclassified = 0;
                self.output.record(series);
                progress.on_complete(symbol, self.index, total);
                self.index += 1;
                if self.index == total {
                    Ok(Step::Done)
                } else {
                    Ok(Step::Wait(self.backoff.current()))
                }
            }
            Transition::RetryImmediate(error) => {
                self.unclassified = 0;
                let wait = self.backoff.current();
                tracing::warn!(symbol, %error, "connection reset, retrying");
                progress.on_retry(symbol, &error, wait);
                Ok(Step::Wait(wait))
            }
            Transition::RetryBackoff(error) => {
                self.unclassified = 0;
                let wait = self.backoff.increase();
                tracing::warn!(
                    symbol,
                    %error,
                    backoff_ms = wait.as_millis() as u64,
                    "rate limited, backing off"
                );
                progress.on_retry(symbol, &error, wait);
                Ok(Step::Wait(wait))
            }
            Transition::Unclassified(error) => {
                self.unclassified += 1;
                if self.unclassified >= MAX_UNCLASSIFIED_ATTEMPTS {
                    tracing::error!(symbol, %error, attempts = self.unclassified, "giving up");
                    return Err(DownloadError::Stalled {
                        symbol: symbol.to_string(),
                        attempts: self.unclassified,
                        last_error: error,
                    });
                }
                let wait = self.backoff.current();
                tracing::warn!(
                    symbol,
                    %error,
                    attempt = self.unclassified,
                    "unexpected failure, retrying"
                );
                progress.on_retry(symbol, &error, wait);
                Ok(Step::Wait(wait))
            }
        }
    }

    fn finish(self) -> DownloadSummary {
        DownloadSummary {
            output: self.output,
            attempts: self.attempts,
            waited: self.waited,
            final_backoff: self.backoff.current(),
        }
    }
}

/// Fetch every company in order, retrying until each one parses.
///
/// Exactly one request is in flight at a time. Returns the aggregate once
/// the last company has been recorded.
pub fn download_constituents(
    provider: &dyn PriceProvider,
    companies: &[Company],
    pause: &dyn Pause,
    progress: &dyn DownloadProgress,
) -> Result<DownloadSummary, DownloadError> {
    let total = companies.len();
    let mut state = DriverState::new();

    tracing::info!(total, provider = provider.name(), "downloading constituent prices");

    while let Some(company) = companies.get(state.index) {
        progress.on_start(&company.symbol, state.index, total);
        state.attempts += 1;

        let transition = classify(provider.fetch(company));
        match state.apply(transition, companies, progress)? {
            Step::Wait(wait) => {
                pause.pause(wait);
                state.waited += wait;
            }
            Step::Done => break,
        }
    }

    let summary = state.finish();
    tracing::info!(
        symbols = summary.output.len(),
        attempts = summary.attempts,
        waited_ms = summary.waited.as_millis() as u64,
        "download complete"
    );
    progress.on_batch_complete(total, summary.waited);
    Ok(summary)
}

/// Result of a full constituent download.
#[derive(Debug)]
pub struct DownloadSummary {
    pub output: AggregateOutput,
    /// Fetch attempts, retries included.
    pub attempts: usize,
    /// Total time spent in pauses.
    pub waited: Duration,
    pub final_backoff: Duration,
}

impl DownloadSummary {
    pub fn retries(&self) -> usize {
        self.attempts.saturating_sub(self.output.len())
    }
}
