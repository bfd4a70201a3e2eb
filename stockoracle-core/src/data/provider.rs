//! Price provider trait, fetch errors and progress reporting.
//!
//! The PriceProvider trait abstracts over the remote feed so the download
//! driver can be exercised against a scripted provider in tests.

use crate::domain::{Company, SymbolSeries};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Errors from a single fetch attempt.
///
/// The download driver decides what to do with each variant; the provider
/// only reports what happened.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// Connection reset, aborted or broken mid-request.
    #[error("connection reset: {0}")]
    ConnectionReset(String),

    #[error("rate limited by provider (HTTP {status})")]
    RateLimited { status: u16 },

    /// The provider answered 200 but the body held no price rows.
    #[error("response carried no price data")]
    NoData,

    #[error("unexpected HTTP {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(String),
}

/// Trait for the remote price source.
pub trait PriceProvider {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch and decode one company's price history.
    fn fetch(&self, company: &Company) -> Result<SymbolSeries, FetchError>;
}

/// Wait between fetch attempts.
pub trait Pause {
    fn pause(&self, duration: Duration);
}

/// Blocks the calling thread for the requested duration.
pub struct ThreadPause;

impl Pause for ThreadPause {
    fn pause(&self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}

/// Progress callback for the constituent download.
pub trait DownloadProgress {
    /// Called before each fetch attempt, retries included.
    fn on_start(&self, symbol: &str, index: usize, total: usize);

    /// Called when an attempt failed and the same symbol will be retried.
    fn on_retry(&self, symbol: &str, error: &FetchError, wait: Duration);

    /// Called once per company that made it into the output.
    fn on_complete(&self, symbol: &str, index: usize, total: usize);

    /// Called when the entire list is done.
    fn on_batch_complete(&self, total: usize, waited: Duration);
}

/// Width of the text progress bar.
const BAR_WIDTH: usize = 30;

/// Progress reporter that prints a percent, a bar and an ETA to stdout.
pub struct StdoutProgress {
    started: Instant,
}

impl StdoutProgress {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
        }
    }
}

impl Default for StdoutProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl DownloadProgress for StdoutProgress {
    fn on_start(&self, _symbol: &str, _index: usize, _total: usize) {}

    fn on_retry(&self, symbol: &str, error: &FetchError, wait: Duration) {
        println!("  retry {symbol} in {}ms: {error}", wait.as_millis());
    }

    fn on_complete(&self, symbol: &str, index: usize, total: usize) {
        let line = progress_line(index + 1, total, self.started.elapsed());
        println!("{line} {symbol}");
    }

    fn on_batch_complete(&self, total: usize, waited: Duration) {
        println!(
            "\nDownload complete: {total} companies in {:.1}s, {:.1}s spent backing off",
            self.started.elapsed().as_secs_f64(),
            waited.as_secs_f64()
        );
    }
}

/// Remaining time, extrapolated from the average time per completed company.
pub fn estimate_remaining(elapsed: Duration, done: usize, total: usize) -> Duration {
    if done == 0 {
        return Duration::ZERO;
    }
    let remaining = total.saturating_sub(done) as u32;
    (elapsed / done as u32).saturating_mul(remaining)
}

/// `" 40% [############------------------] 12.0s remaining"`
pub fn progress_line(done: usize, total: usize, elapsed: Duration) -> String {
    let total = total.max(1);
    let done = done.min(total);
    let percent = done * 100 / total;
    let filled = done * BAR_WIDTH / total;
    let eta = estimate_remaining(elapsed, done, total);
    format!(
        "{percent:>3}% [{}{}] {:.1}s remaining",
        "#".repeat(filled),
        "-".repeat(BAR_WIDTH - filled),
        eta.as_secs_f64()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eta_scales_with_average_per_company() {
        let eta = estimate_remaining(Duration::from_secs(10), 2, 10);
        assert_eq!(eta, Duration::from_secs(40));
    }

    #[test]
    fn eta_is_zero_before_first_and_after_last() {
        assert_eq!(estimate_remaining(Duration::from_secs(5), 0, 10), Duration::ZERO);
        assert_eq!(estimate_remaining(Duration::from_secs(5), 10, 10), Duration::ZERO);
    }

    #[test]
    fn progress_line_shows_percent_bar_and_eta() {
        let line = progress_line(3, 10, Duration::from_secs(6));
        assert_eq!(
            line,
            format!(" 30% [{}{}] 14.0s remaining", "#".repeat(9), "-".repeat(21))
        );
    }

    #[test]
    fn progress_line_full_bar_when_done() {
        let line = progress_line(4, 4, Duration::from_secs(8));
        assert_eq!(line, format!("100% [{}] 0.0s remaining", "#".repeat(BAR_WIDTH)));
    }
}
