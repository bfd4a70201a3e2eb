//! Constituent loading, feed decoding and the download driver

pub mod download;
pub mod feed;
pub mod google;
pub mod provider;
pub mod seed;

pub use download::{
    classify, download_constituents, Backoff, DownloadError, DownloadSummary, DriverState, Step,
    Transition, BACKOFF_STEP, MAX_UNCLASSIFIED_ATTEMPTS,
};
pub use feed::parse_feed;
pub use google::GoogleFinanceProvider;
pub use provider::{DownloadProgress, FetchError, Pause, PriceProvider, StdoutProgress, ThreadPause};
pub use seed::{load_constituents, parse_constituents, SeedError};
