//! StockOracle Core — index constituents, price feed decoding, download driver.
//!
//! - Constituent list loaded from a CSV seed file
//! - Decoder for the `getprices` plaintext feed (anchor + offset timestamps)
//! - Sequential fetch loop with reset retries and a monotonic rate-limit backoff
//! - Aggregate output keyed by ticker symbol

pub mod config;
pub mod data;
pub mod domain;

pub use config::{ConfigError, OracleConfig};
