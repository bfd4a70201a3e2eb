//! Google Finance `getprices` provider.
//!
//! One blocking GET per attempt. Retry policy lives in the download driver;
//! this module only turns the HTTP exchange into a [`SymbolSeries`] or a
//! [`FetchError`] the driver can classify.

use super::feed::parse_feed;
use super::provider::{FetchError, PriceProvider};
use crate::config::OracleConfig;
use crate::domain::{Company, SymbolSeries};
use std::error::Error as _;
use std::io::ErrorKind;
use std::time::Duration;

/// Fixed field set: date, close, volume, cdays, open, high, low.
const FIELDS: &str = "d,c,v,k,o,h,l";

/// Longest error body kept in [`FetchError::UnexpectedStatus`].
const MAX_ERROR_BODY: usize = 512;

pub struct GoogleFinanceProvider {
    client: reqwest::blocking::Client,
    endpoint: String,
    interval_secs: i64,
    period: String,
}

impl GoogleFinanceProvider {
    pub fn new(config: &OracleConfig) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| FetchError::Transport(format!("build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            interval_secs: config.interval_secs,
            period: config.period.clone(),
        })
    }

    /// Build the `getprices` URL for a symbol.
    pub fn prices_url(&self, symbol: &str) -> String {
        format!(
            "{}?q={}&i={}&p={}&f={FIELDS}&df=cpct&auto=0&ei=Ef6XUYfCqSTiAKEMg",
            self.endpoint,
            symbol.to_uppercase(),
            self.interval_secs,
            self.period,
        )
    }
}

impl PriceProvider for GoogleFinanceProvider {
    fn name(&self) -> &str {
        "google_finance"
    }

    fn fetch(&self, company: &Company) -> Result<SymbolSeries, FetchError> {
        let url = self.prices_url(&company.symbol);
        tracing::debug!(%url, "requesting prices");

        let resp = self.client.get(&url).send().map_err(transport_error)?;
        let status = resp.status().as_u16();
        let body = resp.text().map_err(transport_error)?;

        series_from_response(company, self.interval_secs, status, &body)
    }
}

/// Interpret a completed HTTP exchange.
///
/// 200 with price rows parses; 200 without any rows is [`FetchError::NoData`];
/// 403 is the rate-limit signal; any other status is unexpected.
pub fn series_from_response(
    company: &Company,
    interval_secs: i64,
    status: u16,
    body: &str,
) -> Result<SymbolSeries, FetchError> {
    match status {
        200 => {
            let series = parse_feed(company, interval_secs, body);
            if series.is_empty() {
                Err(FetchError::NoData)
            } else {
                Ok(series)
            }
        }
        403 => Err(FetchError::RateLimited { status }),
        _ => Err(FetchError::UnexpectedStatus {
            status,
            body: body.chars().take(MAX_ERROR_BODY).collect(),
        }),
    }
}

fn transport_error(err: reqwest::Error) -> FetchError {
    if is_connection_reset(&err) {
        FetchError::ConnectionReset(err.to_string())
    } else {
        FetchError::Transport(err.to_string())
    }
}

/// Walk the source chain looking for a reset-class I/O error.
fn is_connection_reset(err: &reqwest::Error) -> bool {
    let mut source = err.source();
    while let Some(e) = source {
        if let Some(io) = e.downcast_ref::<std::io::Error>() {
            if is_reset_kind(io.kind()) {
                return true;
            }
        }
        source = e.source();
    }
    false
}

fn is_reset_kind(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::ConnectionReset | ErrorKind::ConnectionAborted | ErrorKind::BrokenPipe
    )
}
