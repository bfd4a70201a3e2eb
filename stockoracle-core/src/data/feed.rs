//! Decoder for the line-oriented `getprices` text feed.
//!
//! A feed looks like:
//!
//! ```text
//! EXCHANGE%3DNYSE
//! MARKET_OPEN_MINUTE=570
//! MARKET_CLOSE_MINUTE=960
//! INTERVAL=3600
//! COLUMNS=DATE,CLOSE,HIGH,LOW,OPEN,VOLUME
//! DATA=
//! TIMEZONE_OFFSET=-300
//! a1609459200,100.5,101,99,100,5000
//! 1,100.7,101.2,100.1,100.5,4200
//! 2,100.9,101.4,100.3,100.7,3900
//! ```
//!
//! Rows whose first cell starts with `a` carry an absolute unix timestamp
//! (the anchor). Every other row's first cell is an offset, in `interval`
//! units, from the most recent anchor.

use crate::domain::{Company, SymbolSeries, TimePoint};

/// Prefix of the exchange header line (`=` arrives URL-encoded).
pub const EXCHANGE_MARKER: &str = "EXCHANGE%3D";

/// Prefix of an absolute-timestamp cell.
pub const ANCHOR_MARKER: char = 'a';

const COLUMNS_KEY: &str = "columns";

/// Decode one symbol's feed. Never fails: lines that cannot be decoded are
/// skipped, so a malformed body yields a short or empty series.
pub fn parse_feed(company: &Company, interval_secs: i64, text: &str) -> SymbolSeries {
    let mut series = SymbolSeries {
        name: company.name.clone(),
        symbol: company.symbol.clone(),
        ..Default::default()
    };
    let mut anchor: i64 = 0;

    for line in text.lines() {
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            continue;
        }

        if let Some(exchange) = line.strip_prefix(EXCHANGE_MARKER) {
            series.exchange = Some(exchange.to_string());
            continue;
        }

        if let Some((key, value)) = line.split_once('=') {
            let key = key.to_lowercase();
            if key == COLUMNS_KEY {
                series.columns = value.split(',').map(str::to_string).collect();
            } else {
                series.metadata.insert(key, value.to_string());
            }
            continue;
        }

        match parse_row(line, &series.columns, &mut anchor, interval_secs) {
            Some(point) => series.time_series.push(point),
            None => {
                tracing::debug!(symbol = %series.symbol, line, "skipping undecodable feed row")
            }
        }
    }

    series
}

/// Decode one data row, moving the anchor forward when the row carries one.
fn parse_row(
    line: &str,
    columns: &[String],
    anchor: &mut i64,
    interval_secs: i64,
) -> Option<TimePoint> {
    let mut cells = line.split(',');
    let stamp = cells.next()?.trim();

    let offset = match stamp.strip_prefix(ANCHOR_MARKER) {
        Some(absolute) => {
            *anchor = absolute.parse().ok()?;
            0
        }
        None => stamp.parse::<i64>().ok()?,
    };

    // Timestamps come off the wire; a row that would overflow is undecodable.
    let unix_time = offset
        .checked_mul(interval_secs)
        .and_then(|delta| anchor.checked_add(delta))?;

    let mut point = TimePoint::new(unix_time);
    for (name, value) in columns.iter().skip(1).zip(cells) {
        point.fields.insert(name.clone(), value.to_string());
    }
    Some(point)
}
