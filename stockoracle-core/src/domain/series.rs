//! Parsed price series and the per-run aggregate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single sample of the feed.
///
/// Field names come from the feed's `COLUMNS=` header and are only known at
/// parse time, so values are kept as the raw text the feed sent.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimePoint {
    #[serde(rename = "unixTime")]
    pub unix_time: i64,
    #[serde(flatten)]
    pub fields: BTreeMap<String, String>,
}

impl TimePoint {
    pub fn new(unix_time: i64) -> Self {
        Self {
            unix_time,
            fields: BTreeMap::new(),
        }
    }

    /// Raw value of a named column, if the row carried it.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(|s| s.as_str())
    }

    /// Numeric value of a named column. `None` when absent or not a number.
    pub fn field_f64(&self, name: &str) -> Option<f64> {
        self.field(name).and_then(|v| v.trim().parse().ok())
    }

    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.unix_time, 0)
    }
}

/// Everything decoded from one symbol's feed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SymbolSeries {
    pub name: String,
    pub symbol: String,
    pub exchange: Option<String>,
    /// Ordered schema of each data row. Index 0 is the timestamp column.
    pub columns: Vec<String>,
    pub time_series: Vec<TimePoint>,
    /// Remaining `KEY=value` header lines, keyed by the lowercased key.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

impl SymbolSeries {
    pub fn is_empty(&self) -> bool {
        self.time_series.is_empty()
    }
}

/// Output record for one symbol.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TickerEntry {
    pub ticker: Vec<TimePoint>,
    pub name: String,
}

impl TickerEntry {
    pub fn first_time(&self) -> Option<i64> {
        self.ticker.first().map(|p| p.unix_time)
    }

    pub fn last_time(&self) -> Option<i64> {
        self.ticker.last().map(|p| p.unix_time)
    }
}

impl From<SymbolSeries> for TickerEntry {
    fn from(series: SymbolSeries) -> Self {
        Self {
            ticker: series.time_series,
            name: series.name,
        }
    }
}

/// Symbol → price history for a whole run.
///
/// Starts empty, gains one entry per successfully parsed company and is
/// handed back to the caller once the constituent list is exhausted.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct AggregateOutput {
    entries: BTreeMap<String, TickerEntry>,
}

impl AggregateOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a parsed series under its symbol. A later series for the same
    /// symbol replaces the earlier one.
    pub fn record(&mut self, series: SymbolSeries) {
        let symbol = series.symbol.clone();
        self.entries.insert(symbol, TickerEntry::from(series));
    }

    pub fn get(&self, symbol: &str) -> Option<&TickerEntry> {
        self.entries.get(symbol)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of time points across all symbols.
    pub fn point_count(&self) -> usize {
        self.entries.values().map(|e| e.ticker.len()).sum()
    }

    /// Earliest and latest sample across all symbols.
    pub fn time_range(&self) -> Option<(TimePoint, TimePoint)> {
        let first = self.entries.values().filter_map(|e| e.first_time()).min()?;
        let last = self.entries.values().filter_map(|e| e.last_time()).max()?;
        Some((TimePoint::new(first), TimePoint::new(last)))
    }
}
