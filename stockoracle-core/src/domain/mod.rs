//! Domain types for StockOracle

pub mod company;
pub mod series;

pub use company::Company;
pub use series::{AggregateOutput, SymbolSeries, TickerEntry, TimePoint};
