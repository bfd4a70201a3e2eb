//! Seed loading and feed decoding against frozen fixtures.

use std::path::PathBuf;
use stockoracle_core::data::{load_constituents, parse_feed};
use stockoracle_core::domain::AggregateOutput;

fn fixture_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn cvx_feed() -> String {
    std::fs::read_to_string(fixture_dir().join("cvx_getprices.txt")).unwrap()
}

#[test]
fn fixture_constituents_load() {
    let companies = load_constituents(&fixture_dir().join("constituents.csv")).unwrap();

    assert_eq!(companies.len(), 9);
    assert_eq!(companies[0].symbol, "MMM");
    assert_eq!(companies[0].name, "3M COMPANY");

    let brk = companies.iter().find(|c| c.symbol == "BRK.B").unwrap();
    assert_eq!(brk.name, "BERKSHIRE HATHAWAY, INC.");
    assert_eq!(brk.sector, "FINANCIALS");

    for c in &companies {
        assert_eq!(c.symbol, c.symbol.to_uppercase());
        assert_eq!(c.name, c.name.to_uppercase());
        assert_eq!(c.sector, c.sector.to_uppercase());
    }
}

#[test]
fn fixture_feed_decodes_both_anchor_blocks() {
    let companies = load_constituents(&fixture_dir().join("constituents.csv")).unwrap();
    let cvx = companies.iter().find(|c| c.symbol == "CVX").unwrap();

    let series = parse_feed(cvx, 3600, &cvx_feed());

    assert_eq!(series.exchange.as_deref(), Some("NYSE"));
    assert_eq!(series.metadata["interval"], "3600");
    assert_eq!(series.time_series.len(), 13);

    // Verify times are sorted ascending
    for window in series.time_series.windows(2) {
        assert!(window[0].unix_time < window[1].unix_time);
    }

    // Last row of the first block: anchor + 26 hours.
    assert_eq!(series.time_series[9].unix_time, 1_609_770_600 + 26 * 3600);
    // First row of the second block is the new anchor itself.
    assert_eq!(series.time_series[10].unix_time, 1_609_943_400);
    assert_eq!(series.time_series[10].field("CLOSE"), Some("90.01"));

    for point in &series.time_series {
        let high = point.field_f64("HIGH").unwrap();
        let low = point.field_f64("LOW").unwrap();
        assert!(high >= low);
        assert!(point.field_f64("VOLUME").unwrap() > 0.0);
    }
}

#[test]
fn fixture_series_lands_in_aggregate() {
    let companies = load_constituents(&fixture_dir().join("constituents.csv")).unwrap();
    let cvx = companies.iter().find(|c| c.symbol == "CVX").unwrap();

    let mut output = AggregateOutput::new();
    output.record(parse_feed(cvx, 3600, &cvx_feed()));

    let json = serde_json::to_value(&output).unwrap();
    assert_eq!(json["CVX"]["name"], "CHEVRON CORP.");
    assert_eq!(json["CVX"]["ticker"][0]["unixTime"], 1_609_770_600);
    assert_eq!(json["CVX"]["ticker"][0]["CLOSE"], "86.66");
}
