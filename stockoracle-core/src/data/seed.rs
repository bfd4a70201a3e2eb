//! Constituent list — the seed file of index members.
//!
//! The seed is a CSV file with a header row followed by
//! `symbol,name,sector` rows. Every cell is uppercased (the header too)
//! and the header row is dropped.

use crate::domain::Company;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

/// Errors reading the seed file. Any of these is fatal at startup.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("read constituent file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("parse constituent CSV: {0}")]
    Csv(#[from] csv::Error),
}

/// Load the constituent list from a CSV file on disk.
pub fn load_constituents(path: &Path) -> Result<Vec<Company>, SeedError> {
    let file = std::fs::File::open(path).map_err(|source| SeedError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_constituents(file)
}

/// Parse a constituent list from any CSV reader.
pub fn parse_constituents<R: Read>(reader: R) -> Result<Vec<Company>, SeedError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let cells: Vec<String> = record.iter().map(|cell| cell.to_uppercase()).collect();
        rows.push(cells);
    }

    Ok(rows.into_iter().skip(1).map(company_from_row).collect())
}

fn company_from_row(cells: Vec<String>) -> Company {
    // Ragged rows: missing trailing cells read as empty.
    let mut cells = cells.into_iter();
    let mut next = || cells.next().unwrap_or_default();
    Company {
        symbol: next(),
        name: next(),
        sector: next(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEED: &str = "Symbol,Name,Sector\n\
                        cvx,Chevron Corp.,Energy\n\
                        aapl,Apple Inc.,Information Technology\n";

    #[test]
    fn drops_header_and_uppercases() {
        let companies = parse_constituents(SEED.as_bytes()).unwrap();
        assert_eq!(companies.len(), 2);
        assert_eq!(
            companies[0],
            Company::new("CVX", "CHEVRON CORP.", "ENERGY")
        );
        assert_eq!(companies[1].sector, "INFORMATION TECHNOLOGY");
    }

    #[test]
    fn quoted_names_keep_commas() {
        let seed = "Symbol,Name,Sector\nbrk.b,\"Berkshire Hathaway, Inc.\",Financials\n";
        let companies = parse_constituents(seed.as_bytes()).unwrap();
        assert_eq!(companies[0].symbol, "BRK.B");
        assert_eq!(companies[0].name, "BERKSHIRE HATHAWAY, INC.");
    }

    #[test]
    fn ragged_rows_fill_with_empty() {
        let seed = "Symbol,Name,Sector\nxom\n";
        let companies = parse_constituents(seed.as_bytes()).unwrap();
        assert_eq!(companies, vec![Company::new("XOM", "", "")]);
    }

    #[test]
    fn header_only_is_empty() {
        let companies = parse_constituents("Symbol,Name,Sector\n".as_bytes()).unwrap();
        assert!(companies.is_empty());
    }

    #[test]
    fn missing_file_is_io_error() {
        let result = load_constituents(Path::new("does/not/exist.csv"));
        assert!(matches!(result, Err(SeedError::Io { .. })));
    }

    #[test]
    fn loads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("constituents.csv");
        std::fs::write(&path, SEED).unwrap();

        let companies = load_constituents(&path).unwrap();
        assert_eq!(companies.len(), 2);
        assert_eq!(companies[1].symbol, "AAPL");
    }
}
