use serde::{Deserialize, Serialize};

/// One index constituent, as listed in the seed file.
///
/// All fields are uppercased at load time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Company {
    pub symbol: String,
    pub name: String,
    pub sector: String,
}

impl Company {
    pub fn new(
        symbol: impl Into<String>,
        name: impl Into<String>,
        sector: impl Into<String>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            name: name.into(),
            sector: sector.into(),
        }
    }
}
