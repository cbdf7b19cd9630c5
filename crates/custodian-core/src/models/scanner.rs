use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use crate::constants::SCANNER_METRIC_PREFIX;

/// External scanning services uploads can be sent to.
///
/// Stored as a SMALLINT; the discriminants are part of the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[repr(i16)]
#[serde(rename_all = "snake_case")]
pub enum Scanner {
    Customs = 1,
    Wat = 2,
}

impl Scanner {
    pub fn name(&self) -> &'static str {
        match self {
            Scanner::Customs => "customs",
            Scanner::Wat => "wat",
        }
    }

    pub fn as_i16(&self) -> i16 {
        *self as i16
    }

    /// Timer key for the scanner request, e.g. `devhub.customs`.
    pub fn metric_key(&self) -> String {
        format!("{}.{}", SCANNER_METRIC_PREFIX, self.name())
    }
}

impl Display for Scanner {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.name())
    }
}

impl FromStr for Scanner {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customs" => Ok(Scanner::Customs),
            "wat" => Ok(Scanner::Wat),
            _ => Err(anyhow::anyhow!("Invalid scanner: {}", s)),
        }
    }
}

/// Where and how to reach one scanner.
#[derive(Clone)]
pub struct ScannerConfig {
    pub scanner: Scanner,
    pub api_url: String,
    pub api_key: String,
}

// Never print the API key.
impl std::fmt::Debug for ScannerConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ScannerConfig")
            .field("scanner", &self.scanner)
            .field("api_url", &self.api_url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}
