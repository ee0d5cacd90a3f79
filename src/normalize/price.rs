//! Price text normalization
//!
//! Turns scraped price text such as `"R 1 234,56"` into `1234.56`.
//!
//! # Steps
//!
//! 1. Trim; empty text has no price
//! 2. Remove currency symbols (longest first) and every whitespace character
//! 3. Decide what a comma means: a single comma followed by exactly one or two
//!    digits at the end is the decimal separator, and any periods before it
//!    are grouping separators; otherwise every comma is a grouping separator
//! 4. The remainder must be digits with at most one period
//! 5. Parse as `f64`

use thiserror::Error;

/// Why price text could not be turned into a number
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PriceError {
    #[error("price text is empty")]
    Empty,

    #[error("could not convert price to a number: {raw:?}")]
    Malformed { raw: String },
}

/// How the price field of a record came out of normalization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceStatus {
    /// Price text was parsed into a number
    Parsed,
    /// The page had no price text
    Missing,
    /// Price text was present but not a number
    Unparseable,
}

/// Converts raw price text into an amount in the site's base currency unit
#[derive(Debug, Clone)]
pub struct PriceNormalizer {
    /// Currency symbols, longest first
    symbols: Vec<String>,
}

impl Default for PriceNormalizer {
    fn default() -> Self {
        Self::new(&["R".to_string(), "ZAR".to_string()])
    }
}

impl PriceNormalizer {
    pub fn new(currency_symbols: &[String]) -> Self {
        let mut symbols: Vec<String> = currency_symbols
            .iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        symbols.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        symbols.dedup();

        Self { symbols }
    }

    /// Parses price text, reporting why it failed
    ///
    /// # Example
    ///
    /// ```
    /// use shelfscan::normalize::{PriceError, PriceNormalizer};
    ///
    /// let normalizer = PriceNormalizer::default();
    /// assert_eq!(normalizer.parse_price("R 123.45"), Ok(123.45));
    /// assert_eq!(normalizer.parse_price("R1 234,56"), Ok(1234.56));
    /// assert!(matches!(normalizer.parse_price("abc"), Err(PriceError::Malformed { .. })));
    /// ```
    pub fn parse_price(&self, raw: &str) -> Result<f64, PriceError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(PriceError::Empty);
        }

        let malformed = || PriceError::Malformed {
            raw: raw.to_string(),
        };

        let mut stripped = trimmed.to_string();
        for symbol in &self.symbols {
            stripped = stripped.replace(symbol.as_str(), "");
        }
        stripped.retain(|c| !c.is_whitespace());

        let candidate = match stripped.split_once(',') {
            Some((whole, fraction)) if is_decimal_fraction(fraction) => {
                format!("{}.{}", whole.replace('.', ""), fraction)
            }
            _ => stripped.replace(',', ""),
        };

        let digits = candidate.chars().filter(|c| c.is_ascii_digit()).count();
        let periods = candidate.chars().filter(|c| *c == '.').count();
        if digits == 0 || periods > 1 || digits + periods != candidate.len() {
            return Err(malformed());
        }

        candidate
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .ok_or_else(malformed)
    }

    /// Normalizes optional price text, logging a warning on failure
    ///
    /// Absent or empty text is simply absent; text that is not a number is
    /// absent too, but never silently.
    pub fn normalize(&self, raw: Option<&str>) -> Option<f64> {
        self.normalize_with_status(raw).0
    }

    /// Like [`normalize`](Self::normalize), also reporting what happened
    pub fn normalize_with_status(&self, raw: Option<&str>) -> (Option<f64>, PriceStatus) {
        let Some(raw) = raw else {
            return (None, PriceStatus::Missing);
        };

        match self.parse_price(raw) {
            Ok(value) => (Some(value), PriceStatus::Parsed),
            Err(PriceError::Empty) => (None, PriceStatus::Missing),
            Err(e) => {
                tracing::warn!(raw = %raw, "{}", e);
                (None, PriceStatus::Unparseable)
            }
        }
    }
}

/// A decimal fraction after a comma: one or two digits and nothing else
fn is_decimal_fraction(fraction: &str) -> bool {
    (1..=2).contains(&fraction.len()) && fraction.chars().all(|c| c.is_ascii_digit())
}
