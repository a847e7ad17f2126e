//! Price candidates and their tax classification.

use serde::{Deserialize, Serialize};

/// Whether a listed price already includes consumption tax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxKind {
    /// Explicitly tagged as tax-included (税込).
    Inclusive,
    /// Explicitly tagged as tax-excluded (税抜 / 税別).
    Exclusive,
    /// No tag; treated as the final price.
    Unknown,
}

impl Default for TaxKind {
    fn default() -> Self {
        Self::Unknown
    }
}

impl TaxKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inclusive => "inclusive",
            Self::Exclusive => "exclusive",
            Self::Unknown => "unknown",
        }
    }
}

/// A provisionally recognized price occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceCandidate {
    /// Whole yen, no decimals.
    pub amount: u64,

    /// Tax classification inherited from the rule that produced it.
    pub tax_kind: TaxKind,

    /// The line (or selector hit) the amount was read from.
    pub source_line: String,

    /// Byte offset of the match in the scanned text.
    pub position: usize,

    /// Priority tier of the producing rule; lower wins.
    pub tier: usize,
}

/// How the final tax-inclusive amount was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxResolution {
    /// Amount before tax was added (equal to `amount` when nothing was added).
    pub pre_tax: u64,

    /// Final tax-inclusive amount.
    pub amount: u64,

    /// Rate applied, for tax-exclusive candidates only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_percent: Option<u32>,

    /// Whether the rate was stated in the document or defaulted.
    pub rate_explicit: bool,
}

impl TaxResolution {
    /// An amount that passes through unchanged.
    pub fn unchanged(amount: u64) -> Self {
        Self {
            pre_tax: amount,
            amount,
            rate_percent: None,
            rate_explicit: false,
        }
    }

    /// Whether tax was added on top of the listed amount.
    pub fn is_adjusted(&self) -> bool {
        self.rate_percent.is_some()
    }
}
