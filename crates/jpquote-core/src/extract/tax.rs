//! Consumption tax resolution.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use tracing::{debug, warn};

use crate::models::price::{PriceCandidate, TaxKind, TaxResolution};

use super::patterns::TAX_RATE;
use super::tokenizer::normalize_amount;

/// Every explicit tax rate stated in `text`, in document order.
pub fn extract_tax_rates(text: &str) -> Vec<u32> {
    TAX_RATE
        .captures_iter(text)
        .filter_map(|caps| normalize_amount(&caps[1]))
        .filter_map(|rate| u32::try_from(rate).ok())
        .collect()
}

/// The first explicit tax rate in `text`.
///
/// When a document mentions several rates the first one wins, even if it
/// belongs to something other than the selected price.
pub fn find_tax_rate(text: &str) -> Option<u32> {
    let rates = extract_tax_rates(text);
    if rates.iter().any(|r| Some(r) != rates.first()) {
        debug!("Multiple tax rates {:?} in document, using {}", rates, rates[0]);
    }
    rates.first().copied()
}

/// Add `rate_percent` tax to `amount`, rounding up to whole yen.
pub fn calculate_inclusive(amount: u64, rate_percent: u32) -> Option<u64> {
    let multiplier = Decimal::from(100u64 + u64::from(rate_percent)) / Decimal::ONE_HUNDRED;
    Decimal::from(amount)
        .checked_mul(multiplier)
        .map(|v| v.ceil())
        .and_then(|v| v.to_u64())
}

/// Turns a selected candidate into a tax-inclusive amount.
#[derive(Debug, Clone, Copy)]
pub struct TaxResolver {
    default_rate_percent: u32,
}

impl TaxResolver {
    pub fn new(default_rate_percent: u32) -> Self {
        Self {
            default_rate_percent,
        }
    }

    /// Resolve the final price of `candidate`, reading any stated rate from `text`.
    ///
    /// Returns `None` only when the taxed amount overflows.
    pub fn resolve(&self, candidate: &PriceCandidate, text: &str) -> Option<TaxResolution> {
        match candidate.tax_kind {
            TaxKind::Inclusive | TaxKind::Unknown => Some(TaxResolution::unchanged(candidate.amount)),
            TaxKind::Exclusive => {
                let explicit = find_tax_rate(text);
                let rate = explicit.unwrap_or(self.default_rate_percent);

                let Some(amount) = calculate_inclusive(candidate.amount, rate) else {
                    warn!("Tax-inclusive amount for {} at {}% overflows", candidate.amount, rate);
                    return None;
                };

                debug!(
                    "Resolved tax-exclusive {} at {}% ({}) to {}",
                    candidate.amount,
                    rate,
                    if explicit.is_some() { "stated" } else { "default" },
                    amount
                );

                Some(TaxResolution {
                    pre_tax: candidate.amount,
                    amount,
                    rate_percent: Some(rate),
                    rate_explicit: explicit.is_some(),
                })
            }
        }
    }
}

impl Default for TaxResolver {
    fn default() -> Self {
        Self::new(10)
    }
}
