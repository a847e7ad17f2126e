//! Quotation output records.

use std::fmt;

use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

use super::config::ConversionConfig;
use super::document::RawDocument;
use super::price::{PriceCandidate, TaxResolution};

/// Sentinel written in place of a value that could not be extracted.
pub const NOT_AVAILABLE: &str = "N/A";

/// A field value that may legitimately be absent.
///
/// Serializes as the bare value, or as the string `"N/A"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Extracted<T> {
    Found(T),
    NotAvailable,
}

impl<T> Extracted<T> {
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }
}

impl<T> From<Option<T>> for Extracted<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Self::Found(v),
            None => Self::NotAvailable,
        }
    }
}

impl<T: fmt::Display> fmt::Display for Extracted<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Found(v) => v.fmt(f),
            Self::NotAvailable => f.write_str(NOT_AVAILABLE),
        }
    }
}

impl<T: Serialize> Serialize for Extracted<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Found(v) => v.serialize(serializer),
            Self::NotAvailable => serializer.serialize_str(NOT_AVAILABLE),
        }
    }
}

#[derive(Deserialize)]
enum Sentinel {
    #[serde(rename = "N/A")]
    NotAvailable,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ExtractedRepr<T> {
    Sentinel(Sentinel),
    Found(T),
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Extracted<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match ExtractedRepr::deserialize(deserializer)? {
            ExtractedRepr::Sentinel(Sentinel::NotAvailable) => Self::NotAvailable,
            ExtractedRepr::Found(v) => Self::Found(v),
        })
    }
}

/// Detail of how the yen price was chosen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBreakdown {
    /// The candidate that won selection.
    pub candidate: PriceCandidate,

    /// Tax adjustment applied to it.
    pub tax: TaxResolution,

    /// How many candidates competed in the winning tier.
    pub competing: usize,
}

/// Name and yen price, without conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extraction {
    pub product_name: Extracted<String>,
    pub price_jpy: Extracted<u64>,
    /// Id of the profile the rules came from.
    pub profile: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breakdown: Option<PriceBreakdown>,
}

/// Final quotation for one document.
///
/// `price_local` is derived from `price_jpy` at construction and cannot be
/// set independently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Quotation {
    product_name: Extracted<String>,
    price_jpy: Extracted<u64>,
    #[serde(rename = "price_twd")]
    price_local: Extracted<u64>,
    profile: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    breakdown: Option<PriceBreakdown>,
    raw: RawDocument,
}

impl Quotation {
    /// Build a quotation, converting the yen price with `conversion`.
    pub fn new(extraction: Extraction, conversion: &ConversionConfig, raw: RawDocument) -> Self {
        let price_local = match extraction.price_jpy {
            Extracted::Found(jpy) => conversion.convert(jpy).into(),
            Extracted::NotAvailable => Extracted::NotAvailable,
        };

        // A conversion that cannot be represented voids the yen price too,
        // so the pair is always both known or both N/A.
        let price_jpy = if price_local.is_found() {
            extraction.price_jpy
        } else {
            Extracted::NotAvailable
        };

        Self {
            product_name: extraction.product_name,
            price_jpy,
            price_local,
            profile: extraction.profile,
            breakdown: extraction.breakdown,
            raw,
        }
    }

    pub fn product_name(&self) -> &Extracted<String> {
        &self.product_name
    }

    pub fn price_jpy(&self) -> Extracted<u64> {
        self.price_jpy.clone()
    }

    /// Converted local-currency price (TWD with the default configuration).
    pub fn price_twd(&self) -> Extracted<u64> {
        self.price_local.clone()
    }

    pub fn profile(&self) -> &str {
        &self.profile
    }

    pub fn breakdown(&self) -> Option<&PriceBreakdown> {
        self.breakdown.as_ref()
    }

    pub fn raw(&self) -> &RawDocument {
        &self.raw
    }
}
