//! Data models.

pub mod config;
pub mod document;
pub mod price;
pub mod quotation;

pub use config::{ConversionConfig, ProfileConfig, QuoteConfig, TaxConfig};
pub use document::{RawDocument, SourceHint};
pub use price::{PriceCandidate, TaxKind, TaxResolution};
pub use quotation::{Extracted, Extraction, PriceBreakdown, Quotation, NOT_AVAILABLE};
