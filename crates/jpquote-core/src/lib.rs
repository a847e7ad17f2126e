//! Core library for Japanese product price quotation.
//!
//! This crate provides:
//! - Source profiles with keyword dispatch (Bic Camera, Matsumoto Kiyoshi, Godzilla Store, Amazon, Rakuten, Yahoo! Auctions)
//! - Price tokenizing over OCR text and CSS selector extraction over HTML pages
//! - Consumption tax resolution for tax-exclusive prices
//! - Yen to TWD conversion with round-up semantics

pub mod engine;
pub mod error;
pub mod extract;
pub mod models;

pub use engine::{QuotationEngine, select_candidate};
pub use error::{ConfigError, QuoteError, Result};
pub use extract::{HtmlPage, NameExtractor, PriceTokenizer, ProfileSet, SourceProfile, TaxResolver};
pub use models::config::{ConversionConfig, ProfileConfig, QuoteConfig, TaxConfig};
pub use models::document::{RawDocument, SourceHint};
pub use models::price::{PriceCandidate, TaxKind, TaxResolution};
pub use models::quotation::{Extracted, Extraction, NOT_AVAILABLE, PriceBreakdown, Quotation};
