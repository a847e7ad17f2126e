//! Configuration structures for the quotation engine.
//!
//! Everything here is plain serde data. [`QuotationEngine::from_config`]
//! compiles it once into the immutable profile table used at runtime.
//!
//! [`QuotationEngine::from_config`]: crate::QuotationEngine::from_config

use std::path::Path;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::extract::patterns::{
    PRICE_LABEL_PATTERN, TAX_AMOUNT_ANNOTATION, TAX_EXCLUDED_PATTERN, TAX_INCLUDED_PATTERN,
    YEN_SUFFIX_PATTERN, YEN_SYMBOL_PATTERN,
};
use crate::models::document::SourceHint;
use crate::models::price::TaxKind;

/// Main configuration for the quotation engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuoteConfig {
    /// Yen to local currency conversion.
    pub conversion: ConversionConfig,

    /// Consumption tax handling.
    pub tax: TaxConfig,

    /// Site profiles in dispatch priority order.
    pub profiles: Vec<ProfileConfig>,

    /// Profile used when no other profile matches.
    pub generic: ProfileConfig,
}

impl Default for QuoteConfig {
    fn default() -> Self {
        Self {
            conversion: ConversionConfig::default(),
            tax: TaxConfig::default(),
            profiles: builtin_profiles(),
            generic: generic_profile(),
        }
    }
}

impl QuoteConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// Currency conversion rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    /// Local currency units per yen.
    pub rate: Decimal,

    /// Local currency code, for display.
    pub currency: String,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            rate: Decimal::new(35, 2),
            currency: "TWD".to_string(),
        }
    }
}

impl ConversionConfig {
    /// Convert whole yen to whole local units, always rounding up.
    ///
    /// Returns `None` when the result does not fit, never a partial value.
    pub fn convert(&self, jpy: u64) -> Option<u64> {
        Decimal::from(jpy)
            .checked_mul(self.rate)
            .map(|v| v.ceil())
            .and_then(|v| v.to_u64())
    }
}

/// Consumption tax configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TaxConfig {
    /// Rate applied to tax-exclusive prices when the document states none.
    pub default_rate_percent: u32,
}

impl Default for TaxConfig {
    fn default() -> Self {
        Self {
            default_rate_percent: 10,
        }
    }
}

/// One content source and its extraction rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileConfig {
    /// Unique profile id.
    pub id: String,

    /// How documents from this source are recognized.
    pub detection: DetectionConfig,

    /// Lines containing any of these are never product names.
    pub noise_phrases: Vec<String>,

    /// Price patterns in priority order.
    pub price_rules: Vec<PriceRuleConfig>,

    /// Patterns removed from each line before price tokenizing.
    pub ignore_patterns: Vec<String>,

    /// Product name heuristics.
    pub name_rule: NameRuleConfig,

    /// CSS selectors for HTML documents.
    pub html: HtmlRuleConfig,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            id: String::new(),
            detection: DetectionConfig::default(),
            noise_phrases: common_noise(),
            price_rules: Vec::new(),
            ignore_patterns: vec![TAX_AMOUNT_ANNOTATION.to_string()],
            name_rule: NameRuleConfig::default(),
            html: HtmlRuleConfig::default(),
        }
    }
}

/// Detection rule: case-insensitive keyword test against text or origin URL.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Any keyword found in the text or the URL selects the profile.
    pub keywords: Vec<String>,

    /// Restrict the profile to one kind of document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_hint: Option<SourceHint>,
}

/// A price pattern and the tax classification of its matches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceRuleConfig {
    /// Regex; the first participating capture group is the amount.
    pub pattern: String,

    #[serde(default)]
    pub tax_kind: TaxKind,
}

impl PriceRuleConfig {
    pub fn new(pattern: &str, tax_kind: TaxKind) -> Self {
        Self {
            pattern: pattern.to_string(),
            tax_kind,
        }
    }
}

/// Product name heuristics.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NameRuleConfig {
    /// A name must be strictly longer than this many characters.
    pub min_length: usize,

    /// Structural rules tried in order when no clean line is found.
    pub fallbacks: Vec<NameFallback>,
}

impl Default for NameRuleConfig {
    fn default() -> Self {
        Self {
            min_length: 5,
            fallbacks: Vec::new(),
        }
    }
}

/// Structural fallback for locating the product name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NameFallback {
    /// The line immediately preceding the first price-bearing line.
    BeforeFirstPrice,
    /// Text after the marker on its line, else the next non-empty line.
    AfterMarker { marker: String },
    /// The first non-empty line after a line containing the separator.
    AfterSeparator { separator: String },
    /// Text before the delimiter on the first line containing it.
    BeforeDelimiter { delimiter: String },
    /// The line immediately preceding a URL containing the marker.
    BeforeUrl { marker: String },
}

/// CSS selectors used for HTML documents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HtmlRuleConfig {
    /// Tried in order; the first non-empty hit is the name.
    pub name_selectors: Vec<SelectorRule>,

    /// Tried in order; the first selector yielding an amount wins.
    pub price_selectors: Vec<SelectorRule>,
}

/// A CSS selector and where to read its value from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorRule {
    pub selector: String,

    /// Attribute to read instead of the element text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attr: Option<String>,

    #[serde(default)]
    pub tax_kind: TaxKind,
}

impl SelectorRule {
    pub fn text(selector: &str) -> Self {
        Self {
            selector: selector.to_string(),
            attr: None,
            tax_kind: TaxKind::Unknown,
        }
    }

    pub fn attr(selector: &str, attr: &str) -> Self {
        Self {
            selector: selector.to_string(),
            attr: Some(attr.to_string()),
            tax_kind: TaxKind::Unknown,
        }
    }
}

fn common_noise() -> Vec<String> {
    [
        "税込",
        "税抜",
        "税別",
        "購入",
        "カート",
        "お気に入り",
        "ポイント",
        "送料無料",
        "セール",
        "SALE",
        "utm_",
        "ref=",
        "http",
        "www.",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn with_markers(markers: &[&str]) -> Vec<String> {
    let mut noise = common_noise();
    noise.extend(markers.iter().map(|s| s.to_string()));
    noise
}

fn keywords(words: &[&str]) -> Vec<String> {
    words.iter().map(|s| s.to_string()).collect()
}

/// Tagged prices first, then symbol-prefixed, then `円`-suffixed.
fn standard_price_rules() -> Vec<PriceRuleConfig> {
    vec![
        PriceRuleConfig::new(TAX_INCLUDED_PATTERN, TaxKind::Inclusive),
        PriceRuleConfig::new(TAX_EXCLUDED_PATTERN, TaxKind::Exclusive),
        PriceRuleConfig::new(YEN_SYMBOL_PATTERN, TaxKind::Unknown),
        PriceRuleConfig::new(YEN_SUFFIX_PATTERN, TaxKind::Unknown),
    ]
}

/// The built-in site profiles, in dispatch priority order.
pub fn builtin_profiles() -> Vec<ProfileConfig> {
    let mut biccamera_rules = vec![PriceRuleConfig::new(PRICE_LABEL_PATTERN, TaxKind::Unknown)];
    biccamera_rules.extend(standard_price_rules());

    vec![
        ProfileConfig {
            id: "biccamera".to_string(),
            detection: DetectionConfig {
                keywords: keywords(&["biccamera", "ビックカメラ"]),
                source_hint: Some(SourceHint::Ocr),
            },
            noise_phrases: with_markers(&["biccamera", "ビックカメラ"]),
            price_rules: biccamera_rules,
            name_rule: NameRuleConfig {
                min_length: 5,
                fallbacks: vec![
                    NameFallback::AfterSeparator {
                        separator: "|".to_string(),
                    },
                    NameFallback::BeforeDelimiter {
                        delimiter: " x ".to_string(),
                    },
                    NameFallback::BeforeUrl {
                        marker: "biccamera".to_string(),
                    },
                ],
            },
            ..Default::default()
        },
        ProfileConfig {
            id: "matsukiyo".to_string(),
            detection: DetectionConfig {
                keywords: keywords(&["matsukiyo", "マツキヨ", "マツモトキヨシ"]),
                source_hint: Some(SourceHint::Ocr),
            },
            noise_phrases: with_markers(&["matsukiyo", "マツキヨ", "マツモトキヨシ"]),
            price_rules: standard_price_rules(),
            name_rule: NameRuleConfig {
                min_length: 5,
                fallbacks: vec![NameFallback::AfterMarker {
                    marker: "matsukiyo".to_string(),
                }],
            },
            ..Default::default()
        },
        ProfileConfig {
            id: "godzilla".to_string(),
            detection: DetectionConfig {
                keywords: keywords(&["godzilla.store", "ゴジラ・ストア"]),
                source_hint: Some(SourceHint::Ocr),
            },
            noise_phrases: with_markers(&["godzilla", "ゴジラ・ストア"]),
            price_rules: vec![
                PriceRuleConfig::new(YEN_SYMBOL_PATTERN, TaxKind::Unknown),
                PriceRuleConfig::new(YEN_SUFFIX_PATTERN, TaxKind::Unknown),
            ],
            name_rule: NameRuleConfig {
                min_length: 6,
                fallbacks: vec![NameFallback::BeforeFirstPrice],
            },
            ..Default::default()
        },
        ProfileConfig {
            id: "amazon".to_string(),
            detection: DetectionConfig {
                keywords: keywords(&["amazon.co.jp"]),
                source_hint: Some(SourceHint::Html),
            },
            price_rules: vec![PriceRuleConfig::new(YEN_SYMBOL_PATTERN, TaxKind::Unknown)],
            html: HtmlRuleConfig {
                name_selectors: vec![SelectorRule::text("#productTitle")],
                price_selectors: vec![SelectorRule::text(".a-price .a-offscreen")],
            },
            ..Default::default()
        },
        ProfileConfig {
            id: "rakuten".to_string(),
            detection: DetectionConfig {
                keywords: keywords(&["rakuten.co.jp"]),
                source_hint: Some(SourceHint::Html),
            },
            price_rules: vec![PriceRuleConfig::new(YEN_SUFFIX_PATTERN, TaxKind::Unknown)],
            html: HtmlRuleConfig {
                name_selectors: vec![
                    SelectorRule::text(".item-name"),
                    SelectorRule::text("h1"),
                    SelectorRule::attr("meta[property='og:title']", "content"),
                ],
                price_selectors: vec![
                    SelectorRule::attr("meta[itemprop='price']", "content"),
                    SelectorRule::attr("#priceCalculationConfig", "data-price"),
                    SelectorRule::attr("input#ratPrice", "value"),
                ],
            },
            ..Default::default()
        },
        ProfileConfig {
            id: "yahoo-auctions".to_string(),
            detection: DetectionConfig {
                keywords: keywords(&["auctions.yahoo.co.jp"]),
                source_hint: Some(SourceHint::Html),
            },
            price_rules: vec![PriceRuleConfig::new(YEN_SUFFIX_PATTERN, TaxKind::Unknown)],
            html: HtmlRuleConfig {
                name_selectors: vec![
                    SelectorRule::text(".Product__title"),
                    SelectorRule::text(".ProductTitle__text"),
                ],
                price_selectors: vec![
                    SelectorRule::text(".Price__now"),
                    SelectorRule::text(".ProductPrice__value"),
                    SelectorRule::text(".Price__value"),
                ],
            },
            ..Default::default()
        },
    ]
}

/// The fallback profile: generic currency patterns and a permissive name rule.
pub fn generic_profile() -> ProfileConfig {
    ProfileConfig {
        id: "generic".to_string(),
        price_rules: standard_price_rules(),
        name_rule: NameRuleConfig {
            min_length: 5,
            fallbacks: vec![NameFallback::BeforeFirstPrice],
        },
        ..Default::default()
    }
}
