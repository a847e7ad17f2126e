//! Compiled source profiles and dispatch.

use std::borrow::Cow;
use std::collections::HashSet;

use regex::Regex;
use scraper::Selector;
use tracing::debug;

use crate::error::ConfigError;
use crate::models::config::{
    DetectionConfig, HtmlRuleConfig, NameFallback, ProfileConfig, QuoteConfig, SelectorRule,
};
use crate::models::document::{RawDocument, SourceHint};
use crate::models::price::TaxKind;

/// A compiled price pattern.
#[derive(Debug, Clone)]
pub struct PriceRule {
    regex: Regex,
    tax_kind: TaxKind,
}

impl PriceRule {
    pub fn new(pattern: &str, tax_kind: TaxKind, profile: &str) -> Result<Self, ConfigError> {
        let regex = Regex::new(pattern).map_err(|e| ConfigError::InvalidPattern {
            profile: profile.to_string(),
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;

        if regex.captures_len() < 2 {
            return Err(ConfigError::MissingCapture {
                profile: profile.to_string(),
                pattern: pattern.to_string(),
            });
        }

        Ok(Self { regex, tax_kind })
    }

    pub fn tax_kind(&self) -> TaxKind {
        self.tax_kind
    }

    /// Amount matches in `line` as `(offset, raw amount text)`.
    ///
    /// The amount is the first capture group that participated in the match.
    pub fn amounts<'t>(&'t self, line: &'t str) -> impl Iterator<Item = (usize, &'t str)> + 't {
        self.regex.captures_iter(line).filter_map(|caps| {
            caps.iter()
                .skip(1)
                .flatten()
                .next()
                .map(|m| (m.start(), m.as_str()))
        })
    }
}

/// Case-insensitive keyword test against document text or origin URL.
#[derive(Debug, Clone, Default)]
pub struct DetectionRule {
    keywords: Vec<String>,
    source_hint: Option<SourceHint>,
}

impl DetectionRule {
    pub fn new(config: &DetectionConfig) -> Self {
        Self {
            keywords: config
                .keywords
                .iter()
                .map(|k| k.trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
            source_hint: config.source_hint,
        }
    }

    /// Whether this rule can ever match.
    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn source_hint(&self) -> Option<SourceHint> {
        self.source_hint
    }

    pub fn matches(&self, doc: &RawDocument) -> bool {
        let text = doc.text.to_lowercase();
        let url = doc.origin_url.as_deref().map(str::to_lowercase);
        self.matches_lowered(doc.source_hint, &text, url.as_deref())
    }

    fn matches_lowered(&self, hint: SourceHint, text: &str, url: Option<&str>) -> bool {
        if self.source_hint.is_some_and(|h| h != hint) {
            return false;
        }

        self.keywords
            .iter()
            .any(|k| text.contains(k.as_str()) || url.is_some_and(|u| u.contains(k.as_str())))
    }
}

/// Compiled product-name heuristics.
#[derive(Debug, Clone)]
pub struct NameRule {
    pub min_length: usize,
    pub fallbacks: Vec<NameFallback>,
}

/// Validated CSS selectors for HTML documents.
#[derive(Debug, Clone, Default)]
pub struct HtmlRules {
    pub name_selectors: Vec<SelectorRule>,
    pub price_selectors: Vec<SelectorRule>,
}

impl HtmlRules {
    fn new(config: &HtmlRuleConfig, profile: &str) -> Result<Self, ConfigError> {
        for rule in config.name_selectors.iter().chain(&config.price_selectors) {
            if Selector::parse(&rule.selector).is_err() {
                return Err(ConfigError::InvalidSelector {
                    profile: profile.to_string(),
                    selector: rule.selector.clone(),
                });
            }
        }

        Ok(Self {
            name_selectors: config.name_selectors.clone(),
            price_selectors: config.price_selectors.clone(),
        })
    }
}

/// A named set of extraction rules bound to one content source.
///
/// Built once from configuration and never mutated.
#[derive(Debug, Clone)]
pub struct SourceProfile {
    id: String,
    detection: DetectionRule,
    noise_phrases: Vec<String>,
    price_rules: Vec<PriceRule>,
    ignore_patterns: Vec<Regex>,
    name_rule: NameRule,
    html: HtmlRules,
}

impl SourceProfile {
    /// Compile a profile from its configuration.
    pub fn compile(config: &ProfileConfig) -> Result<Self, ConfigError> {
        let id = config.id.trim().to_string();

        let price_rules = config
            .price_rules
            .iter()
            .map(|r| PriceRule::new(&r.pattern, r.tax_kind, &id))
            .collect::<Result<Vec<_>, _>>()?;

        let ignore_patterns = config
            .ignore_patterns
            .iter()
            .map(|p| {
                Regex::new(p).map_err(|e| ConfigError::InvalidPattern {
                    profile: id.clone(),
                    pattern: p.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let html = HtmlRules::new(&config.html, &id)?;

        Ok(Self {
            detection: DetectionRule::new(&config.detection),
            noise_phrases: config
                .noise_phrases
                .iter()
                .map(|p| p.to_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
            price_rules,
            ignore_patterns,
            name_rule: NameRule {
                min_length: config.name_rule.min_length,
                fallbacks: config.name_rule.fallbacks.clone(),
            },
            html,
            id,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn detection(&self) -> &DetectionRule {
        &self.detection
    }

    pub fn price_rules(&self) -> &[PriceRule] {
        &self.price_rules
    }

    pub fn name_rule(&self) -> &NameRule {
        &self.name_rule
    }

    pub fn html(&self) -> &HtmlRules {
        &self.html
    }

    /// Whether `line` contains any noise phrase (case-insensitive).
    pub fn is_noise(&self, line: &str) -> bool {
        let lowered = line.to_lowercase();
        self.noise_phrases.iter().any(|p| lowered.contains(p.as_str()))
    }

    /// Remove ignored annotations (such as tax amounts) from a line.
    pub fn clean_line<'a>(&self, line: &'a str) -> Cow<'a, str> {
        let mut cleaned = Cow::Borrowed(line);
        for pattern in &self.ignore_patterns {
            if pattern.is_match(&cleaned) {
                cleaned = Cow::Owned(pattern.replace_all(&cleaned, "").into_owned());
            }
        }
        cleaned
    }

    /// Whether any price rule matches the line.
    pub fn is_price_line(&self, line: &str) -> bool {
        let cleaned = self.clean_line(line);
        self.price_rules.iter().any(|r| r.regex.is_match(&cleaned))
    }
}

/// The ordered profile table plus the generic fallback.
#[derive(Debug, Clone)]
pub struct ProfileSet {
    profiles: Vec<SourceProfile>,
    generic: SourceProfile,
}

impl ProfileSet {
    /// Compile every configured profile, rejecting duplicate ids.
    pub fn from_config(config: &QuoteConfig) -> Result<Self, ConfigError> {
        let mut seen = HashSet::new();
        let mut profiles = Vec::with_capacity(config.profiles.len());

        for profile_config in &config.profiles {
            let profile = SourceProfile::compile(profile_config)?;
            if !seen.insert(profile.id.clone()) {
                return Err(ConfigError::DuplicateProfile(profile.id));
            }
            profiles.push(profile);
        }

        let generic = SourceProfile::compile(&config.generic)?;
        if seen.contains(&generic.id) {
            return Err(ConfigError::DuplicateProfile(generic.id));
        }

        Ok(Self { profiles, generic })
    }

    /// Select the profile for a document.
    ///
    /// The first profile whose detection rule matches wins; the generic
    /// profile is returned when none does.
    pub fn dispatch(&self, doc: &RawDocument) -> &SourceProfile {
        let text = doc.text.to_lowercase();
        let url = doc.origin_url.as_deref().map(str::to_lowercase);

        let selected = self
            .profiles
            .iter()
            .find(|p| p.detection.matches_lowered(doc.source_hint, &text, url.as_deref()))
            .unwrap_or(&self.generic);

        debug!("Dispatched {} document to profile {}", doc.source_hint.as_str(), selected.id);
        selected
    }

    /// Look up a profile by id, including the generic one.
    pub fn get(&self, id: &str) -> Option<&SourceProfile> {
        self.iter().find(|p| p.id == id)
    }

    pub fn generic(&self) -> &SourceProfile {
        &self.generic
    }

    /// Profiles in dispatch order, generic last.
    pub fn iter(&self) -> impl Iterator<Item = &SourceProfile> {
        self.profiles.iter().chain(std::iter::once(&self.generic))
    }
}
