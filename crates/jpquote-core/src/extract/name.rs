//! Product name heuristics.

use regex::Regex;
use tracing::debug;

use crate::models::config::NameFallback;
use crate::models::quotation::Extracted;

use super::patterns::{BARE_PRICE, URL, URL_ANYWHERE};
use super::profile::SourceProfile;

/// Locates the most plausible product-name line under one profile.
pub struct NameExtractor<'p> {
    profile: &'p SourceProfile,
}

impl<'p> NameExtractor<'p> {
    pub fn new(profile: &'p SourceProfile) -> Self {
        Self { profile }
    }

    /// Whether a single line is acceptable as a product name.
    ///
    /// The line must be longer than the profile minimum, free of noise
    /// phrases, and not a URL. A line holding only a price is skipped;
    /// a name that merely mentions an amount is kept.
    pub fn is_candidate(&self, line: &str) -> bool {
        let line = line.trim();
        line.chars().count() > self.profile.name_rule().min_length
            && !self.profile.is_noise(line)
            && !URL.is_match(line)
            && !BARE_PRICE.is_match(line)
    }

    /// Pick the product name from ordered lines.
    pub fn extract<S: AsRef<str>>(&self, lines: &[S]) -> Extracted<String> {
        let lines: Vec<&str> = lines.iter().map(|l| l.as_ref()).collect();

        if let Some(line) = lines.iter().find(|l| self.is_candidate(l)) {
            return Extracted::Found(line.trim().to_string());
        }

        for fallback in &self.profile.name_rule().fallbacks {
            if let Some(name) = self.apply_fallback(fallback, &lines) {
                debug!("Product name from fallback {:?} in profile {}", fallback, self.profile.id());
                return Extracted::Found(name);
            }
        }

        debug!("No product name found in profile {}", self.profile.id());
        Extracted::NotAvailable
    }

    fn apply_fallback(&self, fallback: &NameFallback, lines: &[&str]) -> Option<String> {
        match fallback {
            NameFallback::BeforeFirstPrice => {
                let index = lines.iter().position(|l| self.profile.is_price_line(l))?;
                previous_non_empty(lines, index)
            }
            NameFallback::AfterMarker { marker } => {
                let marker = case_insensitive(marker)?;
                let (index, found) = lines
                    .iter()
                    .enumerate()
                    .find_map(|(i, l)| marker.find(l).map(|m| (i, m)))?;
                let after = lines[index][found.end()..].trim();
                if after.is_empty() {
                    next_non_empty(lines, index)
                } else {
                    Some(after.to_string())
                }
            }
            NameFallback::AfterSeparator { separator } => {
                let index = lines.iter().position(|l| l.contains(separator.as_str()))?;
                next_non_empty(lines, index)
            }
            NameFallback::BeforeDelimiter { delimiter } => lines
                .iter()
                .find_map(|l| l.split_once(delimiter.as_str()))
                .map(|(before, _)| before.trim())
                .filter(|before| !before.is_empty())
                .map(str::to_string),
            NameFallback::BeforeUrl { marker } => {
                let marker = marker.to_lowercase();
                let index = lines.iter().position(|l| {
                    URL_ANYWHERE
                        .find_iter(l)
                        .any(|url| url.as_str().to_lowercase().contains(&marker))
                })?;
                previous_non_empty(lines, index)
            }
        }
    }
}

fn case_insensitive(marker: &str) -> Option<Regex> {
    if marker.is_empty() {
        return None;
    }
    Regex::new(&format!("(?i){}", regex::escape(marker))).ok()
}

fn previous_non_empty(lines: &[&str], index: usize) -> Option<String> {
    lines[..index]
        .iter()
        .rev()
        .map(|l| l.trim())
        .find(|l| !l.is_empty())
        .map(str::to_string)
}

fn next_non_empty(lines: &[&str], index: usize) -> Option<String> {
    lines
        .iter()
        .skip(index + 1)
        .map(|l| l.trim())
        .find(|l| !l.is_empty())
        .map(str::to_string)
}
