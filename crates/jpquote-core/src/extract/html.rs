//! HTML product pages.
//!
//! Selector rules are tried first; the visible text of the page is the
//! fallback input for the line-based heuristics.

use scraper::{ElementRef, Html, Selector};

use crate::models::config::SelectorRule;
use crate::models::price::PriceCandidate;

use super::patterns::{HORIZONTAL_SPACE, NUMERIC_RUN};
use super::profile::SourceProfile;
use super::tokenizer::normalize_amount;

/// Elements whose content is never visible text.
const SKIPPED: &[&str] = &["script", "style", "noscript", "template", "svg", "iframe"];

/// Elements that start a new line of text.
const BLOCKS: &[&str] = &[
    "address", "article", "aside", "blockquote", "dd", "div", "dl", "dt", "footer", "form", "h1",
    "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main", "nav", "ol", "p", "section",
    "table", "td", "th", "title", "tr", "ul",
];

/// A parsed HTML document.
pub struct HtmlPage {
    document: Html,
}

impl HtmlPage {
    pub fn parse(html: &str) -> Self {
        Self {
            document: Html::parse_document(html),
        }
    }

    /// Visible text, one block per line, whitespace collapsed, empty lines dropped.
    pub fn visible_text(&self) -> String {
        let mut raw = String::new();
        collect_text(self.document.root_element(), &mut raw);

        raw.lines()
            .map(|line| HORIZONTAL_SPACE.replace_all(line, " ").trim().to_string())
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Trimmed, non-empty values of every element matching the rule.
    pub fn select_values(&self, rule: &SelectorRule) -> Vec<String> {
        let Ok(selector) = Selector::parse(&rule.selector) else {
            return Vec::new();
        };

        self.document
            .select(&selector)
            .filter_map(|el| match &rule.attr {
                Some(attr) => el.value().attr(attr).map(str::to_string),
                None => Some(el.text().collect::<String>()),
            })
            .map(|value| HORIZONTAL_SPACE.replace_all(value.trim(), " ").into_owned())
            .filter(|value| !value.is_empty())
            .collect()
    }

    /// The first name selector hit that is not noise under `profile`.
    pub fn name(&self, profile: &SourceProfile) -> Option<String> {
        profile
            .html()
            .name_selectors
            .iter()
            .flat_map(|rule| self.select_values(rule))
            .find(|value| !profile.is_noise(value))
    }

    /// Price candidates from the first price selector that yields any.
    ///
    /// Each hit contributes the first numeric run of its value; the selector
    /// index is the candidate tier.
    pub fn price_candidates(&self, profile: &SourceProfile) -> Vec<PriceCandidate> {
        for (tier, rule) in profile.html().price_selectors.iter().enumerate() {
            let candidates: Vec<PriceCandidate> = self
                .select_values(rule)
                .into_iter()
                .enumerate()
                .filter_map(|(index, value)| {
                    let cleaned = profile.clean_line(&value);
                    let amount = NUMERIC_RUN
                        .find(&cleaned)
                        .and_then(|m| normalize_amount(m.as_str()))?;
                    Some(PriceCandidate {
                        amount,
                        tax_kind: rule.tax_kind,
                        source_line: value.clone(),
                        position: index,
                        tier,
                    })
                })
                .collect();

            if !candidates.is_empty() {
                return candidates;
            }
        }

        Vec::new()
    }
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(child_element) = ElementRef::wrap(child) {
            let name = child_element.value().name();
            if SKIPPED.contains(&name) {
                continue;
            }
            if name == "br" {
                out.push('\n');
                continue;
            }

            let block = BLOCKS.contains(&name);
            if block {
                out.push('\n');
            }
            collect_text(child_element, out);
            if block {
                out.push('\n');
            }
        } else if let Some(text) = child.value().as_text() {
            out.push_str(text);
        }
    }
}
