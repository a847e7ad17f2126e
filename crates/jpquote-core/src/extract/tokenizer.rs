//! Price tokenizing.

use tracing::trace;

use crate::models::price::PriceCandidate;

use super::profile::{PriceRule, SourceProfile};

/// Parse a raw amount such as `19,800`, `1.980` or `１９,８００` into whole yen.
///
/// Grouping separators and decimal points are stripped, not interpreted.
/// Returns `None` when no digit remains or the value does not fit.
pub fn normalize_amount(raw: &str) -> Option<u64> {
    let digits: String = raw
        .chars()
        .filter_map(|c| match c {
            '0'..='9' => Some(c),
            '０'..='９' => char::from_u32(c as u32 - '０' as u32 + '0' as u32),
            _ => None,
        })
        .collect();

    if digits.is_empty() {
        return None;
    }

    digits.parse().ok()
}

/// Lines of `text` with their byte offsets, line terminators removed.
pub(crate) fn lines_with_offsets(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.split_inclusive('\n').scan(0usize, |offset, raw| {
        let start = *offset;
        *offset += raw.len();
        Some((start, raw.trim_end_matches(['\r', '\n'])))
    })
}

/// Scans text for price candidates under one profile.
pub struct PriceTokenizer<'p> {
    profile: &'p SourceProfile,
}

impl<'p> PriceTokenizer<'p> {
    pub fn new(profile: &'p SourceProfile) -> Self {
        Self { profile }
    }

    /// The first rule, in profile order, that yields a usable amount on any
    /// line of `text`. Matches whose amount does not fit are ignored.
    pub fn winning_rule(&self, text: &str) -> Option<(usize, &'p PriceRule)> {
        let profile = self.profile;
        profile.price_rules().iter().enumerate().find(|(_, rule)| {
            text.lines().any(|line| {
                rule.amounts(&profile.clean_line(line))
                    .any(|(_, raw)| normalize_amount(raw).is_some())
            })
        })
    }

    /// Lazily yield every candidate of the winning rule, in line order.
    pub fn tokenize<'t>(&self, text: &'t str) -> impl Iterator<Item = PriceCandidate> + 't
    where
        'p: 't,
    {
        let profile = self.profile;
        let winner = self.winning_rule(text);

        if let Some((tier, rule)) = winner {
            trace!(
                "Profile {} price rule {} wins ({})",
                profile.id(),
                tier,
                rule.tax_kind().as_str()
            );
        }

        winner.into_iter().flat_map(move |(tier, rule)| {
            lines_with_offsets(text).flat_map(move |(offset, line)| {
                let cleaned = profile.clean_line(line);
                rule.amounts(&cleaned)
                    .filter_map(|(start, raw)| {
                        normalize_amount(raw).map(|amount| PriceCandidate {
                            amount,
                            tax_kind: rule.tax_kind(),
                            source_line: line.trim().to_string(),
                            position: offset + start,
                            tier,
                        })
                    })
                    .collect::<Vec<_>>()
            })
        })
    }
}
