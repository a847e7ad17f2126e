//! Common regex patterns for Japanese price extraction.
//!
//! The `*_PATTERN` string constants are the building blocks of the built-in
//! profiles; they are compiled per profile when the engine is built. The
//! `lazy_static` regexes are shared by every profile.
//!
//! `\d` is Unicode-aware, so full-width digits (`１２３`) are matched too.

use lazy_static::lazy_static;
use regex::Regex;

/// `77,770円 (税込)`, `1,100円税込`, `税込 ¥1,100`, `税込価格：1,100円`.
///
/// The amount must carry `円` or `¥` unless it follows a `価格` label, so a
/// rate such as `税込 10%` is never an amount.
pub const TAX_INCLUDED_PATTERN: &str = r"(?:(?:[¥￥]\s*(\d[\d,，.]*)|(\d[\d,，.]*)\s*円)\s*[(（]?\s*税込み?\s*(?:[)）]|$)|税込み?\s*[:：]?\s*(?:[¥￥]\s*(\d[\d,，.]*)|(\d[\d,，.]*)\s*円)|税込み?価格\s*[:：]?\s*[¥￥]?\s*(\d[\d,，.]*)(?:[^%％\d,，.]|$))";

/// `70,700円 (税抜)`, `1,000円(税別)`, `税抜 ¥1,000`, `本体価格 1,000円`.
///
/// A bare `本体` is part of many product names and is not a tag.
pub const TAX_EXCLUDED_PATTERN: &str = r"(?:(?:[¥￥]\s*(\d[\d,，.]*)|(\d[\d,，.]*)\s*円)\s*[(（]?\s*(?:税抜き?|税別)\s*(?:[)）]|$)|(?:税抜き?|税別)\s*[:：]?\s*(?:[¥￥]\s*(\d[\d,，.]*)|(\d[\d,，.]*)\s*円)|(?:税抜き?|税別|本体)価格\s*[:：]?\s*[¥￥]?\s*(\d[\d,，.]*)(?:[^%％\d,，.]|$))";

/// `¥19,800`, `￥ 3,980`.
pub const YEN_SYMBOL_PATTERN: &str = r"[¥￥]\s*(\d[\d,，.]*)";

/// `3,980円`.
pub const YEN_SUFFIX_PATTERN: &str = r"(\d[\d,，.]*)\s*円";

/// `価格 77,770円` on a labelled price line.
pub const PRICE_LABEL_PATTERN: &str = r"価格[^\d\n]*(\d[\d,，.]*)\s*円";

/// Tax amount annotations such as `（税 0 円）` or `税120円`; never a price.
pub const TAX_AMOUNT_ANNOTATION: &str = r"[(（]?\s*(?:消費)?税\s*[\d,，]*\s*円\s*[)）]?";

lazy_static! {
    /// Explicit tax rate: digits immediately followed by a percent marker.
    pub static ref TAX_RATE: Regex = Regex::new(r"(\d+)[%％]").unwrap();

    /// First numeric run in a selector hit (`￥19,800`, `19800`).
    pub static ref NUMERIC_RUN: Regex = Regex::new(r"\d[\d,，.]*").unwrap();

    /// A line that is a bare URL or starts with one.
    pub static ref URL: Regex = Regex::new(r"(?i)^\s*(?:https?://|www\.)\S*").unwrap();

    /// A URL anywhere in a line.
    pub static ref URL_ANYWHERE: Regex = Regex::new(r"(?i)(?:https?://|www\.)\S+").unwrap();

    /// A line holding nothing but a price, with optional label and tax tag.
    pub static ref BARE_PRICE: Regex = Regex::new(
        r"^\s*(?:(?:税込み?|税抜き?|税別|本体)?価格|税込み?|税抜き?|税別)?\s*[:：]?\s*[¥￥]?\s*\d[\d,，.]*\s*円?\s*(?:[(（]?\s*(?:税込み?|税抜き?|税別)\s*[)）]?)?\s*$"
    ).unwrap();

    /// Runs of horizontal whitespace, collapsed when flattening HTML.
    pub static ref HORIZONTAL_SPACE: Regex = Regex::new(r"[ \t\u{00a0}\u{3000}]+").unwrap();
}
