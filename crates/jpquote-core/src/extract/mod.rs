//! Rule-based field extraction for Japanese product pages.

pub mod html;
pub mod name;
pub mod patterns;
pub mod profile;
pub mod tax;
pub mod tokenizer;

pub use html::HtmlPage;
pub use name::NameExtractor;
pub use profile::{DetectionRule, PriceRule, ProfileSet, SourceProfile};
pub use tax::{calculate_inclusive, extract_tax_rates, find_tax_rate, TaxResolver};
pub use tokenizer::{normalize_amount, PriceTokenizer};
