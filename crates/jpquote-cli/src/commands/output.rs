//! Output formatting for quotations.

use serde::Serialize;

use jpquote_core::{Extracted, Quotation, TaxResolution};

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

/// The printable part of a quotation; the raw document is left out.
#[derive(Debug, Serialize)]
pub struct QuoteRecord<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<&'a str>,
    pub product_name: &'a Extracted<String>,
    pub price_jpy: Extracted<u64>,
    pub price_twd: Extracted<u64>,
    pub currency: &'a str,
    pub profile: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax: Option<TaxResolution>,
}

impl<'a> QuoteRecord<'a> {
    pub fn new(quotation: &'a Quotation, currency: &'a str) -> Self {
        Self {
            source: quotation.raw().origin_url.as_deref(),
            product_name: quotation.product_name(),
            price_jpy: quotation.price_jpy(),
            price_twd: quotation.price_twd(),
            currency,
            profile: quotation.profile(),
            tax: quotation.breakdown().map(|b| b.tax).filter(|t| t.is_adjusted()),
        }
    }
}

pub const CSV_HEADER: [&str; 7] = [
    "product_name",
    "price_jpy",
    "price_twd",
    "currency",
    "profile",
    "pre_tax_jpy",
    "tax_rate_percent",
];

/// One CSV row matching [`CSV_HEADER`].
pub fn csv_row(record: &QuoteRecord<'_>) -> [String; 7] {
    [
        record.product_name.to_string(),
        record.price_jpy.to_string(),
        record.price_twd.to_string(),
        record.currency.to_string(),
        record.profile.to_string(),
        record.tax.map(|t| t.pre_tax.to_string()).unwrap_or_default(),
        record
            .tax
            .and_then(|t| t.rate_percent)
            .map(|r| r.to_string())
            .unwrap_or_default(),
    ]
}

pub fn format_quotation(
    quotation: &Quotation,
    currency: &str,
    format: OutputFormat,
) -> anyhow::Result<String> {
    let record = QuoteRecord::new(quotation, currency);
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&record)?),
        OutputFormat::Csv => format_csv(&record),
        OutputFormat::Text => Ok(format_text(&record)),
    }
}

fn format_csv(record: &QuoteRecord<'_>) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(CSV_HEADER)?;
    wtr.write_record(csv_row(record))?;

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(record: &QuoteRecord<'_>) -> String {
    let mut output = String::new();

    output.push_str(&format!("Product: {}\n", record.product_name));
    output.push_str(&format!("Price:   {} JPY\n", record.price_jpy));
    output.push_str(&format!("Quote:   {} {}\n", record.price_twd, record.currency));
    output.push_str(&format!("Profile: {}\n", record.profile));

    if let Some(tax) = record.tax {
        output.push_str(&format!(
            "Tax:     {} JPY before tax, {}% {}\n",
            tax.pre_tax,
            tax.rate_percent.unwrap_or_default(),
            if tax.rate_explicit { "stated" } else { "default" }
        ));
    }

    if let Some(source) = record.source {
        output.push_str(&format!("Source:  {}\n", source));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use jpquote_core::{QuotationEngine, QuoteConfig, RawDocument};

    fn quotation(text: &str) -> Quotation {
        QuotationEngine::from_config(&QuoteConfig::default())
            .unwrap()
            .quote(RawDocument::ocr(text))
            .unwrap()
    }

    #[test]
    fn test_json_output() {
        let q = quotation("ワイヤレスマウス MX Master\n¥19,800");
        let json = format_quotation(&q, "TWD", OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["product_name"], "ワイヤレスマウス MX Master");
        assert_eq!(value["price_jpy"], 19800);
        assert_eq!(value["price_twd"], 6930);
        assert!(value.get("tax").is_none());
        assert!(value.get("raw").is_none());
    }

    #[test]
    fn test_json_not_available() {
        let q = quotation("在庫切れ");
        let json = format_quotation(&q, "TWD", OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["product_name"], "N/A");
        assert_eq!(value["price_twd"], "N/A");
    }

    #[test]
    fn test_csv_output_with_tax() {
        let q = quotation("無印良品 ノート A5サイズ\n1,000円 (税抜)");
        let csv = format_quotation(&q, "TWD", OutputFormat::Csv).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("product_name,price_jpy,price_twd,currency,profile,pre_tax_jpy,tax_rate_percent")
        );
        assert_eq!(lines.next(), Some("無印良品 ノート A5サイズ,1100,385,TWD,generic,1000,10"));
    }

    #[test]
    fn test_text_output() {
        let q = quotation("無印良品 ノート A5サイズ\n1,000円 (税抜)");
        let text = format_quotation(&q, "TWD", OutputFormat::Text).unwrap();
        assert!(text.contains("Price:   1100 JPY"));
        assert!(text.contains("Quote:   385 TWD"));
        assert!(text.contains("10% default"));
    }
}
