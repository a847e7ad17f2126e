//! Quotation engine: profile dispatch, extraction and conversion.

use std::borrow::Cow;
use std::time::Instant;

use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::error::{ConfigError, QuoteError, Result};
use crate::extract::{HtmlPage, NameExtractor, PriceTokenizer, ProfileSet, SourceProfile, TaxResolver};
use crate::models::config::{ConversionConfig, QuoteConfig};
use crate::models::document::{RawDocument, SourceHint};
use crate::models::price::PriceCandidate;
use crate::models::quotation::{Extracted, Extraction, PriceBreakdown, Quotation};

/// Pick the winning candidate: lowest tier, then largest amount.
///
/// Equal amounts keep the earliest candidate. Returns the winner and the
/// number of candidates in its tier.
pub fn select_candidate(
    candidates: impl IntoIterator<Item = PriceCandidate>,
) -> Option<(PriceCandidate, usize)> {
    let mut best: Option<PriceCandidate> = None;
    let mut competing = 0;

    for candidate in candidates {
        match &best {
            Some(current) if candidate.tier > current.tier => {}
            Some(current) if candidate.tier == current.tier => {
                competing += 1;
                if candidate.amount > current.amount {
                    best = Some(candidate);
                }
            }
            _ => {
                best = Some(candidate);
                competing = 1;
            }
        }
    }

    best.map(|b| (b, competing))
}

/// Turns raw documents into quotations.
///
/// Holds only immutable configuration, so one engine can be shared across
/// threads.
#[derive(Debug, Clone)]
pub struct QuotationEngine {
    profiles: ProfileSet,
    tax: TaxResolver,
    conversion: ConversionConfig,
}

impl QuotationEngine {
    /// Compile the configuration into an engine.
    pub fn from_config(config: &QuoteConfig) -> Result<Self> {
        if config.conversion.rate <= Decimal::ZERO {
            return Err(ConfigError::InvalidRate(config.conversion.rate.to_string()).into());
        }

        let profiles = ProfileSet::from_config(config)?;
        debug!(
            "Compiled {} profiles: {}",
            profiles.iter().count(),
            profiles.iter().map(|p| p.id()).collect::<Vec<_>>().join(", ")
        );

        Ok(Self {
            profiles,
            tax: TaxResolver::new(config.tax.default_rate_percent),
            conversion: config.conversion.clone(),
        })
    }

    pub fn profiles(&self) -> &ProfileSet {
        &self.profiles
    }

    pub fn conversion(&self) -> &ConversionConfig {
        &self.conversion
    }

    /// Select the profile for a document.
    pub fn dispatch(&self, document: &RawDocument) -> &SourceProfile {
        self.profiles.dispatch(document)
    }

    /// Produce a quotation for a document.
    ///
    /// Missing name or price degrade to `"N/A"`; only an empty document is
    /// an error.
    pub fn quote(&self, document: RawDocument) -> Result<Quotation> {
        let start = Instant::now();
        info!(
            "Quoting {} document of {} bytes",
            document.source_hint.as_str(),
            document.text.len()
        );

        let profile = self.dispatch(&document);
        let extraction = self.extract_with(&document, profile)?;
        let quotation = Quotation::new(extraction, &self.conversion, document);

        debug!(
            "Quoted {} / {} JPY / {} {} via {} in {:?}",
            quotation.product_name(),
            quotation.price_jpy(),
            quotation.price_twd(),
            self.conversion.currency,
            quotation.profile(),
            start.elapsed()
        );

        Ok(quotation)
    }

    /// Extract name and yen price from OCR text.
    ///
    /// With `profile_id` the named profile is used directly; otherwise the
    /// text is dispatched like an OCR document.
    pub fn extract(&self, text: &str, profile_id: Option<&str>) -> Result<Extraction> {
        let document = RawDocument::ocr(text);
        let profile = match profile_id {
            Some(id) => self
                .profiles
                .get(id)
                .ok_or_else(|| QuoteError::UnknownProfile(id.to_string()))?,
            None => self.dispatch(&document),
        };
        self.extract_with(&document, profile)
    }

    /// Run the extraction pipeline for a document under `profile`.
    pub fn extract_with(&self, document: &RawDocument, profile: &SourceProfile) -> Result<Extraction> {
        if document.is_blank() {
            return Err(QuoteError::InputUnreadable("document is empty".to_string()));
        }

        let (text, selected_name, selected_prices) = match document.source_hint {
            SourceHint::Ocr => (Cow::Borrowed(document.text.as_str()), None, Vec::new()),
            SourceHint::Html => {
                let page = HtmlPage::parse(&document.text);
                let name = page.name(profile);
                let prices = page.price_candidates(profile);
                let text = page.visible_text();

                if text.is_empty() && name.is_none() && prices.is_empty() {
                    return Err(QuoteError::InputUnreadable(
                        "HTML document has no visible text".to_string(),
                    ));
                }
                (Cow::Owned(text), name, prices)
            }
        };

        let product_name = match selected_name {
            Some(name) => Extracted::Found(name),
            None => {
                let lines: Vec<&str> = text.lines().collect();
                NameExtractor::new(profile).extract(&lines)
            }
        };

        let selected = if selected_prices.is_empty() {
            select_candidate(PriceTokenizer::new(profile).tokenize(&text))
        } else {
            select_candidate(selected_prices)
        };

        let breakdown = selected.and_then(|(candidate, competing)| {
            let tax = self.tax.resolve(&candidate, &text)?;
            Some(PriceBreakdown {
                candidate,
                tax,
                competing,
            })
        });

        if breakdown.is_none() {
            debug!("No price found under profile {}", profile.id());
        }

        Ok(Extraction {
            product_name,
            price_jpy: breakdown.as_ref().map(|b| b.tax.amount).into(),
            profile: profile.id().to_string(),
            breakdown,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::price::TaxKind;
    use pretty_assertions::assert_eq;

    fn engine() -> QuotationEngine {
        QuotationEngine::from_config(&QuoteConfig::default()).unwrap()
    }

    fn quote(text: &str) -> Quotation {
        engine().quote(RawDocument::ocr(text)).unwrap()
    }

    fn candidate(amount: u64, tier: usize, position: usize) -> PriceCandidate {
        PriceCandidate {
            amount,
            tax_kind: TaxKind::Unknown,
            source_line: String::new(),
            position,
            tier,
        }
    }

    #[test]
    fn test_select_candidate() {
        let (best, competing) = select_candidate(vec![
            candidate(500, 1, 0),
            candidate(300, 0, 1),
            candidate(900, 0, 2),
            candidate(900, 0, 3),
        ])
        .unwrap();
        assert_eq!(best.amount, 900);
        assert_eq!(best.position, 2);
        assert_eq!(competing, 3);

        assert!(select_candidate(Vec::new()).is_none());
    }

    #[test]
    fn test_conversion_property() {
        let q = quote("ワイヤレスマウス MX Master\n¥19,800");
        assert_eq!(q.price_jpy(), Extracted::Found(19800));
        assert_eq!(q.price_twd(), Extracted::Found(6930));

        let q = quote("駄菓子 うまい棒 10本\n¥1");
        assert_eq!(q.price_twd(), Extracted::Found(1));

        for p in [0u64, 1, 2, 3, 99, 1000, 12345, 77770, 999_999] {
            let q = quote(&format!("テスト商品です\n¥{}", p));
            let expected = (p * 35).div_ceil(100);
            assert_eq!(q.price_twd(), Extracted::Found(expected), "p = {}", p);
        }
    }

    #[test]
    fn test_quote_is_idempotent() {
        let doc = RawDocument::ocr("ビックカメラ\nソニー ヘッドホン WH-1000XM5\n価格 49,500円\n10%ポイント");
        let engine = engine();
        let first = engine.quote(doc.clone()).unwrap();
        let second = engine.quote(doc).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_tax_resolution_through_engine() {
        let q = quote("無印良品 ノート A5サイズ\n1,000円 (税抜)\n消費税率 10%");
        assert_eq!(q.price_jpy(), Extracted::Found(1100));

        let q = quote("無印良品 ノート A5サイズ\n1,000円 (税抜)");
        assert_eq!(q.price_jpy(), Extracted::Found(1100));
        let tax = q.breakdown().unwrap().tax;
        assert_eq!(tax.pre_tax, 1000);
        assert!(!tax.rate_explicit);

        let q = quote("無印良品 ノート A5サイズ\n1,000円 (税込)");
        assert_eq!(q.price_jpy(), Extracted::Found(1000));
    }

    #[test]
    fn test_tie_break_selects_largest() {
        let q = quote("福袋セット お楽しみ\n¥1000\n¥2000");
        assert_eq!(q.price_jpy(), Extracted::Found(2000));
        assert_eq!(q.breakdown().unwrap().competing, 2);

        let q = quote("福袋セット お楽しみ\n¥1000 ¥2000");
        assert_eq!(q.price_jpy(), Extracted::Found(2000));
    }

    #[test]
    fn test_base_unit_in_name_is_not_a_price_tag() {
        let q = quote("Nintendo Switch 本体 2024年モデル\n¥32,978");
        assert_eq!(q.product_name(), &Extracted::Found("Nintendo Switch 本体 2024年モデル".to_string()));
        assert_eq!(q.price_jpy(), Extracted::Found(32978));
    }

    #[test]
    fn test_stated_rate_is_not_a_price() {
        let q = quote("ソニー ヘッドホン WH-1000XM5\n¥49,500\n税込 10%");
        assert_eq!(q.price_jpy(), Extracted::Found(49500));
    }

    #[test]
    fn test_name_containing_yen_amount() {
        let q = quote("100円ショップ 収納ケース 大\n¥1,980");
        assert_eq!(q.product_name(), &Extracted::Found("100円ショップ 収納ケース 大".to_string()));
        assert_eq!(q.price_jpy(), Extracted::Found(1980));
    }

    #[test]
    fn test_overflowing_amount_falls_through_to_next_rule() {
        let q = quote("テスト商品です\n¥99999999999999999999999\n1,000円");
        assert_eq!(q.price_jpy(), Extracted::Found(1000));
        assert_eq!(q.price_twd(), Extracted::Found(350));
    }

    #[test]
    fn test_free_shipping_line_never_name() {
        let q = quote("送料無料 今だけ全品対象のとても長いキャンペーン告知\nシャープ 加湿空気清浄機\n¥29,800");
        assert_eq!(q.product_name(), &Extracted::Found("シャープ 加湿空気清浄機".to_string()));
    }

    #[test]
    fn test_no_match_degrades_to_not_available() {
        let q = quote("在庫切れ\nお問い合わせください");
        assert_eq!(q.price_jpy(), Extracted::NotAvailable);
        assert_eq!(q.price_twd(), Extracted::NotAvailable);
        assert!(q.breakdown().is_none());
        assert_eq!(q.profile(), "generic");
    }

    #[test]
    fn test_empty_document_is_unreadable() {
        let engine = engine();
        assert!(matches!(
            engine.quote(RawDocument::ocr("")),
            Err(QuoteError::InputUnreadable(_))
        ));
        assert!(matches!(
            engine.quote(RawDocument::ocr(" \n\t")),
            Err(QuoteError::InputUnreadable(_))
        ));
        assert!(matches!(
            engine.quote(RawDocument::html("<html><body></body></html>")),
            Err(QuoteError::InputUnreadable(_))
        ));
    }

    #[test]
    fn test_biccamera_ocr_dump() {
        let text = "\
ビックカメラ.com
Apple AirPods Pro 第2世代 MTJV3J/A
価格 39,800円 (税込)
3,980ポイント(10%還元)
送料無料
カートに入れる";
        let q = quote(text);
        assert_eq!(q.profile(), "biccamera");
        assert_eq!(q.product_name(), &Extracted::Found("Apple AirPods Pro 第2世代 MTJV3J/A".to_string()));
        assert_eq!(q.price_jpy(), Extracted::Found(39800));
        assert_eq!(q.price_twd(), Extracted::Found(13930));
    }

    #[test]
    fn test_matsukiyo_exclusive_price() {
        let text = "matsukiyo\nロキソニンS 12錠\n1,280円 (税抜)\n税率 10%";
        let q = quote(text);
        assert_eq!(q.profile(), "matsukiyo");
        assert_eq!(q.product_name(), &Extracted::Found("ロキソニンS 12錠".to_string()));
        assert_eq!(q.price_jpy(), Extracted::Found(1408));
    }

    #[test]
    fn test_godzilla_price() {
        let text = "ゴジラ・ストア\nゴジラ ソフビ 2024\n￥3,300\nお気に入り";
        let q = quote(text);
        assert_eq!(q.profile(), "godzilla");
        assert_eq!(q.product_name(), &Extracted::Found("ゴジラ ソフビ 2024".to_string()));
        assert_eq!(q.price_jpy(), Extracted::Found(3300));
        assert_eq!(q.price_twd(), Extracted::Found(1155));
    }

    #[test]
    fn test_amazon_html() {
        let html = r#"<html><body>
            <span id="productTitle"> Anker PowerCore 10000 </span>
            <span class="a-price"><span class="a-offscreen">￥2,990</span></span>
            </body></html>"#;
        let doc = RawDocument::html(html).with_origin("https://www.amazon.co.jp/dp/B0000");
        let q = engine().quote(doc).unwrap();
        assert_eq!(q.profile(), "amazon");
        assert_eq!(q.product_name(), &Extracted::Found("Anker PowerCore 10000".to_string()));
        assert_eq!(q.price_jpy(), Extracted::Found(2990));
        assert_eq!(q.price_twd(), Extracted::Found(1047));
    }

    #[test]
    fn test_yahoo_html_ignores_tax_annotation() {
        let html = r#"<html><body>
            <h1 class="ProductTitle__text">レトロゲーム機 本体 セット</h1>
            <dd class="Price__value">1,000円（税 0 円）</dd>
            </body></html>"#;
        let doc = RawDocument::html(html).with_origin("https://page.auctions.yahoo.co.jp/jp/auction/x1");
        let q = engine().quote(doc).unwrap();
        assert_eq!(q.profile(), "yahoo-auctions");
        assert_eq!(q.price_jpy(), Extracted::Found(1000));
    }

    #[test]
    fn test_html_without_selectors_uses_text() {
        let html = "<html><body><h2>タイガー 水筒 600ml</h2><p>価格：¥3,480</p></body></html>";
        let q = engine().quote(RawDocument::html(html)).unwrap();
        assert_eq!(q.profile(), "generic");
        assert_eq!(q.product_name(), &Extracted::Found("タイガー 水筒 600ml".to_string()));
        assert_eq!(q.price_jpy(), Extracted::Found(3480));
    }

    #[test]
    fn test_extract_with_profile_id() {
        let engine = engine();
        let extraction = engine.extract("ゴジラ ソフビ 2024\n￥3,300", Some("godzilla")).unwrap();
        assert_eq!(extraction.profile, "godzilla");
        assert_eq!(extraction.price_jpy, Extracted::Found(3300));

        let extraction = engine.extract("ゴジラ ソフビ 2024\n￥3,300", None).unwrap();
        assert_eq!(extraction.profile, "generic");

        assert!(matches!(
            engine.extract("x", Some("nope")),
            Err(QuoteError::UnknownProfile(id)) if id == "nope"
        ));
    }

    #[test]
    fn test_invalid_rate_rejected() {
        let mut config = QuoteConfig::default();
        config.conversion.rate = Decimal::ZERO;
        assert!(matches!(
            QuotationEngine::from_config(&config),
            Err(QuoteError::Config(ConfigError::InvalidRate(_)))
        ));
    }

    #[test]
    fn test_engine_shared_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<QuotationEngine>();

        let engine = engine();
        let engine = &engine;
        let texts = ["商品テスト甲\n¥100", "商品テスト乙\n¥200", "商品テスト丙\n¥300"];
        let results: Vec<Extracted<u64>> = std::thread::scope(|scope| {
            let handles: Vec<_> = texts
                .iter()
                .map(|t| scope.spawn(move || engine.quote(RawDocument::ocr(*t)).unwrap().price_jpy()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert_eq!(
            results,
            vec![Extracted::Found(100), Extracted::Found(200), Extracted::Found(300)]
        );
    }
}
