//! # Product Rules
//!
//! Ordered table of `{category, pattern, extractor}` rules. [`extract_mentions`] runs them in
//! order; a span claimed by an earlier rule cannot be matched by a later one. URLs go first so
//! slugs like `/iphone-15` stay part of the company mention, and Galaxy Buds sits ahead of the
//! Galaxy phone rule.
//!
//! Keys are `brand_model1_model2`, lowercased, with separators collapsed and trailing
//! separators trimmed (`"iPhone 15 Pro"` → `iphone_15_pro`).

use std::ops::Range;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::types::ProductCategory;

/// Hosts that are never treated as a company mention.
pub const DOMAIN_DENYLIST: &[&str] = &[
    "google.com",
    "youtube.com",
    "youtu.be",
    "facebook.com",
    "twitter.com",
    "x.com",
    "instagram.com",
    "reddit.com",
    "wikipedia.org",
    "tiktok.com",
    "linkedin.com",
    "bit.ly",
    "t.co",
];

/// Brand/model parts produced by a rule's extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductParts {
    pub brand: String,
    pub model: String,
    /// Display name; defaults to `brand model`.
    pub full_name: Option<String>,
    pub url: Option<String>,
}

/// One product rule.
pub struct ProductRule {
    pub name: &'static str,
    pub category: ProductCategory,
    pub pattern: Regex,
    pub extract: fn(&Captures<'_>) -> Option<ProductParts>,
}

impl ProductRule {
    fn new(
        name: &'static str,
        category: ProductCategory,
        pattern: &str,
        extract: fn(&Captures<'_>) -> Option<ProductParts>,
    ) -> Self {
        Self {
            name,
            category,
            pattern: Regex::new(pattern).expect("valid product regex"),
            extract,
        }
    }

    /// All matches of this rule alone, ignoring span claims.
    pub fn matches(&self, text: &str) -> Vec<ExtractedMention> {
        self.pattern
            .captures_iter(text)
            .filter_map(|caps| self.to_mention(&caps))
            .collect()
    }

    fn to_mention(&self, caps: &Captures<'_>) -> Option<ExtractedMention> {
        let whole = caps.get(0)?;
        let parts = (self.extract)(caps)?;
        let full_name = parts.full_name.unwrap_or_else(|| {
            format!("{} {}", parts.brand, parts.model).trim().to_string()
        });
        Some(ExtractedMention {
            key: product_key(&parts.brand, &parts.model),
            brand: parts.brand,
            model: parts.model,
            category: self.category,
            full_name,
            url: parts.url,
            span: whole.start()..whole.end(),
        })
    }
}

/// A product found in one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedMention {
    pub key: String,
    pub brand: String,
    pub model: String,
    pub category: ProductCategory,
    pub full_name: String,
    pub url: Option<String>,
    /// Byte range in the message.
    pub span: Range<usize>,
}

pub static PRODUCT_RULES: LazyLock<Vec<ProductRule>> = LazyLock::new(|| {
    use ProductCategory::*;
    vec![
        ProductRule::new(
            "company_url",
            Company,
            r#"(?i)\bhttps?://[^\s<>"']+"#,
            company_from_url,
        ),
        ProductRule::new(
            "airpods",
            Headphones,
            r"(?i)\bairpods(?:\s+(pro|max)\b)?(?:\s+(\d)\b)?",
            |c| Some(parts("AirPods", &[group(c, 1), group(c, 2)])),
        ),
        ProductRule::new(
            "sony_1000xm",
            Headphones,
            r"(?i)\bsony\s+(wh|wf)[-\s]?1000\s?xm(\d)\b",
            |c| {
                let model = format!("{}-1000XM{}", group(c, 1).to_uppercase(), group(c, 2));
                Some(parts("Sony", &[&model]))
            },
        ),
        ProductRule::new(
            "bose",
            Headphones,
            r"(?i)\bbose\s+(quietcomfort|qc|nc|soundlink)\s*(ultra|\d+)?\b",
            |c| Some(parts("Bose", &[group(c, 1), group(c, 2)])),
        ),
        ProductRule::new(
            "beats",
            Headphones,
            r"(?i)\bbeats\s+(studio|solo|fit|flex|powerbeats)(?:\s*(pro|buds|\d+)\b)?",
            |c| Some(parts("Beats", &[group(c, 1), group(c, 2)])),
        ),
        ProductRule::new(
            "galaxy_buds",
            Headphones,
            r"(?i)\bgalaxy\s+buds(?:\s*(\d|pro|live|fe)\b)?(?:\s+(pro)\b)?",
            |c| Some(parts("Galaxy Buds", &[group(c, 1), group(c, 2)])),
        ),
        ProductRule::new(
            "iphone",
            Phone,
            r"(?i)\biphone(?:\s*(\d{1,2}|se|xr|xs|x)\b)?(?:\s+(pro\s+max|pro|plus|max|mini)\b)?",
            |c| Some(parts("iPhone", &[group(c, 1), group(c, 2)])),
        ),
        ProductRule::new(
            "pixel",
            Phone,
            r"(?i)\bpixel\s*(\d{1,2}a?)\b(?:\s+(pro\s+xl|pro|xl|fold)\b)?",
            |c| Some(parts("Pixel", &[group(c, 1), group(c, 2)])),
        ),
        ProductRule::new(
            "galaxy",
            Phone,
            r"(?i)\bgalaxy\s+(s\d{1,2}|z\s*fold\s*\d?|z\s*flip\s*\d?|a\d{1,2}|note\s*\d{1,2})(?:\s*(ultra|plus|fe)\b)?",
            |c| Some(parts("Galaxy", &[group(c, 1), group(c, 2)])),
        ),
        ProductRule::new(
            "oneplus",
            Phone,
            r"(?i)\bone\s?plus\s*(\d{1,2}t?|nord\s*\d?)\b(?:\s+(pro)\b)?",
            |c| Some(parts("OnePlus", &[group(c, 1), group(c, 2)])),
        ),
    ]
});

static COLOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(black|white|silver|gold|blue|red|green|purple|pink|yellow|orange|gray|grey|graphite|midnight|starlight|titanium)\b",
    )
    .expect("valid regex")
});

/// Runs the rule table over `text`. Result is in text order, one entry per key.
pub fn extract_mentions(text: &str) -> Vec<ExtractedMention> {
    let mut claimed: Vec<Range<usize>> = Vec::new();
    let mut found: Vec<ExtractedMention> = Vec::new();

    for rule in PRODUCT_RULES.iter() {
        for caps in rule.pattern.captures_iter(text) {
            let Some(whole) = caps.get(0) else { continue };
            let span = whole.start()..whole.end();
            if claimed.iter().any(|c| c.start < span.end && span.start < c.end) {
                continue;
            }
            if let Some(mention) = rule.to_mention(&caps) {
                claimed.push(span);
                found.push(mention);
            }
        }
    }

    found.sort_by_key(|m| m.span.start);
    let mut seen = std::collections::HashSet::new();
    found.retain(|m| seen.insert(m.key.clone()));
    found
}

/// First color word in `text`, lowercased.
pub fn extract_color(text: &str) -> Option<String> {
    COLOR.find(text).map(|m| m.as_str().to_lowercase())
}

/// `brand_model1_model2`, lowercased; runs of separators collapse to one `_`.
pub fn product_key(brand: &str, model: &str) -> String {
    let raw = format!("{}_{}", brand, model).to_lowercase();
    let mut key = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c.is_alphanumeric() {
            key.push(c);
        } else if !key.ends_with('_') && !key.is_empty() {
            key.push('_');
        }
    }
    key.trim_end_matches('_').to_string()
}

fn group<'t>(caps: &Captures<'t>, i: usize) -> &'t str {
    caps.get(i).map_or("", |m| m.as_str())
}

fn parts(brand: &str, model_parts: &[&str]) -> ProductParts {
    let model = model_parts
        .iter()
        .flat_map(|p| p.split_whitespace())
        .map(title_case)
        .collect::<Vec<_>>()
        .join(" ");
    ProductParts {
        brand: brand.to_string(),
        model,
        full_name: None,
        url: None,
    }
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn company_from_url(caps: &Captures<'_>) -> Option<ProductParts> {
    let raw = caps.get(0)?.as_str().trim_end_matches(['.', ',', ')', '!', '?']);
    let parsed = url::Url::parse(raw).ok()?;
    let host = parsed.host_str()?.to_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host).to_string();

    if DOMAIN_DENYLIST
        .iter()
        .any(|d| host == *d || host.ends_with(&format!(".{}", d)))
    {
        return None;
    }

    let brand = host.split('.').next()?.to_string();
    if brand.is_empty() {
        return None;
    }
    Some(ProductParts {
        brand,
        model: String::new(),
        full_name: Some(host),
        url: Some(raw.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(name: &str) -> &'static ProductRule {
        PRODUCT_RULES
            .iter()
            .find(|r| r.name == name)
            .expect("rule exists")
    }

    #[test]
    fn iphone_rule_extracts_model_and_variant() {
        let found = rule("iphone").matches("thinking about the iphone 15 pro max tbh");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].key, "iphone_15_pro_max");
        assert_eq!(found[0].full_name, "iPhone 15 Pro Max");
        assert_eq!(found[0].category, ProductCategory::Phone);
    }

    #[test]
    fn pixel_rule_requires_a_number() {
        assert!(rule("pixel").matches("pixel art is cool").is_empty());
        let found = rule("pixel").matches("Pixel 8 Pro");
        assert_eq!(found[0].key, "pixel_8_pro");
    }

    #[test]
    fn sony_rule_normalizes_model() {
        let found = rule("sony_1000xm").matches("the Sony WH-1000XM5 are great");
        assert_eq!(found[0].model, "WH-1000XM5");
        assert_eq!(found[0].key, "sony_wh_1000xm5");
    }

    #[test]
    fn galaxy_buds_claims_span_before_galaxy_phone() {
        let found = extract_mentions("Galaxy Buds 2 with my Galaxy S24 Ultra");
        let keys: Vec<&str> = found.iter().map(|m| m.key.as_str()).collect();
        assert_eq!(keys, vec!["galaxy_buds_2", "galaxy_s24_ultra"]);
        assert_eq!(found[0].category, ProductCategory::Headphones);
        assert_eq!(found[1].category, ProductCategory::Phone);
    }

    #[test]
    fn company_rule_parses_domain_and_skips_denylist() {
        let found = extract_mentions("look https://www.bestbuy.com/site/pixel-8 and https://youtube.com/watch?v=1");
        assert_eq!(found.len(), 1);
        let company = &found[0];
        assert_eq!(company.category, ProductCategory::Company);
        assert_eq!(company.key, "bestbuy");
        assert_eq!(company.full_name, "bestbuy.com");
        assert_eq!(company.url.as_deref(), Some("https://www.bestbuy.com/site/pixel-8"));
    }

    #[test]
    fn duplicate_keys_in_one_message_collapse() {
        let found = extract_mentions("AirPods Pro or AirPods Pro? airpods max");
        let keys: Vec<&str> = found.iter().map(|m| m.key.as_str()).collect();
        assert_eq!(keys, vec!["airpods_pro", "airpods_max"]);
    }

    #[test]
    fn key_normalization() {
        assert_eq!(product_key("iPhone", ""), "iphone");
        assert_eq!(product_key("Galaxy Buds", "Pro"), "galaxy_buds_pro");
        assert_eq!(product_key("OnePlus", "12  Pro"), "oneplus_12_pro");
    }

    #[test]
    fn color_is_first_color_word() {
        assert_eq!(extract_color("the Blue one, not black").as_deref(), Some("blue"));
        assert_eq!(extract_color("no colors here"), None);
    }
}
