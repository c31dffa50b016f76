//! Keyword and pattern tables, compiled once into an immutable [`Ruleset`].
//!
//! The raw lists come from [`TablesConfig`] with the built-in defaults below
//! filling any table the config leaves out. After compilation nothing is
//! mutated, so a `Ruleset` can be shared across threads without locking.

use std::collections::{BTreeMap, BTreeSet};

use regex::Regex;

use crate::config::{RadarConfig, TablesConfig, TextMode, ThresholdTable, Weight};
use crate::core::{error::RadarError, signal::codes};

const SHORTENERS: &[&str] = &[
    "bit.ly",
    "bl.ink",
    "buff.ly",
    "cutt.ly",
    "goo.gl",
    "is.gd",
    "ow.ly",
    "rb.gy",
    "rebrand.ly",
    "s.id",
    "shorturl.at",
    "t.co",
    "t.ly",
    "tiny.cc",
    "tinyurl.com",
];

const SUSPICIOUS_TLDS: &[&str] = &[
    "cf", "click", "ga", "gq", "icu", "live", "ml", "monster", "mov", "site", "tk", "top", "work",
    "xyz", "zip",
];

const URL_KEYWORDS: &[&str] = &[
    "login", "signin", "verify", "verifica", "secure", "account", "update", "aggiorna", "confirm",
    "password", "bank", "banca", "billing", "wallet", "unlock", "webscr", "auth", "support",
];

const BRAND_TERMS: &[&str] = &[
    "paypal",
    "amazon",
    "apple",
    "microsoft",
    "google",
    "netflix",
    "facebook",
    "instagram",
    "whatsapp",
    "poste",
    "intesa",
    "unicredit",
    "dhl",
    "fedex",
];

const OFFICIAL_DOMAINS: &[&str] = &[
    "paypal.com",
    "amazon.com",
    "amazon.it",
    "apple.com",
    "microsoft.com",
    "google.com",
    "netflix.com",
    "facebook.com",
    "instagram.com",
    "whatsapp.com",
    "poste.it",
    "intesasanpaolo.com",
    "unicredit.it",
    "dhl.com",
    "fedex.com",
];

const SENSITIVE_TERMS: &[&str] = &[
    "password",
    "credentials",
    "credenziali",
    "otp",
    "pin",
    "cvv",
    "code",
    "codice",
    "card",
    "carta",
    "iban",
    "data",
    "dati",
];

const URGENCY_TERMS: &[&str] = &[
    "blocked", "suspended", "urgent", "verify", "update", "confirm", "bloccat", "sospes",
    "verific", "aggiorn", "conferm",
];

const RED_FLAGS: &[&str] = &[
    "gift card",
    "bitcoin",
    "crypto",
    "wire transfer",
    "western union",
    "prize",
    "winner",
    "lottery",
    "refund",
    "inheritance",
    "click here",
    "limited time",
    "act now",
    "congratulations",
    "customs fee",
    "delivery failed",
    "tax refund",
    "investment",
    "guaranteed",
];

const THREAT_PHRASES: &[&str] = &[
    "legal action",
    "arrest",
    "police",
    "lawsuit",
    "final notice",
    "penalty",
    "account will be closed",
    "within 24 hours",
    "permanently deleted",
    "debt collection",
];

const DOMAIN_BLACKLIST: &[&str] = &[
    "secure-banca-login.xyz",
    "secure-banca-verifica-login.xyz",
    "banca-verifica-login.xyz",
];

const DOMAIN_KEYWORDS: &[&str] = &[
    "login", "verify", "verifica", "secure", "security", "update", "aggiorna", "account", "auth",
    "bank", "banca",
];

const LINK_PATTERN: &str = r#"(?i)(?:https?://|www\.)[^\s<>()\[\]"']+"#;
const PHONE_PATTERN: &str = r"\+?\d(?:[ .\-]?\d){8,14}";

/// Built-in weight of every weighted rule.
pub fn default_weights() -> BTreeMap<String, Weight> {
    [
        (codes::NOT_HTTPS, Weight::flat(15)),
        (codes::AT_IN_AUTHORITY, Weight::flat(25)),
        (codes::IP_HOST, Weight::flat(30)),
        (codes::PUNYCODE, Weight::flat(20)),
        (codes::MANY_SUBDOMAINS, Weight::flat(15)),
        (codes::MANY_HYPHENS, Weight::flat(10)),
        (codes::LONG_URL, Weight::flat(10)),
        (codes::SHORTENER, Weight::flat(20)),
        (codes::SUSPICIOUS_KEYWORDS, Weight::capped(5, 25)),
        (codes::SUSPICIOUS_TLD, Weight::flat(15)),
        (codes::BRAND_BAIT, Weight::flat(15)),
        (codes::LINK, Weight::flat(15)),
        (codes::CREDENTIALS_REQUEST, Weight::flat(20)),
        (codes::URGENCY_THREAT, Weight::flat(20)),
        (codes::DANGEROUS_COMBO, Weight::flat(25)),
        (codes::PHISHING_PATTERN, Weight::flat(20)),
        (codes::RED_FLAGS, Weight::capped(5, 45)),
        (codes::THREAT_PHRASES, Weight::capped(10, 25)),
        (codes::DOMAIN_REPUTATION, Weight::flat(25)),
        (codes::NO_EXIF, Weight::flat(10)),
        (codes::LOW_RES, Weight::flat(8)),
        (codes::LOW_DETAIL, Weight::flat(10)),
    ]
    .into_iter()
    .map(|(code, w)| (code.to_string(), w))
    .collect()
}

/// Case-insensitive terms matched at a word start, kept in table order.
#[derive(Debug, Clone)]
pub struct KeywordList {
    entries: Vec<(String, Regex)>,
}

impl KeywordList {
    fn compile(terms: &[String]) -> Result<Self, RadarError> {
        let mut entries = Vec::with_capacity(terms.len());
        for term in terms {
            let pattern = format!(r"(?i)\b{}", regex::escape(term));
            entries.push((term.clone(), Regex::new(&pattern)?));
        }
        Ok(Self { entries })
    }

    /// Distinct terms present in `text`, in table order.
    pub fn hits(&self, text: &str) -> Vec<String> {
        self.entries
            .iter()
            .filter(|(_, re)| re.is_match(text))
            .map(|(term, _)| term.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct Ruleset {
    pub shorteners: BTreeSet<String>,
    pub suspicious_tlds: BTreeSet<String>,
    pub url_keywords: Vec<String>,
    pub brand_terms: Vec<String>,
    pub official_domains: Vec<String>,
    pub sensitive_terms: KeywordList,
    pub urgency_terms: KeywordList,
    pub red_flags: KeywordList,
    pub threat_phrases: KeywordList,
    pub domain_blacklist: BTreeSet<String>,
    /// Longest keyword first, then alphabetical, so the reported keyword
    /// does not depend on config order.
    pub domain_keywords: Vec<String>,
    pub link_pattern: Regex,
    pub phone_pattern: Regex,
    pub thresholds: ThresholdTable,
    pub text_mode: TextMode,
    pub lookalike_max_distance: usize,
    weights: BTreeMap<String, Weight>,
}

impl Ruleset {
    pub fn from_config(cfg: &RadarConfig) -> Result<Self, RadarError> {
        let t: &TablesConfig = &cfg.tables;

        let mut weights = default_weights();
        for (code, w) in &cfg.weights {
            if !weights.contains_key(code) {
                tracing::warn!("weight override for unknown rule {code}");
            }
            weights.insert(code.clone(), *w);
        }

        let mut domain_keywords = table(&t.domain_keywords, DOMAIN_KEYWORDS);
        domain_keywords.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        domain_keywords.dedup();

        Ok(Self {
            shorteners: table(&t.shorteners, SHORTENERS).into_iter().collect(),
            suspicious_tlds: table(&t.suspicious_tlds, SUSPICIOUS_TLDS)
                .into_iter()
                .map(|tld| tld.trim_start_matches('.').to_string())
                .collect(),
            url_keywords: ordered_unique(table(&t.url_keywords, URL_KEYWORDS)),
            brand_terms: ordered_unique(table(&t.brand_terms, BRAND_TERMS)),
            official_domains: ordered_unique(table(&t.official_domains, OFFICIAL_DOMAINS)),
            sensitive_terms: KeywordList::compile(&ordered_unique(table(
                &t.sensitive_terms,
                SENSITIVE_TERMS,
            )))?,
            urgency_terms: KeywordList::compile(&ordered_unique(table(
                &t.urgency_terms,
                URGENCY_TERMS,
            )))?,
            red_flags: KeywordList::compile(&ordered_unique(table(&t.red_flags, RED_FLAGS)))?,
            threat_phrases: KeywordList::compile(&ordered_unique(table(
                &t.threat_phrases,
                THREAT_PHRASES,
            )))?,
            domain_blacklist: table(&t.domain_blacklist, DOMAIN_BLACKLIST)
                .into_iter()
                .collect(),
            domain_keywords,
            link_pattern: Regex::new(LINK_PATTERN)?,
            phone_pattern: Regex::new(PHONE_PATTERN)?,
            thresholds: cfg.thresholds.clone(),
            text_mode: cfg.text_mode,
            lookalike_max_distance: cfg.lookalike_max_distance,
            weights,
        })
    }

    pub fn weight(&self, code: &str) -> Weight {
        self.weights
            .get(code)
            .copied()
            .unwrap_or(Weight::flat(0))
    }

    pub fn is_shortener(&self, host: &str) -> bool {
        self.shorteners.contains(host)
            || host
                .strip_prefix("www.")
                .is_some_and(|bare| self.shorteners.contains(bare))
    }

    /// True when `host` is an official brand domain or one of its subdomains.
    pub fn is_official(&self, host: &str) -> bool {
        self.official_domains.iter().any(|official| {
            host == official
                || host
                    .strip_suffix(official.as_str())
                    .is_some_and(|prefix| prefix.ends_with('.'))
        })
    }
}

fn table(configured: &Option<Vec<String>>, builtin: &[&str]) -> Vec<String> {
    match configured {
        Some(list) => list
            .iter()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect(),
        None => builtin.iter().map(|s| s.to_string()).collect(),
    }
}

fn ordered_unique(items: Vec<String>) -> Vec<String> {
    let mut seen = BTreeSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> Ruleset {
        Ruleset::from_config(&RadarConfig::default()).unwrap()
    }

    #[test]
    fn domain_keywords_sorted_longest_first() {
        let rules = rules();
        assert_eq!(rules.domain_keywords.first().map(String::as_str), Some("aggiorna"));
        let login = rules.domain_keywords.iter().position(|k| k == "login");
        let bank = rules.domain_keywords.iter().position(|k| k == "bank");
        assert!(login < bank);
    }

    #[test]
    fn keyword_list_matches_word_starts_only() {
        let rules = rules();
        let hits = rules
            .urgency_terms
            .hits("Your account was BLOCKED, please verifying now");
        assert_eq!(hits, vec!["blocked".to_string(), "verify".to_string()]);
        assert!(rules.sensitive_terms.hits("the barcode scanner").is_empty());
    }

    #[test]
    fn config_tables_replace_builtins() {
        let mut cfg = RadarConfig::default();
        cfg.tables.shorteners = Some(vec![" Tiny.Example ".into()]);
        cfg.tables.suspicious_tlds = Some(vec![".zz".into()]);
        cfg.weights.insert(codes::LINK.into(), Weight::flat(10));
        let rules = Ruleset::from_config(&cfg).unwrap();
        assert!(rules.is_shortener("tiny.example"));
        assert!(!rules.is_shortener("bit.ly"));
        assert!(rules.suspicious_tlds.contains("zz"));
        assert_eq!(rules.weight(codes::LINK), Weight::flat(10));
        assert_eq!(rules.weight(codes::SHORTENER), Weight::flat(20));
    }

    #[test]
    fn official_domain_and_subdomains() {
        let rules = rules();
        assert!(rules.is_official("paypal.com"));
        assert!(rules.is_official("www.paypal.com"));
        assert!(!rules.is_official("mypaypal.com"));
        assert!(!rules.is_official("paypal.com.evil.xyz"));
    }
}
