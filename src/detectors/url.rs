use serde::{Deserialize, Serialize};

use ::url::{Host, Url};

use crate::core::signal::{codes, RiskLevel, ScoreResult, Signal};
use crate::detectors::{evaluate, listing, Hit, Rule, Ruleset};
use crate::pipeline::normalizer::{normalize_url_input, raw_authority};
use crate::pipeline::scorer::{advice_for, finalize, url_category, MAX_SCORE};

const MIN_LABELS: usize = 4;
const MIN_HYPHENS: usize = 2;
const MAX_LENGTH: usize = 90;

/// Structural features of a parsed URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlFeatures {
    pub scheme: String,
    pub host: String,
    pub path: String,
    pub query: String,
    pub label_count: usize,
    pub hyphen_count: usize,
    pub length: usize,
    pub at_in_authority: bool,
    pub punycode: bool,
    pub ipv4: bool,
    pub ip_literal: bool,
    pub shortener: bool,
    pub keyword_hits: Vec<String>,
    pub suspicious_tld: Option<String>,
    pub brand_hits: Vec<String>,
}

/// Why a URL could not be inspected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlIssue {
    Unparseable(String),
    MissingHost,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UrlVerdict {
    ProbablyOk,
    Suspicious,
    PhishingLike,
}

impl From<RiskLevel> for UrlVerdict {
    fn from(level: RiskLevel) -> Self {
        match level {
            RiskLevel::High => UrlVerdict::PhishingLike,
            RiskLevel::Medium => UrlVerdict::Suspicious,
            RiskLevel::Low | RiskLevel::NoInput => UrlVerdict::ProbablyOk,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UrlReport {
    /// The input as given, without the added scheme.
    pub url: String,
    pub normalized: String,
    pub verdict: UrlVerdict,
    #[serde(flatten)]
    pub result: ScoreResult,
}

pub fn extract_features(normalized: &str, ruleset: &Ruleset) -> Result<UrlFeatures, UrlIssue> {
    let parsed = Url::parse(normalized).map_err(|e| UrlIssue::Unparseable(e.to_string()))?;
    let host = match parsed.host_str() {
        Some(h) if !h.is_empty() => h.to_lowercase(),
        _ => return Err(UrlIssue::MissingHost),
    };

    let ipv4 = matches!(parsed.host(), Some(Host::Ipv4(_)));
    let ip_literal = ipv4 || matches!(parsed.host(), Some(Host::Ipv6(_)));
    let bare_host = host.trim_end_matches('.');
    let path = parsed.path().to_lowercase();
    let query = parsed.query().unwrap_or_default().to_lowercase();

    let haystack = format!("{host} {path} {query}");
    let keyword_hits: Vec<String> = ruleset
        .url_keywords
        .iter()
        .filter(|kw| haystack.contains(kw.as_str()))
        .cloned()
        .collect();

    let suspicious_tld = if ip_literal {
        None
    } else {
        bare_host
            .rsplit('.')
            .next()
            .filter(|tld| ruleset.suspicious_tlds.contains(*tld))
            .map(str::to_string)
    };

    let brand_hits = if ruleset.is_official(bare_host) {
        Vec::new()
    } else {
        ruleset
            .brand_terms
            .iter()
            .filter(|brand| host.contains(brand.as_str()))
            .cloned()
            .collect()
    };

    Ok(UrlFeatures {
        scheme: parsed.scheme().to_string(),
        label_count: if ip_literal {
            0
        } else {
            bare_host.split('.').count()
        },
        hyphen_count: host.matches('-').count(),
        length: normalized.chars().count(),
        at_in_authority: raw_authority(normalized).contains('@'),
        punycode: host.contains("xn--"),
        shortener: ruleset.is_shortener(bare_host),
        ipv4,
        ip_literal,
        keyword_hits,
        suspicious_tld,
        brand_hits,
        host,
        path,
        query,
    })
}

pub const RULES: &[Rule<UrlFeatures>] = &[
    Rule {
        code: codes::NOT_HTTPS,
        check: |f| (f.scheme != "https").then(|| Hit::once(format!("scheme {} is not https", f.scheme))),
    },
    Rule {
        code: codes::AT_IN_AUTHORITY,
        check: |f| {
            f.at_in_authority
                .then(|| Hit::once(format!("'@' in address hides the real host {}", f.host)))
        },
    },
    Rule {
        code: codes::IP_HOST,
        check: |f| f.ipv4.then(|| Hit::once(format!("host is an IP address ({})", f.host))),
    },
    Rule {
        code: codes::PUNYCODE,
        check: |f| f.punycode.then(|| Hit::once(format!("punycode host {}", f.host))),
    },
    Rule {
        code: codes::MANY_SUBDOMAINS,
        check: |f| {
            (f.label_count >= MIN_LABELS)
                .then(|| Hit::once(format!("{} labels in host {}", f.label_count, f.host)))
        },
    },
    Rule {
        code: codes::MANY_HYPHENS,
        check: |f| {
            (f.hyphen_count >= MIN_HYPHENS)
                .then(|| Hit::once(format!("{} hyphens in host {}", f.hyphen_count, f.host)))
        },
    },
    Rule {
        code: codes::LONG_URL,
        check: |f| {
            (f.length > MAX_LENGTH)
                .then(|| Hit::once(format!("URL is {} characters long", f.length)))
        },
    },
    Rule {
        code: codes::SHORTENER,
        check: |f| f.shortener.then(|| Hit::once(format!("link shortener {}", f.host))),
    },
    Rule {
        code: codes::SUSPICIOUS_KEYWORDS,
        check: |f| {
            (!f.keyword_hits.is_empty()).then(|| {
                Hit::many(
                    f.keyword_hits.len(),
                    format!("suspicious keywords: {}", listing(&f.keyword_hits)),
                )
            })
        },
    },
    Rule {
        code: codes::SUSPICIOUS_TLD,
        check: |f| {
            f.suspicious_tld
                .as_ref()
                .map(|tld| Hit::once(format!("suspicious TLD .{tld}")))
        },
    },
    Rule {
        code: codes::BRAND_BAIT,
        check: |f| {
            (!f.brand_hits.is_empty())
                .then(|| Hit::once(format!("brand name in host: {}", listing(&f.brand_hits))))
        },
    },
];

/// Score a user-supplied URL. Never fails: unparseable input is the
/// worst-case result.
pub fn score(raw: &str, ruleset: &Ruleset) -> UrlReport {
    let input = normalize_url_input(raw);
    let thresholds = &ruleset.thresholds.url;

    let result = match extract_features(&input.normalized, ruleset) {
        Ok(features) => {
            let mut signals = evaluate(RULES, &features, ruleset);
            if signals.is_empty() {
                signals.push(Signal::note(
                    codes::NO_INDICATORS,
                    "no obvious red flags found; this is a low-confidence check, stay cautious",
                ));
            }
            finalize(signals, thresholds, url_category)
        }
        Err(issue) => worst_case(issue, thresholds),
    };

    tracing::debug!(url = %input.display, score = result.score, "url scored");
    UrlReport {
        url: input.display,
        normalized: input.normalized,
        verdict: result.level.into(),
        result,
    }
}

fn worst_case(issue: UrlIssue, thresholds: &crate::config::Thresholds) -> ScoreResult {
    let signal = match issue {
        UrlIssue::Unparseable(detail) => {
            tracing::debug!(%detail, "url parse failed");
            Signal::new(codes::URL_UNPARSEABLE, MAX_SCORE, "URL not parseable")
        }
        UrlIssue::MissingHost => Signal::new(codes::MISSING_HOST, MAX_SCORE, "missing domain"),
    };
    let level = thresholds.level(MAX_SCORE);
    let signals = vec![signal];
    ScoreResult {
        score: MAX_SCORE,
        level,
        category: url_category(&signals).to_string(),
        advice: advice_for(level),
        signals,
    }
}
