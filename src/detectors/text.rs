use serde::{Deserialize, Serialize};

use crate::config::TextMode;
use crate::core::hash::text_fingerprint;
use crate::core::signal::{codes, RiskLevel, ScoreResult, Signal};
use crate::detectors::{apply_combos, evaluate, listing, ComboRule, Hit, Rule, Ruleset};
use crate::pipeline::normalizer::{link_host, normalize_phone, trim_link};
use crate::pipeline::scorer::{advice_for, finalize, text_category};

/// What the text rules look at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextFeatures {
    pub links: Vec<String>,
    pub domains: Vec<String>,
    pub phones: Vec<String>,
    pub shortener_hosts: Vec<String>,
    pub sensitive_hits: Vec<String>,
    pub urgency_hits: Vec<String>,
    pub red_flag_hits: Vec<String>,
    pub threat_hits: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TextReport {
    #[serde(flatten)]
    pub result: ScoreResult,
    pub links: Vec<String>,
    pub domains: Vec<String>,
    pub phones: Vec<String>,
    pub fingerprint: String,
}

pub fn extract_links(text: &str, ruleset: &Ruleset) -> Vec<String> {
    ruleset
        .link_pattern
        .find_iter(text)
        .map(|m| trim_link(m.as_str()).to_string())
        .filter(|link| !link.is_empty())
        .collect()
}

/// Distinct normalized hosts of `links`, in order of first appearance.
pub fn extract_domains(links: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for host in links.iter().filter_map(|link| link_host(link)) {
        if !out.contains(&host) {
            out.push(host);
        }
    }
    out
}

/// Phone-like tokens, normalized and deduplicated. A run of digits that
/// continues into a clock time (`2024-01-01 12:30`) is a timestamp.
pub fn extract_phones(text: &str, ruleset: &Ruleset) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for phone in ruleset
        .phone_pattern
        .find_iter(text)
        .filter(|m| !text[m.end()..].starts_with(':'))
        .filter_map(|m| normalize_phone(m.as_str()))
    {
        if !out.contains(&phone) {
            out.push(phone);
        }
    }
    out
}

pub fn extract_features(text: &str, ruleset: &Ruleset, mode: TextMode) -> TextFeatures {
    let links = extract_links(text, ruleset);
    let domains = extract_domains(&links);
    let shortener_hosts = domains
        .iter()
        .filter(|host| ruleset.is_shortener(host))
        .cloned()
        .collect();
    let (red_flag_hits, threat_hits) = match mode {
        TextMode::Extended => (ruleset.red_flags.hits(text), ruleset.threat_phrases.hits(text)),
        TextMode::Standard => (Vec::new(), Vec::new()),
    };

    TextFeatures {
        phones: extract_phones(text, ruleset),
        sensitive_hits: ruleset.sensitive_terms.hits(text),
        urgency_hits: ruleset.urgency_terms.hits(text),
        shortener_hosts,
        red_flag_hits,
        threat_hits,
        links,
        domains,
    }
}

pub const RULES: &[Rule<TextFeatures>] = &[
    Rule {
        code: codes::LINK,
        check: |f| {
            (!f.links.is_empty()).then(|| Hit::once(format!("{} link(s) in the message", f.links.len())))
        },
    },
    Rule {
        code: codes::SHORTENER,
        check: |f| {
            (!f.shortener_hosts.is_empty())
                .then(|| Hit::once(format!("link shortener: {}", listing(&f.shortener_hosts))))
        },
    },
    Rule {
        code: codes::CREDENTIALS_REQUEST,
        check: |f| {
            (!f.sensitive_hits.is_empty()).then(|| {
                Hit::once(format!("asks for sensitive data: {}", listing(&f.sensitive_hits)))
            })
        },
    },
    Rule {
        code: codes::URGENCY_THREAT,
        check: |f| {
            (!f.urgency_hits.is_empty())
                .then(|| Hit::once(format!("urgency or threat: {}", listing(&f.urgency_hits))))
        },
    },
    Rule {
        code: codes::RED_FLAGS,
        check: |f| {
            (!f.red_flag_hits.is_empty()).then(|| {
                Hit::many(
                    f.red_flag_hits.len(),
                    format!("red flags: {}", listing(&f.red_flag_hits)),
                )
            })
        },
    },
    Rule {
        code: codes::THREAT_PHRASES,
        check: |f| {
            (!f.threat_hits.is_empty()).then(|| {
                Hit::many(
                    f.threat_hits.len(),
                    format!("threatening phrases: {}", listing(&f.threat_hits)),
                )
            })
        },
    },
];

pub const COMBOS: &[ComboRule] = &[
    ComboRule {
        code: codes::DANGEROUS_COMBO,
        requires: &[codes::CREDENTIALS_REQUEST, codes::SHORTENER],
        evidence: "dangerous combination: sensitive data requested behind a shortened link",
    },
    ComboRule {
        code: codes::PHISHING_PATTERN,
        requires: &[codes::LINK, codes::URGENCY_THREAT],
        evidence: "phishing pattern: link together with urgency or threats",
    },
];

/// Score a message body. Domain reputation is folded in by the engine.
pub fn score(text: &str, ruleset: &Ruleset, mode: TextMode) -> TextReport {
    let fingerprint = text_fingerprint(text);
    if text.trim().is_empty() {
        return TextReport {
            result: ScoreResult {
                score: 0,
                level: RiskLevel::NoInput,
                signals: vec![Signal::note(codes::EMPTY_INPUT, "no text provided")],
                category: "empty".to_string(),
                advice: advice_for(RiskLevel::NoInput),
            },
            links: Vec::new(),
            domains: Vec::new(),
            phones: Vec::new(),
            fingerprint,
        };
    }

    let features = extract_features(text, ruleset, mode);
    let mut signals = evaluate(RULES, &features, ruleset);
    apply_combos(&mut signals, COMBOS, ruleset);
    if signals.is_empty() {
        signals.push(Signal::note(
            codes::NO_INDICATORS,
            "no obvious red flags found; stay cautious anyway",
        ));
    }

    let result = finalize(signals, &ruleset.thresholds.text, text_category);
    tracing::debug!(score = result.score, links = features.links.len(), "text scored");
    TextReport {
        result,
        links: features.links,
        domains: features.domains,
        phones: features.phones,
        fingerprint,
    }
}
