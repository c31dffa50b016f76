use crate::config::Thresholds;
use crate::core::signal::{codes, RiskLevel, ScoreResult, Signal};

pub const MAX_SCORE: u32 = 100;

pub const DO_NOT_CLICK: &str = "Do not click the link.";

pub const IMAGE_NOTES: [&str; 3] = [
    "This analysis is not a verdict: these are technical indicators only.",
    "Look for the original source with a reverse image search and check the context.",
    "Recompression (messaging apps, social networks) can strip metadata and reduce quality.",
];

/// Sum of signal weights, capped at [`MAX_SCORE`].
pub fn total(signals: &[Signal]) -> u32 {
    signals
        .iter()
        .fold(0u32, |acc, s| acc.saturating_add(s.weight))
        .min(MAX_SCORE)
}

pub fn aggregate(signals: &[Signal], thresholds: &Thresholds) -> (u32, RiskLevel) {
    let score = total(signals);
    (score, thresholds.level(score))
}

pub fn text_category(signals: &[Signal]) -> &'static str {
    if has(signals, codes::CREDENTIALS_REQUEST) {
        "phishing_link"
    } else if has(signals, codes::URGENCY_THREAT) {
        "account_threat"
    } else {
        "generic_suspicious"
    }
}

pub fn url_category(signals: &[Signal]) -> &'static str {
    const PHISHING: [&str; 6] = [
        codes::URL_UNPARSEABLE,
        codes::MISSING_HOST,
        codes::AT_IN_AUTHORITY,
        codes::IP_HOST,
        codes::PUNYCODE,
        codes::BRAND_BAIT,
    ];
    if PHISHING.iter().any(|code| has(signals, code)) {
        "phishing_link"
    } else if has(signals, codes::SHORTENER) {
        "hidden_link"
    } else if signals.iter().any(|s| s.weight > 0) {
        "generic_suspicious"
    } else {
        "url_check"
    }
}

pub fn image_category(level: RiskLevel) -> &'static str {
    match level {
        RiskLevel::Medium | RiskLevel::High => "deepfake_suspected",
        RiskLevel::NoInput | RiskLevel::Low => "image_check",
    }
}

pub fn advice_for(level: RiskLevel) -> Vec<String> {
    let lines: &[&str] = match level {
        RiskLevel::High => &[
            DO_NOT_CLICK,
            "Never share passwords, OTP codes or card details.",
            "Check directly in the official app or website of the service.",
            "Report the message as spam or phishing.",
        ],
        RiskLevel::Medium => &[
            "Verify through the official website or app, not through links in the message.",
            "Be wary of urgency and pressure.",
        ],
        RiskLevel::Low => &[
            "Stay cautious anyway.",
            "Do not share personal data if you are not sure who the sender is.",
        ],
        RiskLevel::NoInput => &["Paste the message you want to check."],
    };
    lines.iter().map(|s| s.to_string()).collect()
}

pub fn image_notes() -> Vec<String> {
    IMAGE_NOTES.iter().map(|s| s.to_string()).collect()
}

/// Build the final result for a text or URL signal list.
pub fn finalize(
    signals: Vec<Signal>,
    thresholds: &Thresholds,
    category: fn(&[Signal]) -> &'static str,
) -> ScoreResult {
    let (score, level) = aggregate(&signals, thresholds);
    ScoreResult {
        score,
        level,
        category: category(&signals).to_string(),
        advice: advice_for(level),
        signals,
    }
}

/// Fold a combined domain-reputation hit into a text result: one extra
/// signal, level recomputed, category forced to `phishing_link`.
pub fn apply_domain_reputation(
    result: &mut ScoreResult,
    signal: Signal,
    thresholds: &Thresholds,
) {
    result.signals.push(signal);
    let (score, level) = aggregate(&result.signals, thresholds);
    result.score = score;
    if level != result.level {
        result.level = level;
        result.advice = advice_for(level);
    }
    result.category = "phishing_link".to_string();
    if result.advice.first().map(String::as_str) != Some(DO_NOT_CLICK) {
        result.advice.insert(0, DO_NOT_CLICK.to_string());
    }
}

fn has(signals: &[Signal], code: &str) -> bool {
    signals.iter().any(|s| s.code == code)
}
