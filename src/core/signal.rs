use serde::{Deserialize, Serialize};

/// One fired heuristic rule. `code` names the rule, `evidence` the concrete
/// value that made it fire.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Signal {
    pub code: String,
    pub weight: u32,
    pub evidence: String,
}

impl Signal {
    pub fn new(code: impl Into<String>, weight: u32, evidence: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            weight,
            evidence: evidence.into(),
        }
    }

    /// Zero-weight signal used to carry an informational reason.
    pub fn note(code: impl Into<String>, evidence: impl Into<String>) -> Self {
        Self::new(code, 0, evidence)
    }
}

/// Coarse risk tier. `NoInput` only appears for blank text and sorts below `Low`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    #[serde(rename = "enter_text")]
    NoInput,
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::NoInput => "enter_text",
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

/// Aggregate outcome of one scoring call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScoreResult {
    pub score: u32,
    pub level: RiskLevel,
    pub signals: Vec<Signal>,
    pub category: String,
    pub advice: Vec<String>,
}

impl ScoreResult {
    pub fn has(&self, code: &str) -> bool {
        self.signals.iter().any(|s| s.code == code)
    }

    /// Evidence strings in rule-evaluation order.
    pub fn reasons(&self) -> Vec<&str> {
        self.signals.iter().map(|s| s.evidence.as_str()).collect()
    }
}

pub mod codes {
    pub const NO_INDICATORS: &str = "NO_INDICATORS";
    pub const EMPTY_INPUT: &str = "EMPTY_INPUT";

    pub const URL_UNPARSEABLE: &str = "URL_UNPARSEABLE";
    pub const MISSING_HOST: &str = "MISSING_HOST";
    pub const NOT_HTTPS: &str = "NOT_HTTPS";
    pub const AT_IN_AUTHORITY: &str = "AT_IN_AUTHORITY";
    pub const IP_HOST: &str = "IP_HOST";
    pub const PUNYCODE: &str = "PUNYCODE";
    pub const MANY_SUBDOMAINS: &str = "MANY_SUBDOMAINS";
    pub const MANY_HYPHENS: &str = "MANY_HYPHENS";
    pub const LONG_URL: &str = "LONG_URL";
    pub const SHORTENER: &str = "SHORTENER";
    pub const SUSPICIOUS_KEYWORDS: &str = "SUSPICIOUS_KEYWORDS";
    pub const SUSPICIOUS_TLD: &str = "SUSPICIOUS_TLD";
    pub const BRAND_BAIT: &str = "BRAND_BAIT";

    pub const LINK: &str = "LINK";
    pub const CREDENTIALS_REQUEST: &str = "CREDENTIALS_REQUEST";
    pub const URGENCY_THREAT: &str = "URGENCY_THREAT";
    pub const DANGEROUS_COMBO: &str = "DANGEROUS_COMBO";
    pub const PHISHING_PATTERN: &str = "PHISHING_PATTERN";
    pub const RED_FLAGS: &str = "RED_FLAGS";
    pub const THREAT_PHRASES: &str = "THREAT_PHRASES";
    pub const DOMAIN_REPUTATION: &str = "DOMAIN_BLACKLIST_OR_SUSPICIOUS";

    pub const NO_EXIF: &str = "NO_EXIF";
    pub const LOW_RES: &str = "LOW_RES";
    pub const LOW_DETAIL: &str = "LOW_DETAIL";
}
