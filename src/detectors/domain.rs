use serde::{Deserialize, Serialize};
use strsim::levenshtein;

use crate::detectors::Ruleset;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DomainVerdict {
    pub domain: String,
    pub suspicious: bool,
    pub reason: String,
}

impl DomainVerdict {
    fn clean(domain: String) -> Self {
        Self {
            domain,
            suspicious: false,
            reason: String::new(),
        }
    }

    fn flagged(domain: String, reason: String) -> Self {
        Self {
            domain,
            suspicious: true,
            reason,
        }
    }
}

/// Classify a host: blacklist, then TLD, then keyword, then brand look-alike.
/// The first stage that matches decides the reason.
pub fn check_domain(host: &str, ruleset: &Ruleset) -> DomainVerdict {
    let domain = host.trim().trim_end_matches('.').to_lowercase();
    if domain.is_empty() {
        return DomainVerdict::clean(domain);
    }

    if ruleset.domain_blacklist.contains(&domain) {
        return DomainVerdict::flagged(domain, "blacklisted domain".to_string());
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() >= 2 {
        let tld = labels[labels.len() - 1];
        if ruleset.suspicious_tlds.contains(tld) {
            let reason = format!("suspicious TLD .{tld}");
            return DomainVerdict::flagged(domain, reason);
        }
    }

    if let Some(kw) = ruleset
        .domain_keywords
        .iter()
        .find(|kw| domain.contains(kw.as_str()))
    {
        let reason = format!("suspicious keyword: {kw}");
        return DomainVerdict::flagged(domain, reason);
    }

    if let Some(official) = lookalike_of(&domain, ruleset) {
        let reason = format!("lookalike of {official}");
        return DomainVerdict::flagged(domain, reason);
    }

    DomainVerdict::clean(domain)
}

fn lookalike_of<'r>(domain: &str, ruleset: &'r Ruleset) -> Option<&'r str> {
    if ruleset.lookalike_max_distance == 0 || ruleset.is_official(domain) {
        return None;
    }
    let label = brand_label(domain);
    ruleset
        .official_domains
        .iter()
        .find(|official| {
            let official_label = official.split('.').next().unwrap_or_default();
            // Same brand under another TLD is not a look-alike.
            if label == official_label {
                return false;
            }
            levenshtein(label, official_label) <= ruleset.lookalike_max_distance
        })
        .map(String::as_str)
}

/// Second-level label of a host: `paypa1` for `a.b.paypa1.com`.
fn brand_label(domain: &str) -> &str {
    let mut labels = domain.rsplit('.');
    let last = labels.next().unwrap_or_default();
    labels.next().unwrap_or(last)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RadarConfig;

    fn rules() -> Ruleset {
        Ruleset::from_config(&RadarConfig::default()).unwrap()
    }

    #[test]
    fn blacklisted_domain() {
        let v = check_domain("secure-banca-login.xyz", &rules());
        assert!(v.suspicious);
        assert!(v.reason.contains("blacklist"));
    }

    #[test]
    fn suspicious_tld() {
        let v = check_domain("example.top", &rules());
        assert!(v.suspicious);
        assert_eq!(v.reason, "suspicious TLD .top");
    }

    #[test]
    fn keyword_match_is_deterministic() {
        let v = check_domain("mybank-login.com", &rules());
        assert!(v.suspicious);
        assert_eq!(v.reason, "suspicious keyword: login");
    }

    #[test]
    fn plain_domain_is_clean() {
        let v = check_domain("example.com", &rules());
        assert!(!v.suspicious);
        assert!(v.reason.is_empty());
    }

    #[test]
    fn blank_host_is_clean() {
        let v = check_domain("   ", &rules());
        assert!(!v.suspicious);
        assert_eq!(v.reason, "");
    }

    #[test]
    fn brand_lookalike() {
        let v = check_domain("paypa1.com", &rules());
        assert!(v.suspicious);
        assert_eq!(v.reason, "lookalike of paypal.com");

        let v = check_domain("mail.paypal.com", &rules());
        assert!(!v.suspicious);
    }

    #[test]
    fn brand_under_another_tld_is_clean() {
        for host in ["amazon.in", "amazon.ie", "www.amazon.in", "google.co"] {
            let v = check_domain(host, &rules());
            assert!(!v.suspicious, "{host}: {}", v.reason);
        }
        let v = check_domain("arnazon.in", &rules());
        assert!(!v.suspicious);
        let v = check_domain("amaz0n.in", &rules());
        assert_eq!(v.reason, "lookalike of amazon.com");
    }

    #[test]
    fn brand_label_is_second_level() {
        assert_eq!(brand_label("a.b.paypa1.com"), "paypa1");
        assert_eq!(brand_label("paypa1.com"), "paypa1");
        assert_eq!(brand_label("localhost"), "localhost");
    }
}
