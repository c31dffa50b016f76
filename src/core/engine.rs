use crate::{
    config::{RadarConfig, TextMode},
    core::{
        error::RadarError,
        signal::{codes, RiskLevel, Signal},
    },
    detectors::{
        domain::{check_domain, DomainVerdict},
        image::{self as image_detector, ImageReport},
        text::{self as text_detector, TextReport},
        url::{self as url_detector, UrlReport},
        Ruleset,
    },
    pipeline::scorer::apply_domain_reputation,
};

/// Longest combined domain-reputation evidence string, in characters.
const REPUTATION_EVIDENCE_MAX: usize = 240;

/// Scoring entry point. Holds the config and the compiled, read-only rule
/// tables; every method is a pure function of its input.
pub struct Engine {
    pub config: RadarConfig,
    ruleset: Ruleset,
}

impl Engine {
    pub fn new(config: RadarConfig) -> Result<Self, RadarError> {
        let ruleset = Ruleset::from_config(&config)?;
        Ok(Self { config, ruleset })
    }

    pub fn ruleset(&self) -> &Ruleset {
        &self.ruleset
    }

    /// Score a message in the configured text mode.
    pub fn score_text(&self, raw_text: &str) -> TextReport {
        self.score_text_with_mode(raw_text, self.config.text_mode)
    }

    pub fn score_text_with_mode(&self, raw_text: &str, mode: TextMode) -> TextReport {
        let mut report = text_detector::score(raw_text, &self.ruleset, mode);
        if report.result.level == RiskLevel::NoInput {
            return report;
        }

        let hits: Vec<String> = report
            .domains
            .iter()
            .map(|d| self.check_domain(d))
            .filter(|v| v.suspicious)
            .map(|v| format!("{} ({})", v.domain, v.reason))
            .collect();

        if !hits.is_empty() {
            let evidence: String = hits
                .join(" | ")
                .chars()
                .take(REPUTATION_EVIDENCE_MAX)
                .collect();
            let weight = self.ruleset.weight(codes::DOMAIN_REPUTATION).for_hits(1);
            tracing::debug!(domains = hits.len(), "domain reputation hit");
            apply_domain_reputation(
                &mut report.result,
                Signal::new(codes::DOMAIN_REPUTATION, weight, evidence),
                &self.ruleset.thresholds.text,
            );
        }
        report
    }

    pub fn score_url(&self, raw_url: &str) -> UrlReport {
        url_detector::score(raw_url, &self.ruleset)
    }

    /// Score image bytes. Oversized or undecodable input is rejected.
    pub fn score_image(&self, raw_bytes: &[u8]) -> Result<ImageReport, RadarError> {
        let limit = self.config.max_image_bytes;
        if raw_bytes.len() > limit {
            return Err(RadarError::TooLarge {
                size: raw_bytes.len(),
                limit,
            });
        }
        image_detector::score(raw_bytes, &self.ruleset)
    }

    pub fn check_domain(&self, host: &str) -> DomainVerdict {
        check_domain(host, &self.ruleset)
    }
}
