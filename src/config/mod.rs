use std::{collections::BTreeMap, fs, path::Path, path::PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::{error::RadarError, signal::RiskLevel};

pub const DEFAULT_CONFIG_PATH: &str = "config/scam-radar.toml";
const MIB: usize = 1024 * 1024;

/// Weight of one rule. Count-based rules multiply `weight` by the number of
/// distinct hits and clamp at `cap`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Weight {
    pub weight: u32,
    #[serde(default)]
    pub cap: Option<u32>,
}

impl Weight {
    pub const fn flat(weight: u32) -> Self {
        Self { weight, cap: None }
    }

    pub const fn capped(weight: u32, cap: u32) -> Self {
        Self {
            weight,
            cap: Some(cap),
        }
    }

    pub fn for_hits(&self, hits: usize) -> u32 {
        let hits = u32::try_from(hits).unwrap_or(u32::MAX);
        let raw = self.weight.saturating_mul(hits);
        match self.cap {
            Some(cap) => raw.min(cap),
            None => raw,
        }
    }
}

/// Lower bounds of the medium and high tiers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Thresholds {
    pub medium: u32,
    pub high: u32,
}

impl Thresholds {
    pub fn level(&self, score: u32) -> RiskLevel {
        if score >= self.high {
            RiskLevel::High
        } else if score >= self.medium {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ThresholdTable {
    #[serde(default = "default_url_thresholds")]
    pub url: Thresholds,
    #[serde(default = "default_text_thresholds")]
    pub text: Thresholds,
    #[serde(default = "default_image_thresholds")]
    pub image: Thresholds,
}

impl Default for ThresholdTable {
    fn default() -> Self {
        Self {
            url: default_url_thresholds(),
            text: default_text_thresholds(),
            image: default_image_thresholds(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TextMode {
    #[default]
    Standard,
    /// Email/SMS mode: adds the red-flag and threat-phrase lists.
    Extended,
}

/// Optional overrides for the keyword/pattern tables. `None` keeps the
/// built-in list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct TablesConfig {
    #[serde(default)]
    pub shorteners: Option<Vec<String>>,
    #[serde(default)]
    pub suspicious_tlds: Option<Vec<String>>,
    #[serde(default)]
    pub url_keywords: Option<Vec<String>>,
    #[serde(default)]
    pub brand_terms: Option<Vec<String>>,
    #[serde(default)]
    pub official_domains: Option<Vec<String>>,
    #[serde(default)]
    pub sensitive_terms: Option<Vec<String>>,
    #[serde(default)]
    pub urgency_terms: Option<Vec<String>>,
    #[serde(default)]
    pub red_flags: Option<Vec<String>>,
    #[serde(default)]
    pub threat_phrases: Option<Vec<String>>,
    #[serde(default)]
    pub domain_blacklist: Option<Vec<String>>,
    #[serde(default)]
    pub domain_keywords: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RadarConfig {
    #[serde(default = "default_max_image_bytes")]
    pub max_image_bytes: usize,
    #[serde(default)]
    pub text_mode: TextMode,
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,
    #[serde(default = "default_dedup_window_days")]
    pub dedup_window_days: u32,
    #[serde(default = "default_dedup_scan_limit")]
    pub dedup_scan_limit: usize,
    #[serde(default = "default_stats_window_days")]
    pub stats_window_days: u32,
    #[serde(default = "default_stats_scan_limit")]
    pub stats_scan_limit: usize,
    #[serde(default = "default_lookalike_distance")]
    pub lookalike_max_distance: usize,
    #[serde(default)]
    pub weights: BTreeMap<String, Weight>,
    #[serde(default)]
    pub thresholds: ThresholdTable,
    #[serde(default)]
    pub tables: TablesConfig,
}

impl Default for RadarConfig {
    fn default() -> Self {
        Self {
            max_image_bytes: default_max_image_bytes(),
            text_mode: TextMode::default(),
            store_path: default_store_path(),
            dedup_window_days: default_dedup_window_days(),
            dedup_scan_limit: default_dedup_scan_limit(),
            stats_window_days: default_stats_window_days(),
            stats_scan_limit: default_stats_scan_limit(),
            lookalike_max_distance: default_lookalike_distance(),
            weights: BTreeMap::new(),
            thresholds: ThresholdTable::default(),
            tables: TablesConfig::default(),
        }
    }
}

pub fn load_config(path: Option<&str>) -> Result<RadarConfig, RadarError> {
    let default_path = Path::new(DEFAULT_CONFIG_PATH);
    let path = path.map(Path::new).unwrap_or(default_path);

    if !path.exists() {
        tracing::debug!("no config at {}, using defaults", path.display());
        return Ok(RadarConfig::default());
    }

    let content = fs::read_to_string(path).map_err(|e| RadarError::Config(e.to_string()))?;
    parse_config(&content)
}

pub fn parse_config(content: &str) -> Result<RadarConfig, RadarError> {
    let cfg: RadarConfig = toml::from_str(content)?;
    Ok(cfg)
}

/// Apply `SCAM_RADAR_MAX_IMAGE_MB` and `SCAM_RADAR_DATA_DIR`.
pub fn apply_env_overrides(cfg: RadarConfig) -> RadarConfig {
    let max_mb = std::env::var("SCAM_RADAR_MAX_IMAGE_MB").ok();
    let data_dir = std::env::var("SCAM_RADAR_DATA_DIR").ok();
    with_overrides(cfg, max_mb.as_deref(), data_dir.as_deref())
}

fn with_overrides(
    mut cfg: RadarConfig,
    max_image_mb: Option<&str>,
    data_dir: Option<&str>,
) -> RadarConfig {
    if let Some(raw) = max_image_mb {
        match raw.trim().parse::<usize>() {
            Ok(mb) => cfg.max_image_bytes = mb.saturating_mul(MIB),
            Err(_) => tracing::warn!("ignoring invalid SCAM_RADAR_MAX_IMAGE_MB={raw}"),
        }
    }
    if let Some(dir) = data_dir {
        if !dir.trim().is_empty() {
            cfg.store_path = Path::new(dir).join("reports.jsonl");
        }
    }
    cfg
}

fn default_max_image_bytes() -> usize {
    10 * MIB
}

fn default_store_path() -> PathBuf {
    PathBuf::from("data/reports.jsonl")
}

fn default_dedup_window_days() -> u32 {
    7
}

fn default_dedup_scan_limit() -> usize {
    500
}

fn default_stats_window_days() -> u32 {
    30
}

fn default_stats_scan_limit() -> usize {
    5000
}

fn default_lookalike_distance() -> usize {
    1
}

fn default_url_thresholds() -> Thresholds {
    Thresholds {
        medium: 20,
        high: 45,
    }
}

fn default_text_thresholds() -> Thresholds {
    Thresholds {
        medium: 30,
        high: 70,
    }
}

fn default_image_thresholds() -> Thresholds {
    Thresholds {
        medium: 20,
        high: 50,
    }
}
