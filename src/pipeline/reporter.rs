use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::hash::text_fingerprint;
use crate::core::signal::{RiskLevel, ScoreResult};
use crate::core::store::{Report, ReportKind, ReportStore};
use crate::core::time::{utc_day, window_cutoff};
use crate::detectors::image::ImageReport;
use crate::detectors::text::TextReport;
use crate::detectors::url::UrlReport;
use crate::pipeline::normalizer::link_host;

const TOP_N: usize = 10;

impl Report {
    fn from_result(kind: ReportKind, result: &ScoreResult, fingerprint: String) -> Self {
        Self {
            kind,
            source: None,
            category: Some(result.category.clone()),
            risk_score: result.score,
            risk_level: result.level.as_str().to_string(),
            fingerprint,
            signals: result.signals.clone(),
            domains: Vec::new(),
            phones: Vec::new(),
            ts: 0,
        }
    }

    pub fn from_text(report: &TextReport, source: Option<String>) -> Self {
        let mut out = Self::from_result(ReportKind::Text, &report.result, report.fingerprint.clone());
        out.source = source;
        out.domains = report.domains.clone();
        out.phones = report.phones.clone();
        out
    }

    pub fn from_url(report: &UrlReport) -> Self {
        let mut out = Self::from_result(
            ReportKind::Url,
            &report.result,
            text_fingerprint(&report.normalized),
        );
        if let Some(host) = link_host(&report.normalized) {
            out.domains.push(host);
        }
        out
    }

    pub fn from_image(report: &ImageReport) -> Self {
        Self::from_result(ReportKind::Image, &report.result, report.fingerprint.clone())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Submission {
    pub ok: bool,
    pub dedup: bool,
}

/// Append `report` unless the same fingerprint was already reported inside
/// the window. Never fails: store errors are logged and surface as `ok = false`.
pub fn submit_report<S: ReportStore + ?Sized>(
    store: &S,
    mut report: Report,
    now: DateTime<Utc>,
    window_days: u32,
    scan_limit: usize,
) -> Submission {
    if report.ts == 0 {
        report.ts = now.timestamp();
    }
    let cutoff = window_cutoff(now, window_days);

    let history = store.load_recent(scan_limit).unwrap_or_else(|err| {
        tracing::warn!("report history unavailable, skipping dedup: {err}");
        Vec::new()
    });
    for previous in history.iter().rev() {
        if previous.ts < cutoff {
            break;
        }
        if previous.fingerprint == report.fingerprint {
            tracing::info!(fingerprint = %report.fingerprint, "duplicate report ignored");
            return Submission {
                ok: true,
                dedup: true,
            };
        }
    }

    match store.append(&report) {
        Ok(()) => {
            tracing::info!(
                kind = report.kind.as_str(),
                level = %report.risk_level,
                "report stored"
            );
            Submission {
                ok: true,
                dedup: false,
            }
        }
        Err(err) => {
            tracing::error!("failed to store report: {err}");
            Submission {
                ok: false,
                dedup: false,
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryCount {
    pub category: String,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SignalCount {
    pub signal: String,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DayBucket {
    pub day: String,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatsSummary {
    pub window_days: u32,
    pub total_reports: u64,
    pub by_level: BTreeMap<String, u64>,
    pub by_type: BTreeMap<String, u64>,
    pub top_categories: Vec<CategoryCount>,
    pub top_signals: Vec<SignalCount>,
    pub trend: Vec<DayBucket>,
}

/// Aggregate the reports of the last `window_days` days.
pub fn stats_summary<S: ReportStore + ?Sized>(
    store: &S,
    now: DateTime<Utc>,
    window_days: u32,
    scan_limit: usize,
) -> StatsSummary {
    let cutoff = window_cutoff(now, window_days);
    let reports: Vec<Report> = store
        .load_recent(scan_limit)
        .unwrap_or_else(|err| {
            tracing::warn!("report history unavailable for stats: {err}");
            Vec::new()
        })
        .into_iter()
        .filter(|r| r.ts >= cutoff)
        .collect();

    let mut by_level: BTreeMap<String, u64> = [RiskLevel::Low, RiskLevel::Medium, RiskLevel::High]
        .iter()
        .map(|l| (l.as_str().to_string(), 0))
        .collect();
    let mut by_type: BTreeMap<String, u64> = [ReportKind::Text, ReportKind::Image, ReportKind::Url]
        .iter()
        .map(|k| (k.as_str().to_string(), 0))
        .collect();
    let mut categories: BTreeMap<String, u64> = BTreeMap::new();
    let mut signal_counts: BTreeMap<String, u64> = BTreeMap::new();
    let mut days: BTreeMap<String, u64> = BTreeMap::new();

    for report in &reports {
        *by_level.entry(report.risk_level.clone()).or_insert(0) += 1;
        *by_type.entry(report.kind.as_str().to_string()).or_insert(0) += 1;
        if let Some(category) = report.category.as_deref().filter(|c| !c.is_empty()) {
            *categories.entry(category.to_string()).or_insert(0) += 1;
        }
        for signal in report.signals.iter().filter(|s| s.weight > 0) {
            *signal_counts.entry(signal.code.clone()).or_insert(0) += 1;
        }
        if let Some(day) = utc_day(report.ts) {
            *days.entry(day.to_string()).or_insert(0) += 1;
        }
    }

    StatsSummary {
        window_days,
        total_reports: reports.len() as u64,
        by_level,
        by_type,
        top_categories: top_counts(categories)
            .into_iter()
            .map(|(category, count)| CategoryCount { category, count })
            .collect(),
        top_signals: top_counts(signal_counts)
            .into_iter()
            .map(|(signal, count)| SignalCount { signal, count })
            .collect(),
        trend: days
            .into_iter()
            .map(|(day, count)| DayBucket { day, count })
            .collect(),
    }
}

fn top_counts(counts: BTreeMap<String, u64>) -> Vec<(String, u64)> {
    let mut buckets: Vec<(String, u64)> = counts.into_iter().collect();
    // BTreeMap order already gives ascending keys; a stable sort keeps it on ties.
    buckets.sort_by(|a, b| b.1.cmp(&a.1));
    buckets.truncate(TOP_N);
    buckets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::RadarError;
    use crate::core::signal::Signal;
    use crate::core::store::MemoryStore;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
    }

    fn report(fp: &str, ts: i64) -> Report {
        Report {
            kind: ReportKind::Text,
            source: None,
            category: Some("phishing_link".into()),
            risk_score: 60,
            risk_level: "medium".into(),
            fingerprint: fp.into(),
            signals: vec![Signal::new("LINK", 15, "1 link(s) in the message")],
            domains: vec![],
            phones: vec![],
            ts,
        }
    }

    #[test]
    fn duplicate_inside_window_is_not_appended() {
        let store = MemoryStore::new();
        let first = submit_report(&store, report("abc", 0), now(), 7, 500);
        assert_eq!(first, Submission { ok: true, dedup: false });
        let later = now() + Duration::days(2);
        let second = submit_report(&store, report("abc", 0), later, 7, 500);
        assert_eq!(second, Submission { ok: true, dedup: true });
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn duplicate_outside_window_is_appended() {
        let store = MemoryStore::new();
        let old = (now() - Duration::days(8)).timestamp();
        store.append(&report("abc", old)).unwrap();
        let outcome = submit_report(&store, report("abc", 0), now(), 7, 500);
        assert!(!outcome.dedup);
        assert_eq!(store.len(), 2);
        let stored = store.load_recent(1).unwrap();
        assert_eq!(stored[0].ts, now().timestamp());
    }

    #[test]
    fn scan_stops_at_first_stale_record() {
        let store = MemoryStore::new();
        let recent = (now() - Duration::days(1)).timestamp();
        let stale = (now() - Duration::days(30)).timestamp();
        store.append(&report("abc", recent)).unwrap();
        store.append(&report("zzz", stale)).unwrap();
        // Newest-first scan meets the stale record first and stops.
        let outcome = submit_report(&store, report("abc", 0), now(), 7, 500);
        assert!(!outcome.dedup);
    }

    #[test]
    fn scan_limit_bounds_history() {
        let store = MemoryStore::new();
        let ts = now().timestamp() - 60;
        store.append(&report("abc", ts)).unwrap();
        store.append(&report("x1", ts)).unwrap();
        store.append(&report("x2", ts)).unwrap();
        assert!(!submit_report(&store, report("abc", 0), now(), 7, 2).dedup);
        assert!(submit_report(&store, report("x2", 0), now(), 7, 2).dedup);
    }

    struct BrokenStore;

    impl ReportStore for BrokenStore {
        fn append(&self, _report: &Report) -> Result<(), RadarError> {
            Err(RadarError::Store("disk full".into()))
        }

        fn load_recent(&self, _limit: usize) -> Result<Vec<Report>, RadarError> {
            Err(RadarError::Store("unreadable".into()))
        }
    }

    #[test]
    fn store_failures_are_reported_not_raised() {
        let outcome = submit_report(&BrokenStore, report("abc", 0), now(), 7, 500);
        assert_eq!(outcome, Submission { ok: false, dedup: false });
        let stats = stats_summary(&BrokenStore, now(), 30, 100);
        assert_eq!(stats.total_reports, 0);
    }

    #[test]
    fn stats_buckets_and_trend() {
        let store = MemoryStore::new();
        let day1 = Utc.with_ymd_and_hms(2025, 6, 10, 9, 0, 0).unwrap().timestamp();
        let day2 = Utc.with_ymd_and_hms(2025, 6, 12, 9, 0, 0).unwrap().timestamp();
        let ancient = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap().timestamp();

        let mut high = report("a", day2);
        high.risk_level = "high".into();
        high.category = Some("account_threat".into());
        high.signals.push(Signal::new("URGENCY_THREAT", 20, "urgency"));
        store.append(&report("old", ancient)).unwrap();
        store.append(&report("b", day1)).unwrap();
        store.append(&high).unwrap();
        let mut url = report("c", day2);
        url.kind = ReportKind::Url;
        store.append(&url).unwrap();

        let stats = stats_summary(&store, now(), 30, 5000);
        assert_eq!(stats.total_reports, 3);
        assert_eq!(stats.by_level["low"], 0);
        assert_eq!(stats.by_level["medium"], 2);
        assert_eq!(stats.by_level["high"], 1);
        assert_eq!(stats.by_type["image"], 0);
        assert_eq!(stats.by_type["text"], 2);
        assert_eq!(stats.by_type["url"], 1);
        assert_eq!(
            stats.top_categories,
            vec![
                CategoryCount { category: "phishing_link".into(), count: 2 },
                CategoryCount { category: "account_threat".into(), count: 1 },
            ]
        );
        assert_eq!(stats.top_signals[0], SignalCount { signal: "LINK".into(), count: 3 });
        assert_eq!(
            stats.trend,
            vec![
                DayBucket { day: "2025-06-10".into(), count: 1 },
                DayBucket { day: "2025-06-12".into(), count: 2 },
            ]
        );
    }

    #[test]
    fn top_lists_break_ties_by_name() {
        let counts: BTreeMap<String, u64> = (0..12)
            .map(|i| (format!("k{:02}", 11 - i), 1))
            .chain(std::iter::once(("zz".to_string(), 5)))
            .collect();
        let top = top_counts(counts);
        assert_eq!(top.len(), TOP_N);
        assert_eq!(top[0].0, "zz");
        assert_eq!(top[1].0, "k00");
        assert_eq!(top[9].0, "k08");
    }

    #[test]
    fn notes_do_not_crowd_top_signals() {
        let store = MemoryStore::new();
        let ts = now().timestamp() - 60;
        for i in 0..3 {
            let mut quiet = report(&format!("q{i}"), ts);
            quiet.signals = vec![Signal::note("NO_INDICATORS", "no obvious red flags found")];
            store.append(&quiet).unwrap();
        }
        store.append(&report("loud", ts)).unwrap();

        let stats = stats_summary(&store, now(), 30, 100);
        assert_eq!(
            stats.top_signals,
            vec![SignalCount { signal: "LINK".into(), count: 1 }]
        );
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["top_signals"][0]["signal"], "LINK");
        assert_eq!(json["top_categories"][0]["category"], "phishing_link");
    }
}
