use std::fs;
use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::core::error::RadarError;
use crate::core::signal::{ScoreResult, Signal};
use crate::detectors::domain::DomainVerdict;
use crate::detectors::image::ImageReport;
use crate::detectors::text::TextReport;
use crate::detectors::url::UrlReport;
use crate::pipeline::reporter::{StatsSummary, Submission};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Jsonl,
    Markdown,
}

/// Human-readable rendering of a result.
pub trait MarkdownView {
    fn markdown(&self, out: &mut String);
}

/// A scoring result plus the outcome of filing it as a report.
#[derive(Debug, Serialize)]
pub struct Outcome<'a, T> {
    #[serde(flatten)]
    pub report: &'a T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submission: Option<Submission>,
}

impl<T: MarkdownView> MarkdownView for Outcome<'_, T> {
    fn markdown(&self, out: &mut String) {
        self.report.markdown(out);
        if let Some(sub) = &self.submission {
            out.push_str("\n## Report\n");
            let status = match (sub.ok, sub.dedup) {
                (true, true) => "already reported recently",
                (true, false) => "stored",
                (false, _) => "could not be stored",
            };
            out.push_str(&format!("- Status: {status}\n"));
        }
    }
}

pub fn render<T: Serialize + MarkdownView>(
    value: &T,
    format: OutputFormat,
) -> Result<String, RadarError> {
    let mut out = match format {
        OutputFormat::Json => serde_json::to_string_pretty(value)?,
        OutputFormat::Jsonl => serde_json::to_string(value)?,
        OutputFormat::Markdown => {
            let mut md = String::new();
            value.markdown(&mut md);
            md
        }
    };
    if !out.ends_with('\n') {
        out.push('\n');
    }
    Ok(out)
}

/// Write to `path`, or stdout when none is given.
pub fn emit(rendered: &str, path: Option<&Path>) -> Result<(), RadarError> {
    match path {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)?;
                }
            }
            fs::write(path, rendered)?;
            tracing::info!("output written to {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(rendered.as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}

fn write_result(out: &mut String, result: &ScoreResult) {
    out.push_str(&format!("- Score: {}/100\n", result.score));
    out.push_str(&format!("- Level: {}\n", result.level.as_str()));
    out.push_str(&format!("- Category: {}\n\n", result.category));
    write_signals(out, &result.signals);
    if !result.advice.is_empty() {
        out.push_str("\n## Advice\n");
        for line in &result.advice {
            out.push_str(&format!("- {line}\n"));
        }
    }
}

fn write_signals(out: &mut String, signals: &[Signal]) {
    out.push_str("## Signals\n");
    if signals.is_empty() {
        out.push_str("- none\n");
        return;
    }
    for sig in signals {
        if sig.weight == 0 {
            out.push_str(&format!("- {}: {}\n", sig.code, sig.evidence));
        } else {
            out.push_str(&format!("- {} (+{}): {}\n", sig.code, sig.weight, sig.evidence));
        }
    }
}

fn write_list(out: &mut String, title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    out.push_str(&format!("\n## {title}\n"));
    for item in items {
        out.push_str(&format!("- {item}\n"));
    }
}

impl MarkdownView for TextReport {
    fn markdown(&self, out: &mut String) {
        out.push_str("# Message check\n\n");
        write_result(out, &self.result);
        write_list(out, "Domains", &self.domains);
        write_list(out, "Phone numbers", &self.phones);
    }
}

impl MarkdownView for UrlReport {
    fn markdown(&self, out: &mut String) {
        out.push_str(&format!("# URL check: {}\n\n", self.url));
        out.push_str(&format!("- Verdict: {:?}\n", self.verdict));
        write_result(out, &self.result);
    }
}

impl MarkdownView for ImageReport {
    fn markdown(&self, out: &mut String) {
        out.push_str("# Image check\n\n");
        out.push_str(&format!("- Size: {}x{}\n", self.width, self.height));
        out.push_str(&format!("- EXIF: {}\n", if self.exif_present { "present" } else { "absent" }));
        write_result(out, &self.result);
    }
}

impl MarkdownView for DomainVerdict {
    fn markdown(&self, out: &mut String) {
        out.push_str(&format!("# Domain check: {}\n\n", self.domain));
        if self.suspicious {
            out.push_str(&format!("- Suspicious: yes ({})\n", self.reason));
        } else {
            out.push_str("- Suspicious: no\n");
        }
    }
}

impl MarkdownView for StatsSummary {
    fn markdown(&self, out: &mut String) {
        out.push_str("# Report statistics\n\n");
        out.push_str(&format!("- Window: last {} days\n", self.window_days));
        out.push_str(&format!("- Reports: {}\n\n", self.total_reports));
        if self.total_reports == 0 {
            out.push_str("No reports in this window.\n");
            return;
        }

        out.push_str("## By level\n");
        for (level, count) in &self.by_level {
            out.push_str(&format!("- {level}: {count}\n"));
        }
        out.push_str("\n## By type\n");
        for (kind, count) in &self.by_type {
            out.push_str(&format!("- {kind}: {count}\n"));
        }
        let categories: Vec<(&str, u64)> = self
            .top_categories
            .iter()
            .map(|c| (c.category.as_str(), c.count))
            .collect();
        write_buckets(out, "Top categories", &categories);
        let signals: Vec<(&str, u64)> = self
            .top_signals
            .iter()
            .map(|s| (s.signal.as_str(), s.count))
            .collect();
        write_buckets(out, "Top signals", &signals);
        out.push_str("\n## Daily trend\n");
        for day in &self.trend {
            out.push_str(&format!("- {}: {}\n", day.day, day.count));
        }
    }
}

fn write_buckets(out: &mut String, title: &str, buckets: &[(&str, u64)]) {
    out.push_str(&format!("\n## {title}\n"));
    if buckets.is_empty() {
        out.push_str("- none\n");
    }
    for (name, count) in buckets {
        out.push_str(&format!("- {name}: {count}\n"));
    }
}
