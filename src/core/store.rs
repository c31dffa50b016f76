use std::{
    collections::VecDeque,
    fs::{self, OpenOptions},
    io::{BufRead, BufReader, Write},
    path::{Path, PathBuf},
    sync::Mutex,
};

use serde::{Deserialize, Serialize};

use crate::core::{error::RadarError, signal::Signal};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    Text,
    Image,
    Url,
}

impl ReportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportKind::Text => "text",
            ReportKind::Image => "image",
            ReportKind::Url => "url",
        }
    }
}

/// One user-submitted report. Appended once, never rewritten.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Report {
    #[serde(rename = "type")]
    pub kind: ReportKind,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    pub risk_score: u32,
    pub risk_level: String,
    pub fingerprint: String,
    #[serde(default)]
    pub signals: Vec<Signal>,
    #[serde(default)]
    pub domains: Vec<String>,
    #[serde(default)]
    pub phones: Vec<String>,
    /// Unix seconds; stamped on submission when zero.
    #[serde(default)]
    pub ts: i64,
}

/// Append-only report log.
pub trait ReportStore {
    fn append(&self, report: &Report) -> Result<(), RadarError>;
    /// The last `limit` reports, oldest first.
    fn load_recent(&self, limit: usize) -> Result<Vec<Report>, RadarError>;
}

/// Reports as JSON lines in a single file.
pub struct JsonlStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlStore {
    pub fn new(path: &Path) -> Result<Self, RadarError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        Ok(Self {
            path: path.to_path_buf(),
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ReportStore for JsonlStore {
    fn append(&self, report: &Report) -> Result<(), RadarError> {
        let mut line = serde_json::to_string(report)?;
        line.push('\n');
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| RadarError::Store("report log lock poisoned".to_string()))?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        Ok(())
    }

    fn load_recent(&self, limit: usize) -> Result<Vec<Report>, RadarError> {
        if limit == 0 || !self.path.exists() {
            return Ok(Vec::new());
        }
        let file = fs::File::open(&self.path)?;
        let mut recent: VecDeque<Report> = VecDeque::with_capacity(limit.min(1024));
        for (idx, line) in BufReader::new(file).lines().enumerate() {
            let line = match line {
                Ok(line) => line,
                Err(err) => {
                    tracing::warn!("report log line {} unreadable: {}", idx + 1, err);
                    continue;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<Report>(&line) {
                Ok(report) => {
                    if recent.len() == limit {
                        recent.pop_front();
                    }
                    recent.push_back(report);
                }
                Err(err) => tracing::warn!("skipping corrupt report line {}: {}", idx + 1, err),
            }
        }
        Ok(recent.into())
    }
}

/// In-process store, mainly for tests and embedding.
#[derive(Default)]
pub struct MemoryStore {
    reports: Mutex<Vec<Report>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.reports.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ReportStore for MemoryStore {
    fn append(&self, report: &Report) -> Result<(), RadarError> {
        let mut reports = self
            .reports
            .lock()
            .map_err(|_| RadarError::Store("memory store lock poisoned".to_string()))?;
        reports.push(report.clone());
        Ok(())
    }

    fn load_recent(&self, limit: usize) -> Result<Vec<Report>, RadarError> {
        let reports = self
            .reports
            .lock()
            .map_err(|_| RadarError::Store("memory store lock poisoned".to_string()))?;
        let start = reports.len().saturating_sub(limit);
        Ok(reports[start..].to_vec())
    }
}
