use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::cli::config::{resolve_config, RunConfig};
use crate::cli::flags::{Cli, Command};
use crate::config::TextMode;
use crate::core::engine::Engine;
use crate::core::output::{emit, render, MarkdownView, Outcome};
use crate::core::store::{JsonlStore, Report};
use crate::core::time::now_utc;
use crate::pipeline::reporter::{stats_summary, submit_report, Submission};

pub fn run(cli: Cli) -> Result<()> {
    let cfg = resolve_config(&cli)?;
    let engine = Engine::new(cfg.radar.clone())?;

    match cli.command {
        Command::Text {
            text,
            file,
            extended,
            report,
            source,
        } => {
            let body = match (text, file) {
                (Some(text), _) => text,
                (None, Some(path)) => fs::read_to_string(&path)
                    .with_context(|| format!("reading message from {}", path.display()))?,
                (None, None) => String::new(),
            };
            let mode = if extended {
                TextMode::Extended
            } else {
                engine.config.text_mode
            };
            let result = engine.score_text_with_mode(&body, mode);
            let submission = report
                .then(|| file_report(&cfg, Report::from_text(&result, source)))
                .transpose()?;
            write_outcome(&cfg, &result, submission)
        }
        Command::Url { url, report } => {
            let result = engine.score_url(&url);
            let submission = report
                .then(|| file_report(&cfg, Report::from_url(&result)))
                .transpose()?;
            write_outcome(&cfg, &result, submission)
        }
        Command::Image { path, report } => run_image(&cfg, &engine, &path, report),
        Command::Domain { host } => {
            let verdict = engine.check_domain(&host);
            write_outcome(&cfg, &verdict, None)
        }
        Command::Stats => {
            let store = open_store(&cfg)?;
            let stats = stats_summary(
                &store,
                now_utc(),
                cfg.radar.stats_window_days,
                cfg.radar.stats_scan_limit,
            );
            let rendered = render(&stats, cfg.format)?;
            emit(&rendered, cfg.output.as_deref())?;
            Ok(())
        }
    }
}

fn run_image(cfg: &RunConfig, engine: &Engine, path: &Path, report: bool) -> Result<()> {
    let meta = fs::metadata(path).with_context(|| format!("reading {}", path.display()))?;
    // Reject on size before pulling the file into memory.
    if meta.len() > cfg.radar.max_image_bytes as u64 {
        return Err(crate::core::error::RadarError::TooLarge {
            size: meta.len() as usize,
            limit: cfg.radar.max_image_bytes,
        }
        .into());
    }
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let result = engine.score_image(&bytes)?;
    let submission = report
        .then(|| file_report(cfg, Report::from_image(&result)))
        .transpose()?;
    write_outcome(cfg, &result, submission)
}

fn open_store(cfg: &RunConfig) -> Result<JsonlStore> {
    let store = JsonlStore::new(&cfg.radar.store_path)
        .with_context(|| format!("opening report log {}", cfg.radar.store_path.display()))?;
    Ok(store)
}

fn file_report(cfg: &RunConfig, report: Report) -> Result<Submission> {
    let store = open_store(cfg)?;
    Ok(submit_report(
        &store,
        report,
        now_utc(),
        cfg.radar.dedup_window_days,
        cfg.radar.dedup_scan_limit,
    ))
}

fn write_outcome<T: Serialize + MarkdownView>(
    cfg: &RunConfig,
    result: &T,
    submission: Option<Submission>,
) -> Result<()> {
    let outcome = Outcome {
        report: result,
        submission,
    };
    let rendered = render(&outcome, cfg.format)?;
    emit(&rendered, cfg.output.as_deref())?;
    Ok(())
}
