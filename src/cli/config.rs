use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::cli::flags::Cli;
use crate::config::{apply_env_overrides, load_config, RadarConfig};
use crate::core::output::OutputFormat;

/// Everything a command needs, resolved once from flags, file and env.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub radar: RadarConfig,
    pub format: OutputFormat,
    pub output: Option<PathBuf>,
}

pub fn resolve_config(cli: &Cli) -> Result<RunConfig> {
    let radar = load_config(cli.config.as_deref()).with_context(|| {
        format!(
            "loading config {}",
            cli.config.as_deref().unwrap_or(crate::config::DEFAULT_CONFIG_PATH)
        )
    })?;
    let radar = apply_env_overrides(radar);

    Ok(RunConfig {
        radar,
        format: cli.format.clone().map(OutputFormat::from).unwrap_or_default(),
        output: cli.output.clone(),
    })
}
