use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::core::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(
    name = "scam-radar",
    version,
    about = "Heuristic scam and phishing risk scoring for messages, links and images"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Path to config file (TOML). Default: config/scam-radar.toml
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Increase verbosity (debug, trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Optional log file path
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, global = true)]
    pub format: Option<OutputFormatArg>,

    /// Output file (default: stdout)
    #[arg(long, global = true)]
    pub output: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Score a message
    Text {
        /// Message body
        #[arg(conflicts_with = "file", required_unless_present = "file")]
        text: Option<String>,
        /// Read the message from a file
        #[arg(long)]
        file: Option<PathBuf>,
        /// Also look for red-flag and threat phrases
        #[arg(long)]
        extended: bool,
        /// File the result as a report
        #[arg(long)]
        report: bool,
        /// Where the message was received (sms, email, ...)
        #[arg(long, requires = "report")]
        source: Option<String>,
    },
    /// Score a link
    Url {
        url: String,
        /// File the result as a report
        #[arg(long)]
        report: bool,
    },
    /// Score an image file
    Image {
        path: PathBuf,
        /// File the result as a report
        #[arg(long)]
        report: bool,
    },
    /// Check a single domain against the reputation tables
    Domain { host: String },
    /// Summarize filed reports
    Stats,
}

#[derive(ValueEnum, Clone, Debug)]
pub enum OutputFormatArg {
    Json,
    Jsonl,
    Markdown,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(value: OutputFormatArg) -> Self {
        match value {
            OutputFormatArg::Json => OutputFormat::Json,
            OutputFormatArg::Jsonl => OutputFormat::Jsonl,
            OutputFormatArg::Markdown => OutputFormat::Markdown,
        }
    }
}
