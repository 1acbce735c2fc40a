//! CLI command definitions and handlers

mod config;
mod report;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub use report::ReportArgs;

/// Parse and validate workers count (1-64)
fn parse_workers(s: &str) -> Result<usize, String> {
    let n: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if n == 0 {
        Err("workers must be at least 1".to_string())
    } else if n > 64 {
        Err("workers cannot exceed 64".to_string())
    } else {
        Ok(n)
    }
}

/// Reputer - contributor reputation for git repositories
#[derive(Parser, Debug)]
#[command(name = "reputer")]
#[command(
    version,
    about = "Score the reputation of every commit author in a GitHub or GitLab repository",
    long_about = "Reputer walks a repository's commit history, enriches each distinct author \
with account-level signals from the hosting provider (account age, strong auth, \
org membership, followers, repositories) and scores them between 0.0 and 1.0.\n\n\
Requires GITHUB_TOKEN or GITLAB_TOKEN (or a token in the user config).",
    after_help = "\
Examples:
  reputer --repo github.com/owner/repo                 Report for the default branch
  reputer --repo github.com/owner/repo --commit abc123 Report ending at a commit
  reputer --repo gitlab.com/group/project --stats      Include raw signals
  reputer --repo github.com/owner/repo --format yaml -o report.yaml
  reputer config init                                  Create ~/.config/reputer/config.toml"
)]
pub struct Cli {
    /// Repository URI (e.g. github.com/owner/repo)
    #[arg(long, short = 'r')]
    pub repo: Option<String>,

    /// Commit at which to end the report (inclusive, default: branch head)
    #[arg(long, short = 'c', default_value = "")]
    pub commit: String,

    /// Include per-author signals and context in the report
    #[arg(long, short = 's')]
    pub stats: bool,

    /// Write the report to this file (default: stdout)
    #[arg(long = "file", short = 'o')]
    pub file: Option<PathBuf>,

    /// Output format: json, yaml
    #[arg(long, short = 'f', default_value = "json", value_parser = ["json", "yaml", "yml"])]
    pub format: String,

    /// Number of parallel enrichment workers (1-64, default: from config)
    #[arg(long, value_parser = parse_workers)]
    pub workers: Option<usize>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info", value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: String,

    /// Shorthand for --log-level debug
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Log level after applying --debug
    pub fn effective_log_level(&self) -> &str {
        if self.debug {
            "debug"
        } else {
            &self.log_level
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage the user configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigAction {
    /// Create ~/.config/reputer/config.toml with commented defaults
    Init,
    /// Show the effective configuration (tokens are never printed)
    Show,
}

/// Run the CLI with parsed arguments
pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Some(Commands::Config { action }) => config::run(action),
        None => {
            let repo = cli
                .repo
                .ok_or_else(|| anyhow!("--repo is required (e.g. --repo github.com/owner/repo)"))?;
            let args = ReportArgs {
                repo,
                commit: cli.commit,
                stats: cli.stats,
                file: cli.file,
                format: cli.format.parse()?,
                workers: cli.workers,
            };
            report::run(&args)
        }
    }
}
