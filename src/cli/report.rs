//! Report command - build and emit a reputation report

use crate::config::UserConfig;
use crate::provider::ProviderRegistry;
use crate::query::Query;
use crate::reporters::{self, OutputFormat};
use crate::reputer::{Reputer, ReputerOptions};
use anyhow::{Context, Result};
use console::style;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Arguments of one report invocation
#[derive(Debug, Clone)]
pub struct ReportArgs {
    pub repo: String,
    pub commit: String,
    pub stats: bool,
    pub file: Option<PathBuf>,
    pub format: OutputFormat,
    /// Overrides the configured enrichment concurrency
    pub workers: Option<usize>,
}

impl std::fmt::Display for ReportArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "repo: {}, commit: {}, stats: {}, format: {}",
            self.repo,
            if self.commit.is_empty() { "HEAD" } else { self.commit.as_str() },
            self.stats,
            self.format
        )?;
        if let Some(file) = &self.file {
            write!(f, ", file: {}", file.display())?;
        }
        Ok(())
    }
}

/// Run the report command
pub fn run(args: &ReportArgs) -> Result<()> {
    let config = UserConfig::load()?;
    let registry = ProviderRegistry::from_config(&config);

    let mut options = ReputerOptions::from_config(&config);
    if let Some(workers) = args.workers {
        options.concurrency = workers;
    }

    let query = Query::parse(&args.repo, &args.commit, args.stats)
        .with_context(|| format!("Invalid report options ({})", args))?;

    let report = Reputer::new(&registry, options)
        .report(&query)
        .with_context(|| format!("Failed to build report for {}", query))?;

    let rendered = reporters::report_with_format(&report, args.format)?;
    write_output(&rendered, args.file.as_deref())?;

    if let Some(path) = &args.file {
        eprintln!(
            "{} Report for {} contributors written to {}",
            style("✓").green(),
            report.total_contributors,
            style(path.display()).cyan()
        );
    }
    Ok(())
}

/// Write `content` to `path`, or to stdout when no path is given
fn write_output(content: &str, path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write report to {}", path.display()))
        }
        None => {
            let mut out = std::io::stdout().lock();
            out.write_all(content.as_bytes())?;
            if !content.ends_with('\n') {
                writeln!(out)?;
            }
            Ok(())
        }
    }
}
