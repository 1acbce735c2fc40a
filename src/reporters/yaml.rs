//! YAML reporter

use crate::models::Report;
use anyhow::Result;

/// Render report as YAML
pub fn render(report: &Report) -> Result<String> {
    Ok(serde_yaml::to_string(report)?)
}
