//! Config command - create or inspect the user configuration

use super::ConfigAction;
use crate::config::UserConfig;
use anyhow::Result;
use console::style;

/// Run the config command
pub fn run(action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Init => init(),
        ConfigAction::Show => show(),
    }
}

fn init() -> Result<()> {
    let path = UserConfig::user_config_path()
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
    if UserConfig::init_at(&path)? {
        eprintln!(
            "{} Created {}",
            style("✓").green(),
            style(path.display()).cyan()
        );
    } else {
        eprintln!(
            "{} Config already exists at {}",
            style("✓").green(),
            style(path.display()).cyan()
        );
    }
    Ok(())
}

fn show() -> Result<()> {
    let config = UserConfig::load()?;
    let path = UserConfig::user_config_path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "(unavailable)".to_string());

    println!("{}", style("Reputer configuration").bold());
    println!("  config file:  {}", path);
    println!();
    println!("{}", style("[github]").bold());
    println!("  token:        {}", token_status(config.github_token()));
    println!("  api_url:      {}", config.github_api_url());
    println!("{}", style("[gitlab]").bold());
    println!("  token:        {}", token_status(config.gitlab_token()));
    println!("  api_url:      {}", config.gitlab_api_url());
    println!("{}", style("[collection]").bold());
    println!("  page_size:    {}", config.page_size());
    println!("{}", style("[enrichment]").bold());
    println!("  concurrency:  {}", config.concurrency());
    println!("  rate floor:   {}", config.backoff().min_remaining());
    println!("{}", style("[http]").bold());
    println!("  timeout:      {}s", config.http_timeout().as_secs());
    Ok(())
}

fn token_status(token: Option<&str>) -> String {
    match token {
        Some(_) => style("set").green().to_string(),
        None => style("not set").yellow().to_string(),
    }
}
