use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use cashlens_classify::RuleStore;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod demo;
mod history;
mod settings;

use cli::{Cli, Commands};
use commands::AppContext;
use settings::Settings;

fn main() -> Result<()> {
    // Logs go to stderr so stdout stays clean for --json output.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut settings = Settings::load(cli.config.as_deref()).context("Failed to load settings")?;
    settings.apply_env().context("Failed to apply environment overrides")?;

    let rules = match settings.rules_path() {
        Some(path) if path.exists() => RuleStore::open_or_default(&path),
        Some(path) => {
            tracing::debug!(path = %path.display(), "No rule file, using built-in rules");
            RuleStore::default()
        }
        None => RuleStore::default(),
    };

    let ctx = AppContext::new(settings, Arc::new(rules), cli.json)?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match &cli.command {
        Commands::Classify { descriptions } => commands::classify(&ctx, descriptions, &mut out)?,
        Commands::Assess { amount, threshold } => commands::assess(&ctx, *amount, *threshold, &mut out)?,
        Commands::Forecast {
            history,
            balance,
            days,
            seed,
        } => commands::forecast(&ctx, history, *balance, *days, *seed, &mut out)?,
        Commands::Insights { history } => commands::insights_report(&ctx, history, &mut out)?,
        Commands::Rules(command) => commands::rules(&ctx, command, &mut out)?,
        Commands::Demo { seed, days } => commands::demo(&ctx, *seed, *days, &mut out)?,
    }

    out.flush()?;
    Ok(())
}
