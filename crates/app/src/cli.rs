use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;

#[derive(Debug, Parser)]
#[command(
    name = "cashlens",
    version,
    about = "Categorize transactions, flag unusual outflows and project cash balances"
)]
pub struct Cli {
    /// Settings file (defaults to the per-user config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Emit JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Assign a category to one or more descriptions
    #[command(arg_required_else_help = true)]
    Classify {
        #[arg(required = true)]
        descriptions: Vec<String>,
    },
    /// Check whether an amount is an anomalous outflow
    Assess {
        #[arg(allow_negative_numbers = true)]
        amount: Decimal,
        /// Override the configured anomaly threshold
        #[arg(long)]
        threshold: Option<Decimal>,
    },
    /// Project the balance forward from a CSV history (date,description,amount)
    Forecast {
        #[arg(long)]
        history: PathBuf,
        /// Starting balance (defaults to the configured value)
        #[arg(long, allow_negative_numbers = true)]
        balance: Option<Decimal>,
        /// Number of days to project (defaults to the configured horizon)
        #[arg(long, allow_negative_numbers = true)]
        days: Option<i64>,
        /// Seed the noise source for a reproducible run
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Savings rate and top spending category for a CSV history
    Insights {
        #[arg(long)]
        history: PathBuf,
    },
    /// Inspect or export the keyword rule table
    #[command(subcommand)]
    Rules(RulesCommand),
    /// Run the full pipeline over built-in sample transactions
    Demo {
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long, allow_negative_numbers = true)]
        days: Option<i64>,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum RulesCommand {
    /// Print the active rule table
    Show,
    /// Write the active rule table to a file
    Export { path: PathBuf },
    /// Validate a rule file without activating it
    Check { path: PathBuf },
}
