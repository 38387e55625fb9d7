use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use cashlens_classify::{AnomalyPolicy, RuleStore, RuleTable, TransactionClassifier};
use cashlens_core::{ForecastPoint, TransactionRecord};
use cashlens_forecast::{
    insights, CashFlowProjector, CategorizedAmount, GaussianNoise, Insight, NoiseSource,
};
use chrono::{Local, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::cli::RulesCommand;
use crate::demo::demo_history;
use crate::history::read_history_file;
use crate::settings::Settings;

/// Explicitly constructed instances shared by every command.
pub struct AppContext {
    pub settings: Settings,
    pub rules: Arc<RuleStore>,
    pub classifier: TransactionClassifier,
    pub projector: CashFlowProjector,
    pub json: bool,
}

impl AppContext {
    pub fn new(settings: Settings, rules: Arc<RuleStore>, json: bool) -> Result<Self> {
        let policy = AnomalyPolicy::new(settings.anomaly_threshold)
            .context("Invalid anomaly_threshold setting")?;
        let projector = CashFlowProjector::new(settings.noise_std_dev)
            .context("Invalid noise_std_dev setting")?;
        let classifier = TransactionClassifier::new(Arc::clone(&rules), policy);
        Ok(Self {
            settings,
            rules,
            classifier,
            projector,
            json,
        })
    }

    fn noise(&self, seed: Option<u64>) -> Result<GaussianNoise> {
        let std_dev = self.projector.noise_std_dev();
        let noise = match seed {
            Some(seed) => GaussianNoise::seeded(seed, std_dev)?,
            None => GaussianNoise::from_entropy(std_dev)?,
        };
        Ok(noise)
    }
}

#[derive(Debug, Serialize)]
struct ClassifyRow<'a> {
    description: &'a str,
    category: String,
    confidence: f64,
}

#[derive(Debug, Serialize)]
struct AssessedTransaction {
    date: NaiveDate,
    description: String,
    amount: Decimal,
    category: String,
    category_confidence: f64,
    is_anomaly: bool,
    anomaly_score: f64,
}

#[derive(Debug, Serialize)]
struct DemoReport {
    transactions: Vec<AssessedTransaction>,
    insights: Vec<Insight>,
    forecast: Vec<ForecastPoint>,
}

fn write_json<T: Serialize + ?Sized>(out: &mut dyn Write, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

pub fn classify(ctx: &AppContext, descriptions: &[String], out: &mut dyn Write) -> Result<()> {
    let categorizer = ctx.rules.categorizer();
    let rows: Vec<_> = descriptions
        .iter()
        .map(|d| {
            let result = categorizer.classify(d);
            ClassifyRow {
                description: d,
                category: result.category,
                confidence: result.confidence,
            }
        })
        .collect();

    if ctx.json {
        return write_json(out, &rows);
    }
    for row in rows {
        writeln!(out, "{:<16} {:.2}  {}", row.category, row.confidence, row.description)?;
    }
    Ok(())
}

pub fn assess(
    ctx: &AppContext,
    amount: Decimal,
    threshold: Option<Decimal>,
    out: &mut dyn Write,
) -> Result<()> {
    let policy = match threshold {
        Some(t) => AnomalyPolicy::new(t)?,
        None => ctx.classifier.policy(),
    };
    let assessment = policy.assess(amount);

    if ctx.json {
        return write_json(out, &assessment);
    }
    if assessment.is_anomaly {
        writeln!(
            out,
            "anomaly: {amount} exceeds {} (score {:.3})",
            policy.threshold(),
            assessment.anomaly_score
        )?;
    } else {
        writeln!(out, "normal: {amount}")?;
    }
    Ok(())
}

pub fn forecast(
    ctx: &AppContext,
    history_path: &Path,
    balance: Option<Decimal>,
    days: Option<i64>,
    seed: Option<u64>,
    out: &mut dyn Write,
) -> Result<()> {
    let history = read_history_file(history_path)
        .with_context(|| format!("Failed to read history from {}", history_path.display()))?;
    let mut noise = ctx.noise(seed)?;
    let points = project(ctx, &history, balance, days, &mut noise)?;
    write_forecast(ctx, &points, out)
}

fn project(
    ctx: &AppContext,
    history: &[TransactionRecord],
    balance: Option<Decimal>,
    days: Option<i64>,
    noise: &mut dyn NoiseSource,
) -> Result<Vec<ForecastPoint>> {
    let balance = balance.unwrap_or(ctx.settings.starting_balance);
    let days = days.unwrap_or(ctx.settings.horizon_days);
    let points = ctx.projector.project_with(history, balance, days, noise)?;
    tracing::info!(days, records = history.len(), "Forecast complete");
    Ok(points)
}

fn write_forecast(ctx: &AppContext, points: &[ForecastPoint], out: &mut dyn Write) -> Result<()> {
    if ctx.json {
        return write_json(out, points);
    }
    writeln!(out, "{:<10}  {:>12}  {:>12}  {:>12}", "date", "predicted", "lower", "upper")?;
    for p in points {
        writeln!(
            out,
            "{:<10}  {:>12}  {:>12}  {:>12}",
            p.date.to_string(),
            p.predicted.to_string(),
            p.lower.to_string(),
            p.upper.to_string()
        )?;
    }
    Ok(())
}

fn categorized(ctx: &AppContext, history: &[TransactionRecord]) -> Vec<CategorizedAmount> {
    ctx.classifier
        .assess_all(history)
        .into_iter()
        .zip(history)
        .map(|(a, tx)| CategorizedAmount::new(a.category, tx.amount))
        .collect()
}

fn write_insights(ctx: &AppContext, found: &[Insight], out: &mut dyn Write) -> Result<()> {
    if ctx.json {
        return write_json(out, found);
    }
    if found.is_empty() {
        writeln!(out, "No insights: history has no income or spending")?;
    }
    for insight in found {
        writeln!(out, "[{}] {}: {}", insight.severity, insight.title, insight.description)?;
    }
    Ok(())
}

pub fn insights_report(ctx: &AppContext, history_path: &Path, out: &mut dyn Write) -> Result<()> {
    let history = read_history_file(history_path)
        .with_context(|| format!("Failed to read history from {}", history_path.display()))?;
    let found = insights(&categorized(ctx, &history));
    write_insights(ctx, &found, out)
}

pub fn rules(ctx: &AppContext, command: &RulesCommand, out: &mut dyn Write) -> Result<()> {
    match command {
        RulesCommand::Show => {
            let table = ctx.rules.snapshot();
            if ctx.json {
                return write_json(out, table.rules());
            }
            write!(out, "{}", table.to_toml()?)?;
        }
        RulesCommand::Export { path } => {
            ctx.rules
                .save(path)
                .with_context(|| format!("Failed to export rules to {}", path.display()))?;
            writeln!(out, "Exported {} categories to {}", ctx.rules.snapshot().len(), path.display())?;
        }
        RulesCommand::Check { path } => {
            let table = RuleTable::load(path)
                .with_context(|| format!("Rule file {} is not usable", path.display()))?;
            writeln!(out, "{}: {} categories, ok", path.display(), table.len())?;
        }
    }
    Ok(())
}

pub fn demo(ctx: &AppContext, seed: Option<u64>, days: Option<i64>, out: &mut dyn Write) -> Result<()> {
    let today = Local::now().date_naive();
    let history = demo_history(today);
    let assessed = ctx.classifier.assess_all(&history);

    let transactions: Vec<_> = history
        .iter()
        .zip(assessed)
        .map(|(tx, a)| AssessedTransaction {
            date: tx.date,
            description: tx.description.clone().unwrap_or_default(),
            amount: tx.amount,
            category: a.category,
            category_confidence: a.confidence,
            is_anomaly: a.is_anomaly,
            anomaly_score: a.anomaly_score,
        })
        .collect();
    let found = insights(&categorized(ctx, &history));
    let mut noise = ctx.noise(seed)?;
    let points = project(ctx, &history, None, days, &mut noise)?;

    if ctx.json {
        return write_json(
            out,
            &DemoReport {
                transactions,
                insights: found,
                forecast: points,
            },
        );
    }

    writeln!(out, "Transactions")?;
    for t in &transactions {
        let flag = if t.is_anomaly { " !" } else { "" };
        writeln!(
            out,
            "  {}  {:<16} {:>10}  {:<16}{flag}",
            t.date, t.description, t.amount, t.category
        )?;
    }
    writeln!(out)?;
    writeln!(out, "Insights")?;
    write_insights(ctx, &found, out)?;
    writeln!(out)?;
    writeln!(out, "Forecast")?;
    write_forecast(ctx, &points, out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(json: bool) -> AppContext {
        AppContext::new(Settings::default(), Arc::new(RuleStore::default()), json).unwrap()
    }

    fn run<F>(f: F) -> String
    where
        F: FnOnce(&mut dyn Write) -> Result<()>,
    {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    fn write_history(dir: &Path) -> std::path::PathBuf {
        let path = dir.join("history.csv");
        std::fs::write(
            &path,
            "date,description,amount\n2024-01-01,Salary Deposit,3000\n2024-01-05,Amazon,-300\n",
        )
        .unwrap();
        path
    }

    #[test]
    fn classify_text_lists_each_description() {
        let ctx = context(false);
        let text = run(|out| classify(&ctx, &["Starbucks".into(), "Zelle".into()], out));
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("Dining"));
        assert!(lines[0].contains("0.85"));
        assert!(lines[1].starts_with("Other"));
        assert!(lines[1].contains("0.65"));
    }

    #[test]
    fn classify_json_is_an_array() {
        let ctx = context(true);
        let text = run(|out| classify(&ctx, &["Uber".into()], out));
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value[0]["category"], "Transportation");
        assert_eq!(value[0]["confidence"], 0.85);
    }

    #[test]
    fn assess_uses_override_threshold() {
        let ctx = context(true);
        let text = run(|out| assess(&ctx, Decimal::from(-100), Some(Decimal::from(50)), out));
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["is_anomaly"], true);
        assert_eq!(value["anomaly_score"], 2.0);
    }

    #[test]
    fn assess_rejects_zero_threshold() {
        let ctx = context(false);
        let mut buf = Vec::new();
        assert!(assess(&ctx, Decimal::from(-100), Some(Decimal::ZERO), &mut buf).is_err());
    }

    #[test]
    fn seeded_forecast_is_reproducible() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_history(dir.path());
        let ctx = context(true);
        let first = run(|out| forecast(&ctx, &path, Some(Decimal::from(100)), Some(10), Some(5), out));
        let second = run(|out| forecast(&ctx, &path, Some(Decimal::from(100)), Some(10), Some(5), out));
        assert_eq!(first, second);
        let value: serde_json::Value = serde_json::from_str(&first).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 10);
    }

    #[test]
    fn forecast_without_noise_follows_trend() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_history(dir.path());
        let mut settings = Settings::default();
        settings.noise_std_dev = 0.0;
        let ctx = AppContext::new(settings, Arc::new(RuleStore::default()), true).unwrap();
        let text = run(|out| forecast(&ctx, &path, Some(Decimal::from(100)), Some(2), None, out));
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        // (3000 - 300) / 30 = 90 per day
        assert_eq!(value[0]["predicted"], "190.00");
        assert_eq!(value[1]["predicted"], "280.00");
    }

    #[test]
    fn noise_follows_projector_std_dev() {
        let mut settings = Settings::default();
        settings.noise_std_dev = 3.5;
        let ctx = AppContext::new(settings, Arc::new(RuleStore::default()), false).unwrap();
        assert_eq!(ctx.noise(Some(1)).unwrap().std_dev(), ctx.projector.noise_std_dev());
        assert_eq!(ctx.noise(None).unwrap().std_dev(), 3.5);
    }

    #[test]
    fn forecast_past_the_calendar_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_history(dir.path());
        let ctx = context(false);
        let mut buf = Vec::new();
        let err = forecast(&ctx, &path, None, Some(i64::MAX), Some(1), &mut buf).unwrap_err();
        assert!(err.to_string().contains("past the calendar"));
    }

    #[test]
    fn forecast_negative_days_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_history(dir.path());
        let ctx = context(false);
        let mut buf = Vec::new();
        let err = forecast(&ctx, &path, None, Some(-3), Some(1), &mut buf).unwrap_err();
        assert!(err.to_string().contains("horizon_days"));
    }

    #[test]
    fn forecast_missing_history_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(false);
        let mut buf = Vec::new();
        let err = forecast(&ctx, &dir.path().join("nope.csv"), None, None, None, &mut buf).unwrap_err();
        assert!(err.to_string().contains("nope.csv"));
    }

    #[test]
    fn insights_report_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_history(dir.path());
        let ctx = context(false);
        let text = run(|out| insights_report(&ctx, &path, out));
        assert!(text.contains("[success] Savings Rate: You're saving 90.0% of your income"));
        assert!(text.contains("You spent 300.00 on Shopping"));
    }

    #[test]
    fn rules_export_then_check() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.toml");
        let ctx = context(false);
        let text = run(|out| rules(&ctx, &RulesCommand::Export { path: path.clone() }, out));
        assert!(text.starts_with("Exported 8 categories"));
        let text = run(|out| rules(&ctx, &RulesCommand::Check { path: path.clone() }, out));
        assert!(text.contains("8 categories, ok"));
    }

    #[test]
    fn rules_check_rejects_bad_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.toml");
        std::fs::write(&path, "version = 3\n").unwrap();
        let ctx = context(false);
        let mut buf = Vec::new();
        assert!(rules(&ctx, &RulesCommand::Check { path }, &mut buf).is_err());
    }

    #[test]
    fn rules_show_prints_toml() {
        let ctx = context(false);
        let text = run(|out| rules(&ctx, &RulesCommand::Show, out));
        assert!(RuleTable::from_toml(&text).is_ok());
    }

    #[test]
    fn demo_json_report_has_all_sections() {
        let ctx = context(true);
        let text = run(|out| demo(&ctx, Some(1), Some(14), out));
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["transactions"].as_array().unwrap().len(), 9);
        assert_eq!(value["transactions"][0]["category"], "Income");
        assert_eq!(value["insights"].as_array().unwrap().len(), 2);
        assert_eq!(value["forecast"].as_array().unwrap().len(), 14);
    }

    #[test]
    fn demo_text_report_renders() {
        let ctx = context(false);
        let text = run(|out| demo(&ctx, Some(2), Some(3), out));
        assert!(text.contains("Transactions"));
        assert!(text.contains("Salary Deposit"));
        assert!(text.contains("Forecast"));
    }
}
