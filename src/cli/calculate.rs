use super::{open_session, DatasetArgs};
use crate::agreement::BuiltinBackend;
use crate::models::{parse_metric_arg, MultiTagPolicy};
use crate::Result;
use clap::Args;
use colored::Colorize;

#[derive(Args, Debug, Clone)]
pub struct CalculateArgs {
    #[command(flatten)]
    pub dataset: DatasetArgs,

    /// Metric request: <metric>=<TAG>[:attr|attr][,<TAG>...] (repeatable)
    #[arg(short, long = "metric")]
    pub metrics: Vec<String>,

    /// Tolerate one annotator tagging a span twice
    /// (reject, first-by-type-name, first-in-file)
    #[arg(long, value_name = "POLICY", num_args = 0..=1, default_missing_value = "first-by-type-name")]
    pub allow_multi_tag: Option<String>,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,

    /// Write the effective config (with command-line metrics) back to the config file
    #[arg(long)]
    pub save_config: bool,
}

pub async fn run(args: &CalculateArgs) -> Result<()> {
    let mut config = args.dataset.load_config()?;

    if let Some(policy) = &args.allow_multi_tag {
        config.multi_tag = policy.parse::<MultiTagPolicy>()?;
    }
    for metric in &args.metrics {
        let (id, targets) = parse_metric_arg(metric)?;
        config.add_targets(&id, targets);
    }

    anyhow::ensure!(
        !config.metrics.is_empty(),
        "No metrics requested (use --metric or a [metrics] table in {})",
        args.dataset.config_path().display()
    );

    if args.save_config {
        let path = args.dataset.config_path();
        config.save(&path)?;
        if !args.json {
            println!("{}", format!("💾 Saved config to {}", path.display()).green());
        }
    }

    let precision = config.precision;
    let mut session = open_session(&args.dataset, config, args.json).await?;
    let report = session.calculate_configured(&BuiltinBackend)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let annotators: Vec<&str> = session
        .approved_slots()
        .into_iter()
        .filter_map(|slot| session.index().annotator(slot))
        .collect();
    println!(
        "{}",
        format!("📊 Agreement over {} annotators ({})", annotators.len(), annotators.join(", "))
            .cyan()
            .bold()
    );
    println!();
    println!("{}", report.render_text(precision));

    let failed = report.failed_count();
    if failed > 0 {
        println!();
        eprintln!("{}", format!("⚠ {} metric(s) failed", failed).yellow());
    }

    Ok(())
}
