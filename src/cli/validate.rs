use super::{open_session, print_skipped, print_warnings, DatasetArgs};
use crate::models::{IaaConfig, IssueCategory};
use crate::services::IaaSession;
use crate::Result;
use colored::Colorize;

/// Check task names and shared texts across every file of the dataset
pub async fn run(args: &DatasetArgs, all: bool) -> Result<()> {
    let config = args.load_config()?;

    if all {
        return run_all(args, config);
    }

    let mut session = open_session(args, config, false).await?;
    let validated = session.validate()?;

    println!("{}", "✅ Dataset is consistent".green().bold());
    println!("   Task:      {}", validated.task_name);
    println!("   Documents: {}", validated.document_lengths.len());
    println!("   Text:      {} characters", validated.total_length());

    Ok(())
}

fn run_all(args: &DatasetArgs, config: IaaConfig) -> Result<()> {
    // Parse failures become issues here, so skip the fail-fast prefetch
    let session = IaaSession::open(&args.dataset, config)?;
    print_skipped(&session);

    let report = session.validate_all();
    if args.warnings {
        print_warnings(&session);
    }

    if report.is_valid() {
        println!("{}", "✅ Dataset is consistent".green().bold());
        return Ok(());
    }

    println!("{}", "❌ Consistency issues found".red().bold());
    println!();
    for category in [
        IssueCategory::TaskNameMismatch,
        IssueCategory::TextMismatch,
        IssueCategory::Unparseable,
    ] {
        let count = report.count_by_category(category);
        if count > 0 {
            println!("   {}: {}", category.name(), count);
        }
    }
    println!();
    for issue in &report.issues {
        println!("   {}", issue.format().red());
    }

    anyhow::bail!("{} consistency issue(s)", report.issues.len())
}
