pub mod calculate;
pub mod index;
pub mod validate;

use crate::models::IaaConfig;
use crate::services::IaaSession;
use crate::Result;
use anyhow::Context;
use clap::Args;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;
use std::path::PathBuf;

/// Dataset selection and config overrides shared by the commands
#[derive(Args, Debug, Clone)]
pub struct DatasetArgs {
    /// Dataset root (flat directory or one subdirectory per annotator)
    pub dataset: PathBuf,

    /// Config file (defaults to <dataset>/iaa.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Task name every file must declare
    #[arg(long)]
    pub task: Option<String>,

    /// Annotators to ignore (comma separated symbols)
    #[arg(long, value_delimiter = ',')]
    pub ignore: Vec<String>,

    /// Parallel parse workers
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Print non-fatal parse warnings
    #[arg(long)]
    pub warnings: bool,
}

impl DatasetArgs {
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(|| IaaConfig::default_path(&self.dataset))
    }

    /// Load the config file and apply command-line overrides
    pub fn load_config(&self) -> Result<IaaConfig> {
        let path = self.config_path();
        let mut config = IaaConfig::load(&path)
            .with_context(|| format!("Failed to load config {}", path.display()))?;

        if let Some(task) = &self.task {
            config.task_name = Some(task.clone());
        }
        for annotator in &self.ignore {
            if !config.ignored_annotators.contains(annotator) {
                config.ignored_annotators.push(annotator.clone());
            }
        }
        if let Some(workers) = self.workers {
            anyhow::ensure!(workers > 0, "--workers must be at least 1");
            config.parse_workers = workers;
        }

        Ok(config)
    }
}

/// Open a session and parse every file on the worker pool
pub async fn open_session(
    args: &DatasetArgs,
    config: IaaConfig,
    quiet: bool,
) -> Result<IaaSession> {
    let session = IaaSession::open(&args.dataset, config)
        .with_context(|| format!("Failed to index {}", args.dataset.display()))?;

    if !quiet {
        print_skipped(&session);
    }

    let progress = if quiet || !std::io::stdout().is_terminal() {
        None
    } else {
        let pb = ProgressBar::new(session.index().documents().len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.cyan} Parsing [{bar:30.cyan/blue}] {pos}/{len} documents")?
                .progress_chars("=> "),
        );
        Some(pb)
    };

    let result = session.prefetch(progress.clone()).await;
    if let Some(pb) = progress {
        pb.finish_and_clear();
    }
    result?;

    if args.warnings {
        print_warnings(&session);
    }

    Ok(session)
}

/// Files in the dataset root that do not follow `<document>_<annotator>.xml`
pub fn print_skipped(session: &IaaSession) {
    for path in &session.index().skipped {
        eprintln!(
            "{}",
            format!("⚠ Skipping {} (not <document>_<annotator>.xml)", path.display()).yellow()
        );
    }
}

pub fn print_warnings(session: &IaaSession) {
    let warnings = session.warnings();
    if warnings.is_empty() {
        println!("{}", "No parse warnings".green());
        return;
    }

    println!("{}", format!("⚠ Parse warnings ({} files)", warnings.len()).yellow().bold());
    for (path, text) in &warnings {
        println!("   {}", path.display().to_string().bright_black());
        for line in text.lines() {
            println!("     - {}", line);
        }
    }
    println!();
}
