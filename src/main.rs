use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use colored::Colorize;
use iaa_calc::cli::calculate::CalculateArgs;
use iaa_calc::cli::DatasetArgs;
use iaa_calc::Result;
use std::io;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "iaa-calc")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Inter-annotator agreement for span annotation datasets", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show which annotator produced which document
    Index {
        /// Dataset root
        dataset: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check that every file shares the task name and its document's text
    Validate {
        #[command(flatten)]
        dataset: DatasetArgs,

        /// Report every issue instead of stopping at the first one
        #[arg(long)]
        all: bool,
    },

    /// Compute agreement metrics
    Calculate(CalculateArgs),

    /// Generate shell completions
    Completions {
        /// Shell type (bash, zsh, fish, powershell)
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() {
    let cli = Cli::parse();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("{}", format!("Error: failed to create tokio runtime: {}", e).red());
            std::process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(run_async(cli)) {
        eprintln!("{}", format!("Error: {:#}", e).red());
        std::process::exit(1);
    }
}

async fn run_async(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Index { dataset, json } => {
            iaa_calc::cli::index::run(&dataset, json)?;
        }

        Commands::Validate { dataset, all } => {
            println!(
                "{}",
                format!("🔍 Validating {}", dataset.dataset.display()).cyan()
            );
            iaa_calc::cli::validate::run(&dataset, all).await?;
        }

        Commands::Calculate(args) => {
            iaa_calc::cli::calculate::run(&args).await?;
        }

        Commands::Completions { shell } => {
            generate(shell, &mut Cli::command(), "iaa-calc", &mut io::stdout());
        }
    }

    Ok(())
}
