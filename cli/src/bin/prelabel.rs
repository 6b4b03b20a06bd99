use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::Result;
use prelabel::Prediction;
use prelabel_cli::{BackendConfig, read_task_documents};
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{self, EnvFilter};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pre-annotate a batch of tasks
    Predict {
        /// Backend configuration (.toml or .json)
        #[arg(short, long)]
        config: PathBuf,
        /// JSON array of Label Studio tasks
        #[arg(short, long)]
        tasks: PathBuf,
        /// Where to write the predictions (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Load the configuration and label config without running the model
    CheckConfig {
        /// Backend configuration (.toml or .json)
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Print a JSON schema
    Schema {
        #[arg(value_enum, default_value_t = SchemaKind::Config)]
        kind: SchemaKind,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SchemaKind {
    Config,
    Prediction,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    // stdout carries the predictions
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Predict { config, tasks, output } => {
            predict(config, tasks, output.as_ref())?;
        }
        Commands::CheckConfig { config } => {
            check_config(config)?;
        }
        Commands::Schema { kind } => {
            let schema = match kind {
                SchemaKind::Config => BackendConfig::schema(),
                SchemaKind::Prediction => Prediction::schema(),
            };
            println!("{}", serde_json::to_string_pretty(&schema)?);
        }
    }

    Ok(())
}

fn predict(config: &PathBuf, tasks: &PathBuf, output: Option<&PathBuf>) -> Result<()> {
    info!("Loading configuration from: {}", config.display());
    let backend = BackendConfig::from_file(config)?;
    let pipeline = backend.build_pipeline()?;

    let documents = read_task_documents(tasks)?;
    info!("Loaded {} tasks from: {}", documents.len(), tasks.display());

    let predictions = pipeline.predict_documents(documents);

    let failed = predictions.iter().filter(|p| p.is_failed()).count();
    if failed > 0 {
        warn!("{} of {} tasks failed", failed, predictions.len());
    }

    let json = serde_json::to_string_pretty(&predictions)?;
    match output {
        Some(path) => {
            fs::write(path, json)?;
            info!("Predictions written to: {}", path.display());
        }
        None => println!("{json}"),
    }

    Ok(())
}

fn check_config(config: &PathBuf) -> Result<()> {
    let backend = BackendConfig::from_file(config)?;
    let schema = backend.label_schema()?;
    info!(
        from_name = %schema.from_name,
        to_name = %schema.to_name,
        image_key = %schema.image_key,
        "Label config OK"
    );

    backend.build_pipeline()?;
    info!(model_version = %backend.model_version, "Backend configuration OK");
    Ok(())
}
