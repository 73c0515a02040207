use std::path::PathBuf;

use anyhow::{Context, Result};
use burn::config::Config;
use clap::{Parser, Subcommand};
use segeval::{
    EvaluationConfig, EvaluationPaths,
    burn_backend_types::{InferenceBackend, InferenceDevice, NAME},
    run_evaluation,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "segeval")]
#[command(about = "Evaluate a binary image-segmentation model on a held-out test set")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a model and write the report and figures
    Evaluate {
        /// Directory containing test_images.npy and test_masks.npy
        #[arg(short, long, default_value = "NT_DATA/preprocessed")]
        data_dir: PathBuf,

        /// Model weight file (.mpk or .bin)
        #[arg(short, long, default_value = "unet_best_model.mpk")]
        model: PathBuf,

        /// Directory for the generated figures
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Evaluation configuration (JSON); defaults apply when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Seed for choosing the visualised samples
        #[arg(long)]
        seed: Option<u64>,

        /// Also write the report as JSON to this path
        #[arg(long)]
        json_report: Option<PathBuf>,
    },

    /// Show backend information
    Info,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let device = InferenceDevice::default();
    tracing::info!(backend = NAME, "using backend");

    match cli.command {
        Commands::Evaluate {
            data_dir,
            model,
            output,
            config,
            seed,
            json_report,
        } => {
            let mut evaluation_config = match &config {
                Some(path) => EvaluationConfig::load(path)
                    .with_context(|| format!("failed to load config {}", path.display()))?,
                None => EvaluationConfig::new(),
            };
            if seed.is_some() {
                evaluation_config.seed = seed;
            }

            let paths = EvaluationPaths::new(data_dir, model, output).with_report_path(json_report);
            run_evaluation::<InferenceBackend>(&paths, &evaluation_config, &device)?;
            Ok(())
        }

        Commands::Info => {
            println!("segeval information:");
            println!("  Backend: {NAME}");
            println!("  Device: {device:?}");
            Ok(())
        }
    }
}
