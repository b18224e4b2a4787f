use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use crftag_trainer::{TrainConfig, run_prediction, run_training};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "crftag", version, about = "Train and run a BiLSTM-CRF sequence tagger")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Train a model
    Train {
        /// BIO dataset (`.jsonl` or tab-separated); the builtin toy corpus if omitted
        #[arg(long)]
        data: Option<PathBuf>,

        /// JSON file with training hyperparameters
        #[arg(long)]
        config: Option<PathBuf>,

        /// Override the number of epochs
        #[arg(long)]
        epochs: Option<usize>,

        /// Override the learning rate
        #[arg(long)]
        lr: Option<f64>,

        /// Shuffle sentences every epoch
        #[arg(long)]
        shuffle: bool,

        /// Directory to write the trained model to
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Tag a sentence with a saved model
    Predict {
        /// Directory written by `crftag train --output`
        #[arg(short, long)]
        model: PathBuf,

        /// Tokens of the sentence to tag
        #[arg(required = true)]
        tokens: Vec<String>,
    },
}

/// Start from the config file (or defaults) and apply command-line overrides.
fn resolve_config(
    config: Option<&Path>,
    epochs: Option<usize>,
    lr: Option<f64>,
    shuffle: bool,
) -> anyhow::Result<TrainConfig> {
    let mut train_config = match config {
        Some(path) => TrainConfig::from_file(path)?,
        None => TrainConfig::default(),
    };
    if let Some(epochs) = epochs {
        train_config.epochs = epochs;
    }
    if let Some(lr) = lr {
        train_config.learning_rate = lr;
    }
    train_config.shuffle |= shuffle;
    Ok(train_config)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Train {
            data,
            config,
            epochs,
            lr,
            shuffle,
            output,
        } => {
            let train_config = resolve_config(config.as_deref(), epochs, lr, shuffle)?;
            let report = run_training(train_config, data.as_deref(), output.as_deref())
                .context("Training failed")?;
            let last = report.epoch_losses.last().copied().unwrap_or_default();
            println!("before: {:.4} {:?}", report.before.score, report.before.tags);
            println!("after:  {:.4} {:?}", report.after.score, report.after.tags);
            println!(
                "final loss {:.4}, accuracy {:.2}%",
                last,
                report.accuracy * 100.0
            );
        }
        Command::Predict { model, tokens } => {
            let (score, tagged) = run_prediction(&model, &tokens)?;
            let line = tagged
                .iter()
                .map(|(token, tag)| format!("{}/{}", token, tag))
                .collect::<Vec<_>>()
                .join(" ");
            println!("{}\t(score {:.4})", line, score);
        }
    }

    Ok(())
}
