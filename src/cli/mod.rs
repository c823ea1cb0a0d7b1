// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses arguments with clap and dispatches to Layer 2.
//
// Three commands are supported:
//   1. `train`   - one end-to-end training run
//   2. `samples` - the synthetic Sample Service
//   3. `serve`   - prediction over a trained checkpoint

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, SampleArgs, ServeArgs, TrainArgs};

#[derive(Parser, Debug)]
#[command(
    name = "membership-classifier",
    version,
    about = "Train a character-level classifier that tells category names from random strings."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args) => run_train(args),
            Commands::Samples(args) => run_samples(args),
            Commands::Serve(args) => run_serve(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Collecting training data from: {}", args.sample_service_url);

    let summary = TrainUseCase::new(args.into()).execute()?;

    println!(
        "Run {} in experiment {} finished: val_loss={:.4} val_accuracy={:.4}",
        summary.run_id, summary.experiment_id, summary.val_loss, summary.val_accuracy
    );
    println!(
        "Trained on {} rows, validated on {}",
        summary.train_rows, summary.validation_rows
    );
    println!("Model saved to {}", summary.model_dir.display());
    Ok(())
}

fn run_samples(args: SampleArgs) -> Result<()> {
    use crate::application::sample_use_case::SampleServiceUseCase;

    SampleServiceUseCase::new(args.into()).execute()
}

fn run_serve(args: ServeArgs) -> Result<()> {
    use crate::application::predict_use_case::{PredictUseCase, ServeConfig};

    PredictUseCase::new(ServeConfig::try_from(args)?)?.execute()
}
