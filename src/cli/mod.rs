// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction. Parses arguments with
// clap and hands off to Layer 2 (application).
//
// Two commands are supported:
//   1. `train`    — trains a model, checkpointing on improvement
//   2. `evaluate` — reloads a checkpoint and scores the test split
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, EvaluateArgs, TrainArgs};

#[derive(Parser, Debug)]
#[command(
    name = "word-lm",
    version = "0.1.0",
    about = "Train a word-level language model; Ctrl-C stops early and still reports test loss."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Dispatch to the matching use case. Only routes, never computes.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)    => run_train(args),
            Commands::Evaluate(args) => run_evaluate(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Starting training on corpus in: {}", args.data);
    let report = TrainUseCase::new(args.into()).execute()?;

    match report.best_val_loss {
        Some(best) => tracing::info!(
            "Finished after {} epochs; best valid loss {:.4}, final lr {}",
            report.epochs_completed, best, report.final_lr,
        ),
        None => tracing::info!("Finished without completing an epoch"),
    }
    if report.interrupted {
        tracing::info!("Run was stopped early with Ctrl-C");
    }
    tracing::info!(
        "Checkpoints written at epochs {:?}; test perplexity {:.2}",
        report.checkpoint_epochs,
        report.test_ppl(),
    );
    Ok(())
}

fn run_evaluate(args: EvaluateArgs) -> Result<()> {
    use crate::application::evaluate_use_case::EvaluateUseCase;

    tracing::info!("Evaluating checkpoint '{}'", args.save);
    EvaluateUseCase::new(args.into()).execute()?;
    Ok(())
}
