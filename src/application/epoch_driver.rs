// ============================================================
// Layer 2 — Epoch Driver
// ============================================================
// The training state machine:
//
//   ┌──────────┐   ┌────────────┐   ┌─────────────────────┐
//   │ training │ → │ validating │ → │ checkpoint decision │ ─┐
//   └──────────┘   └────────────┘   └─────────────────────┘  │
//        ↑                                                   │
//        └──────────────────── next epoch ───────────────────┘
//
// Decision: a strictly better validation loss saves the model,
// anything else quarters the learning rate and keeps the old
// checkpoint. The loop ends after `epochs` epochs or on Ctrl-C;
// either way the test split is evaluated with the parameters
// currently in memory and reported.

use anyhow::Result;
use std::time::Instant;

use crate::domain::{
    schedule::{EpochOutcome, TrainingState},
    traits::{EpochEnd, EpochRunner},
};
use crate::infra::{
    interrupt::InterruptFlag,
    metrics::{EpochMetrics, MetricsLogger},
};

const RULE_WIDTH: usize = 89;

/// Summary of a finished run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    /// Epochs that went through validation
    pub epochs_completed: usize,
    /// Epoch numbers that wrote a checkpoint
    pub checkpoint_epochs: Vec<usize>,
    pub best_val_loss:    Option<f64>,
    pub final_lr:         f64,
    pub test_loss:        f64,
    pub interrupted:      bool,
}

impl RunReport {
    pub fn test_ppl(&self) -> f64 {
        self.test_loss.exp()
    }
}

pub fn run_epochs<R: EpochRunner>(
    runner:    &mut R,
    epochs:    usize,
    mut state: TrainingState,
    interrupt: &InterruptFlag,
    metrics:   Option<&MetricsLogger>,
) -> Result<RunReport> {
    let mut epochs_completed  = 0usize;
    let mut checkpoint_epochs = Vec::new();
    let mut interrupted       = false;

    for epoch in 1..=epochs {
        if interrupt.is_set() {
            interrupted = true;
            break;
        }

        let epoch_start = Instant::now();
        let lr          = state.lr();

        if runner.train_epoch(epoch, lr)? == EpochEnd::Interrupted {
            interrupted = true;
            break;
        }

        let val_loss = runner.validate()?;
        let elapsed  = epoch_start.elapsed().as_secs_f64();
        print_epoch_report(epoch, elapsed, val_loss);

        let outcome = state.observe(val_loss);
        if outcome == EpochOutcome::Improved {
            runner.save_checkpoint(epoch, val_loss)?;
            checkpoint_epochs.push(epoch);
        } else {
            tracing::info!("No improvement at epoch {}, lr {} → {}", epoch, lr, state.lr());
        }

        if let Some(logger) = metrics {
            logger.log(&EpochMetrics::new(
                epoch, lr, val_loss, elapsed, outcome == EpochOutcome::Improved,
            ))?;
        }
        epochs_completed = epoch;
    }

    if interrupted {
        println!("{}", "-".repeat(RULE_WIDTH));
        println!("Exiting from training early");
        tracing::warn!("Interrupted after {} completed epochs", epochs_completed);
    }

    let test_loss = runner.test()?;
    print_test_report(test_loss);

    Ok(RunReport {
        epochs_completed,
        checkpoint_epochs,
        best_val_loss: state.best_val_loss(),
        final_lr:      state.lr(),
        test_loss,
        interrupted,
    })
}

pub fn print_epoch_report(epoch: usize, elapsed_secs: f64, val_loss: f64) {
    println!("{}", "-".repeat(RULE_WIDTH));
    println!(
        "| end of epoch {:3} | time: {:5.2}s | valid loss {:5.2} | valid ppl {:8.2}",
        epoch, elapsed_secs, val_loss, val_loss.exp(),
    );
    println!("{}", "-".repeat(RULE_WIDTH));
}

pub fn print_test_report(test_loss: f64) {
    println!("{}", "=".repeat(RULE_WIDTH));
    println!(
        "| End of training | test loss {:5.2} | test ppl {:8.2}",
        test_loss, test_loss.exp(),
    );
    println!("{}", "=".repeat(RULE_WIDTH));
}
