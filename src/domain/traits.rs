// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The epoch driver (Layer 2) talks to the model only through
// `EpochRunner`. The real implementation is a burn training
// session in Layer 5; tests substitute a scripted runner that
// returns fixed losses, so the checkpoint/anneal state machine
// is testable without tensors.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;

/// How a training pass over the train split ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpochEnd {
    /// Every window was processed.
    Completed,
    /// A stop was requested; parameters keep every update made so far.
    Interrupted,
}

// ─── EpochRunner ──────────────────────────────────────────────────────────────
/// Anything that can train for one epoch and measure losses.
///
/// Implementations:
///   - TrainingSession → burn model over batchified corpus splits
///   - (tests) ScriptedRunner → replays a list of validation losses
pub trait EpochRunner {
    /// One full pass over the training split at learning rate `lr`.
    fn train_epoch(&mut self, epoch: usize, lr: f64) -> Result<EpochEnd>;

    /// Mean loss over the validation split.
    fn validate(&mut self) -> Result<f64>;

    /// Persist the current parameters as the best model so far.
    fn save_checkpoint(&mut self, epoch: usize, val_loss: f64) -> Result<()>;

    /// Mean loss over the test split.
    fn test(&mut self) -> Result<f64>;
}
