// ============================================================
// Layer 5 — Training and Evaluation Passes
// ============================================================
// One training pass walks the train grid window by window:
//
//   window → tensors → forward (causal mask) → cross-entropy
//          → backward → global clip → param -= lr · grad
//
// Evaluation walks a grid the same way on `model.valid()`,
// i.e. on the inner backend with no autodiff graph and with
// dropout disabled, and returns the token-weighted mean loss.
//
// Key burn insight:
//   - Training uses an Autodiff<…> backend for gradients
//   - model.valid() returns the same model on the inner backend
//   - Window tensors must be built on the matching backend
//
// Reference: Burn Book §5 (Training)

use anyhow::{bail, Result};
use burn::{
    module::AutodiffModule,
    nn::loss::CrossEntropyLossConfig,
    optim::GradientsParams,
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use std::time::Instant;

use crate::data::{
    batchify::Batched,
    batcher::{WindowBatch, WindowBatcher},
};
use crate::domain::traits::{EpochEnd, EpochRunner};
use crate::infra::{checkpoint::CheckpointManager, interrupt::InterruptFlag};
use crate::ml::model::{LanguageModel, LanguageModelConfig};
use crate::ml::optim::clipped_step;

/// Step-level knobs shared by training and evaluation.
#[derive(Debug, Clone, Copy)]
pub struct StepOptions {
    pub bptt:         usize,
    pub clip:         f64,
    pub log_interval: usize,
}

/// Forward one window and score it against its targets.
pub fn window_loss<B, M>(
    model: &M,
    batch: WindowBatch<B>,
    state: Option<M::State>,
) -> (Tensor<B, 1>, Option<M::State>)
where
    B: Backend,
    M: LanguageModel<B>,
{
    let (logits, state) = model.forward_window(batch.input, batch.mask, state);
    let [len, streams, vocab] = logits.dims();
    let flat = logits.reshape([len * streams, vocab]);

    let ce   = CrossEntropyLossConfig::new().init(&flat.device());
    (ce.forward(flat, batch.targets), state)
}

// ─── Interval meter ───────────────────────────────────────────────────────────
/// Mean loss, perplexity and timing over the batches since the last report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntervalReport {
    pub mean_loss:    f64,
    pub ppl:          f64,
    pub ms_per_batch: f64,
}

/// Accumulates per-batch losses between progress lines.
#[derive(Debug)]
pub struct IntervalMeter {
    total_loss: f64,
    batches:    usize,
    started:    Instant,
}

impl Default for IntervalMeter {
    fn default() -> Self {
        Self::new()
    }
}

impl IntervalMeter {
    pub fn new() -> Self {
        Self { total_loss: 0.0, batches: 0, started: Instant::now() }
    }

    pub fn record(&mut self, loss: f64) {
        self.total_loss += loss;
        self.batches    += 1;
    }

    /// Report on the batches recorded since the previous `take` and
    /// start a fresh interval. `None` if nothing was recorded.
    pub fn take(&mut self) -> Option<IntervalReport> {
        let elapsed = self.started.elapsed().as_secs_f64();
        let taken   = std::mem::replace(self, Self::new());
        if taken.batches == 0 {
            return None;
        }

        let mean_loss = taken.total_loss / taken.batches as f64;
        Some(IntervalReport {
            mean_loss,
            ppl: mean_loss.exp(),
            ms_per_batch: elapsed * 1000.0 / taken.batches as f64,
        })
    }
}

// ─── Training pass ────────────────────────────────────────────────────────────
/// One epoch over `data`. Checks `interrupt` after every batch and
/// returns early, keeping the updates made so far, when it is set.
pub fn train_epoch<B, M>(
    mut model: M,
    data:      &Batched,
    opts:      &StepOptions,
    epoch:     usize,
    lr:        f64,
    interrupt: &InterruptFlag,
    device:    &B::Device,
) -> (M, EpochEnd)
where
    B: AutodiffBackend,
    M: AutodiffModule<B> + LanguageModel<B>,
{
    let batcher     = WindowBatcher::<B>::new(device.clone());
    let num_batches = data.batch_count(opts.bptt);

    let mut state: Option<M::State> = None;
    let mut meter = IntervalMeter::new();

    for (batch_idx, start) in data.window_starts(opts.bptt).enumerate() {
        let batch = batcher.batch(&data.window(start, opts.bptt));
        let prev  = state.take().map(M::detach_state);

        let (loss, next) = window_loss(&model, batch, prev);
        state = next;
        meter.record(loss.clone().into_scalar().elem::<f64>());

        let grads = GradientsParams::from_grads(loss.backward(), &model);
        let (updated, _norm) = clipped_step::<B, M>(model, grads, lr, opts.clip);
        model = updated;

        if batch_idx > 0 && batch_idx % opts.log_interval == 0 {
            if let Some(report) = meter.take() {
                println!(
                    "| epoch {:3} | {:5}/{:5} batches | lr {:02.2} | ms/batch {:5.2} | loss {:5.2} | ppl {:8.2}",
                    epoch, batch_idx, num_batches, lr, report.ms_per_batch, report.mean_loss, report.ppl,
                );
            }
        }

        if interrupt.is_set() {
            tracing::warn!("Stop requested during epoch {} at batch {}", epoch, batch_idx);
            return (model, EpochEnd::Interrupted);
        }
    }

    (model, EpochEnd::Completed)
}

// ─── Evaluation pass ──────────────────────────────────────────────────────────
/// Token-weighted mean cross-entropy over every window of `data`.
/// Takes the model by reference and updates nothing, so repeated
/// calls give identical results.
pub fn evaluate<B, M>(model: &M, data: &Batched, bptt: usize, device: &B::Device) -> Result<f64>
where
    B: Backend,
    M: LanguageModel<B>,
{
    if data.steps() < 2 {
        bail!("split has {} time steps; need at least 2 to evaluate", data.steps());
    }

    let batcher = WindowBatcher::<B>::new(device.clone());
    let mut state: Option<M::State> = None;
    let mut total_loss = 0.0f64;

    for start in data.window_starts(bptt) {
        let window = data.window(start, bptt);
        let len    = window.len;
        let (loss, next) = window_loss(model, batcher.batch(&window), state.take());
        state = next;
        total_loss += len as f64 * loss.into_scalar().elem::<f64>();
    }

    Ok(total_loss / (data.steps() - 1) as f64)
}

// ─── TrainingSession ──────────────────────────────────────────────────────────
/// The burn-backed `EpochRunner`: owns the model, the three grids
/// and the checkpoint location.
pub struct TrainingSession<B: AutodiffBackend, M> {
    model:        M,
    model_config: LanguageModelConfig,
    train:        Batched,
    valid:        Batched,
    test:         Batched,
    opts:         StepOptions,
    checkpoints:  CheckpointManager,
    interrupt:    InterruptFlag,
    device:       B::Device,
}

impl<B, M> TrainingSession<B, M>
where
    B: AutodiffBackend,
    M: AutodiffModule<B> + LanguageModel<B>,
    M::InnerModule: LanguageModel<B::InnerBackend>,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        model:        M,
        model_config: LanguageModelConfig,
        splits:       (Batched, Batched, Batched),
        opts:         StepOptions,
        checkpoints:  CheckpointManager,
        interrupt:    InterruptFlag,
        device:       B::Device,
    ) -> Self {
        let (train, valid, test) = splits;
        Self { model, model_config, train, valid, test, opts, checkpoints, interrupt, device }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn model_config(&self) -> &LanguageModelConfig {
        &self.model_config
    }

    fn evaluate_split(&self, split: &Batched) -> Result<f64> {
        evaluate::<B::InnerBackend, M::InnerModule>(
            &self.model.valid(),
            split,
            self.opts.bptt,
            &self.device,
        )
    }
}

impl<B, M> EpochRunner for TrainingSession<B, M>
where
    B: AutodiffBackend,
    M: AutodiffModule<B> + LanguageModel<B>,
    M::InnerModule: LanguageModel<B::InnerBackend>,
{
    fn train_epoch(&mut self, epoch: usize, lr: f64) -> Result<EpochEnd> {
        let (model, end) = train_epoch::<B, M>(
            self.model.clone(),
            &self.train,
            &self.opts,
            epoch,
            lr,
            &self.interrupt,
            &self.device,
        );
        self.model = model;
        Ok(end)
    }

    fn validate(&mut self) -> Result<f64> {
        self.evaluate_split(&self.valid)
    }

    fn save_checkpoint(&mut self, epoch: usize, val_loss: f64) -> Result<()> {
        self.checkpoints.save_model::<B, M>(&self.model, &self.model_config)?;
        tracing::info!("Checkpoint saved for epoch {} (valid loss {:.4})", epoch, val_loss);
        Ok(())
    }

    fn test(&mut self) -> Result<f64> {
        self.evaluate_split(&self.test)
    }
}
