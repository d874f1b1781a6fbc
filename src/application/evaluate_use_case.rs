// ============================================================
// Layer 2 — EvaluateUseCase
// ============================================================
// Reloads the best checkpoint written by `train` and reports
// its loss and perplexity on the test split:
//
//   Step 1: Load the corpus (rebuilds the same vocabulary)
//   Step 2: Read the saved model config
//   Step 3: Rebuild the architecture, then load its weights
//   Step 4: Batchify the test split and evaluate
//
// Runs on the plain (non-autodiff) backend.

use anyhow::{bail, Result};
use burn::{
    backend::{ndarray::NdArrayDevice, wgpu::WgpuDevice, NdArray, Wgpu},
    prelude::*,
};

use crate::application::epoch_driver::print_test_report;
use crate::data::{
    batchify::{batchify, Batched},
    corpus::Corpus,
};
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::{
    model::{Architecture, LanguageModel},
    trainer::evaluate,
};

#[derive(Debug, Clone)]
pub struct EvaluateConfig {
    pub data:            String,
    pub save:            String,
    pub eval_batch_size: usize,
    pub bptt:            usize,
    pub cuda:            bool,
}

pub struct EvaluateUseCase {
    config: EvaluateConfig,
}

impl EvaluateUseCase {
    pub fn new(config: EvaluateConfig) -> Self {
        Self { config }
    }

    /// Returns the test loss.
    pub fn execute(&self) -> Result<f64> {
        let cfg = &self.config;
        if cfg.eval_batch_size == 0 || cfg.bptt == 0 {
            bail!("eval-batch-size and bptt must be positive");
        }

        let corpus = Corpus::load(&cfg.data)?;
        let loss = if cfg.cuda {
            evaluate_checkpoint::<Wgpu>(cfg, &corpus, &WgpuDevice::default())?
        } else {
            evaluate_checkpoint::<NdArray>(cfg, &corpus, &NdArrayDevice::Cpu)?
        };

        print_test_report(loss);
        Ok(loss)
    }
}

pub fn evaluate_checkpoint<B: Backend>(
    cfg:    &EvaluateConfig,
    corpus: &Corpus,
    device: &B::Device,
) -> Result<f64> {
    let ckpt      = CheckpointManager::new(&cfg.save);
    let model_cfg = ckpt.load_config()?;
    if model_cfg.vocab_size != corpus.vocab_size() {
        bail!(
            "checkpoint vocabulary ({}) does not match corpus '{}' ({})",
            model_cfg.vocab_size,
            cfg.data,
            corpus.vocab_size(),
        );
    }

    let test = batchify(&corpus.test, cfg.eval_batch_size);
    match model_cfg.architecture {
        Architecture::Transformer => {
            let model = ckpt.load_model::<B, _>(model_cfg.init_transformer::<B>(device), device)?;
            score(&model, &test, cfg.bptt, device)
        }
        Architecture::Lstm
        | Architecture::Gru
        | Architecture::RnnTanh
        | Architecture::RnnRelu => {
            let model = ckpt.load_model::<B, _>(model_cfg.init_recurrent::<B>(device), device)?;
            score(&model, &test, cfg.bptt, device)
        }
    }
}

fn score<B: Backend, M: LanguageModel<B>>(
    model:  &M,
    test:   &Batched,
    bptt:   usize,
    device: &B::Device,
) -> Result<f64> {
    tracing::info!("Evaluating {}x{} test grid", test.steps(), test.streams());
    evaluate::<B, M>(model, test, bptt, device)
}
