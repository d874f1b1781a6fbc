// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates a full training run in order:
//
//   Step 1: Validate configuration          (Layer 2)
//   Step 2: Load and encode the corpus      (Layer 4 - data)
//   Step 3: Batchify the three splits       (Layer 4 - data)
//   Step 4: Route Ctrl-C to a stop flag     (Layer 6 - infra)
//   Step 5: Pick backend and architecture   (Layer 5 - ml)
//   Step 6: Run the epoch driver            (Layer 2)
//   Step 7: Export, if requested            (Layer 5 - ml)
//
// Reference: Burn Book §5 (Training)

use anyhow::{bail, Result};
use burn::{
    backend::{ndarray::NdArrayDevice, wgpu::WgpuDevice, Autodiff, NdArray, Wgpu},
    module::AutodiffModule,
    tensor::backend::AutodiffBackend,
};
use std::path::Path;

use crate::application::epoch_driver::{run_epochs, RunReport};
use crate::data::{batchify::batchify, corpus::Corpus};
use crate::domain::schedule::TrainingState;
use crate::infra::{
    checkpoint::CheckpointManager,
    interrupt::InterruptFlag,
    metrics::MetricsLogger,
};
use crate::ml::{
    exporter::export,
    model::{Architecture, LanguageModel, LanguageModelConfig},
    trainer::{StepOptions, TrainingSession},
};

/// Batch size of the baked export input.
pub const EXPORT_BATCH_SIZE: usize = 1;

// ─── Training Configuration ──────────────────────────────────────────────────
// All hyperparameters for a training run.
#[derive(Debug, Clone)]
pub struct TrainConfig {
    pub data:            String,
    pub architecture:    Architecture,
    pub emsize:          usize,
    pub nhid:            usize,
    pub nlayers:         usize,
    pub nhead:           usize,
    pub d_ff:            usize,
    pub lr:              f64,
    pub clip:            f64,
    pub epochs:          usize,
    pub batch_size:      usize,
    pub eval_batch_size: usize,
    pub bptt:            usize,
    pub dropout:         f64,
    pub tied:            bool,
    pub seed:            u64,
    pub cuda:            bool,
    pub log_interval:    usize,
    pub save:            String,
    pub export:          Option<String>,
    pub metrics:         Option<String>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            data:            "./data/wikitext-2".to_string(),
            architecture:    Architecture::Transformer,
            emsize:          200,
            nhid:            200,
            nlayers:         2,
            nhead:           4,
            d_ff:            256,
            lr:              20.0,
            clip:            0.25,
            epochs:          40,
            batch_size:      20,
            eval_batch_size: 10,
            bptt:            35,
            dropout:         0.2,
            tied:            false,
            seed:            1111,
            cuda:            false,
            log_interval:    200,
            save:            "model".to_string(),
            export:          None,
            metrics:         None,
        }
    }
}

impl TrainConfig {
    /// Checks that don't depend on the corpus.
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 || self.eval_batch_size == 0 {
            bail!("batch sizes must be positive");
        }
        if self.bptt == 0 {
            bail!("bptt must be positive");
        }
        if self.epochs == 0 {
            bail!("epochs must be positive");
        }
        if self.log_interval == 0 {
            bail!("log-interval must be positive");
        }
        if self.lr.is_nan() || self.lr <= 0.0 {
            bail!("lr must be positive, got {}", self.lr);
        }
        if self.clip.is_nan() || self.clip <= 0.0 {
            bail!("clip must be positive, got {}", self.clip);
        }
        self.model_config(1).validate()
    }

    pub fn model_config(&self, vocab_size: usize) -> LanguageModelConfig {
        LanguageModelConfig::new(self.architecture, vocab_size)
            .with_emsize(self.emsize)
            .with_nhid(self.nhid)
            .with_nlayers(self.nlayers)
            .with_nhead(self.nhead)
            .with_d_ff(self.d_ff)
            .with_dropout(self.dropout)
            .with_tied(self.tied)
    }

    fn step_options(&self) -> StepOptions {
        StepOptions { bptt: self.bptt, clip: self.clip, log_interval: self.log_interval }
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<RunReport> {
        let cfg = &self.config;
        cfg.validate()?;

        let corpus    = Corpus::load(&cfg.data)?;
        let interrupt = InterruptFlag::install()?;

        if cfg.cuda {
            let device = WgpuDevice::default();
            tracing::info!("Using WGPU device: {:?}", device);
            run::<Autodiff<Wgpu>>(cfg, &corpus, device, interrupt)
        } else {
            tracing::info!("Using CPU (ndarray) device; pass --cuda to train on the GPU");
            run::<Autodiff<NdArray>>(cfg, &corpus, NdArrayDevice::Cpu, interrupt)
        }
    }
}

/// Build the requested architecture on backend `B` and train it.
pub fn run<B: AutodiffBackend>(
    cfg:       &TrainConfig,
    corpus:    &Corpus,
    device:    B::Device,
    interrupt: InterruptFlag,
) -> Result<RunReport> {
    B::seed(cfg.seed);

    let model_cfg = cfg.model_config(corpus.vocab_size());
    model_cfg.validate()?;

    match cfg.architecture {
        Architecture::Transformer => {
            let model = model_cfg.init_transformer::<B>(&device);
            run_session(cfg, corpus, model, model_cfg, device, interrupt)
        }
        Architecture::Lstm
        | Architecture::Gru
        | Architecture::RnnTanh
        | Architecture::RnnRelu => {
            let model = model_cfg.init_recurrent::<B>(&device);
            run_session(cfg, corpus, model, model_cfg, device, interrupt)
        }
    }
}

fn run_session<B, M>(
    cfg:       &TrainConfig,
    corpus:    &Corpus,
    model:     M,
    model_cfg: LanguageModelConfig,
    device:    B::Device,
    interrupt: InterruptFlag,
) -> Result<RunReport>
where
    B: AutodiffBackend,
    M: AutodiffModule<B> + LanguageModel<B>,
    M::InnerModule: LanguageModel<B::InnerBackend>,
{
    let splits = (
        batchify(&corpus.train, cfg.batch_size),
        batchify(&corpus.valid, cfg.eval_batch_size),
        batchify(&corpus.test,  cfg.eval_batch_size),
    );
    tracing::info!(
        "Model ready: {} with {} layers, vocab={}, train grid {}x{}",
        model_cfg.architecture,
        model_cfg.nlayers,
        model.vocab_size(),
        splits.0.steps(),
        splits.0.streams(),
    );
    if splits.0.is_empty() {
        tracing::warn!(
            "Training split has fewer tokens than --batch-size {}; epochs will not update the model",
            cfg.batch_size,
        );
    }

    let metrics = cfg.metrics.as_deref().map(MetricsLogger::new).transpose()?;
    if let Some(logger) = &metrics {
        tracing::info!("Writing epoch metrics to '{}'", logger.csv_path().display());
    }
    let mut session = TrainingSession::<B, M>::new(
        model,
        model_cfg,
        splits,
        cfg.step_options(),
        CheckpointManager::new(&cfg.save),
        interrupt.clone(),
        device.clone(),
    );

    let report = run_epochs(
        &mut session,
        cfg.epochs,
        TrainingState::new(cfg.lr),
        &interrupt,
        metrics.as_ref(),
    )?;

    if let Some(path) = &cfg.export {
        export::<B::InnerBackend, M::InnerModule>(
            &session.model().valid(),
            session.model_config(),
            Path::new(path),
            EXPORT_BATCH_SIZE,
            cfg.bptt,
            &device,
        )?;
    }

    Ok(report)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    type TestBackend = Autodiff<NdArray>;

    fn write_corpus(dir: &Path) {
        let line = "the cat sat on the mat and the dog sat on the log\n";
        fs::write(dir.join("train.txt"), line.repeat(30)).unwrap();
        fs::write(dir.join("valid.txt"), line.repeat(6)).unwrap();
        fs::write(dir.join("test.txt"),  line.repeat(6)).unwrap();
    }

    fn tiny_config(dir: &Path, architecture: Architecture) -> TrainConfig {
        TrainConfig {
            data:         dir.display().to_string(),
            architecture,
            emsize:       8,
            nhid:         8,
            nlayers:      1,
            nhead:        2,
            d_ff:         16,
            lr:           1.0,
            epochs:       2,
            batch_size:   4,
            eval_batch_size: 2,
            bptt:         6,
            dropout:      0.0,
            log_interval: 1000,
            save:         dir.join("ckpt").join("model").display().to_string(),
            export:       Some(dir.join("export").display().to_string()),
            metrics:      Some(dir.join("metrics.csv").display().to_string()),
            ..TrainConfig::default()
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(TrainConfig::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_configs_are_rejected() {
        let zero_bptt = TrainConfig { bptt: 0, ..TrainConfig::default() };
        assert!(zero_bptt.validate().is_err());

        let bad_heads = TrainConfig { emsize: 10, nhead: 4, ..TrainConfig::default() };
        assert!(bad_heads.validate().is_err());

        let bad_tie = TrainConfig {
            architecture: Architecture::Lstm,
            tied: true,
            nhid: 100,
            ..TrainConfig::default()
        };
        assert!(bad_tie.validate().is_err());

        let bad_clip = TrainConfig { clip: 0.0, ..TrainConfig::default() };
        assert!(bad_clip.validate().is_err());
    }

    #[test]
    fn test_end_to_end_transformer_run() {
        let dir = tempfile::tempdir().unwrap();
        write_corpus(dir.path());
        let cfg    = tiny_config(dir.path(), Architecture::Transformer);
        let corpus = Corpus::load(&cfg.data).unwrap();

        let report = run::<TestBackend>(&cfg, &corpus, NdArrayDevice::Cpu, InterruptFlag::new())
            .unwrap();

        assert_eq!(report.epochs_completed, 2);
        assert!(!report.interrupted);
        assert_eq!(report.checkpoint_epochs.first(), Some(&1));
        assert!(report.test_loss.is_finite());
        assert!(dir.path().join("ckpt").join("model.mpk.gz").exists());
        assert!(dir.path().join("export.json").exists());
        assert!(dir.path().join("export.manifest.json").exists());
        assert_eq!(fs::read_to_string(dir.path().join("metrics.csv")).unwrap().lines().count(), 3);
    }

    #[test]
    fn test_interrupted_run_still_reports_test_loss() {
        let dir = tempfile::tempdir().unwrap();
        write_corpus(dir.path());
        let cfg    = TrainConfig { export: None, ..tiny_config(dir.path(), Architecture::Gru) };
        let corpus = Corpus::load(&cfg.data).unwrap();
        let flag   = InterruptFlag::new();
        flag.trigger();

        let report = run::<TestBackend>(&cfg, &corpus, NdArrayDevice::Cpu, flag).unwrap();
        assert!(report.interrupted);
        assert_eq!(report.epochs_completed, 0);
        assert!(report.checkpoint_epochs.is_empty());
        assert!(report.test_loss.is_finite());
    }
}
