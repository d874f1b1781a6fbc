// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores the best model so far.
//
// What gets written, for a base path such as `runs/model`:
//   runs/model.mpk.gz       — every parameter, full precision,
//                             MessagePack + gzip
//   runs/model.config.json  — LanguageModelConfig, needed to
//                             rebuild the exact architecture
//                             before loading weights into it
//
// Both files are overwritten each time validation improves.
//
// Reference: Burn Book §5 (Records and Checkpointing)
//            Rust Book §9 (Error Handling)

use anyhow::{Context, Result};
use burn::{
    prelude::*,
    record::{FullPrecisionSettings, NamedMpkGzFileRecorder},
};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::ml::model::LanguageModelConfig;

type CheckpointRecorder = NamedMpkGzFileRecorder<FullPrecisionSettings>;

pub struct CheckpointManager {
    /// Base path without extension; the recorder appends `.mpk.gz`
    base: PathBuf,
}

impl CheckpointManager {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn weights_path(&self) -> PathBuf {
        self.base.with_extension("mpk.gz")
    }

    pub fn config_path(&self) -> PathBuf {
        self.base.with_extension("config.json")
    }

    /// Write weights and architecture config, replacing any previous checkpoint.
    pub fn save_model<B: Backend, M: Module<B>>(
        &self,
        model:  &M,
        config: &LanguageModelConfig,
    ) -> Result<()> {
        if let Some(parent) = self.base.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Cannot create '{}'", parent.display()))?;
        }

        model
            .clone()
            .save_file(self.base.clone(), &CheckpointRecorder::new())
            .with_context(|| {
                format!("Failed to save checkpoint to '{}'", self.weights_path().display())
            })?;

        write_json(&self.config_path(), config)?;
        tracing::debug!("Saved checkpoint '{}'", self.weights_path().display());
        Ok(())
    }

    /// Load saved weights into `model`, which must have been built
    /// from the config returned by `load_config`.
    pub fn load_model<B: Backend, M: Module<B>>(
        &self,
        model:  M,
        device: &B::Device,
    ) -> Result<M> {
        let model = model
            .load_file(self.base.clone(), &CheckpointRecorder::new(), device)
            .with_context(|| {
                format!(
                    "Cannot load checkpoint '{}'. Have you trained the model first?",
                    self.weights_path().display()
                )
            })?;

        tracing::info!("Loaded checkpoint '{}'", self.weights_path().display());
        Ok(model)
    }

    pub fn load_config(&self) -> Result<LanguageModelConfig> {
        let path = self.config_path();
        let json = fs::read_to_string(&path)
            .with_context(|| {
                format!(
                    "Cannot read model config from '{}'. \
                     Make sure you have run 'train' before 'evaluate'.",
                    path.display()
                )
            })?;
        serde_json::from_str(&json)
            .with_context(|| format!("Malformed model config '{}'", path.display()))
    }
}

/// Pretty-print `value` as JSON to `path`.
pub fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json)
        .with_context(|| format!("Cannot write '{}'", path.display()))
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::model::Architecture;
    use crate::ml::recurrent::RecurrentLm;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn cfg() -> LanguageModelConfig {
        LanguageModelConfig::new(Architecture::Gru, 9)
            .with_emsize(4)
            .with_nhid(4)
            .with_nlayers(1)
    }

    fn embedding(model: &RecurrentLm<TestBackend>) -> Vec<f32> {
        model.embedding.weight.val().into_data().to_vec::<f32>().unwrap()
    }

    #[test]
    fn test_paths_follow_base() {
        let ckpt = CheckpointManager::new("runs/model.pt");
        assert_eq!(ckpt.weights_path(), PathBuf::from("runs/model.mpk.gz"));
        assert_eq!(ckpt.config_path(),  PathBuf::from("runs/model.config.json"));
    }

    #[test]
    fn test_save_then_load_restores_weights_and_config() {
        let dir    = tempfile::tempdir().unwrap();
        let ckpt   = CheckpointManager::new(dir.path().join("nested").join("model"));
        let device = Default::default();

        let saved: RecurrentLm<TestBackend> = cfg().init_recurrent(&device);
        ckpt.save_model::<TestBackend, _>(&saved, &cfg()).unwrap();

        let config = ckpt.load_config().unwrap();
        assert_eq!(config.architecture, Architecture::Gru);
        assert_eq!(config.vocab_size, 9);

        // a fresh init has different random weights until loaded
        let fresh: RecurrentLm<TestBackend> = config.init_recurrent(&device);
        let loaded = ckpt.load_model::<TestBackend, _>(fresh, &device).unwrap();
        assert_eq!(embedding(&loaded), embedding(&saved));
    }

    #[test]
    fn test_load_without_checkpoint_is_an_error() {
        let dir  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path().join("missing"));
        let err  = ckpt.load_config().unwrap_err();
        assert!(err.to_string().contains("train"));
    }
}
