// ============================================================
// Layer 5 — Model Export
// ============================================================
// Writes the trained model in a portable, framework-neutral
// form for external inference:
//
//   <path>.json           — every parameter, full precision,
//                           human-readable JSON record
//   <path>.manifest.json  — architecture config plus the fixed
//                           input shape [seq_len, batch_size]
//                           and the matching output shape
//
// An all-zero input of the baked shape is run through the model
// first, so an export only exists for shapes that actually work.

use anyhow::{Context, Result};
use burn::{
    prelude::*,
    record::{FullPrecisionSettings, PrettyJsonFileRecorder},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::infra::checkpoint::write_json;
use crate::ml::mask::causal_mask;
use crate::ml::model::{LanguageModel, LanguageModelConfig};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportManifest {
    pub model:        LanguageModelConfig,
    /// `[seq_len, batch_size]` token ids, time-major
    pub input_shape:  [usize; 2],
    /// `[seq_len, batch_size, vocab]` logits
    pub output_shape: [usize; 3],
    /// Parameter record written next to this manifest
    pub record_file:  String,
}

pub fn record_path(path: &Path) -> PathBuf {
    path.with_extension("json")
}

pub fn manifest_path(path: &Path) -> PathBuf {
    path.with_extension("manifest.json")
}

/// Export `model` (already in evaluation form) with a baked input
/// shape of `[seq_len, batch_size]`.
pub fn export<B, M>(
    model:      &M,
    config:     &LanguageModelConfig,
    path:       &Path,
    batch_size: usize,
    seq_len:    usize,
    device:     &B::Device,
) -> Result<ExportManifest>
where
    B: Backend,
    M: LanguageModel<B>,
{
    let dummy = Tensor::<B, 2, Int>::zeros([seq_len, batch_size], device);
    let (logits, _) = model.forward_window(dummy, causal_mask::<B>(seq_len, device), None);

    model
        .clone()
        .save_file(path.to_path_buf(), &PrettyJsonFileRecorder::<FullPrecisionSettings>::new())
        .with_context(|| format!("Failed to export model to '{}'", record_path(path).display()))?;

    let record_file = record_path(path);
    let manifest = ExportManifest {
        model:        config.clone(),
        input_shape:  [seq_len, batch_size],
        output_shape: logits.dims(),
        record_file:  record_file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
    };
    write_json(&manifest_path(path), &manifest)?;

    let shown = std::fs::canonicalize(&record_file).unwrap_or(record_file);
    println!("The model is also exported at {}", shown.display());
    Ok(manifest)
}
