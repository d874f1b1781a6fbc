// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Appends one CSV row per completed epoch.
//
// Columns:
//   epoch         — 1-based epoch number
//   lr            — learning rate the epoch trained with
//   val_loss      — mean validation cross-entropy
//   val_ppl       — exp(val_loss)
//   elapsed_secs  — wall time of train + validate
//   checkpointed  — whether this epoch produced a new best model
//
// Example:
//   epoch,lr,val_loss,val_ppl,elapsed_secs,checkpointed
//   1,20.000000,5.731200,308.310000,41.200000,true
//   2,20.000000,5.802100,330.960000,40.900000,false
//
// Reference: Rust Book §12 (I/O and File Handling)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

/// One row of metrics data for a single epoch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EpochMetrics {
    pub epoch:        usize,
    pub lr:           f64,
    pub val_loss:     f64,
    pub elapsed_secs: f64,
    pub checkpointed: bool,
}

impl EpochMetrics {
    pub fn new(epoch: usize, lr: f64, val_loss: f64, elapsed_secs: f64, checkpointed: bool) -> Self {
        Self { epoch, lr, val_loss, elapsed_secs, checkpointed }
    }

    pub fn val_ppl(&self) -> f64 {
        self.val_loss.exp()
    }
}

/// Logs epoch metrics to a CSV file for later plotting.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Writes the header if the file doesn't exist yet, so repeated
    /// runs append to the same log.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let csv_path = path.as_ref().to_path_buf();

        if let Some(parent) = csv_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Cannot create '{}'", parent.display()))?;
        }

        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)
                .with_context(|| format!("Cannot create metrics file '{}'", csv_path.display()))?;
            writeln!(f, "epoch,lr,val_loss,val_ppl,elapsed_secs,checkpointed")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open metrics file '{}'", self.csv_path.display()))?;

        writeln!(
            f,
            "{},{:.6},{:.6},{:.6},{:.6},{}",
            m.epoch,
            m.lr,
            m.val_loss,
            m.val_ppl(),
            m.elapsed_secs,
            m.checkpointed,
        )?;

        tracing::debug!("Logged epoch {} metrics: val_loss={:.4}", m.epoch, m.val_loss);
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}
