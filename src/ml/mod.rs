// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// This layer contains the Burn model and optimisation code.
//
// What's in this layer:
//
//   mask.rs        — additive causal mask (0 / -inf)
//
//   model.rs       — LanguageModel trait, Architecture and
//                    the shared LanguageModelConfig
//
//   transformer.rs — encoder/decoder stack fed the same window
//                    as source and target, causal mask on the
//                    decoder self-attention
//
//   recurrent.rs   — embedding → LSTM/GRU/Elman layers → decoder,
//                    optional weight tying
//
//   cells.rs       — GRU and Elman layers stepped one time
//                    step at a time
//
//   optim.rs       — global-norm clipping and the plain
//                    p ← p − lr·g update
//
//   trainer.rs     — one training epoch, the evaluation pass,
//                    and TrainingSession (the EpochRunner)
//
//   exporter.rs    — portable record + manifest of the final
//                    model traced at a fixed input shape
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)
//            Vaswani et al. (2017) Attention Is All You Need

pub mod mask;

/// Model trait and configuration
pub mod model;

pub mod transformer;

pub mod recurrent;

pub mod cells;

/// Gradient clipping and manual SGD
pub mod optim;

/// Training and evaluation loops
pub mod trainer;

/// Export of the trained model
pub mod exporter;
