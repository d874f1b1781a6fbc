// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting concerns that don't belong in any specific
// business layer:
//
//   checkpoint.rs — Saving and loading model weights with a
//                   Burn file recorder, plus the model config
//                   as JSON so `evaluate` can rebuild it.
//
//   metrics.rs    — Appends one CSV row per finished epoch
//                   (lr, valid loss, perplexity, timing).
//
//   interrupt.rs  — Ctrl-C handler that raises a shared flag
//                   polled by the training loop.
//
// Reference: Rust Book §7 (Modules)
//            Rust Book §9 (Error Handling with anyhow)
//            Burn Book §5 (Checkpointing)

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Training metrics CSV logger
pub mod metrics;

/// Ctrl-C stop flag
pub mod interrupt;
