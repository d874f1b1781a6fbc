// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// This layer orchestrates all the other layers to accomplish
// a specific goal (training, or scoring a saved checkpoint).
//
// Rules for this layer:
//   - No ML math or model code here
//   - No direct file access (that's Layer 4 and 6)
//   - Only workflow coordination and the per-epoch report
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// The training workflow
pub mod train_use_case;

// Reload the best checkpoint and score it on the test split
pub mod evaluate_use_case;

// Epoch loop: validate, checkpoint, anneal, final test
pub mod epoch_driver;
