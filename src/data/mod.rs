// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// This layer handles everything from raw text files all the
// way to backend-ready tensor windows.
//
// The pipeline flows in this order:
//
//   train.txt / valid.txt / test.txt
//       │
//       ▼
//   Corpus            → splits on whitespace, appends <eos>,
//       │               grows one shared Dictionary
//       ▼
//   batchify          → folds a split into [steps, streams]
//       │
//       ▼
//   Batched::window   → (data, target) pair of up to bptt rows
//       │
//       ▼
//   WindowBatcher     → Int tensors plus the causal mask
//
// Each module is responsible for exactly one step.
//
// Reference: Burn Book §4 (Datasets and Dataloaders)
//            Rust Book §13 (Iterators and Closures)

/// Dictionary and token-id encoding of the three splits
pub mod corpus;

/// Parallel-stream layout and window extraction
pub mod batchify;

/// Turns windows into tensors
pub mod batcher;
