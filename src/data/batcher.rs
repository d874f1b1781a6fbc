// ============================================================
// Layer 4 — Window Batcher
// ============================================================
// Converts one `Window` (plain Rust vectors) into the tensors
// a forward pass needs, on the batcher's device:
//
//   input   [len, streams]   Int   — time-major token ids
//   targets [len * streams]  Int   — flattened next tokens
//   mask    [len, len]       Float — additive causal mask
//
// The mask is sized from the window, not from bptt.
//
// Reference: Burn Book §4 (Batcher)

use burn::prelude::*;

use crate::data::batchify::Window;
use crate::ml::mask::causal_mask;

/// Tensors for one training or evaluation step.
#[derive(Debug, Clone)]
pub struct WindowBatch<B: Backend> {
    pub input:   Tensor<B, 2, Int>,
    pub targets: Tensor<B, 1, Int>,
    pub mask:    Tensor<B, 2>,
}

/// Holds the target device so tensors land on the right GPU/CPU.
#[derive(Clone, Debug)]
pub struct WindowBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> WindowBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }

    pub fn batch(&self, window: &Window) -> WindowBatch<B> {
        // Burn Int tensors are built from i32 here
        let data: Vec<i32>   = window.data.iter().map(|&x| x as i32).collect();
        let target: Vec<i32> = window.target.iter().map(|&x| x as i32).collect();

        let input = Tensor::<B, 1, Int>::from_ints(data.as_slice(), &self.device)
            .reshape([window.len, window.streams]);
        let targets = Tensor::<B, 1, Int>::from_ints(target.as_slice(), &self.device);
        let mask    = causal_mask::<B>(window.len, &self.device);

        WindowBatch { input, targets, mask }
    }
}
