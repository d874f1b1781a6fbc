// ============================================================
// Layer 5 — Causal Mask
// ============================================================
// Additive look-ahead mask for a window of `len` positions:
//
//   len = 3     ┌ 0  -inf -inf ┐
//               │ 0   0   -inf │
//               └ 0   0    0   ┘
//
// Added to raw attention scores before softmax, every future
// position ends up with probability exactly zero.
//
// The mask is rebuilt for every window from the window's actual
// length: the last window of a split is usually shorter than
// bptt, and a bptt-sized mask would not broadcast against it.

use burn::prelude::*;

/// Row-major `len × len` mask values.
pub fn causal_mask_values(len: usize) -> Vec<f32> {
    let mut values = Vec::with_capacity(len * len);
    for row in 0..len {
        for col in 0..len {
            values.push(if col > row { f32::NEG_INFINITY } else { 0.0 });
        }
    }
    values
}

/// Additive causal mask tensor of shape `[len, len]`.
pub fn causal_mask<B: Backend>(len: usize, device: &B::Device) -> Tensor<B, 2> {
    let data = TensorData::new(causal_mask_values(len), [len, len]);
    Tensor::from_data(data, device)
}

/// Boolean attention mask `[batch, len, len]` (true = blocked) as
/// expected by burn's attention layers.
pub fn to_attention_mask<B: Backend>(mask: Tensor<B, 2>, batch: usize) -> Tensor<B, 3, Bool> {
    let [rows, cols] = mask.dims();
    mask.lower_elem(0.0)
        .unsqueeze::<3>()
        .expand([batch, rows, cols])
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::tensor::activation::softmax;

    type TestBackend = NdArray;

    #[test]
    fn test_mask_values() {
        let len    = 5;
        let values = causal_mask_values(len);
        assert_eq!(values.len(), len * len);
        for r in 0..len {
            for c in 0..len {
                let v = values[r * len + c];
                if c <= r {
                    assert_eq!(v, 0.0);
                } else {
                    assert!(v.is_infinite() && v.is_sign_negative());
                }
            }
        }
    }

    #[test]
    fn test_mask_tensor_shape_follows_len() {
        let device = Default::default();
        for len in [1, 3, 35] {
            let mask = causal_mask::<TestBackend>(len, &device);
            assert_eq!(mask.dims(), [len, len]);
        }
    }

    #[test]
    fn test_single_position_mask_is_zero() {
        let device = Default::default();
        let mask   = causal_mask::<TestBackend>(1, &device);
        let values = mask.into_data().to_vec::<f32>().unwrap();
        assert_eq!(values, vec![0.0]);
    }

    #[test]
    fn test_future_positions_get_zero_probability() {
        let device = Default::default();
        let len    = 4;
        let scores = Tensor::<TestBackend, 2>::ones([len, len], &device);
        let probs  = softmax(scores + causal_mask::<TestBackend>(len, &device), 1);
        let values = probs.into_data().to_vec::<f32>().unwrap();

        for r in 0..len {
            let row = &values[r * len..(r + 1) * len];
            for (c, p) in row.iter().enumerate() {
                if c > r {
                    assert_eq!(*p, 0.0);
                } else {
                    approx::assert_abs_diff_eq!(*p, 1.0 / (r + 1) as f32, epsilon = 1e-6);
                }
            }
        }
    }

    #[test]
    fn test_attention_mask_blocks_upper_triangle() {
        let device = Default::default();
        let mask   = to_attention_mask(causal_mask::<TestBackend>(3, &device), 2);
        assert_eq!(mask.dims(), [2, 3, 3]);
        let blocked = mask.into_data().to_vec::<bool>().unwrap();
        let expected = [
            false, true,  true,
            false, false, true,
            false, false, false,
        ];
        assert_eq!(&blocked[0..9],  &expected);
        assert_eq!(&blocked[9..18], &expected);
    }
}
