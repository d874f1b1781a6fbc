// ============================================================
// Layer 5 — Recurrent Cells (GRU, Elman)
// ============================================================
// Step-by-step recurrent layers built from Linear gates. Step t
// reads the hidden state produced by step t-1, and the last
// hidden state is returned so the caller can carry it into the
// next window.
//
//   GRU:
//     r  = σ(W_ir·x + W_hr·h)
//     z  = σ(W_iz·x + W_hz·h)
//     n  = tanh(W_in·x + r ⊙ (W_hn·h))
//     h' = n + z ⊙ (h − n)          i.e. (1 − z)·n + z·h
//
//   Elman:
//     h' = act(W_ih·x + W_hh·h)     act ∈ {tanh, relu}
//
// Weights and biases start uniform in ±1/√hidden.
//
// Reference: Cho et al. (2014) Learning Phrase Representations
//            using RNN Encoder-Decoder
//            Burn Book §3 (Building Blocks)

use burn::{
    nn::{Initializer, Linear, LinearConfig},
    prelude::*,
    tensor::activation::{relu, sigmoid},
};

fn gate_linear<B: Backend>(d_in: usize, d_out: usize, d_hidden: usize, device: &B::Device) -> Linear<B> {
    let bound = 1.0 / (d_hidden as f64).sqrt();
    LinearConfig::new(d_in, d_out)
        .with_initializer(Initializer::Uniform { min: -bound, max: bound })
        .init(device)
}

/// Columns `[index·width, (index+1)·width)` of a `[batch, k·width]` gate block.
fn gate<B: Backend>(block: &Tensor<B, 2>, index: usize, width: usize) -> Tensor<B, 2> {
    let [batch, _] = block.dims();
    block.clone().slice([0..batch, index * width..(index + 1) * width])
}

/// Row `t` of a `[batch, seq, width]` tensor as `[batch, width]`.
fn step<B: Backend>(x: &Tensor<B, 3>, t: usize) -> Tensor<B, 2> {
    let [batch, _, width] = x.dims();
    x.clone().slice([0..batch, t..t + 1, 0..width]).reshape([batch, width])
}

fn initial_state<B: Backend>(
    state:    Option<Tensor<B, 2>>,
    batch:    usize,
    d_hidden: usize,
    device:   &B::Device,
) -> Tensor<B, 2> {
    state.unwrap_or_else(|| Tensor::zeros([batch, d_hidden], device))
}

// ─── GRU ──────────────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct GruLayer<B: Backend> {
    /// d_input → 3·d_hidden, gates in (r, z, n) order
    pub input_gates:  Linear<B>,
    /// d_hidden → 3·d_hidden
    pub hidden_gates: Linear<B>,
    pub d_hidden:     usize,
}

impl<B: Backend> GruLayer<B> {
    pub fn new(d_input: usize, d_hidden: usize, device: &B::Device) -> Self {
        Self {
            input_gates:  gate_linear(d_input, 3 * d_hidden, d_hidden, device),
            hidden_gates: gate_linear(d_hidden, 3 * d_hidden, d_hidden, device),
            d_hidden,
        }
    }

    /// `x`: `[batch, seq, d_input]` with `seq > 0`; `state`: `[batch, d_hidden]`.
    /// Returns every step's hidden state `[batch, seq, d_hidden]` and the last one.
    pub fn forward(&self, x: Tensor<B, 3>, state: Option<Tensor<B, 2>>) -> (Tensor<B, 3>, Tensor<B, 2>) {
        let [batch, seq, _] = x.dims();
        let width = self.d_hidden;
        let gx    = self.input_gates.forward(x);
        let mut h = initial_state(state, batch, width, &gx.device());

        let mut outputs = Vec::with_capacity(seq);
        for t in 0..seq {
            let gx_t = step(&gx, t);
            let gh   = self.hidden_gates.forward(h.clone());

            let r = sigmoid(gate(&gx_t, 0, width) + gate(&gh, 0, width));
            let z = sigmoid(gate(&gx_t, 1, width) + gate(&gh, 1, width));
            let n = (gate(&gx_t, 2, width) + r * gate(&gh, 2, width)).tanh();

            h = n.clone() + z * (h - n);
            outputs.push(h.clone().unsqueeze_dim::<3>(1));
        }

        (Tensor::cat(outputs, 1), h)
    }
}

// ─── Elman ────────────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct ElmanLayer<B: Backend> {
    pub input:    Linear<B>,
    pub hidden:   Linear<B>,
    /// relu instead of tanh
    pub relu:     bool,
    pub d_hidden: usize,
}

impl<B: Backend> ElmanLayer<B> {
    pub fn new(d_input: usize, d_hidden: usize, relu: bool, device: &B::Device) -> Self {
        Self {
            input:  gate_linear(d_input, d_hidden, d_hidden, device),
            hidden: gate_linear(d_hidden, d_hidden, d_hidden, device),
            relu,
            d_hidden,
        }
    }

    /// Same shapes as [`GruLayer::forward`].
    pub fn forward(&self, x: Tensor<B, 3>, state: Option<Tensor<B, 2>>) -> (Tensor<B, 3>, Tensor<B, 2>) {
        let [batch, seq, _] = x.dims();
        let gx    = self.input.forward(x);
        let mut h = initial_state(state, batch, self.d_hidden, &gx.device());

        let mut outputs = Vec::with_capacity(seq);
        for t in 0..seq {
            let pre = step(&gx, t) + self.hidden.forward(h);
            h = if self.relu { relu(pre) } else { pre.tanh() };
            outputs.push(h.clone().unsqueeze_dim::<3>(1));
        }

        (Tensor::cat(outputs, 1), h)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn input(rows: &[[f32; 2]]) -> Tensor<TestBackend, 3> {
        let flat: Vec<f32> = rows.iter().flatten().copied().collect();
        Tensor::<TestBackend, 1>::from_floats(flat.as_slice(), &Default::default())
            .reshape([1, rows.len(), 2])
    }

    fn last_step(out: Tensor<TestBackend, 3>) -> Vec<f32> {
        let [batch, seq, width] = out.dims();
        out.slice([0..batch, seq - 1..seq, 0..width]).into_data().to_vec::<f32>().unwrap()
    }

    fn differs(a: &[f32], b: &[f32]) -> bool {
        a.iter().zip(b).any(|(x, y)| (x - y).abs() > 1e-6)
    }

    #[test]
    fn test_gru_shapes_and_last_state() {
        let layer = GruLayer::<TestBackend>::new(2, 5, &Default::default());
        let (out, h) = layer.forward(input(&[[1.0, 0.0], [0.0, 1.0], [0.5, 0.5]]), None);
        assert_eq!(out.dims(), [1, 3, 5]);
        assert_eq!(h.dims(), [1, 5]);
        let last = last_step(out);
        let h    = h.into_data().to_vec::<f32>().unwrap();
        for (a, b) in last.iter().zip(&h) {
            assert_abs_diff_eq!(*a, *b, epsilon = 1e-7);
        }
    }

    #[test]
    fn test_gru_later_steps_see_earlier_inputs() {
        let layer = GruLayer::<TestBackend>::new(2, 5, &Default::default());
        let (a, _) = layer.forward(input(&[[1.0, 0.0], [0.0, 0.0], [0.0, 0.0]]), None);
        let (b, _) = layer.forward(input(&[[-1.0, 3.0], [0.0, 0.0], [0.0, 0.0]]), None);
        assert!(differs(&last_step(a), &last_step(b)));
    }

    #[test]
    fn test_gru_initial_state_changes_output() {
        let device = Default::default();
        let layer  = GruLayer::<TestBackend>::new(2, 4, &device);
        let x      = input(&[[0.3, -0.2]]);
        let (zero, _)    = layer.forward(x.clone(), None);
        let (carried, _) = layer.forward(x, Some(Tensor::ones([1, 4], &device)));
        assert!(differs(&last_step(zero), &last_step(carried)));
    }

    #[test]
    fn test_elman_tanh_and_relu_are_recurrent() {
        for relu in [false, true] {
            let layer = ElmanLayer::<TestBackend>::new(2, 16, relu, &Default::default());
            let (a, h) = layer.forward(input(&[[1.0, 2.0], [0.0, 0.0]]), None);
            let (b, _) = layer.forward(input(&[[-2.0, 1.0], [0.0, 0.0]]), None);
            assert_eq!(h.dims(), [1, 16]);
            assert!(differs(&last_step(a), &last_step(b)), "relu={relu}");
        }
    }

    #[test]
    fn test_elman_relu_output_is_non_negative() {
        let layer  = ElmanLayer::<TestBackend>::new(2, 8, true, &Default::default());
        let (o, _) = layer.forward(input(&[[1.0, -1.0], [2.0, 0.5]]), None);
        assert!(o.into_data().to_vec::<f32>().unwrap().iter().all(|v| *v >= 0.0));
    }
}
