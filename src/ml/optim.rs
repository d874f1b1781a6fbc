// ============================================================
// Layer 5 — Clipped Gradient Descent
// ============================================================
// Plain descent with one global clip, applied to every float
// parameter of a module:
//
//   norm  = sqrt(Σ ‖grad‖²)              over all parameters
//   scale = min(1, clip / (norm + 1e-6))
//   param = param − lr · scale · grad
//
// The norm is global, so clipping preserves the direction of
// the full gradient. burn's built-in clipping works per tensor,
// hence the two module passes here: a visitor that measures,
// then a mapper that updates.
//
// Reference: Pascanu et al. (2013) On the difficulty of training RNNs
//            Burn Book §5 (Custom optimizers)

use burn::{
    module::{AutodiffModule, ModuleMapper, ModuleVisitor, ParamId},
    optim::GradientsParams,
    prelude::*,
    tensor::backend::AutodiffBackend,
};

/// Added to the norm before dividing so a zero gradient never divides by zero.
pub const CLIP_EPSILON: f64 = 1e-6;

/// Multiplier that brings a gradient of global norm `norm` under `max_norm`.
pub fn clip_scale(norm: f64, max_norm: f64) -> f64 {
    (max_norm / (norm + CLIP_EPSILON)).min(1.0)
}

// ─── Global norm ──────────────────────────────────────────────────────────────
struct GradNorm<'a> {
    grads:  &'a GradientsParams,
    sum_sq: f64,
}

impl<B: AutodiffBackend> ModuleVisitor<B> for GradNorm<'_> {
    fn visit_float<const D: usize>(&mut self, id: ParamId, _tensor: &Tensor<B, D>) {
        if let Some(grad) = self.grads.get::<B::InnerBackend, D>(id) {
            self.sum_sq += grad.powf_scalar(2.0).sum().into_scalar().elem::<f64>();
        }
    }
}

/// L2 norm of all gradients in `grads` that belong to `model`.
pub fn grad_norm<B, M>(model: &M, grads: &GradientsParams) -> f64
where
    B: AutodiffBackend,
    M: AutodiffModule<B>,
{
    let mut visitor = GradNorm { grads, sum_sq: 0.0 };
    model.visit(&mut visitor);
    visitor.sum_sq.sqrt()
}

// ─── Update ───────────────────────────────────────────────────────────────────
struct Descend {
    grads: GradientsParams,
    rate:  f64,
}

impl<B: AutodiffBackend> ModuleMapper<B> for Descend {
    fn map_float<const D: usize>(&mut self, id: ParamId, tensor: Tensor<B, D>) -> Tensor<B, D> {
        let Some(grad) = self.grads.remove::<B::InnerBackend, D>(id) else {
            return tensor;
        };
        let require_grad = tensor.is_require_grad();
        let updated      = tensor.inner() - grad.mul_scalar(self.rate);

        let updated = Tensor::from_inner(updated);
        if require_grad { updated.require_grad() } else { updated }
    }
}

/// `param -= rate * grad` for every parameter with a gradient.
pub fn descend<B, M>(model: M, grads: GradientsParams, rate: f64) -> M
where
    B: AutodiffBackend,
    M: AutodiffModule<B>,
{
    model.map(&mut Descend { grads, rate })
}

/// Clip to `max_norm` globally, then descend with learning rate `lr`.
/// Returns the updated model and the pre-clip gradient norm.
pub fn clipped_step<B, M>(model: M, grads: GradientsParams, lr: f64, max_norm: f64) -> (M, f64)
where
    B: AutodiffBackend,
    M: AutodiffModule<B>,
{
    let norm  = grad_norm::<B, M>(&model, &grads);
    let scale = clip_scale(norm, max_norm);
    (descend::<B, M>(model, grads, lr * scale), norm)
}
