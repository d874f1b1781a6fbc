// ============================================================
// Layer 3 — Learning-Rate Schedule
// ============================================================
// The two pieces of mutable state the epoch loop carries:
// the current learning rate and the best validation loss so
// far. Both live in one value that the driver owns and passes
// around, rather than in globals.
//
// Rule, applied once per epoch:
//   val_loss < best (or no best yet) → Improved, best = val_loss
//   otherwise                        → Annealed, lr /= 4
//
// The learning rate is never raised or reset.

/// Divisor applied to the learning rate after a non-improving epoch.
pub const ANNEAL_FACTOR: f64 = 4.0;

/// Result of feeding one validation loss into the schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpochOutcome {
    /// New best loss; the caller should checkpoint.
    Improved,
    /// No improvement; the learning rate was quartered.
    Annealed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrainingState {
    lr:            f64,
    best_val_loss: Option<f64>,
}

impl TrainingState {
    pub fn new(lr: f64) -> Self {
        Self { lr, best_val_loss: None }
    }

    pub fn lr(&self) -> f64 {
        self.lr
    }

    pub fn best_val_loss(&self) -> Option<f64> {
        self.best_val_loss
    }

    /// Strict improvement check; equal loss counts as no improvement.
    pub fn is_improvement(&self, val_loss: f64) -> bool {
        match self.best_val_loss {
            None       => true,
            Some(best) => val_loss < best,
        }
    }

    pub fn observe(&mut self, val_loss: f64) -> EpochOutcome {
        if self.is_improvement(val_loss) {
            self.best_val_loss = Some(val_loss);
            EpochOutcome::Improved
        } else {
            self.lr /= ANNEAL_FACTOR;
            EpochOutcome::Annealed
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_loss_always_improves() {
        let mut s = TrainingState::new(20.0);
        assert_eq!(s.observe(7.5), EpochOutcome::Improved);
        assert_eq!(s.best_val_loss(), Some(7.5));
        assert_eq!(s.lr(), 20.0);
    }

    #[test]
    fn test_two_stagnant_epochs_quarter_twice() {
        let mut s = TrainingState::new(20.0);
        s.observe(5.0);
        assert_eq!(s.observe(5.5), EpochOutcome::Annealed);
        assert_eq!(s.observe(6.0), EpochOutcome::Annealed);
        assert_eq!(s.lr(), 1.25);
        assert_eq!(s.best_val_loss(), Some(5.0));
    }

    #[test]
    fn test_equal_loss_is_not_an_improvement() {
        let mut s = TrainingState::new(1.0);
        s.observe(3.0);
        assert_eq!(s.observe(3.0), EpochOutcome::Annealed);
        assert_eq!(s.lr(), 0.25);
    }

    #[test]
    fn test_nan_loss_anneals_once_a_best_exists() {
        let mut s = TrainingState::new(4.0);
        s.observe(2.0);
        assert_eq!(s.observe(f64::NAN), EpochOutcome::Annealed);
        assert_eq!(s.best_val_loss(), Some(2.0));
    }
}
