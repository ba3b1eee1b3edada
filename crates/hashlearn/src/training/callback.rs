//! Early stopping on holdout loss.
//!
//! Monitors the holdout loss after every pass and stops once the loss goes up
//! relative to the pass before.

/// Early stopping state.
///
/// A pass "worsens" when its loss is strictly greater than the loss of the
/// previous pass (not the best one). Training stops after `patience`
/// consecutive worsening passes; the multi-pass trainer uses a patience of 1.
///
/// # Example
///
/// ```
/// use hashlearn::training::EarlyStopping;
///
/// let mut early_stop = EarlyStopping::new(1);
/// assert!(!early_stop.should_stop(0.40));
/// assert!(!early_stop.should_stop(0.35));
/// assert!(early_stop.should_stop(0.36));
/// assert_eq!(early_stop.best_pass(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct EarlyStopping {
    /// Consecutive worsening passes tolerated before stopping.
    patience: usize,
    /// Loss of the previous pass.
    previous: Option<f64>,
    /// Lowest loss seen so far.
    best_value: Option<f64>,
    /// Pass at which the best loss was observed.
    best_pass: usize,
    /// Current run of worsening passes.
    worsening: usize,
    /// Passes observed.
    current_pass: usize,
}

impl EarlyStopping {
    /// Create an early stopping monitor. A patience of 0 is treated as 1.
    pub fn new(patience: usize) -> Self {
        Self {
            patience: patience.max(1),
            previous: None,
            best_value: None,
            best_pass: 0,
            worsening: 0,
            current_pass: 0,
        }
    }

    /// Record the loss of the pass just finished. Returns `true` when
    /// training should stop.
    pub fn should_stop(&mut self, value: f64) -> bool {
        if self.best_value.is_none_or(|best| value < best) {
            self.best_value = Some(value);
            self.best_pass = self.current_pass;
        }

        if self.previous.is_some_and(|previous| value > previous) {
            self.worsening += 1;
        } else {
            self.worsening = 0;
        }

        self.previous = Some(value);
        self.current_pass += 1;
        self.worsening >= self.patience
    }

    /// Lowest loss observed.
    pub fn best_value(&self) -> Option<f64> {
        self.best_value
    }

    /// Pass (0-based) at which the lowest loss was observed.
    pub fn best_pass(&self) -> usize {
        self.best_pass
    }
}
