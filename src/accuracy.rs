//! Rolling accuracy: exponentially-weighted online correctness estimate.
//!
//! One tracker per accuracy channel (classification, clustering). The state
//! is a single scalar — no buffered window is stored. The recurrence
//! `prev + (correct - prev) / window` is an exponential moving average with
//! effective window `window`; given `correct` in {0, 1} and `prev` in [0, 1]
//! the value stays in [0, 1] by induction.

use crate::error::{PipelineError, Result};
use crate::record::NOISE_CATEGORY;

/// Online rolling-accuracy tracker for one channel.
#[derive(Clone, Debug)]
pub struct RollingAccuracy {
    window: usize,
    value: Option<f64>,
}

impl RollingAccuracy {
    /// Create a tracker. The window must be strictly positive; anything else
    /// is a configuration error caught here, not mid-run.
    pub fn new(window: usize) -> Result<Self> {
        if window == 0 {
            return Err(PipelineError::InvalidConfig(
                "rolling accuracy window must be > 0".into(),
            ));
        }
        Ok(Self {
            window,
            value: None,
        })
    }

    /// Fold one step into the channel and return the new accuracy.
    ///
    /// - Cold start (no prior update): the value is defined as 0, regardless
    ///   of whether the first inference was correct.
    /// - `ignore_noise` and the ground truth is the noise category: the state
    ///   is frozen and the previous value returned unchanged.
    /// - Otherwise the moving average absorbs `correct` in {0, 1}, where an
    ///   absent inference (`None`) never matches any real category.
    pub fn update(&mut self, inference: Option<u32>, actual: u32, ignore_noise: bool) -> f64 {
        let prev = match self.value {
            None => {
                self.value = Some(0.0);
                return 0.0;
            }
            Some(prev) => prev,
        };

        if ignore_noise && actual == NOISE_CATEGORY {
            return prev;
        }

        let correct = if inference == Some(actual) { 1.0 } else { 0.0 };
        let next = prev + (correct - prev) / self.window as f64;
        self.value = Some(next);
        next
    }

    /// Last computed accuracy, `None` before the first update.
    pub fn value(&self) -> Option<f64> {
        self.value
    }

    pub fn window(&self) -> usize {
        self.window
    }
}
