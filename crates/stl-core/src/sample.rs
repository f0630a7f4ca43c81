use serde::{Deserialize, Serialize};

use crate::state::{Collapse, State};

/// Restrict a real value to [0,1]. NaN maps to 0.
pub fn clamp01(x: f64) -> f64 {
    if x.is_nan() || x < 0.0 {
        0.0
    } else if x > 1.0 {
        1.0
    } else {
        x
    }
}

/// One raw point of a dominance trace.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DominanceSample {
    pub t: f64,
    pub d: f64,
}

impl DominanceSample {
    /// Build a sample with `d` clamped into [0,1].
    pub fn new(t: f64, d: f64) -> Self {
        Self { t, d: clamp01(d) }
    }

    /// Samples at t = 0, 1, 2, ... for the given values.
    pub fn indexed(values: &[f64]) -> Vec<Self> {
        values
            .iter()
            .enumerate()
            .map(|(i, &d)| Self::new(i as f64, d))
            .collect()
    }
}

/// Classifier output for one input sample.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedSample {
    pub t: f64,
    pub d: f64,
    pub delta_d: f64,
    /// Direction flag: -1, 0 or +1.
    pub r: i8,
    /// Stability flag: 0 or 1.
    pub s: u8,
    pub state: State,
    pub phi_t: Collapse,
}

/// Minimal (t, phi_T) view of a classified trace, as read back from an
/// exported trace file.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CollapsePoint {
    pub t: f64,
    pub phi_t: Collapse,
}
