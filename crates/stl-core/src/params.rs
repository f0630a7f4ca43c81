use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_EPS, DEFAULT_TAU_L, DEFAULT_TAU_S, DEFAULT_W, LOCKED_EPS, LOCKED_TAU_L, LOCKED_TAU_S,
    LOCKED_W,
};
use crate::error::{Result, StlError};

/// Classifier parameters: stability window, thresholds, derivative deadband.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClassifierParams {
    pub w: usize,
    pub tau_s: f64,
    pub tau_l: f64,
    pub eps: f64,
}

impl Default for ClassifierParams {
    fn default() -> Self {
        Self {
            w: DEFAULT_W,
            tau_s: DEFAULT_TAU_S,
            tau_l: DEFAULT_TAU_L,
            eps: DEFAULT_EPS,
        }
    }
}

impl ClassifierParams {
    /// Validated constructor.
    pub fn new(w: usize, tau_s: f64, tau_l: f64, eps: f64) -> Result<Self> {
        let params = Self {
            w,
            tau_s,
            tau_l,
            eps,
        };
        params.validate()?;
        Ok(params)
    }

    /// The locked verification profile (W=20, tau_s=0.90, tau_l=0.10, eps=0.02).
    pub fn locked() -> Self {
        Self {
            w: LOCKED_W,
            tau_s: LOCKED_TAU_S,
            tau_l: LOCKED_TAU_L,
            eps: LOCKED_EPS,
        }
    }

    /// Require W >= 1, 0 <= tau_l < tau_s <= 1, eps >= 0, all finite.
    pub fn validate(&self) -> Result<()> {
        if self.w < 1 {
            return Err(StlError::Config("W must be >= 1".into()));
        }
        if !(self.tau_s.is_finite() && self.tau_l.is_finite() && self.eps.is_finite()) {
            return Err(StlError::Config(
                "tau_s, tau_l and eps must be finite".into(),
            ));
        }
        if !(0.0 <= self.tau_l && self.tau_l < self.tau_s && self.tau_s <= 1.0) {
            return Err(StlError::Config(format!(
                "require 0 <= tau_l < tau_s <= 1 (tau_l={}, tau_s={})",
                self.tau_l, self.tau_s
            )));
        }
        if self.eps < 0.0 {
            return Err(StlError::Config(format!("eps must be >= 0 (eps={})", self.eps)));
        }
        Ok(())
    }
}
