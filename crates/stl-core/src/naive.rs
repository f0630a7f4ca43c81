//! Naive Boolean baselines derived from the same dominance trace the
//! classifier sees.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, StlError};
use crate::params::ClassifierParams;
use crate::sample::{DominanceSample, clamp01};

static RULE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*d(?:_t|\(t\))?\s*(>=|<=|>|<)\s*([-+]?(?:\d+\.?\d*|\.\d+)(?:[eE][-+]?\d+)?)\s*$")
        .unwrap()
});

/// Comparison of d(t) against a threshold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompareMode {
    Ge,
    Gt,
    Le,
    Lt,
}

impl CompareMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ge => "ge",
            Self::Gt => "gt",
            Self::Le => "le",
            Self::Lt => "lt",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Ge => ">=",
            Self::Gt => ">",
            Self::Le => "<=",
            Self::Lt => "<",
        }
    }

    /// Accepts `ge`/`gt`/`le`/`lt` or the operator symbols.
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim() {
            "ge" | ">=" => Ok(Self::Ge),
            "gt" | ">" => Ok(Self::Gt),
            "le" | "<=" => Ok(Self::Le),
            "lt" | "<" => Ok(Self::Lt),
            other => Err(StlError::InvalidRule(format!(
                "unsupported comparison mode '{other}' (expected ge, gt, le or lt)"
            ))),
        }
    }

    pub fn compare(&self, d: f64, threshold: f64) -> bool {
        match self {
            Self::Ge => d >= threshold,
            Self::Gt => d > threshold,
            Self::Le => d <= threshold,
            Self::Lt => d < threshold,
        }
    }
}

/// Instantaneous threshold rule b(t) = compare(d(t), mode, threshold).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ThresholdRule {
    pub mode: CompareMode,
    pub threshold: f64,
}

impl ThresholdRule {
    pub fn new(mode: CompareMode, threshold: f64) -> Result<Self> {
        if !threshold.is_finite() {
            return Err(StlError::InvalidRule(format!(
                "threshold must be finite, got {threshold}"
            )));
        }
        Ok(Self { mode, threshold })
    }

    /// Parse a rule string such as `d>=0.5`, `d_t < 0.2` or `d(t) > .75`.
    pub fn parse(rule: &str) -> Result<Self> {
        let caps = RULE
            .captures(rule)
            .ok_or_else(|| StlError::InvalidRule(format!("cannot parse '{rule}'")))?;
        let mode = CompareMode::parse(&caps[1])?;
        let threshold: f64 = caps[2]
            .parse()
            .map_err(|_| StlError::InvalidRule(format!("bad threshold in '{rule}'")))?;
        Self::new(mode, threshold)
    }

    pub fn evaluate(&self, d: f64) -> bool {
        self.mode.compare(d, self.threshold)
    }
}

impl fmt::Display for ThresholdRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "d{}{}", self.mode.symbol(), self.threshold)
    }
}

/// Instantaneous comparison at every sample, on d clamped to [0,1].
pub fn threshold_trace(samples: &[DominanceSample], rule: &ThresholdRule) -> Vec<bool> {
    samples.iter().map(|s| rule.evaluate(clamp01(s.d))).collect()
}

/// Classical debounced Boolean: starts FALSE, switches to TRUE once `w`
/// consecutive samples sit at or above tau_s, to FALSE once `w` consecutive
/// samples sit at or below tau_l, and otherwise holds its last decision.
pub fn debounced_trace(samples: &[DominanceSample], params: &ClassifierParams) -> Vec<bool> {
    let mut hold = false;
    let mut high = 0usize;
    let mut low = 0usize;

    samples
        .iter()
        .map(|s| {
            let d = clamp01(s.d);
            high = if d >= params.tau_s { high + 1 } else { 0 };
            low = if d <= params.tau_l { low + 1 } else { 0 };
            if high >= params.w {
                hold = true;
            } else if low >= params.w {
                hold = false;
            }
            hold
        })
        .collect()
}

/// How the naive Boolean trace is derived.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "lowercase")]
pub enum NaivePolicy {
    Threshold(ThresholdRule),
    /// Mirrors the classifier's own stability logic; the negative control.
    Debounced(ClassifierParams),
}

impl NaivePolicy {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Threshold(_) => "threshold",
            Self::Debounced(_) => "debounced",
        }
    }

    pub fn evaluate(&self, samples: &[DominanceSample]) -> Vec<bool> {
        match self {
            Self::Threshold(rule) => threshold_trace(samples, rule),
            Self::Debounced(params) => debounced_trace(samples, params),
        }
    }

    pub fn rule(&self) -> Option<&ThresholdRule> {
        match self {
            Self::Threshold(rule) => Some(rule),
            Self::Debounced(_) => None,
        }
    }
}

impl fmt::Display for NaivePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Threshold(rule) => write!(f, "threshold({rule})"),
            Self::Debounced(p) => write!(
                f,
                "debounced(W={}, tau_s={}, tau_l={})",
                p.w, p.tau_s, p.tau_l
            ),
        }
    }
}
