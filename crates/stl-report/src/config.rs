//! TOML run files for audits and verification runs.
//!
//! ```toml
//! [params]
//! W = 20
//! tau_s = 0.90
//! tau_l = 0.10
//! eps = 0.02
//!
//! [dataset]
//! name = "spx"
//! source = "spx_daily.tsv"
//! adapter = "drawdown"
//! proposition = "market is in drawdown"
//!
//! [naive]
//! policy = "threshold"
//! rule = "d>=0.5"
//! events = "enter_true"
//! ```
//!
//! Every key is optional. Command-line values override file values; what is
//! still missing falls back to the classifier defaults.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use stl_core::{
    ClassifierParams, CompareMode, DatasetIdentity, EventFilter, NaivePolicy, StlError,
    ThresholdRule,
};

use crate::error::Result;

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParamsSection {
    /// Signed so that a negative window is reported as a configuration
    /// error rather than a parse failure.
    #[serde(rename = "W")]
    pub w: Option<i64>,
    pub tau_s: Option<f64>,
    pub tau_l: Option<f64>,
    pub eps: Option<f64>,
}

impl ParamsSection {
    /// Values from `over` win where present.
    pub fn overlay(&self, over: &ParamsSection) -> ParamsSection {
        ParamsSection {
            w: over.w.or(self.w),
            tau_s: over.tau_s.or(self.tau_s),
            tau_l: over.tau_l.or(self.tau_l),
            eps: over.eps.or(self.eps),
        }
    }

    /// Names of the parameters left unset.
    pub fn missing(&self) -> Vec<&'static str> {
        [
            ("W", self.w.is_none()),
            ("tau_s", self.tau_s.is_none()),
            ("tau_l", self.tau_l.is_none()),
            ("eps", self.eps.is_none()),
        ]
        .into_iter()
        .filter_map(|(name, unset)| unset.then_some(name))
        .collect()
    }

    /// Fill gaps from `base` and validate.
    pub fn resolve(&self, base: ClassifierParams) -> Result<ClassifierParams> {
        let w = match self.w {
            Some(w) if w < 1 => {
                return Err(StlError::Config(format!("W must be >= 1 (W={w})")).into());
            }
            Some(w) => usize::try_from(w)
                .map_err(|_| StlError::Config(format!("W out of range ({w})")))?,
            None => base.w,
        };
        let params = ClassifierParams::new(
            w,
            self.tau_s.unwrap_or(base.tau_s),
            self.tau_l.unwrap_or(base.tau_l),
            self.eps.unwrap_or(base.eps),
        )?;
        Ok(params)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatasetSection {
    pub name: Option<String>,
    pub source: Option<String>,
    pub adapter: Option<String>,
    pub proposition: Option<String>,
}

impl DatasetSection {
    pub fn overlay(&self, over: &DatasetSection) -> DatasetSection {
        DatasetSection {
            name: over.name.clone().or_else(|| self.name.clone()),
            source: over.source.clone().or_else(|| self.source.clone()),
            adapter: over.adapter.clone().or_else(|| self.adapter.clone()),
            proposition: over.proposition.clone().or_else(|| self.proposition.clone()),
        }
    }

    pub fn resolve(&self) -> DatasetIdentity {
        DatasetIdentity {
            name: self.name.clone().unwrap_or_default(),
            source: self.source.clone().unwrap_or_default(),
            adapter: self.adapter.clone().unwrap_or_default(),
            proposition: self.proposition.clone().unwrap_or_default(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NaiveSection {
    /// `threshold` (default) or `debounced`.
    pub policy: Option<String>,
    pub rule: Option<String>,
    pub mode: Option<String>,
    pub threshold: Option<f64>,
    pub events: Option<String>,
    pub label: Option<String>,
}

/// Resolved naive-Boolean settings.
#[derive(Clone, Debug, PartialEq)]
pub struct NaiveSettings {
    pub policy: NaivePolicy,
    pub events: EventFilter,
    pub label: Option<String>,
}

impl NaiveSection {
    pub fn overlay(&self, over: &NaiveSection) -> NaiveSection {
        // A rule string and a mode/threshold pair are alternatives; whichever
        // the overriding layer names replaces the other.
        let over_names_rule =
            over.rule.is_some() || over.mode.is_some() || over.threshold.is_some();
        let (rule, mode, threshold) = if over_names_rule {
            (over.rule.clone(), over.mode.clone(), over.threshold)
        } else {
            (self.rule.clone(), self.mode.clone(), self.threshold)
        };
        NaiveSection {
            policy: over.policy.clone().or_else(|| self.policy.clone()),
            rule,
            mode,
            threshold,
            events: over.events.clone().or_else(|| self.events.clone()),
            label: over.label.clone().or_else(|| self.label.clone()),
        }
    }

    /// The debounced policy borrows the run's classifier parameters. A
    /// threshold policy with no rule defaults to `d>=0.5`.
    pub fn resolve(&self, params: ClassifierParams) -> Result<NaiveSettings> {
        let events = match &self.events {
            Some(e) => EventFilter::parse(e)?,
            None => EventFilter::default(),
        };
        let policy = match self.policy.as_deref().map(str::trim).unwrap_or("threshold") {
            "threshold" => NaivePolicy::Threshold(self.threshold_rule()?),
            "debounced" => NaivePolicy::Debounced(params),
            other => {
                return Err(StlError::Config(format!(
                    "unknown naive policy '{other}' (expected threshold or debounced)"
                ))
                .into());
            }
        };
        Ok(NaiveSettings {
            policy,
            events,
            label: self.label.clone(),
        })
    }

    fn threshold_rule(&self) -> Result<ThresholdRule> {
        let rule = match (&self.rule, &self.mode, self.threshold) {
            (Some(_), Some(_), _) | (Some(_), _, Some(_)) => {
                return Err(StlError::Config(
                    "give either a rule string or mode/threshold, not both".into(),
                )
                .into());
            }
            (Some(rule), None, None) => ThresholdRule::parse(rule)?,
            (None, mode, threshold) => {
                let mode = match mode {
                    Some(m) => CompareMode::parse(m)?,
                    None => CompareMode::Ge,
                };
                ThresholdRule::new(mode, threshold.unwrap_or(0.5))?
            }
        };
        Ok(rule)
    }
}

/// A parsed run file.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    pub params: ParamsSection,
    pub dataset: DatasetSection,
    pub naive: NaiveSection,
}

impl RunConfig {
    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let config = Self::parse(&text)?;
        tracing::debug!("loaded run config from {}", path.display());
        Ok(config)
    }

    pub fn overlay(&self, over: &RunConfig) -> RunConfig {
        RunConfig {
            params: self.params.overlay(&over.params),
            dataset: self.dataset.overlay(&over.dataset),
            naive: self.naive.overlay(&over.naive),
        }
    }
}
