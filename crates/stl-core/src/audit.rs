//! SAD(P): premature-decision audit of a naive Boolean against phi_T.
//!
//! Every naive transition is an event. An event is aligned iff phi_T at the
//! same index already equals the new Boolean value; premature otherwise.
//! Timing to the first matching collapse is diagnostic only.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::canonical::{fmt6, round6, serialize_6, serialize_opt_6};
use crate::error::{Result, StlError};
use crate::naive::NaivePolicy;
use crate::params::ClassifierParams;
use crate::sample::{ClassifiedSample, CollapsePoint, DominanceSample};
use crate::state::Collapse;

/// Anything carrying a (t, phi_T) pair the auditor can align against.
pub trait Collapsed {
    fn t(&self) -> f64;
    fn phi_t(&self) -> Collapse;
}

impl Collapsed for ClassifiedSample {
    fn t(&self) -> f64 {
        self.t
    }

    fn phi_t(&self) -> Collapse {
        self.phi_t
    }
}

impl Collapsed for CollapsePoint {
    fn t(&self) -> f64 {
        self.t
    }

    fn phi_t(&self) -> Collapse {
        self.phi_t
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    EnterTrue,
    EnterFalse,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EnterTrue => "enter_true",
            Self::EnterFalse => "enter_false",
        }
    }
}

/// Which transitions count as events.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventFilter {
    EnterTrue,
    EnterFalse,
    #[default]
    AnyChange,
}

impl EventFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EnterTrue => "enter_true",
            Self::EnterFalse => "enter_false",
            Self::AnyChange => "any_change",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s.trim() {
            "enter_true" => Ok(Self::EnterTrue),
            "enter_false" => Ok(Self::EnterFalse),
            "any_change" | "any" => Ok(Self::AnyChange),
            other => Err(StlError::Config(format!(
                "unknown event filter '{other}' (expected enter_true, enter_false or any_change)"
            ))),
        }
    }

    pub fn admits(&self, direction: Direction) -> bool {
        match self {
            Self::EnterTrue => direction == Direction::EnterTrue,
            Self::EnterFalse => direction == Direction::EnterFalse,
            Self::AnyChange => true,
        }
    }
}

/// A transition in the naive Boolean trace.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct BooleanEvent {
    /// Sample position of the new value.
    pub index: usize,
    pub direction: Direction,
    #[serde(serialize_with = "serialize_6")]
    pub t_bool: f64,
    /// The Boolean value after the transition.
    pub desired: bool,
}

/// Scan consecutive naive values for prev≠cur transitions.
pub fn extract_events(
    ts: &[f64],
    naive: &[bool],
    filter: EventFilter,
) -> Result<Vec<BooleanEvent>> {
    if ts.len() != naive.len() {
        return Err(StlError::LengthMismatch {
            what: "naive Boolean trace",
            expected: ts.len(),
            found: naive.len(),
        });
    }

    Ok(naive
        .windows(2)
        .enumerate()
        .filter(|(_, pair)| pair[0] != pair[1])
        .map(|(i, pair)| {
            let index = i + 1;
            let direction = if pair[1] {
                Direction::EnterTrue
            } else {
                Direction::EnterFalse
            };
            BooleanEvent {
                index,
                direction,
                t_bool: ts[index],
                desired: pair[1],
            }
        })
        .filter(|e| filter.admits(e.direction))
        .collect())
}

/// Per-event audit outcome.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SadRecord {
    /// 1-based position among qualifying events.
    pub event_index: usize,
    pub event: BooleanEvent,
    pub stl_at_t_bool: Collapse,
    pub aligned: bool,
    pub premature: bool,
    /// First sample index at or after the event where phi_T equals the
    /// desired value.
    pub stl_index: Option<usize>,
    #[serde(serialize_with = "serialize_opt_6")]
    pub t_stl: Option<f64>,
    /// t_stl − t_bool.
    #[serde(serialize_with = "serialize_opt_6")]
    pub delta: Option<f64>,
}

/// SAD(P) value; `NotApplicable` when there were no qualifying events.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Sad {
    NotApplicable,
    Ratio(f64),
}

impl Sad {
    pub fn from_counts(premature: usize, total: usize) -> Self {
        if total == 0 {
            Self::NotApplicable
        } else {
            Self::Ratio(premature as f64 / total as f64)
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Self::NotApplicable => None,
            Self::Ratio(v) => Some(*v),
        }
    }

    pub fn is_applicable(&self) -> bool {
        matches!(self, Self::Ratio(_))
    }
}

/// `NA` or six fractional digits. JSON carries the same rounding.
impl fmt::Display for Sad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotApplicable => f.write_str("NA"),
            Self::Ratio(v) => write!(f, "{v:.6}"),
        }
    }
}

impl Serialize for Sad {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::NotApplicable => serializer.serialize_str("NA"),
            Self::Ratio(v) => serializer.serialize_f64(round6(*v)),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct EventAccounting {
    pub e_total: usize,
    pub e_premature: usize,
    pub e_aligned: usize,
    pub sad: Sad,
}

/// Accounting plus the full per-event table.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Audit {
    pub accounting: EventAccounting,
    pub records: Vec<SadRecord>,
}

/// t-values agree when they render identically at artifact resolution.
/// Uses the exporter's own rounding, so a re-read trace always lines up.
fn same_instant(a: f64, b: f64) -> bool {
    a == b || fmt6(a) == fmt6(b)
}

/// For every position, the first index at or after it collapsing TRUE and
/// the first collapsing FALSE. One reverse pass.
fn next_collapse<C: Collapsed>(trace: &[C]) -> (Vec<Option<usize>>, Vec<Option<usize>>) {
    let mut next_true = vec![None; trace.len()];
    let mut next_false = vec![None; trace.len()];
    let mut t_seen = None;
    let mut f_seen = None;
    for j in (0..trace.len()).rev() {
        match trace[j].phi_t() {
            Collapse::True => t_seen = Some(j),
            Collapse::False => f_seen = Some(j),
            Collapse::Undefined => {}
        }
        next_true[j] = t_seen;
        next_false[j] = f_seen;
    }
    (next_true, next_false)
}

/// Audit a naive Boolean trace against a classified trace over the same raw
/// samples. All three sequences are positionally matched; lengths and
/// t-values are validated before any event is judged.
pub fn audit<C: Collapsed>(
    raw: &[DominanceSample],
    trace: &[C],
    naive: &[bool],
    filter: EventFilter,
) -> Result<Audit> {
    if raw.is_empty() {
        return Err(StlError::EmptyInput);
    }
    if trace.len() != raw.len() {
        return Err(StlError::LengthMismatch {
            what: "classified trace",
            expected: raw.len(),
            found: trace.len(),
        });
    }
    for (row, (r, c)) in raw.iter().zip(trace).enumerate() {
        if !same_instant(r.t, c.t()) {
            return Err(StlError::IndexMismatch {
                row,
                raw_t: r.t,
                trace_t: c.t(),
            });
        }
    }

    let ts: Vec<f64> = raw.iter().map(|s| s.t).collect();
    let events = extract_events(&ts, naive, filter)?;
    let (next_true, next_false) = next_collapse(trace);

    let records: Vec<SadRecord> = events
        .into_iter()
        .enumerate()
        .map(|(n, event)| {
            let stl_at_t_bool = trace[event.index].phi_t();
            let aligned = stl_at_t_bool.matches(event.desired);
            let stl_index = if event.desired {
                next_true[event.index]
            } else {
                next_false[event.index]
            };
            let t_stl = stl_index.map(|j| ts[j]);
            SadRecord {
                event_index: n + 1,
                event,
                stl_at_t_bool,
                aligned,
                premature: !aligned,
                stl_index,
                t_stl,
                delta: t_stl.map(|t| t - event.t_bool),
            }
        })
        .collect();

    let e_total = records.len();
    let e_premature = records.iter().filter(|r| r.premature).count();
    let e_aligned = records.iter().filter(|r| r.aligned).count();

    Ok(Audit {
        accounting: EventAccounting {
            e_total,
            e_premature,
            e_aligned,
            sad: Sad::from_counts(e_premature, e_total),
        },
        records,
    })
}

/// Provenance labels for a run.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct DatasetIdentity {
    pub name: String,
    pub source: String,
    pub adapter: String,
    pub proposition: String,
}

/// Everything needed to reproduce and identify an audit run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RunDeclaration {
    pub dataset: DatasetIdentity,
    pub params: ClassifierParams,
    pub policy: NaivePolicy,
    /// Free-text description of the naive rule.
    pub naive_rule: String,
    pub events: EventFilter,
    pub raw_trace_id: String,
    pub classified_trace_id: String,
}

impl RunDeclaration {
    /// Ordered `field,value` rows for the run declaration table.
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        let (mode, threshold) = match self.policy.rule() {
            Some(rule) => (rule.mode.as_str().to_string(), fmt6(rule.threshold)),
            None => (String::new(), String::new()),
        };
        vec![
            ("dataset_name", self.dataset.name.clone()),
            ("dataset_source", self.dataset.source.clone()),
            ("adapter_name", self.dataset.adapter.clone()),
            ("proposition_P", self.dataset.proposition.clone()),
            ("naive_boolean_rule", self.naive_rule.clone()),
            ("parameters_W", self.params.w.to_string()),
            ("parameters_tau_s", fmt6(self.params.tau_s)),
            ("parameters_tau_l", fmt6(self.params.tau_l)),
            ("parameters_eps", fmt6(self.params.eps)),
            ("naive_policy", self.policy.name().to_string()),
            ("bool_mode", mode),
            ("threshold_on_d_t", threshold),
            ("event_counting_mode", self.events.as_str().to_string()),
            ("raw_trace_sha256", self.raw_trace_id.clone()),
            ("classified_trace_sha256", self.classified_trace_id.clone()),
        ]
    }
}

/// The three audit outputs: declaration, accounting, per-event timing.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AuditReport {
    pub declaration: RunDeclaration,
    pub accounting: EventAccounting,
    pub records: Vec<SadRecord>,
}

impl AuditReport {
    pub fn new(declaration: RunDeclaration, audit: Audit) -> Self {
        Self {
            declaration,
            accounting: audit.accounting,
            records: audit.records,
        }
    }
}
