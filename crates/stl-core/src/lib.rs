//! Stability-aware truth classification over dominance traces.
//!
//! A dominance trace d(t) in [0,1] is mapped onto the five-state T5 domain
//! (Z0, Eplus, S, Eminus, Zstar) by a windowed stability classifier, then
//! collapsed through phi_T onto {TRUE, FALSE, UNDEFINED}. The SAD(P) auditor
//! measures how often a naive Boolean rule commits to a truth value before the
//! classifier has earned it.
//!
//! Zero I/O: pure functions over complete, ordered sequences.

pub mod algebra;
pub mod audit;
pub mod canonical;
pub mod classifier;
pub mod constants;
pub mod drawdown;
pub mod error;
pub mod laws;
pub mod naive;
pub mod params;
pub mod pipeline;
pub mod sample;
pub mod state;
pub mod synth;

pub use algebra::{Stable, and_s, not_s, or_s};
pub use audit::{
    Audit, AuditReport, BooleanEvent, Collapsed, DatasetIdentity, Direction, EventAccounting,
    EventFilter, RunDeclaration, Sad, SadRecord, audit, extract_events,
};
pub use canonical::{classified_trace_csv, content_id, fmt6, raw_trace_csv, round6};
pub use classifier::{TraceSummary, classify, classify_state, direction};
pub use constants::{
    DECIMALS, DEFAULT_EPS, DEFAULT_TAU_L, DEFAULT_TAU_S, DEFAULT_W, LOCKED_EPS, LOCKED_TAU_L,
    LOCKED_TAU_S, LOCKED_W,
};
pub use drawdown::{DrawdownRow, drawdown_trace};
pub use error::{Result, StlError};
pub use laws::{Law, LawCheck, LawTable};
pub use naive::{CompareMode, NaivePolicy, ThresholdRule, debounced_trace, threshold_trace};
pub use params::ClassifierParams;
pub use pipeline::{AuditRequest, PipelineOutput, run_pipeline};
pub use sample::{ClassifiedSample, CollapsePoint, DominanceSample, clamp01};
pub use state::{Collapse, State, phi_t};
pub use synth::{
    IceSpec, StressSpec, ice_like_trace, jitter_trace, negctl_trace, sample_trace,
    threshold_stress_trace,
};
