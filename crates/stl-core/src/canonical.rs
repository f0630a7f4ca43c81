//! Canonical byte renderings of traces and their content identifiers.
//!
//! Traces are purely numeric, so they render without quoting: one header
//! line, one line per sample, `\n` endings, reals at six decimals. The same
//! bytes are what the artifact layer writes to disk, so a content id always
//! equals the SHA-256 of the exported file.

use std::fmt::Write;

use serde::Serializer;
use sha2::{Digest, Sha256};

use crate::constants::DECIMALS;
use crate::sample::{ClassifiedSample, DominanceSample};

pub const RAW_TRACE_HEADER: &str = "t,d";
pub const CLASSIFIED_TRACE_HEADER: &str = "t,d,delta_d,r,s,state,phi_T";

/// Fixed six-decimal rendering used for every real-valued artifact field.
pub fn fmt6(x: f64) -> String {
    format!("{x:.DECIMALS$}")
}

/// `x` rounded the way `fmt6` renders it.
pub fn round6(x: f64) -> f64 {
    fmt6(x).parse().unwrap_or(x)
}

/// serde hook: a real as it appears in the exported tables.
pub(crate) fn serialize_6<S: Serializer>(x: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(round6(*x))
}

pub(crate) fn serialize_opt_6<S: Serializer>(
    x: &Option<f64>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match x {
        Some(v) => serializer.serialize_some(&round6(*v)),
        None => serializer.serialize_none(),
    }
}

pub fn raw_trace_csv(samples: &[DominanceSample]) -> String {
    let mut out = String::with_capacity(samples.len() * 20 + 4);
    out.push_str(RAW_TRACE_HEADER);
    out.push('\n');
    for s in samples {
        let _ = writeln!(out, "{},{}", fmt6(s.t), fmt6(s.d));
    }
    out
}

pub fn classified_trace_csv(trace: &[ClassifiedSample]) -> String {
    let mut out = String::with_capacity(trace.len() * 48 + 32);
    out.push_str(CLASSIFIED_TRACE_HEADER);
    out.push('\n');
    for c in trace {
        let _ = writeln!(
            out,
            "{},{},{},{},{},{},{}",
            fmt6(c.t),
            fmt6(c.d),
            fmt6(c.delta_d),
            c.r,
            c.s,
            c.state,
            c.phi_t
        );
    }
    out
}

/// Lowercase hex SHA-256.
pub fn content_id(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}
