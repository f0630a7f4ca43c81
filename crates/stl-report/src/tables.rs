//! Fixed-precision artifact renderers. Everything here produces bytes in
//! memory; nothing touches the filesystem.

use std::fmt::Write as _;

use stl_core::{
    AuditReport, ClassifiedSample, ClassifierParams, Collapse, DominanceSample, DrawdownRow,
    LawTable, State, TraceSummary, classified_trace_csv, content_id, fmt6, raw_trace_csv,
};

use crate::error::{ReportError, Result};

pub const TRACE_OUT: &str = "stl_trace_out.csv";
pub const SUMMARY: &str = "summary.txt";
pub const SAD_I2: &str = "SAD_TABLE_I2_RUN_DECLARATION.csv";
pub const SAD_I3: &str = "SAD_TABLE_I3_EVENT_ACCOUNTING.csv";
pub const SAD_I4: &str = "SAD_TABLE_I4_EVENT_TIMING.csv";
pub const DRAWDOWN_OUT: &str = "stl_input_t_d.csv";

/// One file of a run, addressed relative to its output directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Artifact {
    pub rel_path: String,
    pub bytes: Vec<u8>,
}

impl Artifact {
    pub fn new(rel_path: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            rel_path: rel_path.into(),
            bytes: bytes.into(),
        }
    }

    pub fn sha256(&self) -> String {
        content_id(&self.bytes)
    }
}

fn csv_writer() -> csv::Writer<Vec<u8>> {
    csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new())
}

fn finish(wtr: csv::Writer<Vec<u8>>) -> Result<Vec<u8>> {
    wtr.into_inner()
        .map_err(|e| ReportError::Io(e.into_error()))
}

fn yes_no(b: bool) -> &'static str {
    if b { "YES" } else { "NO" }
}

fn opt6(x: Option<f64>) -> String {
    x.map(fmt6).unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Traces
// ---------------------------------------------------------------------------

pub fn raw_trace_artifact(rel_path: &str, samples: &[DominanceSample]) -> Artifact {
    Artifact::new(rel_path, raw_trace_csv(samples))
}

/// `stl_trace_out.csv` and its summary.
pub fn classifier_artifacts(
    trace: &[ClassifiedSample],
    params: &ClassifierParams,
) -> Vec<Artifact> {
    let csv = classified_trace_csv(trace);
    let summary = TraceSummary::from_trace(trace);

    let mut text = String::new();
    text.push_str("STL T5 CLASSIFIER SUMMARY\n");
    let _ = writeln!(text, "W = {}", params.w);
    let _ = writeln!(text, "tau_s = {}", fmt6(params.tau_s));
    let _ = writeln!(text, "tau_l = {}", fmt6(params.tau_l));
    let _ = writeln!(text, "eps = {}", fmt6(params.eps));
    let _ = writeln!(text, "rows = {}", summary.rows);
    text.push_str("counts:\n");
    for state in State::ALL {
        let _ = writeln!(text, "  {state} = {}", summary.state_count(state));
    }
    text.push_str("collapse_counts:\n");
    let _ = writeln!(text, "  {} = {}", Collapse::True, summary.collapse_true);
    let _ = writeln!(text, "  {} = {}", Collapse::False, summary.collapse_false);
    let _ = writeln!(text, "  {} = {}", Collapse::Undefined, summary.collapse_undefined);
    let _ = writeln!(text, "trace_sha256 = {}", content_id(csv.as_bytes()));

    vec![Artifact::new(TRACE_OUT, csv), Artifact::new(SUMMARY, text)]
}

/// Adapter output with its provenance columns.
pub fn drawdown_artifact(rows: &[DrawdownRow]) -> Result<Artifact> {
    let mut wtr = csv_writer();
    wtr.write_record(["t", "d", "close", "roll_peak", "drawdown"])?;
    for r in rows {
        wtr.write_record([
            fmt6(r.t),
            fmt6(r.d),
            fmt6(r.close),
            fmt6(r.peak),
            fmt6(r.drawdown),
        ])?;
    }
    Ok(Artifact::new(DRAWDOWN_OUT, finish(wtr)?))
}

// ---------------------------------------------------------------------------
// SAD(P) audit
// ---------------------------------------------------------------------------

/// Tables I2 (declaration), I3 (accounting), I4 (timing) and a summary.
pub fn audit_artifacts(report: &AuditReport) -> Result<Vec<Artifact>> {
    let mut i2 = csv_writer();
    i2.write_record(["field", "value"])?;
    for (field, value) in report.declaration.fields() {
        i2.write_record([field, value.as_str()])?;
    }

    let acc = &report.accounting;
    let mut i3 = csv_writer();
    i3.write_record(["E_total", "E_premature", "E_aligned", "SAD(P)"])?;
    i3.write_record([
        acc.e_total.to_string(),
        acc.e_premature.to_string(),
        acc.e_aligned.to_string(),
        acc.sad.to_string(),
    ])?;

    let mut i4 = csv_writer();
    i4.write_record([
        "event_index",
        "sample_index",
        "event_type",
        "t_bool",
        "bool_after",
        "stl_at_t_bool",
        "t_stl",
        "delta",
        "premature_boolean",
        "aligned",
    ])?;
    for rec in &report.records {
        let at = match rec.stl_at_t_bool {
            Collapse::Undefined => "",
            other => other.as_str(),
        };
        i4.write_record([
            rec.event_index.to_string(),
            rec.event.index.to_string(),
            rec.event.direction.as_str().to_string(),
            fmt6(rec.event.t_bool),
            Collapse::from_bool(rec.event.desired).to_string(),
            at.to_string(),
            opt6(rec.t_stl),
            opt6(rec.delta),
            yes_no(rec.premature).to_string(),
            yes_no(rec.aligned).to_string(),
        ])?;
    }

    Ok(vec![
        Artifact::new(SAD_I2, finish(i2)?),
        Artifact::new(SAD_I3, finish(i3)?),
        Artifact::new(SAD_I4, finish(i4)?),
        Artifact::new(SUMMARY, audit_summary(report)),
    ])
}

fn audit_summary(report: &AuditReport) -> String {
    let decl = &report.declaration;
    let acc = &report.accounting;
    let p = &decl.params;

    let mut text = String::new();
    text.push_str("SAD(P) REPORT\n");
    text.push_str("----------------------------------------\n");
    for (field, value) in decl.fields() {
        if !field.starts_with("parameters_") {
            let _ = writeln!(text, "{field}: {value}");
        }
    }
    text.push_str("\nparameters:\n");
    let _ = writeln!(
        text,
        "  W={} tau_s={} tau_l={} eps={}",
        p.w,
        fmt6(p.tau_s),
        fmt6(p.tau_l),
        fmt6(p.eps)
    );
    text.push_str("\nevent accounting:\n");
    let _ = writeln!(text, "  E_total={}", acc.e_total);
    let _ = writeln!(text, "  E_premature={}", acc.e_premature);
    let _ = writeln!(text, "  E_aligned={}", acc.e_aligned);
    let _ = writeln!(text, "  SAD(P)={}", acc.sad);
    text.push_str("\ndefinition:\n");
    text.push_str("  SAD(P) = E_premature / E_total (NA when E_total = 0)\n");
    text.push_str("  an event is premature when phi_T at t_bool is not the new Boolean value\n");
    text
}

// ---------------------------------------------------------------------------
// Operator law tables
// ---------------------------------------------------------------------------

pub fn law_table_path(table: &LawTable) -> String {
    format!("{}_table.csv", table.name)
}

/// One CSV per table plus a pass/fail summary.
pub fn law_artifacts(tables: &[LawTable]) -> Result<Vec<Artifact>> {
    let mut out = Vec::with_capacity(tables.len() + 1);
    let mut text = String::new();
    text.push_str("STL OPERATOR LAW CHECKS\n");

    for table in tables {
        let mut wtr = csv_writer();
        wtr.write_record(["law", "expression", "lhs", "rhs", "verdict"])?;
        for c in &table.checks {
            wtr.write_record([
                c.law.code(),
                c.expression.as_str(),
                c.lhs.as_str(),
                c.rhs.as_str(),
                c.verdict(),
            ])?;
        }
        out.push(Artifact::new(law_table_path(table), finish(wtr)?));

        let failed = table.failures().count();
        let _ = writeln!(
            text,
            "{}: {} checks, {} failed, {}",
            table.name,
            table.checks.len(),
            failed,
            if failed == 0 { "PASS" } else { "FAIL" }
        );
        let _ = writeln!(text, "  {}", table.purpose);
        for c in table.failures() {
            let _ = writeln!(
                text,
                "  FAIL {} {}: {} != {}",
                c.law.code(),
                c.expression,
                c.lhs,
                c.rhs
            );
        }
    }
    let overall = tables.iter().all(LawTable::all_passed);
    let _ = writeln!(text, "OVERALL: {}", if overall { "PASS" } else { "FAIL" });
    out.push(Artifact::new(SUMMARY, text));
    Ok(out)
}
