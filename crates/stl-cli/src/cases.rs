//! Verification case set. Each case renders into its own directory with
//! per-stage manifests, then a case manifest; the replay directory gets a
//! summary and a manifest over everything.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use stl_core::{
    AuditRequest, ClassifierParams, DatasetIdentity, EventFilter, NaivePolicy, Sad, ThresholdRule,
    laws, negctl_trace, run_pipeline,
};
use stl_report::{
    Artifact, audit_artifacts, classifier_artifacts, law_artifacts, raw_trace_artifact,
    write_artifacts, write_tree_manifest,
};

pub const CORE_CASES: [&str; 2] = ["NEGCTL_SWEEP", "OPERATOR_PRESERVATION"];

fn ensure_clean_dir(dir: &Path) -> Result<()> {
    if dir.exists() {
        fs::remove_dir_all(dir).with_context(|| format!("failed to clear {}", dir.display()))?;
    }
    fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))
}

fn summary(lines: &[String]) -> Artifact {
    let mut text = lines.join("\n");
    text.push('\n');
    Artifact::new("summary.txt", text)
}

fn negctl_request(policy: NaivePolicy, naive_label: &str) -> AuditRequest {
    AuditRequest {
        dataset: DatasetIdentity {
            name: "NEGCTL_SYNTH".into(),
            source: "STL_NEGATIVE_CONTROL".into(),
            adapter: "negctl".into(),
            proposition: "NEGCTL_T5_CLASSIFICATION".into(),
        },
        params: ClassifierParams::locked(),
        policy,
        events: EventFilter::EnterTrue,
        naive_label: Some(naive_label.into()),
    }
}

/// negctl trace → locked classifier → SAD against an instantaneous
/// threshold and against the debounced control.
fn negctl_sweep(case_dir: &Path) -> Result<()> {
    let raw = negctl_trace(1.0)?;
    let params = ClassifierParams::locked();

    let threshold = NaivePolicy::Threshold(ThresholdRule::parse("d>=0.5")?);
    let crossing = run_pipeline(&raw, &negctl_request(threshold, "raw_threshold_crossing"))
        .context("NEGCTL_SWEEP threshold audit failed")?;
    let debounced = run_pipeline(
        &raw,
        &negctl_request(NaivePolicy::Debounced(params), "debounced_control"),
    )
    .context("NEGCTL_SWEEP debounced audit failed")?;

    let control = debounced.report.accounting.sad;
    if !matches!(control, Sad::NotApplicable | Sad::Ratio(0.0)) {
        bail!("NEGCTL_SWEEP: debounced control has SAD(P)={control}, expected 0 or NA");
    }

    write_artifacts(
        &case_dir.join("TRACE"),
        &[raw_trace_artifact("negctl_input.csv", &raw)],
    )?;
    write_artifacts(
        &case_dir.join("CLASSIFY"),
        &classifier_artifacts(&crossing.classified, &params),
    )?;
    write_artifacts(&case_dir.join("SAD"), &audit_artifacts(&crossing.report)?)?;
    write_artifacts(
        &case_dir.join("SAD_DEBOUNCED"),
        &audit_artifacts(&debounced.report)?,
    )?;
    write_artifacts(
        case_dir,
        &[summary(&[
            "CASE: NEGCTL_SWEEP".into(),
            format!("SAD(P) threshold = {}", crossing.report.accounting.sad),
            format!("SAD(P) debounced = {control}"),
            "OK".into(),
        ])],
    )?;
    write_tree_manifest(case_dir)?;
    Ok(())
}

fn operator_preservation(case_dir: &Path) -> Result<()> {
    let tables = laws::all_tables();
    let failed: usize = tables.iter().map(|t| t.failures().count()).sum();
    write_artifacts(case_dir, &law_artifacts(&tables)?)?;
    if failed > 0 {
        bail!("OPERATOR_PRESERVATION: {failed} law checks failed");
    }
    Ok(())
}

/// Render the core case set into `replay_dir`, replacing anything there.
pub fn run_caseset(replay_dir: &Path) -> Result<()> {
    ensure_clean_dir(replay_dir)?;
    for case in CORE_CASES {
        let case_dir = replay_dir.join(case);
        tracing::info!("running case {case}");
        match case {
            "NEGCTL_SWEEP" => negctl_sweep(&case_dir)?,
            "OPERATOR_PRESERVATION" => operator_preservation(&case_dir)?,
            other => bail!("unknown case: {other}"),
        }
    }
    write_artifacts(
        replay_dir,
        &[summary(&[
            "CASESET: core".into(),
            "OK: STL verification complete".into(),
        ])],
    )?;
    write_tree_manifest(replay_dir)?;
    Ok(())
}
