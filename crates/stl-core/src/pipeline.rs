use serde::Serialize;

use crate::audit::{AuditReport, DatasetIdentity, EventFilter, RunDeclaration, audit};
use crate::canonical::{classified_trace_csv, content_id, raw_trace_csv};
use crate::classifier::classify;
use crate::error::Result;
use crate::naive::NaivePolicy;
use crate::params::ClassifierParams;
use crate::sample::{ClassifiedSample, DominanceSample};

/// One audit run over a raw trace.
#[derive(Clone, Debug)]
pub struct AuditRequest {
    pub dataset: DatasetIdentity,
    pub params: ClassifierParams,
    pub policy: NaivePolicy,
    pub events: EventFilter,
    /// Free-text label for the naive rule; defaults to the policy description.
    pub naive_label: Option<String>,
}

/// Classified trace plus the audit built on it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PipelineOutput {
    pub classified: Vec<ClassifiedSample>,
    pub report: AuditReport,
}

/// raw → classify → naive Boolean → audit, entirely in memory.
///
/// The classified trace is handed to the auditor by reference; content ids
/// are computed from the canonical renderings of both traces.
pub fn run_pipeline(raw: &[DominanceSample], request: &AuditRequest) -> Result<PipelineOutput> {
    request.params.validate()?;
    let classified = classify(raw, &request.params)?;
    let naive = request.policy.evaluate(raw);
    let outcome = audit(raw, &classified, &naive, request.events)?;

    let declaration = RunDeclaration {
        dataset: request.dataset.clone(),
        params: request.params,
        policy: request.policy,
        naive_rule: request
            .naive_label
            .clone()
            .unwrap_or_else(|| request.policy.to_string()),
        events: request.events,
        raw_trace_id: content_id(raw_trace_csv(raw).as_bytes()),
        classified_trace_id: content_id(classified_trace_csv(&classified).as_bytes()),
    };

    Ok(PipelineOutput {
        classified,
        report: AuditReport::new(declaration, outcome),
    })
}
