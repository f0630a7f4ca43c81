//! Artifact layer for stl-core runs: CSV ingestion, fixed-precision tables,
//! TOML run files and SHA-256 manifests.

pub mod config;
pub mod error;
pub mod input;
pub mod manifest;
pub mod tables;

pub use config::{DatasetSection, NaiveSection, NaiveSettings, ParamsSection, RunConfig};
pub use error::{ReportError, Result};
pub use input::{
    PriceRow, parse_collapse_csv, parse_dominance_csv, parse_price_table, read_collapse_csv,
    read_dominance_csv, read_price_table,
};
pub use manifest::{
    MANIFEST, TreeEntry, compare_trees, manifest_text, tree_entries, write_artifacts,
    write_tree_manifest,
};
pub use tables::{
    Artifact, audit_artifacts, classifier_artifacts, drawdown_artifact, law_artifacts,
    raw_trace_artifact,
};
