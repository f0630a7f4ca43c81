//! CSV/TSV ingestion for dominance traces, exported classified traces and
//! closing-price tables.

use std::fs;
use std::io::Read;
use std::path::Path;

use stl_core::{Collapse, CollapsePoint, DominanceSample, clamp01};

use crate::error::{ReportError, Result};

/// Accepted names for the collapse column of a classified trace.
pub const COLLAPSE_COLUMNS: [&str; 4] = ["phi_T", "phi", "collapse", "phiT"];

/// One dated closing price.
#[derive(Clone, Debug, PartialEq)]
pub struct PriceRow {
    pub date: String,
    pub close: f64,
}

fn reader<R: Read>(rdr: R, delimiter: u8) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .from_reader(rdr)
}

fn column(headers: &csv::StringRecord, name: &str, origin: &str) -> Result<usize> {
    headers.iter().position(|h| h == name).ok_or_else(|| {
        ReportError::Input(format!("{origin}: missing required column '{name}'"))
    })
}

fn field<'r>(
    record: &'r csv::StringRecord,
    idx: usize,
    name: &str,
    line: u64,
    origin: &str,
) -> Result<&'r str> {
    match record.get(idx) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ReportError::Input(format!(
            "{origin}: line {line}: empty '{name}'"
        ))),
    }
}

/// Parse a finite-or-infinite real; NaN is rejected as unparsable.
fn number(raw: &str, name: &str, line: u64, origin: &str) -> Result<f64> {
    match raw.parse::<f64>() {
        Ok(v) if !v.is_nan() => Ok(v),
        _ => Err(ReportError::Input(format!(
            "{origin}: line {line}: cannot parse {name}='{raw}'"
        ))),
    }
}

fn line_of(record: &csv::StringRecord) -> u64 {
    record.position().map_or(0, |p| p.line())
}

/// Read `t,d` records. Extra columns are ignored; `d` is clamped to [0,1].
pub fn parse_dominance_csv<R: Read>(rdr: R, origin: &str) -> Result<Vec<DominanceSample>> {
    let mut rdr = reader(rdr, b',');
    let headers = rdr.headers()?.clone();
    let t_idx = column(&headers, "t", origin)?;
    let d_idx = column(&headers, "d", origin)?;

    let mut samples = Vec::new();
    let mut clamped = 0usize;
    for record in rdr.records() {
        let record = record?;
        let line = line_of(&record);
        let t = number(field(&record, t_idx, "t", line, origin)?, "t", line, origin)?;
        let d = number(field(&record, d_idx, "d", line, origin)?, "d", line, origin)?;
        let c = clamp01(d);
        if c != d {
            clamped += 1;
        }
        samples.push(DominanceSample { t, d: c });
    }

    if samples.is_empty() {
        return Err(ReportError::Input(format!("{origin}: no data rows")));
    }
    if clamped > 0 {
        tracing::warn!("{origin}: clamped {clamped} out-of-range d values to [0,1]");
    }
    tracing::debug!("{origin}: read {} samples", samples.len());
    Ok(samples)
}

pub fn read_dominance_csv(path: &Path) -> Result<Vec<DominanceSample>> {
    let file = fs::File::open(path)?;
    parse_dominance_csv(file, &path.display().to_string())
}

/// Read `t` plus a collapse column from an exported classified trace.
/// Values other than TRUE/FALSE (case-insensitive) are UNDEFINED.
pub fn parse_collapse_csv<R: Read>(rdr: R, origin: &str) -> Result<Vec<CollapsePoint>> {
    let mut rdr = reader(rdr, b',');
    let headers = rdr.headers()?.clone();
    let t_idx = column(&headers, "t", origin)?;
    let phi_idx = COLLAPSE_COLUMNS
        .iter()
        .find_map(|name| headers.iter().position(|h| h == *name))
        .ok_or_else(|| {
            ReportError::Input(format!(
                "{origin}: missing collapse column (one of {})",
                COLLAPSE_COLUMNS.join(", ")
            ))
        })?;

    let mut points = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let line = line_of(&record);
        let t = number(field(&record, t_idx, "t", line, origin)?, "t", line, origin)?;
        let phi_t = Collapse::from_str_lossy(record.get(phi_idx).unwrap_or(""));
        points.push(CollapsePoint { t, phi_t });
    }
    if points.is_empty() {
        return Err(ReportError::Input(format!("{origin}: no data rows")));
    }
    Ok(points)
}

pub fn read_collapse_csv(path: &Path) -> Result<Vec<CollapsePoint>> {
    let file = fs::File::open(path)?;
    parse_collapse_csv(file, &path.display().to_string())
}

/// Read a dated price table, tab- or comma-separated (sniffed from the
/// header line), sorted ascending by the date string.
pub fn parse_price_table(
    text: &str,
    date_col: &str,
    close_col: &str,
    origin: &str,
) -> Result<Vec<PriceRow>> {
    let first = text.lines().next().unwrap_or("");
    let delimiter = if first.contains('\t') { b'\t' } else { b',' };
    let mut rdr = reader(text.as_bytes(), delimiter);
    let headers = rdr.headers()?.clone();
    let date_idx = column(&headers, date_col, origin)?;
    let close_idx = column(&headers, close_col, origin)?;

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let line = line_of(&record);
        let date = field(&record, date_idx, date_col, line, origin)?.to_string();
        let raw = field(&record, close_idx, close_col, line, origin)?;
        let close = number(&raw.replace(',', ""), close_col, line, origin)?;
        rows.push(PriceRow { date, close });
    }
    // ISO dates sort lexicographically; stable for duplicate dates.
    rows.sort_by(|a, b| a.date.cmp(&b.date));
    Ok(rows)
}

pub fn read_price_table(path: &Path, date_col: &str, close_col: &str) -> Result<Vec<PriceRow>> {
    let text = fs::read_to_string(path)?;
    parse_price_table(&text, date_col, close_col, &path.display().to_string())
}
