//! Price-series adapter: rolling drawdown mapped onto a dominance trace.

use std::collections::VecDeque;

use serde::Serialize;

use crate::error::{Result, StlError};
use crate::sample::{DominanceSample, clamp01};

/// One adapted row. `t` is the row index.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct DrawdownRow {
    pub t: f64,
    pub d: f64,
    pub close: f64,
    pub peak: f64,
    pub drawdown: f64,
}

impl DrawdownRow {
    pub fn sample(&self) -> DominanceSample {
        DominanceSample {
            t: self.t,
            d: self.d,
        }
    }
}

/// d(i) = clamp(drawdown(i) / dd_scale), where drawdown is measured from the
/// maximum close over the trailing `lookback` rows (fewer at the start).
pub fn drawdown_trace(closes: &[f64], lookback: usize, dd_scale: f64) -> Result<Vec<DrawdownRow>> {
    if lookback < 1 {
        return Err(StlError::Config("lookback must be >= 1".into()));
    }
    if !(dd_scale.is_finite() && dd_scale > 0.0) {
        return Err(StlError::Config(format!(
            "dd_scale must be > 0 (dd_scale={dd_scale})"
        )));
    }
    if closes.is_empty() {
        return Err(StlError::EmptyInput);
    }
    if closes.len() < lookback {
        return Err(StlError::Config(format!(
            "not enough rows ({}) for lookback {lookback}",
            closes.len()
        )));
    }
    if let Some(row) = closes.iter().position(|c| !c.is_finite()) {
        return Err(StlError::Config(format!("non-finite close at row {row}")));
    }

    // Indices of candidate maxima, closes strictly decreasing front to back.
    let mut window: VecDeque<usize> = VecDeque::with_capacity(lookback);
    let mut rows = Vec::with_capacity(closes.len());

    for (i, &close) in closes.iter().enumerate() {
        while window.back().is_some_and(|&j| closes[j] <= close) {
            window.pop_back();
        }
        window.push_back(i);
        while window.front().is_some_and(|&j| j + lookback <= i) {
            window.pop_front();
        }

        let peak = window.front().map_or(close, |&j| closes[j]);
        let drawdown = if peak > 0.0 { (peak - close) / peak } else { 0.0 };
        rows.push(DrawdownRow {
            t: i as f64,
            d: clamp01(drawdown / dd_scale),
            close,
            peak,
            drawdown,
        });
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn naive_peak(closes: &[f64], i: usize, lookback: usize) -> f64 {
        let start = (i + 1).saturating_sub(lookback);
        closes[start..=i].iter().cloned().fold(f64::MIN, f64::max)
    }

    #[test]
    fn test_peak_matches_window_max() {
        let closes = [10.0, 12.0, 11.0, 9.0, 13.0, 8.0, 7.0, 7.5, 6.0, 12.5];
        for lookback in 1..=closes.len() {
            let rows = drawdown_trace(&closes, lookback, 0.2).unwrap();
            for (i, row) in rows.iter().enumerate() {
                assert_eq!(row.peak, naive_peak(&closes, i, lookback), "L={lookback} i={i}");
            }
        }
    }

    #[test]
    fn test_drawdown_scaling() {
        let rows = drawdown_trace(&[100.0, 90.0, 70.0], 3, 0.2).unwrap();
        assert_eq!(rows[0].d, 0.0);
        assert_relative_eq!(rows[1].drawdown, 0.1);
        assert_relative_eq!(rows[1].d, 0.5);
        // 30% drawdown saturates at 1
        assert_eq!(rows[2].d, 1.0);
        assert_eq!(rows[2].t, 2.0);
    }

    #[test]
    fn test_non_positive_peak_gives_zero() {
        let rows = drawdown_trace(&[0.0, -1.0], 1, 0.5).unwrap();
        assert!(rows.iter().all(|r| r.drawdown == 0.0 && r.d == 0.0));
    }

    #[test]
    fn test_rejects_bad_arguments() {
        assert!(drawdown_trace(&[1.0, 2.0], 0, 0.2).is_err());
        assert!(drawdown_trace(&[1.0, 2.0], 3, 0.2).is_err());
        assert!(drawdown_trace(&[1.0, 2.0], 1, 0.0).is_err());
        assert!(drawdown_trace(&[1.0, f64::NAN], 1, 0.2).is_err());
        assert_eq!(drawdown_trace(&[], 1, 0.2), Err(StlError::EmptyInput));
    }
}
