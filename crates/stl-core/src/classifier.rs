use serde::Serialize;

use crate::error::{Result, StlError};
use crate::params::ClassifierParams;
use crate::sample::{ClassifiedSample, DominanceSample, clamp01};
use crate::state::{Collapse, State, phi_t};

/// Direction flag from a first difference: +1 above the deadband, -1 below
/// its negative, 0 inside it.
pub fn direction(delta_d: f64, eps: f64) -> i8 {
    if delta_d > eps {
        1
    } else if delta_d < -eps {
        -1
    } else {
        0
    }
}

/// First matching rule wins: stable TRUE, stable FALSE, rising, falling, Z0.
pub fn classify_state(d: f64, r: i8, s: bool, params: &ClassifierParams) -> State {
    let mid = d > params.tau_l && d < params.tau_s;
    if d >= params.tau_s && s {
        State::S
    } else if d <= params.tau_l && s {
        State::Zstar
    } else if mid && r == 1 {
        State::Eplus
    } else if mid && r == -1 {
        State::Eminus
    } else {
        State::Z0
    }
}

/// Lengths of the current runs at or above tau_s and at or below tau_l.
///
/// A window [i-(W-1), i] lies entirely on one side exactly when the run on
/// that side ending at i is at least W long, so one pass replaces the
/// per-sample window rescan.
#[derive(Default)]
struct SideRuns {
    high: usize,
    low: usize,
}

impl SideRuns {
    fn push(&mut self, d: f64, params: &ClassifierParams) {
        self.high = if d >= params.tau_s { self.high + 1 } else { 0 };
        self.low = if d <= params.tau_l { self.low + 1 } else { 0 };
    }

    fn stable(&self, d: f64, params: &ClassifierParams) -> bool {
        if params.w <= 1 {
            return true;
        }
        let high = d >= params.tau_s && self.high >= params.w;
        let low = d <= params.tau_l && self.low >= params.w;
        high || low
    }
}

/// Classify a complete, ordered dominance trace.
///
/// Parameters are validated before any sample is touched; `d` is clamped to
/// [0,1] before use. Output has one row per input row, in input order.
pub fn classify(
    samples: &[DominanceSample],
    params: &ClassifierParams,
) -> Result<Vec<ClassifiedSample>> {
    params.validate()?;
    if samples.is_empty() {
        return Err(StlError::EmptyInput);
    }

    let mut out = Vec::with_capacity(samples.len());
    let mut runs = SideRuns::default();
    let mut prev_d: Option<f64> = None;

    for sample in samples {
        let d = clamp01(sample.d);
        let delta_d = prev_d.map_or(0.0, |p| d - p);
        let r = direction(delta_d, params.eps);
        runs.push(d, params);
        let s = runs.stable(d, params);
        let state = classify_state(d, r, s, params);

        out.push(ClassifiedSample {
            t: sample.t,
            d,
            delta_d,
            r,
            s: u8::from(s),
            state,
            phi_t: phi_t(state),
        });
        prev_d = Some(d);
    }

    Ok(out)
}

/// Per-state and per-collapse counts of a classified trace.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TraceSummary {
    pub rows: usize,
    pub z0: usize,
    pub eplus: usize,
    pub s: usize,
    pub eminus: usize,
    pub zstar: usize,
    pub collapse_true: usize,
    pub collapse_false: usize,
    pub collapse_undefined: usize,
}

impl TraceSummary {
    pub fn from_trace(trace: &[ClassifiedSample]) -> Self {
        let mut summary = Self {
            rows: trace.len(),
            ..Self::default()
        };
        for row in trace {
            match row.state {
                State::Z0 => summary.z0 += 1,
                State::Eplus => summary.eplus += 1,
                State::S => summary.s += 1,
                State::Eminus => summary.eminus += 1,
                State::Zstar => summary.zstar += 1,
            }
            match row.phi_t {
                Collapse::True => summary.collapse_true += 1,
                Collapse::False => summary.collapse_false += 1,
                Collapse::Undefined => summary.collapse_undefined += 1,
            }
        }
        summary
    }

    pub fn state_count(&self, state: State) -> usize {
        match state {
            State::Z0 => self.z0,
            State::Eplus => self.eplus,
            State::S => self.s,
            State::Eminus => self.eminus,
            State::Zstar => self.zstar,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(w: usize) -> ClassifierParams {
        ClassifierParams::new(w, 0.90, 0.10, 0.02).unwrap()
    }

    #[test]
    fn test_direction_deadband() {
        assert_eq!(direction(0.03, 0.02), 1);
        assert_eq!(direction(-0.03, 0.02), -1);
        assert_eq!(direction(0.02, 0.02), 0);
        assert_eq!(direction(-0.02, 0.02), 0);
        assert_eq!(direction(0.0, 0.0), 0);
    }

    #[test]
    fn test_classify_state_priority() {
        let p = params(3);
        assert_eq!(classify_state(0.95, -1, true, &p), State::S);
        assert_eq!(classify_state(0.05, 1, true, &p), State::Zstar);
        assert_eq!(classify_state(0.95, 1, false, &p), State::Z0);
        assert_eq!(classify_state(0.5, 1, false, &p), State::Eplus);
        assert_eq!(classify_state(0.5, -1, true, &p), State::Eminus);
        assert_eq!(classify_state(0.5, 0, true, &p), State::Z0);
        // thresholds themselves are not mid-band
        assert_eq!(classify_state(0.90, 1, false, &p), State::Z0);
        assert_eq!(classify_state(0.10, -1, false, &p), State::Z0);
    }

    #[test]
    fn test_empty_input_rejected() {
        assert_eq!(classify(&[], &params(3)), Err(StlError::EmptyInput));
    }

    #[test]
    fn test_bad_params_rejected_before_samples() {
        let bad = ClassifierParams {
            w: 0,
            ..ClassifierParams::default()
        };
        // empty input would also fail; config must win
        assert!(matches!(classify(&[], &bad), Err(StlError::Config(_))));
    }

    #[test]
    fn test_first_delta_is_zero() {
        let out = classify(&DominanceSample::indexed(&[0.7, 0.2]), &params(3)).unwrap();
        assert_eq!(out[0].delta_d, 0.0);
        assert_eq!(out[0].r, 0);
        assert!((out[1].delta_d + 0.5).abs() < 1e-12);
        assert_eq!(out[1].r, -1);
    }

    #[test]
    fn test_stable_true_after_window() {
        let out = classify(&DominanceSample::indexed(&[0.95; 5]), &params(3)).unwrap();
        let states: Vec<State> = out.iter().map(|c| c.state).collect();
        assert_eq!(
            states,
            vec![State::Z0, State::Z0, State::S, State::S, State::S]
        );
        assert_eq!(out[2].phi_t, Collapse::True);
    }

    #[test]
    fn test_window_broken_by_mid_value() {
        let out =
            classify(&DominanceSample::indexed(&[0.95, 0.95, 0.5, 0.95, 0.95, 0.95]), &params(3))
                .unwrap();
        let s: Vec<u8> = out.iter().map(|c| c.s).collect();
        assert_eq!(s, vec![0, 0, 0, 0, 0, 1]);
        assert_eq!(out[2].state, State::Eminus);
        assert_eq!(out[3].state, State::Z0);
    }

    #[test]
    fn test_out_of_range_values_are_clamped() {
        let samples = vec![
            DominanceSample { t: 0.0, d: -3.0 },
            DominanceSample { t: 1.0, d: 7.0 },
        ];
        let out = classify(&samples, &params(1)).unwrap();
        assert_eq!(out[0].d, 0.0);
        assert_eq!(out[0].state, State::Zstar);
        assert_eq!(out[1].d, 1.0);
        assert_eq!(out[1].delta_d, 1.0);
        assert_eq!(out[1].state, State::S);
    }

    #[test]
    fn test_window_one_is_always_stable() {
        let out = classify(&DominanceSample::indexed(&[0.5, 0.2, 0.99, 0.0]), &params(1)).unwrap();
        assert!(out.iter().all(|c| c.s == 1));
    }

    #[test]
    fn test_summary_counts() {
        let out = classify(&DominanceSample::indexed(&[0.95; 5]), &params(3)).unwrap();
        let summary = TraceSummary::from_trace(&out);
        assert_eq!(summary.rows, 5);
        assert_eq!(summary.z0, 2);
        assert_eq!(summary.s, 3);
        assert_eq!(summary.state_count(State::S), 3);
        assert_eq!(summary.collapse_true, 3);
        assert_eq!(summary.collapse_undefined, 2);
    }
}
