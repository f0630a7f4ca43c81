//! Deterministic synthetic dominance traces.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Result, StlError};
use crate::sample::{DominanceSample, clamp01};

/// Append-only trace builder; row i sits at t0 + i·dt.
struct TraceBuilder {
    t0: f64,
    dt: f64,
    rows: Vec<DominanceSample>,
}

impl TraceBuilder {
    fn new(t0: f64, dt: f64) -> Self {
        Self {
            t0,
            dt,
            rows: Vec::new(),
        }
    }

    fn push(&mut self, d: f64) {
        let t = self.t0 + self.rows.len() as f64 * self.dt;
        self.rows.push(DominanceSample::new(t, d));
    }

    fn hold(&mut self, d: f64, n: usize) {
        for _ in 0..n {
            self.push(d);
        }
    }

    fn finish(self) -> Vec<DominanceSample> {
        self.rows
    }
}

fn require_positive_len(name: &str, n: usize) -> Result<()> {
    if n < 1 {
        return Err(StlError::Config(format!("{name} must be >= 1")));
    }
    Ok(())
}

fn require_step(dt: f64) -> Result<()> {
    if !(dt.is_finite() && dt > 0.0) {
        return Err(StlError::Config(format!("dt must be > 0 (dt={dt})")));
    }
    Ok(())
}

/// Demo trace: stable low, ramp up, stable high, ramp down, stable low.
/// 50 rows at t = 0..49.
pub fn sample_trace() -> Vec<DominanceSample> {
    let mut b = TraceBuilder::new(0.0, 1.0);
    b.hold(0.02, 10);
    for i in 0..10 {
        b.push(0.10 + i as f64 * 0.06);
    }
    b.hold(0.98, 10);
    for i in 0..10 {
        b.push(0.90 - i as f64 * 0.07);
    }
    b.hold(0.02, 10);
    b.finish()
}

/// Negative-control trace: 20×0.0, ramp to 1.0 in tenths, 25×1.0, ramp back
/// to 0.0 in tenths, 20×0.0. 85 rows, t = i·dt.
pub fn negctl_trace(dt: f64) -> Result<Vec<DominanceSample>> {
    require_step(dt)?;
    let mut b = TraceBuilder::new(0.0, dt);
    b.hold(0.0, 20);
    for k in 1..=10 {
        b.push(k as f64 / 10.0);
    }
    b.hold(1.0, 25);
    for k in (0..=9).rev() {
        b.push(k as f64 / 10.0);
    }
    b.hold(0.0, 20);
    Ok(b.finish())
}

/// Near-threshold stress pattern: per cycle, "almost stable" holds one
/// sample short of the window on both sides, then holds that do earn S and
/// Zstar.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct StressSpec {
    pub t0: f64,
    pub dt: f64,
    pub tau_s: f64,
    pub tau_l: f64,
    pub cycles: usize,
    pub hold_short: usize,
    pub hold_long: usize,
    pub step: f64,
}

impl Default for StressSpec {
    fn default() -> Self {
        Self {
            t0: 0.0,
            dt: 1.0,
            tau_s: 0.95,
            tau_l: 0.05,
            cycles: 4,
            hold_short: 9,
            hold_long: 11,
            step: 0.01,
        }
    }
}

pub fn threshold_stress_trace(spec: &StressSpec) -> Result<Vec<DominanceSample>> {
    if !(0.0 <= spec.tau_l && spec.tau_l < spec.tau_s && spec.tau_s <= 1.0) {
        return Err(StlError::Config("require 0 <= tau_l < tau_s <= 1".into()));
    }
    require_positive_len("cycles", spec.cycles)?;
    require_positive_len("hold_short", spec.hold_short)?;
    require_positive_len("hold_long", spec.hold_long)?;
    require_step(spec.dt)?;
    if !(spec.step.is_finite() && spec.step > 0.0) {
        return Err(StlError::Config(format!("step must be > 0 (step={})", spec.step)));
    }

    let below_ts = clamp01(spec.tau_s - spec.step);
    let above_ts = clamp01(spec.tau_s + spec.step);
    let above_tl = clamp01(spec.tau_l + spec.step);
    let below_tl = clamp01(spec.tau_l - spec.step);

    let mut b = TraceBuilder::new(spec.t0, spec.dt);
    for _ in 0..spec.cycles {
        b.hold(below_ts, spec.hold_short);
        b.push(above_ts);
        b.hold(below_ts, spec.hold_short);
        b.hold(above_ts, spec.hold_long);

        b.hold(above_tl, spec.hold_short);
        b.push(below_tl);
        b.hold(above_tl, spec.hold_short);
        b.hold(below_tl, spec.hold_long);
    }
    Ok(b.finish())
}

/// Phase-change shape: a long "pre" plateau, an abrupt jump to solid, then
/// an abrupt drop to liquid.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct IceSpec {
    pub t0: f64,
    pub dt: f64,
    pub pre_len: usize,
    pub solid_len: usize,
    pub liquid_len: usize,
    pub d_pre: f64,
    pub d_solid: f64,
    pub d_liquid: f64,
    pub jump_steps: usize,
}

impl Default for IceSpec {
    fn default() -> Self {
        Self {
            t0: 0.0,
            dt: 1.0,
            pre_len: 40,
            solid_len: 30,
            liquid_len: 30,
            d_pre: 0.10,
            d_solid: 0.98,
            d_liquid: 0.02,
            jump_steps: 2,
        }
    }
}

pub fn ice_like_trace(spec: &IceSpec) -> Result<Vec<DominanceSample>> {
    require_positive_len("pre_len", spec.pre_len)?;
    require_positive_len("solid_len", spec.solid_len)?;
    require_positive_len("liquid_len", spec.liquid_len)?;
    require_positive_len("jump_steps", spec.jump_steps)?;
    require_step(spec.dt)?;

    let mut b = TraceBuilder::new(spec.t0, spec.dt);
    b.hold(spec.d_pre, spec.pre_len);
    b.hold(spec.d_solid, spec.jump_steps + spec.solid_len);
    b.hold(spec.d_liquid, spec.jump_steps + spec.liquid_len);
    Ok(b.finish())
}

/// Bounded random walk on [0,1] with unit t-steps. Deterministic for a
/// given rng state.
pub fn jitter_trace(n: usize, step: f64, rng: &mut impl Rng) -> Vec<DominanceSample> {
    let mut b = TraceBuilder::new(0.0, 1.0);
    let mut d: f64 = rng.random();
    for _ in 0..n {
        b.push(d);
        d = clamp01(d + rng.random_range(-step..=step));
    }
    b.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn rng() -> SmallRng {
        SmallRng::seed_from_u64(42)
    }

    #[test]
    fn test_sample_trace_shape() {
        let trace = sample_trace();
        assert_eq!(trace.len(), 50);
        assert_eq!(trace[0].d, 0.02);
        assert_eq!(trace[25].d, 0.98);
        assert_eq!(trace[49].t, 49.0);
    }

    #[test]
    fn test_negctl_shape() {
        let trace = negctl_trace(1.0).unwrap();
        assert_eq!(trace.len(), 85);
        assert_eq!(trace[19].d, 0.0);
        assert_eq!(trace[20].d, 0.1);
        assert_eq!(trace[29].d, 1.0);
        assert_eq!(trace[55].d, 0.9);
        assert_eq!(trace[64].d, 0.0);
        assert_eq!(trace[84].t, 84.0);
    }

    #[test]
    fn test_negctl_rejects_bad_step() {
        assert!(negctl_trace(0.0).is_err());
    }

    #[test]
    fn test_stress_length() {
        let spec = StressSpec::default();
        let trace = threshold_stress_trace(&spec).unwrap();
        let per_cycle = 2 * (2 * spec.hold_short + 1 + spec.hold_long);
        assert_eq!(trace.len(), spec.cycles * per_cycle);
    }

    #[test]
    fn test_stress_rejects_bad_spec() {
        let spec = StressSpec {
            tau_s: 0.05,
            tau_l: 0.95,
            ..StressSpec::default()
        };
        assert!(threshold_stress_trace(&spec).is_err());
        let spec = StressSpec {
            step: 0.0,
            ..StressSpec::default()
        };
        assert!(threshold_stress_trace(&spec).is_err());
    }

    #[test]
    fn test_ice_like_length() {
        let spec = IceSpec::default();
        let trace = ice_like_trace(&spec).unwrap();
        assert_eq!(trace.len(), 40 + 32 + 32);
        assert_eq!(trace[40].d, 0.98);
        assert_eq!(trace[72].d, 0.02);
    }

    #[test]
    fn test_jitter_is_seeded_and_bounded() {
        let a = jitter_trace(500, 0.1, &mut rng());
        let b = jitter_trace(500, 0.1, &mut rng());
        assert_eq!(a, b);
        assert!(a.iter().all(|s| (0.0..=1.0).contains(&s.d)));
    }
}
