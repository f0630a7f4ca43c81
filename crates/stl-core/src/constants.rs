/// Default stability window length (samples).
pub const DEFAULT_W: usize = 10;

/// Default stable-TRUE threshold.
pub const DEFAULT_TAU_S: f64 = 0.95;

/// Default stable-FALSE threshold.
pub const DEFAULT_TAU_L: f64 = 0.05;

/// Default derivative deadband for the direction flag r.
pub const DEFAULT_EPS: f64 = 0.01;

/// Locked verification profile: window length.
pub const LOCKED_W: usize = 20;

/// Locked verification profile: stable-TRUE threshold.
pub const LOCKED_TAU_S: f64 = 0.90;

/// Locked verification profile: stable-FALSE threshold.
pub const LOCKED_TAU_L: f64 = 0.10;

/// Locked verification profile: derivative deadband.
pub const LOCKED_EPS: f64 = 0.02;

/// Fractional digits for every real-valued field in serialized artifacts.
pub const DECIMALS: usize = 6;
