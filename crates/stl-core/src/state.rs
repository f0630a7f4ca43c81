use std::fmt;

use serde::{Deserialize, Serialize};

/// The five-state T5 classification of a single sample.
///
/// `S` and `Zstar` are the stable endpoints (earned TRUE / earned FALSE);
/// `Z0`, `Eplus` and `Eminus` are transitional.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum State {
    Z0,
    Eplus,
    S,
    Eminus,
    Zstar,
}

impl State {
    /// Every state, in canonical reporting order.
    pub const ALL: [State; 5] = [State::Z0, State::Eplus, State::S, State::Eminus, State::Zstar];

    /// The stable endpoints.
    pub const STABLE: [State; 2] = [State::S, State::Zstar];

    /// The transitional states.
    pub const TRANSITIONAL: [State; 3] = [State::Z0, State::Eplus, State::Eminus];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Z0 => "Z0",
            Self::Eplus => "Eplus",
            Self::S => "S",
            Self::Eminus => "Eminus",
            Self::Zstar => "Zstar",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "Z0" => Some(Self::Z0),
            "Eplus" => Some(Self::Eplus),
            "S" => Some(Self::S),
            "Eminus" => Some(Self::Eminus),
            "Zstar" => Some(Self::Zstar),
            _ => None,
        }
    }

    pub fn is_stable(&self) -> bool {
        matches!(self, Self::S | Self::Zstar)
    }

    pub fn is_transitional(&self) -> bool {
        !self.is_stable()
    }

    /// phi_T applied to this state.
    pub fn collapse(self) -> Collapse {
        phi_t(self)
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tri-valued projection of a T5 state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Collapse {
    True,
    False,
    Undefined,
}

impl Collapse {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::True => "TRUE",
            Self::False => "FALSE",
            Self::Undefined => "UNDEFINED",
        }
    }

    pub fn from_bool(b: bool) -> Self {
        if b { Self::True } else { Self::False }
    }

    /// `None` for UNDEFINED.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::True => Some(true),
            Self::False => Some(false),
            Self::Undefined => None,
        }
    }

    /// Case-insensitive TRUE/FALSE; anything else (including blank) is UNDEFINED.
    pub fn from_str_lossy(s: &str) -> Self {
        match s.trim().to_ascii_uppercase().as_str() {
            "TRUE" => Self::True,
            "FALSE" => Self::False,
            _ => Self::Undefined,
        }
    }

    /// True iff this collapse is a definite truth value equal to `desired`.
    pub fn matches(&self, desired: bool) -> bool {
        self.as_bool() == Some(desired)
    }
}

impl fmt::Display for Collapse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The collapse map: S → TRUE, Zstar → FALSE, everything else → UNDEFINED.
pub fn phi_t(state: State) -> Collapse {
    match state {
        State::S => Collapse::True,
        State::Zstar => Collapse::False,
        State::Z0 | State::Eplus | State::Eminus => Collapse::Undefined,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phi_t_table() {
        assert_eq!(phi_t(State::S), Collapse::True);
        assert_eq!(phi_t(State::Zstar), Collapse::False);
        for st in State::TRANSITIONAL {
            assert_eq!(phi_t(st), Collapse::Undefined, "{st}");
        }
    }

    #[test]
    fn test_state_parse_roundtrip() {
        for st in State::ALL {
            assert_eq!(State::parse(st.as_str()), Some(st));
        }
        assert_eq!(State::parse("zstar"), None);
    }

    #[test]
    fn test_stable_partition() {
        let stable = State::ALL.iter().filter(|s| s.is_stable()).count();
        let trans = State::ALL.iter().filter(|s| s.is_transitional()).count();
        assert_eq!(stable, 2);
        assert_eq!(trans, 3);
    }

    #[test]
    fn test_collapse_lossy_parse() {
        assert_eq!(Collapse::from_str_lossy(" true "), Collapse::True);
        assert_eq!(Collapse::from_str_lossy("FALSE"), Collapse::False);
        assert_eq!(Collapse::from_str_lossy(""), Collapse::Undefined);
        assert_eq!(Collapse::from_str_lossy("UNDEFINED"), Collapse::Undefined);
    }

    #[test]
    fn test_undefined_never_matches() {
        assert!(!Collapse::Undefined.matches(true));
        assert!(!Collapse::Undefined.matches(false));
        assert!(Collapse::True.matches(true));
        assert!(!Collapse::False.matches(true));
    }

    #[test]
    fn test_collapse_serde_uppercase() {
        let json = serde_json::to_string(&Collapse::Undefined).unwrap();
        assert_eq!(json, "\"UNDEFINED\"");
    }
}
