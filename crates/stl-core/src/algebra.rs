//! T5 operator algebra: NOT_s, AND_s, OR_s over the closed five-state domain.
//!
//! One canonical algebra. The two-valued view over {S, Zstar} is [`Stable`],
//! which delegates every operation here and is closed under them.

use std::ops::{BitAnd, BitOr, Not};

use crate::state::State;

/// Swaps S↔Zstar and Eplus↔Eminus; fixes Z0.
pub fn not_s(a: State) -> State {
    match a {
        State::S => State::Zstar,
        State::Zstar => State::S,
        State::Eplus => State::Eminus,
        State::Eminus => State::Eplus,
        State::Z0 => State::Z0,
    }
}

/// Conservative conjunction: stable FALSE dominates, S only from S∧S,
/// any transitional operand keeps the result transitional.
pub fn and_s(a: State, b: State) -> State {
    match (a, b) {
        (State::Zstar, _) | (_, State::Zstar) => State::Zstar,
        (State::S, State::S) => State::S,
        _ => transitional_join(a, b),
    }
}

/// Dual of [`and_s`]: stable TRUE dominates, Zstar only from Zstar∨Zstar.
pub fn or_s(a: State, b: State) -> State {
    match (a, b) {
        (State::S, _) | (_, State::S) => State::S,
        (State::Zstar, State::Zstar) => State::Zstar,
        _ => transitional_join(a, b),
    }
}

/// Result for a pair with at least one transitional operand and no
/// dominating endpoint. Direction is preserved where either side has one.
fn transitional_join(a: State, b: State) -> State {
    match (a, b) {
        (State::Z0, State::Z0) => State::Z0,
        (State::Eplus, _) | (_, State::Eplus) => State::Eplus,
        (State::Eminus, _) | (_, State::Eminus) => State::Eminus,
        _ => State::Z0,
    }
}

/// A state restricted to the stable endpoints {S, Zstar}.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Stable(State);

impl Stable {
    pub const TRUE: Stable = Stable(State::S);
    pub const FALSE: Stable = Stable(State::Zstar);
    pub const ALL: [Stable; 2] = [Stable::TRUE, Stable::FALSE];

    /// `None` for transitional states.
    pub fn new(state: State) -> Option<Self> {
        state.is_stable().then_some(Self(state))
    }

    pub fn from_bool(b: bool) -> Self {
        if b { Self::TRUE } else { Self::FALSE }
    }

    pub fn state(self) -> State {
        self.0
    }

    pub fn truth(self) -> bool {
        self.0 == State::S
    }
}

impl Not for Stable {
    type Output = Stable;

    fn not(self) -> Stable {
        Stable(not_s(self.0))
    }
}

impl BitAnd for Stable {
    type Output = Stable;

    fn bitand(self, rhs: Stable) -> Stable {
        Stable(and_s(self.0, rhs.0))
    }
}

impl BitOr for Stable {
    type Output = Stable;

    fn bitor(self, rhs: Stable) -> Stable {
        Stable(or_s(self.0, rhs.0))
    }
}

impl From<Stable> for State {
    fn from(s: Stable) -> State {
        s.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Collapse, phi_t};

    /// Direct transcription of the ordered rule list, used as a reference
    /// for the match-based operators.
    fn and_s_rules(a: State, b: State) -> State {
        use State::*;
        if a == Zstar || b == Zstar {
            return Zstar;
        }
        if a == S && b == S {
            return S;
        }
        if a.is_transitional() || b.is_transitional() {
            if a == Z0 && b == Z0 {
                return Z0;
            }
            if a == Eplus || b == Eplus {
                return Eplus;
            }
            if a == Eminus || b == Eminus {
                return Eminus;
            }
            return Z0;
        }
        S
    }

    fn or_s_rules(a: State, b: State) -> State {
        use State::*;
        if a == S || b == S {
            return S;
        }
        if a == Zstar && b == Zstar {
            return Zstar;
        }
        if a.is_transitional() || b.is_transitional() {
            if a == Z0 && b == Z0 {
                return Z0;
            }
            if a == Eplus || b == Eplus {
                return Eplus;
            }
            if a == Eminus || b == Eminus {
                return Eminus;
            }
            return Z0;
        }
        Zstar
    }

    #[test]
    fn test_operators_match_rule_list_on_full_domain() {
        for a in State::ALL {
            for b in State::ALL {
                assert_eq!(and_s(a, b), and_s_rules(a, b), "AND_s({a},{b})");
                assert_eq!(or_s(a, b), or_s_rules(a, b), "OR_s({a},{b})");
            }
        }
    }

    #[test]
    fn test_not_s_table() {
        assert_eq!(not_s(State::S), State::Zstar);
        assert_eq!(not_s(State::Zstar), State::S);
        assert_eq!(not_s(State::Eplus), State::Eminus);
        assert_eq!(not_s(State::Eminus), State::Eplus);
        assert_eq!(not_s(State::Z0), State::Z0);
    }

    #[test]
    fn test_operators_commute() {
        for a in State::ALL {
            for b in State::ALL {
                assert_eq!(and_s(a, b), and_s(b, a));
                assert_eq!(or_s(a, b), or_s(b, a));
            }
        }
    }

    #[test]
    fn test_mixed_stable_transitional_is_conservative() {
        for x in State::TRANSITIONAL {
            assert_eq!(phi_t(and_s(State::S, x)), Collapse::Undefined);
            assert_eq!(phi_t(or_s(State::Zstar, x)), Collapse::Undefined);
        }
    }

    #[test]
    fn test_direction_preserved() {
        assert_eq!(and_s(State::Eplus, State::Eminus), State::Eplus);
        assert_eq!(or_s(State::Z0, State::Eminus), State::Eminus);
        assert_eq!(and_s(State::S, State::Z0), State::Z0);
    }

    #[test]
    fn test_stable_view_agrees_with_general_algebra() {
        for a in Stable::ALL {
            assert_eq!((!a).state(), not_s(a.state()));
            for b in Stable::ALL {
                assert_eq!((a & b).state(), and_s(a.state(), b.state()));
                assert_eq!((a | b).state(), or_s(a.state(), b.state()));
                assert_eq!((a & b).truth(), a.truth() && b.truth());
                assert_eq!((a | b).truth(), a.truth() || b.truth());
            }
        }
    }

    #[test]
    fn test_stable_rejects_transitional() {
        for st in State::TRANSITIONAL {
            assert!(Stable::new(st).is_none());
        }
        assert_eq!(Stable::new(State::S), Some(Stable::TRUE));
        assert_eq!(Stable::from_bool(false), Stable::FALSE);
    }
}
