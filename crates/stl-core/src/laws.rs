//! Exhaustive law-check tables for the T5 algebra.
//!
//! The domain is finite, so every law can be checked over every operand
//! combination. Tables are produced in a fixed order for stable export.

use serde::Serialize;

use crate::algebra::{and_s, not_s, or_s};
use crate::state::{Collapse, State, phi_t};

/// Named algebraic law checked by a table row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Law {
    NotPreservation,
    AndPreservation,
    OrPreservation,
    Involution,
    DeMorganAnd,
    DeMorganOr,
    DominanceOr,
    DominanceAnd,
    NoCollapseAnd,
    NoCollapseOr,
    MixedAnd,
    MixedOr,
}

impl Law {
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotPreservation => "NOT",
            Self::AndPreservation => "AND",
            Self::OrPreservation => "OR",
            Self::Involution => "INV_NOTs",
            Self::DeMorganAnd => "DM1_STABLE",
            Self::DeMorganOr => "DM2_STABLE",
            Self::DominanceOr => "DOM_OR_S",
            Self::DominanceAnd => "DOM_AND_ZSTAR",
            Self::NoCollapseAnd => "NOACC_AND_TRANS",
            Self::NoCollapseOr => "NOACC_OR_TRANS",
            Self::MixedAnd => "MIX_AND_S_TRANS",
            Self::MixedOr => "MIX_OR_ZSTAR_TRANS",
        }
    }
}

/// One evaluated law instance.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LawCheck {
    pub law: Law,
    pub expression: String,
    pub lhs: String,
    pub rhs: String,
    pub passed: bool,
}

impl LawCheck {
    fn new(law: Law, expression: String, lhs: impl ToString, rhs: impl ToString) -> Self {
        let lhs = lhs.to_string();
        let rhs = rhs.to_string();
        let passed = lhs == rhs;
        Self {
            law,
            expression,
            lhs,
            rhs,
            passed,
        }
    }

    pub fn verdict(&self) -> &'static str {
        if self.passed { "PASS" } else { "FAIL" }
    }
}

/// A group of checks exported together.
#[derive(Clone, Debug, Serialize)]
pub struct LawTable {
    pub name: &'static str,
    pub purpose: &'static str,
    pub checks: Vec<LawCheck>,
}

impl LawTable {
    pub fn failures(&self) -> impl Iterator<Item = &LawCheck> {
        self.checks.iter().filter(|c| !c.passed)
    }

    pub fn all_passed(&self) -> bool {
        self.checks.iter().all(|c| c.passed)
    }
}

/// Stable truth of a state known to be in {S, Zstar}.
fn truth(state: State) -> bool {
    state == State::S
}

/// phi_T homomorphism of NOT_s / AND_s / OR_s over {S, Zstar}.
pub fn preservation_table() -> LawTable {
    let mut checks = Vec::new();

    for a in State::STABLE {
        checks.push(LawCheck::new(
            Law::NotPreservation,
            format!("phi_T(NOT_s({a})) vs NOT(phi_T({a}))"),
            phi_t(not_s(a)),
            Collapse::from_bool(!truth(a)),
        ));
    }
    for a in State::STABLE {
        for b in State::STABLE {
            checks.push(LawCheck::new(
                Law::AndPreservation,
                format!("phi_T(AND_s({a},{b})) vs AND(phi_T({a}),phi_T({b}))"),
                phi_t(and_s(a, b)),
                Collapse::from_bool(truth(a) && truth(b)),
            ));
        }
    }
    for a in State::STABLE {
        for b in State::STABLE {
            checks.push(LawCheck::new(
                Law::OrPreservation,
                format!("phi_T(OR_s({a},{b})) vs OR(phi_T({a}),phi_T({b}))"),
                phi_t(or_s(a, b)),
                Collapse::from_bool(truth(a) || truth(b)),
            ));
        }
    }

    LawTable {
        name: "operator_preservation",
        purpose: "stable endpoint homomorphism check over {S, Zstar}",
        checks,
    }
}

/// Dominance, no-accidental-collapse, and mixed stable+transitional checks.
pub fn propagation_table() -> LawTable {
    let mut checks = Vec::new();

    for x in State::ALL {
        let out = or_s(State::S, x);
        checks.push(LawCheck::new(
            Law::DominanceOr,
            format!("OR_s(S,{x})={out}"),
            phi_t(out),
            Collapse::True,
        ));
        let out = and_s(State::Zstar, x);
        checks.push(LawCheck::new(
            Law::DominanceAnd,
            format!("AND_s(Zstar,{x})={out}"),
            phi_t(out),
            Collapse::False,
        ));
    }

    for a in State::TRANSITIONAL {
        for b in State::TRANSITIONAL {
            let out = and_s(a, b);
            checks.push(LawCheck::new(
                Law::NoCollapseAnd,
                format!("AND_s({a},{b})={out}"),
                phi_t(out),
                Collapse::Undefined,
            ));
            let out = or_s(a, b);
            checks.push(LawCheck::new(
                Law::NoCollapseOr,
                format!("OR_s({a},{b})={out}"),
                phi_t(out),
                Collapse::Undefined,
            ));
        }
    }

    for x in State::TRANSITIONAL {
        let out = and_s(State::S, x);
        checks.push(LawCheck::new(
            Law::MixedAnd,
            format!("AND_s(S,{x})={out}"),
            phi_t(out),
            Collapse::Undefined,
        ));
        let out = or_s(State::Zstar, x);
        checks.push(LawCheck::new(
            Law::MixedOr,
            format!("OR_s(Zstar,{x})={out}"),
            phi_t(out),
            Collapse::Undefined,
        ));
    }

    LawTable {
        name: "transition_propagation",
        purpose: "dominance + no-accidental-collapse checks",
        checks,
    }
}

/// NOT_s involution over T5 and De Morgan over stable endpoints via phi_T.
pub fn involution_table() -> LawTable {
    let mut checks = Vec::new();

    for a in State::ALL {
        checks.push(LawCheck::new(
            Law::Involution,
            format!("NOT_s(NOT_s({a}))"),
            not_s(not_s(a)),
            a,
        ));
    }

    for a in State::STABLE {
        for b in State::STABLE {
            checks.push(LawCheck::new(
                Law::DeMorganAnd,
                format!("NOT(phi_T(AND_s({a},{b}))) vs phi_T(OR_s(NOT_s({a}),NOT_s({b})))"),
                Collapse::from_bool(!truth(and_s(a, b))),
                phi_t(or_s(not_s(a), not_s(b))),
            ));
            checks.push(LawCheck::new(
                Law::DeMorganOr,
                format!("NOT(phi_T(OR_s({a},{b}))) vs phi_T(AND_s(NOT_s({a}),NOT_s({b})))"),
                Collapse::from_bool(!truth(or_s(a, b))),
                phi_t(and_s(not_s(a), not_s(b))),
            ));
        }
    }

    LawTable {
        name: "demorgan_involution",
        purpose: "NOT_s involution on T5 + De Morgan on stable endpoints via phi_T",
        checks,
    }
}

/// All tables, in export order.
pub fn all_tables() -> Vec<LawTable> {
    vec![preservation_table(), propagation_table(), involution_table()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_table_passes() {
        for table in all_tables() {
            let failed: Vec<_> = table.failures().map(|c| c.expression.clone()).collect();
            assert!(failed.is_empty(), "{}: {failed:?}", table.name);
        }
    }

    #[test]
    fn test_table_sizes() {
        assert_eq!(preservation_table().checks.len(), 2 + 4 + 4);
        assert_eq!(propagation_table().checks.len(), 10 + 18 + 6);
        assert_eq!(involution_table().checks.len(), 5 + 8);
    }

    #[test]
    fn test_failing_check_reports_fail() {
        let check = LawCheck::new(Law::Involution, "x".into(), State::S, State::Zstar);
        assert!(!check.passed);
        assert_eq!(check.verdict(), "FAIL");
    }

    #[test]
    fn test_tables_are_deterministic() {
        let a = serde_json::to_string(&all_tables()).unwrap();
        let b = serde_json::to_string(&all_tables()).unwrap();
        assert_eq!(a, b);
    }
}
