//! Justifying true statements
//!
//! A statement that holds in the registry or in an algebraic table is
//! turned into a dependency: the premises are read back from merge edges,
//! container creation and linear certificates.

use super::check::{self, QuantityMatch};
use super::dispatch;
use crate::algebra::TableKind;
use crate::error::{DdarError, DdarResult};
use crate::ir::{DepId, EntityId, EntityKind, GeoState, Predicate, Reason, Statement};
use num_rational::Rational64;
use num_traits::{One, Zero};

/// Reason and premises for a statement that holds but has no dependency
#[derive(Debug, Clone, PartialEq)]
pub struct Justification {
    pub reason: Reason,
    pub premises: Vec<Statement>,
}

fn not_true(state: &GeoState, s: &Statement) -> DdarError {
    DdarError::NotTrue(state.render(s))
}

/// Conclusions of the given dependencies, in order, without repeats
fn conclusions(state: &GeoState, deps: &[DepId]) -> Vec<Statement> {
    let mut out: Vec<Statement> = Vec::new();
    for id in deps {
        let conclusion = &state.proofs.dependency(*id).conclusion;
        if !out.contains(conclusion) {
            out.push(conclusion.clone());
        }
    }
    out
}

/// Dependencies equating `e` with whichever anchor shares its class
fn link(state: &GeoState, anchors: &[EntityId], e: EntityId) -> DdarResult<Vec<DepId>> {
    let anchor = anchors
        .iter()
        .find(|a| state.registry.same(**a, e))
        .ok_or_else(|| DdarError::NotTrue(format!("{} unanchored", state.registry.name(e))))?;
    Ok(state.registry.why_equal(e, *anchor)?)
}

fn quantity_deps(
    state: &GeoState,
    anchors: &[EntityId],
    found: QuantityMatch,
) -> DdarResult<Vec<DepId>> {
    let reg = &state.registry;
    let mut deps = Vec::new();
    match found {
        QuantityMatch::Components => {
            deps.extend(reg.why_equal(anchors[0], anchors[2])?);
            deps.extend(reg.why_equal(anchors[1], anchors[3])?);
        }
        QuantityMatch::Degenerate => {
            deps.extend(reg.why_equal(anchors[0], anchors[1])?);
            deps.extend(reg.why_equal(anchors[2], anchors[3])?);
        }
        QuantityMatch::Records(r1, r2) => {
            for e in [r1.first, r1.second, r2.first, r2.second] {
                deps.extend(link(state, anchors, e)?);
            }
            deps.extend(reg.why_equal(state.value(r1.entity)?, state.value(r2.entity)?)?);
        }
        QuantityMatch::Constant(r, target) => {
            deps.extend(link(state, anchors, r.first)?);
            deps.extend(link(state, anchors, r.second)?);
            deps.extend(reg.why_equal(state.value(r.entity)?, target)?);
        }
    }
    Ok(deps)
}

/// Anchored directions for every line pair of the arguments
fn line_anchors(state: &GeoState, args: &[EntityId]) -> DdarResult<(Vec<EntityId>, Vec<DepId>)> {
    let mut anchors = Vec::new();
    let mut deps = Vec::new();
    for pair in args.chunks(2) {
        let (direction, support) = state.line_anchor(pair[0], pair[1])?;
        anchors.push(direction);
        deps.extend(support);
    }
    Ok((anchors, deps))
}

pub fn why_coll(state: &GeoState, s: &Statement) -> DdarResult<Vec<Statement>> {
    if s.args.iter().enumerate().any(|(i, a)| s.args[i + 1..].contains(a)) {
        return Ok(Vec::new());
    }
    let line = state
        .registry
        .container_of(EntityKind::Line, &s.args)
        .ok_or_else(|| not_true(state, s))?;
    let (_, deps) = state.why_on(line, &s.args)?;
    Ok(conclusions(state, &deps))
}

pub fn why_cyclic(state: &GeoState, s: &Statement) -> DdarResult<Vec<Statement>> {
    if s.args.iter().enumerate().any(|(i, a)| s.args[i + 1..].contains(a)) {
        return Ok(Vec::new());
    }
    let circle = state
        .registry
        .container_of(EntityKind::Circle, &s.args)
        .ok_or_else(|| not_true(state, s))?;
    let (_, deps) = state.why_on(circle, &s.args)?;
    Ok(conclusions(state, &deps))
}

pub fn why_para(state: &GeoState, s: &Statement) -> DdarResult<Vec<Statement>> {
    let (anchors, mut deps) = line_anchors(state, &s.args)?;
    deps.extend(state.registry.why_equal(anchors[0], anchors[1])?);
    Ok(conclusions(state, &deps))
}

pub fn why_cong(state: &GeoState, s: &Statement) -> DdarResult<Vec<Statement>> {
    let a = &s.args;
    if a[..2] == a[2..] {
        return Ok(Vec::new());
    }
    let (Some(x), Some(y)) = (state.length_of(a[0], a[1]), state.length_of(a[2], a[3])) else {
        return Err(not_true(state, s));
    };
    let deps = state.registry.why_equal(x, y)?;
    Ok(conclusions(state, &deps))
}

/// Premises of perp, aconst and eqangle
pub fn why_aconst(state: &GeoState, s: &Statement) -> DdarResult<Vec<Statement>> {
    if s.predicate == Predicate::AConst && s.value.is_some_and(|r| r.is_zero()) {
        return why_para(state, s);
    }
    let found = check::angle_match(state, s).ok_or_else(|| not_true(state, s))?;
    let (anchors, mut deps) = line_anchors(state, &s.args)?;
    deps.extend(quantity_deps(state, &anchors, found)?);
    Ok(conclusions(state, &deps))
}

pub fn why_eqangle(state: &GeoState, s: &Statement) -> DdarResult<Vec<Statement>> {
    why_aconst(state, s)
}

fn lengths(state: &GeoState, s: &Statement) -> DdarResult<Vec<EntityId>> {
    s.args
        .chunks(2)
        .map(|c| state.length_of(c[0], c[1]).ok_or_else(|| not_true(state, s)))
        .collect()
}

/// Premises of eqratio and rconst
pub fn why_eqratio(state: &GeoState, s: &Statement) -> DdarResult<Vec<Statement>> {
    if s.predicate == Predicate::RConst && s.value == Some(Rational64::one()) {
        return why_cong(state, s);
    }
    let found = check::ratio_match(state, s).ok_or_else(|| not_true(state, s))?;
    let anchors = lengths(state, s)?;
    let deps = quantity_deps(state, &anchors, found)?;
    Ok(conclusions(state, &deps))
}

pub fn why_rconst(state: &GeoState, s: &Statement) -> DdarResult<Vec<Statement>> {
    why_eqratio(state, s)
}

/// Circle, midpoint and triangle facts rest on their parts
pub fn why_composite(_: &GeoState, s: &Statement) -> DdarResult<Vec<Statement>> {
    Ok(check::components(s))
}

fn chase(kind: TableKind) -> Reason {
    match kind {
        TableKind::Angle => Reason::AngleChase,
        TableKind::Ratio => Reason::RatioChase,
        TableKind::Distance => Reason::DistanceChase,
    }
}

/// Reason and premises for a statement that currently holds
///
/// Structural truth is preferred; otherwise the first table entailing one
/// of the statement's equations supplies a certificate.
pub fn justify(state: &GeoState, s: &Statement) -> DdarResult<Justification> {
    let ops = dispatch::ops(s.predicate);
    if (ops.check)(state, s) {
        return Ok(Justification {
            reason: Reason::Intrinsic,
            premises: (ops.why)(state, s)?,
        });
    }

    for (kind, expr) in (ops.algebraic)(state, s) {
        let table = state.algebra.table(kind);
        if !table.entailed(&expr) {
            continue;
        }
        let mut deps = table.certificate(&expr)?;
        if kind == TableKind::Angle {
            for pair in s.args.chunks(2) {
                deps.extend(state.line_support(pair[0], pair[1])?);
            }
        }
        let premises = conclusions(state, &deps)
            .into_iter()
            .filter(|p| p != s)
            .collect();
        return Ok(Justification {
            reason: chase(kind),
            premises,
        });
    }

    Err(not_true(state, s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Point2D;

    fn state_with(points: &[(&str, f64, f64)]) -> GeoState {
        let mut state = GeoState::new();
        for (name, x, y) in points {
            state.declare_point(name, Some(Point2D::new(*x, *y))).unwrap();
        }
        state
    }

    #[test]
    fn test_cong_chain_premises() {
        let mut state = state_with(&[
            ("A", 0.0, 0.0),
            ("B", 1.0, 0.0),
            ("C", 0.0, 1.0),
            ("D", -1.0, 0.0),
        ]);
        let ab_ac = state.statement(Predicate::Cong, &["A", "B", "A", "C"], None).unwrap();
        let ac_ad = state.statement(Predicate::Cong, &["A", "C", "A", "D"], None).unwrap();
        state.assert_premise(ab_ac.clone()).unwrap();
        state.assert_premise(ac_ad.clone()).unwrap();

        let goal = state.statement(Predicate::Cong, &["A", "B", "A", "D"], None).unwrap();
        let j = justify(&state, &goal).unwrap();
        assert_eq!(j.reason, Reason::Intrinsic);
        assert_eq!(j.premises.len(), 2);
        assert!(j.premises.contains(&ab_ac));
        assert!(j.premises.contains(&ac_ad));
    }

    #[test]
    fn test_angle_chase_certificate() {
        // AB ⊥ CD and CD ⊥ EF give AB ∥ EF
        let mut state = state_with(&[
            ("A", 0.0, 0.0),
            ("B", 2.0, 0.0),
            ("C", 1.0, -1.0),
            ("D", 1.0, 3.0),
            ("E", 0.0, 5.0),
            ("F", 4.0, 5.0),
        ]);
        let p1 = state.statement(Predicate::Perp, &["A", "B", "C", "D"], None).unwrap();
        let p2 = state.statement(Predicate::Perp, &["C", "D", "E", "F"], None).unwrap();
        state.assert_premise(p1.clone()).unwrap();
        state.assert_premise(p2.clone()).unwrap();

        let goal = state.statement(Predicate::Para, &["A", "B", "E", "F"], None).unwrap();
        assert!(state.check(&goal));
        let j = justify(&state, &goal).unwrap();
        assert_eq!(j.reason, Reason::AngleChase);
        assert!(j.premises.contains(&p1));
        assert!(j.premises.contains(&p2));
    }

    #[test]
    fn test_false_statement_has_no_justification() {
        let state = state_with(&[("A", 0.0, 0.0), ("B", 1.0, 0.0), ("C", 0.0, 1.0)]);
        let goal = state.statement(Predicate::Cong, &["A", "B", "B", "C"], None).unwrap();
        assert!(matches!(justify(&state, &goal), Err(DdarError::NotTrue(_))));
    }
}
