//! Per-predicate behavior table
//!
//! Every predicate provides the same five operations, so callers dispatch
//! through [`ops`] instead of matching on the predicate themselves.

use super::{check, constructions, why};
use crate::algebra::{Expr, TableKind};
use crate::error::DdarResult;
use crate::ir::{CoordinateStore, DepId, GeoState, Point2D, Predicate, Statement};
use num_rational::Rational64;

/// Truth of a statement on coordinates
pub type NumericFn = fn(&[Point2D], Option<Rational64>) -> bool;
/// Truth from registry structure alone
pub type CheckFn = fn(&GeoState, &Statement) -> bool;
/// Linear equations equivalent to the statement
pub type AlgebraicFn = fn(&GeoState, &Statement) -> Vec<(TableKind, Expr)>;
/// Premises of a structurally true statement
pub type WhyFn = fn(&GeoState, &Statement) -> DdarResult<Vec<Statement>>;
/// Registry and table updates after a statement is proved
pub type AddFn = fn(&mut GeoState, &Statement, DepId) -> DdarResult<()>;

#[derive(Clone, Copy)]
pub struct PredicateOps {
    pub numeric: NumericFn,
    pub check: CheckFn,
    pub algebraic: AlgebraicFn,
    pub why: WhyFn,
    pub add: AddFn,
}

fn never(_: &GeoState, _: &Statement) -> bool {
    false
}

fn no_equations(_: &GeoState, _: &Statement) -> Vec<(TableKind, Expr)> {
    Vec::new()
}

fn no_premises(_: &GeoState, _: &Statement) -> DdarResult<Vec<Statement>> {
    Ok(Vec::new())
}

fn no_effect(_: &mut GeoState, _: &Statement, _: DepId) -> DdarResult<()> {
    Ok(())
}

const fn numeric_only(numeric: NumericFn) -> PredicateOps {
    PredicateOps {
        numeric,
        check: never,
        algebraic: no_equations,
        why: no_premises,
        add: no_effect,
    }
}

pub fn ops(predicate: Predicate) -> PredicateOps {
    match predicate {
        Predicate::Coll => PredicateOps {
            numeric: check::numeric_coll,
            check: check::check_coll,
            algebraic: no_equations,
            why: why::why_coll,
            add: constructions::add_coll,
        },
        Predicate::Para => PredicateOps {
            numeric: check::numeric_para,
            check: check::check_para,
            algebraic: check::algebraic_para,
            why: why::why_para,
            add: constructions::add_para,
        },
        Predicate::Perp => PredicateOps {
            numeric: check::numeric_perp,
            check: check::check_perp,
            algebraic: check::algebraic_perp,
            why: why::why_aconst,
            add: constructions::add_perp,
        },
        Predicate::Cong => PredicateOps {
            numeric: check::numeric_cong,
            check: check::check_cong,
            algebraic: check::algebraic_cong,
            why: why::why_cong,
            add: constructions::add_cong,
        },
        Predicate::Cyclic => PredicateOps {
            numeric: check::numeric_cyclic,
            check: check::check_cyclic,
            algebraic: no_equations,
            why: why::why_cyclic,
            add: constructions::add_cyclic,
        },
        Predicate::Circle => PredicateOps {
            numeric: check::numeric_circle,
            check: check::check_circle,
            algebraic: no_equations,
            why: why::why_composite,
            add: constructions::add_circle,
        },
        Predicate::Midp => PredicateOps {
            numeric: check::numeric_midp,
            check: check::check_midp,
            algebraic: no_equations,
            why: why::why_composite,
            add: constructions::add_midp,
        },
        Predicate::EqAngle => PredicateOps {
            numeric: check::numeric_eqangle,
            check: check::check_eqangle,
            algebraic: check::algebraic_eqangle,
            why: why::why_eqangle,
            add: constructions::add_eqangle,
        },
        Predicate::EqRatio => PredicateOps {
            numeric: check::numeric_eqratio,
            check: check::check_eqratio,
            algebraic: check::algebraic_eqratio,
            why: why::why_eqratio,
            add: constructions::add_eqratio,
        },
        Predicate::AConst => PredicateOps {
            numeric: check::numeric_aconst,
            check: check::check_aconst,
            algebraic: check::algebraic_aconst,
            why: why::why_aconst,
            add: constructions::add_aconst,
        },
        Predicate::RConst => PredicateOps {
            numeric: check::numeric_rconst,
            check: check::check_rconst,
            algebraic: check::algebraic_rconst,
            why: why::why_rconst,
            add: constructions::add_rconst,
        },
        Predicate::SimTri => PredicateOps {
            numeric: check::numeric_simtri,
            check: check::check_simtri,
            algebraic: no_equations,
            why: why::why_composite,
            add: constructions::add_simtri,
        },
        Predicate::ConTri => PredicateOps {
            numeric: check::numeric_contri,
            check: check::check_contri,
            algebraic: no_equations,
            why: why::why_composite,
            add: constructions::add_contri,
        },
        Predicate::Diff => numeric_only(check::numeric_diff),
        Predicate::NColl => numeric_only(check::numeric_ncoll),
        Predicate::NPara => numeric_only(check::numeric_npara),
        Predicate::SameSide => numeric_only(check::numeric_sameside),
    }
}

/// Truth of a statement in the numeric model, `None` without coordinates
pub fn numeric(coords: &CoordinateStore, statement: &Statement) -> Option<bool> {
    let points = coords.all(&statement.args)?;
    Some((ops(statement.predicate).numeric)(&points, statement.value))
}

/// Numeric truth against an explicit point list
pub fn numeric_at(predicate: Predicate, points: &[Point2D], value: Option<Rational64>) -> bool {
    points.len() == predicate.arity() && (ops(predicate).numeric)(points, value)
}
