//! Certificate extraction as a linear program
//!
//! Each registered equation `E_i = 0` gets two non-negative weights
//! `p_i, n_i`; the program asks for `Σ (p_i - n_i)·E_i` to equal the target
//! expression coefficient by coefficient while minimising `Σ (p_i + n_i)`.
//! For the angle table the constant row also gets a free column absorbing
//! whole multiples of the half-turn modulus.

use super::table::Equation;
use super::{AlgebraError, Expr, TableKind, Var};
use crate::ir::{rational_to_f64, DepId};
use minilp::{ComparisonOp, LinearExpr, OptimizationDirection, Problem};
use rustc_hash::FxHashMap;
use std::collections::BTreeSet;
use tracing::debug;

/// Weight below which an equation is not part of the certificate
const SUPPORT_EPSILON: f64 = 1e-6;

/// Dependencies of the equations used with nonzero weight
pub fn minimal_support(
    kind: TableKind,
    equations: &[Equation],
    target: &Expr,
) -> Result<Vec<DepId>, AlgebraError> {
    if target.is_zero() {
        return Ok(Vec::new());
    }

    let mut vars: BTreeSet<Var> = target.terms().map(|(v, _)| *v).collect();
    for eq in equations {
        vars.extend(eq.expr.terms().map(|(v, _)| *v));
    }

    let mut problem = Problem::new(OptimizationDirection::Minimize);
    let weights: Vec<_> = equations
        .iter()
        .map(|_| {
            (
                problem.add_var(1.0, (0.0, f64::INFINITY)),
                problem.add_var(1.0, (0.0, f64::INFINITY)),
            )
        })
        .collect();

    let mut rows: FxHashMap<Var, LinearExpr> = FxHashMap::default();
    let mut konst_row = LinearExpr::empty();
    let mut konst_used = false;
    for (eq, (plus, minus)) in equations.iter().zip(&weights) {
        for (v, c) in eq.expr.terms() {
            let row = rows.entry(*v).or_insert_with(LinearExpr::empty);
            row.add(*plus, rational_to_f64(*c));
            row.add(*minus, -rational_to_f64(*c));
        }
        let k = rational_to_f64(eq.expr.konst());
        if k != 0.0 {
            konst_row.add(*plus, k);
            konst_row.add(*minus, -k);
            konst_used = true;
        }
    }

    for v in &vars {
        let rhs = rational_to_f64(target.coefficient(v));
        match rows.remove(v) {
            Some(row) => problem.add_constraint(row, ComparisonOp::Eq, rhs),
            None if rhs != 0.0 => {
                return Err(AlgebraError::NoCertificate {
                    table: kind,
                    detail: format!("{v:?} appears in no registered equation"),
                })
            }
            None => {}
        }
    }

    let konst_rhs = rational_to_f64(target.konst());
    if kind == TableKind::Angle {
        let wrap = problem.add_var(0.0, (f64::NEG_INFINITY, f64::INFINITY));
        konst_row.add(wrap, 1.0);
        problem.add_constraint(konst_row, ComparisonOp::Eq, konst_rhs);
    } else if konst_used || konst_rhs != 0.0 {
        problem.add_constraint(konst_row, ComparisonOp::Eq, konst_rhs);
    }

    let solution = problem.solve().map_err(|err| AlgebraError::NoCertificate {
        table: kind,
        detail: err.to_string(),
    })?;

    let mut deps = Vec::new();
    for (eq, (plus, minus)) in equations.iter().zip(&weights) {
        if solution[*plus] + solution[*minus] > SUPPORT_EPSILON {
            if let Some(dep) = eq.dep {
                if !deps.contains(&dep) {
                    deps.push(dep);
                }
            }
        }
    }
    debug!(table = %kind, support = deps.len(), objective = solution.objective(), "certificate");
    Ok(deps)
}

#[cfg(test)]
mod tests {
    use super::super::Table;
    use super::*;
    use crate::ir::EntityId;
    use num_rational::Rational64;

    fn e(i: u32) -> EntityId {
        EntityId(i)
    }

    #[test]
    fn test_certificate_skips_unrelated_equations() {
        let mut t = Table::new(TableKind::Ratio);
        t.add_equation(&Expr::difference(e(1), e(2)), Some(DepId(10))).unwrap();
        t.add_equation(&Expr::difference(e(5), e(6)), Some(DepId(11))).unwrap();
        t.add_equation(&Expr::difference(e(2), e(3)), Some(DepId(12))).unwrap();

        let mut cert = t.certificate(&Expr::difference(e(3), e(1))).unwrap();
        cert.sort();
        assert_eq!(cert, vec![DepId(10), DepId(12)]);
    }

    #[test]
    fn test_certificate_reconstructs_target() {
        let mut t = Table::new(TableKind::Distance);
        // l1 = l2 + l3, l3 = l4
        let eq1 = Expr::entity(e(1))
            .with(Var::Entity(e(2)), Rational64::from_integer(-1))
            .with(Var::Entity(e(3)), Rational64::from_integer(-1));
        t.add_equation(&eq1, Some(DepId(0))).unwrap();
        t.add_equation(&Expr::difference(e(3), e(4)), Some(DepId(1))).unwrap();

        let target = Expr::entity(e(1))
            .with(Var::Entity(e(2)), Rational64::from_integer(-1))
            .with(Var::Entity(e(4)), Rational64::from_integer(-1));
        let cert = t.certificate(&target).unwrap();

        let used: Vec<&Equation> = t
            .equations()
            .iter()
            .filter(|eq| eq.dep.is_some_and(|d| cert.contains(&d)))
            .collect();
        let sum = used.iter().fold(Expr::new(), |acc, eq| acc.plus(&eq.expr, Rational64::from_integer(1)));
        assert_eq!(sum, target);
    }

    #[test]
    fn test_trivial_target_needs_nothing() {
        let t = Table::new(TableKind::Angle);
        assert_eq!(t.certificate(&Expr::new()).unwrap(), vec![]);
    }

    #[test]
    fn test_not_entailed_has_no_certificate() {
        let mut t = Table::new(TableKind::Angle);
        t.add_equation(&Expr::difference(e(1), e(2)), Some(DepId(0))).unwrap();

        assert!(matches!(
            t.certificate(&Expr::difference(e(1), e(3))),
            Err(AlgebraError::NoCertificate { .. })
        ));
    }
}
