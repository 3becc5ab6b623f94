//! One incremental linear system in reduced form

use super::lp;
use super::{AlgebraError, Expr, TableKind, Var};
use crate::geometry::normalize::reduce_angle;
use crate::ir::DepId;
use num_rational::Rational64;
use num_traits::{One, Signed, Zero};
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use tracing::trace;

/// Result of registering an equation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// Already implied by the table; nothing changed
    EntailedAlready,
    /// Folded into the basis and kept for certificates
    Registered,
    /// Angle equation with no unit coefficient, held until other rows reduce it
    Deferred,
}

/// A registered raw equation `expr = 0`
#[derive(Debug, Clone)]
pub struct Equation {
    pub expr: Expr,
    pub dep: Option<DepId>,
}

/// Linear system kept in back-substituted form
///
/// `rows` maps each eliminated variable to an expression over variables that
/// are never themselves eliminated, so one substitution pass fully reduces
/// any expression.
#[derive(Debug, Clone)]
pub struct Table {
    kind: TableKind,
    rows: BTreeMap<Var, Expr>,
    /// Introduction order of every variable seen
    order: FxHashMap<Var, usize>,
    equations: Vec<Equation>,
    deferred: Vec<Equation>,
}

impl Table {
    pub fn new(kind: TableKind) -> Self {
        Self {
            kind,
            rows: BTreeMap::new(),
            order: FxHashMap::default(),
            equations: Vec::new(),
            deferred: Vec::new(),
        }
    }

    pub fn kind(&self) -> TableKind {
        self.kind
    }

    pub fn equations(&self) -> &[Equation] {
        &self.equations
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has ever seen this variable
    pub fn knows(&self, v: &Var) -> bool {
        self.order.contains_key(v)
    }

    /// Entity variables in introduction order
    pub fn entity_vars(&self) -> Vec<Var> {
        let mut vars: Vec<(&Var, &usize)> = self.order.iter().filter(|(v, _)| v.is_entity()).collect();
        vars.sort_by_key(|(_, i)| **i);
        vars.into_iter().map(|(v, _)| *v).collect()
    }

    fn normalize(&self, mut e: Expr) -> Expr {
        if self.kind == TableKind::Angle {
            let k = reduce_angle(e.konst());
            e.set_konst(k);
        }
        e
    }

    /// Substitute every eliminated variable
    pub fn reduce(&self, e: &Expr) -> Expr {
        let mut out = Expr::constant(e.konst());
        for (v, c) in e.terms() {
            match self.rows.get(v) {
                Some(row) => out = out.plus(row, *c),
                None => out.add_term(*v, *c),
            }
        }
        self.normalize(out)
    }

    /// Whether `e = 0` follows from the registered equations
    pub fn entailed(&self, e: &Expr) -> bool {
        self.reduce(e).is_zero()
    }

    /// Fold `e = 0` into the basis
    pub fn add_equation(&mut self, e: &Expr, dep: Option<DepId>) -> Result<AddOutcome, AlgebraError> {
        for (v, _) in e.terms() {
            let next = self.order.len();
            self.order.entry(*v).or_insert(next);
        }

        let equation = Equation {
            expr: self.normalize(e.clone()),
            dep,
        };
        let outcome = self.fold(equation)?;
        if outcome == AddOutcome::Registered {
            self.retry_deferred()?;
        }
        Ok(outcome)
    }

    fn fold(&mut self, equation: Equation) -> Result<AddOutcome, AlgebraError> {
        let residual = self.reduce(&equation.expr);
        if !residual.has_entities() {
            if residual.is_zero() {
                return Ok(AddOutcome::EntailedAlready);
            }
            return Err(AlgebraError::Inconsistent {
                table: self.kind,
                residual: residual.to_string(),
            });
        }

        let Some(pivot) = self.choose_pivot(&residual) else {
            trace!(table = %self.kind, "deferred equation without a unit pivot");
            self.deferred.push(equation);
            return Ok(AddOutcome::Deferred);
        };
        self.eliminate(pivot, residual);
        self.equations.push(equation);
        Ok(AddOutcome::Registered)
    }

    fn eliminate(&mut self, pivot: Var, residual: Expr) {
        let c = residual.coefficient(&pivot);
        let mut row = residual;
        row.remove(&pivot);
        let row = self.normalize(row.scaled(-c.recip()));

        let pending: Vec<Var> = self
            .rows
            .iter()
            .filter(|(_, r)| !r.coefficient(&pivot).is_zero())
            .map(|(v, _)| *v)
            .collect();
        for v in pending {
            if let Some(existing) = self.rows.get(&v) {
                let k = existing.coefficient(&pivot);
                let mut updated = existing.clone();
                updated.remove(&pivot);
                let updated = self.normalize(updated.plus(&row, k));
                self.rows.insert(v, updated);
            }
        }

        trace!(table = %self.kind, pivot = ?pivot, "registered equation");
        self.rows.insert(pivot, row);
    }

    /// Re-fold deferred equations until none of them changes the basis
    fn retry_deferred(&mut self) -> Result<(), AlgebraError> {
        loop {
            let mut progressed = false;
            // `fold` pushes still-blocked equations back onto `deferred`
            for equation in std::mem::take(&mut self.deferred) {
                if self.fold(equation)? == AddOutcome::Registered {
                    progressed = true;
                }
            }
            if !progressed {
                return Ok(());
            }
        }
    }

    /// Equations waiting for a unit pivot
    pub fn deferred(&self) -> &[Equation] {
        &self.deferred
    }

    /// Most recently introduced entity, preferring unit coefficients
    ///
    /// The angle table lives modulo one half-turn, where dividing by a
    /// coefficient other than ±1 is unsound, so it only accepts unit pivots.
    fn choose_pivot(&self, residual: &Expr) -> Option<Var> {
        let rank = |v: &Var| self.order.get(v).copied().unwrap_or(0);
        let candidates: Vec<(&Var, &Rational64)> = residual.terms().filter(|(v, _)| v.is_entity()).collect();
        let unit: Vec<&Var> = candidates
            .iter()
            .filter(|(_, c)| c.abs() == Rational64::one())
            .map(|(v, _)| *v)
            .collect();
        let pool: Vec<&Var> = if !unit.is_empty() {
            unit
        } else if self.kind == TableKind::Angle {
            return None;
        } else {
            candidates.iter().map(|(v, _)| *v).collect()
        };
        pool.into_iter().max_by_key(|v| rank(v)).copied()
    }

    /// Dependencies of registered equations that combine to `e = 0`
    pub fn certificate(&self, e: &Expr) -> Result<Vec<DepId>, AlgebraError> {
        if !self.entailed(e) {
            return Err(AlgebraError::NoCertificate {
                table: self.kind,
                detail: format!("{e} is not entailed"),
            });
        }
        lp::minimal_support(self.kind, &self.equations, &self.normalize(e.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::EntityId;

    fn e(i: u32) -> EntityId {
        EntityId(i)
    }

    #[test]
    fn test_entailment_through_chain() {
        let mut t = Table::new(TableKind::Distance);
        assert_eq!(
            t.add_equation(&Expr::difference(e(1), e(2)), Some(DepId(0))).unwrap(),
            AddOutcome::Registered
        );
        t.add_equation(&Expr::difference(e(2), e(3)), Some(DepId(1))).unwrap();

        assert!(t.entailed(&Expr::difference(e(1), e(3))));
        assert!(!t.entailed(&Expr::difference(e(1), e(4))));
        assert_eq!(
            t.add_equation(&Expr::difference(e(3), e(1)), Some(DepId(2))).unwrap(),
            AddOutcome::EntailedAlready
        );
        assert_eq!(t.equations().len(), 2);
    }

    #[test]
    fn test_rows_stay_reduced() {
        let mut t = Table::new(TableKind::Ratio);
        t.add_equation(&Expr::difference(e(1), e(2)), None).unwrap();
        t.add_equation(&Expr::difference(e(2), e(3)), None).unwrap();
        t.add_equation(&Expr::difference(e(3), e(4)), None).unwrap();

        for row in t.rows.values() {
            for v in t.rows.keys() {
                assert!(row.coefficient(v).is_zero(), "eliminated var in a row");
            }
        }
    }

    #[test]
    fn test_angle_constants_wrap() {
        let mut t = Table::new(TableKind::Angle);
        let half = Rational64::new(1, 2);
        // d2 - d1 = 1/2 and d3 - d2 = 1/2 give d3 = d1
        t.add_equation(&Expr::difference(e(2), e(1)).with_constant(-half), Some(DepId(0)))
            .unwrap();
        t.add_equation(&Expr::difference(e(3), e(2)).with_constant(-half), Some(DepId(1)))
            .unwrap();

        assert!(t.entailed(&Expr::difference(e(3), e(1))));
        let mut cert = t.certificate(&Expr::difference(e(3), e(1))).unwrap();
        cert.sort();
        assert_eq!(cert, vec![DepId(0), DepId(1)]);
    }

    #[test]
    fn test_contradiction_is_reported() {
        let mut t = Table::new(TableKind::Angle);
        t.add_equation(&Expr::difference(e(1), e(2)), None).unwrap();
        let err = t
            .add_equation(&Expr::difference(e(1), e(2)).with_constant(Rational64::new(1, 3)), None)
            .unwrap_err();
        assert!(matches!(err, AlgebraError::Inconsistent { table: TableKind::Angle, .. }));
    }

    #[test]
    fn test_doubled_angle_is_not_parallelism() {
        let mut t = Table::new(TableKind::Angle);
        let two = Rational64::from_integer(2);
        // 2(d2 - d1) = 0 only says the lines are parallel or perpendicular
        let doubled = Expr::difference(e(2), e(1)).scaled(two);
        assert_eq!(t.add_equation(&doubled, Some(DepId(0))).unwrap(), AddOutcome::Deferred);
        assert!(!t.entailed(&Expr::difference(e(2), e(1))));
        assert_eq!(t.num_rows(), 0);
        assert_eq!(t.deferred().len(), 1);

        // perpendicularity is consistent with it and absorbs it
        let perp = Expr::difference(e(2), e(1)).with_constant(-Rational64::new(1, 2));
        assert_eq!(t.add_equation(&perp, Some(DepId(1))).unwrap(), AddOutcome::Registered);
        assert!(t.deferred().is_empty());
        assert!(t.entailed(&perp));
        assert_eq!(t.certificate(&perp).unwrap(), vec![DepId(1)]);
    }

    #[test]
    fn test_deferred_angle_equation_registers_once_reducible() {
        let mut t = Table::new(TableKind::Angle);
        let one = Rational64::one();
        t.add_equation(&Expr::difference(e(5), e(6)), Some(DepId(0))).unwrap();

        // 2·d1 + 3·d2 = 0 has no unit coefficient yet
        let mixed = Expr::new()
            .with(Var::Entity(e(1)), Rational64::from_integer(2))
            .with(Var::Entity(e(2)), Rational64::from_integer(3));
        assert_eq!(t.add_equation(&mixed, Some(DepId(1))).unwrap(), AddOutcome::Deferred);

        // d2 = d5 - d1 turns it into 3·d5 - d1 = 0
        let link = Expr::entity(e(1)).with(Var::Entity(e(2)), one).with(Var::Entity(e(5)), -one);
        assert_eq!(t.add_equation(&link, Some(DepId(2))).unwrap(), AddOutcome::Registered);
        assert!(t.deferred().is_empty());
        assert_eq!(t.equations().len(), 3);
        assert!(t.entailed(&mixed));
    }

    #[test]
    fn test_doubled_ratio_still_pivots() {
        let mut t = Table::new(TableKind::Ratio);
        let doubled = Expr::difference(e(2), e(1)).scaled(Rational64::from_integer(2));
        assert_eq!(t.add_equation(&doubled, None).unwrap(), AddOutcome::Registered);
        assert!(t.entailed(&Expr::difference(e(2), e(1))));
    }

    #[test]
    fn test_prime_atoms_are_never_pivots() {
        let mut t = Table::new(TableKind::Ratio);
        let eq = Expr::difference(e(1), e(2)).with(Var::Prime(2), -Rational64::one());
        t.add_equation(&eq, None).unwrap();

        assert!(t.rows.keys().all(Var::is_entity));
        let twice = Expr::difference(e(1), e(2));
        assert!(!t.entailed(&twice));
        assert!(t.entailed(&twice.with(Var::Prime(2), -Rational64::one())));
    }
}
