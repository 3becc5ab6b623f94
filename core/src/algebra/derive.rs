//! Reading new facts out of the tables
//!
//! For every pair of quantity classes the difference is reduced against the
//! table. A zero or constant difference is a cheap derivation (congruence,
//! parallelism, fixed angle or ratio). Equal non-constant differences pair up
//! into angle or ratio equalities.

use super::{exp_of, Expr, Table, TableKind, Var};
use crate::geometry::dispatch;
use crate::geometry::normalize::reduce_angle;
use crate::ir::{EntityId, GeoState, Predicate, Statement};
use num_rational::Rational64;
use num_traits::{One, Zero};
use rustc_hash::FxHashSet;
use std::collections::BTreeMap;
use tracing::debug;

/// A statement entailed by one table
#[derive(Debug, Clone, PartialEq)]
pub struct Derivation {
    pub statement: Statement,
    pub table: TableKind,
    pub level: u32,
}

/// New facts found in the tables, cheap ones first
#[derive(Debug, Clone, Default)]
pub struct Derivations {
    pub cheap: Vec<Derivation>,
    pub pairs: Vec<Derivation>,
}

impl Derivations {
    pub fn len(&self) -> usize {
        self.cheap.len() + self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cheap.is_empty() && self.pairs.is_empty()
    }
}

/// One variable per registry class, with two points realizing it
fn representatives(state: &GeoState, table: &Table) -> Vec<(EntityId, (EntityId, EntityId))> {
    let mut seen = FxHashSet::default();
    let mut out = Vec::new();
    for var in table.entity_vars() {
        let Var::Entity(e) = var else {
            continue;
        };
        let Some(witness) = state.witness(e) else {
            continue;
        };
        if witness.0 == witness.1 {
            continue;
        }
        if seen.insert(state.registry.representative(e)) {
            out.push((e, witness));
        }
    }
    out
}

fn normalized_key(kind: TableKind, diff: &Expr) -> (Expr, Rational64) {
    let (mut key, sign) = diff.sign_normalized();
    if kind == TableKind::Angle {
        let k = reduce_angle(key.konst());
        key.set_konst(k);
    }
    (key, sign)
}

struct Collector<'a> {
    state: &'a GeoState,
    level: u32,
    seen: FxHashSet<Statement>,
}

impl Collector<'_> {
    /// Keep a statement that is new, numerically plausible and not yet
    /// visible in the registry
    fn accept(&mut self, out: &mut Vec<Derivation>, table: TableKind, predicate: Predicate, args: &[EntityId], value: Option<Rational64>) {
        let Ok(statement) = Statement::new(predicate, args.to_vec(), value) else {
            return;
        };
        if self.state.proofs.has(&statement)
            || self.state.check_numeric(&statement) == Some(false)
            || (dispatch::ops(predicate).check)(self.state, &statement)
        {
            return;
        }
        if self.seen.insert(statement.clone()) {
            out.push(Derivation {
                statement,
                table,
                level: self.level,
            });
        }
    }
}

fn derive_from(
    collector: &mut Collector<'_>,
    kind: TableKind,
    max_pairs: usize,
    result: &mut Derivations,
) {
    let state = collector.state;
    let table = state.algebra.table(kind);
    let reps = representatives(state, table);
    let mut groups: BTreeMap<Expr, Vec<(usize, usize, Rational64)>> = BTreeMap::new();

    for i in 0..reps.len() {
        for j in i + 1..reps.len() {
            let (ei, (a, b)) = reps[i];
            let (ej, (c, d)) = reps[j];
            let diff = table.reduce(&Expr::difference(ei, ej));

            if diff.is_zero() {
                let predicate = match kind {
                    TableKind::Angle => Predicate::Para,
                    TableKind::Ratio | TableKind::Distance => Predicate::Cong,
                };
                collector.accept(&mut result.cheap, kind, predicate, &[a, b, c, d], None);
                continue;
            }

            if !diff.has_entities() {
                match kind {
                    TableKind::Angle if diff.terms().next().is_none() => {
                        // d_i - d_j = c is the angle from line j to line i
                        let c_value = reduce_angle(diff.konst());
                        if c_value == Rational64::new(1, 2) {
                            collector.accept(&mut result.cheap, kind, Predicate::Perp, &[c, d, a, b], None);
                        } else {
                            collector.accept(&mut result.cheap, kind, Predicate::AConst, &[c, d, a, b], Some(c_value));
                        }
                    }
                    TableKind::Ratio => {
                        if let Some(r) = exp_of(&diff) {
                            if r != Rational64::one() && !r.is_zero() {
                                collector.accept(&mut result.cheap, kind, Predicate::RConst, &[a, b, c, d], Some(r));
                            }
                        }
                    }
                    _ => {}
                }
                continue;
            }

            if kind != TableKind::Distance {
                let (key, sign) = normalized_key(kind, &diff);
                groups.entry(key).or_default().push((i, j, sign));
            }
        }
    }

    let predicate = match kind {
        TableKind::Angle => Predicate::EqAngle,
        TableKind::Ratio => Predicate::EqRatio,
        TableKind::Distance => return,
    };
    for members in groups.values() {
        for (x, (i, j, s1)) in members.iter().enumerate() {
            for (k, l, s2) in &members[x + 1..] {
                if result.pairs.len() >= max_pairs {
                    return;
                }
                let (wi, wj, wk, wl) = (reps[*i].1, reps[*j].1, reps[*k].1, reps[*l].1);
                // q_i - q_j = ±(q_k - q_l)
                let (wk, wl) = if s1 == s2 { (wk, wl) } else { (wl, wk) };
                let args = match kind {
                    TableKind::Angle => [wj.0, wj.1, wi.0, wi.1, wl.0, wl.1, wk.0, wk.1],
                    _ => [wi.0, wi.1, wj.0, wj.1, wk.0, wk.1, wl.0, wl.1],
                };
                collector.accept(&mut result.pairs, kind, predicate, &args, None);
            }
        }
    }
}

/// Every fact the tables entail that is not yet recorded
///
/// Pair derivations stop after `max_pairs` statements.
pub fn derive_new_facts(state: &GeoState, level: u32, max_pairs: usize) -> Derivations {
    let mut collector = Collector {
        state,
        level,
        seen: FxHashSet::default(),
    };
    let mut result = Derivations::default();
    for kind in [TableKind::Distance, TableKind::Ratio, TableKind::Angle] {
        derive_from(&mut collector, kind, max_pairs, &mut result);
    }
    debug!(cheap = result.cheap.len(), pairs = result.pairs.len(), level, "table derivations");
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Point2D;

    fn square() -> GeoState {
        let mut state = GeoState::new();
        for (name, x, y) in [("A", 0.0, 0.0), ("B", 2.0, 0.0), ("C", 2.0, 2.0), ("D", 0.0, 2.0)] {
            state.declare_point(name, Some(Point2D::new(x, y))).unwrap();
        }
        state
    }

    #[test]
    fn test_parallel_from_two_perpendiculars() {
        let mut state = square();
        let p1 = state.statement(Predicate::Perp, &["A", "B", "B", "C"], None).unwrap();
        let p2 = state.statement(Predicate::Perp, &["B", "C", "C", "D"], None).unwrap();
        state.assert_premise(p1).unwrap();
        state.assert_premise(p2).unwrap();

        let derived = derive_new_facts(&state, 1, 100);
        let para = state.statement(Predicate::Para, &["A", "B", "C", "D"], None).unwrap();
        assert!(derived.cheap.iter().any(|d| d.statement == para && d.table == TableKind::Angle));
    }

    #[test]
    fn test_congruence_chain_is_not_rederived() {
        let mut state = square();
        let c1 = state.statement(Predicate::Cong, &["A", "B", "B", "C"], None).unwrap();
        let c2 = state.statement(Predicate::Cong, &["B", "C", "C", "D"], None).unwrap();
        state.assert_premise(c1).unwrap();
        state.assert_premise(c2).unwrap();

        // the registry already merged all three lengths
        let derived = derive_new_facts(&state, 1, 100);
        assert!(derived
            .cheap
            .iter()
            .all(|d| d.statement.predicate != Predicate::Cong));
    }

    #[test]
    fn test_ratio_constant_from_midpoint() {
        let mut state = square();
        state.declare_point("M", Some(Point2D::new(1.0, 0.0))).unwrap();
        let midp = state.statement(Predicate::Midp, &["M", "A", "B"], None).unwrap();
        let cong = state.statement(Predicate::Cong, &["A", "B", "A", "D"], None).unwrap();
        state.assert_premise(midp).unwrap();
        state.assert_premise(cong).unwrap();

        let derived = derive_new_facts(&state, 1, 100);
        assert!(derived.cheap.iter().any(|d| {
            d.statement.predicate == Predicate::RConst && d.table == TableKind::Ratio
        }));
    }

    /// Triangle ABC and its image DEF under a scaling by two
    fn similar_triangles() -> GeoState {
        let mut state = GeoState::new();
        for (name, x, y) in [
            ("A", 0.0, 0.0),
            ("B", 4.0, 0.0),
            ("C", 1.0, 3.0),
            ("D", 10.0, 0.0),
            ("E", 18.0, 0.0),
            ("F", 12.0, 6.0),
        ] {
            state.declare_point(name, Some(Point2D::new(x, y))).unwrap();
        }
        let simtri = state
            .statement(Predicate::SimTri, &["A", "B", "C", "D", "E", "F"], None)
            .unwrap();
        state.assert_premise(simtri).unwrap();
        state
    }

    #[test]
    fn test_pairs_from_similar_triangles() {
        let state = similar_triangles();
        let corner = state
            .statement(Predicate::EqAngle, &["A", "B", "A", "C", "D", "E", "D", "F"], None)
            .unwrap();
        let sides = state
            .statement(Predicate::EqRatio, &["A", "B", "D", "E", "B", "C", "E", "F"], None)
            .unwrap();
        assert!(!state.proofs.has(&corner) && !state.proofs.has(&sides));
        assert!(!(dispatch::ops(Predicate::EqAngle).check)(&state, &corner));
        assert!(!(dispatch::ops(Predicate::EqRatio).check)(&state, &sides));

        let derived = derive_new_facts(&state, 1, 1000);
        let found = |s: &Statement, kind: TableKind| {
            derived.pairs.iter().any(|d| &d.statement == s && d.table == kind)
        };
        assert!(found(&corner, TableKind::Angle));
        assert!(found(&sides, TableKind::Ratio));
        assert!(derived.cheap.iter().all(|d| d.statement != corner && d.statement != sides));
        for d in &derived.pairs {
            assert_eq!(state.check_numeric(&d.statement), Some(true));
        }
    }

    #[test]
    fn test_pair_budget() {
        let mut state = square();
        let p1 = state.statement(Predicate::Para, &["A", "B", "C", "D"], None).unwrap();
        state.assert_premise(p1).unwrap();
        let derived = derive_new_facts(&state, 1, 0);
        assert!(derived.pairs.is_empty());
    }
}
