//! Checking statements
//!
//! Three views of truth per predicate:
//! - numeric: evaluated on a coordinate snapshot, used to prune matches
//! - structural: read off registry classes without any algebra
//! - algebraic: the linear equations a table must entail

use crate::algebra::{log_of, Expr, TableKind};
use crate::ir::{
    midpoint, mod_one_close, ops, rational_to_f64, rel_close, EntityId, EntityKind, GeoState,
    Point2D, Predicate, QuantityRecord, Statement,
};
use num_rational::Rational64;
use num_traits::Zero;

fn len(p: &[Point2D], i: usize, j: usize) -> f64 {
    p[i].distance(&p[j])
}

fn distinct(p: &[Point2D]) -> bool {
    p.iter()
        .enumerate()
        .all(|(i, a)| p[i + 1..].iter().all(|b| !a.approx_eq(b)))
}

// ---- numeric ----

pub fn numeric_coll(p: &[Point2D], _: Option<Rational64>) -> bool {
    ops::are_collinear(p[0], p[1], p[2])
}

pub fn numeric_para(p: &[Point2D], _: Option<Rational64>) -> bool {
    ops::are_parallel(p[0], p[1], p[2], p[3])
}

pub fn numeric_perp(p: &[Point2D], _: Option<Rational64>) -> bool {
    ops::are_perpendicular(p[0], p[1], p[2], p[3])
}

pub fn numeric_cong(p: &[Point2D], _: Option<Rational64>) -> bool {
    rel_close(len(p, 0, 1), len(p, 2, 3))
}

pub fn numeric_cyclic(p: &[Point2D], _: Option<Rational64>) -> bool {
    distinct(p) && ops::are_concyclic(p[0], p[1], p[2], p[3])
}

pub fn numeric_circle(p: &[Point2D], _: Option<Rational64>) -> bool {
    let r = len(p, 0, 1);
    r > 0.0 && rel_close(r, len(p, 0, 2)) && rel_close(r, len(p, 0, 3))
}

pub fn numeric_midp(p: &[Point2D], _: Option<Rational64>) -> bool {
    p[0].approx_eq(&midpoint(p[1], p[2]))
}

pub fn numeric_eqangle(p: &[Point2D], _: Option<Rational64>) -> bool {
    match (
        ops::angle_between(p[0], p[1], p[2], p[3]),
        ops::angle_between(p[4], p[5], p[6], p[7]),
    ) {
        (Some(x), Some(y)) => mod_one_close(x, y),
        _ => false,
    }
}

pub fn numeric_eqratio(p: &[Point2D], _: Option<Rational64>) -> bool {
    let (ab, cd, ef, gh) = (len(p, 0, 1), len(p, 2, 3), len(p, 4, 5), len(p, 6, 7));
    cd > 0.0 && gh > 0.0 && rel_close(ab * gh, cd * ef)
}

pub fn numeric_aconst(p: &[Point2D], value: Option<Rational64>) -> bool {
    match (ops::angle_between(p[0], p[1], p[2], p[3]), value) {
        (Some(x), Some(r)) => mod_one_close(x, rational_to_f64(r)),
        _ => false,
    }
}

pub fn numeric_rconst(p: &[Point2D], value: Option<Rational64>) -> bool {
    let cd = len(p, 2, 3);
    match value {
        Some(r) => cd > 0.0 && rel_close(len(p, 0, 1), rational_to_f64(r) * cd),
        None => false,
    }
}

fn sides(p: &[Point2D]) -> [f64; 3] {
    [len(p, 0, 1), len(p, 1, 2), len(p, 2, 0)]
}

pub fn numeric_simtri(p: &[Point2D], _: Option<Rational64>) -> bool {
    let (a, b) = (sides(&p[..3]), sides(&p[3..]));
    !ops::are_collinear(p[0], p[1], p[2])
        && !ops::are_collinear(p[3], p[4], p[5])
        && rel_close(a[0] * b[1], a[1] * b[0])
        && rel_close(a[1] * b[2], a[2] * b[1])
}

pub fn numeric_contri(p: &[Point2D], _: Option<Rational64>) -> bool {
    let (a, b) = (sides(&p[..3]), sides(&p[3..]));
    !ops::are_collinear(p[0], p[1], p[2]) && a.iter().zip(&b).all(|(x, y)| rel_close(*x, *y))
}

pub fn numeric_diff(p: &[Point2D], _: Option<Rational64>) -> bool {
    !p[0].approx_eq(&p[1])
}

pub fn numeric_ncoll(p: &[Point2D], _: Option<Rational64>) -> bool {
    distinct(p) && !ops::are_collinear(p[0], p[1], p[2])
}

pub fn numeric_npara(p: &[Point2D], _: Option<Rational64>) -> bool {
    !p[0].approx_eq(&p[1]) && !p[2].approx_eq(&p[3]) && !ops::are_parallel(p[0], p[1], p[2], p[3])
}

pub fn numeric_sameside(p: &[Point2D], _: Option<Rational64>) -> bool {
    let first = p[1].sub(&p[0]).dot(&p[2].sub(&p[0]));
    let second = p[4].sub(&p[3]).dot(&p[5].sub(&p[3]));
    first * second > 0.0
}

// ---- structural ----

fn has_duplicate(args: &[EntityId]) -> bool {
    args.iter()
        .enumerate()
        .any(|(i, a)| args[i + 1..].contains(a))
}

fn sub(predicate: Predicate, args: &[EntityId]) -> Option<Statement> {
    Statement::of(predicate, args).ok()
}

pub fn check_coll(state: &GeoState, s: &Statement) -> bool {
    has_duplicate(&s.args)
        || state
            .registry
            .container_of(EntityKind::Line, &s.args)
            .is_some()
}

pub fn check_para(state: &GeoState, s: &Statement) -> bool {
    let a = &s.args;
    match (state.direction_of(a[0], a[1]), state.direction_of(a[2], a[3])) {
        (Some(x), Some(y)) => state.registry.same(x, y),
        _ => false,
    }
}

pub fn check_cong(state: &GeoState, s: &Statement) -> bool {
    let a = &s.args;
    if a[..2] == a[2..] {
        return true;
    }
    match (state.length_of(a[0], a[1]), state.length_of(a[2], a[3])) {
        (Some(x), Some(y)) => state.registry.same(x, y),
        _ => false,
    }
}

pub fn check_cyclic(state: &GeoState, s: &Statement) -> bool {
    has_duplicate(&s.args)
        || state
            .registry
            .container_of(EntityKind::Circle, &s.args)
            .is_some()
}

/// Parts of a composite statement
pub fn components(s: &Statement) -> Vec<Statement> {
    let a = &s.args;
    let parts = match s.predicate {
        Predicate::Circle => vec![
            sub(Predicate::Cong, &[a[0], a[1], a[0], a[2]]),
            sub(Predicate::Cong, &[a[0], a[1], a[0], a[3]]),
        ],
        Predicate::Midp => vec![
            sub(Predicate::Coll, &[a[0], a[1], a[2]]),
            sub(Predicate::Cong, &[a[0], a[1], a[0], a[2]]),
        ],
        Predicate::SimTri => vec![
            sub(Predicate::EqRatio, &[a[0], a[1], a[3], a[4], a[1], a[2], a[4], a[5]]),
            sub(Predicate::EqRatio, &[a[1], a[2], a[4], a[5], a[2], a[0], a[5], a[3]]),
        ],
        Predicate::ConTri => vec![
            sub(Predicate::Cong, &[a[0], a[1], a[3], a[4]]),
            sub(Predicate::Cong, &[a[1], a[2], a[4], a[5]]),
            sub(Predicate::Cong, &[a[2], a[0], a[5], a[3]]),
        ],
        _ => Vec::new(),
    };
    parts.into_iter().flatten().collect()
}

fn check_components(state: &GeoState, s: &Statement) -> bool {
    let parts = components(s);
    !parts.is_empty() && parts.iter().all(|p| state.check(p))
}

pub fn check_circle(state: &GeoState, s: &Statement) -> bool {
    check_components(state, s)
}

pub fn check_midp(state: &GeoState, s: &Statement) -> bool {
    check_components(state, s)
}

pub fn check_simtri(state: &GeoState, s: &Statement) -> bool {
    check_components(state, s)
}

pub fn check_contri(state: &GeoState, s: &Statement) -> bool {
    check_components(state, s)
}

/// How an angle or ratio fact is witnessed by stored quantity records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityMatch {
    /// Both sides share their component classes
    Components,
    /// Both sides are zero angles
    Degenerate,
    /// Two records with equal values
    Records(QuantityRecord, QuantityRecord),
    /// One record equal to a constant value entity
    Constant(QuantityRecord, EntityId),
}

fn directions(state: &GeoState, args: &[EntityId]) -> Option<Vec<EntityId>> {
    args.chunks(2)
        .map(|c| state.direction_of(c[0], c[1]))
        .collect()
}

fn lengths(state: &GeoState, args: &[EntityId]) -> Option<Vec<EntityId>> {
    args.chunks(2).map(|c| state.length_of(c[0], c[1])).collect()
}

/// Witness for `q1 - q0 = q3 - q2` over direction or length entities
fn match_quads(
    state: &GeoState,
    q: &[EntityId],
    records: &[QuantityRecord],
    zero_difference: bool,
) -> Option<QuantityMatch> {
    let reg = &state.registry;
    if reg.same(q[0], q[2]) && reg.same(q[1], q[3]) {
        return Some(QuantityMatch::Components);
    }
    if zero_difference && reg.same(q[0], q[1]) && reg.same(q[2], q[3]) {
        return Some(QuantityMatch::Degenerate);
    }
    let matching = move |x: EntityId, y: EntityId| {
        records
            .iter()
            .filter(move |r| reg.same(r.first, x) && reg.same(r.second, y))
    };
    for r1 in matching(q[0], q[1]) {
        for r2 in matching(q[2], q[3]) {
            if let (Some(v1), Some(v2)) = (reg.value_of(r1.entity), reg.value_of(r2.entity)) {
                if reg.same(v1, v2) {
                    return Some(QuantityMatch::Records(*r1, *r2));
                }
            }
        }
    }
    None
}

/// Witness for `q1 - q0 = const` given both orientations of the constant
fn match_constant(
    state: &GeoState,
    q: &[EntityId],
    records: &[QuantityRecord],
    forward: Option<EntityId>,
    backward: Option<EntityId>,
) -> Option<QuantityMatch> {
    let reg = &state.registry;
    let find = move |x: EntityId, y: EntityId, target: Option<EntityId>| {
        let target = target?;
        records
            .iter()
            .find(|r| {
                reg.same(r.first, x)
                    && reg.same(r.second, y)
                    && reg.value_of(r.entity).is_some_and(|v| reg.same(v, target))
            })
            .map(|r| QuantityMatch::Constant(*r, target))
    };
    find(q[0], q[1], forward).or_else(|| find(q[1], q[0], backward))
}

pub fn angle_match(state: &GeoState, s: &Statement) -> Option<QuantityMatch> {
    let d = directions(state, &s.args)?;
    match s.predicate {
        Predicate::EqAngle => match_quads(state, &d, state.angles(), true),
        Predicate::Perp => {
            let half = state.angle_const(Rational64::new(1, 2));
            match_constant(state, &d, state.angles(), half, half)
        }
        Predicate::AConst => {
            let r = s.value?;
            let forward = state.angle_const(r);
            let backward = state.angle_const(super::normalize::reduce_angle(-r));
            match_constant(state, &d, state.angles(), forward, backward)
        }
        _ => None,
    }
}

pub fn ratio_match(state: &GeoState, s: &Statement) -> Option<QuantityMatch> {
    let l = lengths(state, &s.args)?;
    match s.predicate {
        Predicate::EqRatio => match_quads(state, &l, state.ratios(), false),
        Predicate::RConst => {
            let r = s.value?;
            let forward = state.ratio_const(r);
            let backward = state.ratio_const(r.recip());
            match_constant(state, &l, state.ratios(), forward, backward)
        }
        _ => None,
    }
}

pub fn check_perp(state: &GeoState, s: &Statement) -> bool {
    angle_match(state, s).is_some()
}

pub fn check_aconst(state: &GeoState, s: &Statement) -> bool {
    if s.value.is_some_and(|r| r.is_zero()) {
        return check_para(state, s);
    }
    angle_match(state, s).is_some()
}

pub fn check_eqangle(state: &GeoState, s: &Statement) -> bool {
    angle_match(state, s).is_some()
}

pub fn check_eqratio(state: &GeoState, s: &Statement) -> bool {
    ratio_match(state, s).is_some()
}

pub fn check_rconst(state: &GeoState, s: &Statement) -> bool {
    if s.value.is_some_and(|r| r == Rational64::new(1, 1)) {
        return check_cong(state, s);
    }
    ratio_match(state, s).is_some()
}

// ---- algebraic ----

fn direction_terms(state: &GeoState, args: &[EntityId]) -> Option<Vec<EntityId>> {
    directions(state, args)
}

pub fn algebraic_para(state: &GeoState, s: &Statement) -> Vec<(TableKind, Expr)> {
    direction_terms(state, &s.args)
        .map(|d| vec![(TableKind::Angle, Expr::difference(d[1], d[0]))])
        .unwrap_or_default()
}

pub fn algebraic_perp(state: &GeoState, s: &Statement) -> Vec<(TableKind, Expr)> {
    direction_terms(state, &s.args)
        .map(|d| {
            vec![(
                TableKind::Angle,
                Expr::difference(d[1], d[0]).with_constant(-Rational64::new(1, 2)),
            )]
        })
        .unwrap_or_default()
}

pub fn algebraic_aconst(state: &GeoState, s: &Statement) -> Vec<(TableKind, Expr)> {
    let r = s.value.unwrap_or_else(Rational64::zero);
    direction_terms(state, &s.args)
        .map(|d| vec![(TableKind::Angle, Expr::difference(d[1], d[0]).with_constant(-r))])
        .unwrap_or_default()
}

pub fn algebraic_eqangle(state: &GeoState, s: &Statement) -> Vec<(TableKind, Expr)> {
    direction_terms(state, &s.args)
        .map(|d| {
            vec![(
                TableKind::Angle,
                Expr::difference_of_differences(d[1], d[0], d[3], d[2]),
            )]
        })
        .unwrap_or_default()
}

pub fn algebraic_cong(state: &GeoState, s: &Statement) -> Vec<(TableKind, Expr)> {
    lengths(state, &s.args)
        .map(|l| {
            let e = Expr::difference(l[0], l[1]);
            vec![(TableKind::Ratio, e.clone()), (TableKind::Distance, e)]
        })
        .unwrap_or_default()
}

pub fn algebraic_eqratio(state: &GeoState, s: &Statement) -> Vec<(TableKind, Expr)> {
    lengths(state, &s.args)
        .map(|l| {
            vec![(
                TableKind::Ratio,
                Expr::difference_of_differences(l[0], l[1], l[2], l[3]),
            )]
        })
        .unwrap_or_default()
}

pub fn algebraic_rconst(state: &GeoState, s: &Statement) -> Vec<(TableKind, Expr)> {
    let Some(r) = s.value else {
        return Vec::new();
    };
    lengths(state, &s.args)
        .map(|l| {
            vec![(
                TableKind::Ratio,
                Expr::difference(l[0], l[1]).plus(&log_of(r), -Rational64::new(1, 1)),
            )]
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> Point2D {
        Point2D::new(x, y)
    }

    #[test]
    fn test_numeric_basic_predicates() {
        assert!(numeric_coll(&[p(0.0, 0.0), p(1.0, 1.0), p(3.0, 3.0)], None));
        assert!(!numeric_coll(&[p(0.0, 0.0), p(1.0, 1.0), p(3.0, 2.0)], None));
        assert!(numeric_perp(
            &[p(0.0, 0.0), p(2.0, 0.0), p(1.0, -1.0), p(1.0, 5.0)],
            None
        ));
        assert!(numeric_midp(&[p(1.0, 1.0), p(0.0, 0.0), p(2.0, 2.0)], None));
    }

    #[test]
    fn test_numeric_angle_constant() {
        // 45 degrees is a quarter of a half-turn
        let pts = [p(0.0, 0.0), p(1.0, 0.0), p(0.0, 0.0), p(1.0, 1.0)];
        assert!(numeric_aconst(&pts, Some(Rational64::new(1, 4))));
        assert!(!numeric_aconst(&pts, Some(Rational64::new(3, 4))));
    }

    #[test]
    fn test_numeric_ratio_constant() {
        let pts = [p(0.0, 0.0), p(2.0, 0.0), p(0.0, 0.0), p(0.0, 4.0)];
        assert!(numeric_rconst(&pts, Some(Rational64::new(1, 2))));
        assert!(!numeric_rconst(&pts, Some(Rational64::new(2, 1))));
    }

    #[test]
    fn test_numeric_side_conditions() {
        assert!(numeric_ncoll(&[p(0.0, 0.0), p(1.0, 0.0), p(0.0, 1.0)], None));
        assert!(!numeric_ncoll(&[p(0.0, 0.0), p(0.0, 0.0), p(0.0, 1.0)], None));
        assert!(numeric_sameside(
            &[p(0.0, 0.0), p(1.0, 0.0), p(2.0, 0.0), p(5.0, 5.0), p(6.0, 5.0), p(7.0, 5.0)],
            None
        ));
        assert!(!numeric_sameside(
            &[p(1.0, 0.0), p(0.0, 0.0), p(2.0, 0.0), p(5.0, 5.0), p(6.0, 5.0), p(7.0, 5.0)],
            None
        ));
    }

    #[test]
    fn test_numeric_similar_triangles() {
        let t1 = [p(0.0, 0.0), p(3.0, 0.0), p(0.0, 4.0)];
        let t2 = [p(10.0, 10.0), p(16.0, 10.0), p(10.0, 18.0)];
        let both: Vec<Point2D> = t1.iter().chain(&t2).copied().collect();
        assert!(numeric_simtri(&both, None));
        assert!(!numeric_contri(&both, None));
    }

    #[test]
    fn test_composite_components() {
        let s = Statement::of(Predicate::Midp, &[EntityId(0), EntityId(1), EntityId(2)]).unwrap();
        let parts = components(&s);
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].predicate, Predicate::Coll);
    }
}
