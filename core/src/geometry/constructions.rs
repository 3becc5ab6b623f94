//! Geometric constructions
//!
//! Two halves: the registry and table updates applied once a statement is
//! proved, and the [`Construct`] trait that places new points with computed
//! coordinates together with the premises describing them.

use crate::algebra::{log_of, Expr, Var};
use crate::error::{DdarError, DdarResult};
use crate::ir::{
    circumcenter, line_line_intersection, midpoint, ops, DepId, EntityId, EntityKind, GeoState,
    NumCircle, NumLine, Numeric, Point2D, Predicate, Statement,
};
use num_rational::Rational64;
use num_traits::{One, Zero};

fn distinct_args(args: &[EntityId]) -> bool {
    args.iter()
        .enumerate()
        .all(|(i, a)| !args[i + 1..].contains(a))
}

// ---- lines and circles ----

/// New line node through `points`, merged into every line it coincides with
fn add_line_node(state: &mut GeoState, points: &[EntityId], dep: Option<DepId>) -> DdarResult<EntityId> {
    let node = state
        .registry
        .create_container(EntityKind::Line, points, None, dep)?;
    let coords = state.coordinates().clone();
    let defining = points.iter().skip(1).find(|p| {
        match (coords.get(points[0]), coords.get(**p)) {
            (Some(a), Some(b)) => !a.approx_eq(&b),
            _ => false,
        }
    });
    if let Some(second) = defining {
        state.attach_line_numeric(node, points[0], *second);
    }
    absorb_lines(state, node)?;
    Ok(node)
}

/// Two line nodes sharing two created points are the same line
fn absorb_lines(state: &mut GeoState, node: EntityId) -> DdarResult<()> {
    let own = state.registry.own_points(node).to_vec();
    for (i, p) in own.iter().enumerate() {
        for q in &own[i + 1..] {
            let classes: Vec<EntityId> = state
                .registry
                .containers_with(EntityKind::Line, *p)
                .into_iter()
                .filter(|c| state.registry.points(*c).contains(q))
                .collect();
            for class in classes {
                if state.registry.same(class, node) {
                    continue;
                }
                let other = match state.registry.node_owning(class, &[*p, *q]) {
                    Some(other) => other,
                    None => bridge_line(state, class, *p, *q)?,
                };
                state.merge(node, other, None)?;
            }
        }
    }
    Ok(())
}

/// Line node of `class` created with both `p` and `q`
///
/// Needed when the two points only meet in the class through merges; the
/// node is justified by a collinearity read off the class.
fn bridge_line(state: &mut GeoState, class: EntityId, p: EntityId, q: EntityId) -> DdarResult<EntityId> {
    let holder = state.registry.node_owning(class, &[p]).ok_or_else(|| {
        DdarError::NotTrue(format!("{} on {}", state.registry.name(p), state.registry.name(class)))
    })?;
    let w = state
        .registry
        .own_points(holder)
        .iter()
        .copied()
        .find(|w| *w != p && *w != q)
        .ok_or_else(|| DdarError::NotTrue(format!("{} has no third point", state.registry.name(class))))?;
    let bridge = Statement::of(Predicate::Coll, &[p, q, w])?;
    let dep = state.ensure_proved(&bridge)?;
    add_line_node(state, &[p, q, w], dep)
}

fn circle_numeric(state: &GeoState, points: &[EntityId], center: Option<EntityId>) -> Option<NumCircle> {
    let coords = state.coordinates();
    if let Some(o) = center {
        let (o, a) = (coords.get(o)?, coords.get(*points.first()?)?);
        return Some(NumCircle::new(o, o.distance(&a)));
    }
    let pts = coords.all(points)?;
    for i in 0..pts.len() {
        for j in i + 1..pts.len() {
            for k in j + 1..pts.len() {
                if let Some(c) = NumCircle::through(pts[i], pts[j], pts[k]) {
                    return Some(c);
                }
            }
        }
    }
    None
}

/// New circle node, merged with circle nodes sharing three created points
fn add_circle_node(
    state: &mut GeoState,
    points: &[EntityId],
    center: Option<EntityId>,
    dep: Option<DepId>,
) -> DdarResult<EntityId> {
    let node = state
        .registry
        .create_container(EntityKind::Circle, points, center, dep)?;
    if let Some(numeric) = circle_numeric(state, points, center) {
        state.registry.set_numeric(node, Numeric::Circle(numeric));
    }

    let mut candidates: Vec<EntityId> = points
        .iter()
        .flat_map(|p| state.registry.containers_with(EntityKind::Circle, *p))
        .flat_map(|class| state.registry.equivalence_class(class).to_vec())
        .filter(|n| *n != node)
        .collect();
    candidates.sort();
    candidates.dedup();
    for other in candidates {
        if state.registry.same(other, node) {
            continue;
        }
        let shared = state
            .registry
            .own_points(other)
            .iter()
            .filter(|p| points.contains(p))
            .count();
        if shared >= 3 {
            state.merge(node, other, None)?;
        }
    }
    Ok(node)
}

/// `|xz| = |xm| + |mz|` for the numerically middle point of three
fn add_betweenness(state: &mut GeoState, points: &[EntityId], dep: DepId) -> DdarResult<()> {
    let Some(coords) = state.coordinates().all(points) else {
        return Ok(());
    };
    for m in 0..3 {
        let (x, z) = ((m + 1) % 3, (m + 2) % 3);
        let (pm, px, pz) = (coords[m], coords[x], coords[z]);
        if pm.approx_eq(&px) || pm.approx_eq(&pz) {
            return Ok(());
        }
        if px.sub(&pm).dot(&pz.sub(&pm)) < 0.0 {
            let whole = state.ensure_length(points[x], points[z])?;
            let left = state.ensure_length(points[x], points[m])?;
            let right = state.ensure_length(points[m], points[z])?;
            let eq = Expr::entity(whole)
                .with(Var::Entity(left), -Rational64::one())
                .with(Var::Entity(right), -Rational64::one());
            state.algebra.distance.add_equation(&eq, Some(dep))?;
            return Ok(());
        }
    }
    Ok(())
}

// ---- side effects per predicate ----

pub fn add_coll(state: &mut GeoState, s: &Statement, dep: DepId) -> DdarResult<()> {
    if !distinct_args(&s.args) {
        return Ok(());
    }
    add_line_node(state, &s.args, Some(dep))?;
    add_betweenness(state, &s.args, dep)
}

pub fn add_cyclic(state: &mut GeoState, s: &Statement, dep: DepId) -> DdarResult<()> {
    if !distinct_args(&s.args) {
        return Ok(());
    }
    add_circle_node(state, &s.args, None, Some(dep))?;
    Ok(())
}

pub fn add_circle(state: &mut GeoState, s: &Statement, dep: DepId) -> DdarResult<()> {
    let a = &s.args;
    let radius = state.ensure_length(a[0], a[1])?;
    for p in &a[2..] {
        let other = state.ensure_length(a[0], *p)?;
        state.merge(radius, other, Some(dep))?;
    }
    add_circle_node(state, &a[1..], Some(a[0]), Some(dep))?;
    Ok(())
}

pub fn add_cong(state: &mut GeoState, s: &Statement, dep: DepId) -> DdarResult<()> {
    let a = &s.args;
    if a[..2] == a[2..] {
        return Ok(());
    }
    let x = state.ensure_length(a[0], a[1])?;
    let y = state.ensure_length(a[2], a[3])?;
    state.merge(x, y, Some(dep))
}

pub fn add_para(state: &mut GeoState, s: &Statement, dep: DepId) -> DdarResult<()> {
    let a = &s.args;
    let x = state.ensure_direction(a[0], a[1])?;
    let y = state.ensure_direction(a[2], a[3])?;
    state.merge(x, y, Some(dep))
}

fn add_angle_constant(state: &mut GeoState, s: &Statement, r: Rational64, dep: DepId) -> DdarResult<()> {
    let a = &s.args;
    let d1 = state.ensure_direction(a[0], a[1])?;
    let d2 = state.ensure_direction(a[2], a[3])?;
    let angle = state.ensure_angle(d1, d2)?;
    let constant = state.ensure_angle_const(r)?;
    state.merge(angle, constant, Some(dep))?;
    state
        .algebra
        .angle
        .add_equation(&Expr::difference(d2, d1).with_constant(-r), Some(dep))?;
    Ok(())
}

pub fn add_perp(state: &mut GeoState, s: &Statement, dep: DepId) -> DdarResult<()> {
    add_angle_constant(state, s, Rational64::new(1, 2), dep)
}

pub fn add_aconst(state: &mut GeoState, s: &Statement, dep: DepId) -> DdarResult<()> {
    match s.value {
        Some(r) if r.is_zero() => add_para(state, s, dep),
        Some(r) => add_angle_constant(state, s, r, dep),
        None => Ok(()),
    }
}

pub fn add_eqangle(state: &mut GeoState, s: &Statement, dep: DepId) -> DdarResult<()> {
    let mut d = Vec::with_capacity(4);
    for pair in s.args.chunks(2) {
        d.push(state.ensure_direction(pair[0], pair[1])?);
    }
    let v1 = state.ensure_angle(d[0], d[1])?;
    let v2 = state.ensure_angle(d[2], d[3])?;
    state.merge(v1, v2, Some(dep))?;
    state.algebra.angle.add_equation(
        &Expr::difference_of_differences(d[1], d[0], d[3], d[2]),
        Some(dep),
    )?;
    Ok(())
}

pub fn add_eqratio(state: &mut GeoState, s: &Statement, dep: DepId) -> DdarResult<()> {
    let mut l = Vec::with_capacity(4);
    for pair in s.args.chunks(2) {
        l.push(state.ensure_length(pair[0], pair[1])?);
    }
    let v1 = state.ensure_ratio(l[0], l[1])?;
    let v2 = state.ensure_ratio(l[2], l[3])?;
    state.merge(v1, v2, Some(dep))?;
    state.algebra.ratio.add_equation(
        &Expr::difference_of_differences(l[0], l[1], l[2], l[3]),
        Some(dep),
    )?;
    Ok(())
}

pub fn add_rconst(state: &mut GeoState, s: &Statement, dep: DepId) -> DdarResult<()> {
    let Some(r) = s.value else {
        return Ok(());
    };
    if r == Rational64::one() {
        return add_cong(state, s, dep);
    }
    let a = &s.args;
    let l1 = state.ensure_length(a[0], a[1])?;
    let l2 = state.ensure_length(a[2], a[3])?;
    let ratio = state.ensure_ratio(l1, l2)?;
    let constant = state.ensure_ratio_const(r)?;
    state.merge(ratio, constant, Some(dep))?;
    state.algebra.ratio.add_equation(
        &Expr::difference(l1, l2).plus(&log_of(r), -Rational64::one()),
        Some(dep),
    )?;
    Ok(())
}

pub fn add_midp(state: &mut GeoState, s: &Statement, dep: DepId) -> DdarResult<()> {
    let (m, a, b) = (s.args[0], s.args[1], s.args[2]);
    if !distinct_args(&s.args) {
        return Ok(());
    }
    add_line_node(state, &[m, a, b], Some(dep))?;
    add_betweenness(state, &[m, a, b], dep)?;

    let ma = state.ensure_length(m, a)?;
    let mb = state.ensure_length(m, b)?;
    state.merge(ma, mb, Some(dep))?;

    let ab = state.ensure_length(a, b)?;
    let half = Expr::difference(ab, ma).plus(&log_of(Rational64::from_integer(2)), -Rational64::one());
    state.algebra.ratio.add_equation(&half, Some(dep))?;
    Ok(())
}

/// Angle equations at two corners of similar triangles
fn add_triangle_angles(state: &mut GeoState, s: &Statement, dep: DepId) -> DdarResult<()> {
    let a = &s.args;
    let Some(pts) = state.coordinates().all(a) else {
        return Ok(());
    };
    let o1 = ops::orientation(pts[0], pts[1], pts[2]);
    let o2 = ops::orientation(pts[3], pts[4], pts[5]);
    let sign = if o1 * o2 > 0.0 {
        -Rational64::one()
    } else {
        Rational64::one()
    };

    // corner i sees vertices j and k
    for (i, j, k) in [(0, 1, 2), (1, 2, 0)] {
        let first = state.ensure_direction(a[i], a[j])?;
        let second = state.ensure_direction(a[i], a[k])?;
        let first2 = state.ensure_direction(a[i + 3], a[j + 3])?;
        let second2 = state.ensure_direction(a[i + 3], a[k + 3])?;
        let eq = Expr::difference(second, first).plus(&Expr::difference(second2, first2), sign);
        state.algebra.angle.add_equation(&eq, Some(dep))?;
    }
    Ok(())
}

pub fn add_simtri(state: &mut GeoState, s: &Statement, dep: DepId) -> DdarResult<()> {
    let a = &s.args;
    let mut sides = Vec::with_capacity(6);
    for (i, j) in [(0, 1), (1, 2), (2, 0), (3, 4), (4, 5), (5, 3)] {
        sides.push(state.ensure_length(a[i], a[j])?);
    }
    for (x, y) in [(0, 1), (1, 2)] {
        let eq = Expr::difference_of_differences(sides[x], sides[x + 3], sides[y], sides[y + 3]);
        state.algebra.ratio.add_equation(&eq, Some(dep))?;
    }
    add_triangle_angles(state, s, dep)
}

pub fn add_contri(state: &mut GeoState, s: &Statement, dep: DepId) -> DdarResult<()> {
    let a = &s.args;
    for (i, j) in [(0, 1), (1, 2), (2, 0)] {
        let x = state.ensure_length(a[i], a[j])?;
        let y = state.ensure_length(a[i + 3], a[j + 3])?;
        state.merge(x, y, Some(dep))?;
    }
    add_triangle_angles(state, s, dep)
}

// ---- point constructions ----

/// Construction operations on geometric states
pub trait Construct {
    /// Midpoint `name` of segment `a b`
    fn midpoint_of(&mut self, name: &str, a: &str, b: &str) -> DdarResult<EntityId>;

    /// Foot `name` of the perpendicular from `p` to line `a b`
    fn foot_of(&mut self, name: &str, p: &str, a: &str, b: &str) -> DdarResult<EntityId>;

    /// Intersection `name` of lines `l1` and `l2`
    fn intersection_of(&mut self, name: &str, l1: (&str, &str), l2: (&str, &str)) -> DdarResult<EntityId>;

    /// Center `name` of the circle through `a`, `b`, `c`
    fn circumcenter_of(&mut self, name: &str, a: &str, b: &str, c: &str) -> DdarResult<EntityId>;
}

fn coords_of(state: &GeoState, name: &str) -> DdarResult<Point2D> {
    let id = state
        .point(name)
        .ok_or_else(|| DdarError::UnknownPoint(name.to_string()))?;
    state
        .coordinates()
        .get(id)
        .ok_or_else(|| DdarError::NoValue(name.to_string()))
}

fn place(state: &mut GeoState, name: &str, at: Point2D, premises: &[(Predicate, Vec<&str>)]) -> DdarResult<EntityId> {
    let id = state.declare_point(name, Some(at))?;
    for (predicate, names) in premises {
        let s = state.statement(*predicate, names, None)?;
        state.assert_premise(s)?;
    }
    Ok(id)
}

fn line(state: &GeoState, a: &str, b: &str) -> DdarResult<NumLine> {
    NumLine::through(coords_of(state, a)?, coords_of(state, b)?)
        .ok_or_else(|| DdarError::NotTrue(format!("line {a}{b} is degenerate")))
}

impl Construct for GeoState {
    fn midpoint_of(&mut self, name: &str, a: &str, b: &str) -> DdarResult<EntityId> {
        let at = midpoint(coords_of(self, a)?, coords_of(self, b)?);
        place(self, name, at, &[(Predicate::Midp, vec![name, a, b])])
    }

    fn foot_of(&mut self, name: &str, p: &str, a: &str, b: &str) -> DdarResult<EntityId> {
        let from = coords_of(self, p)?;
        let at = line(self, a, b)?.foot(&from);
        if at.approx_eq(&from) {
            return Err(DdarError::NotTrue(format!("{p} lies on {a}{b}")));
        }
        place(
            self,
            name,
            at,
            &[
                (Predicate::Coll, vec![name, a, b]),
                (Predicate::Perp, vec![p, name, a, b]),
            ],
        )
    }

    fn intersection_of(&mut self, name: &str, l1: (&str, &str), l2: (&str, &str)) -> DdarResult<EntityId> {
        let at = line_line_intersection(&line(self, l1.0, l1.1)?, &line(self, l2.0, l2.1)?)
            .ok_or_else(|| {
                DdarError::NotTrue(format!("{}{} and {}{} are parallel", l1.0, l1.1, l2.0, l2.1))
            })?;
        place(
            self,
            name,
            at,
            &[
                (Predicate::Coll, vec![name, l1.0, l1.1]),
                (Predicate::Coll, vec![name, l2.0, l2.1]),
            ],
        )
    }

    fn circumcenter_of(&mut self, name: &str, a: &str, b: &str, c: &str) -> DdarResult<EntityId> {
        let at = circumcenter(coords_of(self, a)?, coords_of(self, b)?, coords_of(self, c)?)
            .ok_or_else(|| DdarError::NotTrue(format!("{a}, {b}, {c} are collinear")))?;
        place(self, name, at, &[(Predicate::Circle, vec![name, a, b, c])])
    }
}
