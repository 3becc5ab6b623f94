//! Numeric geometry kernel
//!
//! Floating point primitives used to instantiate a concrete model of the
//! construction and to reject candidate facts that are obviously false before
//! any symbolic work is attempted. Nothing here is ever used as a proof.

use super::symbols::EntityId;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Absolute tolerance for coordinate comparisons
pub const TOLERANCE: f64 = 1e-6;

/// 2D point coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Distance to another point
    pub fn distance(&self, other: &Point2D) -> f64 {
        self.sub(other).norm()
    }

    pub fn add(&self, other: &Point2D) -> Point2D {
        Point2D::new(self.x + other.x, self.y + other.y)
    }

    pub fn sub(&self, other: &Point2D) -> Point2D {
        Point2D::new(self.x - other.x, self.y - other.y)
    }

    pub fn scale(&self, k: f64) -> Point2D {
        Point2D::new(self.x * k, self.y * k)
    }

    pub fn norm(&self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// Dot product with another point (as vectors from origin)
    pub fn dot(&self, other: &Point2D) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// Cross product z-component (for 2D)
    pub fn cross_z(&self, other: &Point2D) -> f64 {
        self.x * other.y - self.y * other.x
    }

    /// Rotate by a quarter turn counter-clockwise
    pub fn perp(&self) -> Point2D {
        Point2D::new(-self.y, self.x)
    }

    pub fn approx_eq(&self, other: &Point2D) -> bool {
        self.distance(other) < TOLERANCE
    }
}

/// An infinite line, stored as an anchor point and a unit direction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NumLine {
    pub anchor: Point2D,
    pub dir: Point2D,
}

impl NumLine {
    /// Line through two points; `None` when they coincide
    pub fn through(a: Point2D, b: Point2D) -> Option<Self> {
        let d = b.sub(&a);
        let n = d.norm();
        if n < TOLERANCE {
            return None;
        }
        Some(Self {
            anchor: a,
            dir: d.scale(1.0 / n),
        })
    }

    pub fn distance_to(&self, p: &Point2D) -> f64 {
        self.dir.cross_z(&p.sub(&self.anchor)).abs()
    }

    pub fn contains(&self, p: &Point2D) -> bool {
        self.distance_to(p) < TOLERANCE
    }

    /// Direction as a fraction of a half-turn, in `[0, 1)`
    pub fn direction(&self) -> f64 {
        half_turns(self.dir)
    }

    pub fn same_as(&self, other: &NumLine) -> bool {
        self.dir.cross_z(&other.dir).abs() < TOLERANCE && self.contains(&other.anchor)
    }

    /// Orthogonal projection of `p` onto this line
    pub fn foot(&self, p: &Point2D) -> Point2D {
        let t = p.sub(&self.anchor).dot(&self.dir);
        self.anchor.add(&self.dir.scale(t))
    }
}

/// A circle given by center and radius
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NumCircle {
    pub center: Point2D,
    pub radius: f64,
}

impl NumCircle {
    pub fn new(center: Point2D, radius: f64) -> Self {
        Self { center, radius }
    }

    /// Circle through three points; `None` when they are collinear
    pub fn through(a: Point2D, b: Point2D, c: Point2D) -> Option<Self> {
        let center = circumcenter(a, b, c)?;
        Some(Self::new(center, center.distance(&a)))
    }

    pub fn contains(&self, p: &Point2D) -> bool {
        (self.center.distance(p) - self.radius).abs() < TOLERANCE * self.radius.max(1.0)
    }

    pub fn same_as(&self, other: &NumCircle) -> bool {
        self.center.approx_eq(&other.center)
            && (self.radius - other.radius).abs() < TOLERANCE * self.radius.max(1.0)
    }
}

/// Numeric realization attached to a registry entity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Numeric {
    Point(Point2D),
    Line(NumLine),
    Circle(NumCircle),
    /// Direction in half-turns, compared modulo 1
    Direction(f64),
    Length(f64),
    /// Angle in half-turns, compared modulo 1
    AngleValue(f64),
    RatioValue(f64),
}

impl Numeric {
    /// Whether two realizations describe the same object
    ///
    /// Realizations of different shapes are never the same.
    pub fn approx_same(&self, other: &Numeric) -> bool {
        match (self, other) {
            (Numeric::Point(a), Numeric::Point(b)) => a.approx_eq(b),
            (Numeric::Line(a), Numeric::Line(b)) => a.same_as(b),
            (Numeric::Circle(a), Numeric::Circle(b)) => a.same_as(b),
            (Numeric::Direction(a), Numeric::Direction(b))
            | (Numeric::AngleValue(a), Numeric::AngleValue(b)) => mod_one_close(*a, *b),
            (Numeric::Length(a), Numeric::Length(b))
            | (Numeric::RatioValue(a), Numeric::RatioValue(b)) => rel_close(*a, *b),
            _ => false,
        }
    }
}

/// Angle of a vector measured in half-turns, in `[0, 1)`
pub fn half_turns(v: Point2D) -> f64 {
    let t = v.y.atan2(v.x) / std::f64::consts::PI;
    t.rem_euclid(1.0)
}

/// Two half-turn measures are equal modulo 1
pub fn mod_one_close(a: f64, b: f64) -> bool {
    let d = (a - b).rem_euclid(1.0);
    d < TOLERANCE || 1.0 - d < TOLERANCE
}

/// Relative comparison for lengths and ratios
pub fn rel_close(a: f64, b: f64) -> bool {
    (a - b).abs() <= TOLERANCE * a.abs().max(b.abs()).max(1.0)
}

pub fn midpoint(a: Point2D, b: Point2D) -> Point2D {
    a.add(&b).scale(0.5)
}

/// Center of the circle through three points
pub fn circumcenter(a: Point2D, b: Point2D, c: Point2D) -> Option<Point2D> {
    let d = 2.0 * (a.x * (b.y - c.y) + b.x * (c.y - a.y) + c.x * (a.y - b.y));
    if d.abs() < TOLERANCE {
        return None;
    }
    let a2 = a.dot(&a);
    let b2 = b.dot(&b);
    let c2 = c.dot(&c);
    let ux = (a2 * (b.y - c.y) + b2 * (c.y - a.y) + c2 * (a.y - b.y)) / d;
    let uy = (a2 * (c.x - b.x) + b2 * (a.x - c.x) + c2 * (b.x - a.x)) / d;
    Some(Point2D::new(ux, uy))
}

pub fn line_line_intersection(l1: &NumLine, l2: &NumLine) -> Option<Point2D> {
    let denom = l1.dir.cross_z(&l2.dir);
    if denom.abs() < TOLERANCE {
        return None;
    }
    let t = l2.anchor.sub(&l1.anchor).cross_z(&l2.dir) / denom;
    Some(l1.anchor.add(&l1.dir.scale(t)))
}

/// Up to two intersection points, ordered along the line direction
pub fn line_circle_intersection(line: &NumLine, circle: &NumCircle) -> Vec<Point2D> {
    let foot = line.foot(&circle.center);
    let d = foot.distance(&circle.center);
    if d > circle.radius + TOLERANCE {
        return Vec::new();
    }
    let h = (circle.radius * circle.radius - d * d).max(0.0).sqrt();
    if h < TOLERANCE {
        return vec![foot];
    }
    vec![foot.sub(&line.dir.scale(h)), foot.add(&line.dir.scale(h))]
}

pub fn circle_circle_intersection(c1: &NumCircle, c2: &NumCircle) -> Vec<Point2D> {
    let delta = c2.center.sub(&c1.center);
    let d = delta.norm();
    if d < TOLERANCE || d > c1.radius + c2.radius + TOLERANCE || d < (c1.radius - c2.radius).abs() - TOLERANCE {
        return Vec::new();
    }
    let a = (c1.radius * c1.radius - c2.radius * c2.radius + d * d) / (2.0 * d);
    let h = (c1.radius * c1.radius - a * a).max(0.0).sqrt();
    let unit = delta.scale(1.0 / d);
    let base = c1.center.add(&unit.scale(a));
    if h < TOLERANCE {
        return vec![base];
    }
    let off = unit.perp().scale(h);
    vec![base.add(&off), base.sub(&off)]
}

/// Coordinate snapshot - maps point entities to coordinates
///
/// Numeric pre-checks only ever read this snapshot, so they are pure
/// functions of the construction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoordinateStore {
    coords: FxHashMap<EntityId, Point2D>,
}

impl CoordinateStore {
    pub fn new() -> Self {
        Self {
            coords: FxHashMap::default(),
        }
    }

    /// Set coordinates for a point
    pub fn set(&mut self, point: EntityId, coords: Point2D) {
        self.coords.insert(point, coords);
    }

    /// Get coordinates for a point
    pub fn get(&self, point: EntityId) -> Option<Point2D> {
        self.coords.get(&point).copied()
    }

    /// Coordinates for every listed point, or `None` if any is missing
    pub fn all(&self, points: &[EntityId]) -> Option<Vec<Point2D>> {
        points.iter().map(|p| self.get(*p)).collect()
    }

    pub fn len(&self) -> usize {
        self.coords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }
}

/// Numeric predicates over coordinates
pub mod ops {
    use super::*;

    /// Check if three points are collinear (using cross product)
    pub fn are_collinear(p1: Point2D, p2: Point2D, p3: Point2D) -> bool {
        let v1 = p2.sub(&p1);
        let v2 = p3.sub(&p1);
        let scale = v1.norm().max(v2.norm()).max(1.0);
        v1.cross_z(&v2).abs() < TOLERANCE * scale
    }

    fn unit(a: Point2D, b: Point2D) -> Option<Point2D> {
        let d = b.sub(&a);
        let n = d.norm();
        (n >= TOLERANCE).then(|| d.scale(1.0 / n))
    }

    /// Check if lines p1p2 and p3p4 are parallel
    pub fn are_parallel(p1: Point2D, p2: Point2D, p3: Point2D, p4: Point2D) -> bool {
        match (unit(p1, p2), unit(p3, p4)) {
            (Some(u), Some(v)) => u.cross_z(&v).abs() < TOLERANCE,
            _ => false,
        }
    }

    /// Check if lines p1p2 and p3p4 are perpendicular
    pub fn are_perpendicular(p1: Point2D, p2: Point2D, p3: Point2D, p4: Point2D) -> bool {
        match (unit(p1, p2), unit(p3, p4)) {
            (Some(u), Some(v)) => u.dot(&v).abs() < TOLERANCE,
            _ => false,
        }
    }

    /// Directed angle from line p1p2 to line p3p4 in half-turns
    pub fn angle_between(p1: Point2D, p2: Point2D, p3: Point2D, p4: Point2D) -> Option<f64> {
        let u = unit(p1, p2)?;
        let v = unit(p3, p4)?;
        Some((half_turns(v) - half_turns(u)).rem_euclid(1.0))
    }

    pub fn are_concyclic(a: Point2D, b: Point2D, c: Point2D, d: Point2D) -> bool {
        // any three of the four may be the degenerate triple
        [(a, b, c, d), (a, b, d, c), (a, c, d, b), (b, c, d, a)]
            .iter()
            .find_map(|(p, q, r, s)| NumCircle::through(*p, *q, *r).map(|circle| circle.contains(s)))
            .unwrap_or(false)
    }

    /// Signed area of triangle abc (twice the area)
    pub fn orientation(a: Point2D, b: Point2D, c: Point2D) -> f64 {
        b.sub(&a).cross_z(&c.sub(&a))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_distance() {
        let p1 = Point2D::new(0.0, 0.0);
        let p2 = Point2D::new(3.0, 4.0);

        assert!((p1.distance(&p2) - 5.0).abs() < 1e-10);
    }

    #[test]
    fn test_collinearity() {
        let p1 = Point2D::new(0.0, 0.0);
        let p2 = Point2D::new(1.0, 1.0);
        let p3 = Point2D::new(2.0, 2.0);

        assert!(ops::are_collinear(p1, p2, p3));
        assert!(!ops::are_collinear(p1, p2, Point2D::new(2.0, 2.5)));
    }

    #[test]
    fn test_perpendicular_and_parallel() {
        let o = Point2D::new(0.0, 0.0);
        let x = Point2D::new(1.0, 0.0);
        let y = Point2D::new(0.0, 1.0);

        assert!(ops::are_perpendicular(o, x, o, y));
        assert!(ops::are_parallel(o, x, y, Point2D::new(5.0, 1.0)));
        assert!(!ops::are_parallel(o, x, o, o), "degenerate line is never parallel");
    }

    #[test]
    fn test_half_turn_directions() {
        assert!(mod_one_close(half_turns(Point2D::new(1.0, 0.0)), 0.0));
        assert!(mod_one_close(half_turns(Point2D::new(-1.0, 0.0)), 0.0));
        assert!(mod_one_close(half_turns(Point2D::new(0.0, 1.0)), 0.5));
        assert!(mod_one_close(0.999_999_9, 0.0));
    }

    #[test]
    fn test_circumcenter() {
        let c = circumcenter(
            Point2D::new(1.0, 0.0),
            Point2D::new(-1.0, 0.0),
            Point2D::new(0.0, 1.0),
        )
        .unwrap();
        assert!(c.approx_eq(&Point2D::new(0.0, 0.0)));
        assert!(circumcenter(Point2D::new(0.0, 0.0), Point2D::new(1.0, 1.0), Point2D::new(2.0, 2.0)).is_none());
    }

    #[test]
    fn test_intersections() {
        let l1 = NumLine::through(Point2D::new(0.0, 0.0), Point2D::new(1.0, 1.0)).unwrap();
        let l2 = NumLine::through(Point2D::new(0.0, 2.0), Point2D::new(2.0, 0.0)).unwrap();
        let p = line_line_intersection(&l1, &l2).unwrap();
        assert!(p.approx_eq(&Point2D::new(1.0, 1.0)));

        let unit = NumCircle::new(Point2D::new(0.0, 0.0), 1.0);
        let axis = NumLine::through(Point2D::new(-2.0, 0.0), Point2D::new(2.0, 0.0)).unwrap();
        let hits = line_circle_intersection(&axis, &unit);
        assert_eq!(hits.len(), 2);
        assert!(hits[0].approx_eq(&Point2D::new(-1.0, 0.0)));

        let other = NumCircle::new(Point2D::new(1.0, 0.0), 1.0);
        let hits = circle_circle_intersection(&unit, &other);
        assert_eq!(hits.len(), 2);
        for h in hits {
            assert!(unit.contains(&h) && other.contains(&h));
        }
    }

    #[test]
    fn test_concyclic() {
        let pts: Vec<Point2D> = [0.3f64, 1.1, 2.0, 4.0]
            .iter()
            .map(|t| Point2D::new(2.0 * t.cos() + 1.0, 2.0 * t.sin()))
            .collect();
        assert!(ops::are_concyclic(pts[0], pts[1], pts[2], pts[3]));
        assert!(!ops::are_concyclic(pts[0], pts[1], pts[2], Point2D::new(0.0, 0.0)));
    }

    #[test]
    fn test_numeric_realization_compare() {
        assert!(Numeric::Direction(0.0).approx_same(&Numeric::Direction(1.0 - 1e-9)));
        assert!(!Numeric::Length(1.0).approx_same(&Numeric::Direction(1.0)));
        assert!(Numeric::Length(1000.0).approx_same(&Numeric::Length(1000.0 + 1e-5)));
    }

    #[test]
    fn test_coordinate_store() {
        let mut store = CoordinateStore::new();
        let p1 = EntityId(1);
        let coords = Point2D::new(1.0, 2.0);

        store.set(p1, coords);

        assert_eq!(store.get(p1), Some(coords));
        assert_eq!(store.len(), 1);
        assert!(store.all(&[p1, EntityId(2)]).is_none());
    }
}
