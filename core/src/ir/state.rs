//! Proof run context
//!
//! [`GeoState`] owns everything one proof search mutates: the symbol
//! registry, the proof hypergraph, the algebraic tables and the numeric
//! model. It is passed explicitly to every component, so independent
//! searches can run side by side in one process.

use super::coords::{CoordinateStore, NumLine, Numeric, Point2D};
use super::facts::{rational_to_f64, Predicate, Statement};
use super::proof::{DepId, Dependency, ProofGraph, ProofTrace};
use super::symbols::{EntityId, EntityKind, Registry};
use crate::algebra::{Algebra, Expr};
use crate::error::{DdarError, DdarResult};
use crate::geometry::{dispatch, why};
use crate::search::{SearchResult, Solver, SolverConfig};
use num_rational::Rational64;
use rustc_hash::FxHasher;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use std::time::Duration;
use tracing::debug;

/// Metadata about a proof problem
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub problem_id: String,

    pub description: String,
}

impl Metadata {
    pub fn new(problem_id: String) -> Self {
        Self {
            problem_id,
            description: String::new(),
        }
    }

    pub fn with_description(mut self, description: String) -> Self {
        self.description = description;
        self
    }
}

/// An angle or ratio entity with the two quantities it was built from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuantityRecord {
    pub entity: EntityId,
    pub first: EntityId,
    pub second: EntityId,
}

/// Complete state of one proof run
#[derive(Debug, Clone, Default)]
pub struct GeoState {
    pub registry: Registry,

    pub proofs: ProofGraph,

    pub algebra: Algebra,

    pub goal: Option<Statement>,

    pub metadata: Metadata,

    points: Vec<EntityId>,
    coords: CoordinateStore,
    angles: Vec<QuantityRecord>,
    ratios: Vec<QuantityRecord>,
    angle_consts: BTreeMap<Rational64, EntityId>,
    ratio_consts: BTreeMap<Rational64, EntityId>,
    level: u32,
}

impl GeoState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_metadata(metadata: Metadata) -> Self {
        Self {
            metadata,
            ..Self::default()
        }
    }

    // ---- construction API ----

    /// Declare a named point, optionally with coordinates
    pub fn declare_point(&mut self, name: &str, coords: Option<Point2D>) -> DdarResult<EntityId> {
        let id = self.registry.create(EntityKind::Point, name, None)?;
        if let Some(p) = coords {
            self.registry.set_numeric(id, Numeric::Point(p));
            self.coords.set(id, p);
        }
        self.points.push(id);
        Ok(id)
    }

    /// Seed the proof graph with a construction premise
    ///
    /// Returns whether the statement was new. A premise that is false in
    /// the numeric model is a construction error.
    pub fn assert_premise(&mut self, statement: Statement) -> DdarResult<bool> {
        Ok(self.commit(Dependency::premise(statement))?.is_some())
    }

    pub fn set_goal(&mut self, goal: Statement) {
        self.goal = Some(goal);
    }

    pub fn point(&self, name: &str) -> Option<EntityId> {
        self.registry
            .lookup(name)
            .filter(|id| self.registry.kind(*id) == EntityKind::Point)
    }

    /// Points in declaration order
    pub fn points(&self) -> &[EntityId] {
        &self.points
    }

    /// Snapshot of all known coordinates
    pub fn coordinates(&self) -> &CoordinateStore {
        &self.coords
    }

    /// Build a statement from point names
    pub fn statement(
        &self,
        predicate: Predicate,
        names: &[&str],
        value: Option<Rational64>,
    ) -> DdarResult<Statement> {
        let args = names
            .iter()
            .map(|n| self.point(n).ok_or_else(|| DdarError::UnknownPoint(n.to_string())))
            .collect::<DdarResult<Vec<_>>>()?;
        Ok(Statement::new(predicate, args, value)?)
    }

    pub fn render(&self, statement: &Statement) -> String {
        statement.render(&self.registry)
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn set_level(&mut self, level: u32) {
        self.level = level;
    }

    // ---- goal API ----

    pub fn check_numeric(&self, statement: &Statement) -> Option<bool> {
        dispatch::numeric(&self.coords, statement)
    }

    /// Symbolic truth: registry structure first, then algebraic entailment
    pub fn check(&self, statement: &Statement) -> bool {
        if statement.predicate.is_numeric_only() {
            return self.check_numeric(statement) == Some(true);
        }
        (dispatch::ops(statement.predicate).check)(self, statement) || self.entailed(statement)
    }

    /// Whether an algebraic table entails the statement
    pub fn entailed(&self, statement: &Statement) -> bool {
        (dispatch::ops(statement.predicate).algebraic)(self, statement)
            .iter()
            .any(|(kind, expr)| self.algebra.table(*kind).entailed(expr))
    }

    pub fn is_proved(&self, statement: &Statement) -> bool {
        self.proofs.has(statement) || self.check(statement)
    }

    pub fn goal_proved(&self) -> bool {
        self.goal.as_ref().is_some_and(|g| self.is_proved(g))
    }

    /// Run the saturation search with the default rule set
    pub fn run(&mut self, max_levels: usize, timeout: Duration) -> DdarResult<SearchResult> {
        let config = SolverConfig {
            max_levels,
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            ..SolverConfig::default()
        };
        Solver::new(config)?.run(self)
    }

    // ---- proof graph ----

    /// Give a true statement its own dependency if it has none yet
    pub fn ensure_proved(&mut self, statement: &Statement) -> DdarResult<Option<DepId>> {
        if statement.predicate.is_numeric_only() {
            return Ok(None);
        }
        if let Some(id) = self.proofs.accepted_id(statement) {
            return Ok(Some(id));
        }
        let justification = why::justify(self, statement)?;
        for premise in &justification.premises {
            self.ensure_proved(premise)?;
        }
        let (id, _) = self.proofs.add(Dependency::new(
            statement.clone(),
            justification.reason,
            justification.premises,
            self.level,
        ));
        Ok(Some(id))
    }

    /// Record a validated dependency and apply its side effects
    ///
    /// Returns the new handle, or `None` when the conclusion was already
    /// proved (the dependency is then kept as an alternative).
    pub fn commit(&mut self, mut dependency: Dependency) -> DdarResult<Option<DepId>> {
        let conclusion = dependency.conclusion.clone();
        if conclusion.predicate.is_numeric_only() {
            return Ok(None);
        }
        dependency.premises.retain(|p| !p.predicate.is_numeric_only());
        if self.proofs.has(&conclusion) {
            self.proofs.add(dependency);
            return Ok(None);
        }
        if self.check_numeric(&conclusion) == Some(false) {
            return Err(DdarError::NumericallyFalse(self.render(&conclusion)));
        }
        for premise in &dependency.premises {
            self.ensure_proved(premise)?;
        }

        debug!(
            statement = %self.render(&conclusion),
            reason = dependency.reason.label(),
            level = dependency.level,
            "commit"
        );
        let (id, _) = self.proofs.add(dependency);
        (dispatch::ops(conclusion.predicate).add)(self, &conclusion, id)?;
        Ok(Some(id))
    }

    pub fn minimal_proof(&self, goals: &[Statement]) -> DdarResult<Vec<DepId>> {
        Ok(self.proofs.minimal_proof(goals)?)
    }

    /// Rendered minimal proof of the goal
    pub fn proof_trace(&self) -> DdarResult<ProofTrace> {
        let goal = self.goal.clone().ok_or(DdarError::NoGoal)?;
        let ids = self.minimal_proof(std::slice::from_ref(&goal))?;
        let mut trace = self.proofs.trace(&self.registry, &ids, true);
        trace.add_metadata("problem_id".to_string(), self.metadata.problem_id.clone());
        trace.add_metadata("goal".to_string(), self.render(&goal));
        Ok(trace)
    }

    /// Stable hash of the construction: point names, coordinates and premises
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = FxHasher::default();

        let mut points: Vec<String> = self
            .points
            .iter()
            .map(|p| match self.coords.get(*p) {
                Some(c) => format!("{}@{:.6},{:.6}", self.registry.name(*p), c.x, c.y),
                None => self.registry.name(*p).to_string(),
            })
            .collect();
        points.sort();
        points.hash(&mut hasher);

        let mut premises: Vec<String> = self
            .proofs
            .premises()
            .into_iter()
            .map(|id| self.render(&self.proofs.dependency(id).conclusion))
            .collect();
        premises.sort();
        premises.hash(&mut hasher);

        hasher.finish()
    }

    // ---- registry helpers ----

    /// Value entity attached to a line, segment, angle or ratio
    pub fn value(&self, e: EntityId) -> DdarResult<EntityId> {
        self.registry
            .value_of(e)
            .ok_or_else(|| DdarError::NoValue(self.registry.name(e).to_string()))
    }

    pub fn line_of(&self, a: EntityId, b: EntityId) -> Option<EntityId> {
        self.registry.container_of(EntityKind::Line, &[a, b])
    }

    pub fn direction_of(&self, a: EntityId, b: EntityId) -> Option<EntityId> {
        self.line_of(a, b).and_then(|l| self.registry.value_of(l))
    }

    pub fn length_of(&self, a: EntityId, b: EntityId) -> Option<EntityId> {
        self.registry
            .find_segment(a, b)
            .and_then(|s| self.registry.value_of(s))
    }

    /// Attach numeric realizations to a fresh line node
    pub(crate) fn attach_line_numeric(&mut self, line: EntityId, a: EntityId, b: EntityId) {
        let (Some(pa), Some(pb)) = (self.coords.get(a), self.coords.get(b)) else {
            return;
        };
        if let Some(num) = NumLine::through(pa, pb) {
            self.registry.set_numeric(line, Numeric::Line(num));
            if let Some(dir) = self.registry.value_of(line) {
                self.registry.set_numeric(dir, Numeric::Direction(num.direction()));
            }
        }
    }

    pub fn ensure_line(&mut self, a: EntityId, b: EntityId) -> DdarResult<EntityId> {
        let line = self.registry.line_through(a, b)?;
        if self.registry.numeric(line).is_none() {
            self.attach_line_numeric(line, a, b);
        }
        Ok(line)
    }

    pub fn ensure_direction(&mut self, a: EntityId, b: EntityId) -> DdarResult<EntityId> {
        let line = self.ensure_line(a, b)?;
        self.value(self.registry.representative(line))
    }

    pub fn ensure_length(&mut self, a: EntityId, b: EntityId) -> DdarResult<EntityId> {
        let segment = self.registry.segment(a, b)?;
        let length = self.value(segment)?;
        if self.registry.numeric(length).is_none() {
            if let (Some(pa), Some(pb)) = (self.coords.get(a), self.coords.get(b)) {
                self.registry.set_numeric(length, Numeric::Length(pa.distance(&pb)));
            }
        }
        Ok(length)
    }

    pub fn angles(&self) -> &[QuantityRecord] {
        &self.angles
    }

    pub fn ratios(&self) -> &[QuantityRecord] {
        &self.ratios
    }

    /// Angle records whose two directions match `d1`, `d2` up to equality
    pub fn find_angles(&self, d1: EntityId, d2: EntityId) -> impl Iterator<Item = &QuantityRecord> {
        self.angles
            .iter()
            .filter(move |r| self.registry.same(r.first, d1) && self.registry.same(r.second, d2))
    }

    pub fn find_ratios(&self, l1: EntityId, l2: EntityId) -> impl Iterator<Item = &QuantityRecord> {
        self.ratios
            .iter()
            .filter(move |r| self.registry.same(r.first, l1) && self.registry.same(r.second, l2))
    }

    pub fn angle_const(&self, value: Rational64) -> Option<EntityId> {
        self.angle_consts.get(&value).copied()
    }

    pub fn ratio_const(&self, value: Rational64) -> Option<EntityId> {
        self.ratio_consts.get(&value).copied()
    }

    /// Value entity of the angle from direction `d1` to `d2`
    pub fn ensure_angle(&mut self, d1: EntityId, d2: EntityId) -> DdarResult<EntityId> {
        if let Some(record) = self.find_angles(d1, d2).next() {
            return self.value(record.entity);
        }
        let name = format!("angle#{}", self.angles.len());
        let angle = self.registry.create(EntityKind::Angle, &name, None)?;
        self.angles.push(QuantityRecord {
            entity: angle,
            first: d1,
            second: d2,
        });
        let value = self.value(angle)?;
        if let (Some(Numeric::Direction(x)), Some(Numeric::Direction(y))) =
            (self.registry.numeric(d1), self.registry.numeric(d2))
        {
            self.registry
                .set_numeric(value, Numeric::AngleValue((y - x).rem_euclid(1.0)));
        }
        Ok(value)
    }

    /// Value entity of the ratio of lengths `l1 / l2`
    pub fn ensure_ratio(&mut self, l1: EntityId, l2: EntityId) -> DdarResult<EntityId> {
        if let Some(record) = self.find_ratios(l1, l2).next() {
            return self.value(record.entity);
        }
        let name = format!("ratio#{}", self.ratios.len());
        let ratio = self.registry.create(EntityKind::Ratio, &name, None)?;
        self.ratios.push(QuantityRecord {
            entity: ratio,
            first: l1,
            second: l2,
        });
        let value = self.value(ratio)?;
        if let (Some(Numeric::Length(x)), Some(Numeric::Length(y))) =
            (self.registry.numeric(l1), self.registry.numeric(l2))
        {
            if y > 0.0 {
                self.registry.set_numeric(value, Numeric::RatioValue(x / y));
            }
        }
        Ok(value)
    }

    pub fn ensure_angle_const(&mut self, value: Rational64) -> DdarResult<EntityId> {
        if let Some(id) = self.angle_const(value) {
            return Ok(id);
        }
        let id = self
            .registry
            .create(EntityKind::AngleValue, &format!("av#{value}"), None)?;
        self.registry.set_numeric(id, Numeric::AngleValue(rational_to_f64(value)));
        self.angle_consts.insert(value, id);
        Ok(id)
    }

    pub fn ensure_ratio_const(&mut self, value: Rational64) -> DdarResult<EntityId> {
        if let Some(id) = self.ratio_const(value) {
            return Ok(id);
        }
        let id = self
            .registry
            .create(EntityKind::RatioValue, &format!("rv#{value}"), None)?;
        self.registry.set_numeric(id, Numeric::RatioValue(rational_to_f64(value)));
        self.ratio_consts.insert(value, id);
        Ok(id)
    }

    /// Merge two entities and mirror every joined direction or length pair
    /// into the algebraic tables
    pub fn merge(&mut self, a: EntityId, b: EntityId, dep: Option<DepId>) -> DdarResult<()> {
        let merged = self.registry.merge(a, b, dep)?;
        for (x, y) in merged {
            match self.registry.kind(x) {
                EntityKind::Direction => {
                    self.algebra.angle.add_equation(&Expr::difference(x, y), dep)?;
                }
                EntityKind::Length => self.algebra.add_length_equality(x, y, dep)?,
                _ => {}
            }
        }
        Ok(())
    }

    /// A node of `class` standing for all of `points`, with the dependencies
    /// placing them on it
    pub fn why_on(&self, class: EntityId, points: &[EntityId]) -> DdarResult<(EntityId, Vec<DepId>)> {
        if let Some(node) = self.registry.node_owning(class, points) {
            return Ok((node, self.registry.created_by(node).into_iter().collect()));
        }

        let mut deps = Vec::new();
        let mut anchor = None;
        for p in points {
            let node = self.registry.node_owning(class, &[*p]).ok_or_else(|| {
                DdarError::NotTrue(format!(
                    "{} on {}",
                    self.registry.name(*p),
                    self.registry.name(class)
                ))
            })?;
            deps.extend(self.registry.created_by(node));
            match anchor {
                None => anchor = Some(node),
                Some(first) => deps.extend(self.registry.why_equal(first, node)?),
            }
        }
        let anchor = anchor.unwrap_or(class);
        let mut seen = Vec::new();
        deps.retain(|d| {
            let fresh = !seen.contains(d);
            seen.push(*d);
            fresh
        });
        Ok((anchor, deps))
    }

    /// Direction of the line node carrying `a` and `b`, with the dependencies
    /// placing both points on it
    pub fn line_anchor(&self, a: EntityId, b: EntityId) -> DdarResult<(EntityId, Vec<DepId>)> {
        let line = self.line_of(a, b).ok_or_else(|| {
            DdarError::NotTrue(format!(
                "line {}{}",
                self.registry.name(a),
                self.registry.name(b)
            ))
        })?;
        let (node, deps) = self.why_on(line, &[a, b])?;
        Ok((self.value(node)?, deps))
    }

    /// Dependencies placing `a` and `b` on their common line
    pub fn line_support(&self, a: EntityId, b: EntityId) -> DdarResult<Vec<DepId>> {
        Ok(self.line_anchor(a, b)?.1)
    }

    /// Two defining points of the line or segment owning a value entity
    pub fn witness(&self, value: EntityId) -> Option<(EntityId, EntityId)> {
        let owner = self.registry.owner_of(value)?;
        match self.registry.own_points(owner) {
            [a, b, ..] => Some((*a, *b)),
            _ => None,
        }
    }
}
