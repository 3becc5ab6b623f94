//! Symbol registry for geometric entities
//!
//! Every entity (points, lines, circles, segments and the value entities
//! attached to them) lives in one flat arena indexed by [`EntityId`].
//! Equality is tracked by two structures sharing those indices:
//! - a parent array, kept fully compressed so `representative` is one lookup
//! - an undirected multigraph of merge edges, each tagged with the dependency
//!   that justified the merge, searched breadth-first by `why_equal`
//!
//! The parent array alone would forget alternative justifications, so merge
//! edges are never discarded.

use super::coords::Numeric;
use super::proof::DepId;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, VecDeque};
use std::fmt;
use thiserror::Error;

/// Index of an entity in the registry arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl EntityId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Kind of a registry entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    Point,
    Line,
    Circle,
    Segment,
    Direction,
    Length,
    Angle,
    Ratio,
    AngleValue,
    RatioValue,
}

impl EntityKind {
    /// Kind of the value entity owned by entities of this kind
    pub fn value_kind(self) -> Option<EntityKind> {
        match self {
            EntityKind::Line => Some(EntityKind::Direction),
            EntityKind::Segment => Some(EntityKind::Length),
            EntityKind::Angle => Some(EntityKind::AngleValue),
            EntityKind::Ratio => Some(EntityKind::RatioValue),
            _ => None,
        }
    }

    fn prefix(self) -> &'static str {
        match self {
            EntityKind::Point => "",
            EntityKind::Line => "line",
            EntityKind::Circle => "circle",
            EntityKind::Segment => "seg",
            EntityKind::Direction => "d",
            EntityKind::Length => "l",
            EntityKind::Angle => "angle",
            EntityKind::Ratio => "ratio",
            EntityKind::AngleValue => "av",
            EntityKind::RatioValue => "rv",
        }
    }

    /// Containers carry point sets
    pub fn is_container(self) -> bool {
        matches!(self, EntityKind::Line | EntityKind::Circle)
    }
}

/// Errors raised by the symbol registry
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("duplicate entity name: {0}")]
    DuplicateName(String),

    #[error("{0} and {1} are not known to be equal")]
    NotEqual(String, String),

    #[error("cannot merge {0} with {1}: different kinds")]
    KindMismatch(String, String),

    #[error("refusing to merge numerically distinct entities {0} and {1}")]
    NumericallyDistinct(String, String),
}

/// One provenance edge between two entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeEdge {
    pub neighbor: EntityId,
    /// `None` for intrinsic merges that need no premise
    pub justification: Option<DepId>,
}

#[derive(Debug, Clone)]
struct EntityNode {
    kind: EntityKind,
    name: String,
    /// Root of the class; always a root, never a chain
    parent: EntityId,
    /// Class members, only maintained on roots
    members: Vec<EntityId>,
    edges: Vec<MergeEdge>,
    /// Points this node was created with
    own_points: Vec<EntityId>,
    /// Union of member points, only maintained on roots
    points: BTreeSet<EntityId>,
    value: Option<EntityId>,
    owner: Option<EntityId>,
    center: Option<EntityId>,
    created_by: Option<DepId>,
    numeric: Option<Numeric>,
}

/// Owner of all entities and the only writer of merge edges
#[derive(Debug, Clone, Default)]
pub struct Registry {
    nodes: Vec<EntityNode>,
    names: FxHashMap<String, EntityId>,
    /// point -> container nodes created with that point
    containers: FxHashMap<EntityId, Vec<EntityId>>,
    segments: FxHashMap<(EntityId, EntityId), EntityId>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entities of any kind
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Create a named entity, together with its value entity if its kind has one
    pub fn create(
        &mut self,
        kind: EntityKind,
        name: &str,
        justification: Option<DepId>,
    ) -> Result<EntityId, RegistryError> {
        if self.names.contains_key(name) {
            return Err(RegistryError::DuplicateName(name.to_string()));
        }
        let id = EntityId(self.nodes.len() as u32);
        self.nodes.push(EntityNode {
            kind,
            name: name.to_string(),
            parent: id,
            members: vec![id],
            edges: Vec::new(),
            own_points: Vec::new(),
            points: BTreeSet::new(),
            value: None,
            owner: None,
            center: None,
            created_by: justification,
            numeric: None,
        });
        self.names.insert(name.to_string(), id);

        if let Some(value_kind) = kind.value_kind() {
            let value_name = format!("{}({})", value_kind.prefix(), name);
            let value = self.create(value_kind, &value_name, justification)?;
            self.nodes[id.index()].value = Some(value);
            self.nodes[value.index()].owner = Some(id);
        }
        Ok(id)
    }

    /// Create a line, circle or segment node defined by `points`
    pub fn create_container(
        &mut self,
        kind: EntityKind,
        points: &[EntityId],
        center: Option<EntityId>,
        justification: Option<DepId>,
    ) -> Result<EntityId, RegistryError> {
        let name = self.fresh_name(kind, points);
        let id = self.create(kind, &name, justification)?;
        let node = &mut self.nodes[id.index()];
        node.own_points = points.to_vec();
        node.points = points.iter().copied().collect();
        node.center = center;
        if kind.is_container() {
            for p in points {
                self.containers.entry(*p).or_default().push(id);
            }
        }
        Ok(id)
    }

    fn fresh_name(&self, kind: EntityKind, points: &[EntityId]) -> String {
        let labels: Vec<&str> = points.iter().map(|p| self.name(*p)).collect();
        let base = format!("{}:{}", kind.prefix(), labels.join("-"));
        if !self.names.contains_key(&base) {
            return base;
        }
        (1..)
            .map(|n| format!("{base}/{n}"))
            .find(|candidate| !self.names.contains_key(candidate))
            .unwrap_or(base)
    }

    pub fn set_numeric(&mut self, id: EntityId, numeric: Numeric) {
        self.nodes[id.index()].numeric = Some(numeric);
    }

    pub fn numeric(&self, id: EntityId) -> Option<Numeric> {
        self.nodes[id.index()].numeric
    }

    pub fn lookup(&self, name: &str) -> Option<EntityId> {
        self.names.get(name).copied()
    }

    pub fn name(&self, id: EntityId) -> &str {
        &self.nodes[id.index()].name
    }

    pub fn kind(&self, id: EntityId) -> EntityKind {
        self.nodes[id.index()].kind
    }

    /// Canonical member of the class of `e`
    pub fn representative(&self, e: EntityId) -> EntityId {
        self.nodes[e.index()].parent
    }

    pub fn same(&self, a: EntityId, b: EntityId) -> bool {
        self.representative(a) == self.representative(b)
    }

    /// All known members of the class of `e`
    pub fn equivalence_class(&self, e: EntityId) -> &[EntityId] {
        &self.nodes[self.representative(e).index()].members
    }

    /// Points of the whole class of a container
    pub fn points(&self, e: EntityId) -> &BTreeSet<EntityId> {
        &self.nodes[self.representative(e).index()].points
    }

    /// Points the node itself was created with
    pub fn own_points(&self, e: EntityId) -> &[EntityId] {
        &self.nodes[e.index()].own_points
    }

    pub fn center(&self, e: EntityId) -> Option<EntityId> {
        self.nodes[self.representative(e).index()].center
    }

    pub fn created_by(&self, e: EntityId) -> Option<DepId> {
        self.nodes[e.index()].created_by
    }

    pub fn value_of(&self, e: EntityId) -> Option<EntityId> {
        self.nodes[e.index()].value
    }

    pub fn owner_of(&self, e: EntityId) -> Option<EntityId> {
        self.nodes[e.index()].owner
    }

    pub fn edges(&self, e: EntityId) -> &[MergeEdge] {
        &self.nodes[e.index()].edges
    }

    /// All entities of a kind, in creation order
    pub fn entities_of_kind(&self, kind: EntityKind) -> impl Iterator<Item = EntityId> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(move |(_, n)| n.kind == kind)
            .map(|(i, _)| EntityId(i as u32))
    }

    /// Class representatives of a kind, in creation order
    pub fn classes_of_kind(&self, kind: EntityKind) -> Vec<EntityId> {
        self.entities_of_kind(kind)
            .filter(|e| self.representative(*e) == *e)
            .collect()
    }

    /// Representatives of container classes of `kind` holding `point`
    pub fn containers_with(&self, kind: EntityKind, point: EntityId) -> Vec<EntityId> {
        let mut reps: Vec<EntityId> = self
            .containers
            .get(&point)
            .into_iter()
            .flatten()
            .filter(|n| self.kind(**n) == kind)
            .map(|n| self.representative(*n))
            .collect();
        reps.sort();
        reps.dedup();
        reps
    }

    /// Representative of a container class holding every point
    pub fn container_of(&self, kind: EntityKind, points: &[EntityId]) -> Option<EntityId> {
        let (first, rest) = points.split_first()?;
        self.containers_with(kind, *first)
            .into_iter()
            .find(|c| rest.iter().all(|p| self.points(*c).contains(p)))
    }

    /// A member of `class` created with all of `points`
    pub fn node_owning(&self, class: EntityId, points: &[EntityId]) -> Option<EntityId> {
        self.equivalence_class(class)
            .iter()
            .copied()
            .find(|n| points.iter().all(|p| self.own_points(*n).contains(p)))
    }

    /// Line through two points, reusing an existing class when possible
    pub fn line_through(&mut self, a: EntityId, b: EntityId) -> Result<EntityId, RegistryError> {
        if let Some(line) = self.container_of(EntityKind::Line, &[a, b]) {
            return Ok(line);
        }
        self.create_container(EntityKind::Line, &[a, b], None, None)
    }

    /// Segment between two points (unordered)
    pub fn segment(&mut self, a: EntityId, b: EntityId) -> Result<EntityId, RegistryError> {
        let key = if a <= b { (a, b) } else { (b, a) };
        if let Some(seg) = self.segments.get(&key) {
            return Ok(*seg);
        }
        let seg = self.create_container(EntityKind::Segment, &[key.0, key.1], None, None)?;
        self.segments.insert(key, seg);
        Ok(seg)
    }

    /// Existing segment between two points
    pub fn find_segment(&self, a: EntityId, b: EntityId) -> Option<EntityId> {
        let key = if a <= b { (a, b) } else { (b, a) };
        self.segments.get(&key).copied()
    }

    /// Union the classes of `e1` and `e2`, keeping the representative of `e1`
    ///
    /// Value entities of the two nodes are merged recursively with the same
    /// justification. Returns every pair whose classes were actually joined,
    /// in merge order. When the two nodes are already equal only the
    /// provenance edge is added.
    pub fn merge(
        &mut self,
        e1: EntityId,
        e2: EntityId,
        justification: Option<DepId>,
    ) -> Result<Vec<(EntityId, EntityId)>, RegistryError> {
        let mut merged = Vec::new();
        let mut pending = vec![(e1, e2)];

        while let Some((a, b)) = pending.pop() {
            if a == b {
                continue;
            }
            if self.kind(a) != self.kind(b) {
                return Err(RegistryError::KindMismatch(
                    self.name(a).to_string(),
                    self.name(b).to_string(),
                ));
            }
            if let (Some(na), Some(nb)) = (self.numeric(a), self.numeric(b)) {
                if !na.approx_same(&nb) {
                    return Err(RegistryError::NumericallyDistinct(
                        self.name(a).to_string(),
                        self.name(b).to_string(),
                    ));
                }
            }

            if !self.edges(a).iter().any(|edge| edge.neighbor == b) {
                self.nodes[a.index()].edges.push(MergeEdge {
                    neighbor: b,
                    justification,
                });
                self.nodes[b.index()].edges.push(MergeEdge {
                    neighbor: a,
                    justification,
                });
            }

            let (ra, rb) = (self.representative(a), self.representative(b));
            if ra == rb {
                continue;
            }

            let absorbed = std::mem::take(&mut self.nodes[rb.index()].members);
            for m in &absorbed {
                self.nodes[m.index()].parent = ra;
            }
            self.nodes[ra.index()].members.extend(absorbed);
            let points = std::mem::take(&mut self.nodes[rb.index()].points);
            self.nodes[ra.index()].points.extend(points);
            if self.nodes[ra.index()].center.is_none() {
                self.nodes[ra.index()].center = self.nodes[rb.index()].center;
            }
            merged.push((a, b));

            if let (Some(va), Some(vb)) = (self.value_of(a), self.value_of(b)) {
                pending.push((va, vb));
            }
        }

        Ok(merged)
    }

    /// Justifications along a shortest merge-edge path from `e1` to `e2`
    pub fn why_equal(&self, e1: EntityId, e2: EntityId) -> Result<Vec<DepId>, RegistryError> {
        if !self.same(e1, e2) {
            return Err(RegistryError::NotEqual(
                self.name(e1).to_string(),
                self.name(e2).to_string(),
            ));
        }
        if e1 == e2 {
            return Ok(Vec::new());
        }

        let mut prev: FxHashMap<EntityId, (EntityId, Option<DepId>)> = FxHashMap::default();
        let mut visited: FxHashSet<EntityId> = FxHashSet::default();
        let mut queue = VecDeque::new();
        visited.insert(e1);
        queue.push_back(e1);

        while let Some(node) = queue.pop_front() {
            if node == e2 {
                break;
            }
            for edge in self.edges(node) {
                if visited.insert(edge.neighbor) {
                    prev.insert(edge.neighbor, (node, edge.justification));
                    queue.push_back(edge.neighbor);
                }
            }
        }

        if !visited.contains(&e2) {
            return Err(RegistryError::NotEqual(
                self.name(e1).to_string(),
                self.name(e2).to_string(),
            ));
        }

        let mut deps = Vec::new();
        let mut cursor = e2;
        while let Some((from, dep)) = prev.get(&cursor) {
            if let Some(dep) = dep {
                if !deps.contains(dep) {
                    deps.push(*dep);
                }
            }
            cursor = *from;
        }
        deps.reverse();
        Ok(deps)
    }
}
