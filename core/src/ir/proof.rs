//! Proof hypergraph and proof export
//!
//! Every proved statement has exactly one accepted [`Dependency`]: the first
//! one recorded. Later dependencies for the same statement are kept as
//! alternatives that `minimal_proof` may prefer when they expand to fewer
//! steps. Proof traces serialize to JSON for export.

use super::facts::Statement;
use super::symbols::Registry;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Handle to a dependency stored in the proof graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DepId(pub u32);

impl fmt::Display for DepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Dep{}", self.0)
    }
}

/// Errors raised while extracting or exporting proofs
#[derive(Error, Debug)]
pub enum ProofError {
    #[error("JSON serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("no dependency recorded for {0}")]
    Unproved(Statement),

    #[error("every derivation of {0} is circular")]
    Unfounded(Statement),
}

/// Result type for proof operations
pub type ProofResult<T> = Result<T, ProofError>;

/// Why a dependency holds
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Reason {
    /// Given by construction
    Premise,
    /// Named deduction rule
    Rule(String),
    /// Follows from the registry's structure alone
    Intrinsic,
    AngleChase,
    RatioChase,
    DistanceChase,
}

impl Reason {
    pub fn label(&self) -> &str {
        match self {
            Reason::Premise => "premise",
            Reason::Rule(name) => name,
            Reason::Intrinsic => "intrinsic",
            Reason::AngleChase => "angle chase",
            Reason::RatioChase => "ratio chase",
            Reason::DistanceChase => "distance chase",
        }
    }
}

/// One hyperedge: a conclusion justified by zero or more premises
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub conclusion: Statement,
    pub reason: Reason,
    pub premises: Vec<Statement>,
    /// Search level at which the dependency was created
    pub level: u32,
}

impl Dependency {
    pub fn new(conclusion: Statement, reason: Reason, premises: Vec<Statement>, level: u32) -> Self {
        Self {
            conclusion,
            reason,
            premises,
            level,
        }
    }

    /// A construction premise
    pub fn premise(conclusion: Statement) -> Self {
        Self::new(conclusion, Reason::Premise, Vec::new(), 0)
    }
}

/// Statement -> dependency store with first-proof-wins semantics
#[derive(Debug, Clone, Default)]
pub struct ProofGraph {
    dependencies: Vec<Dependency>,
    accepted: FxHashMap<Statement, DepId>,
    alternatives: FxHashMap<Statement, Vec<DepId>>,
}

enum Memo {
    InProgress,
    Done(Option<Vec<DepId>>),
}

impl ProofGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a dependency
    ///
    /// Returns the handle and whether the conclusion was newly proved. A
    /// dependency for an already proved statement is stored as an
    /// alternative and never replaces the accepted one.
    pub fn add(&mut self, dependency: Dependency) -> (DepId, bool) {
        let id = DepId(self.dependencies.len() as u32);
        let conclusion = dependency.conclusion.clone();
        self.dependencies.push(dependency);

        if self.accepted.contains_key(&conclusion) {
            self.alternatives.entry(conclusion).or_default().push(id);
            (id, false)
        } else {
            self.accepted.insert(conclusion, id);
            (id, true)
        }
    }

    pub fn has(&self, statement: &Statement) -> bool {
        self.accepted.contains_key(statement)
    }

    /// Accepted dependency of a statement
    pub fn why(&self, statement: &Statement) -> Option<&Dependency> {
        self.accepted.get(statement).map(|id| self.dependency(*id))
    }

    pub fn accepted_id(&self, statement: &Statement) -> Option<DepId> {
        self.accepted.get(statement).copied()
    }

    pub fn dependency(&self, id: DepId) -> &Dependency {
        &self.dependencies[id.0 as usize]
    }

    /// Number of recorded dependencies, alternatives included
    pub fn len(&self) -> usize {
        self.dependencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty()
    }

    /// Number of proved statements
    pub fn num_proved(&self) -> usize {
        self.accepted.len()
    }

    /// All accepted construction premises, in insertion order
    pub fn premises(&self) -> Vec<DepId> {
        let mut ids: Vec<DepId> = self
            .accepted
            .values()
            .copied()
            .filter(|id| self.dependency(*id).reason == Reason::Premise)
            .collect();
        ids.sort();
        ids
    }

    /// Proved statements in the order they were accepted
    pub fn proved(&self) -> Vec<&Statement> {
        let mut ids: Vec<DepId> = self.accepted.values().copied().collect();
        ids.sort();
        ids.into_iter()
            .map(|id| &self.dependency(id).conclusion)
            .collect()
    }

    fn candidates(&self, statement: &Statement) -> impl Iterator<Item = DepId> + '_ {
        self.accepted
            .get(statement)
            .into_iter()
            .chain(self.alternatives.get(statement).into_iter().flatten())
            .copied()
    }

    /// Flattened, duplicate-free dependencies proving all goals, premises first
    pub fn minimal_proof(&self, goals: &[Statement]) -> ProofResult<Vec<DepId>> {
        let mut memo: FxHashMap<Statement, Memo> = FxHashMap::default();
        let mut out = Vec::new();

        for goal in goals {
            if !self.has(goal) {
                return Err(ProofError::Unproved(goal.clone()));
            }
            let mut tainted = false;
            match self.expand(goal, &mut memo, &mut tainted) {
                Some(steps) => extend_unique(&mut out, &steps),
                None => return Err(ProofError::Unfounded(goal.clone())),
            }
        }
        Ok(out)
    }

    /// Shortest acyclic expansion of one statement
    ///
    /// `tainted` is set when some branch was rejected because it revisited a
    /// statement still being expanded; failures found under that condition
    /// are not memoized since they depend on the current stack.
    fn expand(
        &self,
        statement: &Statement,
        memo: &mut FxHashMap<Statement, Memo>,
        tainted: &mut bool,
    ) -> Option<Vec<DepId>> {
        match memo.get(statement) {
            Some(Memo::InProgress) => {
                *tainted = true;
                return None;
            }
            Some(Memo::Done(result)) => return result.clone(),
            None => {}
        }
        memo.insert(statement.clone(), Memo::InProgress);

        let mut best: Option<Vec<DepId>> = None;
        let mut local_taint = false;

        for id in self.candidates(statement) {
            let dependency = self.dependency(id);
            let mut steps = Vec::new();
            let mut founded = true;

            for premise in &dependency.premises {
                match self.expand(premise, memo, &mut local_taint) {
                    Some(sub) => extend_unique(&mut steps, &sub),
                    None => {
                        founded = false;
                        break;
                    }
                }
            }
            if !founded {
                continue;
            }
            extend_unique(&mut steps, &[id]);

            if best.as_ref().map_or(true, |b| steps.len() < b.len()) {
                best = Some(steps);
            }
        }

        if best.is_none() && local_taint {
            memo.remove(statement);
        } else {
            memo.insert(statement.clone(), Memo::Done(best.clone()));
        }
        *tainted |= local_taint;
        best
    }

    /// Numbered, rendered proof for export
    pub fn trace(&self, registry: &Registry, ids: &[DepId], solved: bool) -> ProofTrace {
        let mut trace = ProofTrace::new();
        for (index, id) in ids.iter().enumerate() {
            let dependency = self.dependency(*id);
            trace.add_step(ProofStep {
                index: index + 1,
                dependency: *id,
                rule_id: dependency.reason.label().to_string(),
                premises: dependency.premises.iter().map(|p| p.render(registry)).collect(),
                conclusion: dependency.conclusion.render(registry),
                level: dependency.level,
            });
        }
        trace.solved = solved;
        trace
    }
}

fn extend_unique(out: &mut Vec<DepId>, items: &[DepId]) {
    for id in items {
        if !out.contains(id) {
            out.push(*id);
        }
    }
}

/// A single numbered line of an exported proof
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProofStep {
    /// 1-based position in the proof
    pub index: usize,

    pub dependency: DepId,

    /// Reason label: `premise`, a rule name, or a chase kind
    pub rule_id: String,

    pub premises: Vec<String>,

    pub conclusion: String,

    pub level: u32,
}

impl ProofStep {
    pub fn is_premise(&self) -> bool {
        self.rule_id == Reason::Premise.label()
    }
}

impl fmt::Display for ProofStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.premises.is_empty() {
            write!(f, "{:>3}. {} [{}]", self.index, self.conclusion, self.rule_id)
        } else {
            write!(
                f,
                "{:>3}. {} => {} [{}]",
                self.index,
                self.premises.join(", "),
                self.conclusion,
                self.rule_id
            )
        }
    }
}

/// Complete exported proof
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProofTrace {
    /// Ordered proof steps, premises first
    pub steps: Vec<ProofStep>,

    /// Whether the goal was reached
    pub solved: bool,

    /// Additional metadata about the run
    pub metadata: HashMap<String, String>,
}

impl Default for ProofTrace {
    fn default() -> Self {
        Self::new()
    }
}

impl ProofTrace {
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            solved: false,
            metadata: HashMap::new(),
        }
    }

    pub fn add_step(&mut self, step: ProofStep) {
        self.steps.push(step);
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn add_metadata(&mut self, key: String, value: String) {
        self.metadata.insert(key, value);
    }

    pub fn get_metadata(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(|s| s.as_str())
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> ProofResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize from JSON string
    pub fn from_json(json: &str) -> ProofResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Get statistics about the proof
    pub fn statistics(&self) -> ProofStatistics {
        let mut stats = ProofStatistics {
            num_steps: self.steps.len(),
            num_premises: 0,
            solved: self.solved,
            rules_used: HashMap::new(),
        };

        for step in &self.steps {
            if step.is_premise() {
                stats.num_premises += 1;
            } else {
                *stats.rules_used.entry(step.rule_id.clone()).or_insert(0) += 1;
            }
        }

        stats
    }
}

/// Statistics about a proof trace
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProofStatistics {
    pub num_steps: usize,

    /// Steps that are construction premises
    pub num_premises: usize,

    pub solved: bool,

    /// Count of how many times each rule was used
    pub rules_used: HashMap<String, usize>,
}

impl ProofStatistics {
    /// Get the most frequently used rule
    pub fn most_used_rule(&self) -> Option<(&str, usize)> {
        self.rules_used
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
            .map(|(rule, count)| (rule.as_str(), *count))
    }
}

#[cfg(test)]
mod tests {
    use super::super::facts::Predicate;
    use super::super::symbols::{EntityId, EntityKind};
    use super::*;

    fn coll(a: u32, b: u32, c: u32) -> Statement {
        Statement::of(Predicate::Coll, &[EntityId(a), EntityId(b), EntityId(c)]).unwrap()
    }

    fn rule(conclusion: Statement, premises: Vec<Statement>) -> Dependency {
        Dependency::new(conclusion, Reason::Rule("test".to_string()), premises, 1)
    }

    #[test]
    fn test_first_proof_wins() {
        let mut graph = ProofGraph::new();
        let p = coll(0, 1, 2);
        let q = coll(0, 1, 3);
        graph.add(Dependency::premise(p.clone()));

        let (first, added) = graph.add(rule(q.clone(), vec![p.clone()]));
        assert!(added);
        let (second, added) = graph.add(Dependency::premise(q.clone()));
        assert!(!added);
        assert_ne!(first, second);

        assert!(graph.has(&q));
        assert_eq!(graph.accepted_id(&q), Some(first));
        assert_eq!(graph.why(&q).map(|d| &d.reason), Some(&Reason::Rule("test".to_string())));
        assert_eq!(graph.num_proved(), 2);
    }

    #[test]
    fn test_minimal_proof_orders_premises_first() {
        let mut graph = ProofGraph::new();
        let (a, b, c) = (coll(0, 1, 2), coll(0, 1, 3), coll(0, 2, 3));
        let (da, _) = graph.add(Dependency::premise(a.clone()));
        let (db, _) = graph.add(rule(b.clone(), vec![a.clone()]));
        let (dc, _) = graph.add(rule(c.clone(), vec![a.clone(), b.clone()]));

        assert_eq!(graph.minimal_proof(&[c]).unwrap(), vec![da, db, dc]);
    }

    #[test]
    fn test_minimal_proof_prefers_shorter_alternative() {
        let mut graph = ProofGraph::new();
        let (a, b, c, g) = (coll(0, 1, 2), coll(0, 1, 3), coll(0, 2, 3), coll(1, 2, 3));
        graph.add(Dependency::premise(a.clone()));
        graph.add(rule(b.clone(), vec![a.clone()]));
        graph.add(rule(c.clone(), vec![b.clone()]));
        graph.add(rule(g.clone(), vec![c.clone()]));
        // a later, shorter derivation of the goal
        graph.add(rule(g.clone(), vec![a.clone()]));

        let proof = graph.minimal_proof(&[g]).unwrap();
        assert_eq!(proof.len(), 2);
    }

    #[test]
    fn test_cycle_is_excluded() {
        let mut graph = ProofGraph::new();
        let (a, b, c) = (coll(0, 1, 2), coll(0, 1, 3), coll(0, 2, 3));
        let (da, _) = graph.add(Dependency::premise(a.clone()));
        let (db, _) = graph.add(rule(b.clone(), vec![a.clone()]));
        let (dc, _) = graph.add(rule(c.clone(), vec![b.clone()]));
        // b and c justify each other through alternatives
        let (alt_b, _) = graph.add(rule(b.clone(), vec![c.clone()]));
        let (alt_a, _) = graph.add(rule(a.clone(), vec![c.clone()]));

        let proof = graph.minimal_proof(&[c]).unwrap();
        assert_eq!(proof, vec![da, db, dc]);
        assert!(!proof.contains(&alt_b));
        assert!(!proof.contains(&alt_a));
    }

    #[test]
    fn test_unproved_goal_is_error() {
        let graph = ProofGraph::new();
        assert!(matches!(
            graph.minimal_proof(&[coll(0, 1, 2)]),
            Err(ProofError::Unproved(_))
        ));
    }

    #[test]
    fn test_premises_listed_in_order() {
        let mut graph = ProofGraph::new();
        let (a, b, c) = (coll(0, 1, 2), coll(0, 1, 3), coll(0, 2, 3));
        let (da, _) = graph.add(Dependency::premise(a.clone()));
        graph.add(rule(b.clone(), vec![a]));
        let (dc, _) = graph.add(Dependency::premise(c));

        assert_eq!(graph.premises(), vec![da, dc]);
    }

    #[test]
    fn test_trace_export() {
        let mut registry = Registry::new();
        for name in ["A", "B", "C", "D"] {
            registry.create(EntityKind::Point, name, None).unwrap();
        }
        let mut graph = ProofGraph::new();
        let (a, b) = (coll(0, 1, 2), coll(0, 1, 3));
        graph.add(Dependency::premise(a.clone()));
        graph.add(rule(b.clone(), vec![a]));

        let ids = graph.minimal_proof(&[b]).unwrap();
        let trace = graph.trace(&registry, &ids, true);

        assert_eq!(trace.len(), 2);
        assert_eq!(trace.steps[0].conclusion, "coll(A,B,C)");
        assert_eq!(trace.steps[1].premises, vec!["coll(A,B,C)".to_string()]);
        assert_eq!(trace.steps[1].to_string(), "  2. coll(A,B,C) => coll(A,B,D) [test]");

        let stats = trace.statistics();
        assert_eq!(stats.num_premises, 1);
        assert_eq!(stats.most_used_rule(), Some(("test", 1)));

        let restored = ProofTrace::from_json(&trace.to_json().unwrap()).unwrap();
        assert_eq!(restored.steps, trace.steps);
        assert!(restored.solved);
    }
}
