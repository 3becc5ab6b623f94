//! Run statistics and outcomes

use crate::ir::ProofTrace;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Terminal state of a saturation run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// The goal became provable
    Solved,
    /// A full level produced nothing new
    Failed,
    /// Level or wall-clock budget ran out
    Exhausted,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Outcome::Solved => "solved",
            Outcome::Failed => "failed",
            Outcome::Exhausted => "exhausted",
        };
        write!(f, "{}", s)
    }
}

/// What one level did
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelStats {
    pub level: u32,

    /// Rule applications whose premises all held
    pub candidates: usize,

    /// New statements from rules
    pub rule_facts: usize,

    /// New statements from the algebraic tables
    pub algebra_facts: usize,

    pub elapsed_ms: u64,
}

impl LevelStats {
    pub fn new_facts(&self) -> usize {
        self.rule_facts + self.algebra_facts
    }
}

/// Search result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub outcome: Outcome,

    /// One entry per level that ran
    pub levels: Vec<LevelStats>,

    pub elapsed_ms: u64,

    /// Minimal proof of the goal (if solved)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof: Option<ProofTrace>,
}

impl SearchResult {
    pub fn new(outcome: Outcome) -> Self {
        Self {
            outcome,
            levels: Vec::new(),
            elapsed_ms: 0,
            proof: None,
        }
    }

    pub fn solved(&self) -> bool {
        self.outcome == Outcome::Solved
    }

    pub fn levels_run(&self) -> usize {
        self.levels.len()
    }

    pub fn total_facts(&self) -> usize {
        self.levels.iter().map(LevelStats::new_facts).sum()
    }

    /// Average verified candidates per level
    pub fn branching_factor(&self) -> f64 {
        if self.levels.is_empty() {
            return 0.0;
        }
        let total: usize = self.levels.iter().map(|l| l.candidates).sum();
        total as f64 / self.levels.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statistics() {
        let mut result = SearchResult::new(Outcome::Failed);
        assert_eq!(result.branching_factor(), 0.0);

        result.levels.push(LevelStats {
            level: 1,
            candidates: 4,
            rule_facts: 2,
            algebra_facts: 1,
            elapsed_ms: 3,
        });
        result.levels.push(LevelStats {
            level: 2,
            candidates: 2,
            ..LevelStats::default()
        });

        assert!(!result.solved());
        assert_eq!(result.levels_run(), 2);
        assert_eq!(result.total_facts(), 3);
        assert_eq!(result.branching_factor(), 3.0);
    }

    #[test]
    fn test_outcome_serialization() {
        let json = serde_json::to_string(&Outcome::Exhausted).unwrap();
        assert_eq!(json, "\"exhausted\"");
        assert_eq!(Outcome::Solved.to_string(), "solved");
    }
}
