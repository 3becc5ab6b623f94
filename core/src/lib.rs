//! geo-ddar core
//!
//! Forward-chaining deduction for plane geometry: a justified symbol
//! registry, a proof hypergraph, algebraic closure over angles, ratios and
//! distances, and a level-by-level saturation search.

pub mod algebra;  // Linear tables over directions, log-lengths and lengths
pub mod error;    // Crate-level error taxonomy
pub mod geometry; // Predicate semantics (normalize, check, why, constructions)
pub mod ir;       // Intermediate representation (symbols, facts, state, proof, coords)
pub mod loader;   // JSON problem loader
pub mod rules;    // Deduction rules, matching and the match cache
pub mod search;   // Saturation scheduler

pub use error::{DdarError, DdarResult};
pub use geometry::Construct;
pub use ir::*;
pub use loader::{load_problem, load_problems, GeometryProblem, LoadError, LoadResult};
pub use rules::{all_rules, Rule, RuleError};
pub use search::{Outcome, SearchResult, Solver, SolverConfig};
