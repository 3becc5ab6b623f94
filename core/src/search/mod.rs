//! Search module - level-by-level saturation
//!
//! Each level applies every newly verified rule match, then reads new facts
//! out of the algebraic tables, until the goal is proved, nothing new turns
//! up, or the budget runs out.

pub mod scheduler;
pub mod stats;

pub use scheduler::{Solver, SolverConfig};
pub use stats::{LevelStats, Outcome, SearchResult};
