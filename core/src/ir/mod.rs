//! Intermediate Representation (IR) module for the deduction engine
//!
//! This module provides the core data structures of one proof run:
//! - **symbols**: the entity registry with justified union-find
//! - **facts**: predicates and canonical statements
//! - **proof**: the proof hypergraph and exported proof traces
//! - **coords**: the numeric model used as an oracle
//! - **state**: the run context tying all of the above together
//!
//! # Example
//!
//! ```rust
//! use geo_ddar_core::ir::*;
//!
//! let mut state = GeoState::new();
//! state.declare_point("A", Some(Point2D::new(0.0, 0.0))).unwrap();
//! state.declare_point("B", Some(Point2D::new(2.0, 0.0))).unwrap();
//! state.declare_point("M", Some(Point2D::new(1.0, 0.0))).unwrap();
//!
//! let midp = state.statement(Predicate::Midp, &["M", "A", "B"], None).unwrap();
//! state.assert_premise(midp).unwrap();
//!
//! let cong = state.statement(Predicate::Cong, &["M", "A", "M", "B"], None).unwrap();
//! assert!(state.is_proved(&cong));
//! ```

mod coords;
mod facts;
mod proof;
mod state;
mod symbols;

pub use coords::{
    circle_circle_intersection, circumcenter, half_turns, line_circle_intersection,
    line_line_intersection, midpoint, mod_one_close, ops, rel_close, CoordinateStore, NumCircle,
    NumLine, Numeric, Point2D, TOLERANCE,
};
pub use facts::{parse_rational, rational_to_f64, Predicate, Statement, StatementError};
pub use proof::{
    DepId, Dependency, ProofError, ProofGraph, ProofResult, ProofStatistics, ProofStep,
    ProofTrace, Reason,
};
pub use state::{GeoState, Metadata, QuantityRecord};
pub use symbols::{EntityId, EntityKind, MergeEdge, Registry, RegistryError};
