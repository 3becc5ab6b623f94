//! Geometry module - predicate semantics
//!
//! Canonical forms, numeric and structural checks, justifications and the
//! side effects of proved statements. No search logic lives here.

pub mod check;
pub mod constructions;
pub mod dispatch;
pub mod normalize;
pub mod why;

pub use constructions::Construct;
pub use dispatch::{numeric_at, ops, PredicateOps};
pub use normalize::{canonical_form, reduce_angle};
pub use why::{justify, Justification};
