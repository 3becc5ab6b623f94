//! Geometric predicates and canonical statements
//!
//! A [`Statement`] is a predicate applied to point entities, plus an exact
//! rational value for the two constant-valued predicates. Statements are
//! canonicalized on construction so logically identical facts hash
//! identically, which makes them usable as keys of the proof hypergraph.

use super::symbols::{EntityId, Registry};
use crate::geometry::normalize;
use num_rational::Rational64;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Closed set of predicates understood by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Predicate {
    /// Three points lie on one line
    Coll,
    /// AB ∥ CD
    Para,
    /// AB ⊥ CD
    Perp,
    /// |AB| = |CD|
    Cong,
    /// Four points lie on one circle
    Cyclic,
    /// O is the center of the circle through A, B, C
    Circle,
    /// M is the midpoint of AB
    Midp,
    /// ∠(AB,CD) = ∠(EF,GH), directed modulo a half-turn
    EqAngle,
    /// AB/CD = EF/GH
    EqRatio,
    /// ∠(AB,CD) = value half-turns
    AConst,
    /// AB/CD = value
    RConst,
    /// Triangles ABC and PQR are similar
    SimTri,
    /// Triangles ABC and PQR are congruent
    ConTri,
    /// Two points are distinct
    Diff,
    /// Three points are not collinear
    NColl,
    /// AB is not parallel to CD
    NPara,
    /// Angles BAC and YXZ open to the same side
    SameSide,
}

impl Predicate {
    pub const ALL: [Predicate; 17] = [
        Predicate::Coll,
        Predicate::Para,
        Predicate::Perp,
        Predicate::Cong,
        Predicate::Cyclic,
        Predicate::Circle,
        Predicate::Midp,
        Predicate::EqAngle,
        Predicate::EqRatio,
        Predicate::AConst,
        Predicate::RConst,
        Predicate::SimTri,
        Predicate::ConTri,
        Predicate::Diff,
        Predicate::NColl,
        Predicate::NPara,
        Predicate::SameSide,
    ];

    /// Number of point arguments
    pub fn arity(self) -> usize {
        match self {
            Predicate::Diff => 2,
            Predicate::Coll | Predicate::Midp | Predicate::NColl => 3,
            Predicate::Para
            | Predicate::Perp
            | Predicate::Cong
            | Predicate::Cyclic
            | Predicate::Circle
            | Predicate::AConst
            | Predicate::RConst
            | Predicate::NPara => 4,
            Predicate::SimTri | Predicate::ConTri | Predicate::SameSide => 6,
            Predicate::EqAngle | Predicate::EqRatio => 8,
        }
    }

    /// Whether the statement carries a rational value
    pub fn has_value(self) -> bool {
        matches!(self, Predicate::AConst | Predicate::RConst)
    }

    /// Side conditions checked on coordinates only, never stored as facts
    pub fn is_numeric_only(self) -> bool {
        matches!(
            self,
            Predicate::Diff | Predicate::NColl | Predicate::NPara | Predicate::SameSide
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            Predicate::Coll => "coll",
            Predicate::Para => "para",
            Predicate::Perp => "perp",
            Predicate::Cong => "cong",
            Predicate::Cyclic => "cyclic",
            Predicate::Circle => "circle",
            Predicate::Midp => "midp",
            Predicate::EqAngle => "eqangle",
            Predicate::EqRatio => "eqratio",
            Predicate::AConst => "aconst",
            Predicate::RConst => "rconst",
            Predicate::SimTri => "simtri",
            Predicate::ConTri => "contri",
            Predicate::Diff => "diff",
            Predicate::NColl => "ncoll",
            Predicate::NPara => "npara",
            Predicate::SameSide => "sameside",
        }
    }

    pub fn from_name(name: &str) -> Option<Predicate> {
        Predicate::ALL.iter().copied().find(|p| p.name() == name)
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Parse `n` or `n/d` into an exact rational
pub fn parse_rational(token: &str) -> Option<Rational64> {
    let (n, d) = token.split_once('/').unwrap_or((token, "1"));
    let n: i64 = n.trim().parse().ok()?;
    let d: i64 = d.trim().parse().ok()?;
    if d == 0 {
        return None;
    }
    Some(Rational64::new(n, d))
}

/// Floating-point approximation of an exact value
pub fn rational_to_f64(r: Rational64) -> f64 {
    *r.numer() as f64 / *r.denom() as f64
}

/// Malformed statement construction
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StatementError {
    #[error("{predicate} expects {expected} points, got {got}")]
    Arity {
        predicate: Predicate,
        expected: usize,
        got: usize,
    },

    #[error("{0} requires a value")]
    MissingValue(Predicate),

    #[error("{0} does not take a value")]
    UnexpectedValue(Predicate),

    #[error("rconst value must be positive")]
    NonPositiveRatio,

    #[error("unknown predicate: {0}")]
    UnknownPredicate(String),
}

/// An immutable, canonicalized fact about point entities
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Statement {
    pub predicate: Predicate,
    pub args: Vec<EntityId>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub value: Option<Rational64>,
}

impl Statement {
    /// Build a canonical statement
    pub fn new(
        predicate: Predicate,
        args: Vec<EntityId>,
        value: Option<Rational64>,
    ) -> Result<Self, StatementError> {
        if args.len() != predicate.arity() {
            return Err(StatementError::Arity {
                predicate,
                expected: predicate.arity(),
                got: args.len(),
            });
        }
        match (predicate.has_value(), value) {
            (true, None) => return Err(StatementError::MissingValue(predicate)),
            (false, Some(_)) => return Err(StatementError::UnexpectedValue(predicate)),
            _ => {}
        }
        if predicate == Predicate::RConst && value.is_some_and(|v| v <= Rational64::from_integer(0)) {
            return Err(StatementError::NonPositiveRatio);
        }

        let (args, value) = normalize::canonical_form(predicate, &args, value);
        Ok(Self {
            predicate,
            args,
            value,
        })
    }

    /// Build a value-free statement
    pub fn of(predicate: Predicate, args: &[EntityId]) -> Result<Self, StatementError> {
        Self::new(predicate, args.to_vec(), None)
    }

    /// Human-readable form using registry names
    pub fn render(&self, registry: &Registry) -> String {
        let names: Vec<&str> = self.args.iter().map(|a| registry.name(*a)).collect();
        match self.value {
            Some(v) => format!("{}({}, {})", self.predicate, names.join(","), v),
            None => format!("{}({})", self.predicate, names.join(",")),
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ids: Vec<String> = self.args.iter().map(|a| a.to_string()).collect();
        match self.value {
            Some(v) => write!(f, "{}({}, {})", self.predicate, ids.join(","), v),
            None => write!(f, "{}({})", self.predicate, ids.join(",")),
        }
    }
}
