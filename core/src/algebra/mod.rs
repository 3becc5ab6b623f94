//! Algebraic closure engine
//!
//! Three linear systems over exact rationals:
//! - **angle**: directions of lines, constants in half-turns taken modulo 1
//! - **ratio**: logarithms of lengths, constants as logarithms of primes
//! - **distance**: lengths, constants as multiples of a unit atom
//!
//! Each table answers "is this equation entailed" and, on demand, "which
//! registered equations prove it" through a small linear program.

pub mod derive;
pub mod lp;
pub mod table;

pub use derive::{derive_new_facts, Derivation, Derivations};
pub use table::{AddOutcome, Table};

use crate::ir::{DepId, EntityId};
use num_rational::Rational64;
use num_traits::{One, Signed, Zero};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Which quantity a table chases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TableKind {
    Angle,
    Ratio,
    Distance,
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TableKind::Angle => "angle",
            TableKind::Ratio => "ratio",
            TableKind::Distance => "distance",
        };
        f.write_str(name)
    }
}

/// Errors raised by the algebraic tables
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AlgebraError {
    #[error("{table} table became inconsistent: residual {residual}")]
    Inconsistent { table: TableKind, residual: String },

    #[error("no certificate in the {table} table: {detail}")]
    NoCertificate { table: TableKind, detail: String },
}

/// Variable of a linear system
///
/// Only entity variables are ever eliminated; atoms stand for fixed,
/// algebraically independent constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Var {
    /// Direction or length entity (log-length in the ratio table)
    Entity(EntityId),
    /// `log p` for a prime `p`
    Prime(u64),
    /// Unit length
    Unit,
}

impl Var {
    pub fn is_entity(&self) -> bool {
        matches!(self, Var::Entity(_))
    }
}

/// Sparse linear expression `Σ c·v + konst`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Expr {
    terms: BTreeMap<Var, Rational64>,
    konst: Rational64,
}

impl Default for Expr {
    fn default() -> Self {
        Self::new()
    }
}

impl Expr {
    pub fn new() -> Self {
        Self {
            terms: BTreeMap::new(),
            konst: Rational64::zero(),
        }
    }

    pub fn var(v: Var) -> Self {
        Self::new().with(v, Rational64::one())
    }

    pub fn entity(e: EntityId) -> Self {
        Self::var(Var::Entity(e))
    }

    pub fn constant(c: Rational64) -> Self {
        let mut e = Self::new();
        e.konst = c;
        e
    }

    /// `a - b` over entities
    pub fn difference(a: EntityId, b: EntityId) -> Self {
        Self::entity(a).with(Var::Entity(b), -Rational64::one())
    }

    /// `(a - b) - (c - d)` over entities
    pub fn difference_of_differences(a: EntityId, b: EntityId, c: EntityId, d: EntityId) -> Self {
        Self::difference(a, b).plus(&Self::difference(c, d), -Rational64::one())
    }

    pub fn with(mut self, v: Var, c: Rational64) -> Self {
        self.add_term(v, c);
        self
    }

    pub fn with_constant(mut self, c: Rational64) -> Self {
        self.konst += c;
        self
    }

    pub fn add_term(&mut self, v: Var, c: Rational64) {
        if c.is_zero() {
            return;
        }
        let entry = self.terms.entry(v).or_insert_with(Rational64::zero);
        *entry += c;
        if entry.is_zero() {
            self.terms.remove(&v);
        }
    }

    /// `self + scale·other`
    pub fn plus(&self, other: &Expr, scale: Rational64) -> Expr {
        let mut out = self.clone();
        for (v, c) in &other.terms {
            out.add_term(*v, *c * scale);
        }
        out.konst += other.konst * scale;
        out
    }

    pub fn scaled(&self, scale: Rational64) -> Expr {
        Expr::new().plus(self, scale)
    }

    pub fn terms(&self) -> impl Iterator<Item = (&Var, &Rational64)> {
        self.terms.iter()
    }

    pub fn coefficient(&self, v: &Var) -> Rational64 {
        self.terms.get(v).copied().unwrap_or_else(Rational64::zero)
    }

    pub fn remove(&mut self, v: &Var) -> Option<Rational64> {
        self.terms.remove(v)
    }

    pub fn konst(&self) -> Rational64 {
        self.konst
    }

    pub(crate) fn set_konst(&mut self, c: Rational64) {
        self.konst = c;
    }

    pub fn has_entities(&self) -> bool {
        self.terms.keys().any(Var::is_entity)
    }

    pub fn entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.terms.keys().filter_map(|v| match v {
            Var::Entity(e) => Some(*e),
            _ => None,
        })
    }

    pub fn is_zero(&self) -> bool {
        self.terms.is_empty() && self.konst.is_zero()
    }

    /// Same expression with a positive leading coefficient, and the sign used
    pub fn sign_normalized(&self) -> (Expr, Rational64) {
        match self.terms.values().next() {
            Some(c) if c.is_negative() => (self.scaled(-Rational64::one()), -Rational64::one()),
            _ => (self.clone(), Rational64::one()),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = self
            .terms
            .iter()
            .map(|(v, c)| match v {
                Var::Entity(e) => format!("{c}*{e}"),
                Var::Prime(p) => format!("{c}*log{p}"),
                Var::Unit => format!("{c}*unit"),
            })
            .collect();
        if !self.konst.is_zero() || parts.is_empty() {
            parts.push(self.konst.to_string());
        }
        f.write_str(&parts.join(" + "))
    }
}

/// Prime factorization as `(prime, exponent)` pairs
pub fn factorize(mut n: u64) -> Vec<(u64, i64)> {
    let mut out = Vec::new();
    let mut p = 2;
    while p * p <= n {
        let mut e = 0;
        while n % p == 0 {
            n /= p;
            e += 1;
        }
        if e > 0 {
            out.push((p, e));
        }
        p += 1;
    }
    if n > 1 {
        out.push((n, 1));
    }
    out
}

/// `log(value)` as a combination of prime atoms
pub fn log_of(value: Rational64) -> Expr {
    let mut e = Expr::new();
    for (p, k) in factorize(value.numer().unsigned_abs()) {
        e.add_term(Var::Prime(p), Rational64::from_integer(k));
    }
    for (p, k) in factorize(value.denom().unsigned_abs()) {
        e.add_term(Var::Prime(p), Rational64::from_integer(-k));
    }
    e
}

/// Inverse of [`log_of`] when every exponent is an integer
pub fn exp_of(atoms: &Expr) -> Option<Rational64> {
    let mut value = Rational64::one();
    for (v, c) in atoms.terms() {
        let Var::Prime(p) = v else {
            return None;
        };
        if !c.is_integer() {
            return None;
        }
        let base = Rational64::from_integer(i64::try_from(*p).ok()?);
        let k = c.to_integer();
        let factor = base.pow(i32::try_from(k.abs()).ok()?);
        value = if k >= 0 { value * factor } else { value / factor };
    }
    Some(value)
}

/// The three tables of one proof run
#[derive(Debug, Clone)]
pub struct Algebra {
    pub angle: Table,
    pub ratio: Table,
    pub distance: Table,
}

impl Default for Algebra {
    fn default() -> Self {
        Self::new()
    }
}

impl Algebra {
    pub fn new() -> Self {
        Self {
            angle: Table::new(TableKind::Angle),
            ratio: Table::new(TableKind::Ratio),
            distance: Table::new(TableKind::Distance),
        }
    }

    pub fn table(&self, kind: TableKind) -> &Table {
        match kind {
            TableKind::Angle => &self.angle,
            TableKind::Ratio => &self.ratio,
            TableKind::Distance => &self.distance,
        }
    }

    pub fn table_mut(&mut self, kind: TableKind) -> &mut Table {
        match kind {
            TableKind::Angle => &mut self.angle,
            TableKind::Ratio => &mut self.ratio,
            TableKind::Distance => &mut self.distance,
        }
    }

    /// Record an equality of two lengths in both length-based tables
    pub fn add_length_equality(
        &mut self,
        a: EntityId,
        b: EntityId,
        dep: Option<DepId>,
    ) -> Result<(), AlgebraError> {
        let diff = Expr::difference(a, b);
        self.ratio.add_equation(&diff, dep)?;
        self.distance.add_equation(&diff, dep)?;
        Ok(())
    }
}
