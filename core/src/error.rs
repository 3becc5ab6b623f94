//! Crate-level error taxonomy
//!
//! Construction and soundness errors abort a run. Search exhaustion is an
//! outcome, not an error, and a corrupt match cache degrades to an empty one.

use crate::algebra::AlgebraError;
use crate::ir::{ProofError, RegistryError, StatementError};
use crate::loader::LoadError;
use crate::rules::{CacheError, RuleError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DdarError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Statement(#[from] StatementError),

    #[error(transparent)]
    Proof(#[from] ProofError),

    #[error(transparent)]
    Algebra(#[from] AlgebraError),

    #[error(transparent)]
    Rule(#[from] RuleError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("unknown point: {0}")]
    UnknownPoint(String),

    /// A statement about to be committed does not hold in the numeric model
    #[error("{0} is false in the numeric model")]
    NumericallyFalse(String),

    #[error("{0} does not hold in the current state")]
    NotTrue(String),

    #[error("{0} has no value entity")]
    NoValue(String),

    #[error("no goal has been set")]
    NoGoal,
}

impl DdarError {
    /// Errors that mean the rule set or an algebraic step is unsound
    pub fn is_soundness(&self) -> bool {
        matches!(
            self,
            DdarError::NumericallyFalse(_)
                | DdarError::Registry(RegistryError::NumericallyDistinct(_, _))
                | DdarError::Algebra(AlgebraError::Inconsistent { .. })
        )
    }
}

pub type DdarResult<T> = Result<T, DdarError>;
