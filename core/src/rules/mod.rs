//! Deduction rules for geometric reasoning
//!
//! A rule is a named list of premise patterns and conclusion patterns over
//! universally quantified point variables. Rules arrive already tokenized:
//! each pattern is a predicate name followed by variable names, plus a
//! trailing rational for `aconst`/`rconst`.

pub mod angle;
pub mod cache;
pub mod circle;
pub mod collinear;
pub mod equality;
pub mod matcher;
pub mod parallel;
pub mod perpendicular;
pub mod triangle;

pub use cache::{CacheError, MatchCache};
pub use matcher::{enumerate, enumerate_all, verify, Binding};

use crate::ir::{parse_rational, EntityId, Predicate, Statement, StatementError};
use num_rational::Rational64;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Rule definition as tokens: `(name, premises, conclusions)`
pub type RuleSpec = (
    &'static str,
    &'static [&'static [&'static str]],
    &'static [&'static [&'static str]],
);

/// Malformed rule definition
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    #[error("rule {rule}: empty pattern")]
    EmptyPattern { rule: String },

    #[error("rule {rule}: unknown predicate {name}")]
    UnknownPredicate { rule: String, name: String },

    #[error("rule {rule}: {predicate} takes {expected} points, got {got}")]
    Arity {
        rule: String,
        predicate: Predicate,
        expected: usize,
        got: usize,
    },

    #[error("rule {rule}: bad value {token}")]
    BadValue { rule: String, token: String },

    #[error("rule {rule}: conclusion variable {var} is not bound by a premise")]
    UnboundVariable { rule: String, var: String },

    #[error("rule {rule}: {predicate} cannot be concluded")]
    SideConditionConclusion { rule: String, predicate: Predicate },
}

/// One predicate applied to rule variables
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pattern {
    pub predicate: Predicate,
    /// Indices into the rule's variable list
    pub vars: Vec<usize>,
    pub value: Option<Rational64>,
}

impl Pattern {
    /// Ground the pattern under a binding
    pub fn instantiate(&self, binding: &[EntityId]) -> Result<Statement, StatementError> {
        let args = self.vars.iter().map(|v| binding[*v]).collect();
        Statement::new(self.predicate, args, self.value)
    }
}

fn parse_value(rule: &str, token: &str) -> Result<Rational64, RuleError> {
    parse_rational(token).ok_or_else(|| RuleError::BadValue {
        rule: rule.to_string(),
        token: token.to_string(),
    })
}

/// Deduction rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    name: String,
    var_names: Vec<String>,
    premises: Vec<Pattern>,
    conclusions: Vec<Pattern>,
}

impl Rule {
    /// Build a rule from tokenized patterns
    ///
    /// Variables are numbered in order of first appearance.
    pub fn from_tokens(
        name: &str,
        premises: &[&[&str]],
        conclusions: &[&[&str]],
    ) -> Result<Self, RuleError> {
        let mut rule = Rule {
            name: name.to_string(),
            var_names: Vec::new(),
            premises: Vec::new(),
            conclusions: Vec::new(),
        };
        for tokens in premises {
            let pattern = rule.pattern(tokens, true)?;
            rule.premises.push(pattern);
        }
        for tokens in conclusions {
            let pattern = rule.pattern(tokens, false)?;
            if pattern.predicate.is_numeric_only() {
                return Err(RuleError::SideConditionConclusion {
                    rule: rule.name.clone(),
                    predicate: pattern.predicate,
                });
            }
            rule.conclusions.push(pattern);
        }
        Ok(rule)
    }

    fn pattern(&mut self, tokens: &[&str], bind: bool) -> Result<Pattern, RuleError> {
        let (head, rest) = tokens.split_first().ok_or_else(|| RuleError::EmptyPattern {
            rule: self.name.clone(),
        })?;
        let predicate = Predicate::from_name(head).ok_or_else(|| RuleError::UnknownPredicate {
            rule: self.name.clone(),
            name: head.to_string(),
        })?;

        let (points, value) = if predicate.has_value() {
            match rest.split_last() {
                Some((last, points)) => (points, Some(parse_value(&self.name, last)?)),
                None => (rest, None),
            }
        } else {
            (rest, None)
        };
        if points.len() != predicate.arity() || predicate.has_value() != value.is_some() {
            return Err(RuleError::Arity {
                rule: self.name.clone(),
                predicate,
                expected: predicate.arity(),
                got: points.len(),
            });
        }

        let mut vars = Vec::with_capacity(points.len());
        for token in points {
            let index = match self.var_names.iter().position(|v| v == token) {
                Some(i) => i,
                None if bind => {
                    self.var_names.push(token.to_string());
                    self.var_names.len() - 1
                }
                None => {
                    return Err(RuleError::UnboundVariable {
                        rule: self.name.clone(),
                        var: token.to_string(),
                    })
                }
            };
            vars.push(index);
        }
        Ok(Pattern {
            predicate,
            vars,
            value,
        })
    }

    /// Build every rule of a topic table
    pub fn from_specs(specs: &[RuleSpec]) -> Result<Vec<Rule>, RuleError> {
        specs
            .iter()
            .map(|(name, premises, conclusions)| Rule::from_tokens(name, premises, conclusions))
            .collect()
    }

    /// Unique identifier for this rule
    pub fn id(&self) -> &str {
        &self.name
    }

    pub fn var_names(&self) -> &[String] {
        &self.var_names
    }

    pub fn num_vars(&self) -> usize {
        self.var_names.len()
    }

    pub fn premises(&self) -> &[Pattern] {
        &self.premises
    }

    pub fn conclusions(&self) -> &[Pattern] {
        &self.conclusions
    }

    /// Identity of the rule: its name and full pattern text
    pub fn signature(&self) -> String {
        self.to_string()
    }

    pub fn ground_premises(&self, binding: &[EntityId]) -> Result<Vec<Statement>, StatementError> {
        self.premises.iter().map(|p| p.instantiate(binding)).collect()
    }

    pub fn ground_conclusions(&self, binding: &[EntityId]) -> Result<Vec<Statement>, StatementError> {
        self.conclusions.iter().map(|p| p.instantiate(binding)).collect()
    }

    fn render_pattern(&self, p: &Pattern) -> String {
        let mut parts = vec![p.predicate.name().to_string()];
        parts.extend(p.vars.iter().map(|v| self.var_names[*v].clone()));
        if let Some(value) = p.value {
            parts.push(value.to_string());
        }
        parts.join(" ")
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let premises: Vec<String> = self.premises.iter().map(|p| self.render_pattern(p)).collect();
        let conclusions: Vec<String> = self
            .conclusions
            .iter()
            .map(|p| self.render_pattern(p))
            .collect();
        write!(
            f,
            "{}: {} => {}",
            self.name,
            premises.join(", "),
            conclusions.join(", ")
        )
    }
}

/// Get all available deduction rules
pub fn all_rules() -> Result<Vec<Rule>, RuleError> {
    let mut rules = Vec::new();
    rules.extend(parallel::rules()?);
    rules.extend(perpendicular::rules()?);
    rules.extend(equality::rules()?);
    rules.extend(circle::rules()?);
    rules.extend(collinear::rules()?);
    rules.extend(angle::rules()?);
    rules.extend(triangle::rules()?);
    Ok(rules)
}
