//! Rule matching
//!
//! Enumeration assigns distinct points to rule variables and prunes with the
//! numeric model as soon as a premise is fully bound. It never looks at the
//! proof state, so its result is valid for the whole run. Verification is the
//! symbolic half: every ground premise must hold in the current state.

use super::Rule;
use crate::geometry::numeric_at;
use crate::ir::{CoordinateStore, EntityId, GeoState, Point2D, Predicate};
use num_rational::Rational64;
use rayon::prelude::*;

/// One point per rule variable, in variable order
pub type Binding = Vec<EntityId>;

struct Check {
    predicate: Predicate,
    vars: Vec<usize>,
    value: Option<Rational64>,
}

/// Premises grouped by the depth at which their last variable is bound
fn checks_by_depth(rule: &Rule) -> Vec<Vec<Check>> {
    let mut by_depth: Vec<Vec<Check>> = (0..rule.num_vars()).map(|_| Vec::new()).collect();
    for premise in rule.premises() {
        if let Some(depth) = premise.vars.iter().max() {
            by_depth[*depth].push(Check {
                predicate: premise.predicate,
                vars: premise.vars.clone(),
                value: premise.value,
            });
        }
    }
    by_depth
}

/// Missing coordinates cannot refute a premise, except for side conditions
/// which exist only numerically
fn plausible(check: &Check, binding: &[EntityId], coords: &CoordinateStore) -> bool {
    let points: Option<Vec<Point2D>> = check.vars.iter().map(|v| coords.get(binding[*v])).collect();
    match points {
        Some(points) => numeric_at(check.predicate, &points, check.value),
        None => !check.predicate.is_numeric_only(),
    }
}

struct Search<'a> {
    points: &'a [EntityId],
    coords: &'a CoordinateStore,
    checks: Vec<Vec<Check>>,
    binding: Binding,
    used: Vec<bool>,
    out: Vec<Binding>,
}

impl Search<'_> {
    fn extend(&mut self, depth: usize) {
        if depth == self.checks.len() {
            self.out.push(self.binding.clone());
            return;
        }
        for i in 0..self.points.len() {
            if self.used[i] {
                continue;
            }
            self.binding.push(self.points[i]);
            let ok = self.checks[depth]
                .iter()
                .all(|c| plausible(c, &self.binding, self.coords));
            if ok {
                self.used[i] = true;
                self.extend(depth + 1);
                self.used[i] = false;
            }
            self.binding.pop();
        }
    }
}

/// Every injective assignment of points to the rule's variables whose
/// premises hold numerically
pub fn enumerate(rule: &Rule, points: &[EntityId], coords: &CoordinateStore) -> Vec<Binding> {
    if rule.num_vars() > points.len() {
        return Vec::new();
    }
    let mut search = Search {
        points,
        coords,
        checks: checks_by_depth(rule),
        binding: Vec::with_capacity(rule.num_vars()),
        used: vec![false; points.len()],
        out: Vec::new(),
    };
    search.extend(0);
    search.out
}

/// Enumerate several rules in parallel, results in rule order
pub fn enumerate_all(rules: &[&Rule], points: &[EntityId], coords: &CoordinateStore) -> Vec<Vec<Binding>> {
    rules
        .par_iter()
        .map(|rule| enumerate(rule, points, coords))
        .collect()
}

/// Whether every ground premise holds in the current state
pub fn verify(state: &GeoState, rule: &Rule, binding: &[EntityId]) -> bool {
    match rule.ground_premises(binding) {
        Ok(premises) => premises.iter().all(|p| state.is_proved(p)),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::testing::state;

    fn collinear_rule() -> Rule {
        Rule::from_tokens("para_coll", &[&["para", "A", "B", "A", "C"]], &[&["coll", "A", "B", "C"]])
            .unwrap()
    }

    #[test]
    fn test_enumerate_is_injective_and_pruned() {
        let state = state(
            &[("A", 0.0, 0.0), ("B", 1.0, 1.0), ("C", 2.0, 2.0), ("D", 0.0, 5.0)],
            &[],
        );
        let rule = collinear_rule();
        let bindings = enumerate(&rule, state.points(), state.coordinates());

        // only permutations of the three collinear points survive
        assert_eq!(bindings.len(), 6);
        for b in &bindings {
            assert_eq!(b.len(), 3);
            assert!(b[0] != b[1] && b[1] != b[2] && b[0] != b[2]);
            assert!(!b.contains(&state.point("D").unwrap()));
        }
    }

    #[test]
    fn test_missing_coordinates_are_permissive() {
        let mut state = state(&[], &[]);
        for name in ["A", "B", "C"] {
            state.declare_point(name, None).unwrap();
        }
        let bindings = enumerate(&collinear_rule(), state.points(), state.coordinates());
        assert_eq!(bindings.len(), 6);

        let strict = Rule::from_tokens(
            "iso",
            &[&["cong", "O", "A", "O", "B"], &["ncoll", "O", "A", "B"]],
            &[&["eqangle", "O", "A", "A", "B", "A", "B", "O", "B"]],
        )
        .unwrap();
        assert!(enumerate(&strict, state.points(), state.coordinates()).is_empty());
    }

    #[test]
    fn test_too_few_points() {
        let state = state(&[("A", 0.0, 0.0), ("B", 1.0, 1.0)], &[]);
        assert!(enumerate(&collinear_rule(), state.points(), state.coordinates()).is_empty());
    }

    #[test]
    fn test_verify_needs_symbolic_premises() {
        let points = [("A", 0.0, 0.0), ("B", 1.0, 1.0), ("C", 2.0, 2.0)];
        let rule = collinear_rule();

        let bare = state(&points, &[]);
        let bindings = enumerate(&rule, bare.points(), bare.coordinates());
        assert!(bindings.iter().all(|b| !verify(&bare, &rule, b)));

        let known = state(&points, &[(Predicate::Para, &["A", "B", "A", "C"])]);
        let bindings = enumerate(&rule, known.points(), known.coordinates());
        assert!(bindings.iter().any(|b| verify(&known, &rule, b)));
    }

    #[test]
    fn test_enumerate_all_keeps_rule_order() {
        let state = state(&[("A", 0.0, 0.0), ("B", 1.0, 1.0), ("C", 2.0, 2.0)], &[]);
        let rules = crate::rules::all_rules().unwrap();
        let refs: Vec<&Rule> = rules.iter().collect();
        let all = enumerate_all(&refs, state.points(), state.coordinates());
        assert_eq!(all.len(), rules.len());
        for (rule, bindings) in rules.iter().zip(&all) {
            assert_eq!(*bindings, enumerate(rule, state.points(), state.coordinates()));
        }
    }
}
