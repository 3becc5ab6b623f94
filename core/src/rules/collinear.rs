//! Collinearity deduction rules

use super::{Rule, RuleError, RuleSpec};

const RULES: &[RuleSpec] = &[
    // Two parallels through one point coincide
    (
        "para_coll",
        &[&["para", "A", "B", "A", "C"]],
        &[&["coll", "A", "B", "C"]],
    ),
    // Two perpendiculars to one line through one point coincide
    (
        "perp_coll",
        &[&["perp", "A", "B", "C", "D"], &["perp", "A", "E", "C", "D"]],
        &[&["coll", "A", "B", "E"]],
    ),
];

pub fn rules() -> Result<Vec<Rule>, RuleError> {
    Rule::from_specs(RULES)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Predicate;
    use crate::rules::testing::{find, fire, state};

    #[test]
    fn test_para_coll() {
        let state = state(
            &[("A", 0.0, 0.0), ("B", 1.0, 1.0), ("C", 3.0, 3.0)],
            &[(Predicate::Para, &["A", "B", "A", "C"])],
        );
        let rule = find(&rules().unwrap(), "para_coll");
        let coll = state.statement(Predicate::Coll, &["A", "B", "C"], None).unwrap();
        assert!(fire(&state, &rule).contains(&coll));
    }

    #[test]
    fn test_perp_coll() {
        let state = state(
            &[
                ("A", 0.0, 0.0),
                ("B", 0.0, 1.0),
                ("E", 0.0, 3.0),
                ("C", -1.0, 2.0),
                ("D", 2.0, 2.0),
            ],
            &[
                (Predicate::Perp, &["A", "B", "C", "D"]),
                (Predicate::Perp, &["A", "E", "C", "D"]),
            ],
        );
        let rule = find(&rules().unwrap(), "perp_coll");
        let coll = state.statement(Predicate::Coll, &["A", "B", "E"], None).unwrap();
        assert!(fire(&state, &rule).contains(&coll));
    }
}
