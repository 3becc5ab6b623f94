//! Perpendicular line deduction rules

use super::{Rule, RuleError, RuleSpec};

const RULES: &[RuleSpec] = &[
    // A⊥B, B⊥C ⇒ A∥C
    (
        "perp_perp",
        &[&["perp", "A", "B", "C", "D"], &["perp", "C", "D", "E", "F"]],
        &[&["para", "A", "B", "E", "F"]],
    ),
    // The median to the hypotenuse is half the hypotenuse
    (
        "right_triangle_median",
        &[&["perp", "A", "C", "B", "C"], &["midp", "M", "A", "B"]],
        &[&["cong", "M", "A", "M", "C"]],
    ),
    // Two right angles over the same segment lie on its circle
    (
        "thales",
        &[&["perp", "A", "B", "B", "C"], &["perp", "A", "D", "D", "C"]],
        &[&["cyclic", "A", "B", "C", "D"]],
    ),
    (
        "diameter_right_angle",
        &[&["circle", "O", "A", "B", "C"], &["coll", "O", "A", "C"]],
        &[&["perp", "A", "B", "B", "C"]],
    ),
    // Two points equidistant from A and B span the perpendicular bisector
    (
        "perp_bisector",
        &[&["cong", "A", "P", "B", "P"], &["cong", "A", "Q", "B", "Q"]],
        &[&["perp", "A", "B", "P", "Q"]],
    ),
    (
        "perp_bisector_converse",
        &[&["midp", "M", "A", "B"], &["perp", "A", "B", "M", "P"]],
        &[&["cong", "P", "A", "P", "B"]],
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
    fn test_perp_perp() {
        let state = state(
            &[
                ("A", 0.0, 0.0),
                ("B", 2.0, 0.0),
                ("C", 1.0, -1.0),
                ("D", 1.0, 3.0),
                ("E", 0.0, 5.0),
                ("F", 4.0, 5.0),
            ],
            &[
                (Predicate::Perp, &["A", "B", "C", "D"]),
                (Predicate::Perp, &["C", "D", "E", "F"]),
            ],
        );
        let rule = find(&rules().unwrap(), "perp_perp");
        let para = state.statement(Predicate::Para, &["A", "B", "E", "F"], None).unwrap();
        assert!(fire(&state, &rule).contains(&para));
    }

    #[test]
    fn test_right_triangle_median() {
        let state = state(
            &[("A", 0.0, 2.0), ("B", 4.0, 0.0), ("C", 0.0, 0.0), ("M", 2.0, 1.0)],
            &[
                (Predicate::Perp, &["A", "C", "B", "C"]),
                (Predicate::Midp, &["M", "A", "B"]),
            ],
        );
        let rule = find(&rules().unwrap(), "right_triangle_median");
        let cong = state.statement(Predicate::Cong, &["M", "A", "M", "C"], None).unwrap();
        assert!(fire(&state, &rule).contains(&cong));
    }

    #[test]
    fn test_thales() {
        let state = state(
            &[("A", -1.0, 0.0), ("B", 0.0, 1.0), ("C", 1.0, 0.0), ("D", 0.0, -1.0)],
            &[
                (Predicate::Perp, &["A", "B", "B", "C"]),
                (Predicate::Perp, &["A", "D", "D", "C"]),
            ],
        );
        let rule = find(&rules().unwrap(), "thales");
        let cyclic = state.statement(Predicate::Cyclic, &["A", "B", "C", "D"], None).unwrap();
        assert!(fire(&state, &rule).contains(&cyclic));
    }

    #[test]
    fn test_perp_bisector() {
        let state = state(
            &[("A", -1.0, 0.0), ("B", 1.0, 0.0), ("P", 0.0, 2.0), ("Q", 0.0, -3.0)],
            &[
                (Predicate::Cong, &["A", "P", "B", "P"]),
                (Predicate::Cong, &["A", "Q", "B", "Q"]),
            ],
        );
        let rule = find(&rules().unwrap(), "perp_bisector");
        let perp = state.statement(Predicate::Perp, &["A", "B", "P", "Q"], None).unwrap();
        assert!(fire(&state, &rule).contains(&perp));
    }
}
