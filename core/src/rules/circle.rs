//! Circle and concyclicity rules

use super::{Rule, RuleError, RuleSpec};

const RULES: &[RuleSpec] = &[
    // Four points at one distance from O are concyclic
    (
        "concentric_cyclic",
        &[
            &["cong", "O", "A", "O", "B"],
            &["cong", "O", "A", "O", "C"],
            &["cong", "O", "A", "O", "D"],
        ],
        &[&["cyclic", "A", "B", "C", "D"]],
    ),
    (
        "circle_from_cong",
        &[&["cong", "O", "A", "O", "B"], &["cong", "O", "A", "O", "C"]],
        &[&["circle", "O", "A", "B", "C"]],
    ),
    (
        "circle_cyclic",
        &[&["circle", "O", "A", "B", "C"], &["cong", "O", "A", "O", "D"]],
        &[&["cyclic", "A", "B", "C", "D"]],
    ),
    // Inscribed angles over the same chord are equal
    (
        "inscribed_angle",
        &[
            &["cyclic", "A", "B", "C", "D"],
            &["ncoll", "C", "A", "B"],
            &["ncoll", "D", "A", "B"],
        ],
        &[&["eqangle", "C", "A", "C", "B", "D", "A", "D", "B"]],
    ),
    (
        "inscribed_angle_converse",
        &[
            &["eqangle", "C", "A", "C", "B", "D", "A", "D", "B"],
            &["ncoll", "C", "A", "B"],
            &["ncoll", "D", "A", "B"],
        ],
        &[&["cyclic", "A", "B", "C", "D"]],
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

    const SQUARE_ON_CIRCLE: &[(&str, f64, f64)] = &[
        ("O", 0.0, 0.0),
        ("A", 1.0, 0.0),
        ("B", 0.0, 1.0),
        ("C", -1.0, 0.0),
        ("D", 0.0, -1.0),
    ];

    #[test]
    fn test_concentric_cyclic() {
        let state = state(
            SQUARE_ON_CIRCLE,
            &[
                (Predicate::Cong, &["O", "A", "O", "B"]),
                (Predicate::Cong, &["O", "A", "O", "C"]),
                (Predicate::Cong, &["O", "A", "O", "D"]),
            ],
        );
        let rule = find(&rules().unwrap(), "concentric_cyclic");
        let cyclic = state.statement(Predicate::Cyclic, &["A", "B", "C", "D"], None).unwrap();
        assert!(fire(&state, &rule).contains(&cyclic));
    }

    #[test]
    fn test_inscribed_angle() {
        let state = state(SQUARE_ON_CIRCLE, &[(Predicate::Cyclic, &["A", "B", "C", "D"])]);
        let rule = find(&rules().unwrap(), "inscribed_angle");
        let angles = state
            .statement(Predicate::EqAngle, &["C", "A", "C", "B", "D", "A", "D", "B"], None)
            .unwrap();
        assert!(fire(&state, &rule).contains(&angles));
    }

    #[test]
    fn test_circle_from_cong() {
        let state = state(
            SQUARE_ON_CIRCLE,
            &[
                (Predicate::Cong, &["O", "A", "O", "B"]),
                (Predicate::Cong, &["O", "A", "O", "C"]),
            ],
        );
        let rule = find(&rules().unwrap(), "circle_from_cong");
        let circle = state.statement(Predicate::Circle, &["O", "A", "B", "C"], None).unwrap();
        assert!(fire(&state, &rule).contains(&circle));
    }
}
