//! Parallel line deduction rules

use super::{Rule, RuleError, RuleSpec};

const RULES: &[RuleSpec] = &[
    // AB ∥ CD, AD ∥ BC ⇒ opposite sides of ABCD are equal
    (
        "parallelogram_sides",
        &[
            &["para", "A", "B", "C", "D"],
            &["para", "A", "D", "B", "C"],
            &["ncoll", "A", "B", "C"],
        ],
        &[&["cong", "A", "B", "C", "D"], &["cong", "A", "D", "B", "C"]],
    ),
    // Diagonals of a parallelogram bisect each other
    (
        "parallelogram_diagonals",
        &[
            &["para", "A", "B", "C", "D"],
            &["para", "A", "D", "B", "C"],
            &["ncoll", "A", "B", "C"],
            &["coll", "M", "A", "C"],
            &["coll", "M", "B", "D"],
        ],
        &[&["midp", "M", "A", "C"], &["midp", "M", "B", "D"]],
    ),
    // A∥B, A⊥C ⇒ B⊥C
    (
        "para_perp",
        &[&["para", "A", "B", "C", "D"], &["perp", "A", "B", "E", "F"]],
        &[&["perp", "C", "D", "E", "F"]],
    ),
];

pub fn rules() -> Result<Vec<Rule>, RuleError> {
    Rule::from_specs(RULES)
}
