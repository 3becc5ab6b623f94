//! Angle rules

use super::{Rule, RuleError, RuleSpec};

const RULES: &[RuleSpec] = &[
    // The bisector from A cuts BC in the ratio of the adjacent sides
    (
        "angle_bisector_ratio",
        &[
            &["eqangle", "B", "A", "A", "D", "A", "D", "A", "C"],
            &["coll", "B", "D", "C"],
            &["ncoll", "A", "B", "C"],
        ],
        &[&["eqratio", "D", "B", "D", "C", "A", "B", "A", "C"]],
    ),
    (
        "angle_bisector_converse",
        &[
            &["eqratio", "D", "B", "D", "C", "A", "B", "A", "C"],
            &["coll", "B", "D", "C"],
            &["ncoll", "A", "B", "C"],
        ],
        &[&["eqangle", "B", "A", "A", "D", "A", "D", "A", "C"]],
    ),
    // Equal angles against a common line ⇒ parallel
    (
        "eqangle_para",
        &[&["eqangle", "A", "B", "C", "D", "E", "F", "C", "D"]],
        &[&["para", "A", "B", "E", "F"]],
    ),
];

pub fn rules() -> Result<Vec<Rule>, RuleError> {
    Rule::from_specs(RULES)
}
