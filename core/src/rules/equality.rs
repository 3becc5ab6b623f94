//! Segment equality rules

use super::{Rule, RuleError, RuleSpec};

const RULES: &[RuleSpec] = &[
    // Isosceles triangle: equal legs ⇒ equal base angles
    (
        "isosceles_base_angles",
        &[&["cong", "O", "A", "O", "B"], &["ncoll", "O", "A", "B"]],
        &[&["eqangle", "O", "A", "A", "B", "A", "B", "O", "B"]],
    ),
    (
        "isosceles_converse",
        &[
            &["eqangle", "O", "A", "A", "B", "A", "B", "O", "B"],
            &["ncoll", "O", "A", "B"],
        ],
        &[&["cong", "O", "A", "O", "B"]],
    ),
    // A point on AB equidistant from A and B is its midpoint
    (
        "midpoint_from_cong",
        &[&["cong", "M", "A", "M", "B"], &["coll", "M", "A", "B"]],
        &[&["midp", "M", "A", "B"]],
    ),
];

pub fn rules() -> Result<Vec<Rule>, RuleError> {
    Rule::from_specs(RULES)
}
