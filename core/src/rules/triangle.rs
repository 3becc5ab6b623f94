//! Triangle rules: midlines, similarity and congruence

use super::{Rule, RuleError, RuleSpec};

const RULES: &[RuleSpec] = &[
    // The segment joining two side midpoints is parallel to the third side
    // and half as long
    (
        "midline",
        &[&["midp", "M", "A", "B"], &["midp", "N", "A", "C"]],
        &[&["para", "M", "N", "B", "C"], &["rconst", "M", "N", "B", "C", "1/2"]],
    ),
    (
        "midline_converse",
        &[
            &["midp", "M", "A", "B"],
            &["para", "M", "N", "B", "C"],
            &["coll", "N", "A", "C"],
            &["ncoll", "A", "B", "C"],
        ],
        &[&["midp", "N", "A", "C"]],
    ),
    (
        "similar_aa",
        &[
            &["eqangle", "B", "A", "B", "C", "Q", "P", "Q", "R"],
            &["eqangle", "C", "A", "C", "B", "R", "P", "R", "Q"],
            &["ncoll", "A", "B", "C"],
        ],
        &[&["simtri", "A", "B", "C", "P", "Q", "R"]],
    ),
    (
        "similar_sss",
        &[
            &["eqratio", "A", "B", "P", "Q", "B", "C", "Q", "R"],
            &["eqratio", "B", "C", "Q", "R", "C", "A", "R", "P"],
            &["ncoll", "A", "B", "C"],
        ],
        &[&["simtri", "A", "B", "C", "P", "Q", "R"]],
    ),
    (
        "similar_congruent",
        &[&["simtri", "A", "B", "C", "P", "Q", "R"], &["cong", "A", "B", "P", "Q"]],
        &[&["contri", "A", "B", "C", "P", "Q", "R"]],
    ),
    (
        "congruent_sss",
        &[
            &["cong", "A", "B", "P", "Q"],
            &["cong", "B", "C", "Q", "R"],
            &["cong", "C", "A", "R", "P"],
            &["ncoll", "A", "B", "C"],
        ],
        &[&["contri", "A", "B", "C", "P", "Q", "R"]],
    ),
];

pub fn rules() -> Result<Vec<Rule>, RuleError> {
    Rule::from_specs(RULES)
}
