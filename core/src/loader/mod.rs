//! Problem loader
//!
//! Reads construction problems from JSON and turns them into a [`GeoState`].
//!
//! ```json
//! {
//!   "id": "orthocenter",
//!   "description": "altitudes meet",
//!   "points": [
//!     {"name": "A", "x": 0.0, "y": 0.0},
//!     {"name": "D", "construction": {"op": "foot", "args": ["A", "B", "C"]}}
//!   ],
//!   "premises": [{"predicate": "perp", "points": ["A", "D", "B", "C"]}],
//!   "goal": {"predicate": "coll", "points": ["A", "H", "D"]}
//! }
//! ```

use crate::error::DdarResult;
use crate::geometry::Construct;
use crate::ir::{parse_rational, GeoState, Metadata, Point2D, Predicate, Statement};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Problem loading errors
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0} is not a directory")]
    NotADirectory(PathBuf),

    #[error("unknown predicate: {0}")]
    UnknownPredicate(String),

    #[error("invalid value: {0}")]
    InvalidValue(String),

    #[error("point {0} needs both x and y")]
    PartialCoordinates(String),

    #[error("unknown construction: {0}")]
    UnknownConstruction(String),

    #[error("{op} takes {expected} points, got {got}")]
    ConstructionArity {
        op: String,
        expected: usize,
        got: usize,
    },
}

/// Problem loader result
pub type LoadResult<T> = Result<T, LoadError>;

/// A point placed by a construction instead of explicit coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstructionSpec {
    /// `midpoint`, `foot`, `intersection` or `circumcenter`
    pub op: String,
    pub args: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointSpec {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub construction: Option<ConstructionSpec>,
}

/// A predicate over named points
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementSpec {
    pub predicate: String,

    pub points: Vec<String>,

    /// Rational value such as `"1/2"` for `aconst` and `rconst`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl StatementSpec {
    pub fn to_statement(&self, state: &GeoState) -> DdarResult<Statement> {
        let predicate = Predicate::from_name(&self.predicate)
            .ok_or_else(|| LoadError::UnknownPredicate(self.predicate.clone()))?;
        let value = match &self.value {
            Some(token) => Some(
                parse_rational(token).ok_or_else(|| LoadError::InvalidValue(token.clone()))?,
            ),
            None => None,
        };
        let names: Vec<&str> = self.points.iter().map(String::as_str).collect();
        state.statement(predicate, &names, value)
    }
}

/// A geometric problem: construction, premises and goal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometryProblem {
    /// Problem ID
    pub id: String,

    #[serde(default)]
    pub description: String,

    /// Points in construction order
    pub points: Vec<PointSpec>,

    /// Given facts
    #[serde(default)]
    pub premises: Vec<StatementSpec>,

    /// Statement to prove
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal: Option<StatementSpec>,
}

fn arity(op: &str, args: &[String], expected: usize) -> LoadResult<()> {
    if args.len() != expected {
        return Err(LoadError::ConstructionArity {
            op: op.to_string(),
            expected,
            got: args.len(),
        });
    }
    Ok(())
}

fn construct(state: &mut GeoState, name: &str, spec: &ConstructionSpec) -> DdarResult<()> {
    let a = &spec.args;
    match spec.op.as_str() {
        "midpoint" => {
            arity(&spec.op, a, 2)?;
            state.midpoint_of(name, &a[0], &a[1])?;
        }
        "foot" => {
            arity(&spec.op, a, 3)?;
            state.foot_of(name, &a[0], &a[1], &a[2])?;
        }
        "intersection" => {
            arity(&spec.op, a, 4)?;
            state.intersection_of(name, (a[0].as_str(), a[1].as_str()), (a[2].as_str(), a[3].as_str()))?;
        }
        "circumcenter" => {
            arity(&spec.op, a, 3)?;
            state.circumcenter_of(name, &a[0], &a[1], &a[2])?;
        }
        other => return Err(LoadError::UnknownConstruction(other.to_string()).into()),
    }
    Ok(())
}

impl GeometryProblem {
    /// Convert problem to initial GeoState
    ///
    /// Points are declared in order, so constructions may only refer to
    /// earlier points. Premises are asserted after all points exist.
    pub fn to_state(&self) -> DdarResult<GeoState> {
        let metadata = Metadata::new(self.id.clone()).with_description(self.description.clone());
        let mut state = GeoState::with_metadata(metadata);

        for point in &self.points {
            match (&point.construction, point.x, point.y) {
                (Some(spec), _, _) => construct(&mut state, &point.name, spec)?,
                (None, Some(x), Some(y)) => {
                    state.declare_point(&point.name, Some(Point2D::new(x, y)))?;
                }
                (None, None, None) => {
                    state.declare_point(&point.name, None)?;
                }
                _ => return Err(LoadError::PartialCoordinates(point.name.clone()).into()),
            }
        }

        for premise in &self.premises {
            let statement = premise.to_statement(&state)?;
            state.assert_premise(statement)?;
        }

        if let Some(goal) = &self.goal {
            let goal = goal.to_statement(&state)?;
            state.set_goal(goal);
        }
        debug!(problem = %self.id, points = self.points.len(), premises = self.premises.len(), "problem loaded");
        Ok(state)
    }
}

/// Load a single problem from a JSON file
pub fn load_problem<P: AsRef<Path>>(path: P) -> LoadResult<GeometryProblem> {
    let path = path.as_ref();

    let contents = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&contents).map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load every `.json` problem in a directory, skipping unreadable ones
pub fn load_problems<P: AsRef<Path>>(dir: P) -> LoadResult<Vec<GeometryProblem>> {
    let dir = dir.as_ref();

    if !dir.is_dir() {
        return Err(LoadError::NotADirectory(dir.to_path_buf()));
    }

    let entries = fs::read_dir(dir).map_err(|source| LoadError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().and_then(|s| s.to_str()) == Some("json"))
        .collect();
    paths.sort();

    let mut problems = Vec::new();
    for path in paths {
        match load_problem(&path) {
            Ok(problem) => problems.push(problem),
            Err(e) => warn!(path = %path.display(), error = %e, "skipping problem"),
        }
    }

    Ok(problems)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DdarError;
    use tempfile::TempDir;

    const MIDPOINT: &str = r#"{
        "id": "midpoint_001",
        "description": "midpoint is equidistant",
        "points": [
            {"name": "A", "x": 0.0, "y": 0.0},
            {"name": "B", "x": 4.0, "y": 0.0},
            {"name": "M", "construction": {"op": "midpoint", "args": ["A", "B"]}}
        ],
        "goal": {"predicate": "cong", "points": ["M", "A", "M", "B"]}
    }"#;

    #[test]
    fn test_problem_to_state() {
        let problem: GeometryProblem = serde_json::from_str(MIDPOINT).unwrap();
        let state = problem.to_state().unwrap();

        assert_eq!(state.points().len(), 3);
        assert_eq!(state.metadata.problem_id, "midpoint_001");
        assert!(state.goal_proved());
    }

    #[test]
    fn test_rational_value() {
        let spec = StatementSpec {
            predicate: "rconst".to_string(),
            points: ["M", "A", "A", "B"].iter().map(|s| s.to_string()).collect(),
            value: Some("1/2".to_string()),
        };
        let problem: GeometryProblem = serde_json::from_str(MIDPOINT).unwrap();
        let state = problem.to_state().unwrap();
        let statement = spec.to_statement(&state).unwrap();
        assert!(state.check(&statement));
    }

    #[test]
    fn test_bad_specs() {
        let problem: GeometryProblem = serde_json::from_str(MIDPOINT).unwrap();
        let state = problem.to_state().unwrap();

        let unknown = StatementSpec {
            predicate: "parallel".to_string(),
            points: Vec::new(),
            value: None,
        };
        assert!(matches!(
            unknown.to_statement(&state),
            Err(DdarError::Load(LoadError::UnknownPredicate(_)))
        ));

        let mut partial = problem.clone();
        partial.points[0].y = None;
        assert!(matches!(
            partial.to_state(),
            Err(DdarError::Load(LoadError::PartialCoordinates(_)))
        ));

        let mut bad_op = problem;
        bad_op.points[2].construction = Some(ConstructionSpec {
            op: "reflection".to_string(),
            args: Vec::new(),
        });
        assert!(matches!(
            bad_op.to_state(),
            Err(DdarError::Load(LoadError::UnknownConstruction(_)))
        ));
    }

    #[test]
    fn test_load_problems_skips_broken_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("good.json"), MIDPOINT).unwrap();
        fs::write(dir.path().join("broken.json"), "{").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let problems = load_problems(dir.path()).unwrap();
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].id, "midpoint_001");

        assert!(matches!(
            load_problem(dir.path().join("broken.json")),
            Err(LoadError::Parse { .. })
        ));
        assert!(matches!(
            load_problems(dir.path().join("good.json")),
            Err(LoadError::NotADirectory(_))
        ));
    }
}
