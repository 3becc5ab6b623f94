//! Exporting search results and proofs to JSON

use geo_ddar_core::*;
use std::fs;
use tempfile::TempDir;

fn solved_result() -> SearchResult {
    let problem = load_problem("tests/fixtures/problems/p01_concentric_cyclic.json").unwrap();
    let mut state = problem.to_state().unwrap();
    Solver::new(SolverConfig::default())
        .unwrap()
        .run(&mut state)
        .unwrap()
}

#[test]
fn test_export_search_result() {
    let result = solved_result();
    let dir = TempDir::new().unwrap();
    let output_path = dir.path().join("p01.searchresult.json");

    fs::write(&output_path, serde_json::to_string_pretty(&result).unwrap()).unwrap();
    let json_content = fs::read_to_string(&output_path).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&json_content).unwrap();

    assert_eq!(parsed["outcome"], "solved");
    assert!(parsed["levels"].is_array());
    assert!(parsed["proof"]["steps"].as_array().is_some_and(|s| !s.is_empty()));
}

#[test]
fn test_proof_trace_round_trip() {
    let proof = solved_result().proof.unwrap();
    let json = proof.to_json().unwrap();
    let back = ProofTrace::from_json(&json).unwrap();

    assert_eq!(back.steps, proof.steps);
    assert!(back.solved);
    let stats = back.statistics();
    assert_eq!(stats.num_steps, proof.steps.len());
    assert!(stats.num_premises >= 3);
}
