//! Behavioural scenarios across registry, proof graph, tables and search

use geo_ddar_core::algebra::TableKind;
use geo_ddar_core::geometry::justify;
use geo_ddar_core::*;
use num_rational::Rational64;

fn state_with(points: &[(&str, f64, f64)]) -> GeoState {
    let mut state = GeoState::new();
    for (name, x, y) in points {
        state.declare_point(name, Some(Point2D::new(*x, *y))).unwrap();
    }
    state
}

fn premise(state: &mut GeoState, predicate: Predicate, names: &[&str]) -> Statement {
    let s = state.statement(predicate, names, None).unwrap();
    state.assert_premise(s.clone()).unwrap();
    s
}

#[test]
fn test_orthocenter_proved_before_run() {
    let mut state = state_with(&[("A", 0.0, 0.0), ("B", 5.0, 0.0), ("C", 2.0, 4.0)]);
    state.foot_of("D", "A", "B", "C").unwrap();
    state.foot_of("E", "B", "A", "C").unwrap();
    state.foot_of("F", "C", "A", "B").unwrap();
    state.intersection_of("H", ("A", "D"), ("B", "E")).unwrap();

    let goal = state.statement(Predicate::Coll, &["A", "H", "D"], None).unwrap();
    assert!(state.is_proved(&goal));

    // the third altitude passes through H only numerically
    let third = state.statement(Predicate::Coll, &["C", "H", "F"], None).unwrap();
    assert_eq!(state.check_numeric(&third), Some(true));
}

#[test]
fn test_rconst_orientation_shares_one_row() {
    let mut state = state_with(&[("A", 0.0, 0.0), ("B", 6.0, 0.0), ("M", 3.0, 0.0)]);
    let half = state
        .statement(Predicate::RConst, &["M", "A", "A", "B"], Some(Rational64::new(1, 2)))
        .unwrap();
    let double = state
        .statement(Predicate::RConst, &["A", "B", "A", "M"], Some(Rational64::from_integer(2)))
        .unwrap();
    assert_eq!(half, double);

    state.assert_premise(half).unwrap();
    let rows = state.algebra.table(TableKind::Ratio).num_rows();
    assert!(state.is_proved(&double));
    assert!(!state.assert_premise(double).unwrap());
    assert_eq!(state.algebra.table(TableKind::Ratio).num_rows(), rows);
}

#[test]
fn test_first_proof_wins() {
    let mut state = state_with(&[("A", 0.0, 0.0), ("B", 1.0, 0.0), ("C", 0.0, 1.0), ("D", 1.0, 1.0)]);
    let cong = premise(&mut state, Predicate::Cong, &["A", "B", "C", "D"]);

    let later = Dependency::new(cong.clone(), Reason::Rule("other".to_string()), Vec::new(), 3);
    assert_eq!(state.commit(later).unwrap(), None);
    assert_eq!(state.proofs.why(&cong).unwrap().reason, Reason::Premise);
}

#[test]
fn test_cyclic_alternatives_terminate() {
    let mut state = state_with(&[("A", 0.0, 0.0), ("B", 2.0, 0.0), ("C", 0.0, 1.0), ("D", 2.0, 1.0)]);
    let para = premise(&mut state, Predicate::Para, &["A", "B", "C", "D"]);
    let cong = state.statement(Predicate::Cong, &["A", "C", "B", "D"], None).unwrap();

    let forward = Dependency::new(cong.clone(), Reason::Rule("r1".to_string()), vec![para.clone()], 1);
    state.commit(forward).unwrap();
    // a loop back: para from cong
    let back = Dependency::new(para.clone(), Reason::Rule("r2".to_string()), vec![cong.clone()], 2);
    state.commit(back).unwrap();

    let ids = state.minimal_proof(&[cong]).unwrap();
    assert_eq!(ids.len(), 2);
    assert!(ids.iter().any(|id| state.proofs.dependency(*id).reason == Reason::Premise));
}

#[test]
fn test_angle_chase_certificate_is_supported() {
    let mut state = state_with(&[
        ("A", 0.0, 0.0),
        ("B", 2.0, 0.0),
        ("C", 1.0, -1.0),
        ("D", 1.0, 3.0),
        ("E", 0.0, 5.0),
        ("F", 4.0, 5.0),
        ("G", 3.0, -2.0),
        ("K", 3.0, 7.0),
    ]);
    premise(&mut state, Predicate::Perp, &["A", "B", "C", "D"]);
    premise(&mut state, Predicate::Para, &["C", "D", "G", "K"]);
    premise(&mut state, Predicate::Perp, &["G", "K", "E", "F"]);

    let goal = state.statement(Predicate::Para, &["A", "B", "E", "F"], None).unwrap();
    assert!(state.entailed(&goal));

    let j = justify(&state, &goal).unwrap();
    assert!(!j.premises.is_empty());
    for p in &j.premises {
        assert!(state.is_proved(p), "{} is not proved", state.render(p));
        assert_eq!(state.check_numeric(p), Some(true));
    }
}

#[test]
fn test_saturation_terminates_on_unreachable_goal() {
    let mut state = state_with(&[("A", 0.0, 0.0), ("B", 4.0, 0.0), ("C", 1.0, 3.0)]);
    state.midpoint_of("M", "A", "B").unwrap();
    state.midpoint_of("N", "A", "C").unwrap();
    let goal = state.statement(Predicate::Cong, &["A", "B", "A", "C"], None).unwrap();
    state.set_goal(goal);

    let config = SolverConfig {
        max_levels: 10,
        ..SolverConfig::default()
    };
    let result = Solver::new(config).unwrap().run(&mut state).unwrap();

    assert_ne!(result.outcome, Outcome::Solved);
    assert!(result.levels_run() <= 10);
    assert!(result.proof.is_none());
    // committed facts survive the failed run
    let midline = state.statement(Predicate::Para, &["M", "N", "B", "C"], None).unwrap();
    assert!(state.is_proved(&midline));
}

#[test]
fn test_run_convenience_wrapper() {
    let mut state = state_with(&[
        ("O", 0.0, 0.0),
        ("A", 5.0, 0.0),
        ("B", 3.0, 4.0),
        ("C", -4.0, 3.0),
        ("D", 0.0, -5.0),
    ]);
    premise(&mut state, Predicate::Cong, &["O", "A", "O", "B"]);
    premise(&mut state, Predicate::Cong, &["O", "B", "O", "C"]);
    premise(&mut state, Predicate::Cong, &["O", "C", "O", "D"]);
    let goal = state.statement(Predicate::Cyclic, &["A", "B", "C", "D"], None).unwrap();
    state.set_goal(goal);

    let result = state.run(5, std::time::Duration::from_secs(30)).unwrap();
    assert_eq!(result.outcome, Outcome::Solved);
    assert!(state.goal_proved());
}
