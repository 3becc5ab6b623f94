//! Demonstration of the IR module functionality
//!
//! Run with: cargo run --example ir_demo

use geo_ddar_core::*;

fn main() -> DdarResult<()> {
    println!("=== geo-ddar IR Demo ===\n");

    // 1. Construction
    println!("1. Triangle with two altitudes:");
    let mut state = GeoState::with_metadata(Metadata::new("orthocenter".to_string()));
    state.declare_point("A", Some(Point2D::new(0.0, 0.0)))?;
    state.declare_point("B", Some(Point2D::new(5.0, 0.0)))?;
    state.declare_point("C", Some(Point2D::new(2.0, 4.0)))?;
    state.foot_of("D", "A", "B", "C")?;
    state.foot_of("E", "B", "A", "C")?;
    state.foot_of("F", "C", "A", "B")?;
    state.intersection_of("H", ("A", "D"), ("B", "E"))?;
    println!("   {} points, {} entities\n", state.points().len(), state.registry.len());

    // 2. Registry structure
    println!("2. Facts visible without search:");
    let on_altitude = state.statement(Predicate::Coll, &["A", "H", "D"], None)?;
    let third = state.statement(Predicate::Coll, &["C", "H", "F"], None)?;
    println!("   {} proved: {}", state.render(&on_altitude), state.is_proved(&on_altitude));
    println!("   {} proved: {}\n", state.render(&third), state.is_proved(&third));

    // 3. Search
    println!("3. Saturation:");
    state.set_goal(third);
    let result = Solver::new(SolverConfig::default())?.run(&mut state)?;
    println!("   outcome: {} after {} level(s)", result.outcome, result.levels_run());
    if let Some(proof) = &result.proof {
        for step in &proof.steps {
            println!("   {step}");
        }
    }

    Ok(())
}
