use float_eq::assert_float_eq;
use polylp::{
    Constraint, MatrixData, ModelUpdate, ObjectiveDirection, Problem, Sense, SolutionStatus,
    Solver, SolverAdapter,
};

#[cfg(feature = "coin_cbc")]
use polylp::CoinCbc;
#[cfg(feature = "highs")]
use polylp::Highs;
#[cfg(feature = "microlp")]
use polylp::MicroLp;

/// minimise x + 4y + 9z
/// with x + y <= 5, x + z >= 10, x <= 4 and -1 <= y <= 1
fn two_row_problem() -> Problem {
    let mut p = Problem::new(0, 3).unwrap();
    p.set_direction(ObjectiveDirection::Minimisation);
    p.set_objective(vec![1., 4., 9.]);
    p.set_lower_bounds(vec![f64::NEG_INFINITY, -1., f64::NEG_INFINITY]);
    p.set_upper_bounds(vec![4., 1., f64::INFINITY]);
    p.set_matrix(MatrixData::Dense(vec![vec![1., 1., 0.], vec![1., 0., 1.]]))
        .unwrap();
    p.set_rhs(vec![5., 10.]);
    p.set_senses(vec![Sense::LessEq, Sense::GreaterEq]);
    p
}

/// z - y >= 8
fn third_row() -> Constraint {
    Constraint::new([1, 2], [-1., 1.], Sense::GreaterEq, 8.).unwrap()
}

#[allow(dead_code)] // used only with some features
fn generic_incremental_solve<B: Solver>(solver: B) {
    let mut adapter = SolverAdapter::bind(&solver, two_row_problem()).unwrap();
    let solution = adapter.solve().unwrap();
    assert_eq!(solution.status(), SolutionStatus::Optimal);
    assert_float_eq!(solution.value(0), 4., abs <= 1e-6);
    assert_float_eq!(solution.value(1), -1., abs <= 1e-6);
    assert_float_eq!(solution.value(2), 6., abs <= 1e-6);
    assert_float_eq!(solution.objective_value(), 54., abs <= 1e-6);

    adapter
        .add_constraint(&third_row(), ModelUpdate::Mirror)
        .unwrap();
    let solution = adapter.solve().unwrap();
    assert_eq!(solution.status(), SolutionStatus::Optimal);
    assert!(solution.is_feasible());
    assert_float_eq!(solution.value(0), 3., abs <= 1e-6);
    assert_float_eq!(solution.value(1), -1., abs <= 1e-6);
    assert_float_eq!(solution.value(2), 7., abs <= 1e-6);
    assert_float_eq!(solution.objective_value(), 62., abs <= 1e-6);
    assert_eq!(adapter.num_rows(), 3);
    assert_eq!(adapter.problem().num_rows(), 3);
}

#[allow(dead_code)]
fn generic_three_row_solve<B: Solver>(solver: B) {
    let mut p = two_row_problem();
    p.add_constraint(&third_row()).unwrap();
    let mut adapter = SolverAdapter::bind(&solver, p).unwrap();
    let solution = adapter.solve().unwrap();
    assert_eq!(solution.status(), SolutionStatus::Optimal);
    assert_float_eq!(solution.values()[0], 3., abs <= 1e-6);
    assert_float_eq!(solution.values()[2], 7., abs <= 1e-6);
    assert_float_eq!(solution.objective_value(), 62., abs <= 1e-6);
}

#[allow(dead_code)]
fn generic_infeasible<B: Solver>(solver: B) {
    let mut adapter = SolverAdapter::bind(&solver, two_row_problem()).unwrap();
    // x + z >= 10 with x <= 4 and z <= 5
    adapter
        .add_bound_constraint(2, Sense::LessEq, 5., ModelUpdate::Mirror)
        .unwrap();
    let solution = adapter.solve().unwrap();
    assert_eq!(solution.status(), SolutionStatus::Infeasible);
    assert!(!solution.is_feasible());
    adapter.remove_last_constraint().unwrap();
    let solution = adapter.solve().unwrap();
    assert_float_eq!(solution.objective_value(), 54., abs <= 1e-6);
}

#[cfg(feature = "microlp")]
#[test]
fn incremental_solve_microlp() {
    generic_incremental_solve(MicroLp);
}

#[cfg(feature = "microlp")]
#[test]
fn three_row_solve_microlp() {
    generic_three_row_solve(MicroLp);
}

#[cfg(feature = "microlp")]
#[test]
fn infeasible_microlp() {
    generic_infeasible(MicroLp);
}

#[cfg(feature = "highs")]
#[test]
fn incremental_solve_highs() {
    generic_incremental_solve(Highs::default());
}

#[cfg(feature = "highs")]
#[test]
fn infeasible_highs() {
    generic_infeasible(Highs::default());
}

#[cfg(feature = "coin_cbc")]
#[test]
fn incremental_solve_coin_cbc() {
    generic_incremental_solve(CoinCbc::default());
}

#[cfg(feature = "coin_cbc")]
#[test]
fn infeasible_coin_cbc() {
    generic_infeasible(CoinCbc::default());
}
