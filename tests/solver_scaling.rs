#![cfg(feature = "microlp")]

use float_eq::assert_float_eq;
use polylp::{Constraint, DefaultSolver, ModelUpdate, Problem, Sense, SolverAdapter};

const BIG_NUM: usize = 1000; // <- Set this higher to test how polylp and the solvers scale

/// x_i + 1 <= x_{i+1} for every consecutive pair of columns
fn chain(n: usize) -> impl Iterator<Item = Constraint> {
    (0..n - 1).map(|i| Constraint::new([i, i + 1], [1., -1.], Sense::LessEq, -1.).unwrap())
}

#[test]
fn solve_large_problem() {
    let min = -((BIG_NUM / 2) as f64);
    let max = (BIG_NUM / 2 - 1) as f64;
    let mut p = Problem::new(0, BIG_NUM).unwrap();
    p.set_objective(vec![1.; BIG_NUM]);
    p.set_lower_bounds(vec![min; BIG_NUM]);
    p.set_upper_bounds(vec![max; BIG_NUM]);
    for c in chain(BIG_NUM) {
        p.add_constraint(&c).unwrap();
    }
    let mut adapter = SolverAdapter::bind(&DefaultSolver::default(), p).unwrap();
    let sol = adapter.solve().unwrap();
    for i in 0..BIG_NUM {
        assert_float_eq!(sol.value(i), min + i as f64, abs <= 1e-9);
    }
}

#[test]
fn add_10_000_constraints() {
    let n = 10_000;
    let mut p = Problem::new(0, n).unwrap();
    let constraints: Vec<Constraint> = chain(n).collect();
    p.add_constraints(&constraints).unwrap();
    assert_eq!(p.num_rows(), n - 1);
    assert_eq!(p.matrix().nnz(), 2 * (n - 1));
}

#[test]
fn add_and_remove_many_session_rows() {
    let mut p = Problem::new(0, BIG_NUM).unwrap();
    p.set_lower_bounds(vec![0.; BIG_NUM]);
    let mut adapter = SolverAdapter::bind(&DefaultSolver::default(), p).unwrap();
    let constraints: Vec<Constraint> = chain(BIG_NUM).collect();
    adapter
        .add_constraints(&constraints, ModelUpdate::SessionOnly)
        .unwrap();
    assert_eq!(adapter.num_rows(), BIG_NUM - 1);
    assert_eq!(adapter.problem().num_rows(), 0);
    adapter.remove_last_constraints(BIG_NUM - 1).unwrap();
    assert_eq!(adapter.num_rows(), 0);
}
