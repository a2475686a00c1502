#![allow(non_snake_case)]

use asqp::{algebra::*, solver::*};

#[test]
fn test_degenerate_vertex_start() {
    // (0,0) is a degenerate vertex: three constraints are active there
    // but only two are independent.  The redundant row must end up in
    // the ignored set and the solve must still leave the vertex.
    let P = Matrix::from(&[[2.0, 0.0], [0.0, 2.0]]);
    let q = vec![-4.0, -2.0];
    let A = Matrix::from(&[
        [-1.0, 0.0],  // x >= 0
        [0.0, -1.0],  // y >= 0
        [-1.0, -1.0], // x + y >= 0, redundant at the origin
        [1.0, 0.0],   // x <= 1
        [0.0, 1.0],   // y <= 1
    ]);
    let b = vec![0.0, 0.0, 0.0, 1.0, 1.0];
    let x0 = vec![0.0, 0.0];

    let mut solver =
        ActiveSetSolver::new(&P, &q, &A, &b, &x0, DefaultSettings::default()).unwrap();
    solver.solve();

    assert_eq!(solver.solution.status, SolverStatus::Solved);
    assert!(solver.solution.x.dist(&[1.0, 1.0]) <= 1e-8);
}

#[test]
fn test_fully_determined_vertex() {
    // n independent constraints active at the start: the nullspace is
    // empty and progress can only come from releasing constraints
    let P = Matrix::from(&[[2.0, 0.0], [0.0, 2.0]]);
    let q = vec![0.0, 0.0];
    let A = Matrix::from(&[[-1.0, 0.0], [0.0, -1.0]]);
    let b = vec![-1.0, -1.0];
    let x0 = vec![1.0, 1.0];

    let mut solver =
        ActiveSetSolver::new(&P, &q, &A, &b, &x0, DefaultSettings::default()).unwrap();
    solver.solve();

    // both constraints stay active: the vertex is already optimal? no:
    // the unconstrained minimum (0,0) violates x>=1, y>=1, so the
    // vertex (1,1) is optimal with positive multipliers
    assert_eq!(solver.solution.status, SolverStatus::Solved);
    assert!(solver.solution.x.dist(&[1.0, 1.0]) <= 1e-10);
    assert!(solver.solution.λ.iter().all(|&v| v >= -1e-8));
}

#[test]
fn test_indefinite_hessian_local_solution() {
    // saddle objective x² - y²: the solver must track the negative
    // curvature in y and land on the box boundary
    let P = Matrix::from(&[[2.0, 0.0], [0.0, -2.0]]);
    let q = vec![0.0, 0.0];
    let A = Matrix::from(&[
        [1.0, 0.0],
        [-1.0, 0.0],
        [0.0, 1.0],
        [0.0, -1.0],
    ]);
    let b = vec![1.0, 1.0, 1.0, 1.0];
    let x0 = vec![0.5, 0.3];

    let mut solver =
        ActiveSetSolver::new(&P, &q, &A, &b, &x0, DefaultSettings::<f64>::default()).unwrap();
    solver.solve();

    assert_eq!(solver.solution.status, SolverStatus::Solved);
    let x = &solver.solution.x;

    // local minimizer: x at the unconstrained optimum, y on the boundary
    assert!(x[0].abs() <= 1e-8);
    assert!((x[1].abs() - 1.0).abs() <= 1e-8);
    assert!((solver.solution.obj_val + 1.0).abs() <= 1e-8);

    // feasible
    let mut ax = vec![0.0; 4];
    A.gemv(&mut ax, MatrixShape::N, x, 1.0, 0.0);
    for i in 0..4 {
        assert!(ax[i] <= b[i] + 1e-9);
    }
}

#[test]
fn test_indefinite_hessian_from_vertex() {
    // start at a vertex of the box with an indefinite Hessian
    let P = Matrix::from(&[[-2.0, 0.0], [0.0, 2.0]]);
    let q = vec![0.0, 1.0];
    let A = Matrix::from(&[
        [1.0, 0.0],
        [-1.0, 0.0],
        [0.0, 1.0],
        [0.0, -1.0],
    ]);
    let b = vec![2.0, 2.0, 2.0, 2.0];
    let x0 = vec![2.0, 2.0];

    let mut solver =
        ActiveSetSolver::new(&P, &q, &A, &b, &x0, DefaultSettings::<f64>::default()).unwrap();
    solver.solve();

    assert_eq!(solver.solution.status, SolverStatus::Solved);
    let x = &solver.solution.x;

    // any KKT point has x on a ±2 face and y at the minimum of y²+y
    assert!((x[0].abs() - 2.0).abs() <= 1e-8);
    assert!((x[1] + 0.5).abs() <= 1e-8);
}
