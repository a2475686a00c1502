#![allow(non_snake_case)]

use asqp::{algebra::*, solver::*};

fn well_posed() -> (Matrix<f64>, Vec<f64>, Matrix<f64>, Vec<f64>, Vec<f64>) {
    let P = Matrix::from(&[[2.0, 0.0], [0.0, 2.0]]);
    let q = vec![1.0, 1.0];
    let A = Matrix::from(&[[1.0, 0.0], [0.0, 1.0]]);
    let b = vec![1.0, 1.0];
    let x0 = vec![0.0, 0.0];
    (P, q, A, b, x0)
}

#[test]
fn test_q_wrong_length() {
    let (P, _q, A, b, x0) = well_posed();
    let q = vec![1.0; 3];
    let out = ActiveSetSolver::new(&P, &q, &A, &b, &x0, DefaultSettings::default());
    assert!(matches!(out, Err(SolverError::DimensionMismatch("q"))));
}

#[test]
fn test_P_not_square() {
    let (_P, q, A, b, x0) = well_posed();
    let P = Matrix::<f64>::zeros((2, 3));
    let out = ActiveSetSolver::new(&P, &q, &A, &b, &x0, DefaultSettings::default());
    assert!(matches!(out, Err(SolverError::DimensionMismatch("P"))));
}

#[test]
fn test_A_wrong_width() {
    let (P, q, _A, b, x0) = well_posed();
    let A = Matrix::<f64>::zeros((2, 3));
    let out = ActiveSetSolver::new(&P, &q, &A, &b, &x0, DefaultSettings::default());
    assert!(matches!(out, Err(SolverError::DimensionMismatch("A"))));
}

#[test]
fn test_b_wrong_length() {
    let (P, q, A, _b, x0) = well_posed();
    let b = vec![1.0; 3];
    let out = ActiveSetSolver::new(&P, &q, &A, &b, &x0, DefaultSettings::default());
    assert!(matches!(out, Err(SolverError::DimensionMismatch("b"))));
}

#[test]
fn test_x0_wrong_length() {
    let (P, q, A, b, _x0) = well_posed();
    let x0 = vec![0.0; 3];
    let out = ActiveSetSolver::new(&P, &q, &A, &b, &x0, DefaultSettings::default());
    assert!(matches!(out, Err(SolverError::DimensionMismatch("x0"))));
}

#[test]
fn test_infeasible_start_rejected() {
    let (P, q, A, b, _x0) = well_posed();
    let x0 = vec![2.0, 0.0]; // violates x <= 1
    let out = ActiveSetSolver::new(&P, &q, &A, &b, &x0, DefaultSettings::default());
    match out {
        Err(SolverError::InfeasibleStartingPoint(v)) => assert!((v - 1.0).abs() < 1e-12),
        _ => panic!("expected infeasibility rejection"),
    }
}

#[test]
fn test_marginally_feasible_start_accepted() {
    // violation within tol_feas is tolerated
    let (P, q, A, b, _x0) = well_posed();
    let x0 = vec![1.0 + 1e-10, 0.0];
    assert!(ActiveSetSolver::new(&P, &q, &A, &b, &x0, DefaultSettings::default()).is_ok());
}

#[test]
fn test_settings_builder_rejects_negative_tolerance() {
    let out = DefaultSettingsBuilder::<f64>::default()
        .tol_kkt(-1.0)
        .build();
    assert!(out.is_err());
}
