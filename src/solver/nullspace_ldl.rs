#![allow(non_snake_case)]
use super::UpdatableQR;
use crate::algebra::*;

/// `U'DU` factorization of the Hessian projected onto the nullspace of
/// the working constraints, updatable in lockstep with the paired
/// [`UpdatableQR`](crate::solver::UpdatableQR) that owns the basis.
///
/// The factored basis `Z` consists of the trailing columns of `Q2` taken
/// in reverse order, so that activating a constraint deletes the trailing
/// row/column of `U` instead of the leading one.  `D` holds only signs;
/// pivot magnitudes are absorbed into `U`.
///
/// When the projected Hessian block is not positive definite, the
/// offending directions are masked as *artificial constraints*: they are
/// excluded from `Z` (they occupy the leading columns of `Q2`) and the
/// factorization covers only the positive definite remainder.  At most
/// the trailing diagonal sign may be negative, marking a single
/// negative-curvature (or curvature-deficient) direction for the outer
/// loop to explore as a ray.
#[derive(Debug)]
pub struct NullspaceLDL<T> {
    qr: UpdatableQR<T>,
    P: Matrix<T>,
    U: Matrix<T>,
    d: Vec<T>,
    m: usize,
    artificial_constraints: usize,
    indefinite_tolerance: T,
}

impl<T> NullspaceLDL<T>
where
    T: FloatT,
{
    /// Build from the Hessian and a QR factorization of the initial
    /// working constraints.  `P` is symmetrized on entry.
    pub fn new(P: &Matrix<T>, qr: UpdatableQR<T>, indefinite_tolerance: T) -> Self {
        let n = qr.dim();
        assert!(P.is_square() && P.nrows() == n);

        let mut Psym = P.clone();
        Psym.symmetric_part();

        let mut ldl = Self {
            qr,
            P: Psym,
            U: Matrix::zeros((n, n)),
            d: vec![T::zero(); n],
            m: 0,
            artificial_constraints: 0,
            indefinite_tolerance,
        };
        ldl.factor_reduced_block();
        ldl
    }

    /// dimension of the factored nullspace block
    pub fn dim(&self) -> usize {
        self.m
    }

    pub fn artificial_constraints(&self) -> usize {
        self.artificial_constraints
    }

    pub fn qr(&self) -> &UpdatableQR<T> {
        &self.qr
    }

    /// Sign of the trailing diagonal entry of `D`; positive when the
    /// factored block is positive definite (or empty).
    pub fn trailing_sign(&self) -> T {
        if self.m == 0 {
            T::one()
        } else {
            self.d[self.m - 1]
        }
    }

    /// column `j` of the factored basis `Z` (reversed trailing block of `Q2`)
    pub fn z_col(&self, j: usize) -> &[T] {
        assert!(j < self.m);
        let k = self.qr.nullspace_dim();
        self.qr.q2_col(k - 1 - j)
    }

    /// `out = Z'v`
    pub fn z_t_mul(&self, out: &mut [T], v: &[T]) {
        assert_eq!(out.len(), self.m);
        for (j, o) in out.iter_mut().enumerate() {
            *o = self.z_col(j).dot(v);
        }
    }

    /// `out = Z*y`
    pub fn z_mul(&self, out: &mut [T], y: &[T]) {
        assert_eq!(y.len(), self.m);
        out.set(T::zero());
        for (j, &yj) in y.iter().enumerate() {
            if yj == T::zero() {
                continue;
            }
            for (o, &z) in out.iter_mut().zip(self.z_col(j)) {
                *o += yj * z;
            }
        }
    }

    /// Solve `U'DU y = -gz` for the projected Newton direction in the
    /// factored basis coordinates.
    pub fn solve_newton(&self, gz: &[T]) -> Vec<T> {
        let m = self.m;
        assert_eq!(gz.len(), m);

        // forward solve U'w = gz
        let mut w = gz.to_vec();
        for i in 0..m {
            for j in 0..i {
                let wj = w[j];
                w[i] = w[i] - self.U[(j, i)] * wj;
            }
            w[i] = w[i] / self.U[(i, i)];
        }
        // scale by D^{-1} (signs only)
        for (wi, &di) in w.iter_mut().zip(self.d.iter()) {
            *wi = *wi * di;
        }
        // back solve Uy = w, negated
        let mut y = self.back_solve(&w);
        y.negate();
        y
    }

    /// Direction of (at most unit) negative curvature in the factored
    /// basis coordinates: `U^{-1} e_last`.
    pub fn curvature_dir(&self) -> Vec<T> {
        let m = self.m;
        assert!(m > 0);
        let mut e = vec![T::zero(); m];
        e[m - 1] = T::one();
        self.back_solve(&e)
    }

    fn back_solve(&self, rhs: &[T]) -> Vec<T> {
        let m = self.m;
        let mut y = rhs.to_vec();
        for i in (0..m).rev() {
            for j in (i + 1)..m {
                let yj = y[j];
                y[i] = y[i] - self.U[(i, j)] * yj;
            }
            y[i] = y[i] / self.U[(i, i)];
        }
        y
    }

    /// Activate the constraint with gradient `a`.
    ///
    /// The paired QR gains a column; the factored block shrinks by one.
    /// The rotation cascade reported by the QR is replayed onto the
    /// columns of `U`, the resulting Hessenberg profile is reduced back
    /// to triangular form by row rotations over the positive block, and
    /// the trailing column and sign are then recomputed directly from
    /// the Hessian.
    pub fn add_constraint(&mut self, a: &[T]) {
        if self.artificial_constraints > 0 {
            // masked directions participate in the basis rotation, so the
            // split into factored and masked parts is no longer valid.
            // Refactor the whole reduced block.
            self.qr.add_column(a);
            self.factor_reduced_block();
            return;
        }

        let k = self.m;
        let a2 = self.qr.add_column(a);
        debug_assert_eq!(a2.len(), k);

        if k <= 1 {
            self.m = 0;
            self.clear_stale(0);
            return;
        }

        // replay the QR's cascade on the columns of U.  Q2 column pairs
        // (i-1, i) are Z column pairs (k-1-i+1, k-1-i).
        let mut x = a2;
        for i in (1..k).rev() {
            let (G, r) = GivensRotation::new(x[i - 1], x[i]);
            x[i - 1] = r;
            x[i] = T::zero();
            let j = k - 1 - i;
            G.rotate_cols(&mut self.U, j + 1, j);
        }

        // U is now upper Hessenberg on the surviving k-1 columns.
        // Row rotations clear the subdiagonal of all but the last column;
        // those rows all carry positive signs, so D is preserved.
        for j in 0..k.saturating_sub(2) {
            let (G, r) = GivensRotation::new(self.U[(j, j)], self.U[(j + 1, j)]);
            self.U[(j, j)] = r;
            self.U[(j + 1, j)] = T::zero();
            G.rotate_rows(&mut self.U, j, j + 1, j + 1, k - 1);
        }

        self.m = k - 1;
        self.recompute_trailing_column();
        self.clear_stale(self.m);
    }

    /// Release one constraint.
    ///
    /// If artificial constraints remain one of those is spent instead of
    /// the working constraint at `idx` (which is ignored); otherwise the
    /// paired QR drops column `idx`.  Returns `true` when a working
    /// constraint was actually removed.
    ///
    /// Releasing while the factored block is not positive semidefinite
    /// would corrupt the factorization and is a contract violation.
    pub fn remove_constraint(&mut self, idx: usize) -> bool {
        assert!(
            self.trailing_sign() > T::zero(),
            "constraint removal requires a positive semidefinite reduced Hessian"
        );

        let removed_working;
        if self.artificial_constraints > 0 {
            self.artificial_constraints -= 1;
            removed_working = false;
        } else {
            self.qr.remove_column(idx);
            removed_working = true;
        }

        self.m += 1;
        self.recompute_trailing_column();
        removed_working
    }

    /// Recompute column `m-1` of `U` and the trailing sign of `D`
    /// directly from the Hessian and the current basis.
    fn recompute_trailing_column(&mut self) {
        let m = self.m;
        let n = self.qr.dim();
        let last = m - 1;

        // s = Z' P z_last
        let mut Pz = vec![T::zero(); n];
        self.P
            .gemv(&mut Pz, MatrixShape::N, self.z_col(last), T::one(), T::zero());
        let mut s = vec![T::zero(); m];
        self.z_t_mul(&mut s, &Pz);

        // forward solve U1'w = s[..last], then u = D1^{-1} w
        let mut u = s[..last].to_vec();
        for i in 0..last {
            for j in 0..i {
                let uj = u[j];
                u[i] = u[i] - self.U[(j, i)] * uj;
            }
            u[i] = u[i] / self.U[(i, i)];
        }
        for (ui, &di) in u.iter_mut().zip(self.d.iter()) {
            *ui = *ui * di;
        }

        // pivot, floored in magnitude at the indefiniteness tolerance.
        // A pivot without significant magnitude of either sign marks the
        // new direction as curvature-deficient: the outer loop treats it
        // like negative curvature and explores it as a ray.
        let mut delta = s[last];
        for (&ui, &di) in u.iter().zip(self.d.iter()) {
            delta = delta - di * ui * ui;
        }
        let tol = self.indefinite_tolerance;
        let (sign, pivot) = if delta >= tol {
            (T::one(), delta)
        } else if delta <= -tol {
            (-T::one(), -delta)
        } else {
            (-T::one(), tol)
        };

        for (i, &ui) in u.iter().enumerate() {
            self.U[(i, last)] = ui;
        }
        self.U[(last, last)] = T::sqrt(pivot);
        for i in m..n {
            self.U[(i, last)] = T::zero();
        }
        self.d[last] = sign;
    }

    /// Factor the projected Hessian block from scratch with a pivoted
    /// Cholesky, masking any non-positive-definite tail as artificial
    /// constraints.  `Q2` is reordered so the masked directions lead.
    fn factor_reduced_block(&mut self) {
        let k = self.qr.nullspace_dim();
        let n = self.qr.dim();
        self.U.data_mut().set(T::zero());
        self.d.as_mut_slice().set(T::zero());

        if k == 0 {
            self.m = 0;
            self.artificial_constraints = 0;
            return;
        }

        // W = Z'PZ over the full nullspace, in reversed basis order
        let mut W = Matrix::<T>::zeros((k, k));
        let mut Pz = vec![T::zero(); n];
        for j in 0..k {
            let zj = self.qr.q2_col(k - 1 - j);
            self.P.gemv(&mut Pz, MatrixShape::N, zj, T::one(), T::zero());
            for i in 0..k {
                W[(i, j)] = self.qr.q2_col(k - 1 - i).dot(&Pz);
            }
        }
        W.symmetric_part();

        let mut chol = PivotedCholeskyEngine::<T>::new(k);
        chol.factor(&W, self.indefinite_tolerance);

        let r = chol.rank;
        self.m = r;
        self.artificial_constraints = k - r;

        // realize the pivot ordering on the stored basis: factored
        // directions keep their reversed-order placement at the back of
        // Q2, masked directions move to the front.
        let mut q2perm = vec![0usize; k];
        for (j, &pj) in chol.perm.iter().enumerate() {
            // z index j is Q2 column k-1-j
            q2perm[k - 1 - j] = k - 1 - pj;
        }
        self.qr.permute_q2_cols(&q2perm);

        for j in 0..r {
            for i in 0..=j {
                self.U[(i, j)] = chol.U[(i, j)];
            }
            self.d[j] = T::one();
        }
    }

    // zero any stale storage beyond the live block
    fn clear_stale(&mut self, m: usize) {
        let n = self.qr.dim();
        for j in m..n {
            self.U.col_slice_mut(j).set(T::zero());
        }
        for i in m..n {
            self.d[i] = T::zero();
        }
    }
}

// ---------------------------------
// tests
// ---------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // || U'DU - Z'PZ || over the factored block
    fn factorization_residual(F: &NullspaceLDL<f64>) -> f64 {
        let m = F.dim();
        let mut res = 0.0f64;
        for i in 0..m {
            for j in 0..m {
                let mut udu = 0.0;
                for k in 0..m {
                    udu += F.U[(k, i)] * F.d[k] * F.U[(k, j)];
                }
                let zpz = F.P.quad_form(F.z_col(i), F.z_col(j));
                res = res.max((udu - zpz).abs());
            }
        }
        res
    }

    fn setup(P: &Matrix<f64>, C: &Matrix<f64>) -> NullspaceLDL<f64> {
        let qr = UpdatableQR::from_matrix(C);
        NullspaceLDL::new(P, qr, 1e-12)
    }

    #[test]
    fn test_construction_positive_definite() {
        let P = Matrix::from(&[
            [4.0, 1.0, 0.0, 0.0],
            [1.0, 3.0, 0.5, 0.0],
            [0.0, 0.5, 2.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ]);
        let C = Matrix::from(&[[1.0], [0.0], [1.0], [0.0]]);
        let F = setup(&P, &C);

        assert_eq!(F.dim(), 3);
        assert_eq!(F.artificial_constraints(), 0);
        assert!(factorization_residual(&F) < 1e-10);
        assert!(F.trailing_sign() > 0.0);
    }

    #[test]
    fn test_construction_indefinite_masks_tail() {
        // one strongly negative eigendirection in the nullspace
        let P = Matrix::from(&[[1.0, 0.0, 0.0], [0.0, -2.0, 0.0], [0.0, 0.0, 3.0]]);
        let qr = UpdatableQR::new(3);
        let F = NullspaceLDL::new(&P, qr, 1e-12);

        assert_eq!(F.dim() + F.artificial_constraints(), 3);
        assert_eq!(F.artificial_constraints(), 1);
        assert!(factorization_residual(&F) < 1e-10);
    }

    #[test]
    fn test_add_remove_roundtrip() {
        let P = Matrix::from(&[
            [4.0, 1.0, 0.0, 0.5],
            [1.0, 3.0, 0.5, 0.0],
            [0.0, 0.5, 2.0, 0.2],
            [0.5, 0.0, 0.2, 1.0],
        ]);
        let C = Matrix::from(&[[1.0], [0.0], [1.0], [0.0]]);
        let mut F = setup(&P, &C);

        let m0 = F.dim();
        let d0 = F.d.clone();

        // projector onto span(Z), which must survive the round trip
        let projector = |F: &NullspaceLDL<f64>| {
            let mut Pr = Matrix::<f64>::zeros((4, 4));
            for j in 0..F.dim() {
                let z = F.z_col(j);
                for r in 0..4 {
                    for c in 0..4 {
                        Pr[(r, c)] += z[r] * z[c];
                    }
                }
            }
            Pr
        };
        let proj0 = projector(&F);

        let a = [0.0, 1.0, -1.0, 0.5];
        F.add_constraint(&a);
        assert_eq!(F.dim(), m0 - 1);
        assert!(factorization_residual(&F) < 1e-10);

        // removing the just-added constraint restores the pre-add state:
        // the block dimension, the diagonal signs and the factored
        // subspace (the basis itself may differ by a rotation)
        F.remove_constraint(1);
        assert_eq!(F.dim(), m0);
        assert!(factorization_residual(&F) < 1e-10);
        assert_eq!(F.d[..m0], d0[..m0]);
        let proj1 = projector(&F);
        assert!(proj0.data().norm_inf_diff(proj1.data()) < 1e-10);
    }

    #[test]
    fn test_add_then_factorization_tracks_hessian() {
        let P = Matrix::from(&[
            [2.0, 0.3, 0.0, 0.0],
            [0.3, 2.0, 0.3, 0.0],
            [0.0, 0.3, 2.0, 0.3],
            [0.0, 0.0, 0.3, 2.0],
        ]);
        let qr = UpdatableQR::new(4);
        let mut F = NullspaceLDL::new(&P, qr, 1e-12);
        assert_eq!(F.dim(), 4);

        for a in [
            [1.0, 1.0, 0.0, 0.0],
            [0.0, 1.0, -1.0, 0.0],
            [0.0, 0.0, 1.0, 2.0],
        ] {
            F.add_constraint(&a);
            assert!(factorization_residual(&F) < 1e-9);
        }
        assert_eq!(F.dim(), 1);

        F.remove_constraint(2);
        F.remove_constraint(0);
        assert!(factorization_residual(&F) < 1e-9);
        assert_eq!(F.dim(), 3);
    }

    #[test]
    fn test_newton_solve_matches_projected_system() {
        let P = Matrix::from(&[[5.0, 1.0, 0.0], [1.0, 4.0, 1.0], [0.0, 1.0, 3.0]]);
        let C = Matrix::from(&[[1.0], [1.0], [1.0]]);
        let F = setup(&P, &C);
        let m = F.dim();

        let g = [1.0, -2.0, 0.5];
        let mut gz = vec![0.0; m];
        F.z_t_mul(&mut gz, &g);

        let y = F.solve_newton(&gz);

        // (Z'PZ) y = -gz
        for i in 0..m {
            let mut v = 0.0;
            for j in 0..m {
                v += F.P.quad_form(F.z_col(i), F.z_col(j)) * y[j];
            }
            assert!((v + gz[i]).abs() < 1e-10);
        }
    }

    #[test]
    fn test_negative_curvature_direction() {
        // nullspace contains a -1 eigendirection after one constraint
        let P = Matrix::from(&[[2.0, 0.0, 0.0], [0.0, 2.0, 0.0], [0.0, 0.0, -1.0]]);
        let qr = UpdatableQR::new(3);
        let mut F = NullspaceLDL::new(&P, qr, 1e-12);
        assert_eq!(F.artificial_constraints(), 1);

        // spending the artificial constraint exposes the negative direction
        F.remove_constraint(0);
        assert_eq!(F.artificial_constraints(), 0);
        assert!(F.trailing_sign() < 0.0);

        let y = F.curvature_dir();
        let mut dir = vec![0.0; 3];
        F.z_mul(&mut dir, &y);
        let curv = F.P.quad_form(&dir, &dir);
        assert!(curv < 0.0);
    }

    #[test]
    #[should_panic]
    fn test_remove_with_negative_curvature_asserts() {
        let P = Matrix::from(&[[2.0, 0.0, 0.0], [0.0, 2.0, 0.0], [0.0, 0.0, -1.0]]);
        let qr = UpdatableQR::new(3);
        let mut F = NullspaceLDL::new(&P, qr, 1e-12);
        F.remove_constraint(0); // spends the artificial constraint
        F.remove_constraint(0); // trailing sign is negative: contract violation
    }
}
