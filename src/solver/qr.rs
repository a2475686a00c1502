#![allow(non_snake_case)]
use crate::algebra::*;

/// QR factorization of the (transposed) active constraint matrix,
/// updatable one column at a time.
///
/// Stores an orthogonal `Q` and an upper triangular `R` with
/// `Q1 * R1 = C`, where `C` is the n x m matrix whose columns are the
/// gradients of the working constraints, `Q1` is the first `m` columns
/// of `Q` (range basis) and `Q2` the remaining `n - m` columns
/// (nullspace basis).  Both buffers are allocated once at capacity
/// n x n; `m` is the live extent.
///
/// Columns are appended or deleted with Givens rotation cascades in
/// O(n(n-m)) and O(n^2) respectively.  Orthogonality is not re-established
/// after repeated updates.
#[derive(Debug, Clone)]
pub struct UpdatableQR<T> {
    Q: Matrix<T>,
    R: Matrix<T>,
    n: usize,
    m: usize,
}

impl<T> UpdatableQR<T>
where
    T: FloatT,
{
    /// Factorization with an empty active set: `Q = I`, `R = 0`.
    pub fn new(n: usize) -> Self {
        Self {
            Q: Matrix::identity(n),
            R: Matrix::zeros((n, n)),
            n,
            m: 0,
        }
    }

    /// Factorization of an n x k matrix of constraint gradients, built
    /// by k successive column insertions.  Panics if k > n.
    pub fn from_matrix(C: &Matrix<T>) -> Self {
        let (n, k) = C.size();
        assert!(k <= n, "more active constraints than variables");

        let mut qr = Self::new(n);
        for j in 0..k {
            qr.add_column(C.col_slice(j));
        }
        qr
    }

    pub fn dim(&self) -> usize {
        self.n
    }

    /// number of columns in the factored matrix
    pub fn ncols(&self) -> usize {
        self.m
    }

    /// dimension of the nullspace basis `Q2`
    pub fn nullspace_dim(&self) -> usize {
        self.n - self.m
    }

    pub fn q1_col(&self, j: usize) -> &[T] {
        assert!(j < self.m);
        self.Q.col_slice(j)
    }

    pub fn q2_col(&self, j: usize) -> &[T] {
        assert!(j < self.n - self.m);
        self.Q.col_slice(self.m + j)
    }

    /// `out = Q1'v`
    pub fn q1_t_mul(&self, out: &mut [T], v: &[T]) {
        assert_eq!(out.len(), self.m);
        for (j, o) in out.iter_mut().enumerate() {
            *o = self.q1_col(j).dot(v);
        }
    }

    /// `out = Q2'v`
    pub fn q2_t_mul(&self, out: &mut [T], v: &[T]) {
        assert_eq!(out.len(), self.n - self.m);
        for (j, o) in out.iter_mut().enumerate() {
            *o = self.q2_col(j).dot(v);
        }
    }

    /// Append the column `a` to the factored matrix.
    ///
    /// Returns the pre-rotation projection `a2 = Q2'a`, which the paired
    /// Hessian factorization consumes to replay the same rotation cascade.
    pub fn add_column(&mut self, a: &[T]) -> Vec<T> {
        let a2 = self.project_to_nullspace(a);
        self.add_column_inner(a, &a2);
        a2
    }

    /// Append `a` only if it is independent of the current columns:
    /// the out-of-span residual must satisfy `||Q2'a|| > tol`.
    /// Returns the projection on success and `None` otherwise, leaving
    /// the factorization untouched on rejection.
    pub fn try_add_column(&mut self, a: &[T], tol: T) -> Option<Vec<T>> {
        if self.m == self.n {
            return None;
        }
        let a2 = self.project_to_nullspace(a);
        if a2.norm() <= tol {
            return None;
        }
        self.add_column_inner(a, &a2);
        Some(a2)
    }

    fn project_to_nullspace(&self, a: &[T]) -> Vec<T> {
        assert!(self.m < self.n, "factored matrix is already square");
        assert_eq!(a.len(), self.n);
        let mut a2 = vec![T::zero(); self.n - self.m];
        self.q2_t_mul(&mut a2, a);
        a2
    }

    fn add_column_inner(&mut self, a: &[T], a2: &[T]) {
        let (n, m) = (self.n, self.m);
        let k = n - m;

        // a1 goes into the new column of R above the diagonal
        for j in 0..m {
            self.R[(j, m)] = self.q1_col(j).dot(a);
        }

        // reduce Q2'a to a single leading nonzero, rotating the columns
        // of Q2 in lockstep so that the leading rotated column becomes
        // the new member of the range basis
        let mut x = a2.to_vec();
        for i in (1..k).rev() {
            let (G, r) = GivensRotation::new(x[i - 1], x[i]);
            x[i - 1] = r;
            x[i] = T::zero();
            G.rotate_cols(&mut self.Q, m + i - 1, m + i);
        }

        self.R[(m, m)] = x[0];
        self.m += 1;
    }

    /// Delete column `idx` from the factored matrix.
    pub fn remove_column(&mut self, idx: usize) {
        let m = self.m;
        assert!(idx < m);

        // The columns right of idx drop one position; a forward cascade
        // re-establishes triangularity, with Q rotated in lockstep.
        for j in (idx + 1)..m {
            let (G, r) = GivensRotation::new(self.R[(j - 1, j)], self.R[(j, j)]);
            self.R[(j - 1, j)] = r;
            self.R[(j, j)] = T::zero();
            G.rotate_rows(&mut self.R, j - 1, j, j + 1, m);
            G.rotate_cols(&mut self.Q, j - 1, j);
        }

        // shift the trailing columns of R left and vacate the last one
        for j in (idx + 1)..m {
            for i in 0..j {
                self.R[(i, j - 1)] = self.R[(i, j)];
            }
        }
        for i in 0..m {
            self.R[(i, m - 1)] = T::zero();
        }

        self.m -= 1;
    }

    /// Back-substitution solve of `R1 y = rhs`.
    pub fn r1_solve(&self, rhs: &[T]) -> Vec<T> {
        let m = self.m;
        assert_eq!(rhs.len(), m);

        let mut y = rhs.to_vec();
        for i in (0..m).rev() {
            for j in (i + 1)..m {
                let yj = y[j];
                y[i] = y[i] - self.R[(i, j)] * yj;
            }
            y[i] = y[i] / self.R[(i, i)];
        }
        y
    }

    /// Reorder the columns of `Q2` in place: new column `j` is the old
    /// column `perm[j]`.  Used by the Hessian factorization when the
    /// pivoted construction reorders the nullspace basis.
    pub(crate) fn permute_q2_cols(&mut self, perm: &[usize]) {
        let k = self.n - self.m;
        assert_eq!(perm.len(), k);

        let mut tmp = Matrix::<T>::zeros((self.n, k));
        for j in 0..k {
            tmp.col_slice_mut(j).copy_from(self.q2_col(perm[j]));
        }
        for j in 0..k {
            let col = self.m + j;
            self.Q.col_slice_mut(col).copy_from(tmp.col_slice(j));
        }
    }
}

// ---------------------------------
// tests
// ---------------------------------
