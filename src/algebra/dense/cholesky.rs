#![allow(non_snake_case)]

use crate::algebra::{FloatT, Matrix};

/// Diagonally pivoted Cholesky factorization engine for symmetric
/// positive semidefinite blocks.
///
/// Factors `A[p, p] = U'U` for the leading `rank x rank` block, where `p`
/// is the recorded permutation.  Elimination stops at the first pivot
/// below the caller's tolerance, so for an indefinite or rank-deficient
/// input the unfactored tail of `p` identifies the offending directions.
pub(crate) struct PivotedCholeskyEngine<T> {
    /// upper triangular factor (leading `rank` rows valid)
    pub U: Matrix<T>,
    /// diagonal pivot permutation
    pub perm: Vec<usize>,
    /// number of pivots that passed the tolerance
    pub rank: usize,
}

impl<T> PivotedCholeskyEngine<T>
where
    T: FloatT,
{
    pub fn new(n: usize) -> Self {
        Self {
            U: Matrix::<T>::zeros((n, n)),
            perm: (0..n).collect(),
            rank: 0,
        }
    }

    pub fn factor(&mut self, A: &Matrix<T>, tol: T) {
        assert!(A.is_square());
        assert_eq!(A.size(), self.U.size());

        let n = A.nrows();
        let W = &mut self.U;
        W.data_mut().copy_from_slice(A.data());
        for (i, p) in self.perm.iter_mut().enumerate() {
            *p = i;
        }

        self.rank = n;
        for k in 0..n {
            // largest remaining diagonal entry
            let mut p = k;
            for i in (k + 1)..n {
                if W[(i, i)] > W[(p, p)] {
                    p = i;
                }
            }
            if W[(p, p)] < tol {
                self.rank = k;
                break;
            }
            if p != k {
                _swap_symmetric(W, k, p);
                self.perm.swap(k, p);
            }

            let pivot = T::sqrt(W[(k, k)]);
            W[(k, k)] = pivot;
            for j in (k + 1)..n {
                W[(k, j)] = W[(k, j)] / pivot;
            }
            // trailing Schur complement.  The full block is updated so
            // that it stays symmetric and later diagonal swaps remain valid.
            for j in (k + 1)..n {
                let Wkj = W[(k, j)];
                for i in (k + 1)..n {
                    W[(i, j)] = W[(i, j)] - W[(k, i)] * Wkj;
                }
            }
        }

        // zero the subdiagonal and the unfactored tail rows
        for j in 0..n {
            for i in (j + 1)..n {
                W[(i, j)] = T::zero();
            }
        }
        for i in self.rank..n {
            for j in i..n {
                W[(i, j)] = T::zero();
            }
        }
    }
}

// symmetric two-sided row/column swap, acting on the full square storage
fn _swap_symmetric<T: FloatT>(W: &mut Matrix<T>, a: usize, b: usize) {
    let n = W.nrows();
    for j in 0..n {
        let (waj, wbj) = (W[(a, j)], W[(b, j)]);
        W[(a, j)] = wbj;
        W[(b, j)] = waj;
    }
    for i in 0..n {
        let (wia, wib) = (W[(i, a)], W[(i, b)]);
        W[(i, a)] = wib;
        W[(i, b)] = wia;
    }
}
