#![allow(non_snake_case)]
use crate::algebra::{FloatT, Matrix, MatrixMath, MatrixShape, VectorMath};

impl<T> MatrixMath for Matrix<T>
where
    T: FloatT,
{
    type T = T;

    // implements y = a*op(A)*x + b*y
    fn gemv(&self, y: &mut [T], trans: MatrixShape, x: &[T], a: T, b: T) {
        match trans {
            MatrixShape::N => _gemv_N(self, y, x, a, b),
            MatrixShape::T => _gemv_T(self, y, x, a, b),
        }
    }

    fn quad_form(&self, y: &[T], x: &[T]) -> T {
        assert!(self.is_square());
        assert_eq!(y.len(), self.m);
        assert_eq!(x.len(), self.n);

        let mut out = T::zero();
        for (j, &xj) in x.iter().enumerate() {
            if xj == T::zero() {
                continue;
            }
            out += xj * self.col_slice(j).dot(y);
        }
        out
    }

    fn symmetric_part(&mut self) {
        assert!(self.is_square());
        let half = T::from_f64(0.5).unwrap();
        for j in 0..self.n {
            for i in 0..j {
                let v = half * (self[(i, j)] + self[(j, i)]);
                self[(i, j)] = v;
                self[(j, i)] = v;
            }
        }
    }
}

fn _gemv_N<T: FloatT>(A: &Matrix<T>, y: &mut [T], x: &[T], a: T, b: T) {
    assert_eq!(x.len(), A.n);
    assert_eq!(y.len(), A.m);

    y.scale(b);
    for (j, &xj) in x.iter().enumerate() {
        let axj = a * xj;
        if axj == T::zero() {
            continue;
        }
        for (yi, &Aij) in y.iter_mut().zip(A.col_slice(j)) {
            *yi += axj * Aij;
        }
    }
}

fn _gemv_T<T: FloatT>(A: &Matrix<T>, y: &mut [T], x: &[T], a: T, b: T) {
    assert_eq!(x.len(), A.m);
    assert_eq!(y.len(), A.n);

    for (j, yj) in y.iter_mut().enumerate() {
        *yj = a * A.col_slice(j).dot(x) + b * (*yj);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gemv() {
        let A = Matrix::from(&[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);

        let x = vec![1., 2., 3.];
        let mut y = vec![-1., -2.];
        A.gemv(&mut y, MatrixShape::N, &x, 2.0, 3.0);
        assert_eq!(y, [25.0, 58.0]);

        let x = vec![1., 2.];
        let mut y = vec![-1., -2., -3.];
        A.gemv(&mut y, MatrixShape::T, &x, 2.0, 3.0);
        assert_eq!(y, [15.0, 18.0, 21.0]);
    }

    #[test]
    fn test_quad_form() {
        let P = Matrix::from(&[[2.0, 1.0], [1.0, 3.0]]);
        let x = vec![1.0, -1.0];
        let y = vec![2.0, 1.0];
        // y'Px = [2 1] * [1; 2] ... P*x = (1, -2); y'(1,-2) = 0
        assert_eq!(P.quad_form(&y, &x), 0.0);
    }

    #[test]
    fn test_symmetric_part() {
        let mut A = Matrix::from(&[[1.0, 3.0], [1.0, 2.0]]);
        A.symmetric_part();
        assert_eq!(A[(0, 1)], 2.0);
        assert_eq!(A[(1, 0)], 2.0);
    }
}
