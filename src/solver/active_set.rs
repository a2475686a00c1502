#![allow(non_snake_case)]
use super::{DefaultProblemData, DefaultSettings, NullspaceLDL, SolverStatus, UpdatableQR};
use crate::algebra::*;

/// Working-set state machine driving the active-set iteration.
///
/// Owns the iterate, the working/ignored partition of the constraint
/// rows and the paired factorizations.  One call to [`step`](Self::step)
/// performs a full iteration: direction computation, ratio test, iterate
/// update and a working-set toggle or optimality check.
#[derive(Debug)]
pub(crate) struct ActiveSetIterator<T> {
    /// current iterate, feasible at all times
    pub x: Vec<T>,
    /// Lagrange multipliers, one per constraint row
    pub λ: Vec<T>,
    /// rows currently enforced as equalities, in factorization column order
    pub working_set: Vec<usize>,
    /// membership mask for the working set
    in_working: Vec<bool>,
    /// paired nullspace factorizations
    pub ldl: NullspaceLDL<T>,
    pub iterations: u32,
    pub status: SolverStatus,
    pub done: bool,
}

impl<T> ActiveSetIterator<T>
where
    T: FloatT,
{
    /// Build the initial working set from the constraints active at `x0`
    /// and factor it.  Active rows are inserted greedily; rows that are
    /// linearly dependent on those already inserted are left in the
    /// ignored set, which makes an over-determined (degenerate) vertex
    /// start well posed.
    pub fn new(data: &DefaultProblemData<T>, x0: &[T], settings: &DefaultSettings<T>) -> Self {
        let (n, m) = (data.n, data.m);

        let mut qr = UpdatableQR::<T>::new(n);
        let mut working_set = Vec::with_capacity(n);
        let mut in_working = vec![false; m];

        let mut ax = vec![T::zero(); m];
        data.A.gemv(&mut ax, MatrixShape::N, x0, T::one(), T::zero());

        let mut grad_i = vec![T::zero(); n];
        for i in 0..m {
            if data.b[i] - ax[i] > settings.tol_active {
                continue;
            }
            if qr.ncols() == n {
                break;
            }
            for (j, g) in grad_i.iter_mut().enumerate() {
                *g = data.A[(i, j)];
            }
            if qr.try_add_column(&grad_i, settings.tol_active).is_some() {
                working_set.push(i);
                in_working[i] = true;
            }
        }

        let ldl = NullspaceLDL::new(&data.P, qr, settings.indefinite_tolerance);

        Self {
            x: x0.to_vec(),
            λ: vec![T::zero(); m],
            working_set,
            in_working,
            ldl,
            iterations: 0,
            status: SolverStatus::Unsolved,
            done: false,
        }
    }

    /// current objective value ½x'Px + q'x
    pub fn objective(&self, data: &DefaultProblemData<T>) -> T {
        let half: T = (0.5).as_T();
        half * data.P.quad_form(&self.x, &self.x) + data.q.dot(&self.x)
    }

    /// gradient `Px + q`
    pub fn gradient(&self, data: &DefaultProblemData<T>) -> Vec<T> {
        let mut g = data.q.clone();
        data.P
            .gemv(&mut g, MatrixShape::N, &self.x, T::one(), T::one());
        g
    }

    /// worst constraint violation max(Ax - b)
    pub fn infeasibility(&self, data: &DefaultProblemData<T>) -> T {
        let mut ax = vec![T::zero(); data.m];
        data.A
            .gemv(&mut ax, MatrixShape::N, &self.x, T::one(), T::zero());
        ax.axpby(-T::one(), &data.b, T::one());
        ax.maximum()
    }

    /// norm of the gradient projected onto the factored nullspace
    pub fn projected_gradient_norm(&self, data: &DefaultProblemData<T>) -> T {
        let g = self.gradient(data);
        let mut gz = vec![T::zero(); self.ldl.dim()];
        self.ldl.z_t_mul(&mut gz, &g);
        gz.norm()
    }

    /// Perform one active-set iteration.
    pub fn step(&mut self, data: &DefaultProblemData<T>, settings: &DefaultSettings<T>) {
        let n = data.n;
        self.iterations += 1;

        let g = self.gradient(data);

        // search direction and the intrinsic bound on the step
        let mut direction = vec![T::zero(); n];
        let α_min;
        if self.ldl.trailing_sign() > T::zero() {
            // projected Newton step in the factored nullspace.  A
            // vanishing projected gradient produces a zero direction and
            // the iteration falls through to the working-set update.
            let mut gz = vec![T::zero(); self.ldl.dim()];
            self.ldl.z_t_mul(&mut gz, &g);
            if gz.norm() > settings.tol_grad {
                let y = self.ldl.solve_newton(&gz);
                self.ldl.z_mul(&mut direction, &y);
            }
            α_min = T::one();
        } else {
            // negative curvature: follow the indefinite direction as a
            // ray, oriented downhill
            let y = self.ldl.curvature_dir();
            self.ldl.z_mul(&mut direction, &y);
            if g.dot(&direction) > T::zero() {
                direction.negate();
            }
            α_min = T::infinity();
        }

        let (α_constraint, blocking) = self.ratio_test(data, &direction, settings);
        let α_radius = _radius_bound(&self.x, &direction, settings);

        let stepsize = T::min(α_min, T::min(α_constraint, α_radius));

        if !stepsize.is_finite() {
            // unbounded ray: report and return the current iterate
            self.status = SolverStatus::Unbounded;
            self.done = true;
            return;
        }

        self.x.axpby(stepsize, &direction, T::one());

        if α_constraint <= α_min && α_constraint <= α_radius {
            // a blocking constraint binds (ties prefer the constraint)
            let row = blocking.expect("finite constraint step without a row");
            let grad_row: Vec<T> = (0..n).map(|j| data.A[(row, j)]).collect();
            self.ldl.add_constraint(&grad_row);
            self.working_set.push(row);
            self.in_working[row] = true;
        } else if self.ldl.artificial_constraints() > 0 {
            self.ldl.remove_constraint(0);
        } else {
            self.kkt_check(data, settings);
        }

        if self.iterations >= settings.max_iter && !self.done {
            self.status = SolverStatus::MaxIterations;
            self.done = true;
        }
    }

    /// Multiplier test at the current iterate.  Terminates as optimal
    /// when every working multiplier is (near) nonnegative; otherwise the
    /// most negative multiplier selects the constraint to release.
    fn kkt_check(&mut self, data: &DefaultProblemData<T>, settings: &DefaultSettings<T>) {
        let g = self.gradient(data);
        let mw = self.ldl.qr().ncols();

        self.λ.as_mut_slice().set(T::zero());
        if mw == 0 {
            self.status = SolverStatus::Solved;
            self.done = true;
            return;
        }

        // λ_w = -R1^{-1} Q1'g
        let mut q1g = vec![T::zero(); mw];
        self.ldl.qr().q1_t_mul(&mut q1g, &g);
        let mut λw = self.ldl.qr().r1_solve(&q1g);
        λw.negate();

        let mut worst = 0;
        for (j, &v) in λw.iter().enumerate() {
            if v < λw[worst] {
                worst = j;
            }
        }

        for (&row, &v) in self.working_set.iter().zip(λw.iter()) {
            self.λ[row] = v;
        }

        if λw[worst] >= -settings.tol_kkt {
            self.status = SolverStatus::Solved;
            self.done = true;
        } else if self.ldl.trailing_sign() > T::zero() {
            self.ldl.remove_constraint(worst);
            let row = self.working_set.remove(worst);
            self.in_working[row] = false;
            self.λ[row] = T::zero();
        } else {
            // sitting on a curvature-deficient direction (radius-bound
            // step): releasing a constraint here would corrupt the
            // factorization, so terminate with the boundary point
            self.status = SolverStatus::Solved;
            self.done = true;
        }
    }

    /// Largest feasible step along `direction` before an ignored
    /// constraint becomes violated, together with the blocking row.
    /// Simultaneously blocking rows resolve to the highest index.
    fn ratio_test(
        &self,
        data: &DefaultProblemData<T>,
        direction: &[T],
        settings: &DefaultSettings<T>,
    ) -> (T, Option<usize>) {
        let m = data.m;

        let mut ax = vec![T::zero(); m];
        data.A
            .gemv(&mut ax, MatrixShape::N, &self.x, T::one(), T::zero());
        let mut ad = vec![T::zero(); m];
        data.A
            .gemv(&mut ad, MatrixShape::N, direction, T::one(), T::zero());

        let mut best = T::infinity();
        let mut blocking = None;
        for i in 0..m {
            if self.in_working[i] || ad[i] <= settings.tol_ratio {
                continue;
            }
            let ratio = T::max((data.b[i] - ax[i]) / ad[i], T::zero());
            if ratio <= best {
                best = ratio;
                blocking = Some(i);
            }
        }
        (best, blocking)
    }
}

/// Step length at which `||x + αd||` crosses one of the radius bounds:
/// the smallest nonnegative real root across both boundary equations,
/// infinite if no bound is crossed.
fn _radius_bound<T: FloatT>(x: &[T], d: &[T], settings: &DefaultSettings<T>) -> T {
    let mut bound = T::infinity();

    let dd = d.sumsq();
    let xd = x.dot(d);
    let xx = x.sumsq();

    let consider = |r: T, bound: &mut T| {
        // α²(d'd) + 2α(x'd) + (x'x - r²) = 0
        let c = xx - r * r;
        for root in _quadratic_roots(dd, AsFloatT::<T>::as_T(&2.0) * xd, c) {
            if root >= T::zero() && root < *bound {
                *bound = root;
            }
        }
    };

    if settings.r_max.is_finite() {
        consider(settings.r_max, &mut bound);
    }
    if settings.r_min > T::zero() {
        consider(settings.r_min, &mut bound);
    }
    bound
}

// real roots of aα² + bα + c = 0, empty entries encoded as NaN-free Vec
fn _quadratic_roots<T: FloatT>(a: T, b: T, c: T) -> Vec<T> {
    if a == T::zero() {
        if b == T::zero() {
            return vec![];
        }
        return vec![-c / b];
    }
    let disc = b * b - AsFloatT::<T>::as_T(&4.0) * a * c;
    if disc < T::zero() {
        return vec![];
    }
    let sq = T::sqrt(disc);
    // standard stable form avoiding cancellation
    let q = if b >= T::zero() {
        -(b + sq) / (2.0).as_T()
    } else {
        (-b + sq) / (2.0).as_T()
    };
    if q == T::zero() {
        return vec![T::zero()];
    }
    vec![q / a, c / q]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn basic_problem() -> DefaultProblemData<f64> {
        let P = Matrix::from(&[[2.0, 0.0], [0.0, 2.0]]);
        let q = [-2.0, -5.0];
        let A = Matrix::from(&[
            [-1.0, 2.0],
            [1.0, 2.0],
            [1.0, -2.0],
            [-1.0, 0.0],
            [0.0, -1.0],
        ]);
        let b = [2.0, 6.0, 2.0, 0.0, 0.0];
        DefaultProblemData::new(&P, &q, &A, &b).unwrap()
    }

    #[test]
    fn test_iterates_stay_feasible_and_monotone() {
        let data = basic_problem();
        let settings = crate::solver::DefaultSettings::<f64>::default();
        let mut core = ActiveSetIterator::new(&data, &[2.0, 0.0], &settings);

        let mut obj_prev = core.objective(&data);
        while !core.done {
            let psd_before = core.ldl.trailing_sign() > 0.0;
            core.step(&data, &settings);

            // feasibility is invariant across the whole iteration
            assert!(core.infeasibility(&data) <= 1e-9);
            assert!(core.x.norm() <= settings.r_max);

            // monotone objective whenever no negative curvature is involved
            let obj = core.objective(&data);
            if psd_before {
                assert!(obj <= obj_prev + 1e-12);
            }
            obj_prev = obj;
        }
        assert_eq!(core.status, SolverStatus::Solved);
        assert!(core.x.dist(&[1.4, 1.7]) < 1e-8);
    }

    #[test]
    fn test_working_set_partition_invariant() {
        let data = basic_problem();
        let settings = crate::solver::DefaultSettings::<f64>::default();
        let mut core = ActiveSetIterator::new(&data, &[2.0, 0.0], &settings);

        while !core.done {
            core.step(&data, &settings);

            // the working set matches the mask and the QR extent
            assert_eq!(core.working_set.len(), core.ldl.qr().ncols());
            let marked = core.in_working.iter().filter(|&&w| w).count();
            assert_eq!(marked, core.working_set.len());
            for &row in core.working_set.iter() {
                assert!(core.in_working[row]);
            }
        }
    }

    #[test]
    fn test_quadratic_roots() {
        // (α-1)(α-3) = α² - 4α + 3
        let mut roots = _quadratic_roots::<f64>(1.0, -4.0, 3.0);
        roots.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert!((roots[0] - 1.0).abs() < 1e-14);
        assert!((roots[1] - 3.0).abs() < 1e-14);

        assert!(_quadratic_roots(1.0, 0.0, 1.0).is_empty());
        assert_eq!(_quadratic_roots(0.0, 2.0, -4.0), vec![2.0]);
    }

    #[test]
    fn test_radius_bound_hits_outer_sphere() {
        let settings = crate::solver::DefaultSettingsBuilder::<f64>::default()
            .r_max(2.0)
            .build()
            .unwrap();
        // from the origin along e1, the sphere of radius 2 is 2 away
        let α = _radius_bound(&[0.0, 0.0], &[1.0, 0.0], &settings);
        assert!((α - 2.0).abs() < 1e-14);

        // no bound: infinite
        let settings = crate::solver::DefaultSettings::<f64>::default();
        let α = _radius_bound(&[0.0, 0.0], &[1.0, 0.0], &settings);
        assert!(α.is_infinite());
    }
}
