use crate::algebra::*;
use derive_builder::Builder;
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{de::DeserializeOwned, Deserialize, Serialize};

#[derive(Error, Debug)]
/// Error type returned by settings validation
pub enum SettingsError {
    /// An error attributable to one of the fields
    #[error("Bad field: {0}")]
    BadField(&'static str),
}

/// Solver settings, including the complete set of numerical tolerances
/// used by the factorizations and the active-set loop.
///
/// Defaults are available via `DefaultSettings::default()` or through the
/// [builder](DefaultSettingsBuilder):
///
/// ```
/// use asqp::solver::DefaultSettingsBuilder;
/// let settings = DefaultSettingsBuilder::<f64>::default()
///     .r_max(2.5)
///     .verbose(true)
///     .build()
///     .unwrap();
/// ```

#[derive(Builder, Debug, Clone)]
#[builder(build_fn(validate = "Self::validate"))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(bound = "T: Serialize + DeserializeOwned"))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DefaultSettings<T: FloatT> {
    ///maximum number of active-set iterations
    #[builder(default = "5000")]
    pub max_iter: u32,

    ///verbose printing
    #[builder(default = "false")]
    pub verbose: bool,

    ///iterations between progress lines when verbose
    #[builder(default = "50")]
    pub print_interval: u32,

    ///lower bound on the iterate norm
    #[builder(default = "T::zero()")]
    pub r_min: T,

    ///upper bound on the iterate norm
    #[builder(default = "T::infinity()")]
    pub r_max: T,

    ///feasibility slack allowed for the starting point
    #[builder(default = "(1e-9).as_T()")]
    pub tol_feas: T,

    ///residual below which a starting constraint counts as active
    #[builder(default = "(1e-11).as_T()")]
    pub tol_active: T,

    ///Lagrange multiplier sign tolerance in the optimality test
    #[builder(default = "(1e-8).as_T()")]
    pub tol_kkt: T,

    ///projected gradient norm below which no step is attempted
    #[builder(default = "(1e-10).as_T()")]
    pub tol_grad: T,

    ///smallest ratio-test denominator treated as an approaching constraint
    #[builder(default = "(1e-11).as_T()")]
    pub tol_ratio: T,

    ///pivot magnitude below which the projected Hessian is treated as
    ///indefinite or rank deficient
    #[builder(default = "(1e-12).as_T()")]
    pub indefinite_tolerance: T,
}

impl<T> Default for DefaultSettings<T>
where
    T: FloatT,
{
    fn default() -> DefaultSettings<T> {
        DefaultSettingsBuilder::<T>::default().build().unwrap()
    }
}

// pre build checker (for auto-validation when using the builder)

impl From<SettingsError> for DefaultSettingsBuilderError {
    fn from(e: SettingsError) -> Self {
        DefaultSettingsBuilderError::ValidationError(e.to_string())
    }
}

/// Automatic pre-build settings validation
impl<T> DefaultSettingsBuilder<T>
where
    T: FloatT,
{
    pub fn validate(&self) -> Result<(), SettingsError> {
        macro_rules! check_nonnegative {
            ($field:ident) => {
                if let Some(v) = self.$field {
                    if v < T::zero() {
                        return Err(SettingsError::BadField(stringify!($field)));
                    }
                }
            };
        }
        check_nonnegative!(r_min);
        check_nonnegative!(tol_feas);
        check_nonnegative!(tol_active);
        check_nonnegative!(tol_kkt);
        check_nonnegative!(tol_grad);
        check_nonnegative!(tol_ratio);
        check_nonnegative!(indefinite_tolerance);

        let r_min = self.r_min.unwrap_or(T::zero());
        let r_max = self.r_max.unwrap_or(T::infinity());
        if r_min > r_max {
            return Err(SettingsError::BadField("r_min"));
        }
        Ok(())
    }
}
