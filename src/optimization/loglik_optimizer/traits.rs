//! Public API surface for log-likelihood maximization.
//!
//! - [`LogLikelihood`]: trait a problem implements to be maximized.
//! - [`MLEOptions`] and [`Tolerances`]: configuration for the optimizer.
//! - [`MleMethod`]: derivative-free simplex or gradient-based L-BFGS.
//! - [`LineSearcher`]: choice of line search used by L-BFGS.
//! - [`OptimOutcome`]: normalized result returned by [`maximize`](super::maximize).
//!
//! Convention: we *maximize* a log-likelihood `ℓ(θ)` by minimizing the cost
//! `c(θ) = -ℓ(θ)`. If an analytic gradient is provided, it should be the gradient
//! of the log-likelihood (`∇ℓ(θ)`); the adapter flips the sign as needed.
use crate::optimization::{
    errors::{OptError, OptResult},
    loglik_optimizer::{
        Cost, FnEvalMap, Grad, Theta,
        types::{DEFAULT_SD_TOLERANCE, DEFAULT_STEP_SIZE},
        validation::{
            validate_theta_hat, validate_value, verify_step_size, verify_tol_cost,
            verify_tol_grad,
        },
    },
};
use argmin::core::TerminationStatus;
use argmin_math::ArgminL2Norm;
use std::str::FromStr;

/// Problem interface for the optimizer.
///
/// You maximize `ℓ(θ)`; internally we minimize the cost `c(θ) = -ℓ(θ)`.
///
/// - `type Data`: data carried into `value`/`grad`/`check`.
///
/// Required:
/// - `value(&Theta, &Data) -> OptResult<Cost>`: evaluate `ℓ(θ)`.
/// - `check(&Theta, &Data) -> OptResult<()>`: reject an unusable starting
///   point before any solver is built.
///
/// Optional:
/// - `grad(&Theta, &Data) -> OptResult<Grad>`: analytic gradient `∇ℓ(θ)`.
///   If not implemented, finite differences are used.
pub trait LogLikelihood {
    type Data: 'static;

    // Required methods
    fn value(&self, theta: &Theta, data: &Self::Data) -> OptResult<Cost>;
    fn check(&self, theta: &Theta, data: &Self::Data) -> OptResult<()>;

    // Optional methods
    fn grad(&self, _theta: &Theta, _data: &Self::Data) -> OptResult<Grad> {
        Err(OptError::GradientNotImplemented)
    }
}

/// Choice of line search used inside the L-BFGS solver.
///
/// Parsing is case-insensitive (`"MoreThuente"`, `"HagerZhang"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineSearcher {
    MoreThuente,
    HagerZhang,
}

impl FromStr for LineSearcher {
    type Err = OptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "morethuente" => Ok(LineSearcher::MoreThuente),
            "hagerzhang" => Ok(LineSearcher::HagerZhang),
            _ => Err(OptError::InvalidLineSearch {
                name: s.to_string(),
                reason: "Valid options are case insensitive 'MoreThuente' or 'HagerZhang'.",
            }),
        }
    }
}

/// Search method of the maximum-likelihood fallback.
///
/// - `NelderMead`: derivative-free simplex. Points where `ℓ` fails or is not
///   finite count as infinitely bad, so out-of-domain parameters are simply
///   avoided. Default.
/// - `Lbfgs`: quasi-Newton with the configured [`LineSearcher`]; needs `ℓ`
///   to be finite along the whole path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MleMethod {
    #[default]
    NelderMead,
    Lbfgs,
}

impl FromStr for MleMethod {
    type Err = OptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['-', '_'], "").as_str() {
            "neldermead" | "simplex" => Ok(MleMethod::NelderMead),
            "lbfgs" => Ok(MleMethod::Lbfgs),
            _ => Err(OptError::InvalidMethod {
                name: s.to_string(),
                reason: "Valid options are 'NelderMead' (or 'simplex') and 'LBFGS'.",
            }),
        }
    }
}

/// Optimizer options.
///
/// Fields:
/// - `tols`: stopping rules. `tol_grad` applies to L-BFGS; `tol_cost` is the
///   L-BFGS cost-change tolerance and the simplex cost standard-deviation
///   tolerance.
/// - `method`: simplex or L-BFGS.
/// - `line_searcher`: L-BFGS line search.
/// - `step_size`: offset of the initial simplex vertices.
/// - `verbose`: attach a terminal observer (feature `obs_slog`).
/// - `lbfgs_mem`: L-BFGS history size; `None` uses `DEFAULT_LBFGS_MEM`.
#[derive(Debug, Clone, PartialEq)]
pub struct MLEOptions {
    pub tols: Tolerances,
    pub method: MleMethod,
    pub line_searcher: LineSearcher,
    pub step_size: f64,
    pub verbose: bool,
    pub lbfgs_mem: Option<usize>,
}

impl MLEOptions {
    /// Validated options with the default step size and no verbosity.
    ///
    /// # Errors
    /// `InvalidLBFGSMem` if `lbfgs_mem == Some(0)`.
    pub fn new(
        tols: Tolerances, method: MleMethod, line_searcher: LineSearcher, lbfgs_mem: Option<usize>,
    ) -> OptResult<Self> {
        if let Some(m) = lbfgs_mem {
            if m == 0 {
                return Err(OptError::InvalidLBFGSMem {
                    mem: m,
                    reason: "L-BFGS memory must be greater than zero.",
                });
            }
        }
        Ok(Self {
            tols,
            method,
            line_searcher,
            step_size: DEFAULT_STEP_SIZE,
            verbose: false,
            lbfgs_mem,
        })
    }

    /// # Errors
    /// `InvalidStepSize` unless `step` is finite and positive.
    pub fn with_step_size(mut self, step: f64) -> OptResult<Self> {
        verify_step_size(step)?;
        self.step_size = step;
        Ok(self)
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Tolerance on the spread of simplex vertex costs.
    pub fn sd_tolerance(&self) -> f64 {
        self.tols.tol_cost.unwrap_or(DEFAULT_SD_TOLERANCE)
    }
}

impl Default for MLEOptions {
    fn default() -> Self {
        Self {
            tols: Tolerances::default(),
            method: MleMethod::NelderMead,
            line_searcher: LineSearcher::MoreThuente,
            step_size: DEFAULT_STEP_SIZE,
            verbose: false,
            lbfgs_mem: None,
        }
    }
}

/// Stopping rules; at least one must be set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerances {
    pub tol_grad: Option<f64>,
    pub tol_cost: Option<f64>,
    pub max_iter: Option<usize>,
}

impl Tolerances {
    /// # Errors
    /// - `NoTolerancesProvided` if all three are `None`.
    /// - `InvalidTolGrad` / `InvalidTolCost` for non-finite or non-positive
    ///   tolerances.
    /// - `InvalidMaxIter` for `Some(0)`.
    pub fn new(
        tol_grad: Option<f64>, tol_cost: Option<f64>, max_iter: Option<usize>,
    ) -> OptResult<Self> {
        if tol_grad.is_none() && tol_cost.is_none() && max_iter.is_none() {
            return Err(OptError::NoTolerancesProvided);
        }
        verify_tol_cost(tol_cost)?;
        verify_tol_grad(tol_grad)?;
        if let Some(max_iter) = max_iter {
            if max_iter == 0 {
                return Err(OptError::InvalidMaxIter {
                    max_iter,
                    reason: "Maximum iterations must be greater than zero.",
                });
            }
        }
        Ok(Self { tol_grad, tol_cost, max_iter })
    }
}

impl Default for Tolerances {
    fn default() -> Self {
        Self { tol_grad: Some(1e-6), tol_cost: Some(DEFAULT_SD_TOLERANCE), max_iter: Some(1000) }
    }
}

/// Normalized optimizer result.
///
/// `value` is `ℓ(θ̂)`. `converged` is `true` whenever the solver terminated
/// (including on the iteration limit); `status` carries the reason.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimOutcome {
    pub theta_hat: Theta,
    pub value: f64,
    pub converged: bool,
    pub status: String,
    pub iterations: usize,
    pub fn_evals: FnEvalMap,
    pub grad_norm: Option<f64>,
}

impl OptimOutcome {
    /// # Errors
    /// `MissingThetaHat` / `InvalidThetaHat` for an absent or non-finite
    /// estimate, `NonFiniteCost` for a non-finite value.
    pub fn new(
        theta_hat_opt: Option<Theta>, value: f64, termination: TerminationStatus, iterations: u64,
        fn_evals: FnEvalMap, grad: Option<Grad>,
    ) -> OptResult<Self> {
        let theta_hat = validate_theta_hat(theta_hat_opt)?;
        validate_value(value)?;
        let (converged, status) = match termination {
            TerminationStatus::NotTerminated => (false, "Not terminated".to_string()),
            other => (true, format!("{other:?}")),
        };
        let iterations = iterations as usize;
        let grad_norm = grad.map(|g| g.l2_norm());
        Ok(Self { theta_hat, value, converged, status, iterations, fn_evals, grad_norm })
    }
}
