//! Settings groups used by the dispatch fallbacks.
//!
//! Each group is built from its `Default` and adjusted with `with_*`
//! overrides. The `Clone` impls define what copying a model does to the
//! group's state.
use std::rc::Rc;

use ndarray::{Array1, Array2};

use crate::impl_settings_group;
use crate::optimization::loglik_optimizer::MLEOptions;
use crate::settings::rng::RngHandle;

/// Draws used by the Monte Carlo CDF and by parameter-model fallbacks.
pub const DEFAULT_DRAWS: usize = 10_000;

// ---- Monte Carlo CDF ----

/// State for the Monte Carlo CDF fallback.
///
/// `draws_made` caches the draw matrix (`draws × width`) for the model it
/// was made from. A copy of the group starts with an empty cache, because a
/// copied model may be re-estimated or given new parameters. A
/// caller-supplied matrix is never modified.
#[derive(Debug)]
pub struct CdfSettings {
    pub draws: usize,
    pub rng: RngHandle,
    pub draws_made: Option<Rc<Array2<f64>>>,
}

impl Clone for CdfSettings {
    fn clone(&self) -> Self {
        Self { draws: self.draws, rng: self.rng.clone(), draws_made: None }
    }
}

impl Default for CdfSettings {
    fn default() -> Self {
        Self { draws: DEFAULT_DRAWS, rng: RngHandle::owned(), draws_made: None }
    }
}

impl CdfSettings {
    pub fn with_draws(mut self, draws: usize) -> Self {
        self.draws = draws;
        self
    }

    pub fn with_rng(mut self, rng: RngHandle) -> Self {
        self.rng = rng;
        self
    }

    /// Use a precomputed draw matrix instead of sampling.
    pub fn with_draws_made(mut self, draws_made: Array2<f64>) -> Self {
        self.draws_made = Some(Rc::new(draws_made));
        self
    }
}

impl_settings_group!(CdfSettings, "cdf");

// ---- Parameter model ----

/// Which parameter the parameter model describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamIndex {
    /// Joint distribution of every packed parameter.
    All,
    /// Marginal distribution of one packed parameter.
    Single(usize),
}

impl From<isize> for ParamIndex {
    /// Negative indices select the joint distribution.
    fn from(index: isize) -> Self {
        match usize::try_from(index) {
            Ok(i) => ParamIndex::Single(i),
            Err(_) => ParamIndex::All,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PmSettings {
    pub index: ParamIndex,
    pub draws: usize,
    pub rng: RngHandle,
}

impl Default for PmSettings {
    fn default() -> Self {
        Self { index: ParamIndex::Single(0), draws: DEFAULT_DRAWS, rng: RngHandle::owned() }
    }
}

impl PmSettings {
    pub fn with_index(mut self, index: impl Into<ParamIndex>) -> Self {
        self.index = index.into();
        self
    }

    pub fn with_draws(mut self, draws: usize) -> Self {
        self.draws = draws;
        self
    }

    pub fn with_rng(mut self, rng: RngHandle) -> Self {
        self.rng = rng;
        self
    }
}

impl_settings_group!(PmSettings, "parameter_model");

// ---- Maximum likelihood ----

/// Configuration of the maximum-likelihood estimate fallback.
///
/// Without a starting point the search starts with every packed parameter at
/// 1.0.
#[derive(Debug, Clone, Default)]
pub struct MleSettings {
    pub starting_point: Option<Array1<f64>>,
    pub options: MLEOptions,
}

impl MleSettings {
    pub fn with_starting_point(mut self, start: Array1<f64>) -> Self {
        self.starting_point = Some(start);
        self
    }

    pub fn with_options(mut self, options: MLEOptions) -> Self {
        self.options = options;
        self
    }
}

impl_settings_group!(MleSettings, "mle");

// ---- Adaptive rejection sampling ----

pub const DEFAULT_ARMS_LOWER: f64 = -100.0;
pub const DEFAULT_ARMS_UPPER: f64 = 100.0;
pub const DEFAULT_ARMS_INIT_POINTS: usize = 10;
pub const DEFAULT_ARMS_MAX_POINTS: usize = 100;

/// State of the adaptive rejection Metropolis draw fallback.
///
/// `hull` holds `(x, log p(x))` abscissae sorted by `x`; it is built on the
/// first draw and refined by rejected points. `previous` is the last accepted
/// draw, used by the Metropolis step.
#[derive(Debug, Clone)]
pub struct ArmsSettings {
    pub lower: f64,
    pub upper: f64,
    pub init_points: usize,
    pub max_points: usize,
    pub hull: Vec<(f64, f64)>,
    pub previous: Option<f64>,
}

impl Default for ArmsSettings {
    fn default() -> Self {
        Self {
            lower: DEFAULT_ARMS_LOWER,
            upper: DEFAULT_ARMS_UPPER,
            init_points: DEFAULT_ARMS_INIT_POINTS,
            max_points: DEFAULT_ARMS_MAX_POINTS,
            hull: Vec::new(),
            previous: None,
        }
    }
}

impl ArmsSettings {
    pub fn with_bounds(mut self, lower: f64, upper: f64) -> Self {
        self.lower = lower;
        self.upper = upper;
        self
    }

    pub fn with_init_points(mut self, init_points: usize) -> Self {
        self.init_points = init_points;
        self
    }

    pub fn with_max_points(mut self, max_points: usize) -> Self {
        self.max_points = max_points;
        self
    }
}

impl_settings_group!(ArmsSettings, "arms");

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::SettingsGroup;

    #[test]
    // Purpose
    // -------
    // Copying a CDF group drops the cached draws and keeps the configuration.
    //
    // Given
    // -----
    // - A group with 500 draws and a caller-supplied 3×1 draw matrix.
    //
    // Expect
    // ------
    // - The copy has no cache and the same draw count; the source keeps its
    //   cache.
    fn cdf_copy_starts_with_empty_cache() {
        // Arrange
        let group = CdfSettings::default().with_draws(500).with_draws_made(Array2::zeros((3, 1)));

        // Act
        let copy = group.copy_group().unwrap();
        let copy = copy.as_any().downcast_ref::<CdfSettings>().unwrap();

        // Assert
        assert!(copy.draws_made.is_none());
        assert_eq!(copy.draws, 500);
        assert_eq!(group.draws_made.as_ref().unwrap().dim(), (3, 1));
    }

    #[test]
    // Purpose
    // -------
    // Negative indices select the joint parameter model.
    //
    // Given
    // -----
    // - Indices -1 and 2.
    //
    // Expect
    // ------
    // - `All` and `Single(2)`.
    fn param_index_from_signed() {
        assert_eq!(ParamIndex::from(-1), ParamIndex::All);
        assert_eq!(ParamIndex::from(2), ParamIndex::Single(2));
    }

    #[test]
    // Purpose
    // -------
    // Defaults match the documented values.
    //
    // Given
    // -----
    // - Default CDF and parameter-model groups.
    //
    // Expect
    // ------
    // - 10 000 draws, index 0, owned generators.
    fn defaults_are_documented_values() {
        let cdf = CdfSettings::default();
        let pm = PmSettings::default();
        assert_eq!(cdf.draws, DEFAULT_DRAWS);
        assert!(cdf.rng.is_owned());
        assert_eq!(pm.index, ParamIndex::Single(0));
        assert_eq!(pm.draws, 10_000);
    }
}
