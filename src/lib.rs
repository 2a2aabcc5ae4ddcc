//! rust_statmodels — polymorphic statistical models with capability dispatch.
//!
//! Purpose
//! -------
//! Describe any statistical model (a distribution or an estimator) with one
//! descriptor type and run every operation on it through one set of
//! functions. A model implements only what it has a closed form for; the
//! dispatch layer fills in the rest with generic inference: maximum
//! likelihood for estimation, `p`/`ln p` conversions, finite-difference
//! scores, adaptive rejection sampling, Monte Carlo CDFs, likelihood-based
//! imputation, and bootstrap or simulated parameter distributions.
//!
//! Key behaviors
//! -------------
//! - [`model`]: the [`Model`] descriptor, its capability table, lifecycle
//!   (`prep`, `copy`, `free`, `set_parameters`, `print`) and errors.
//! - [`dispatch`]: `estimate`, `p`, `log_likelihood`, `score`, `draw`,
//!   `predict`, `cdf`, `parameter_model`.
//! - [`fallback`]: the generic algorithms behind missing capabilities.
//! - [`settings`]: per-model typed settings groups and generator handles.
//! - [`data`]: the vector + matrix container used for observations,
//!   parameters, and info pages.
//! - [`distributions`]: bundled families built on the capability table.
//! - [`optimization`]: the Argmin-backed log-likelihood maximizer.
//!
//! Invariants & assumptions
//! ------------------------
//! - Models own their parameters, info, settings, and extension; they only
//!   borrow data.
//! - Models are single-threaded values. Use independent copies per thread.
//!
//! Conventions
//! -----------
//! - Fallible operations return `ModelResult<T>`; the one-letter lifecycle
//!   codes are kept on the model (`Model::error`) for callers that check
//!   status after the fact.
//! - Diagnostics go through the `log` facade: `warn` for missing
//!   capabilities and lifecycle failures, `debug` for fallback choices,
//!   `trace` for lifecycle steps. Install any logger to see them.
//!
//! Testing notes
//! -------------
//! - Unit tests live next to each module; `tests/` holds end-to-end checks
//!   of the fallbacks on the bundled distributions.

pub mod data;
pub mod dispatch;
pub mod distributions;
pub mod fallback;
pub mod model;
pub mod optimization;
pub mod settings;

pub use crate::data::{Cell, Data};
pub use crate::dispatch::{cdf, draw, estimate, log_likelihood, p, parameter_model, predict, score};
pub use crate::model::{
    clear, copy, free, prep, print, set_parameters, Capabilities, Dim, ErrorCode, Extension, Model, ModelError,
    ModelResult,
};

pub mod prelude {
    pub use crate::data::{Cell, Data};
    pub use crate::dispatch::{cdf, draw, estimate, log_likelihood, p, parameter_model, predict, score};
    pub use crate::model::prelude::*;
    pub use crate::settings::{ArmsSettings, CdfSettings, MleSettings, ParamIndex, PmSettings, RngHandle};
}
