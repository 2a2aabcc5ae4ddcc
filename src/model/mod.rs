//! model — the polymorphic model descriptor and its lifecycle.
//!
//! Purpose
//! -------
//! Describe a statistical model (a distribution or an estimator) as data plus
//! a sparse table of optional capabilities. Any two models can be used through
//! the same operations; what a model does not implement is synthesized by the
//! dispatch layer.
//!
//! Key behaviors
//! -------------
//! - [`Model`] carries identity, declared sizes ([`Dim`]), a capability table
//!   ([`Capabilities`]), owned parameters and info, a borrowed data reference,
//!   per-model settings, an optional [`Extension`] payload, and an error code.
//! - [`lifecycle`] resolves sizes and allocates parameters (`clear` / `prep`),
//!   copies, releases, fixes parameter values, and renders models.
//! - [`errors`] defines [`ModelError`] and the one-letter [`ErrorCode`].
//!
//! Invariants & assumptions
//! ------------------------
//! - A model owns its parameters, info, settings, and extension; it only
//!   borrows data, and the `'d` lifetime keeps that borrow honest.
//! - Models are single-threaded values (`Rc` capability handles make them
//!   `!Send`); concurrent use requires independent copies.
//!
//! Conventions
//! -----------
//! - Capabilities are narrow traits, one per operation, so a model type
//!   implements only what it has a closed form for.
//! - Fallible operations return [`ModelResult`]; nothing in this layer
//!   panics on bad input.
//!
//! Downstream usage
//! ----------------
//! - Build models with `Model::new(..).with_*` or use a constructor from
//!   [`crate::distributions`], then call operations in [`crate::dispatch`].

pub mod capabilities;
pub mod descriptor;
pub mod errors;
pub mod lifecycle;

pub use self::capabilities::{
    Capabilities, CdfFn, DrawFn, EstimateFn, LogLikelihoodFn, ParameterModelFn, PredictFn, PrepFn,
    PrintFn, ProbabilityFn, ScoreFn,
};
pub use self::descriptor::{Dim, Extension, Model};
pub use self::errors::{ErrorCode, ModelError, ModelResult};
pub use self::lifecycle::{clear, copy, free, prep, print, set_parameters};

pub mod prelude {
    pub use super::capabilities::Capabilities;
    pub use super::descriptor::{Dim, Model};
    pub use super::errors::{ErrorCode, ModelError, ModelResult};
    pub use super::lifecycle::{copy, free, prep, set_parameters};
}
