//! Errors for the model layer (lifecycle, dispatch, settings, fallbacks).
//!
//! This module defines [`ModelError`], the single error type returned by every
//! model operation, and [`ErrorCode`], the compact one-letter status recorded on
//! a [`Model`](crate::model::Model) when a lifecycle step fails.
//!
//! ## Conventions
//! - Dimension and copy failures carry an [`ErrorCode`] (`'d'`, `'a'`, `'s'`,
//!   `'p'`) and the failing operation also stores that code on the model it was
//!   working on, so callers that keep the model around can inspect it later.
//! - A missing capability with no fallback is reported as
//!   [`ModelError::MissingCapability`] and logged at `warn` level by the
//!   dispatcher; it never aborts the process.
//! - Optimizer failures are wrapped as [`ModelError::Optimization`] so the
//!   structured [`OptError`] survives the trip through the fallback layer.
use crate::optimization::errors::OptError;

/// Result alias for model operations that may produce [`ModelError`].
pub type ModelResult<T> = Result<T, ModelError>;

/// One-letter status recorded on a model after a failed lifecycle step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// `'d'`: a data-width size met data without columns (or no data at all).
    Dimension,
    /// `'a'`: the extension payload could not be duplicated.
    Allocation,
    /// `'s'`: a settings group failed to copy.
    SettingsCopy,
    /// `'p'`: the parameter or info container failed to copy.
    ParameterCopy,
}

impl ErrorCode {
    /// The single-character code used in diagnostics.
    pub fn as_char(self) -> char {
        match self {
            ErrorCode::Dimension => 'd',
            ErrorCode::Allocation => 'a',
            ErrorCode::SettingsCopy => 's',
            ErrorCode::ParameterCopy => 'p',
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "'{}'", self.as_char())
    }
}

/// Unified error type for model lifecycle and dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    // ---- Lifecycle ----
    /// A size declared as data-width could not be resolved.
    Dimension { model: String, field: &'static str },

    /// The extension payload refused to copy.
    Allocation { model: String },

    /// A settings group refused to copy.
    SettingsCopy { group: String },

    /// Parameters or info came back from copying with an error mark.
    ParameterCopy { part: &'static str },

    // ---- Dispatch ----
    /// Neither the capability nor any fallback is available.
    MissingCapability { model: String, operation: &'static str },

    /// The model is absent or carries no parameters where they are required.
    NullModel { operation: &'static str },

    /// The operation needs data and none was supplied.
    MissingData { model: String, operation: &'static str },

    /// Parameter values are outside the model's domain.
    InvalidParameters { model: String, reason: String },

    /// A settings group name is taken by a group of another type.
    SettingsMismatch { group: String },

    /// A sampling fallback could not produce a value.
    SamplingFailed { model: String, reason: &'static str },

    // ---- Shapes ----
    /// A packed vector does not match the container it is unpacked into.
    PackLengthMismatch { expected: usize, found: usize },

    /// A query point is narrower than the model's observations.
    QueryWidthMismatch { expected: usize, found: usize },

    /// A parameter index is outside the packed parameter vector.
    IndexOutOfRange { index: usize, len: usize },

    /// The query data has no rows.
    EmptyQuery { operation: &'static str },

    // ---- Optimizer ----
    /// Failure inside the maximum-likelihood machinery.
    Optimization(OptError),
}

impl ModelError {
    /// The lifecycle code associated with this error, if any.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            ModelError::Dimension { .. } => Some(ErrorCode::Dimension),
            ModelError::Allocation { .. } => Some(ErrorCode::Allocation),
            ModelError::SettingsCopy { .. } => Some(ErrorCode::SettingsCopy),
            ModelError::ParameterCopy { .. } => Some(ErrorCode::ParameterCopy),
            _ => None,
        }
    }
}

impl std::error::Error for ModelError {}

impl std::fmt::Display for ModelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Lifecycle ----
            ModelError::Dimension { model, field } => {
                write!(
                    f,
                    "{model}: {field} is sized by the data width, but the data has no columns"
                )
            }
            ModelError::Allocation { model } => {
                write!(f, "{model}: could not copy the extension payload")
            }
            ModelError::SettingsCopy { group } => {
                write!(f, "Settings group '{group}' could not be copied")
            }
            ModelError::ParameterCopy { part } => {
                write!(f, "Copying the model's {part} produced an error")
            }

            // ---- Dispatch ----
            ModelError::MissingCapability { model, operation } => {
                write!(f, "{model}: no {operation} capability and no usable fallback")
            }
            ModelError::NullModel { operation } => {
                write!(f, "{operation}: the model has no parameters")
            }
            ModelError::MissingData { model, operation } => {
                write!(f, "{model}: {operation} requires data")
            }
            ModelError::InvalidParameters { model, reason } => {
                write!(f, "{model}: invalid parameters: {reason}")
            }
            ModelError::SettingsMismatch { group } => {
                write!(f, "Settings group '{group}' holds a group of another type")
            }
            ModelError::SamplingFailed { model, reason } => {
                write!(f, "{model}: sampling failed: {reason}")
            }

            // ---- Shapes ----
            ModelError::PackLengthMismatch { expected, found } => {
                write!(f, "Packed length mismatch: expected {expected}, found {found}")
            }
            ModelError::QueryWidthMismatch { expected, found } => {
                write!(f, "Query width mismatch: expected at least {expected}, found {found}")
            }
            ModelError::IndexOutOfRange { index, len } => {
                write!(f, "Parameter index {index} out of range for {len} parameters")
            }
            ModelError::EmptyQuery { operation } => {
                write!(f, "{operation}: the query data has no rows")
            }

            // ---- Optimizer ----
            ModelError::Optimization(err) => write!(f, "Optimization failed: {err}"),
        }
    }
}

impl From<OptError> for ModelError {
    fn from(err: OptError) -> Self {
        match err {
            OptError::ModelEvaluation { source } => *source,
            other => ModelError::Optimization(other),
        }
    }
}
