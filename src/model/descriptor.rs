//! The model descriptor: identity, sizes, capability table, and owned state.
use std::any::Any;
use std::fmt;

use log::warn;
use ndarray::Array1;

use crate::data::Data;
use crate::model::capabilities::Capabilities;
use crate::model::errors::{ErrorCode, ModelError, ModelResult};
use crate::settings::{NamedSettings, SettingsStore};

/// A declared size: fixed, or resolved from the data width at prep time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dim {
    Fixed(usize),
    DataWidth,
}

impl Dim {
    pub fn fixed(self) -> Option<usize> {
        match self {
            Dim::Fixed(n) => Some(n),
            Dim::DataWidth => None,
        }
    }

    pub fn is_data_width(self) -> bool {
        matches!(self, Dim::DataWidth)
    }

    pub fn resolve(self, width: usize) -> usize {
        self.fixed().unwrap_or(width)
    }
}

impl Default for Dim {
    fn default() -> Self {
        Dim::Fixed(0)
    }
}

impl From<isize> for Dim {
    /// `-1` (any negative value) means data-width.
    fn from(size: isize) -> Self {
        usize::try_from(size).map_or(Dim::DataWidth, Dim::Fixed)
    }
}

/// Model-specific payload carried alongside the parameters.
///
/// `copy_extension` returns `None` when the payload cannot be duplicated,
/// which makes copying the model fail with `ModelError::Allocation`.
pub trait Extension: Any + fmt::Debug {
    fn copy_extension(&self) -> Option<Box<dyn Extension>>;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Implement [`Extension`] for a `Clone` type.
#[macro_export]
macro_rules! impl_extension {
    ($ty:ty) => {
        impl $crate::model::Extension for $ty {
            fn copy_extension(&self) -> Option<Box<dyn $crate::model::Extension>> {
                Some(Box::new(self.clone()))
            }

            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any {
                self
            }
        }
    };
}

/// A statistical model (distribution or estimator).
///
/// `'d` is the lifetime of the data the model was last prepared with; the
/// model only borrows it.
pub struct Model<'d> {
    pub name: String,
    pub dsize: Dim,
    pub vbase: Dim,
    pub m1base: Dim,
    pub m2base: Dim,
    pub capabilities: Capabilities,
    pub parameters: Option<Data>,
    pub info: Option<Data>,
    pub data: Option<&'d Data>,
    pub settings: SettingsStore,
    pub more: Option<Box<dyn Extension>>,
    pub error: Option<ErrorCode>,
}

impl<'d> Model<'d> {
    /// Unsized, unparameterized model with no capabilities.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dsize: Dim::default(),
            vbase: Dim::default(),
            m1base: Dim::default(),
            m2base: Dim::default(),
            capabilities: Capabilities::default(),
            parameters: None,
            info: None,
            data: None,
            settings: SettingsStore::new(),
            more: None,
            error: None,
        }
    }

    pub fn with_dsize(mut self, dsize: Dim) -> Self {
        self.dsize = dsize;
        self
    }

    /// Set the vector and matrix sizes of the parameter set.
    pub fn with_bases(mut self, vbase: Dim, m1base: Dim, m2base: Dim) -> Self {
        self.vbase = vbase;
        self.m1base = m1base;
        self.m2base = m2base;
        self
    }

    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn with_parameters(mut self, parameters: Data) -> Self {
        self.parameters = Some(parameters);
        self
    }

    pub fn with_settings<T: NamedSettings>(mut self, group: T) -> Self {
        self.settings.add(group);
        self
    }

    pub fn with_extension(mut self, extension: impl Extension) -> Self {
        self.more = Some(Box::new(extension));
        self
    }

    /// Parameters, or `NullModel` naming `operation`.
    pub fn require_parameters(&self, operation: &'static str) -> ModelResult<&Data> {
        self.parameters.as_ref().ok_or_else(|| {
            warn!("{}: {operation} needs parameters, but the model has none", self.name);
            ModelError::NullModel { operation }
        })
    }

    pub fn extension<T: Any>(&self) -> Option<&T> {
        self.more.as_ref().and_then(|m| m.as_any().downcast_ref::<T>())
    }

    pub fn extension_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.more.as_mut().and_then(|m| m.as_any_mut().downcast_mut::<T>())
    }

    /// Sizes in the order dsize, vbase, m1base, m2base, with their names.
    pub fn dims(&self) -> [(&'static str, Dim); 4] {
        [("dsize", self.dsize), ("vbase", self.vbase), ("m1base", self.m1base), ("m2base", self.m2base)]
    }

    /// Record the lifecycle code of `err` on the model and hand the error back.
    pub(crate) fn mark(&mut self, err: ModelError) -> ModelError {
        if let Some(code) = err.code() {
            self.error = Some(code);
        }
        err
    }

    /// Run `f` with the settings group `T` taken out of the store.
    ///
    /// The group is created from its `Default` if absent, and put back at its
    /// position whatever `f` returns. This lets `f` use the group's state
    /// (generator, caches) while also passing the model to dispatch calls.
    ///
    /// # Errors
    /// `SettingsMismatch` if the name `T::NAME` is held by a different type;
    /// otherwise whatever `f` returns.
    pub fn with_settings_group<T, R>(
        &mut self, f: impl FnOnce(&mut T, &mut Model<'d>) -> ModelResult<R>,
    ) -> ModelResult<R>
    where
        T: NamedSettings + Default,
    {
        if !self.settings.contains(T::NAME) {
            self.settings.add(T::default());
        }
        let (index, mut group) = self
            .settings
            .detach::<T>()
            .ok_or_else(|| ModelError::SettingsMismatch { group: T::NAME.to_string() })?;
        let result = f(&mut *group, self);
        self.settings.reattach(index, group);
        result
    }

    /// Move every owned part into a model that no longer borrows data.
    pub fn into_detached<'x>(self) -> Model<'x> {
        Model {
            name: self.name,
            dsize: self.dsize,
            vbase: self.vbase,
            m1base: self.m1base,
            m2base: self.m2base,
            capabilities: self.capabilities,
            parameters: self.parameters,
            info: self.info,
            data: None,
            settings: self.settings,
            more: self.more,
            error: self.error,
        }
    }

    /// Packed parameters, if the model has any.
    pub fn packed_parameters(&self) -> Option<Array1<f64>> {
        self.parameters.as_ref().map(Data::pack)
    }
}

impl fmt::Debug for Model<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("name", &self.name)
            .field("dsize", &self.dsize)
            .field("vbase", &self.vbase)
            .field("m1base", &self.m1base)
            .field("m2base", &self.m2base)
            .field("capabilities", &self.capabilities)
            .field("parameters", &self.parameters)
            .field("info", &self.info)
            .field("has_data", &self.data.is_some())
            .field("settings", &self.settings.names())
            .field("more", &self.more)
            .field("error", &self.error)
            .finish()
    }
}
