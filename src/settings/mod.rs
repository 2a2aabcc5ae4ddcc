//! settings — per-model, named, typed configuration groups.
//!
//! Purpose
//! -------
//! Let each fallback strategy keep its own configuration and mutable state on
//! the model it serves (draw counts, generators, caches, optimizer options)
//! without the model knowing about any of them in advance.
//!
//! Key behaviors
//! -------------
//! - A [`SettingsStore`] is an ordered list of boxed [`SettingsGroup`]s looked
//!   up by name and accessed by type through `Any` downcasts.
//! - Adding a group whose name is already present replaces the old group in
//!   place and hands the displaced one back to the caller.
//! - Copying a store copies every group through its own
//!   [`SettingsGroup::copy_group`]; the first failure aborts the copy with
//!   `ModelError::SettingsCopy`.
//! - A group can be detached and reattached at its old position, which lets a
//!   dispatcher use a group's generator while handing the model itself to a
//!   capability.
//!
//! Invariants & assumptions
//! ------------------------
//! - At most one group per name.
//! - Insertion order is preserved across copies and replacements.
//! - Dropping a group is its release; groups that share resources with other
//!   groups do so through reference counting, so no group frees what it does
//!   not own.
//!
//! Conventions
//! -----------
//! - Concrete groups implement [`NamedSettings`] to tie a type to its name;
//!   the [`impl_settings_group!`] macro derives the object-safe part from the
//!   type's `Clone` impl, which is where group-specific copy semantics live.
use std::any::Any;
use std::fmt;

use crate::model::errors::{ModelError, ModelResult};

pub mod groups;
pub mod rng;

pub use self::groups::{ArmsSettings, CdfSettings, MleSettings, ParamIndex, PmSettings};
pub use self::rng::{RngHandle, next_seed, set_base_seed};

/// A named configuration group attachable to a model.
pub trait SettingsGroup: Any + fmt::Debug {
    /// Lookup key; unique within a store.
    fn name(&self) -> &str;

    /// Duplicate the group for a copied model.
    ///
    /// # Errors
    /// Implementations return `ModelError::SettingsCopy` when the group
    /// cannot be duplicated.
    fn copy_group(&self) -> ModelResult<Box<dyn SettingsGroup>>;

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

/// A settings group type with a fixed name.
pub trait NamedSettings: SettingsGroup + Sized {
    const NAME: &'static str;
}

/// Implement [`SettingsGroup`] and [`NamedSettings`] for a `Clone` type.
#[macro_export]
macro_rules! impl_settings_group {
    ($ty:ty, $name:expr) => {
        impl $crate::settings::SettingsGroup for $ty {
            fn name(&self) -> &str {
                $name
            }

            fn copy_group(
                &self,
            ) -> $crate::model::errors::ModelResult<Box<dyn $crate::settings::SettingsGroup>> {
                Ok(Box::new(self.clone()))
            }

            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any {
                self
            }

            fn into_any(self: Box<Self>) -> Box<dyn ::std::any::Any> {
                self
            }
        }

        impl $crate::settings::NamedSettings for $ty {
            const NAME: &'static str = $name;
        }
    };
}

/// Ordered collection of settings groups owned by one model.
#[derive(Debug, Default)]
pub struct SettingsStore {
    groups: Vec<Box<dyn SettingsGroup>>,
}

impl SettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Group names in insertion order.
    pub fn names(&self) -> Vec<&str> {
        self.groups.iter().map(|g| g.name()).collect()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.groups.iter().position(|g| g.name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Attach a group; an existing group of the same name is replaced in
    /// place and returned.
    pub fn add<T: NamedSettings>(&mut self, group: T) -> Option<Box<dyn SettingsGroup>> {
        self.add_boxed(Box::new(group))
    }

    /// Untyped form of [`SettingsStore::add`].
    pub fn add_boxed(&mut self, group: Box<dyn SettingsGroup>) -> Option<Box<dyn SettingsGroup>> {
        match self.position(group.name()) {
            Some(i) => Some(std::mem::replace(&mut self.groups[i], group)),
            None => {
                log::trace!("settings: attaching group '{}'", group.name());
                self.groups.push(group);
                None
            }
        }
    }

    pub fn get<T: NamedSettings>(&self) -> Option<&T> {
        let i = self.position(T::NAME)?;
        self.groups[i].as_any().downcast_ref::<T>()
    }

    pub fn get_mut<T: NamedSettings>(&mut self) -> Option<&mut T> {
        let i = self.position(T::NAME)?;
        self.groups[i].as_any_mut().downcast_mut::<T>()
    }

    pub fn get_by_name(&self, name: &str) -> Option<&dyn SettingsGroup> {
        self.position(name).map(|i| self.groups[i].as_ref())
    }

    /// Typed access, attaching `init()` first if the group is absent.
    ///
    /// Returns `None` only if a group of a different type already uses
    /// `T::NAME`.
    pub fn get_or_insert_with<T: NamedSettings>(&mut self, init: impl FnOnce() -> T) -> Option<&mut T> {
        if !self.contains(T::NAME) {
            self.add(init());
        }
        self.get_mut::<T>()
    }

    pub fn remove(&mut self, name: &str) -> Option<Box<dyn SettingsGroup>> {
        self.position(name).map(|i| self.groups.remove(i))
    }

    /// Take a group out of the store, remembering its position.
    pub fn detach<T: NamedSettings>(&mut self) -> Option<(usize, Box<T>)> {
        let i = self.position(T::NAME)?;
        if !self.groups[i].as_any().is::<T>() {
            return None;
        }
        let group = self.groups.remove(i);
        group.into_any().downcast::<T>().ok().map(|g| (i, g))
    }

    /// Put a detached group back at `index` (or replace a same-named group
    /// attached in the meantime).
    pub fn reattach(&mut self, index: usize, group: Box<dyn SettingsGroup>) {
        if let Some(i) = self.position(group.name()) {
            self.groups[i] = group;
            return;
        }
        let index = index.min(self.groups.len());
        self.groups.insert(index, group);
    }

    /// Copy every group in order.
    ///
    /// # Errors
    /// The first group that fails to copy aborts the whole copy; its error is
    /// normalised to `ModelError::SettingsCopy`.
    pub fn copy(&self) -> ModelResult<SettingsStore> {
        let mut groups = Vec::with_capacity(self.groups.len());
        for group in &self.groups {
            match group.copy_group() {
                Ok(copy) => groups.push(copy),
                Err(ModelError::SettingsCopy { group }) => {
                    return Err(ModelError::SettingsCopy { group });
                }
                Err(_) => {
                    return Err(ModelError::SettingsCopy { group: group.name().to_string() });
                }
            }
        }
        Ok(SettingsStore { groups })
    }
}
