//! Generators owned or borrowed by settings groups, and the process-wide seed
//! counter used when a group has to create its own.
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use rand::rngs::SmallRng;
use rand::SeedableRng;

const DEFAULT_BASE_SEED: u64 = 479_901;

static NEXT_SEED: AtomicU64 = AtomicU64::new(DEFAULT_BASE_SEED);

/// Hand out the next seed; every call returns a different value.
pub fn next_seed() -> u64 {
    NEXT_SEED.fetch_add(1, Ordering::Relaxed)
}

/// Reset the counter so subsequently created generators are reproducible.
pub fn set_base_seed(seed: u64) {
    NEXT_SEED.store(seed, Ordering::Relaxed);
}

/// A generator a settings group either owns or shares with its caller.
///
/// Copying an owned handle produces a freshly seeded owned generator, so two
/// copies of a model never replay the same stream. Copying a shared handle
/// shares the same generator again; the caller keeps ownership.
#[derive(Debug)]
pub enum RngHandle {
    Owned(SmallRng),
    Shared(Rc<RefCell<SmallRng>>),
}

impl RngHandle {
    /// Owned generator seeded from [`next_seed`].
    pub fn owned() -> Self {
        RngHandle::Owned(SmallRng::seed_from_u64(next_seed()))
    }

    pub fn from_seed(seed: u64) -> Self {
        RngHandle::Owned(SmallRng::seed_from_u64(seed))
    }

    pub fn shared(rng: Rc<RefCell<SmallRng>>) -> Self {
        RngHandle::Shared(rng)
    }

    pub fn is_owned(&self) -> bool {
        matches!(self, RngHandle::Owned(_))
    }

    /// Run `f` with mutable access to the generator.
    pub fn with<R>(&mut self, f: impl FnOnce(&mut SmallRng) -> R) -> R {
        match self {
            RngHandle::Owned(rng) => f(rng),
            RngHandle::Shared(rng) => f(&mut rng.borrow_mut()),
        }
    }
}

impl Default for RngHandle {
    fn default() -> Self {
        Self::owned()
    }
}

impl Clone for RngHandle {
    fn clone(&self) -> Self {
        match self {
            RngHandle::Owned(_) => Self::owned(),
            RngHandle::Shared(rng) => RngHandle::Shared(Rc::clone(rng)),
        }
    }
}
