use std::any;
use std::error::Error;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::cleanup::{Cleanup, CleanupHandle};
use crate::error::LifetimeError;
use crate::lifetime::{boxed_cleanup, boxed_constructor, CleanupFn, Constructor, Lifetime};
use crate::sync::{AtomicFlag, Once};

/// A [`Lifetime`] which creates and holds a single instance of `T`.
///
/// The constructor runs on the first request, no matter how many threads ask
/// for the instance at the same time. Its outcome is frozen from then on:
/// every later request receives a clone of the same instance, or the same
/// error if the construction failed. A failed construction is never retried.
///
/// A constructor which panics is never run again either. The singleton is
/// left without an outcome and every later request panics.
///
/// The cleanup function, if any, runs at most once and only after a
/// successful construction. A cleanup function which panics counts as that
/// one run.
pub struct Singleton<T>
where
    T: Clone + Send + Sync + 'static,
{
    created_once: Once,
    cleanup_once: Once,
    construct: Constructor<T>,
    cleanup: Option<CleanupFn<T>>,
    was_created: AtomicFlag,
    outcome: RwLock<Option<Result<T, LifetimeError>>>,
}

impl<T> Singleton<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Creates a [`Singleton`] without a cleanup function.
    pub fn new<F, E>(construct: F) -> Self
    where
        F: Fn() -> Result<T, E> + Send + Sync + 'static,
        E: Into<Box<dyn Error + Send + Sync>>,
    {
        Self::new_impl(boxed_constructor(construct), None)
    }

    /// Creates a [`Singleton`] and returns it along with a handle which
    /// should be run when the instance is no longer needed.
    pub fn new_with_cleanup<F, E, C>(construct: F, cleanup: C) -> (Arc<Self>, CleanupHandle)
    where
        F: Fn() -> Result<T, E> + Send + Sync + 'static,
        E: Into<Box<dyn Error + Send + Sync>>,
        C: Fn(T) + Send + Sync + 'static,
    {
        let singleton = Arc::new(Self::new_impl(
            boxed_constructor(construct),
            Some(boxed_cleanup(cleanup)),
        ));
        let handle = singleton.cleanup_handle();
        (singleton, handle)
    }

    fn new_impl(construct: Constructor<T>, cleanup: Option<CleanupFn<T>>) -> Self {
        Self {
            created_once: Once::new(),
            cleanup_once: Once::new(),
            construct,
            cleanup,
            was_created: AtomicFlag::default(),
            outcome: RwLock::new(None),
        }
    }

    /// Returns a detached handle which cleans up this [`Singleton`].
    pub fn cleanup_handle(self: &Arc<Self>) -> CleanupHandle {
        CleanupHandle::new(Arc::clone(self) as Arc<dyn Cleanup>)
    }

    /// Returns true if the instance has been constructed successfully.
    pub fn is_created(&self) -> bool {
        self.was_created.load()
    }

    fn cached_instance(&self) -> Option<T> {
        match &*self.outcome.read() {
            Some(Ok(instance)) => Some(instance.clone()),
            _ => None,
        }
    }
}

impl<T> Lifetime<T> for Singleton<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// # Panics
    ///
    /// Panics if the constructor panicked on an earlier request. The
    /// constructor is never run a second time.
    fn instance(&self) -> Result<T, LifetimeError> {
        let constructed = self.created_once.try_call_once(|| {
            let outcome = (self.construct)();
            debug!(
                type_name = any::type_name::<T>(),
                succeeded = outcome.is_ok(),
                "constructed singleton"
            );
            let succeeded = outcome.is_ok();
            *self.outcome.write() = Some(outcome);
            self.was_created.store(succeeded);
        });
        if constructed.is_err() {
            panic!(
                "could not construct {}: the constructor panicked",
                any::type_name::<T>()
            );
        }

        match &*self.outcome.read() {
            Some(outcome) => outcome.clone(),
            None => unreachable!("the outcome should be stored once construction completes"),
        }
    }
}

impl<T> Cleanup for Singleton<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn cleanup(&self) {
        let Some(cleanup) = self.cleanup.as_ref() else {
            return;
        };
        if !self.was_created.load() {
            return;
        }

        // A cleanup function which panicked has had its one run.
        let _ = self.cleanup_once.try_call_once(|| {
            if let Some(instance) = self.cached_instance() {
                debug!(type_name = any::type_name::<T>(), "cleaning up singleton");
                cleanup(instance);
            }
        });
    }
}

impl<T> Debug for Singleton<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("Singleton")
            .field("type_name", &any::type_name::<T>())
            .field("was_created", &self.was_created)
            .finish_non_exhaustive()
    }
}
