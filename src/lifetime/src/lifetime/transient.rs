use std::any;
use std::error::Error;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::cleanup::{Cleanup, CleanupHandle};
use crate::error::LifetimeError;
use crate::lifetime::{boxed_cleanup, boxed_constructor, CleanupFn, Constructor, Lifetime};

/// A [`Lifetime`] which creates a new instance of `T` on every request.
///
/// Neither instances nor errors are cached. When a cleanup function is
/// provided, every successfully created instance is retained until cleanup,
/// which releases them in reverse creation order.
pub struct Transient<T>
where
    T: Clone + Send + Sync + 'static,
{
    construct: Constructor<T>,
    cleanup: Option<CleanupFn<T>>,
    instances: Mutex<Vec<T>>,
}

impl<T> Transient<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Creates a [`Transient`] without a cleanup function.
    pub fn new<F, E>(construct: F) -> Self
    where
        F: Fn() -> Result<T, E> + Send + Sync + 'static,
        E: Into<Box<dyn Error + Send + Sync>>,
    {
        Self::new_impl(boxed_constructor(construct), None)
    }

    /// Creates a [`Transient`] and returns it along with a handle which
    /// should be run when the created instances are no longer needed.
    pub fn new_with_cleanup<F, E, C>(construct: F, cleanup: C) -> (Arc<Self>, CleanupHandle)
    where
        F: Fn() -> Result<T, E> + Send + Sync + 'static,
        E: Into<Box<dyn Error + Send + Sync>>,
        C: Fn(T) + Send + Sync + 'static,
    {
        let transient = Arc::new(Self::new_impl(
            boxed_constructor(construct),
            Some(boxed_cleanup(cleanup)),
        ));
        let handle = transient.cleanup_handle();
        (transient, handle)
    }

    fn new_impl(construct: Constructor<T>, cleanup: Option<CleanupFn<T>>) -> Self {
        Self {
            construct,
            cleanup,
            instances: Mutex::new(Vec::new()),
        }
    }

    /// Returns a detached handle which cleans up this [`Transient`].
    pub fn cleanup_handle(self: &Arc<Self>) -> CleanupHandle {
        CleanupHandle::new(Arc::clone(self) as Arc<dyn Cleanup>)
    }

    /// Returns the number of instances waiting to be cleaned up.
    pub fn retained(&self) -> usize {
        self.instances.lock().len()
    }
}

impl<T> Lifetime<T> for Transient<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn instance(&self) -> Result<T, LifetimeError> {
        let outcome = (self.construct)();
        debug!(
            type_name = any::type_name::<T>(),
            succeeded = outcome.is_ok(),
            "constructed transient"
        );
        let instance = outcome?;

        if self.cleanup.is_some() {
            self.instances.lock().push(instance.clone());
        }
        Ok(instance)
    }
}

impl<T> Cleanup for Transient<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn cleanup(&self) {
        let Some(cleanup) = self.cleanup.as_ref() else {
            return;
        };

        let mut instances = self.instances.lock();
        if !instances.is_empty() {
            debug!(
                type_name = any::type_name::<T>(),
                instances = instances.len(),
                "cleaning up transients"
            );
        }
        while let Some(instance) = instances.pop() {
            cleanup(instance);
        }
    }
}

impl<T> Debug for Transient<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("Transient")
            .field("type_name", &any::type_name::<T>())
            .field("retained", &self.retained())
            .finish_non_exhaustive()
    }
}
