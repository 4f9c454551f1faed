mod teardown;

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;

pub use teardown::Teardown;

/// A type that releases resources held by the instances it has created.
///
/// Cleanup never runs implicitly. The owner of an object graph is responsible
/// for triggering it, usually through a [`Teardown`] collecting the
/// [`CleanupHandle`]s of every node.
#[cfg_attr(test, mockall::automock)]
pub trait Cleanup: Send + Sync {
    /// Releases the created instances. Calling it more than once is allowed.
    fn cleanup(&self);
}

impl<C> Cleanup for Arc<C>
where
    C: Cleanup + ?Sized,
{
    fn cleanup(&self) {
        (**self).cleanup();
    }
}

/// A detached trigger equivalent to calling [`Cleanup::cleanup`] on the
/// object it was created from.
#[derive(Clone)]
pub struct CleanupHandle {
    target: Arc<dyn Cleanup>,
}

impl CleanupHandle {
    pub fn new(target: Arc<dyn Cleanup>) -> Self {
        Self { target }
    }

    /// Creates a [`CleanupHandle`] which calls `f` each time it is run.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self::new(Arc::new(FnCleanup(f)))
    }

    /// Triggers the cleanup.
    pub fn run(&self) {
        self.target.cleanup();
    }
}

impl Cleanup for CleanupHandle {
    fn cleanup(&self) {
        self.run();
    }
}

impl Debug for CleanupHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("CleanupHandle").finish_non_exhaustive()
    }
}

struct FnCleanup<F>(F);

impl<F> Cleanup for FnCleanup<F>
where
    F: Fn() + Send + Sync + 'static,
{
    fn cleanup(&self) {
        (self.0)();
    }
}
