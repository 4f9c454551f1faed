use std::fmt::{Debug, Formatter, Result as FmtResult};

use parking_lot::Mutex;
use tracing::debug;

use crate::cleanup::CleanupHandle;

/// An ordered collection of [`CleanupHandle`]s which are triggered together.
///
/// A composition root pushes the handle of each node right after creating
/// it, so dependencies come before their dependents. Running the
/// [`Teardown`] triggers the handles in reverse order, which releases every
/// dependent before the objects it depends on.
///
/// # Examples
///
/// ```rust
/// # use std::convert::Infallible;
/// # use lifetime::prelude::*;
/// let mut teardown = Teardown::new();
///
/// let (database, cleanup) = Singleton::new_with_cleanup(
///     || Ok::<_, Infallible>("database"),
///     |name| println!("closing {name}"),
/// );
/// teardown.push(cleanup);
///
/// let (cache, cleanup) = Singleton::new_with_cleanup(
///     move || database.instance().map(|_| "cache"),
///     |name| println!("flushing {name}"),
/// );
/// teardown.push(cleanup);
///
/// cache.must_instance();
/// // Prints "flushing cache" and then "closing database".
/// teardown.run();
/// ```
#[derive(Default)]
pub struct Teardown {
    handles: Vec<CleanupHandle>,
}

impl Teardown {
    pub fn new() -> Self {
        Self {
            handles: Vec::new(),
        }
    }

    pub fn push(&mut self, handle: CleanupHandle) {
        self.handles.push(handle);
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Triggers every collected handle, the last pushed one first.
    pub fn run(mut self) {
        debug!(handles = self.handles.len(), "running teardown");
        while let Some(handle) = self.handles.pop() {
            handle.run();
        }
    }

    /// Turns the whole [`Teardown`] into a single handle. Only the first run
    /// of the returned handle has any effect.
    pub fn into_callback(self) -> CleanupHandle {
        let pending = Mutex::new(Some(self));
        CleanupHandle::from_fn(move || {
            let teardown = pending.lock().take();
            if let Some(teardown) = teardown {
                teardown.run();
            }
        })
    }
}

impl Extend<CleanupHandle> for Teardown {
    fn extend<I>(&mut self, iter: I)
    where
        I: IntoIterator<Item = CleanupHandle>,
    {
        self.handles.extend(iter);
    }
}

impl FromIterator<CleanupHandle> for Teardown {
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = CleanupHandle>,
    {
        Self {
            handles: iter.into_iter().collect(),
        }
    }
}

impl Debug for Teardown {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("Teardown")
            .field("handles", &self.handles.len())
            .finish()
    }
}
