use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::mem;

use oneshot::{Receiver, Sender};
use parking_lot::{Mutex, MutexGuard};
use snafu::prelude::*;
use tracing::trace;

/// A one-shot guard which runs a closure at most once.
///
/// Threads arriving while the closure is running are blocked until it
/// returns. A closure that panics still counts as the one run: the guard is
/// poisoned and no other closure is ever run on it.
pub struct Once {
    state: Mutex<OnceState>,
}

impl Once {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(OnceState::NotStarted),
        }
    }

    /// Runs `f` if no closure has been run on this guard yet.
    ///
    /// # Panics
    ///
    /// Panics if a previous closure run on this guard panicked.
    pub fn call_once<F>(&self, f: F)
    where
        F: FnOnce(),
    {
        if let Err(err) = self.try_call_once(f) {
            panic!("{err}");
        }
    }

    /// Runs `f` if no closure has been run on this guard yet.
    ///
    /// When this method returns `Ok`, some closure passed to this guard has
    /// run to completion, either `f` or one from another thread.
    ///
    /// # Errors
    ///
    /// Returns an error without running `f` if a previous closure run on this
    /// guard panicked.
    pub fn try_call_once<F>(&self, f: F) -> Result<(), PoisonedError>
    where
        F: FnOnce(),
    {
        if !self.claim()? {
            return Ok(());
        }

        let completion = Completion::new(self);
        f();
        completion.complete();
        Ok(())
    }

    /// Returns true if a closure has run to completion on this guard.
    pub fn is_completed(&self) -> bool {
        matches!(*self.state.lock(), OnceState::Done)
    }

    /// Returns true if a closure run on this guard panicked.
    pub fn is_poisoned(&self) -> bool {
        matches!(*self.state.lock(), OnceState::Poisoned)
    }

    fn claim(&self) -> Result<bool, PoisonedError> {
        loop {
            let mut state = self.state.lock();
            if matches!(*state, OnceState::Done) {
                return Ok(false);
            }
            if matches!(*state, OnceState::Poisoned) {
                return Err(PoisonedError);
            }
            if matches!(*state, OnceState::NotStarted) {
                *state = OnceState::InProgress {
                    waiters: Vec::new(),
                };
                return Ok(true);
            }

            let receiver = self.register_waiter(state);
            trace!("waiting for a running one-shot closure");
            // A receive error means the running closure panicked. Either way
            // the state has settled and must be checked again.
            let _ = receiver.recv();
        }
    }

    fn register_waiter(&self, mut state: MutexGuard<'_, OnceState>) -> Receiver<()> {
        let (sender, receiver) = oneshot::channel();
        let OnceState::InProgress { waiters } = &mut *state else {
            unreachable!("whether the guard is in progress should be checked before calling this method")
        };
        waiters.push(sender);
        receiver
    }

    fn finish(&self, next: OnceState) {
        let previous = mem::replace(&mut *self.state.lock(), next);
        if let OnceState::InProgress { waiters } = previous {
            for sender in waiters {
                let _ = sender.send(());
            }
        }
    }
}

impl Default for Once {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for Once {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("Once")
            .field("completed", &self.is_completed())
            .field("poisoned", &self.is_poisoned())
            .finish()
    }
}

/// An error returned by [`Once::try_call_once`] when a previous closure
/// panicked.
#[derive(Debug, Clone, Snafu)]
#[snafu(display("a closure run on this one-shot guard panicked"))]
pub struct PoisonedError;

enum OnceState {
    NotStarted,
    InProgress { waiters: Vec<Sender<()>> },
    Done,
    Poisoned,
}

/// Settles the state of a [`Once`] when the running closure returns or
/// unwinds.
struct Completion<'a> {
    once: &'a Once,
    completed: bool,
}

impl<'a> Completion<'a> {
    fn new(once: &'a Once) -> Self {
        Self {
            once,
            completed: false,
        }
    }

    fn complete(mut self) {
        self.completed = true;
    }
}

impl Drop for Completion<'_> {
    fn drop(&mut self) {
        if self.completed {
            self.once.finish(OnceState::Done);
        } else {
            self.once.finish(OnceState::Poisoned);
        }
    }
}
