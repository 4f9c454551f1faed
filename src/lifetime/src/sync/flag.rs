use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::atomic::{AtomicBool, Ordering};

/// An atomic boolean value. The default value is `false`.
#[derive(Default)]
pub struct AtomicFlag {
    value: AtomicBool,
}

impl AtomicFlag {
    /// Creates a new [`AtomicFlag`] holding `value`.
    pub const fn new(value: bool) -> Self {
        Self {
            value: AtomicBool::new(value),
        }
    }

    /// Atomically loads and returns the stored value.
    #[inline]
    pub fn load(&self) -> bool {
        self.value.load(Ordering::SeqCst)
    }

    /// Atomically stores `value`.
    #[inline]
    pub fn store(&self, value: bool) {
        self.value.store(value, Ordering::SeqCst);
    }

    /// Atomically stores `value` and returns the previous value.
    #[inline]
    pub fn swap(&self, value: bool) -> bool {
        self.value.swap(value, Ordering::SeqCst)
    }

    /// Stores `new` if the current value equals `expected`. Returns true if
    /// the value was replaced.
    #[inline]
    pub fn compare_and_swap(&self, expected: bool, new: bool) -> bool {
        self.value
            .compare_exchange(expected, new, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }
}

impl Debug for AtomicFlag {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_tuple("AtomicFlag").field(&self.load()).finish()
    }
}
