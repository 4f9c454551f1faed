mod flag;
mod once;

pub use flag::AtomicFlag;
pub use once::{Once, PoisonedError};
