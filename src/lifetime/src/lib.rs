pub mod cleanup;
pub mod error;
pub mod lifetime;
pub mod sync;

pub mod prelude {
    pub use crate::cleanup::{Cleanup, CleanupHandle, Teardown};
    pub use crate::error::LifetimeError;
    pub use crate::lifetime::{Lifetime, Singleton, Transient};
}
