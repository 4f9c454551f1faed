mod singleton;
mod transient;

use std::error::Error;
use std::sync::Arc;

use crate::error::LifetimeError;

pub use singleton::Singleton;
pub use transient::Transient;

/// A type that controls when and how many times instances of `T` are
/// constructed.
///
/// A [`Lifetime`] hides the construction policy from whoever requests an
/// instance. A [`Singleton`] constructs at most one instance and replays it
/// (or its failure) on every request, while a [`Transient`] constructs a new
/// instance each time.
///
/// Lifetimes are composed into object graphs by requesting dependencies from
/// inside a constructor:
///
/// ```rust
/// # use std::sync::Arc;
/// # use std::convert::Infallible;
/// # use lifetime::prelude::*;
/// let port = Arc::new(Singleton::new(|| Ok::<_, Infallible>(8080u16)));
/// let address = Transient::new({
///     let port = Arc::clone(&port);
///     move || port.instance().map(|port| format!("127.0.0.1:{port}"))
/// });
///
/// assert_eq!(address.must_instance(), "127.0.0.1:8080");
/// ```
#[cfg_attr(test, mockall::automock)]
pub trait Lifetime<T: Send + Sync + 'static>: Send + Sync {
    /// Returns an instance of `T`.
    ///
    /// # Errors
    ///
    /// Returns an error if the instance could not be constructed.
    fn instance(&self) -> Result<T, LifetimeError>;

    /// Calls [`Lifetime::instance`] and panics if an error occurs.
    ///
    /// # Panics
    ///
    /// Panics with the error's message if the instance could not be
    /// constructed.
    fn must_instance(&self) -> T {
        match self.instance() {
            Ok(instance) => instance,
            Err(err) => panic!("{err}"),
        }
    }
}

impl<T, L> Lifetime<T> for &L
where
    T: Send + Sync + 'static,
    L: Lifetime<T> + ?Sized,
{
    fn instance(&self) -> Result<T, LifetimeError> {
        (**self).instance()
    }
}

impl<T, L> Lifetime<T> for Box<L>
where
    T: Send + Sync + 'static,
    L: Lifetime<T> + ?Sized,
{
    fn instance(&self) -> Result<T, LifetimeError> {
        (**self).instance()
    }
}

impl<T, L> Lifetime<T> for Arc<L>
where
    T: Send + Sync + 'static,
    L: Lifetime<T> + ?Sized,
{
    fn instance(&self) -> Result<T, LifetimeError> {
        (**self).instance()
    }
}

pub(crate) type Constructor<T> = Box<dyn Fn() -> Result<T, LifetimeError> + Send + Sync>;

pub(crate) type CleanupFn<T> = Box<dyn Fn(T) + Send + Sync>;

pub(crate) fn boxed_constructor<T, F, E>(construct: F) -> Constructor<T>
where
    T: Send + Sync + 'static,
    F: Fn() -> Result<T, E> + Send + Sync + 'static,
    E: Into<Box<dyn Error + Send + Sync>>,
{
    Box::new(move || construct().map_err(LifetimeError::construction::<T, E>))
}

pub(crate) fn boxed_cleanup<T, C>(cleanup: C) -> CleanupFn<T>
where
    C: Fn(T) + Send + Sync + 'static,
{
    Box::new(cleanup)
}
