use std::any;
use std::error::Error;
use std::sync::Arc;

use snafu::prelude::*;

/// An error returned by a [`Lifetime`] whose constructor failed.
///
/// The error produced by the constructor is kept as the [`Error::source`] of
/// this error. It is shared rather than owned, so that a [`Singleton`] can
/// hand the same failure to every caller.
///
/// [`Lifetime`]: crate::lifetime::Lifetime
/// [`Singleton`]: crate::lifetime::Singleton
#[derive(Debug, Clone, Snafu)]
#[non_exhaustive]
pub enum LifetimeError {
    #[snafu(display("could not construct {type_name}: {source}"))]
    #[non_exhaustive]
    Construction {
        type_name: &'static str,
        source: Arc<dyn Error + Send + Sync>,
    },
}

impl LifetimeError {
    pub(crate) fn construction<T, E>(err: E) -> Self
    where
        E: Into<Box<dyn Error + Send + Sync>>,
    {
        Self::Construction {
            type_name: any::type_name::<T>(),
            source: Arc::from(err.into()),
        }
    }

    /// Returns the error reported by the constructor.
    pub fn construction_error(&self) -> &Arc<dyn Error + Send + Sync> {
        match self {
            Self::Construction { source, .. } => source,
        }
    }
}
