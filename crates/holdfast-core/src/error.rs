use std::any::Any;

/// Error type factories return. Anything `Send + Sync` that implements
/// `std::error::Error` converts into it with `?`.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Resolving a provider would close a loop in the dependency graph.
    /// `path` lists provider names from the first repeated provider back to itself.
    #[error("cyclic dependency: {}", path.join(" -> "))]
    CyclicDependency { path: Vec<String> },

    #[error("provider `{provider}` failed to build")]
    Factory {
        provider: String,
        #[source]
        source: BoxError,
    },

    #[error("provider `{provider}` has already been disposed")]
    InstanceDisposed { provider: String },

    #[error("container `{container}` has been disposed")]
    ContainerDisposed { container: String },

    #[error("provider `{provider}` holds a value of an unexpected type")]
    TypeMismatch { provider: String },
}

impl Error {
    pub fn is_cycle(&self) -> bool {
        matches!(self, Error::CyclicDependency { .. })
    }

    /// Unwraps factory errors that carry a cycle so the cycle surfaces at the
    /// outermost resolve instead of being buried under one `Factory` per level.
    pub(crate) fn from_factory(provider: &str, source: BoxError) -> Self {
        match source.downcast::<Error>() {
            Ok(inner) if inner.is_cycle() => *inner,
            Ok(inner) => Error::Factory {
                provider: provider.to_string(),
                source: inner,
            },
            Err(source) => Error::Factory {
                provider: provider.to_string(),
                source,
            },
        }
    }
}

/// A disposal callback that panicked. Reported to observers, never returned
/// to the consumer whose edge removal triggered the teardown.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("disposal callback of `{provider}` panicked: {message}")]
pub struct DisposeFailure {
    pub provider: String,
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub(crate) struct PanicMessage(pub String);

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    }
}
