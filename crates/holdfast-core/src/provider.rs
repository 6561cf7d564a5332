use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::context::ProviderContext;
use crate::error::BoxError;

static NEXT_PROVIDER_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a provider declaration. Unique per process; clones of a
/// [`Provider`] share it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ProviderId(u64);

impl ProviderId {
    fn next() -> Self {
        Self(NEXT_PROVIDER_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

/// How long a built instance stays alive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Lifetime {
    /// Lives until the owning container is disposed.
    #[default]
    KeepAlive,
    /// Torn down as soon as it has no listeners, unless `maintain_state` is set.
    AutoDispose,
}

impl fmt::Display for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lifetime::KeepAlive => f.write_str("keep-alive"),
            Lifetime::AutoDispose => f.write_str("auto-dispose"),
        }
    }
}

pub(crate) type Factory<T> =
    Arc<dyn Fn(&ProviderContext<T>) -> Result<T, BoxError> + Send + Sync>;

/// Type-erased description of a provider, handed to observers and snapshots.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderMeta {
    pub id: ProviderId,
    pub name: Arc<str>,
    pub lifetime: Lifetime,
}

struct Definition<T> {
    meta: ProviderMeta,
    factory: Factory<T>,
}

/// A declared unit of state plus the factory that builds it.
///
/// Declaring a provider builds nothing; instances are created lazily by a
/// [`Container`](crate::Container) the first time someone watches them.
///
/// ```rust
/// use holdfast_core::*;
///
/// let greeting = Provider::auto_dispose("greeting", |ctx| {
///     ctx.on_dispose(|| log::debug!("greeting gone"));
///     Ok(String::from("hello"))
/// });
///
/// let container = Container::new();
/// let sub = container.listen(&greeting).unwrap();
/// assert_eq!(sub.read().as_str(), "hello");
/// ```
pub struct Provider<T> {
    inner: Arc<Definition<T>>,
}

impl<T> Clone for Provider<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> fmt::Debug for Provider<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provider")
            .field("id", &self.inner.meta.id)
            .field("name", &self.inner.meta.name)
            .field("lifetime", &self.inner.meta.lifetime)
            .finish()
    }
}

impl<T: Send + Sync + 'static> Provider<T> {
    /// Keep-alive provider: once built, it lives as long as its container.
    pub fn new(
        name: impl Into<Arc<str>>,
        factory: impl Fn(&ProviderContext<T>) -> Result<T, BoxError> + Send + Sync + 'static,
    ) -> Self {
        Self::with_lifetime(name, Lifetime::KeepAlive, factory)
    }

    /// Provider whose instance is disposed when its last listener goes away.
    pub fn auto_dispose(
        name: impl Into<Arc<str>>,
        factory: impl Fn(&ProviderContext<T>) -> Result<T, BoxError> + Send + Sync + 'static,
    ) -> Self {
        Self::with_lifetime(name, Lifetime::AutoDispose, factory)
    }

    pub fn with_lifetime(
        name: impl Into<Arc<str>>,
        lifetime: Lifetime,
        factory: impl Fn(&ProviderContext<T>) -> Result<T, BoxError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            inner: Arc::new(Definition {
                meta: ProviderMeta {
                    id: ProviderId::next(),
                    name: name.into(),
                    lifetime,
                },
                factory: Arc::new(factory),
            }),
        }
    }
}

impl<T> Provider<T> {
    pub fn id(&self) -> ProviderId {
        self.inner.meta.id
    }

    pub fn name(&self) -> &str {
        &self.inner.meta.name
    }

    pub fn lifetime(&self) -> Lifetime {
        self.inner.meta.lifetime
    }

    pub fn meta(&self) -> &ProviderMeta {
        &self.inner.meta
    }

    pub(crate) fn factory(&self) -> &Factory<T> {
        &self.inner.factory
    }
}
