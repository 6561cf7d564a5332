use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, Weak};

use crate::container::ContainerInner;
use crate::dispose::Disposer;
use crate::error::{Error, Result};
use crate::instance::InstanceKey;
use crate::provider::{Provider, ProviderMeta};

/// Handle a factory receives for the instance it is building.
///
/// The context holds only a weak reference to its container and may be
/// cloned into workers, timers or callbacks that outlive the factory call.
/// Once the instance is disposed every method degrades gracefully:
/// `watch` fails with [`Error::InstanceDisposed`], `on_dispose` runs the
/// callback immediately and `set_maintain_state` is a no-op.
pub struct ProviderContext<T> {
    container: Weak<ContainerInner>,
    container_name: Arc<str>,
    key: InstanceKey,
    meta: ProviderMeta,
    _value: PhantomData<fn() -> T>,
}

impl<T> Clone for ProviderContext<T> {
    fn clone(&self) -> Self {
        Self {
            container: self.container.clone(),
            container_name: self.container_name.clone(),
            key: self.key,
            meta: self.meta.clone(),
            _value: PhantomData,
        }
    }
}

impl<T> fmt::Debug for ProviderContext<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderContext")
            .field("provider", &self.meta.name)
            .field("container", &self.container_name)
            .field("key", &self.key)
            .finish()
    }
}

impl<T> ProviderContext<T> {
    pub(crate) fn new(
        container: &Arc<ContainerInner>,
        key: InstanceKey,
        meta: ProviderMeta,
    ) -> Self {
        Self {
            container: Arc::downgrade(container),
            container_name: container.name.clone(),
            key,
            meta,
            _value: PhantomData,
        }
    }

    fn container(&self) -> Result<Arc<ContainerInner>> {
        self.container.upgrade().ok_or_else(|| Error::ContainerDisposed {
            container: self.container_name.to_string(),
        })
    }

    pub fn provider(&self) -> &ProviderMeta {
        &self.meta
    }

    pub fn provider_name(&self) -> &str {
        &self.meta.name
    }

    /// Resolves `provider` and records that this instance depends on it.
    /// The dependency stays alive at least as long as this instance does.
    pub fn watch<U: Send + Sync + 'static>(&self, provider: &Provider<U>) -> Result<Arc<U>> {
        self.container()?.watch_from(self.key, &self.meta, provider)
    }

    /// Registers a cleanup. Callbacks run once, newest first, when the
    /// instance is torn down.
    pub fn on_dispose(&self, f: impl FnOnce() + Send + 'static) {
        let disposer = Disposer::new(f);
        let registered = match self.container.upgrade() {
            Some(container) => container.add_disposer(self.key, disposer.clone()),
            None => false,
        };
        if !registered {
            log::debug!(
                "provider `{}` already disposed; running on_dispose callback now",
                self.meta.name
            );
            if let Err(failure) = disposer.run_guarded(&self.meta.name) {
                log::warn!("{failure}");
            }
        }
    }

    pub fn maintain_state(&self) -> bool {
        self.container
            .upgrade()
            .is_some_and(|c| c.maintain_state_of(self.key))
    }

    /// While set, the instance survives losing its last listener. Clearing
    /// it on an instance that has no listeners disposes the instance.
    pub fn set_maintain_state(&self, maintain: bool) {
        if let Some(container) = self.container.upgrade() {
            container.set_maintain_state(self.key, maintain);
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.container
            .upgrade()
            .is_none_or(|c| !c.is_live(self.key))
    }
}
