use std::any::Any;
use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use parking_lot::{Mutex, ReentrantMutex, ReentrantMutexGuard};

use crate::config::ContainerConfig;
use crate::context::ProviderContext;
use crate::dispose::Disposer;
use crate::error::{Error, PanicMessage, Result, panic_message};
use crate::instance::{InstanceKey, LifecycleState, Listener};
use crate::observer::ContainerObserver;
use crate::provider::{Factory, Provider, ProviderId, ProviderMeta};
use crate::registry::Registry;
use crate::snapshot::ContainerSnapshot;
use crate::subscription::Subscription;

/// An explicitly owned scope of provider instances.
///
/// Instances are built lazily, at most one per provider, and live until the
/// scheduler collects them or the container is disposed. Clones share the
/// same scope; dropping the last clone disposes it.
///
/// ```rust
/// use holdfast_core::*;
///
/// let container = Container::new();
/// let answer = Provider::auto_dispose("answer", |_| Ok(42));
///
/// let sub = container.listen(&answer).unwrap();
/// assert_eq!(*sub.read(), 42);
/// assert_eq!(container.state_of(&answer), Some(LifecycleState::Active));
///
/// drop(sub);
/// assert!(!container.exists(&answer));
/// ```
#[derive(Clone)]
pub struct Container {
    inner: Arc<ContainerInner>,
}

pub(crate) struct ContainerInner {
    pub(crate) name: Arc<str>,
    /// Serializes every resolve and dispose transition. Re-entrant so
    /// factories can watch other providers on the same thread.
    transitions: ReentrantMutex<()>,
    /// Never held while user code runs.
    pub(crate) registry: Mutex<Registry>,
    observers: Vec<Arc<dyn ContainerObserver>>,
    overrides: HashMap<ProviderId, Arc<dyn Any + Send + Sync>>,
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("name", &self.inner.name)
            .field("live", &self.live_count())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

impl Container {
    pub fn new() -> Self {
        Self::with_config(ContainerConfig::default())
    }

    pub fn with_config(config: ContainerConfig) -> Self {
        let parts = config.into_parts();
        Self {
            inner: Arc::new(ContainerInner {
                name: parts.name.into(),
                transitions: ReentrantMutex::new(()),
                registry: Mutex::new(Registry::default()),
                observers: parts.observers,
                overrides: parts.overrides,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// One-off read. Builds the instance if needed; an auto-dispose instance
    /// nobody listens to is disposed again right after the read unless its
    /// factory asked to maintain state.
    pub fn read<T: Send + Sync + 'static>(&self, provider: &Provider<T>) -> Result<Arc<T>> {
        self.inner.read(provider)
    }

    /// Resolves `provider` and holds it alive until the returned
    /// subscription is closed or dropped.
    pub fn listen<T: Send + Sync + 'static>(
        &self,
        provider: &Provider<T>,
    ) -> Result<Subscription<T>> {
        self.inner.listen(provider)
    }

    pub fn exists<T>(&self, provider: &Provider<T>) -> bool {
        self.state_of(provider).is_some()
    }

    /// Lifecycle state of the live instance of `provider`, if any.
    pub fn state_of<T>(&self, provider: &Provider<T>) -> Option<LifecycleState> {
        let reg = self.inner.registry.lock();
        let key = reg.lookup(provider.id())?;
        reg.live(key).map(|i| i.state())
    }

    pub fn listener_count<T>(&self, provider: &Provider<T>) -> usize {
        let reg = self.inner.registry.lock();
        reg.lookup(provider.id())
            .and_then(|k| reg.live(k))
            .map_or(0, |i| i.listeners.len())
    }

    pub fn maintains_state<T>(&self, provider: &Provider<T>) -> bool {
        let reg = self.inner.registry.lock();
        reg.lookup(provider.id())
            .and_then(|k| reg.live(k))
            .is_some_and(|i| i.maintain_state)
    }

    /// Same as [`ProviderContext::set_maintain_state`] on the live instance.
    /// Returns false if `provider` has no live instance.
    pub fn set_maintain_state<T>(&self, provider: &Provider<T>, maintain: bool) -> bool {
        let key = {
            let reg = self.inner.registry.lock();
            reg.lookup(provider.id()).filter(|k| reg.live(*k).is_some())
        };
        match key {
            Some(key) => {
                self.inner.set_maintain_state(key, maintain);
                true
            }
            None => false,
        }
    }

    pub fn live_count(&self) -> usize {
        let reg = self.inner.registry.lock();
        reg.instances
            .values()
            .filter(|i| i.state() != LifecycleState::Disposed)
            .count()
    }

    pub fn snapshot(&self) -> ContainerSnapshot {
        ContainerSnapshot::capture(&self.inner.name, &self.inner.registry.lock())
    }

    /// Tears down every instance, dependents before their dependencies.
    /// Later calls on this container fail with [`Error::ContainerDisposed`].
    pub fn dispose(&self) {
        self.inner.shutdown();
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.registry.lock().disposed
    }
}

impl ContainerInner {
    pub(crate) fn lock_transitions(&self) -> ReentrantMutexGuard<'_, ()> {
        self.transitions.lock()
    }

    pub(crate) fn disposed_error(&self) -> Error {
        Error::ContainerDisposed {
            container: self.name.to_string(),
        }
    }

    pub(crate) fn notify(&self, event: impl Fn(&dyn ContainerObserver)) {
        for observer in &self.observers {
            event(observer.as_ref());
        }
    }

    fn factory_for<T: Send + Sync + 'static>(&self, provider: &Provider<T>) -> Result<Factory<T>> {
        match self.overrides.get(&provider.id()) {
            Some(any) => any
                .downcast_ref::<Factory<T>>()
                .cloned()
                .ok_or_else(|| Error::TypeMismatch {
                    provider: provider.name().to_string(),
                }),
            None => Ok(provider.factory().clone()),
        }
    }

    /// Returns the live instance of `provider` or builds one.
    ///
    /// At most one instance per provider exists at a time. A failed build
    /// registers nothing: callbacks registered during the attempt run and
    /// dependencies it watched are released before the error is returned.
    pub(crate) fn resolve<T: Send + Sync + 'static>(
        self: &Arc<Self>,
        provider: &Provider<T>,
    ) -> Result<(InstanceKey, Arc<T>)> {
        let _transition = self.lock_transitions();
        let meta = provider.meta();

        let key = {
            let mut reg = self.registry.lock();
            if reg.disposed {
                return Err(self.disposed_error());
            }
            if let Some(key) = reg.lookup(meta.id)
                && let Some(instance) = reg.live(key)
            {
                let Some(value) = instance.value.clone() else {
                    let path = reg
                        .cycle_path(meta.id, &meta.name)
                        .unwrap_or_else(|| vec![meta.name.to_string(), meta.name.to_string()]);
                    return Err(Error::CyclicDependency { path });
                };
                drop(reg);
                return downcast(value, meta).map(|v| (key, v));
            }
            reg.begin_build(meta.clone())
        };

        log::debug!("[{}] building `{}`", self.name, meta.name);
        let built = self.factory_for(provider).and_then(|factory| {
            let ctx = ProviderContext::new(self, key, meta.clone());
            match catch_unwind(AssertUnwindSafe(|| factory(&ctx))) {
                Ok(Ok(value)) => Ok(value),
                Ok(Err(source)) => Err(Error::from_factory(&meta.name, source)),
                Err(payload) => Err(Error::Factory {
                    provider: meta.name.to_string(),
                    source: Box::new(PanicMessage(panic_message(payload.as_ref()))),
                }),
            }
        });

        let result = built.and_then(|value| {
            let value = Arc::new(value);
            let erased: Arc<dyn Any + Send + Sync> = value.clone();
            let mut reg = self.registry.lock();
            if !reg.disposed && reg.finish_build(key, erased) {
                Ok(value)
            } else {
                Err(self.disposed_error())
            }
        });

        match result {
            Ok(value) => {
                self.notify(|o| o.did_add_provider(&self.name, meta));
                Ok((key, value))
            }
            Err(error) => {
                let detached = self.registry.lock().abandon_build(key);
                if let Some(detached) = detached {
                    self.release(key, detached, false);
                }
                self.notify(|o| o.provider_did_fail(&self.name, meta, &error));
                Err(error)
            }
        }
    }

    fn read<T: Send + Sync + 'static>(self: &Arc<Self>, provider: &Provider<T>) -> Result<Arc<T>> {
        let _transition = self.lock_transitions();
        let (key, value) = self.resolve(provider)?;
        // A read is not a listener; an unlistened auto-dispose instance goes now.
        self.on_listener_count_reached_zero(key);
        Ok(value)
    }

    fn listen<T: Send + Sync + 'static>(
        self: &Arc<Self>,
        provider: &Provider<T>,
    ) -> Result<Subscription<T>> {
        let _transition = self.lock_transitions();
        let (key, value) = self.resolve(provider)?;
        let id = {
            let mut reg = self.registry.lock();
            let id = reg.next_subscription_id();
            if !reg.add_edge(Listener::External(id), key) {
                return Err(Error::InstanceDisposed {
                    provider: provider.name().to_string(),
                });
            }
            id
        };
        Ok(Subscription::new(
            Arc::downgrade(self),
            key,
            id,
            value,
            provider.meta().clone(),
        ))
    }

    /// `consumer` watches `provider`: resolve, then record the edge.
    pub(crate) fn watch_from<U: Send + Sync + 'static>(
        self: &Arc<Self>,
        consumer: InstanceKey,
        consumer_meta: &ProviderMeta,
        provider: &Provider<U>,
    ) -> Result<Arc<U>> {
        let _transition = self.lock_transitions();
        {
            let reg = self.registry.lock();
            if reg.disposed {
                return Err(self.disposed_error());
            }
            if reg.live(consumer).is_none() {
                return Err(Error::InstanceDisposed {
                    provider: consumer_meta.name.to_string(),
                });
            }
        }

        let (target, value) = self.resolve(provider)?;
        {
            // A late watch must not close a loop, whether the target was
            // already built or has just been built by this call.
            let reg = self.registry.lock();
            let chain = if target == consumer {
                Some(vec![consumer])
            } else {
                reg.dependency_path(target, consumer)
            };
            if let Some(chain) = chain {
                let mut path = vec![consumer_meta.name.to_string()];
                path.extend(chain.into_iter().map(|k| reg.name_of(k)));
                drop(reg);
                if target != consumer {
                    self.on_listener_count_reached_zero(target);
                }
                return Err(Error::CyclicDependency { path });
            }
        }

        let added = self
            .registry
            .lock()
            .add_edge(Listener::Instance(consumer), target);
        if !added {
            self.on_listener_count_reached_zero(target);
            return Err(Error::InstanceDisposed {
                provider: consumer_meta.name.to_string(),
            });
        }
        Ok(value)
    }

    pub(crate) fn add_disposer(&self, key: InstanceKey, disposer: Disposer) -> bool {
        let mut reg = self.registry.lock();
        match reg.live_mut(key) {
            Some(instance) => {
                instance.disposers.push(disposer);
                true
            }
            None => false,
        }
    }

    pub(crate) fn maintain_state_of(&self, key: InstanceKey) -> bool {
        self.registry
            .lock()
            .live(key)
            .is_some_and(|i| i.maintain_state)
    }

    pub(crate) fn is_live(&self, key: InstanceKey) -> bool {
        self.registry.lock().live(key).is_some()
    }

    pub(crate) fn set_maintain_state(&self, key: InstanceKey, maintain: bool) {
        let _transition = self.lock_transitions();
        {
            let mut reg = self.registry.lock();
            let Some(instance) = reg.live_mut(key) else {
                return;
            };
            instance.maintain_state = maintain;
        }
        if !maintain {
            self.on_maintain_state_reset(key);
        }
    }
}

fn downcast<T: Send + Sync + 'static>(
    value: Arc<dyn Any + Send + Sync>,
    meta: &ProviderMeta,
) -> Result<Arc<T>> {
    value.downcast::<T>().map_err(|_| Error::TypeMismatch {
        provider: meta.name.to_string(),
    })
}

impl Drop for ContainerInner {
    fn drop(&mut self) {
        self.shutdown();
    }
}
