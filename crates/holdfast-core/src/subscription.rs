use std::fmt;
use std::sync::{Arc, Weak};

use crate::container::ContainerInner;
use crate::instance::{InstanceKey, Listener, SubscriptionId};
use crate::provider::ProviderMeta;

/// An external listener edge onto a provider instance.
///
/// Holding one keeps the instance alive; closing or dropping it removes the
/// edge, which may dispose an auto-dispose instance. A subscription does not
/// keep its container alive.
#[must_use = "dropping a subscription immediately removes its listener"]
pub struct Subscription<T> {
    container: Weak<ContainerInner>,
    key: InstanceKey,
    id: SubscriptionId,
    value: Arc<T>,
    meta: ProviderMeta,
    closed: bool,
}

impl<T> Subscription<T> {
    pub(crate) fn new(
        container: Weak<ContainerInner>,
        key: InstanceKey,
        id: SubscriptionId,
        value: Arc<T>,
        meta: ProviderMeta,
    ) -> Self {
        Self {
            container,
            key,
            id,
            value,
            meta,
            closed: false,
        }
    }

    pub fn read(&self) -> Arc<T> {
        self.value.clone()
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn provider(&self) -> &ProviderMeta {
        &self.meta
    }

    /// Explicit unwatch. Same as dropping the handle.
    pub fn close(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if std::mem::replace(&mut self.closed, true) {
            return;
        }
        if let Some(container) = self.container.upgrade() {
            container.remove_edge(Listener::External(self.id), self.key);
        }
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<T: fmt::Debug> fmt::Debug for Subscription<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("provider", &self.meta.name)
            .field("id", &self.id)
            .field("value", &self.value)
            .finish()
    }
}
