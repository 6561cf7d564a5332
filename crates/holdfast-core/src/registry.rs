use std::collections::HashMap;

use slotmap::SlotMap;
use smallvec::SmallVec;

use crate::dispose::Disposer;
use crate::instance::{InstanceKey, LifecycleState, ProviderInstance, SubscriptionId};
use crate::provider::{ProviderId, ProviderMeta};

/// Everything a teardown needs once an instance has been detached.
pub(crate) struct Detached {
    pub meta: ProviderMeta,
    pub disposers: SmallVec<[Disposer; 2]>,
    pub dependencies: SmallVec<[InstanceKey; 4]>,
}

/// Live instances of one container, keyed by provider identity.
#[derive(Default)]
pub(crate) struct Registry {
    pub instances: SlotMap<InstanceKey, ProviderInstance>,
    pub by_provider: HashMap<ProviderId, InstanceKey>,
    /// Resolution stack: instances whose factory is currently running.
    pub building: Vec<InstanceKey>,
    pub disposed: bool,
    next_subscription: u64,
    next_seq: u64,
}

impl Registry {
    /// The instance behind `key`, unless it is gone or already torn down.
    pub fn live(&self, key: InstanceKey) -> Option<&ProviderInstance> {
        self.instances
            .get(key)
            .filter(|i| i.state() != LifecycleState::Disposed)
    }

    pub fn live_mut(&mut self, key: InstanceKey) -> Option<&mut ProviderInstance> {
        self.instances
            .get_mut(key)
            .filter(|i| i.state() != LifecycleState::Disposed)
    }

    pub fn lookup(&self, id: ProviderId) -> Option<InstanceKey> {
        self.by_provider.get(&id).copied()
    }

    pub fn begin_build(&mut self, meta: ProviderMeta) -> InstanceKey {
        let id = meta.id;
        let key = self.instances.insert(ProviderInstance::new(meta));
        self.by_provider.insert(id, key);
        self.building.push(key);
        key
    }

    pub fn finish_build(
        &mut self,
        key: InstanceKey,
        value: std::sync::Arc<dyn std::any::Any + Send + Sync>,
    ) -> bool {
        self.building.retain(|k| *k != key);
        self.next_seq += 1;
        let seq = self.next_seq;
        match self.instances.get_mut(key) {
            Some(instance) if instance.is_building() => {
                instance.value = Some(value);
                instance.seq = seq;
                instance.transition(LifecycleState::Active)
            }
            _ => false,
        }
    }

    /// Drops a half-built instance entirely.
    pub fn abandon_build(&mut self, key: InstanceKey) -> Option<Detached> {
        self.building.retain(|k| *k != key);
        let mut instance = self.instances.remove(key)?;
        if self.by_provider.get(&instance.meta.id) == Some(&key) {
            self.by_provider.remove(&instance.meta.id);
        }
        instance.transition(LifecycleState::Disposed);
        Some(Detached {
            meta: instance.meta,
            disposers: instance.disposers,
            dependencies: instance.dependencies,
        })
    }

    /// Marks a built instance disposed and unhooks it from its provider so
    /// the next watch builds a fresh one. The slot itself is freed by
    /// [`remove`](Self::remove) once the disposers have run.
    pub fn detach(&mut self, key: InstanceKey) -> Option<Detached> {
        let instance = self.live_mut(key)?;
        if !instance.transition(LifecycleState::Disposed) {
            return None;
        }
        let meta = instance.meta.clone();
        let disposers = std::mem::take(&mut instance.disposers);
        let dependencies = std::mem::take(&mut instance.dependencies);
        if self.by_provider.get(&meta.id) == Some(&key) {
            self.by_provider.remove(&meta.id);
        }
        Some(Detached {
            meta,
            disposers,
            dependencies,
        })
    }

    pub fn remove(&mut self, key: InstanceKey) {
        self.instances.remove(key);
    }

    /// Provider names from the building instance of `id` to the top of the
    /// resolution stack, closed with `name`. `None` if `id` is not building.
    pub fn cycle_path(&self, id: ProviderId, name: &str) -> Option<Vec<String>> {
        let start = self
            .building
            .iter()
            .position(|k| self.instances.get(*k).is_some_and(|i| i.meta.id == id))?;
        let mut path: Vec<String> = self.building[start..]
            .iter()
            .filter_map(|k| self.instances.get(*k))
            .map(|i| i.meta.name.to_string())
            .collect();
        path.push(name.to_string());
        Some(path)
    }

    pub fn next_subscription_id(&mut self) -> SubscriptionId {
        self.next_subscription += 1;
        SubscriptionId(self.next_subscription)
    }

    pub fn name_of(&self, key: InstanceKey) -> String {
        self.instances
            .get(key)
            .map(|i| i.meta.name.to_string())
            .unwrap_or_else(|| "<gone>".to_string())
    }
}
