use std::time::Duration;

use crate::instance::LifecycleState;
use crate::provider::{Lifetime, ProviderId};
use crate::registry::Registry;

/// Point-in-time view of one instance.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct InstanceSnapshot {
    pub provider: String,
    pub provider_id: ProviderId,
    pub lifetime: Lifetime,
    pub state: LifecycleState,
    pub listeners: usize,
    pub external_listeners: usize,
    pub maintain_state: bool,
    /// Provider names this instance watches, in first-watch order.
    pub dependencies: Vec<String>,
    pub disposers: usize,
    pub age: Duration,
}

/// Point-in-time view of a container, instances in build order.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ContainerSnapshot {
    pub container: String,
    pub disposed: bool,
    pub instances: Vec<InstanceSnapshot>,
}

impl ContainerSnapshot {
    pub(crate) fn capture(container: &str, reg: &Registry) -> Self {
        let mut live: Vec<_> = reg
            .instances
            .values()
            .filter(|i| i.state() != LifecycleState::Disposed)
            .collect();
        // Still-building instances have no sequence number yet; list them last.
        live.sort_by_key(|i| (i.seq == 0, i.seq));

        let instances = live
            .into_iter()
            .map(|i| InstanceSnapshot {
                provider: i.meta.name.to_string(),
                provider_id: i.meta.id,
                lifetime: i.meta.lifetime,
                state: i.state(),
                listeners: i.listeners.len(),
                external_listeners: i.external_listeners(),
                maintain_state: i.maintain_state,
                dependencies: i.dependencies.iter().map(|k| reg.name_of(*k)).collect(),
                disposers: i.disposers.len(),
                age: i.created_at.elapsed(),
            })
            .collect();

        Self {
            container: container.to_string(),
            disposed: reg.disposed,
            instances,
        }
    }

    pub fn get(&self, provider: &str) -> Option<&InstanceSnapshot> {
        self.instances.iter().find(|i| i.provider == provider)
    }

    /// Instances kept past their last listener by `maintain_state`.
    pub fn pending(&self) -> impl Iterator<Item = &InstanceSnapshot> {
        self.instances
            .iter()
            .filter(|i| i.state == LifecycleState::PendingDisposal)
    }
}
