//! Disposal decisions.
//!
//! Every decision runs under the container's transition lock and re-reads
//! the listener count and `maintain_state` right before acting, so an
//! instance that regained a listener in the meantime is left alone.

use crate::container::ContainerInner;
use crate::dispose::run_in_reverse;
use crate::graph::EdgeRemoval;
use crate::instance::{InstanceKey, LifecycleState, Listener};
use crate::registry::Detached;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Decision {
    Keep,
    Defer,
    Dispose,
}

impl ContainerInner {
    /// Removes one watch edge. Losing the last one hands the target to the scheduler.
    pub(crate) fn remove_edge(&self, listener: Listener, target: InstanceKey) {
        let _transition = self.lock_transitions();
        let removal = self.registry.lock().remove_edge(listener, target);
        if removal == EdgeRemoval::LastRemoved {
            self.on_listener_count_reached_zero(target);
        }
    }

    pub(crate) fn on_listener_count_reached_zero(&self, key: InstanceKey) {
        let _transition = self.lock_transitions();
        self.apply(key, self.decide(key));
    }

    pub(crate) fn on_maintain_state_reset(&self, key: InstanceKey) {
        let _transition = self.lock_transitions();
        self.apply(key, self.decide(key));
    }

    fn decide(&self, key: InstanceKey) -> Decision {
        let mut reg = self.registry.lock();
        if reg.disposed {
            return Decision::Keep;
        }
        let Some(instance) = reg.live_mut(key) else {
            return Decision::Keep;
        };
        if !instance.is_collectable() || !instance.listeners.is_empty() {
            return Decision::Keep;
        }
        if instance.maintain_state {
            instance.transition(LifecycleState::PendingDisposal);
            Decision::Defer
        } else {
            Decision::Dispose
        }
    }

    fn apply(&self, key: InstanceKey, decision: Decision) {
        match decision {
            Decision::Keep => {}
            Decision::Defer => {
                log::debug!(
                    "[{}] `{}` has no listeners; disposal deferred by maintain_state",
                    self.name,
                    self.registry.lock().name_of(key)
                );
            }
            Decision::Dispose => self.teardown(key),
        }
    }

    /// Disposes one built instance: callbacks newest-first, slot removal,
    /// then release of the instance's own dependency edges (which may cascade).
    pub(crate) fn teardown(&self, key: InstanceKey) {
        let _transition = self.lock_transitions();
        let detached = {
            let mut reg = self.registry.lock();
            if !reg.live(key).is_some_and(|i| !i.is_building()) {
                return;
            }
            reg.detach(key)
        };
        if let Some(detached) = detached {
            self.release(key, detached, true);
        }
    }

    /// `announce` is false for builds that failed: they were never added, so
    /// observers hear about the failure instead of a disposal.
    pub(crate) fn release(&self, key: InstanceKey, detached: Detached, announce: bool) {
        let Detached {
            meta,
            disposers,
            dependencies,
        } = detached;

        for failure in run_in_reverse(&meta.name, disposers.into_iter()) {
            self.notify(|o| o.dispose_callback_failed(&self.name, &failure));
        }
        self.registry.lock().remove(key);
        if announce {
            self.notify(|o| o.did_dispose_provider(&self.name, &meta));
        }

        for dependency in dependencies {
            self.remove_edge(Listener::Instance(key), dependency);
        }
    }

    /// Container teardown. Marks the registry disposed first, which turns
    /// the per-instance scheduler off, then disposes in dependency order.
    pub(crate) fn shutdown(&self) {
        let _transition = self.lock_transitions();
        {
            let mut reg = self.registry.lock();
            if reg.disposed {
                return;
            }
            reg.disposed = true;
        }
        log::debug!("[{}] disposing container", self.name);

        while let Some(key) = self.next_for_shutdown() {
            self.teardown(key);
        }
    }

    /// The newest built instance that no live instance depends on. Falls back
    /// to the newest built instance if every candidate still has dependents.
    fn next_for_shutdown(&self) -> Option<InstanceKey> {
        let reg = self.registry.lock();
        let built = || reg.instances.iter().filter(|(_, i)| i.state().is_alive());
        built()
            .filter(|(key, _)| reg.dependents_of(*key).all(|d| reg.live(d).is_none()))
            .max_by_key(|(_, i)| i.seq)
            .or_else(|| built().max_by_key(|(_, i)| i.seq))
            .map(|(key, _)| key)
    }
}
