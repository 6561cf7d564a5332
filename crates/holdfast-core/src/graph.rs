//! Watch edges between listeners and instances.
//!
//! Every edge is stored twice: as a [`Listener`] in the target's listener
//! set and, for instance consumers, as the target's key in the consumer's
//! dependency list. Both sides are updated under the same registry lock.

use std::collections::HashSet;

use crate::instance::{InstanceKey, LifecycleState, Listener};
use crate::registry::Registry;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum EdgeRemoval {
    /// Edge (or target) did not exist.
    Missing,
    StillListened,
    /// That was the target's last listener.
    LastRemoved,
}

impl Registry {
    /// Records `listener -> target`. Returns false if either end is gone.
    pub fn add_edge(&mut self, listener: Listener, target: InstanceKey) -> bool {
        if let Listener::Instance(consumer) = listener {
            match self.live_mut(consumer) {
                Some(c) => {
                    if !c.dependencies.contains(&target) {
                        c.dependencies.push(target);
                    }
                }
                None => return false,
            }
        }
        let Some(instance) = self.live_mut(target) else {
            if let Listener::Instance(consumer) = listener
                && let Some(c) = self.instances.get_mut(consumer)
            {
                c.dependencies.retain(|k| *k != target);
            }
            return false;
        };
        instance.listeners.insert(listener);
        if instance.state() == LifecycleState::PendingDisposal {
            instance.transition(LifecycleState::Active);
        }
        log::trace!(
            "edge {:?} -> `{}` ({} listeners)",
            listener,
            instance.meta.name,
            instance.listeners.len()
        );
        true
    }

    pub fn remove_edge(&mut self, listener: Listener, target: InstanceKey) -> EdgeRemoval {
        if let Listener::Instance(consumer) = listener
            && let Some(c) = self.instances.get_mut(consumer)
        {
            c.dependencies.retain(|k| *k != target);
        }
        let Some(instance) = self.live_mut(target) else {
            return EdgeRemoval::Missing;
        };
        if !instance.listeners.remove(&listener) {
            return EdgeRemoval::Missing;
        }
        log::trace!(
            "edge {:?} -/-> `{}` ({} listeners)",
            listener,
            instance.meta.name,
            instance.listeners.len()
        );
        if instance.listeners.is_empty() {
            EdgeRemoval::LastRemoved
        } else {
            EdgeRemoval::StillListened
        }
    }

    /// Dependency chain `from -> .. -> to`, both ends included, if `from`
    /// transitively watches `to`.
    pub fn dependency_path(&self, from: InstanceKey, to: InstanceKey) -> Option<Vec<InstanceKey>> {
        fn walk(
            reg: &Registry,
            at: InstanceKey,
            to: InstanceKey,
            seen: &mut HashSet<InstanceKey>,
            path: &mut Vec<InstanceKey>,
        ) -> bool {
            path.push(at);
            if at == to {
                return true;
            }
            if seen.insert(at)
                && let Some(instance) = reg.instances.get(at)
            {
                for dep in &instance.dependencies {
                    if walk(reg, *dep, to, seen, path) {
                        return true;
                    }
                }
            }
            path.pop();
            false
        }

        let mut path = Vec::new();
        walk(self, from, to, &mut HashSet::new(), &mut path).then_some(path)
    }

    /// Instances holding an edge onto `target`.
    pub fn dependents_of(&self, target: InstanceKey) -> impl Iterator<Item = InstanceKey> + '_ {
        self.instances
            .get(target)
            .into_iter()
            .flat_map(|i| i.listeners.iter())
            .filter_map(|l| match l {
                Listener::Instance(k) => Some(*k),
                Listener::External(_) => None,
            })
    }
}
