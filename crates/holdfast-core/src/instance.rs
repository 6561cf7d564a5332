use std::any::Any;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use smallvec::SmallVec;
use web_time::Instant;

use crate::dispose::Disposer;
use crate::provider::{Lifetime, ProviderMeta};

slotmap::new_key_type! {
    /// Generational handle to a live instance. A disposed instance's key is
    /// never handed out again, so stale handles simply miss.
    pub struct InstanceKey;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub(crate) u64);

/// Who holds a watch edge onto an instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Listener {
    /// Another provider instance watched it.
    Instance(InstanceKey),
    /// A [`Subscription`](crate::Subscription) handle.
    External(SubscriptionId),
}

/// Lifecycle of a single provider instance.
///
/// ```text
/// Uninitialized -> Active -> PendingDisposal -> Disposed
///                    |   <-------'                ^
///                    '----------------------------'
/// ```
///
/// `Active` means alive and not waiting for teardown; a keep-alive instance
/// stays `Active` even with zero listeners. `PendingDisposal` is an
/// auto-dispose instance with zero listeners held back by `maintain_state`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum LifecycleState {
    /// Factory is running.
    Uninitialized,
    Active,
    PendingDisposal,
    Disposed,
}

impl LifecycleState {
    pub fn can_become(self, next: LifecycleState) -> bool {
        use LifecycleState::*;
        matches!(
            (self, next),
            (Uninitialized, Active)
                | (Uninitialized, Disposed)
                | (Active, PendingDisposal)
                | (Active, Disposed)
                | (PendingDisposal, Active)
                | (PendingDisposal, Disposed)
        )
    }

    pub fn is_alive(self) -> bool {
        matches!(self, LifecycleState::Active | LifecycleState::PendingDisposal)
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Per-instance state container, owned by the registry.
pub(crate) struct ProviderInstance {
    pub meta: ProviderMeta,
    state: LifecycleState,
    /// `None` while the factory runs.
    pub value: Option<Arc<dyn Any + Send + Sync>>,
    pub listeners: HashSet<Listener>,
    /// Instances this one watched, in first-watch order.
    pub dependencies: SmallVec<[InstanceKey; 4]>,
    pub maintain_state: bool,
    pub disposers: SmallVec<[Disposer; 2]>,
    pub created_at: Instant,
    /// Build completion order; 0 until built.
    pub seq: u64,
}

impl ProviderInstance {
    pub fn new(meta: ProviderMeta) -> Self {
        Self {
            meta,
            state: LifecycleState::Uninitialized,
            value: None,
            listeners: HashSet::new(),
            dependencies: SmallVec::new(),
            maintain_state: false,
            disposers: SmallVec::new(),
            created_at: Instant::now(),
            seq: 0,
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Guarded state change. Illegal moves are refused and logged.
    pub fn transition(&mut self, next: LifecycleState) -> bool {
        if self.state == next {
            return true;
        }
        if !self.state.can_become(next) {
            log::warn!(
                "provider `{}`: refused lifecycle move {} -> {}",
                self.meta.name,
                self.state,
                next
            );
            return false;
        }
        log::trace!("provider `{}`: {} -> {}", self.meta.name, self.state, next);
        self.state = next;
        true
    }

    pub fn is_building(&self) -> bool {
        self.state == LifecycleState::Uninitialized
    }

    /// Only built auto-dispose instances are ever torn down by the scheduler.
    pub fn is_collectable(&self) -> bool {
        self.meta.lifetime == Lifetime::AutoDispose && self.state.is_alive()
    }

    pub fn external_listeners(&self) -> usize {
        self.listeners
            .iter()
            .filter(|l| matches!(l, Listener::External(_)))
            .count()
    }
}
