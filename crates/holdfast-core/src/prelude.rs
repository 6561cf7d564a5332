pub use crate::config::ContainerConfig;
pub use crate::container::Container;
pub use crate::context::ProviderContext;
pub use crate::dispose::Disposer;
pub use crate::error::{BoxError, DisposeFailure, Error, Result};
pub use crate::instance::{LifecycleState, SubscriptionId};
pub use crate::observer::{ContainerObserver, LogObserver};
pub use crate::provider::{Lifetime, Provider, ProviderId, ProviderMeta};
pub use crate::snapshot::{ContainerSnapshot, InstanceSnapshot};
pub use crate::subscription::Subscription;
