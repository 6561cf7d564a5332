use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use crate::context::ProviderContext;
use crate::error::BoxError;
use crate::observer::{ContainerObserver, LogObserver};
use crate::provider::{Factory, Provider, ProviderId};

/// Settings for a [`Container`](crate::Container).
///
/// ```rust
/// use holdfast_core::*;
///
/// let base_url = Provider::new("base_url", |_| Ok(String::from("https://example.org")));
///
/// let config = ContainerConfig::default()
///     .named("test")
///     .override_with(&base_url, |_| Ok(String::from("http://localhost:8080")));
///
/// let container = Container::with_config(config);
/// assert_eq!(container.read(&base_url).unwrap().as_str(), "http://localhost:8080");
/// ```
pub struct ContainerConfig {
    pub(crate) name: String,
    pub(crate) observers: Vec<Arc<dyn ContainerObserver>>,
    pub(crate) log_observer: bool,
    /// Each value is a `Factory<T>` for the provider with that id.
    pub(crate) overrides: HashMap<ProviderId, Arc<dyn Any + Send + Sync>>,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            name: "root".to_string(),
            observers: Vec::new(),
            log_observer: true,
            overrides: HashMap::new(),
        }
    }
}

impl ContainerConfig {
    /// Name used in log lines, errors and snapshots.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn observer(mut self, observer: impl ContainerObserver) -> Self {
        self.observers.push(Arc::new(observer));
        self
    }

    pub fn shared_observer(mut self, observer: Arc<dyn ContainerObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Toggles the built-in [`LogObserver`] (on by default).
    pub fn with_log_observer(mut self, enabled: bool) -> Self {
        self.log_observer = enabled;
        self
    }

    /// Builds `provider` with `factory` in this container instead of its
    /// declared factory. Identity and lifetime stay the same.
    pub fn override_with<T: Send + Sync + 'static>(
        mut self,
        provider: &Provider<T>,
        factory: impl Fn(&ProviderContext<T>) -> Result<T, BoxError> + Send + Sync + 'static,
    ) -> Self {
        let factory: Factory<T> = Arc::new(factory);
        self.overrides.insert(provider.id(), Arc::new(factory));
        self
    }

    pub(crate) fn into_parts(self) -> ConfigParts {
        let mut observers = self.observers;
        if self.log_observer {
            observers.insert(0, Arc::new(LogObserver));
        }
        ConfigParts {
            name: self.name,
            observers,
            overrides: self.overrides,
        }
    }
}

pub(crate) struct ConfigParts {
    pub name: String,
    pub observers: Vec<Arc<dyn ContainerObserver>>,
    pub overrides: HashMap<ProviderId, Arc<dyn Any + Send + Sync>>,
}
