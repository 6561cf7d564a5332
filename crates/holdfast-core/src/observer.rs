use crate::error::{DisposeFailure, Error};
use crate::provider::ProviderMeta;

/// Receives lifecycle events of a container. All methods default to no-ops.
///
/// Observers are called synchronously on the thread that caused the event,
/// never while the registry is locked, so they may read from the container.
pub trait ContainerObserver: Send + Sync + 'static {
    fn did_add_provider(&self, _container: &str, _provider: &ProviderMeta) {}

    fn did_dispose_provider(&self, _container: &str, _provider: &ProviderMeta) {}

    fn provider_did_fail(&self, _container: &str, _provider: &ProviderMeta, _error: &Error) {}

    /// A disposal callback panicked. Teardown went on regardless.
    fn dispose_callback_failed(&self, _container: &str, _failure: &DisposeFailure) {}
}

/// Forwards every event to the `log` facade. Installed by default.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl ContainerObserver for LogObserver {
    fn did_add_provider(&self, container: &str, provider: &ProviderMeta) {
        log::debug!("[{container}] built `{}` ({})", provider.name, provider.lifetime);
    }

    fn did_dispose_provider(&self, container: &str, provider: &ProviderMeta) {
        log::debug!("[{container}] disposed `{}`", provider.name);
    }

    fn provider_did_fail(&self, container: &str, provider: &ProviderMeta, error: &Error) {
        log::warn!("[{container}] `{}` failed: {error}", provider.name);
    }

    fn dispose_callback_failed(&self, container: &str, failure: &DisposeFailure) {
        log::warn!("[{container}] {failure}");
    }
}
