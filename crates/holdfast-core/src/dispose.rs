use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{DisposeFailure, panic_message};

/// A cleanup registered through `on_dispose`.
#[derive(Clone)]
pub struct Disposer(Arc<Mutex<Option<Box<dyn FnOnce() + Send>>>>);

impl Disposer {
    pub fn new(f: impl FnOnce() + Send + 'static) -> Self {
        Self(Arc::new(Mutex::new(Some(Box::new(f)))))
    }

    /// Runs at most once (safe to call multiple times).
    pub fn run(&self) {
        let f = self.0.lock().take();
        if let Some(f) = f {
            f()
        }
    }

    pub fn has_run(&self) -> bool {
        self.0.lock().is_none()
    }

    /// Like [`run`](Self::run), but a panic is caught and handed back instead
    /// of unwinding into the scheduler.
    pub(crate) fn run_guarded(&self, provider: &str) -> Result<(), DisposeFailure> {
        catch_unwind(AssertUnwindSafe(|| self.run())).map_err(|payload| DisposeFailure {
            provider: provider.to_string(),
            message: panic_message(payload.as_ref()),
        })
    }
}

impl std::fmt::Debug for Disposer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Disposer")
            .field("has_run", &self.has_run())
            .finish()
    }
}

/// Runs every disposer newest-first. Failures are collected, never
/// short-circuit the rest.
pub(crate) fn run_in_reverse(
    provider: &str,
    disposers: impl DoubleEndedIterator<Item = Disposer>,
) -> Vec<DisposeFailure> {
    disposers
        .rev()
        .filter_map(|d| d.run_guarded(provider).err())
        .collect()
}
