//! # Providers, containers, and auto-dispose
//!
//! Holdfast is a small reference-counted state container. There are three
//! main pieces:
//!
//! - `Provider<T>`: a declared unit of state plus the factory that builds it.
//! - `Container`: an explicitly owned scope that builds provider instances
//!   lazily and keeps at most one per provider.
//! - `Subscription<T>` / `ProviderContext::watch`: listener edges that keep
//!   instances alive.
//!
//! ## Providers
//!
//! Declaring a provider builds nothing. The factory runs the first time a
//! container is asked for it:
//!
//! ```rust
//! use holdfast_core::*;
//!
//! let base = Provider::new("base", |_| Ok(2));
//! let squared = Provider::auto_dispose("squared", {
//!     let base = base.clone();
//!     move |ctx| {
//!         let b = ctx.watch(&base)?;
//!         Ok(*b * *b)
//!     }
//! });
//!
//! let container = Container::new();
//! assert_eq!(*container.read(&squared).unwrap(), 4);
//! ```
//!
//! ## Auto-dispose
//!
//! An `auto_dispose` provider's instance is torn down when its last listener
//! goes away. Cleanups registered with `on_dispose` run exactly once, newest
//! first:
//!
//! ```rust
//! use holdfast_core::*;
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicBool, Ordering};
//!
//! let cancelled = Arc::new(AtomicBool::new(false));
//! let download = Provider::auto_dispose("download", {
//!     let cancelled = cancelled.clone();
//!     move |ctx| {
//!         let cancelled = cancelled.clone();
//!         ctx.on_dispose(move || cancelled.store(true, Ordering::SeqCst));
//!         Ok(())
//!     }
//! });
//!
//! let container = Container::new();
//! let sub = container.listen(&download).unwrap();
//! drop(sub);
//! assert!(cancelled.load(Ordering::SeqCst));
//! ```
//!
//! - `maintain_state` defers that teardown: with the flag set, an instance
//!   that loses its last listener waits in `PendingDisposal` until the flag
//!   is cleared or the container is disposed.
//! - `keep-alive` providers (`Provider::new`) are only torn down with their
//!   container.
//!
//! ## Scopes
//!
//! There is no global registry. Create one `Container` per scope (per test,
//! per top-level application scope) and dispose it, or drop the last clone,
//! to tear everything down in dependency order.

pub mod config;
pub mod container;
pub mod context;
pub mod dispose;
pub mod error;
mod graph;
pub mod instance;
pub mod observer;
pub mod prelude;
pub mod provider;
mod registry;
mod scheduler;
pub mod snapshot;
pub mod subscription;

pub use config::*;
pub use container::*;
pub use context::*;
pub use dispose::*;
pub use error::*;
pub use instance::*;
pub use observer::*;
pub use provider::*;
pub use snapshot::*;
pub use subscription::*;
