//! # Singleton Lifecycle
//!
//! A thread-safe lazy-singleton lifecycle manager: exactly-once creation on
//! first access, protection against direct construction, idempotent disposal,
//! and post-disposal access rejection.
//!
//! This crate manages exactly one in-process instance per registered type.
//! Instances are created on demand rather than eagerly, and are safely
//! observable and destructible from multiple concurrent callers.
//!
//! ## Quick Start
//!
//! ```rust
//! use singleton_lifecycle::{instance, dispose, BoxError, InitToken, ManagedSingleton};
//! use std::sync::Arc;
//!
//! struct AppConfig {
//!     max_connections: u32,
//! }
//!
//! impl ManagedSingleton for AppConfig {
//!     fn construct(_token: &InitToken) -> Result<Self, BoxError> {
//!         Ok(AppConfig { max_connections: 100 })
//!     }
//! }
//!
//! // Lazily constructed on first access; every caller gets the same instance.
//! let config: Arc<AppConfig> = instance().unwrap();
//! assert_eq!(config.max_connections, 100);
//!
//! // Disposal is explicit, idempotent, and terminal.
//! assert!(dispose::<AppConfig>());
//! assert!(instance::<AppConfig>().is_err());
//! ```
//!
//! ## Features
//!
//! - **Thread-safe**: concurrent callers during construction block until the
//!   constructing thread publishes; two threads never run a constructor
//!   concurrently and never observe a partially built instance
//! - **Exactly-once**: one construction and one teardown hook per instance,
//!   no matter how many threads race
//! - **Guarded construction**: the managed type's constructor takes an
//!   [`InitToken`] only the manager can mint, so bypassing the manager fails
//!   with [`LifecycleError::DirectConstruction`]
//! - **Adapters**: [`HostSingleton`] tracks an instance the host environment
//!   creates and destroys; [`ResourceSingleton`] resolves an instance by
//!   loading a named external resource
//!
//! ## Main Items
//!
//! - [`instance`] / [`dispose`] / [`is_initialized`] / [`is_disposed`] - the
//!   process-global manager
//! - [`SingletonCell`] - the underlying per-type lifecycle cell
//! - [`define_manager!`] - create isolated manager scopes
//! - [`set_trace_callback`] - set up tracing for lifecycle operations

mod cell;
mod error;
mod event;
mod host;
mod macros;
mod manager;
mod resource;

// Re-export the main public API
pub use cell::{InitToken, ManagedSingleton, SingletonCell};
pub use error::{BoxError, LifecycleError};
pub use event::LifecycleEvent;
pub use host::{Host, HostResident, HostSingleton};
pub use manager::{
    clear_trace_callback, dispose, instance, is_disposed, is_initialized, new_cell_store,
    new_trace_store, reset, set_trace_callback, CellStore, ManagerApi, TraceStore,
};
pub use resource::{ResourceCreator, ResourceLoader, ResourcePath, ResourceSingleton};
