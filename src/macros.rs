//! Macros for creating isolated lifecycle manager scopes.
//!
//! This module provides a simple macro-based approach to create type-safe,
//! thread-safe singleton lifecycle managers whose state is isolated from the
//! process-global manager and from each other.

/// Creates a complete lifecycle manager scope with a single macro invocation.
///
/// The macro generates a module containing:
/// - Cell storage static (hidden)
/// - Trace callback static (hidden)
/// - An `Api` struct that implements `ManagerApi`
///
/// # Examples
///
/// ```rust
/// use singleton_lifecycle::{define_manager, BoxError, InitToken, ManagedSingleton};
/// use std::sync::Arc;
///
/// struct Metrics {
///     endpoint: String,
/// }
///
/// impl ManagedSingleton for Metrics {
///     fn construct(_token: &InitToken) -> Result<Self, BoxError> {
///         Ok(Metrics { endpoint: "localhost:9090".to_string() })
///     }
/// }
///
/// // Create an isolated manager scope
/// define_manager!(telemetry);
///
/// let metrics: Arc<Metrics> = telemetry::instance().unwrap();
/// assert_eq!(metrics.endpoint, "localhost:9090");
/// assert!(telemetry::is_initialized::<Metrics>());
///
/// telemetry::dispose::<Metrics>();
/// assert!(telemetry::is_disposed::<Metrics>());
/// ```
///
/// # Multiple Scopes
///
/// You can create multiple isolated scopes; each manages its own instance of
/// every type independently:
///
/// ```rust
/// use singleton_lifecycle::{define_manager, BoxError, InitToken, ManagedSingleton};
///
/// struct Pool;
/// impl ManagedSingleton for Pool {
///     fn construct(_token: &InitToken) -> Result<Self, BoxError> { Ok(Pool) }
/// }
///
/// define_manager!(primary);
/// define_manager!(replica);
///
/// primary::instance::<Pool>().unwrap();
///
/// // Disposing in one scope does not affect the other
/// primary::dispose::<Pool>();
/// assert!(primary::is_disposed::<Pool>());
/// assert!(!replica::is_disposed::<Pool>());
/// ```
///
/// # Trait-Based Usage
///
/// If you need trait-based usage, the `API` constant is available:
///
/// ```rust
/// use singleton_lifecycle::{define_manager, BoxError, InitToken, ManagedSingleton, ManagerApi};
///
/// struct Cache;
/// impl ManagedSingleton for Cache {
///     fn construct(_token: &InitToken) -> Result<Self, BoxError> { Ok(Cache) }
/// }
///
/// define_manager!(app);
///
/// // Use API constant for trait-based access
/// let cache = app::API.instance::<Cache>().unwrap();
/// # let _ = cache;
/// ```
#[macro_export]
macro_rules! define_manager {
    ($name:ident) => {
        pub mod $name {
            use std::sync::Arc;

            // Cell storage (module-private)
            static CELLS: $crate::CellStore = std::sync::LazyLock::new($crate::new_cell_store);

            // Trace callback storage (module-private)
            static TRACE: $crate::TraceStore = $crate::new_trace_store();

            /// Zero-sized type that implements the manager API.
            ///
            /// All lifecycle operations are provided by the `ManagerApi`
            /// trait's default implementations. This struct only provides
            /// access to the statics.
            pub struct Api;

            impl $crate::ManagerApi for Api {
                fn cells() -> &'static $crate::CellStore {
                    &CELLS
                }

                fn trace() -> &'static $crate::TraceStore {
                    &TRACE
                }

                // All other methods (instance, dispose, status queries, etc.)
                // are provided by the trait's default implementations!
            }

            /// Convenient constant for accessing the manager API.
            pub const API: Api = Api;

            // Free functions for ergonomic usage - they delegate to API

            /// Returns the instance of `T` in this scope, constructing it on
            /// first access.
            pub fn instance<T: $crate::ManagedSingleton>(
            ) -> Result<Arc<T>, $crate::LifecycleError> {
                use $crate::ManagerApi;
                API.instance::<T>()
            }

            /// Disposes the instance of `T` in this scope. Idempotent;
            /// returns `true` iff this call performed teardown.
            pub fn dispose<T: $crate::ManagedSingleton>() -> bool {
                use $crate::ManagerApi;
                API.dispose::<T>()
            }

            /// True only while the instance of `T` is live in this scope.
            pub fn is_initialized<T: $crate::ManagedSingleton>() -> bool {
                use $crate::ManagerApi;
                API.is_initialized::<T>()
            }

            /// True only once teardown of `T` has completed in this scope.
            pub fn is_disposed<T: $crate::ManagedSingleton>() -> bool {
                use $crate::ManagerApi;
                API.is_disposed::<T>()
            }

            /// Set a tracing callback for this scope.
            pub fn set_trace_callback(
                callback: impl Fn(&$crate::LifecycleEvent) + Send + Sync + 'static,
            ) {
                use $crate::ManagerApi;
                API.set_trace_callback(callback)
            }

            /// Clear this scope's tracing callback.
            pub fn clear_trace_callback() {
                use $crate::ManagerApi;
                API.clear_trace_callback()
            }

            /// Drops every cell in this scope. Test-only.
            #[doc(hidden)]
            pub fn reset() {
                use $crate::ManagerApi;
                API.reset()
            }
        }
    };
}
