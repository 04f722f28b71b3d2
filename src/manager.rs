//! Manager layer: one lifecycle cell per type, keyed by type identity.
//!
//! This module provides the [`ManagerApi`] trait with default implementations
//! for lazily creating, accessing, and disposing one [`SingletonCell`] per
//! managed type, plus the process-global manager and its free functions.
//!
//! The manager is type-based: each type (`TypeId`) has exactly one cell, and
//! therefore at most one live instance, within a given manager scope. Use
//! [`define_manager!`](crate::define_manager) to create isolated scopes.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use parking_lot::Mutex;

use crate::cell::{ManagedSingleton, SingletonCell};
use crate::error::LifecycleError;
use crate::event::LifecycleEvent;

/// Type alias for a manager's cell storage.
///
/// Maps `TypeId` to a type-erased `Arc<SingletonCell<T>>`.
///
/// Note: this type is also spelled out in the `define_manager!` macro docs.
/// Keep both in sync.
pub type CellStore = LazyLock<Mutex<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>>;

/// Type alias for the trace callback storage.
pub type TraceStore = Mutex<Option<Arc<dyn Fn(&LifecycleEvent) + Send + Sync>>>;

/// Creates an empty cell map. Used by `define_manager!` and by manual
/// [`ManagerApi`] implementations.
pub fn new_cell_store() -> Mutex<HashMap<TypeId, Arc<dyn Any + Send + Sync>>> {
    Mutex::new(HashMap::new())
}

/// Creates an empty trace callback slot. Used by `define_manager!` and by
/// manual [`ManagerApi`] implementations.
pub const fn new_trace_store() -> TraceStore {
    Mutex::new(None)
}

/// Core trait defining manager behavior.
///
/// Provides default implementations for all lifecycle operations, requiring
/// only two accessor methods (`cells` and `trace`) to be implemented by the
/// implementor.
pub trait ManagerApi {
    // -------------------------------------------------------------------------------------------------
    // Tracing
    // -------------------------------------------------------------------------------------------------

    /// Access the trace callback static.
    fn trace() -> &'static TraceStore;

    /// Set a tracing callback for lifecycle operations.
    ///
    /// The callback will be invoked for every manager operation (access,
    /// construct, dispose, reset).
    ///
    /// # Safety Restrictions
    ///
    /// The callback must NOT call any manager methods on the same manager,
    /// as this will cause a deadlock. The callback is invoked while holding
    /// the trace lock.
    fn set_trace_callback(&self, callback: impl Fn(&LifecycleEvent) + Send + Sync + 'static) {
        let mut guard = Self::trace().lock();
        *guard = Some(Arc::new(callback));
    }

    /// Clear the tracing callback.
    ///
    /// After calling this, no tracing events will be emitted. Cells and
    /// their instances are unaffected.
    fn clear_trace_callback(&self) {
        let mut guard = Self::trace().lock();
        *guard = None;
    }

    /// Convenience wrapper to emit a lifecycle event using the current callback.
    ///
    /// # Panics
    ///
    /// If the callback itself panics, the panic will propagate to the caller.
    fn emit_event(&self, event: &LifecycleEvent) {
        let guard = Self::trace().lock();
        if let Some(callback) = guard.as_ref() {
            callback(event);
        }
    }

    // -------------------------------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------------------------------

    /// Access the cell storage static.
    fn cells() -> &'static CellStore;

    /// Returns the cell for `T`, creating an empty one on first use.
    ///
    /// The map lock is held only for the lookup, never across construction
    /// or disposal, so operating on one type cannot block another.
    fn cell_of<T: ManagedSingleton>(&self) -> Arc<SingletonCell<T>> {
        let mut map = Self::cells().lock();
        let entry = map
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Arc::new(SingletonCell::<T>::new()) as Arc<dyn Any + Send + Sync>);
        match Arc::clone(entry).downcast::<SingletonCell<T>>() {
            Ok(cell) => cell,
            // Entries are inserted under the key of their own TypeId.
            Err(_) => unreachable!("cell map entry type does not match its key"),
        }
    }

    /// Returns the instance of `T`, constructing it on first access.
    ///
    /// All successful callers receive a reference to the identical instance
    /// until [`dispose`](ManagerApi::dispose) retires it.
    ///
    /// # Errors
    ///
    /// - [`LifecycleError::Disposed`] once `T` has been disposed
    /// - [`LifecycleError::Construction`] if [`ManagedSingleton::construct`]
    ///   fails; a later call may retry
    fn instance<T: ManagedSingleton>(&self) -> Result<Arc<T>, LifecycleError> {
        let cell = self.cell_of::<T>();
        let newly_constructed = !cell.is_initialized();
        let result = cell.get();

        if newly_constructed && result.is_ok() {
            self.emit_event(&LifecycleEvent::Construct {
                type_name: std::any::type_name::<T>(),
            });
        }
        self.emit_event(&LifecycleEvent::Access {
            type_name: std::any::type_name::<T>(),
            ready: result.is_ok(),
        });

        result
    }

    /// Disposes the instance of `T`. Idempotent.
    ///
    /// Returns `true` iff this call performed teardown. After the first
    /// call, every subsequent `instance::<T>()` fails with
    /// [`LifecycleError::Disposed`]; the instance is never recreated.
    fn dispose<T: ManagedSingleton>(&self) -> bool {
        let cell = self.cell_of::<T>();
        let torn_down = cell.dispose();

        self.emit_event(&LifecycleEvent::Dispose {
            type_name: std::any::type_name::<T>(),
            torn_down,
        });

        torn_down
    }

    /// True only once the instance of `T` has been fully published, and
    /// false again after disposal. Non-blocking; false for a type never
    /// accessed through this manager.
    fn is_initialized<T: ManagedSingleton>(&self) -> bool {
        let map = Self::cells().lock();
        map.get(&TypeId::of::<T>())
            .and_then(|entry| Arc::clone(entry).downcast::<SingletonCell<T>>().ok())
            .is_some_and(|cell| cell.is_initialized())
    }

    /// True only once teardown of `T` has completed. Non-blocking; false
    /// for a type never accessed through this manager.
    fn is_disposed<T: ManagedSingleton>(&self) -> bool {
        let map = Self::cells().lock();
        map.get(&TypeId::of::<T>())
            .and_then(|entry| Arc::clone(entry).downcast::<SingletonCell<T>>().ok())
            .is_some_and(|cell| cell.is_disposed())
    }

    /// Drops every cell in this manager, including disposed markers.
    ///
    /// This method is primarily intended for testing: it forgets lifecycle
    /// history, so a previously disposed type becomes constructible again.
    /// Already-retrieved `Arc<T>` references remain valid. The tracing
    /// callback is not affected.
    #[doc(hidden)]
    fn reset(&self) {
        self.emit_event(&LifecycleEvent::Reset {});
        Self::cells().lock().clear();
    }
}

// -------------------------------------------------------------------------------------------------
// Process-global manager
// -------------------------------------------------------------------------------------------------

static CELLS: CellStore = LazyLock::new(new_cell_store);
static TRACE: TraceStore = new_trace_store();

/// Zero-sized type backing the process-global manager.
struct GlobalApi;

impl ManagerApi for GlobalApi {
    fn cells() -> &'static CellStore {
        &CELLS
    }

    fn trace() -> &'static TraceStore {
        &TRACE
    }
}

const GLOBAL: GlobalApi = GlobalApi;

/// Returns the process-global instance of `T`, constructing it on first access.
///
/// See [`ManagerApi::instance`].
pub fn instance<T: ManagedSingleton>() -> Result<Arc<T>, LifecycleError> {
    GLOBAL.instance::<T>()
}

/// Disposes the process-global instance of `T`. See [`ManagerApi::dispose`].
pub fn dispose<T: ManagedSingleton>() -> bool {
    GLOBAL.dispose::<T>()
}

/// See [`ManagerApi::is_initialized`].
pub fn is_initialized<T: ManagedSingleton>() -> bool {
    GLOBAL.is_initialized::<T>()
}

/// See [`ManagerApi::is_disposed`].
pub fn is_disposed<T: ManagedSingleton>() -> bool {
    GLOBAL.is_disposed::<T>()
}

/// Set a tracing callback on the process-global manager.
/// See [`ManagerApi::set_trace_callback`].
pub fn set_trace_callback(callback: impl Fn(&LifecycleEvent) + Send + Sync + 'static) {
    GLOBAL.set_trace_callback(callback);
}

/// Clear the tracing callback on the process-global manager.
pub fn clear_trace_callback() {
    GLOBAL.clear_trace_callback();
}

/// Drops every cell in the process-global manager. Test-only.
#[doc(hidden)]
pub fn reset() {
    GLOBAL.reset();
}

// -------------------------------------------------------------------------------------------------
// Tests
// -------------------------------------------------------------------------------------------------
