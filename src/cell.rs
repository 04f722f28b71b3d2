//! Core lifecycle cell: lazy, exactly-once construction with explicit,
//! idempotent disposal.
//!
//! A [`SingletonCell`] holds at most one live instance of a type and walks it
//! through `Uninitialized → Initializing → Ready → Disposed`. Construction is
//! performed by the cell itself through [`ManagedSingleton::construct`], which
//! receives an [`InitToken`] that only the cell can mint — ordinary callers
//! cannot build the managed type directly.

use std::cell::Cell;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use parking_lot::Mutex;

use crate::error::{BoxError, LifecycleError};

// Lifecycle states. `DISPOSING` is internal: guarded operations already fail
// while it is set, but `is_disposed` stays false until teardown completes.
const UNINITIALIZED: u8 = 0;
const INITIALIZING: u8 = 1;
const READY: u8 = 2;
const DISPOSING: u8 = 3;
const DISPOSED: u8 = 4;

thread_local! {
    /// True only while a cell's one-shot initializer runs on this thread.
    static CONSTRUCTING: Cell<bool> = const { Cell::new(false) };
}

/// Capability required to construct a managed type.
///
/// A token can only be minted by a [`SingletonCell`] while its one-shot
/// initializer is in flight. Types managed by a cell take a token in their
/// constructor so that the only way to build one is through the manager:
///
/// ```rust
/// use singleton_lifecycle::{BoxError, InitToken, ManagedSingleton};
///
/// struct AudioEngine {
///     volume: f32,
/// }
///
/// impl AudioEngine {
///     fn new(_token: &InitToken) -> Self {
///         AudioEngine { volume: 1.0 }
///     }
/// }
///
/// impl ManagedSingleton for AudioEngine {
///     fn construct(token: &InitToken) -> Result<Self, BoxError> {
///         Ok(AudioEngine::new(token))
///     }
/// }
/// ```
pub struct InitToken {
    _manager_issued: (),
}

impl InitToken {
    /// Obtains a token from the ambient construction context.
    ///
    /// Succeeds only while the manager's one-shot initializer is running on
    /// the current thread, which makes it usable from helpers nested below
    /// [`ManagedSingleton::construct`]. Any other call site — including a
    /// dynamic call through a function pointer or boxed closure — receives
    /// [`LifecycleError::DirectConstruction`].
    ///
    /// The flag backing this check is thread-local and set strictly around
    /// the initializer closure, so it gates exactly the one legitimate
    /// in-flight construction and is invisible to unrelated threads.
    pub fn acquire() -> Result<InitToken, LifecycleError> {
        if CONSTRUCTING.with(Cell::get) {
            Ok(InitToken { _manager_issued: () })
        } else {
            Err(LifecycleError::DirectConstruction)
        }
    }

    fn manager_issued() -> InitToken {
        InitToken { _manager_issued: () }
    }
}

/// Marks the current thread as running a one-shot initializer.
///
/// Restores the previous flag value on drop (including unwinds), so nested
/// construction of a different singleton inside a constructor keeps the
/// outer scope intact.
struct ConstructionScope {
    previous: bool,
}

impl ConstructionScope {
    fn enter() -> ConstructionScope {
        let previous = CONSTRUCTING.with(|flag| flag.replace(true));
        ConstructionScope { previous }
    }
}

impl Drop for ConstructionScope {
    fn drop(&mut self) {
        let previous = self.previous;
        CONSTRUCTING.with(|flag| flag.set(previous));
    }
}

/// A type whose single instance is managed by a [`SingletonCell`].
///
/// `construct` must either return a valid instance or fail — never a silent
/// placeholder. `on_dispose` runs exactly once, from the first successful
/// [`SingletonCell::dispose`] call.
pub trait ManagedSingleton: Send + Sync + Sized + 'static {
    /// Builds the instance. Called at most once per cell while the cell is
    /// live; a failed attempt may be retried by a later access.
    fn construct(token: &InitToken) -> Result<Self, BoxError>;

    /// Teardown hook, invoked exactly once when the cell is disposed.
    fn on_dispose(&self) {}
}

/// The single storage slot for the at-most-one live instance of `T`.
///
/// Callers receive shared `Arc<T>` references; the cell keeps its own until
/// disposal, at which point it drops ownership and the instance becomes
/// eligible for reclamation once the last caller reference goes away.
///
/// # Concurrency
///
/// Every method may be called from any thread. Callers arriving during an
/// in-flight construction block until the constructing thread publishes
/// success or failure; two threads never run the constructor concurrently.
/// Once `Ready`, [`get`](SingletonCell::get) is a lock-free load, so
/// reentrant access in steady state cannot deadlock.
///
/// # Restrictions
///
/// `construct` and `on_dispose` run under the cell's operation lock and must
/// NOT call back into the same cell, as this will deadlock.
pub struct SingletonCell<T> {
    /// Published instance; `Some` only in the `Ready` state.
    value: ArcSwapOption<T>,
    state: AtomicU8,
    /// Serializes construction and disposal.
    op_lock: Mutex<()>,
}

impl<T: ManagedSingleton> SingletonCell<T> {
    /// Creates an empty cell. Usable in statics.
    pub const fn new() -> SingletonCell<T> {
        SingletonCell {
            value: ArcSwapOption::const_empty(),
            state: AtomicU8::new(UNINITIALIZED),
            op_lock: Mutex::new(()),
        }
    }

    /// Returns the instance, constructing it on first access.
    ///
    /// All successful callers receive a reference to the identical instance
    /// for the lifetime of the cell.
    ///
    /// # Errors
    ///
    /// - [`LifecycleError::Disposed`] once the cell has been disposed
    /// - [`LifecycleError::Construction`] if the constructor fails or panics;
    ///   the cell returns to `Uninitialized` and a later call may retry
    pub fn get(&self) -> Result<Arc<T>, LifecycleError> {
        // Fast path: no lock once the instance is published. The state check
        // closes the window where a disposal has begun but not yet retired
        // the published pointer.
        if let Some(existing) = self.value.load_full() {
            if self.state.load(Ordering::Acquire) == READY {
                return Ok(existing);
            }
        }
        self.get_slow()
    }

    fn get_slow(&self) -> Result<Arc<T>, LifecycleError> {
        let _op = self.op_lock.lock();

        // A construction finished while we waited for the lock.
        if let Some(existing) = self.value.load_full() {
            return Ok(existing);
        }

        match self.state.load(Ordering::Acquire) {
            DISPOSING | DISPOSED => Err(LifecycleError::Disposed),
            _ => self.construct_locked(),
        }
    }

    fn construct_locked(&self) -> Result<Arc<T>, LifecycleError> {
        self.state.store(INITIALIZING, Ordering::Release);

        // The constructor runs inside catch_unwind so a panicking collaborator
        // surfaces as a Construction error on every waiting caller's retry
        // path instead of tearing down the process lock discipline.
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            let _scope = ConstructionScope::enter();
            T::construct(&InitToken::manager_issued())
        }));

        match outcome {
            Ok(Ok(value)) => {
                let instance = Arc::new(value);
                self.value.store(Some(Arc::clone(&instance)));
                self.state.store(READY, Ordering::Release);
                Ok(instance)
            }
            Ok(Err(source)) => {
                self.state.store(UNINITIALIZED, Ordering::Release);
                Err(LifecycleError::Construction(source))
            }
            Err(payload) => {
                self.state.store(UNINITIALIZED, Ordering::Release);
                Err(LifecycleError::Construction(panic_reason(&*payload).into()))
            }
        }
    }

    /// Disposes the cell. Idempotent; returns `true` iff this call performed
    /// teardown (ran [`ManagedSingleton::on_dispose`]).
    ///
    /// The first caller to find the cell `Ready` retires the published
    /// instance, runs the hook exactly once, and marks the cell `Disposed`.
    /// Disposing a never-initialized cell closes it permanently without
    /// running the hook and returns `false`. `Disposed` is terminal: no
    /// later access recreates the instance.
    pub fn dispose(&self) -> bool {
        let _op = self.op_lock.lock();
        match self.state.load(Ordering::Acquire) {
            DISPOSED | DISPOSING => false,
            READY => {
                // Guarded operations must start failing before teardown runs,
                // so the state flips first, then the fast path is closed.
                self.state.store(DISPOSING, Ordering::Release);
                let retired = self.value.swap(None);
                if let Some(instance) = retired {
                    instance.on_dispose();
                }
                self.state.store(DISPOSED, Ordering::Release);
                true
            }
            _ => {
                self.state.store(DISPOSED, Ordering::Release);
                false
            }
        }
    }

    /// True only once a constructing thread has fully published the instance,
    /// and false again after disposal. Non-blocking.
    pub fn is_initialized(&self) -> bool {
        self.state.load(Ordering::Acquire) == READY
    }

    /// True only once teardown has completed. Non-blocking.
    pub fn is_disposed(&self) -> bool {
        self.state.load(Ordering::Acquire) == DISPOSED
    }

    /// The "fail if disposed" check for guarded instance methods.
    ///
    /// Fails from the instant teardown begins — before `is_disposed` turns
    /// true — so a method racing `dispose` never observes a half-destroyed
    /// instance as live.
    pub fn ensure_live(&self) -> Result<(), LifecycleError> {
        match self.state.load(Ordering::Acquire) {
            DISPOSING | DISPOSED => Err(LifecycleError::Disposed),
            _ => Ok(()),
        }
    }

    /// Returns the instance without triggering construction.
    pub fn current(&self) -> Option<Arc<T>> {
        if self.state.load(Ordering::Acquire) == READY {
            self.value.load_full()
        } else {
            None
        }
    }
}

impl<T: ManagedSingleton> Default for SingletonCell<T> {
    fn default() -> Self {
        SingletonCell::new()
    }
}

/// Extracts a readable message from a constructor panic payload.
fn panic_reason(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "constructor panicked".to_string()
    }
}

// -------------------------------------------------------------------------------------------------
// Tests
// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering as AtomicOrdering};

    struct Counter {
        disposals: &'static AtomicUsize,
    }

    impl Counter {
        fn managed(
            _token: &InitToken,
            constructions: &'static AtomicUsize,
            disposals: &'static AtomicUsize,
        ) -> Counter {
            constructions.fetch_add(1, AtomicOrdering::SeqCst);
            Counter { disposals }
        }
    }

    static PLAIN_CONSTRUCTIONS: AtomicUsize = AtomicUsize::new(0);
    static PLAIN_DISPOSALS: AtomicUsize = AtomicUsize::new(0);

    impl ManagedSingleton for Counter {
        fn construct(token: &InitToken) -> Result<Self, BoxError> {
            Ok(Counter::managed(
                token,
                &PLAIN_CONSTRUCTIONS,
                &PLAIN_DISPOSALS,
            ))
        }

        fn on_dispose(&self) {
            self.disposals.fetch_add(1, AtomicOrdering::SeqCst);
        }
    }

    #[test]
    fn test_lazy_construction_and_identity() {
        let cell: SingletonCell<Counter> = SingletonCell::new();
        assert!(!cell.is_initialized());

        let before = PLAIN_CONSTRUCTIONS.load(AtomicOrdering::SeqCst);
        let first = cell.get().unwrap();
        let second = cell.get().unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert!(cell.is_initialized());
        assert_eq!(PLAIN_CONSTRUCTIONS.load(AtomicOrdering::SeqCst), before + 1);
    }

    #[test]
    fn test_dispose_is_idempotent_and_runs_hook_once() {
        let cell: SingletonCell<Counter> = SingletonCell::new();
        let instance = cell.get().unwrap();
        let before = instance.disposals.load(AtomicOrdering::SeqCst);

        assert!(cell.dispose());
        assert!(!cell.dispose());
        assert!(cell.is_disposed());
        assert!(!cell.is_initialized());
        assert_eq!(instance.disposals.load(AtomicOrdering::SeqCst), before + 1);

        // Access after disposal is rejected, never recreated.
        assert!(matches!(cell.get(), Err(LifecycleError::Disposed)));
        assert!(cell.current().is_none());
    }

    #[test]
    fn test_dispose_before_initialization_closes_cell_without_hook() {
        let cell: SingletonCell<Counter> = SingletonCell::new();
        let disposals_before = PLAIN_DISPOSALS.load(AtomicOrdering::SeqCst);

        assert!(!cell.dispose());
        assert!(cell.is_disposed());
        assert!(matches!(cell.get(), Err(LifecycleError::Disposed)));
        assert_eq!(
            PLAIN_DISPOSALS.load(AtomicOrdering::SeqCst),
            disposals_before
        );
    }

    #[test]
    fn test_ensure_live_after_dispose() {
        let cell: SingletonCell<Counter> = SingletonCell::new();
        assert!(cell.ensure_live().is_ok());
        cell.get().unwrap();
        assert!(cell.ensure_live().is_ok());
        cell.dispose();
        assert!(matches!(cell.ensure_live(), Err(LifecycleError::Disposed)));
    }

    #[test]
    fn test_token_acquire_outside_construction_fails() {
        let result = InitToken::acquire();
        assert!(matches!(result, Err(LifecycleError::DirectConstruction)));
    }

    struct TokenUser;

    static TOKEN_ACQUIRED: AtomicBool = AtomicBool::new(false);

    impl ManagedSingleton for TokenUser {
        fn construct(_token: &InitToken) -> Result<Self, BoxError> {
            // Nested helpers may re-acquire from the ambient scope.
            InitToken::acquire().map_err(|e| -> BoxError { Box::new(e) })?;
            TOKEN_ACQUIRED.store(true, AtomicOrdering::SeqCst);
            Ok(TokenUser)
        }
    }

    #[test]
    fn test_token_acquire_inside_construction_succeeds() {
        let cell: SingletonCell<TokenUser> = SingletonCell::new();
        cell.get().unwrap();
        assert!(TOKEN_ACQUIRED.load(AtomicOrdering::SeqCst));
        // The flag does not leak past the initializer.
        assert!(InitToken::acquire().is_err());
    }

    #[derive(Debug)]
    struct Flaky;

    static FLAKY_SHOULD_FAIL: AtomicBool = AtomicBool::new(true);

    impl ManagedSingleton for Flaky {
        fn construct(_token: &InitToken) -> Result<Self, BoxError> {
            if FLAKY_SHOULD_FAIL.load(AtomicOrdering::SeqCst) {
                Err("collaborator offline".into())
            } else {
                Ok(Flaky)
            }
        }
    }

    #[test]
    fn test_failed_construction_allows_retry() {
        let cell: SingletonCell<Flaky> = SingletonCell::new();
        FLAKY_SHOULD_FAIL.store(true, AtomicOrdering::SeqCst);

        let err = cell.get().unwrap_err();
        assert!(matches!(err, LifecycleError::Construction(_)));
        assert!(!cell.is_initialized());

        FLAKY_SHOULD_FAIL.store(false, AtomicOrdering::SeqCst);
        assert!(cell.get().is_ok());
        assert!(cell.is_initialized());
    }

    struct Panicky;

    impl ManagedSingleton for Panicky {
        fn construct(_token: &InitToken) -> Result<Self, BoxError> {
            panic!("wired up backwards");
        }
    }

    #[test]
    fn test_panicking_constructor_surfaces_message() {
        let cell: SingletonCell<Panicky> = SingletonCell::new();
        match cell.get() {
            Err(LifecycleError::Construction(source)) => {
                assert_eq!(source.to_string(), "wired up backwards");
            }
            other => panic!("expected construction error, got {:?}", other.is_ok()),
        }
        // The panic did not leave the guard flag set or the cell wedged.
        assert!(InitToken::acquire().is_err());
        assert!(!cell.is_initialized());
        assert!(!cell.is_disposed());
    }
}
