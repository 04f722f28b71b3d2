//! Host-attached adapter: the host environment creates and destroys the
//! object carrying the singleton; this adapter only tracks which existing
//! object is "the" instance.
//!
//! The host itself is out of scope and abstracted behind the [`Host`] trait:
//! it delivers [`on_attach`](HostSingleton::on_attach) /
//! [`on_detach`](HostSingleton::on_detach) /
//! [`on_shutdown`](HostSingleton::on_shutdown) notifications at its own
//! discretion (from any thread) and owns the object registry that
//! [`ensure_initialized`](HostSingleton::ensure_initialized) searches.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::LifecycleError;

/// Capabilities the host environment supplies to the adapter.
///
/// All methods may be called from any thread.
pub trait Host<T>: Send + Sync {
    /// Enumerates existing host-managed candidates of `T`, in host
    /// enumeration order. When `include_inactive` is true the result also
    /// contains inactive/detached candidates.
    ///
    /// The order is host-defined; the adapter takes the first entry and
    /// does not assume the order is stable across hosts.
    fn candidates(&self, include_inactive: bool) -> Vec<Arc<T>>;

    /// Creates a new carrier object with `T` attached.
    fn spawn(&self) -> Result<Arc<T>, LifecycleError>;

    /// Immediately destroys a candidate that lost the registration race.
    fn discard(&self, candidate: &Arc<T>);

    /// Exempts the instance from the host's scope-boundary teardown.
    fn persist(&self, instance: &Arc<T>);
}

/// Hook surface for types registered through a [`HostSingleton`].
pub trait HostResident: Send + Sync + 'static {
    /// User-extensible initialization hook, invoked exactly once when this
    /// object becomes the registered instance.
    ///
    /// Runs under the adapter's slot lock and must NOT call back into the
    /// adapter, as this will deadlock.
    fn on_registered(&self) {}
}

/// Single-slot registration of a host-managed singleton.
///
/// Multiple carrier objects may transiently coexist on the host side; the
/// adapter keeps the first one registered and instructs the host to discard
/// late duplicates. A duplicate discard is a normal outcome, logged at
/// `warn`, never an error.
pub struct HostSingleton<T, H> {
    host: H,
    slot: Mutex<Option<Arc<T>>>,
    include_inactive: AtomicBool,
    persistent: AtomicBool,
    shutting_down: AtomicBool,
}

impl<T: HostResident, H: Host<T>> HostSingleton<T, H> {
    /// Creates an adapter with inactive candidates excluded from searches
    /// and no scope-persistence request.
    pub fn new(host: H) -> HostSingleton<T, H> {
        HostSingleton {
            host,
            slot: Mutex::new(None),
            include_inactive: AtomicBool::new(false),
            persistent: AtomicBool::new(false),
            shutting_down: AtomicBool::new(false),
        }
    }

    /// Host notification: a candidate object was attached.
    ///
    /// If no instance is registered, the candidate becomes the singleton and
    /// [`HostResident::on_registered`] runs exactly once. If a different
    /// instance is already registered, the candidate is discarded through
    /// the host. Notifications arriving after shutdown are ignored.
    pub fn on_attach(&self, candidate: Arc<T>) {
        if self.shutting_down.load(Ordering::Acquire) {
            log::debug!(
                "attach of {} ignored: host is shutting down",
                std::any::type_name::<T>()
            );
            return;
        }

        let mut slot = self.slot.lock();
        if let Some(existing) = slot.as_ref() {
            if !Arc::ptr_eq(existing, &candidate) {
                log::warn!(
                    "duplicate {} candidate discarded",
                    std::any::type_name::<T>()
                );
                self.host.discard(&candidate);
            }
            return;
        }
        self.register_locked(&mut slot, candidate);
    }

    /// Host notification: a carrier object was detached.
    ///
    /// Clears the registration only if `candidate` is the registered
    /// instance, so a future access can create or locate a replacement.
    pub fn on_detach(&self, candidate: &Arc<T>) {
        let mut slot = self.slot.lock();
        if slot.as_ref().is_some_and(|current| Arc::ptr_eq(current, candidate)) {
            *slot = None;
        }
    }

    /// Host notification: process-wide shutdown has begun.
    ///
    /// Every subsequent [`instance`](HostSingleton::instance) or
    /// [`ensure_initialized`](HostSingleton::ensure_initialized) call fails
    /// with [`LifecycleError::Unavailable`] instead of resurrecting the
    /// singleton late in shutdown.
    pub fn on_shutdown(&self) {
        self.shutting_down.store(true, Ordering::Release);
    }

    /// Forces resolution without waiting for a host notification.
    ///
    /// Safe to call repeatedly: an already-registered instance is returned
    /// as-is, without re-registering or re-invoking hooks. Otherwise the
    /// host registry is searched (honoring the include-inactive policy) and
    /// the first candidate in host enumeration order wins; if none exists,
    /// the host is asked to spawn a new carrier. A newly registered
    /// instance receives [`HostResident::on_registered`] exactly once.
    pub fn ensure_initialized(&self) -> Result<Arc<T>, LifecycleError> {
        if self.shutting_down.load(Ordering::Acquire) {
            return Err(LifecycleError::Unavailable);
        }

        let mut slot = self.slot.lock();
        if let Some(existing) = slot.as_ref() {
            return Ok(Arc::clone(existing));
        }

        let include_inactive = self.include_inactive.load(Ordering::Acquire);
        let candidate = match self.host.candidates(include_inactive).into_iter().next() {
            Some(found) => found,
            None => self.host.spawn()?,
        };

        self.register_locked(&mut slot, Arc::clone(&candidate));
        Ok(candidate)
    }

    /// Returns the registered instance, resolving one if necessary.
    /// Equivalent to [`ensure_initialized`](HostSingleton::ensure_initialized).
    pub fn instance(&self) -> Result<Arc<T>, LifecycleError> {
        self.ensure_initialized()
    }

    /// Returns the registered instance without resolving a new one.
    pub fn current(&self) -> Option<Arc<T>> {
        self.slot.lock().clone()
    }

    /// Whether searches consider inactive/detached candidates.
    pub fn include_inactive(&self) -> bool {
        self.include_inactive.load(Ordering::Acquire)
    }

    /// Sets the include-inactive search policy for future resolutions.
    pub fn set_include_inactive(&self, include: bool) {
        self.include_inactive.store(include, Ordering::Release);
    }

    /// Whether newly registered instances are exempted from scope teardown.
    pub fn is_persistent(&self) -> bool {
        self.persistent.load(Ordering::Acquire)
    }

    /// Sets the persist-across-scope-transitions flag.
    ///
    /// The flag is read at registration time; changing it afterwards does
    /// not retroactively affect an already-registered instance.
    pub fn set_persistent(&self, persistent: bool) {
        self.persistent.store(persistent, Ordering::Release);
    }

    /// Whether the host has signalled shutdown.
    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::Acquire)
    }

    /// Borrows the underlying host collaborator.
    pub fn host(&self) -> &H {
        &self.host
    }

    fn register_locked(&self, slot: &mut Option<Arc<T>>, candidate: Arc<T>) {
        if self.persistent.load(Ordering::Acquire) {
            self.host.persist(&candidate);
        }
        *slot = Some(Arc::clone(&candidate));
        candidate.on_registered();
    }
}

// -------------------------------------------------------------------------------------------------
// Tests
// -------------------------------------------------------------------------------------------------
