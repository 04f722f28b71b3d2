//! Host-attached adapter example.
//!
//! Demonstrates an adapter tracking a singleton whose carrier objects are
//! created and destroyed by an external host environment: duplicate
//! candidates are discarded, `ensure_initialized` searches the host registry
//! before spawning, and shutdown prevents late resurrection.
//!
//! Run with: `cargo run --example host_attached`

use singleton_lifecycle::{Host, HostResident, HostSingleton, LifecycleError};
use std::sync::{Arc, Mutex};

struct OverlayUi {
    id: u32,
}

impl HostResident for OverlayUi {
    fn on_registered(&self) {
        println!("   Initialization hook ran for overlay #{}", self.id);
    }
}

/// A toy host: owns the object registry and hands out carrier objects.
#[derive(Default)]
struct ToyHost {
    objects: Mutex<Vec<Arc<OverlayUi>>>,
    next_id: Mutex<u32>,
}

impl Host<OverlayUi> for ToyHost {
    fn candidates(&self, _include_inactive: bool) -> Vec<Arc<OverlayUi>> {
        self.objects.lock().unwrap().clone()
    }

    fn spawn(&self) -> Result<Arc<OverlayUi>, LifecycleError> {
        let mut next_id = self.next_id.lock().unwrap();
        *next_id += 1;
        let overlay = Arc::new(OverlayUi { id: *next_id });
        self.objects.lock().unwrap().push(Arc::clone(&overlay));
        println!("   Host spawned overlay #{}", overlay.id);
        Ok(overlay)
    }

    fn discard(&self, candidate: &Arc<OverlayUi>) {
        println!("   Host discarded duplicate overlay #{}", candidate.id);
        self.objects
            .lock()
            .unwrap()
            .retain(|existing| !Arc::ptr_eq(existing, candidate));
    }

    fn persist(&self, instance: &Arc<OverlayUi>) {
        println!("   Overlay #{} exempted from scope teardown", instance.id);
    }
}

fn main() {
    println!("=== singleton-lifecycle: Host-Attached Adapter ===\n");

    let adapter = HostSingleton::new(ToyHost::default());
    adapter.set_persistent(true);

    // -------------------------------------------------------------------------
    // 1. Host delivers attach notifications; the first candidate wins
    // -------------------------------------------------------------------------
    println!("1. Two candidates attach in sequence...");

    let first = Arc::new(OverlayUi { id: 100 });
    let second = Arc::new(OverlayUi { id: 200 });
    adapter.on_attach(Arc::clone(&first));
    adapter.on_attach(Arc::clone(&second));

    println!(
        "   Registered instance: overlay #{}",
        adapter.current().unwrap().id
    );

    // -------------------------------------------------------------------------
    // 2. ensure_initialized is idempotent
    // -------------------------------------------------------------------------
    println!("\n2. ensure_initialized with an instance registered...");

    let resolved = adapter.ensure_initialized().unwrap();
    println!("   Still overlay #{} (no re-registration)", resolved.id);

    // -------------------------------------------------------------------------
    // 3. Detach clears the slot; the next access spawns a replacement
    // -------------------------------------------------------------------------
    println!("\n3. Detaching the registered instance...");

    adapter.on_detach(&first);
    let replacement = adapter.ensure_initialized().unwrap();
    println!("   Replacement: overlay #{}", replacement.id);

    // -------------------------------------------------------------------------
    // 4. Shutdown prevents late resurrection
    // -------------------------------------------------------------------------
    println!("\n4. Host signals shutdown...");

    adapter.on_shutdown();
    match adapter.instance() {
        Ok(_) => println!("   Unexpected: instance during shutdown"),
        Err(err) => println!("   Rejected as expected: {err}"),
    }
}
