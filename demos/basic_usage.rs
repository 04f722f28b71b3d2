//! Basic usage example for singleton-lifecycle.
//!
//! Demonstrates:
//! - Defining a managed type with `ManagedSingleton`
//! - Lazy construction on first access with `instance()`
//! - Status queries with `is_initialized()` / `is_disposed()`
//! - Explicit, idempotent disposal with `dispose()`
//!
//! Run with: `cargo run --example basic_usage`

use singleton_lifecycle::{
    dispose, instance, is_disposed, is_initialized, BoxError, InitToken, ManagedSingleton,
};
use std::sync::Arc;

// A type whose single instance is managed for the life of the process.
struct AppConfig {
    name: String,
    max_connections: u32,
}

impl AppConfig {
    // The constructor takes an InitToken, so only the manager can call it.
    fn new(_token: &InitToken) -> AppConfig {
        AppConfig {
            name: "MyApp".to_string(),
            max_connections: 100,
        }
    }
}

impl ManagedSingleton for AppConfig {
    fn construct(token: &InitToken) -> Result<Self, BoxError> {
        Ok(AppConfig::new(token))
    }

    fn on_dispose(&self) {
        println!("   Tearing down config for {}", self.name);
    }
}

fn main() {
    println!("=== singleton-lifecycle: Basic Usage ===\n");

    // -------------------------------------------------------------------------
    // 1. Nothing exists until first access
    // -------------------------------------------------------------------------
    println!("1. Before first access...");
    println!("   is_initialized: {}", is_initialized::<AppConfig>());

    // -------------------------------------------------------------------------
    // 2. Lazy construction on first access
    // -------------------------------------------------------------------------
    println!("\n2. First access constructs the instance...");

    let config: Arc<AppConfig> = instance().expect("construction failed");
    println!(
        "   Got {} (max_connections = {})",
        config.name, config.max_connections
    );
    println!("   is_initialized: {}", is_initialized::<AppConfig>());

    // Every later access returns the identical instance.
    let again: Arc<AppConfig> = instance().expect("access failed");
    println!("   Same instance: {}", Arc::ptr_eq(&config, &again));

    // -------------------------------------------------------------------------
    // 3. Direct construction is rejected
    // -------------------------------------------------------------------------
    println!("\n3. Bypassing the manager...");

    match InitToken::acquire() {
        Ok(_) => println!("   Unexpected: got a token outside the manager"),
        Err(err) => println!("   Rejected as expected: {err}"),
    }

    // -------------------------------------------------------------------------
    // 4. Explicit disposal is idempotent and terminal
    // -------------------------------------------------------------------------
    println!("\n4. Disposing...");

    println!("   First dispose performed teardown: {}", dispose::<AppConfig>());
    println!("   Second dispose performed teardown: {}", dispose::<AppConfig>());
    println!("   is_disposed: {}", is_disposed::<AppConfig>());

    match instance::<AppConfig>() {
        Ok(_) => println!("   Unexpected: instance after disposal"),
        Err(err) => println!("   Access rejected as expected: {err}"),
    }
}
