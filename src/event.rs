/// Events emitted by a lifecycle manager during operations.
///
/// These events are passed to the tracing callback set via `set_trace_callback`.
/// The `Clone` derive allows callbacks to store or forward events if needed.
///
/// # Examples
///
/// ```rust
/// use singleton_lifecycle::LifecycleEvent;
///
/// let event = LifecycleEvent::Construct { type_name: "AppConfig" };
/// println!("{:?}", event);
/// ```
#[derive(Debug, Clone)]
pub enum LifecycleEvent {
    /// An instance was constructed by the one-shot initializer.
    Construct {
        /// The type name of the constructed instance
        type_name: &'static str,
    },

    /// An instance was requested from the manager.
    Access {
        /// The type name that was requested
        type_name: &'static str,
        /// Whether a live instance was returned
        ready: bool,
    },

    /// A disposal was requested for a type.
    Dispose {
        /// The type name that was disposed
        type_name: &'static str,
        /// Whether this call actually performed teardown
        torn_down: bool,
    },
    /// The manager's cell map was reset (test-only operation).
    Reset {},
}

impl std::fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LifecycleEvent::Construct { type_name } => {
                write!(f, "construct {{ type_name: {} }}", type_name)
            }
            LifecycleEvent::Access { type_name, ready } => {
                write!(f, "access {{ type_name: {}, ready: {} }}", type_name, ready)
            }
            LifecycleEvent::Dispose {
                type_name,
                torn_down,
            } => {
                write!(
                    f,
                    "dispose {{ type_name: {}, torn_down: {} }}",
                    type_name, torn_down
                )
            }
            LifecycleEvent::Reset {} => write!(f, "Resetting the manager"),
        }
    }
}
