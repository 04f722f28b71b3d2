use std::error::Error;
use std::fmt;

/// Boxed source error carried by [`LifecycleError::Construction`].
pub type BoxError = Box<dyn Error + Send + Sync + 'static>;

/// Errors raised by the lifecycle manager and its adapters.
#[derive(Debug)]
pub enum LifecycleError {
    /// The singleton entered `Disposed`; every subsequent operation fails.
    Disposed,
    /// The construction collaborator failed. Carries the original failure,
    /// unwrapped from any panic payload it may have travelled in.
    Construction(BoxError),
    /// A caller attempted to construct the managed type outside the
    /// manager's one-shot initializer.
    DirectConstruction,
    /// A resource path failed validation before any load was attempted.
    InvalidPath {
        path: String,
        reason: &'static str,
    },
    /// No resource exists at the path and no creation strategy is available.
    MissingResource {
        path: String,
    },
    /// The host signalled shutdown; the singleton will not be created or
    /// resolved again.
    Unavailable,
}

impl LifecycleError {
    /// Wraps a collaborator failure as a construction error.
    pub fn construction(source: impl Into<BoxError>) -> Self {
        LifecycleError::Construction(source.into())
    }
}

impl fmt::Display for LifecycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleError::Disposed => write!(f, "Singleton has been disposed"),
            LifecycleError::Construction(source) => {
                write!(f, "Singleton construction failed: {source}")
            }
            LifecycleError::DirectConstruction => {
                write!(f, "Direct construction is not permitted; use the lifecycle manager")
            }
            LifecycleError::InvalidPath { path, reason } => {
                write!(f, "Invalid resource path `{path}`: {reason}")
            }
            LifecycleError::MissingResource { path } => {
                write!(f, "No resource found at `{path}` and no creation strategy available")
            }
            LifecycleError::Unavailable => {
                write!(f, "Host is shutting down; singleton is unavailable")
            }
        }
    }
}

impl Error for LifecycleError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            LifecycleError::Construction(source) => Some(source.as_ref()),
            _ => None,
        }
    }
}
