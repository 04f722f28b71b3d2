//! Resource-backed adapter: the singleton is resolved by loading a named
//! external resource instead of constructing a plain object.
//!
//! A [`ResourcePath`] is validated eagerly, before any load is attempted.
//! Resolution loads the existing resource at the path; if absent, a
//! pluggable [`ResourceCreator`] may synthesize and persist a new one
//! (authoring/tooling contexts only), otherwise resolution fails with
//! [`LifecycleError::MissingResource`].

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::LifecycleError;

/// A validated resource path.
///
/// Validation rules, checked in order:
/// - must not be empty
/// - must not start with a separator (not anchored at the root)
/// - must not end with a separator
/// - must not contain empty segments (`//`)
/// - characters are limited to ASCII alphanumerics, `_`, `-`, `.`, space,
///   and the `/` separator
///
/// # Examples
///
/// ```rust
/// use singleton_lifecycle::ResourcePath;
///
/// let path = ResourcePath::new("settings/audio").unwrap();
/// assert_eq!(path.as_str(), "settings/audio");
///
/// assert!(ResourcePath::new("/settings").is_err());
/// assert!(ResourcePath::new("settings//audio").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourcePath(String);

impl ResourcePath {
    /// Validates `raw` and wraps it.
    ///
    /// # Errors
    ///
    /// [`LifecycleError::InvalidPath`] naming the first rule violated.
    pub fn new(raw: impl Into<String>) -> Result<ResourcePath, LifecycleError> {
        let raw = raw.into();
        match Self::violation(&raw) {
            None => Ok(ResourcePath(raw)),
            Some(reason) => Err(LifecycleError::InvalidPath { path: raw, reason }),
        }
    }

    /// Returns the first validation failure, if any.
    fn violation(raw: &str) -> Option<&'static str> {
        if raw.is_empty() {
            return Some("path must not be empty");
        }
        if raw.starts_with('/') {
            return Some("path must not be anchored at the root");
        }
        if raw.ends_with('/') {
            return Some("path must not end with a separator");
        }
        if raw.contains("//") {
            return Some("path must not contain empty segments");
        }
        if raw.chars().any(|c| !Self::allowed(c)) {
            return Some("path contains a character outside the allowed set");
        }
        None
    }

    fn allowed(c: char) -> bool {
        c.is_ascii_alphanumeric() || matches!(c, '/' | '_' | '-' | '.' | ' ')
    }

    /// The validated path as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Iterates the path's segments.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }
}

impl fmt::Display for ResourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Loads an existing resource by path. Supplied by the host's asset system.
pub trait ResourceLoader<T>: Send + Sync {
    /// Returns the resource at `path`, or `None` if it does not exist.
    fn load(&self, path: &ResourcePath) -> Option<Arc<T>>;
}

/// Synthesizes and persists a missing resource. Available only in
/// authoring/tooling contexts; the adapter fails with
/// [`LifecycleError::MissingResource`] when no creator is supplied.
pub trait ResourceCreator<T>: Send + Sync {
    /// Builds the resource and persists it at `path`. Must either return a
    /// valid instance or fail — never a silent placeholder.
    fn create_and_persist(&self, path: &ResourcePath) -> Result<Arc<T>, LifecycleError>;
}

/// Resolves a singleton by loading a named external resource, caching the
/// result for the lifetime of the adapter.
pub struct ResourceSingleton<T, L> {
    path: ResourcePath,
    loader: L,
    creator: Option<Box<dyn ResourceCreator<T>>>,
    cached: Mutex<Option<Arc<T>>>,
    shutting_down: AtomicBool,
}

impl<T: Send + Sync + 'static, L: ResourceLoader<T>> ResourceSingleton<T, L> {
    /// Creates a non-authoring adapter: a missing resource is an error.
    ///
    /// The path is validated here; an invalid path fails fast, before any
    /// load is attempted.
    pub fn new(path: impl Into<String>, loader: L) -> Result<ResourceSingleton<T, L>, LifecycleError> {
        Ok(ResourceSingleton {
            path: ResourcePath::new(path)?,
            loader,
            creator: None,
            cached: Mutex::new(None),
            shutting_down: AtomicBool::new(false),
        })
    }

    /// Creates an authoring adapter: a missing resource is synthesized and
    /// persisted through `creator` on first resolution.
    pub fn with_creator(
        path: impl Into<String>,
        loader: L,
        creator: impl ResourceCreator<T> + 'static,
    ) -> Result<ResourceSingleton<T, L>, LifecycleError> {
        let mut adapter = ResourceSingleton::new(path, loader)?;
        adapter.creator = Some(Box::new(creator));
        Ok(adapter)
    }

    /// The validated path this adapter resolves.
    pub fn path(&self) -> &ResourcePath {
        &self.path
    }

    /// Resolves the resource, loading (or creating) it on first call.
    ///
    /// A cached instance is returned even after shutdown — the cache is
    /// never discarded — but a cold resolve during shutdown is rejected
    /// with [`LifecycleError::Unavailable`] rather than resurrecting the
    /// singleton.
    ///
    /// # Errors
    ///
    /// - [`LifecycleError::MissingResource`] if nothing exists at the path
    ///   and no creation strategy was supplied
    /// - [`LifecycleError::Unavailable`] on a cold resolve during shutdown
    /// - any error returned by the creation strategy
    pub fn resolve(&self) -> Result<Arc<T>, LifecycleError> {
        let mut cached = self.cached.lock();
        if let Some(existing) = cached.as_ref() {
            return Ok(Arc::clone(existing));
        }
        if self.shutting_down.load(Ordering::Acquire) {
            return Err(LifecycleError::Unavailable);
        }

        let resolved = match self.loader.load(&self.path) {
            Some(found) => found,
            None => match self.creator.as_ref() {
                Some(creator) => {
                    let created = creator.create_and_persist(&self.path)?;
                    log::info!("created resource at `{}`", self.path);
                    created
                }
                None => {
                    return Err(LifecycleError::MissingResource {
                        path: self.path.as_str().to_string(),
                    })
                }
            },
        };

        *cached = Some(Arc::clone(&resolved));
        Ok(resolved)
    }

    /// Returns the cached instance without resolving.
    pub fn current(&self) -> Option<Arc<T>> {
        self.cached.lock().clone()
    }

    /// True iff an instance has been resolved and the host is not shutting
    /// down. Shutdown flips this to false without discarding the cache.
    pub fn is_valid(&self) -> bool {
        !self.shutting_down.load(Ordering::Acquire) && self.cached.lock().is_some()
    }

    /// Marks the host as shutting down.
    pub fn shutdown(&self) {
        self.shutting_down.store(true, Ordering::Release);
    }

    /// Whether the host has signalled shutdown.
    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::Acquire)
    }
}

// -------------------------------------------------------------------------------------------------
// Tests
// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_paths() {
        for raw in ["settings", "settings/audio", "a/b/c", "My Settings/v2.1", "x-y_z.cfg"] {
            assert!(ResourcePath::new(raw).is_ok(), "expected `{raw}` to validate");
        }
    }

    #[test]
    fn test_invalid_paths() {
        let cases = [
            ("", "path must not be empty"),
            ("/settings", "path must not be anchored at the root"),
            ("settings/", "path must not end with a separator"),
            ("settings//audio", "path must not contain empty segments"),
            ("settings\\audio", "path contains a character outside the allowed set"),
            ("settings?", "path contains a character outside the allowed set"),
        ];
        for (raw, expected) in cases {
            match ResourcePath::new(raw) {
                Err(LifecycleError::InvalidPath { path, reason }) => {
                    assert_eq!(path, raw);
                    assert_eq!(reason, expected);
                }
                other => panic!("expected InvalidPath for `{raw}`, got ok={}", other.is_ok()),
            }
        }
    }

    #[test]
    fn test_segments() {
        let path = ResourcePath::new("settings/audio/master").unwrap();
        let segments: Vec<&str> = path.segments().collect();
        assert_eq!(segments, ["settings", "audio", "master"]);
    }

    #[test]
    fn test_display_round_trip() {
        let path = ResourcePath::new("settings/audio").unwrap();
        assert_eq!(path.to_string(), "settings/audio");
    }
}
