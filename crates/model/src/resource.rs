use std::any::Any;
use std::fmt::{self, Debug, Formatter};
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::Error;

static NEXT_RESOURCE_ID: AtomicU64 = AtomicU64::new(1);

type CloseHook<T> = Box<dyn FnOnce(T) -> Result<(), Error> + Send>;

/// An opaque network-facing handle owned by exactly one client policy.
///
/// A `LiveResource` wraps whatever the provider needs to talk to the
/// remote side (usually one or more HTTP clients), and gives the rest of
/// the system a type-erased handle to it. Cloning the handle doesn't clone
/// the underlying value: all clones observe the same open/closed state,
/// and comparing `LiveResource` is just trivially comparing the `id`.
///
/// Only the owning policy should call [`LiveResource::close`]. Model
/// objects hold clones to reach the inner value, and will see `None` from
/// [`LiveResource::get`] once the resource has been released.
pub struct LiveResource(Arc<dyn ResourceObject>);

impl LiveResource {
    /// Creates a new `LiveResource` around `value`.
    ///
    /// The `label` is only used for diagnostics. Every resource gets a
    /// process-unique `id`.
    #[inline]
    pub fn new<L, T>(label: L, value: T) -> Self
    where
        L: Into<String>,
        T: Clone + Send + 'static,
    {
        Self::make(label.into(), value, None)
    }

    /// Creates a new `LiveResource` whose closing runs `on_close` with the
    /// inner value.
    ///
    /// The hook runs at most once. If it fails, the resource is still
    /// considered closed and the error is handed back to the caller of
    /// [`LiveResource::close`].
    #[inline]
    pub fn with_close_hook<L, T, F>(label: L, value: T, on_close: F) -> Self
    where
        L: Into<String>,
        T: Clone + Send + 'static,
        F: FnOnce(T) -> Result<(), Error> + Send + 'static,
    {
        Self::make(label.into(), value, Some(Box::new(on_close)))
    }

    fn make<T: Clone + Send + 'static>(
        label: String,
        value: T,
        on_close: Option<CloseHook<T>>,
    ) -> Self {
        let id = NEXT_RESOURCE_ID.fetch_add(1, Ordering::Relaxed);
        Self(Arc::new(ResourceInner {
            id,
            label,
            state: Mutex::new(ResourceState {
                value: Some(value),
                on_close,
            }),
        }))
    }

    /// Returns the process-unique identifier of this resource.
    #[inline]
    pub fn id(&self) -> u64 {
        self.0.id()
    }

    /// Returns the diagnostic label of this resource.
    #[inline]
    pub fn label(&self) -> &str {
        self.0.label()
    }

    /// Returns a clone of the inner value.
    ///
    /// Returns `None` if the resource has been closed, or if `T` is not
    /// the type the resource was created with.
    #[inline]
    pub fn get<T: Clone + Send + 'static>(&self) -> Option<T> {
        let inner = self.0.as_any().downcast_ref::<ResourceInner<T>>()?;
        inner.lock().value.clone()
    }

    /// Returns `true` if the resource has not been closed yet.
    #[inline]
    pub fn is_open(&self) -> bool {
        self.0.is_open()
    }

    /// Closes the resource, dropping the inner value.
    ///
    /// Returns `Ok(true)` if this call closed the resource, `Ok(false)` if
    /// it was already closed. An error means the close hook failed, the
    /// resource is closed regardless.
    #[inline]
    pub fn close(&self) -> Result<bool, Error> {
        self.0.close()
    }
}

impl Clone for LiveResource {
    #[inline]
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl Debug for LiveResource {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveResource")
            .field("id", &self.0.id())
            .field("label", &self.0.label())
            .field("open", &self.0.is_open())
            .finish()
    }
}

impl PartialEq for LiveResource {
    fn eq(&self, other: &Self) -> bool {
        self.0.id() == other.0.id()
    }
}

impl Eq for LiveResource {}

impl Hash for LiveResource {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id().hash(state);
    }
}

trait ResourceObject: Send + Sync {
    fn id(&self) -> u64;
    fn label(&self) -> &str;
    fn is_open(&self) -> bool;
    fn close(&self) -> Result<bool, Error>;
    fn as_any(&self) -> &dyn Any;
}

struct ResourceState<T> {
    value: Option<T>,
    on_close: Option<CloseHook<T>>,
}

struct ResourceInner<T> {
    id: u64,
    label: String,
    state: Mutex<ResourceState<T>>,
}

impl<T> ResourceInner<T> {
    #[inline]
    fn lock(&self) -> MutexGuard<'_, ResourceState<T>> {
        // The state is always consistent between two statements, so a
        // panicking holder can't leave it half-updated.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Clone + Send + 'static> ResourceObject for ResourceInner<T> {
    fn id(&self) -> u64 {
        self.id
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn is_open(&self) -> bool {
        self.lock().value.is_some()
    }

    fn close(&self) -> Result<bool, Error> {
        let (value, on_close) = {
            let mut state = self.lock();
            (state.value.take(), state.on_close.take())
        };
        let Some(value) = value else {
            return Ok(false);
        };
        // Run the hook outside of the lock, it may take a while.
        match on_close {
            Some(on_close) => on_close(value).map(|_| true),
            None => Ok(true),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
