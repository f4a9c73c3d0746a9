//! Render surface handle.
//!
//! The core never draws anything itself. Native backends hand back an opaque
//! view/layer object which the core wraps in a [`RenderSurface`] and returns
//! from `prepare`. The host downcasts it to its concrete view type and attaches
//! it to its own hierarchy; sizing and aspect handling belong to the host.

use std::any::Any;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Unique identifier of a surface instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceId(Uuid);

impl SurfaceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for SurfaceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque, cheaply cloneable handle to a native rendering surface.
///
/// An empty surface is returned when the backend could not produce a view
/// (for example when SDK player construction fails).
#[derive(Clone, Default)]
pub struct RenderSurface {
    inner: Option<(SurfaceId, Arc<dyn Any + Send + Sync>)>,
}

impl RenderSurface {
    /// Wrap a native view object.
    pub fn new<T: Any + Send + Sync>(native: T) -> Self {
        Self::from_arc(Arc::new(native))
    }

    /// Wrap an already shared native view object.
    pub fn from_arc(native: Arc<dyn Any + Send + Sync>) -> Self {
        Self {
            inner: Some((SurfaceId::new(), native)),
        }
    }

    pub fn empty() -> Self {
        Self { inner: None }
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_none()
    }

    pub fn id(&self) -> Option<SurfaceId> {
        self.inner.as_ref().map(|(id, _)| *id)
    }

    /// Borrow the native view as its concrete type.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner
            .as_ref()
            .and_then(|(_, native)| native.downcast_ref::<T>())
    }

    /// Two handles are the same surface when they wrap the same native object.
    pub fn same_surface(&self, other: &RenderSurface) -> bool {
        match (&self.inner, &other.inner) {
            (Some((a, _)), Some((b, _))) => a == b,
            (None, None) => true,
            _ => false,
        }
    }
}

impl fmt::Debug for RenderSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner {
            Some((id, _)) => f.debug_tuple("RenderSurface").field(id).finish(),
            None => f.write_str("RenderSurface(empty)"),
        }
    }
}
