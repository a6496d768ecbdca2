//! Typed Resource Handles
//!
//! Every resource kind is addressed by a [`UniqueId<K>`]: a plain `u64` tagged
//! with a zero-sized kind marker so that a `MeshId` can never be passed where a
//! `TextureId` is expected.
//!
//! # Design Principles
//! - Values come from one process-wide monotonic counter and are never reused
//! - `0` is the null id ("no resource"), which is also the `Default`
//! - A handle does not own anything; a stale handle simply stops resolving

use std::cmp::Ordering as CmpOrdering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};

// Global id generator. Starts at 1 so that 0 stays the null value.
static NEXT_UNIQUE_ID: AtomicU64 = AtomicU64::new(1);

/// Marker trait implemented by every resource kind.
pub trait IdKind: 'static {
    /// Human readable kind name, used in error messages and logs.
    const NAME: &'static str;
}

/// Strongly typed, copyable resource handle.
pub struct UniqueId<K: IdKind> {
    value: u64,
    _kind: PhantomData<fn() -> K>,
}

impl<K: IdKind> UniqueId<K> {
    /// The null id. Resolves to nothing unless a manager has a fallback.
    pub const NULL: Self = Self::from_raw(0);

    /// Allocates a fresh, never before seen id.
    #[must_use]
    pub fn allocate() -> Self {
        Self::from_raw(NEXT_UNIQUE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Wraps a raw value. Mostly useful for tests and serialization.
    #[inline]
    #[must_use]
    pub const fn from_raw(value: u64) -> Self {
        Self {
            value,
            _kind: PhantomData,
        }
    }

    #[inline]
    #[must_use]
    pub const fn get(self) -> u64 {
        self.value
    }

    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.value == 0
    }

    #[inline]
    #[must_use]
    pub const fn is_some(self) -> bool {
        self.value != 0
    }

    /// Converts the null id into `None`.
    #[inline]
    #[must_use]
    pub const fn non_null(self) -> Option<Self> {
        if self.is_null() { None } else { Some(self) }
    }

    #[inline]
    #[must_use]
    pub fn kind_name(self) -> &'static str {
        K::NAME
    }
}

// Manual impls: derives would put bounds on `K`, which is never instantiated.
impl<K: IdKind> Clone for UniqueId<K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K: IdKind> Copy for UniqueId<K> {}

impl<K: IdKind> PartialEq for UniqueId<K> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<K: IdKind> Eq for UniqueId<K> {}

impl<K: IdKind> PartialOrd for UniqueId<K> {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl<K: IdKind> Ord for UniqueId<K> {
    fn cmp(&self, other: &Self) -> CmpOrdering {
        self.value.cmp(&other.value)
    }
}

impl<K: IdKind> Hash for UniqueId<K> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl<K: IdKind> Default for UniqueId<K> {
    fn default() -> Self {
        Self::NULL
    }
}

impl<K: IdKind> fmt::Debug for UniqueId<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}Id({})", K::NAME, self.value)
    }
}

impl<K: IdKind> fmt::Display for UniqueId<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

macro_rules! id_kinds {
    ($($(#[$meta:meta])* $kind:ident => $alias:ident, $name:literal;)*) => {
        $(
            $(#[$meta])*
            #[derive(Debug)]
            pub enum $kind {}

            impl IdKind for $kind {
                const NAME: &'static str = $name;
            }

            $(#[$meta])*
            pub type $alias = UniqueId<$kind>;
        )*
    };
}

id_kinds! {
    /// Mesh resource.
    MeshTag => MeshId, "Mesh";
    /// Texture resource.
    TextureTag => TextureId, "Texture";
    /// Shader program resource.
    ShaderTag => ShaderId, "Shader";
    /// Material resource.
    MaterialTag => MaterialId, "Material";
    /// Scene camera.
    CameraTag => CameraId, "Camera";
    /// Stage light.
    LightTag => LightId, "Light";
    /// Stage actor.
    ActorTag => ActorId, "Actor";
    /// Stage.
    StageTag => StageId, "Stage";
    /// Screen viewport.
    ViewportTag => ViewportId, "Viewport";
    /// Render pipeline entry.
    PipelineTag => PipelineId, "Pipeline";
    /// UI overlay.
    OverlayTag => OverlayId, "Overlay";
    /// CPU-side vertex buffer built by a mesh.
    VertexBufferTag => BufferId, "VertexBuffer";
}
