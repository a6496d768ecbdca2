//! Loader interface.
//!
//! Decoders populate resources through their public mutation API
//! (`Texture::set_data`, `Mesh::add_vertex`, ...). The core never decodes
//! anything itself; it only owns the surface loaders write into.

pub mod loaders;

use rustc_hash::FxHashMap;

use crate::errors::Result;

pub use loaders::TextureLoader;

/// Fills an already constructed resource.
pub trait Loader {
    type Target;

    fn load_into(&self, target: &mut Self::Target, options: &LoaderOptions) -> Result<()>;
}

/// `name -> value` options understood by a loader.
///
/// Every loader documents the keys it reads, e.g. `dont_fallback`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoaderOptions {
    values: FxHashMap<String, String>,
}

impl LoaderOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// `true` only for the literal value `"true"`.
    #[must_use]
    pub fn flag(&self, key: &str) -> bool {
        self.get(key) == Some("true")
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for LoaderOptions {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
