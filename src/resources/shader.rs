use std::borrow::Cow;

use crate::core::Managed;

/// Named pair of shader sources.
///
/// Compilation is the backend's job; the core only tracks identity and
/// rejects programs that could never compile.
#[derive(Debug, Clone, Default)]
pub struct ShaderProgram {
    name: Cow<'static, str>,
    vertex_source: String,
    fragment_source: String,
}

impl ShaderProgram {
    #[must_use]
    pub fn new(
        name: impl Into<Cow<'static, str>>,
        vertex_source: impl Into<String>,
        fragment_source: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            vertex_source: vertex_source.into(),
            fragment_source: fragment_source.into(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn vertex_source(&self) -> &str {
        &self.vertex_source
    }

    #[must_use]
    pub fn fragment_source(&self) -> &str {
        &self.fragment_source
    }
}

impl Managed for ShaderProgram {
    fn init(&mut self) -> Result<(), String> {
        if self.vertex_source.trim().is_empty() {
            return Err(format!("shader '{}' has no vertex stage", self.name));
        }
        if self.fragment_source.trim().is_empty() {
            return Err(format!("shader '{}' has no fragment stage", self.name));
        }
        Ok(())
    }
}
