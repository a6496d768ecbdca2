use std::path::PathBuf;
use std::sync::Arc;

use image::{DynamicImage, GenericImageView};

use crate::assets::{Loader, LoaderOptions};
use crate::errors::Result;
use crate::resources::texture::Texture;

/// Option key: `"true"` turns decode failures into errors instead of a
/// placeholder checkerboard.
pub const DONT_FALLBACK: &str = "dont_fallback";

const FALLBACK_SIZE: u32 = 64;
const FALLBACK_CHECK: u32 = 8;
const FALLBACK_A: [u8; 4] = [255, 255, 255, 255];
const FALLBACK_B: [u8; 4] = [255, 0, 255, 255];

#[derive(Debug, Clone)]
enum Source {
    Path(PathBuf),
    Memory(Arc<[u8]>),
}

/// Decodes PNG/JPEG/HDR/WebP images into a [`Texture`].
///
/// Images with alpha land at 32 bpp, everything else at 24 bpp. Rows are
/// flipped so that the first row in memory is the bottom of the image.
///
/// Recognized options:
/// - `dont_fallback`: `"true"` | `"false"` (default `"false"`)
#[derive(Debug, Clone)]
pub struct TextureLoader {
    source: Source,
}

impl TextureLoader {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            source: Source::Path(path.into()),
        }
    }

    pub fn from_memory(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            source: Source::Memory(bytes.into()),
        }
    }

    fn decode(&self) -> Result<DynamicImage> {
        Ok(match &self.source {
            Source::Path(path) => image::open(path)?,
            Source::Memory(bytes) => image::load_from_memory(bytes)?,
        })
    }

    fn describe(&self) -> String {
        match &self.source {
            Source::Path(path) => path.display().to_string(),
            Source::Memory(bytes) => format!("<{} bytes in memory>", bytes.len()),
        }
    }
}

impl Loader for TextureLoader {
    type Target = Texture;

    fn load_into(&self, texture: &mut Texture, options: &LoaderOptions) -> Result<()> {
        let image = match self.decode() {
            Ok(image) => image,
            Err(err) if options.flag(DONT_FALLBACK) => return Err(err),
            Err(err) => {
                log::warn!(
                    "Failed to load texture {}: {err}; using checkerboard placeholder",
                    self.describe()
                );
                let placeholder = Texture::checkerboard(
                    FALLBACK_SIZE,
                    FALLBACK_SIZE,
                    FALLBACK_CHECK,
                    FALLBACK_A,
                    FALLBACK_B,
                );
                let pixels = placeholder.data().to_vec();
                return texture.set_data(FALLBACK_SIZE, FALLBACK_SIZE, 32, pixels);
            }
        };

        let (width, height) = image.dimensions();
        let (bpp, pixels) = if image.color().has_alpha() {
            (32, image.into_rgba8().into_raw())
        } else {
            (24, image.into_rgb8().into_raw())
        };

        texture.set_data(width, height, bpp, pixels)?;
        texture.flip_vertically();
        log::debug!("Loaded texture {} ({width}x{height}@{bpp}bpp)", self.describe());
        Ok(())
    }
}
