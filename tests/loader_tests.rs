//! Loader Tests
//!
//! Tests for:
//! - Decoding images into textures (bpp selection, row flip)
//! - Checkerboard fallback and `dont_fallback`
//! - Custom loaders populating meshes through the public API
//! - LoaderOptions parsing

mod common;

use std::io::Cursor;

use image::{ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};

use lantern::assets::loaders::texture::DONT_FALLBACK;
use lantern::{Loader, LoaderOptions, Mesh, ResourceManager, Result, TextureLoader};

fn encode_png(image: impl Into<image::DynamicImage>) -> Vec<u8> {
    let mut bytes = Cursor::new(Vec::new());
    image.into().write_to(&mut bytes, ImageFormat::Png).unwrap();
    bytes.into_inner()
}

// ============================================================================
// Textures
// ============================================================================

#[test]
fn rgba_png_loads_flipped_at_32_bpp() {
    common::init_logging();
    // Row 0 red, row 1 blue
    let image = RgbaImage::from_fn(1, 2, |_, y| {
        if y == 0 {
            Rgba([255, 0, 0, 255])
        } else {
            Rgba([0, 0, 255, 255])
        }
    });
    let loader = TextureLoader::from_memory(encode_png(image));

    let mut resources = ResourceManager::new();
    let id = resources
        .new_texture_from_loader(&loader, &LoaderOptions::new())
        .unwrap();
    let texture = resources.texture(id).unwrap();

    assert_eq!((texture.width(), texture.height(), texture.bpp()), (1, 2, 32));
    assert_eq!(&*texture.data(), &[0, 0, 255, 255, 255, 0, 0, 255]);
}

#[test]
fn rgb_png_loads_at_24_bpp() {
    let image = RgbImage::from_pixel(3, 2, Rgb([1, 2, 3]));
    let loader = TextureLoader::from_memory(encode_png(image));

    let mut resources = ResourceManager::new();
    let id = resources
        .new_texture_from_loader(&loader, &LoaderOptions::new())
        .unwrap();
    let texture = resources.texture(id).unwrap();

    assert_eq!(texture.bpp(), 24);
    assert_eq!(texture.data().len(), 3 * 2 * 3);
}

#[test]
fn missing_file_falls_back_to_checkerboard() {
    let loader = TextureLoader::from_path("does/not/exist.png");
    let mut resources = ResourceManager::new();

    let id = resources
        .new_texture_from_loader(&loader, &LoaderOptions::new())
        .unwrap();
    let texture = resources.texture(id).unwrap();
    assert_eq!((texture.width(), texture.height(), texture.bpp()), (64, 64, 32));

    let data = texture.data();
    assert_ne!(&data[0..4], &data[8 * 4..8 * 4 + 4], "adjacent checks differ");
}

#[test]
fn dont_fallback_surfaces_the_error() {
    let loader = TextureLoader::from_memory(vec![0_u8, 1, 2, 3]);
    let options = LoaderOptions::new().with(DONT_FALLBACK, "true");

    let mut resources = ResourceManager::new();
    assert!(resources.new_texture_from_loader(&loader, &options).is_err());
    assert_eq!(resources.texture_count(), 0);
}

// ============================================================================
// Custom loaders
// ============================================================================

struct QuadLoader;

impl Loader for QuadLoader {
    type Target = Mesh;

    fn load_into(&self, mesh: &mut Mesh, options: &LoaderOptions) -> Result<()> {
        let size: f32 = options
            .get("size")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        mesh.add_vertex(0.0, 0.0, 0.0);
        mesh.add_vertex(size, 0.0, 0.0);
        mesh.add_vertex(size, size, 0.0);
        mesh.add_vertex(0.0, size, 0.0);
        mesh.add_triangle(0, 1, 2);
        mesh.add_triangle(0, 2, 3);
        Ok(())
    }
}

#[test]
fn custom_mesh_loader_uses_public_api() {
    let mut resources = ResourceManager::new();
    let options: LoaderOptions = [("size", "2.5")].into_iter().collect();

    let id = resources.new_mesh_from_loader(&QuadLoader, &options).unwrap();
    let mesh = resources.mesh(id).unwrap();
    assert_eq!(mesh.vertex_count(), 4);
    assert_eq!(mesh.triangles().len(), 2);
    assert_eq!(mesh.vertex(2).map(|v| v.position.x), Some(2.5));
}

#[test]
fn option_flags_are_literal() {
    let options = LoaderOptions::new()
        .with("a", "true")
        .with("b", "TRUE")
        .with("c", "1");

    assert!(options.flag("a"));
    assert!(!options.flag("b"));
    assert!(!options.flag("c"));
    assert!(!options.flag("missing"));
    assert_eq!(options.get("c"), Some("1"));
}
