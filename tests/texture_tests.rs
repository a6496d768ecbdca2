//! Texture Tests
//!
//! Tests for:
//! - Buffer size invariant across resize / set_bpp / set_data
//! - free() keeping dimensions and the GPU handle
//! - sub_texture placement, rejection rules and crossed concurrent copies
//! - Shared handle semantics of cloned textures

mod common;

use std::thread;

use lantern::renderer::{HeadlessContext, UploadGate, UploadOptions};
use lantern::{EngineError, Texture};

// ============================================================================
// Size invariant
// ============================================================================

#[test]
fn resize_allocates_zeroed_buffer() {
    common::init_logging();
    let texture = Texture::new();
    texture.resize(4, 3);

    assert_eq!(texture.data().len(), 4 * 3 * 4);
    assert!(texture.data().iter().all(|&b| b == 0));
    assert_eq!((texture.width(), texture.height(), texture.channels()), (4, 3, 4));
}

#[test]
fn resize_after_set_bpp_uses_new_depth() {
    let texture = Texture::new();
    texture.set_bpp(24).unwrap();
    texture.resize(5, 5);
    assert_eq!(texture.data().len(), 5 * 5 * 3);

    texture.set_bpp(8).unwrap();
    assert_eq!(texture.data().len(), 5 * 5);
    texture.resize(2, 7);
    assert_eq!(texture.data().len(), 2 * 7);
}

#[test]
fn set_bpp_on_empty_texture_keeps_it_empty() {
    let texture = Texture::new();
    texture.set_bpp(16).unwrap();
    assert!(texture.is_empty());
    assert_eq!(texture.bpp(), 16);
}

#[test]
fn unsupported_bpp_is_rejected() {
    let texture = Texture::new();
    for bpp in [0, 12, 48] {
        assert!(matches!(
            texture.set_bpp(bpp),
            Err(EngineError::InvalidOperation(_))
        ));
    }
    assert_eq!(texture.bpp(), 32);
}

#[test]
fn set_data_validates_length() {
    let texture = Texture::new();
    assert!(texture.set_data(2, 2, 24, vec![0; 11]).is_err());
    assert!(texture.is_empty());

    texture.set_data(2, 2, 24, vec![7; 12]).unwrap();
    assert_eq!(texture.bpp(), 24);
    assert_eq!(&*texture.data(), &[7; 12]);
}

#[test]
fn mutation_bumps_version() {
    let texture = Texture::new();
    let v0 = texture.version();
    texture.resize(1, 1);
    let v1 = texture.version();
    texture.data_mut()[0] = 9;
    assert!(v1 > v0);
    assert!(texture.version() > v1);
}

// ============================================================================
// free()
// ============================================================================

#[test]
fn free_after_upload_keeps_gpu_handle() {
    let gate = UploadGate::new(HeadlessContext::new());
    let texture = Texture::solid(2, 2, [1, 2, 3, 4]);

    let handle = texture
        .upload(
            &gate,
            UploadOptions {
                free_after: true,
                ..UploadOptions::default()
            },
        )
        .unwrap();

    assert!(texture.is_empty());
    assert_eq!((texture.width(), texture.height()), (2, 2));
    assert_eq!(texture.gpu_handle(), Some(handle));
}

#[test]
fn upload_without_pixels_fails() {
    let gate = UploadGate::new(HeadlessContext::new());
    let texture = Texture::new();
    assert!(texture.upload(&gate, UploadOptions::default()).is_err());
    assert_eq!(texture.gpu_handle(), None);
}

#[test]
fn reupload_reuses_handle() {
    let gate = UploadGate::new(HeadlessContext::new());
    let texture = Texture::solid(1, 1, [0, 0, 0, 255]);
    let keep = UploadOptions {
        free_after: false,
        ..UploadOptions::default()
    };

    let first = texture.upload(&gate, keep).unwrap();
    texture.data_mut()[0] = 255;
    let second = texture.upload(&gate, keep).unwrap();
    assert_eq!(first, second);
}

// ============================================================================
// sub_texture
// ============================================================================

#[test]
fn sub_texture_copies_into_place() {
    let dst = Texture::solid(4, 4, [0, 0, 0, 0]);
    let src = Texture::solid(2, 1, [9, 9, 9, 9]);

    dst.sub_texture(&src, 1, 2).unwrap();

    let data = dst.data();
    let pixel = |x: usize, y: usize| &data[(y * 4 + x) * 4..(y * 4 + x) * 4 + 4];
    assert_eq!(pixel(1, 2), &[9, 9, 9, 9]);
    assert_eq!(pixel(2, 2), &[9, 9, 9, 9]);
    assert_eq!(pixel(0, 2), &[0, 0, 0, 0]);
    assert_eq!(pixel(3, 2), &[0, 0, 0, 0]);
    assert_eq!(pixel(1, 1), &[0, 0, 0, 0]);
}

#[test]
fn sub_texture_rejections() {
    let dst = Texture::solid(4, 4, [0; 4]);

    let too_big = Texture::solid(3, 3, [1; 4]);
    assert!(dst.sub_texture(&too_big, 2, 2).is_err());

    let other_depth = Texture::with_bpp(24);
    other_depth.resize(1, 1);
    assert!(dst.sub_texture(&other_depth, 0, 0).is_err());

    assert!(dst.sub_texture(&dst.clone(), 0, 0).is_err());
}

#[test]
fn crossed_sub_texture_copies_run_together() {
    let a = Texture::solid(2, 2, [1; 4]);
    let b = Texture::solid(2, 2, [2; 4]);

    let workers: Vec<_> = [(a.clone(), b.clone()), (b.clone(), a.clone())]
        .into_iter()
        .map(|(dst, src)| {
            thread::spawn(move || {
                for _ in 0..1000 {
                    dst.sub_texture(&src, 0, 0).unwrap();
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    assert_eq!(a.data().len(), 16);
    assert_eq!(b.data().len(), 16);
}

#[test]
fn clones_share_pixels() {
    let a = Texture::new();
    let b = a.clone();
    a.resize(2, 2);

    assert_eq!(b.data().len(), 16);
    assert_eq!(a, b);
    assert_ne!(a, Texture::new());
}
