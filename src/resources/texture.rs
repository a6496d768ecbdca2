use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{
    MappedRwLockReadGuard, MappedRwLockWriteGuard, Mutex, RwLock, RwLockReadGuard,
    RwLockWriteGuard,
};

use crate::core::Managed;
use crate::errors::{EngineError, Result};
use crate::renderer::upload::{
    GpuTextureHandle, GraphicsContext, TextureImage, UploadGate, UploadOptions,
};

// Everything that must change together when the texture is resized.
#[derive(Debug)]
struct PixelBuffer {
    width: u32,
    height: u32,
    bpp: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    fn byte_len(width: u32, height: u32, bpp: u32) -> usize {
        width as usize * height as usize * (bpp as usize / 8)
    }

    fn row_len(&self) -> usize {
        self.width as usize * (self.bpp as usize / 8)
    }
}

#[derive(Debug)]
struct TextureInner {
    pixels: RwLock<PixelBuffer>,
    gpu: Mutex<Option<GpuTextureHandle>>,
    // Held by the owner thread while one upload of this texture runs.
    upload_lock: Mutex<()>,
    version: AtomicU64,
}

/// CPU pixel buffer plus the GPU texture it was uploaded to.
///
/// `Texture` is a shared handle (`Arc` inside): clones refer to the same
/// pixels, which lets loader threads fill a texture that the scene already
/// owns. The buffer size is always `width * height * bpp / 8` bytes whenever
/// it is non-empty.
#[derive(Debug, Clone)]
pub struct Texture(Arc<TextureInner>);

impl PartialEq for Texture {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Texture {}

impl Texture {
    /// Empty 32 bpp texture.
    #[must_use]
    pub fn new() -> Self {
        Self::with_bpp(32)
    }

    #[must_use]
    pub fn with_bpp(bpp: u32) -> Self {
        Self(Arc::new(TextureInner {
            pixels: RwLock::new(PixelBuffer {
                width: 0,
                height: 0,
                bpp,
                data: Vec::new(),
            }),
            gpu: Mutex::new(None),
            upload_lock: Mutex::new(()),
            version: AtomicU64::new(1),
        }))
    }

    /// `width x height` texture filled with one RGBA colour.
    #[must_use]
    pub fn solid(width: u32, height: u32, colour: [u8; 4]) -> Self {
        let texture = Self::new();
        texture.resize(width, height);
        for pixel in texture.data_mut().chunks_exact_mut(4) {
            pixel.copy_from_slice(&colour);
        }
        texture
    }

    /// Two-colour RGBA checkerboard with `check_size` pixel squares.
    #[must_use]
    pub fn checkerboard(
        width: u32,
        height: u32,
        check_size: u32,
        a: [u8; 4],
        b: [u8; 4],
    ) -> Self {
        let texture = Self::new();
        texture.resize(width, height);
        let check = check_size.max(1);
        {
            let mut data = texture.data_mut();
            for (i, pixel) in data.chunks_exact_mut(4).enumerate() {
                let x = (i as u32 % width.max(1)) / check;
                let y = (i as u32 / width.max(1)) / check;
                pixel.copy_from_slice(if (x + y) % 2 == 0 { &a } else { &b });
            }
        }
        texture
    }

    // ========================================================================
    // Geometry
    // ========================================================================

    #[must_use]
    pub fn width(&self) -> u32 {
        self.0.pixels.read().width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.0.pixels.read().height
    }

    #[must_use]
    pub fn bpp(&self) -> u32 {
        self.0.pixels.read().bpp
    }

    #[must_use]
    pub fn channels(&self) -> u32 {
        self.bpp() / 8
    }

    /// Reallocates a zero-filled buffer of `width * height * bpp / 8` bytes.
    pub fn resize(&self, width: u32, height: u32) {
        let mut pixels = self.0.pixels.write();
        pixels.width = width;
        pixels.height = height;
        pixels.data = vec![0; PixelBuffer::byte_len(width, height, pixels.bpp)];
        self.bump_version();
    }

    /// Changes the bit depth. A non-empty buffer is reallocated (zeroed) at
    /// the new size; an empty one stays empty until the next resize.
    pub fn set_bpp(&self, bpp: u32) -> Result<()> {
        if bpp == 0 || bpp % 8 != 0 || bpp > 32 {
            return Err(EngineError::InvalidOperation(format!(
                "unsupported texture depth: {bpp} bpp"
            )));
        }
        let mut pixels = self.0.pixels.write();
        if pixels.bpp == bpp {
            return Ok(());
        }
        pixels.bpp = bpp;
        if !pixels.data.is_empty() {
            pixels.data = vec![0; PixelBuffer::byte_len(pixels.width, pixels.height, bpp)];
        }
        self.bump_version();
        Ok(())
    }

    // ========================================================================
    // Pixel access
    // ========================================================================

    #[must_use]
    pub fn data(&self) -> MappedRwLockReadGuard<'_, [u8]> {
        RwLockReadGuard::map(self.0.pixels.read(), |p| p.data.as_slice())
    }

    /// Write access to the pixels. The length is fixed; use
    /// [`Texture::resize`] or [`Texture::set_data`] to change it.
    #[must_use]
    pub fn data_mut(&self) -> MappedRwLockWriteGuard<'_, [u8]> {
        let pixels = self.0.pixels.write();
        // Readers that see the new version block until the guard is dropped
        self.bump_version();
        RwLockWriteGuard::map(pixels, |p| p.data.as_mut_slice())
    }

    /// Replaces geometry and pixels in one step.
    pub fn set_data(&self, width: u32, height: u32, bpp: u32, data: Vec<u8>) -> Result<()> {
        let expected = PixelBuffer::byte_len(width, height, bpp);
        if data.len() != expected {
            return Err(EngineError::InvalidOperation(format!(
                "{width}x{height}@{bpp}bpp needs {expected} bytes, got {}",
                data.len()
            )));
        }
        *self.0.pixels.write() = PixelBuffer {
            width,
            height,
            bpp,
            data,
        };
        self.bump_version();
        Ok(())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.pixels.read().data.is_empty()
    }

    /// Releases the CPU copy. Width, height and the GPU handle are kept.
    pub fn free(&self) {
        let mut pixels = self.0.pixels.write();
        pixels.data = Vec::new();
    }

    pub fn flip_vertically(&self) {
        let mut pixels = self.0.pixels.write();
        let row = pixels.row_len();
        let rows = pixels.height as usize;
        if row == 0 || pixels.data.is_empty() {
            return;
        }
        for top in 0..rows / 2 {
            let bottom = rows - 1 - top;
            let (head, tail) = pixels.data.split_at_mut(bottom * row);
            head[top * row..(top + 1) * row].swap_with_slice(&mut tail[..row]);
        }
        drop(pixels);
        self.bump_version();
    }

    /// Copies all of `source` into this texture with its top-left corner at
    /// `(offset_x, offset_y)`.
    pub fn sub_texture(&self, source: &Texture, offset_x: u32, offset_y: u32) -> Result<()> {
        if self == source {
            return Err(EngineError::InvalidOperation(
                "a texture can not be copied into itself".into(),
            ));
        }

        // Lock in address order so that `a <- b` and `b <- a` can run together
        let (src, mut dst) = if Arc::as_ptr(&source.0) < Arc::as_ptr(&self.0) {
            let src = source.0.pixels.read();
            (src, self.0.pixels.write())
        } else {
            let dst = self.0.pixels.write();
            (source.0.pixels.read(), dst)
        };

        if src.bpp != dst.bpp {
            return Err(EngineError::InvalidOperation(format!(
                "sub_texture depth mismatch: {} bpp into {} bpp",
                src.bpp, dst.bpp
            )));
        }
        if u64::from(offset_x) + u64::from(src.width) > u64::from(dst.width)
            || u64::from(offset_y) + u64::from(src.height) > u64::from(dst.height)
        {
            return Err(EngineError::InvalidOperation(format!(
                "{}x{} at ({offset_x}, {offset_y}) does not fit in {}x{}",
                src.width, src.height, dst.width, dst.height
            )));
        }
        if src.data.is_empty() || dst.data.is_empty() {
            return Err(EngineError::InvalidOperation(
                "sub_texture needs pixel data on both textures".into(),
            ));
        }

        let bytes_per_pixel = dst.bpp as usize / 8;
        let src_row = src.row_len();
        let dst_row = dst.row_len();
        for y in 0..src.height as usize {
            let from = y * src_row;
            let to = (offset_y as usize + y) * dst_row + offset_x as usize * bytes_per_pixel;
            dst.data[to..to + src_row].copy_from_slice(&src.data[from..from + src_row]);
        }
        drop(dst);
        self.bump_version();
        Ok(())
    }

    // ========================================================================
    // GPU side
    // ========================================================================

    #[must_use]
    pub fn gpu_handle(&self) -> Option<GpuTextureHandle> {
        *self.0.gpu.lock()
    }

    /// Bumped by every pixel mutation.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.0.version.load(Ordering::Relaxed)
    }

    /// Uploads the pixels through `gate`.
    ///
    /// Runs inline on the gate's owner thread; elsewhere it blocks until the
    /// owner has pumped the task. Concurrent uploads of the same texture
    /// run one after another on the owner thread; the second one refills
    /// the GPU texture created by the first.
    pub fn upload(&self, gate: &UploadGate, options: UploadOptions) -> Result<GpuTextureHandle> {
        let texture = self.clone();
        gate.execute(move |ctx| texture.upload_now(ctx, &options))?
    }

    fn upload_now(
        &self,
        ctx: &mut dyn GraphicsContext,
        options: &UploadOptions,
    ) -> Result<GpuTextureHandle> {
        let _serial = self.0.upload_lock.lock();
        let handle = {
            let pixels = self.0.pixels.read();
            if pixels.data.is_empty() {
                return Err(EngineError::InvalidOperation(
                    "texture has no pixel data to upload".into(),
                ));
            }
            let existing = *self.0.gpu.lock();
            let image = TextureImage {
                width: pixels.width,
                height: pixels.height,
                bpp: pixels.bpp,
                data: &pixels.data,
            };
            ctx.upload_texture(existing, &image, options)?
        };

        *self.0.gpu.lock() = Some(handle);
        if options.free_after {
            self.free();
        }
        Ok(handle)
    }

    pub(crate) fn take_gpu_handle(&self) -> Option<GpuTextureHandle> {
        self.0.gpu.lock().take()
    }

    fn bump_version(&self) {
        self.0.version.fetch_add(1, Ordering::Relaxed);
    }
}

impl Default for Texture {
    fn default() -> Self {
        Self::new()
    }
}

impl Managed for Texture {}
