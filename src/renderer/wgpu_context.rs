//! wgpu-backed [`GraphicsContext`].
//!
//! Owns one `wgpu::Texture` (plus view and sampler) per handed-out
//! [`GpuTextureHandle`]. Every state-mutating call runs inside a validation
//! error scope; a reported error becomes [`EngineError::Gpu`] tagged with the
//! call site.

use rustc_hash::FxHashMap;

use crate::errors::{EngineError, Result};
use crate::renderer::upload::{GpuTextureHandle, GraphicsContext, TextureImage, UploadOptions};

/// GPU objects behind one handle.
#[derive(Debug)]
pub struct WgpuTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
    pub width: u32,
    pub height: u32,
    pub format: wgpu::TextureFormat,
}

pub struct WgpuContext {
    device: wgpu::Device,
    queue: wgpu::Queue,
    textures: FxHashMap<GpuTextureHandle, WgpuTexture>,
    next_handle: u64,
}

impl WgpuContext {
    #[must_use]
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        Self {
            device,
            queue,
            textures: FxHashMap::default(),
            next_handle: 1,
        }
    }

    #[must_use]
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    #[must_use]
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    #[must_use]
    pub fn texture(&self, handle: GpuTextureHandle) -> Option<&WgpuTexture> {
        self.textures.get(&handle)
    }

    fn checked<R>(&self, site: &'static str, f: impl FnOnce(&Self) -> R) -> Result<R> {
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let value = f(self);
        if let Some(error) = pollster::block_on(self.device.pop_error_scope()) {
            let err = EngineError::Gpu {
                site,
                message: error.to_string(),
            };
            log::error!("{err}");
            return Err(err);
        }
        Ok(value)
    }

    fn create(&self, image: &TextureImage<'_>, options: &UploadOptions) -> Result<WgpuTexture> {
        let format = texture_format(image.bpp)?;
        let mip_level_count = if options.generate_mipmaps {
            mip_count(image.width, image.height)
        } else {
            1
        };

        self.checked("WgpuContext::create_texture", |ctx| {
            let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
                label: Some("Lantern Texture"),
                size: wgpu::Extent3d {
                    width: image.width,
                    height: image.height,
                    depth_or_array_layers: 1,
                },
                mip_level_count,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            });

            let address_mode = if options.repeat {
                wgpu::AddressMode::Repeat
            } else {
                wgpu::AddressMode::ClampToEdge
            };
            let filter = if options.linear {
                wgpu::FilterMode::Linear
            } else {
                wgpu::FilterMode::Nearest
            };
            let sampler = ctx.device.create_sampler(&wgpu::SamplerDescriptor {
                label: Some("Lantern Sampler"),
                address_mode_u: address_mode,
                address_mode_v: address_mode,
                address_mode_w: address_mode,
                mag_filter: filter,
                min_filter: filter,
                mipmap_filter: filter,
                ..Default::default()
            });

            WgpuTexture {
                view: texture.create_view(&wgpu::TextureViewDescriptor::default()),
                texture,
                sampler,
                width: image.width,
                height: image.height,
                format,
            }
        })
    }

    fn write(&self, target: &WgpuTexture, image: &TextureImage<'_>) -> Result<()> {
        let mut level = expand_rgb(image);
        let channels = gpu_channels(image.bpp);
        let (mut width, mut height) = (image.width, image.height);

        self.checked("WgpuContext::write_texture", |ctx| {
            for mip_level in 0..target.texture.mip_level_count() {
                ctx.queue.write_texture(
                    wgpu::TexelCopyTextureInfo {
                        texture: &target.texture,
                        mip_level,
                        origin: wgpu::Origin3d::ZERO,
                        aspect: wgpu::TextureAspect::All,
                    },
                    &level,
                    wgpu::TexelCopyBufferLayout {
                        offset: 0,
                        bytes_per_row: Some(width * channels),
                        rows_per_image: Some(height),
                    },
                    wgpu::Extent3d {
                        width,
                        height,
                        depth_or_array_layers: 1,
                    },
                );

                (level, width, height) = downsample(&level, width, height, channels);
            }
        })
    }
}

impl GraphicsContext for WgpuContext {
    fn upload_texture(
        &mut self,
        existing: Option<GpuTextureHandle>,
        image: &TextureImage<'_>,
        options: &UploadOptions,
    ) -> Result<GpuTextureHandle> {
        if image.data.len() != image.expected_len() {
            return Err(EngineError::Gpu {
                site: "WgpuContext::upload_texture",
                message: format!(
                    "expected {} bytes, got {}",
                    image.expected_len(),
                    image.data.len()
                ),
            });
        }

        // Same size and format: refill in place. Anything else: recreate.
        let reusable = existing.filter(|handle| {
            self.textures.get(handle).is_some_and(|t| {
                t.width == image.width
                    && t.height == image.height
                    && texture_format(image.bpp).is_ok_and(|f| f == t.format)
            })
        });

        let handle = match reusable {
            Some(handle) => handle,
            None => {
                if let Some(old) = existing {
                    self.release_texture(old);
                }
                let created = self.create(image, options)?;
                let handle = existing.unwrap_or_else(|| {
                    let handle = GpuTextureHandle::new(self.next_handle);
                    self.next_handle += 1;
                    handle
                });
                self.textures.insert(handle, created);
                handle
            }
        };

        if let Some(target) = self.textures.get(&handle) {
            self.write(target, image)?;
        }
        Ok(handle)
    }

    fn release_texture(&mut self, handle: GpuTextureHandle) {
        if let Some(texture) = self.textures.remove(&handle) {
            texture.texture.destroy();
        }
    }
}

impl std::fmt::Debug for WgpuContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WgpuContext")
            .field("textures", &self.textures.len())
            .finish_non_exhaustive()
    }
}

fn texture_format(bpp: u32) -> Result<wgpu::TextureFormat> {
    match bpp {
        8 => Ok(wgpu::TextureFormat::R8Unorm),
        16 => Ok(wgpu::TextureFormat::Rg8Unorm),
        // wgpu has no 3-channel 8-bit format; RGB is padded to RGBA
        24 | 32 => Ok(wgpu::TextureFormat::Rgba8Unorm),
        other => Err(EngineError::Gpu {
            site: "WgpuContext::texture_format",
            message: format!("unsupported bpp {other}"),
        }),
    }
}

fn gpu_channels(bpp: u32) -> u32 {
    match bpp {
        8 => 1,
        16 => 2,
        _ => 4,
    }
}

fn mip_count(width: u32, height: u32) -> u32 {
    32 - width.max(height).max(1).leading_zeros()
}

fn expand_rgb(image: &TextureImage<'_>) -> Vec<u8> {
    if image.bpp != 24 {
        return image.data.to_vec();
    }
    image
        .data
        .chunks_exact(3)
        .flat_map(|rgb| [rgb[0], rgb[1], rgb[2], 255])
        .collect()
}

/// 2x2 box filter. Odd edges reuse the last row/column.
fn downsample(src: &[u8], width: u32, height: u32, channels: u32) -> (Vec<u8>, u32, u32) {
    let new_w = (width / 2).max(1);
    let new_h = (height / 2).max(1);
    let c = channels as usize;
    let mut out = Vec::with_capacity(new_w as usize * new_h as usize * c);

    let texel = |x: u32, y: u32, ch: usize| -> u32 {
        let x = x.min(width - 1) as usize;
        let y = y.min(height - 1) as usize;
        u32::from(src[(y * width as usize + x) * c + ch])
    };

    for y in 0..new_h {
        for x in 0..new_w {
            for ch in 0..c {
                let sum = texel(2 * x, 2 * y, ch)
                    + texel(2 * x + 1, 2 * y, ch)
                    + texel(2 * x, 2 * y + 1, ch)
                    + texel(2 * x + 1, 2 * y + 1, ch);
                out.push((sum / 4) as u8);
            }
        }
    }
    (out, new_w, new_h)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mip_chain_length() {
        assert_eq!(mip_count(1, 1), 1);
        assert_eq!(mip_count(256, 64), 9);
        assert_eq!(mip_count(300, 2), 9);
    }

    #[test]
    fn downsample_averages_quads() {
        let src = [0, 4, 8, 12];
        let (out, w, h) = downsample(&src, 2, 2, 1);
        assert_eq!((w, h), (1, 1));
        assert_eq!(out, vec![6]);
    }
}
