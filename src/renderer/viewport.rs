use glam::{Vec2, Vec4};

use crate::core::Managed;

/// Screen layout presets for [`Viewport::from_type`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ViewportType {
    #[default]
    Full,
    /// 4:3 pillarbox: blank bars left and right.
    BlankLeftRight,
    HorizontalSplitLeft,
    HorizontalSplitRight,
    VerticalSplitTop,
    VerticalSplitBottom,
    /// Normalized `(x, y, width, height)`.
    Custom { x: f32, y: f32, width: f32, height: f32 },
}

/// Pixel rectangle inside a render target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Normalized sub-rectangle of a render target, origin bottom-left.
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    pub offset: Vec2,
    pub size: Vec2,
    pub background: Vec4,
    pub clear: bool,
}

impl Viewport {
    #[must_use]
    pub fn from_type(kind: ViewportType) -> Self {
        let (x, y, width, height) = match kind {
            ViewportType::Full => (0.0, 0.0, 1.0, 1.0),
            ViewportType::BlankLeftRight => (0.125, 0.0, 0.75, 1.0),
            ViewportType::HorizontalSplitLeft => (0.0, 0.0, 0.5, 1.0),
            ViewportType::HorizontalSplitRight => (0.5, 0.0, 0.5, 1.0),
            ViewportType::VerticalSplitTop => (0.0, 0.5, 1.0, 0.5),
            ViewportType::VerticalSplitBottom => (0.0, 0.0, 1.0, 0.5),
            ViewportType::Custom {
                x,
                y,
                width,
                height,
            } => (x, y, width, height),
        };

        Self {
            offset: Vec2::new(x, y).clamp(Vec2::ZERO, Vec2::ONE),
            size: Vec2::new(width, height).clamp(Vec2::ZERO, Vec2::ONE),
            background: Vec4::new(0.0, 0.0, 0.0, 1.0),
            clear: true,
        }
    }

    #[must_use]
    pub fn pixel_rect(&self, target_width: u32, target_height: u32) -> PixelRect {
        let w = target_width as f32;
        let h = target_height as f32;
        PixelRect {
            x: (self.offset.x * w).round() as u32,
            y: (self.offset.y * h).round() as u32,
            width: (self.size.x * w).round() as u32,
            height: (self.size.y * h).round() as u32,
        }
    }

    #[must_use]
    pub fn aspect(&self, target_width: u32, target_height: u32) -> f32 {
        let rect = self.pixel_rect(target_width, target_height);
        if rect.height == 0 {
            1.0
        } else {
            rect.width as f32 / rect.height as f32
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::from_type(ViewportType::Full)
    }
}

impl Managed for Viewport {}
