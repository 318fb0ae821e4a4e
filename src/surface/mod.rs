//! Drawing-surface contract produced by the interpreter.
//!
//! The interpreter never rasterizes anything itself; every visible effect is
//! a call on a [`DrawingSurface`]. Two implementations ship with the crate:
//! [`RecordingSurface`], which logs calls for inspection, and (behind the
//! `rendering` feature) a tiny-skia rasterizer in [`crate::rendering`].

mod recording;

pub use recording::{RecordingSurface, SurfaceCall};

use crate::content::graphics_state::{BlendMode, Color, Matrix};
use crate::content::path::{FillRule, PathData};
use crate::geometry::Rect;

/// Whether a paint fills or strokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaintStyle {
    /// Fill the interior
    Fill,
    /// Stroke the outline
    Stroke,
}

/// Line style applied when stroking.
#[derive(Debug, Clone, PartialEq)]
pub struct StrokeStyle {
    /// Line width in user space; 0 means the thinnest visible line
    pub width: f32,
    /// Line cap: 0=butt, 1=round, 2=square
    pub cap: u8,
    /// Line join: 0=miter, 1=round, 2=bevel
    pub join: u8,
    /// Miter limit
    pub miter_limit: f32,
    /// Dash lengths and phase
    pub dash: Option<(Vec<f32>, f32)>,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self {
            width: 1.0,
            cap: 0,
            join: 0,
            miter_limit: 10.0,
            dash: None,
        }
    }
}

/// Everything a surface needs to paint one primitive.
#[derive(Debug, Clone, PartialEq)]
pub struct Paint {
    /// Color with opacity already applied to alpha
    pub color: Color,
    /// Fill or stroke
    pub style: PaintStyle,
    /// Stroke parameters (ignored for fills)
    pub stroke: StrokeStyle,
    /// Compositing mode
    pub blend_mode: BlendMode,
}

impl Default for Paint {
    fn default() -> Self {
        Self {
            color: Color::BLACK,
            style: PaintStyle::Fill,
            stroke: StrokeStyle::default(),
            blend_mode: BlendMode::Normal,
        }
    }
}

/// Pixel layout of a [`Bitmap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitmapFormat {
    /// 4 bytes per pixel, straight (unpremultiplied) RGBA
    Rgba8,
    /// 1 byte per pixel gray level, opaque
    Gray8,
    /// 1 byte per pixel alpha, no color
    Alpha8,
}

impl BitmapFormat {
    /// Bytes per pixel.
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            BitmapFormat::Rgba8 => 4,
            BitmapFormat::Gray8 | BitmapFormat::Alpha8 => 1,
        }
    }
}

/// A decoded raster image.
#[derive(Debug, Clone, PartialEq)]
pub struct Bitmap {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Pixel layout
    pub format: BitmapFormat,
    /// Tightly packed rows, top row first
    pub pixels: Vec<u8>,
}

impl Bitmap {
    /// Zero-sized bitmap, used when an image cannot be decoded.
    pub fn empty() -> Self {
        Self {
            width: 0,
            height: 0,
            format: BitmapFormat::Rgba8,
            pixels: Vec::new(),
        }
    }

    /// True when the bitmap has no pixels.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Convert to straight RGBA, one pixel per 4 bytes.
    pub fn to_rgba(&self) -> Vec<u8> {
        match self.format {
            BitmapFormat::Rgba8 => self.pixels.clone(),
            BitmapFormat::Gray8 => self.pixels.iter().flat_map(|&g| [g, g, g, 255]).collect(),
            BitmapFormat::Alpha8 => self.pixels.iter().flat_map(|&a| [0, 0, 0, a]).collect(),
        }
    }
}

/// Target of every drawing call the interpreter makes.
///
/// Calls follow a canvas model: `save`/`restore` bracket transform and clip
/// changes, `save_layer` opens an offscreen layer that the matching
/// `restore` composites back.
pub trait DrawingSurface {
    /// Push transform, clip and layer state.
    fn save(&mut self);

    /// Pop the last `save` or `save_layer`.
    fn restore(&mut self);

    /// Replace the current transform.
    fn set_transform(&mut self, matrix: &Matrix);

    /// Intersect the clip with a rectangle in current coordinates.
    fn clip_rect(&mut self, rect: &Rect);

    /// Intersect the clip with a path.
    fn clip_path(&mut self, path: &PathData, rule: FillRule);

    /// Fill or stroke a path, per `paint.style`.
    fn draw_path(&mut self, path: &PathData, paint: &Paint);

    /// Draw `bitmap` scaled into `dest`.
    fn draw_image(&mut self, bitmap: &Bitmap, dest: &Rect, paint: &Paint);

    /// Open an offscreen layer, composited with `paint` when given.
    fn save_layer(&mut self, bounds: Option<&Rect>, paint: Option<&Paint>);

    /// Show a run of encoded text at the origin of the current transform.
    fn draw_text(&mut self, text: &[u8], font_size: f32, paint: &Paint);
}
