//! [`DrawingSurface`] backed by a tiny-skia pixmap.

use super::path_rasterizer::{to_skia_blend_mode, to_skia_fill_rule, to_skia_path, to_skia_transform, PathRasterizer};
use crate::content::{Color, FillRule, Matrix, PathData};
use crate::error::{Error, Result};
use crate::geometry::Rect;
use crate::surface::{Bitmap, DrawingSurface, Paint};
use tiny_skia::{
    ColorU8, FilterQuality, Mask, Pattern, Pixmap, PixmapPaint, SpreadMode, Transform,
};

#[derive(Clone)]
struct CanvasState {
    transform: Transform,
    clip: Option<Mask>,
}

/// Offscreen layer opened by `save_layer`.
struct Layer {
    pixmap: Pixmap,
    opacity: f32,
    blend_mode: tiny_skia::BlendMode,
}

/// Saved canvas state; `opened_layer` is set when the save came from `save_layer`.
struct Saved {
    state: CanvasState,
    opened_layer: bool,
}

/// Rasterizing surface.
///
/// Text runs are not rasterized.
pub struct SkiaSurface {
    base: Pixmap,
    /// Layers above `base`, innermost last
    layers: Vec<Layer>,
    state: CanvasState,
    saved: Vec<Saved>,
    rasterizer: PathRasterizer,
}

impl SkiaSurface {
    /// A `width` x `height` surface cleared to `background`.
    pub fn new(width: u32, height: u32, background: Color) -> Result<Self> {
        let mut base = Pixmap::new(width, height)
            .ok_or_else(|| Error::Image(format!("Failed to create pixmap {}x{}", width, height)))?;
        base.fill(
            tiny_skia::Color::from_rgba(background.r, background.g, background.b, background.a)
                .unwrap_or(tiny_skia::Color::WHITE),
        );
        Ok(Self {
            base,
            layers: Vec::new(),
            state: CanvasState {
                transform: Transform::identity(),
                clip: None,
            },
            saved: Vec::new(),
            rasterizer: PathRasterizer::new(),
        })
    }

    /// Pixel width.
    pub fn width(&self) -> u32 {
        self.base.width()
    }

    /// Pixel height.
    pub fn height(&self) -> u32 {
        self.base.height()
    }

    /// Rendered pixels. Open layers are not included.
    pub fn pixmap(&self) -> &Pixmap {
        &self.base
    }

    /// Encode the rendered page as PNG.
    pub fn encode_png(&self) -> Result<Vec<u8>> {
        if !self.saved.is_empty() {
            log::warn!("Encoding with {} unrestored saves", self.saved.len());
        }
        self.base
            .encode_png()
            .map_err(|e| Error::Image(format!("PNG encoding failed: {}", e)))
    }

    fn target(&mut self) -> &mut Pixmap {
        match self.layers.last_mut() {
            Some(layer) => &mut layer.pixmap,
            None => &mut self.base,
        }
    }

    fn intersect_clip(&mut self, path: &tiny_skia::Path, rule: tiny_skia::FillRule) {
        let transform = self.state.transform;
        if let Some(mask) = self.state.clip.as_mut() {
            mask.intersect_path(path, rule, true, transform);
            return;
        }
        let Some(mut mask) = Mask::new(self.base.width(), self.base.height()) else {
            return;
        };
        mask.fill_path(path, rule, true, transform);
        self.state.clip = Some(mask);
    }
}

/// Premultiplied pixmap holding `bitmap`.
fn bitmap_to_pixmap(bitmap: &Bitmap) -> Option<Pixmap> {
    let mut pixmap = Pixmap::new(bitmap.width, bitmap.height)?;
    let rgba = bitmap.to_rgba();
    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(rgba.chunks_exact(4)) {
        *dst = ColorU8::from_rgba(src[0], src[1], src[2], src[3]).premultiply();
    }
    Some(pixmap)
}

impl DrawingSurface for SkiaSurface {
    fn save(&mut self) {
        self.saved.push(Saved {
            state: self.state.clone(),
            opened_layer: false,
        });
    }

    fn restore(&mut self) {
        let Some(saved) = self.saved.pop() else {
            log::warn!("restore without save");
            return;
        };
        if saved.opened_layer {
            if let Some(layer) = self.layers.pop() {
                let paint = PixmapPaint {
                    opacity: layer.opacity,
                    blend_mode: layer.blend_mode,
                    quality: FilterQuality::Nearest,
                };
                let clip = saved.state.clip.clone();
                self.target()
                    .draw_pixmap(0, 0, layer.pixmap.as_ref(), &paint, Transform::identity(), clip.as_ref());
            }
        }
        self.state = saved.state;
    }

    fn set_transform(&mut self, matrix: &Matrix) {
        self.state.transform = to_skia_transform(matrix);
    }

    fn clip_rect(&mut self, rect: &Rect) {
        let Some(r) = tiny_skia::Rect::from_xywh(rect.x, rect.y, rect.width, rect.height) else {
            return;
        };
        let path = tiny_skia::PathBuilder::from_rect(r);
        self.intersect_clip(&path, tiny_skia::FillRule::Winding);
    }

    fn clip_path(&mut self, path: &PathData, rule: FillRule) {
        if let Some(p) = to_skia_path(path) {
            self.intersect_clip(&p, to_skia_fill_rule(rule));
        }
    }

    fn draw_path(&mut self, path: &PathData, paint: &Paint) {
        let transform = self.state.transform;
        let clip = self.state.clip.clone();
        let rasterizer = self.rasterizer;
        rasterizer.draw_path(self.target(), path, transform, paint, clip.as_ref());
    }

    fn draw_image(&mut self, bitmap: &Bitmap, dest: &Rect, paint: &Paint) {
        if bitmap.is_empty() {
            return;
        }
        let Some(image) = bitmap_to_pixmap(bitmap) else {
            return;
        };
        let Some(rect) = tiny_skia::Rect::from_xywh(dest.x, dest.y, dest.width, dest.height) else {
            return;
        };
        let to_dest = Transform::from_row(
            dest.width / bitmap.width as f32,
            0.0,
            0.0,
            dest.height / bitmap.height as f32,
            dest.x,
            dest.y,
        );
        let shader = Pattern::new(
            image.as_ref(),
            SpreadMode::Pad,
            FilterQuality::Bilinear,
            paint.color.a,
            to_dest,
        );
        let skia_paint = tiny_skia::Paint {
            shader,
            blend_mode: to_skia_blend_mode(paint.blend_mode),
            anti_alias: true,
            ..Default::default()
        };
        let transform = self.state.transform;
        let clip = self.state.clip.clone();
        self.target().fill_rect(rect, &skia_paint, transform, clip.as_ref());
    }

    fn save_layer(&mut self, _bounds: Option<&Rect>, paint: Option<&Paint>) {
        let Some(pixmap) = Pixmap::new(self.base.width(), self.base.height()) else {
            self.save();
            return;
        };
        let (opacity, blend_mode) = match paint {
            Some(p) => (p.color.a, to_skia_blend_mode(p.blend_mode)),
            None => (1.0, tiny_skia::BlendMode::SourceOver),
        };
        self.layers.push(Layer {
            pixmap,
            opacity,
            blend_mode,
        });
        self.saved.push(Saved {
            state: self.state.clone(),
            opened_layer: true,
        });
    }

    fn draw_text(&mut self, text: &[u8], font_size: f32, _paint: &Paint) {
        log::trace!("Text run of {} bytes at size {} not rasterized", text.len(), font_size);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{BitmapFormat, PaintStyle};

    fn square(size: f32) -> PathData {
        let mut path = PathData::new();
        path.add_rect(Rect::new(0.0, 0.0, size, size));
        path
    }

    fn red() -> Paint {
        Paint {
            color: Color::rgb(1.0, 0.0, 0.0),
            ..Paint::default()
        }
    }

    #[test]
    fn test_background_fill() {
        let surface = SkiaSurface::new(2, 2, Color::WHITE).unwrap();
        let px = surface.pixmap().pixel(0, 0).unwrap();
        assert_eq!((px.red(), px.green(), px.blue(), px.alpha()), (255, 255, 255, 255));
    }

    #[test]
    fn test_draw_path_with_transform() {
        let mut surface = SkiaSurface::new(8, 8, Color::WHITE).unwrap();
        surface.set_transform(&Matrix::new(1.0, 0.0, 0.0, 1.0, 4.0, 4.0));
        surface.draw_path(&square(4.0), &red());
        let inside = surface.pixmap().pixel(5, 5).unwrap();
        let outside = surface.pixmap().pixel(1, 1).unwrap();
        assert_eq!(inside.green(), 0);
        assert_eq!(outside.green(), 255);
    }

    #[test]
    fn test_clip_is_restored() {
        let mut surface = SkiaSurface::new(8, 8, Color::WHITE).unwrap();
        surface.save();
        surface.clip_rect(&Rect::new(0.0, 0.0, 2.0, 2.0));
        surface.draw_path(&square(8.0), &red());
        surface.restore();
        assert_eq!(surface.pixmap().pixel(1, 1).unwrap().green(), 0);
        assert_eq!(surface.pixmap().pixel(5, 5).unwrap().green(), 255);

        surface.draw_path(&square(8.0), &red());
        assert_eq!(surface.pixmap().pixel(5, 5).unwrap().green(), 0);
    }

    #[test]
    fn test_layer_composited_on_restore() {
        let mut surface = SkiaSurface::new(4, 4, Color::WHITE).unwrap();
        surface.save_layer(None, None);
        surface.draw_path(&square(4.0), &red());
        assert_eq!(surface.pixmap().pixel(1, 1).unwrap().green(), 255);
        surface.restore();
        assert_eq!(surface.pixmap().pixel(1, 1).unwrap().green(), 0);
    }

    #[test]
    fn test_unbalanced_restore_ignored() {
        let mut surface = SkiaSurface::new(2, 2, Color::WHITE).unwrap();
        surface.restore();
        assert_eq!(surface.width(), 2);
    }

    #[test]
    fn test_draw_image_fills_dest() {
        let mut surface = SkiaSurface::new(4, 4, Color::WHITE).unwrap();
        let bitmap = Bitmap {
            width: 1,
            height: 1,
            format: BitmapFormat::Rgba8,
            pixels: vec![0, 0, 255, 255],
        };
        surface.draw_image(&bitmap, &Rect::new(0.0, 0.0, 4.0, 4.0), &Paint::default());
        let px = surface.pixmap().pixel(2, 2).unwrap();
        assert_eq!((px.red(), px.blue()), (0, 255));
    }

    #[test]
    fn test_stroke_and_png() {
        let mut surface = SkiaSurface::new(4, 4, Color::WHITE).unwrap();
        let paint = Paint {
            style: PaintStyle::Stroke,
            ..red()
        };
        surface.draw_path(&square(3.0), &paint);
        surface.draw_text(b"abc", 12.0, &paint);
        let png = surface.encode_png().unwrap();
        assert_eq!(&png[1..4], b"PNG");
    }
}
