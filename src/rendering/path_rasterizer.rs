//! Path rasterizer - paints interpreter paths using tiny-skia.

use crate::content::{BlendMode, FillRule, Matrix, PathData, PathSegment};
use crate::surface::{Paint, PaintStyle, StrokeStyle};
use tiny_skia::{LineCap, LineJoin, Mask, Path, PathBuilder, Pixmap, Stroke, Transform};

/// Rasterizer for filled and stroked paths.
#[derive(Debug, Clone, Copy)]
pub struct PathRasterizer {
    anti_alias: bool,
}

impl PathRasterizer {
    /// Create a new path rasterizer.
    pub fn new() -> Self {
        Self { anti_alias: true }
    }

    /// Fill or stroke `path` according to `paint.style`.
    pub fn draw_path(
        &self,
        pixmap: &mut Pixmap,
        path: &PathData,
        transform: Transform,
        paint: &Paint,
        clip: Option<&Mask>,
    ) {
        let Some(skia_path) = to_skia_path(path) else {
            return;
        };
        let skia_paint = self.skia_paint(paint);
        match paint.style {
            PaintStyle::Fill => {
                pixmap.fill_path(&skia_path, &skia_paint, to_skia_fill_rule(path.fill_rule()), transform, clip)
            },
            PaintStyle::Stroke => {
                let stroke = self.skia_stroke(&paint.stroke);
                pixmap.stroke_path(&skia_path, &skia_paint, &stroke, transform, clip);
            },
        }
    }

    /// Solid-color paint with the surface paint's color and blend mode.
    pub fn skia_paint(&self, paint: &Paint) -> tiny_skia::Paint<'static> {
        let c = paint.color;
        let mut skia = tiny_skia::Paint::default();
        skia.set_color(tiny_skia::Color::from_rgba(c.r, c.g, c.b, c.a).unwrap_or(tiny_skia::Color::BLACK));
        skia.anti_alias = self.anti_alias;
        skia.blend_mode = to_skia_blend_mode(paint.blend_mode);
        skia
    }

    fn skia_stroke(&self, style: &StrokeStyle) -> Stroke {
        let dash = style
            .dash
            .as_ref()
            .and_then(|(lengths, phase)| tiny_skia::StrokeDash::new(lengths.clone(), *phase));
        Stroke {
            width: style.width,
            line_cap: self.pdf_line_cap_to_skia(style.cap),
            line_join: self.pdf_line_join_to_skia(style.join),
            miter_limit: style.miter_limit,
            dash,
        }
    }

    /// Convert PDF line cap style to tiny-skia.
    fn pdf_line_cap_to_skia(&self, cap: u8) -> LineCap {
        match cap {
            1 => LineCap::Round,
            2 => LineCap::Square,
            _ => LineCap::Butt,
        }
    }

    /// Convert PDF line join style to tiny-skia.
    fn pdf_line_join_to_skia(&self, join: u8) -> LineJoin {
        match join {
            1 => LineJoin::Round,
            2 => LineJoin::Bevel,
            _ => LineJoin::Miter,
        }
    }
}

impl Default for PathRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Build a tiny-skia path; `None` for paths without area or length.
pub(crate) fn to_skia_path(path: &PathData) -> Option<Path> {
    let mut pb = PathBuilder::new();
    for seg in path.segments() {
        match *seg {
            PathSegment::MoveTo(p) => pb.move_to(p.x, p.y),
            PathSegment::LineTo(p) => pb.line_to(p.x, p.y),
            PathSegment::CurveTo(c1, c2, p) => pb.cubic_to(c1.x, c1.y, c2.x, c2.y, p.x, p.y),
            PathSegment::Close => pb.close(),
        }
    }
    pb.finish()
}

pub(crate) fn to_skia_transform(m: &Matrix) -> Transform {
    Transform::from_row(m.a, m.b, m.c, m.d, m.e, m.f)
}

pub(crate) fn to_skia_fill_rule(rule: FillRule) -> tiny_skia::FillRule {
    match rule {
        FillRule::NonZero => tiny_skia::FillRule::Winding,
        FillRule::EvenOdd => tiny_skia::FillRule::EvenOdd,
    }
}

/// Convert a blend mode to tiny-skia.
pub(crate) fn to_skia_blend_mode(mode: BlendMode) -> tiny_skia::BlendMode {
    match mode {
        BlendMode::Normal => tiny_skia::BlendMode::SourceOver,
        BlendMode::Multiply => tiny_skia::BlendMode::Multiply,
        BlendMode::Screen => tiny_skia::BlendMode::Screen,
        BlendMode::Overlay => tiny_skia::BlendMode::Overlay,
        BlendMode::Darken => tiny_skia::BlendMode::Darken,
        BlendMode::Lighten => tiny_skia::BlendMode::Lighten,
        BlendMode::ColorDodge => tiny_skia::BlendMode::ColorDodge,
        BlendMode::ColorBurn => tiny_skia::BlendMode::ColorBurn,
        BlendMode::HardLight => tiny_skia::BlendMode::HardLight,
        BlendMode::SoftLight => tiny_skia::BlendMode::SoftLight,
        BlendMode::Difference => tiny_skia::BlendMode::Difference,
        BlendMode::Exclusion => tiny_skia::BlendMode::Exclusion,
        BlendMode::Hue => tiny_skia::BlendMode::Hue,
        BlendMode::Saturation => tiny_skia::BlendMode::Saturation,
        BlendMode::Color => tiny_skia::BlendMode::Color,
        BlendMode::Luminosity => tiny_skia::BlendMode::Luminosity,
        BlendMode::SourceOut => tiny_skia::BlendMode::SourceOut,
    }
}
