//! A surface that records every call, for tests and the dry-run CLI mode.

use super::{Bitmap, DrawingSurface, Paint};
use crate::content::graphics_state::{BlendMode, Matrix};
use crate::content::path::{FillRule, PathData};
use crate::geometry::Rect;

/// One recorded surface call.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceCall {
    /// `save()`
    Save,
    /// `restore()`
    Restore,
    /// `set_transform()`
    SetTransform(Matrix),
    /// `clip_rect()`
    ClipRect(Rect),
    /// `clip_path()`
    ClipPath(PathData, FillRule),
    /// `draw_path()`
    DrawPath(PathData, Paint),
    /// `draw_image()`, with the bitmap reduced to its size
    DrawImage {
        /// Bitmap width
        width: u32,
        /// Bitmap height
        height: u32,
        /// Destination rectangle
        dest: Rect,
        /// Compositing mode
        blend_mode: BlendMode,
    },
    /// `save_layer()`
    SaveLayer(Option<Rect>, Option<Paint>),
    /// `draw_text()`
    DrawText(Vec<u8>, f32),
}

/// Records calls in order; never draws.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    calls: Vec<SurfaceCall>,
}

impl RecordingSurface {
    /// Empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls recorded so far.
    pub fn calls(&self) -> &[SurfaceCall] {
        &self.calls
    }

    /// Forget all recorded calls.
    pub fn clear(&mut self) {
        self.calls.clear();
    }

    /// Number of recorded calls matching `pred`.
    pub fn count(&self, pred: impl Fn(&SurfaceCall) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }

    /// Paths drawn, in order.
    pub fn drawn_paths(&self) -> Vec<(&PathData, &Paint)> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                SurfaceCall::DrawPath(path, paint) => Some((path, paint)),
                _ => None,
            })
            .collect()
    }

    /// Sum of `save`/`save_layer` calls minus `restore` calls.
    pub fn save_balance(&self) -> i64 {
        self.calls.iter().fold(0, |acc, c| match c {
            SurfaceCall::Save | SurfaceCall::SaveLayer(..) => acc + 1,
            SurfaceCall::Restore => acc - 1,
            _ => acc,
        })
    }
}

impl DrawingSurface for RecordingSurface {
    fn save(&mut self) {
        self.calls.push(SurfaceCall::Save);
    }

    fn restore(&mut self) {
        self.calls.push(SurfaceCall::Restore);
    }

    fn set_transform(&mut self, matrix: &Matrix) {
        self.calls.push(SurfaceCall::SetTransform(*matrix));
    }

    fn clip_rect(&mut self, rect: &Rect) {
        self.calls.push(SurfaceCall::ClipRect(*rect));
    }

    fn clip_path(&mut self, path: &PathData, rule: FillRule) {
        self.calls.push(SurfaceCall::ClipPath(path.clone(), rule));
    }

    fn draw_path(&mut self, path: &PathData, paint: &Paint) {
        self.calls.push(SurfaceCall::DrawPath(path.clone(), paint.clone()));
    }

    fn draw_image(&mut self, bitmap: &Bitmap, dest: &Rect, paint: &Paint) {
        self.calls.push(SurfaceCall::DrawImage {
            width: bitmap.width,
            height: bitmap.height,
            dest: *dest,
            blend_mode: paint.blend_mode,
        });
    }

    fn save_layer(&mut self, bounds: Option<&Rect>, paint: Option<&Paint>) {
        self.calls
            .push(SurfaceCall::SaveLayer(bounds.copied(), paint.cloned()));
    }

    fn draw_text(&mut self, text: &[u8], font_size: f32, _paint: &Paint) {
        self.calls.push(SurfaceCall::DrawText(text.to_vec(), font_size));
    }
}
