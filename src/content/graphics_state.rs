//! Graphics state machine driven by the content operators.
//!
//! [`GraphicsState`] is a value type: `q` pushes a full copy onto the
//! [`GraphicsStateStack`] and `Q` swaps the copy back in. Resources, fonts,
//! patterns and soft masks are shared handles, so copying a state never
//! duplicates them.

use crate::content::path::PathData;
use crate::error::{Error, Result};
use crate::geometry::{Point, Rect};
use crate::object::{Dictionary, Object};
use crate::surface::{Bitmap, Paint, PaintStyle, StrokeStyle};
use std::sync::Arc;

/// A 2D transformation matrix.
///
/// PDF uses matrices of the form:
/// ```text
/// [ a  b  0 ]
/// [ c  d  0 ]
/// [ e  f  1 ]
/// ```
///
/// Points are row vectors, so `p' = p × M`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    /// Horizontal scaling component
    pub a: f32,
    /// Rotation/skew component
    pub b: f32,
    /// Rotation/skew component
    pub c: f32,
    /// Vertical scaling component
    pub d: f32,
    /// Horizontal translation
    pub e: f32,
    /// Vertical translation
    pub f: f32,
}

impl Matrix {
    /// Create an identity matrix.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_interp::content::Matrix;
    ///
    /// let m = Matrix::identity();
    /// assert_eq!(m.a, 1.0);
    /// assert_eq!(m.d, 1.0);
    /// assert_eq!(m.e, 0.0);
    /// ```
    pub fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)
    }

    /// Create a matrix from its six components.
    pub fn new(a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) -> Self {
        Self { a, b, c, d, e, f }
    }

    /// Create a translation matrix.
    pub fn translation(tx: f32, ty: f32) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    /// Create a scaling matrix.
    pub fn scaling(sx: f32, sy: f32) -> Self {
        Self::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    /// Build from a PDF `[a b c d e f]` array of numbers.
    pub fn from_pdf_array(values: &[f64]) -> Option<Self> {
        match values {
            [a, b, c, d, e, f] => Some(Self::new(
                *a as f32, *b as f32, *c as f32, *d as f32, *e as f32, *f as f32,
            )),
            _ => None,
        }
    }

    /// Product `self × other`: applies `self` first, then `other`.
    pub fn multiply(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    /// Apply `m` before this matrix (`m × self`). This is what `cm` does to the CTM.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_interp::content::Matrix;
    ///
    /// let page = Matrix::scaling(2.0, 2.0);
    /// let ctm = page.pre_concat(&Matrix::translation(10.0, 0.0));
    /// assert_eq!(ctm.transform_point(0.0, 0.0).x, 20.0);
    /// ```
    pub fn pre_concat(&self, m: &Matrix) -> Matrix {
        m.multiply(self)
    }

    /// Apply `m` after this matrix (`self × m`).
    pub fn post_concat(&self, m: &Matrix) -> Matrix {
        self.multiply(m)
    }

    /// Scale in the local space of this matrix.
    pub fn pre_scale(&self, sx: f32, sy: f32) -> Matrix {
        self.pre_concat(&Matrix::scaling(sx, sy))
    }

    /// Translate in the local space of this matrix.
    pub fn pre_translate(&self, tx: f32, ty: f32) -> Matrix {
        self.pre_concat(&Matrix::translation(tx, ty))
    }

    /// Transform a point using this matrix.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_interp::content::Matrix;
    ///
    /// let m = Matrix::translation(10.0, 20.0);
    /// let p = m.transform_point(5.0, 10.0);
    /// assert_eq!((p.x, p.y), (15.0, 30.0));
    /// ```
    pub fn transform_point(&self, x: f32, y: f32) -> Point {
        Point {
            x: self.a * x + self.c * y + self.e,
            y: self.b * x + self.d * y + self.f,
        }
    }

    /// Bounding box of `rect` after transformation.
    pub fn map_rect(&self, rect: &Rect) -> Rect {
        let corners = rect.corners().map(|p| self.transform_point(p.x, p.y));
        Rect::bounding(corners).unwrap_or_default()
    }

    /// Get the determinant of this matrix.
    pub fn determinant(&self) -> f32 {
        self.a * self.d - self.b * self.c
    }

    /// Inverse matrix, or `None` when singular.
    pub fn invert(&self) -> Option<Matrix> {
        let det = self.determinant();
        if det.abs() <= f32::EPSILON {
            return None;
        }
        let inv = 1.0 / det;
        Some(Matrix {
            a: self.d * inv,
            b: -self.b * inv,
            c: -self.c * inv,
            d: self.a * inv,
            e: (self.c * self.f - self.d * self.e) * inv,
            f: (self.b * self.e - self.a * self.f) * inv,
        })
    }

    /// Matrix mapping `src` onto `dst` with the vertical axis flipped, so the
    /// bottom-left corner of `src` lands on the bottom-left of `dst` in a
    /// y-down device space.
    pub fn flip_to(src: &Rect, dst: &Rect) -> Matrix {
        let sx = if src.width != 0.0 { dst.width / src.width } else { 1.0 };
        let sy = if src.height != 0.0 { dst.height / src.height } else { 1.0 };
        Matrix::translation(-src.x, -src.y)
            .post_concat(&Matrix::scaling(sx, -sy))
            .post_concat(&Matrix::translation(dst.x, dst.y + dst.height))
    }

    /// True when all components are within `eps` of `other`'s.
    pub fn approx_eq(&self, other: &Matrix, eps: f32) -> bool {
        [
            self.a - other.a,
            self.b - other.b,
            self.c - other.c,
            self.d - other.d,
            self.e - other.e,
            self.f - other.f,
        ]
        .iter()
        .all(|d| d.abs() <= eps)
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Self::identity()
    }
}

/// RGBA color with components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    /// Red
    pub r: f32,
    /// Green
    pub g: f32,
    /// Blue
    pub b: f32,
    /// Alpha
    pub a: f32,
}

impl Color {
    /// Opaque black, the initial color of both color operators.
    pub const BLACK: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    };

    /// Opaque white.
    pub const WHITE: Color = Color {
        r: 1.0,
        g: 1.0,
        b: 1.0,
        a: 1.0,
    };

    /// Opaque color from clamped RGB components.
    pub fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self {
            r: r.clamp(0.0, 1.0),
            g: g.clamp(0.0, 1.0),
            b: b.clamp(0.0, 1.0),
            a: 1.0,
        }
    }

    /// Opaque gray.
    pub fn gray(level: f32) -> Self {
        Self::rgb(level, level, level)
    }
}

/// Separable and non-separable blend modes, plus the internal compositing
/// mode used to apply image soft masks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlendMode {
    /// Normal (source over)
    #[default]
    Normal,
    /// Multiply
    Multiply,
    /// Screen
    Screen,
    /// Overlay
    Overlay,
    /// Darken
    Darken,
    /// Lighten
    Lighten,
    /// ColorDodge
    ColorDodge,
    /// ColorBurn
    ColorBurn,
    /// HardLight
    HardLight,
    /// SoftLight
    SoftLight,
    /// Difference
    Difference,
    /// Exclusion
    Exclusion,
    /// Hue
    Hue,
    /// Saturation
    Saturation,
    /// Color
    Color,
    /// Luminosity
    Luminosity,
    /// Keeps destination only where the source is transparent. Never produced by `BM`.
    SourceOut,
}

impl BlendMode {
    /// Parse a `/BM` name. `Compatible` is an alias of `Normal`.
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "Normal" | "Compatible" => BlendMode::Normal,
            "Multiply" => BlendMode::Multiply,
            "Screen" => BlendMode::Screen,
            "Overlay" => BlendMode::Overlay,
            "Darken" => BlendMode::Darken,
            "Lighten" => BlendMode::Lighten,
            "ColorDodge" => BlendMode::ColorDodge,
            "ColorBurn" => BlendMode::ColorBurn,
            "HardLight" => BlendMode::HardLight,
            "SoftLight" => BlendMode::SoftLight,
            "Difference" => BlendMode::Difference,
            "Exclusion" => BlendMode::Exclusion,
            "Hue" => BlendMode::Hue,
            "Saturation" => BlendMode::Saturation,
            "Color" => BlendMode::Color,
            "Luminosity" => BlendMode::Luminosity,
            _ => return None,
        })
    }
}

/// Maximum length of the dash array and blend-mode list.
pub const MAX_SEQUENCE_LEN: usize = 256;

/// A sequence that refuses to grow past [`MAX_SEQUENCE_LEN`] entries.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundedSeq<T> {
    items: Vec<T>,
}

impl<T> BoundedSeq<T> {
    /// Empty sequence.
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Take ownership of `items`, failing if there are too many.
    pub fn from_vec(items: Vec<T>) -> Result<Self> {
        if items.len() > MAX_SEQUENCE_LEN {
            return Err(Error::CapacityExceeded {
                capacity: MAX_SEQUENCE_LEN,
            });
        }
        Ok(Self { items })
    }

    /// Append one entry.
    pub fn push(&mut self, item: T) -> Result<()> {
        if self.items.len() >= MAX_SEQUENCE_LEN {
            return Err(Error::CapacityExceeded {
                capacity: MAX_SEQUENCE_LEN,
            });
        }
        self.items.push(item);
        Ok(())
    }

    /// Entries as a slice.
    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// First entry.
    pub fn first(&self) -> Option<&T> {
        self.items.first()
    }
}

impl<T> Default for BoundedSeq<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Color state for one side of painting (stroking or non-stroking).
#[derive(Debug, Clone, PartialEq)]
pub struct ColorOperator {
    /// Current color space name (`DeviceRGB`, `Pattern`, ...)
    pub color_space: String,
    /// Resolved color
    pub color: Color,
    /// Constant opacity (`CA` / `ca`)
    pub opacity: f32,
    /// Pattern object, present only once a pattern has been selected
    pub pattern: Option<Object>,
}

impl Default for ColorOperator {
    fn default() -> Self {
        Self {
            color_space: "DeviceRGB".to_string(),
            color: Color::BLACK,
            opacity: 1.0,
            pattern: None,
        }
    }
}

impl ColorOperator {
    /// Switch color space. A new space drops any previously selected pattern.
    pub fn set_color_space(&mut self, name: &str) {
        self.color_space = name.to_string();
        self.pattern = None;
    }

    /// Set a concrete color.
    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    /// Select a pattern object as the paint source.
    pub fn set_pattern(&mut self, pattern: Object) {
        self.pattern = Some(pattern);
    }

    /// True when painting should go through the tiling path.
    pub fn uses_pattern(&self) -> bool {
        self.color_space.starts_with("Pattern") && self.pattern.is_some()
    }

    /// Color with opacity folded into alpha.
    pub fn effective_color(&self) -> Color {
        Color {
            a: (self.color.a * self.opacity).clamp(0.0, 1.0),
            ..self.color
        }
    }
}

/// Current soft mask.
#[derive(Debug, Clone, PartialEq)]
pub enum SoftMask {
    /// A soft-mask dictionary (`/S /Alpha` or `/S /Luminosity`)
    Dictionary(Object),
    /// A decoded image used as an alpha mask
    Image(Arc<Bitmap>),
}

/// Text sub-state.
#[derive(Debug, Clone, PartialEq)]
pub struct TextState {
    /// Text matrix (`Tm`, advanced by text showing)
    pub text_matrix: Matrix,
    /// Text line matrix (start of the current line)
    pub line_matrix: Matrix,
    /// Current font dictionary (shared)
    pub font: Option<Object>,
    /// Current font size
    pub font_size: f32,
    /// Character spacing (`Tc`)
    pub char_spacing: f32,
    /// Word spacing (`Tw`)
    pub word_spacing: f32,
    /// Leading (`TL`)
    pub leading: f32,
    /// Inside `BT` ... `ET`
    pub in_text_block: bool,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            text_matrix: Matrix::identity(),
            line_matrix: Matrix::identity(),
            font: None,
            font_size: 0.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            leading: 0.0,
            in_text_block: false,
        }
    }
}

/// Graphics state parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphicsState {
    /// Current transformation matrix (maps user space to device space)
    pub ctm: Matrix,
    /// Basis for pattern cells; moves independently of `ctm` while tiling
    pub content_stream_matrix: Matrix,

    /// Path under construction
    pub path: PathData,
    /// The next construction operator starts a fresh path
    pub path_closed: bool,
    /// Last point reached by path construction
    pub current_point: Point,

    /// A `W`/`W*` clip is waiting for the next painting operator
    pub clip_path_pending: bool,
    /// Clip captured by `W`/`W*`
    pub clip_path: PathData,

    /// Stroking color
    pub stroking: ColorOperator,
    /// Non-stroking (fill) color
    pub non_stroking: ColorOperator,

    /// Line width (`w`)
    pub line_width: f32,
    /// Line cap style (`J`): 0=butt, 1=round, 2=projecting square
    pub line_cap: u8,
    /// Line join style (`j`): 0=miter, 1=round, 2=bevel
    pub line_join: u8,
    /// Miter limit (`M`)
    pub miter_limit: f32,
    /// Dash lengths; empty means solid
    pub dash_array: BoundedSeq<f32>,
    /// Dash phase
    pub dash_phase: f32,

    /// Blend modes from `/BM`; only the first is applied when painting
    pub blend_modes: BoundedSeq<BlendMode>,
    /// Soft mask from `/SMask`
    pub soft_mask: Option<SoftMask>,
    /// Constant alpha last set for non-stroking operations (`ca`)
    pub alpha_constant: f32,
    /// Alpha source flag (`AIS`)
    pub alpha_source: bool,

    /// Text sub-state
    pub text: TextState,

    /// Current resource dictionary (shared with the document and other states)
    pub resources: Arc<Dictionary>,
}

impl GraphicsState {
    /// Fresh state with identity transforms and an empty resource dictionary.
    pub fn new() -> Self {
        let mut blend_modes = BoundedSeq::new();
        blend_modes.items.push(BlendMode::Normal);
        Self {
            ctm: Matrix::identity(),
            content_stream_matrix: Matrix::identity(),
            path: PathData::new(),
            path_closed: true,
            current_point: Point::default(),
            clip_path_pending: false,
            clip_path: PathData::new(),
            stroking: ColorOperator::default(),
            non_stroking: ColorOperator::default(),
            line_width: 1.0,
            line_cap: 0,
            line_join: 0,
            miter_limit: 10.0,
            dash_array: BoundedSeq::new(),
            dash_phase: 0.0,
            blend_modes,
            soft_mask: None,
            alpha_constant: 1.0,
            alpha_source: false,
            text: TextState::default(),
            resources: Arc::new(Dictionary::new()),
        }
    }

    /// Paint for a stroke (`stroking == true`) or fill.
    ///
    /// Only the first blend mode is honored.
    pub fn paint(&self, stroking: bool) -> Paint {
        let op = if stroking {
            &self.stroking
        } else {
            &self.non_stroking
        };
        let dash = if self.dash_array.is_empty() {
            None
        } else {
            Some((self.dash_array.as_slice().to_vec(), self.dash_phase))
        };
        Paint {
            color: op.effective_color(),
            style: if stroking {
                PaintStyle::Stroke
            } else {
                PaintStyle::Fill
            },
            stroke: StrokeStyle {
                width: self.line_width,
                cap: self.line_cap,
                join: self.line_join,
                miter_limit: self.miter_limit,
                dash,
            },
            blend_mode: self.blend_modes.first().copied().unwrap_or_default(),
        }
    }

    /// Resource entry `category/name`, unresolved.
    pub fn resource(&self, category: &str, name: &str) -> Option<&Object> {
        self.resources.get(category)?.as_dict()?.get(name)
    }
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self::new()
    }
}

/// The current graphics state plus the states saved by `q`.
#[derive(Debug, Clone, Default)]
pub struct GraphicsStateStack {
    current: GraphicsState,
    saved: Vec<GraphicsState>,
}

impl GraphicsStateStack {
    /// Stack whose current state is `initial` and nothing saved.
    pub fn new(initial: GraphicsState) -> Self {
        Self {
            current: initial,
            saved: Vec::new(),
        }
    }

    /// Current graphics state.
    pub fn current(&self) -> &GraphicsState {
        &self.current
    }

    /// Mutable access to the current graphics state.
    pub fn current_mut(&mut self) -> &mut GraphicsState {
        &mut self.current
    }

    /// Push a copy of the current state (`q`).
    pub fn save(&mut self) {
        self.saved.push(self.current.clone());
    }

    /// Pop the last saved state into place (`Q`).
    ///
    /// Fails with [`Error::Unbalanced`] and leaves the current state untouched
    /// when nothing is saved.
    pub fn restore(&mut self) -> Result<()> {
        let state = self.saved.pop().ok_or(Error::Unbalanced)?;
        self.current = state;
        Ok(())
    }

    /// Number of saved states.
    pub fn depth(&self) -> usize {
        self.saved.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matrix_pre_concat_applies_argument_first() {
        let ctm = Matrix::scaling(2.0, 2.0).pre_concat(&Matrix::translation(10.0, 10.0));
        let p = ctm.transform_point(0.0, 0.0);
        assert_eq!((p.x, p.y), (20.0, 20.0));
    }

    #[test]
    fn test_matrix_post_concat_applies_argument_last() {
        let m = Matrix::scaling(2.0, 2.0).post_concat(&Matrix::translation(10.0, 10.0));
        let p = m.transform_point(1.0, 1.0);
        assert_eq!((p.x, p.y), (12.0, 12.0));
    }

    #[test]
    fn test_pre_translate_roundtrip_is_identity() {
        let m = Matrix::new(2.0, 0.0, 0.0, 3.0, 5.0, 7.0);
        let back = m.pre_translate(10.0, 0.0).pre_translate(-10.0, 0.0);
        assert!(back.approx_eq(&m, 1e-4));
    }

    #[test]
    fn test_matrix_invert() {
        let m = Matrix::new(2.0, 0.0, 0.0, 4.0, 10.0, 20.0);
        let inv = m.invert().unwrap();
        assert!(m.multiply(&inv).approx_eq(&Matrix::identity(), 1e-5));
        assert!(Matrix::scaling(0.0, 1.0).invert().is_none());
    }

    #[test]
    fn test_flip_to_maps_origin_to_bottom_left() {
        let media = Rect::new(0.0, 0.0, 612.0, 792.0);
        let dst = Rect::new(0.0, 0.0, 306.0, 396.0);
        let m = Matrix::flip_to(&media, &dst);
        let origin = m.transform_point(0.0, 0.0);
        assert_eq!((origin.x, origin.y), (0.0, 396.0));
        let top_right = m.transform_point(612.0, 792.0);
        assert_eq!((top_right.x, top_right.y), (306.0, 0.0));
    }

    #[test]
    fn test_bounded_seq_capacity() {
        let mut seq = BoundedSeq::from_vec(vec![0.0f32; MAX_SEQUENCE_LEN]).unwrap();
        assert!(matches!(seq.push(1.0), Err(Error::CapacityExceeded { capacity: 256 })));
        assert!(BoundedSeq::from_vec(vec![0u8; MAX_SEQUENCE_LEN + 1]).is_err());
    }

    #[test]
    fn test_blend_mode_names() {
        assert_eq!(BlendMode::from_name("Multiply"), Some(BlendMode::Multiply));
        assert_eq!(BlendMode::from_name("Compatible"), Some(BlendMode::Normal));
        assert_eq!(BlendMode::from_name("SourceOut"), None);
    }

    #[test]
    fn test_paint_uses_first_blend_mode_and_opacity() {
        let mut gs = GraphicsState::new();
        gs.blend_modes =
            BoundedSeq::from_vec(vec![BlendMode::Screen, BlendMode::Multiply]).unwrap();
        gs.non_stroking.opacity = 0.5;
        let paint = gs.paint(false);
        assert_eq!(paint.blend_mode, BlendMode::Screen);
        assert_eq!(paint.color.a, 0.5);
        assert_eq!(paint.style, PaintStyle::Fill);
    }

    #[test]
    fn test_stack_restore_unbalanced_keeps_state() {
        let mut stack = GraphicsStateStack::new(GraphicsState::new());
        stack.current_mut().line_width = 4.0;
        assert!(matches!(stack.restore(), Err(Error::Unbalanced)));
        assert_eq!(stack.current().line_width, 4.0);
    }

    #[test]
    fn test_stack_save_restore() {
        let mut stack = GraphicsStateStack::default();
        stack.save();
        stack.current_mut().ctm = Matrix::translation(5.0, 5.0);
        stack.restore().unwrap();
        assert_eq!(stack.current().ctm, Matrix::identity());
        assert_eq!(stack.depth(), 0);
    }

    #[test]
    fn test_pattern_flag_requires_space_and_object() {
        let mut op = ColorOperator::default();
        op.set_color_space("Pattern");
        assert!(!op.uses_pattern());
        op.set_pattern(Object::Null);
        assert!(op.uses_pattern());
        op.set_color_space("DeviceRGB");
        assert!(!op.uses_pattern());
    }
}
