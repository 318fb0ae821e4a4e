//! Execution of embedded content: form XObjects, tiling patterns and images.
//!
//! Every invocation runs under the session's recursion guard, keyed by the
//! identity of the invoked dictionary, so a form that draws itself (directly
//! or through a chain of forms) is rejected instead of recursing forever.

use super::session::{identity, number_array};
use super::{PdfResult, RenderSession};
use crate::content::{BlendMode, ColorOperator, Matrix, SoftMask};
use crate::document::{ObjectResolver, XObjectKind};
use crate::geometry::Rect;
use crate::image_decode::decode_image;
use crate::object::Object;
use crate::surface::{Bitmap, DrawingSurface, Paint};
use std::sync::Arc;

/// Maps the unit square onto itself upside down; image rows are stored top
/// first.
const IMAGE_FLIP: Matrix = Matrix {
    a: 1.0,
    b: 0.0,
    c: 0.0,
    d: -1.0,
    e: 0.0,
    f: 1.0,
};

/// Execute `obj` (a resolved XObject or pattern) against the current state.
pub(crate) fn invoke(session: &mut RenderSession<'_>, obj: &Object, surface: &mut dyn DrawingSurface) -> PdfResult {
    let Some(id) = identity(obj) else {
        log::debug!("Cannot invoke a {}", obj.type_name());
        return PdfResult::IgnoreError;
    };
    if !session.guard.insert(id) {
        log::warn!("Recursive invocation of the same XObject rejected");
        return PdfResult::IgnoreError;
    }

    let result = match session.doc.classify(obj) {
        XObjectKind::Image => draw_image(session, obj, surface),
        XObjectKind::Form => run_form(session, obj, surface),
        XObjectKind::Pattern => run_pattern(session, obj, surface),
        kind => {
            log::debug!("XObject of kind {:?} cannot be drawn", kind);
            PdfResult::IgnoreError
        },
    };

    session.guard.remove(&id);
    result
}

/// Stream with a usable `BBox`, or the reason it cannot be run.
fn content_bbox(doc: &dyn ObjectResolver, obj: &Object) -> Option<Rect> {
    if !obj.is_stream() {
        log::debug!("Content object has no stream");
        return None;
    }
    let bbox = doc
        .get_resolved(obj, "BBox")
        .and_then(|b| number_array(doc, &b))
        .and_then(|values| Rect::from_pdf_array(&values));
    if bbox.is_none() {
        log::debug!("Content object has no BBox");
    }
    bbox.map(|b| b.sorted())
}

fn matrix_of(doc: &dyn ObjectResolver, obj: &Object) -> Option<Matrix> {
    doc.get_resolved(obj, "Matrix")
        .and_then(|m| number_array(doc, &m))
        .and_then(|values| Matrix::from_pdf_array(&values))
}

fn adopt_resources(session: &mut RenderSession<'_>, obj: &Object) {
    if let Some(resources) = session.doc.get_resolved(obj, "Resources").and_then(|r| r.shared_dict()) {
        session.set_resources(resources);
    }
}

/// Run the stream inside the current `q`, reporting decode failures.
fn run_body(session: &mut RenderSession<'_>, obj: &Object, surface: &mut dyn DrawingSurface) -> PdfResult {
    match session.run_stream(obj, surface) {
        Ok(()) => PdfResult::Partial,
        Err(e) => {
            log::debug!("Content stream unreadable: {}", e);
            PdfResult::IgnoreError
        },
    }
}

fn close_state(session: &mut RenderSession<'_>, surface: &mut dyn DrawingSurface) {
    if let Err(e) = session.restore_state(surface) {
        log::warn!("Embedded content unbalanced the state stack: {}", e);
    }
}

fn run_form(session: &mut RenderSession<'_>, form: &Object, surface: &mut dyn DrawingSurface) -> PdfResult {
    let doc = session.doc;
    let Some(bbox) = content_bbox(doc, form) else {
        return PdfResult::IgnoreError;
    };

    session.save_state(surface);
    adopt_resources(session, form);
    {
        let gs = session.gs_mut();
        if let Some(m) = matrix_of(doc, form) {
            gs.ctm = gs.ctm.pre_concat(&m);
            let tm = gs.ctm.pre_scale(1.0, -1.0);
            gs.text.text_matrix = tm;
            gs.text.line_matrix = tm;
        }
        gs.content_stream_matrix = gs.ctm;
    }
    surface.set_transform(&session.gs().ctm);
    surface.clip_rect(&bbox);

    let group = doc.get_resolved(form, "Group");
    if let Some(group) = &group {
        let isolated = doc
            .get_resolved(group, "I")
            .and_then(|i| i.as_bool())
            .unwrap_or(false);
        let paint = session.gs().paint(false);
        surface.save_layer(Some(&bbox), isolated.then_some(&paint));
    }

    let result = run_body(session, form, surface);

    if group.is_some() {
        surface.restore();
    }
    close_state(session, surface);
    result
}

fn run_pattern(session: &mut RenderSession<'_>, pattern: &Object, surface: &mut dyn DrawingSurface) -> PdfResult {
    let doc = session.doc;
    let pattern_type = doc.get_resolved(pattern, "PatternType").and_then(|t| t.as_integer());
    if pattern_type != Some(1) {
        log::debug!("Pattern type {:?} not supported", pattern_type);
        return PdfResult::NotYetImplemented;
    }
    let Some(bbox) = content_bbox(doc, pattern) else {
        return PdfResult::IgnoreError;
    };

    session.save_state(surface);
    adopt_resources(session, pattern);
    {
        let gs = session.gs_mut();
        if let Some(m) = matrix_of(doc, pattern) {
            gs.content_stream_matrix = gs.content_stream_matrix.pre_concat(&m);
        }
        gs.ctm = gs.content_stream_matrix;
        // Cells paint with their own colors, never with the pattern itself.
        gs.stroking = ColorOperator::default();
        gs.non_stroking = ColorOperator::default();
    }
    surface.set_transform(&session.gs().ctm);
    surface.clip_rect(&bbox);

    let result = run_body(session, pattern, surface);
    close_state(session, surface);
    result
}

/// True for tiling patterns that carry their own colors (`PaintType 1`).
pub(crate) fn is_colored_tiling_pattern(doc: &dyn ObjectResolver, pattern: &Object) -> bool {
    let int = |key: &str| doc.get_resolved(pattern, key).and_then(|v| v.as_integer());
    int("PatternType") == Some(1) && int("PaintType") == Some(1)
}

/// Cover `bounds` with cells of `pattern`, shifting the content-stream
/// matrix by one step per cell. The matrix is back where it started when
/// this returns.
pub(crate) fn tile_pattern(
    session: &mut RenderSession<'_>,
    pattern: &Object,
    bounds: &Rect,
    surface: &mut dyn DrawingSurface,
) {
    let doc = session.doc;
    let step = |key: &str| {
        doc.get_resolved(pattern, key)
            .and_then(|v| v.as_number())
            .map(|v| (v as i64).abs() as f32)
            .unwrap_or(0.0)
    };
    let (x_step, y_step) = (step("XStep"), step("YStep"));
    if x_step == 0.0 || y_step == 0.0 {
        log::debug!("Pattern with zero step skipped");
        return;
    }
    log::debug!("Pattern steps forced positive: {} x {}", x_step, y_step);

    let bounds = bounds.sorted();
    if !(bounds.width > 0.0 && bounds.height > 0.0) {
        log::debug!("Pattern fill over empty bounds skipped");
        return;
    }

    let limit = session.config.tiling_limit;
    let mut cols = steps_across(bounds.width, x_step);
    let mut rows = steps_across(bounds.height, y_step);
    if limit > 0 {
        cols = cols.min(limit);
        rows = rows.min(limit / cols + usize::from(limit % cols != 0));
    }

    let origin = session.gs().content_stream_matrix;
    let mut cells = 0usize;
    'rows: for row in 0..rows {
        for col in 0..cols {
            if limit > 0 && cells >= limit {
                log::warn!("Pattern fill stopped after {} cells", cells);
                break 'rows;
            }
            session.gs_mut().content_stream_matrix =
                origin.pre_translate(col as f32 * x_step, -(row as f32 * y_step));
            invoke(session, pattern, surface);
            cells += 1;
        }
    }
    session.gs_mut().content_stream_matrix = origin;
}

/// Cells of `step` needed to cover `span`, at least one.
fn steps_across(span: f32, step: f32) -> usize {
    let n = (f64::from(span) / f64::from(step)).ceil();
    if n.is_nan() || n < 1.0 {
        1
    } else if n >= usize::MAX as f64 {
        usize::MAX
    } else {
        n as usize
    }
}

/// Decoded bitmap for an image stream, cached per session.
///
/// The cache entry keeps the image dictionary alive so its identity cannot
/// be reused by another object while the session lives.
pub(crate) fn decode_bitmap(
    session: &mut RenderSession<'_>,
    image: &Object,
    transparency_mask: bool,
) -> Option<Arc<Bitmap>> {
    let dict = image.shared_dict()?;
    let key = (Arc::as_ptr(&dict) as usize, transparency_mask);
    if let Some((_, bitmap)) = session.images.get(&key) {
        return Some(Arc::clone(bitmap));
    }
    let bitmap = Arc::new(decode_uncached(session, image, transparency_mask)?);
    session.images.insert(key, (dict, Arc::clone(&bitmap)));
    Some(bitmap)
}

fn decode_uncached(session: &RenderSession<'_>, image: &Object, transparency_mask: bool) -> Option<Bitmap> {
    match decode_image(session.doc, image, transparency_mask, session.config.max_stream_size) {
        Ok(bitmap) => Some(bitmap),
        Err(e) => {
            log::debug!("Image not decoded: {}", e);
            None
        },
    }
}

/// The image's own `SMask`, else the soft mask image of the graphics state.
fn soft_mask_for(session: &mut RenderSession<'_>, image: &Object) -> Option<Arc<Bitmap>> {
    if !session.config.honor_soft_masks {
        return None;
    }
    let doc = session.doc;
    if let Some(smask) = doc.get_resolved(image, "SMask").filter(Object::is_stream) {
        return decode_bitmap(session, &smask, true);
    }
    match &session.gs().soft_mask {
        Some(SoftMask::Image(bitmap)) => Some(Arc::clone(bitmap)),
        _ => None,
    }
}

/// Draw an image XObject, or an inline image when `image` is not backed
/// by the document.
pub(crate) fn draw_image(session: &mut RenderSession<'_>, image: &Object, surface: &mut dyn DrawingSurface) -> PdfResult {
    let inline = session.doc.classify(image) != XObjectKind::Image;
    let bitmap = if inline {
        decode_uncached(session, image, false).map(Arc::new)
    } else {
        decode_bitmap(session, image, false)
    };
    let Some(bitmap) = bitmap else {
        return PdfResult::IgnoreError;
    };
    if bitmap.is_empty() {
        return PdfResult::NotYetImplemented;
    }
    let mask = soft_mask_for(session, image).filter(|m| !m.is_empty());

    let unit = Rect::new(0.0, 0.0, 1.0, 1.0);
    let paint = session.gs().paint(false);
    surface.save();
    surface.set_transform(&session.gs().ctm.pre_concat(&IMAGE_FLIP));
    match mask {
        None => surface.draw_image(&bitmap, &unit, &paint),
        Some(mask) => {
            surface.save_layer(Some(&unit), Some(&paint));
            surface.draw_image(&bitmap, &unit, &Paint::default());
            let knock_out = Paint {
                blend_mode: BlendMode::SourceOut,
                ..Paint::default()
            };
            surface.draw_image(&mask, &unit, &knock_out);
            surface.restore();
        },
    }
    surface.restore();
    PdfResult::Partial
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InterpreterConfig;
    use crate::document::MemoryDocument;
    use crate::interp::ops::test_support::{dict, run_with};
    use crate::object::Dictionary;
    use crate::surface::{RecordingSurface, SurfaceCall};

    fn stream(entries: &[(&str, Object)], content: &[u8]) -> Object {
        let dict: Dictionary = entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        Object::stream(dict, content.to_vec())
    }

    fn numbers(values: &[f64]) -> Object {
        Object::Array(values.iter().map(|&v| Object::Real(v)).collect())
    }

    fn form(content: &[u8]) -> Object {
        stream(
            &[
                ("Subtype", Object::name("Form")),
                ("BBox", numbers(&[0.0, 0.0, 10.0, 10.0])),
            ],
            content,
        )
    }

    fn rgb_image(extra: &[(&str, Object)]) -> Object {
        let mut entries = vec![
            ("Subtype", Object::name("Image")),
            ("Width", Object::Integer(1)),
            ("Height", Object::Integer(1)),
            ("BitsPerComponent", Object::Integer(8)),
            ("ColorSpace", Object::name("DeviceRGB")),
        ];
        entries.extend(extra.iter().cloned());
        stream(&entries, &[255, 0, 0])
    }

    #[test]
    fn test_form_runs_with_its_matrix() {
        let doc = MemoryDocument::new();
        let mut session = RenderSession::new(&doc, InterpreterConfig::default());
        let mut surface = RecordingSurface::new();
        let f = stream(
            &[
                ("Subtype", Object::name("Form")),
                ("BBox", numbers(&[0.0, 0.0, 10.0, 10.0])),
                ("Matrix", numbers(&[2.0, 0.0, 0.0, 2.0, 0.0, 0.0])),
            ],
            b"0 0 5 5 re f",
        );
        assert_eq!(invoke(&mut session, &f, &mut surface), PdfResult::Partial);
        assert_eq!(session.stats().count("f", PdfResult::Ok), 1);
        assert_eq!(session.state_depth(), 0);
        assert_eq!(session.graphics_state().ctm, Matrix::identity());
        assert!(surface
            .calls()
            .contains(&SurfaceCall::SetTransform(Matrix::scaling(2.0, 2.0))));
        assert!(surface
            .calls()
            .contains(&SurfaceCall::ClipRect(Rect::new(0.0, 0.0, 10.0, 10.0))));
        assert_eq!(surface.save_balance(), 0);
    }

    #[test]
    fn test_form_without_bbox() {
        let doc = MemoryDocument::new();
        let mut session = RenderSession::new(&doc, InterpreterConfig::default());
        let mut surface = RecordingSurface::new();
        let f = stream(&[("Subtype", Object::name("Form"))], b"");
        assert_eq!(invoke(&mut session, &f, &mut surface), PdfResult::IgnoreError);
        assert!(surface.calls().is_empty());
    }

    #[test]
    fn test_isolated_group_layer() {
        let doc = MemoryDocument::new();
        let mut session = RenderSession::new(&doc, InterpreterConfig::default());
        let mut surface = RecordingSurface::new();
        let f = stream(
            &[
                ("Subtype", Object::name("Form")),
                ("BBox", numbers(&[0.0, 0.0, 10.0, 10.0])),
                ("Group", dict(&[("I", Object::Boolean(true))])),
            ],
            b"",
        );
        invoke(&mut session, &f, &mut surface);
        assert_eq!(surface.count(|c| matches!(c, SurfaceCall::SaveLayer(Some(_), Some(_)))), 1);
        assert_eq!(surface.save_balance(), 0);
    }

    #[test]
    fn test_self_referencing_form_is_rejected() {
        let mut doc = MemoryDocument::new();
        let r = crate::object::ObjectRef::new(7, 0);
        let resources = dict(&[("XObject", dict(&[("Fm0", Object::Reference(r))]))]);
        let f = stream(
            &[
                ("Subtype", Object::name("Form")),
                ("BBox", numbers(&[0.0, 0.0, 10.0, 10.0])),
                ("Resources", resources),
            ],
            b"/Fm0 Do",
        );
        doc.insert(r, f);

        let mut session = RenderSession::new(&doc, InterpreterConfig::default());
        let mut surface = RecordingSurface::new();
        let form = doc.resolve_reference(&Object::Reference(r));
        assert_eq!(invoke(&mut session, &form, &mut surface), PdfResult::Partial);
        assert_eq!(session.stats().count("Do", PdfResult::IgnoreError), 1);
        assert!(session.guard.is_empty());
        assert_eq!(surface.save_balance(), 0);
    }

    #[test]
    fn test_pattern_uses_content_stream_matrix() {
        let doc = MemoryDocument::new();
        let mut session = RenderSession::new(&doc, InterpreterConfig::default());
        session.graphics_state_mut().ctm = Matrix::translation(50.0, 50.0);
        let mut surface = RecordingSurface::new();
        let p = stream(
            &[
                ("PatternType", Object::Integer(1)),
                ("PaintType", Object::Integer(1)),
                ("BBox", numbers(&[0.0, 0.0, 10.0, 10.0])),
                ("Matrix", numbers(&[1.0, 0.0, 0.0, 1.0, 5.0, 0.0])),
            ],
            b"0 0 10 10 re f",
        );
        assert_eq!(invoke(&mut session, &p, &mut surface), PdfResult::Partial);
        assert!(surface
            .calls()
            .contains(&SurfaceCall::SetTransform(Matrix::translation(5.0, 0.0))));
        assert_eq!(session.graphics_state().ctm, Matrix::translation(50.0, 50.0));
    }

    #[test]
    fn test_tiling_covers_bounds_and_restores_matrix() {
        let doc = MemoryDocument::new();
        let mut session = RenderSession::new(&doc, InterpreterConfig::default());
        let mut surface = RecordingSurface::new();
        let p = stream(
            &[
                ("PatternType", Object::Integer(1)),
                ("PaintType", Object::Integer(1)),
                ("XStep", Object::Integer(-10)),
                ("YStep", Object::Integer(10)),
                ("BBox", numbers(&[0.0, 0.0, 10.0, 10.0])),
            ],
            b"0 0 1 1 re f",
        );
        let before = session.graphics_state().content_stream_matrix;
        tile_pattern(&mut session, &p, &Rect::new(0.0, 0.0, 25.0, 25.0), &mut surface);
        assert_eq!(session.stats().count("f", PdfResult::Ok), 9);
        assert!(session
            .graphics_state()
            .content_stream_matrix
            .approx_eq(&before, 1e-4));
    }

    #[test]
    fn test_tiling_limit_and_zero_step() {
        let doc = MemoryDocument::new();
        let config = InterpreterConfig::default().with_tiling_limit(4);
        let mut session = RenderSession::new(&doc, config);
        let mut surface = RecordingSurface::new();
        let p = stream(
            &[
                ("PatternType", Object::Integer(1)),
                ("XStep", Object::Integer(10)),
                ("YStep", Object::Integer(10)),
                ("BBox", numbers(&[0.0, 0.0, 10.0, 10.0])),
            ],
            b"0 0 1 1 re f",
        );
        let before = session.graphics_state().content_stream_matrix;
        tile_pattern(&mut session, &p, &Rect::new(0.0, 0.0, 25.0, 25.0), &mut surface);
        assert_eq!(session.stats().count("f", PdfResult::Ok), 4);
        assert!(session
            .graphics_state()
            .content_stream_matrix
            .approx_eq(&before, 1e-4));

        let flat = stream(&[("PatternType", Object::Integer(1)), ("XStep", Object::Integer(0))], b"");
        surface.clear();
        tile_pattern(&mut session, &flat, &Rect::new(0.0, 0.0, 25.0, 25.0), &mut surface);
        assert!(surface.calls().is_empty());
    }

    #[test]
    fn test_tiling_degenerate_and_huge_bounds() {
        let doc = MemoryDocument::new();
        let config = InterpreterConfig::default().with_tiling_limit(50);
        let mut session = RenderSession::new(&doc, config);
        let mut surface = RecordingSurface::new();
        let p = stream(
            &[
                ("PatternType", Object::Integer(1)),
                ("XStep", Object::Integer(10)),
                ("YStep", Object::Integer(10)),
                ("BBox", numbers(&[0.0, 0.0, 10.0, 10.0])),
            ],
            b"0 0 1 1 re f",
        );
        let before = session.graphics_state().content_stream_matrix;
        tile_pattern(&mut session, &p, &Rect::new(0.0, 0.0, 0.0, 1e9), &mut surface);
        assert!(surface.calls().is_empty());
        assert_eq!(session.graphics_state().content_stream_matrix, before);

        tile_pattern(&mut session, &p, &Rect::new(0.0, 0.0, 1e9, 1e9), &mut surface);
        assert_eq!(session.stats().count("f", PdfResult::Ok), 50);
        assert_eq!(session.graphics_state().content_stream_matrix, before);

        tile_pattern(&mut session, &p, &Rect::new(0.0, 0.0, 5.0, f32::INFINITY), &mut surface);
        assert_eq!(session.stats().count("f", PdfResult::Ok), 100);
        assert_eq!(session.graphics_state().content_stream_matrix, before);
    }

    #[test]
    fn test_steps_across() {
        assert_eq!(steps_across(25.0, 10.0), 3);
        assert_eq!(steps_across(20.0, 10.0), 2);
        assert_eq!(steps_across(0.5, 10.0), 1);
        assert_eq!(steps_across(f32::INFINITY, 10.0), usize::MAX);
    }

    #[test]
    fn test_colored_tiling_pattern() {
        let doc = MemoryDocument::new();
        let colored = dict(&[("PatternType", Object::Integer(1)), ("PaintType", Object::Integer(1))]);
        let uncolored = dict(&[("PatternType", Object::Integer(1)), ("PaintType", Object::Integer(2))]);
        assert!(is_colored_tiling_pattern(&doc, &colored));
        assert!(!is_colored_tiling_pattern(&doc, &uncolored));
    }

    #[test]
    fn test_image_draws_unit_square() {
        let doc = MemoryDocument::new();
        let mut session = RenderSession::new(&doc, InterpreterConfig::default());
        let mut surface = RecordingSurface::new();
        let image = rgb_image(&[]);
        assert_eq!(invoke(&mut session, &image, &mut surface), PdfResult::Partial);
        assert_eq!(
            surface.calls(),
            &[
                SurfaceCall::Save,
                SurfaceCall::SetTransform(IMAGE_FLIP),
                SurfaceCall::DrawImage {
                    width: 1,
                    height: 1,
                    dest: Rect::new(0.0, 0.0, 1.0, 1.0),
                    blend_mode: BlendMode::Normal,
                },
                SurfaceCall::Restore,
            ]
        );
        assert_eq!(session.images.len(), 1);
    }

    #[test]
    fn test_image_soft_mask_layer() {
        let doc = MemoryDocument::new();
        let mut session = RenderSession::new(&doc, InterpreterConfig::default());
        let mut surface = RecordingSurface::new();
        let smask = stream(
            &[
                ("Subtype", Object::name("Image")),
                ("Width", Object::Integer(1)),
                ("Height", Object::Integer(1)),
                ("BitsPerComponent", Object::Integer(8)),
                ("ColorSpace", Object::name("DeviceGray")),
            ],
            &[128],
        );
        let image = rgb_image(&[("SMask", smask)]);
        invoke(&mut session, &image, &mut surface);
        assert_eq!(surface.count(|c| matches!(c, SurfaceCall::SaveLayer(Some(_), Some(_)))), 1);
        assert_eq!(
            surface.count(|c| matches!(
                c,
                SurfaceCall::DrawImage {
                    blend_mode: BlendMode::SourceOut,
                    ..
                }
            )),
            1
        );
        assert_eq!(surface.save_balance(), 0);

        let mut session = RenderSession::new(&doc, InterpreterConfig::default().with_soft_masks(false));
        surface.clear();
        invoke(&mut session, &image, &mut surface);
        assert_eq!(surface.count(|c| matches!(c, SurfaceCall::SaveLayer(..))), 0);
    }

    #[test]
    fn test_do_operator_end_to_end() {
        let doc = MemoryDocument::new();
        let res = dict(&[("XObject", dict(&[("Fm0", form(b"0 0 1 1 re f")), ("Im0", rgb_image(&[]))]))]);
        let (session, surface) = run_with(&doc, Some(res), b"/Fm0 Do /Im0 Do /Missing Do");
        assert_eq!(session.stats().count("Do", PdfResult::Partial), 2);
        assert_eq!(session.stats().count("Do", PdfResult::IgnoreError), 1);
        assert_eq!(surface.count(|c| matches!(c, SurfaceCall::DrawImage { .. })), 1);
    }
}
