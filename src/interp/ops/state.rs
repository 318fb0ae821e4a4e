//! General graphics state: `q Q cm w J j M d ri i gs`.

use crate::content::{BlendMode, BoundedSeq, SoftMask, MAX_SEQUENCE_LEN};
use crate::document::XObjectKind;
use crate::error::{Error, Result};
use crate::interp::{invoke, PdfResult, RenderSession};
use crate::object::Object;
use crate::surface::DrawingSurface;

pub(crate) fn op_q(session: &mut RenderSession<'_>, surface: &mut dyn DrawingSurface) -> Result<PdfResult> {
    session.save_state(surface);
    Ok(PdfResult::Ok)
}

pub(crate) fn op_big_q(session: &mut RenderSession<'_>, surface: &mut dyn DrawingSurface) -> Result<PdfResult> {
    match session.restore_state(surface) {
        Ok(()) => Ok(PdfResult::Ok),
        Err(e) => {
            log::warn!("Q: {}", e);
            Ok(PdfResult::IgnoreError)
        },
    }
}

pub(crate) fn op_cm(session: &mut RenderSession<'_>, _surface: &mut dyn DrawingSurface) -> Result<PdfResult> {
    let m = session.operands.pop_matrix()?;
    let gs = session.gs_mut();
    gs.ctm = gs.ctm.pre_concat(&m);
    Ok(PdfResult::Ok)
}

pub(crate) fn op_w(session: &mut RenderSession<'_>, _surface: &mut dyn DrawingSurface) -> Result<PdfResult> {
    let width = session.operands.pop_number()?;
    session.gs_mut().line_width = width as f32;
    Ok(PdfResult::Ok)
}

pub(crate) fn op_big_j(session: &mut RenderSession<'_>, _surface: &mut dyn DrawingSurface) -> Result<PdfResult> {
    let cap = session.operands.pop_integer()?;
    session.gs_mut().line_cap = cap.clamp(0, u8::MAX as i64) as u8;
    Ok(PdfResult::Ok)
}

pub(crate) fn op_j(session: &mut RenderSession<'_>, _surface: &mut dyn DrawingSurface) -> Result<PdfResult> {
    let join = session.operands.pop_integer()?;
    session.gs_mut().line_join = join.clamp(0, u8::MAX as i64) as u8;
    Ok(PdfResult::Ok)
}

pub(crate) fn op_big_m(session: &mut RenderSession<'_>, _surface: &mut dyn DrawingSurface) -> Result<PdfResult> {
    let limit = session.operands.pop_number()?;
    session.gs_mut().miter_limit = limit as f32;
    Ok(PdfResult::Ok)
}

pub(crate) fn op_d(session: &mut RenderSession<'_>, _surface: &mut dyn DrawingSurface) -> Result<PdfResult> {
    let phase = session.operands.pop()?;
    let intervals = session.operands.pop_array()?;
    apply_dash(session, &intervals, &phase)
}

/// Install a dash pattern. A single interval is repeated; a zero phase is
/// replaced by the pattern length.
fn apply_dash(session: &mut RenderSession<'_>, intervals: &[Object], phase: &Object) -> Result<PdfResult> {
    if intervals.len() >= MAX_SEQUENCE_LEN {
        log::warn!("Dash array of {} entries exceeds capacity", intervals.len());
        return Err(Error::CapacityExceeded {
            capacity: MAX_SEQUENCE_LEN,
        });
    }
    let doc = session.doc;
    let Some(phase) = doc.resolve_reference(phase).as_number() else {
        log::debug!("Dash phase is not a number");
        return Ok(PdfResult::IgnoreError);
    };
    let mut values = Vec::with_capacity(intervals.len() + 1);
    for item in intervals {
        match doc.resolve_reference(item).as_number() {
            Some(v) => values.push(v as f32),
            None => {
                log::debug!("Dash interval is not a number: {}", item.type_name());
                return Ok(PdfResult::IgnoreError);
            },
        }
    }
    let total: f32 = values.iter().sum();
    if values.len() % 2 == 1 {
        if values.len() != 1 {
            log::debug!("Odd dash array length {} not implemented", values.len());
            return Ok(PdfResult::NotYetImplemented);
        }
        values.push(values[0]);
    }

    let gs = session.gs_mut();
    gs.dash_array = BoundedSeq::from_vec(values)?;
    gs.dash_phase = if phase == 0.0 { total } else { phase as f32 };
    Ok(PdfResult::Ok)
}

pub(crate) fn op_ri(session: &mut RenderSession<'_>, _surface: &mut dyn DrawingSurface) -> Result<PdfResult> {
    session.operands.pop()?;
    Ok(PdfResult::NotYetImplemented)
}

pub(crate) fn op_i(session: &mut RenderSession<'_>, _surface: &mut dyn DrawingSurface) -> Result<PdfResult> {
    let flatness = session.operands.pop_number()?;
    if !(0.0..=100.0).contains(&flatness) {
        log::debug!("Flatness {} out of range", flatness);
        return Ok(PdfResult::IgnoreError);
    }
    Ok(PdfResult::NotYetImplemented)
}

pub(crate) fn op_gs(session: &mut RenderSession<'_>, _surface: &mut dyn DrawingSurface) -> Result<PdfResult> {
    let name = session.operands.pop_name()?;
    let Some(ext_gstates) = session.resource_category("ExtGState") else {
        log::debug!("gs /{}: no ExtGState resources", name);
        return Ok(PdfResult::IgnoreError);
    };
    let doc = session.doc;
    let Some(params) = doc.get_resolved(&ext_gstates, &name).filter(Object::is_dictionary) else {
        log::debug!("gs /{}: not a graphics state dictionary", name);
        return Ok(PdfResult::IgnoreError);
    };

    let number = |key: &str| doc.get_resolved(&params, key).and_then(|v| v.as_number());

    if let Some(lw) = number("LW") {
        session.gs_mut().line_width = lw as f32;
    }
    if let Some(lc) = number("LC") {
        session.gs_mut().line_cap = (lc as i64).clamp(0, u8::MAX as i64) as u8;
    }
    if let Some(lj) = number("LJ") {
        session.gs_mut().line_join = (lj as i64).clamp(0, u8::MAX as i64) as u8;
    }
    if let Some(ml) = number("ML") {
        session.gs_mut().miter_limit = ml as f32;
    }
    if let Some(dash) = doc.get_resolved(&params, "D") {
        match dash.as_array().map(Vec::as_slice) {
            Some([intervals, phase]) => match doc.resolve_reference(intervals) {
                Object::Array(intervals) => {
                    let result = apply_dash(session, &intervals, phase).unwrap_or(PdfResult::IgnoreError);
                    log::trace!("gs /D: {}", result);
                },
                _ => log::debug!("gs /D: first element is not an array"),
            },
            _ => log::debug!("gs /D must be a two-element array"),
        }
    }
    if let Some(font) = doc.get_resolved(&params, "Font") {
        match font.as_array().map(Vec::as_slice) {
            Some([font_ref, size]) => match doc.resolve_reference(size).as_number() {
                Some(size) => {
                    let font = doc.resolve_reference(font_ref);
                    let gs = session.gs_mut();
                    gs.text.font = Some(font);
                    gs.text.font_size = size as f32;
                },
                None => log::debug!("gs /Font size is not a number"),
            },
            _ => log::debug!("gs /Font must be a two-element array"),
        }
    }
    if let Some(bm) = doc.get_resolved(&params, "BM") {
        apply_blend_modes(session, &bm);
    }
    if let Some(smask) = doc.get_resolved(&params, "SMask") {
        apply_soft_mask(session, &ext_gstates, &smask);
    }
    if let Some(ca) = number("ca") {
        let gs = session.gs_mut();
        gs.non_stroking.opacity = ca as f32;
        gs.alpha_constant = ca as f32;
    }
    if let Some(ca) = number("CA") {
        session.gs_mut().stroking.opacity = ca as f32;
    }
    if let Some(ais) = doc.get_resolved(&params, "AIS").and_then(|v| v.as_bool()) {
        session.gs_mut().alpha_source = ais;
    }
    Ok(PdfResult::Ok)
}

/// `/BM`: a single name or an array of names, all of which must be known.
fn apply_blend_modes(session: &mut RenderSession<'_>, bm: &Object) {
    let doc = session.doc;
    let names: Vec<Object> = match bm {
        Object::Name(_) => vec![bm.clone()],
        Object::Array(items) if !items.is_empty() && items.len() <= MAX_SEQUENCE_LEN => {
            items.iter().map(|i| doc.resolve_reference(i)).collect()
        },
        Object::Array(items) => {
            log::debug!("gs /BM: unsupported array length {}", items.len());
            return;
        },
        other => {
            log::debug!("gs /BM: unexpected {}", other.type_name());
            return;
        },
    };
    let mut modes = Vec::with_capacity(names.len());
    for name in &names {
        match name.as_name().and_then(BlendMode::from_name) {
            Some(mode) => modes.push(mode),
            None => {
                log::debug!("gs /BM: unknown blend mode {:?}", name);
                return;
            },
        }
    }
    match BoundedSeq::from_vec(modes) {
        Ok(seq) => session.gs_mut().blend_modes = seq,
        Err(e) => log::warn!("gs /BM: {}", e),
    }
}

/// `/SMask`: `/None`, the name of another ExtGState entry, a soft-mask
/// dictionary or a soft-mask image.
fn apply_soft_mask(session: &mut RenderSession<'_>, ext_gstates: &Object, smask: &Object) {
    let doc = session.doc;
    let target = match smask {
        Object::Name(name) if name == "None" => {
            session.gs_mut().soft_mask = None;
            return;
        },
        Object::Name(name) => match doc.get_resolved(ext_gstates, name) {
            Some(obj) if obj.is_dictionary() => {
                session.gs_mut().soft_mask = None;
                obj
            },
            _ => {
                log::debug!("gs /SMask /{}: not a dictionary", name);
                return;
            },
        },
        other => other.clone(),
    };
    match doc.classify(&target) {
        XObjectKind::SoftMask => session.gs_mut().soft_mask = Some(SoftMask::Dictionary(target)),
        XObjectKind::Image => match invoke::decode_bitmap(session, &target, true) {
            Some(bitmap) => session.gs_mut().soft_mask = Some(SoftMask::Image(bitmap)),
            None => log::debug!("gs /SMask: image could not be decoded"),
        },
        kind => log::debug!("gs /SMask: expected soft mask or image, found {:?}", kind),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::Matrix;
    use crate::document::MemoryDocument;
    use crate::interp::ops::test_support::{dict, resources, run_with};
    use crate::surface::SurfaceCall;

    #[test]
    fn test_q_and_unbalanced_q() {
        let doc = MemoryDocument::new();
        let (session, surface) = run_with(&doc, None, b"q Q Q");
        assert_eq!(session.stats().count("Q", PdfResult::Ok), 1);
        assert_eq!(session.stats().count("Q", PdfResult::IgnoreError), 1);
        assert_eq!(surface.calls(), &[SurfaceCall::Save, SurfaceCall::Restore]);
    }

    #[test]
    fn test_cm_pre_concatenates() {
        let doc = MemoryDocument::new();
        let (session, _) = run_with(&doc, None, b"2 0 0 2 0 0 cm 1 0 0 1 10 0 cm");
        let p = session.graphics_state().ctm.transform_point(0.0, 0.0);
        assert_eq!(p.x, 20.0);
    }

    #[test]
    fn test_cm_underflow_leaves_ctm() {
        let doc = MemoryDocument::new();
        let (session, _) = run_with(&doc, None, b"1 0 0 cm");
        assert_eq!(session.graphics_state().ctm, Matrix::identity());
        assert_eq!(session.stats().count("cm", PdfResult::IgnoreError), 1);
    }

    #[test]
    fn test_line_style() {
        let doc = MemoryDocument::new();
        let (session, _) = run_with(&doc, None, b"3 w 1 J 2.7 j 4 M");
        let gs = session.graphics_state();
        assert_eq!(gs.line_width, 3.0);
        assert_eq!(gs.line_cap, 1);
        assert_eq!(gs.line_join, 2);
        assert_eq!(gs.miter_limit, 4.0);
    }

    #[test]
    fn test_dash_single_entry_and_zero_phase() {
        let doc = MemoryDocument::new();
        let (session, _) = run_with(&doc, None, b"[3] 0 d");
        let gs = session.graphics_state();
        assert_eq!(gs.dash_array.as_slice(), &[3.0, 3.0]);
        assert_eq!(gs.dash_phase, 3.0);
        assert_eq!(session.stats().count("d", PdfResult::Ok), 1);
    }

    #[test]
    fn test_dash_odd_and_invalid() {
        let doc = MemoryDocument::new();
        let (session, _) = run_with(&doc, None, b"[1 2 3] 0 d [1 /x] 0 d [2 1] 5 d");
        assert_eq!(session.stats().count("d", PdfResult::NotYetImplemented), 1);
        assert_eq!(session.stats().count("d", PdfResult::IgnoreError), 1);
        assert_eq!(session.graphics_state().dash_phase, 5.0);
    }

    #[test]
    fn test_dash_capacity() {
        let doc = MemoryDocument::new();
        let content = format!("[{}] 0 d", "1 ".repeat(256));
        let (session, _) = run_with(&doc, None, content.as_bytes());
        assert_eq!(session.stats().count("d", PdfResult::IgnoreError), 1);
        assert!(session.graphics_state().dash_array.is_empty());
    }

    #[test]
    fn test_flatness_range() {
        let doc = MemoryDocument::new();
        let (session, _) = run_with(&doc, None, b"50 i 150 i /Perceptual ri");
        assert_eq!(session.stats().count("i", PdfResult::NotYetImplemented), 1);
        assert_eq!(session.stats().count("i", PdfResult::IgnoreError), 1);
        assert_eq!(session.stats().count("ri", PdfResult::NotYetImplemented), 1);
    }

    #[test]
    fn test_gs_applies_parameters() {
        let doc = MemoryDocument::new();
        let params = dict(&[
            ("Type", Object::name("ExtGState")),
            ("LW", Object::Real(2.5)),
            ("LC", Object::Integer(2)),
            ("ca", Object::Real(0.5)),
            ("CA", Object::Real(0.25)),
            ("AIS", Object::Boolean(true)),
            ("BM", Object::Array(vec![Object::name("Multiply"), Object::name("Screen")])),
            (
                "D",
                Object::Array(vec![Object::Array(vec![Object::Integer(4), Object::Integer(2)]), Object::Integer(1)]),
            ),
        ]);
        let res = resources("ExtGState", &[("GS0", params)]);
        let (session, _) = run_with(&doc, Some(res), b"/GS0 gs");
        let gs = session.graphics_state();
        assert_eq!(session.stats().count("gs", PdfResult::Ok), 1);
        assert_eq!(gs.line_width, 2.5);
        assert_eq!(gs.line_cap, 2);
        assert_eq!(gs.non_stroking.opacity, 0.5);
        assert_eq!(gs.alpha_constant, 0.5);
        assert_eq!(gs.stroking.opacity, 0.25);
        assert!(gs.alpha_source);
        assert_eq!(gs.blend_modes.as_slice(), &[BlendMode::Multiply, BlendMode::Screen]);
        assert_eq!(gs.dash_array.as_slice(), &[4.0, 2.0]);
        assert_eq!(gs.dash_phase, 1.0);
    }

    #[test]
    fn test_gs_unknown_blend_mode_keeps_previous() {
        let doc = MemoryDocument::new();
        let params = dict(&[("BM", Object::Array(vec![Object::name("Screen"), Object::name("Bogus")]))]);
        let res = resources("ExtGState", &[("GS0", params)]);
        let (session, _) = run_with(&doc, Some(res), b"/GS0 gs");
        assert_eq!(session.graphics_state().blend_modes.as_slice(), &[BlendMode::Normal]);
    }

    #[test]
    fn test_gs_missing_resources() {
        let doc = MemoryDocument::new();
        let (session, _) = run_with(&doc, None, b"/GS0 gs");
        assert_eq!(session.stats().count("gs", PdfResult::IgnoreError), 1);

        let res = resources("ExtGState", &[("GS0", Object::Integer(1))]);
        let (session, _) = run_with(&doc, Some(res), b"/GS0 gs");
        assert_eq!(session.stats().count("gs", PdfResult::IgnoreError), 1);
    }

    #[test]
    fn test_gs_soft_mask_dictionary_and_none() {
        let doc = MemoryDocument::new();
        let mask = dict(&[("Type", Object::name("Mask")), ("S", Object::name("Luminosity"))]);
        let res = resources(
            "ExtGState",
            &[
                ("GS0", dict(&[("SMask", mask)])),
                ("GS1", dict(&[("SMask", Object::name("None"))])),
            ],
        );
        let (session, _) = run_with(&doc, Some(res.clone()), b"/GS0 gs");
        assert!(matches!(session.graphics_state().soft_mask, Some(SoftMask::Dictionary(_))));
        let (session, _) = run_with(&doc, Some(res), b"/GS0 gs /GS1 gs");
        assert!(session.graphics_state().soft_mask.is_none());
    }

    #[test]
    fn test_gs_font() {
        let mut doc = MemoryDocument::new();
        let font = doc.add(dict(&[("Type", Object::name("Font"))]));
        let params = dict(&[("Font", Object::Array(vec![font, Object::Integer(12)]))]);
        let res = resources("ExtGState", &[("GS0", params)]);
        let (session, _) = run_with(&doc, Some(res), b"/GS0 gs");
        let text = &session.graphics_state().text;
        assert!(text.font.is_some());
        assert_eq!(text.font_size, 12.0);
    }
}
