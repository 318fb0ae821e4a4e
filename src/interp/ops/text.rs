//! Text objects, text state, positioning and showing.
//!
//! The text matrices live in device space: `BT` seeds them with the CTM
//! flipped vertically, so y offsets in text space are negated when applied.
//! Glyph advances use a fixed half-em width per byte.

use crate::content::Matrix;
use crate::document::{ObjectResolver, XObjectKind};
use crate::error::Result;
use crate::interp::{PdfResult, RenderSession};
use crate::object::Object;
use crate::surface::DrawingSurface;

/// Advance of one byte, as a fraction of the font size.
const NOMINAL_GLYPH_WIDTH: f32 = 0.5;

pub(crate) fn op_bt(session: &mut RenderSession<'_>, _surface: &mut dyn DrawingSurface) -> Result<PdfResult> {
    let gs = session.gs_mut();
    let m = gs.ctm.pre_scale(1.0, -1.0);
    gs.text.in_text_block = true;
    gs.text.text_matrix = m;
    gs.text.line_matrix = m;
    Ok(PdfResult::Partial)
}

pub(crate) fn op_et(session: &mut RenderSession<'_>, _surface: &mut dyn DrawingSurface) -> Result<PdfResult> {
    let text = &mut session.gs_mut().text;
    if !text.in_text_block {
        log::debug!("ET without BT");
        return Ok(PdfResult::IgnoreError);
    }
    text.in_text_block = false;
    Ok(PdfResult::Ok)
}

fn move_text(session: &mut RenderSession<'_>, tx: f64, ty: f64) -> PdfResult {
    let m = Matrix::translation(tx as f32, -ty as f32);
    let text = &mut session.gs_mut().text;
    text.text_matrix = text.text_matrix.pre_concat(&m);
    text.line_matrix = text.line_matrix.pre_concat(&m);
    PdfResult::Partial
}

pub(crate) fn op_td(session: &mut RenderSession<'_>, _surface: &mut dyn DrawingSurface) -> Result<PdfResult> {
    let ty = session.operands.pop_number()?;
    let tx = session.operands.pop_number()?;
    Ok(move_text(session, tx, ty))
}

pub(crate) fn op_big_td(session: &mut RenderSession<'_>, _surface: &mut dyn DrawingSurface) -> Result<PdfResult> {
    let ty = session.operands.pop_number()?;
    let tx = session.operands.pop_number()?;
    session.gs_mut().text.leading = -ty as f32;
    Ok(move_text(session, tx, ty))
}

pub(crate) fn op_tm(session: &mut RenderSession<'_>, _surface: &mut dyn DrawingSurface) -> Result<PdfResult> {
    let m = session.operands.pop_matrix()?;
    let gs = session.gs_mut();
    let tm = m.post_concat(&gs.ctm).pre_scale(1.0, -1.0);
    gs.text.text_matrix = tm;
    gs.text.line_matrix = tm;
    Ok(PdfResult::Partial)
}

fn next_line(session: &mut RenderSession<'_>) -> PdfResult {
    let leading = session.gs().text.leading as f64;
    move_text(session, 0.0, -leading)
}

pub(crate) fn op_t_star(session: &mut RenderSession<'_>, _surface: &mut dyn DrawingSurface) -> Result<PdfResult> {
    Ok(next_line(session))
}

pub(crate) fn op_tc(session: &mut RenderSession<'_>, _surface: &mut dyn DrawingSurface) -> Result<PdfResult> {
    let spacing = session.operands.pop_number()?;
    session.gs_mut().text.char_spacing = spacing as f32;
    Ok(PdfResult::Ok)
}

pub(crate) fn op_tw(session: &mut RenderSession<'_>, _surface: &mut dyn DrawingSurface) -> Result<PdfResult> {
    let spacing = session.operands.pop_number()?;
    session.gs_mut().text.word_spacing = spacing as f32;
    Ok(PdfResult::Ok)
}

pub(crate) fn op_tz(session: &mut RenderSession<'_>, _surface: &mut dyn DrawingSurface) -> Result<PdfResult> {
    let scale = session.operands.pop_number()?;
    if scale < 0.0 {
        log::debug!("Tz: negative horizontal scaling {}", scale);
        return Ok(PdfResult::Error);
    }
    Ok(PdfResult::NotYetImplemented)
}

pub(crate) fn op_tl(session: &mut RenderSession<'_>, _surface: &mut dyn DrawingSurface) -> Result<PdfResult> {
    let leading = session.operands.pop_number()?;
    session.gs_mut().text.leading = leading as f32;
    Ok(PdfResult::Ok)
}

pub(crate) fn op_tf(session: &mut RenderSession<'_>, _surface: &mut dyn DrawingSurface) -> Result<PdfResult> {
    let size = session.operands.pop_number()?;
    let name = session.operands.pop_name()?;
    let Some(fonts) = session.resource_category("Font") else {
        log::debug!("Tf /{}: no Font resources", name);
        return Ok(PdfResult::IgnoreError);
    };
    let doc = session.doc;
    let font = match doc.get_resolved(&fonts, &name) {
        Some(font) if doc.classify(&font) == XObjectKind::Font => font,
        other => {
            log::debug!("Tf /{}: not a font dictionary ({:?})", name, other.map(|o| o.type_name()));
            return Ok(PdfResult::IgnoreError);
        },
    };
    let text = &mut session.gs_mut().text;
    text.font = Some(font);
    text.font_size = size as f32;
    Ok(PdfResult::Ok)
}

pub(crate) fn op_tr(session: &mut RenderSession<'_>, _surface: &mut dyn DrawingSurface) -> Result<PdfResult> {
    let mode = session.operands.pop_integer()?;
    if mode < 0 {
        log::debug!("Tr: negative render mode {}", mode);
        return Ok(PdfResult::Error);
    }
    Ok(PdfResult::NotYetImplemented)
}

pub(crate) fn op_ts(session: &mut RenderSession<'_>, _surface: &mut dyn DrawingSurface) -> Result<PdfResult> {
    session.operands.pop_number()?;
    Ok(PdfResult::NotYetImplemented)
}

/// True when text in `font` can be decoded: it names an encoding or is a
/// simple font with a built-in one.
fn has_encoding(doc: &dyn ObjectResolver, font: &Object) -> bool {
    if doc.get_resolved(font, "Encoding").is_some() {
        return true;
    }
    !doc
        .get_resolved(font, "Subtype")
        .is_some_and(|s| s.is_name_eq("Type0"))
}

/// Draw `bytes` at the text matrix and advance it.
fn show_text(session: &mut RenderSession<'_>, surface: &mut dyn DrawingSurface, bytes: &[u8]) -> PdfResult {
    let doc = session.doc;
    let gs = session.gs();
    if let Some(font) = &gs.text.font {
        if !has_encoding(doc, font) {
            log::debug!("Font without encoding; text skipped");
            return PdfResult::NotYetImplemented;
        }
    }
    let size = gs.text.font_size;
    let paint = gs.paint(false);
    surface.set_transform(&gs.text.text_matrix);
    surface.draw_text(bytes, size, &paint);

    let spaces = bytes.iter().filter(|&&b| b == b' ').count() as f32;
    let advance = bytes.len() as f32 * (size * NOMINAL_GLYPH_WIDTH + gs.text.char_spacing)
        + spaces * gs.text.word_spacing;
    let text = &mut session.gs_mut().text;
    text.text_matrix = text.text_matrix.pre_translate(advance, 0.0);
    PdfResult::Partial
}

fn require_text_block(session: &RenderSession<'_>, op: &str) -> bool {
    let inside = session.gs().text.in_text_block;
    if !inside {
        log::debug!("{} without BT", op);
    }
    inside
}

pub(crate) fn op_tj(session: &mut RenderSession<'_>, surface: &mut dyn DrawingSurface) -> Result<PdfResult> {
    let bytes = session.operands.pop_string()?;
    if !require_text_block(session, "Tj") {
        return Ok(PdfResult::IgnoreError);
    }
    Ok(show_text(session, surface, &bytes))
}

pub(crate) fn op_quote(session: &mut RenderSession<'_>, surface: &mut dyn DrawingSurface) -> Result<PdfResult> {
    let bytes = session.operands.pop_string()?;
    if !require_text_block(session, "'") {
        return Ok(PdfResult::IgnoreError);
    }
    next_line(session);
    Ok(show_text(session, surface, &bytes))
}

pub(crate) fn op_double_quote(session: &mut RenderSession<'_>, surface: &mut dyn DrawingSurface) -> Result<PdfResult> {
    let bytes = session.operands.pop_string()?;
    let char_spacing = session.operands.pop_number()?;
    let word_spacing = session.operands.pop_number()?;
    if !require_text_block(session, "\"") {
        return Ok(PdfResult::IgnoreError);
    }
    let text = &mut session.gs_mut().text;
    text.word_spacing = word_spacing as f32;
    text.char_spacing = char_spacing as f32;
    next_line(session);
    show_text(session, surface, &bytes);
    Ok(PdfResult::Partial)
}

pub(crate) fn op_big_tj(session: &mut RenderSession<'_>, surface: &mut dyn DrawingSurface) -> Result<PdfResult> {
    let items = session.operands.pop_array()?;
    if !require_text_block(session, "TJ") {
        return Ok(PdfResult::IgnoreError);
    }
    for item in &items {
        match item {
            Object::String(bytes) => {
                show_text(session, surface, bytes);
            },
            other => match other.as_number() {
                Some(adjust) => {
                    let text = &mut session.gs_mut().text;
                    let dx = -(adjust as f32) / 1000.0 * text.font_size;
                    text.text_matrix = text.text_matrix.pre_translate(dx, 0.0);
                },
                None => log::debug!("TJ: unexpected {} element", other.type_name()),
            },
        }
    }
    Ok(PdfResult::Partial)
}
