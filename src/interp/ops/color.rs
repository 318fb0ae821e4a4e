//! Color operators. Upper-case forms set the stroking color, lower-case
//! forms the non-stroking one.

use crate::content::Color;
use crate::error::Result;
use crate::interp::color;
use crate::interp::{PdfResult, RenderSession};
use crate::surface::DrawingSurface;

fn color_space(session: &mut RenderSession<'_>, stroking: bool) -> Result<PdfResult> {
    let name = session.operands.pop_name()?;
    Ok(color::set_color_space(session, &name, stroking))
}

pub(crate) fn op_big_cs(session: &mut RenderSession<'_>, _surface: &mut dyn DrawingSurface) -> Result<PdfResult> {
    color_space(session, true)
}

pub(crate) fn op_cs(session: &mut RenderSession<'_>, _surface: &mut dyn DrawingSurface) -> Result<PdfResult> {
    color_space(session, false)
}

pub(crate) fn op_big_sc(session: &mut RenderSession<'_>, _surface: &mut dyn DrawingSurface) -> Result<PdfResult> {
    color::set_color(session, true)
}

pub(crate) fn op_sc(session: &mut RenderSession<'_>, _surface: &mut dyn DrawingSurface) -> Result<PdfResult> {
    color::set_color(session, false)
}

pub(crate) fn op_big_scn(session: &mut RenderSession<'_>, _surface: &mut dyn DrawingSurface) -> Result<PdfResult> {
    color::set_color_or_pattern(session, true)
}

pub(crate) fn op_scn(session: &mut RenderSession<'_>, _surface: &mut dyn DrawingSurface) -> Result<PdfResult> {
    color::set_color_or_pattern(session, false)
}

// Gray is approximated in DeviceRGB.
fn gray(session: &mut RenderSession<'_>, stroking: bool) -> Result<PdfResult> {
    let level = session.operands.pop_number()?;
    color::set_rgb(session, stroking, Color::gray(level.clamp(0.0, 1.0) as f32));
    Ok(PdfResult::Partial)
}

pub(crate) fn op_big_g(session: &mut RenderSession<'_>, _surface: &mut dyn DrawingSurface) -> Result<PdfResult> {
    gray(session, true)
}

pub(crate) fn op_g(session: &mut RenderSession<'_>, _surface: &mut dyn DrawingSurface) -> Result<PdfResult> {
    gray(session, false)
}

fn rgb(session: &mut RenderSession<'_>, stroking: bool) -> Result<PdfResult> {
    let b = session.operands.pop_number()?;
    let g = session.operands.pop_number()?;
    let r = session.operands.pop_number()?;
    let channel = |v: f64| v.clamp(0.0, 1.0) as f32;
    color::set_rgb(session, stroking, Color::rgb(channel(r), channel(g), channel(b)));
    Ok(PdfResult::Ok)
}

pub(crate) fn op_big_rg(session: &mut RenderSession<'_>, _surface: &mut dyn DrawingSurface) -> Result<PdfResult> {
    rgb(session, true)
}

pub(crate) fn op_rg(session: &mut RenderSession<'_>, _surface: &mut dyn DrawingSurface) -> Result<PdfResult> {
    rgb(session, false)
}

fn cmyk(session: &mut RenderSession<'_>) -> Result<PdfResult> {
    for _ in 0..4 {
        session.operands.pop_number()?;
    }
    Ok(PdfResult::NotYetImplemented)
}

pub(crate) fn op_big_k(session: &mut RenderSession<'_>, _surface: &mut dyn DrawingSurface) -> Result<PdfResult> {
    cmyk(session)
}

pub(crate) fn op_k(session: &mut RenderSession<'_>, _surface: &mut dyn DrawingSurface) -> Result<PdfResult> {
    cmyk(session)
}
