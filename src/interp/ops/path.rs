//! Path construction, painting and clipping.

use crate::content::{FillRule, GraphicsState};
use crate::error::Result;
use crate::geometry::{Point, Rect};
use crate::interp::{invoke, PdfResult, RenderSession};
use crate::surface::{DrawingSurface, PaintStyle};

/// Construction after a paint starts a new path.
fn begin_segment(gs: &mut GraphicsState) {
    if gs.path_closed {
        gs.path.reset();
        gs.path_closed = false;
    }
}

fn pop_point(session: &mut RenderSession<'_>) -> Result<Point> {
    let y = session.operands.pop_number()?;
    let x = session.operands.pop_number()?;
    Ok(Point::new(x as f32, y as f32))
}

pub(crate) fn op_m(session: &mut RenderSession<'_>, _surface: &mut dyn DrawingSurface) -> Result<PdfResult> {
    let p = pop_point(session)?;
    let gs = session.gs_mut();
    begin_segment(gs);
    gs.path.move_to(p);
    gs.current_point = p;
    Ok(PdfResult::Ok)
}

pub(crate) fn op_l(session: &mut RenderSession<'_>, _surface: &mut dyn DrawingSurface) -> Result<PdfResult> {
    let p = pop_point(session)?;
    let gs = session.gs_mut();
    begin_segment(gs);
    gs.path.line_to(p);
    gs.current_point = p;
    Ok(PdfResult::Ok)
}

pub(crate) fn op_c(session: &mut RenderSession<'_>, _surface: &mut dyn DrawingSurface) -> Result<PdfResult> {
    let end = pop_point(session)?;
    let c2 = pop_point(session)?;
    let c1 = pop_point(session)?;
    let gs = session.gs_mut();
    begin_segment(gs);
    gs.path.cubic_to(c1, c2, end);
    gs.current_point = end;
    Ok(PdfResult::Ok)
}

/// `v`: the current point is the first control point.
pub(crate) fn op_v(session: &mut RenderSession<'_>, _surface: &mut dyn DrawingSurface) -> Result<PdfResult> {
    let end = pop_point(session)?;
    let c2 = pop_point(session)?;
    let gs = session.gs_mut();
    begin_segment(gs);
    let c1 = gs.current_point;
    gs.path.cubic_to(c1, c2, end);
    gs.current_point = end;
    Ok(PdfResult::Ok)
}

/// `y`: the current point is the second control point.
pub(crate) fn op_y(session: &mut RenderSession<'_>, _surface: &mut dyn DrawingSurface) -> Result<PdfResult> {
    let end = pop_point(session)?;
    let c1 = pop_point(session)?;
    let gs = session.gs_mut();
    begin_segment(gs);
    let c2 = gs.current_point;
    gs.path.cubic_to(c1, c2, end);
    gs.current_point = end;
    Ok(PdfResult::Ok)
}

pub(crate) fn op_h(session: &mut RenderSession<'_>, _surface: &mut dyn DrawingSurface) -> Result<PdfResult> {
    session.gs_mut().path.close();
    Ok(PdfResult::Ok)
}

pub(crate) fn op_re(session: &mut RenderSession<'_>, _surface: &mut dyn DrawingSurface) -> Result<PdfResult> {
    let height = session.operands.pop_number()? as f32;
    let width = session.operands.pop_number()? as f32;
    let origin = pop_point(session)?;
    let gs = session.gs_mut();
    begin_segment(gs);
    gs.path.add_rect(Rect::from_points(origin.x, origin.y, origin.x + width, origin.y + height));
    gs.current_point = Point::new(origin.x, origin.y + height);
    Ok(PdfResult::Ok)
}

#[derive(Clone, Copy)]
struct Painting {
    fill: bool,
    stroke: bool,
    close: bool,
    even_odd: bool,
}

/// Pattern selected as the fill source, if the fill goes through one.
fn fill_pattern(gs: &GraphicsState) -> Option<crate::object::Object> {
    let color = &gs.non_stroking;
    if color.uses_pattern() {
        color.pattern.clone()
    } else {
        None
    }
}

/// Shared body of every painting operator.
fn fill_and_stroke(
    session: &mut RenderSession<'_>,
    surface: &mut dyn DrawingSurface,
    op: Painting,
) -> Result<PdfResult> {
    let mut path = session.gs().path.clone();
    if op.close {
        path.close();
    }
    path.set_fill_rule(if op.even_odd {
        FillRule::EvenOdd
    } else {
        FillRule::NonZero
    });
    let ctm = session.gs().ctm;
    surface.set_transform(&ctm);

    if op.fill {
        let pattern = fill_pattern(session.gs());
        if !op.stroke && path.as_line().is_some() {
            // A filled line has no area; draw it as a hairline.
            let mut paint = session.gs().paint(false);
            paint.style = PaintStyle::Stroke;
            paint.stroke.width = 0.0;
            surface.draw_path(&path, &paint);
        } else if let Some(pattern) = pattern {
            session.save_state(surface);
            surface.clip_path(&path, path.fill_rule());
            if invoke::is_colored_tiling_pattern(session.doc, &pattern) {
                invoke::tile_pattern(session, &pattern, &path.bounds(), surface);
            } else {
                log::debug!("Only colored tiling patterns are painted");
            }
            if let Err(e) = session.restore_state(surface) {
                log::warn!("Pattern fill unbalanced the state stack: {}", e);
            }
        } else {
            surface.draw_path(&path, &session.gs().paint(false));
        }
    }

    if op.stroke {
        let mut outline = path.clone();
        outline.set_fill_rule(FillRule::NonZero);
        surface.draw_path(&outline, &session.gs().paint(true));
    }

    end_path(session, surface);
    Ok(PdfResult::Ok)
}

/// Empty the path and apply a pending clip.
fn end_path(session: &mut RenderSession<'_>, surface: &mut dyn DrawingSurface) {
    let gs = session.gs_mut();
    gs.path.reset();
    gs.path_closed = true;
    if gs.clip_path_pending {
        gs.clip_path_pending = false;
        surface.set_transform(&gs.ctm);
        surface.clip_path(&gs.clip_path, gs.clip_path.fill_rule());
    }
}

macro_rules! painting_op {
    ($name:ident, $fill:expr, $stroke:expr, $close:expr, $even_odd:expr) => {
        pub(crate) fn $name(
            session: &mut RenderSession<'_>,
            surface: &mut dyn DrawingSurface,
        ) -> Result<PdfResult> {
            fill_and_stroke(
                session,
                surface,
                Painting {
                    fill: $fill,
                    stroke: $stroke,
                    close: $close,
                    even_odd: $even_odd,
                },
            )
        }
    };
}

painting_op!(op_big_s, false, true, false, false);
painting_op!(op_s, false, true, true, false);
painting_op!(op_f, true, false, false, false);
painting_op!(op_f_star, true, false, false, true);
painting_op!(op_big_b, true, true, false, false);
painting_op!(op_big_b_star, true, true, false, true);
painting_op!(op_b, true, true, true, false);
painting_op!(op_b_star, true, true, true, true);

pub(crate) fn op_n(session: &mut RenderSession<'_>, surface: &mut dyn DrawingSurface) -> Result<PdfResult> {
    let ctm = session.gs().ctm;
    surface.set_transform(&ctm);
    end_path(session, surface);
    Ok(PdfResult::Ok)
}

fn set_clip(session: &mut RenderSession<'_>, rule: FillRule) -> Result<PdfResult> {
    let gs = session.gs_mut();
    gs.clip_path = gs.path.clone();
    gs.clip_path.set_fill_rule(rule);
    gs.clip_path_pending = true;
    Ok(PdfResult::Ok)
}

pub(crate) fn op_w_clip(session: &mut RenderSession<'_>, _surface: &mut dyn DrawingSurface) -> Result<PdfResult> {
    set_clip(session, FillRule::NonZero)
}

pub(crate) fn op_w_clip_star(session: &mut RenderSession<'_>, _surface: &mut dyn DrawingSurface) -> Result<PdfResult> {
    set_clip(session, FillRule::EvenOdd)
}
