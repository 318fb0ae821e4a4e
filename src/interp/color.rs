//! Color space and color resolution.
//!
//! Only DeviceRGB colors are turned into a concrete [`Color`]; other spaces
//! consume their operands and leave the color unchanged.

use super::{PdfResult, RenderSession};
use crate::content::{Color, ColorOperator};
use crate::error::Result;
use crate::object::Object;

/// Number of numeric operands a color in `space` takes.
pub(crate) fn component_count(space: &str) -> usize {
    match space {
        "DeviceCMYK" => 4,
        "DeviceGray" | "CalGray" | "Indexed" => 1,
        "DeviceRGB" | "CalRGB" | "Lab" => 3,
        _ => 0,
    }
}

/// Stroking or non-stroking color operator of the current state.
pub(crate) fn color_operator<'a>(session: &'a mut RenderSession<'_>, stroking: bool) -> &'a mut ColorOperator {
    let gs = session.gs_mut();
    if stroking {
        &mut gs.stroking
    } else {
        &mut gs.non_stroking
    }
}

/// Resolve `name` through the `ColorSpace` resources and select it.
pub(crate) fn set_color_space(session: &mut RenderSession<'_>, name: &str, stroking: bool) -> PdfResult {
    let doc = session.doc;
    let space = match session.resource_category("ColorSpace") {
        Some(spaces) => doc.get_resolved(&spaces, name),
        None => None,
    };
    let Some(space) = space else {
        color_operator(session, stroking).set_color_space(name);
        return PdfResult::Partial;
    };

    match &space {
        Object::Name(family) => {
            color_operator(session, stroking).set_color_space(family);
            PdfResult::Partial
        },
        Object::Array(parts) => {
            let Some(first) = parts.first() else {
                log::debug!("Color space /{} is an empty array", name);
                return PdfResult::IgnoreError;
            };
            let family = doc.resolve_reference(first);
            if family.is_name_eq("ICCBased") {
                return set_icc_based(session, parts, stroking);
            }
            match family.as_name() {
                Some(family) => color_operator(session, stroking).set_color_space(family),
                None => log::debug!("Color space /{} has no family name", name),
            }
            PdfResult::Partial
        },
        other => {
            log::debug!("Color space /{} is a {}", name, other.type_name());
            PdfResult::Partial
        },
    }
}

fn set_icc_based(session: &mut RenderSession<'_>, parts: &[Object], stroking: bool) -> PdfResult {
    if parts.len() != 2 {
        log::debug!("ICCBased color space needs 2 elements, found {}", parts.len());
        return PdfResult::IgnoreError;
    }
    let doc = session.doc;
    let profile = doc.resolve_reference(&parts[1]);
    let channels = doc.get_resolved(&profile, "N").and_then(|n| n.as_integer());
    if channels == Some(3) {
        color_operator(session, stroking).set_color_space("DeviceRGB");
        PdfResult::Partial
    } else {
        log::debug!("ICCBased profile with {:?} channels not supported", channels);
        PdfResult::NotYetImplemented
    }
}

/// Pop the components of the current space (last first) and set the color.
pub(crate) fn set_color(session: &mut RenderSession<'_>, stroking: bool) -> Result<PdfResult> {
    let space = color_operator(session, stroking).color_space.clone();
    let n = component_count(&space);
    let mut components = vec![0.0; n];
    for c in components.iter_mut().rev() {
        *c = session.operands.pop_number()?;
    }
    if space == "DeviceRGB" || space == "RGB" {
        let channel = |i: usize| components[i].clamp(0.0, 1.0) as f32;
        color_operator(session, stroking).set_color(Color::rgb(channel(0), channel(1), channel(2)));
    }
    Ok(PdfResult::Partial)
}

/// `SCN`/`scn`: an optional pattern name on top, then the color components.
pub(crate) fn set_color_or_pattern(session: &mut RenderSession<'_>, stroking: bool) -> Result<PdfResult> {
    if session.operands.peek().is_some_and(Object::is_name) {
        let name = session.operands.pop_name()?;
        let Some(patterns) = session.resource_category("Pattern") else {
            log::debug!("scn /{}: no Pattern resources", name);
            return Ok(PdfResult::IgnoreError);
        };
        let Some(pattern) = session.doc.get_resolved(&patterns, &name) else {
            log::debug!("scn /{}: pattern not found", name);
            return Ok(PdfResult::IgnoreError);
        };
        let op = color_operator(session, stroking);
        op.set_color_space("Pattern");
        op.set_pattern(pattern);
    }
    if let Err(e) = set_color(session, stroking) {
        log::debug!("scn: {}", e);
    }
    Ok(PdfResult::Partial)
}

/// Set a DeviceRGB color directly.
pub(crate) fn set_rgb(session: &mut RenderSession<'_>, stroking: bool, color: Color) {
    let op = color_operator(session, stroking);
    op.set_color_space("DeviceRGB");
    op.set_color(color);
}
