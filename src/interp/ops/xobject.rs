//! `Do`: draw a named XObject.

use crate::error::Result;
use crate::interp::{invoke, PdfResult, RenderSession};
use crate::surface::DrawingSurface;

pub(crate) fn op_do(session: &mut RenderSession<'_>, surface: &mut dyn DrawingSurface) -> Result<PdfResult> {
    let name = session.operands.pop_name()?;
    let Some(xobjects) = session.resource_category("XObject") else {
        log::debug!("Do /{}: no XObject resources", name);
        return Ok(PdfResult::IgnoreError);
    };
    let Some(target) = session.doc.get_resolved(&xobjects, &name) else {
        log::debug!("Do /{}: not found", name);
        return Ok(PdfResult::IgnoreError);
    };
    Ok(invoke::invoke(session, &target, surface))
}
