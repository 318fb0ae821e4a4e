//! Shading, marked content, Type 3 glyph metrics and section markers.

use crate::error::Result;
use crate::interp::{PdfResult, RenderSession};
use crate::surface::DrawingSurface;

fn discard(session: &mut RenderSession<'_>, count: usize) -> Result<()> {
    for _ in 0..count {
        session.operands.pop()?;
    }
    Ok(())
}

pub(crate) fn op_sh(session: &mut RenderSession<'_>, _surface: &mut dyn DrawingSurface) -> Result<PdfResult> {
    session.operands.pop_name()?;
    Ok(PdfResult::NotYetImplemented)
}

pub(crate) fn op_mp(session: &mut RenderSession<'_>, _surface: &mut dyn DrawingSurface) -> Result<PdfResult> {
    discard(session, 1)?;
    Ok(PdfResult::NotYetImplemented)
}

pub(crate) fn op_dp(session: &mut RenderSession<'_>, _surface: &mut dyn DrawingSurface) -> Result<PdfResult> {
    discard(session, 2)?;
    Ok(PdfResult::NotYetImplemented)
}

pub(crate) fn op_bmc(session: &mut RenderSession<'_>, _surface: &mut dyn DrawingSurface) -> Result<PdfResult> {
    discard(session, 1)?;
    Ok(PdfResult::NotYetImplemented)
}

pub(crate) fn op_bdc(session: &mut RenderSession<'_>, _surface: &mut dyn DrawingSurface) -> Result<PdfResult> {
    discard(session, 2)?;
    Ok(PdfResult::NotYetImplemented)
}

pub(crate) fn op_emc(_session: &mut RenderSession<'_>, _surface: &mut dyn DrawingSurface) -> Result<PdfResult> {
    Ok(PdfResult::NotYetImplemented)
}

/// `wx wy d0`
pub(crate) fn op_d0(session: &mut RenderSession<'_>, _surface: &mut dyn DrawingSurface) -> Result<PdfResult> {
    let wy = session.operands.pop_number()?;
    let wx = session.operands.pop_number()?;
    if wx < 0.0 || wy < 0.0 {
        log::debug!("d0: negative glyph width ({}, {})", wx, wy);
        return Ok(PdfResult::Error);
    }
    Ok(PdfResult::NotYetImplemented)
}

/// `wx wy llx lly urx ury d1`
pub(crate) fn op_d1(session: &mut RenderSession<'_>, _surface: &mut dyn DrawingSurface) -> Result<PdfResult> {
    for _ in 0..6 {
        session.operands.pop_number()?;
    }
    Ok(PdfResult::NotYetImplemented)
}

/// `EX`, `ID` or `EI` reaching the operator table means the section it
/// closes was never opened.
pub(crate) fn op_stray_marker(_session: &mut RenderSession<'_>, _surface: &mut dyn DrawingSurface) -> Result<PdfResult> {
    Ok(PdfResult::IgnoreError)
}

/// `BX` and `BI`; the looper attached in the table does the work.
pub(crate) fn op_begin_section(_session: &mut RenderSession<'_>, _surface: &mut dyn DrawingSurface) -> Result<PdfResult> {
    Ok(PdfResult::Ok)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::MemoryDocument;
    use crate::interp::ops::test_support::run_with;

    #[test]
    fn test_marked_content_consumes_operands() {
        let doc = MemoryDocument::new();
        let (session, _) = run_with(&doc, None, b"/Tag MP /Tag << /MCID 0 >> BDC /Span BMC EMC EMC /Tag /P DP");
        assert!(session.operands().is_empty());
        assert_eq!(session.stats().total(PdfResult::NotYetImplemented), 6);
    }

    #[test]
    fn test_glyph_metrics() {
        let doc = MemoryDocument::new();
        let (session, _) = run_with(&doc, None, b"-1 0 d0 10 0 d0 1 2 3 4 5 6 d1");
        assert_eq!(session.stats().count("d0", PdfResult::Error), 1);
        assert_eq!(session.stats().count("d0", PdfResult::NotYetImplemented), 1);
        assert_eq!(session.stats().count("d1", PdfResult::NotYetImplemented), 1);
        assert!(session.operands().is_empty());
    }

    #[test]
    fn test_shading_requires_name() {
        let doc = MemoryDocument::new();
        let (session, _) = run_with(&doc, None, b"/Sh0 sh 5 sh");
        assert_eq!(session.stats().count("sh", PdfResult::NotYetImplemented), 1);
        assert_eq!(session.stats().count("sh", PdfResult::IgnoreError), 1);
    }

    #[test]
    fn test_stray_markers() {
        let doc = MemoryDocument::new();
        let (session, _) = run_with(&doc, None, b"EX EI");
        assert_eq!(session.stats().total(PdfResult::IgnoreError), 2);
    }
}
