//! Operator handlers, grouped like the operator categories of the content
//! stream grammar.
//!
//! Every handler pops its operands last to first. Handlers return
//! `Err` only for operand problems; everything else is a [`PdfResult`].
//!
//! [`PdfResult`]: super::PdfResult

pub(super) mod color;
pub(super) mod misc;
pub(super) mod path;
pub(super) mod state;
pub(super) mod text;
pub(super) mod xobject;
