//! Content stream interpreter.
//!
//! A [`RenderSession`] owns everything one top-level render mutates: the
//! graphics state stack, the operand stack, the recursion guard and the
//! statistics. Tokens are fed through a [`Looper`]; keywords are dispatched
//! via the immutable operator table in [`table`], and embedded content
//! (forms, tiling patterns, images) re-enters the interpreter through the
//! invocation engine.
//!
//! # Example
//!
//! ```
//! use pdf_interp::document::MemoryDocument;
//! use pdf_interp::interp::{PdfResult, RenderSession};
//! use pdf_interp::surface::RecordingSurface;
//!
//! let doc = MemoryDocument::new();
//! let mut session = RenderSession::new(&doc, Default::default());
//! let mut surface = RecordingSurface::new();
//! session.run_content(b"q 1 0 0 1 10 10 cm 0 0 1 rg 0 0 100 100 re f Q", &mut surface);
//!
//! assert_eq!(session.stats().count("re", PdfResult::Ok), 1);
//! assert!(session.operands().is_empty());
//! ```

mod color;
mod invoke;
mod looper;
mod operand_stack;
mod ops;
mod session;
mod stats;
pub mod table;

pub use looper::Looper;
pub use operand_stack::OperandStack;
pub use session::RenderSession;
pub use stats::RenderStats;
pub use table::{ChildLooper, OperatorDef, OperatorFn};

/// Outcome of one operator.
///
/// None of these stop interpretation; they only feed [`RenderStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PdfResult {
    /// Fully handled
    Ok,
    /// Handled with a known simplification
    Partial,
    /// Recognized, operands consumed, no effect
    NotYetImplemented,
    /// Malformed or missing input, skipped
    IgnoreError,
    /// Invalid parameter values
    Error,
    /// Keyword not in the operator table
    Unsupported,
}

impl PdfResult {
    /// Every result, in report order.
    pub const ALL: [PdfResult; 6] = [
        PdfResult::Ok,
        PdfResult::Partial,
        PdfResult::NotYetImplemented,
        PdfResult::IgnoreError,
        PdfResult::Error,
        PdfResult::Unsupported,
    ];

    /// Heading used in the statistics report.
    pub fn name(self) -> &'static str {
        match self {
            PdfResult::Ok => "Success",
            PdfResult::Partial => "Partially implemented",
            PdfResult::NotYetImplemented => "Not yet implemented",
            PdfResult::IgnoreError => "Ignore Error",
            PdfResult::Error => "Error",
            PdfResult::Unsupported => "Unsupported",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for PdfResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
