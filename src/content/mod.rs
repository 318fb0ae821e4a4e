//! Content stream building blocks: tokens, paths and the graphics state.
//!
//! The interpreter that executes content streams lives in [`crate::interp`].

pub mod graphics_state;
pub mod path;
pub mod tokenizer;

pub use graphics_state::{
    BlendMode, BoundedSeq, Color, ColorOperator, GraphicsState, GraphicsStateStack, Matrix,
    SoftMask, TextState, MAX_SEQUENCE_LEN,
};
pub use path::{FillRule, PathData, PathSegment};
pub use tokenizer::{ContentToken, ContentTokenizer, Tokenizer};
