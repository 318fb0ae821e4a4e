//! Token loopers.
//!
//! The main looper dispatches keywords and stacks operands. `BX` and `BI`
//! run a child looper over the same tokenizer before the parent resumes; a
//! child holds its parent so it can hand tokens back.

use super::invoke;
use super::table::{self, ChildLooper};
use super::{PdfResult, RenderSession};
use crate::content::{ContentToken, Tokenizer};
use crate::surface::DrawingSurface;

/// A token consumer.
#[derive(Debug, Clone, Copy)]
pub enum Looper<'p> {
    /// Dispatches operators and pushes operands.
    Main,
    /// Reads one inline image after `BI` and draws it.
    InlineImage {
        /// Looper that spawned this one
        parent: &'p Looper<'p>,
    },
    /// Runs a `BX` ... `EX` section, forwarding tokens to the parent.
    Compatibility {
        /// Looper that spawned this one
        parent: &'p Looper<'p>,
    },
}

impl<'p> Looper<'p> {
    /// Consume tokens until this looper is done.
    pub fn run(
        &self,
        session: &mut RenderSession<'_>,
        tokenizer: &mut dyn Tokenizer,
        surface: &mut dyn DrawingSurface,
    ) {
        match self {
            Looper::Main => {
                while let Some(token) = tokenizer.read_token() {
                    self.consume_token(session, tokenizer, surface, token);
                }
            },
            Looper::InlineImage { .. } => match tokenizer.read_inline_image() {
                Some(image) => {
                    let result = invoke::draw_image(session, &image, surface);
                    log::debug!("Inline image: {}", result);
                },
                None => log::debug!("Unreadable inline image skipped"),
            },
            Looper::Compatibility { parent } => {
                session.save_state(surface);
                while let Some(token) = tokenizer.read_token() {
                    match token {
                        ContentToken::Keyword(ref kw) if kw == "BX" => {
                            Looper::Compatibility { parent: self }.run(session, tokenizer, surface);
                        },
                        ContentToken::Keyword(ref kw) if kw == "EX" => break,
                        other => parent.consume_token(session, tokenizer, surface, other),
                    }
                }
                if let Err(e) = session.restore_state(surface) {
                    log::warn!("Compatibility section left the state stack unbalanced: {}", e);
                }
            },
        }
    }

    /// Handle one token.
    pub fn consume_token(
        &self,
        session: &mut RenderSession<'_>,
        tokenizer: &mut dyn Tokenizer,
        surface: &mut dyn DrawingSurface,
        token: ContentToken,
    ) {
        match self {
            Looper::Main => match token {
                ContentToken::Object(obj) => session.operands.push(obj),
                ContentToken::Keyword(kw) => self.execute(session, tokenizer, surface, &kw),
            },
            Looper::InlineImage { parent } | Looper::Compatibility { parent } => {
                parent.consume_token(session, tokenizer, surface, token)
            },
        }
    }

    fn execute(
        &self,
        session: &mut RenderSession<'_>,
        tokenizer: &mut dyn Tokenizer,
        surface: &mut dyn DrawingSurface,
        keyword: &str,
    ) {
        let Some(def) = table::lookup(keyword) else {
            log::debug!("Unsupported operator '{}'", keyword);
            session.stats.record(keyword, PdfResult::Unsupported);
            return;
        };
        let result = session.dispatch(keyword, def.handler, surface);
        log::trace!("{} -> {}", keyword, result);
        session.stats.record(keyword, result);

        match def.child {
            Some(ChildLooper::Compatibility) => {
                Looper::Compatibility { parent: self }.run(session, tokenizer, surface)
            },
            Some(ChildLooper::InlineImage) => {
                Looper::InlineImage { parent: self }.run(session, tokenizer, surface)
            },
            None => {},
        }
    }
}
