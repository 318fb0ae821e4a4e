//! Per-render interpreter state.

use super::looper::Looper;
use super::operand_stack::OperandStack;
use super::stats::RenderStats;
use super::table::OperatorFn;
use super::PdfResult;
use crate::config::InterpreterConfig;
use crate::content::{ContentTokenizer, GraphicsState, GraphicsStateStack, Matrix};
use crate::document::ObjectResolver;
use crate::error::Result;
use crate::geometry::Rect;
use crate::object::{Dictionary, Object};
use crate::surface::{Bitmap, DrawingSurface};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Media box used when a page does not declare one (US Letter).
const DEFAULT_MEDIA_BOX: [f64; 4] = [0.0, 0.0, 612.0, 792.0];

/// State of one top-level render.
///
/// A session is single-threaded. Renders running in parallel each need their
/// own session; the document behind it is only read.
pub struct RenderSession<'d> {
    pub(crate) doc: &'d dyn ObjectResolver,
    pub(crate) config: InterpreterConfig,
    pub(crate) states: GraphicsStateStack,
    pub(crate) operands: OperandStack,
    /// Identities of forms, patterns and images currently executing.
    pub(crate) guard: HashSet<usize>,
    pub(crate) stats: RenderStats,
    /// Decoded bitmaps by (stream identity, transparency mask), each with
    /// the dictionary it was decoded from.
    pub(crate) images: HashMap<(usize, bool), (Arc<Dictionary>, Arc<Bitmap>)>,
}

impl<'d> RenderSession<'d> {
    /// Session over `doc` with a fresh graphics state.
    pub fn new(doc: &'d dyn ObjectResolver, config: InterpreterConfig) -> Self {
        Self {
            doc,
            config,
            states: GraphicsStateStack::new(GraphicsState::new()),
            operands: OperandStack::new(config.max_operand_stack),
            guard: HashSet::new(),
            stats: RenderStats::new(),
            images: HashMap::new(),
        }
    }

    /// Document objects are resolved against.
    pub fn document(&self) -> &'d dyn ObjectResolver {
        self.doc
    }

    /// Configuration in effect.
    pub fn config(&self) -> &InterpreterConfig {
        &self.config
    }

    /// Current graphics state.
    pub fn graphics_state(&self) -> &GraphicsState {
        self.states.current()
    }

    /// Mutable access to the current graphics state.
    pub fn graphics_state_mut(&mut self) -> &mut GraphicsState {
        self.states.current_mut()
    }

    /// Number of states saved by `q` and not yet restored.
    pub fn state_depth(&self) -> usize {
        self.states.depth()
    }

    /// Operands waiting for an operator.
    pub fn operands(&self) -> &OperandStack {
        &self.operands
    }

    /// Mutable operand stack, for hosts feeding operands directly.
    pub fn operands_mut(&mut self) -> &mut OperandStack {
        &mut self.operands
    }

    /// Per-operator statistics collected so far.
    pub fn stats(&self) -> &RenderStats {
        &self.stats
    }

    /// Use `resources` as the current resource dictionary.
    pub fn set_resources(&mut self, resources: Arc<Dictionary>) {
        self.states.current_mut().resources = resources;
    }

    pub(crate) fn gs(&self) -> &GraphicsState {
        self.states.current()
    }

    pub(crate) fn gs_mut(&mut self) -> &mut GraphicsState {
        self.states.current_mut()
    }

    /// Save the graphics state and mirror it on the surface.
    pub fn save_state(&mut self, surface: &mut dyn DrawingSurface) {
        self.states.save();
        surface.save();
    }

    /// Restore the graphics state and mirror it on the surface.
    ///
    /// On an empty stack nothing changes, on either side.
    pub fn restore_state(&mut self, surface: &mut dyn DrawingSurface) -> Result<()> {
        self.states.restore()?;
        surface.restore();
        Ok(())
    }

    /// Resolved resource category (`Font`, `XObject`, ...) of the current
    /// resources, `None` when absent or not a dictionary.
    pub(crate) fn resource_category(&self, category: &str) -> Option<Object> {
        let raw = self.gs().resources.get(category)?;
        let resolved = self.doc.resolve_reference(raw);
        resolved.is_dictionary().then_some(resolved)
    }

    /// Run one operator handler and turn library errors into `IgnoreError`.
    pub(crate) fn dispatch(
        &mut self,
        keyword: &str,
        handler: OperatorFn,
        surface: &mut dyn DrawingSurface,
    ) -> PdfResult {
        match handler(self, surface) {
            Ok(result) => result,
            Err(e) => {
                log::debug!("Operator {} skipped: {}", keyword, e);
                PdfResult::IgnoreError
            },
        }
    }

    /// Interpret a decoded content stream against the current state.
    pub fn run_content(&mut self, content: &[u8], surface: &mut dyn DrawingSurface) {
        let mut tokenizer = ContentTokenizer::new(content);
        Looper::Main.run(self, &mut tokenizer, surface);
        if tokenizer.skipped_bytes() > 0 {
            log::debug!("Skipped {} unparseable bytes", tokenizer.skipped_bytes());
        }
    }

    /// Decode `stream` and interpret it.
    pub(crate) fn run_stream(&mut self, stream: &Object, surface: &mut dyn DrawingSurface) -> Result<()> {
        let content = stream.decode_stream_data(self.config.max_stream_size)?;
        self.run_content(&content, surface);
        Ok(())
    }

    /// Render `page` (a page dictionary) into `dst` on `surface`.
    ///
    /// The media box is mapped onto `dst` with the vertical axis flipped, so
    /// the surface is expected to use y-down device coordinates.
    pub fn render_page(
        &mut self,
        page: &Object,
        dst: &Rect,
        surface: &mut dyn DrawingSurface,
    ) -> Result<PdfResult> {
        if dst.width <= 0.0 || dst.height <= 0.0 {
            return Ok(PdfResult::Ok);
        }
        let page = self.doc.resolve_reference(page);
        let media_box = self.media_box(&page);
        let page_matrix = Matrix::flip_to(&media_box, dst);
        {
            let gs = self.gs_mut();
            gs.ctm = page_matrix;
            gs.content_stream_matrix = page_matrix;
            gs.text.text_matrix = page_matrix;
            gs.text.line_matrix = page_matrix;
        }
        surface.clip_rect(dst);
        self.draw_page(&page, &media_box, surface)
    }

    /// Sorted media box of a resolved page, US Letter when missing.
    pub fn media_box(&self, page: &Object) -> Rect {
        self.doc
            .get_resolved(page, "MediaBox")
            .and_then(|mb| number_array(self.doc, &mb))
            .and_then(|values| Rect::from_pdf_array(&values))
            .unwrap_or_else(|| {
                Rect::from_pdf_array(&DEFAULT_MEDIA_BOX).unwrap_or_default()
            })
            .sorted()
    }

    fn draw_page(
        &mut self,
        page: &Object,
        media_box: &Rect,
        surface: &mut dyn DrawingSurface,
    ) -> Result<PdfResult> {
        let Some(id) = identity(page) else {
            log::debug!("Page is not a dictionary: {}", page.type_name());
            return Ok(PdfResult::IgnoreError);
        };
        if !self.guard.insert(id) {
            log::warn!("Page content invokes itself; skipping");
            return Ok(PdfResult::IgnoreError);
        }

        let resources = self
            .doc
            .get_resolved(page, "Resources")
            .and_then(|r| r.shared_dict())
            .unwrap_or_default();
        self.set_resources(resources);

        self.save_state(surface);
        if self.doc.get_resolved(page, "Group").is_some() {
            let paint = self.gs().paint(false);
            surface.save_layer(Some(media_box), Some(&paint));
        } else {
            surface.save();
        }

        let result = match self.page_content(page) {
            Ok(content) => {
                self.run_content(&content, surface);
                PdfResult::Ok
            },
            Err(e) => {
                log::warn!("Page contents unreadable: {}", e);
                PdfResult::IgnoreError
            },
        };

        surface.restore();
        if let Err(e) = self.restore_state(surface) {
            log::warn!("Page ended with unbalanced graphics state: {}", e);
        }
        self.guard.remove(&id);
        Ok(result)
    }

    /// Decoded `Contents`; arrays of streams are joined with newlines.
    fn page_content(&self, page: &Object) -> Result<Vec<u8>> {
        let max = self.config.max_stream_size;
        match self.doc.get_resolved(page, "Contents") {
            None => Ok(Vec::new()),
            Some(Object::Array(parts)) => {
                let mut content = Vec::new();
                for part in &parts {
                    let stream = self.doc.resolve_reference(part);
                    if !stream.is_stream() {
                        log::debug!("Skipping non-stream page content part");
                        continue;
                    }
                    if !content.is_empty() {
                        content.push(b'\n');
                    }
                    content.extend(stream.decode_stream_data(max)?);
                }
                Ok(content)
            },
            Some(stream) => stream.decode_stream_data(max),
        }
    }
}

/// Identity of a dictionary or stream for the recursion guard.
pub(crate) fn identity(obj: &Object) -> Option<usize> {
    match obj {
        Object::Dictionary(d) => Some(Arc::as_ptr(d) as usize),
        Object::Stream { dict, .. } => Some(Arc::as_ptr(dict) as usize),
        _ => None,
    }
}

/// Numbers of an array, references followed. `None` if any entry is not a number.
pub(crate) fn number_array(doc: &dyn ObjectResolver, obj: &Object) -> Option<Vec<f64>> {
    obj.as_array()?
        .iter()
        .map(|v| doc.resolve_reference(v).as_number())
        .collect()
}
