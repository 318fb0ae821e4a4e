//! Page renderer - rasterizes pages and raw content streams to PNG.

use super::skia_surface::SkiaSurface;
use crate::config::{InterpreterConfig, RenderOptions};
use crate::document::ObjectResolver;
use crate::error::Result;
use crate::geometry::Rect;
use crate::interp::{PdfResult, RenderSession, RenderStats};
use crate::object::{Dictionary, Object};
use std::sync::Arc;

/// Rendered image output.
#[derive(Debug, Clone)]
pub struct RenderedImage {
    /// PNG bytes
    pub data: Vec<u8>,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Operator results of the render
    pub stats: RenderStats,
}

impl RenderedImage {
    /// Save the image to a file.
    pub fn save(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        std::fs::write(path.as_ref(), &self.data)?;
        Ok(())
    }

    /// Get the image data as bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

/// Rasterizes pages with a fresh [`RenderSession`] per render.
#[derive(Debug, Clone, Default)]
pub struct PageRenderer {
    options: RenderOptions,
    config: InterpreterConfig,
}

impl PageRenderer {
    /// Create a new page renderer with the given options.
    pub fn new(options: RenderOptions) -> Self {
        Self {
            options,
            config: InterpreterConfig::default(),
        }
    }

    /// Use `config` for the interpreter sessions.
    pub fn with_config(mut self, config: InterpreterConfig) -> Self {
        self.config = config;
        self
    }

    /// Render `page` (a page dictionary or a reference to one).
    pub fn render_page(&self, doc: &dyn ObjectResolver, page: &Object) -> Result<RenderedImage> {
        let mut session = RenderSession::new(doc, self.config);
        let page = doc.resolve_reference(page);
        let media_box = session.media_box(&page);
        let (width, height) = self.options.pixel_size(media_box.width, media_box.height);
        log::debug!("Rendering page {:?} at {}x{} px", media_box, width, height);

        let mut surface = SkiaSurface::new(width, height, self.options.background)?;
        let dst = Rect::new(0.0, 0.0, width as f32, height as f32);
        let result = session.render_page(&page, &dst, &mut surface)?;
        if result != PdfResult::Ok {
            log::debug!("Page rendered with result {}", result.name());
        }
        self.finish(session, surface)
    }

    /// Render a decoded content stream onto a `width` x `height` point page.
    ///
    /// Content coordinates are y-up from the bottom-left corner, as on a page.
    pub fn render_content(
        &self,
        doc: &dyn ObjectResolver,
        content: &[u8],
        resources: Option<Arc<Dictionary>>,
        width: f32,
        height: f32,
    ) -> Result<RenderedImage> {
        let mut page = Dictionary::new();
        page.insert("Type".to_string(), Object::name("Page"));
        page.insert(
            "MediaBox".to_string(),
            Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(width as f64),
                Object::Real(height as f64),
            ]),
        );
        if let Some(resources) = resources {
            page.insert("Resources".to_string(), Object::Dictionary(resources));
        }
        page.insert("Contents".to_string(), Object::stream(Dictionary::new(), content.to_vec()));
        self.render_page(doc, &Object::Dictionary(Arc::new(page)))
    }

    fn finish(&self, session: RenderSession<'_>, surface: SkiaSurface) -> Result<RenderedImage> {
        let stats = session.stats().clone();
        if self.config.report_statistics {
            log::info!("Operator statistics:\n{}", stats.report());
        }
        Ok(RenderedImage {
            data: surface.encode_png()?,
            width: surface.width(),
            height: surface.height(),
            stats,
        })
    }
}
