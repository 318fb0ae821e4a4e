//! Rasterization of interpreted pages.
//!
//! [`SkiaSurface`] implements [`DrawingSurface`](crate::surface::DrawingSurface)
//! on a `tiny-skia` pixmap; [`PageRenderer`] drives a
//! [`RenderSession`](crate::interp::RenderSession) into one and encodes PNG.
//!
//! ```ignore
//! use pdf_interp::rendering::PageRenderer;
//! use pdf_interp::{MemoryDocument, RenderOptions};
//!
//! let doc = MemoryDocument::new();
//! let image = PageRenderer::new(RenderOptions::default().with_dpi(150))
//!     .render_content(&doc, b"0 0 1 rg 10 10 100 100 re f", None, 612.0, 792.0)?;
//! image.save("page.png")?;
//! ```
//!
//! Text runs reach the surface but are not rasterized.

mod page_renderer;
mod path_rasterizer;
mod skia_surface;

pub use page_renderer::{PageRenderer, RenderedImage};
pub use path_rasterizer::PathRasterizer;
pub use skia_surface::SkiaSurface;
