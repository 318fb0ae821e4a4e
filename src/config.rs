//! Interpreter and rendering configuration.

use crate::content::Color;

/// Options controlling how content streams are interpreted.
///
/// # Example
///
/// ```
/// use pdf_interp::config::InterpreterConfig;
///
/// // Defaults: lenient, soft masks honored
/// let config = InterpreterConfig::default();
/// assert_eq!(config.max_operand_stack, 4096);
///
/// // Custom configuration
/// let custom = InterpreterConfig::new()
///     .with_statistics(true)
///     .with_tiling_limit(100);
/// assert_eq!(custom.tiling_limit, 100);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InterpreterConfig {
    /// Print the per-operator statistics table after rendering (CLI)
    pub report_statistics: bool,

    /// Maximum operands kept on the operand stack
    ///
    /// Pushing beyond this drops the oldest operand. Garbage streams full of
    /// numbers without operators would otherwise grow the stack unbounded.
    pub max_operand_stack: usize,

    /// Apply image soft masks (`/SMask`) when drawing images
    pub honor_soft_masks: bool,

    /// Maximum pattern cells drawn by a single tiled fill
    pub tiling_limit: usize,

    /// Maximum decoded size of one content or image stream in bytes (0 = unlimited)
    pub max_stream_size: usize,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self::lenient()
    }
}

impl InterpreterConfig {
    /// Create a configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Tight limits for untrusted input.
    pub fn strict() -> Self {
        Self {
            report_statistics: false,
            max_operand_stack: 512,
            honor_soft_masks: true,
            tiling_limit: 1_000,
            max_stream_size: 16 * 1024 * 1024, // 16 MB
        }
    }

    /// Generous limits for damaged but legitimate files.
    pub fn lenient() -> Self {
        Self {
            report_statistics: false,
            max_operand_stack: 4096,
            honor_soft_masks: true,
            tiling_limit: 10_000,
            max_stream_size: 100 * 1024 * 1024, // 100 MB
        }
    }

    /// Enable the statistics report.
    pub fn with_statistics(mut self, enable: bool) -> Self {
        self.report_statistics = enable;
        self
    }

    /// Set the operand stack bound.
    pub fn with_max_operand_stack(mut self, max: usize) -> Self {
        self.max_operand_stack = max;
        self
    }

    /// Enable or disable image soft masks.
    pub fn with_soft_masks(mut self, enable: bool) -> Self {
        self.honor_soft_masks = enable;
        self
    }

    /// Set the cell cap for tiled pattern fills.
    pub fn with_tiling_limit(mut self, limit: usize) -> Self {
        self.tiling_limit = limit;
        self
    }

    /// Set the decoded stream size limit.
    pub fn with_max_stream_size(mut self, max: usize) -> Self {
        self.max_stream_size = max;
        self
    }
}

/// Options for rasterizing a page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderOptions {
    /// Resolution in dots per inch (72 = one pixel per point)
    pub dpi: u32,
    /// Color the page is cleared to before drawing
    pub background: Color,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            dpi: 72,
            background: Color::WHITE,
        }
    }
}

impl RenderOptions {
    /// Set the DPI.
    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.dpi = dpi;
        self
    }

    /// Set the background color.
    pub fn with_background(mut self, color: Color) -> Self {
        self.background = color;
        self
    }

    /// Device pixels per PDF point.
    pub fn scale(&self) -> f32 {
        self.dpi as f32 / 72.0
    }

    /// Pixel size of a page of `width` x `height` points, at least 1x1.
    pub fn pixel_size(&self, width: f32, height: f32) -> (u32, u32) {
        let s = self.scale();
        (
            ((width.abs() * s).round() as u32).max(1),
            ((height.abs() * s).round() as u32).max(1),
        )
    }
}
