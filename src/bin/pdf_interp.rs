//! Interpret a decoded content stream and report operator results.
//!
//! Usage:
//!   cargo run --bin pdf_interp -- content.txt
//!   cargo run --bin pdf_interp -- content.txt --width 595 --height 842 --stats
//!   cargo run --features rendering --bin pdf_interp -- content.txt --png out.png
//!
//! Set `RUST_LOG=debug` to see skipped operators.

use pdf_interp::{
    Dictionary, InterpreterConfig, MemoryDocument, Object, PdfResult, RecordingSurface,
    RenderSession,
};
use std::path::PathBuf;
use std::sync::Arc;

struct Config {
    content: PathBuf,
    width: f32,
    height: f32,
    png: Option<PathBuf>,
    stats: bool,
}

impl Config {
    fn from_args() -> Option<Self> {
        let args: Vec<String> = std::env::args().collect();
        let mut content = None;
        let mut width = 612.0;
        let mut height = 792.0;
        let mut png = None;
        let mut stats = false;

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--width" => {
                    i += 1;
                    width = args.get(i)?.parse().ok()?;
                },
                "--height" => {
                    i += 1;
                    height = args.get(i)?.parse().ok()?;
                },
                "--png" => {
                    i += 1;
                    png = Some(PathBuf::from(args.get(i)?));
                },
                "--stats" => {
                    stats = true;
                },
                other if !other.starts_with("--") => {
                    content = Some(PathBuf::from(other));
                },
                other => {
                    eprintln!("Unknown option {}", other);
                    return None;
                },
            }
            i += 1;
        }

        Some(Self {
            content: content?,
            width,
            height,
            png,
            stats,
        })
    }
}

fn page(content: Vec<u8>, width: f32, height: f32) -> Object {
    let mut page = Dictionary::new();
    page.insert(
        "MediaBox".to_string(),
        Object::Array(vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Real(width as f64),
            Object::Real(height as f64),
        ]),
    );
    page.insert("Contents".to_string(), Object::stream(Dictionary::new(), content));
    Object::Dictionary(Arc::new(page))
}

#[cfg(feature = "rendering")]
fn render_png(
    doc: &MemoryDocument,
    page: &Object,
    config: &Config,
    out: &std::path::Path,
) -> pdf_interp::Result<pdf_interp::RenderStats> {
    use pdf_interp::rendering::PageRenderer;
    use pdf_interp::RenderOptions;

    let interp_config = InterpreterConfig::default().with_statistics(config.stats);
    let image = PageRenderer::new(RenderOptions::default())
        .with_config(interp_config)
        .render_page(doc, page)?;
    image.save(out)?;
    println!("Wrote {}x{} PNG to {}", image.width, image.height, out.display());
    Ok(image.stats)
}

#[cfg(not(feature = "rendering"))]
fn render_png(
    _doc: &MemoryDocument,
    _page: &Object,
    _config: &Config,
    _out: &std::path::Path,
) -> pdf_interp::Result<pdf_interp::RenderStats> {
    Err(pdf_interp::Error::Image(
        "PNG output needs the `rendering` feature".to_string(),
    ))
}

fn main() {
    env_logger::init();

    let Some(config) = Config::from_args() else {
        eprintln!("Usage: pdf_interp <content-file> [--width W] [--height H] [--png out.png] [--stats]");
        std::process::exit(2);
    };

    let content = match std::fs::read(&config.content) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Error: cannot read {}: {}", config.content.display(), e);
            std::process::exit(1);
        },
    };

    let doc = MemoryDocument::new();
    let page = page(content, config.width, config.height);

    let stats = if let Some(out) = &config.png {
        match render_png(&doc, &page, &config, out) {
            Ok(stats) => stats,
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            },
        }
    } else {
        let mut session = RenderSession::new(&doc, InterpreterConfig::default());
        let mut surface = RecordingSurface::new();
        let dst = pdf_interp::geometry::Rect::new(0.0, 0.0, config.width, config.height);
        match session.render_page(&page, &dst, &mut surface) {
            Ok(result) => println!("Page result: {}", result.name()),
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            },
        }
        println!("Surface calls: {}", surface.calls().len());
        session.stats().clone()
    };

    println!("Operators OK: {}", stats.total(PdfResult::Ok));
    if config.stats {
        println!("{}", "=".repeat(40));
        print!("{}", stats.report());
    }
}
