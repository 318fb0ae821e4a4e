//! Image XObject and inline image decoding.
//!
//! Supported sample layouts:
//! - `DeviceRGB` at 8 bits per component
//! - `DeviceGray` at 8 bits per component, or as an inverted alpha mask
//! - `[/Indexed /DeviceRGB hival lookup]` with up to 256 entries
//! - `DCTDecode` data of any color space, via the `image` crate
//!
//! Anything else decodes to an empty bitmap.

use crate::decoders::decode_stream;
use crate::document::ObjectResolver;
use crate::error::{Error, Result};
use crate::object::Object;
use crate::surface::{Bitmap, BitmapFormat};

const MAX_PALETTE_ENTRIES: usize = 256;

/// Decode the samples of `image` (an image stream, references resolved).
///
/// With `transparency_mask` set, gray samples become an alpha channel where
/// white is transparent.
pub fn decode_image(
    doc: &dyn ObjectResolver,
    image: &Object,
    transparency_mask: bool,
    max_size: usize,
) -> Result<Bitmap> {
    let Some(raw) = image.stream_data() else {
        return Err(Error::wrong_type("Stream", image.type_name()));
    };

    let filters = image.filters();
    if let Some(pos) = filters.iter().position(|f| f == "DCTDecode") {
        let jpeg = decode_stream(raw, &filters[..pos], max_size)?;
        return decode_jpeg(&jpeg, transparency_mask);
    }

    let data = decode_stream(raw, &filters, max_size)?;
    if data.is_empty() {
        return Err(Error::Image("image stream is empty".to_string()));
    }

    let dimension = |key: &str| {
        doc.get_resolved(image, key)
            .and_then(|v| v.as_integer())
            .filter(|&v| v > 0)
            .map(|v| v as usize)
    };
    let (Some(width), Some(height)) = (dimension("Width"), dimension("Height")) else {
        return Err(Error::Image("image has no usable Width/Height".to_string()));
    };
    let bpc = doc
        .get_resolved(image, "BitsPerComponent")
        .and_then(|v| v.as_integer())
        .unwrap_or(8);
    match color_space(doc, image)? {
        Space::Rgb if bpc == 8 => Layout::fit(width, height, 3, &data)?.rgb(&data),
        Space::Gray if bpc == 8 => Layout::fit(width, height, 1, &data)?.gray(&data, transparency_mask),
        Space::Indexed(palette) => Layout::fit(width, height, 1, &data)?.indexed(&data, &palette),
        other => {
            log::debug!("Image color space {:?} at {} bpc not supported", other, bpc);
            Ok(Bitmap::empty())
        },
    }
}

#[derive(Debug)]
enum Space {
    Rgb,
    Gray,
    /// Palette as RGB triples
    Indexed(Vec<[u8; 3]>),
    Other(String),
}

fn color_space(doc: &dyn ObjectResolver, image: &Object) -> Result<Space> {
    let Some(cs) = doc.get_resolved(image, "ColorSpace") else {
        return Ok(Space::Rgb);
    };
    if let Some(name) = cs.as_name() {
        return Ok(match name {
            "DeviceRGB" | "RGB" => Space::Rgb,
            "DeviceGray" | "Gray" | "G" => Space::Gray,
            other => Space::Other(other.to_string()),
        });
    }
    let Some(parts) = cs.as_array() else {
        return Ok(Space::Other(cs.type_name().to_string()));
    };
    let parts: Vec<Object> = parts.iter().map(|p| doc.resolve_reference(p)).collect();
    match parts.as_slice() {
        [family, base, hival, lookup]
            if family.is_name_eq("Indexed")
                && (base.is_name_eq("DeviceRGB") || base.is_name_eq("RGB")) =>
        {
            let count = hival.as_integer().unwrap_or(-1) + 1;
            if count <= 0 || count as usize > MAX_PALETTE_ENTRIES {
                return Err(Error::Image(format!("palette with {} entries", count)));
            }
            let count = count as usize;
            let table = match lookup {
                Object::Stream { .. } => lookup.decode_stream_data(0)?,
                other => other.as_string().map(<[u8]>::to_vec).unwrap_or_default(),
            };
            if table.len() != count * 3 {
                return Err(Error::Image(format!(
                    "palette lookup has {} bytes, expected {}",
                    table.len(),
                    count * 3
                )));
            }
            Ok(Space::Indexed(table.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect()))
        },
        [family, ..] => Ok(Space::Other(family.as_name().unwrap_or("?").to_string())),
        [] => Ok(Space::Other(String::new())),
    }
}

/// Sample rows of an image whose dimensions fit its data.
struct Layout {
    width: usize,
    height: usize,
    bytes_per_line: usize,
    /// Sample bytes used from each line
    row_bytes: usize,
}

impl Layout {
    /// Check `width` x `height` samples of `bytes_per_pixel` against the
    /// decoded data before anything is allocated.
    fn fit(width: usize, height: usize, bytes_per_pixel: usize, data: &[u8]) -> Result<Self> {
        let too_large = || {
            Error::Image(format!(
                "image of {}x{} does not fit its {} data bytes",
                width,
                height,
                data.len()
            ))
        };
        let row_bytes = width.checked_mul(bytes_per_pixel).ok_or_else(too_large)?;
        let total = row_bytes.checked_mul(height).ok_or_else(too_large)?;
        if total > data.len() {
            return Err(too_large());
        }
        Ok(Self {
            width,
            height,
            bytes_per_line: data.len() / height,
            row_bytes,
        })
    }

    fn rows<'a>(&self, data: &'a [u8]) -> impl Iterator<Item = &'a [u8]> {
        let row_bytes = self.row_bytes;
        data.chunks(self.bytes_per_line)
            .take(self.height)
            .map(move |row| &row[..row_bytes])
    }

    fn bitmap(&self, format: BitmapFormat, pixels: Vec<u8>) -> Bitmap {
        Bitmap {
            width: self.width as u32,
            height: self.height as u32,
            format,
            pixels,
        }
    }

    fn rgb(&self, data: &[u8]) -> Result<Bitmap> {
        let mut pixels = Vec::with_capacity(self.width * self.height * 4);
        for row in self.rows(data) {
            for px in row.chunks_exact(3) {
                pixels.extend_from_slice(&[px[0], px[1], px[2], 0xff]);
            }
        }
        Ok(self.bitmap(BitmapFormat::Rgba8, pixels))
    }

    fn gray(&self, data: &[u8], transparency_mask: bool) -> Result<Bitmap> {
        let mut pixels = Vec::with_capacity(self.width * self.height);
        for row in self.rows(data) {
            if transparency_mask {
                pixels.extend(row.iter().map(|&v| 0xff - v));
            } else {
                pixels.extend_from_slice(row);
            }
        }
        let format = if transparency_mask {
            BitmapFormat::Alpha8
        } else {
            BitmapFormat::Gray8
        };
        Ok(self.bitmap(format, pixels))
    }

    fn indexed(&self, data: &[u8], palette: &[[u8; 3]]) -> Result<Bitmap> {
        let mut pixels = Vec::with_capacity(self.width * self.height * 4);
        for row in self.rows(data) {
            for &index in row {
                let [r, g, b] = palette.get(index as usize).copied().unwrap_or([0, 0, 0]);
                pixels.extend_from_slice(&[r, g, b, 0xff]);
            }
        }
        Ok(self.bitmap(BitmapFormat::Rgba8, pixels))
    }
}

fn decode_jpeg(data: &[u8], transparency_mask: bool) -> Result<Bitmap> {
    use image::GenericImageView;

    let img = image::load_from_memory_with_format(data, image::ImageFormat::Jpeg)
        .map_err(|e| Error::Image(e.to_string()))?;
    let (width, height) = img.dimensions();
    let bitmap = if transparency_mask {
        let pixels = img.to_luma8().into_raw().into_iter().map(|v| 0xff - v).collect();
        Bitmap {
            width,
            height,
            format: BitmapFormat::Alpha8,
            pixels,
        }
    } else {
        Bitmap {
            width,
            height,
            format: BitmapFormat::Rgba8,
            pixels: img.to_rgba8().into_raw(),
        }
    };
    Ok(bitmap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::MemoryDocument;
    use crate::object::Dictionary;

    fn image(entries: &[(&str, Object)], data: &[u8]) -> Object {
        let dict: Dictionary = entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        Object::stream(dict, data.to_vec())
    }

    fn sized(cs: Object, w: i64, h: i64) -> Vec<(&'static str, Object)> {
        vec![
            ("Width", Object::Integer(w)),
            ("Height", Object::Integer(h)),
            ("BitsPerComponent", Object::Integer(8)),
            ("ColorSpace", cs),
        ]
    }

    #[test]
    fn test_rgb_rows_with_padding() {
        let doc = MemoryDocument::new();
        // 1x2 image with one byte of row padding
        let img = image(&sized(Object::name("DeviceRGB"), 1, 2), &[1, 2, 3, 0, 4, 5, 6, 0]);
        let bitmap = decode_image(&doc, &img, false, 0).unwrap();
        assert_eq!(bitmap.format, BitmapFormat::Rgba8);
        assert_eq!(bitmap.pixels, vec![1, 2, 3, 255, 4, 5, 6, 255]);
    }

    #[test]
    fn test_gray_as_mask_is_inverted() {
        let doc = MemoryDocument::new();
        let img = image(&sized(Object::name("DeviceGray"), 2, 1), &[0, 200]);
        let gray = decode_image(&doc, &img, false, 0).unwrap();
        assert_eq!(gray.format, BitmapFormat::Gray8);
        assert_eq!(gray.pixels, vec![0, 200]);

        let mask = decode_image(&doc, &img, true, 0).unwrap();
        assert_eq!(mask.format, BitmapFormat::Alpha8);
        assert_eq!(mask.pixels, vec![255, 55]);
    }

    #[test]
    fn test_indexed_palette() {
        let doc = MemoryDocument::new();
        let cs = Object::Array(vec![
            Object::name("Indexed"),
            Object::name("DeviceRGB"),
            Object::Integer(1),
            Object::String(vec![0, 0, 0, 255, 0, 0]),
        ]);
        let img = image(&sized(cs, 2, 1), &[1, 0]);
        let bitmap = decode_image(&doc, &img, false, 0).unwrap();
        assert_eq!(bitmap.pixels, vec![255, 0, 0, 255, 0, 0, 0, 255]);
    }

    #[test]
    fn test_palette_size_mismatch() {
        let doc = MemoryDocument::new();
        let cs = Object::Array(vec![
            Object::name("Indexed"),
            Object::name("DeviceRGB"),
            Object::Integer(3),
            Object::String(vec![0; 6]),
        ]);
        let img = image(&sized(cs, 1, 1), &[0]);
        assert!(decode_image(&doc, &img, false, 0).is_err());
    }

    #[test]
    fn test_unsupported_space_is_empty() {
        let doc = MemoryDocument::new();
        let img = image(&sized(Object::name("DeviceCMYK"), 1, 1), &[0, 0, 0, 0]);
        assert!(decode_image(&doc, &img, false, 0).unwrap().is_empty());
    }

    #[test]
    fn test_missing_data() {
        let doc = MemoryDocument::new();
        let img = image(&sized(Object::name("DeviceRGB"), 1, 1), &[]);
        assert!(decode_image(&doc, &img, false, 0).is_err());
        let not_stream = Object::Integer(3);
        assert!(decode_image(&doc, &not_stream, false, 0).is_err());
    }

    #[test]
    fn test_truncated_rows() {
        let doc = MemoryDocument::new();
        let img = image(&sized(Object::name("DeviceRGB"), 4, 1), &[1, 2, 3]);
        assert!(decode_image(&doc, &img, false, 0).is_err());
    }

    #[test]
    fn test_oversized_dimensions_rejected() {
        let doc = MemoryDocument::new();
        let huge = image(&sized(Object::name("DeviceRGB"), 4_000_000_000, 4_000_000_000), &[255, 0, 0]);
        assert!(matches!(decode_image(&doc, &huge, false, 0), Err(Error::Image(_))));

        let overflowing = image(&sized(Object::name("DeviceGray"), i64::MAX, 2), &[0, 0]);
        assert!(matches!(decode_image(&doc, &overflowing, true, 0), Err(Error::Image(_))));

        let cs = Object::Array(vec![
            Object::name("Indexed"),
            Object::name("DeviceRGB"),
            Object::Integer(0),
            Object::String(vec![9, 9, 9]),
        ]);
        let tall = image(&sized(cs, 1, 1_000_000), &[0; 16]);
        assert!(matches!(decode_image(&doc, &tall, false, 0), Err(Error::Image(_))));
    }

    #[test]
    fn test_filtered_samples() {
        let doc = MemoryDocument::new();
        let mut entries = sized(Object::name("DeviceGray"), 2, 1);
        entries.push(("Filter", Object::name("ASCIIHexDecode")));
        let img = image(&entries, b"10ff>");
        assert_eq!(decode_image(&doc, &img, false, 0).unwrap().pixels, vec![0x10, 0xff]);
    }
}
