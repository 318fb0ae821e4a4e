//! Stream filters needed to read content, form, pattern and image streams.
//!
//! - FlateDecode (zlib/deflate), the common case
//! - ASCIIHexDecode
//! - ASCII85Decode
//! - RunLengthDecode
//!
//! `DCTDecode` is not a byte filter here; the image path hands JPEG data to
//! the `image` crate directly (see [`crate::image_decode`]).

use crate::error::{Error, Result};

mod ascii85;
mod ascii_hex;
mod flate;
mod runlength;

pub use ascii85::Ascii85Decoder;
pub use ascii_hex::AsciiHexDecoder;
pub use flate::FlateDecoder;
pub use runlength::RunLengthDecoder;

/// One filter stage in a stream's filter pipeline.
pub trait StreamDecoder {
    /// Decode `input`, returning the filtered bytes.
    fn decode(&self, input: &[u8]) -> Result<Vec<u8>>;

    /// Filter name as written in a stream's `/Filter` entry.
    fn name(&self) -> &str;
}

/// Look up the decoder for a filter name, accepting inline-image abbreviations.
pub fn decoder_for(filter: &str) -> Option<Box<dyn StreamDecoder>> {
    match filter {
        "FlateDecode" | "Fl" => Some(Box::new(FlateDecoder)),
        "ASCIIHexDecode" | "AHx" => Some(Box::new(AsciiHexDecoder)),
        "ASCII85Decode" | "A85" => Some(Box::new(Ascii85Decoder)),
        "RunLengthDecode" | "RL" => Some(Box::new(RunLengthDecoder)),
        _ => None,
    }
}

/// Run `data` through `filters` in order.
///
/// `max_size` caps the size of every intermediate result; 0 disables the cap.
pub fn decode_stream(data: &[u8], filters: &[String], max_size: usize) -> Result<Vec<u8>> {
    let mut current = data.to_vec();

    for filter in filters {
        let decoder =
            decoder_for(filter).ok_or_else(|| Error::UnsupportedFilter(filter.clone()))?;
        current = decoder.decode(&current)?;
        log::trace!("{}: {} bytes", decoder.name(), current.len());

        if max_size > 0 && current.len() > max_size {
            return Err(Error::Decode(format!(
                "{} output of {} bytes exceeds limit of {} bytes",
                decoder.name(),
                current.len(),
                max_size
            )));
        }
    }

    Ok(current)
}
