//! FlateDecode via flate2.
//!
//! Corrupt streams are common; a zlib failure falls back to raw deflate, and
//! any bytes recovered before an error are kept.

use crate::decoders::StreamDecoder;
use crate::error::{Error, Result};
use flate2::read::{DeflateDecoder, ZlibDecoder};
use std::io::Read;

/// FlateDecode filter.
pub struct FlateDecoder;

impl StreamDecoder for FlateDecoder {
    fn decode(&self, input: &[u8]) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        let zlib_err = match ZlibDecoder::new(input).read_to_end(&mut output) {
            Ok(_) => return Ok(output),
            Err(_) if !output.is_empty() => {
                log::warn!("FlateDecode: kept {} bytes read before corruption", output.len());
                return Ok(output);
            },
            Err(e) => e,
        };

        log::debug!("FlateDecode: zlib failed ({}), trying raw deflate", zlib_err);
        output.clear();
        match DeflateDecoder::new(input).read_to_end(&mut output) {
            Ok(_) => Ok(output),
            Err(_) if !output.is_empty() => Ok(output),
            Err(e) => Err(Error::Decode(format!("FlateDecode: {}", e))),
        }
    }

    fn name(&self) -> &str {
        "FlateDecode"
    }
}
