//! RunLengthDecode: a length byte below 128 copies that many plus one bytes,
//! above 128 repeats the next byte 257 minus length times, 128 ends the data.

use crate::decoders::StreamDecoder;
use crate::error::{Error, Result};

/// RunLengthDecode filter.
pub struct RunLengthDecoder;

impl StreamDecoder for RunLengthDecoder {
    fn decode(&self, input: &[u8]) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        let mut rest = input;

        while let Some((&length, tail)) = rest.split_first() {
            rest = tail;
            match length {
                128 => break,
                0..=127 => {
                    let count = length as usize + 1;
                    if rest.len() < count {
                        return Err(Error::Decode(format!(
                            "RunLengthDecode: literal run of {} bytes, {} available",
                            count,
                            rest.len()
                        )));
                    }
                    output.extend_from_slice(&rest[..count]);
                    rest = &rest[count..];
                },
                _ => {
                    let (&byte, tail) = rest.split_first().ok_or_else(|| {
                        Error::Decode("RunLengthDecode: missing repeated byte".to_string())
                    })?;
                    output.resize(output.len() + 257 - length as usize, byte);
                    rest = tail;
                },
            }
        }

        Ok(output)
    }

    fn name(&self) -> &str {
        "RunLengthDecode"
    }
}
