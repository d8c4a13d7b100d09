//! zlib compression applied before encryption.
//!
//! Level 6 with a zlib header, the same stream Python's `zlib.compress`
//! produces, so existing containers keep decrypting.

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::{Read, Write};

use dmalock_common::{Error, Result};

/// Compression level used for container payloads.
pub const COMPRESSION_LEVEL: u32 = 6;

/// Compress a plaintext payload.
pub fn compress(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(
        Vec::with_capacity(data.len() / 2 + 64),
        Compression::new(COMPRESSION_LEVEL),
    );
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

/// Decompress an authenticated payload.
///
/// A payload that authenticates but does not inflate was written by a
/// broken producer, so it is reported as a malformed container.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(data.len() * 2);
    ZlibDecoder::new(data)
        .read_to_end(&mut out)
        .map_err(|e| Error::MalformedContainer(format!("Payload failed to decompress: {}", e)))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compress_roundtrip() {
        let data = b"abcabcabcabcabcabcabcabcabcabcabcabc".repeat(100);
        let packed = compress(&data).unwrap();

        assert!(packed.len() < data.len());
        assert_eq!(decompress(&packed).unwrap(), data);
    }

    #[test]
    fn test_zlib_header() {
        // 0x78 0x9C: deflate, 32K window, default level bucket
        let packed = compress(b"header").unwrap();
        assert_eq!(&packed[..2], &[0x78, 0x9C]);
    }

    #[test]
    fn test_garbage_is_malformed() {
        assert!(matches!(
            decompress(b"definitely not zlib"),
            Err(Error::MalformedContainer(_))
        ));
    }
}
