//! Base64 encoding and fixed-width splitting of blob payloads.
//!
//! Standard padded base64 expands 3 input bytes into 4 output characters, so
//! an `n`-byte payload encodes to `4 * ceil(n / 3)` characters. The encoded
//! text is pure ASCII, which lets chunk boundaries be taken on byte offsets.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::{BlobError, BlobResult};

/// Encoded payload and its ordered slices
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedBlob {
    pub encoded_text: String,
    pub chunks: Vec<String>,
}

impl EncodedBlob {
    pub fn total_chunks(&self) -> usize {
        self.chunks.len()
    }
}

/// Length of the encoded form of `raw_len` bytes
pub(crate) fn encoded_len(raw_len: usize) -> usize {
    raw_len.div_ceil(3) * 4
}

/// Number of chunks `encoded_len` characters split into.
/// Callers check `chunk_size_chars > 0` first.
pub(crate) fn chunk_count(encoded_len: usize, chunk_size_chars: usize) -> usize {
    encoded_len.div_ceil(chunk_size_chars)
}

/// Encode `raw` and split it into slices of exactly `chunk_size_chars`,
/// the last slice holding the remainder.
pub fn encode(raw: &[u8], chunk_size_chars: usize) -> BlobResult<EncodedBlob> {
    if chunk_size_chars == 0 {
        return Err(BlobError::invalid("chunk size must be a positive number of characters"));
    }

    let mut encoded_text = String::with_capacity(encoded_len(raw.len()));
    STANDARD.encode_string(raw, &mut encoded_text);
    let chunks = split(&encoded_text, chunk_size_chars);

    Ok(EncodedBlob {
        encoded_text,
        chunks,
    })
}

/// Decode reassembled text back to raw bytes
pub fn decode(encoded_text: &str) -> BlobResult<Vec<u8>> {
    Ok(STANDARD.decode(encoded_text)?)
}

fn split(encoded_text: &str, chunk_size_chars: usize) -> Vec<String> {
    let mut chunks = Vec::with_capacity(chunk_count(encoded_text.len(), chunk_size_chars));
    chunks.extend(
        encoded_text
            .as_bytes()
            .chunks(chunk_size_chars)
            .map(|slice| String::from_utf8_lossy(slice).into_owned()),
    );
    chunks
}
