#![cfg_attr(not(test), no_std)]

//! Decoder for a LZ77-style compressed byte stream combined with
//! per-context-switched prefix (Huffman) codes and a context-modeled
//! literal coder (spec.md §1). The hard engineering lives in the
//! meta-block driver ([`meta_block`]); this module exposes the public
//! entry points and the two I/O capability traits callers implement.

extern crate alloc;

mod bit_reader;
mod block_switch;
mod code_length;
mod command;
mod context_map;
mod distance;
pub mod error;
mod huffman;
mod meta_block;
mod ring_buffer;
mod tables;

pub use error::DecompressError;
pub use meta_block::StreamInfo;

/// A source of encoded bytes, pulled on demand by the bit reader.
///
/// `read` returns the number of bytes actually placed into `buf`
/// (which may be less than `buf.len()`); a return of `0` signals
/// logical end-of-input and is not itself an error.
pub trait InputSource {
    fn read(&mut self, buf: &mut [u8]) -> usize;
}

/// A sink for decoded bytes, written to at ring-buffer wrap points and
/// once more at the end of the stream.
///
/// `write` is a write-all operation: implementations must either
/// accept the entire slice or fail.
pub trait OutputSink {
    fn write(&mut self, buf: &[u8]) -> Result<usize, DecompressError>;
}

impl InputSource for &[u8] {
    fn read(&mut self, buf: &mut [u8]) -> usize {
        let n = buf.len().min(self.len());
        buf[..n].copy_from_slice(&self[..n]);
        *self = &self[n..];
        n
    }
}

/// Fixed-capacity output sink backed by a caller-owned buffer, used by
/// [`decompress_buffer`]. Fails with [`DecompressError::SinkFailure`]
/// if the decoder ever tries to write past the end of `dst`.
struct SliceOutputSink<'a> {
    dst: &'a mut [u8],
    pos: usize,
}

impl OutputSink for SliceOutputSink<'_> {
    fn write(&mut self, buf: &[u8]) -> Result<usize, DecompressError> {
        let end = self.pos.checked_add(buf.len()).ok_or(DecompressError::SinkFailure)?;
        let dst = self.dst.get_mut(self.pos..end).ok_or(DecompressError::SinkFailure)?;
        dst.copy_from_slice(buf);
        self.pos = end;
        Ok(buf.len())
    }
}

/// Size probe (spec.md §6.1 item 1): reads just the 3-bit `size_bytes`
/// field and, if present, the little-endian size hint that follows it.
/// Consumes no further input and allocates nothing.
pub fn decoded_size_hint(encoded: &[u8]) -> Option<u64> {
    let mut src = encoded;
    let mut br = bit_reader::BitReader::new(&mut src);
    let size_bytes = br.read(3).ok()?;
    if size_bytes == 0 {
        return None;
    }
    let mut hint: u64 = 0;
    for i in 0..size_bytes {
        let byte = br.read(8).ok()? as u64;
        hint |= byte << (8 * i);
    }
    Some(hint)
}

/// Buffer-oriented entry point: decodes `src` into `dst` in full.
/// `dst` must be exactly the decoded size when the stream carries a
/// size hint (see spec.md §6.1's "Buffer-oriented variant"), mirroring
/// the size check the teacher's own entry point performs up front.
pub fn decompress_buffer(src: &[u8], dst: &mut [u8]) -> Result<usize, DecompressError> {
    if let Some(hint) = decoded_size_hint(src) {
        if hint != dst.len() as u64 {
            return Err(DecompressError::SizeMismatch);
        }
    }

    let mut input = src;
    let mut sink = SliceOutputSink { dst, pos: 0 };
    let info = decompress(&mut input, &mut sink)?;
    if info.bytes_written() as usize != dst.len() {
        return Err(DecompressError::SizeMismatch);
    }
    Ok(info.bytes_written() as usize)
}

/// Streaming entry point (spec.md §6.1 item 2): pulls encoded bytes
/// from `source` on demand and pushes decoded bytes to `sink`,
/// flushing at every ring-buffer wrap and once more at the end.
pub fn decompress(source: &mut dyn InputSource, sink: &mut dyn OutputSink) -> Result<StreamInfo, DecompressError> {
    meta_block::decode_stream(source, sink)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_hint_absent_when_size_bytes_is_zero() {
        // 0b000 in the low 3 bits (LSB-first) -> size_bytes = 0.
        assert_eq!(decoded_size_hint(&[0b0000_0000]), None);
    }

    #[test]
    fn size_hint_reads_little_endian_value() {
        // size_bytes = 1 (0b001), then one byte = 0x2A, read LSB-first
        // starting right after the 3-bit field.
        let hint_byte = 0x2Au8;
        let byte0 = 0b001u8 | ((hint_byte & 0x1F) << 3);
        let byte1 = hint_byte >> 5;
        assert_eq!(decoded_size_hint(&[byte0, byte1]), Some(0x2A));
    }
}
