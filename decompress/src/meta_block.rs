//! Meta-block driver (C9, §4.10): parses the one-time stream header,
//! then per meta-block parses its own header, builds the component
//! state for that block, and runs the main decode loop that
//! interleaves Huffman reads, block-type switching, and back-reference
//! copies into the ring buffer.

use alloc::vec::Vec;

use log::trace;

use crate::bit_reader::BitReader;
use crate::block_switch::BlockSwitcher;
use crate::code_length::read_code_lengths;
use crate::command::read_command;
use crate::context_map::read_context_map;
use crate::distance::{read_distance, DistanceParams, DistanceRing};
use crate::error::DecompressError;
use crate::huffman::PrefixTable;
use crate::ring_buffer::RingBuffer;
use crate::tables::{distance_context, literal_context};
use crate::{InputSource, OutputSink};

/// Outcome of a successful [`crate::decompress`] call: the negotiated
/// window size plus how many bytes were written, surfaced because a
/// streaming caller has no other way to learn them (SPEC_FULL.md §4).
pub struct StreamInfo {
    bytes_written: u64,
    window_bits: u32,
}

impl StreamInfo {
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    pub fn window_bits(&self) -> u32 {
        self.window_bits
    }

    pub fn max_backward_distance(&self) -> u32 {
        (1u32 << self.window_bits) - 16
    }
}

fn read_tree_group(
    br: &mut BitReader,
    alphabet_size: usize,
    count: u32,
) -> Result<Vec<PrefixTable>, DecompressError> {
    let mut group = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let lengths = read_code_lengths(br, alphabet_size)?;
        group.push(PrefixTable::build(&lengths)?);
    }
    Ok(group)
}

/// Runs a full stream decode: one-time header, then meta-blocks until
/// the stream's final block is consumed.
pub fn decode_stream(source: &mut dyn InputSource, sink: &mut dyn OutputSink) -> Result<StreamInfo, DecompressError> {
    let mut br = BitReader::new(source);

    let size_bytes = br.read(3)?;
    let hint = if size_bytes == 0 {
        None
    } else {
        let mut value: u64 = 0;
        for i in 0..size_bytes {
            value |= (br.read(8)? as u64) << (8 * i);
        }
        Some(value)
    };

    let needs_extra_window_bit = match hint {
        None => true,
        Some(h) => {
            let top_bit_index = if h == 0 { 0 } else { 63 - h.leading_zeros() };
            top_bit_index > 16
        }
    };
    let window_bits = if needs_extra_window_bit {
        if br.read_bit()? {
            17 + br.read(3)?
        } else {
            16
        }
    } else {
        16
    };
    trace!("stream header: hint={hint:?} window_bits={window_bits}");

    let mut ring = RingBuffer::new(window_bits);
    let mut dist_ring = DistanceRing::new();
    let mut prev1: u8 = 0;
    let mut prev2: u8 = 0;

    loop {
        let input_end = br.read_bit()?;

        let meta_block_len: u64 = if input_end {
            match hint {
                Some(h) => h.checked_sub(ring.pos()).ok_or(DecompressError::MalformedHeader)?,
                None => 0,
            }
        } else if let Some(_h) = hint {
            let input_size_bits = size_bytes * 8;
            let mut raw: u64 = 0;
            let mut read_bits = 0u32;
            while read_bits < input_size_bits {
                let chunk_bits = (input_size_bits - read_bits).min(8);
                raw |= (br.read(chunk_bits)? as u64) << read_bits;
                read_bits += chunk_bits;
            }
            raw + 1
        } else {
            let nibbles = br.read(3)?;
            let total_bits = 4 * nibbles;
            let mut raw: u64 = 0;
            let mut read_bits = 0u32;
            while read_bits < total_bits {
                let chunk_bits = (total_bits - read_bits).min(8);
                raw |= (br.read(chunk_bits)? as u64) << read_bits;
                read_bits += chunk_bits;
            }
            raw + 1
        };

        if input_end && hint.is_none() {
            // Metadata-only terminal block: nothing further to read.
            break;
        }

        trace!("meta-block: len={meta_block_len} pos={}", ring.pos());
        let meta_block_end = ring.pos() + meta_block_len;

        let mut switch_l = BlockSwitcher::read(&mut br, meta_block_len as u32)?;
        let mut switch_c = BlockSwitcher::read(&mut br, meta_block_len as u32)?;
        let mut switch_d = BlockSwitcher::read(&mut br, meta_block_len as u32)?;

        let postfix_bits = br.read(2)?;
        let num_direct = 16 + (br.read(4)? << postfix_bits);
        let num_distance_codes = num_direct + (48 << postfix_bits);
        let dist_params = DistanceParams { num_direct, postfix_bits };

        let num_literal_block_types = switch_l.num_block_types();
        let mut context_modes = Vec::with_capacity(num_literal_block_types as usize);
        for _ in 0..num_literal_block_types {
            context_modes.push(br.read(2)? as u8);
        }

        let literal_context_map = read_context_map(&mut br, (num_literal_block_types as usize) << 6)?;
        let num_distance_block_types = switch_d.num_block_types();
        let distance_context_map = read_context_map(&mut br, (num_distance_block_types as usize) << 2)?;

        let literal_group = read_tree_group(&mut br, 256, literal_context_map.num_htrees)?;
        let command_group = read_tree_group(&mut br, 704, switch_c.num_block_types())?;
        let distance_group = read_tree_group(&mut br, num_distance_codes as usize, distance_context_map.num_htrees)?;

        let max_backward = ring_max_backward(window_bits);

        while ring.pos() < meta_block_end {
            switch_c.maybe_switch(&mut br)?;
            let command_table =
                command_group.get(switch_c.current_type() as usize).ok_or(DecompressError::MalformedHeader)?;
            let command = read_command(&mut br, command_table)?;
            switch_c.decrement();

            for _ in 0..command.insert_len {
                if ring.pos() >= meta_block_end {
                    return Err(DecompressError::MetaBlockOverrun);
                }
                switch_l.maybe_switch(&mut br)?;
                let block_type = switch_l.current_type() as usize;
                let mode = *context_modes.get(block_type).ok_or(DecompressError::MalformedHeader)?;
                let context = literal_context(mode, prev1, prev2);
                let htree = *literal_context_map
                    .map
                    .get((block_type << 6) + context)
                    .ok_or(DecompressError::MalformedHeader)? as usize;
                let literal_table = literal_group.get(htree).ok_or(DecompressError::MalformedHeader)?;
                let byte = literal_table.read_symbol(&mut br)? as u8;
                ring.emit_literal(byte, sink)?;
                prev2 = prev1;
                prev1 = byte;
                switch_l.decrement();
            }

            if ring.pos() == meta_block_end {
                break;
            }

            let distance = if command.has_explicit_distance {
                switch_d.maybe_switch(&mut br)?;
                let dctx = distance_context(command.copy_len);
                let block_type = switch_d.current_type() as usize;
                let htree = *distance_context_map
                    .map
                    .get((block_type << 2) + dctx)
                    .ok_or(DecompressError::MalformedHeader)? as usize;
                switch_d.decrement();
                let distance_table = distance_group.get(htree).ok_or(DecompressError::MalformedHeader)?;
                read_distance(&mut br, distance_table, &mut dist_ring, &dist_params)?
            } else {
                dist_ring.most_recent()
            };

            if distance == 0 || distance as u64 > ring.pos().min(max_backward as u64) {
                trace!("rejecting distance {distance} at pos {}", ring.pos());
                return Err(DecompressError::InvalidDistance);
            }
            if ring.pos() + command.copy_len as u64 > meta_block_end {
                return Err(DecompressError::MetaBlockOverrun);
            }

            ring.copy_back_reference(distance, command.copy_len, sink)?;
            prev1 = ring.byte_at(ring.pos() - 1);
            prev2 = if ring.pos() >= 2 { ring.byte_at(ring.pos() - 2) } else { 0 };
        }

        if input_end {
            break;
        }
    }

    ring.flush_final(sink)?;
    Ok(StreamInfo { bytes_written: ring.pos(), window_bits })
}

fn ring_max_backward(window_bits: u32) -> u32 {
    (1u32 << window_bits) - 16
}

#[cfg(test)]
mod tests {
    use super::*;

    struct VecSink(Vec<u8>);
    impl OutputSink for VecSink {
        fn write(&mut self, buf: &[u8]) -> Result<usize, DecompressError> {
            self.0.extend_from_slice(buf);
            Ok(buf.len())
        }
    }

    #[test]
    fn metadata_only_stream_with_no_size_hint_decodes_to_nothing() {
        // size_bytes=0 (3 zero bits), then input_end=1.
        let byte = 0b0000_1000u8; // bit0..2 = 000 (size_bytes=0), bit3 = 1 (input_end)
        let mut src: &[u8] = &[byte];
        let mut sink = VecSink(Vec::new());
        let info = decode_stream(&mut src, &mut sink).unwrap();
        assert_eq!(info.bytes_written(), 0);
        assert!(sink.0.is_empty());
    }
}
