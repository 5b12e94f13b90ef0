//! Per-stream block-type/length tracking (§4.5): a 2-slot recency ring
//! of block types plus the current remaining run length, shared by the
//! literal, command, and distance streams.

use crate::bit_reader::BitReader;
use crate::code_length::read_code_lengths;
use crate::error::DecompressError;
use crate::huffman::PrefixTable;
use crate::tables::BLOCK_LENGTH_PREFIX;

pub struct BlockSwitcher {
    num_block_types: u32,
    codes: Option<(PrefixTable, PrefixTable)>,
    current_type: u32,
    remaining: u32,
    ring: [u32; 2],
    cursor: usize,
}

impl BlockSwitcher {
    /// Reads the per-stream header fields of §4.10 step 2 and builds
    /// the switcher: either a single fixed-length block spanning the
    /// whole meta-block, or a pair of prefix codes plus an initial
    /// block length.
    pub fn read(br: &mut BitReader, meta_block_len: u32) -> Result<Self, DecompressError> {
        if !br.read_bit()? {
            return Ok(Self {
                num_block_types: 1,
                codes: None,
                current_type: 0,
                remaining: meta_block_len,
                ring: [0, 1],
                cursor: 0,
            });
        }

        let num_block_types = br.read(8)? + 1;
        let type_lengths = read_code_lengths(br, num_block_types as usize + 2)?;
        let type_table = PrefixTable::build(&type_lengths)?;
        let length_lengths = read_code_lengths(br, 26)?;
        let length_table = PrefixTable::build(&length_lengths)?;

        let mut switcher = Self {
            num_block_types,
            codes: Some((type_table, length_table)),
            current_type: 0,
            remaining: 0,
            ring: [0, 1],
            cursor: 0,
        };
        switcher.remaining = switcher.read_block_length(br)?;
        Ok(switcher)
    }

    pub fn current_type(&self) -> u32 {
        self.current_type
    }

    pub fn num_block_types(&self) -> u32 {
        self.num_block_types
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn decrement(&mut self) {
        self.remaining -= 1;
    }

    /// Switches block type if the current run has been exhausted
    /// (§4.5's "when the stream's remaining length hits zero").
    pub fn maybe_switch(&mut self, br: &mut BitReader) -> Result<(), DecompressError> {
        if self.remaining != 0 {
            return Ok(());
        }
        let (type_table, _) = self.codes.as_ref().ok_or(DecompressError::MalformedHeader)?;
        let t = type_table.read_symbol(br)? as u32;
        let new_type = if t == 0 {
            self.ring[self.cursor & 1]
        } else if t == 1 {
            (self.ring[self.cursor.wrapping_sub(1) & 1] + 1) % self.num_block_types
        } else {
            t - 2
        };
        if new_type >= self.num_block_types {
            return Err(DecompressError::MalformedHeader);
        }
        self.ring[self.cursor & 1] = new_type;
        self.cursor += 1;
        self.current_type = new_type;
        self.remaining = self.read_block_length(br)?;
        Ok(())
    }

    fn read_block_length(&self, br: &mut BitReader) -> Result<u32, DecompressError> {
        let (_, length_table) = self.codes.as_ref().ok_or(DecompressError::MalformedHeader)?;
        let symbol = length_table.read_symbol(br)? as usize;
        let &(offset, nbits) = BLOCK_LENGTH_PREFIX.get(symbol).ok_or(DecompressError::MalformedHeader)?;
        Ok(offset + br.read(nbits)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_block_type_spans_the_whole_meta_block() {
        let mut src: &[u8] = &[0b0000_0000];
        let mut br = BitReader::new(&mut src);
        let switcher = BlockSwitcher::read(&mut br, 500).unwrap();
        assert_eq!(switcher.current_type(), 0);
        assert_eq!(switcher.remaining(), 500);
    }
}
