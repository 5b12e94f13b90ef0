//! Canonical Huffman ("prefix code") table builder and decoder — the
//! `build_prefix_code` contract of spec §6.2, realized as a fixed-size
//! direct lookup table for short codes plus a binary-tree tail for
//! codes longer than the lookup depth.

use alloc::vec;
use alloc::vec::Vec;

use crate::bit_reader::BitReader;
use crate::error::DecompressError;

/// Number of bits used for the direct lookup table (`L` in spec §4.2).
pub const LOOKUP_BITS: u32 = 8;

/// Longest code length this format allows.
const MAX_CODE_LEN: usize = 15;

/// A decode table for one canonical Huffman code.
pub struct PrefixTable {
    num_symbols: u16,
    lengths: Vec<u8>,
    table: Vec<u16>,
    left: Vec<u16>,
    right: Vec<u16>,
    /// Set when the code has exactly one symbol with length 0 or 1:
    /// decoding always yields that symbol, consuming zero bits.
    single_symbol: Option<u16>,
}

impl PrefixTable {
    /// Builds a canonical Huffman table from a symbol -> code-length
    /// vector. Fails unless the lengths satisfy the Kraft equality (or
    /// are the single-symbol special case of spec §4.2).
    pub fn build(lengths: &[u8]) -> Result<Self, DecompressError> {
        let num_symbols = lengths.len();
        if num_symbols == 0 || num_symbols > u16::MAX as usize {
            return Err(DecompressError::InvalidCodeLengths);
        }
        for &len in lengths {
            if len as usize > MAX_CODE_LEN {
                return Err(DecompressError::InvalidCodeLengths);
            }
        }

        // An alphabet of exactly one symbol is trivially the
        // single-symbol case regardless of its recorded length (there
        // is nowhere else for "the" symbol to be).
        if num_symbols == 1 {
            if lengths[0] > 1 {
                return Err(DecompressError::InvalidCodeLengths);
            }
            return Ok(Self {
                num_symbols: 1,
                lengths: lengths.to_vec(),
                table: Vec::new(),
                left: Vec::new(),
                right: Vec::new(),
                single_symbol: Some(0),
            });
        }

        let nonzero = lengths.iter().filter(|&&len| len != 0).count();
        if nonzero == 0 {
            return Err(DecompressError::InvalidCodeLengths);
        }
        if nonzero == 1 {
            let symbol = lengths.iter().position(|&len| len != 0).unwrap();
            if lengths[symbol] == 1 {
                return Ok(Self {
                    num_symbols: num_symbols as u16,
                    lengths: lengths.to_vec(),
                    table: Vec::new(),
                    left: Vec::new(),
                    right: Vec::new(),
                    single_symbol: Some(symbol as u16),
                });
            }
            return Err(DecompressError::InvalidCodeLengths);
        }

        Self::build_canonical(lengths)
    }

    // Builds the general (non single-symbol) case: a direct lookup
    // table for codes of at most `LOOKUP_BITS` bits, and a secondary
    // binary-tree tail (`left`/`right`) for longer ones.
    //
    // Ported from the teacher's `build_huffman_table`: assign the
    // smallest-length symbols the smallest canonical codes in
    // ascending symbol order, track a running `start[len]` cursor per
    // length, and for codes longer than the table width, walk/extend a
    // node tree one "extended" bit at a time.
    fn build_canonical(lengths: &[u8]) -> Result<Self, DecompressError> {
        let num_symbols = lengths.len();
        let table_bits = LOOKUP_BITS as usize;

        let mut count = [0u32; MAX_CODE_LEN + 1];
        for &len in lengths {
            count[len as usize] += 1;
        }

        // start[len] = first canonical code of that length, left-justified
        // into a MAX_CODE_LEN-bit numeric space.
        let mut start = [0u32; MAX_CODE_LEN + 2];
        for len in 1..=MAX_CODE_LEN {
            start[len + 1] = start[len] + (count[len] << (MAX_CODE_LEN - len));
        }
        // Kraft equality: the cursor must land exactly on 2^MAX_CODE_LEN.
        if start[MAX_CODE_LEN + 1] != 1 << MAX_CODE_LEN {
            return Err(DecompressError::InvalidCodeLengths);
        }

        let extended_bits = MAX_CODE_LEN - table_bits;
        let mut weight = [0u32; MAX_CODE_LEN + 1];
        for len in 1..=table_bits {
            start[len] >>= extended_bits;
            weight[len] = 1 << (table_bits - len);
        }
        for len in (table_bits + 1)..=MAX_CODE_LEN {
            weight[len] = 1 << (MAX_CODE_LEN - len);
        }

        let mut table = vec![0u16; 1 << table_bits];
        let node_capacity = 2 * num_symbols;
        let mut left = vec![0u16; node_capacity];
        let mut right = vec![0u16; node_capacity];
        let mut next_avail_node = num_symbols;
        let direction_mask = 1u32 << (MAX_CODE_LEN - 1 - table_bits);

        for (symbol, &len) in lengths.iter().enumerate() {
            let len = len as usize;
            if len == 0 {
                continue;
            }
            let next_code = start[len] + weight[len];

            if len <= table_bits {
                if start[len] >= next_code || next_code > (1 << table_bits) {
                    return Err(DecompressError::InvalidCodeLengths);
                }
                for slot in start[len]..next_code {
                    table[slot as usize] = symbol as u16;
                }
            } else {
                let mut bitstring = start[len];
                let mut ptr = TreePtr::Table((bitstring >> extended_bits) as usize);
                let mut remaining = len - table_bits;

                while remaining != 0 {
                    if ptr.get(&table, &left, &right) == 0 && next_avail_node < node_capacity {
                        ptr.set(&mut table, &mut left, &mut right, next_avail_node as u16);
                        left[next_avail_node] = 0;
                        right[next_avail_node] = 0;
                        next_avail_node += 1;
                    }
                    let node = ptr.get(&table, &left, &right) as usize;
                    if node < node_capacity {
                        ptr = if bitstring & direction_mask != 0 { TreePtr::Right(node) } else { TreePtr::Left(node) };
                    }
                    bitstring <<= 1;
                    remaining -= 1;
                }
                ptr.set(&mut table, &mut left, &mut right, symbol as u16);
            }

            start[len] = next_code;
        }

        Ok(Self { num_symbols: num_symbols as u16, lengths: lengths.to_vec(), table, left, right, single_symbol: None })
    }

    /// Decodes one symbol from `br`, advancing it by the symbol's code
    /// length.
    ///
    /// `table` is indexed MSB-first (`build_canonical` left-justifies
    /// each codeword into its slot, as the source this was ported from
    /// does for its own big-endian bit reader), but `br` delivers bits
    /// LSB-first: its first-read bit lands in bit 0 of a `peek` result,
    /// not bit `LOOKUP_BITS - 1`. The direct-lookup window is reversed
    /// before indexing to correct for that; the tree tail below walks
    /// bits in the order `br` already delivers them (its peeked bit
    /// `mask_idx` *is* the `mask_idx`-th bit read), so it needs no such
    /// correction.
    pub fn read_symbol(&self, br: &mut BitReader) -> Result<u16, DecompressError> {
        if let Some(symbol) = self.single_symbol {
            return Ok(symbol);
        }

        let raw = br.peek(LOOKUP_BITS)?;
        let lookup = (raw.reverse_bits() >> (u32::BITS - LOOKUP_BITS)) as usize;
        let mut idx = self.table[lookup] as usize;
        let mut mask_idx = LOOKUP_BITS;
        while idx >= self.num_symbols as usize {
            let window = br.peek(mask_idx + 1)?;
            let bit = (window >> mask_idx) & 1 != 0;
            idx = if bit { self.right[idx] as usize } else { self.left[idx] as usize };
            mask_idx += 1;
        }
        br.advance(self.lengths[idx] as u32);
        Ok(idx as u16)
    }
}

// Private helper used only while constructing the tree tail, so a
// single routine can update either the root table slot or a left/right
// tree node uniformly.
enum TreePtr {
    Table(usize),
    Left(usize),
    Right(usize),
}

impl TreePtr {
    fn get(&self, table: &[u16], left: &[u16], right: &[u16]) -> u16 {
        match *self {
            TreePtr::Table(i) => table[i],
            TreePtr::Left(i) => left[i],
            TreePtr::Right(i) => right[i],
        }
    }

    fn set(&self, table: &mut [u16], left: &mut [u16], right: &mut [u16], val: u16) {
        match *self {
            TreePtr::Table(i) => table[i] = val,
            TreePtr::Left(i) => left[i] = val,
            TreePtr::Right(i) => right[i] = val,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InputSource;

    struct SliceSource<'a> {
        data: &'a [u8],
        pos: usize,
    }

    impl InputSource for SliceSource<'_> {
        fn read(&mut self, buf: &mut [u8]) -> usize {
            let n = buf.len().min(self.data.len() - self.pos);
            buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
            self.pos += n;
            n
        }
    }

    #[test]
    fn rejects_all_zero_lengths() {
        assert!(matches!(PrefixTable::build(&[0, 0, 0]), Err(DecompressError::InvalidCodeLengths)));
    }

    #[test]
    fn rejects_kraft_mismatch() {
        // Two symbols of length 1 each would need lengths summing to
        // Kraft 1 (2^-1 + 2^-1 = 1); length 2 for both undershoots.
        assert!(matches!(PrefixTable::build(&[2, 2, 0, 0]), Err(DecompressError::InvalidCodeLengths)));
    }

    #[test]
    fn single_symbol_code_consumes_zero_bits() {
        let table = PrefixTable::build(&[0, 1, 0]).unwrap();
        let mut src = SliceSource { data: &[0xFF, 0xFF], pos: 0 };
        let mut br = BitReader::new(&mut src);
        assert_eq!(table.read_symbol(&mut br).unwrap(), 1);
        // No bits were consumed; the next byte is still fully intact.
        assert_eq!(br.read(8).unwrap(), 0xFF);
    }

    #[test]
    fn decodes_simple_balanced_code() {
        // Four symbols, all length 2: canonical codes 00,01,10,11 in
        // ascending symbol order.
        let table = PrefixTable::build(&[2, 2, 2, 2]).unwrap();
        // bits LSB-first: symbol 3 is code "11" -> byte 0b0000_0011.
        let mut src = SliceSource { data: &[0b0000_0011], pos: 0 };
        let mut br = BitReader::new(&mut src);
        assert_eq!(table.read_symbol(&mut br).unwrap(), 3);
    }

    #[test]
    fn decodes_a_non_palindromic_code() {
        // Same code set as above, but exercise a code that isn't its
        // own bit-reversal: symbol 2 is "10", transmitted LSB-first as
        // bits 1,0 -> byte 0b0000_0001. A table indexed without
        // correcting for the reader's bit order would instead resolve
        // this to symbol 1 ("01").
        let table = PrefixTable::build(&[2, 2, 2, 2]).unwrap();
        let mut src = SliceSource { data: &[0b0000_0001], pos: 0 };
        let mut br = BitReader::new(&mut src);
        assert_eq!(table.read_symbol(&mut br).unwrap(), 2);
    }

    #[test]
    fn rejects_a_kraft_short_code_set() {
        let lengths = [1u8, 2, 3, 9, 9, 9, 9, 9, 9, 0];
        assert!(PrefixTable::build(&lengths).is_err());
    }

    #[test]
    fn long_code_tail_round_trips() {
        // Kraft-exact: 1/2+1/4+1/8+1/16+1/32+1/64+1/128+1/256+1/512+1/512 = 1.
        let lengths = [1u8, 2, 3, 4, 5, 6, 7, 8, 9, 9];
        let table = PrefixTable::build(&lengths).unwrap();

        // Symbol 0 (length 1) has the first code of its length, all
        // zero bits, so it decodes from an all-zero stream.
        let mut src = SliceSource { data: &[0x00, 0x00], pos: 0 };
        let mut br = BitReader::new(&mut src);
        assert_eq!(table.read_symbol(&mut br).unwrap(), 0);
    }
}
