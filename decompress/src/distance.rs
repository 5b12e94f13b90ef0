//! Distance resolver (§4.7): translates a distance code through the
//! 4-entry recency ring (short codes) or the direct/postfix numeric
//! scheme, and maintains the ring itself.

use crate::bit_reader::BitReader;
use crate::error::DecompressError;
use crate::huffman::PrefixTable;
use crate::tables::{DIST_SHORT_INDEX_OFFSET, DIST_SHORT_VALUE_OFFSET, NUM_SHORT_DISTANCE_CODES};

/// The 4-slot distance recency ring (§3 Data Model), initialized
/// `{4, 11, 15, 16}`.
pub struct DistanceRing {
    ring: [u32; 4],
    cursor: usize,
}

impl DistanceRing {
    pub fn new() -> Self {
        Self { ring: [4, 11, 15, 16], cursor: 0 }
    }

    /// Reuses the most recent distance without consulting a new
    /// symbol or mutating the ring (the command's "implicit distance"
    /// path, equivalent to short code 0).
    pub fn most_recent(&self) -> u32 {
        self.ring[self.cursor.wrapping_sub(1) & 3]
    }

    fn push(&mut self, distance: u32) {
        self.ring[self.cursor & 3] = distance;
        self.cursor += 1;
    }

    fn short_code_distance(&self, code: usize) -> u32 {
        let index = (self.cursor as i32 + DIST_SHORT_INDEX_OFFSET[code] - 1).rem_euclid(4) as usize;
        (self.ring[index] as i32 + DIST_SHORT_VALUE_OFFSET[code]).max(1) as u32
    }
}

impl Default for DistanceRing {
    fn default() -> Self {
        Self::new()
    }
}

pub struct DistanceParams {
    pub num_direct: u32,
    pub postfix_bits: u32,
}

/// Decodes and resolves one explicit distance code (§4.7), pushing the
/// result to the ring unless it came from a short code.
pub fn read_distance(
    br: &mut BitReader,
    table: &PrefixTable,
    ring: &mut DistanceRing,
    params: &DistanceParams,
) -> Result<u32, DecompressError> {
    let code = table.read_symbol(br)? as usize;

    if code < NUM_SHORT_DISTANCE_CODES {
        return Ok(ring.short_code_distance(code));
    }

    let postfix_mask = (1u32 << params.postfix_bits) - 1;
    let zero_based = (code - NUM_SHORT_DISTANCE_CODES) as u32;
    let distance = if zero_based < params.num_direct {
        zero_based + 1
    } else {
        let rebased = zero_based - params.num_direct;
        let postfix = rebased & postfix_mask;
        let code_prime = rebased >> params.postfix_bits;
        let nbits = (code_prime >> 1) + 1;
        let offset = ((2 + (code_prime & 1)) << nbits).wrapping_sub(4);
        let extra = br.read(nbits.min(24))?;
        params.num_direct + ((offset + extra) << params.postfix_bits) + postfix
    };

    ring.push(distance);
    Ok(distance)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ring_starts_with_the_documented_initial_values() {
        let ring = DistanceRing::new();
        assert_eq!(ring.most_recent(), 16);
    }

    #[test]
    fn push_updates_the_most_recent_slot() {
        let mut ring = DistanceRing::new();
        ring.push(5);
        assert_eq!(ring.most_recent(), 5);
        ring.push(9);
        assert_eq!(ring.most_recent(), 9);
    }

    #[test]
    fn short_code_zero_reuses_most_recent_distance() {
        let mut ring = DistanceRing::new();
        ring.push(5);
        assert_eq!(ring.short_code_distance(0), 5);
        // Reading a short code must not itself mutate the ring.
        ring.push(9);
        assert_eq!(ring.most_recent(), 9);
    }

    #[test]
    fn first_code_past_the_direct_range_continues_it_without_a_gap() {
        // num_direct=16, postfix_bits=0: short codes are 0..16, direct
        // codes cover distances 1..=16, so the very first non-direct
        // code must resolve to 16 or 17 (one extra bit), not jump past
        // a whole `1 << nbits`-sized block of skipped distances.
        let params = DistanceParams { num_direct: 16, postfix_bits: 0 };
        let lengths_len = 16 + 16 + 1;
        let mut lengths = alloc::vec![0u8; lengths_len];
        lengths[32] = 1; // code = 16 (short codes) + 16 (num_direct) = 32
        let table = PrefixTable::build(&lengths).unwrap();

        let mut ring = DistanceRing::new();
        let mut src: &[u8] = &[0b0000_0000];
        let mut br = BitReader::new(&mut src);
        let distance = read_distance(&mut br, &table, &mut ring, &params).unwrap();
        assert!(distance == 16 || distance == 17, "expected 16 or 17, got {distance}");
    }
}
