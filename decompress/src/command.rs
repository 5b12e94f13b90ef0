//! Command decoder (§4.6): one prefix-coded 10-bit symbol yields an
//! `(insert_len, copy_len)` pair plus a flag for whether a distance
//! code follows or the previous distance should be reused.
//!
//! The source's `distance_code = -1` sentinel trick (flagged in §9 as
//! an implementation detail not worth reproducing) is replaced here
//! with an explicit boolean, per the spec's own recommendation.

use crate::bit_reader::BitReader;
use crate::error::DecompressError;
use crate::huffman::PrefixTable;
use crate::tables::{COPY_LENGTH_PREFIX, COPY_RANGE_LUT, INSERT_LENGTH_PREFIX, INSERT_RANGE_LUT};

pub struct Command {
    pub insert_len: u32,
    pub copy_len: u32,
    /// `true` if a distance code follows on the distance stream;
    /// `false` if the command implies reusing the most recent
    /// distance (equivalent to short distance code 0, §4.7).
    pub has_explicit_distance: bool,
}

pub fn read_command(br: &mut BitReader, table: &PrefixTable) -> Result<Command, DecompressError> {
    let symbol = table.read_symbol(br)? as u32;
    let range_idx = (symbol >> 6) as usize;
    let has_explicit_distance = range_idx < 2;

    let clamped = if range_idx >= 2 { range_idx - 2 } else { range_idx };
    let insert_code = INSERT_RANGE_LUT[clamped] + ((symbol >> 3) & 7);
    let copy_code = COPY_RANGE_LUT[clamped] + (symbol & 7);

    let (insert_offset, insert_nbits) =
        *INSERT_LENGTH_PREFIX.get(insert_code as usize).ok_or(DecompressError::MalformedHeader)?;
    let (copy_offset, copy_nbits) =
        *COPY_LENGTH_PREFIX.get(copy_code as usize).ok_or(DecompressError::MalformedHeader)?;

    let insert_len = insert_offset + br.read(insert_nbits)?;
    let copy_len = copy_offset + br.read(copy_nbits)?;

    Ok(Command { insert_len, copy_len, has_explicit_distance })
}
