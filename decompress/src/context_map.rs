//! Per-block-type context→tree-index map decoder (§4.4), including the
//! optional run-length encoding of zero-runs and the optional inverse
//! move-to-front post-pass (§4.8).

use alloc::vec;
use alloc::vec::Vec;

use crate::bit_reader::BitReader;
use crate::code_length::read_code_lengths;
use crate::error::DecompressError;
use crate::huffman::PrefixTable;

/// Result of decoding a context map: the flat byte array plus the
/// number of distinct tree indices it selects among (`num_htrees`),
/// which callers need to size the corresponding tree group.
pub struct ContextMap {
    pub map: Vec<u8>,
    pub num_htrees: u32,
}

/// Decodes a context map of exactly `size` entries (§4.4).
pub fn read_context_map(br: &mut BitReader, size: usize) -> Result<ContextMap, DecompressError> {
    let num_htrees = br.read(8)? + 1;

    if num_htrees == 1 {
        return Ok(ContextMap { map: vec![0u8; size], num_htrees });
    }

    let max_run_length_prefix = if br.read_bit()? { br.read(4)? + 1 } else { 0 };

    let alphabet_size = num_htrees as usize + max_run_length_prefix as usize;
    let lengths = read_code_lengths(br, alphabet_size)?;
    let table = PrefixTable::build(&lengths)?;

    let mut map = Vec::with_capacity(size);
    while map.len() < size {
        let symbol = table.read_symbol(br)? as u32;
        if symbol == 0 {
            map.push(0);
        } else if symbol <= max_run_length_prefix {
            let run = (1u32 << symbol) + br.read(symbol)?;
            let run = run as usize;
            if map.len() + run > size {
                return Err(DecompressError::MalformedHeader);
            }
            map.resize(map.len() + run, 0);
        } else {
            let value = symbol - max_run_length_prefix;
            if value >= num_htrees {
                return Err(DecompressError::MalformedHeader);
            }
            map.push(value as u8);
        }
    }
    if map.len() != size {
        return Err(DecompressError::MalformedHeader);
    }

    if br.read_bit()? {
        inverse_move_to_front(&mut map);
    }

    Ok(ContextMap { map, num_htrees })
}

/// Applies inverse move-to-front to `v` in place (§4.8): `mtf` starts
/// as the identity permutation `0..256`; each `v[i]` is replaced by
/// `mtf[v[i]]`, and if that lookup was non-zero, the looked-up byte is
/// rotated to the front of `mtf`.
pub fn inverse_move_to_front(v: &mut [u8]) {
    let mut mtf = [0u8; 256];
    for (i, slot) in mtf.iter_mut().enumerate() {
        *slot = i as u8;
    }
    for byte in v.iter_mut() {
        let index = *byte as usize;
        let value = mtf[index];
        *byte = value;
        if index != 0 {
            mtf.copy_within(0..index, 1);
            mtf[0] = value;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inverse_mtf_is_identity_when_input_is_all_zero() {
        let mut v = [0u8; 8];
        inverse_move_to_front(&mut v);
        assert_eq!(v, [0u8; 8]);
    }

    #[test]
    fn inverse_mtf_promotes_recently_used_bytes() {
        // Input indices into the MTF table: 5 then 0 — the second
        // entry should decode to whatever the first promoted to front.
        let mut v = [5u8, 0u8];
        inverse_move_to_front(&mut v);
        assert_eq!(v[0], 5);
        assert_eq!(v[1], 5);
    }

    #[test]
    fn mtf_then_inverse_mtf_round_trips_arbitrary_byte_sequences() {
        let original = [3u8, 1, 1, 4, 1, 5, 9, 2, 6];
        let mut mtf = [0u8; 256];
        for (i, slot) in mtf.iter_mut().enumerate() {
            *slot = i as u8;
        }
        let mut encoded = Vec::new();
        for &byte in &original {
            let index = mtf.iter().position(|&b| b == byte).unwrap();
            encoded.push(index as u8);
            if index != 0 {
                mtf.copy_within(0..index, 1);
                mtf[0] = byte;
            }
        }
        inverse_move_to_front(&mut encoded);
        assert_eq!(encoded, original);
    }
}
