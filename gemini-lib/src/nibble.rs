//! Nibble codec.
//!
//! SysEx data bytes must stay below `0x80`. Settings payloads are widened to
//! one nibble per byte before transmission and narrowed again after receipt.

use crate::error::Error;

/// Split every byte into its high and low nibble.
pub fn encode(src: &[u8]) -> Vec<u8> {
    let mut dst = vec![0u8; src.len() * 2];
    encode_into(src, &mut dst);
    dst
}

/// Encode `src` into `dst`, which must be exactly twice as long.
pub fn encode_into(src: &[u8], dst: &mut [u8]) {
    assert_eq!(dst.len(), src.len() * 2, "nibble encode buffer size mismatch");
    for (pair, byte) in dst.chunks_exact_mut(2).zip(src) {
        pair[0] = (byte >> 4) & 0xF;
        pair[1] = byte & 0xF;
    }
}

/// Reassemble `out_len` bytes from `2 * out_len` nibbles.
pub fn decode(src: &[u8], out_len: usize) -> Result<Vec<u8>, Error> {
    let mut dst = vec![0u8; out_len];
    decode_into(src, &mut dst)?;
    Ok(dst)
}

/// Decode `src` into `dst`; `src` must hold exactly two nibbles per output byte.
pub fn decode_into(src: &[u8], dst: &mut [u8]) -> Result<(), Error> {
    if src.len() != dst.len() * 2 {
        return Err(Error::CodecLength {
            expected: dst.len() * 2,
            actual: src.len(),
        });
    }
    for (byte, pair) in dst.iter_mut().zip(src.chunks_exact(2)) {
        *byte = (pair[0] << 4) | pair[1];
    }
    Ok(())
}

/// Most significant nibble first, as every scalar command sends its 16-bit value.
pub fn encode_u16(value: u16) -> [u8; 4] {
    [
        ((value >> 12) & 0xF) as u8,
        ((value >> 8) & 0xF) as u8,
        ((value >> 4) & 0xF) as u8,
        (value & 0xF) as u8,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_splits_high_then_low() {
        assert_eq!(encode(&[0xAB, 0x12]), vec![0xA, 0xB, 0x1, 0x2]);
    }

    #[test]
    fn test_decode_joins_pairs() {
        assert_eq!(decode(&[0xA, 0xB, 0x1, 0x2], 2).unwrap(), vec![0xAB, 0x12]);
    }

    #[test]
    fn test_every_byte_value_roundtrips() {
        let all: Vec<u8> = (0..=255).collect();
        let encoded = encode(&all);
        assert_eq!(encoded.len(), 512);
        assert!(encoded.iter().all(|&n| n < 16));
        assert_eq!(decode(&encoded, all.len()).unwrap(), all);
    }

    #[test]
    fn test_empty_input() {
        assert!(encode(&[]).is_empty());
        assert!(decode(&[], 0).unwrap().is_empty());
    }

    #[test]
    fn test_decode_length_mismatch() {
        match decode(&[0x1, 0x2, 0x3], 2) {
            Err(Error::CodecLength { expected, actual }) => {
                assert_eq!(expected, 4);
                assert_eq!(actual, 3);
            }
            other => panic!("Expected CodecLength error, got {:?}", other),
        }
    }

    #[test]
    fn test_encode_u16() {
        assert_eq!(encode_u16(0x1234), [0x1, 0x2, 0x3, 0x4]);
        assert_eq!(encode_u16(0xFFFF), [0xF, 0xF, 0xF, 0xF]);
        assert_eq!(encode_u16(0), [0, 0, 0, 0]);
    }

    #[test]
    fn test_encode_u16_matches_byte_encoding() {
        let value: u16 = 0xBEEF;
        assert_eq!(encode_u16(value).to_vec(), encode(&value.to_be_bytes()));
    }
}
