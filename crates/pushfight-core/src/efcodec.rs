//! Elias-Fano delta encoding for sorted lists of nonnegative integers.
//!
//! Packs N integers between 0 and M (exclusive) into roughly
//! `N * (2 + log2(M/N))` bits. Reference: the original solver's
//! `efcodec.cc`.

use crate::error::DecodeError;

/// Appends `value` to `output` as a variable-length integer: 7 payload bits
/// per byte, continuation flag in bit 7.
fn append_varint(output: &mut Vec<u8>, mut value: i64) {
    debug_assert!(value >= 0);
    loop {
        let mut byte = (value & 0x7f) as u8;
        value >>= 7;
        if value > 0 {
            byte |= 0x80;
        }
        output.push(byte);
        if value == 0 {
            break;
        }
    }
}

struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn next_byte(&mut self) -> Option<u8> {
        let b = *self.data.get(self.pos)?;
        self.pos += 1;
        Some(b)
    }

    fn read_varint(&mut self) -> Option<i64> {
        let mut value: i64 = 0;
        let mut shift = 0;
        loop {
            let byte = self.next_byte()?;
            value |= ((byte & 0x7f) as i64) << shift;
            if byte & 0x80 == 0 {
                return Some(value);
            }
            shift += 7;
            if shift > 56 {
                return None;
            }
        }
    }
}

struct BitEncoder<'a> {
    output: &'a mut Vec<u8>,
    byte: u8,
    pos: u32,
}

impl<'a> BitEncoder<'a> {
    fn new(output: &'a mut Vec<u8>) -> BitEncoder<'a> {
        BitEncoder {
            output,
            byte: 0,
            pos: 0,
        }
    }

    fn write_bit(&mut self, bit: bool) {
        self.byte |= (bit as u8) << self.pos;
        self.pos += 1;
        if self.pos == 8 {
            self.output.push(self.byte);
            self.byte = 0;
            self.pos = 0;
        }
    }

    /// Writes the low `num_bits` of `value`, most-significant bit first.
    fn write_lower_bits(&mut self, value: u64, num_bits: u8) {
        for i in (0..num_bits).rev() {
            self.write_bit((value >> i) & 1 != 0);
        }
    }

    fn write_unary(&mut self, mut value: u64) {
        while value > 0 {
            self.write_bit(false);
            value -= 1;
        }
        self.write_bit(true);
    }

    fn finish(mut self) {
        if self.pos != 0 {
            self.output.push(self.byte);
        }
    }
}

struct BitDecoder<'a, 'b> {
    cursor: &'a mut Cursor<'b>,
    byte: u8,
    bits: u32,
}

impl<'a, 'b> BitDecoder<'a, 'b> {
    fn new(cursor: &'a mut Cursor<'b>) -> BitDecoder<'a, 'b> {
        BitDecoder {
            cursor,
            byte: 0,
            bits: 0,
        }
    }

    fn read_bit(&mut self) -> Option<bool> {
        if self.bits == 0 {
            self.byte = self.cursor.next_byte()?;
            self.bits = 8;
        }
        let result = self.byte & 1 != 0;
        self.byte >>= 1;
        self.bits -= 1;
        Some(result)
    }

    fn read_lower_bits(&mut self, num_bits: u8) -> Option<u64> {
        let mut value = 0u64;
        for _ in 0..num_bits {
            value = (value << 1) | self.read_bit()? as u64;
        }
        Some(value)
    }

    fn read_unary(&mut self) -> Option<u64> {
        let mut value = 0u64;
        loop {
            if self.read_bit()? {
                return Some(value);
            }
            value += 1;
        }
    }
}

/// Returns the recommended tail-bit width `k` for Elias-Fano-encoding `n`
/// elements spanning values in `[0, m]`.
pub fn ef_tail_bits(n: i64, m: i64) -> u8 {
    debug_assert!(n > 0);
    debug_assert!(m >= 0);
    if n >= m {
        return 0;
    }
    let x = m / n + 1;
    (64 - (x - 1).leading_zeros()) as u8
}

/// Encodes a sorted (duplicates allowed) list of nonnegative integers.
pub fn encode_ef(sorted_ints: &[i64]) -> Vec<u8> {
    let mut result = Vec::new();
    append_varint(&mut result, sorted_ints.len() as i64);
    if sorted_ints.is_empty() {
        return result;
    }
    let min_value = sorted_ints[0];
    debug_assert!(min_value >= 0);
    append_varint(&mut result, min_value);
    if sorted_ints.len() == 1 {
        return result;
    }
    let max_value = *sorted_ints.last().unwrap();
    let k = ef_tail_bits(sorted_ints.len() as i64, max_value);
    debug_assert!(k <= 63);
    result.push(k);
    let mut encoder = BitEncoder::new(&mut result);
    for w in sorted_ints.windows(2) {
        debug_assert!(w[0] <= w[1]);
        let delta = (w[1] - w[0]) as u64;
        encoder.write_lower_bits(delta, k);
        encoder.write_unary(delta >> k);
    }
    encoder.finish();
    result
}

/// Decodes a byte array produced by [`encode_ef`].
pub fn decode_ef(bytes: &[u8]) -> Result<Vec<i64>, DecodeError> {
    decode_ef_stream(bytes).map(|(ints, _consumed)| ints)
}

/// Decodes one Elias-Fano block from the front of `bytes`, returning the
/// decoded integers along with the number of bytes consumed so the caller
/// can decode the next concatenated block from `&bytes[consumed..]`.
pub fn decode_ef_stream(bytes: &[u8]) -> Result<(Vec<i64>, usize), DecodeError> {
    let mut cursor = Cursor { data: bytes, pos: 0 };
    let element_count = cursor
        .read_varint()
        .ok_or(DecodeError::TruncatedEliasFano)?;
    let mut result = Vec::new();
    if element_count == 0 {
        return Ok((result, cursor.pos));
    }
    result.resize(element_count as usize, 0);
    result[0] = cursor.read_varint().ok_or(DecodeError::TruncatedEliasFano)?;
    if element_count > 1 {
        let k = cursor.next_byte().ok_or(DecodeError::TruncatedEliasFano)?;
        if k > 63 {
            return Err(DecodeError::TailWidthTooLarge(k));
        }
        let mut decoder = BitDecoder::new(&mut cursor);
        for i in 1..element_count as usize {
            let lower = decoder
                .read_lower_bits(k)
                .ok_or(DecodeError::TruncatedEliasFano)?;
            let upper = decoder
                .read_unary()
                .ok_or(DecodeError::TruncatedEliasFano)?;
            let delta = lower | (upper << k);
            result[i] = result[i - 1] + delta as i64;
        }
    }
    Ok((result, cursor.pos))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_list_round_trips() {
        let encoded = encode_ef(&[]);
        assert_eq!(encoded, vec![0]);
        assert_eq!(decode_ef(&encoded).unwrap(), Vec::<i64>::new());
    }

    #[test]
    fn stream_decode_reports_exact_bytes_consumed_for_concatenated_blocks() {
        let mut stream = encode_ef(&[1, 2, 5]);
        let first_len = stream.len();
        stream.extend(encode_ef(&[10, 20]));
        let (first, consumed) = decode_ef_stream(&stream).unwrap();
        assert_eq!(first, vec![1, 2, 5]);
        assert_eq!(consumed, first_len);
        let (second, _) = decode_ef_stream(&stream[consumed..]).unwrap();
        assert_eq!(second, vec![10, 20]);
    }

    #[test]
    fn decode_of_empty_input_is_an_error() {
        assert!(decode_ef(&[]).is_err());
    }

    #[test]
    fn all_identical_values_use_zero_tail_bits() {
        let values = vec![5i64; 4];
        let encoded = encode_ef(&values);
        // varint(4) varint(5) k=0 then 3 unary "1" bits packed into one byte.
        assert_eq!(encoded, vec![4, 5, 0, 0b0000_0111]);
        assert_eq!(decode_ef(&encoded).unwrap(), values);
    }

    #[test]
    fn round_trip_sampled() {
        use rand::{Rng, SeedableRng, rngs::StdRng};
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..200 {
            let n = rng.random_range(0..200usize);
            let mut values = Vec::with_capacity(n);
            let mut v = 0i64;
            for _ in 0..n {
                v += rng.random_range(0..1000);
                values.push(v);
            }
            let encoded = encode_ef(&values);
            assert_eq!(decode_ef(&encoded).unwrap(), values);
        }
    }

    #[test]
    fn single_element_round_trips() {
        let encoded = encode_ef(&[42]);
        assert_eq!(decode_ef(&encoded).unwrap(), vec![42]);
    }
}
