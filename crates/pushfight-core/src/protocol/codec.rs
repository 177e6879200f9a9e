//! A length-prefixed, Bencoding-inspired binary encoding for the
//! coordinator wire protocol: integers, length-prefixed byte strings, lists,
//! and dictionaries, with no ASCII delimiters.
//!
//! Reference: the original solver's `client/codec.cc`.

use std::collections::BTreeMap;

use crate::error::DecodeError;

/// Little-endian, minimal-length integer encoding: the smallest number of
/// bytes that represent `i`, low byte first (zero encodes as no bytes).
pub fn encode_int(mut i: u64) -> Vec<u8> {
    let mut out = Vec::new();
    while i > 0 {
        out.push((i & 0xff) as u8);
        i >>= 8;
    }
    out
}

/// Decodes up to 8 little-endian bytes into an integer; extra bytes beyond
/// the 8th are ignored.
pub fn decode_int(data: &[u8]) -> u64 {
    let mut result = 0u64;
    for (shift, &byte) in data.iter().take(8).enumerate() {
        result |= (byte as u64) << (shift * 8);
    }
    result
}

/// Length-prefixes `data`: a single byte length if `< 248`, otherwise a byte
/// `247 + k` followed by a `k`-byte little-endian length, for the smallest
/// `k` that fits.
pub fn encode_bytes(data: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(1 + data.len());
    if data.len() < 248 {
        result.push(data.len() as u8);
    } else {
        let encoded_size = encode_int(data.len() as u64);
        result.push(247 + encoded_size.len() as u8);
        result.extend_from_slice(&encoded_size);
    }
    result.extend_from_slice(data);
    result
}

/// Decodes one length-prefixed byte string from the front of `span`,
/// returning the payload and the remaining bytes.
pub fn decode_bytes(span: &[u8]) -> Result<(&[u8], &[u8]), DecodeError> {
    let (&first, rest) = span.split_first().ok_or(DecodeError::TruncatedPayload)?;
    let len = if first < 248 {
        first as usize
    } else {
        let k = (first - 247) as usize;
        if rest.len() < k {
            return Err(DecodeError::TruncatedPayload);
        }
        let len = decode_int(&rest[..k]) as usize;
        return split_payload(&rest[k..], len);
    };
    split_payload(rest, len)
}

fn split_payload(rest: &[u8], len: usize) -> Result<(&[u8], &[u8]), DecodeError> {
    if rest.len() < len {
        return Err(DecodeError::TruncatedPayload);
    }
    Ok((&rest[..len], &rest[len..]))
}

/// Decodes a sequence of length-prefixed byte strings filling the whole
/// span.
pub fn decode_list(mut span: &[u8]) -> Result<Vec<&[u8]>, DecodeError> {
    let mut result = Vec::new();
    while !span.is_empty() {
        let (elem, rest) = decode_bytes(span)?;
        result.push(elem);
        span = rest;
    }
    Ok(result)
}

/// Concatenates each element's [`encode_bytes`] framing, in order.
pub fn encode_list(list: &[Vec<u8>]) -> Vec<u8> {
    let mut result = Vec::new();
    for elem in list {
        result.extend_from_slice(&encode_bytes(elem));
    }
    result
}

/// Decodes an even-length list of byte strings as alternating key/value
/// pairs, rejecting duplicate keys or an odd element count.
pub fn decode_dict(span: &[u8]) -> Result<BTreeMap<Vec<u8>, Vec<u8>>, DecodeError> {
    let list = decode_list(span)?;
    if list.len() % 2 != 0 {
        return Err(DecodeError::TruncatedPayload);
    }
    let mut result = BTreeMap::new();
    for pair in list.chunks_exact(2) {
        if result.insert(pair[0].to_vec(), pair[1].to_vec()).is_some() {
            return Err(DecodeError::TruncatedPayload);
        }
    }
    Ok(result)
}

/// Encodes a dictionary as an alternating key/value list, in key order (the
/// original relies on `std::map`'s sorted iteration for this; `BTreeMap`
/// gives the same guarantee).
pub fn encode_dict(dict: &BTreeMap<Vec<u8>, Vec<u8>>) -> Vec<u8> {
    let mut result = Vec::new();
    for (k, v) in dict {
        result.extend_from_slice(&encode_bytes(k));
        result.extend_from_slice(&encode_bytes(v));
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_round_trips() {
        for v in [0u64, 1, 255, 256, 65535, u64::MAX] {
            assert_eq!(decode_int(&encode_int(v)), v);
        }
    }

    #[test]
    fn short_bytes_use_a_single_length_byte() {
        let encoded = encode_bytes(b"hi");
        assert_eq!(encoded, vec![2, b'h', b'i']);
        let (payload, rest) = decode_bytes(&encoded).unwrap();
        assert_eq!(payload, b"hi");
        assert!(rest.is_empty());
    }

    #[test]
    fn long_bytes_use_the_extended_length_form() {
        let data = vec![7u8; 300];
        let encoded = encode_bytes(&data);
        assert_eq!(encoded[0], 247 + 2); // 300 fits in 2 little-endian bytes
        let (payload, _) = decode_bytes(&encoded).unwrap();
        assert_eq!(payload, data.as_slice());
    }

    #[test]
    fn dict_round_trips_and_sorts_by_key() {
        let mut dict = BTreeMap::new();
        dict.insert(b"zzz".to_vec(), b"1".to_vec());
        dict.insert(b"aaa".to_vec(), b"2".to_vec());
        let encoded = encode_dict(&dict);
        let decoded = decode_dict(&encoded).unwrap();
        assert_eq!(decoded, dict);
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        let encoded = encode_list(&[b"k".to_vec(), b"1".to_vec(), b"k".to_vec(), b"2".to_vec()]);
        assert!(decode_dict(&encoded).is_err());
    }

    #[test]
    fn truncated_input_is_an_error() {
        assert!(decode_bytes(&[5, b'h', b'i']).is_err());
    }
}
