//! Socket-level message framing and the coordinator protocol's message
//! shapes, both built on top of [`super::codec`].
//!
//! Reference: the original solver's `client/socket_codec.cc` (framing) and
//! `client/client.cc` (handshake and RPC dictionaries).

use std::collections::BTreeMap;
use std::io::{self, Read, Write};

use super::codec::{decode_dict, decode_int, decode_list, encode_bytes, encode_dict, encode_int};
use crate::error::DecodeError;

/// The original tool caps incoming messages at 100 MiB; a malicious or
/// confused peer claiming a larger size is rejected before any allocation.
pub const DEFAULT_MAX_MESSAGE_SIZE: u64 = 100 << 20;

const CLIENT_PROTOCOL: &str = "Push Fight 0 client";
const SERVER_PROTOCOL: &str = "Push Fight 0 server";

/// Writes one length-prefixed message, as produced by [`encode_bytes`].
pub fn write_frame(w: &mut impl Write, payload: &[u8]) -> io::Result<()> {
    w.write_all(&encode_bytes(payload))
}

/// Reads one length-prefixed message from a stream, mirroring
/// `DecodeBytesFromSocket`: a 1-byte length, or `247 + k` followed by a
/// `k`-byte little-endian extended length, then that many payload bytes.
/// Returns `Ok(None)` on a clean EOF before any bytes are read.
pub fn read_frame(
    r: &mut impl Read,
    max_size: u64,
) -> Result<Option<Vec<u8>>, DecodeError> {
    let mut first = [0u8; 1];
    match r.read(&mut first) {
        Ok(0) => return Ok(None),
        Ok(_) => {}
        Err(_) => return Err(DecodeError::TruncatedFrame),
    }
    let mut size = first[0] as u64;
    if first[0] > 247 {
        let k = (first[0] - 247) as usize;
        let mut buf = [0u8; 8];
        r.read_exact(&mut buf[..k])
            .map_err(|_| DecodeError::TruncatedFrame)?;
        size = decode_int(&buf[..k]);
        if size > max_size {
            return Err(DecodeError::TruncatedFrame);
        }
    }
    let mut data = vec![0u8; size as usize];
    r.read_exact(&mut data)
        .map_err(|_| DecodeError::TruncatedFrame)?;
    Ok(Some(data))
}

fn dict_get<'a>(dict: &'a BTreeMap<Vec<u8>, Vec<u8>>, key: &str) -> Option<&'a [u8]> {
    dict.get(key.as_bytes()).map(Vec::as_slice)
}

/// Builds the client's opening handshake dictionary.
pub fn client_handshake(solver: &str, user: &str, machine: &str) -> BTreeMap<Vec<u8>, Vec<u8>> {
    let mut message = BTreeMap::new();
    message.insert(b"protocol".to_vec(), CLIENT_PROTOCOL.as_bytes().to_vec());
    message.insert(b"solver".to_vec(), solver.as_bytes().to_vec());
    message.insert(b"user".to_vec(), user.as_bytes().to_vec());
    message.insert(b"machine".to_vec(), machine.as_bytes().to_vec());
    message
}

/// Builds the server's handshake reply, or an `error` dictionary if `error`
/// is given.
pub fn server_handshake(error: Option<&str>) -> BTreeMap<Vec<u8>, Vec<u8>> {
    let mut message = BTreeMap::new();
    if let Some(err) = error {
        message.insert(b"error".to_vec(), err.as_bytes().to_vec());
    } else {
        message.insert(b"protocol".to_vec(), SERVER_PROTOCOL.as_bytes().to_vec());
    }
    message
}

/// Validates a decoded server handshake reply: an `error` field fails with
/// its message; a missing or mismatched `protocol` field fails with a
/// description of what was seen.
pub fn validate_server_handshake(reply: &BTreeMap<Vec<u8>, Vec<u8>>) -> Result<(), String> {
    if let Some(err) = dict_get(reply, "error") {
        return Err(format!(
            "server returned error: \"{}\"",
            String::from_utf8_lossy(err)
        ));
    }
    match dict_get(reply, "protocol") {
        Some(p) if p == SERVER_PROTOCOL.as_bytes() => Ok(()),
        Some(p) => Err(format!(
            "unsupported server protocol: {}",
            String::from_utf8_lossy(p)
        )),
        None => Err("unsupported server protocol: unknown".to_string()),
    }
}

/// Builds a `GetChunks` request for `phase`.
pub fn get_chunks_request(phase: u32) -> BTreeMap<Vec<u8>, Vec<u8>> {
    let mut request = BTreeMap::new();
    request.insert(b"method".to_vec(), b"GetChunks".to_vec());
    request.insert(b"phase".to_vec(), encode_int(phase as u64));
    request
}

/// Parses a `GetChunks` response: the list of assigned chunk numbers, each
/// validated to be `< num_chunks`.
pub fn parse_get_chunks_response(
    response: &BTreeMap<Vec<u8>, Vec<u8>>,
    num_chunks: u64,
) -> Result<Vec<u64>, String> {
    if let Some(err) = dict_get(response, "error") {
        return Err(format!(
            "server returned error: \"{}\"",
            String::from_utf8_lossy(err)
        ));
    }
    let chunks_field =
        dict_get(response, "chunks").ok_or_else(|| "response is missing field 'chunks'".to_string())?;
    let parts = decode_list(chunks_field)
        .map_err(|_| "couldn't parse field 'chunks'".to_string())?;
    let mut results = Vec::with_capacity(parts.len());
    for part in parts {
        let i = decode_int(part);
        if i >= num_chunks {
            return Err("server returned invalid chunk number".to_string());
        }
        results.push(i);
    }
    Ok(results)
}

/// Builds a `ReportChunkComplete` request.
pub fn report_chunk_complete_request(
    phase: u32,
    chunk: u64,
    bytesize: u64,
    sha256sum: &[u8; 32],
) -> BTreeMap<Vec<u8>, Vec<u8>> {
    let mut request = BTreeMap::new();
    request.insert(b"method".to_vec(), b"ReportChunkComplete".to_vec());
    request.insert(b"phase".to_vec(), encode_int(phase as u64));
    request.insert(b"chunk".to_vec(), encode_int(chunk));
    request.insert(b"bytesize".to_vec(), encode_int(bytesize));
    request.insert(b"sha256sum".to_vec(), sha256sum.to_vec());
    request
}

/// Parses a `ReportChunkComplete` response: `true` if the server wants the
/// result file uploaded.
pub fn parse_report_chunk_complete_response(
    response: &BTreeMap<Vec<u8>, Vec<u8>>,
) -> Result<bool, String> {
    if let Some(err) = dict_get(response, "error") {
        return Err(format!(
            "server returned error: \"{}\"",
            String::from_utf8_lossy(err)
        ));
    }
    let upload_field =
        dict_get(response, "upload").ok_or_else(|| "response is missing field 'upload'".to_string())?;
    let upload = decode_int(upload_field);
    if upload > 1 {
        return Err("couldn't parse field 'upload'".to_string());
    }
    Ok(upload != 0)
}

/// Round-trips a request or response dictionary through the wire encoding,
/// for use over a [`Read`]/[`Write`] stream.
pub fn write_dict_frame(w: &mut impl Write, dict: &BTreeMap<Vec<u8>, Vec<u8>>) -> io::Result<()> {
    write_frame(w, &encode_dict(dict))
}

pub fn read_dict_frame(
    r: &mut impl Read,
    max_size: u64,
) -> Result<Option<BTreeMap<Vec<u8>, Vec<u8>>>, DecodeError> {
    match read_frame(r, max_size)? {
        None => Ok(None),
        Some(data) => decode_dict(&data).map(Some),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_round_trips_over_an_in_memory_buffer() {
        let mut buf = Vec::new();
        write_frame(&mut buf, b"hello world").unwrap();
        let mut cursor = &buf[..];
        let decoded = read_frame(&mut cursor, DEFAULT_MAX_MESSAGE_SIZE)
            .unwrap()
            .unwrap();
        assert_eq!(decoded, b"hello world");
    }

    #[test]
    fn read_frame_returns_none_on_clean_eof() {
        let mut cursor: &[u8] = &[];
        assert!(read_frame(&mut cursor, DEFAULT_MAX_MESSAGE_SIZE)
            .unwrap()
            .is_none());
    }

    #[test]
    fn oversized_message_is_rejected_before_allocating() {
        let mut buf = Vec::new();
        write_frame(&mut buf, &vec![0u8; 1000]).unwrap();
        let mut cursor = &buf[..];
        assert!(read_frame(&mut cursor, 10).is_err());
    }

    #[test]
    fn server_handshake_validates_protocol_string() {
        let reply = server_handshake(None);
        assert!(validate_server_handshake(&reply).is_ok());
    }

    #[test]
    fn server_handshake_error_is_surfaced() {
        let reply = server_handshake(Some("too many clients"));
        let err = validate_server_handshake(&reply).unwrap_err();
        assert!(err.contains("too many clients"));
    }

    #[test]
    fn get_chunks_round_trips_through_the_wire_dict() {
        let request = get_chunks_request(3);
        assert_eq!(dict_get(&request, "method"), Some(&b"GetChunks"[..]));

        let mut response = BTreeMap::new();
        let chunks_list = super::super::codec::encode_list(&[encode_int(1), encode_int(2)]);
        response.insert(b"chunks".to_vec(), chunks_list);
        let chunks = parse_get_chunks_response(&response, 10).unwrap();
        assert_eq!(chunks, vec![1, 2]);
    }

    #[test]
    fn get_chunks_rejects_out_of_range_chunk_numbers() {
        let mut response = BTreeMap::new();
        let chunks_list = super::super::codec::encode_list(&[encode_int(99)]);
        response.insert(b"chunks".to_vec(), chunks_list);
        assert!(parse_get_chunks_response(&response, 10).is_err());
    }

    #[test]
    fn report_chunk_complete_round_trips() {
        let request = report_chunk_complete_request(2, 17, 4096, &[7u8; 32]);
        assert_eq!(dict_get(&request, "method"), Some(&b"ReportChunkComplete"[..]));

        let mut response = BTreeMap::new();
        response.insert(b"upload".to_vec(), encode_int(1));
        assert!(parse_report_chunk_complete_response(&response).unwrap());

        let mut no_upload = BTreeMap::new();
        no_upload.insert(b"upload".to_vec(), encode_int(0));
        assert!(!parse_report_chunk_complete_response(&no_upload).unwrap());
    }

    #[test]
    fn dict_frame_round_trips_over_a_buffer() {
        let mut buf = Vec::new();
        let request = get_chunks_request(0);
        write_dict_frame(&mut buf, &request).unwrap();
        let mut cursor = &buf[..];
        let decoded = read_dict_frame(&mut cursor, DEFAULT_MAX_MESSAGE_SIZE)
            .unwrap()
            .unwrap();
        assert_eq!(decoded, request);
    }
}
