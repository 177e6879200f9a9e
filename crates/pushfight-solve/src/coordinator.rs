//! A synchronous TCP client for the chunk-assignment coordinator.
//!
//! Reference: the original solver's `client/client.cc`.

use std::io::Write as _;
use std::net::TcpStream;

use anyhow::{Context, Result, bail};
use flate2::Compression;
use flate2::write::ZlibEncoder;
use pushfight_core::protocol::frame::{
    DEFAULT_MAX_MESSAGE_SIZE, client_handshake, get_chunks_request, parse_get_chunks_response,
    parse_report_chunk_complete_response, read_dict_frame, report_chunk_complete_request,
    validate_server_handshake, write_dict_frame,
};

const SOLVER_ID: &str = "pushfight-solve-v1.0.0";

/// An open, handshaken connection to the coordinator.
pub struct Client {
    socket: TcpStream,
}

impl Client {
    /// Connects to `host:port` and performs the protocol handshake,
    /// identifying this process as `user`/`machine`.
    pub fn connect(host: &str, port: &str, user: &str, machine: &str) -> Result<Client> {
        let socket = TcpStream::connect((host, port.parse::<u16>().context("invalid port")?))
            .with_context(|| format!("failed to connect to {host}:{port}"))?;
        let mut client = Client { socket };
        let handshake = client_handshake(SOLVER_ID, user, machine);
        write_dict_frame(&mut client.socket, &handshake).context("failed to send handshake")?;
        let reply = read_dict_frame(&mut client.socket, DEFAULT_MAX_MESSAGE_SIZE)
            .ok()
            .flatten()
            .context("server refused handshake")?;
        validate_server_handshake(&reply).map_err(anyhow::Error::msg)?;
        Ok(client)
    }

    /// Requests a batch of chunks to work on for `phase`.
    pub fn get_chunks(&mut self, phase: u32, num_chunks: u64) -> Result<Vec<u64>> {
        let request = get_chunks_request(phase);
        write_dict_frame(&mut self.socket, &request).context("failed to send request")?;
        let response = read_dict_frame(&mut self.socket, DEFAULT_MAX_MESSAGE_SIZE)
            .ok()
            .flatten()
            .context("no response")?;
        parse_get_chunks_response(&response, num_chunks).map_err(anyhow::Error::msg)
    }

    /// Reports a completed chunk's checksum; returns `true` if the server
    /// wants the result file uploaded, in which case `upload_chunk` should be
    /// called next with the same bytes.
    pub fn report_chunk_complete(
        &mut self,
        phase: u32,
        chunk: u64,
        bytesize: u64,
        sha256sum: &[u8; 32],
    ) -> Result<bool> {
        let request = report_chunk_complete_request(phase, chunk, bytesize, sha256sum);
        write_dict_frame(&mut self.socket, &request).context("failed to send request")?;
        let response = read_dict_frame(&mut self.socket, DEFAULT_MAX_MESSAGE_SIZE)
            .ok()
            .flatten()
            .context("no response")?;
        parse_report_chunk_complete_response(&response).map_err(anyhow::Error::msg)
    }

    /// Uploads a chunk's raw bytes, zlib-compressed at the maximum level.
    pub fn upload_chunk(&mut self, bytes: &[u8]) -> Result<usize> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::best());
        encoder.write_all(bytes)?;
        let compressed = encoder.finish()?;
        pushfight_core::protocol::frame::write_frame(&mut self.socket, &compressed)
            .context("failed to upload chunk")?;
        Ok(compressed.len())
    }
}

/// Capped exponential backoff for the automatic-mode fetch loop: starts at
/// `min_seconds`, doubles on each failed attempt, capped at `max_seconds`.
pub struct Backoff {
    seconds: u64,
    min_seconds: u64,
    max_seconds: u64,
}

impl Backoff {
    pub fn new(min_seconds: u64, max_seconds: u64) -> Backoff {
        Backoff {
            seconds: 0,
            min_seconds,
            max_seconds,
        }
    }

    pub fn reset(&mut self) {
        self.seconds = 0;
    }

    pub fn sleep(&mut self) {
        self.seconds = if self.seconds == 0 {
            self.min_seconds
        } else {
            (self.seconds * 2).min(self.max_seconds)
        };
        eprintln!("Sleeping for {} seconds before retrying...", self.seconds);
        std::thread::sleep(std::time::Duration::from_secs(self.seconds));
    }
}

pub fn require_valid_phase(phase: u32) -> Result<()> {
    if phase < 1 {
        bail!("invalid phase; must be 1 or higher for network-coordinated solving");
    }
    Ok(())
}
