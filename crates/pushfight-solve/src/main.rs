//! Worker CLI for the phased retrograde solve: computes phase 0, odd/even
//! phases, back-propagates losses, generates phase input files from deltas,
//! and spot-checks results against known-good checksums.
//!
//! Reference: the original solver's `solve-r0.cc`, `solve-rN.cc`,
//! `backpropagate-losses.cc`, `input-generation.cc`, `input-verification.cc`.

mod coordinator;
mod worker;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use sha2::{Digest, Sha256};

use pushfight_core::chunk::{chunk_r0_file_name, chunk_rn_file_name};
use pushfight_core::constants::NUM_CHUNKS;
use pushfight_core::efcodec::decode_ef_stream;
use pushfight_core::phase::{self, PriorOutcomes};
use pushfight_core::storage::rn::{RnFile, RnFileMut};
use pushfight_core::types::Outcome;

#[derive(Parser, Debug)]
#[command(name = "pushfight-solve")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

/// Manual chunk range, or automatic network-coordinated chunk assignment;
/// exactly one group must be supplied, matching the original tools' flag
/// contract.
#[derive(Args, Debug)]
struct ChunkAssignment {
    #[arg(long)]
    start: Option<i64>,
    #[arg(long)]
    end: Option<i64>,

    #[arg(long)]
    user: Option<String>,
    #[arg(long)]
    machine: Option<String>,
    #[arg(long, default_value = "styx.verver.ch")]
    host: String,
    #[arg(long, default_value = "7429")]
    port: String,
}

enum Assignment {
    Manual {
        start: i64,
        end: i64,
    },
    Automatic {
        user: String,
        machine: String,
        host: String,
        port: String,
    },
}

impl ChunkAssignment {
    fn resolve(&self) -> Result<Assignment> {
        let want_manual = self.start.is_some() || self.end.is_some();
        let want_automatic = self.user.is_some() || self.machine.is_some();
        match (want_manual, want_automatic) {
            (true, false) => {
                let start = self.start.context("--start is required in manual mode")?.max(0);
                let end = self
                    .end
                    .context("--end is required in manual mode")?
                    .min(NUM_CHUNKS);
                Ok(Assignment::Manual { start, end })
            }
            (false, true) => Ok(Assignment::Automatic {
                user: self.user.clone().context("--user is required in automatic mode")?,
                machine: self
                    .machine
                    .clone()
                    .context("--machine is required in automatic mode")?,
                host: self.host.clone(),
                port: self.port.clone(),
            }),
            (false, false) => bail!("must provide either --start and --end, or --user and --machine"),
            (true, true) => bail!("must provide either --start/--end or --user/--machine, but not both"),
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Computes phase 0 (immediate winning moves) for a chunk range.
    Phase0 {
        #[command(flatten)]
        assignment: ChunkAssignment,
    },
    /// Computes an odd phase (N >= 1) against the stored phase N-1 results.
    Solve {
        #[arg(long)]
        phase: u32,
        /// Path to the phase N-1 ternary results file.
        #[arg(long)]
        prior: PathBuf,
        #[command(flatten)]
        assignment: ChunkAssignment,
    },
    /// Back-propagates newly-found losses into wins for an even phase.
    Backprop {
        /// Phase N-1's ternary file, also the output: wins are written in
        /// place.
        #[arg(long)]
        output: PathBuf,
        /// Phase N-3's ternary file, used to detect which losses in
        /// `output` are new. Omit only for phase 2, where every loss is new.
        #[arg(long)]
        since: Option<PathBuf>,
    },
    /// Applies a chunked Elias-Fano delta (EF(losses) ++ EF(wins) per chunk)
    /// to a copy of the previous phase input, producing the next phase's
    /// input file.
    InputGen {
        #[arg(long)]
        previous: PathBuf,
        #[arg(long)]
        diff: PathBuf,
        #[arg(long)]
        output: PathBuf,
    },
    /// Spot-checks chunk checksums of a results file against a known-good
    /// table.
    Verify {
        #[arg(long)]
        path: PathBuf,
        /// `chunk:sha256hex` pairs to check; normally embedded per phase.
        #[arg(long, value_delimiter = ',')]
        known_good: Vec<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Phase0 { assignment } => run_phase0(&assignment),
        Command::Solve {
            phase,
            prior,
            assignment,
        } => run_solve(phase, &prior, &assignment),
        Command::Backprop { output, since } => run_backprop(&output, since.as_deref()),
        Command::InputGen {
            previous,
            diff,
            output,
        } => run_input_gen(&previous, &diff, &output),
        Command::Verify { path, known_good } => run_verify(&path, &known_good),
    }
}

fn run_phase0(assignment: &ChunkAssignment) -> Result<()> {
    let num_threads = rayon::current_num_threads();
    match assignment.resolve()? {
        Assignment::Manual { start, end } => {
            println!(
                "{} {} R0 chunks from {start} to {end} (exclusive) using {num_threads} threads.",
                "Calculating".green(),
                end - start
            );
            for chunk in start..end {
                let filename = chunk_r0_file_name(chunk);
                if Path::new(&filename).exists() {
                    eprintln!("Chunk {chunk} already exists. Skipping...");
                    continue;
                }
                let bits = worker::run_phase0_chunk(chunk, num_threads);
                fs::write(&filename, worker::encode_bits(&bits))
                    .with_context(|| format!("writing {filename}"))?;
                println!("Chunk {chunk} done.");
            }
            Ok(())
        }
        Assignment::Automatic { .. } => {
            bail!("phase 0 is always assigned manually; there is no network mode")
        }
    }
}

fn run_solve(phase: u32, prior_path: &Path, assignment: &ChunkAssignment) -> Result<()> {
    if phase == 0 {
        bail!("use the `phase0` subcommand for phase 0");
    }
    let expected = if phase % 2 == 0 {
        Outcome::Win
    } else {
        Outcome::Loss
    };
    println!("Expected outcome: {expected}.");
    let prior = RnFile::open(prior_path).with_context(|| format!("opening {}", prior_path.display()))?;

    match assignment.resolve()? {
        Assignment::Manual { start, end } => {
            println!(
                "{} {} R{phase} chunks from {start} to {end} (exclusive).",
                "Calculating".green(),
                end - start
            );
            for chunk in start..end {
                let filename = chunk_rn_file_name(chunk, phase);
                if Path::new(&filename).exists() {
                    eprintln!("Chunk {chunk} already exists. Skipping...");
                    continue;
                }
                let current = |i: i64| prior.get(i);
                let (outcomes, stats) = worker::run_phase_chunk(
                    chunk,
                    expected,
                    &current,
                    &prior as &(dyn PriorOutcomes + Sync),
                );
                fs::write(&filename, worker::encode_outcomes(&outcomes))
                    .with_context(|| format!("writing {filename}"))?;
                println!(
                    "Chunk {chunk} done: kept={} changed={} unchanged={}.",
                    stats.kept, stats.changed, stats.unchanged
                );
            }
            Ok(())
        }
        Assignment::Automatic {
            user,
            machine,
            host,
            port,
        } => run_solve_automatic(phase, expected, &prior, &host, &port, &user, &machine),
    }
}

fn run_solve_automatic(
    phase: u32,
    expected: Outcome,
    prior: &RnFile,
    host: &str,
    port: &str,
    user: &str,
    machine: &str,
) -> Result<()> {
    let mut backoff = coordinator::Backoff::new(5, 600);
    loop {
        println!("Queue is empty. Fetching more chunks from the server at {host}:{port}...");
        let mut client = match coordinator::Client::connect(host, port, user, machine) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Failed to connect: {e}");
                backoff.sleep();
                continue;
            }
        };
        let chunks = match client.get_chunks(phase, NUM_CHUNKS as u64) {
            Ok(c) if !c.is_empty() => c,
            Ok(_) => {
                eprintln!("Server has no more chunks available!");
                backoff.sleep();
                continue;
            }
            Err(e) => {
                eprintln!("Failed to get chunks: {e}");
                backoff.sleep();
                continue;
            }
        };
        backoff.reset();
        println!("Server returned {} more chunks to solve.", chunks.len());
        for chunk in chunks {
            process_one_chunk_automatic(phase, expected, prior, chunk as i64, &mut client)?;
        }
    }
}

fn process_one_chunk_automatic(
    phase: u32,
    expected: Outcome,
    prior: &RnFile,
    chunk: i64,
    client: &mut coordinator::Client,
) -> Result<()> {
    let filename = chunk_rn_file_name(chunk, phase);
    let bytes = if Path::new(&filename).exists() {
        println!("Chunk output already exists. Loading...");
        fs::read(&filename)?
    } else {
        println!("Calculating chunk {chunk}...");
        let current = |i: i64| prior.get(i);
        let (outcomes, _stats) =
            worker::run_phase_chunk(chunk, expected, &current, prior as &(dyn PriorOutcomes + Sync));
        let bytes = worker::encode_outcomes(&outcomes);
        fs::write(&filename, &bytes)?;
        bytes
    };
    println!("Chunk complete! Reporting result to server...");
    let hash: [u8; 32] = Sha256::digest(&bytes).into();
    let wants_upload = client.report_chunk_complete(phase, chunk as u64, bytes.len() as u64, &hash)?;
    if wants_upload {
        let compressed_size = client.upload_chunk(&bytes)?;
        println!(
            "Successfully uploaded chunk to server! ({} bytes; {compressed_size} bytes compressed)",
            bytes.len()
        );
    } else {
        println!("Successfully reported result to server! (No upload required.)");
    }
    Ok(())
}

fn run_backprop(output_path: &Path, since_path: Option<&Path>) -> Result<()> {
    let mut acc =
        RnFileMut::open(output_path).with_context(|| format!("opening {}", output_path.display()))?;
    let since = since_path
        .map(RnFile::open)
        .transpose()
        .with_context(|| "opening --since file".to_string())?;

    let total = pushfight_core::constants::TOTAL_PERMS;
    let new_loss_ranks = (0..total).filter(|&i| match &since {
        Some(s) => s.get(i) == Outcome::Tie && acc.get(i) == Outcome::Loss,
        None => acc.get(i) == Outcome::Loss,
    });

    let mut new_wins = Vec::new();
    phase::back_propagate_losses(new_loss_ranks, |i| acc.get(i), |i| new_wins.push(i));

    for &i in &new_wins {
        acc.set(i, Outcome::Win);
    }
    acc.flush()?;
    println!("Backpropagation done: {} new wins written.", new_wins.len());
    Ok(())
}

fn run_input_gen(previous_path: &Path, diff_path: &Path, output_path: &Path) -> Result<()> {
    if !output_path.exists() {
        fs::rename(previous_path, output_path).with_context(|| {
            format!(
                "renaming {} to {}",
                previous_path.display(),
                output_path.display()
            )
        })?;
    }
    let diff_bytes = fs::read(diff_path).with_context(|| format!("reading {}", diff_path.display()))?;
    if diff_bytes.is_empty() {
        bail!("diff file {} is empty", diff_path.display());
    }

    let mut acc =
        RnFileMut::open(output_path).with_context(|| format!("opening {}", output_path.display()))?;
    let mut cursor = &diff_bytes[..];
    let mut total_changes = 0i64;
    for chunk in 0..NUM_CHUNKS {
        for &new_outcome in &[Outcome::Loss, Outcome::Win] {
            let (indices, consumed) =
                decode_ef_stream(cursor).with_context(|| format!("decoding chunk {chunk} delta"))?;
            cursor = &cursor[consumed..];
            for i in indices {
                let current = acc.get(i);
                if current == new_outcome {
                    continue;
                }
                if current != Outcome::Tie {
                    bail!(
                        "{}: permutation {i} is marked {current} but should become {new_outcome}",
                        output_path.display()
                    );
                }
                acc.set(i, new_outcome);
                total_changes += 1;
            }
        }
        if chunk % 500 == 0 {
            println!("Chunk {chunk} / {NUM_CHUNKS} applied.");
        }
    }
    acc.flush()?;
    println!("Input generation done: {total_changes} positions changed.");
    Ok(())
}

fn run_verify(path: &Path, known_good: &[String]) -> Result<()> {
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let mut failures = 0;
    for entry in known_good {
        let (chunk_str, hash_hex) = entry
            .split_once(':')
            .context("--known-good entries must be `chunk:sha256hex`")?;
        let chunk: i64 = chunk_str.parse().context("invalid chunk number")?;
        let chunk_bytes_per_digit = (pushfight_core::constants::CHUNK_SIZE / 5) as usize;
        let start = chunk as usize * chunk_bytes_per_digit;
        let end = start + chunk_bytes_per_digit;
        let slice = bytes.get(start..end).context("chunk range out of bounds")?;
        let digest = hex::encode(Sha256::digest(slice));
        if digest != hash_hex {
            eprintln!("Chunk {chunk}: checksum mismatch (expected {hash_hex}, got {digest}).");
            failures += 1;
        }
    }
    if failures > 0 {
        bail!("{failures} chunk(s) failed verification");
    }
    println!("All {} checked chunks verified.", known_good.len());
    Ok(())
}
