//! Post-processing CLI: merges per-phase results into one value-per-position
//! array, then collapses that down to the dense, rotation-canonical
//! reachable index space.
//!
//! Reference: the original solver's `merge-phases.cc` and
//! `minify-merged.cc`.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;

use pushfight_core::constants::{CHUNK_SIZE, NUM_CHUNKS, TOTAL_MINIMIZED, TOTAL_PERMS};
use pushfight_core::efcodec::decode_ef_stream;
use pushfight_core::minimize::{
    fold_value, minify, value_for_even_phase, value_for_immediately_lost, value_for_r0,
};
use pushfight_core::perm::Perm;
use pushfight_core::search::generate_successors;
use pushfight_core::storage::merged::MergedFile;
use pushfight_core::storage::minimized::MinimizedFileMut;
use pushfight_core::storage::r0::R0File;
use pushfight_core::storage::rn::RnFile;
use pushfight_core::types::Value;

#[derive(Parser, Debug)]
#[command(name = "pushfight-minimize")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Collapses `r0.bin` plus every even phase's results into one merged,
    /// per-global-rank value byte.
    Merge {
        #[arg(long)]
        r0: PathBuf,
        /// A full ternary phase file, as `phase:path` (e.g. `2:r2.bin`).
        /// Repeat in ascending phase order for every even phase that
        /// completed without a Tie remainder.
        #[arg(long = "rn", value_parser = parse_phase_file)]
        rn_files: Vec<PhaseFile>,
        /// A chunked Elias-Fano delta file, as `phase:path`, for an even
        /// phase that was only run incrementally against its predecessor.
        #[arg(long = "diff", value_parser = parse_phase_file)]
        diffs: Vec<PhaseFile>,
        #[arg(long)]
        output: PathBuf,
    },
    /// Walks `merged.bin` in canonical reachable order and writes
    /// `minimized.bin`.
    Minimize {
        #[arg(long)]
        merged: PathBuf,
        #[arg(long)]
        output: PathBuf,
    },
}

#[derive(Clone, Debug)]
struct PhaseFile {
    phase: u32,
    path: PathBuf,
}

fn parse_phase_file(s: &str) -> Result<PhaseFile, String> {
    let (phase_str, path_str) = s
        .split_once(':')
        .ok_or_else(|| format!("expected `phase:path`, got `{s}`"))?;
    let phase: u32 = phase_str
        .parse()
        .map_err(|_| format!("invalid phase number `{phase_str}`"))?;
    Ok(PhaseFile {
        phase,
        path: PathBuf::from(path_str),
    })
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Merge {
            r0,
            rn_files,
            diffs,
            output,
        } => run_merge(&r0, &rn_files, &diffs, &output),
        Command::Minimize { merged, output } => run_minimize(&merged, &output),
    }
}

/// True iff the mover at `perm` has no legal move at all: an immediate,
/// zero-ply loss.
fn is_immediately_lost(perm: &Perm) -> bool {
    let mut has_move = false;
    generate_successors(perm, &mut |_moves, _succ, _outcome| {
        has_move = true;
        false
    });
    !has_move
}

fn run_merge(
    r0_path: &Path,
    rn_files: &[PhaseFile],
    diffs: &[PhaseFile],
    output_path: &Path,
) -> Result<()> {
    let r0 = R0File::open(r0_path).with_context(|| format!("opening {}", r0_path.display()))?;
    let rn: Vec<(u32, RnFile)> = rn_files
        .iter()
        .map(|pf| {
            RnFile::open(&pf.path)
                .map(|f| (pf.phase, f))
                .with_context(|| format!("opening {}", pf.path.display()))
        })
        .collect::<Result<_>>()?;
    let mut diff_cursors: Vec<(u32, &[u8])> = Vec::with_capacity(diffs.len());
    let diff_bytes: Vec<Vec<u8>> = diffs
        .iter()
        .map(|pf| fs_read(&pf.path))
        .collect::<Result<_>>()?;
    for (pf, bytes) in diffs.iter().zip(diff_bytes.iter()) {
        diff_cursors.push((pf.phase, bytes.as_slice()));
    }

    let mut writer = BufWriter::new(
        File::create(output_path).with_context(|| format!("creating {}", output_path.display()))?,
    );

    println!(
        "{} {NUM_CHUNKS} chunks ({TOTAL_PERMS} positions total).",
        "Merging".green()
    );
    for chunk in 0..NUM_CHUNKS {
        let mut per_diff_losses: Vec<Vec<i64>> = Vec::with_capacity(diff_cursors.len());
        let mut per_diff_wins: Vec<Vec<i64>> = Vec::with_capacity(diff_cursors.len());
        for (phase, cursor) in diff_cursors.iter_mut() {
            let (losses, consumed) =
                decode_ef_stream(cursor).with_context(|| format!("decoding phase {phase} losses, chunk {chunk}"))?;
            *cursor = &cursor[consumed..];
            let (wins, consumed) =
                decode_ef_stream(cursor).with_context(|| format!("decoding phase {phase} wins, chunk {chunk}"))?;
            *cursor = &cursor[consumed..];
            per_diff_losses.push(losses);
            per_diff_wins.push(wins);
        }
        let mut loss_pos = vec![0usize; diff_cursors.len()];
        let mut win_pos = vec![0usize; diff_cursors.len()];

        let base = chunk * CHUNK_SIZE;
        let mut perm = Perm::unrank(base);
        let mut chunk_output = vec![0u8; CHUNK_SIZE as usize];
        for offset in 0..CHUNK_SIZE {
            let index = base + offset;
            let mut value = Value::TIE;
            value = fold_value(
                value,
                is_immediately_lost(&perm).then(value_for_immediately_lost),
            );
            value = fold_value(value, value_for_r0(r0.get(index)));
            for &(phase, ref file) in &rn {
                value = fold_value(value, value_for_even_phase(phase, file.get(index)));
            }
            for (i, &(phase, _)) in diff_cursors.iter().enumerate() {
                if loss_pos[i] < per_diff_losses[i].len() && per_diff_losses[i][loss_pos[i]] == index {
                    value = fold_value(value, Some(Value::loss(phase / 2)));
                    loss_pos[i] += 1;
                }
                if win_pos[i] < per_diff_wins[i].len() && per_diff_wins[i][win_pos[i]] == index {
                    value = fold_value(value, Some(Value::win(phase / 2 + 1)));
                    win_pos[i] += 1;
                }
            }
            chunk_output[offset as usize] = value.0;
            if offset + 1 < CHUNK_SIZE {
                perm.advance();
            }
        }
        writer.write_all(&chunk_output)?;
        if chunk % 500 == 0 {
            println!("Chunk {chunk} / {NUM_CHUNKS} merged.");
        }
    }
    writer.flush()?;
    println!("Merge done: wrote {} to {}.", TOTAL_PERMS, output_path.display());
    Ok(())
}

fn fs_read(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("reading {}", path.display()))
}

fn run_minimize(merged_path: &Path, output_path: &Path) -> Result<()> {
    let merged =
        MergedFile::open(merged_path).with_context(|| format!("opening {}", merged_path.display()))?;
    File::create(output_path)
        .and_then(|f| f.set_len(TOTAL_MINIMIZED as u64))
        .with_context(|| format!("pre-sizing {}", output_path.display()))?;
    let mut out = MinimizedFileMut::open(output_path)
        .with_context(|| format!("opening {}", output_path.display()))?;

    let mut written = 0i64;
    minify(
        |rank| merged.get(rank),
        |min_index, value| {
            out.write(min_index, value);
            written += 1;
        },
    );
    out.flush()?;
    println!(
        "Minimization done: {written} decisive positions written out of {TOTAL_MINIMIZED} reachable canonical positions."
    );
    Ok(())
}
