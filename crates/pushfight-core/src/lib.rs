//! Engine library for the Push Fight retrograde solver: permutation codec,
//! board rules, the forward/backward search kernel, on-disk storage
//! accessors, the Elias-Fano delta codec, phase-driver logic, the
//! minimization pipeline, and the coordinator wire protocol.
//!
//! Reference: the original maksverver/pushfight solver (`examples/original_source/`).

pub mod board;
pub mod chunk;
pub mod constants;
pub mod efcodec;
pub mod error;
pub mod minimize;
pub mod moves;
pub mod perm;
pub mod phase;
pub mod piece;
pub mod protocol;
pub mod search;
pub mod storage;
pub mod types;
