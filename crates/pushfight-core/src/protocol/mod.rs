//! The coordinator wire protocol: a length-prefixed binary dictionary
//! encoding (`codec`) and the socket framing plus handshake/RPC message
//! shapes built on top of it (`frame`).

pub mod codec;
pub mod frame;
