//! Protocol module containing message types and the binary codec.

pub mod codec;
pub mod messages;

pub use codec::{decode_framed, decode_payload, encode_framed, encode_payload, DecodeError};
pub use messages::*;
