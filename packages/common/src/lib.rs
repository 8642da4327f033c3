//! Common - Shared Types and Wire Codec for the Committee Bridge
//!
//! This package provides the chain/route whitelist and the bit-exact binary
//! encoding of bridge messages. Both the on-chain contract and off-chain
//! signers must agree on these bytes, so they live in one place.

pub mod chain_ids;
pub mod error;
pub mod message;

pub use chain_ids::{ChainId, Route};
pub use error::CodecError;
pub use message::{BridgeMessage, MessageKey, MessageType};
