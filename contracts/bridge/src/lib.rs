//! Committee Bridge Contract - Validator-Signed Token Bridging for Terra
//!
//! A committee of validators, weighted by stake, signs every cross-chain
//! message. Messages travel in a fixed binary layout defined in
//! `bridge_common::message`.
//!
//! # Outbound Flow
//! 1. User sends a listed cw20 (burned) or native coin (escrowed)
//! 2. The contract stores a pending record under the next sequence number
//! 3. Committee members sign the record and the EVM side pays out
//!
//! # Inbound Flow
//! 1. Anyone submits the signed message with `ApproveTokenTransfer`
//! 2. The recipient calls `ClaimToken`, or anyone calls `ClaimAndTransferToken`
//! 3. The claim passes the 24h route limiter, then mints or releases funds
//!
//! # Governance
//! Pausing, blocklisting, limits, prices and token listings all arrive as
//! committee-signed messages through `ExecuteSystemMessage`, in strict
//! per-type sequence order.

pub mod committee;
pub mod contract;
pub mod crypto;
pub mod error;
pub mod events;
mod execute;
pub mod limiter;
pub mod msg;
mod query;
pub mod state;
pub mod treasury;

pub use crate::crypto::{evm_address_from_pubkey, keccak256, message_digest};
pub use crate::error::ContractError;
