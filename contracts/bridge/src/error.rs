//! Error types for the committee bridge contract
//!
//! Hard failures revert the whole call. The retry-safe outcomes (already
//! approved, already claimed, limit exceeded) are not errors; handlers report
//! them as successful responses carrying a dedicated event.

use bridge_common::CodecError;
use cosmwasm_std::StdError;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ContractError {
    #[error("{0}")]
    Std(#[from] StdError),

    // ========================================================================
    // Message Errors
    // ========================================================================

    #[error("Malformed message: {0}")]
    MalformedMessage(#[from] CodecError),

    #[error("Message does not match the stored record")]
    MessageMismatch,

    #[error("Unexpected message version: expected {expected}, got {got}")]
    UnexpectedMessageVersion { expected: u8, got: u8 },

    #[error("Unexpected message type: {message_type}")]
    UnexpectedMessageType { message_type: u8 },

    #[error("Unexpected sequence number: expected {expected}, got {got}")]
    UnexpectedSeqNum { expected: u64, got: u64 },

    #[error("Add-token vectors have mismatched lengths")]
    TokenVectorLengthMismatch,

    // ========================================================================
    // Chain & Route Errors
    // ========================================================================

    #[error("Invalid chain ID: {chain_id}")]
    InvalidChainId { chain_id: u8 },

    #[error("Unexpected chain ID: {chain_id}")]
    UnexpectedChainId { chain_id: u8 },

    #[error("Invalid route: {source_chain} -> {destination_chain}")]
    InvalidRoute {
        source_chain: u8,
        destination_chain: u8,
    },

    #[error("Invalid EVM address: expected 20 bytes, got {got}")]
    InvalidEvmAddress { got: usize },

    // ========================================================================
    // Authorization Errors
    // ========================================================================

    #[error("Unauthorized: only the system address can perform this action")]
    NotSystemAddress,

    #[error("Unauthorized claim")]
    UnauthorizedClaim,

    // ========================================================================
    // Signature Errors
    // ========================================================================

    #[error("Duplicate signer")]
    DuplicateSigner,

    #[error("Signer is not a committee member")]
    UnknownSigner,

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Insufficient voting power: got {got}, need {required}")]
    BelowThreshold { got: u64, required: u64 },

    // ========================================================================
    // Record Errors
    // ========================================================================

    #[error("Bridge record not found")]
    RecordNotFound,

    // ========================================================================
    // Bridge State Errors
    // ========================================================================

    #[error("Bridge is paused")]
    BridgePaused,

    #[error("Bridge is already paused")]
    AlreadyPaused,

    #[error("Bridge is not paused")]
    NotPaused,

    #[error("Wrong bridge state version: expected {expected}, found {found}")]
    WrongInnerVersion { expected: u64, found: u64 },

    // ========================================================================
    // Committee Errors
    // ========================================================================

    #[error("Committee already initiated")]
    CommitteeAlreadyInitiated,

    #[error("Invalid pubkey length: expected 33 bytes, got {got}")]
    InvalidPubkeyLength { got: usize },

    #[error("Invalid pubkey: not a secp256k1 point")]
    InvalidPubkey,

    #[error("Duplicate pubkey")]
    DuplicatePubkey,

    #[error("Sender is not an active validator")]
    SenderNotActiveValidator,

    #[error("Sender is not a committee member")]
    SenderNotInCommittee,

    #[error("Unknown committee member")]
    UnknownMember,

    // ========================================================================
    // Token & Amount Errors
    // ========================================================================

    #[error("Unsupported token type: {token}")]
    UnsupportedTokenType { token: String },

    #[error("Token already supported: {token}")]
    TokenAlreadySupported { token: String },

    #[error("Token not registered: {token}")]
    TokenNotRegistered { token: String },

    #[error("Invalid denom: {denom:?}")]
    InvalidDenom { denom: String },

    #[error("Token minter must be the bridge contract")]
    InvalidTokenMinter,

    #[error("Invalid notional value")]
    InvalidNotionalValue,

    #[error("Token value is zero")]
    TokenValueIsZero,

    #[error("No funds sent")]
    NoFundsSent,

    #[error("Invalid amount: {reason}")]
    InvalidAmount { reason: String },

    // ========================================================================
    // Rate Limit Errors
    // ========================================================================

    #[error("No transfer limit for route {source_chain} -> {destination_chain}")]
    LimitNotFoundForRoute {
        source_chain: u8,
        destination_chain: u8,
    },
}
