//! Message types for the committee bridge contract
//!
//! Cross-chain messages travel inside these JSON messages as raw wire bytes
//! (`Binary`); see `bridge_common::message` for their layout.

use bridge_common::message::TokenTransferPayload;
use bridge_common::BridgeMessage;
use cosmwasm_schema::{cw_serde, QueryResponses};
use cosmwasm_std::{Addr, Binary};

use crate::state::{CommitteeMember, CommitteeMemberRegistration, TokenMetadata, TransferWindow};

// ============================================================================
// Instantiate & Migrate
// ============================================================================

/// Migrate message
#[cw_serde]
pub struct MigrateMsg {}

/// Instantiate message
#[cw_serde]
pub struct InstantiateMsg {
    /// Wire chain id of the chain this contract runs on (0, 1 or 2)
    pub chain_id: u8,
    /// Platform address allowed to create the committee and list native tokens
    pub system_address: String,
    /// Contract answering `StakeProviderQueryMsg::ActiveValidators`
    pub stake_provider: String,
}

// ============================================================================
// Execute Messages
// ============================================================================

/// Execute messages
#[cw_serde]
pub enum ExecuteMsg {
    // ========================================================================
    // Token Transfers
    // ========================================================================
    /// Bridge the single native coin attached to this message
    SendToken {
        /// Destination chain id
        target_chain: u8,
        /// 20-byte EVM recipient
        target_address: Binary,
    },

    /// Bridge a cw20 token (called via cw20 `Send` with `ReceiveMsg`)
    Receive(cw20::Cw20ReceiveMsg),

    /// Attach committee signatures to a token transfer
    ///
    /// Authorization: Anyone (signatures are checked)
    ApproveTokenTransfer {
        /// Wire-encoded token transfer message
        message: Binary,
        /// 65-byte recoverable secp256k1 signatures
        signatures: Vec<Binary>,
    },

    /// Claim an approved inbound transfer
    ///
    /// Authorization: The transfer recipient only
    ClaimToken { source_chain: u8, seq_num: u64 },

    /// Claim an approved inbound transfer on behalf of its recipient
    ///
    /// Authorization: Anyone (funds always go to the recipient)
    ClaimAndTransferToken { source_chain: u8, seq_num: u64 },

    // ========================================================================
    // Governance
    // ========================================================================
    /// Execute a committee-signed governance message
    ///
    /// Authorization: Anyone (signatures are checked)
    ExecuteSystemMessage {
        message: Binary,
        signatures: Vec<Binary>,
    },

    // ========================================================================
    // Committee
    // ========================================================================
    /// Register the sender's bridge key for the next committee
    ///
    /// Authorization: Active validators only
    RegisterCommittee {
        /// 33-byte compressed secp256k1 key
        bridge_pubkey_bytes: Binary,
        http_rest_url: String,
    },

    /// Change the service URL of the sender's committee seat
    UpdateNodeUrl { new_url: String },

    /// Create the committee from current registrations if none exists
    ///
    /// Authorization: System address only
    InitCommittee {
        /// Minimum stake (whole percent) the registrations must represent
        min_stake_participation_percentage: u64,
    },

    // ========================================================================
    // Treasury
    // ========================================================================
    /// Register a cw20 token whose minter is this contract
    RegisterForeignToken { token: String },

    /// Register a bank denom for escrow-based bridging
    ///
    /// Authorization: System address only
    RegisterNativeToken { denom: String, decimals: u8 },
}

/// cw20 receive hook messages
#[cw_serde]
pub enum ReceiveMsg {
    SendToken {
        target_chain: u8,
        target_address: Binary,
    },
}

// ============================================================================
// Query Messages
// ============================================================================

#[cw_serde]
#[derive(QueryResponses)]
pub enum QueryMsg {
    #[returns(ConfigResponse)]
    Config {},

    /// Next sequence number for a message type
    #[returns(SeqNumResponse)]
    SeqNum { message_type: u8 },

    #[returns(TransferStatusResponse)]
    TokenTransferStatus { source_chain: u8, seq_num: u64 },

    #[returns(TransferSignaturesResponse)]
    TokenTransferSignatures { source_chain: u8, seq_num: u64 },

    #[returns(ParsedTokenTransferResponse)]
    ParsedTokenTransferMessage { source_chain: u8, seq_num: u64 },

    #[returns(CommitteeMembersResponse)]
    CommitteeMembers {
        start_after: Option<Binary>,
        limit: Option<u32>,
    },

    #[returns(CommitteeRegistrationsResponse)]
    CommitteeRegistrations {
        start_after: Option<String>,
        limit: Option<u32>,
    },

    #[returns(RouteLimitResponse)]
    RouteLimit { source: u8, destination: u8 },

    #[returns(TokenMetadata)]
    Token { token_id: u8 },

    #[returns(TokensResponse)]
    Tokens {
        start_after: Option<u8>,
        limit: Option<u32>,
    },
}

// ============================================================================
// Query Responses
// ============================================================================

#[cw_serde]
pub struct ConfigResponse {
    pub chain_id: u8,
    pub paused: bool,
    pub system_address: Addr,
    pub stake_provider: Addr,
    pub version: u64,
    pub last_committee_update_epoch: Option<u64>,
}

#[cw_serde]
pub struct SeqNumResponse {
    pub message_type: u8,
    pub next_seq_num: u64,
}

#[cw_serde]
pub enum TransferStatus {
    Pending,
    Approved,
    Claimed,
    NotFound,
}

#[cw_serde]
pub struct TransferStatusResponse {
    pub status: TransferStatus,
}

#[cw_serde]
pub struct TransferSignaturesResponse {
    pub signatures: Option<Vec<Binary>>,
}

#[cw_serde]
pub struct ParsedTokenTransferResponse {
    pub message: Option<BridgeMessage>,
    pub payload: Option<TokenTransferPayload>,
}

#[cw_serde]
pub struct CommitteeMembersResponse {
    pub members: Vec<CommitteeMember>,
}

#[cw_serde]
pub struct CommitteeRegistrationsResponse {
    pub registrations: Vec<CommitteeMemberRegistration>,
}

#[cw_serde]
pub struct RouteLimitResponse {
    /// `None` when the route is not limited on this chain
    pub limit: Option<u64>,
    pub window: Option<TransferWindow>,
    /// Window buckets from oldest to newest
    pub hourly_amounts: Vec<u64>,
}

#[cw_serde]
pub struct TokensResponse {
    pub tokens: Vec<TokenMetadata>,
}

// ============================================================================
// Stake Provider Interface
// ============================================================================

/// Query served by the stake provider contract
#[cw_serde]
#[derive(QueryResponses)]
pub enum StakeProviderQueryMsg {
    #[returns(ActiveValidatorsResponse)]
    ActiveValidators {},
}

#[cw_serde]
pub struct ActiveValidator {
    pub address: String,
    /// Basis points of total stake (10000 = 100%)
    pub voting_power: u64,
}

#[cw_serde]
pub struct ActiveValidatorsResponse {
    pub validators: Vec<ActiveValidator>,
}
