//! State definitions for the committee bridge contract
//!
//! All storage lives here. The bridge-wide settings sit behind a versioned
//! wrapper (`BridgeInner`) that every handler loads through `load_inner`.

use bridge_common::{BridgeMessage, ChainId};
use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, Binary, Storage};
use cw_storage_plus::{Item, Map};
use serde::{Deserialize, Serialize};

use crate::error::ContractError;

// ============================================================================
// Constants
// ============================================================================

/// Contract name for cw2 migration info
pub const CONTRACT_NAME: &str = "crates.io:cw-bridge";

/// Contract version for cw2 migration info
pub const CONTRACT_VERSION: &str = "0.1.0";

/// Layout version of `BridgeInner`
pub const CURRENT_VERSION: u64 = 1;

/// Number of hourly buckets in a transfer window
pub const WINDOW_HOURS: usize = 24;

// ============================================================================
// Bridge State
// ============================================================================

/// Bridge-wide settings and the paused flag.
#[cw_serde]
pub struct BridgeInner {
    /// Layout version, checked on every load
    pub version: u64,
    /// The chain this contract runs on
    pub chain_id: ChainId,
    /// Whether the bridge is currently paused
    pub paused: bool,
    /// Platform caller allowed to create the committee and list native tokens
    pub system_address: Addr,
    /// Contract answering the active validator set query
    pub stake_provider: Addr,
}

/// Only the version tag, for inspecting stored state of any layout.
#[derive(Serialize, Deserialize)]
struct InnerVersion {
    version: u64,
}

/// Bridge record for one cross-chain token transfer
#[cw_serde]
pub struct BridgeRecord {
    pub message: BridgeMessage,
    /// Committee signatures once the message is approved
    pub verified_signatures: Option<Vec<Binary>>,
    pub claimed: bool,
}

// ============================================================================
// Committee
// ============================================================================

#[cw_serde]
pub struct CommitteeMember {
    /// Validator account that registered this key
    pub owner: Addr,
    /// 33-byte compressed secp256k1 public key
    pub bridge_pubkey_bytes: Binary,
    /// Voting power in basis points (10000 = 100%)
    pub voting_power: u64,
    /// Where the member's bridge node serves signatures
    pub http_rest_url: String,
    pub blocklisted: bool,
}

#[cw_serde]
pub struct CommitteeMemberRegistration {
    pub owner: Addr,
    pub bridge_pubkey_bytes: Binary,
    pub http_rest_url: String,
}

// ============================================================================
// Rate Limiting
// ============================================================================

/// Rolling 24-hour record of USD notional that crossed one route.
///
/// `per_hour_amounts` is a circular buffer: the bucket for hour `h` lives at
/// index `h % 24`. Only buckets for hours in `[hour_tail, hour_head]` may be
/// non-zero.
#[cw_serde]
pub struct TransferWindow {
    pub hour_head: u64,
    pub hour_tail: u64,
    pub per_hour_amounts: [u64; WINDOW_HOURS],
    pub total_amount: u64,
}

// ============================================================================
// Treasury
// ============================================================================

/// A token enabled for bridging
#[cw_serde]
pub struct TokenMetadata {
    /// Wire id of the token, identical on every chain
    pub id: u8,
    /// cw20 contract address, or bank denom for native tokens
    pub type_name: String,
    /// 10^decimals
    pub decimal_multiplier: u64,
    /// USD price of one whole token, 8 decimals
    pub notional_value: u64,
    /// Native tokens are escrowed and released, foreign ones burned and minted
    pub native_token: bool,
}

/// A registered token waiting for an add-token governance message.
#[cw_serde]
pub struct TokenRegistration {
    pub type_name: String,
    pub decimal: u8,
    pub native_token: bool,
}

// ============================================================================
// Storage
// ============================================================================

/// Versioned bridge settings
pub const BRIDGE_INNER: Item<BridgeInner> = Item::new("bridge_inner");

/// Raw view over the same key, used to read the version of any layout
const BRIDGE_INNER_VERSION: Item<InnerVersion> = Item::new("bridge_inner");

/// Next sequence number per message type
/// Key: message type, Value: next sequence number
pub const SEQUENCE_NUMS: Map<u8, u64> = Map::new("sequence_nums");

/// Transfer records
/// Key: (source chain, message type, sequence number)
pub const BRIDGE_RECORDS: Map<(u8, u8, u64), BridgeRecord> = Map::new("bridge_records");

/// Committee members by compressed public key
pub const COMMITTEE_MEMBERS: Map<&[u8], CommitteeMember> = Map::new("committee_members");

/// Pending registrations by owner
pub const COMMITTEE_REGISTRATIONS: Map<&Addr, CommitteeMemberRegistration> =
    Map::new("committee_registrations");

/// Block height of the last committee creation
pub const LAST_COMMITTEE_UPDATE_EPOCH: Item<u64> = Item::new("last_committee_update_epoch");

/// Notional limit per route (USD, 8 decimals)
/// Key: (source chain, destination chain)
pub const TRANSFER_LIMITS: Map<(u8, u8), u64> = Map::new("transfer_limits");

/// Transfer windows per route
/// Key: (source chain, destination chain)
pub const TRANSFER_WINDOWS: Map<(u8, u8), TransferWindow> = Map::new("transfer_windows");

/// Supported tokens by wire id
pub const SUPPORTED_TOKENS: Map<u8, TokenMetadata> = Map::new("supported_tokens");

/// Wire id by token type name
pub const TOKEN_IDS: Map<&str, u8> = Map::new("token_ids");

/// Registered tokens not yet enabled
/// Key: token type name
pub const WAITING_ROOM: Map<&str, TokenRegistration> = Map::new("waiting_room");

// ============================================================================
// Versioned Access
// ============================================================================

/// Load the bridge settings, failing on any layout other than the current one.
pub fn load_inner(storage: &dyn Storage) -> Result<BridgeInner, ContractError> {
    let found = BRIDGE_INNER_VERSION.load(storage)?.version;
    if found != CURRENT_VERSION {
        return Err(ContractError::WrongInnerVersion {
            expected: CURRENT_VERSION,
            found,
        });
    }
    Ok(BRIDGE_INNER.load(storage)?)
}

pub fn save_inner(storage: &mut dyn Storage, inner: &BridgeInner) -> Result<(), ContractError> {
    BRIDGE_INNER.save(storage, inner)?;
    Ok(())
}

/// Bring stored bridge settings up to `CURRENT_VERSION`.
///
/// Returns the version found before migrating. Layouts newer than this code
/// are rejected.
pub fn migrate_inner(storage: &mut dyn Storage) -> Result<u64, ContractError> {
    let found = BRIDGE_INNER_VERSION.load(storage)?.version;
    match found {
        CURRENT_VERSION => Ok(found),
        // version 1 is the first layout; nothing older was ever deployed
        _ => Err(ContractError::WrongInnerVersion {
            expected: CURRENT_VERSION,
            found,
        }),
    }
}

/// Load the next sequence number for `message_type` and advance the counter.
pub fn next_seq_num(storage: &mut dyn Storage, message_type: u8) -> Result<u64, ContractError> {
    let seq = SEQUENCE_NUMS
        .may_load(storage, message_type)?
        .unwrap_or_default();
    SEQUENCE_NUMS.save(storage, message_type, &(seq + 1))?;
    Ok(seq)
}

pub fn peek_seq_num(storage: &dyn Storage, message_type: u8) -> Result<u64, ContractError> {
    Ok(SEQUENCE_NUMS
        .may_load(storage, message_type)?
        .unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cosmwasm_std::testing::MockStorage;

    fn inner(version: u64) -> BridgeInner {
        BridgeInner {
            version,
            chain_id: ChainId::TerraTestnet,
            paused: false,
            system_address: Addr::unchecked("terra1system"),
            stake_provider: Addr::unchecked("terra1stake"),
        }
    }

    #[test]
    fn test_load_inner_checks_version() {
        let mut storage = MockStorage::new();
        save_inner(&mut storage, &inner(CURRENT_VERSION)).unwrap();
        assert_eq!(load_inner(&storage).unwrap(), inner(CURRENT_VERSION));

        save_inner(&mut storage, &inner(2)).unwrap();
        assert_eq!(
            load_inner(&storage).unwrap_err(),
            ContractError::WrongInnerVersion {
                expected: 1,
                found: 2
            }
        );
        assert!(migrate_inner(&mut storage).is_err());
    }

    #[test]
    fn test_migrate_inner_current_is_noop() {
        let mut storage = MockStorage::new();
        save_inner(&mut storage, &inner(CURRENT_VERSION)).unwrap();
        assert_eq!(migrate_inner(&mut storage).unwrap(), CURRENT_VERSION);
        assert_eq!(load_inner(&storage).unwrap(), inner(CURRENT_VERSION));
    }

    #[test]
    fn test_sequence_counters_are_independent() {
        let mut storage = MockStorage::new();
        assert_eq!(next_seq_num(&mut storage, 0).unwrap(), 0);
        assert_eq!(next_seq_num(&mut storage, 0).unwrap(), 1);
        assert_eq!(next_seq_num(&mut storage, 2).unwrap(), 0);
        assert_eq!(peek_seq_num(&storage, 0).unwrap(), 2);
        assert_eq!(peek_seq_num(&storage, 3).unwrap(), 0);
    }
}
