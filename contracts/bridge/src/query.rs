//! Query handlers for the committee bridge contract.

use bridge_common::chain_ids::get_route;
use bridge_common::{ChainId, MessageKey, MessageType};
use cosmwasm_std::{Addr, Binary, Deps, Order, StdError, StdResult};
use cw_storage_plus::Bound;

use crate::msg::{
    CommitteeMembersResponse, CommitteeRegistrationsResponse, ConfigResponse,
    ParsedTokenTransferResponse, RouteLimitResponse, SeqNumResponse, TokensResponse,
    TransferSignaturesResponse, TransferStatus, TransferStatusResponse,
};
use crate::state::{
    load_inner, BridgeRecord, TokenMetadata, BRIDGE_RECORDS, COMMITTEE_MEMBERS,
    COMMITTEE_REGISTRATIONS, LAST_COMMITTEE_UPDATE_EPOCH, SEQUENCE_NUMS, SUPPORTED_TOKENS,
    TRANSFER_LIMITS, TRANSFER_WINDOWS,
};

const DEFAULT_LIMIT: u32 = 10;
const MAX_LIMIT: u32 = 50;

fn chain_id(id: u8) -> StdResult<ChainId> {
    ChainId::try_from(id).map_err(|e| StdError::generic_err(e.to_string()))
}

fn load_transfer_record(
    deps: Deps,
    source_chain: u8,
    seq_num: u64,
) -> StdResult<Option<BridgeRecord>> {
    let key = MessageKey::new(chain_id(source_chain)?, MessageType::TokenTransfer, seq_num);
    BRIDGE_RECORDS.may_load(deps.storage, key.key())
}

// ============================================================================
// Core Queries
// ============================================================================

/// Query bridge settings.
pub fn query_config(deps: Deps) -> StdResult<ConfigResponse> {
    let inner = load_inner(deps.storage).map_err(|e| StdError::generic_err(e.to_string()))?;
    Ok(ConfigResponse {
        chain_id: inner.chain_id.as_u8(),
        paused: inner.paused,
        system_address: inner.system_address,
        stake_provider: inner.stake_provider,
        version: inner.version,
        last_committee_update_epoch: LAST_COMMITTEE_UPDATE_EPOCH.may_load(deps.storage)?,
    })
}

/// Query the next sequence number of a message type.
pub fn query_seq_num(deps: Deps, message_type: u8) -> StdResult<SeqNumResponse> {
    MessageType::try_from(message_type).map_err(|e| StdError::generic_err(e.to_string()))?;
    let next_seq_num = SEQUENCE_NUMS
        .may_load(deps.storage, message_type)?
        .unwrap_or_default();
    Ok(SeqNumResponse {
        message_type,
        next_seq_num,
    })
}

// ============================================================================
// Transfer Queries
// ============================================================================

pub fn query_token_transfer_status(
    deps: Deps,
    source_chain: u8,
    seq_num: u64,
) -> StdResult<TransferStatusResponse> {
    let status = match load_transfer_record(deps, source_chain, seq_num)? {
        None => TransferStatus::NotFound,
        Some(record) if record.claimed => TransferStatus::Claimed,
        Some(record) if record.verified_signatures.is_some() => TransferStatus::Approved,
        Some(_) => TransferStatus::Pending,
    };
    Ok(TransferStatusResponse { status })
}

pub fn query_token_transfer_signatures(
    deps: Deps,
    source_chain: u8,
    seq_num: u64,
) -> StdResult<TransferSignaturesResponse> {
    let signatures = load_transfer_record(deps, source_chain, seq_num)?
        .and_then(|record| record.verified_signatures);
    Ok(TransferSignaturesResponse { signatures })
}

pub fn query_parsed_token_transfer_message(
    deps: Deps,
    source_chain: u8,
    seq_num: u64,
) -> StdResult<ParsedTokenTransferResponse> {
    let Some(record) = load_transfer_record(deps, source_chain, seq_num)? else {
        return Ok(ParsedTokenTransferResponse {
            message: None,
            payload: None,
        });
    };
    let payload = record
        .message
        .extract_token_transfer_payload()
        .map_err(|e| StdError::generic_err(e.to_string()))?;
    Ok(ParsedTokenTransferResponse {
        message: Some(record.message),
        payload: Some(payload),
    })
}

// ============================================================================
// Committee Queries
// ============================================================================

/// Query paginated committee members, ordered by public key.
pub fn query_committee_members(
    deps: Deps,
    start_after: Option<Binary>,
    limit: Option<u32>,
) -> StdResult<CommitteeMembersResponse> {
    let limit = limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT) as usize;
    let start: Option<Bound<&[u8]>> = start_after
        .as_ref()
        .map(|key| Bound::exclusive(key.as_slice()));

    let members = COMMITTEE_MEMBERS
        .range(deps.storage, start, None, Order::Ascending)
        .take(limit)
        .map(|item| item.map(|(_, member)| member))
        .collect::<StdResult<Vec<_>>>()?;

    Ok(CommitteeMembersResponse { members })
}

/// Query paginated pending registrations, ordered by owner.
pub fn query_committee_registrations(
    deps: Deps,
    start_after: Option<String>,
    limit: Option<u32>,
) -> StdResult<CommitteeRegistrationsResponse> {
    let limit = limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT) as usize;
    let start_addr = start_after.map(Addr::unchecked);
    let start = start_addr.as_ref().map(Bound::exclusive);

    let registrations = COMMITTEE_REGISTRATIONS
        .range(deps.storage, start, None, Order::Ascending)
        .take(limit)
        .map(|item| item.map(|(_, registration)| registration))
        .collect::<StdResult<Vec<_>>>()?;

    Ok(CommitteeRegistrationsResponse { registrations })
}

// ============================================================================
// Limiter Queries
// ============================================================================

/// Query a route's limit and its current window.
pub fn query_route_limit(deps: Deps, source: u8, destination: u8) -> StdResult<RouteLimitResponse> {
    let route = get_route(chain_id(source)?, chain_id(destination)?).ok_or_else(|| {
        StdError::generic_err(format!("Invalid route: {} -> {}", source, destination))
    })?;
    let limit = TRANSFER_LIMITS.may_load(deps.storage, route.key())?;
    let window = TRANSFER_WINDOWS.may_load(deps.storage, route.key())?;
    let hourly_amounts = window
        .as_ref()
        .map(|w| w.ordered_amounts())
        .unwrap_or_default();

    Ok(RouteLimitResponse {
        limit,
        window,
        hourly_amounts,
    })
}

// ============================================================================
// Token Queries
// ============================================================================

pub fn query_token(deps: Deps, token_id: u8) -> StdResult<TokenMetadata> {
    SUPPORTED_TOKENS.load(deps.storage, token_id)
}

/// Query paginated supported tokens, ordered by id.
pub fn query_tokens(
    deps: Deps,
    start_after: Option<u8>,
    limit: Option<u32>,
) -> StdResult<TokensResponse> {
    let limit = limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT) as usize;
    let start = start_after.map(Bound::exclusive);

    let tokens = SUPPORTED_TOKENS
        .range(deps.storage, start, None, Order::Ascending)
        .take(limit)
        .map(|item| item.map(|(_, token)| token))
        .collect::<StdResult<Vec<_>>>()?;

    Ok(TokensResponse { tokens })
}
