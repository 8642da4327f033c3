//! Committee registry
//!
//! Validators register a bridge key while no committee exists. Once enough
//! stake has registered, the registrations become the committee, whose
//! members co-sign bridge messages with weights equal to their stake share.

use std::collections::{BTreeMap, BTreeSet};

use bridge_common::message::{BlocklistPayload, BlocklistType};
use bridge_common::BridgeMessage;
use cosmwasm_std::{Addr, Api, Binary, Event, Order, QuerierWrapper, StdResult, Storage};

use crate::crypto::{
    decompress_pubkey, evm_address_from_pubkey, message_digest, recover_compressed_pubkey,
};
use crate::error::ContractError;
use crate::events;
use crate::msg::{ActiveValidator, ActiveValidatorsResponse, StakeProviderQueryMsg};
use crate::state::{
    CommitteeMember, CommitteeMemberRegistration, COMMITTEE_MEMBERS, COMMITTEE_REGISTRATIONS,
    LAST_COMMITTEE_UPDATE_EPOCH,
};

/// Ask the stake provider for the current validator set.
pub fn query_active_validators(
    querier: &QuerierWrapper,
    stake_provider: &Addr,
) -> StdResult<Vec<ActiveValidator>> {
    let res: ActiveValidatorsResponse =
        querier.query_wasm_smart(stake_provider, &StakeProviderQueryMsg::ActiveValidators {})?;
    Ok(res.validators)
}

pub fn is_committee_initiated(storage: &dyn Storage) -> bool {
    COMMITTEE_MEMBERS
        .keys(storage, None, None, Order::Ascending)
        .next()
        .is_some()
}

// ============================================================================
// Registration
// ============================================================================

/// Record or replace `owner`'s registration for the next committee.
pub fn register(
    storage: &mut dyn Storage,
    active_validators: &[ActiveValidator],
    owner: Addr,
    bridge_pubkey_bytes: Binary,
    http_rest_url: String,
) -> Result<Event, ContractError> {
    if is_committee_initiated(storage) {
        return Err(ContractError::CommitteeAlreadyInitiated);
    }
    // length and curve point
    decompress_pubkey(bridge_pubkey_bytes.as_slice())?;

    if !active_validators
        .iter()
        .any(|v| v.address == owner.as_str())
    {
        return Err(ContractError::SenderNotActiveValidator);
    }

    for item in COMMITTEE_REGISTRATIONS.range(storage, None, None, Order::Ascending) {
        let (other, registration) = item?;
        if other != owner && registration.bridge_pubkey_bytes == bridge_pubkey_bytes {
            return Err(ContractError::DuplicatePubkey);
        }
    }

    let event =
        events::committee_member_registration(&owner, &bridge_pubkey_bytes, &http_rest_url);
    let registration = CommitteeMemberRegistration {
        owner: owner.clone(),
        bridge_pubkey_bytes,
        http_rest_url,
    };
    COMMITTEE_REGISTRATIONS.save(storage, &owner, &registration)?;
    Ok(event)
}

/// Turn the registrations into the committee when they represent at least
/// `min_stake_participation_percentage` percent of stake.
///
/// Falling short is not an error; the call simply does nothing and returns
/// `None`.
pub fn try_create_next_committee(
    storage: &mut dyn Storage,
    active_validators: &[ActiveValidator],
    min_stake_participation_percentage: u64,
    epoch: u64,
) -> Result<Option<Event>, ContractError> {
    let powers: BTreeMap<&str, u64> = active_validators
        .iter()
        .map(|v| (v.address.as_str(), v.voting_power))
        .collect();

    let registrations = COMMITTEE_REGISTRATIONS
        .range(storage, None, None, Order::Ascending)
        .map(|item| item.map(|(_, r)| r))
        .collect::<StdResult<Vec<_>>>()?;

    let mut stake_participation = 0u64;
    let mut members = Vec::new();
    for registration in registrations {
        if let Some(power) = powers.get(registration.owner.as_str()) {
            stake_participation += power;
            members.push(CommitteeMember {
                owner: registration.owner,
                bridge_pubkey_bytes: registration.bridge_pubkey_bytes,
                voting_power: *power,
                http_rest_url: registration.http_rest_url,
                blocklisted: false,
            });
        }
    }

    // voting power is in basis points
    if stake_participation < min_stake_participation_percentage.saturating_mul(100) {
        return Ok(None);
    }

    COMMITTEE_MEMBERS.clear(storage);
    for member in &members {
        COMMITTEE_MEMBERS.save(storage, member.bridge_pubkey_bytes.as_slice(), member)?;
    }
    COMMITTEE_REGISTRATIONS.clear(storage);
    LAST_COMMITTEE_UPDATE_EPOCH.save(storage, &epoch)?;

    Ok(Some(events::committee_update(&members, stake_participation)))
}

/// Point the sender's committee seat at a new URL.
pub fn update_node_url(
    storage: &mut dyn Storage,
    owner: &Addr,
    new_url: String,
) -> Result<Event, ContractError> {
    let mut found = None;
    for item in COMMITTEE_MEMBERS.range(storage, None, None, Order::Ascending) {
        let (_, member) = item?;
        if member.owner == *owner {
            found = Some(member);
            break;
        }
    }
    let mut member = found.ok_or(ContractError::SenderNotInCommittee)?;

    member.http_rest_url = new_url;
    COMMITTEE_MEMBERS.save(storage, member.bridge_pubkey_bytes.as_slice(), &member)?;
    Ok(events::committee_member_url_update(
        &member.bridge_pubkey_bytes,
        &member.http_rest_url,
    ))
}

// ============================================================================
// Signatures
// ============================================================================

/// Check that `signatures` carry enough committee weight for `message`.
///
/// Blocklisted members may sign but add no weight. Returns the total weight.
pub fn verify_signatures(
    storage: &dyn Storage,
    api: &dyn Api,
    message: &BridgeMessage,
    signatures: &[Binary],
) -> Result<u64, ContractError> {
    let required = message.required_voting_power()?;
    let digest = message_digest(message);

    let mut seen = BTreeSet::new();
    let mut voting_power = 0u64;
    for signature in signatures {
        let pubkey = recover_compressed_pubkey(api, &digest, signature.as_slice())?;
        let member = COMMITTEE_MEMBERS
            .may_load(storage, &pubkey)?
            .ok_or(ContractError::UnknownSigner)?;
        if !seen.insert(pubkey) {
            return Err(ContractError::DuplicateSigner);
        }
        if !member.blocklisted {
            voting_power += member.voting_power;
        }
    }

    if voting_power < required {
        return Err(ContractError::BelowThreshold {
            got: voting_power,
            required,
        });
    }
    Ok(voting_power)
}

// ============================================================================
// Blocklist
// ============================================================================

/// Set or clear the blocklist flag of every member named in `payload`.
///
/// Fails without changes if any address matches no member.
pub fn execute_blocklist(
    storage: &mut dyn Storage,
    payload: &BlocklistPayload,
) -> Result<Event, ContractError> {
    let blocklisted = payload.blocklist_type == BlocklistType::Blocklist;

    let mut by_address = BTreeMap::new();
    for item in COMMITTEE_MEMBERS.range(storage, None, None, Order::Ascending) {
        let (_, member) = item?;
        let address = evm_address_from_pubkey(member.bridge_pubkey_bytes.as_slice())?;
        by_address.insert(address, member);
    }

    let mut updated = Vec::with_capacity(payload.validator_eth_addresses.len());
    for address in &payload.validator_eth_addresses {
        let member = by_address
            .get(address)
            .ok_or(ContractError::UnknownMember)?;
        updated.push(member.clone());
    }

    let mut pubkeys = Vec::with_capacity(updated.len());
    for mut member in updated {
        member.blocklisted = blocklisted;
        COMMITTEE_MEMBERS.save(storage, member.bridge_pubkey_bytes.as_slice(), &member)?;
        pubkeys.push(member.bridge_pubkey_bytes);
    }

    Ok(events::blocklist_validator(blocklisted, &pubkeys))
}
