//! Typed events emitted by the bridge.
//!
//! Relayers and indexers key off these names; keep them stable.

use bridge_common::{MessageKey, Route};
use cosmwasm_std::{Addr, Binary, Event};

use crate::state::{CommitteeMember, TokenMetadata, TokenRegistration};

fn with_key(name: &str, key: &MessageKey) -> Event {
    Event::new(name)
        .add_attribute("source_chain", key.source_chain.to_string())
        .add_attribute("message_type", key.message_type.as_u8().to_string())
        .add_attribute("seq_num", key.seq_num.to_string())
}

// ============================================================================
// Transfers
// ============================================================================

pub fn token_deposited(
    key: &MessageKey,
    sender_address: &[u8],
    target_chain: u8,
    target_address: &[u8],
    token_type: u8,
    amount: u64,
) -> Event {
    with_key("token_deposited", key)
        .add_attribute("sender_address", hex::encode(sender_address))
        .add_attribute("target_chain", target_chain.to_string())
        .add_attribute("target_address", hex::encode(target_address))
        .add_attribute("token_type", token_type.to_string())
        .add_attribute("amount", amount.to_string())
}

pub fn token_transfer_approved(key: &MessageKey) -> Event {
    with_key("token_transfer_approved", key)
}

pub fn token_transfer_already_approved(key: &MessageKey) -> Event {
    with_key("token_transfer_already_approved", key)
}

pub fn token_transfer_claimed(key: &MessageKey) -> Event {
    with_key("token_transfer_claimed", key)
}

pub fn token_transfer_already_claimed(key: &MessageKey) -> Event {
    with_key("token_transfer_already_claimed", key)
}

pub fn token_transfer_limit_exceed(key: &MessageKey) -> Event {
    with_key("token_transfer_limit_exceed", key)
}

// ============================================================================
// Governance
// ============================================================================

pub fn emergency_op(frozen: bool) -> Event {
    Event::new("emergency_op").add_attribute("frozen", frozen.to_string())
}

pub fn update_route_limit(route: &Route, new_limit: u64) -> Event {
    Event::new("update_route_limit")
        .add_attribute("sending_chain", route.source.to_string())
        .add_attribute("receiving_chain", route.destination.to_string())
        .add_attribute("new_limit", new_limit.to_string())
}

pub fn update_token_price(token_id: u8, new_price: u64) -> Event {
    Event::new("update_token_price")
        .add_attribute("token_id", token_id.to_string())
        .add_attribute("new_price", new_price.to_string())
}

pub fn new_token(token: &TokenMetadata) -> Event {
    Event::new("new_token")
        .add_attribute("token_id", token.id.to_string())
        .add_attribute("type_name", &token.type_name)
        .add_attribute("native_token", token.native_token.to_string())
        .add_attribute("decimal_multiplier", token.decimal_multiplier.to_string())
        .add_attribute("notional_value", token.notional_value.to_string())
}

pub fn token_registration(registration: &TokenRegistration) -> Event {
    Event::new("token_registration")
        .add_attribute("type_name", &registration.type_name)
        .add_attribute("decimal", registration.decimal.to_string())
        .add_attribute("native_token", registration.native_token.to_string())
}

// ============================================================================
// Committee
// ============================================================================

pub fn committee_member_registration(owner: &Addr, pubkey: &Binary, url: &str) -> Event {
    Event::new("committee_member_registration")
        .add_attribute("owner", owner.to_string())
        .add_attribute("bridge_pubkey_bytes", hex::encode(pubkey.as_slice()))
        .add_attribute("http_rest_url", url)
}

pub fn committee_update(members: &[CommitteeMember], stake_participation: u64) -> Event {
    let pubkeys: Vec<String> = members
        .iter()
        .map(|m| hex::encode(m.bridge_pubkey_bytes.as_slice()))
        .collect();
    Event::new("committee_update")
        .add_attribute("member_count", members.len().to_string())
        .add_attribute("stake_participation", stake_participation.to_string())
        .add_attribute("members", pubkeys.join(","))
}

pub fn committee_member_url_update(pubkey: &Binary, new_url: &str) -> Event {
    Event::new("committee_member_url_update")
        .add_attribute("bridge_pubkey_bytes", hex::encode(pubkey.as_slice()))
        .add_attribute("new_url", new_url)
}

pub fn blocklist_validator(blocklisted: bool, pubkeys: &[Binary]) -> Event {
    let keys: Vec<String> = pubkeys.iter().map(|k| hex::encode(k.as_slice())).collect();
    Event::new("blocklist_validator")
        .add_attribute("blocklisted", blocklisted.to_string())
        .add_attribute("public_keys", keys.join(","))
}
