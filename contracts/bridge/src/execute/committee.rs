//! Committee handlers.
//!
//! Registration is open to active validators until a committee exists.
//! Committee creation is reserved to the system address.

use cosmwasm_std::{Binary, DepsMut, Env, MessageInfo, Response};

use super::ensure_system_address;
use crate::committee::{
    is_committee_initiated, query_active_validators, register, try_create_next_committee,
    update_node_url,
};
use crate::error::ContractError;
use crate::state::load_inner;

/// Register the sender's bridge key for the next committee.
pub fn execute_register_committee(
    deps: DepsMut,
    info: MessageInfo,
    bridge_pubkey_bytes: Binary,
    http_rest_url: String,
) -> Result<Response, ContractError> {
    let inner = load_inner(deps.storage)?;
    let validators = query_active_validators(&deps.querier, &inner.stake_provider)?;

    let event = register(
        deps.storage,
        &validators,
        info.sender.clone(),
        bridge_pubkey_bytes,
        http_rest_url,
    )?;

    Ok(Response::new()
        .add_event(event)
        .add_attribute("method", "register_committee")
        .add_attribute("owner", info.sender))
}

/// Change the service URL of the sender's committee seat.
pub fn execute_update_node_url(
    deps: DepsMut,
    info: MessageInfo,
    new_url: String,
) -> Result<Response, ContractError> {
    let event = update_node_url(deps.storage, &info.sender, new_url)?;

    Ok(Response::new()
        .add_event(event)
        .add_attribute("method", "update_node_url")
        .add_attribute("owner", info.sender))
}

/// Create the first committee from the pending registrations.
///
/// Does nothing when a committee already exists or when registrations hold
/// too little stake; the caller runs this unconditionally every epoch.
pub fn execute_init_committee(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    min_stake_participation_percentage: u64,
) -> Result<Response, ContractError> {
    let inner = load_inner(deps.storage)?;
    ensure_system_address(&inner, &info.sender)?;

    let response = Response::new().add_attribute("method", "init_committee");
    if is_committee_initiated(deps.storage) {
        return Ok(response.add_attribute("created", "false"));
    }

    let validators = query_active_validators(&deps.querier, &inner.stake_provider)?;
    match try_create_next_committee(
        deps.storage,
        &validators,
        min_stake_participation_percentage,
        env.block.height,
    )? {
        Some(event) => Ok(response.add_event(event).add_attribute("created", "true")),
        None => Ok(response.add_attribute("created", "false")),
    }
}
