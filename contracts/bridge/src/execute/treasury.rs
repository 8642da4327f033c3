//! Token registration handlers.

use cosmwasm_std::{DepsMut, Env, MessageInfo, Response};

use super::ensure_system_address;
use crate::error::ContractError;
use crate::state::load_inner;
use crate::treasury::{register_foreign_token, register_native_token};

/// Register a cw20 token minted by this contract. Anyone may call.
pub fn execute_register_foreign_token(
    deps: DepsMut,
    env: Env,
    token: String,
) -> Result<Response, ContractError> {
    let token = deps.api.addr_validate(&token)?;
    let event = register_foreign_token(
        deps.storage,
        &deps.querier,
        &env.contract.address,
        &token,
    )?;

    Ok(Response::new()
        .add_event(event)
        .add_attribute("method", "register_foreign_token")
        .add_attribute("token", token))
}

/// Register a bank denom for escrow-based bridging.
pub fn execute_register_native_token(
    deps: DepsMut,
    info: MessageInfo,
    denom: String,
    decimals: u8,
) -> Result<Response, ContractError> {
    let inner = load_inner(deps.storage)?;
    ensure_system_address(&inner, &info.sender)?;

    let event = register_native_token(deps.storage, denom.clone(), decimals)?;

    Ok(Response::new()
        .add_event(event)
        .add_attribute("method", "register_native_token")
        .add_attribute("denom", denom)
        .add_attribute("decimals", decimals.to_string()))
}
