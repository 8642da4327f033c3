//! Token transfer handlers.
//!
//! Outbound: `SendToken` / cw20 `Receive` burn or escrow the input and store
//! a pending record. Inbound: `ApproveTokenTransfer` stores the signed
//! message, then one of the claim handlers pays the recipient.

use bridge_common::chain_ids::{get_route, is_valid_route};
use bridge_common::message::{create_token_bridge_message, EVM_ADDRESS_LENGTH, MESSAGE_VERSION};
use bridge_common::{BridgeMessage, ChainId, CodecError, MessageKey, MessageType};
use cosmwasm_std::{from_json, Addr, Binary, DepsMut, Env, MessageInfo, Response, Uint128};
use cw20::Cw20ReceiveMsg;

use crate::committee::verify_signatures;
use crate::error::ContractError;
use crate::events;
use crate::limiter::{check_and_record_sending_transfer, current_hour_since_epoch};
use crate::msg::ReceiveMsg;
use crate::state::{load_inner, next_seq_num, BridgeRecord, BRIDGE_RECORDS};
use crate::treasury::{burn_msg, mint_msg, token_by_id, token_by_type_name};

// ============================================================================
// Outbound
// ============================================================================

/// Bridge the single native coin attached to the call.
pub fn execute_send_native(
    deps: DepsMut,
    info: MessageInfo,
    target_chain: u8,
    target_address: Binary,
) -> Result<Response, ContractError> {
    if info.funds.is_empty() {
        return Err(ContractError::NoFundsSent);
    }
    if info.funds.len() > 1 {
        return Err(ContractError::InvalidAmount {
            reason: "Only one token type allowed per transaction".to_string(),
        });
    }
    let coin = &info.funds[0];

    send_token(
        deps,
        &info.sender,
        &coin.denom,
        coin.amount,
        target_chain,
        target_address,
        "send_token",
    )
}

/// Bridge cw20 tokens received through cw20 `Send`.
pub fn execute_receive(
    deps: DepsMut,
    info: MessageInfo,
    cw20_msg: Cw20ReceiveMsg,
) -> Result<Response, ContractError> {
    let token = info.sender.to_string();
    let sender = deps.api.addr_validate(&cw20_msg.sender)?;

    let receive_msg: ReceiveMsg = from_json(&cw20_msg.msg)?;
    match receive_msg {
        ReceiveMsg::SendToken {
            target_chain,
            target_address,
        } => send_token(
            deps,
            &sender,
            &token,
            cw20_msg.amount,
            target_chain,
            target_address,
            "send_token_cw20",
        ),
    }
}

fn send_token(
    deps: DepsMut,
    sender: &Addr,
    type_name: &str,
    amount: Uint128,
    target_chain: u8,
    target_address: Binary,
    method: &str,
) -> Result<Response, ContractError> {
    let inner = load_inner(deps.storage)?;
    if inner.paused {
        return Err(ContractError::BridgePaused);
    }

    let target = ChainId::try_from(target_chain).map_err(|_| ContractError::InvalidChainId {
        chain_id: target_chain,
    })?;
    if !is_valid_route(inner.chain_id, target) {
        return Err(ContractError::InvalidRoute {
            source_chain: inner.chain_id.as_u8(),
            destination_chain: target_chain,
        });
    }
    if target_address.len() != EVM_ADDRESS_LENGTH {
        return Err(ContractError::InvalidEvmAddress {
            got: target_address.len(),
        });
    }
    if amount.is_zero() {
        return Err(ContractError::TokenValueIsZero);
    }

    let token = token_by_type_name(deps.storage, type_name)?;
    let wire_amount = u64::try_from(amount.u128()).map_err(|_| ContractError::InvalidAmount {
        reason: format!("{} does not fit a u64", amount),
    })?;

    let seq_num = next_seq_num(deps.storage, MessageType::TokenTransfer.as_u8())?;
    let sender_address = sender.as_bytes();
    let message = create_token_bridge_message(
        inner.chain_id,
        seq_num,
        sender_address,
        target,
        target_address.as_slice(),
        token.id,
        wire_amount,
    )?;
    let key = message.key();
    BRIDGE_RECORDS.save(
        deps.storage,
        key.key(),
        &BridgeRecord {
            message,
            verified_signatures: None,
            claimed: false,
        },
    )?;

    Ok(Response::new()
        .add_messages(burn_msg(&token, amount)?)
        .add_event(events::token_deposited(
            &key,
            sender_address,
            target_chain,
            target_address.as_slice(),
            token.id,
            wire_amount,
        ))
        .add_attribute("method", method)
        .add_attribute("seq_num", seq_num.to_string())
        .add_attribute("sender", sender.as_str())
        .add_attribute("token", type_name)
        .add_attribute("amount", amount.to_string())
        .add_attribute("target_chain", target_chain.to_string()))
}

// ============================================================================
// Approval
// ============================================================================

/// Attach committee signatures to a token transfer touching this chain.
///
/// A message that is already approved (or claimed) is acknowledged with a
/// `token_transfer_already_approved` event; signatures are not checked again
/// and nothing is written.
pub fn execute_approve_token_transfer(
    deps: DepsMut,
    message: Binary,
    signatures: Vec<Binary>,
) -> Result<Response, ContractError> {
    let inner = load_inner(deps.storage)?;
    if inner.paused {
        return Err(ContractError::BridgePaused);
    }

    let message = BridgeMessage::decode(message.as_slice())?;
    if message.message_type != MessageType::TokenTransfer {
        return Err(ContractError::UnexpectedMessageType {
            message_type: message.message_type.as_u8(),
        });
    }
    if message.message_version != MESSAGE_VERSION {
        return Err(ContractError::UnexpectedMessageVersion {
            expected: MESSAGE_VERSION,
            got: message.message_version,
        });
    }
    let payload = message.extract_token_transfer_payload()?;
    if message.source_chain != inner.chain_id && payload.target_chain != inner.chain_id {
        return Err(ContractError::UnexpectedChainId {
            chain_id: message.source_chain.as_u8(),
        });
    }

    let key = message.key();
    let existing = BRIDGE_RECORDS.may_load(deps.storage, key.key())?;

    let record = if message.source_chain == inner.chain_id {
        // outbound: the record was written by send
        let mut record = existing.ok_or(ContractError::RecordNotFound)?;
        if record.message != message {
            return Err(ContractError::MessageMismatch);
        }
        if record.verified_signatures.is_some() || record.claimed {
            return Ok(already_approved(&key));
        }
        verify_signatures(deps.storage, deps.api, &message, &signatures)?;
        record.verified_signatures = Some(signatures);
        record
    } else {
        // inbound records only exist once approved
        if existing.is_some() {
            return Ok(already_approved(&key));
        }
        verify_signatures(deps.storage, deps.api, &message, &signatures)?;
        BridgeRecord {
            message,
            verified_signatures: Some(signatures),
            claimed: false,
        }
    };
    BRIDGE_RECORDS.save(deps.storage, key.key(), &record)?;

    Ok(Response::new()
        .add_event(events::token_transfer_approved(&key))
        .add_attribute("method", "approve_token_transfer")
        .add_attribute("outcome", "approved")
        .add_attribute("seq_num", key.seq_num.to_string()))
}

fn already_approved(key: &MessageKey) -> Response {
    Response::new()
        .add_event(events::token_transfer_already_approved(key))
        .add_attribute("method", "approve_token_transfer")
        .add_attribute("outcome", "already_approved")
        .add_attribute("seq_num", key.seq_num.to_string())
}

// ============================================================================
// Claim
// ============================================================================

/// Claim an approved inbound transfer. Only the recipient may call this.
pub fn execute_claim_token(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    source_chain: u8,
    seq_num: u64,
) -> Result<Response, ContractError> {
    claim_token_internal(deps, &env, Some(&info.sender), source_chain, seq_num)
}

/// Claim an approved inbound transfer for its recipient. Anyone may call.
pub fn execute_claim_and_transfer_token(
    deps: DepsMut,
    env: Env,
    source_chain: u8,
    seq_num: u64,
) -> Result<Response, ContractError> {
    claim_token_internal(deps, &env, None, source_chain, seq_num)
}

fn claim_token_internal(
    deps: DepsMut,
    env: &Env,
    caller: Option<&Addr>,
    source_chain: u8,
    seq_num: u64,
) -> Result<Response, ContractError> {
    let inner = load_inner(deps.storage)?;
    if inner.paused {
        return Err(ContractError::BridgePaused);
    }

    let source = ChainId::try_from(source_chain).map_err(|_| ContractError::InvalidChainId {
        chain_id: source_chain,
    })?;
    let key = MessageKey::new(source, MessageType::TokenTransfer, seq_num);
    let mut record = BRIDGE_RECORDS
        .may_load(deps.storage, key.key())?
        .ok_or(ContractError::RecordNotFound)?;
    if record.verified_signatures.is_none() {
        return Err(ContractError::UnauthorizedClaim);
    }

    let payload = record.message.extract_token_transfer_payload()?;
    if payload.target_chain != inner.chain_id {
        return Err(ContractError::UnexpectedChainId {
            chain_id: payload.target_chain.as_u8(),
        });
    }
    // local recipients travel as the utf-8 bytes of their address
    let owner = String::from_utf8(payload.target_address.to_vec())
        .map_err(|_| ContractError::MalformedMessage(CodecError::InvalidUtf8))?;
    let owner = deps.api.addr_validate(&owner)?;
    if let Some(caller) = caller {
        if *caller != owner {
            return Err(ContractError::UnauthorizedClaim);
        }
    }
    let method = if caller.is_some() {
        "claim_token"
    } else {
        "claim_and_transfer_token"
    };

    if record.claimed {
        return Ok(Response::new()
            .add_event(events::token_transfer_already_claimed(&key))
            .add_attribute("method", method)
            .add_attribute("outcome", "already_claimed")
            .add_attribute("seq_num", seq_num.to_string()));
    }

    let route = get_route(source, payload.target_chain).ok_or(ContractError::InvalidRoute {
        source_chain,
        destination_chain: payload.target_chain.as_u8(),
    })?;
    let token = token_by_id(deps.storage, payload.token_type)?;

    let accepted = check_and_record_sending_transfer(
        deps.storage,
        &route,
        payload.amount,
        token.notional_value,
        token.decimal_multiplier,
        current_hour_since_epoch(env),
    )?;
    if !accepted {
        return Ok(Response::new()
            .add_event(events::token_transfer_limit_exceed(&key))
            .add_attribute("method", method)
            .add_attribute("outcome", "limit_exceeded")
            .add_attribute("seq_num", seq_num.to_string()));
    }

    record.claimed = true;
    BRIDGE_RECORDS.save(deps.storage, key.key(), &record)?;

    let amount = Uint128::from(payload.amount);
    Ok(Response::new()
        .add_message(mint_msg(&token, &owner, amount)?)
        .add_event(events::token_transfer_claimed(&key))
        .add_attribute("method", method)
        .add_attribute("outcome", "claimed")
        .add_attribute("seq_num", seq_num.to_string())
        .add_attribute("recipient", owner.as_str())
        .add_attribute("token", token.type_name)
        .add_attribute("amount", amount.to_string()))
}
