//! Committee-signed system messages.
//!
//! Governance messages must originate on this chain and arrive in exact
//! sequence order per message type. Paused state does not block them, so an
//! unpause can always get through.

use bridge_common::chain_ids::get_route;
use bridge_common::message::{EmergencyOpType, MESSAGE_VERSION};
use bridge_common::{BridgeMessage, MessageType};
use cosmwasm_std::{Binary, DepsMut, Event, Response};

use crate::committee::{execute_blocklist, verify_signatures};
use crate::error::ContractError;
use crate::events;
use crate::limiter::update_route_limit;
use crate::state::{load_inner, next_seq_num, peek_seq_num, save_inner, BridgeInner};
use crate::treasury::{add_new_token, update_asset_notional_price};

pub fn execute_system_message(
    deps: DepsMut,
    message: Binary,
    signatures: Vec<Binary>,
) -> Result<Response, ContractError> {
    let mut inner = load_inner(deps.storage)?;

    let message = BridgeMessage::decode(message.as_slice())?;
    if message.message_version != MESSAGE_VERSION {
        return Err(ContractError::UnexpectedMessageVersion {
            expected: MESSAGE_VERSION,
            got: message.message_version,
        });
    }
    if message.source_chain != inner.chain_id {
        return Err(ContractError::UnexpectedChainId {
            chain_id: message.source_chain.as_u8(),
        });
    }
    let message_type = message.message_type;
    if message_type == MessageType::TokenTransfer {
        return Err(ContractError::UnexpectedMessageType {
            message_type: message_type.as_u8(),
        });
    }

    let expected = peek_seq_num(deps.storage, message_type.as_u8())?;
    if message.seq_num != expected {
        return Err(ContractError::UnexpectedSeqNum {
            expected,
            got: message.seq_num,
        });
    }

    verify_signatures(deps.storage, deps.api, &message, &signatures)?;
    next_seq_num(deps.storage, message_type.as_u8())?;

    let emitted = match message_type {
        MessageType::EmergencyOp => {
            let op = message.extract_emergency_op_payload()?;
            vec![execute_emergency_op(&mut inner, op)?]
        }
        MessageType::CommitteeBlocklist => {
            let payload = message.extract_blocklist_payload()?;
            vec![execute_blocklist(deps.storage, &payload)?]
        }
        MessageType::UpdateBridgeLimit => {
            let payload = message.extract_update_bridge_limit()?;
            let route = get_route(payload.sending_chain, payload.receiving_chain).ok_or(
                ContractError::InvalidRoute {
                    source_chain: payload.sending_chain.as_u8(),
                    destination_chain: payload.receiving_chain.as_u8(),
                },
            )?;
            vec![update_route_limit(deps.storage, &route, payload.limit)?]
        }
        MessageType::UpdateAssetPrice => {
            let payload = message.extract_update_asset_price()?;
            vec![update_asset_notional_price(
                deps.storage,
                payload.token_id,
                payload.new_price,
            )?]
        }
        MessageType::AddTokens => {
            let payload = message.extract_add_tokens()?;
            let count = payload.token_ids.len();
            if payload.token_type_names.len() != count || payload.token_prices.len() != count {
                return Err(ContractError::TokenVectorLengthMismatch);
            }
            let mut added: Vec<Event> = Vec::with_capacity(count);
            for ((id, name), price) in payload
                .token_ids
                .iter()
                .zip(&payload.token_type_names)
                .zip(&payload.token_prices)
            {
                added.push(add_new_token(
                    deps.storage,
                    name,
                    *id,
                    payload.native_token,
                    *price,
                )?);
            }
            added
        }
        MessageType::TokenTransfer => {
            return Err(ContractError::UnexpectedMessageType {
                message_type: message_type.as_u8(),
            })
        }
    };
    save_inner(deps.storage, &inner)?;

    Ok(Response::new()
        .add_events(emitted)
        .add_attribute("method", "execute_system_message")
        .add_attribute("message_type", message_type.as_str())
        .add_attribute("seq_num", message.seq_num.to_string()))
}

fn execute_emergency_op(
    inner: &mut BridgeInner,
    op: EmergencyOpType,
) -> Result<Event, ContractError> {
    match op {
        EmergencyOpType::Pause => {
            if inner.paused {
                return Err(ContractError::AlreadyPaused);
            }
            inner.paused = true;
        }
        EmergencyOpType::Unpause => {
            if !inner.paused {
                return Err(ContractError::NotPaused);
            }
            inner.paused = false;
        }
    }
    Ok(events::emergency_op(inner.paused))
}
