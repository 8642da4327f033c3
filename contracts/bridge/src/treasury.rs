//! Token registry and the bank/cw20 messages that move bridged funds
//!
//! Foreign tokens are cw20 contracts minted by this bridge: outbound amounts
//! are burned and inbound amounts minted. Native tokens are bank denoms held
//! in escrow: outbound amounts stay in the contract balance and inbound
//! amounts are released from it.
//!
//! A token becomes usable in two steps. It is first registered into the
//! waiting room, then enabled by an add-token governance message that fixes
//! its wire id and price.

use cosmwasm_std::{
    to_json_binary, Addr, BankMsg, Coin, CosmosMsg, Event, QuerierWrapper, Storage, Uint128,
    WasmMsg,
};
use cw20::{Cw20ExecuteMsg, Cw20QueryMsg, MinterResponse, TokenInfoResponse};

use crate::error::ContractError;
use crate::events;
use crate::state::{TokenMetadata, TokenRegistration, SUPPORTED_TOKENS, TOKEN_IDS, WAITING_ROOM};

// ============================================================================
// Lookups
// ============================================================================

pub fn token_by_id(storage: &dyn Storage, token_id: u8) -> Result<TokenMetadata, ContractError> {
    SUPPORTED_TOKENS
        .may_load(storage, token_id)?
        .ok_or(ContractError::UnsupportedTokenType {
            token: token_id.to_string(),
        })
}

pub fn token_by_type_name(
    storage: &dyn Storage,
    type_name: &str,
) -> Result<TokenMetadata, ContractError> {
    let token_id = TOKEN_IDS
        .may_load(storage, type_name)?
        .ok_or(ContractError::UnsupportedTokenType {
            token: type_name.to_string(),
        })?;
    token_by_id(storage, token_id)
}

fn decimal_multiplier(decimal: u8) -> Result<u64, ContractError> {
    10u64
        .checked_pow(decimal as u32)
        .ok_or(ContractError::InvalidAmount {
            reason: format!("{} decimals do not fit a u64 multiplier", decimal),
        })
}

// ============================================================================
// Registration
// ============================================================================

fn register_token(
    storage: &mut dyn Storage,
    registration: TokenRegistration,
) -> Result<Event, ContractError> {
    if TOKEN_IDS.has(storage, &registration.type_name) {
        return Err(ContractError::TokenAlreadySupported {
            token: registration.type_name,
        });
    }
    decimal_multiplier(registration.decimal)?;

    WAITING_ROOM.save(storage, &registration.type_name, &registration)?;
    Ok(events::token_registration(&registration))
}

/// Register a cw20 token. Its minter must already be `bridge`.
pub fn register_foreign_token(
    storage: &mut dyn Storage,
    querier: &QuerierWrapper,
    bridge: &Addr,
    token: &Addr,
) -> Result<Event, ContractError> {
    let info: TokenInfoResponse = querier.query_wasm_smart(token, &Cw20QueryMsg::TokenInfo {})?;
    let minter: Option<MinterResponse> =
        querier.query_wasm_smart(token, &Cw20QueryMsg::Minter {})?;
    match minter {
        Some(m) if m.minter == bridge.as_str() => {}
        _ => return Err(ContractError::InvalidTokenMinter),
    }

    register_token(
        storage,
        TokenRegistration {
            type_name: token.to_string(),
            decimal: info.decimals,
            native_token: false,
        },
    )
}

pub fn register_native_token(
    storage: &mut dyn Storage,
    denom: String,
    decimals: u8,
) -> Result<Event, ContractError> {
    if denom.is_empty() {
        return Err(ContractError::InvalidDenom { denom });
    }
    register_token(
        storage,
        TokenRegistration {
            type_name: denom,
            decimal: decimals,
            native_token: true,
        },
    )
}

/// Enable a waiting-room token under `token_id` at `notional_value`.
pub fn add_new_token(
    storage: &mut dyn Storage,
    type_name: &str,
    token_id: u8,
    native_token: bool,
    notional_value: u64,
) -> Result<Event, ContractError> {
    if notional_value == 0 {
        return Err(ContractError::InvalidNotionalValue);
    }
    let registration = WAITING_ROOM
        .may_load(storage, type_name)?
        .filter(|r| r.native_token == native_token)
        .ok_or(ContractError::TokenNotRegistered {
            token: type_name.to_string(),
        })?;
    if TOKEN_IDS.has(storage, type_name) {
        return Err(ContractError::TokenAlreadySupported {
            token: type_name.to_string(),
        });
    }
    if SUPPORTED_TOKENS.has(storage, token_id) {
        return Err(ContractError::TokenAlreadySupported {
            token: token_id.to_string(),
        });
    }

    let token = TokenMetadata {
        id: token_id,
        type_name: registration.type_name,
        decimal_multiplier: decimal_multiplier(registration.decimal)?,
        notional_value,
        native_token,
    };
    WAITING_ROOM.remove(storage, type_name);
    TOKEN_IDS.save(storage, type_name, &token_id)?;
    SUPPORTED_TOKENS.save(storage, token_id, &token)?;
    Ok(events::new_token(&token))
}

pub fn update_asset_notional_price(
    storage: &mut dyn Storage,
    token_id: u8,
    new_price: u64,
) -> Result<Event, ContractError> {
    if new_price == 0 {
        return Err(ContractError::InvalidNotionalValue);
    }
    let mut token = token_by_id(storage, token_id)?;
    token.notional_value = new_price;
    SUPPORTED_TOKENS.save(storage, token_id, &token)?;
    Ok(events::update_token_price(token_id, new_price))
}

// ============================================================================
// Fund Movement
// ============================================================================

/// Take an outbound amount out of circulation.
///
/// Native coins are already in the contract balance, so nothing is sent.
pub fn burn_msg(token: &TokenMetadata, amount: Uint128) -> Result<Option<CosmosMsg>, ContractError> {
    if token.native_token {
        return Ok(None);
    }
    Ok(Some(CosmosMsg::Wasm(WasmMsg::Execute {
        contract_addr: token.type_name.clone(),
        msg: to_json_binary(&Cw20ExecuteMsg::Burn { amount })?,
        funds: vec![],
    })))
}

/// Pay an inbound amount to `recipient`.
pub fn mint_msg(
    token: &TokenMetadata,
    recipient: &Addr,
    amount: Uint128,
) -> Result<CosmosMsg, ContractError> {
    if token.native_token {
        return Ok(CosmosMsg::Bank(BankMsg::Send {
            to_address: recipient.to_string(),
            amount: vec![Coin {
                denom: token.type_name.clone(),
                amount,
            }],
        }));
    }
    Ok(CosmosMsg::Wasm(WasmMsg::Execute {
        contract_addr: token.type_name.clone(),
        msg: to_json_binary(&Cw20ExecuteMsg::Mint {
            recipient: recipient.to_string(),
            amount,
        })?,
        funds: vec![],
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cosmwasm_std::testing::MockStorage;

    fn listed(storage: &mut MockStorage) {
        register_native_token(storage, "uluna".to_string(), 6).unwrap();
        add_new_token(storage, "uluna", 1, true, 50_000_000).unwrap();
    }

    #[test]
    fn test_register_native_rejects_empty_denom() {
        let mut storage = MockStorage::new();
        assert_eq!(
            register_native_token(&mut storage, String::new(), 6).unwrap_err(),
            ContractError::InvalidDenom {
                denom: String::new()
            }
        );
        assert!(WAITING_ROOM.is_empty(&storage));
    }

    #[test]
    fn test_add_requires_registration() {
        let mut storage = MockStorage::new();
        assert_eq!(
            add_new_token(&mut storage, "uluna", 1, true, 1).unwrap_err(),
            ContractError::TokenNotRegistered {
                token: "uluna".to_string()
            }
        );

        register_native_token(&mut storage, "uluna".to_string(), 6).unwrap();
        // native flag must match the registration
        assert!(add_new_token(&mut storage, "uluna", 1, false, 1).is_err());
        assert_eq!(
            add_new_token(&mut storage, "uluna", 1, true, 0).unwrap_err(),
            ContractError::InvalidNotionalValue
        );

        add_new_token(&mut storage, "uluna", 1, true, 50_000_000).unwrap();
        let token = token_by_type_name(&storage, "uluna").unwrap();
        assert_eq!(token.id, 1);
        assert_eq!(token.decimal_multiplier, 1_000_000);
        assert_eq!(token.notional_value, 50_000_000);
        assert!(!WAITING_ROOM.has(&storage, "uluna"));
    }

    #[test]
    fn test_ids_and_names_are_unique() {
        let mut storage = MockStorage::new();
        listed(&mut storage);

        assert_eq!(
            register_native_token(&mut storage, "uluna".to_string(), 6).unwrap_err(),
            ContractError::TokenAlreadySupported {
                token: "uluna".to_string()
            }
        );

        register_native_token(&mut storage, "uusd".to_string(), 6).unwrap();
        assert_eq!(
            add_new_token(&mut storage, "uusd", 1, true, 1).unwrap_err(),
            ContractError::TokenAlreadySupported {
                token: "1".to_string()
            }
        );
    }

    #[test]
    fn test_decimals_must_fit() {
        let mut storage = MockStorage::new();
        assert!(register_native_token(&mut storage, "big".to_string(), 20).is_err());
        register_native_token(&mut storage, "ok".to_string(), 19).unwrap();
    }

    #[test]
    fn test_update_price() {
        let mut storage = MockStorage::new();
        listed(&mut storage);
        update_asset_notional_price(&mut storage, 1, 7).unwrap();
        assert_eq!(token_by_id(&storage, 1).unwrap().notional_value, 7);

        assert_eq!(
            update_asset_notional_price(&mut storage, 1, 0).unwrap_err(),
            ContractError::InvalidNotionalValue
        );
        assert_eq!(
            update_asset_notional_price(&mut storage, 9, 1).unwrap_err(),
            ContractError::UnsupportedTokenType {
                token: "9".to_string()
            }
        );
    }

    #[test]
    fn test_fund_messages() {
        let native = TokenMetadata {
            id: 1,
            type_name: "uluna".to_string(),
            decimal_multiplier: 1_000_000,
            notional_value: 1,
            native_token: true,
        };
        let foreign = TokenMetadata {
            id: 2,
            type_name: "terra1wrappedeth".to_string(),
            native_token: false,
            ..native.clone()
        };
        let recipient = Addr::unchecked("terra1user");

        assert_eq!(burn_msg(&native, Uint128::new(5)).unwrap(), None);
        assert!(matches!(
            burn_msg(&foreign, Uint128::new(5)).unwrap(),
            Some(CosmosMsg::Wasm(WasmMsg::Execute { ref contract_addr, .. }))
                if contract_addr == "terra1wrappedeth"
        ));
        assert_eq!(
            mint_msg(&native, &recipient, Uint128::new(5)).unwrap(),
            CosmosMsg::Bank(BankMsg::Send {
                to_address: "terra1user".to_string(),
                amount: vec![Coin::new(5, "uluna")],
            })
        );
    }
}
