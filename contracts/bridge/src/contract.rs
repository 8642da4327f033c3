//! Committee Bridge Contract - Entry Points
//!
//! The implementation is modularized into:
//! - `execute/` - Execute message handlers
//! - `query` - Query message handlers

use bridge_common::ChainId;
use cosmwasm_std::{
    entry_point, to_json_binary, Binary, Deps, DepsMut, Env, MessageInfo, Response, StdResult,
};
use cw2::set_contract_version;

use crate::error::ContractError;
use crate::execute::{
    execute_approve_token_transfer, execute_claim_and_transfer_token, execute_claim_token,
    execute_init_committee, execute_receive, execute_register_committee,
    execute_register_foreign_token, execute_register_native_token, execute_send_native,
    execute_system_message, execute_update_node_url,
};
use crate::limiter::initial_transfer_limits;
use crate::msg::{ExecuteMsg, InstantiateMsg, MigrateMsg, QueryMsg};
use crate::query::{
    query_committee_members, query_committee_registrations, query_config,
    query_parsed_token_transfer_message, query_route_limit, query_seq_num, query_token,
    query_token_transfer_signatures, query_token_transfer_status, query_tokens,
};
use crate::state::{
    migrate_inner, BridgeInner, BRIDGE_INNER, CONTRACT_NAME, CONTRACT_VERSION, CURRENT_VERSION,
    TRANSFER_LIMITS,
};

// ============================================================================
// Instantiate
// ============================================================================

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn instantiate(
    deps: DepsMut,
    _env: Env,
    _info: MessageInfo,
    msg: InstantiateMsg,
) -> Result<Response, ContractError> {
    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    // The contract only runs on a terra chain
    let chain_id = match ChainId::try_from(msg.chain_id) {
        Ok(
            id @ (ChainId::TerraMainnet | ChainId::TerraTestnet | ChainId::TerraCustom),
        ) => id,
        _ => {
            return Err(ContractError::InvalidChainId {
                chain_id: msg.chain_id,
            })
        }
    };
    let system_address = deps.api.addr_validate(&msg.system_address)?;
    let stake_provider = deps.api.addr_validate(&msg.stake_provider)?;

    BRIDGE_INNER.save(
        deps.storage,
        &BridgeInner {
            version: CURRENT_VERSION,
            chain_id,
            paused: false,
            system_address: system_address.clone(),
            stake_provider: stake_provider.clone(),
        },
    )?;

    for (route, limit) in initial_transfer_limits(chain_id) {
        TRANSFER_LIMITS.save(deps.storage, route.key(), &limit)?;
    }

    Ok(Response::new()
        .add_attribute("method", "instantiate")
        .add_attribute("chain_id", msg.chain_id.to_string())
        .add_attribute("system_address", system_address)
        .add_attribute("stake_provider", stake_provider))
}

// ============================================================================
// Execute
// ============================================================================

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn execute(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    msg: ExecuteMsg,
) -> Result<Response, ContractError> {
    match msg {
        // Outbound transfers
        ExecuteMsg::SendToken {
            target_chain,
            target_address,
        } => execute_send_native(deps, info, target_chain, target_address),
        ExecuteMsg::Receive(cw20_msg) => execute_receive(deps, info, cw20_msg),

        // Inbound transfers
        ExecuteMsg::ApproveTokenTransfer {
            message,
            signatures,
        } => execute_approve_token_transfer(deps, message, signatures),
        ExecuteMsg::ClaimToken {
            source_chain,
            seq_num,
        } => execute_claim_token(deps, env, info, source_chain, seq_num),
        ExecuteMsg::ClaimAndTransferToken {
            source_chain,
            seq_num,
        } => execute_claim_and_transfer_token(deps, env, source_chain, seq_num),

        // Governance
        ExecuteMsg::ExecuteSystemMessage {
            message,
            signatures,
        } => execute_system_message(deps, message, signatures),

        // Committee
        ExecuteMsg::RegisterCommittee {
            bridge_pubkey_bytes,
            http_rest_url,
        } => execute_register_committee(deps, info, bridge_pubkey_bytes, http_rest_url),
        ExecuteMsg::UpdateNodeUrl { new_url } => execute_update_node_url(deps, info, new_url),
        ExecuteMsg::InitCommittee {
            min_stake_participation_percentage,
        } => execute_init_committee(deps, env, info, min_stake_participation_percentage),

        // Treasury
        ExecuteMsg::RegisterForeignToken { token } => {
            execute_register_foreign_token(deps, env, token)
        }
        ExecuteMsg::RegisterNativeToken { denom, decimals } => {
            execute_register_native_token(deps, info, denom, decimals)
        }
    }
}

// ============================================================================
// Query
// ============================================================================

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn query(deps: Deps, _env: Env, msg: QueryMsg) -> StdResult<Binary> {
    match msg {
        QueryMsg::Config {} => to_json_binary(&query_config(deps)?),
        QueryMsg::SeqNum { message_type } => to_json_binary(&query_seq_num(deps, message_type)?),

        // Transfer queries
        QueryMsg::TokenTransferStatus {
            source_chain,
            seq_num,
        } => to_json_binary(&query_token_transfer_status(deps, source_chain, seq_num)?),
        QueryMsg::TokenTransferSignatures {
            source_chain,
            seq_num,
        } => to_json_binary(&query_token_transfer_signatures(
            deps,
            source_chain,
            seq_num,
        )?),
        QueryMsg::ParsedTokenTransferMessage {
            source_chain,
            seq_num,
        } => to_json_binary(&query_parsed_token_transfer_message(
            deps,
            source_chain,
            seq_num,
        )?),

        // Committee queries
        QueryMsg::CommitteeMembers { start_after, limit } => {
            to_json_binary(&query_committee_members(deps, start_after, limit)?)
        }
        QueryMsg::CommitteeRegistrations { start_after, limit } => {
            to_json_binary(&query_committee_registrations(deps, start_after, limit)?)
        }

        // Limiter and token queries
        QueryMsg::RouteLimit {
            source,
            destination,
        } => to_json_binary(&query_route_limit(deps, source, destination)?),
        QueryMsg::Token { token_id } => to_json_binary(&query_token(deps, token_id)?),
        QueryMsg::Tokens { start_after, limit } => {
            to_json_binary(&query_tokens(deps, start_after, limit)?)
        }
    }
}

// ============================================================================
// Migrate
// ============================================================================

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn migrate(deps: DepsMut, _env: Env, _msg: MigrateMsg) -> Result<Response, ContractError> {
    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;
    let previous = migrate_inner(deps.storage)?;

    Ok(Response::new()
        .add_attribute("action", "migrate")
        .add_attribute("version", CONTRACT_VERSION)
        .add_attribute("inner_version", previous.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cosmwasm_std::testing::{mock_dependencies, mock_env, mock_info};
    use cosmwasm_std::{coins, from_json};

    use crate::msg::{ConfigResponse, RouteLimitResponse};

    fn instantiate_msg(chain_id: u8) -> InstantiateMsg {
        InstantiateMsg {
            chain_id,
            system_address: "terra1system".to_string(),
            stake_provider: "terra1staking".to_string(),
        }
    }

    #[test]
    fn test_instantiate() {
        let mut deps = mock_dependencies();
        let info = mock_info("terra1creator", &[]);
        let res = instantiate(deps.as_mut(), mock_env(), info, instantiate_msg(0)).unwrap();
        assert_eq!(res.attributes[0].value, "instantiate");

        let config: ConfigResponse =
            from_json(query(deps.as_ref(), mock_env(), QueryMsg::Config {}).unwrap()).unwrap();
        assert_eq!(config.chain_id, 0);
        assert!(!config.paused);
        assert_eq!(config.version, CURRENT_VERSION);
        assert_eq!(config.last_committee_update_epoch, None);

        // mainnet starts with a 5M USD inbound limit
        let limit: RouteLimitResponse = from_json(
            query(
                deps.as_ref(),
                mock_env(),
                QueryMsg::RouteLimit {
                    source: 10,
                    destination: 0,
                },
            )
            .unwrap(),
        )
        .unwrap();
        assert_eq!(limit.limit, Some(5_000_000 * 100_000_000));
        assert!(limit.window.is_none());
        assert!(limit.hourly_amounts.is_empty());
    }

    #[test]
    fn test_instantiate_rejects_foreign_chain() {
        let mut deps = mock_dependencies();
        let info = mock_info("terra1creator", &[]);
        for chain_id in [10u8, 11, 3] {
            let err = instantiate(deps.as_mut(), mock_env(), info.clone(), instantiate_msg(chain_id))
                .unwrap_err();
            assert_eq!(err, ContractError::InvalidChainId { chain_id });
        }
    }

    #[test]
    fn test_testnet_limits_unbounded() {
        let mut deps = mock_dependencies();
        let info = mock_info("terra1creator", &[]);
        instantiate(deps.as_mut(), mock_env(), info, instantiate_msg(1)).unwrap();

        let limit: RouteLimitResponse = from_json(
            query(
                deps.as_ref(),
                mock_env(),
                QueryMsg::RouteLimit {
                    source: 11,
                    destination: 1,
                },
            )
            .unwrap(),
        )
        .unwrap();
        assert_eq!(limit.limit, Some(u64::MAX));

        // outbound routes are not limited here
        let limit: RouteLimitResponse = from_json(
            query(
                deps.as_ref(),
                mock_env(),
                QueryMsg::RouteLimit {
                    source: 1,
                    destination: 11,
                },
            )
            .unwrap(),
        )
        .unwrap();
        assert_eq!(limit.limit, None);
    }

    #[test]
    fn test_send_requires_listed_token() {
        let mut deps = mock_dependencies();
        let info = mock_info("terra1creator", &[]);
        instantiate(deps.as_mut(), mock_env(), info, instantiate_msg(1)).unwrap();

        let err = execute(
            deps.as_mut(),
            mock_env(),
            mock_info("terra1user", &coins(100, "uluna")),
            ExecuteMsg::SendToken {
                target_chain: 11,
                target_address: Binary::from(vec![0xab; 20]),
            },
        )
        .unwrap_err();
        assert_eq!(
            err,
            ContractError::UnsupportedTokenType {
                token: "uluna".to_string()
            }
        );

        let err = execute(
            deps.as_mut(),
            mock_env(),
            mock_info("terra1user", &[]),
            ExecuteMsg::SendToken {
                target_chain: 11,
                target_address: Binary::from(vec![0xab; 20]),
            },
        )
        .unwrap_err();
        assert_eq!(err, ContractError::NoFundsSent);
    }

    #[test]
    fn test_system_only_calls() {
        let mut deps = mock_dependencies();
        let info = mock_info("terra1creator", &[]);
        instantiate(deps.as_mut(), mock_env(), info, instantiate_msg(1)).unwrap();

        let err = execute(
            deps.as_mut(),
            mock_env(),
            mock_info("terra1user", &[]),
            ExecuteMsg::RegisterNativeToken {
                denom: "uluna".to_string(),
                decimals: 6,
            },
        )
        .unwrap_err();
        assert_eq!(err, ContractError::NotSystemAddress);

        let err = execute(
            deps.as_mut(),
            mock_env(),
            mock_info("terra1user", &[]),
            ExecuteMsg::InitCommittee {
                min_stake_participation_percentage: 50,
            },
        )
        .unwrap_err();
        assert_eq!(err, ContractError::NotSystemAddress);
    }

    #[test]
    fn test_migrate() {
        let mut deps = mock_dependencies();
        let info = mock_info("terra1creator", &[]);
        instantiate(deps.as_mut(), mock_env(), info, instantiate_msg(2)).unwrap();

        let res = migrate(deps.as_mut(), mock_env(), MigrateMsg {}).unwrap();
        assert_eq!(res.attributes[0].value, "migrate");
        assert_eq!(res.attributes[2].value, CURRENT_VERSION.to_string());
    }

    #[test]
    fn test_config_query_checks_state_version() {
        let mut deps = mock_dependencies();
        let info = mock_info("terra1creator", &[]);
        instantiate(deps.as_mut(), mock_env(), info, instantiate_msg(2)).unwrap();

        let mut inner = BRIDGE_INNER.load(&deps.storage).unwrap();
        inner.version = CURRENT_VERSION + 1;
        BRIDGE_INNER.save(&mut deps.storage, &inner).unwrap();

        let err = query(deps.as_ref(), mock_env(), QueryMsg::Config {}).unwrap_err();
        let expected = ContractError::WrongInnerVersion {
            expected: CURRENT_VERSION,
            found: CURRENT_VERSION + 1,
        };
        assert!(err.to_string().contains(&expected.to_string()));
    }
}
