//! Per-route rolling 24-hour notional limiter
//!
//! Only the receiving side of a route is limited. Each claim of an inbound
//! transfer converts the token amount to USD notional and records it into
//! the hourly bucket of the route's window; a claim that would push the
//! window total past the route limit is refused without touching state.

use bridge_common::chain_ids::VALID_ROUTES;
use bridge_common::{ChainId, Route};
use cosmwasm_std::{Env, Event, StdError, Storage, Uint128, Uint256};

use crate::error::ContractError;
use crate::events;
use crate::state::{TransferWindow, TRANSFER_LIMITS, TRANSFER_WINDOWS, WINDOW_HOURS};

/// USD values carry 8 decimals.
pub const USD_VALUE_MULTIPLIER: u64 = 100_000_000;

/// Default limit for routes into mainnet, in whole USD
pub const MAX_TRANSFER_LIMIT_MAINNET_USD: u64 = 5_000_000;

const SECONDS_PER_HOUR: u64 = 3600;

pub fn current_hour_since_epoch(env: &Env) -> u64 {
    env.block.time.seconds() / SECONDS_PER_HOUR
}

/// Starting limits for every route that ends on `local_chain`.
pub fn initial_transfer_limits(local_chain: ChainId) -> Vec<(Route, u64)> {
    let limit = match local_chain {
        ChainId::TerraMainnet => MAX_TRANSFER_LIMIT_MAINNET_USD * USD_VALUE_MULTIPLIER,
        _ => u64::MAX,
    };
    VALID_ROUTES
        .iter()
        .filter(|route| route.destination == local_chain)
        .map(|route| (*route, limit))
        .collect()
}

impl TransferWindow {
    pub fn new(hour: u64) -> Self {
        Self {
            hour_head: hour,
            hour_tail: hour,
            per_hour_amounts: [0; WINDOW_HOURS],
            total_amount: 0,
        }
    }

    fn slot(hour: u64) -> usize {
        (hour % WINDOW_HOURS as u64) as usize
    }

    /// Move the window so it ends at `current_hour`.
    ///
    /// A window whose head fell out of range is replaced; otherwise expired
    /// buckets are evicted one hour at a time.
    pub fn advance(&mut self, current_hour: u64) {
        if current_hour <= self.hour_head {
            return;
        }
        let target_tail = current_hour.saturating_sub(WINDOW_HOURS as u64 - 1);

        if self.hour_head < target_tail {
            *self = Self::new(current_hour);
            self.hour_tail = target_tail;
            return;
        }

        while self.hour_tail < target_tail {
            let slot = Self::slot(self.hour_tail);
            self.total_amount -= self.per_hour_amounts[slot];
            self.per_hour_amounts[slot] = 0;
            self.hour_tail += 1;
        }

        while self.hour_head < current_hour {
            self.hour_head += 1;
            self.per_hour_amounts[Self::slot(self.hour_head)] = 0;
        }
    }

    fn record(&mut self, notional: u64) {
        let slot = Self::slot(self.hour_head);
        self.per_hour_amounts[slot] += notional;
        self.total_amount += notional;
    }

    /// Bucket amounts from oldest (`hour_tail`) to newest (`hour_head`).
    pub fn ordered_amounts(&self) -> Vec<u64> {
        (self.hour_tail..=self.hour_head)
            .map(|hour| self.per_hour_amounts[Self::slot(hour)])
            .collect()
    }
}

/// Record an inbound transfer against the route window.
///
/// Returns `Ok(false)` when the transfer would exceed the route limit; state
/// is left untouched in that case.
pub fn check_and_record_sending_transfer(
    storage: &mut dyn Storage,
    route: &Route,
    amount: u64,
    notional_value: u64,
    decimal_multiplier: u64,
    current_hour: u64,
) -> Result<bool, ContractError> {
    let limit =
        TRANSFER_LIMITS
            .may_load(storage, route.key())?
            .ok_or(ContractError::LimitNotFoundForRoute {
                source_chain: route.source.as_u8(),
                destination_chain: route.destination.as_u8(),
            })?;

    let mut window = TRANSFER_WINDOWS
        .may_load(storage, route.key())?
        .unwrap_or_else(|| TransferWindow::new(0));
    window.advance(current_hour);

    // compare in token units scaled by the multiplier so nothing is rounded
    let multiplier = Uint256::from(decimal_multiplier);
    let value = Uint256::from(amount) * Uint256::from(notional_value);
    let used = Uint256::from(window.total_amount) * multiplier;
    if used + value > Uint256::from(limit) * multiplier {
        return Ok(false);
    }

    // bounded by the limit, which is a u64
    let notional = Uint128::try_from(value / multiplier)
        .ok()
        .and_then(|n| u64::try_from(n.u128()).ok())
        .ok_or_else(|| StdError::generic_err("notional amount exceeds u64"))?;
    window.record(notional);
    TRANSFER_WINDOWS.save(storage, route.key(), &window)?;
    Ok(true)
}

/// Set the notional limit of `route`, returning the change event.
pub fn update_route_limit(
    storage: &mut dyn Storage,
    route: &Route,
    new_limit: u64,
) -> Result<Event, ContractError> {
    TRANSFER_LIMITS.save(storage, route.key(), &new_limit)?;
    Ok(events::update_route_limit(route, new_limit))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_common::chain_ids::get_route;
    use cosmwasm_std::testing::MockStorage;

    const USD: u64 = USD_VALUE_MULTIPLIER;

    fn eth_to_terra() -> Route {
        get_route(ChainId::EthSepolia, ChainId::TerraTestnet).unwrap()
    }

    fn setup(limit: u64) -> MockStorage {
        let mut storage = MockStorage::new();
        update_route_limit(&mut storage, &eth_to_terra(), limit).unwrap();
        storage
    }

    fn window(storage: &MockStorage) -> TransferWindow {
        TRANSFER_WINDOWS
            .load(storage, eth_to_terra().key())
            .unwrap()
    }

    // token with 8 decimals priced at $10
    fn record(storage: &mut MockStorage, whole_tokens: u64, hour: u64) -> bool {
        check_and_record_sending_transfer(
            storage,
            &eth_to_terra(),
            whole_tokens * 100_000_000,
            10 * USD,
            100_000_000,
            hour,
        )
        .unwrap()
    }

    #[test]
    fn test_initial_limits() {
        let mainnet = initial_transfer_limits(ChainId::TerraMainnet);
        assert_eq!(mainnet.len(), 1);
        assert_eq!(mainnet[0].0.source, ChainId::EthMainnet);
        assert_eq!(mainnet[0].1, 5_000_000 * USD);

        let testnet = initial_transfer_limits(ChainId::TerraTestnet);
        assert_eq!(testnet.len(), 2);
        assert!(testnet.iter().all(|(r, l)| r.destination == ChainId::TerraTestnet
            && *l == u64::MAX));
    }

    #[test]
    fn test_missing_limit_is_error() {
        let mut storage = MockStorage::new();
        let err = check_and_record_sending_transfer(&mut storage, &eth_to_terra(), 1, 1, 1, 0)
            .unwrap_err();
        assert_eq!(
            err,
            ContractError::LimitNotFoundForRoute {
                source_chain: 11,
                destination_chain: 1
            }
        );
    }

    #[test]
    fn test_records_within_limit() {
        let mut storage = setup(1_000 * USD);
        assert!(record(&mut storage, 50, 10));
        assert!(record(&mut storage, 40, 10));
        let w = window(&storage);
        assert_eq!(w.total_amount, 900 * USD);
        assert_eq!(w.hour_head, 10);
        assert_eq!(w.ordered_amounts().last(), Some(&(900 * USD)));
    }

    #[test]
    fn test_rejection_does_not_mutate() {
        let mut storage = setup(1_000 * USD);
        assert!(record(&mut storage, 100, 5));
        let before = window(&storage);

        // one more token would be $1010
        assert!(!record(&mut storage, 1, 6));
        assert_eq!(window(&storage), before);

        // exactly at the limit is fine
        let mut storage = setup(1_000 * USD);
        assert!(record(&mut storage, 99, 5));
        assert!(check_and_record_sending_transfer(
            &mut storage,
            &eth_to_terra(),
            100_000_000,
            10 * USD,
            100_000_000,
            5
        )
        .unwrap());
        assert_eq!(window(&storage).total_amount, 1_000 * USD);
    }

    #[test]
    fn test_value_expires_after_24_hours() {
        let mut storage = setup(1_000 * USD);
        assert!(record(&mut storage, 100, 100));
        assert!(!record(&mut storage, 1, 123));
        // hour 124 = 100 + 24 evicts the hour-100 bucket
        assert!(record(&mut storage, 1, 124));
        let w = window(&storage);
        assert_eq!(w.total_amount, 10 * USD);
        assert_eq!(w.hour_tail, 101);
        assert_eq!(w.hour_head, 124);
    }

    #[test]
    fn test_stale_window_is_reset() {
        let mut storage = setup(u64::MAX);
        assert!(record(&mut storage, 10, 1_000));
        assert!(record(&mut storage, 10, 5_000));
        let w = window(&storage);
        assert_eq!(w.hour_head, 5_000);
        assert_eq!(w.hour_tail, 4_977);
        assert_eq!(w.total_amount, 100 * USD);
        assert_eq!(w.ordered_amounts().len(), 24);
    }

    #[test]
    fn test_window_sum_invariant() {
        let mut storage = setup(u64::MAX);
        for hour in [3u64, 3, 7, 20, 26, 27, 40, 49, 49, 80] {
            record(&mut storage, hour, hour);
            let w = window(&storage);
            assert_eq!(w.total_amount, w.per_hour_amounts.iter().sum::<u64>());
            assert!(w.hour_head - w.hour_tail < 24);
        }
    }

    #[test]
    fn test_advance_evicts_in_place() {
        let mut w = TransferWindow::new(0);
        w.advance(5);
        w.record(7);
        w.advance(20);
        w.record(3);
        assert_eq!(w.total_amount, 10);
        w.advance(29);
        assert_eq!(w.hour_tail, 6);
        assert_eq!(w.total_amount, 3);
        assert_eq!(w.ordered_amounts().len(), 24);
    }

    #[test]
    fn test_large_values_do_not_overflow() {
        let mut storage = setup(u64::MAX);
        let ok = check_and_record_sending_transfer(
            &mut storage,
            &eth_to_terra(),
            u64::MAX,
            u64::MAX,
            u64::MAX,
            1,
        )
        .unwrap();
        assert!(ok);
        assert_eq!(window(&storage).total_amount, u64::MAX);
    }
}
