//! Execute handlers for the committee bridge contract.
//!
//! This module contains all execute message handlers, organized by category:
//! - `transfer` - SendToken, Receive, ApproveTokenTransfer and the claim handlers
//! - `governance` - committee-signed system messages
//! - `committee` - committee registration and creation
//! - `treasury` - token registration

mod committee;
mod governance;
mod transfer;
mod treasury;

pub use committee::*;
pub use governance::*;
pub use transfer::*;
pub use treasury::*;

use cosmwasm_std::Addr;

use crate::error::ContractError;
use crate::state::BridgeInner;

/// Fails unless `sender` is the platform system address.
fn ensure_system_address(inner: &BridgeInner, sender: &Addr) -> Result<(), ContractError> {
    if *sender != inner.system_address {
        return Err(ContractError::NotSystemAddress);
    }
    Ok(())
}
