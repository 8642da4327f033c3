//! Chain identifiers and the bridge route whitelist.
//!
//! The whitelist is enumerated by hand. Adding a route is a code change that
//! goes through review, never a storage update.

use cosmwasm_schema::cw_serde;

use crate::error::CodecError;

/// One-byte chain identifier used on the wire.
#[cw_serde]
#[derive(Copy, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum ChainId {
    TerraMainnet = 0,
    TerraTestnet = 1,
    TerraCustom = 2,
    EthMainnet = 10,
    EthSepolia = 11,
    EthCustom = 12,
}

impl ChainId {
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for ChainId {
    type Error = CodecError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ChainId::TerraMainnet),
            1 => Ok(ChainId::TerraTestnet),
            2 => Ok(ChainId::TerraCustom),
            10 => Ok(ChainId::EthMainnet),
            11 => Ok(ChainId::EthSepolia),
            12 => Ok(ChainId::EthCustom),
            other => Err(CodecError::InvalidChainId(other)),
        }
    }
}

impl std::fmt::Display for ChainId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

/// Fails unless `id` is one of the known chains.
pub fn assert_valid_chain_id(id: u8) -> Result<ChainId, CodecError> {
    ChainId::try_from(id)
}

/// A directed (source, destination) chain pair.
#[cw_serde]
#[derive(Copy, Eq, PartialOrd, Ord, Hash)]
pub struct Route {
    pub source: ChainId,
    pub destination: ChainId,
}

impl Route {
    /// Storage key form of the route.
    pub fn key(&self) -> (u8, u8) {
        (self.source.as_u8(), self.destination.as_u8())
    }
}

const fn route(source: ChainId, destination: ChainId) -> Route {
    Route {
        source,
        destination,
    }
}

/// Every route the bridge accepts.
pub const VALID_ROUTES: [Route; 10] = [
    route(ChainId::TerraMainnet, ChainId::EthMainnet),
    route(ChainId::EthMainnet, ChainId::TerraMainnet),
    route(ChainId::TerraTestnet, ChainId::EthSepolia),
    route(ChainId::TerraTestnet, ChainId::EthCustom),
    route(ChainId::TerraCustom, ChainId::EthCustom),
    route(ChainId::TerraCustom, ChainId::EthSepolia),
    route(ChainId::EthSepolia, ChainId::TerraTestnet),
    route(ChainId::EthSepolia, ChainId::TerraCustom),
    route(ChainId::EthCustom, ChainId::TerraTestnet),
    route(ChainId::EthCustom, ChainId::TerraCustom),
];

pub fn is_valid_route(source: ChainId, destination: ChainId) -> bool {
    VALID_ROUTES.contains(&route(source, destination))
}

/// Returns the route when whitelisted, `None` otherwise.
pub fn get_route(source: ChainId, destination: ChainId) -> Option<Route> {
    let candidate = route(source, destination);
    VALID_ROUTES.contains(&candidate).then_some(candidate)
}
