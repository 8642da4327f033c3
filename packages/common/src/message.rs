//! Bridge message wire format.
//!
//! # Byte Layout
//! - Byte 0:      message type
//! - Byte 1:      message version
//! - Bytes 2-9:   sequence number (u64, big-endian)
//! - Byte 10:     source chain id
//! - Bytes 11-..: payload (layout depends on the message type)
//!
//! Integers inside payloads are big-endian as well, except for the add-tokens
//! payload which keeps the little-endian, ULEB128-length-prefixed vector
//! layout of the ledger's native serialization. Signers on every chain hash
//! these exact bytes, so none of this may change.

use cosmwasm_schema::cw_serde;
use cosmwasm_std::Binary;

use crate::chain_ids::{assert_valid_chain_id, ChainId};
use crate::error::CodecError;

pub const MESSAGE_VERSION: u8 = 1;

/// Domain separator prepended to the encoded message before hashing.
pub const BRIDGE_MESSAGE_PREFIX: &[u8] = b"CW_BRIDGE_MESSAGE";

pub const HEADER_LENGTH: usize = 11;
pub const EVM_ADDRESS_LENGTH: usize = 20;

// Voting power out of 10_000 required per message kind.
pub const APPROVAL_THRESHOLD_TOKEN_TRANSFER: u64 = 3334;
pub const APPROVAL_THRESHOLD_EMERGENCY_PAUSE: u64 = 450;
pub const APPROVAL_THRESHOLD_EMERGENCY_UNPAUSE: u64 = 5001;
pub const APPROVAL_THRESHOLD_COMMITTEE_BLOCKLIST: u64 = 5001;
pub const APPROVAL_THRESHOLD_LIMIT_UPDATE: u64 = 5001;
pub const APPROVAL_THRESHOLD_ASSET_PRICE_UPDATE: u64 = 5001;
pub const APPROVAL_THRESHOLD_ADD_TOKENS: u64 = 5001;

#[cw_serde]
#[derive(Copy, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum MessageType {
    TokenTransfer = 0,
    CommitteeBlocklist = 1,
    EmergencyOp = 2,
    UpdateBridgeLimit = 3,
    UpdateAssetPrice = 4,
    AddTokens = 6,
}

impl MessageType {
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::TokenTransfer => "token_transfer",
            MessageType::CommitteeBlocklist => "committee_blocklist",
            MessageType::EmergencyOp => "emergency_op",
            MessageType::UpdateBridgeLimit => "update_bridge_limit",
            MessageType::UpdateAssetPrice => "update_asset_price",
            MessageType::AddTokens => "add_tokens",
        }
    }
}

impl TryFrom<u8> for MessageType {
    type Error = CodecError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(MessageType::TokenTransfer),
            1 => Ok(MessageType::CommitteeBlocklist),
            2 => Ok(MessageType::EmergencyOp),
            3 => Ok(MessageType::UpdateBridgeLimit),
            4 => Ok(MessageType::UpdateAssetPrice),
            6 => Ok(MessageType::AddTokens),
            other => Err(CodecError::InvalidMessageType(other)),
        }
    }
}

/// Globally unique identity of one cross-chain instruction.
#[cw_serde]
#[derive(Copy, Eq, PartialOrd, Ord, Hash)]
pub struct MessageKey {
    pub source_chain: ChainId,
    pub message_type: MessageType,
    pub seq_num: u64,
}

impl MessageKey {
    pub fn new(source_chain: ChainId, message_type: MessageType, seq_num: u64) -> Self {
        Self {
            source_chain,
            message_type,
            seq_num,
        }
    }

    /// Storage key form of the message key.
    pub fn key(&self) -> (u8, u8, u64) {
        (
            self.source_chain.as_u8(),
            self.message_type.as_u8(),
            self.seq_num,
        )
    }
}

/// A bridge message with its payload kept as raw bytes.
///
/// Payloads are parsed on demand with the `extract_*` methods.
#[cw_serde]
pub struct BridgeMessage {
    pub message_type: MessageType,
    pub message_version: u8,
    pub seq_num: u64,
    pub source_chain: ChainId,
    pub payload: Binary,
}

// ============================================================================
// Payloads
// ============================================================================

#[cw_serde]
pub struct TokenTransferPayload {
    pub sender_address: Binary,
    pub target_chain: ChainId,
    pub target_address: Binary,
    pub token_type: u8,
    pub amount: u64,
}

#[cw_serde]
#[derive(Copy, Eq)]
#[repr(u8)]
pub enum EmergencyOpType {
    Pause = 0,
    Unpause = 1,
}

#[cw_serde]
#[derive(Copy, Eq)]
#[repr(u8)]
pub enum BlocklistType {
    Blocklist = 0,
    Unblocklist = 1,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlocklistPayload {
    pub blocklist_type: BlocklistType,
    pub validator_eth_addresses: Vec<[u8; EVM_ADDRESS_LENGTH]>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpdateBridgeLimitPayload {
    /// The chain whose inbound traffic is limited (the message source).
    pub receiving_chain: ChainId,
    pub sending_chain: ChainId,
    pub limit: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpdateAssetPricePayload {
    pub token_id: u8,
    pub new_price: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AddTokensPayload {
    pub native_token: bool,
    pub token_ids: Vec<u8>,
    pub token_type_names: Vec<String>,
    pub token_prices: Vec<u64>,
}

// ============================================================================
// Encoding
// ============================================================================

impl BridgeMessage {
    /// Serialize header and payload into wire bytes.
    pub fn encode(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(HEADER_LENGTH + self.payload.len());
        bytes.push(self.message_type.as_u8());
        bytes.push(self.message_version);
        bytes.extend_from_slice(&self.seq_num.to_be_bytes());
        bytes.push(self.source_chain.as_u8());
        bytes.extend_from_slice(self.payload.as_slice());
        bytes
    }

    /// The exact bytes committee members sign (before hashing).
    pub fn to_signing_bytes(&self) -> Vec<u8> {
        let mut bytes = BRIDGE_MESSAGE_PREFIX.to_vec();
        bytes.extend_from_slice(&self.encode());
        bytes
    }

    /// Parse the common header. The payload is validated later by the
    /// matching `extract_*` method.
    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut reader = Reader::new(bytes);
        let message_type = MessageType::try_from(reader.u8()?)?;
        let message_version = reader.u8()?;
        let seq_num = reader.u64_be()?;
        let source_chain = reader.chain_id()?;
        let payload = Binary::from(reader.rest());
        Ok(Self {
            message_type,
            message_version,
            seq_num,
            source_chain,
            payload,
        })
    }

    pub fn key(&self) -> MessageKey {
        MessageKey::new(self.source_chain, self.message_type, self.seq_num)
    }

    /// Voting power (out of 10_000) needed to approve this message.
    pub fn required_voting_power(&self) -> Result<u64, CodecError> {
        let threshold = match self.message_type {
            MessageType::TokenTransfer => APPROVAL_THRESHOLD_TOKEN_TRANSFER,
            MessageType::EmergencyOp => match self.extract_emergency_op_payload()? {
                EmergencyOpType::Pause => APPROVAL_THRESHOLD_EMERGENCY_PAUSE,
                EmergencyOpType::Unpause => APPROVAL_THRESHOLD_EMERGENCY_UNPAUSE,
            },
            MessageType::CommitteeBlocklist => APPROVAL_THRESHOLD_COMMITTEE_BLOCKLIST,
            MessageType::UpdateBridgeLimit => APPROVAL_THRESHOLD_LIMIT_UPDATE,
            MessageType::UpdateAssetPrice => APPROVAL_THRESHOLD_ASSET_PRICE_UPDATE,
            MessageType::AddTokens => APPROVAL_THRESHOLD_ADD_TOKENS,
        };
        Ok(threshold)
    }

    fn expect_type(&self, expected: MessageType) -> Result<Reader<'_>, CodecError> {
        if self.message_type != expected {
            return Err(CodecError::WrongMessageType {
                expected: expected.as_str(),
            });
        }
        Ok(Reader::new(self.payload.as_slice()))
    }

    pub fn extract_token_transfer_payload(&self) -> Result<TokenTransferPayload, CodecError> {
        let mut reader = self.expect_type(MessageType::TokenTransfer)?;
        let sender_address = reader.short_bytes()?;
        let target_chain = reader.chain_id()?;
        let target_address = reader.short_bytes()?;
        let token_type = reader.u8()?;
        let amount = reader.u64_be()?;
        reader.finish()?;
        Ok(TokenTransferPayload {
            sender_address: Binary::from(sender_address),
            target_chain,
            target_address: Binary::from(target_address),
            token_type,
            amount,
        })
    }

    pub fn extract_emergency_op_payload(&self) -> Result<EmergencyOpType, CodecError> {
        let mut reader = self.expect_type(MessageType::EmergencyOp)?;
        let op = match reader.u8()? {
            0 => EmergencyOpType::Pause,
            1 => EmergencyOpType::Unpause,
            other => return Err(CodecError::InvalidEmergencyOpType(other)),
        };
        reader.finish()?;
        Ok(op)
    }

    pub fn extract_blocklist_payload(&self) -> Result<BlocklistPayload, CodecError> {
        let mut reader = self.expect_type(MessageType::CommitteeBlocklist)?;
        let blocklist_type = match reader.u8()? {
            0 => BlocklistType::Blocklist,
            1 => BlocklistType::Unblocklist,
            other => return Err(CodecError::InvalidBlocklistType(other)),
        };
        let count = reader.u8()? as usize;
        let mut validator_eth_addresses = Vec::with_capacity(count);
        for _ in 0..count {
            let mut address = [0u8; EVM_ADDRESS_LENGTH];
            address.copy_from_slice(reader.take(EVM_ADDRESS_LENGTH)?);
            validator_eth_addresses.push(address);
        }
        reader.finish()?;
        Ok(BlocklistPayload {
            blocklist_type,
            validator_eth_addresses,
        })
    }

    pub fn extract_update_bridge_limit(&self) -> Result<UpdateBridgeLimitPayload, CodecError> {
        let mut reader = self.expect_type(MessageType::UpdateBridgeLimit)?;
        let sending_chain = reader.chain_id()?;
        let limit = reader.u64_be()?;
        reader.finish()?;
        Ok(UpdateBridgeLimitPayload {
            receiving_chain: self.source_chain,
            sending_chain,
            limit,
        })
    }

    pub fn extract_update_asset_price(&self) -> Result<UpdateAssetPricePayload, CodecError> {
        let mut reader = self.expect_type(MessageType::UpdateAssetPrice)?;
        let token_id = reader.u8()?;
        let new_price = reader.u64_be()?;
        reader.finish()?;
        Ok(UpdateAssetPricePayload {
            token_id,
            new_price,
        })
    }

    pub fn extract_add_tokens(&self) -> Result<AddTokensPayload, CodecError> {
        let mut reader = self.expect_type(MessageType::AddTokens)?;
        let native_token = reader.bool()?;
        let token_ids = reader.seq_bytes()?;
        let names = reader.uleb128()?;
        let mut token_type_names = Vec::with_capacity(names.min(256));
        for _ in 0..names {
            let raw = reader.seq_bytes()?;
            let name = String::from_utf8(raw).map_err(|_| CodecError::InvalidUtf8)?;
            token_type_names.push(name);
        }
        let prices = reader.uleb128()?;
        let mut token_prices = Vec::with_capacity(prices.min(256));
        for _ in 0..prices {
            token_prices.push(reader.u64_le()?);
        }
        reader.finish()?;
        Ok(AddTokensPayload {
            native_token,
            token_ids,
            token_type_names,
            token_prices,
        })
    }
}

// ============================================================================
// Constructors
// ============================================================================

fn new_message(
    message_type: MessageType,
    seq_num: u64,
    source_chain: ChainId,
    payload: Vec<u8>,
) -> BridgeMessage {
    BridgeMessage {
        message_type,
        message_version: MESSAGE_VERSION,
        seq_num,
        source_chain,
        payload: Binary::from(payload),
    }
}

#[allow(clippy::too_many_arguments)]
pub fn create_token_bridge_message(
    source_chain: ChainId,
    seq_num: u64,
    sender_address: &[u8],
    target_chain: ChainId,
    target_address: &[u8],
    token_type: u8,
    amount: u64,
) -> Result<BridgeMessage, CodecError> {
    let mut payload = Vec::new();
    push_short_bytes(&mut payload, sender_address)?;
    payload.push(target_chain.as_u8());
    push_short_bytes(&mut payload, target_address)?;
    payload.push(token_type);
    payload.extend_from_slice(&amount.to_be_bytes());
    Ok(new_message(
        MessageType::TokenTransfer,
        seq_num,
        source_chain,
        payload,
    ))
}

pub fn create_emergency_op_message(
    source_chain: ChainId,
    seq_num: u64,
    op_type: EmergencyOpType,
) -> BridgeMessage {
    new_message(
        MessageType::EmergencyOp,
        seq_num,
        source_chain,
        vec![op_type as u8],
    )
}

pub fn create_blocklist_message(
    source_chain: ChainId,
    seq_num: u64,
    blocklist_type: BlocklistType,
    validator_eth_addresses: &[[u8; EVM_ADDRESS_LENGTH]],
) -> Result<BridgeMessage, CodecError> {
    let count = u8::try_from(validator_eth_addresses.len()).map_err(|_| {
        CodecError::FieldTooLong {
            len: validator_eth_addresses.len(),
        }
    })?;
    let mut payload = vec![blocklist_type as u8, count];
    for address in validator_eth_addresses {
        payload.extend_from_slice(address);
    }
    Ok(new_message(
        MessageType::CommitteeBlocklist,
        seq_num,
        source_chain,
        payload,
    ))
}

pub fn create_update_bridge_limit_message(
    receiving_chain: ChainId,
    seq_num: u64,
    sending_chain: ChainId,
    new_limit: u64,
) -> BridgeMessage {
    let mut payload = vec![sending_chain.as_u8()];
    payload.extend_from_slice(&new_limit.to_be_bytes());
    new_message(
        MessageType::UpdateBridgeLimit,
        seq_num,
        receiving_chain,
        payload,
    )
}

pub fn create_update_asset_price_message(
    token_id: u8,
    source_chain: ChainId,
    seq_num: u64,
    new_price: u64,
) -> BridgeMessage {
    let mut payload = vec![token_id];
    payload.extend_from_slice(&new_price.to_be_bytes());
    new_message(
        MessageType::UpdateAssetPrice,
        seq_num,
        source_chain,
        payload,
    )
}

pub fn create_add_tokens_message(
    source_chain: ChainId,
    seq_num: u64,
    native_token: bool,
    token_ids: &[u8],
    token_type_names: &[String],
    token_prices: &[u64],
) -> BridgeMessage {
    let mut payload = vec![native_token as u8];
    push_seq_bytes(&mut payload, token_ids);
    push_uleb128(&mut payload, token_type_names.len());
    for name in token_type_names {
        push_seq_bytes(&mut payload, name.as_bytes());
    }
    push_uleb128(&mut payload, token_prices.len());
    for price in token_prices {
        payload.extend_from_slice(&price.to_le_bytes());
    }
    new_message(MessageType::AddTokens, seq_num, source_chain, payload)
}

/// Single-byte length prefix. Addresses never exceed 255 bytes.
fn push_short_bytes(out: &mut Vec<u8>, data: &[u8]) -> Result<(), CodecError> {
    let len = u8::try_from(data.len()).map_err(|_| CodecError::FieldTooLong { len: data.len() })?;
    out.push(len);
    out.extend_from_slice(data);
    Ok(())
}

fn push_seq_bytes(out: &mut Vec<u8>, data: &[u8]) {
    push_uleb128(out, data.len());
    out.extend_from_slice(data);
}

fn push_uleb128(out: &mut Vec<u8>, mut value: usize) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}

// ============================================================================
// Decoding
// ============================================================================

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], CodecError> {
        let remaining = self.bytes.len() - self.pos;
        if remaining < n {
            return Err(CodecError::UnexpectedEof {
                needed: n - remaining,
            });
        }
        let out = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    fn rest(&mut self) -> &'a [u8] {
        let out = &self.bytes[self.pos..];
        self.pos = self.bytes.len();
        out
    }

    fn u8(&mut self) -> Result<u8, CodecError> {
        Ok(self.take(1)?[0])
    }

    fn bool(&mut self) -> Result<bool, CodecError> {
        match self.u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(CodecError::InvalidBool(other)),
        }
    }

    fn chain_id(&mut self) -> Result<ChainId, CodecError> {
        assert_valid_chain_id(self.u8()?)
    }

    fn u64_be(&mut self) -> Result<u64, CodecError> {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(self.take(8)?);
        Ok(u64::from_be_bytes(buf))
    }

    fn u64_le(&mut self) -> Result<u64, CodecError> {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(self.take(8)?);
        Ok(u64::from_le_bytes(buf))
    }

    fn short_bytes(&mut self) -> Result<Vec<u8>, CodecError> {
        let len = self.u8()? as usize;
        Ok(self.take(len)?.to_vec())
    }

    fn uleb128(&mut self) -> Result<usize, CodecError> {
        let mut value: u64 = 0;
        for shift in (0..32).step_by(7) {
            let byte = self.u8()?;
            value |= u64::from(byte & 0x7f) << shift;
            if byte & 0x80 == 0 {
                return usize::try_from(value).map_err(|_| CodecError::LengthOverflow);
            }
        }
        Err(CodecError::LengthOverflow)
    }

    fn seq_bytes(&mut self) -> Result<Vec<u8>, CodecError> {
        let len = self.uleb128()?;
        Ok(self.take(len)?.to_vec())
    }

    fn finish(self) -> Result<(), CodecError> {
        let count = self.bytes.len() - self.pos;
        if count > 0 {
            return Err(CodecError::TrailingBytes { count });
        }
        Ok(())
    }
}
