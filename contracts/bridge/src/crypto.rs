//! Hashing and secp256k1 key handling for committee signatures
//!
//! Committee members sign `keccak256(BRIDGE_MESSAGE_PREFIX || message)` with
//! 65-byte recoverable signatures (`r || s || v`). Recovery runs through the
//! host `Api`, which returns the uncompressed key; members are stored by
//! their 33-byte compressed key.

use cosmwasm_std::Api;
use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::PublicKey;
use tiny_keccak::{Hasher, Keccak};

use bridge_common::message::EVM_ADDRESS_LENGTH;
use bridge_common::BridgeMessage;

use crate::error::ContractError;

pub const SIGNATURE_LENGTH: usize = 65;
pub const COMPRESSED_PUBKEY_LENGTH: usize = 33;
pub const UNCOMPRESSED_PUBKEY_LENGTH: usize = 65;

/// Compute keccak256 hash of arbitrary data
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    hasher.update(data);
    let mut output = [0u8; 32];
    hasher.finalize(&mut output);
    output
}

/// Digest the committee signs for `message`.
pub fn message_digest(message: &BridgeMessage) -> [u8; 32] {
    keccak256(&message.to_signing_bytes())
}

/// Recover the signer of `digest` as a compressed public key.
///
/// The recovery id may be given as 0/1 or in the Ethereum 27/28 form.
pub fn recover_compressed_pubkey(
    api: &dyn Api,
    digest: &[u8; 32],
    signature: &[u8],
) -> Result<Vec<u8>, ContractError> {
    if signature.len() != SIGNATURE_LENGTH {
        return Err(ContractError::InvalidSignature);
    }
    let recovery_id = match signature[64] {
        v @ (0 | 1) => v,
        v @ (27 | 28) => v - 27,
        _ => return Err(ContractError::InvalidSignature),
    };
    let uncompressed = api
        .secp256k1_recover_pubkey(digest, &signature[..64], recovery_id)
        .map_err(|_| ContractError::InvalidSignature)?;
    compress_pubkey(&uncompressed)
}

/// `0x04 || x || y` to `0x02|0x03 || x`.
pub fn compress_pubkey(uncompressed: &[u8]) -> Result<Vec<u8>, ContractError> {
    if uncompressed.len() != UNCOMPRESSED_PUBKEY_LENGTH || uncompressed[0] != 0x04 {
        return Err(ContractError::InvalidPubkey);
    }
    let prefix = if uncompressed[64] & 1 == 1 { 0x03 } else { 0x02 };
    let mut compressed = Vec::with_capacity(COMPRESSED_PUBKEY_LENGTH);
    compressed.push(prefix);
    compressed.extend_from_slice(&uncompressed[1..33]);
    Ok(compressed)
}

/// Parse a compressed key, rejecting anything that is not a curve point.
pub fn decompress_pubkey(compressed: &[u8]) -> Result<Vec<u8>, ContractError> {
    if compressed.len() != COMPRESSED_PUBKEY_LENGTH {
        return Err(ContractError::InvalidPubkeyLength {
            got: compressed.len(),
        });
    }
    // sec1 also parses the 0x05 compact tag; only 0x02/0x03 are ever recovered
    if !matches!(compressed[0], 0x02 | 0x03) {
        return Err(ContractError::InvalidPubkey);
    }
    let key = PublicKey::from_sec1_bytes(compressed).map_err(|_| ContractError::InvalidPubkey)?;
    Ok(key.to_encoded_point(false).as_bytes().to_vec())
}

/// EVM address controlled by a committee key: last 20 bytes of the keccak
/// hash of the uncompressed key without its 0x04 tag.
pub fn evm_address_from_pubkey(
    compressed: &[u8],
) -> Result<[u8; EVM_ADDRESS_LENGTH], ContractError> {
    let uncompressed = decompress_pubkey(compressed)?;
    let hash = keccak256(&uncompressed[1..]);
    let mut address = [0u8; EVM_ADDRESS_LENGTH];
    address.copy_from_slice(&hash[12..]);
    Ok(address)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cosmwasm_std::testing::MockApi;
    use k256::ecdsa::SigningKey;

    fn signing_key(seed: u8) -> SigningKey {
        SigningKey::from_bytes(&[seed; 32].into()).unwrap()
    }

    fn compressed(key: &SigningKey) -> Vec<u8> {
        key.verifying_key()
            .to_encoded_point(true)
            .as_bytes()
            .to_vec()
    }

    fn sign(key: &SigningKey, digest: &[u8; 32], eth_style: bool) -> Vec<u8> {
        let (sig, recid) = key.sign_prehash_recoverable(digest).unwrap();
        let mut out = sig.to_bytes().to_vec();
        let v = recid.to_byte();
        out.push(if eth_style { v + 27 } else { v });
        out
    }

    #[test]
    fn test_keccak256_empty() {
        assert_eq!(
            hex::encode(keccak256(b"")),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn test_recover_matches_signer() {
        let api = MockApi::default();
        let key = signing_key(7);
        let digest = keccak256(b"hello bridge");

        for eth_style in [false, true] {
            let sig = sign(&key, &digest, eth_style);
            let recovered = recover_compressed_pubkey(&api, &digest, &sig).unwrap();
            assert_eq!(recovered, compressed(&key));
        }
    }

    #[test]
    fn test_recover_rejects_bad_signatures() {
        let api = MockApi::default();
        let key = signing_key(7);
        let digest = keccak256(b"hello bridge");
        let mut sig = sign(&key, &digest, false);

        assert_eq!(
            recover_compressed_pubkey(&api, &digest, &sig[..64]),
            Err(ContractError::InvalidSignature)
        );
        sig[64] = 5;
        assert_eq!(
            recover_compressed_pubkey(&api, &digest, &sig),
            Err(ContractError::InvalidSignature)
        );
    }

    #[test]
    fn test_compress_decompress() {
        let key = signing_key(9);
        let uncompressed = key
            .verifying_key()
            .to_encoded_point(false)
            .as_bytes()
            .to_vec();
        let c = compress_pubkey(&uncompressed).unwrap();
        assert_eq!(c, compressed(&key));
        assert_eq!(decompress_pubkey(&c).unwrap(), uncompressed);
    }

    #[test]
    fn test_decompress_rejects_invalid() {
        assert_eq!(
            decompress_pubkey(&[2u8; 32]),
            Err(ContractError::InvalidPubkeyLength { got: 32 })
        );
        // 0x05 is not a valid SEC1 tag
        let mut bad = vec![0x05];
        bad.extend_from_slice(&[1u8; 32]);
        assert_eq!(decompress_pubkey(&bad), Err(ContractError::InvalidPubkey));
    }

    #[test]
    fn test_decompress_rejects_compact_form_of_real_key() {
        let key = signing_key(7);
        let mut compact = compressed(&key);
        compact[0] = 0x05;
        assert_eq!(decompress_pubkey(&compact), Err(ContractError::InvalidPubkey));
        let mut uncompressed_tag = compressed(&key);
        uncompressed_tag[0] = 0x04;
        assert_eq!(
            decompress_pubkey(&uncompressed_tag),
            Err(ContractError::InvalidPubkey)
        );
    }

    #[test]
    fn test_evm_address_known_key() {
        // private key 0x...01 belongs to 0x7e5f4552091a69125d5dfcb7b8c2659029395bdf
        let mut secret = [0u8; 32];
        secret[31] = 1;
        let key = SigningKey::from_bytes(&secret.into()).unwrap();
        let address = evm_address_from_pubkey(&compressed(&key)).unwrap();
        assert_eq!(
            hex::encode(address),
            "7e5f4552091a69125d5dfcb7b8c2659029395bdf"
        );
    }
}
