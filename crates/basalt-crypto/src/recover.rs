//! ECDSA public key recovery on secp256k1

use crate::{keccak256, CryptoError};
use basalt_primitives::{Address, H256};
use k256::ecdsa::{RecoveryId, Signature as K256Signature, VerifyingKey};

/// Recover the signer address from a message hash and a signature.
///
/// `v` is the Ethereum recovery identifier and must be 27 or 28
/// (the raw 0/1 form is accepted as well). The address is the low
/// 20 bytes of the Keccak-256 hash of the uncompressed public key.
pub fn recover_address(
    message_hash: &H256,
    v: u8,
    r: &[u8; 32],
    s: &[u8; 32],
) -> Result<Address, CryptoError> {
    let recovery_byte = if v >= 27 { v - 27 } else { v };
    let recovery_id =
        RecoveryId::try_from(recovery_byte).map_err(|_| CryptoError::InvalidRecoveryId(v))?;

    let r: k256::FieldBytes = (*r).into();
    let s: k256::FieldBytes = (*s).into();
    let signature = K256Signature::from_scalars(r, s)
        .map_err(|e| CryptoError::InvalidSignature(e.to_string()))?;

    let public_key =
        VerifyingKey::recover_from_prehash(message_hash.as_bytes(), &signature, recovery_id)
            .map_err(|e| CryptoError::RecoveryFailed(e.to_string()))?;

    // Uncompressed encoding is 0x04 || x || y; the address hashes x || y.
    let encoded = public_key.to_encoded_point(false);
    let hash = keccak256(&encoded.as_bytes()[1..]);

    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&hash.as_bytes()[12..]);
    Ok(Address::from_bytes(bytes))
}
