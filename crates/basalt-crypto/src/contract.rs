//! Contract address derivation

use crate::keccak256;
use basalt_primitives::{Address, H256};
use rlp::RlpStream;

/// Derive the address of a contract created with CREATE.
///
/// The address is the low 20 bytes of `keccak256(rlp([sender, nonce]))`.
pub fn create_address(sender: Address, nonce: u64) -> Address {
    let mut stream = RlpStream::new_list(2);
    stream.append(&sender.as_bytes().as_slice());
    stream.append(&nonce);
    let hash = keccak256(&stream.out());

    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&hash.as_bytes()[12..]);
    Address::from_bytes(bytes)
}

/// Derive the address of a contract created with CREATE2.
///
/// The address is the low 20 bytes of
/// `keccak256(0xff || sender || salt || keccak256(init_code))`.
pub fn create2_address(sender: Address, salt: H256, init_code_hash: H256) -> Address {
    let mut buf = [0u8; 85];
    buf[0] = 0xff;
    buf[1..21].copy_from_slice(sender.as_bytes());
    buf[21..53].copy_from_slice(salt.as_bytes());
    buf[53..85].copy_from_slice(init_code_hash.as_bytes());
    let hash = keccak256(&buf);

    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&hash.as_bytes()[12..]);
    Address::from_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_address_known_vectors() {
        let sender = Address::from_hex("0x6ac7ea33f8831ea9dcc53393aaa88b25a785dbf0").unwrap();
        assert_eq!(
            create_address(sender, 0).to_hex(),
            "0xcd234a471b72ba2f1ccf0a70fcaba648a5eecd8d"
        );
        assert_eq!(
            create_address(sender, 1).to_hex(),
            "0x343c43a37d37dff08ae8c4a11544c718abb4fcf8"
        );
    }

    #[test]
    fn create_address_differs_by_nonce() {
        let sender = Address::from_bytes([0x11; 20]);
        assert_ne!(create_address(sender, 3), create_address(sender, 4));
    }

    #[test]
    fn create2_address_known_vectors() {
        // Examples from the CREATE2 specification.
        let code_hash = keccak256(&[0x00]);

        assert_eq!(
            create2_address(Address::ZERO, H256::ZERO, code_hash).to_hex(),
            "0x4d1a2e2bb4f88f0250f26ffff098b0b30b26bf38"
        );

        let deployer = Address::from_hex("0xdeadbeef00000000000000000000000000000000").unwrap();
        assert_eq!(
            create2_address(deployer, H256::ZERO, code_hash).to_hex(),
            "0xb928f69bb1d91cd65274e3c79d8986362984fda3"
        );
    }

    #[test]
    fn create2_address_depends_on_salt() {
        let code_hash = keccak256(b"init");
        let a = create2_address(Address::ZERO, H256::ZERO, code_hash);
        let b = create2_address(Address::ZERO, H256::from_bytes([1u8; 32]), code_hash);
        assert_ne!(a, b);
    }
}
