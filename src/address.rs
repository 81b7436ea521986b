//! Account address encoding
//!
//! Addresses are the base32 rendering of a 32-byte public key followed by a
//! 4-byte SHA-512/256 checksum, 58 characters total. The crate never creates
//! keys; it only decodes addresses into raw public-key bytes (needed as
//! application-call arguments) and re-encodes keys read from global state.

use sha2::{Digest, Sha512_256};

use crate::error::{LedgerError, Result};

const ALPHABET: &[u8; 32] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";
const PUBLIC_KEY_LEN: usize = 32;
const CHECKSUM_LEN: usize = 4;
pub const ADDRESS_LEN: usize = 58;

fn checksum(public_key: &[u8]) -> [u8; CHECKSUM_LEN] {
    let digest = Sha512_256::digest(public_key);
    let mut out = [0u8; CHECKSUM_LEN];
    out.copy_from_slice(&digest[digest.len() - CHECKSUM_LEN..]);
    out
}

fn base32_encode(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len() * 8 / 5 + 1);
    let mut buffer: u32 = 0;
    let mut bits = 0u32;
    for &byte in data {
        buffer = (buffer << 8) | u32::from(byte);
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            out.push(ALPHABET[((buffer >> bits) & 0x1f) as usize] as char);
        }
    }
    if bits > 0 {
        out.push(ALPHABET[((buffer << (5 - bits)) & 0x1f) as usize] as char);
    }
    out
}

fn base32_decode(input: &str) -> Option<Vec<u8>> {
    let mut out = Vec::with_capacity(input.len() * 5 / 8);
    let mut buffer: u32 = 0;
    let mut bits = 0u32;
    for ch in input.bytes() {
        let value = ALPHABET.iter().position(|&a| a == ch)? as u32;
        buffer = (buffer << 5) | value;
        bits += 5;
        if bits >= 8 {
            bits -= 8;
            out.push(((buffer >> bits) & 0xff) as u8);
        }
    }
    Some(out)
}

/// Decode an address into its raw 32-byte public key, verifying length,
/// alphabet, and checksum.
pub fn decode_address(address: &str) -> Result<[u8; PUBLIC_KEY_LEN]> {
    if address.len() != ADDRESS_LEN {
        return Err(LedgerError::Validation(format!(
            "invalid address length: expected {ADDRESS_LEN} characters, got {}",
            address.len()
        )));
    }

    let decoded = base32_decode(address)
        .ok_or_else(|| LedgerError::Validation("address contains non-base32 characters".to_string()))?;
    if decoded.len() < PUBLIC_KEY_LEN + CHECKSUM_LEN {
        return Err(LedgerError::Validation("address decodes to too few bytes".to_string()));
    }

    let mut public_key = [0u8; PUBLIC_KEY_LEN];
    public_key.copy_from_slice(&decoded[..PUBLIC_KEY_LEN]);
    let given = &decoded[PUBLIC_KEY_LEN..PUBLIC_KEY_LEN + CHECKSUM_LEN];

    if given != checksum(&public_key) {
        return Err(LedgerError::Validation("address checksum mismatch".to_string()));
    }

    Ok(public_key)
}

/// Encode a raw 32-byte public key into its address form.
pub fn encode_address(public_key: &[u8]) -> Result<String> {
    if public_key.len() != PUBLIC_KEY_LEN {
        return Err(LedgerError::Validation(format!(
            "invalid public key length: expected {PUBLIC_KEY_LEN} bytes, got {}",
            public_key.len()
        )));
    }

    let mut data = Vec::with_capacity(PUBLIC_KEY_LEN + CHECKSUM_LEN);
    data.extend_from_slice(public_key);
    data.extend_from_slice(&checksum(public_key));

    Ok(base32_encode(&data))
}

pub fn is_valid_address(address: &str) -> bool {
    decode_address(address).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let public_key = [7u8; PUBLIC_KEY_LEN];
        let address = encode_address(&public_key).unwrap();

        assert_eq!(address.len(), ADDRESS_LEN);
        assert_eq!(decode_address(&address).unwrap(), public_key);
    }

    #[test]
    fn test_zero_key_address() {
        // The all-zero key is the well-known ledger zero address
        let address = encode_address(&[0u8; PUBLIC_KEY_LEN]).unwrap();
        assert_eq!(
            address,
            "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAY5HFKQ"
        );
        assert!(is_valid_address(&address));
    }

    #[test]
    fn test_rejects_bad_length() {
        let err = decode_address("SHORT").unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[test]
    fn test_rejects_corrupted_checksum() {
        let address = encode_address(&[9u8; PUBLIC_KEY_LEN]).unwrap();
        let mut corrupted = address.into_bytes();
        // Flip the first character to a different alphabet member
        corrupted[0] = if corrupted[0] == b'A' { b'B' } else { b'A' };
        let corrupted = String::from_utf8(corrupted).unwrap();

        assert!(!is_valid_address(&corrupted));
    }

    #[test]
    fn test_rejects_invalid_alphabet() {
        // '1' and '0' are not in the base32 alphabet
        let bogus = "1".repeat(ADDRESS_LEN);
        assert!(!is_valid_address(&bogus));
    }
}
