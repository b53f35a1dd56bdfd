//! Identity key handling needed to hand keys to the RTC engine.

use crate::error::CallError;

/// Type prefix of a serialized Curve25519 public key.
pub const DJB_TYPE: u8 = 0x05;

const SERIALIZED_KEY_LEN: usize = 33;

/// Strips the type prefix from a serialized public key, yielding the raw 32 key bytes.
pub fn public_key_bytes(serialized: &[u8]) -> Result<Vec<u8>, CallError> {
    match serialized.split_first() {
        Some((&DJB_TYPE, key)) if serialized.len() == SERIALIZED_KEY_LEN => Ok(key.to_vec()),
        Some((&key_type, _)) if key_type != DJB_TYPE => Err(CallError::InvalidIdentityKey(
            format!("unsupported key type {key_type:#04x}"),
        )),
        _ => Err(CallError::InvalidIdentityKey(format!(
            "expected {SERIALIZED_KEY_LEN} bytes, got {}",
            serialized.len()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_type_prefix() {
        let mut serialized = vec![DJB_TYPE];
        serialized.extend_from_slice(&[7u8; 32]);

        assert_eq!(public_key_bytes(&serialized).unwrap(), vec![7u8; 32]);
    }

    #[test]
    fn test_rejects_wrong_type_and_length() {
        let mut wrong_type = vec![0x06];
        wrong_type.extend_from_slice(&[7u8; 32]);
        assert!(public_key_bytes(&wrong_type).is_err());

        assert!(public_key_bytes(&[DJB_TYPE, 1, 2, 3]).is_err());
        assert!(public_key_bytes(&[]).is_err());
    }
}
