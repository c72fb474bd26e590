//! Record id generation

use rand::rngs::OsRng;
use rand::RngCore;

const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const ID_LENGTH: usize = 12;

/// Generates a 12-character random id over `[a-zA-Z0-9]`.
///
/// Panics if the OS random source fails; there is no sane fallback for id
/// generation.
pub fn generate_id() -> String {
    let mut bytes = [0u8; ID_LENGTH];
    OsRng.fill_bytes(&mut bytes);
    bytes
        .iter()
        .map(|b| CHARSET[*b as usize % CHARSET.len()] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_shape() {
        let id = generate_id();
        assert_eq!(id.len(), 12);
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_ids_are_unique_in_practice() {
        let a = generate_id();
        let b = generate_id();
        assert_ne!(a, b);
    }
}
