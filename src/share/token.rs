use base64::Engine;
use ring::rand::{SecureRandom, SystemRandom};

use super::ShareError;

/// Random bytes behind every share token.
pub const TOKEN_BYTES: usize = 32;

/// Mint an unguessable, URL-safe share token.
pub fn generate_token(rng: &SystemRandom) -> Result<String, ShareError> {
    let mut bytes = [0u8; TOKEN_BYTES];
    rng.fill(&mut bytes).map_err(|_| ShareError::Rng)?;
    Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_are_url_safe_and_distinct() {
        let rng = SystemRandom::new();
        let a = generate_token(&rng).unwrap();
        let b = generate_token(&rng).unwrap();

        assert_ne!(a, b);
        // 32 bytes -> 43 base64 characters without padding
        assert_eq!(a.len(), 43);
        assert!(a
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }
}
