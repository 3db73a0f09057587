//! PBKDF2 password hashes for protected share links.
//!
//! Stored form: `pbkdf2-sha256$<iterations>$<salt>$<hash>` with base64url parts.

use std::num::NonZeroU32;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use ring::digest::SHA256_OUTPUT_LEN;
use ring::pbkdf2;
use ring::rand::{SecureRandom, SystemRandom};

use super::ShareError;

const SCHEME: &str = "pbkdf2-sha256";
const ITERATIONS: u32 = 100_000;
const SALT_LEN: usize = 16;

pub fn hash_password(rng: &SystemRandom, password: &str) -> Result<String, ShareError> {
    let iterations = NonZeroU32::new(ITERATIONS).ok_or(ShareError::InvalidHash)?;

    let mut salt = [0u8; SALT_LEN];
    rng.fill(&mut salt).map_err(|_| ShareError::Rng)?;

    let mut hash = [0u8; SHA256_OUTPUT_LEN];
    pbkdf2::derive(
        pbkdf2::PBKDF2_HMAC_SHA256,
        iterations,
        &salt,
        password.as_bytes(),
        &mut hash,
    );

    Ok(format!(
        "{SCHEME}${ITERATIONS}${}${}",
        URL_SAFE_NO_PAD.encode(salt),
        URL_SAFE_NO_PAD.encode(hash)
    ))
}

/// Check `password` against a hash produced by [`hash_password`].
pub fn verify_password(password: &str, stored: &str) -> Result<bool, ShareError> {
    let parts: Vec<&str> = stored.split('$').collect();
    let [scheme, iterations, salt, hash] = parts.as_slice() else {
        return Err(ShareError::InvalidHash);
    };
    if *scheme != SCHEME {
        return Err(ShareError::InvalidHash);
    }

    let iterations = iterations
        .parse::<u32>()
        .ok()
        .and_then(NonZeroU32::new)
        .ok_or(ShareError::InvalidHash)?;
    let salt = URL_SAFE_NO_PAD
        .decode(salt)
        .map_err(|_| ShareError::InvalidHash)?;
    let hash = URL_SAFE_NO_PAD
        .decode(hash)
        .map_err(|_| ShareError::InvalidHash)?;

    Ok(pbkdf2::verify(
        pbkdf2::PBKDF2_HMAC_SHA256,
        iterations,
        &salt,
        password.as_bytes(),
        &hash,
    )
    .is_ok())
}
