//! Share-link lifecycle: status resolution, token minting and password hashing.

pub mod password;
pub mod status;
pub mod token;

pub use password::{hash_password, verify_password};
pub use status::{resolve_status, ShareStatus};
pub use token::generate_token;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShareError {
    #[error("Secure random number generator failed")]
    Rng,
    #[error("Stored password hash is malformed")]
    InvalidHash,
}
