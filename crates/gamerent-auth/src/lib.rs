//! # gamerent-auth
//!
//! Credential and session primitives for GameRent.
//!
//! ## Modules
//!
//! - `password` — configurable Argon2id hashing with constant-time comparison
//! - `jwt` — HS256 token claims, signing, and verification
//! - `revocation` — set of tokens revoked by explicit logout
//! - `token` — [`SessionTokenManager`] tying signing, validation and revocation together

pub mod jwt;
pub mod password;
pub mod revocation;
pub mod token;

pub use jwt::{Claims, JwtDecoder, JwtEncoder};
pub use password::{HashedPassword, PasswordHasher};
pub use revocation::RevocationSet;
pub use token::{IssuedToken, SessionTokenManager};
