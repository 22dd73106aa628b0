//! Password hashing.

pub mod hasher;

pub use hasher::{HashedPassword, PasswordHasher};
