//! Typed repositories over the generic document store.

pub mod credential;
pub mod item;

pub use credential::{Credential, CredentialRepository};
pub use item::ItemRepository;
