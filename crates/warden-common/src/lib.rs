//! # Warden Common
//!
//! Shared types, error taxonomy, and constants used across Warden components.
//!
//! ## Modules
//! - `types` - ACL data structures (ServerAddress, RootCredential, AclToken, etc.)
//! - `error` - Terminal error taxonomy for the bootstrap job
//! - `constants` - Shared configuration constants and wire strings

pub mod constants;
pub mod error;
pub mod types;

pub use error::AclInitError;
pub use types::*;
