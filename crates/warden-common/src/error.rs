//! Terminal error taxonomy for the ACL bootstrap job.
//!
//! Transient failures never show up here: they stay inside the retry loop
//! and only surface as log events.

use thiserror::Error;

/// Errors that end an ACL bootstrap run
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AclInitError {
    /// The cluster is already bootstrapped and no stored root token exists
    #[error(
        "ACLs already bootstrapped but the bootstrap token was not persisted. \
         We can't proceed because the bootstrap token is lost. You must reset ACLs."
    )]
    RootCredentialLost,

    /// Connection actively refused by the bootstrap target
    #[error("Cannot reach server at {address} (connection refused), restarting")]
    Unreachable { address: String },

    /// Deterministic input failure (e.g. rule rendering)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A policy with the reserved name exists with a foreign description
    #[error(
        "policy found with name {name:?} but not with expected description {description:?}; \
         if this policy was created manually it must be renamed because this name is reserved"
    )]
    PolicyConflict { name: String, description: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Server address discovery error
    #[error("Discovery error: {0}")]
    Discovery(String),

    /// Coordination API client construction error
    #[error("Client error: {0}")]
    Client(String),

    /// Durable store error
    #[error("Store error: {0}")]
    Store(String),
}

impl AclInitError {
    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::RootCredentialLost => 3,
            Self::Unreachable { .. } => 2,
            _ => 1,
        }
    }

    /// Returns true if the cluster needs manual out-of-band remediation
    pub fn requires_manual_reset(&self) -> bool {
        matches!(self, Self::RootCredentialLost)
    }

    /// Returns true if re-invoking the whole job can succeed
    pub fn is_rerunnable(&self) -> bool {
        !self.requires_manual_reset()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_credential_lost_is_final() {
        let err = AclInitError::RootCredentialLost;
        assert!(err.requires_manual_reset());
        assert!(!err.is_rerunnable());
        assert_eq!(err.exit_code(), 3);
        assert!(err.to_string().contains("You must reset ACLs"));
    }

    #[test]
    fn test_unreachable_is_rerunnable() {
        let err = AclInitError::Unreachable {
            address: "10.0.0.1:8500".to_string(),
        };
        assert!(err.is_rerunnable());
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("10.0.0.1:8500"));
    }
}
