//! Classification of failed coordination API calls.

use warden_common::AclInitError;
use warden_common::constants::backend_messages::{LEGACY_MODE, POLICY_EXISTS_PREFIX};

use super::Attempt;
use crate::consul::ClientError;

/// What the retry loop should do with a failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Transient, try again
    Retryable,
    /// Transient, try again and annotate the logged error
    RetryableWithContext(String),
    /// Permanent, stop the run
    Fatal(AclInitError),
}

impl Classification {
    /// Turns the classified error into a retry-loop outcome
    pub fn into_attempt<T>(self, err: ClientError) -> Attempt<T> {
        match self {
            Self::Retryable => Attempt::Retry(err.into()),
            Self::RetryableWithContext(context) => {
                Attempt::Retry(anyhow::Error::new(err).context(context))
            }
            Self::Fatal(fatal) => Attempt::Fatal(fatal),
        }
    }
}

/// Classifies a failed bootstrap call.
///
/// Only called when no stored root token exists, so a 403 ("already
/// bootstrapped") means the root token is gone for good.
pub fn classify_bootstrap(err: &ClientError) -> Classification {
    if err.status() == Some(403) {
        return Classification::Fatal(AclInitError::RootCredentialLost);
    }

    if let ClientError::ConnectionRefused { address } = err {
        return Classification::Fatal(AclInitError::Unreachable {
            address: address.clone(),
        });
    }

    if is_no_leader(err) {
        return Classification::RetryableWithContext("no leader elected".to_string());
    }

    Classification::Retryable
}

/// True if the call failed because no leader has been elected yet
pub fn is_no_leader(err: &ClientError) -> bool {
    err.status() == Some(500) && err.body().is_some_and(|body| body.contains(LEGACY_MODE))
}

/// True if a policy create failed because `policy_name` is already taken
pub fn is_policy_exists(err: &ClientError, policy_name: &str) -> bool {
    let needle = format!("{} {:?} already exists", POLICY_EXISTS_PREFIX, policy_name);
    err.status() == Some(500) && err.body().is_some_and(|body| body.contains(&needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(status: u16, body: &str) -> ClientError {
        ClientError::Status {
            status,
            body: body.to_string(),
        }
    }

    #[test]
    fn test_forbidden_means_token_lost() {
        let err = status(403, "Permission denied: ACL bootstrap no longer allowed");
        assert_eq!(
            classify_bootstrap(&err),
            Classification::Fatal(AclInitError::RootCredentialLost)
        );
    }

    #[test]
    fn test_refused_is_unreachable() {
        let err = ClientError::ConnectionRefused {
            address: "10.0.0.1:8500".to_string(),
        };
        assert_eq!(
            classify_bootstrap(&err),
            Classification::Fatal(AclInitError::Unreachable {
                address: "10.0.0.1:8500".to_string()
            })
        );
    }

    #[test]
    fn test_no_leader_is_retried_with_context() {
        let err = status(500, LEGACY_MODE);
        assert!(is_no_leader(&err));
        assert_eq!(
            classify_bootstrap(&err),
            Classification::RetryableWithContext("no leader elected".to_string())
        );

        let attempt: Attempt<()> = classify_bootstrap(&err).into_attempt(err);
        match attempt {
            Attempt::Retry(e) => {
                let message = format!("{:#}", e);
                assert!(message.starts_with("no leader elected: Unexpected response code: 500"));
            }
            other => panic!("expected retry, got {:?}", other),
        }
    }

    #[test]
    fn test_other_failures_are_retryable() {
        assert_eq!(
            classify_bootstrap(&status(500, "rpc error: EOF")),
            Classification::Retryable
        );
        assert_eq!(
            classify_bootstrap(&ClientError::Timeout {
                address: "10.0.0.1:8500".to_string()
            }),
            Classification::Retryable
        );
        assert!(!is_no_leader(&status(503, LEGACY_MODE)));
    }

    #[test]
    fn test_policy_exists_matches_name() {
        let err = status(
            500,
            "Invalid Policy: A Policy with Name \"agent-token\" already exists",
        );
        assert!(is_policy_exists(&err, "agent-token"));
        assert!(!is_policy_exists(&err, "other-policy"));
        assert!(!is_policy_exists(&status(403, "ACL not found"), "agent-token"));
    }
}
