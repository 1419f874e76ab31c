//! One-shot ACL bootstrap and durable persistence of the root token.

use warden_common::{AclInitError, RootCredential, ServerAddress};

use crate::consul::{ClientFactory, RequestTimeout};
use crate::retry::{Attempt, RetryDriver, classify_bootstrap};
use crate::store::CredentialStore;

/// Returns the cluster root token, bootstrapping ACLs if none was stored.
///
/// A non-empty `stored` token is trusted and returned unchanged without
/// touching the cluster. Otherwise the token is minted and written to `store`
/// under `key` before it is returned.
pub async fn bootstrap(
    clients: &dyn ClientFactory,
    store: &dyn CredentialStore,
    retry: &RetryDriver,
    servers: &[ServerAddress],
    stored: Option<RootCredential>,
    key: &str,
) -> Result<RootCredential, AclInitError> {
    if let Some(root) = stored.filter(|root| !root.is_empty()) {
        tracing::info!(key = %key, "ACLs already bootstrapped - using stored bootstrap token");
        return Ok(root);
    }

    tracing::info!("No stored bootstrap token found, continuing on to bootstrapping");
    let root = bootstrap_acls(clients, retry, servers).await?;
    persist_root(store, retry, key, &root).await?;
    Ok(root)
}

/// Calls the bootstrap endpoint, starting with the first server.
///
/// A refused connection means no request reached that server, so the next
/// address is tried. `Unreachable` is returned once every server refused.
async fn bootstrap_acls(
    clients: &dyn ClientFactory,
    retry: &RetryDriver,
    servers: &[ServerAddress],
) -> Result<RootCredential, AclInitError> {
    let mut last_refused = None;

    for server in servers {
        let client = clients.connect(server, None, RequestTimeout::Bootstrap)?;
        let client = client.as_ref();
        let operation = format!("bootstrapping ACLs via {} - PUT /v1/acl/bootstrap", client.address());

        let result = retry
            .until_succeeds(&operation, move || async move {
                match client.bootstrap().await {
                    Ok(token) => Attempt::Success(RootCredential::new(token.secret_id)),
                    Err(err) => classify_bootstrap(&err).into_attempt(err),
                }
            })
            .await;

        match result {
            Err(AclInitError::Unreachable { address }) => {
                tracing::warn!(address = %address, "Bootstrap target refused connection, trying next server");
                last_refused = Some(AclInitError::Unreachable { address });
            }
            other => return other,
        }
    }

    Err(last_refused.unwrap_or_else(|| {
        AclInitError::Discovery("no server addresses to bootstrap against".to_string())
    }))
}

/// Writes the root token to the durable store, retrying forever
async fn persist_root(
    store: &dyn CredentialStore,
    retry: &RetryDriver,
    key: &str,
    root: &RootCredential,
) -> Result<(), AclInitError> {
    let operation = format!("writing bootstrap token to store key {:?}", key);
    retry
        .until_succeeds(&operation, move || async move {
            Attempt::retry_on_err(store.put(key, root.expose()).await)
        })
        .await
}
