//! ACL bootstrap and server token provisioning.
//!
//! Order of a run:
//! 1. `bootstrap` - mint (or reuse) the root token and persist it
//! 2. `policy` - upsert the agent policy
//! 3. `server_tokens` - give every server its own agent token
//!
//! Every step after the bootstrap call is safe to repeat: a restarted run only
//! looks at cluster state to find out what is already done.

mod bootstrap;
mod policy;
mod server_tokens;

use std::sync::Arc;

use warden_common::{AclInitError, RootCredential, ServerAddress};

use crate::consul::ClientFactory;
use crate::retry::{Attempt, RetryDriver};
use crate::store::CredentialStore;

pub use bootstrap::bootstrap;
pub use policy::{PolicySettings, ensure_agent_policy};
pub use server_tokens::provision;

/// Settings of one provisioning run
#[derive(Debug, Clone)]
pub struct ProvisionSettings {
    /// Store key holding the bootstrap token
    pub bootstrap_token_key: String,
    /// Create and push per-server tokens after bootstrapping
    pub set_server_tokens: bool,
    /// Agent policy settings
    pub policy: PolicySettings,
}

/// The bootstrap-and-provision job with its collaborators
pub struct AclBootstrap {
    clients: Arc<dyn ClientFactory>,
    store: Arc<dyn CredentialStore>,
    retry: RetryDriver,
    settings: ProvisionSettings,
}

impl AclBootstrap {
    pub fn new(
        clients: Arc<dyn ClientFactory>,
        store: Arc<dyn CredentialStore>,
        retry: RetryDriver,
        settings: ProvisionSettings,
    ) -> Self {
        Self {
            clients,
            store,
            retry,
            settings,
        }
    }

    /// Reads the bootstrap token persisted by an earlier run, if any
    pub async fn load_stored_credential(&self) -> Result<Option<RootCredential>, AclInitError> {
        let store = self.store.as_ref();
        let key = self.settings.bootstrap_token_key.as_str();
        let operation = format!("reading bootstrap token from store key {:?}", key);

        let stored = self
            .retry
            .until_succeeds(&operation, move || async move {
                Attempt::retry_on_err(store.get(key).await)
            })
            .await?;

        Ok(stored
            .map(RootCredential::new)
            .filter(|root| !root.is_empty()))
    }

    /// Runs the whole protocol against `servers`.
    ///
    /// `stored` is the root token from an earlier run; when present, bootstrap
    /// is skipped. Returns the effective root token.
    pub async fn run(
        &self,
        servers: &[ServerAddress],
        stored: Option<RootCredential>,
    ) -> Result<RootCredential, AclInitError> {
        let Some(first) = servers.first() else {
            return Err(AclInitError::Discovery(
                "no server addresses to provision".to_string(),
            ));
        };

        let root = bootstrap(
            self.clients.as_ref(),
            self.store.as_ref(),
            &self.retry,
            servers,
            stored,
            &self.settings.bootstrap_token_key,
        )
        .await?;

        if !self.settings.set_server_tokens {
            tracing::info!("Server token provisioning disabled, skipping");
            return Ok(root);
        }

        tracing::info!(servers = servers.len(), "Setting server tokens");
        let policy = ensure_agent_policy(
            self.clients.as_ref(),
            &self.retry,
            first,
            &root,
            &self.settings.policy,
        )
        .await?;
        provision(self.clients.as_ref(), &self.retry, servers, &root, &policy).await?;

        Ok(root)
    }

    /// Loads any stored token, then runs the protocol
    pub async fn run_from_store(
        &self,
        servers: &[ServerAddress],
    ) -> Result<RootCredential, AclInitError> {
        let stored = self.load_stored_credential().await?;
        self.run(servers, stored).await
    }
}
