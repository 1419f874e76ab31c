//! Coordination service (Consul-style) ACL API client.
//!
//! The provisioning steps only talk to the cluster through [`AclApi`], and only
//! obtain clients through [`ClientFactory`], so tests can swap in an in-memory
//! cluster.

mod error;
mod http;

#[cfg(test)]
pub mod fake;

use async_trait::async_trait;
use warden_common::{
    AclInitError, AclPolicy, AclToken, PolicyListEntry, RootCredential, ServerAddress,
    TokenCreateRequest,
};

pub use error::ClientError;
pub use http::HttpClientFactory;

/// ACL operations of one coordination server
#[async_trait]
pub trait AclApi: Send + Sync {
    /// Address this client talks to (host:port)
    fn address(&self) -> &str;

    /// PUT /v1/acl/bootstrap
    async fn bootstrap(&self) -> Result<AclToken, ClientError>;

    /// PUT /v1/acl/policy
    async fn create_policy(&self, policy: &AclPolicy) -> Result<AclPolicy, ClientError>;

    /// PUT /v1/acl/policy/{id}
    async fn update_policy(&self, policy: &AclPolicy) -> Result<AclPolicy, ClientError>;

    /// GET /v1/acl/policies
    async fn list_policies(&self) -> Result<Vec<PolicyListEntry>, ClientError>;

    /// GET /v1/acl/tokens
    async fn list_tokens(&self) -> Result<Vec<AclToken>, ClientError>;

    /// PUT /v1/acl/token
    async fn create_token(&self, request: &TokenCreateRequest) -> Result<AclToken, ClientError>;

    /// PUT /v1/agent/token/agent
    async fn update_agent_token(&self, secret: &str) -> Result<(), ClientError>;
}

/// Which per-request timeout a client should use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestTimeout {
    /// The regular API timeout
    Api,
    /// The extended timeout for the bootstrap call
    Bootstrap,
}

/// Builds clients bound to one specific server
pub trait ClientFactory: Send + Sync {
    fn connect(
        &self,
        server: &ServerAddress,
        token: Option<&RootCredential>,
        timeout: RequestTimeout,
    ) -> Result<Box<dyn AclApi>, AclInitError>;
}
