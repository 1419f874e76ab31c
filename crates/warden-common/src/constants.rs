//! Shared constants for Warden components.

/// Default Redis connection URL
pub const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";

/// Default HTTP API port of a coordination server
pub const DEFAULT_HTTP_PORT: u16 = 8500;

/// Default URL scheme for the coordination API
pub const DEFAULT_SCHEME: &str = "http";

/// Default per-request API timeout (seconds)
pub const DEFAULT_API_TIMEOUT_SECS: u64 = 5;

/// Timeout for the bootstrap call (5 minutes).
///
/// The bootstrap request can take several seconds to commit. Timing out on the
/// client while the server commits loses the root token for good.
pub const BOOTSTRAP_TIMEOUT_SECS: u64 = 300;

/// Default pause between retry attempts (milliseconds)
pub const DEFAULT_RETRY_INTERVAL_MS: u64 = 1000;

/// Default store key for the persisted bootstrap token
pub const DEFAULT_BOOTSTRAP_TOKEN_KEY: &str = "warden:acl:bootstrap-token";

/// Name of the policy every server agent token is bound to
pub const AGENT_POLICY_NAME: &str = "agent-token";

/// Description of the agent policy
pub const AGENT_POLICY_DESCRIPTION: &str = "Agent Token Policy";

/// Prefix of the description that keys a server's agent token
pub const SERVER_TOKEN_DESCRIPTION_PREFIX: &str = "Server Token for ";

/// Coordination API paths
pub mod api_paths {
    /// PUT: one-shot ACL bootstrap
    pub const ACL_BOOTSTRAP: &str = "/v1/acl/bootstrap";

    /// PUT: create policy; PUT /v1/acl/policy/{id}: update policy
    pub const ACL_POLICY: &str = "/v1/acl/policy";

    /// GET: list policies
    pub const ACL_POLICIES: &str = "/v1/acl/policies";

    /// PUT: create token
    pub const ACL_TOKEN: &str = "/v1/acl/token";

    /// GET: list tokens
    pub const ACL_TOKENS: &str = "/v1/acl/tokens";

    /// PUT: set the agent's own ACL token
    pub const AGENT_TOKEN: &str = "/v1/agent/token/agent";
}

/// HTTP header names
pub mod headers {
    /// ACL token header
    pub const X_CONSUL_TOKEN: &str = "X-Consul-Token";
}

/// Backend error messages the classifier keys on
pub mod backend_messages {
    /// Returned with a 500 while no leader has been elected yet
    pub const LEGACY_MODE: &str = "The ACL system is currently in legacy mode.";

    /// Returned with a 500 when creating a policy whose name is taken
    pub const POLICY_EXISTS_PREFIX: &str = "Invalid Policy: A Policy with Name";
}
