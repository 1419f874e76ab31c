//! Per-server agent token provisioning.
//!
//! Each server gets one token bound only to the agent policy. Tokens are found
//! again on later runs by their description, so a re-run reuses them instead
//! of minting duplicates. The push to the server always happens, which heals a
//! run that crashed between creating a token and handing it out.

use warden_common::{
    AclInitError, AclToken, PolicyLink, RootCredential, ServerAddress, TokenCreateRequest,
    server_token_description,
};

use crate::consul::{ClientFactory, RequestTimeout};
use crate::retry::{Attempt, RetryDriver};

/// Ensures every server holds an agent token bound to `policy`
pub async fn provision(
    clients: &dyn ClientFactory,
    retry: &RetryDriver,
    servers: &[ServerAddress],
    root: &RootCredential,
    policy: &PolicyLink,
) -> Result<(), AclInitError> {
    let Some(first) = servers.first() else {
        return Ok(());
    };

    // Listed once up front; only used to spot tokens from earlier runs
    let lister = clients.connect(first, Some(root), RequestTimeout::Api)?;
    let lister = lister.as_ref();
    let existing = retry
        .until_succeeds("listing ACL tokens - GET /v1/acl/tokens", move || async move {
            Attempt::retry_on_err(lister.list_tokens().await)
        })
        .await?;

    for server in servers {
        // Agent tokens are set per node, so talk to this exact server
        let client = clients.connect(server, Some(root), RequestTimeout::Api)?;
        let client = client.as_ref();
        let description = server_token_description(server);

        let secret = match find_server_token(&existing, &policy.name, &description) {
            Some(token) => {
                tracing::info!(
                    server = %server,
                    accessor = %token.accessor_id,
                    created = ?token.create_time,
                    "Reusing existing server token"
                );
                token.secret_id.clone()
            }
            None => {
                let request = TokenCreateRequest {
                    description: description.clone(),
                    policies: vec![policy.clone()],
                };
                let request = &request;
                let operation = format!("creating server token for {} - PUT /v1/acl/token", server);
                let token = retry
                    .until_succeeds(&operation, move || async move {
                        Attempt::retry_on_err(client.create_token(request).await)
                    })
                    .await?;
                token.secret_id
            }
        };

        let secret = secret.as_str();
        let operation = format!(
            "updating server token for {} - PUT /v1/agent/token/agent",
            server
        );
        retry
            .until_succeeds(&operation, move || async move {
                Attempt::retry_on_err(client.update_agent_token(secret).await)
            })
            .await?;
    }

    Ok(())
}

/// Finds the token previously minted for a server: bound to exactly the agent
/// policy and carrying the server's description
pub fn find_server_token<'a>(
    tokens: &'a [AclToken],
    policy_name: &str,
    description: &str,
) -> Option<&'a AclToken> {
    tokens
        .iter()
        .find(|t| t.links_only(policy_name) && t.description == description)
}
