//! Agent policy upsert.

use warden_common::{AclInitError, AclPolicy, PolicyLink, RootCredential, ServerAddress};

use crate::consul::{AclApi, ClientFactory, RequestTimeout};
use crate::retry::{Attempt, RetryDriver, is_policy_exists};
use crate::rules::{RuleOptions, render_agent_rules};

/// Name, description and rule inputs of the agent policy
#[derive(Debug, Clone)]
pub struct PolicySettings {
    pub name: String,
    pub description: String,
    pub rules: RuleOptions,
}

/// Renders the agent rules and upserts the agent policy via `server`
pub async fn ensure_agent_policy(
    clients: &dyn ClientFactory,
    retry: &RetryDriver,
    server: &ServerAddress,
    root: &RootCredential,
    settings: &PolicySettings,
) -> Result<PolicyLink, AclInitError> {
    let rules = render_agent_rules(&settings.rules).inspect_err(|e| {
        tracing::error!(error = %e, "Error templating server agent rules");
    })?;

    let client = clients.connect(server, Some(root), RequestTimeout::Api)?;
    let policy = AclPolicy::new(settings.name.clone(), settings.description.clone(), rules);
    ensure_policy(client.as_ref(), retry, &policy).await
}

/// Creates `policy`, or updates the existing policy with the same name
pub async fn ensure_policy(
    client: &dyn AclApi,
    retry: &RetryDriver,
    policy: &AclPolicy,
) -> Result<PolicyLink, AclInitError> {
    let operation = format!("creating policy {:?} - PUT /v1/acl/policy", policy.name);
    retry
        .until_succeeds(&operation, move || create_or_update(client, policy))
        .await?;
    Ok(policy.link())
}

async fn create_or_update(client: &dyn AclApi, policy: &AclPolicy) -> Attempt<()> {
    let err = match client.create_policy(policy).await {
        Ok(_) => return Attempt::Success(()),
        Err(err) => err,
    };
    if !is_policy_exists(&err, &policy.name) {
        return Attempt::Retry(err.into());
    }

    tracing::info!(policy = %policy.name, "Policy already exists, updating");

    // Updates are addressed by ID, which only the list endpoint reveals
    let existing = match client.list_policies().await {
        Ok(existing) => existing,
        Err(err) => return Attempt::Retry(err.into()),
    };
    let Some(found) = existing
        .into_iter()
        .find(|p| p.name == policy.name && p.description == policy.description)
    else {
        return Attempt::Fatal(AclInitError::PolicyConflict {
            name: policy.name.clone(),
            description: policy.description.clone(),
        });
    };

    let update = AclPolicy {
        id: found.id,
        ..policy.clone()
    };
    Attempt::retry_on_err(client.update_policy(&update).await.map(|_| ()))
}
