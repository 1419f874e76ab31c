//! In-memory coordination cluster for tests.
//!
//! Models the ACL endpoints closely enough to observe duplicate bootstraps,
//! duplicate policies and duplicate tokens across repeated runs.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use warden_common::constants::backend_messages::LEGACY_MODE;
use warden_common::{
    AclInitError, AclPolicy, AclToken, PolicyListEntry, RootCredential, ServerAddress,
    TokenCreateRequest,
};

use super::{AclApi, ClientError, ClientFactory, RequestTimeout};

/// Observable state of the fake cluster
#[derive(Debug, Default)]
pub struct ClusterState {
    pub root_secret: Option<String>,
    pub policies: Vec<AclPolicy>,
    pub tokens: Vec<AclToken>,
    /// Agent token currently set on each server (keyed by host:port)
    pub agent_tokens: HashMap<String, String>,

    pub bootstrap_calls: usize,
    pub policy_creates: usize,
    pub policy_updates: usize,
    pub token_lists: usize,
    pub token_creates: Vec<String>,
    pub agent_pushes: Vec<String>,
    pub connects: Vec<(String, RequestTimeout)>,

    /// Errors returned by the next bootstrap calls, in order
    pub bootstrap_failures: VecDeque<ClientError>,
    /// Errors returned by the next token create calls, in order
    pub token_create_failures: VecDeque<ClientError>,
    /// Servers whose connections are refused
    pub refused: HashSet<String>,

    next_id: usize,
}

impl ClusterState {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}-{}", prefix, self.next_id)
    }
}

/// Shared handle to a fake cluster; also acts as its client factory
#[derive(Clone, Default)]
pub struct FakeCluster {
    state: Arc<Mutex<ClusterState>>,
}

impl FakeCluster {
    pub fn new() -> Self {
        Self::default()
    }

    /// A cluster that was bootstrapped out of band
    pub fn bootstrapped(root_secret: &str) -> Self {
        let cluster = Self::new();
        cluster.state().root_secret = Some(root_secret.to_string());
        cluster
    }

    pub fn state(&self) -> MutexGuard<'_, ClusterState> {
        self.state.lock().unwrap()
    }

    pub fn fail_bootstrap(&self, err: ClientError) {
        self.state().bootstrap_failures.push_back(err);
    }

    pub fn fail_token_create(&self, err: ClientError) {
        self.state().token_create_failures.push_back(err);
    }

    pub fn refuse(&self, address: &str) {
        self.state().refused.insert(address.to_string());
    }

    pub fn no_leader_error() -> ClientError {
        ClientError::Status {
            status: 500,
            body: LEGACY_MODE.to_string(),
        }
    }
}

impl ClientFactory for FakeCluster {
    fn connect(
        &self,
        server: &ServerAddress,
        token: Option<&RootCredential>,
        timeout: RequestTimeout,
    ) -> Result<Box<dyn AclApi>, AclInitError> {
        let address = server.socket_addr(8500).to_string();
        self.state().connects.push((address.clone(), timeout));
        Ok(Box::new(FakeClient {
            cluster: self.clone(),
            address,
            token: token.map(|t| t.expose().to_string()),
        }))
    }
}

struct FakeClient {
    cluster: FakeCluster,
    address: String,
    token: Option<String>,
}

impl FakeClient {
    /// Refusal and authorization checks shared by every call
    fn enter(&self, needs_auth: bool) -> Result<MutexGuard<'_, ClusterState>, ClientError> {
        let state = self.cluster.state();
        if state.refused.contains(&self.address) {
            return Err(ClientError::ConnectionRefused {
                address: self.address.clone(),
            });
        }
        if needs_auth && (state.root_secret.is_none() || state.root_secret != self.token) {
            return Err(ClientError::Status {
                status: 403,
                body: "ACL not found".to_string(),
            });
        }
        Ok(state)
    }
}

#[async_trait]
impl AclApi for FakeClient {
    fn address(&self) -> &str {
        &self.address
    }

    async fn bootstrap(&self) -> Result<AclToken, ClientError> {
        let mut state = self.enter(false)?;
        state.bootstrap_calls += 1;
        if let Some(err) = state.bootstrap_failures.pop_front() {
            return Err(err);
        }
        if state.root_secret.is_some() {
            return Err(ClientError::Status {
                status: 403,
                body: "Permission denied: ACL bootstrap no longer allowed".to_string(),
            });
        }
        let secret = state.next_id("root");
        state.root_secret = Some(secret.clone());
        Ok(AclToken {
            accessor_id: state.next_id("accessor"),
            secret_id: secret,
            description: "Bootstrap Token (Global Management)".to_string(),
            policies: vec![],
            create_time: None,
        })
    }

    async fn create_policy(&self, policy: &AclPolicy) -> Result<AclPolicy, ClientError> {
        let mut state = self.enter(true)?;
        if state.policies.iter().any(|p| p.name == policy.name) {
            return Err(ClientError::Status {
                status: 500,
                body: format!(
                    "Invalid Policy: A Policy with Name {:?} already exists",
                    policy.name
                ),
            });
        }
        state.policy_creates += 1;
        let mut created = policy.clone();
        created.id = state.next_id("policy");
        state.policies.push(created.clone());
        Ok(created)
    }

    async fn update_policy(&self, policy: &AclPolicy) -> Result<AclPolicy, ClientError> {
        let mut state = self.enter(true)?;
        state.policy_updates += 1;
        match state.policies.iter_mut().find(|p| p.id == policy.id) {
            Some(existing) => {
                *existing = policy.clone();
                Ok(policy.clone())
            }
            None => Err(ClientError::Status {
                status: 404,
                body: "Cannot find policy to update".to_string(),
            }),
        }
    }

    async fn list_policies(&self) -> Result<Vec<PolicyListEntry>, ClientError> {
        let state = self.enter(true)?;
        Ok(state
            .policies
            .iter()
            .map(|p| PolicyListEntry {
                id: p.id.clone(),
                name: p.name.clone(),
                description: p.description.clone(),
            })
            .collect())
    }

    async fn list_tokens(&self) -> Result<Vec<AclToken>, ClientError> {
        let mut state = self.enter(true)?;
        state.token_lists += 1;
        Ok(state.tokens.clone())
    }

    async fn create_token(&self, request: &TokenCreateRequest) -> Result<AclToken, ClientError> {
        let mut state = self.enter(true)?;
        if let Some(err) = state.token_create_failures.pop_front() {
            return Err(err);
        }
        let token = AclToken {
            accessor_id: state.next_id("accessor"),
            secret_id: state.next_id("secret"),
            description: request.description.clone(),
            policies: request.policies.clone(),
            create_time: None,
        };
        state.token_creates.push(self.address.clone());
        state.tokens.push(token.clone());
        Ok(token)
    }

    async fn update_agent_token(&self, secret: &str) -> Result<(), ClientError> {
        let mut state = self.enter(true)?;
        state.agent_pushes.push(self.address.clone());
        state
            .agent_tokens
            .insert(self.address.clone(), secret.to_string());
        Ok(())
    }
}
