//! HTTP implementation of the ACL API on top of reqwest.

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::net::SocketAddr;
use std::time::Duration;

use warden_common::constants::{api_paths, headers::X_CONSUL_TOKEN};
use warden_common::{
    AclInitError, AclPolicy, AclToken, AgentTokenRequest, PolicyListEntry, RootCredential,
    ServerAddress, TokenCreateRequest,
};

use super::{AclApi, ClientError, ClientFactory, RequestTimeout};

/// Builds one [`HttpAclClient`] per target server
#[derive(Debug, Clone)]
pub struct HttpClientFactory {
    /// URL scheme (http or https)
    scheme: String,
    /// HTTP API port shared by all servers
    port: u16,
    /// Timeout for regular API calls
    api_timeout: Duration,
    /// Timeout for the bootstrap call
    bootstrap_timeout: Duration,
}

impl HttpClientFactory {
    pub fn new(
        scheme: impl Into<String>,
        port: u16,
        api_timeout: Duration,
        bootstrap_timeout: Duration,
    ) -> Self {
        Self {
            scheme: scheme.into(),
            port,
            api_timeout,
            bootstrap_timeout,
        }
    }
}

impl ClientFactory for HttpClientFactory {
    fn connect(
        &self,
        server: &ServerAddress,
        token: Option<&RootCredential>,
        timeout: RequestTimeout,
    ) -> Result<Box<dyn AclApi>, AclInitError> {
        let timeout = match timeout {
            RequestTimeout::Api => self.api_timeout,
            RequestTimeout::Bootstrap => self.bootstrap_timeout,
        };
        let client = HttpAclClient::new(&self.scheme, server.socket_addr(self.port), token, timeout)?;
        Ok(Box::new(client))
    }
}

/// ACL API client bound to a single server
pub struct HttpAclClient {
    http: reqwest::Client,
    base_url: String,
    address: String,
    token: Option<String>,
}

impl HttpAclClient {
    pub fn new(
        scheme: &str,
        address: SocketAddr,
        token: Option<&RootCredential>,
        timeout: Duration,
    ) -> Result<Self, AclInitError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                AclInitError::Client(format!("creating client for address {}: {}", address, e))
            })?;

        Ok(Self {
            http,
            base_url: format!("{}://{}", scheme, address),
            address: address.to_string(),
            token: token.map(|t| t.expose().to_string()),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, format!("{}{}", self.base_url, path));
        match &self.token {
            Some(token) => builder.header(X_CONSUL_TOKEN, token),
            None => builder,
        }
    }

    async fn execute(&self, request: RequestBuilder) -> Result<Response, ClientError> {
        let response = request
            .send()
            .await
            .map_err(|e| map_transport_error(&self.address, e))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(ClientError::Status {
            status: status.as_u16(),
            body: body.trim().to_string(),
        })
    }

    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        self.execute(request)
            .await?
            .json::<T>()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))
    }
}

#[async_trait]
impl AclApi for HttpAclClient {
    fn address(&self) -> &str {
        &self.address
    }

    async fn bootstrap(&self) -> Result<AclToken, ClientError> {
        self.fetch(self.request(Method::PUT, api_paths::ACL_BOOTSTRAP))
            .await
    }

    async fn create_policy(&self, policy: &AclPolicy) -> Result<AclPolicy, ClientError> {
        self.fetch(self.request(Method::PUT, api_paths::ACL_POLICY).json(policy))
            .await
    }

    async fn update_policy(&self, policy: &AclPolicy) -> Result<AclPolicy, ClientError> {
        let path = format!("{}/{}", api_paths::ACL_POLICY, policy.id);
        self.fetch(self.request(Method::PUT, &path).json(policy))
            .await
    }

    async fn list_policies(&self) -> Result<Vec<PolicyListEntry>, ClientError> {
        self.fetch(self.request(Method::GET, api_paths::ACL_POLICIES))
            .await
    }

    async fn list_tokens(&self) -> Result<Vec<AclToken>, ClientError> {
        self.fetch(self.request(Method::GET, api_paths::ACL_TOKENS))
            .await
    }

    async fn create_token(&self, request: &TokenCreateRequest) -> Result<AclToken, ClientError> {
        self.fetch(self.request(Method::PUT, api_paths::ACL_TOKEN).json(request))
            .await
    }

    async fn update_agent_token(&self, secret: &str) -> Result<(), ClientError> {
        let body = AgentTokenRequest {
            token: secret.to_string(),
        };
        self.execute(self.request(Method::PUT, api_paths::AGENT_TOKEN).json(&body))
            .await?;
        Ok(())
    }
}

fn map_transport_error(address: &str, err: reqwest::Error) -> ClientError {
    if err.is_timeout() {
        return ClientError::Timeout {
            address: address.to_string(),
        };
    }
    if err.is_connect() && is_connection_refused(&err) {
        return ClientError::ConnectionRefused {
            address: address.to_string(),
        };
    }
    ClientError::Transport(error_chain(&err))
}

/// Walks the source chain looking for an actively refused connection
fn is_connection_refused(err: &(dyn std::error::Error + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(io) = e.downcast_ref::<std::io::Error>() {
            if io.kind() == std::io::ErrorKind::ConnectionRefused {
                return true;
            }
        }
        if e.to_string().to_lowercase().contains("connection refused") {
            return true;
        }
        current = e.source();
    }
    false
}

fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut current = err.source();
    while let Some(e) = current {
        message.push_str(": ");
        message.push_str(&e.to_string());
        current = e.source();
    }
    message
}
