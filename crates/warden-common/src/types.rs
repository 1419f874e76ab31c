//! Core ACL types shared across Warden components.
//!
//! Wire-facing structs use the coordination API's PascalCase field names.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use crate::constants::SERVER_TOKEN_DESCRIPTION_PREFIX;

/// Network address of one coordination server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServerAddress(IpAddr);

impl ServerAddress {
    pub fn new(ip: IpAddr) -> Self {
        Self(ip)
    }

    pub fn ip(&self) -> IpAddr {
        self.0
    }

    /// Socket address of this server's HTTP API
    pub fn socket_addr(&self, port: u16) -> SocketAddr {
        SocketAddr::new(self.0, port)
    }
}

impl fmt::Display for ServerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<IpAddr> for ServerAddress {
    fn from(ip: IpAddr) -> Self {
        Self(ip)
    }
}

impl FromStr for ServerAddress {
    type Err = std::net::AddrParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

/// Description that identifies the agent token of one server.
///
/// The backend offers no caller-assigned key, so this string is the lookup key
/// for reusing a token across runs. Changing its format orphans every token
/// minted by earlier runs.
pub fn server_token_description(server: &ServerAddress) -> String {
    format!("{}{}", SERVER_TOKEN_DESCRIPTION_PREFIX, server.ip())
}

/// The cluster root ("bootstrap") token
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RootCredential(String);

impl RootCredential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Returns the raw secret
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for RootCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RootCredential(<redacted>)")
    }
}

/// ACL policy as sent to and returned by the coordination API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclPolicy {
    /// Server-assigned ID (empty until created)
    #[serde(rename = "ID", default, skip_serializing_if = "String::is_empty")]
    pub id: String,

    #[serde(rename = "Name")]
    pub name: String,

    #[serde(rename = "Description", default)]
    pub description: String,

    /// Opaque, already rendered rule body
    #[serde(rename = "Rules", default)]
    pub rules: String,
}

impl AclPolicy {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        rules: impl Into<String>,
    ) -> Self {
        Self {
            id: String::new(),
            name: name.into(),
            description: description.into(),
            rules: rules.into(),
        }
    }

    /// Link to this policy, by name
    pub fn link(&self) -> PolicyLink {
        PolicyLink::named(self.name.clone())
    }
}

/// Entry of the policy list endpoint (rules are not included)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyListEntry {
    #[serde(rename = "ID")]
    pub id: String,

    #[serde(rename = "Name")]
    pub name: String,

    #[serde(rename = "Description", default)]
    pub description: String,
}

/// Reference from a token to a policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyLink {
    #[serde(rename = "ID", default, skip_serializing_if = "String::is_empty")]
    pub id: String,

    #[serde(rename = "Name", default)]
    pub name: String,
}

impl PolicyLink {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            name: name.into(),
        }
    }
}

/// ACL token as returned by the coordination API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclToken {
    #[serde(rename = "AccessorID", default)]
    pub accessor_id: String,

    #[serde(rename = "SecretID", default)]
    pub secret_id: String,

    #[serde(rename = "Description", default)]
    pub description: String,

    #[serde(rename = "Policies", default, deserialize_with = "null_as_empty")]
    pub policies: Vec<PolicyLink>,

    #[serde(rename = "CreateTime", default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<DateTime<Utc>>,
}

impl AclToken {
    /// True if the token links exactly one policy, named `policy_name`
    pub fn links_only(&self, policy_name: &str) -> bool {
        matches!(self.policies.as_slice(), [only] if only.name == policy_name)
    }
}

/// Body of a token create request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenCreateRequest {
    #[serde(rename = "Description")]
    pub description: String,

    #[serde(rename = "Policies")]
    pub policies: Vec<PolicyLink>,
}

/// Body of the agent token update request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentTokenRequest {
    #[serde(rename = "Token")]
    pub token: String,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
