//! Job state and shared resources.

use anyhow::Result;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::consul::HttpClientFactory;
use crate::provision::AclBootstrap;
use crate::retry::RetryDriver;
use crate::store::RedisStore;

/// Everything one acl-init run needs, wired from configuration
pub struct JobState {
    /// Application configuration
    pub config: AppConfig,

    /// The bootstrap-and-provision job
    pub job: AclBootstrap,
}

impl JobState {
    /// Create job state, connecting to Redis
    pub async fn new(config: AppConfig) -> Result<Self> {
        // Connect to Redis with connection manager (handles reconnection)
        let store = RedisStore::connect(&config.redis_url).await?;

        let clients = HttpClientFactory::new(
            config.scheme.clone(),
            config.http_port,
            config.api_timeout(),
            config.bootstrap_timeout(),
        );
        let retry = RetryDriver::new(config.retry_interval());

        tracing::debug!(
            api_timeout = ?config.api_timeout(),
            bootstrap_timeout = ?config.bootstrap_timeout(),
            retry_interval = ?retry.interval(),
            "Coordination client configured"
        );

        let job = AclBootstrap::new(
            Arc::new(clients),
            Arc::new(store),
            retry,
            config.provision_settings(),
        );

        Ok(Self { config, job })
    }
}
