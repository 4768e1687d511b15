//! Redis-backed store (`SET key value EX ttl` / `GET key` / `PING`).

use std::time::Duration;

use ::redis::aio::ConnectionManager;
use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::info;

use super::{StoreBackend, StoreError};

/// Upper bound on establishing the shared connection.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
/// Reconnect attempts made by the connection manager on first connect.
const CONNECT_RETRIES: usize = 1;

/// Shares one auto-reconnecting multiplexed connection across all callers.
///
/// The connection is opened on first use, so the service starts (and reports
/// the failure on `/health`) while Redis is unreachable.
pub struct RedisBackend {
    client: ::redis::Client,
    connection: OnceCell<ConnectionManager>,
}

impl RedisBackend {
    /// Parses the connection URL. `rediss://` URLs use TLS; with
    /// `tls_insecure` the server certificate is not verified.
    pub fn open(url: &str, tls_insecure: bool) -> Result<Self, StoreError> {
        let client = ::redis::Client::open(connection_url(url, tls_insecure))?;
        Ok(Self {
            client,
            connection: OnceCell::new(),
        })
    }

    async fn connection(&self) -> Result<ConnectionManager, StoreError> {
        let manager = self
            .connection
            .get_or_try_init(|| async {
                let connect = ConnectionManager::new_with_backoff(
                    self.client.clone(),
                    2,
                    100,
                    CONNECT_RETRIES,
                );
                let manager = tokio::time::timeout(CONNECT_TIMEOUT, connect)
                    .await
                    .map_err(|_| {
                        StoreError::Unavailable(format!(
                            "timed out connecting to Redis after {}s",
                            CONNECT_TIMEOUT.as_secs()
                        ))
                    })??;
                info!("Redis connection established");
                Ok::<_, StoreError>(manager)
            })
            .await?;
        Ok(manager.clone())
    }
}

#[async_trait]
impl StoreBackend for RedisBackend {
    async fn put(&self, key: &str, value: String, ttl: Duration) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;
        ::redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("EX")
            .arg(ttl.as_secs().max(1))
            .query_async::<_, ()>(&mut conn)
            .await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.connection().await?;
        let value: Option<String> = ::redis::cmd("GET")
            .arg(key)
            .query_async(&mut conn)
            .await?;
        Ok(value)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;
        ::redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await?;
        Ok(())
    }
}

/// Managed Redis offerings commonly terminate TLS with self-signed
/// certificates; the `#insecure` fragment tells the client to skip
/// verification.
fn connection_url(url: &str, tls_insecure: bool) -> String {
    if tls_insecure && url.starts_with("rediss://") && !url.contains('#') {
        format!("{url}#insecure")
    } else {
        url.to_string()
    }
}
