use async_trait::async_trait;
use redis::{aio::ConnectionManager, Client};

/// TTL-bound key-value contract the session layer runs against. Redis
/// in deployment, an in-memory map in tests.
#[async_trait]
pub trait SessionBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, anyhow::Error>;
    async fn set_ex(&self, key: &str, value: &str, expiry_seconds: u64)
        -> Result<(), anyhow::Error>;
    /// Remaining TTL in seconds; -2 when the key does not exist, -1 when
    /// it has no expiry (Redis semantics).
    async fn ttl(&self, key: &str) -> Result<i64, anyhow::Error>;
    async fn health_check(&self) -> Result<(), anyhow::Error>;
}

#[derive(Clone)]
pub struct RedisService {
    _client: Client,
    manager: ConnectionManager,
}

impl RedisService {
    pub async fn new(config: &crate::config::RedisConfig) -> Result<Self, anyhow::Error> {
        tracing::info!(url = %config.url, "Connecting to Redis");
        let client = Client::open(config.url.clone())?;

        // Use ConnectionManager for automatic reconnection
        let manager = client.get_connection_manager().await.map_err(|e| {
            tracing::error!("Failed to get Redis connection manager: {}", e);
            anyhow::anyhow!("Failed to connect to Redis: {}", e)
        })?;

        tracing::info!("Successfully connected to Redis");

        Ok(Self {
            _client: client,
            manager,
        })
    }
}

#[async_trait]
impl SessionBackend for RedisService {
    async fn get(&self, key: &str) -> Result<Option<String>, anyhow::Error> {
        let mut conn = self.manager.clone();
        redis::cmd("GET")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to read session key: {}", e))
    }

    async fn set_ex(
        &self,
        key: &str,
        value: &str,
        expiry_seconds: u64,
    ) -> Result<(), anyhow::Error> {
        let mut conn = self.manager.clone();
        redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("EX")
            .arg(expiry_seconds)
            .query_async(&mut conn)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to write session key: {}", e))
    }

    async fn ttl(&self, key: &str) -> Result<i64, anyhow::Error> {
        let mut conn = self.manager.clone();
        redis::cmd("TTL")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to read key TTL: {}", e))
    }

    async fn health_check(&self) -> Result<(), anyhow::Error> {
        let mut conn = self.manager.clone();
        redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| anyhow::anyhow!("Redis health check failed: {}", e))
    }
}

/// In-memory stand-in used by unit and integration tests.
pub struct MockSessionBackend {
    pub values: std::sync::Mutex<std::collections::HashMap<String, String>>,
    pub ttls: std::sync::Mutex<std::collections::HashMap<String, i64>>,
}

impl Default for MockSessionBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSessionBackend {
    pub fn new() -> Self {
        Self {
            values: std::sync::Mutex::new(std::collections::HashMap::new()),
            ttls: std::sync::Mutex::new(std::collections::HashMap::new()),
        }
    }

    /// Drop a key as if its TTL elapsed.
    pub fn expire(&self, key: &str) {
        if let Ok(mut values) = self.values.lock() {
            values.remove(key);
        }
        if let Ok(mut ttls) = self.ttls.lock() {
            ttls.remove(key);
        }
    }
}

#[async_trait]
impl SessionBackend for MockSessionBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, anyhow::Error> {
        let val = self
            .values
            .lock()
            .map_err(|e| anyhow::anyhow!("Mock backend mutex poisoned: {}", e))?
            .get(key)
            .cloned();
        Ok(val)
    }

    async fn set_ex(
        &self,
        key: &str,
        value: &str,
        expiry_seconds: u64,
    ) -> Result<(), anyhow::Error> {
        self.values
            .lock()
            .map_err(|e| anyhow::anyhow!("Mock backend mutex poisoned: {}", e))?
            .insert(key.to_string(), value.to_string());
        self.ttls
            .lock()
            .map_err(|e| anyhow::anyhow!("Mock backend mutex poisoned: {}", e))?
            .insert(key.to_string(), expiry_seconds as i64);
        Ok(())
    }

    async fn ttl(&self, key: &str) -> Result<i64, anyhow::Error> {
        let ttl = self
            .ttls
            .lock()
            .map_err(|e| anyhow::anyhow!("Mock backend mutex poisoned: {}", e))?
            .get(key)
            .copied()
            .unwrap_or(-2);
        Ok(ttl)
    }

    async fn health_check(&self) -> Result<(), anyhow::Error> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_backend_roundtrip() {
        tokio_test::block_on(async {
            let backend = MockSessionBackend::new();
            backend.set_ex("k", "v", 60).await.unwrap();
            assert_eq!(backend.get("k").await.unwrap(), Some("v".to_string()));
            assert_eq!(backend.ttl("k").await.unwrap(), 60);
        });
    }

    #[test]
    fn mock_backend_reports_missing_keys() {
        tokio_test::block_on(async {
            let backend = MockSessionBackend::new();
            assert_eq!(backend.get("missing").await.unwrap(), None);
            assert_eq!(backend.ttl("missing").await.unwrap(), -2);
        });
    }

    #[test]
    fn mock_backend_expire_removes_key() {
        tokio_test::block_on(async {
            let backend = MockSessionBackend::new();
            backend.set_ex("k", "v", 60).await.unwrap();
            backend.expire("k");
            assert_eq!(backend.get("k").await.unwrap(), None);
            assert_eq!(backend.ttl("k").await.unwrap(), -2);
        });
    }
}
