use redis::aio::ConnectionManager;
use redis::AsyncCommands;

/// Thin wrapper over a multiplexed Redis connection.
///
/// The messaging service uses it for presence: `online:{user_id}` keys with a
/// short TTL that socket heartbeats keep refreshing. Every method clones the
/// underlying [`ConnectionManager`], which is the cheap way to get an owned
/// handle per operation.
#[derive(Clone)]
pub struct RedisClient {
    conn: ConnectionManager,
}

impl RedisClient {
    pub async fn connect(url: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(url)?;
        let conn = client.get_connection_manager().await?;
        tracing::info!(url = %url, "connected to Redis");
        Ok(Self { conn })
    }

    /// Set a key with a TTL. Presence keys rely on the TTL for expiry, so
    /// there is no variant without one.
    pub async fn set(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), redis::RedisError> {
        let mut conn = self.conn.clone();
        conn.set_ex(key, value, ttl_secs).await
    }

    pub async fn del(&self, key: &str) -> Result<(), redis::RedisError> {
        let mut conn = self.conn.clone();
        conn.del(key).await
    }

    /// Check several keys in one pipelined round trip. Returns one flag per
    /// key, in order.
    pub async fn exists_multi(&self, keys: &[String]) -> Result<Vec<bool>, redis::RedisError> {
        if keys.is_empty() {
            return Ok(vec![]);
        }
        let mut conn = self.conn.clone();
        let mut pipe = redis::pipe();
        for key in keys {
            pipe.exists(key.as_str());
        }
        pipe.query_async(&mut conn).await
    }
}
