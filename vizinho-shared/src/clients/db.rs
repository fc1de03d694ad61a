use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool, PoolError};

pub type DbPool = Pool<ConnectionManager<PgConnection>>;

/// Build the r2d2 pool every service hands around in its `AppState`.
///
/// Diesel connections are blocking, so handlers check one out per call and
/// return it as soon as the query completes. A small pool with a couple of
/// warm connections covers that pattern.
pub fn create_pool(database_url: &str, max_size: u32) -> Result<DbPool, PoolError> {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    let pool = Pool::builder()
        .max_size(max_size)
        .min_idle(Some(2))
        .test_on_check_out(true)
        .build(manager)?;

    tracing::info!(max_size, "database connection pool ready");
    Ok(pool)
}
