/// Database layer
///
/// - `pool`: PostgreSQL connection pool with health checks and stats
/// - `migrations`: embedded schema migrations
///
/// Table access lives in `models`; the rest of the crate goes through
/// `store::TenantStore`.

pub mod migrations;
pub mod pool;
