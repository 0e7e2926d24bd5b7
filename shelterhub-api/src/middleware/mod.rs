/// Middleware for the API server
///
/// - `authorization`: the per-route authorization gate
/// - `security`: security response headers

pub mod authorization;
pub mod security;
