/// Middleware for the API server
///
/// - `auth`: Bearer token authentication for `/api` routes
/// - `security`: Security response headers

pub mod auth;
pub mod security;
