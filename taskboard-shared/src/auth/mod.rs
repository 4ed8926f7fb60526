/// Authentication and authorization
///
/// # Modules
///
/// - [`jwt`]: Bearer token signing and verification
/// - [`middleware`]: Request authentication into an [`middleware::AuthContext`]
/// - [`authorization`]: Owner scoping applied to every store operation

pub mod authorization;
pub mod jwt;
pub mod middleware;
