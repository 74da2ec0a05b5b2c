/// Middleware modules for the API server
///
/// - `auth`: bearer-token authentication and the admin gate
/// - `security`: security response headers

pub mod auth;
pub mod security;
