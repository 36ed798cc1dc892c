//! Bearer-token authentication.
//!
//! Tokens are issued elsewhere (the Supabase identity provider) and only verified
//! here. [`AuthMiddleware`] verifies the `Authorization` header of every request in
//! the scope it wraps and stores the resulting [`AuthenticatedUser`] in the request
//! extensions; handlers take it as an extractor argument.

pub mod extractors;
pub mod middleware;
pub mod token;

use serde::{Deserialize, Serialize};

pub use middleware::AuthMiddleware;
pub use token::{bearer_token, Claims, TokenError, TokenVerifier};

/// The caller of the current request, as proven by its token. Lives for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    /// The token's `sub` claim. Every store access is filtered by it.
    pub user_id: String,
    pub email: Option<String>,
    pub role: Option<String>,
}

impl AuthenticatedUser {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            email: None,
            role: None,
        }
    }
}
