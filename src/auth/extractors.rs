use actix_web::dev::Payload;
use actix_web::{Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use std::future::{ready, Ready};

use crate::auth::AuthenticatedUser;
use crate::error::AppError;

/// Extracts the caller stored by `AuthMiddleware`.
///
/// Only meaningful on routes inside the middleware's scope; elsewhere the
/// extraction fails with `401 Unauthorized`.
impl FromRequest for AuthenticatedUser {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match req.extensions().get::<AuthenticatedUser>().cloned() {
            Some(user) => ready(Ok(user)),
            None => {
                let err = AppError::Unauthorized("Unauthorized access".to_string());
                ready(Err(err.into()))
            }
        }
    }
}
