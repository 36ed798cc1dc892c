//! CORS policy built from [`CorsConfig`].
//!
//! By default any request `Origin` is echoed back with credentials allowed, and the
//! configured origin list is not consulted. Setting `CORS_ENFORCE_ORIGINS=true`
//! restricts responses to the listed origins (`*` allows all).

use actix_cors::Cors;
use actix_web::http::{header::HeaderName, Method};

use crate::config::CorsConfig;

pub fn build(config: &CorsConfig) -> Cors {
    let methods: Vec<Method> = config
        .allowed_methods
        .iter()
        .filter_map(|method| Method::from_bytes(method.trim().to_uppercase().as_bytes()).ok())
        .collect();
    let headers: Vec<HeaderName> = config
        .allowed_headers
        .iter()
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    let mut cors = Cors::default()
        .allowed_methods(methods)
        .allowed_headers(headers)
        .supports_credentials()
        .max_age(3600);

    if !config.enforce_origins {
        return cors.allowed_origin_fn(|_origin, _req_head| true);
    }

    for origin in &config.allowed_origins {
        cors = if origin == "*" {
            cors.allow_any_origin()
        } else {
            cors.allowed_origin(origin)
        };
    }
    cors
}
