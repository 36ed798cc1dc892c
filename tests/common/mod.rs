#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{json, Value};

use todo_api::auth::TokenVerifier;
use todo_api::config::{AuthConfig, CorsConfig};
use todo_api::logging::LogContext;
use todo_api::models::Todo;
use todo_api::store::{InMemoryTodoRepository, StoreError, TodoRepository};

pub const SECRET: &str = "integration-test-secret";

pub fn sign(claims: &Value, secret: &str, alg: Algorithm) -> String {
    encode(
        &Header::new(alg),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("failed to sign test token")
}

pub fn token_for(sub: &str) -> String {
    sign(
        &json!({ "sub": sub, "exp": Utc::now().timestamp() + 3600 }),
        SECRET,
        Algorithm::HS256,
    )
}

pub fn bearer(sub: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token_for(sub)))
}

pub fn verifier() -> Arc<TokenVerifier> {
    let config = AuthConfig {
        jwt_secret: SECRET.to_string(),
        audience: None,
        leeway_secs: 0,
    };
    Arc::new(TokenVerifier::new(&config, LogContext::new("test::auth")))
}

pub fn cors_config() -> CorsConfig {
    CorsConfig {
        allowed_origins: vec!["http://localhost:5173".to_string()],
        allowed_methods: ["GET", "POST", "PUT", "DELETE", "OPTIONS"]
            .iter()
            .map(|m| m.to_string())
            .collect(),
        allowed_headers: ["Origin", "Content-Type", "Accept", "Authorization"]
            .iter()
            .map(|h| h.to_string())
            .collect(),
        enforce_origins: false,
    }
}

/// In-memory repository that counts how many times it was reached.
#[derive(Default)]
pub struct CountingRepository {
    inner: InMemoryTodoRepository,
    calls: AtomicUsize,
}

impl CountingRepository {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl TodoRepository for CountingRepository {
    async fn list(&self, user_id: &str) -> Result<Vec<Todo>, StoreError> {
        self.hit();
        self.inner.list(user_id).await
    }

    async fn get(&self, user_id: &str, id: &str) -> Result<Todo, StoreError> {
        self.hit();
        self.inner.get(user_id, id).await
    }

    async fn create(&self, user_id: &str, todo: Todo) -> Result<Todo, StoreError> {
        self.hit();
        self.inner.create(user_id, todo).await
    }

    async fn update(&self, user_id: &str, todo: Todo) -> Result<Todo, StoreError> {
        self.hit();
        self.inner.update(user_id, todo).await
    }

    async fn toggle(&self, user_id: &str, id: &str) -> Result<Todo, StoreError> {
        self.hit();
        self.inner.toggle(user_id, id).await
    }

    async fn delete(&self, user_id: &str, id: &str) -> Result<(), StoreError> {
        self.hit();
        self.inner.delete(user_id, id).await
    }
}

/// Builds the application the way the binary does, over the given repository.
macro_rules! init_app {
    ($repo:expr) => {{
        let repo: std::sync::Arc<dyn todo_api::store::TodoRepository> = $repo;
        let service = actix_web::web::Data::new(todo_api::service::TodoService::new(
            repo,
            todo_api::logging::LogContext::new("test::service"),
        ));
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(service)
                .wrap(actix_web::middleware::Logger::default())
                .wrap(todo_api::cors::build(&common::cors_config()))
                .service(todo_api::routes::health::health)
                .service(
                    actix_web::web::scope("/api")
                        .wrap(todo_api::auth::AuthMiddleware::new(common::verifier()))
                        .configure(todo_api::routes::config),
                ),
        )
        .await
    }};
}
pub(crate) use init_app;
