use std::io;
use std::sync::Arc;

use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use log::{info, warn};

use todo_api::auth::{AuthMiddleware, TokenVerifier};
use todo_api::config::{Config, StoreBackend};
use todo_api::cors;
use todo_api::logging::{self, LogContext};
use todo_api::routes::{self, health::health};
use todo_api::service::TodoService;
use todo_api::store::{InMemoryTodoRepository, SupabaseTodoRepository, TodoRepository};

fn startup_error(err: impl ToString) -> io::Error {
    io::Error::new(io::ErrorKind::Other, err.to_string())
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv().ok();
    let config = Config::from_env().map_err(startup_error)?;
    logging::init(&config.log).map_err(startup_error)?;

    let root = LogContext::new("todo_api");

    let repo: Arc<dyn TodoRepository> = match &config.store.backend {
        StoreBackend::Supabase(supabase) => Arc::new(
            SupabaseTodoRepository::new(
                supabase,
                config.store.timeout,
                config.store.retry,
                root.child("store"),
            )
            .map_err(startup_error)?,
        ),
        StoreBackend::Memory => {
            warn!(target: root.target(), "STORE_BACKEND=memory: todos are not persisted");
            Arc::new(InMemoryTodoRepository::new(root.child("store")))
        }
    };

    let verifier = Arc::new(TokenVerifier::new(&config.auth, root.child("auth")));
    let service = web::Data::new(TodoService::new(repo, root.child("service")));

    let bind = (config.server.host.clone(), config.server.port);
    info!(target: root.target(), "starting server at {}", config.server.server_url());

    let cors_config = config.cors.clone();
    HttpServer::new(move || {
        App::new()
            .app_data(service.clone())
            .wrap(Logger::default())
            .wrap(cors::build(&cors_config))
            .service(health)
            .service(
                web::scope("/api")
                    .wrap(AuthMiddleware::new(verifier.clone()))
                    .configure(routes::config),
            )
    })
    .bind(bind)?
    .run()
    .await
}
