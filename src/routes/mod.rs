pub mod health;
pub mod todos;

use actix_web::{error, web, HttpRequest};

use crate::error::AppError;

/// Registers the todo endpoints. Expected to be mounted under the authenticated
/// `/api` scope.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config()).app_data(path_config()).service(
        web::scope("/todos")
            .service(todos::list_todos)
            .service(todos::get_todo)
            .service(todos::create_todo)
            .service(todos::update_todo)
            .service(todos::toggle_todo)
            .service(todos::delete_todo),
    );
}

/// Malformed or mistyped JSON bodies become the `1001` error envelope.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err: error::JsonPayloadError, _req: &HttpRequest| {
        AppError::BadRequest(format!("Invalid request body: {}", err)).into()
    })
}

pub fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|err: error::PathError, _req: &HttpRequest| {
        AppError::BadRequest(format!("Invalid path: {}", err)).into()
    })
}
