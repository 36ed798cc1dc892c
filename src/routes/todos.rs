use actix_web::{post, web, HttpResponse, Responder};
use serde_json::json;

use crate::{
    auth::AuthenticatedUser,
    error::AppError,
    models::{CreateTodoRequest, TodoList, UpdateTodoRequest},
    service::TodoService,
};

/// Lists the caller's todos, newest first.
///
/// ## Responses:
/// - `200 OK`: `{"items": [Todo]}`, empty when the caller owns nothing.
/// - `401 Unauthorized`: missing or invalid bearer token.
#[post("/list")]
pub async fn list_todos(
    service: web::Data<TodoService>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let items = service.list(&user.user_id).await?;
    Ok(HttpResponse::Ok().json(TodoList { items }))
}

/// Fetches one todo. Ids owned by someone else answer `404` exactly like unknown ids.
#[post("/get/{id}")]
pub async fn get_todo(
    service: web::Data<TodoService>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> Result<impl Responder, AppError> {
    let todo = service.get(&user.user_id, &path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(todo))
}

/// Creates a todo owned by the caller.
///
/// ## Request Body:
/// `{"title": string, "completed": bool}`; `completed` defaults to `false`.
///
/// ## Responses:
/// - `201 Created`: the stored todo.
/// - `400 Bad Request`: malformed JSON, or a blank or overlong title.
#[post("/create")]
pub async fn create_todo(
    service: web::Data<TodoService>,
    user: AuthenticatedUser,
    body: web::Json<CreateTodoRequest>,
) -> Result<impl Responder, AppError> {
    let todo = service.create(&user.user_id, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(todo))
}

/// Partial update; absent fields are left untouched.
#[post("/update/{id}")]
pub async fn update_todo(
    service: web::Data<TodoService>,
    user: AuthenticatedUser,
    path: web::Path<String>,
    body: web::Json<UpdateTodoRequest>,
) -> Result<impl Responder, AppError> {
    let todo = service
        .update(&user.user_id, &path.into_inner(), body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(todo))
}

#[post("/toggle/{id}")]
pub async fn toggle_todo(
    service: web::Data<TodoService>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> Result<impl Responder, AppError> {
    let todo = service.toggle(&user.user_id, &path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(todo))
}

#[post("/delete/{id}")]
pub async fn delete_todo(
    service: web::Data<TodoService>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> Result<impl Responder, AppError> {
    service.delete(&user.user_id, &path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Todo deleted" })))
}
