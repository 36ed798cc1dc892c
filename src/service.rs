use std::sync::Arc;

use log::info;
use validator::Validate;

use crate::error::AppError;
use crate::logging::LogContext;
use crate::models::{CreateTodoRequest, Todo, TodoResponse, UpdateTodoRequest};
use crate::store::TodoRepository;

/// Todo use cases for one authenticated user at a time.
///
/// Validates payloads, runs the read-modify-write sequences and converts stored
/// rows into [`TodoResponse`]s. Scoping is delegated to the repository by passing
/// the caller's user id on every call.
pub struct TodoService {
    repo: Arc<dyn TodoRepository>,
    log: LogContext,
}

impl TodoService {
    pub fn new(repo: Arc<dyn TodoRepository>, log: LogContext) -> Self {
        Self { repo, log }
    }

    pub async fn list(&self, user_id: &str) -> Result<Vec<TodoResponse>, AppError> {
        let todos = self.repo.list(user_id).await?;
        Ok(todos.into_iter().map(TodoResponse::from).collect())
    }

    pub async fn get(&self, user_id: &str, id: &str) -> Result<TodoResponse, AppError> {
        Ok(self.repo.get(user_id, id).await?.into())
    }

    pub async fn create(
        &self,
        user_id: &str,
        input: CreateTodoRequest,
    ) -> Result<TodoResponse, AppError> {
        input.validate()?;
        let todo = Todo::new(input, user_id);
        let created = self.repo.create(user_id, todo).await?;
        info!(target: self.log.target(), "user {} created todo {}", user_id, created.id);
        Ok(created.into())
    }

    /// Partial update: fields missing from `changes` keep their stored value.
    pub async fn update(
        &self,
        user_id: &str,
        id: &str,
        changes: UpdateTodoRequest,
    ) -> Result<TodoResponse, AppError> {
        changes.validate()?;
        let mut todo = self.repo.get(user_id, id).await?;
        todo.apply(changes);
        Ok(self.repo.update(user_id, todo).await?.into())
    }

    pub async fn toggle(&self, user_id: &str, id: &str) -> Result<TodoResponse, AppError> {
        let toggled = self.repo.toggle(user_id, id).await?;
        info!(
            target: self.log.target(),
            "user {} set todo {} completed={}", user_id, id, toggled.completed
        );
        Ok(toggled.into())
    }

    pub async fn delete(&self, user_id: &str, id: &str) -> Result<(), AppError> {
        self.repo.delete(user_id, id).await?;
        info!(target: self.log.target(), "user {} deleted todo {}", user_id, id);
        Ok(())
    }
}
