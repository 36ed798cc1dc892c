use async_trait::async_trait;
use chrono::Utc;
use log::debug;
use tokio::sync::RwLock;

use super::{StoreError, TodoRepository};
use crate::logging::LogContext;
use crate::models::Todo;

/// Process-local repository. Same filtering and not-found rules as the remote store;
/// contents are lost on restart.
pub struct InMemoryTodoRepository {
    todos: RwLock<Vec<Todo>>,
    log: LogContext,
}

impl InMemoryTodoRepository {
    pub fn new(log: LogContext) -> Self {
        Self {
            todos: RwLock::new(Vec::new()),
            log,
        }
    }

    fn not_found(user_id: &str, id: &str) -> StoreError {
        StoreError::NotFound(format!("todo {} for user {}", id, user_id))
    }
}

impl Default for InMemoryTodoRepository {
    fn default() -> Self {
        Self::new(LogContext::default())
    }
}

#[async_trait]
impl TodoRepository for InMemoryTodoRepository {
    async fn list(&self, user_id: &str) -> Result<Vec<Todo>, StoreError> {
        let todos = self.todos.read().await;
        // Newest insert first so equal timestamps still come out newest first.
        let mut owned: Vec<Todo> = todos
            .iter()
            .rev()
            .filter(|todo| todo.user_id == user_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(owned)
    }

    async fn get(&self, user_id: &str, id: &str) -> Result<Todo, StoreError> {
        self.todos
            .read()
            .await
            .iter()
            .find(|todo| todo.id == id && todo.user_id == user_id)
            .cloned()
            .ok_or_else(|| Self::not_found(user_id, id))
    }

    async fn create(&self, user_id: &str, todo: Todo) -> Result<Todo, StoreError> {
        let now = Utc::now();
        let todo = Todo {
            user_id: user_id.to_string(),
            created_at: now,
            updated_at: now,
            ..todo
        };

        let mut todos = self.todos.write().await;
        if todos.iter().any(|existing| existing.id == todo.id) {
            return Err(StoreError::Status {
                status: 409,
                body: format!("duplicate id {}", todo.id),
            });
        }
        debug!(target: self.log.target(), "created todo {} for user {}", todo.id, user_id);
        todos.push(todo.clone());
        Ok(todo)
    }

    async fn update(&self, user_id: &str, todo: Todo) -> Result<Todo, StoreError> {
        let mut todos = self.todos.write().await;
        let stored = todos
            .iter_mut()
            .find(|existing| existing.id == todo.id && existing.user_id == user_id)
            .ok_or_else(|| Self::not_found(user_id, &todo.id))?;

        stored.title = todo.title;
        stored.completed = todo.completed;
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }

    async fn toggle(&self, user_id: &str, id: &str) -> Result<Todo, StoreError> {
        let mut todos = self.todos.write().await;
        let stored = todos
            .iter_mut()
            .find(|existing| existing.id == id && existing.user_id == user_id)
            .ok_or_else(|| Self::not_found(user_id, id))?;

        stored.completed = !stored.completed;
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }

    async fn delete(&self, user_id: &str, id: &str) -> Result<(), StoreError> {
        let mut todos = self.todos.write().await;
        let position = todos
            .iter()
            .position(|todo| todo.id == id && todo.user_id == user_id)
            .ok_or_else(|| Self::not_found(user_id, id))?;

        todos.remove(position);
        debug!(target: self.log.target(), "deleted todo {} for user {}", id, user_id);
        Ok(())
    }
}
