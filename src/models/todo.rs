use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// A todo as persisted in the store. Field names match the table's columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Todo {
    /// Unique identifier (UUID v4, assigned when the todo is created).
    pub id: String,
    /// Subject of the token that created the todo. Never changes.
    pub user_id: String,
    pub title: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    /// Refreshed on every mutation.
    pub updated_at: DateTime<Utc>,
}

impl Todo {
    /// Creates a new `Todo` owned by `user_id` with a fresh id and both timestamps
    /// set to the current time.
    pub fn new(input: CreateTodoRequest, user_id: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            title: input.title,
            completed: input.completed,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrites the fields present in `changes`; absent fields keep their value.
    pub fn apply(&mut self, changes: UpdateTodoRequest) {
        if let Some(title) = changes.title {
            self.title = title;
        }
        if let Some(completed) = changes.completed {
            self.completed = completed;
        }
    }
}

/// Payload of `POST /api/todos/create`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateTodoRequest {
    #[validate(length(min = 1, max = 500), custom = "not_blank")]
    pub title: String,

    #[serde(default)]
    pub completed: bool,
}

/// Payload of `POST /api/todos/update/{id}`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateTodoRequest {
    #[validate(length(min = 1, max = 500), custom = "not_blank")]
    pub title: Option<String>,

    pub completed: Option<bool>,
}

/// A todo as returned to API clients. The owner is implied by the caller's token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoResponse {
    pub id: String,
    pub title: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Todo> for TodoResponse {
    fn from(todo: Todo) -> Self {
        Self {
            id: todo.id,
            title: todo.title,
            completed: todo.completed,
            created_at: todo.created_at,
            updated_at: todo.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TodoList {
    pub items: Vec<TodoResponse>,
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}
