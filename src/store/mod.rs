//! Persistence for todos.
//!
//! [`TodoRepository`] is the contract the service layer talks to. Two
//! implementations exist: [`SupabaseTodoRepository`] speaks PostgREST over HTTP and
//! retries transient failures, [`InMemoryTodoRepository`] keeps rows in process
//! memory. Every operation takes the verified user id and filters on it; the owner
//! stored on a row always comes from that argument, never from the payload.

pub mod memory;
pub mod retry;
pub mod supabase;

use async_trait::async_trait;
use std::fmt;

use crate::models::Todo;

pub use memory::InMemoryTodoRepository;
pub use retry::RetryPolicy;
pub use supabase::SupabaseTodoRepository;

#[async_trait]
pub trait TodoRepository: Send + Sync {
    /// All todos owned by `user_id`, newest first.
    async fn list(&self, user_id: &str) -> Result<Vec<Todo>, StoreError>;

    /// The todo with `id` owned by `user_id`, or [`StoreError::NotFound`].
    async fn get(&self, user_id: &str, id: &str) -> Result<Todo, StoreError>;

    /// Inserts `todo` with its owner set to `user_id` and both timestamps set to now.
    /// Returns the row as the store persisted it.
    async fn create(&self, user_id: &str, todo: Todo) -> Result<Todo, StoreError>;

    /// Writes `title` and `completed` of `todo` and refreshes `updated_at`.
    async fn update(&self, user_id: &str, todo: Todo) -> Result<Todo, StoreError>;

    /// Flips `completed`. Read then write; concurrent writers race (last write wins).
    async fn toggle(&self, user_id: &str, id: &str) -> Result<Todo, StoreError>;

    async fn delete(&self, user_id: &str, id: &str) -> Result<(), StoreError>;
}

/// Failures reported by a [`TodoRepository`].
#[derive(Debug)]
pub enum StoreError {
    /// No row matched both the id and the owner.
    NotFound(String),
    /// The request never produced a response (connection refused, reset, ...).
    Transport(String),
    /// The request did not complete within the configured timeout.
    Timeout(String),
    /// The store answered with a non-success status.
    Status { status: u16, body: String },
    /// The response body could not be decoded into rows.
    Decode(String),
    /// The client could not be constructed.
    Setup(String),
    /// An operation gave up; `source` is the last failure observed.
    Operation {
        operation: &'static str,
        attempts: u32,
        source: Box<StoreError>,
    },
}

impl StoreError {
    /// Whether repeating the same call may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            StoreError::Transport(_) | StoreError::Timeout(_) | StoreError::Decode(_) => true,
            StoreError::Status { status, .. } => {
                *status == 408 || *status == 429 || *status >= 500
            }
            StoreError::NotFound(_) | StoreError::Setup(_) | StoreError::Operation { .. } => false,
        }
    }

    /// The innermost error, looking through [`StoreError::Operation`] wrappers.
    pub fn root(&self) -> &StoreError {
        match self {
            StoreError::Operation { source, .. } => source.root(),
            other => other,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self.root(), StoreError::NotFound(_))
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self.root(), StoreError::Timeout(_))
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            StoreError::NotFound(what) => write!(f, "not found: {}", what),
            StoreError::Transport(msg) => write!(f, "transport error: {}", msg),
            StoreError::Timeout(msg) => write!(f, "timed out: {}", msg),
            StoreError::Status { status, body } => {
                write!(f, "store responded with status {}: {}", status, body)
            }
            StoreError::Decode(msg) => write!(f, "could not decode store response: {}", msg),
            StoreError::Setup(msg) => write!(f, "could not set up store client: {}", msg),
            StoreError::Operation {
                operation,
                attempts,
                source,
            } => write!(
                f,
                "{} failed after {} attempt{}: {}",
                operation,
                attempts,
                if *attempts == 1 { "" } else { "s" },
                source
            ),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Operation { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(error: reqwest::Error) -> StoreError {
        if error.is_timeout() {
            StoreError::Timeout(error.to_string())
        } else if error.is_decode() {
            StoreError::Decode(error.to_string())
        } else {
            StoreError::Transport(error.to_string())
        }
    }
}
