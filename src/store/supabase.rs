//! [`TodoRepository`] backed by a Supabase project's PostgREST endpoint.
//!
//! Requests go to `<base_url>/rest/v1/<table>` authenticated with the service role
//! key. Rows are selected with `column=eq.value` filters; every request carries a
//! `user_id` filter taken from the verified caller. Mutations ask for
//! `Prefer: return=representation` so the affected rows come back in the response,
//! which is how "no row matched" is told apart from success.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use log::{error, info, warn};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Client, RequestBuilder};
use serde_json::json;

use super::{RetryPolicy, StoreError, TodoRepository};
use crate::config::SupabaseConfig;
use crate::logging::LogContext;
use crate::models::Todo;

const PREFER: &str = "Prefer";
const RETURN_REPRESENTATION: &str = "return=representation";

pub struct SupabaseTodoRepository {
    client: Client,
    table_url: String,
    retry: RetryPolicy,
    log: LogContext,
}

fn eq(value: &str) -> String {
    format!("eq.{}", value)
}

impl SupabaseTodoRepository {
    pub fn new(
        config: &SupabaseConfig,
        timeout: Duration,
        retry: RetryPolicy,
        log: LogContext,
    ) -> Result<Self, StoreError> {
        let key = HeaderValue::from_str(&config.service_role_key)
            .map_err(|e| StoreError::Setup(format!("invalid service role key: {}", e)))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", config.service_role_key))
            .map_err(|e| StoreError::Setup(format!("invalid service role key: {}", e)))?;

        let mut headers = HeaderMap::new();
        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| StoreError::Setup(e.to_string()))?;

        let table_url = format!(
            "{}/rest/v1/{}",
            config.base_url.trim_end_matches('/'),
            config.table
        );
        info!(target: log.target(), "using PostgREST table at {}", table_url);

        Ok(Self {
            client,
            table_url,
            retry,
            log,
        })
    }

    /// Sends the request and decodes the returned rows.
    async fn send(&self, request: RequestBuilder) -> Result<Vec<Todo>, StoreError> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json::<Vec<Todo>>().await?)
    }

    fn select_one(&self, user_id: &str, id: &str) -> RequestBuilder {
        self.client
            .get(&self.table_url)
            .query(&[("select", "*".to_string()), ("id", eq(id)), ("user_id", eq(user_id))])
    }

    fn patch(&self, user_id: &str, id: &str, body: &serde_json::Value) -> RequestBuilder {
        self.client
            .patch(&self.table_url)
            .query(&[("id", eq(id)), ("user_id", eq(user_id))])
            .header(PREFER, RETURN_REPRESENTATION)
            .json(body)
    }

    /// Logs a failed operation with its identifiers and hands the error back.
    fn failed(&self, operation: &str, user_id: &str, id: Option<&str>, err: StoreError) -> StoreError {
        if !err.is_not_found() {
            error!(
                target: self.log.target(),
                "{} failed for user {} (todo {}): {}",
                operation,
                user_id,
                id.unwrap_or("-"),
                err
            );
        }
        err
    }

    fn first_or_not_found(rows: Vec<Todo>, user_id: &str, id: &str) -> Result<Todo, StoreError> {
        rows.into_iter().next().ok_or_else(|| {
            StoreError::NotFound(format!("todo {} for user {}", id, user_id))
        })
    }
}

#[async_trait]
impl TodoRepository for SupabaseTodoRepository {
    async fn list(&self, user_id: &str) -> Result<Vec<Todo>, StoreError> {
        info!(target: self.log.target(), "listing todos for user {}", user_id);
        let query = [
            ("select", "*".to_string()),
            ("user_id", eq(user_id)),
            ("order", "created_at.desc".to_string()),
        ];

        self.retry
            .run("list", &self.log, |_| {
                self.send(self.client.get(&self.table_url).query(&query))
            })
            .await
            .map_err(|e| self.failed("list", user_id, None, e))
    }

    async fn get(&self, user_id: &str, id: &str) -> Result<Todo, StoreError> {
        info!(target: self.log.target(), "fetching todo {} for user {}", id, user_id);
        let rows = self
            .retry
            .run("get", &self.log, |_| self.send(self.select_one(user_id, id)))
            .await
            .map_err(|e| self.failed("get", user_id, Some(id), e))?;

        if rows.len() > 1 {
            warn!(target: self.log.target(), "{} rows share todo id {}", rows.len(), id);
        }
        Self::first_or_not_found(rows, user_id, id)
    }

    async fn create(&self, user_id: &str, todo: Todo) -> Result<Todo, StoreError> {
        let now = Utc::now();
        let row = Todo {
            user_id: user_id.to_string(),
            created_at: now,
            updated_at: now,
            ..todo
        };
        info!(target: self.log.target(), "creating todo {} for user {}", row.id, user_id);

        let row = &row;
        let rows = self
            .retry
            .run("create", &self.log, |attempt| async move {
                let insert = self
                    .client
                    .post(&self.table_url)
                    .header(PREFER, RETURN_REPRESENTATION)
                    .json(row);
                match self.send(insert).await {
                    // The id is ours, so a conflict on a retry means an earlier attempt
                    // was stored before its response was lost.
                    Err(StoreError::Status { status: 409, .. }) if attempt > 1 => {
                        self.send(self.select_one(user_id, &row.id)).await
                    }
                    other => other,
                }
            })
            .await
            .map_err(|e| self.failed("create", user_id, Some(&row.id), e))?;

        rows.into_iter()
            .next()
            .ok_or_else(|| StoreError::Decode("insert returned no rows".to_string()))
    }

    async fn update(&self, user_id: &str, todo: Todo) -> Result<Todo, StoreError> {
        info!(target: self.log.target(), "updating todo {} for user {}", todo.id, user_id);
        let body = json!({
            "title": todo.title,
            "completed": todo.completed,
            "updated_at": Utc::now(),
        });

        let rows = self
            .retry
            .run("update", &self.log, |_| {
                self.send(self.patch(user_id, &todo.id, &body))
            })
            .await
            .map_err(|e| self.failed("update", user_id, Some(&todo.id), e))?;

        Self::first_or_not_found(rows, user_id, &todo.id)
    }

    async fn toggle(&self, user_id: &str, id: &str) -> Result<Todo, StoreError> {
        let rows = self
            .retry
            .run("toggle", &self.log, |_| self.send(self.select_one(user_id, id)))
            .await
            .map_err(|e| self.failed("toggle", user_id, Some(id), e))?;
        let current = Self::first_or_not_found(rows, user_id, id)?;
        info!(
            target: self.log.target(),
            "toggling todo {} for user {} to completed={}",
            id,
            user_id,
            !current.completed
        );
        let body = json!({
            "completed": !current.completed,
            "updated_at": Utc::now(),
        });

        let rows = self
            .retry
            .run("toggle", &self.log, |_| self.send(self.patch(user_id, id, &body)))
            .await
            .map_err(|e| self.failed("toggle", user_id, Some(id), e))?;

        Self::first_or_not_found(rows, user_id, id)
    }

    async fn delete(&self, user_id: &str, id: &str) -> Result<(), StoreError> {
        info!(target: self.log.target(), "deleting todo {} for user {}", id, user_id);
        let query = [("id", eq(id)), ("user_id", eq(user_id))];
        let query = &query;

        let (rows, attempts) = self
            .retry
            .run("delete", &self.log, |attempt| async move {
                let request = self
                    .client
                    .delete(&self.table_url)
                    .query(query)
                    .header(PREFER, RETURN_REPRESENTATION);
                self.send(request).await.map(|rows| (rows, attempt))
            })
            .await
            .map_err(|e| self.failed("delete", user_id, Some(id), e))?;

        // A retry only follows a transient failure, which may have hidden a delete
        // that was applied. Nothing left to match then means the row is gone.
        if rows.is_empty() && attempts > 1 {
            warn!(
                target: self.log.target(),
                "delete of todo {} for user {} matched nothing on attempt {}, treating as deleted",
                id,
                user_id,
                attempts
            );
            return Ok(());
        }
        Self::first_or_not_found(rows, user_id, id).map(|_| ())
    }
}
