#![doc = "The `todo_api` library crate."]
#![doc = ""]
#![doc = "Per-user todo backend: bearer-token authentication, a todo service, and two"]
#![doc = "repository implementations (a PostgREST/Supabase adapter with retries and an"]
#![doc = "in-memory store). The binary (`main.rs`) wires them into an actix-web server."]

pub mod auth;
pub mod config;
pub mod cors;
pub mod error;
pub mod logging;
pub mod models;
pub mod routes;
pub mod service;
pub mod store;
