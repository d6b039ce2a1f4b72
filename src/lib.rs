//! Task Tracker
//!
//! A REST API over a single table of tasks, plus a client that mirrors the
//! server's task state.
//!
//! - [`domain`]: the task entity, priority, and completion statistics
//! - [`infrastructure`]: `PostgreSQL` and in-memory repositories
//! - [`api`]: axum handlers, DTOs, and error responses
//! - [`client`]: HTTP client and local state mirror
//! - [`config`]: server settings from the environment

pub mod api;
pub mod client;
pub mod config;
pub mod domain;
pub mod infrastructure;
