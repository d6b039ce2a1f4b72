//! Client for the task API and a local mirror of its state.

pub mod service;
pub mod store;

pub use service::{ClientError, ClientFuture, DEFAULT_API_URL, HttpTaskApi, TaskApi};
pub use store::{TaskStore, UNCATEGORIZED};
