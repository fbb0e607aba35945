//! Document core of the Cloud Data Warehouse Architect.
//!
//! Typed documents stored in a hierarchical document store, the project
//! aggregate with its membership rules, the diagram node tree and the
//! encryption pipeline for connection credentials.

pub mod config;
pub mod error;
pub mod models;
pub mod observability;
pub mod services;
pub mod state;
pub mod storage;

pub use config::{CoreConfig, LogFormat};
pub use error::CoreError;
pub use state::AppState;
