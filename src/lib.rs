//! Session-aware client for the test management REST API.
//!
//! [`http::ApiClient`] runs every call through an explicit middleware
//! pipeline that attaches the bearer token and tears the session down on
//! 401. [`session::SessionStore`] owns the single live session and its
//! persisted token. [`export::Exporter`] requests rendered documents and
//! saves them to disk.

pub mod api;
pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod http;
pub mod navigation;
pub mod session;

pub use app::App;
pub use error::{Result, TmsError};
