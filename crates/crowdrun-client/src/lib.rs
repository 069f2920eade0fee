//! Platform client library for CrowdRun.
//!
//! Defines the [`Platform`] contract the orchestrator drives and an HTTP
//! implementation of it for the platform's REST API.

pub mod config;
pub mod error;
pub mod http;
pub mod platform;

pub use config::{ClientConfig, Environment};
pub use error::ClientError;
pub use http::HttpPlatform;
pub use platform::Platform;
