//! Adapters Layer - Hexagonal Architecture Outer Ring
//!
//! Implements the port traits defined in `crate::ports` with concrete
//! external dependencies (HTTP clients, Bot API, Prometheus).
//!
//! Adapter categories:
//! - `http`: Shared lazily-built reqwest client
//! - `sources`: REST quote providers and their payload schemas
//! - `telegram`: Telegram Bot API notification sink
//! - `metrics`: Prometheus metrics export and health checks

pub mod http;
pub mod metrics;
pub mod sources;
pub mod telegram;
