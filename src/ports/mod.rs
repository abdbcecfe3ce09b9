//! Ports Layer - Hexagonal Architecture Boundaries
//!
//! Defines the interfaces (traits) that the use case layer requires
//! from the outside world. Adapters implement these traits.
//!
//! Port categories:
//! - `QuoteSource`: One external price provider
//! - `NotificationSink`: Outbound channel delivery
//! - `Telemetry`: Pipeline events for metrics and health

pub mod notifier;
pub mod quote_source;
pub mod telemetry;
