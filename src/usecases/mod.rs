//! Use Cases Layer - Application Business Logic
//!
//! Orchestrates domain logic with port interfaces to implement
//! the publisher's core workflow.
//!
//! Use cases:
//! - `QuoteSourceChain`: Priority-ordered single pass over sources
//! - `PriceAcquisition`: Retry rounds, backoff, last-known-good cache
//! - `Publisher`: Fixed-precision rendering and delivery
//! - `Scheduler`: Minute-aligned acquire-and-publish loop

pub mod acquisition;
pub mod publisher;
pub mod scheduler;
pub mod source_chain;
