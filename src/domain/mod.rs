//! Domain layer - Core price types and cadence arithmetic.
//!
//! Pure logic with no I/O (hexagonal architecture inner ring).
//! Everything here is testable in isolation.

pub mod price;
pub mod schedule;

// Re-export core types for convenience
pub use price::{DisplayPrice, Freshness, PriceSample};
pub use schedule::{delay_until_next_minute, Clock, SystemClock};
