//! Telegram Bot API Adapter
//!
//! Delivers rendered prices to a Telegram channel.
//!
//! Sub-modules:
//! - `client`: `NotificationSink` implementation and error mapping
//! - `types`: Bot API request/response types

pub mod client;
pub mod types;

pub use client::{TelegramSink, DEFAULT_API_BASE};
