// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod analyze;
pub mod api;
pub mod app;
pub mod config;
pub mod demo;
pub mod hub;
pub mod ingest;
pub mod metrics;
pub mod news;

// ---- Re-exports for stable public API ----
pub use crate::api::router;
pub use crate::hub::{Hub, HubConfig, NewsSink, Subscription};
pub use crate::news::{Analysis, NewsItem, Sentiment};
