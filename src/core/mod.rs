//! Core components of the `sentiflow` crate.
//!
//! This module contains the foundational building blocks of the library, including:
//! - The primary [`SfError`] type.
//! - Shared data models like [`NewsItem`], [`SentimentResult`] and [`ChartPoint`].
//! - Lenient wire decoders for inbound messages.
//! - Internal HTTP plumbing and retry policy.

/// HTTP client options, retry policy and default endpoints.
pub mod client;
/// The primary error type (`SfError`) for the crate.
pub mod error;
/// Shared data models used across the pipeline and the chart aligner.
pub mod models;
/// Service traits for the scoring gateway and the result sink.
pub mod services;
pub mod wire;

// convenient re-exports so most code can just `use crate::core::SfError`
pub use client::{Backoff, RetryConfig};
pub use error::SfError;
pub use models::{
    ChartPoint, MergedNewsItem, NewsItem, PricePoint, SentimentResult, SentimentScores,
    label_for_compound,
};
pub use services::{ResultSink, SentimentScorer};
pub use wire::{decode_news_item, decode_price_point};
