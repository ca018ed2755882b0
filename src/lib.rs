//! sentiflow: market quote and news ingestion with batched sentiment enrichment.
//!
//! News items pass a per-symbol watermark, land in a batch buffer that flushes
//! on size or on a timer, get merged by `(symbol, timestamp)`, scored by a
//! sentiment gateway and written to a sink. Quotes go straight to the sink.
//! The chart side aligns stored prices with the latest sentiment at or before
//! each price.
//!
//! ```no_run
//! # async fn run() -> Result<(), sentiflow::SfError> {
//! use sentiflow::{Pipeline, PipelineConfig};
//!
//! let pipeline = Pipeline::builder(PipelineConfig::from_env()?).start()?;
//! pipeline
//!     .ingest_news_json(r#"{"timestamp":"2024-05-01T14:00:00Z","symbol":"AAPL","text":"Apple beats"}"#)
//!     .await?;
//! let series = pipeline.chart().trend("AAPL", Some("7d"))?;
//! println!("{} points", series.len());
//! pipeline.stop().await;
//! # Ok(())
//! # }
//! ```

pub mod align;
pub mod buffer;
pub mod chart;
pub mod config;
pub mod core;
pub mod feed;
pub mod gateway;
pub mod merge;
pub mod pipeline;
pub mod sink;
pub mod store;
pub mod watermark;

pub use align::{SentimentIndex, align};
pub use buffer::{Batch, BatchBuffer, BufferConfig, BufferHandle, FlushController, FlushTrigger};
pub use chart::{ChartRange, ChartService};
pub use config::PipelineConfig;
pub use crate::core::{
    Backoff, ChartPoint, MergedNewsItem, NewsItem, PricePoint, ResultSink, RetryConfig,
    SentimentResult, SentimentScorer, SentimentScores, SfError, decode_news_item,
    decode_price_point, label_for_compound,
};
pub use feed::{Feed, FeedKind, NewsFeed, PollTargets, Poller, PollerHandle, QuoteFeed};
pub use gateway::{GatewayClient, GatewayClientBuilder};
pub use merge::merge_news;
pub use pipeline::{FlushReport, Pipeline, PipelineBuilder, process_batch};
pub use sink::{Notification, StoreSink};
pub use store::{MemoryStore, SeriesStore};
pub use watermark::WatermarkTracker;
