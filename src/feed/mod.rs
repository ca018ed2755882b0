//! External quote and news feeds and the pollers that drive them.
//!
//! Each [`Feed`] is registered with an explicit kind, which decides where its
//! output goes: quotes straight to the sink, news through the watermark filter
//! into the batch buffer.

mod news;
mod poller;
mod quote;

pub use news::{NewsFeed, NewsFeedBuilder};
pub use poller::{PollTargets, Poller, PollerHandle};
pub use quote::{QuoteFeed, QuoteFeedBuilder};

use chrono::{DateTime, Datelike, NaiveTime, Utc, Weekday};
use chrono_tz::America::New_York;

/// What a feed produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedKind {
    Quotes,
    News,
}

impl FeedKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Quotes => "quotes",
            Self::News => "news",
        }
    }
}

/// A feed with its kind fixed at construction.
#[derive(Debug, Clone)]
pub enum Feed {
    Quotes(QuoteFeed),
    News(NewsFeed),
}

impl Feed {
    pub const fn kind(&self) -> FeedKind {
        match self {
            Self::Quotes(_) => FeedKind::Quotes,
            Self::News(_) => FeedKind::News,
        }
    }
}

impl From<QuoteFeed> for Feed {
    fn from(f: QuoteFeed) -> Self {
        Self::Quotes(f)
    }
}

impl From<NewsFeed> for Feed {
    fn from(f: NewsFeed) -> Self {
        Self::News(f)
    }
}

/// Whether the US equity market is in its regular session at `now`:
/// Monday to Friday, 09:30 through 16:00 New York time, both ends inclusive.
pub fn is_us_market_open(now: DateTime<Utc>) -> bool {
    let et = now.with_timezone(&New_York);
    if matches!(et.weekday(), Weekday::Sat | Weekday::Sun) {
        return false;
    }
    let time = et.time();
    let open = NaiveTime::from_hms_opt(9, 30, 0).unwrap_or_default();
    let close = NaiveTime::from_hms_opt(16, 0, 0).unwrap_or_default();
    time >= open && time <= close
}
