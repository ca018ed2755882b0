//! Chart queries: range tokens, window bounds, and the store-backed service.

use std::{str::FromStr, sync::Arc};

use chrono::{DateTime, TimeDelta, Utc};
use tracing::debug;

use crate::{
    align::align,
    core::{ChartPoint, SfError},
    store::SeriesStore,
};

/// A recognized chart range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChartRange {
    /// `"1d"`: the last 24 hours.
    Day,
    /// `"7d"`: the last 7 days.
    #[default]
    Week,
    /// `"1m"`: the last 30 days.
    Month,
    /// The fixed one-hour window behind the live view. Has no token.
    Live,
}

impl ChartRange {
    /// Parse a range token. `None` means the default (`"7d"`).
    ///
    /// # Errors
    ///
    /// Returns `SfError::UnsupportedRange` for anything other than `1d`, `7d`, `1m`.
    pub fn parse(token: Option<&str>) -> Result<Self, SfError> {
        token.map_or(Ok(Self::default()), str::parse)
    }

    pub fn period(self) -> TimeDelta {
        match self {
            Self::Day => TimeDelta::days(1),
            Self::Week => TimeDelta::days(7),
            Self::Month => TimeDelta::days(30),
            Self::Live => TimeDelta::hours(1),
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Day => "1d",
            Self::Week => "7d",
            Self::Month => "1m",
            Self::Live => "live",
        }
    }
}

impl FromStr for ChartRange {
    type Err = SfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1d" => Ok(Self::Day),
            "7d" => Ok(Self::Week),
            "1m" => Ok(Self::Month),
            other => Err(SfError::UnsupportedRange(other.to_string())),
        }
    }
}

/// Lower bound of a window ending at `now`. A zero period means "no lower bound".
pub fn window_start(period: TimeDelta, now: DateTime<Utc>) -> DateTime<Utc> {
    if period > TimeDelta::zero() {
        now.checked_sub_signed(period)
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
    } else {
        DateTime::<Utc>::UNIX_EPOCH
    }
}

/// Reads both series for a window and aligns them.
#[derive(Clone)]
pub struct ChartService {
    store: Arc<dyn SeriesStore>,
}

impl ChartService {
    pub fn new(store: Arc<dyn SeriesStore>) -> Self {
        Self { store }
    }

    /// Chart for a range token (`"1d"`, `"7d"`, `"1m"`; default `"7d"`).
    ///
    /// # Errors
    ///
    /// Returns `SfError::UnsupportedRange` before touching the store when the
    /// token is unknown, or the store's error if a read fails.
    #[tracing::instrument(skip(self), err)]
    pub fn trend(&self, symbol: &str, token: Option<&str>) -> Result<Vec<ChartPoint>, SfError> {
        let range = ChartRange::parse(token)?;
        self.window(symbol, range.period(), Utc::now())
    }

    /// Chart for the fixed one-hour live window.
    ///
    /// # Errors
    ///
    /// Returns the store's error if a read fails.
    pub fn live(&self, symbol: &str) -> Result<Vec<ChartPoint>, SfError> {
        self.window(symbol, ChartRange::Live.period(), Utc::now())
    }

    /// Chart for an arbitrary window ending at `now`.
    ///
    /// # Errors
    ///
    /// Returns the store's error if a read fails.
    pub fn window(
        &self,
        symbol: &str,
        period: TimeDelta,
        now: DateTime<Utc>,
    ) -> Result<Vec<ChartPoint>, SfError> {
        let from = window_start(period, now);
        let prices = self.store.prices_since(symbol, from)?;
        let sentiments = self.store.sentiments_since(symbol, from)?;
        let points = align(&prices, &sentiments);
        debug!(
            symbol,
            %from,
            prices = prices.len(),
            sentiments = sentiments.len(),
            points = points.len(),
            "chart aligned"
        );
        Ok(points)
    }
}
