//! Provider abstractions for daily price series

use crate::core::error::{MarketError, Result};
use crate::core::series::{DateRange, TimeSeries};
use async_trait::async_trait;
use std::fmt::Display;
use std::str::FromStr;

/// Market indices fetched from a primary source and reconciled with a vendor feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarketIndex {
    UsdKrw,
    Gold,
}

impl MarketIndex {
    /// Ticker of the same instrument on Yahoo Finance.
    pub fn vendor_symbol(&self) -> &'static str {
        match self {
            MarketIndex::UsdKrw => "KRW=X",
            MarketIndex::Gold => "GC=F",
        }
    }
}

impl Display for MarketIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                MarketIndex::UsdKrw => "USD/KRW",
                MarketIndex::Gold => "Gold",
            }
        )
    }
}

impl FromStr for MarketIndex {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().replace(['/', '-', '_'], "").as_str() {
            "USDKRW" | "FX" => Ok(MarketIndex::UsdKrw),
            "GOLD" => Ok(MarketIndex::Gold),
            _ => Err(MarketError::InvalidInput(format!("unknown market index: {s}"))),
        }
    }
}

/// Daily bars for a ticker over a window.
#[async_trait]
pub trait DailySeriesProvider: Send + Sync {
    async fn fetch_daily(&self, symbol: &str, range: &DateRange) -> Result<TimeSeries>;
}

/// The short, frequently refreshed series a source publishes for an index.
#[async_trait]
pub trait IndexSeriesProvider: Send + Sync {
    async fn fetch_index(&self, index: MarketIndex) -> Result<TimeSeries>;
}
