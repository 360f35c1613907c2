//! Market data model, normalization, gap-filling and indicators

pub mod config;
pub mod error;
pub mod indicators;
pub mod log;
pub mod normalize;
pub mod provider;
pub mod reconcile;
pub mod series;
pub mod statements;

// Re-export main types for cleaner imports
pub use error::{MarketError, Result};
pub use indicators::{BollingerParams, EnrichedSeries, IndicatorColumn, RsiParams};
pub use provider::{DailySeriesProvider, IndexSeriesProvider, MarketIndex};
pub use series::{DateRange, PriceField, PricePoint, TimeSeries};
pub use statements::FinancialStatementTable;
