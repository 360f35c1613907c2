pub mod nasdaq;
pub mod naver_chart;
pub mod naver_finance;
pub mod naver_index;
pub mod naver_ranking;
pub mod telegram;
pub mod util;
pub mod yahoo_finance;

pub use nasdaq::{NasdaqScreenerProvider, ScreenerRow};
pub use naver_chart::{NaverChartProvider, is_domestic_symbol};
pub use naver_finance::NaverFinanceProvider;
pub use naver_index::NaverIndexProvider;
pub use naver_ranking::{MarketMover, NaverRankingProvider};
pub use telegram::{TelegramNotifier, TelegramReply};
pub use yahoo_finance::YahooFinanceProvider;
