use crate::core::error::{MarketError, Result};
use crate::core::normalize::parse_number_text;
use crate::providers::util::{RequestProfile, RetryPolicy, get_json, url_with_params};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// A KOSPI decliner as listed by the Naver mobile ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketMover {
    pub item_code: String,
    pub name: String,
    pub close_price: Option<f64>,
    pub change: Option<f64>,
    /// Percent change against the previous close.
    pub fluctuation_ratio: Option<f64>,
    pub volume: Option<f64>,
}

#[derive(Deserialize, Debug)]
struct RankingResponse {
    stocks: Vec<RankingStock>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct RankingStock {
    item_code: String,
    stock_name: String,
    #[serde(default)]
    close_price: String,
    #[serde(default)]
    compare_to_previous_close_price: String,
    #[serde(default)]
    fluctuations_ratio: String,
    #[serde(default)]
    accumulated_trading_volume: String,
}

impl From<RankingStock> for MarketMover {
    fn from(stock: RankingStock) -> Self {
        MarketMover {
            close_price: parse_number_text(&stock.close_price),
            change: parse_number_text(&stock.compare_to_previous_close_price),
            fluctuation_ratio: parse_number_text(&stock.fluctuations_ratio),
            volume: parse_number_text(&stock.accumulated_trading_volume),
            item_code: stock.item_code,
            name: stock.stock_name,
        }
    }
}

pub struct NaverRankingProvider {
    base_url: String,
    client: Client,
    profile: RequestProfile,
    retry: RetryPolicy,
}

impl NaverRankingProvider {
    pub fn new(base_url: &str, client: Client, retry: RetryPolicy) -> Self {
        NaverRankingProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            profile: RequestProfile::naver(),
            retry,
        }
    }

    /// First page of today's largest KOSPI decliners.
    #[instrument(name = "NaverDeclinersFetch", skip(self))]
    pub async fn fetch_kospi_decliners(&self, count: usize) -> Result<Vec<MarketMover>> {
        if count == 0 {
            return Err(MarketError::InvalidInput(
                "decliner count must be greater than zero".to_string(),
            ));
        }
        let page_size = count.to_string();
        let url = url_with_params(
            &format!("{}/api/stocks/down/KOSPI", self.base_url),
            &[("page", "1"), ("pageSize", page_size.as_str())],
        )?;
        let raw = get_json(&self.client, &url, &self.profile, &self.retry).await?;
        let response: RankingResponse = serde_json::from_value(raw)
            .map_err(|e| MarketError::Schema(format!("KOSPI decliners payload: {e}")))?;

        debug!("Fetched {} KOSPI decliners", response.stocks.len());
        Ok(response.stocks.into_iter().map(MarketMover::from).collect())
    }
}
