use crate::core::error::{MarketError, Result};
use crate::core::normalize::parse_number_text;
use crate::providers::util::{RequestProfile, RetryPolicy, get_json, url_with_params};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// One listing from the Nasdaq stock screener. Numbers keep the vendor's
/// formatting (`"$182.52"`, `"-0.295%"`); use the accessors for values.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ScreenerRow {
    pub symbol: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "lastsale", default)]
    pub last_sale: String,
    #[serde(rename = "netchange", default)]
    pub net_change: String,
    #[serde(rename = "pctchange", default)]
    pub percent_change: String,
    #[serde(rename = "marketCap", default)]
    pub market_cap: String,
    #[serde(default)]
    pub country: String,
    #[serde(rename = "ipoyear", default)]
    pub ipo_year: String,
    #[serde(default)]
    pub volume: String,
    #[serde(default)]
    pub sector: String,
    #[serde(default)]
    pub industry: String,
}

impl ScreenerRow {
    pub fn last_sale_value(&self) -> Option<f64> {
        parse_number_text(&self.last_sale)
    }

    pub fn percent_change_value(&self) -> Option<f64> {
        parse_number_text(&self.percent_change)
    }

    pub fn market_cap_value(&self) -> Option<f64> {
        parse_number_text(&self.market_cap)
    }
}

#[derive(Deserialize, Debug)]
struct ScreenerResponse {
    data: Option<ScreenerData>,
}

#[derive(Deserialize, Debug)]
struct ScreenerData {
    rows: Vec<ScreenerRow>,
}

pub struct NasdaqScreenerProvider {
    base_url: String,
    client: Client,
    profile: RequestProfile,
    retry: RetryPolicy,
}

impl NasdaqScreenerProvider {
    pub fn new(base_url: &str, client: Client, retry: RetryPolicy) -> Self {
        NasdaqScreenerProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            profile: RequestProfile::nasdaq(),
            retry,
        }
    }

    /// The full screener, optionally narrowed to one ticker (matched upper-cased).
    #[instrument(name = "NasdaqScreenerFetch", skip(self))]
    pub async fn fetch_listing(&self, symbol: Option<&str>) -> Result<Vec<ScreenerRow>> {
        let url = url_with_params(
            &format!("{}/api/screener/stocks", self.base_url),
            &[
                ("tableonly", "true"),
                ("limit", "0"),
                ("offset", "0"),
                ("download", "true"),
            ],
        )?;
        let raw = get_json(&self.client, &url, &self.profile, &self.retry).await?;
        let response: ScreenerResponse = serde_json::from_value(raw)
            .map_err(|e| MarketError::Schema(format!("Nasdaq screener payload: {e}")))?;
        let rows = response
            .data
            .ok_or_else(|| MarketError::Schema("Nasdaq screener returned no data".to_string()))?
            .rows;
        debug!("Nasdaq screener returned {} rows", rows.len());

        Ok(match symbol {
            Some(code) => {
                let code = code.trim().to_uppercase();
                rows.into_iter().filter(|r| r.symbol == code).collect()
            }
            None => rows,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SCREENER: &str = r#"{
        "data": {
            "headers": {"symbol": "Symbol", "name": "Name"},
            "rows": [
                {"symbol": "AAPL", "name": "Apple Inc. Common Stock", "lastsale": "$182.52",
                 "netchange": "-0.54", "pctchange": "-0.295%", "marketCap": "2,822,066,000,000",
                 "country": "United States", "ipoyear": "1980", "volume": "51190451",
                 "sector": "Technology", "industry": "Computer Manufacturing",
                 "url": "/market-activity/stocks/aapl"},
                {"symbol": "MSFT", "name": "Microsoft Corporation Common Stock", "lastsale": "$415.50",
                 "netchange": "2.10", "pctchange": "0.508%", "marketCap": "3,088,000,000,000",
                 "country": "United States", "ipoyear": "1986", "volume": "20101000",
                 "sector": "Technology", "industry": "Computer Software: Prepackaged Software",
                 "url": "/market-activity/stocks/msft"}
            ]
        },
        "message": null,
        "status": {"rCode": 200}
    }"#;

    async fn create_mock_server(body: &str) -> MockServer {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/screener/stocks"))
            .and(query_param("tableonly", "true"))
            .and(query_param("download", "true"))
            .and(header("origin", "https://www.nasdaq.com"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&mock_server)
            .await;
        mock_server
    }

    fn provider(base_url: &str) -> NasdaqScreenerProvider {
        NasdaqScreenerProvider::new(base_url, Client::new(), RetryPolicy::single())
    }

    #[tokio::test]
    async fn test_fetch_full_listing() {
        let mock_server = create_mock_server(SCREENER).await;
        let rows = provider(&mock_server.uri()).fetch_listing(None).await.unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].symbol, "AAPL");
        assert_eq!(rows[0].last_sale_value(), Some(182.52));
        assert_eq!(rows[0].percent_change_value(), Some(-0.295));
        assert_eq!(rows[1].market_cap_value(), Some(3_088_000_000_000.0));
    }

    #[tokio::test]
    async fn test_filter_is_case_insensitive() {
        let mock_server = create_mock_server(SCREENER).await;
        let rows = provider(&mock_server.uri())
            .fetch_listing(Some("msft"))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].ipo_year, "1986");

        let none = provider(&mock_server.uri())
            .fetch_listing(Some("ZZZZ"))
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_missing_data_is_schema_error() {
        let mock_server = create_mock_server(r#"{"data": null, "message": "blocked"}"#).await;
        let err = provider(&mock_server.uri())
            .fetch_listing(None)
            .await
            .unwrap_err();
        assert!(matches!(err, MarketError::Schema(_)));
    }
}
