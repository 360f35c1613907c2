use crate::core::error::Result;
use crate::core::normalize::{FieldMap, NAVER_EXCHANGE_RATE, NAVER_FUTURES, normalize};
use crate::core::provider::{IndexSeriesProvider, MarketIndex};
use crate::core::series::TimeSeries;
use crate::providers::util::{RequestProfile, RetryPolicy, get_json, url_with_params};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, instrument};

/// Query parameters of `front-api/chart/pricesByPeriod` for one index.
struct ChartQuery {
    reuters_code: &'static str,
    category: &'static str,
    chart_info_type: &'static str,
    script_chart_type: &'static str,
    fields: FieldMap,
}

fn chart_query(index: MarketIndex) -> ChartQuery {
    match index {
        MarketIndex::UsdKrw => ChartQuery {
            reuters_code: "FX_USDKRW",
            category: "exchange",
            chart_info_type: "marketindex",
            script_chart_type: "areaMonthThree",
            fields: NAVER_EXCHANGE_RATE,
        },
        MarketIndex::Gold => ChartQuery {
            reuters_code: "GCcv1",
            category: "metals",
            chart_info_type: "futures",
            script_chart_type: "candleDay",
            fields: NAVER_FUTURES,
        },
    }
}

/// Recent index history from the Naver mobile site. The window is fixed by
/// the chart type (roughly three months) and cannot be requested directly.
pub struct NaverIndexProvider {
    base_url: String,
    client: Client,
    profile: RequestProfile,
    retry: RetryPolicy,
}

impl NaverIndexProvider {
    pub fn new(base_url: &str, client: Client, retry: RetryPolicy) -> Self {
        NaverIndexProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            profile: RequestProfile::naver(),
            retry,
        }
    }

    pub fn index_url(&self, index: MarketIndex) -> Result<String> {
        let query = chart_query(index);
        url_with_params(
            &format!("{}/front-api/chart/pricesByPeriod", self.base_url),
            &[
                ("reutersCode", query.reuters_code),
                ("category", query.category),
                ("chartInfoType", query.chart_info_type),
                ("scriptChartType", query.script_chart_type),
            ],
        )
    }

    #[instrument(name = "NaverIndexFetch", skip(self), fields(index = %index))]
    pub async fn fetch_raw(&self, index: MarketIndex) -> Result<Value> {
        let url = self.index_url(index)?;
        get_json(&self.client, &url, &self.profile, &self.retry).await
    }
}

#[async_trait]
impl IndexSeriesProvider for NaverIndexProvider {
    async fn fetch_index(&self, index: MarketIndex) -> Result<TimeSeries> {
        let raw = self.fetch_raw(index).await?;
        let series = normalize(&raw, &chart_query(index).fields)?;
        debug!(
            "Naver returned {} {} points ({:?} to {:?})",
            series.len(),
            index,
            series.first_date(),
            series.last_date()
        );
        Ok(series)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::MarketError;
    use chrono::NaiveDate;
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(base_url: &str) -> NaverIndexProvider {
        NaverIndexProvider::new(
            base_url,
            Client::new(),
            RetryPolicy::new(2, Duration::from_millis(5)),
        )
    }

    #[tokio::test]
    async fn test_fetch_exchange_rate() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/front-api/chart/pricesByPeriod"))
            .and(query_param("reutersCode", "FX_USDKRW"))
            .and(query_param("category", "exchange"))
            .and(query_param("chartInfoType", "marketindex"))
            .and(query_param("scriptChartType", "areaMonthThree"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"isSuccess": true, "result": {"priceInfos": [
                    {"localDate": "20240103", "closePrice": "1,310.50", "highPrice": "1,312.00", "lowPrice": "1,301.00"},
                    {"localDate": "20240102", "closePrice": "1,300.00", "highPrice": "1,305.00", "lowPrice": "1,296.40"}
                ]}}"#,
            ))
            .mount(&mock_server)
            .await;

        let series = provider(&mock_server.uri())
            .fetch_index(MarketIndex::UsdKrw)
            .await
            .unwrap();

        assert_eq!(series.closes().unwrap(), vec![1300.0, 1310.5]);
        let first = series.points()[0];
        assert_eq!(first.date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(first.open, None);
        assert_eq!(first.low, Some(1296.4));
    }

    #[tokio::test]
    async fn test_fetch_gold_includes_open() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/front-api/chart/pricesByPeriod"))
            .and(query_param("reutersCode", "GCcv1"))
            .and(query_param("scriptChartType", "candleDay"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"result": {"priceInfos": [
                    {"localDate": "20240102", "openPrice": "2,071.8", "closePrice": "2,073.9",
                     "highPrice": "2,088.5", "lowPrice": "2,066.3"}
                ]}}"#,
            ))
            .mount(&mock_server)
            .await;

        let series = provider(&mock_server.uri())
            .fetch_index(MarketIndex::Gold)
            .await
            .unwrap();
        assert_eq!(series.points()[0].open, Some(2071.8));
    }

    #[tokio::test]
    async fn test_failed_lookup_is_schema_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/front-api/chart/pricesByPeriod"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"isSuccess": false, "detailCode": "NOT_FOUND"}"#),
            )
            .mount(&mock_server)
            .await;

        let err = provider(&mock_server.uri())
            .fetch_index(MarketIndex::Gold)
            .await
            .unwrap_err();
        assert!(matches!(err, MarketError::Schema(_)));
    }
}
