use crate::core::error::{MarketError, Result};
use crate::core::statements::FinancialStatementTable;
use crate::providers::naver_chart::is_domestic_symbol;
use crate::providers::util::{RequestProfile, RetryPolicy, get_json};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, instrument};

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct FinanceInfo {
    tr_title_list: Vec<PeriodTitle>,
    row_list: Vec<FinanceRow>,
}

#[derive(Deserialize, Debug)]
struct PeriodTitle {
    key: String,
    title: String,
}

#[derive(Deserialize, Debug)]
struct FinanceRow {
    title: String,
    #[serde(default)]
    columns: HashMap<String, FinanceCell>,
}

#[derive(Deserialize, Debug)]
struct FinanceCell {
    #[serde(default)]
    value: Value,
}

fn cell_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Annual statement summaries. Korean listings come from the mobile site, where
/// the payload is wrapped in `financeInfo`; foreign tickers from the API host.
pub struct NaverFinanceProvider {
    api_base_url: String,
    mobile_base_url: String,
    client: Client,
    profile: RequestProfile,
    retry: RetryPolicy,
}

impl NaverFinanceProvider {
    pub fn new(
        api_base_url: &str,
        mobile_base_url: &str,
        client: Client,
        retry: RetryPolicy,
    ) -> Self {
        NaverFinanceProvider {
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            mobile_base_url: mobile_base_url.trim_end_matches('/').to_string(),
            client,
            profile: RequestProfile::naver(),
            retry,
        }
    }

    pub fn annual_url(&self, code: &str) -> String {
        if is_domestic_symbol(code) {
            format!("{}/api/stock/{}/finance/annual", self.mobile_base_url, code)
        } else {
            format!("{}/stock/{}/finance/annual", self.api_base_url, code)
        }
    }

    #[instrument(name = "NaverFinanceFetch", skip(self), fields(code = %code))]
    pub async fn fetch_annual(&self, code: &str) -> Result<FinancialStatementTable> {
        if code.trim().is_empty() {
            return Err(MarketError::InvalidInput("empty item code".to_string()));
        }
        let url = self.annual_url(code);
        let raw = get_json(&self.client, &url, &self.profile, &self.retry).await?;
        let domestic = is_domestic_symbol(code);
        let table = parse_statements(raw, domestic)?;
        debug!(
            "Parsed {} line items over {} periods for {}",
            table.rows().len(),
            table.periods().len(),
            code
        );
        Ok(table)
    }
}

/// Periods follow `trTitleList`; domestic tables are flipped so the order is
/// the reverse of what the vendor sent.
fn parse_statements(mut raw: Value, domestic: bool) -> Result<FinancialStatementTable> {
    let body = if domestic {
        raw.get_mut("financeInfo")
            .map(Value::take)
            .ok_or_else(|| MarketError::Schema("'financeInfo' not found in payload".to_string()))?
    } else {
        raw
    };
    let info: FinanceInfo = serde_json::from_value(body)
        .map_err(|e| MarketError::Schema(format!("financial statement payload: {e}")))?;

    let mut table = FinancialStatementTable::new(
        info.tr_title_list.iter().map(|p| p.title.clone()).collect(),
    );
    for row in info.row_list {
        let values = info
            .tr_title_list
            .iter()
            .map(|p| row.columns.get(&p.key).and_then(|c| cell_text(&c.value)))
            .collect();
        table.push_row(row.title, values);
    }

    Ok(if domestic { table.reversed() } else { table })
}
