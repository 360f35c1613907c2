use crate::core::error::{MarketError, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use reqwest::{Client, Method};
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/125.0.0.0 Safari/537.36";

/// How many times a request is attempted and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub attempts: usize,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(attempts: usize, delay: Duration) -> Self {
        RetryPolicy {
            attempts: attempts.max(1),
            delay,
        }
    }

    /// One attempt, no retries.
    pub fn single() -> Self {
        Self::new(1, Duration::ZERO)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(2))
    }
}

/// Runs `operation` until it succeeds, fails with a non-retryable error, or
/// the policy's attempts are used up.
pub async fn with_retry<F, Fut, T>(policy: &RetryPolicy, mut operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 1;
    loop {
        match operation().await {
            Ok(val) => return Ok(val),
            Err(err) if err.is_retryable() && attempt < policy.attempts => {
                debug!(
                    "Attempt {}/{} failed: {}. Retrying...",
                    attempt, policy.attempts, err
                );
                attempt += 1;
                tokio::time::sleep(policy.delay).await;
            }
            Err(err) => return Err(err),
        }
    }
}

/// Immutable header set sent with every request to one vendor.
#[derive(Debug, Clone)]
pub struct RequestProfile {
    headers: HeaderMap,
}

impl RequestProfile {
    pub fn from_pairs(pairs: &[(&'static str, &'static str)]) -> Self {
        let mut headers = HeaderMap::new();
        for (name, value) in pairs {
            headers.insert(
                HeaderName::from_static(*name),
                HeaderValue::from_static(*value),
            );
        }
        RequestProfile { headers }
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Identifies the crate itself; enough for Yahoo and Telegram.
    pub fn plain() -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("kmarket/", env!("CARGO_PKG_VERSION"))),
        );
        RequestProfile { headers }
    }

    pub fn naver() -> Self {
        Self::from_pairs(&[
            ("user-agent", BROWSER_USER_AGENT),
            ("accept", "application/json, text/plain, */*"),
            ("accept-language", "ko-KR,ko;q=0.9,en-US;q=0.8,en;q=0.7"),
            ("referer", "https://m.stock.naver.com/"),
        ])
    }

    /// The Nasdaq API rejects requests that do not look like its own web app.
    pub fn nasdaq() -> Self {
        Self::from_pairs(&[
            ("user-agent", BROWSER_USER_AGENT),
            ("authority", "api.nasdaq.com"),
            ("accept", "application/json, text/plain, */*"),
            ("accept-encoding", "gzip, deflate, br, zstd"),
            (
                "accept-language",
                "ko-KR,ko;q=0.9,en-US;q=0.8,en;q=0.7,pl;q=0.6",
            ),
            ("dnt", "1"),
            ("origin", "https://www.nasdaq.com"),
            ("priority", "u=1, i"),
            ("referer", "https://www.nasdaq.com/"),
            (
                "sec-ch-ua",
                "\"Google Chrome\";v=\"125\", \"Chromium\";v=\"125\", \"Not.A/Brand\";v=\"24\"",
            ),
            ("sec-ch-ua-mobile", "?0"),
            ("sec-ch-ua-platform", "\"Windows\""),
            ("sec-fetch-dest", "empty"),
            ("sec-fetch-mode", "cors"),
            ("sec-fetch-site", "same-site"),
        ])
    }
}

pub fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| MarketError::InvalidInput(format!("failed to build HTTP client: {e}")))
}

/// Builds `base?k=v&...`, percent-encoding the values.
pub fn url_with_params(base: &str, params: &[(&str, &str)]) -> Result<String> {
    reqwest::Url::parse_with_params(base, params)
        .map(String::from)
        .map_err(|e| MarketError::InvalidInput(format!("invalid URL '{base}': {e}")))
}

pub async fn get_json(
    client: &Client,
    url: &str,
    profile: &RequestProfile,
    retry: &RetryPolicy,
) -> Result<Value> {
    send_json(client, &Method::GET, url, profile, retry, None, false).await
}

/// Form POST. Unlike [`get_json`], a 4xx response with a JSON body is returned
/// instead of failing, for APIs that explain rejections in the body.
pub async fn post_form_reply(
    client: &Client,
    url: &str,
    profile: &RequestProfile,
    retry: &RetryPolicy,
    form: &[(&str, &str)],
) -> Result<Value> {
    send_json(client, &Method::POST, url, profile, retry, Some(form), true).await
}

/// Only the round trip is retried; a body that fails to decode will not change.
async fn send_json(
    client: &Client,
    method: &Method,
    url: &str,
    profile: &RequestProfile,
    retry: &RetryPolicy,
    form: Option<&[(&str, &str)]>,
    keep_client_errors: bool,
) -> Result<Value> {
    debug!("Requesting {} {}", method, url);

    let (status, body) = with_retry(retry, || async move {
        let mut request = client
            .request(method.clone(), url)
            .headers(profile.headers().clone());
        if let Some(form) = form {
            request = request.form(form);
        }

        let response = request
            .send()
            .await
            .map_err(|e| MarketError::network(url, e))?;

        let status = response.status();
        if !status.is_success() && !(keep_client_errors && status.is_client_error()) {
            return Err(MarketError::network(url, format!("HTTP {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| MarketError::network(url, e))?;
        Ok((status, body))
    })
    .await?;

    match serde_json::from_str(&body) {
        Ok(value) => Ok(value),
        Err(_) if !status.is_success() => {
            Err(MarketError::network(url, format!("HTTP {status}")))
        }
        Err(source) => Err(MarketError::Decode {
            url: url.to_string(),
            source,
        }),
    }
}
