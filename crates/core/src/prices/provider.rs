use crate::config::Settings;
use crate::prices::types::{DailyClosesResponse, PricePoint};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use reqwest::header::{HeaderMap, HeaderValue};
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_PATH: &str = "/v1/daily_closes";
const DEFAULT_RETRIES: u32 = 3;

/// The engine's sole network-shaped dependency: a full daily-close series
/// for one ticker over a date range. Implementations must be injectable so
/// the pipeline can run against fixtures in tests.
#[async_trait::async_trait]
pub trait PriceProvider: Send + Sync {
    fn provider_name(&self) -> &'static str;

    /// Returns the series ordered by date. An empty series means the ticker
    /// has no market data in the range; an error means the fetch itself
    /// failed. Callers treat both as grounds for permanent session-scoped
    /// invalidation.
    async fn fetch_daily_closes(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PricePoint>>;
}

#[derive(Debug, Clone)]
pub struct HttpJsonPriceProvider {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    path: String,
    retries: u32,
}

impl HttpJsonPriceProvider {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let base_url = settings.require_price_provider_base_url()?.to_string();
        let api_key = settings.price_provider_api_key.clone();

        let timeout_secs = std::env::var("PRICE_PROVIDER_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let retries = std::env::var("PRICE_PROVIDER_RETRIES")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(DEFAULT_RETRIES);

        let path = std::env::var("PRICE_PROVIDER_CLOSES_PATH")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_PATH.to_string());

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build price provider http client")?;

        Ok(Self {
            http,
            base_url,
            api_key,
            path,
            retries,
        })
    }

    fn url(&self) -> String {
        let path = if self.path.starts_with('/') {
            self.path.clone()
        } else {
            format!("/{}", self.path)
        };

        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        if let Some(api_key) = &self.api_key {
            headers.insert("x-api-key", HeaderValue::from_str(api_key)?);
        }
        Ok(headers)
    }

    async fn fetch_once(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<DailyClosesResponse> {
        let url = self.url();
        let headers = self.headers()?;

        let res = self
            .http
            .get(url)
            .headers(headers)
            .query(&[
                ("ticker", ticker.to_string()),
                ("start_date", start_date.to_string()),
                ("end_date", end_date.to_string()),
            ])
            .send()
            .await
            .context("price provider request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read provider response")?;

        if !status.is_success() {
            anyhow::bail!("price provider HTTP {status}: {text}");
        }

        let parsed = serde_json::from_str::<DailyClosesResponse>(&text)
            .with_context(|| format!("provider response is not a daily-close series: {text}"))?;
        Ok(parsed)
    }

    fn validate(&self, resp: &DailyClosesResponse, expected_ticker: &str) -> Result<()> {
        anyhow::ensure!(
            resp.ticker.eq_ignore_ascii_case(expected_ticker),
            "provider ticker mismatch: expected {expected_ticker}, got {}",
            resp.ticker
        );
        for point in &resp.series {
            anyhow::ensure!(
                point.close.is_finite() && point.close > 0.0,
                "non-positive close {} for {} on {}",
                point.close,
                resp.ticker,
                point.date
            );
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl PriceProvider for HttpJsonPriceProvider {
    fn provider_name(&self) -> &'static str {
        "external_http_json"
    }

    async fn fetch_daily_closes(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PricePoint>> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match self.fetch_once(ticker, start_date, end_date).await {
                Ok(parsed) => {
                    self.validate(&parsed, ticker)?;
                    return Ok(parsed.series);
                }
                Err(err) => {
                    if attempt >= self.retries {
                        return Err(err);
                    }
                    let backoff = Duration::from_secs(1 << (attempt - 1));
                    tracing::warn!(ticker, attempt, ?backoff, error = %err, "price fetch failed; retrying");
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_expected_series_shape() {
        let v = json!({
            "ticker": "AAPL",
            "series": [
                {"date": "2023-03-01", "close": 145.31},
                {"date": "2023-03-02", "close": 145.91}
            ]
        });

        let parsed: DailyClosesResponse = serde_json::from_value(v).unwrap();
        assert_eq!(parsed.ticker, "AAPL");
        assert_eq!(parsed.series.len(), 2);
        assert_eq!(
            parsed.series[0].date,
            NaiveDate::from_ymd_opt(2023, 3, 1).unwrap()
        );
        assert_eq!(parsed.series[1].close, 145.91);
    }

    #[test]
    fn rejects_non_date_entries_via_deserialize() {
        let v = json!({
            "ticker": "AAPL",
            "series": [{"date": "not-a-date", "close": 145.31}]
        });

        let res = serde_json::from_value::<DailyClosesResponse>(v);
        assert!(res.is_err());
    }
}
