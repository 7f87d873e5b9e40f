use crate::prices::provider::PriceProvider;
use crate::prices::types::PricePoint;
use crate::time::us_market;
use chrono::{Datelike, NaiveDate};
use std::collections::{HashMap, HashSet};

/// Furthest a lookup may resolve from the requested date when the exact
/// trading day is missing from a cached series.
pub const MAX_NEAREST_DAYS: i64 = 14;

/// Tickers that changed symbol or whose filings use a share-class spelling
/// the provider does not accept.
const TICKER_ALIASES: &[(&str, &str)] = &[("FB", "META")];

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Lazily-populated per-ticker daily-close cache with trading-calendar-aware
/// lookups.
///
/// Session-scoped state only grows: a ticker's series is fetched once on
/// first use, and a ticker whose fetch fails or comes back empty is marked
/// invalid for the rest of the session and never retried.
pub struct StockHistory {
    provider: Box<dyn PriceProvider>,
    start_date: NaiveDate,
    end_date: NaiveDate,
    holidays: HashSet<NaiveDate>,
    cache: HashMap<String, Vec<PricePoint>>,
    invalid_tickers: HashSet<String>,
}

impl StockHistory {
    pub fn new(provider: Box<dyn PriceProvider>, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        let holidays = us_market::market_holidays(start_date.year()..=end_date.year());
        Self {
            provider,
            start_date,
            end_date,
            holidays,
            cache: HashMap::new(),
            invalid_tickers: HashSet::new(),
        }
    }

    /// Close for `ticker` on the trading day `date` resolves to, rounded to
    /// 2 decimals. None when the ticker is invalid for the session or no
    /// cached point lies within [`MAX_NEAREST_DAYS`] of the request.
    pub async fn price(&mut self, ticker: &str, date: NaiveDate) -> Option<f64> {
        let ticker = normalize_ticker(ticker);
        if !self.ensure_cached(&ticker).await {
            return None;
        }

        let series = self.cache.get(&ticker)?;
        let target = us_market::to_trading_day(date, &self.holidays);
        nearest_close(series, target).map(round2)
    }

    /// Fetches and memoizes the ticker's full series on first use. Returns
    /// false for tickers already known (or newly discovered) to be invalid.
    async fn ensure_cached(&mut self, ticker: &str) -> bool {
        if self.invalid_tickers.contains(ticker) {
            return false;
        }
        if self.cache.contains_key(ticker) {
            return true;
        }

        let fetched = self
            .provider
            .fetch_daily_closes(ticker, self.start_date, self.end_date)
            .await;

        let mut series = match fetched {
            Ok(series) => series,
            Err(err) => {
                tracing::warn!(ticker, error = %err, "price fetch failed; marking ticker invalid for session");
                self.invalid_tickers.insert(ticker.to_string());
                return false;
            }
        };

        if series.is_empty() {
            tracing::warn!(ticker, "no market data in range; marking ticker invalid for session");
            self.invalid_tickers.insert(ticker.to_string());
            return false;
        }

        series.sort_by_key(|p| p.date);
        self.cache.insert(ticker.to_string(), series);
        true
    }
}

fn normalize_ticker(raw: &str) -> String {
    let upper = raw.trim().to_uppercase();
    for (from, to) in TICKER_ALIASES {
        if upper == *from {
            return (*to).to_string();
        }
    }
    // Share-class spellings like BRK.B are quoted as BRK-B.
    upper.replace('.', "-")
}

/// Exact match on the resolved trading day, else the nearest cached date by
/// binary search, accepted only within [`MAX_NEAREST_DAYS`] calendar days.
fn nearest_close(series: &[PricePoint], target: NaiveDate) -> Option<f64> {
    let idx = series.partition_point(|p| p.date < target);

    let mut best: Option<&PricePoint> = None;
    if idx < series.len() {
        best = Some(&series[idx]);
    }
    if idx > 0 {
        let before = &series[idx - 1];
        best = match best {
            Some(after) => {
                let d_after = (after.date - target).num_days().abs();
                let d_before = (target - before.date).num_days().abs();
                if d_before <= d_after {
                    Some(before)
                } else {
                    Some(after)
                }
            }
            None => Some(before),
        };
    }

    let point = best?;
    if (point.date - target).num_days().abs() > MAX_NEAREST_DAYS {
        return None;
    }
    Some(point.close)
}
