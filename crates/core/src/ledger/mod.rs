use crate::domain::disclosure::{AssetCode, DisclosureRecord, OptionType, Transaction};
use crate::prices::history::{round2, StockHistory};
use crate::time::us_market;
use chrono::{Duration, NaiveDate};
use std::collections::HashMap;

/// Days a transaction must have matured before its forward return counts
/// toward a filer's track record. Deliberately distinct from the 365-day
/// labeling horizon used by the training dataset.
pub const MATURATION_DAYS: i64 = 360;

/// Linear confidence dampener for filers with few qualifying observations.
pub fn significance(samples: usize) -> f64 {
    (samples as f64 / 10.0).min(1.0)
}

/// A filer's confidence in each direction. `purchase` high means their buys
/// tend to precede gains; `sale` high means their sells tend to precede
/// losses avoided.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraderConfidence {
    pub purchase: f64,
    pub sale: f64,
}

#[derive(Debug, Clone, Default)]
pub struct TraderRecord {
    pub name: String,
    pub purchase_gains: Vec<f64>,
    pub sale_gains: Vec<f64>,
    pub purchase_score: f64,
    pub sale_score: f64,
}

/// Per-filer historical performance, rebuilt from scratch for each analysis
/// run over the disclosures at or before the run's as-of date.
pub struct TraderLedger {
    traders: HashMap<String, TraderRecord>,
}

impl TraderLedger {
    /// Builds the ledger. `today` is wall-clock time: maturation is judged
    /// against it, not against the as-of cutoff the caller already applied.
    pub async fn build(
        disclosures: &[DisclosureRecord],
        history: &mut StockHistory,
        today: NaiveDate,
    ) -> Self {
        let mut traders: HashMap<String, TraderRecord> = HashMap::new();

        // Every named filer gets an entry even when none of their trades
        // qualify yet; absent-from-ledger is reserved for unknown names.
        for disclosure in disclosures {
            if let Some(name) = disclosure.filer_name() {
                traders
                    .entry(name.clone())
                    .or_insert_with(|| TraderRecord {
                        name,
                        ..Default::default()
                    });
            }
        }

        for disclosure in disclosures {
            let Some(name) = disclosure.filer_name() else {
                continue;
            };
            let Some(gain) = forward_gain(disclosure, history, today).await else {
                continue;
            };
            let Some(record) = traders.get_mut(&name) else {
                continue;
            };

            match directional_return(disclosure, gain) {
                Some(DirectionalReturn::Purchase(g)) => record.purchase_gains.push(g),
                Some(DirectionalReturn::Sale(g)) => record.sale_gains.push(g),
                None => {}
            }
        }

        for record in traders.values_mut() {
            record.purchase_score = dampened_mean(&record.purchase_gains);
            record.sale_score = dampened_mean(&record.sale_gains);
        }

        tracing::debug!(traders = traders.len(), "trader ledger built");
        Self { traders }
    }

    /// None means the filer has no ledger entry at all; callers apply zero
    /// confidence rather than treating it as an error.
    pub fn trader_performance(&self, name: &str) -> Option<TraderConfidence> {
        let record = self.traders.get(name)?;
        Some(TraderConfidence {
            purchase: record.purchase_score,
            sale: record.sale_score,
        })
    }

    /// Filers ranked by purchase-direction skill, best first.
    pub fn ranked_buyers(&self) -> Vec<&TraderRecord> {
        let mut out: Vec<&TraderRecord> = self.traders.values().collect();
        out.sort_by(|a, b| b.purchase_score.total_cmp(&a.purchase_score));
        out
    }

    /// Filers ranked by sale-direction skill, best first.
    pub fn ranked_sellers(&self) -> Vec<&TraderRecord> {
        let mut out: Vec<&TraderRecord> = self.traders.values().collect();
        out.sort_by(|a, b| b.sale_score.total_cmp(&a.sale_score));
        out
    }

    pub fn len(&self) -> usize {
        self.traders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.traders.is_empty()
    }
}

enum DirectionalReturn {
    Purchase(f64),
    Sale(f64),
}

/// Reclassifies a raw forward gain into a purchase- or sale-direction
/// realized return. A correct sale or a correct put avoids a future loss,
/// so those directions credit `1 - gain`.
fn directional_return(disclosure: &DisclosureRecord, gain: f64) -> Option<DirectionalReturn> {
    match (disclosure.transaction?, disclosure.asset_code?) {
        (Transaction::Purchase, AssetCode::Stock) => Some(DirectionalReturn::Purchase(gain)),
        (Transaction::Sale, AssetCode::Stock) => Some(DirectionalReturn::Sale(1.0 - gain)),
        (Transaction::Purchase, AssetCode::StockOption) => match disclosure.option_type? {
            OptionType::Call => Some(DirectionalReturn::Purchase(gain)),
            OptionType::Put => Some(DirectionalReturn::Sale(1.0 - gain)),
            OptionType::Short => None,
        },
        (Transaction::Sale, AssetCode::StockOption) => match disclosure.option_type? {
            OptionType::Put => Some(DirectionalReturn::Purchase(gain)),
            OptionType::Call => Some(DirectionalReturn::Sale(1.0 - gain)),
            OptionType::Short => None,
        },
        (_, AssetCode::Other) => None,
    }
}

/// Forward 1-year gain ratio for one disclosure, or None when the trade has
/// not matured, lacks a price basis, or the future close is unavailable.
async fn forward_gain(
    disclosure: &DisclosureRecord,
    history: &mut StockHistory,
    today: NaiveDate,
) -> Option<f64> {
    let ticker = disclosure.ticker.as_deref()?;
    let transaction_date = disclosure.transaction_date?;
    let basis = disclosure.stock_price.filter(|p| *p > 0.0)?;

    if (today - transaction_date).num_days() < MATURATION_DAYS {
        return None;
    }

    let future_date = us_market::nearest_weekday(transaction_date + Duration::days(MATURATION_DAYS));
    let future_price = history.price(ticker, future_date).await?;
    Some(round2(future_price / basis))
}

fn dampened_mean(gains: &[f64]) -> f64 {
    if gains.is_empty() {
        return 0.0;
    }
    let mean = gains.iter().sum::<f64>() / gains.len() as f64;
    mean * significance(gains.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prices::provider::PriceProvider;
    use crate::prices::types::PricePoint;
    use anyhow::Result;

    struct FlatProvider {
        close: f64,
    }

    #[async_trait::async_trait]
    impl PriceProvider for FlatProvider {
        fn provider_name(&self) -> &'static str {
            "flat"
        }

        async fn fetch_daily_closes(
            &self,
            _ticker: &str,
            start_date: NaiveDate,
            end_date: NaiveDate,
        ) -> Result<Vec<PricePoint>> {
            let mut out = Vec::new();
            let mut date = start_date;
            while date <= end_date {
                if !us_market::is_weekend(date) {
                    out.push(PricePoint {
                        date,
                        close: self.close,
                    });
                }
                date += Duration::days(1);
            }
            Ok(out)
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn history(close: f64) -> StockHistory {
        StockHistory::new(
            Box::new(FlatProvider { close }),
            date(2012, 1, 1),
            date(2026, 1, 1),
        )
    }

    fn stock_disclosure(
        name: &str,
        transaction: Transaction,
        transaction_date: NaiveDate,
        stock_price: f64,
    ) -> DisclosureRecord {
        DisclosureRecord {
            transaction: Some(transaction),
            ticker: Some("AAPL".to_string()),
            transaction_date: Some(transaction_date),
            asset_code: Some(AssetCode::Stock),
            stock_price: Some(stock_price),
            first_name: Some(name.to_string()),
            last_name: Some("Doe".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn significance_dampening() {
        assert_eq!(significance(0), 0.0);
        assert_eq!(significance(5), 0.5);
        assert_eq!(significance(10), 1.0);
        assert_eq!(significance(25), 1.0);
    }

    #[tokio::test]
    async fn purchase_gain_counts_toward_purchase_score() {
        // Future close 120 against a basis of 100: gain ratio 1.2.
        let mut history = history(120.0);
        let today = date(2024, 6, 3);
        let disclosures = vec![stock_disclosure(
            "Jane",
            Transaction::Purchase,
            date(2023, 1, 10),
            100.0,
        )];

        let ledger = TraderLedger::build(&disclosures, &mut history, today).await;
        let perf = ledger.trader_performance("Jane Doe").unwrap();
        // One sample: mean 1.2 dampened by significance 0.1.
        assert!((perf.purchase - 0.12).abs() < 1e-9);
        assert_eq!(perf.sale, 0.0);
    }

    #[tokio::test]
    async fn sale_gain_is_inverted() {
        // Future close 80 against a basis of 100: gain 0.8, sale return 0.2.
        let mut history = history(80.0);
        let today = date(2024, 6, 3);
        let disclosures = vec![stock_disclosure(
            "Jane",
            Transaction::Sale,
            date(2023, 1, 10),
            100.0,
        )];

        let ledger = TraderLedger::build(&disclosures, &mut history, today).await;
        let perf = ledger.trader_performance("Jane Doe").unwrap();
        assert_eq!(perf.purchase, 0.0);
        assert!((perf.sale - 0.02).abs() < 1e-9);
    }

    #[tokio::test]
    async fn put_purchase_counts_as_sale_direction() {
        let mut history = history(80.0);
        let today = date(2024, 6, 3);
        let mut disclosure =
            stock_disclosure("Jane", Transaction::Purchase, date(2023, 1, 10), 100.0);
        disclosure.asset_code = Some(AssetCode::StockOption);
        disclosure.option_type = Some(OptionType::Put);

        let ledger = TraderLedger::build(&[disclosure], &mut history, today).await;
        let perf = ledger.trader_performance("Jane Doe").unwrap();
        assert_eq!(perf.purchase, 0.0);
        assert!((perf.sale - 0.02).abs() < 1e-9);
    }

    #[tokio::test]
    async fn immature_trades_are_excluded() {
        let mut history = history(120.0);
        let today = date(2024, 6, 3);
        // Only ~150 days old at `today`.
        let disclosures = vec![stock_disclosure(
            "Jane",
            Transaction::Purchase,
            date(2024, 1, 5),
            100.0,
        )];

        let ledger = TraderLedger::build(&disclosures, &mut history, today).await;
        let perf = ledger.trader_performance("Jane Doe").unwrap();
        assert_eq!(perf.purchase, 0.0);
        assert_eq!(perf.sale, 0.0);
    }

    #[tokio::test]
    async fn unknown_filer_has_no_entry() {
        let mut history = history(120.0);
        let ledger = TraderLedger::build(&[], &mut history, date(2024, 6, 3)).await;
        assert!(ledger.trader_performance("Nobody Known").is_none());
    }

    #[tokio::test]
    async fn five_samples_are_half_dampened() {
        let mut history = history(110.0);
        let today = date(2024, 6, 3);
        let disclosures: Vec<DisclosureRecord> = (0..5)
            .map(|i| {
                stock_disclosure(
                    "Jane",
                    Transaction::Purchase,
                    date(2023, 1, 2) + Duration::days(i * 7),
                    100.0,
                )
            })
            .collect();

        let ledger = TraderLedger::build(&disclosures, &mut history, today).await;
        let perf = ledger.trader_performance("Jane Doe").unwrap();
        // Mean gain 1.1 dampened by significance 0.5.
        assert!((perf.purchase - 0.55).abs() < 1e-9);
    }
}
