pub mod dataset;

use crate::analysis::{aggregate, normalize, score};
use crate::domain::disclosure::DisclosureRecord;
use crate::domain::features::StockFeatureVector;
use crate::domain::ranking::{RankedStock, RankingReport};
use crate::ledger::TraderLedger;
use crate::prices::history::{round2, StockHistory};
use crate::prices::provider::PriceProvider;
use anyhow::Result;
use chrono::{Duration, NaiveDate};
use self::dataset::DatasetRow;
use std::path::Path;

/// Forward horizon for the training label. Kept distinct from the ledger's
/// 360-day maturation constant on purpose.
pub const LABEL_HORIZON_DAYS: i64 = 365;

/// How far the sliding end date advances between training windows.
pub const TRAIN_STEP_DAYS: i64 = 60;

/// Training windows stop this many days short of today so every window's
/// forward label can resolve.
pub const TRAIN_CUTOFF_DAYS: i64 = 372;

/// Earliest date the price cache fetches series from.
const HISTORY_START: (i32, u32, u32) = (2012, 1, 1);

/// Drives the full analysis: ledger, aggregation, normalization, scoring,
/// ranking. Owns the session price cache so both the ledger and the labeler
/// share one set of fetched series.
pub struct RankingEngine {
    history: StockHistory,
    today: NaiveDate,
}

impl RankingEngine {
    /// `today` is wall-clock "now"; it bounds the price fetch range, ledger
    /// maturation, and the training cutoff.
    pub fn new(provider: Box<dyn PriceProvider>, today: NaiveDate) -> Self {
        let (y, m, d) = HISTORY_START;
        let start = NaiveDate::from_ymd_opt(y, m, d).unwrap_or(today);
        Self {
            history: StockHistory::new(provider, start, today),
            today,
        }
    }

    /// Single-window scoring: ranked buy and sell lists for the trailing
    /// window ending at `end_date`.
    pub async fn run(
        &mut self,
        disclosures: &[DisclosureRecord],
        end_date: NaiveDate,
        top_n: usize,
    ) -> Result<RankingReport> {
        let scored = self.analyze(disclosures, end_date).await;

        let mut by_score = scored;
        by_score.sort_by(|a, b| b.1.total_cmp(&a.1));

        let buys = by_score.iter().take(top_n).map(ranked_stock).collect();
        let sells = by_score.iter().rev().take(top_n).map(ranked_stock).collect();

        Ok(RankingReport {
            end_date,
            buys,
            sells,
        })
    }

    /// Sliding-window backtest emitting one labeled CSV dataset. Windows
    /// advance in fixed steps from `start_date` until labels can no longer
    /// mature; rows without a resolvable current and future price are
    /// dropped. Returns the number of rows written.
    pub async fn train(
        &mut self,
        disclosures: &[DisclosureRecord],
        start_date: NaiveDate,
        out_path: &Path,
    ) -> Result<usize> {
        let cutoff = self.today - Duration::days(TRAIN_CUTOFF_DAYS);
        let mut rows: Vec<DatasetRow> = Vec::new();

        let mut end_date = start_date;
        while end_date < cutoff {
            tracing::info!(%end_date, "collecting training window");
            let scored = self.analyze(disclosures, end_date).await;

            for (vector, score) in &scored {
                let Some(current) = self.history.price(&vector.ticker, end_date).await else {
                    continue;
                };
                let future_date = end_date + Duration::days(LABEL_HORIZON_DAYS);
                let Some(future) = self.history.price(&vector.ticker, future_date).await else {
                    continue;
                };
                let price_change = round2(future / current);
                rows.push(DatasetRow::from_vector(vector, *score, price_change));
            }

            end_date += Duration::days(TRAIN_STEP_DAYS);
        }

        dataset::write_csv(out_path, &rows)?;
        Ok(rows.len())
    }

    /// The core sequence for one window. The ledger is fully built from
    /// every disclosure at or before `end_date` before aggregation reads
    /// confidence from it.
    async fn analyze(
        &mut self,
        disclosures: &[DisclosureRecord],
        end_date: NaiveDate,
    ) -> Vec<(StockFeatureVector, f64)> {
        let cutoff: Vec<DisclosureRecord> = disclosures
            .iter()
            .filter(|d| d.transaction_date.is_some_and(|t| t <= end_date))
            .cloned()
            .collect();

        let ledger = TraderLedger::build(&cutoff, &mut self.history, self.today).await;
        if let Some(best) = ledger.ranked_buyers().first() {
            tracing::debug!(
                name = %best.name,
                purchase_score = best.purchase_score,
                "highest-confidence buyer for window"
            );
        }

        let adjusted = normalize::filer_adjusted_values(&cutoff);
        let vectors = aggregate::aggregate(&cutoff, &adjusted, &ledger, end_date);
        let normalized = score::normalize_batch(&vectors);

        vectors
            .into_iter()
            .zip(normalized.iter().map(score::calculate_score))
            .collect()
    }
}

fn ranked_stock((vector, score): &(StockFeatureVector, f64)) -> RankedStock {
    RankedStock {
        ticker: vector.ticker.clone(),
        score: *score,
        purchase_confidence: vector.purchase_confidence,
        sale_confidence: vector.sale_confidence,
        estimated_purchase_volume: vector.estimated_purchase_volume,
        estimated_sale_volume: vector.estimated_sale_volume,
        purchase_owners: vector.purchase_owners.clone(),
        sale_owners: vector.sale_owners.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::disclosure::{AssetCode, Transaction};
    use crate::prices::types::PricePoint;
    use crate::time::us_market;

    struct RampProvider;

    #[async_trait::async_trait]
    impl PriceProvider for RampProvider {
        fn provider_name(&self) -> &'static str {
            "ramp"
        }

        // Close drifts upward over time so forward labels are > 1.
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
                    let days = (date - start_date).num_days() as f64;
                    out.push(PricePoint {
                        date,
                        close: 100.0 + days * 0.01,
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

    fn stock(
        ticker: &str,
        first: &str,
        transaction: Transaction,
        transaction_date: NaiveDate,
        low: f64,
        high: f64,
    ) -> DisclosureRecord {
        DisclosureRecord {
            transaction: Some(transaction),
            ticker: Some(ticker.to_string()),
            transaction_date: Some(transaction_date),
            asset_code: Some(AssetCode::Stock),
            asset_value_low: Some(low),
            asset_value_high: Some(high),
            stock_price: Some(100.0),
            first_name: Some(first.to_string()),
            last_name: Some("Doe".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn run_ranks_buys_and_sells() {
        let today = date(2024, 6, 3);
        let mut engine = RankingEngine::new(Box::new(RampProvider), today);

        let end_date = date(2024, 3, 1);
        let disclosures = vec![
            // Old matured trades seed the ledger: the market drifts upward,
            // so Jane's buy record earns positive purchase confidence.
            stock("AAPL", "Jane", Transaction::Purchase, date(2022, 3, 1), 1_001.0, 15_000.0),
            stock("MSFT", "John", Transaction::Sale, date(2022, 3, 1), 1_001.0, 15_000.0),
            // Window activity: fresh buys on AAPL, an older buy and a sale
            // on MSFT (distinct days-ago keep normalization non-degenerate).
            stock("AAPL", "Jane", Transaction::Purchase, date(2024, 2, 25), 15_001.0, 50_000.0),
            stock("AAPL", "John", Transaction::Purchase, date(2024, 2, 25), 1_001.0, 15_000.0),
            stock("MSFT", "Jane", Transaction::Purchase, date(2023, 12, 1), 1_001.0, 15_000.0),
            stock("MSFT", "John", Transaction::Sale, date(2024, 2, 20), 15_001.0, 50_000.0),
        ];

        let report = engine.run(&disclosures, end_date, 5).await.unwrap();
        assert_eq!(report.end_date, end_date);
        assert_eq!(report.buys.len(), 2);
        assert_eq!(report.sells.len(), 2);

        // Fresh purchase pressure puts AAPL on top of the buy list with a
        // strictly positive score; MSFT heads the sell list.
        assert_eq!(report.buys[0].ticker, "AAPL");
        assert!(report.buys[0].score > 0.0);
        assert_eq!(report.sells[0].ticker, "MSFT");
        assert!(report.buys[0].score >= report.buys[1].score);
        assert!(report.sells[0].score <= report.sells[1].score);
        assert_eq!(report.buys[0].purchase_owners.len(), 2);

        // Scores come out rounded.
        for ranked in report.buys.iter().chain(report.sells.iter()) {
            assert_eq!(ranked.score, round2(ranked.score));
        }
    }

    #[tokio::test]
    async fn train_emits_labeled_rows() {
        let today = date(2024, 6, 3);
        let mut engine = RankingEngine::new(Box::new(RampProvider), today);

        // One qualifying disclosure per training window.
        let disclosures = vec![
            stock("AAPL", "Jane", Transaction::Purchase, date(2022, 12, 15), 1_001.0, 15_000.0),
            stock("AAPL", "Jane", Transaction::Purchase, date(2023, 2, 20), 1_001.0, 15_000.0),
            stock("AAPL", "Jane", Transaction::Purchase, date(2023, 4, 20), 1_001.0, 15_000.0),
        ];

        let out = std::env::temp_dir().join("captrade_train_test.csv");
        let rows = engine
            .train(&disclosures, date(2023, 1, 1), &out)
            .await
            .unwrap();

        // Windows at 2023-01-01, 03-02, 05-01 (cutoff 2023-05-28); each has
        // activity from the trailing 120 days.
        assert_eq!(rows, 3);

        let contents = std::fs::read_to_string(&out).unwrap();
        let mut reader = csv::Reader::from_reader(contents.as_bytes());
        for row in reader.deserialize::<DatasetRow>() {
            let row = row.unwrap();
            assert_eq!(row.ticker, "AAPL");
            // The ramp drifts upward, so every label exceeds 1.
            assert!(row.price_change > 1.0);
        }
        let _ = std::fs::remove_file(&out);
    }
}
