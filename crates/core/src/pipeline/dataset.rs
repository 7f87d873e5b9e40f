use crate::domain::features::StockFeatureVector;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Fill value for days-ago columns where a side saw no activity; keeps the
/// exported matrix dense for downstream model training.
const DAYS_AGO_FILL: f64 = -1.0;

/// One labeled training example: a window's feature vector for one ticker
/// plus the realized forward price change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetRow {
    pub ticker: String,
    pub date: NaiveDate,
    pub adjusted_purchase_volume: f64,
    pub estimated_purchase_volume: f64,
    pub purchase_speculation: f64,
    pub purchase_count: u32,
    pub purchase_count_individual: u32,
    pub purchase_days_ago: f64,
    pub purchase_confidence: f64,
    pub adjusted_sale_volume: f64,
    pub estimated_sale_volume: f64,
    pub sale_speculation: f64,
    pub sale_count: u32,
    pub sale_count_individual: u32,
    pub sale_days_ago: f64,
    pub sale_confidence: f64,
    pub volume_net: f64,
    pub score: f64,
    pub price_change: f64,
}

impl DatasetRow {
    pub fn from_vector(vector: &StockFeatureVector, score: f64, price_change: f64) -> Self {
        Self {
            ticker: vector.ticker.clone(),
            date: vector.end_date,
            adjusted_purchase_volume: vector.adjusted_purchase_volume,
            estimated_purchase_volume: vector.estimated_purchase_volume,
            purchase_speculation: vector.purchase_speculation,
            purchase_count: vector.purchase_count,
            purchase_count_individual: vector.purchase_count_individual,
            purchase_days_ago: vector.purchase_days_ago.unwrap_or(DAYS_AGO_FILL),
            purchase_confidence: vector.purchase_confidence,
            adjusted_sale_volume: vector.adjusted_sale_volume,
            estimated_sale_volume: vector.estimated_sale_volume,
            sale_speculation: vector.sale_speculation,
            sale_count: vector.sale_count,
            sale_count_individual: vector.sale_count_individual,
            sale_days_ago: vector.sale_days_ago.unwrap_or(DAYS_AGO_FILL),
            sale_confidence: vector.sale_confidence,
            volume_net: vector.volume_net,
            score,
            price_change,
        }
    }
}

/// Plain CSV write, no transactional guarantees.
pub fn write_csv(path: &Path, rows: &[DatasetRow]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to open dataset file {}", path.display()))?;
    for row in rows {
        writer
            .serialize(row)
            .context("failed to serialize dataset row")?;
    }
    writer.flush().context("failed to flush dataset file")?;
    tracing::info!(rows = rows.len(), path = %path.display(), "labeled dataset written");
    Ok(())
}
