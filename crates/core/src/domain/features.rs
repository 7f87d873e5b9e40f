use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Raw per-ticker aggregate over one trailing analysis window.
///
/// Volumes are sums: `adjusted_*` sums the per-filer-scaled [1,2] values,
/// `estimated_*` sums disclosed value-range midpoints in dollars. Days-ago
/// fields are means relative to the window's end date and are `None` when
/// that side saw no activity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockFeatureVector {
    pub ticker: String,
    pub end_date: NaiveDate,

    pub adjusted_purchase_volume: f64,
    pub estimated_purchase_volume: f64,
    pub purchase_speculation: f64,
    pub purchase_count: u32,
    pub purchase_count_individual: u32,
    pub purchase_days_ago: Option<f64>,
    pub purchase_confidence: f64,
    pub purchase_owners: BTreeSet<String>,

    pub adjusted_sale_volume: f64,
    pub estimated_sale_volume: f64,
    pub sale_speculation: f64,
    pub sale_count: u32,
    pub sale_count_individual: u32,
    pub sale_days_ago: Option<f64>,
    pub sale_confidence: f64,
    pub sale_owners: BTreeSet<String>,

    pub volume_net: f64,
}

impl StockFeatureVector {
    pub fn new(ticker: String, end_date: NaiveDate) -> Self {
        Self {
            ticker,
            end_date,
            adjusted_purchase_volume: 0.0,
            estimated_purchase_volume: 0.0,
            purchase_speculation: 0.0,
            purchase_count: 0,
            purchase_count_individual: 0,
            purchase_days_ago: None,
            purchase_confidence: 0.0,
            purchase_owners: BTreeSet::new(),
            adjusted_sale_volume: 0.0,
            estimated_sale_volume: 0.0,
            sale_speculation: 0.0,
            sale_count: 0,
            sale_count_individual: 0,
            sale_days_ago: None,
            sale_confidence: 0.0,
            sale_owners: BTreeSet::new(),
            volume_net: 0.0,
        }
    }
}

/// Batch-normalized view of a feature vector, ready for scoring.
///
/// Counts, speculation, and days-ago are min-max scaled into [0,1] across
/// the batch (days-ago inverted so recent activity scores higher). Adjusted
/// volumes and confidences pass through unscaled: the former are already on
/// the per-filer [1,2] scale, the latter are ledger outputs.
#[derive(Debug, Clone)]
pub struct NormalizedFeatures {
    pub adjusted_purchase_volume: f64,
    pub purchase_speculation: f64,
    pub purchase_count: f64,
    pub purchase_count_individual: f64,
    pub purchase_days_ago: Option<f64>,
    pub purchase_confidence: f64,

    pub adjusted_sale_volume: f64,
    pub sale_speculation: f64,
    pub sale_count: f64,
    pub sale_count_individual: f64,
    pub sale_days_ago: Option<f64>,
    pub sale_confidence: f64,
}
