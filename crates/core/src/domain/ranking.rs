use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One ranked ticker as reported to callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedStock {
    pub ticker: String,
    pub score: f64,
    pub purchase_confidence: f64,
    pub sale_confidence: f64,
    pub estimated_purchase_volume: f64,
    pub estimated_sale_volume: f64,
    pub purchase_owners: BTreeSet<String>,
    pub sale_owners: BTreeSet<String>,
}

/// Result of a single-window ranking run: strongest buy signals first in
/// `buys`, strongest sell signals first in `sells`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingReport {
    pub end_date: NaiveDate,
    pub buys: Vec<RankedStock>,
    pub sells: Vec<RankedStock>,
}
