use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One daily close for a ticker's series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

/// Wire shape returned by the HTTP price provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyClosesResponse {
    pub ticker: String,
    pub series: Vec<PricePoint>,
}
