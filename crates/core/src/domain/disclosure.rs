use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Transaction direction as reported on the filing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transaction {
    Purchase,
    Sale,
}

/// Option position type. `Short` appears in raw filings but is not an
/// instrument the analysis supports; such records are dropped during
/// aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionType {
    Call,
    Put,
    Short,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssetCode {
    #[serde(rename = "ST")]
    Stock,
    #[serde(rename = "OP")]
    StockOption,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GoverningBody {
    House,
    Senate,
}

/// One normalized securities-transaction disclosure, as produced by the
/// acquisition/parsing side. Every field is optional: upstream parsers emit
/// nulls for anything they could not extract, and the engine must tolerate
/// that per-record rather than failing the batch.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DisclosureRecord {
    pub asset_name: Option<String>,
    pub transaction: Option<Transaction>,
    pub share_count: Option<f64>,
    pub options_count: Option<f64>,
    pub option_type: Option<OptionType>,
    pub option_exp_date: Option<NaiveDate>,
    pub strike_price: Option<f64>,
    pub ticker: Option<String>,
    pub transaction_date: Option<NaiveDate>,
    pub notification_date: Option<NaiveDate>,
    pub asset_value_low: Option<f64>,
    pub asset_value_high: Option<f64>,
    pub asset_code: Option<AssetCode>,
    pub doc_id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Close of the underlying on the transaction date, attached upstream.
    pub stock_price: Option<f64>,
    pub governing_body: Option<GoverningBody>,
}

impl DisclosureRecord {
    /// Filer identity used across the ledger and aggregator. None when the
    /// filing carries no name at all.
    pub fn filer_name(&self) -> Option<String> {
        match (self.first_name.as_deref(), self.last_name.as_deref()) {
            (None, None) => None,
            (first, last) => Some(
                [first, last]
                    .into_iter()
                    .flatten()
                    .collect::<Vec<_>>()
                    .join(" "),
            ),
        }
    }

    /// Midpoint of the disclosed value range.
    pub fn value_midpoint(&self) -> Option<f64> {
        match (self.asset_value_low, self.asset_value_high) {
            (Some(low), Some(high)) => Some((low + high) / 2.0),
            _ => None,
        }
    }

    /// True when the record carries the minimum analyzable fields. Anything
    /// else is skipped individually, never fatal to the batch.
    pub fn is_analyzable(&self) -> bool {
        self.ticker.is_some() && self.transaction_date.is_some() && self.transaction.is_some()
    }
}
