use crate::domain::features::{NormalizedFeatures, StockFeatureVector};
use crate::prices::history::round2;

const WEIGHT_ADJUSTED_VOLUME: f64 = 2.0;
const WEIGHT_SPECULATION: f64 = 1.0;
const WEIGHT_COUNT: f64 = 1.0;
const WEIGHT_COUNT_INDIVIDUAL: f64 = 1.0;

struct MinMax {
    min: f64,
    max: f64,
}

fn min_max<I: Iterator<Item = f64>>(values: I) -> MinMax {
    let mut out = MinMax {
        min: f64::INFINITY,
        max: f64::NEG_INFINITY,
    };
    for v in values {
        out.min = out.min.min(v);
        out.max = out.max.max(v);
    }
    if out.min > out.max {
        out = MinMax { min: 0.0, max: 0.0 };
    }
    out
}

impl MinMax {
    /// Min-max scale into [0,1]. A degenerate field (min == max across the
    /// batch) maps every value to 0 rather than dividing by zero.
    fn scale(&self, value: f64) -> f64 {
        if self.min == self.max {
            return 0.0;
        }
        (value - self.min) / (self.max - self.min)
    }

    /// Inverted scaling for days-ago fields: more recent scores higher.
    fn scale_inverted(&self, value: f64) -> f64 {
        if self.min == self.max {
            return 0.0;
        }
        1.0 - self.scale(value)
    }
}

/// Min-max normalizes eight fields across the current batch of feature
/// vectors so no single factor dominates on raw magnitude. Adjusted volumes
/// (already on the per-filer [1,2] scale) and ledger confidences pass
/// through untouched.
pub fn normalize_batch(vectors: &[StockFeatureVector]) -> Vec<NormalizedFeatures> {
    let purchase_count = min_max(vectors.iter().map(|v| f64::from(v.purchase_count)));
    let purchase_individual = min_max(
        vectors
            .iter()
            .map(|v| f64::from(v.purchase_count_individual)),
    );
    let purchase_speculation = min_max(vectors.iter().map(|v| v.purchase_speculation));
    let purchase_days = min_max(vectors.iter().filter_map(|v| v.purchase_days_ago));
    let sale_count = min_max(vectors.iter().map(|v| f64::from(v.sale_count)));
    let sale_individual = min_max(vectors.iter().map(|v| f64::from(v.sale_count_individual)));
    let sale_speculation = min_max(vectors.iter().map(|v| v.sale_speculation));
    let sale_days = min_max(vectors.iter().filter_map(|v| v.sale_days_ago));

    vectors
        .iter()
        .map(|v| NormalizedFeatures {
            adjusted_purchase_volume: v.adjusted_purchase_volume,
            purchase_speculation: purchase_speculation.scale(v.purchase_speculation),
            purchase_count: purchase_count.scale(f64::from(v.purchase_count)),
            purchase_count_individual: purchase_individual
                .scale(f64::from(v.purchase_count_individual)),
            purchase_days_ago: v
                .purchase_days_ago
                .map(|d| purchase_days.scale_inverted(d)),
            purchase_confidence: v.purchase_confidence,
            adjusted_sale_volume: v.adjusted_sale_volume,
            sale_speculation: sale_speculation.scale(v.sale_speculation),
            sale_count: sale_count.scale(f64::from(v.sale_count)),
            sale_count_individual: sale_individual.scale(f64::from(v.sale_count_individual)),
            sale_days_ago: v.sale_days_ago.map(|d| sale_days.scale_inverted(d)),
            sale_confidence: v.sale_confidence,
        })
        .collect()
}

/// Weighted signed composite: purchase-side pressure minus sale-side
/// pressure, each decayed by recency when present and damped by the filer
/// confidence for that direction. Rounded to 2 decimals.
pub fn calculate_score(features: &NormalizedFeatures) -> f64 {
    let mut purchase_score = features.adjusted_purchase_volume * WEIGHT_ADJUSTED_VOLUME
        + features.purchase_speculation * WEIGHT_SPECULATION
        + features.purchase_count * WEIGHT_COUNT
        + features.purchase_count_individual * WEIGHT_COUNT_INDIVIDUAL;
    if let Some(decay) = features.purchase_days_ago {
        purchase_score *= decay;
    }
    purchase_score *= features.purchase_confidence;

    let mut sale_score = features.adjusted_sale_volume * WEIGHT_ADJUSTED_VOLUME
        + features.sale_speculation * WEIGHT_SPECULATION
        + features.sale_count * WEIGHT_COUNT
        + features.sale_count_individual * WEIGHT_COUNT_INDIVIDUAL;
    if let Some(decay) = features.sale_days_ago {
        sale_score *= decay;
    }
    sale_score *= features.sale_confidence;

    round2(purchase_score - sale_score)
}
