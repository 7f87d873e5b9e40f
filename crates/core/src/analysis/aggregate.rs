use crate::domain::disclosure::{AssetCode, DisclosureRecord, OptionType, Transaction};
use crate::domain::features::StockFeatureVector;
use crate::ledger::TraderLedger;
use crate::prices::history::round2;
use chrono::{Duration, NaiveDate};
use std::collections::{BTreeMap, BTreeSet};

/// Trailing analysis window: disclosures with a transaction date in
/// (end_date - WINDOW_DAYS, end_date] are aggregated.
pub const WINDOW_DAYS: i64 = 120;

/// Strike relative to the underlying's price at transaction time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Moneyness {
    InTheMoney,
    AtTheMoney,
    OutOfTheMoney,
}

pub fn option_moneyness(stock_price: f64, strike_price: f64, option_type: OptionType) -> Moneyness {
    let ratio = strike_price / stock_price;
    if ratio == 1.0 {
        return Moneyness::AtTheMoney;
    }
    let below_spot = ratio < 1.0;
    match option_type {
        OptionType::Call => {
            if below_spot {
                Moneyness::InTheMoney
            } else {
                Moneyness::OutOfTheMoney
            }
        }
        OptionType::Put => {
            if below_spot {
                Moneyness::OutOfTheMoney
            } else {
                Moneyness::InTheMoney
            }
        }
        // Short positions never reach here; the aggregator drops them.
        OptionType::Short => Moneyness::AtTheMoney,
    }
}

/// Signed speculation score for an option transaction: positive is bullish,
/// negative is bearish, magnitude grows with how speculative the position
/// is (an out-of-the-money purchase being the strongest conviction).
pub fn option_sentiment(
    option_type: OptionType,
    transaction: Transaction,
    moneyness: Moneyness,
) -> Option<i32> {
    use Moneyness::*;
    use OptionType::*;
    use Transaction::*;

    let sentiment = match (option_type, transaction, moneyness) {
        (Call, Purchase, InTheMoney) => 25,
        (Call, Purchase, AtTheMoney) => 50,
        (Call, Purchase, OutOfTheMoney) => 100,
        (Call, Sale, InTheMoney) => -25,
        (Call, Sale, AtTheMoney) => -10,
        (Call, Sale, OutOfTheMoney) => -10,
        (Put, Purchase, InTheMoney) => -25,
        (Put, Purchase, AtTheMoney) => -50,
        (Put, Purchase, OutOfTheMoney) => -100,
        (Put, Sale, InTheMoney) => 10,
        (Put, Sale, AtTheMoney) => 25,
        (Put, Sale, OutOfTheMoney) => 25,
        (Short, _, _) => return None,
    };
    Some(sentiment)
}

#[derive(Default)]
struct SideAccumulator {
    adjusted_volume: f64,
    estimated_volume: f64,
    speculation: f64,
    count: u32,
    days_ago: Vec<f64>,
    confidences: Vec<f64>,
    owners: BTreeSet<String>,
}

impl SideAccumulator {
    fn mean_days_ago(&self) -> Option<f64> {
        if self.days_ago.is_empty() {
            return None;
        }
        Some(round2(
            self.days_ago.iter().sum::<f64>() / self.days_ago.len() as f64,
        ))
    }

    // Ledger scores can be negative; only an empty side defaults to 0.
    fn max_confidence(&self) -> f64 {
        self.confidences.iter().copied().reduce(f64::max).unwrap_or(0.0)
    }
}

#[derive(Default)]
struct TickerAccumulator {
    purchase: SideAccumulator,
    sale: SideAccumulator,
}

/// Aggregates the disclosure slice into one raw feature vector per ticker
/// with activity inside the trailing window ending at `end_date`.
///
/// `adjusted_values` is the per-filer [1,2] scaling aligned by index with
/// `disclosures` (see `analysis::normalize`). The ledger must already be
/// built for this window's cutoff; reading confidence from a stale ledger
/// silently produces wrong scores.
pub fn aggregate(
    disclosures: &[DisclosureRecord],
    adjusted_values: &[Option<f64>],
    ledger: &TraderLedger,
    end_date: NaiveDate,
) -> Vec<StockFeatureVector> {
    let window_start = end_date - Duration::days(WINDOW_DAYS);
    let mut tracker: BTreeMap<String, TickerAccumulator> = BTreeMap::new();

    for (disclosure, adjusted) in disclosures.iter().zip(adjusted_values) {
        if !disclosure.is_analyzable() {
            continue;
        }
        let transaction_date = disclosure.transaction_date.unwrap_or_default();
        if transaction_date <= window_start || transaction_date > end_date {
            continue;
        }
        // Short option positions are an unsupported instrument, dropped.
        if disclosure.option_type == Some(OptionType::Short) {
            continue;
        }

        let ticker = disclosure.ticker.clone().unwrap_or_default();
        let transaction = disclosure.transaction.unwrap_or(Transaction::Purchase);
        let owner = disclosure.filer_name();
        let confidence = owner
            .as_deref()
            .and_then(|name| ledger.trader_performance(name));
        let estimated_volume = disclosure.value_midpoint().map(round2);
        let days_ago = (end_date - transaction_date).num_days() as f64;

        match disclosure.asset_code {
            Some(AssetCode::Stock) => {
                let entry = tracker.entry(ticker).or_default();
                let (side, side_confidence) = match transaction {
                    Transaction::Purchase => {
                        (&mut entry.purchase, confidence.map(|c| c.purchase))
                    }
                    Transaction::Sale => (&mut entry.sale, confidence.map(|c| c.sale)),
                };
                side.count += 1;
                side.days_ago.push(days_ago);
                if let Some(owner) = owner {
                    side.owners.insert(owner);
                }
                if let Some(adjusted) = adjusted {
                    side.adjusted_volume += adjusted;
                }
                if let Some(volume) = estimated_volume {
                    side.estimated_volume += volume;
                }
                if let Some(c) = side_confidence {
                    side.confidences.push(c);
                }
            }
            Some(AssetCode::StockOption) => {
                let (Some(stock_price), Some(strike_price), Some(option_type)) = (
                    disclosure.stock_price.filter(|p| *p > 0.0),
                    disclosure.strike_price,
                    disclosure.option_type,
                ) else {
                    continue;
                };
                let moneyness = option_moneyness(stock_price, strike_price, option_type);
                let Some(sentiment) = option_sentiment(option_type, transaction, moneyness) else {
                    continue;
                };

                // Bullish flow routes purchase-side, bearish sale-side.
                // Owners are deliberately not recorded for option flow, so a
                // ticker with only option activity drops out at finalize.
                let entry = tracker.entry(ticker).or_default();
                let (side, side_confidence) = if sentiment < 0 {
                    (&mut entry.sale, confidence.map(|c| c.sale))
                } else {
                    (&mut entry.purchase, confidence.map(|c| c.purchase))
                };
                side.count += 1;
                side.speculation += sentiment.unsigned_abs() as f64;
                side.days_ago.push(days_ago);
                if let Some(adjusted) = adjusted {
                    side.adjusted_volume += adjusted;
                }
                if let Some(volume) = estimated_volume {
                    side.estimated_volume += volume;
                }
                if let Some(c) = side_confidence {
                    side.confidences.push(c);
                }
            }
            _ => continue,
        }
    }

    tracker
        .into_iter()
        .filter(|(_, acc)| !acc.purchase.owners.is_empty() || !acc.sale.owners.is_empty())
        .map(|(ticker, acc)| {
            let mut vector = StockFeatureVector::new(ticker, end_date);
            vector.adjusted_purchase_volume = acc.purchase.adjusted_volume;
            vector.estimated_purchase_volume = acc.purchase.estimated_volume;
            vector.purchase_speculation = acc.purchase.speculation;
            vector.purchase_count = acc.purchase.count;
            vector.purchase_count_individual = acc.purchase.owners.len() as u32;
            vector.purchase_days_ago = acc.purchase.mean_days_ago();
            vector.purchase_confidence = acc.purchase.max_confidence();

            vector.adjusted_sale_volume = acc.sale.adjusted_volume;
            vector.estimated_sale_volume = acc.sale.estimated_volume;
            vector.sale_speculation = acc.sale.speculation;
            vector.sale_count = acc.sale.count;
            vector.sale_count_individual = acc.sale.owners.len() as u32;
            vector.sale_days_ago = acc.sale.mean_days_ago();
            vector.sale_confidence = acc.sale.max_confidence();

            vector.volume_net = acc.purchase.estimated_volume - acc.sale.estimated_volume;
            vector.purchase_owners = acc.purchase.owners;
            vector.sale_owners = acc.sale.owners;
            vector
        })
        .collect()
}
