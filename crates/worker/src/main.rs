use anyhow::Context;
use captrade_core::domain::ranking::RankingReport;
use captrade_core::pipeline::RankingEngine;
use captrade_core::prices::provider::HttpJsonPriceProvider;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod loader;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Score one trailing window and report ranked buy/sell lists.
    Run,
    /// Slide windows across history and emit a labeled training dataset.
    Train,
}

#[derive(Debug, Parser)]
#[command(name = "captrade_worker")]
struct Args {
    #[arg(long, value_enum, default_value_t = Mode::Run)]
    mode: Mode,

    /// Path to the normalized disclosure JSON produced by the crawlers.
    #[arg(long)]
    disclosures: PathBuf,

    /// Analysis end date (YYYY-MM-DD). Defaults to today.
    #[arg(long)]
    end_date: Option<String>,

    /// How many tickers to report on each side in run mode.
    #[arg(long, default_value_t = 5)]
    top: usize,

    /// First window end date for train mode (YYYY-MM-DD).
    #[arg(long, default_value = "2013-01-01")]
    train_start: String,

    /// Output CSV path for the train-mode dataset.
    #[arg(long, default_value = "stock_metrics.csv")]
    out: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = captrade_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    if let Err(err) = run(&settings, &args).await {
        sentry_anyhow::capture_anyhow(&err);
        return Err(err);
    }
    Ok(())
}

async fn run(settings: &captrade_core::config::Settings, args: &Args) -> anyhow::Result<()> {
    let disclosures = loader::load_disclosures(&args.disclosures)?;

    let today = chrono::Utc::now().date_naive();
    let end_date = resolve_date(args.end_date.as_deref(), today)?;

    let provider = HttpJsonPriceProvider::from_settings(settings)?;
    let mut engine = RankingEngine::new(Box::new(provider), today);

    match args.mode {
        Mode::Run => {
            let report = engine.run(&disclosures, end_date, args.top).await?;
            print_report(&report);
        }
        Mode::Train => {
            let train_start = chrono::NaiveDate::parse_from_str(&args.train_start, "%Y-%m-%d")
                .context("invalid --train-start")?;
            let rows = engine.train(&disclosures, train_start, &args.out).await?;
            tracing::info!(rows, out = %args.out.display(), "training dataset complete");
        }
    }

    Ok(())
}

fn resolve_date(arg: Option<&str>, today: chrono::NaiveDate) -> anyhow::Result<chrono::NaiveDate> {
    match arg {
        Some(s) => {
            chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").context("invalid --end-date")
        }
        None => Ok(today),
    }
}

fn print_report(report: &RankingReport) {
    println!("- - TOP BUYS ({}) - -", report.end_date);
    for stock in &report.buys {
        println!("Ticker: {}", stock.ticker);
        println!("Score: {}", stock.score);
        println!("Purchase Confidence: {}", stock.purchase_confidence);
        println!("Purchase Volume: ${}", stock.estimated_purchase_volume);
        println!("Sale Volume: ${}", stock.estimated_sale_volume);
        println!("Buyers: {:?}", stock.purchase_owners);
        println!();
    }

    println!("- - TOP SELLS ({}) - -", report.end_date);
    for stock in &report.sells {
        println!("Ticker: {}", stock.ticker);
        println!("Score: {}", stock.score);
        println!("Sale Confidence: {}", stock.sale_confidence);
        println!("Purchase Volume: ${}", stock.estimated_purchase_volume);
        println!("Sale Volume: ${}", stock.estimated_sale_volume);
        println!("Sellers: {:?}", stock.sale_owners);
        println!();
    }
}

fn init_sentry(settings: &captrade_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_date_defaults_to_today() {
        let today = chrono::NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
        assert_eq!(resolve_date(None, today).unwrap(), today);
        assert_eq!(
            resolve_date(Some("2024-03-01"), today).unwrap(),
            chrono::NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
        );
        assert!(resolve_date(Some("03/01/2024"), today).is_err());
    }
}
