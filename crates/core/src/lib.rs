pub mod analysis;
pub mod domain;
pub mod ledger;
pub mod pipeline;
pub mod prices;
pub mod time;

pub mod config {
    use anyhow::Context;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub price_provider_base_url: Option<String>,
        pub price_provider_api_key: Option<String>,
        pub sentry_dsn: Option<String>,
        pub dataset_dir: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Ok(Self {
                price_provider_base_url: std::env::var("PRICE_PROVIDER_BASE_URL").ok(),
                price_provider_api_key: std::env::var("PRICE_PROVIDER_API_KEY").ok(),
                sentry_dsn: std::env::var("SENTRY_DSN").ok(),
                dataset_dir: std::env::var("DATASET_DIR").ok(),
            })
        }

        pub fn require_price_provider_base_url(&self) -> anyhow::Result<&str> {
            self.price_provider_base_url
                .as_deref()
                .context("PRICE_PROVIDER_BASE_URL is required")
        }
    }
}
