pub mod history;
pub mod provider;
pub mod types;

pub use history::StockHistory;
pub use provider::PriceProvider;
pub use types::PricePoint;
