use super::domain::{MarketPrice, MarketPriceId, NewMarketPrice};
use crate::storage::RepositoryError;

/// Storage abstraction for published market prices.
pub trait MarketPriceRepository: Send + Sync {
    /// Insert every entry or none of them.
    fn insert_prices(&self, prices: Vec<NewMarketPrice>)
        -> Result<Vec<MarketPrice>, RepositoryError>;
    fn update_price(&self, price: MarketPrice) -> Result<(), RepositoryError>;
    fn fetch_price(&self, id: MarketPriceId) -> Result<Option<MarketPrice>, RepositoryError>;
    /// All entries, most recently updated first.
    fn list_prices(&self) -> Result<Vec<MarketPrice>, RepositoryError>;
    fn delete_price(&self, id: MarketPriceId) -> Result<(), RepositoryError>;
}
