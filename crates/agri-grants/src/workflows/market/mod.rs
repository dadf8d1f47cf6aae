//! Crop market prices published by administrators.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

pub use domain::{MarketPrice, MarketPriceFilter, MarketPriceId, MarketPriceRequest};
pub use repository::MarketPriceRepository;
pub use router::market_router;
pub use service::{MarketPriceError, MarketPriceService};
