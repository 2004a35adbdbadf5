pub mod market;

pub use market::{history_key, MarketService, INDICES_KEY};
