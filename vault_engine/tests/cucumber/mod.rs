mod setups;
mod steps;

pub use world::MarketplaceWorld;
