use std::{collections::HashSet, fmt::Debug};

use log::*;

use crate::{
    db_types::{AddressId, DepositAddress, NewDepositAddress},
    helpers::normalize_currency,
    traits::{AddressDirectory, MarketplaceError},
};

/// Keeps the first address for each currency, preserving the input order.
///
/// Buyers are only ever shown one address per currency. The input is expected to be sorted by id, so the oldest
/// active address wins.
pub fn dedupe_by_currency(addresses: Vec<DepositAddress>) -> Vec<DepositAddress> {
    let mut seen = HashSet::new();
    addresses.into_iter().filter(|a| seen.insert(a.currency.clone())).collect()
}

pub struct AddressApi<B> {
    db: B,
}

impl<B> Debug for AddressApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AddressApi")
    }
}

impl<B> AddressApi<B>
where B: AddressDirectory
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub async fn add_address(&self, mut address: NewDepositAddress) -> Result<DepositAddress, MarketplaceError> {
        address.currency =
            normalize_currency(&address.currency).map_err(|e| MarketplaceError::InvalidRequest(e.to_string()))?;
        address.address = address.address.trim().to_string();
        if address.address.is_empty() {
            return Err(MarketplaceError::InvalidRequest("A deposit address cannot be empty".into()));
        }
        let address = self.db.insert_deposit_address(address).await?;
        info!("🗃️ Deposit address {} added for {}", address.id, address.currency);
        Ok(address)
    }

    pub async fn deactivate_address(&self, id: AddressId) -> Result<DepositAddress, MarketplaceError> {
        let address = self.db.set_address_active(id, false).await?;
        info!("🗃️ Deposit address {id} ({}) deactivated", address.currency);
        Ok(address)
    }

    /// Every active address, including several per currency.
    pub async fn active_addresses(&self) -> Result<Vec<DepositAddress>, MarketplaceError> {
        self.db.fetch_active_addresses().await
    }

    /// The addresses a buyer sees at checkout: at most one per currency.
    pub async fn checkout_addresses(&self) -> Result<Vec<DepositAddress>, MarketplaceError> {
        let addresses = self.db.fetch_active_addresses().await?;
        Ok(dedupe_by_currency(addresses))
    }
}
