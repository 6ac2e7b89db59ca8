use crate::{
    db_types::{AddressId, DepositAddress, NewDepositAddress},
    traits::MarketplaceError,
};

#[allow(async_fn_in_trait)]
pub trait AddressDirectory {
    /// All active deposit addresses, in insertion order.
    async fn fetch_active_addresses(&self) -> Result<Vec<DepositAddress>, MarketplaceError>;

    async fn insert_deposit_address(&self, address: NewDepositAddress) -> Result<DepositAddress, MarketplaceError>;

    async fn set_address_active(&self, id: AddressId, active: bool) -> Result<DepositAddress, MarketplaceError>;
}
