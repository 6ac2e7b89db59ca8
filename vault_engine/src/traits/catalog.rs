use crate::{
    db_types::{Actor, Credential, NewCredential, NewProduct, Product, ProductId, ProductUpdate},
    traits::MarketplaceError,
};

/// Read-only product lookup.
#[allow(async_fn_in_trait)]
pub trait Catalog {
    async fn fetch_product(&self, id: ProductId) -> Result<Option<Product>, MarketplaceError>;

    async fn fetch_products(&self) -> Result<Vec<Product>, MarketplaceError>;
}

/// Operator-side catalog and credential pool maintenance.
#[allow(async_fn_in_trait)]
pub trait InventoryManagement: Catalog {
    async fn insert_product(&self, product: NewProduct) -> Result<Product, MarketplaceError>;

    /// Applies the non-empty fields of `update` to the product. Returns [`MarketplaceError::ProductNotFound`] if the
    /// product does not exist.
    async fn update_product(&self, id: ProductId, update: ProductUpdate) -> Result<Product, MarketplaceError>;

    /// Adds credentials to the pool for a product, all in the `available` state, and raises the product's stock by
    /// the number of credentials added. This happens atomically.
    async fn provision_credentials(
        &self,
        product_id: ProductId,
        credentials: Vec<NewCredential>,
        actor: &Actor,
    ) -> Result<Vec<Credential>, MarketplaceError>;

    async fn count_available_credentials(&self, product_id: ProductId) -> Result<i64, MarketplaceError>;
}
