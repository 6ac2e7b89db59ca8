//! Operator-side product and credential pool management.

use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{Actor, Credential, NewCredential, NewProduct, Product, ProductId, ProductUpdate},
    traits::{InventoryManagement, MarketplaceError},
};

pub struct InventoryApi<B> {
    db: B,
}

impl<B> Debug for InventoryApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "InventoryApi")
    }
}

impl<B> InventoryApi<B>
where B: InventoryManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub async fn fetch_product(&self, id: ProductId) -> Result<Product, MarketplaceError> {
        self.db.fetch_product(id).await?.ok_or(MarketplaceError::ProductNotFound(id))
    }

    pub async fn fetch_products(&self) -> Result<Vec<Product>, MarketplaceError> {
        self.db.fetch_products().await
    }

    pub async fn create_product(&self, product: NewProduct, actor: &Actor) -> Result<Product, MarketplaceError> {
        if product.title.trim().is_empty() {
            return Err(MarketplaceError::InvalidRequest("A product needs a title".into()));
        }
        check_price_and_stock(Some(product.price_usd.value()), Some(product.stock))?;
        let product = self.db.insert_product(product).await?;
        info!("🗃️ {actor} created product {} ({}) at {}", product.id, product.title, product.price_usd);
        Ok(product)
    }

    pub async fn update_product(
        &self,
        id: ProductId,
        update: ProductUpdate,
        actor: &Actor,
    ) -> Result<Product, MarketplaceError> {
        if update.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(MarketplaceError::InvalidRequest("A product needs a title".into()));
        }
        check_price_and_stock(update.price_usd.map(|p| p.value()), update.stock)?;
        let product = self.db.update_product(id, update).await?;
        info!("🗃️ {actor} updated product {id}");
        Ok(product)
    }

    /// Adds credentials to the product's pool. The product's stock goes up by the number of credentials added.
    pub async fn provision_credentials(
        &self,
        product_id: ProductId,
        credentials: Vec<NewCredential>,
        actor: &Actor,
    ) -> Result<Vec<Credential>, MarketplaceError> {
        if credentials.is_empty() {
            return Err(MarketplaceError::InvalidRequest("No credentials were supplied".into()));
        }
        if credentials.iter().any(|c| c.username.trim().is_empty() || c.password.is_empty()) {
            return Err(MarketplaceError::InvalidRequest("Every credential needs a username and a password".into()));
        }
        self.db.provision_credentials(product_id, credentials, actor).await
    }

    pub async fn count_available_credentials(&self, product_id: ProductId) -> Result<i64, MarketplaceError> {
        self.db.count_available_credentials(product_id).await
    }
}

fn check_price_and_stock(price: Option<i64>, stock: Option<i64>) -> Result<(), MarketplaceError> {
    if price.is_some_and(|p| p <= 0) {
        return Err(MarketplaceError::InvalidRequest("The price must be positive".into()));
    }
    if stock.is_some_and(|s| s < 0) {
        return Err(MarketplaceError::InvalidRequest("Stock cannot be negative".into()));
    }
    Ok(())
}
