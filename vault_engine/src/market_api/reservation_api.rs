use std::fmt::Debug;

use chrono::Utc;
use log::*;

use crate::{
    db_types::{NewOrder, Order, ProductId, UserId},
    events::{EventProducers, OrderReservedEvent},
    helpers::normalize_currency,
    market_api::{address_api::dedupe_by_currency, order_objects::CheckoutOptions},
    traits::{AddressDirectory, Catalog, ExchangeRates, MarketplaceDatabase, MarketplaceError},
};

/// `ReservationApi` turns a buyer's choice of product and settlement currency into an order that is awaiting payment.
///
/// A reservation fixes the price. The USD total is copied from the product and the crypto amount is calculated from
/// the spot rate at that moment. Neither is ever recalculated. The buyer then has the reservation window (15 minutes)
/// to confirm payment via [`crate::OrderFlowApi::confirm_payment`].
///
/// Reserving does not touch the product's stock. Any number of buyers may hold reservations against the last unit;
/// capacity is only enforced when a credential is allocated.
pub struct ReservationApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for ReservationApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ReservationApi")
    }
}

impl<B> ReservationApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }
}

impl<B> ReservationApi<B>
where B: MarketplaceDatabase + Catalog + ExchangeRates + AddressDirectory
{
    /// Creates a new order in the `awaiting_payment` state for `product_id`, payable in `currency`.
    ///
    /// ## Failure modes
    /// * [`MarketplaceError::AuthRequired`] if there is no authenticated buyer.
    /// * [`MarketplaceError::ProductNotFound`] / [`MarketplaceError::ProductUnavailable`] if the product does not exist,
    ///   is not listed, or has no stock.
    /// * [`MarketplaceError::RateUnavailable`] if there is no usable rate for the currency. No order is created.
    pub async fn create_reservation(
        &self,
        user_id: Option<&UserId>,
        product_id: ProductId,
        currency: &str,
    ) -> Result<Order, MarketplaceError> {
        let user_id = user_id.ok_or(MarketplaceError::AuthRequired)?;
        let currency = normalize_currency(currency).map_err(|e| MarketplaceError::InvalidRequest(e.to_string()))?;
        let product = self.db.fetch_product(product_id).await?.ok_or(MarketplaceError::ProductNotFound(product_id))?;
        if !product.is_reservable() {
            debug!("🔄️ Product {product_id} cannot be reserved. Status: {}, stock: {}", product.status, product.stock);
            return Err(MarketplaceError::ProductUnavailable(product_id));
        }
        let rate = self.db.fetch_last_rate(&currency).await?;
        let amount = rate.convert(product.price_usd).map_err(|e| {
            warn!("🔄️ The stored {currency} rate cannot be used: {e}");
            MarketplaceError::RateUnavailable(currency.clone())
        })?;
        let address = self.db.fetch_active_addresses().await?.into_iter().find(|a| a.currency == currency);
        let mut new_order =
            NewOrder::new(user_id.clone(), product_id, currency.clone(), product.price_usd, amount, Utc::now());
        match address {
            Some(address) => new_order = new_order.with_deposit_address(address.id),
            None => warn!("🔄️ There is no active deposit address for {currency}. Order will be created without one."),
        }
        let order = self.db.insert_reservation(new_order).await?;
        info!(
            "🔄️ Order {} reserved by {user_id}: product {product_id}, {} = {} {currency}, payable until {}",
            order.id, order.total_usd, order.amount_crypto, order.reserved_until
        );
        self.call_order_reserved_hook(&order).await;
        Ok(order)
    }

    /// The product together with what the buyer needs to choose a currency: one deposit address per currency and the
    /// latest rate for each currency.
    pub async fn checkout_options(&self, product_id: ProductId) -> Result<CheckoutOptions, MarketplaceError> {
        let product = self.db.fetch_product(product_id).await?.ok_or(MarketplaceError::ProductNotFound(product_id))?;
        let addresses = dedupe_by_currency(self.db.fetch_active_addresses().await?);
        let rates = self.db.fetch_latest_rates().await?;
        Ok(CheckoutOptions { product, addresses, rates })
    }

    async fn call_order_reserved_hook(&self, order: &Order) {
        for emitter in &self.producers.order_reserved_producer {
            debug!("🔄️ Notifying order reserved hook subscribers");
            emitter.publish_event(OrderReservedEvent::new(order.clone())).await;
        }
    }
}
