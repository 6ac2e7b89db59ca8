use std::{fmt::Debug, sync::Arc};

use chrono::Utc;
use log::*;

use crate::{
    db_types::{Actor, Order, OrderId, OrderStatusType},
    events::{EventProducers, OrderReleasedEvent, OrderStatusChangedEvent},
    order_state::{StandardTransitionPolicy, TransitionPolicy},
    traits::{MarketplaceDatabase, MarketplaceError, ReleasedOrder},
};

/// `OrderFlowApi` is the order state machine. Every status change after reservation goes through it.
///
/// Which actor may make which move is decided by the [`TransitionPolicy`]. On top of the policy, the API enforces:
/// * buyers can only see and act on their own orders. Anyone else's order looks like it does not exist;
/// * a move to `paid` is refused with [`MarketplaceError::Expired`] once the reservation window has closed;
/// * a move to `released` only happens together with a successful credential allocation.
///
/// Every successful write stamps `updated_at`, adds an audit entry and fires the status change hooks.
pub struct OrderFlowApi<B> {
    db: B,
    producers: EventProducers,
    policy: Arc<dyn TransitionPolicy>,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers, policy: Arc::new(StandardTransitionPolicy) }
    }

    /// Replaces the standard transition policy.
    pub fn with_policy(mut self, policy: Arc<dyn TransitionPolicy>) -> Self {
        self.policy = policy;
        self
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn db_mut(&mut self) -> &mut B {
        &mut self.db
    }
}

impl<B> OrderFlowApi<B>
where B: MarketplaceDatabase
{
    /// The buyer reports that payment has been sent. Moves the order from `awaiting_payment` to `paid`.
    ///
    /// Fails with [`MarketplaceError::Expired`] if the reservation window has passed, in which case the order stays in
    /// `awaiting_payment`.
    pub async fn confirm_payment(&self, actor: &Actor, id: OrderId) -> Result<Order, MarketplaceError> {
        let order = self.fetch_order_for(actor, id).await?;
        trace!("🔄️ {actor} is confirming payment for order {id}");
        self.transition(actor, order, OrderStatusType::Paid).await
    }

    /// Cancels an order. Buyers can only cancel orders that are still awaiting payment.
    pub async fn cancel_order(&self, actor: &Actor, id: OrderId) -> Result<Order, MarketplaceError> {
        let order = self.fetch_order_for(actor, id).await?;
        trace!("🔄️ {actor} is cancelling order {id}");
        self.transition(actor, order, OrderStatusType::Cancelled).await
    }

    /// Moves an order to `new_status`, subject to the transition policy.
    ///
    /// A move to `released` is handed to [`Self::release_order`], since it requires a credential to be allocated.
    /// Writing the status an order already has is not a transition and fails with
    /// [`MarketplaceError::InvalidTransition`].
    pub async fn set_order_status(
        &self,
        actor: &Actor,
        id: OrderId,
        new_status: OrderStatusType,
    ) -> Result<Order, MarketplaceError> {
        if new_status == OrderStatusType::Released {
            return self.release_order(actor, id).await.map(|released| released.order);
        }
        let order = self.fetch_order_for(actor, id).await?;
        trace!("🔄️ {actor} is changing the status of order {id} from {} to {new_status}", order.status);
        self.transition(actor, order, new_status).await
    }

    /// Allocates a credential to a `paid` or `verified` order and marks it `released`.
    ///
    /// If the product has no available credentials, this fails with [`MarketplaceError::NoCredentialAvailable`]. The
    /// order keeps its status and can be released once more credentials have been provisioned.
    pub async fn release_order(&self, actor: &Actor, id: OrderId) -> Result<ReleasedOrder, MarketplaceError> {
        let order = self.fetch_order_for(actor, id).await?;
        let from = order.status;
        let to = OrderStatusType::Released;
        if !self.policy.permits(from, to, actor.role) {
            warn!("🔄️ {actor} may not release order {id}, which is {from}");
            return Err(MarketplaceError::InvalidTransition { from, to });
        }
        let released = self.db.allocate_credential(id, actor).await.map_err(|e| {
            match &e {
                MarketplaceError::InvalidTransition { .. } => {
                    warn!("🔄️ Order {id} changed before it could be released: {e}")
                },
                MarketplaceError::NoCredentialAvailable(_) => warn!("🔐️ Order {id} cannot be released: {e}"),
                _ => error!("🔐️ Allocation for order {id} failed: {e}"),
            }
            e
        })?;
        self.call_status_changed_hook(from, &released.order).await;
        self.call_order_released_hook(&released).await;
        Ok(released)
    }

    /// Fetches an order on behalf of `actor`. Operators can see every order. Buyers only see their own.
    pub async fn fetch_order_for(&self, actor: &Actor, id: OrderId) -> Result<Order, MarketplaceError> {
        let order = self.db.fetch_order(id).await?.ok_or(MarketplaceError::OrderNotFound(id))?;
        if actor.is_operator() || order.is_owned_by(&actor.user_id) {
            Ok(order)
        } else {
            warn!("🔄️ {actor} tried to access order {id}, which belongs to someone else");
            Err(MarketplaceError::OrderNotFound(id))
        }
    }

    async fn transition(&self, actor: &Actor, order: Order, to: OrderStatusType) -> Result<Order, MarketplaceError> {
        let from = order.status;
        if !self.policy.permits(from, to, actor.role) {
            warn!("🔄️ {actor} attempted an illegal transition on order {}: {from} -> {to}", order.id);
            return Err(MarketplaceError::InvalidTransition { from, to });
        }
        if to == OrderStatusType::Paid && order.is_expired_at(Utc::now()) {
            info!("🔄️ Payment confirmation for order {} arrived after {}. Refusing it.", order.id, order.reserved_until);
            return Err(MarketplaceError::Expired(order.id));
        }
        let updated = self.db.transition_order(order.id, from, to, actor).await.map_err(|e| {
            if let MarketplaceError::InvalidTransition { .. } = e {
                warn!("🔄️ Order {} was changed concurrently. {e}", order.id);
            }
            e
        })?;
        info!("🔄️ Order {} moved from {from} to {to} by {actor}", updated.id);
        self.call_status_changed_hook(from, &updated).await;
        Ok(updated)
    }

    async fn call_status_changed_hook(&self, old_status: OrderStatusType, order: &Order) {
        for emitter in &self.producers.status_changed_producer {
            debug!("🔄️ Notifying status changed hook subscribers");
            emitter.publish_event(OrderStatusChangedEvent::new(old_status, order.clone())).await;
        }
    }

    async fn call_order_released_hook(&self, released: &ReleasedOrder) {
        for emitter in &self.producers.order_released_producer {
            debug!("🔄️ Notifying order released hook subscribers");
            emitter.publish_event(OrderReleasedEvent::new(released.order.clone(), released.credential.id)).await;
        }
    }
}
