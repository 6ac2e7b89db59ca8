use serde::{Deserialize, Serialize};

use crate::db_types::{CredentialId, Order, OrderStatusType};

/// A buyer has reserved a product and a new order is awaiting payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderReservedEvent {
    pub order: Order,
}

impl OrderReservedEvent {
    pub fn new(order: Order) -> Self {
        Self { order }
    }
}

/// An order changed status. `order` carries the new status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStatusChangedEvent {
    pub old_status: OrderStatusType,
    pub order: Order,
}

impl OrderStatusChangedEvent {
    pub fn new(old_status: OrderStatusType, order: Order) -> Self {
        Self { old_status, order }
    }
}

/// A credential has been bound to an order. The secret itself is not part of the event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderReleasedEvent {
    pub order: Order,
    pub credential_id: CredentialId,
}

impl OrderReleasedEvent {
    pub fn new(order: Order, credential_id: CredentialId) -> Self {
        Self { order, credential_id }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventType {
    OrderReserved(OrderReservedEvent),
    OrderStatusChanged(OrderStatusChangedEvent),
    OrderReleased(OrderReleasedEvent),
}
