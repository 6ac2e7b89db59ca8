use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use vault_common::UsdRate;
use vault_engine::{
    db_types::{Credential, CredentialId, OrderId, OrderStatusType, ProductId, UserId},
    order_objects::OrderQueryFilter,
};

use crate::errors::ServerError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationRequest {
    pub product_id: ProductId,
    pub currency: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: OrderStatusType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateUpdateRequest {
    pub currency: String,
    /// The USD price of one whole coin, as a decimal string, e.g. `"50000.00"`
    pub rate: String,
}

impl RateUpdateRequest {
    pub fn rate(&self) -> Result<UsdRate, ServerError> {
        UsdRate::from_str(&self.rate).map_err(|e| ServerError::InvalidRequestBody(e.to_string()))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AvailableCredentials {
    pub product_id: ProductId,
    pub available: i64,
}

/// What a buyer gets back when their order is released. The secret is only ever sent to the order's owner, or to the
/// operator that triggered the release.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleasedCredential {
    pub order_id: OrderId,
    pub credential_id: CredentialId,
    pub username: String,
    pub password: String,
    pub notes: Option<String>,
    pub released_at: Option<DateTime<Utc>>,
}

impl From<Credential> for ReleasedCredential {
    fn from(c: Credential) -> Self {
        Self {
            // Released credentials are always bound to an order
            order_id: c.assigned_order_id.unwrap_or(OrderId(0)),
            credential_id: c.id,
            username: c.username,
            password: c.password,
            notes: c.notes,
            released_at: c.released_at,
        }
    }
}

/// Query string parameters for the operator's order search. `status` may be a comma-separated list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderSearchParams {
    pub status: Option<String>,
    pub user_id: Option<String>,
    pub product_id: Option<i64>,
    pub currency: Option<String>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl TryFrom<OrderSearchParams> for OrderQueryFilter {
    type Error = ServerError;

    fn try_from(params: OrderSearchParams) -> Result<Self, Self::Error> {
        let mut filter = OrderQueryFilter { since: params.since, until: params.until, ..Default::default() };
        if let Some(user_id) = params.user_id {
            filter = filter.with_user_id(UserId::from(user_id));
        }
        if let Some(product_id) = params.product_id {
            filter = filter.with_product_id(ProductId(product_id));
        }
        if let Some(currency) = params.currency {
            filter = filter.with_currency(currency.trim().to_uppercase());
        }
        let statuses = params.status.unwrap_or_default();
        for s in statuses.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let status = OrderStatusType::from_str(s)
                .map_err(|e| ServerError::InvalidRequestPath(format!("Unknown order status '{s}'. {e}")))?;
            filter = filter.with_status(status);
        }
        Ok(filter)
    }
}
