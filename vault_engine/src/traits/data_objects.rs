use serde::{Deserialize, Serialize};

use crate::db_types::{Credential, Order};

/// The result of a successful allocation: the order, now `released`, and the credential bound to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleasedOrder {
    pub order: Order,
    pub credential: Credential,
}

impl ReleasedOrder {
    pub fn new(order: Order, credential: Credential) -> Self {
        Self { order, credential }
    }
}
