//! Order lifecycle rules.
//!
//! The table of legal status transitions and the reservation expiry predicate live here and nowhere else.
//!
//! | From \ To        | Paid  | Verified | Released | Cancelled      |
//! |------------------|-------|----------|----------|----------------|
//! | AwaitingPayment  | user  | -        | -        | user, operator |
//! | Paid             | -     | operator | operator | operator       |
//! | Verified         | -     | -        | operator | operator       |
//! | Released         | -     | -        | -        | -              |
//! | Cancelled        | -     | -        | -        | -              |
//!
//! Extra preconditions are checked by [`crate::OrderFlowApi`]: a move to `Paid` is refused once the reservation has
//! expired, and a move to `Released` only happens as part of a successful credential allocation.
use chrono::{DateTime, Duration, Utc};

use crate::db_types::{OrderStatusType, Role};

/// Length of the reservation window, in minutes.
pub const RESERVATION_WINDOW_MINUTES: i64 = 15;

pub fn reservation_window() -> Duration {
    Duration::minutes(RESERVATION_WINDOW_MINUTES)
}

/// The payment deadline for an order created at `created_at`.
pub fn reservation_deadline(created_at: DateTime<Utc>) -> DateTime<Utc> {
    created_at + reservation_window()
}

/// An order is expired iff it is still awaiting payment and `now` is past its reservation deadline.
pub fn is_expired(status: OrderStatusType, reserved_until: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    status == OrderStatusType::AwaitingPayment && now > reserved_until
}

/// Decides which actors may move an order between two statuses.
///
/// The engine consults this for every status write, so a deployment that needs a different trust model for payment
/// confirmation can supply its own policy to [`crate::OrderFlowApi::with_policy`].
pub trait TransitionPolicy: Send + Sync {
    fn permits(&self, from: OrderStatusType, to: OrderStatusType, role: Role) -> bool;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StandardTransitionPolicy;

impl TransitionPolicy for StandardTransitionPolicy {
    fn permits(&self, from: OrderStatusType, to: OrderStatusType, role: Role) -> bool {
        use OrderStatusType::*;
        match (from, to) {
            (AwaitingPayment, Paid) => role == Role::User,
            (AwaitingPayment, Cancelled) => true,
            (Paid, Verified) | (Paid, Released) | (Verified, Released) => role == Role::Operator,
            (Paid, Cancelled) | (Verified, Cancelled) => role == Role::Operator,
            _ => false,
        }
    }
}
