use chrono::{DateTime, Utc};

use crate::{
    models::{OrderDetail, StatusChangeset},
    orders::{DeliveryMethod, OrderStatus},
    platform::config::ShopConfig,
    sms::{NotificationKind, OutboundSms, templates},
};

/// Which prior states a requested status may come from.
///
/// `Permissive` accepts any known status from any state. `Strict` follows
/// `pending -> dispatched | ready -> completed`, with `cancelled` reachable from
/// every non-terminal state and re-applying the current status always allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransitionPolicy {
    #[default]
    Permissive,
    Strict,
}

impl TransitionPolicy {
    pub fn from_config(strict: bool) -> Self {
        if strict {
            TransitionPolicy::Strict
        } else {
            TransitionPolicy::Permissive
        }
    }

    pub fn allows(self, from: OrderStatus, to: OrderStatus) -> bool {
        use OrderStatus::*;

        match self {
            TransitionPolicy::Permissive => true,
            TransitionPolicy::Strict => {
                from == to
                    || matches!(
                        (from, to),
                        (Pending, Dispatched | Ready | Cancelled)
                            | (Dispatched, Completed | Cancelled)
                            | (Ready, Completed | Cancelled)
                    )
            }
        }
    }
}

/// The write and the message a status change produces.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionPlan {
    pub changes: StatusChangeset,
    pub notification: Option<OutboundSms>,
}

pub fn plan(
    detail: &OrderDetail,
    requested: OrderStatus,
    shop: &ShopConfig,
    now: DateTime<Utc>,
) -> TransitionPlan {
    let delivery_method = detail.order.delivery_method.parse::<DeliveryMethod>().ok();
    let mut changes = StatusChangeset {
        status: requested.as_str().to_string(),
        dispatched_at: None,
        completed_at: None,
        updated_at: now,
    };

    let notification = match requested {
        OrderStatus::Dispatched => {
            changes.dispatched_at = Some(now);
            (delivery_method == Some(DeliveryMethod::Doorstep)).then(|| {
                to_customer(
                    detail,
                    NotificationKind::OrderDispatched,
                    templates::order_dispatched(detail, shop),
                )
            })
        }
        OrderStatus::Ready => (delivery_method == Some(DeliveryMethod::Pickup)).then(|| {
            to_customer(
                detail,
                NotificationKind::OrderReady,
                templates::ready_for_pickup(detail, shop),
            )
        }),
        OrderStatus::Completed => {
            changes.completed_at = Some(now);
            Some(to_customer(
                detail,
                NotificationKind::FeedbackRequest,
                templates::feedback_request(detail, shop),
            ))
        }
        OrderStatus::Pending | OrderStatus::Cancelled => None,
    };

    TransitionPlan {
        changes,
        notification,
    }
}

fn to_customer(detail: &OrderDetail, kind: NotificationKind, message: String) -> OutboundSms {
    OutboundSms {
        kind,
        recipient: detail.customer.phone.clone(),
        message,
        order_id: Some(detail.order.id),
    }
}
