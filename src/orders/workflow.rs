use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::{
    models::OrderEntity,
    orders::{
        OrderStatus,
        transition::{self, TransitionPolicy},
    },
    platform::{app_error::AppError, config::ShopConfig},
    store::OrderRepository,
};

/// Moves an order to `requested` and enqueues the customer message the new
/// status calls for.
///
/// The message is only queued here. Sending happens later in the relay, so a
/// provider failure can never undo the status change.
pub async fn update_status(
    repo: &dyn OrderRepository,
    shop: &ShopConfig,
    policy: TransitionPolicy,
    id: Uuid,
    requested: &str,
) -> Result<OrderEntity, AppError> {
    let requested: OrderStatus = requested
        .parse()
        .map_err(|_| AppError::BadRequest("Invalid status".to_string()))?;

    let detail = repo
        .find_order_detail(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;

    // Rows written outside the service may carry an unknown status; only the
    // strict table has an opinion about them.
    if let Ok(current) = detail.order.status.parse::<OrderStatus>() {
        if !policy.allows(current, requested) {
            return Err(AppError::Conflict(format!(
                "Cannot change order status from {current} to {requested}"
            )));
        }
    } else if policy == TransitionPolicy::Strict {
        return Err(AppError::Conflict(format!(
            "Cannot change order status from {} to {requested}",
            detail.order.status
        )));
    }

    let plan = transition::plan(&detail, requested, shop, Utc::now());
    if let Some(sms) = &plan.notification {
        info!(
            "Queueing {} SMS for order {}",
            sms.kind.log_label(),
            detail.order.order_reference
        );
    }

    let order = repo
        .apply_status_change(id, plan.changes, plan.notification)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;

    info!("Order {} is now {}", order.order_reference, order.status);
    Ok(order)
}
