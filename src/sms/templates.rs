use uuid::Uuid;

use crate::{
    models::{OrderDetail, ProductEntity},
    orders::DeliveryMethod,
    platform::config::ShopConfig,
};

pub fn order_dispatched(detail: &OrderDetail, shop: &ShopConfig) -> String {
    format!(
        "Your order #{} has been dispatched!\n\
         {}\n\
         Expected delivery: Within 24 hours\n\
         Contact: {}",
        detail.order.order_reference,
        detail.product.display_name(),
        shop.contact(),
    )
}

pub fn ready_for_pickup(detail: &OrderDetail, shop: &ShopConfig) -> String {
    format!(
        "Your order #{} is ready for pickup!\n\
         {}\n\
         Pickup at: {}\n\
         Hours: {}\n\
         Bring: Order ID and valid ID\n\
         Contact: {}",
        detail.order.order_reference,
        detail.product.display_name(),
        shop.address,
        shop.hours,
        shop.contact(),
    )
}

pub fn feedback_request(detail: &OrderDetail, shop: &ShopConfig) -> String {
    format!(
        "Thank you for your purchase from {}!\n\
         How was your experience with {}?\n\
         Share your feedback: {}\n\
         Your opinion helps us improve!",
        shop.name,
        detail.product.display_name(),
        feedback_link(shop, detail.order.id),
    )
}

pub fn feedback_link(shop: &ShopConfig, order_id: Uuid) -> String {
    format!("{}/feedback/{}", shop.app_url.trim_end_matches('/'), order_id)
}

/// What the shop owner is told about a new order.
pub struct NewOrderSummary<'a> {
    pub order_id: Uuid,
    pub order_reference: &'a str,
    pub customer_name: &'a str,
    pub phone: &'a str,
    pub product: &'a ProductEntity,
    pub delivery_method: DeliveryMethod,
    pub delivery_address: Option<&'a str>,
}

pub fn owner_new_order(summary: &NewOrderSummary<'_>, shop: &ShopConfig) -> String {
    let mut message = format!(
        "NEW ORDER #{}\n\
         Customer: {}\n\
         Phone: {}\n\
         Product: {}\n\
         Delivery: {}\n",
        summary.order_reference,
        summary.customer_name,
        summary.phone,
        summary.product.display_name(),
        summary.delivery_method.label(),
    );
    if let Some(address) = summary.delivery_address {
        message.push_str(&format!("Location: {address}\n"));
    }
    message.push_str(&format!(
        "View: {}/admin/orders/{}",
        shop.app_url.trim_end_matches('/'),
        summary.order_id
    ));
    message
}
