use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    models::{
        CustomerChangeset, CustomerEntity, NewCustomerEntity, NewOrderEntity, OrderEntity,
        ProductEntity,
    },
    orders::{DeliveryMethod, OrderStatus, reference},
    platform::{app_error::AppError, config::ShopConfig},
    sms::{
        NotificationKind, OutboundSms,
        templates::{self, NewOrderSummary},
    },
    store::OrderRepository,
};

/// Raw checkout fields as submitted by the storefront.
#[derive(Debug, Clone, Default)]
pub struct OrderRequest {
    pub customer_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub product_id: Option<String>,
    pub delivery_method: Option<String>,
    pub delivery_address: Option<String>,
}

#[derive(Serialize, Debug, Clone, ToSchema)]
pub struct PlacedOrder {
    pub order: OrderEntity,
    pub product: ProductEntity,
    pub customer: CustomerEntity,
}

struct ValidOrder {
    customer_name: String,
    phone: String,
    email: Option<String>,
    product_id: Uuid,
    delivery_method: DeliveryMethod,
    delivery_address: Option<String>,
}

fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn validate(request: OrderRequest) -> Result<ValidOrder, AppError> {
    let missing = || AppError::BadRequest("Missing required fields".to_string());

    let customer_name = present(request.customer_name).ok_or_else(missing)?;
    let phone = present(request.phone).ok_or_else(missing)?;
    let product_id = present(request.product_id).ok_or_else(missing)?;
    let delivery_method = present(request.delivery_method).ok_or_else(missing)?;

    let delivery_method: DeliveryMethod = delivery_method
        .parse()
        .map_err(|_| AppError::BadRequest("Invalid delivery method".to_string()))?;
    let delivery_address = match delivery_method {
        DeliveryMethod::Doorstep => Some(present(request.delivery_address).ok_or_else(|| {
            AppError::BadRequest("Delivery address is required for doorstep delivery".to_string())
        })?),
        DeliveryMethod::Pickup => None,
    };
    let product_id = Uuid::parse_str(&product_id)
        .map_err(|_| AppError::BadRequest("Invalid product id".to_string()))?;

    Ok(ValidOrder {
        customer_name,
        phone,
        email: present(request.email),
        product_id,
        delivery_method,
        delivery_address,
    })
}

/// Records a checkout: resolves the customer by phone, stores the order and
/// queues the owner alert in the same write.
pub async fn create_order(
    repo: &dyn OrderRepository,
    shop: &ShopConfig,
    request: OrderRequest,
) -> Result<PlacedOrder, AppError> {
    let valid = validate(request)?;

    let product = repo
        .find_product(valid.product_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

    let customer = resolve_customer(repo, &valid).await?;

    let order_id = Uuid::new_v4();
    let order_reference = reference::generate();
    let notification = shop
        .phone
        .as_deref()
        .map(str::trim)
        .filter(|phone| !phone.is_empty())
        .map(|owner_phone| OutboundSms {
            kind: NotificationKind::OwnerNewOrder,
            recipient: owner_phone.to_string(),
            message: templates::owner_new_order(
                &NewOrderSummary {
                    order_id,
                    order_reference: &order_reference,
                    customer_name: &customer.name,
                    phone: &customer.phone,
                    product: &product,
                    delivery_method: valid.delivery_method,
                    delivery_address: valid.delivery_address.as_deref(),
                },
                shop,
            ),
            order_id: Some(order_id),
        });
    if notification.is_none() {
        warn!("Shop phone is not configured, skipping new order alert");
    }

    let order = repo
        .insert_order(
            NewOrderEntity {
                id: order_id,
                order_reference,
                customer_id: customer.id,
                product_id: product.id,
                delivery_method: valid.delivery_method.as_str().to_string(),
                delivery_address: valid.delivery_address,
                status: OrderStatus::Pending.as_str().to_string(),
            },
            notification,
        )
        .await?;

    info!(
        "Order {} placed for {} ({})",
        order.order_reference,
        product.display_name(),
        valid.delivery_method.label()
    );

    Ok(PlacedOrder {
        order,
        product,
        customer,
    })
}

async fn resolve_customer(
    repo: &dyn OrderRepository,
    valid: &ValidOrder,
) -> Result<CustomerEntity, AppError> {
    let Some(existing) = repo.find_customer_by_phone(&valid.phone).await? else {
        return Ok(repo
            .insert_customer(NewCustomerEntity {
                name: valid.customer_name.clone(),
                phone: valid.phone.clone(),
                email: valid.email.clone(),
            })
            .await?);
    };

    let changes = CustomerChangeset {
        name: valid.customer_name.clone(),
        email: valid.email.clone(),
        updated_at: Utc::now(),
    };
    match repo.update_customer(existing.id, changes).await {
        Ok(customer) => Ok(customer),
        Err(err) => {
            warn!("Failed to refresh customer {}: {:#}", existing.id, err);
            Ok(existing)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;

    fn shop(phone: Option<&str>) -> ShopConfig {
        ShopConfig {
            name: "Simu Hub".into(),
            phone: phone.map(str::to_string),
            address: "Store".into(),
            hours: "Mon-Sat: 9AM-6PM".into(),
            app_url: "http://localhost:3000".into(),
        }
    }

    fn product() -> ProductEntity {
        ProductEntity {
            id: Uuid::new_v4(),
            brand: "Acme".into(),
            model: "X1".into(),
            price: 19_999.0,
            storage_capacity: None,
            ram: None,
            has_5g: false,
            color: None,
            image_url: None,
            description: None,
            created_at: Utc::now(),
        }
    }

    fn request(product: &ProductEntity, name: &str, method: &str) -> OrderRequest {
        OrderRequest {
            customer_name: Some(name.into()),
            phone: Some("0700123456".into()),
            email: Some("buyer@example.test".into()),
            product_id: Some(product.id.to_string()),
            delivery_method: Some(method.into()),
            delivery_address: Some("Kilimani, Nairobi".into()),
        }
    }

    #[tokio::test]
    async fn doorstep_order_is_pending_and_alerts_the_owner() {
        let product = product();
        let store = MemoryStore::with_products(vec![product.clone()]);

        let placed = create_order(
            &store,
            &shop(Some("0711000000")),
            request(&product, "Achieng", "doorstep"),
        )
        .await
        .unwrap();

        assert_eq!(placed.order.status, "pending");
        assert_eq!(placed.order.delivery_address.as_deref(), Some("Kilimani, Nairobi"));
        assert!(placed.order.order_reference.starts_with("SH"));
        assert_eq!(placed.product.id, product.id);

        let outbox = store.outbox();
        assert_eq!(outbox.len(), 1);
        let sms: OutboundSms = serde_json::from_str(&outbox[0].payload).unwrap();
        assert_eq!(sms.kind, NotificationKind::OwnerNewOrder);
        assert_eq!(sms.recipient, "0711000000");
        assert_eq!(sms.order_id, Some(placed.order.id));
        assert!(sms.message.contains(&placed.order.order_reference));
        assert!(sms.message.contains("Location: Kilimani, Nairobi"));
    }

    #[tokio::test]
    async fn pickup_drops_the_address() {
        let product = product();
        let store = MemoryStore::with_products(vec![product.clone()]);

        let placed = create_order(
            &store,
            &shop(Some("0711000000")),
            request(&product, "Achieng", "pickup"),
        )
        .await
        .unwrap();

        assert!(placed.order.delivery_address.is_none());
    }

    #[tokio::test]
    async fn same_phone_keeps_one_customer_with_latest_name() {
        let product = product();
        let store = MemoryStore::with_products(vec![product.clone()]);

        let first = create_order(&store, &shop(None), request(&product, "Achieng", "pickup"))
            .await
            .unwrap();
        let mut second_request = request(&product, "Achieng Otieno", "pickup");
        second_request.email = None;
        let second = create_order(&store, &shop(None), second_request).await.unwrap();

        let customers = store.customers();
        assert_eq!(customers.len(), 1);
        assert_eq!(customers[0].name, "Achieng Otieno");
        assert!(customers[0].email.is_none());
        assert_eq!(first.customer.id, second.customer.id);
        assert_ne!(first.order.order_reference, second.order.order_reference);
    }

    #[tokio::test]
    async fn missing_shop_phone_skips_the_alert() {
        let product = product();
        let store = MemoryStore::with_products(vec![product.clone()]);

        create_order(&store, &shop(None), request(&product, "Achieng", "pickup"))
            .await
            .unwrap();

        assert!(store.outbox().is_empty());
    }

    #[tokio::test]
    async fn validation_fails_before_any_write() {
        let product = product();
        let store = MemoryStore::with_products(vec![product.clone()]);

        let mut blank_name = request(&product, "  ", "doorstep");
        blank_name.customer_name = Some("  ".into());
        let mut no_address = request(&product, "Achieng", "doorstep");
        no_address.delivery_address = None;

        for bad in [
            blank_name,
            no_address,
            request(&product, "Achieng", "courier"),
            OrderRequest::default(),
        ] {
            let err = create_order(&store, &shop(Some("0711000000")), bad)
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::BadRequest(_)));
        }

        assert!(store.customers().is_empty());
        assert!(store.outbox().is_empty());
    }

    #[tokio::test]
    async fn unknown_product_is_not_found_and_writes_nothing() {
        let store = MemoryStore::default();

        let err = create_order(
            &store,
            &shop(Some("0711000000")),
            request(&product(), "Achieng", "pickup"),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
        assert!(store.customers().is_empty());
    }
}
