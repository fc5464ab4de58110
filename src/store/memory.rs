use std::sync::{Mutex, MutexGuard};

use anyhow::{Result, anyhow};
use chrono::Utc;
use futures::future::BoxFuture;
use uuid::Uuid;

use crate::{
    models::{
        CustomerChangeset, CustomerEntity, FeedbackEntity, NewCustomerEntity, NewFeedbackEntity,
        NewOrderEntity, NewSmsLogEntity, OrderDetail, OrderEntity, OutboxEntity, ProductEntity,
        StatusChangeset,
    },
    sms::OutboundSms,
    store::{FeedbackRepository, OrderRepository, OutboxStatus, OutboxStore, SmsLogStore},
};

#[derive(Default)]
struct State {
    products: Vec<ProductEntity>,
    customers: Vec<CustomerEntity>,
    orders: Vec<OrderEntity>,
    feedback: Vec<FeedbackEntity>,
    outbox: Vec<OutboxEntity>,
    sms_logs: Vec<NewSmsLogEntity>,
}

/// In-process store with the same contracts as [`super::pg::PgStore`].
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn with_products(products: Vec<ProductEntity>) -> Self {
        Self {
            state: Mutex::new(State {
                products,
                ..State::default()
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn order(&self, id: Uuid) -> Option<OrderEntity> {
        self.lock().orders.iter().find(|o| o.id == id).cloned()
    }

    pub fn customers(&self) -> Vec<CustomerEntity> {
        self.lock().customers.clone()
    }

    pub fn outbox(&self) -> Vec<OutboxEntity> {
        self.lock().outbox.clone()
    }

    pub fn sms_logs(&self) -> Vec<NewSmsLogEntity> {
        self.lock().sms_logs.clone()
    }

    /// Enqueues a raw outbox row, bypassing any order write.
    pub fn push_outbox(&self, event_type: &str, payload: &str) -> i32 {
        let mut state = self.lock();
        enqueue(&mut state, event_type, payload.to_string())
    }
}

fn enqueue(state: &mut State, event_type: &str, payload: String) -> i32 {
    let now = Utc::now();
    let id = state.outbox.len() as i32 + 1;
    state.outbox.push(OutboxEntity {
        id,
        event_type: event_type.to_string(),
        payload,
        status: OutboxStatus::Pending.as_str().to_string(),
        created_at: now,
        updated_at: now,
    });
    id
}

fn enqueue_sms(state: &mut State, sms: &OutboundSms) -> Result<()> {
    let payload = serde_json::to_string(sms)?;
    enqueue(state, sms.kind.event_type(), payload);
    Ok(())
}

impl OrderRepository for MemoryStore {
    fn find_order_detail(&self, id: Uuid) -> BoxFuture<'_, Result<Option<OrderDetail>>> {
        Box::pin(async move {
            let state = self.lock();
            let Some(order) = state.orders.iter().find(|o| o.id == id).cloned() else {
                return Ok(None);
            };
            let customer = state
                .customers
                .iter()
                .find(|c| c.id == order.customer_id)
                .cloned()
                .ok_or_else(|| anyhow!("customer {} missing", order.customer_id))?;
            let product = state
                .products
                .iter()
                .find(|p| p.id == order.product_id)
                .cloned()
                .ok_or_else(|| anyhow!("product {} missing", order.product_id))?;

            Ok(Some(OrderDetail {
                order,
                customer,
                product,
            }))
        })
    }

    fn apply_status_change(
        &self,
        id: Uuid,
        changes: StatusChangeset,
        notification: Option<OutboundSms>,
    ) -> BoxFuture<'_, Result<Option<OrderEntity>>> {
        Box::pin(async move {
            let mut state = self.lock();
            let Some(order) = state.orders.iter_mut().find(|o| o.id == id) else {
                return Ok(None);
            };

            order.status = changes.status;
            order.updated_at = changes.updated_at;
            if let Some(at) = changes.dispatched_at {
                order.dispatched_at = Some(at);
            }
            if let Some(at) = changes.completed_at {
                order.completed_at = Some(at);
            }
            let updated = order.clone();

            if let Some(sms) = &notification {
                enqueue_sms(&mut state, sms)?;
            }
            Ok(Some(updated))
        })
    }

    fn find_product(&self, id: Uuid) -> BoxFuture<'_, Result<Option<ProductEntity>>> {
        Box::pin(async move { Ok(self.lock().products.iter().find(|p| p.id == id).cloned()) })
    }

    fn find_customer_by_phone<'a>(
        &'a self,
        phone: &'a str,
    ) -> BoxFuture<'a, Result<Option<CustomerEntity>>> {
        Box::pin(async move {
            Ok(self
                .lock()
                .customers
                .iter()
                .find(|c| c.phone == phone)
                .cloned())
        })
    }

    fn insert_customer(&self, customer: NewCustomerEntity) -> BoxFuture<'_, Result<CustomerEntity>> {
        Box::pin(async move {
            let now = Utc::now();
            let customer = CustomerEntity {
                id: Uuid::new_v4(),
                name: customer.name,
                phone: customer.phone,
                email: customer.email,
                created_at: now,
                updated_at: now,
            };
            self.lock().customers.push(customer.clone());
            Ok(customer)
        })
    }

    fn update_customer(
        &self,
        id: Uuid,
        changes: CustomerChangeset,
    ) -> BoxFuture<'_, Result<CustomerEntity>> {
        Box::pin(async move {
            let mut state = self.lock();
            let customer = state
                .customers
                .iter_mut()
                .find(|c| c.id == id)
                .ok_or_else(|| anyhow!("customer {id} missing"))?;
            customer.name = changes.name;
            customer.email = changes.email;
            customer.updated_at = changes.updated_at;
            Ok(customer.clone())
        })
    }

    fn insert_order(
        &self,
        order: NewOrderEntity,
        notification: Option<OutboundSms>,
    ) -> BoxFuture<'_, Result<OrderEntity>> {
        Box::pin(async move {
            let mut state = self.lock();
            if state
                .orders
                .iter()
                .any(|o| o.order_reference == order.order_reference)
            {
                return Err(anyhow!(
                    "duplicate order reference {}",
                    order.order_reference
                ));
            }

            let now = Utc::now();
            let order = OrderEntity {
                id: order.id,
                order_reference: order.order_reference,
                customer_id: order.customer_id,
                product_id: order.product_id,
                delivery_method: order.delivery_method,
                delivery_address: order.delivery_address,
                status: order.status,
                created_at: now,
                updated_at: now,
                dispatched_at: None,
                completed_at: None,
            };
            state.orders.push(order.clone());

            if let Some(sms) = &notification {
                enqueue_sms(&mut state, sms)?;
            }
            Ok(order)
        })
    }
}

impl FeedbackRepository for MemoryStore {
    fn order_exists(&self, order_id: Uuid) -> BoxFuture<'_, Result<bool>> {
        Box::pin(async move { Ok(self.lock().orders.iter().any(|o| o.id == order_id)) })
    }

    fn find_feedback(&self, order_id: Uuid) -> BoxFuture<'_, Result<Option<FeedbackEntity>>> {
        Box::pin(async move {
            Ok(self
                .lock()
                .feedback
                .iter()
                .find(|f| f.order_id == order_id)
                .cloned())
        })
    }

    fn insert_feedback(
        &self,
        entry: NewFeedbackEntity,
    ) -> BoxFuture<'_, Result<Option<FeedbackEntity>>> {
        Box::pin(async move {
            let mut state = self.lock();
            if state.feedback.iter().any(|f| f.order_id == entry.order_id) {
                return Ok(None);
            }

            let stored = FeedbackEntity {
                id: Uuid::new_v4(),
                order_id: entry.order_id,
                overall_rating: entry.overall_rating,
                product_rating: entry.product_rating,
                delivery_rating: entry.delivery_rating,
                comments: entry.comments,
                would_recommend: entry.would_recommend,
                created_at: Utc::now(),
            };
            state.feedback.push(stored.clone());
            Ok(Some(stored))
        })
    }
}

impl OutboxStore for MemoryStore {
    fn claim_pending(&self, limit: i64) -> BoxFuture<'_, Result<Vec<OutboxEntity>>> {
        Box::pin(async move {
            let mut state = self.lock();
            let limit = usize::try_from(limit).unwrap_or_default();
            let now = Utc::now();

            Ok(state
                .outbox
                .iter_mut()
                .filter(|event| event.status == OutboxStatus::Pending.as_str())
                .take(limit)
                .map(|event| {
                    event.status = OutboxStatus::Processing.as_str().to_string();
                    event.updated_at = now;
                    event.clone()
                })
                .collect())
        })
    }

    fn mark(&self, id: i32, status: OutboxStatus) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            let mut state = self.lock();
            let event = state
                .outbox
                .iter_mut()
                .find(|event| event.id == id)
                .ok_or_else(|| anyhow!("outbox event {id} missing"))?;
            event.status = status.as_str().to_string();
            event.updated_at = Utc::now();
            Ok(())
        })
    }
}

impl SmsLogStore for MemoryStore {
    fn append(&self, entry: NewSmsLogEntity) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            self.lock().sms_logs.push(entry);
            Ok(())
        })
    }
}
