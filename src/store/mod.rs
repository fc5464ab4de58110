//! Storage seams used by the order workflow, order feedback, the outbox relay
//! and the SMS gateway.
//!
//! [`pg::PgStore`] backs them with PostgreSQL; [`memory::MemoryStore`] keeps
//! everything in process for tests.

pub mod memory;
pub mod pg;

use anyhow::Result;
use futures::future::BoxFuture;
use uuid::Uuid;

use crate::{
    models::{
        CustomerChangeset, CustomerEntity, FeedbackEntity, NewCustomerEntity, NewFeedbackEntity,
        NewOrderEntity, NewSmsLogEntity, OrderDetail, OrderEntity, OutboxEntity, ProductEntity,
        StatusChangeset,
    },
    sms::OutboundSms,
};

pub trait OrderRepository: Send + Sync {
    fn find_order_detail(&self, id: Uuid) -> BoxFuture<'_, Result<Option<OrderDetail>>>;

    /// Writes the status change and enqueues its notification atomically.
    /// Returns `None` when the order does not exist.
    fn apply_status_change(
        &self,
        id: Uuid,
        changes: StatusChangeset,
        notification: Option<OutboundSms>,
    ) -> BoxFuture<'_, Result<Option<OrderEntity>>>;

    fn find_product(&self, id: Uuid) -> BoxFuture<'_, Result<Option<ProductEntity>>>;

    fn find_customer_by_phone<'a>(
        &'a self,
        phone: &'a str,
    ) -> BoxFuture<'a, Result<Option<CustomerEntity>>>;

    fn insert_customer(&self, customer: NewCustomerEntity) -> BoxFuture<'_, Result<CustomerEntity>>;

    fn update_customer(
        &self,
        id: Uuid,
        changes: CustomerChangeset,
    ) -> BoxFuture<'_, Result<CustomerEntity>>;

    /// Inserts the order and enqueues its notification atomically.
    fn insert_order(
        &self,
        order: NewOrderEntity,
        notification: Option<OutboundSms>,
    ) -> BoxFuture<'_, Result<OrderEntity>>;
}

pub trait FeedbackRepository: Send + Sync {
    fn order_exists(&self, order_id: Uuid) -> BoxFuture<'_, Result<bool>>;

    fn find_feedback(&self, order_id: Uuid) -> BoxFuture<'_, Result<Option<FeedbackEntity>>>;

    /// Returns `None` when the order already has feedback.
    fn insert_feedback(
        &self,
        feedback: NewFeedbackEntity,
    ) -> BoxFuture<'_, Result<Option<FeedbackEntity>>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutboxStatus {
    Pending,
    Processing,
    Sent,
    Failed,
}

impl OutboxStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OutboxStatus::Pending => "PENDING",
            OutboxStatus::Processing => "PROCESSING",
            OutboxStatus::Sent => "SENT",
            OutboxStatus::Failed => "FAILED",
        }
    }
}

pub trait OutboxStore: Send + Sync {
    /// Moves up to `limit` pending rows, oldest first, to `PROCESSING` and returns them.
    fn claim_pending(&self, limit: i64) -> BoxFuture<'_, Result<Vec<OutboxEntity>>>;

    fn mark(&self, id: i32, status: OutboxStatus) -> BoxFuture<'_, Result<()>>;
}

pub trait SmsLogStore: Send + Sync {
    fn append(&self, entry: NewSmsLogEntity) -> BoxFuture<'_, Result<()>>;
}
