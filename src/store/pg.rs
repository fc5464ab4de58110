use anyhow::{Context, Result};
use diesel::{
    ExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper,
    result::{DatabaseErrorKind, Error as DieselError},
};
use diesel_async::{AsyncConnection, RunQueryDsl};
use futures::future::BoxFuture;
use uuid::Uuid;

use crate::{
    models::{
        CustomerChangeset, CustomerEntity, FeedbackEntity, NewCustomerEntity, NewFeedbackEntity,
        NewOrderEntity, NewSmsLogEntity, OrderDetail, OrderEntity, OutboxEntity, ProductEntity,
        StatusChangeset,
    },
    platform::{db::DbPool, outbox::publish},
    schema::{customers, feedback, orders, outbox, products, sms_logs},
    sms::OutboundSms,
    store::{FeedbackRepository, OrderRepository, OutboxStatus, OutboxStore, SmsLogStore},
};

/// PostgreSQL-backed store over the shared connection pool.
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl OrderRepository for PgStore {
    fn find_order_detail(&self, id: Uuid) -> BoxFuture<'_, Result<Option<OrderDetail>>> {
        Box::pin(async move {
            let conn = &mut self
                .pool
                .get()
                .await
                .context("Failed to obtain a DB connection pool")?;

            let row: Option<(OrderEntity, CustomerEntity, ProductEntity)> = orders::table
                .inner_join(customers::table)
                .inner_join(products::table)
                .filter(orders::id.eq(id))
                .select((
                    OrderEntity::as_select(),
                    CustomerEntity::as_select(),
                    ProductEntity::as_select(),
                ))
                .first(conn)
                .await
                .optional()
                .context("Failed to get order")?;

            Ok(row.map(|(order, customer, product)| OrderDetail {
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
            let conn = &mut self
                .pool
                .get()
                .await
                .context("Failed to obtain a DB connection pool")?;

            conn.transaction(move |conn| {
                Box::pin(async move {
                    let updated: Option<OrderEntity> = diesel::update(orders::table.find(id))
                        .set(&changes)
                        .returning(OrderEntity::as_returning())
                        .get_result(conn)
                        .await
                        .optional()
                        .context("Failed to update order status")?;

                    if let (Some(_), Some(sms)) = (&updated, &notification) {
                        publish(conn, sms.kind.event_type(), sms).await?;
                    }

                    Ok::<Option<OrderEntity>, anyhow::Error>(updated)
                })
            })
            .await
        })
    }

    fn find_product(&self, id: Uuid) -> BoxFuture<'_, Result<Option<ProductEntity>>> {
        Box::pin(async move {
            let conn = &mut self
                .pool
                .get()
                .await
                .context("Failed to obtain a DB connection pool")?;

            products::table
                .find(id)
                .select(ProductEntity::as_select())
                .first(conn)
                .await
                .optional()
                .context("Failed to get product")
        })
    }

    fn find_customer_by_phone<'a>(
        &'a self,
        phone: &'a str,
    ) -> BoxFuture<'a, Result<Option<CustomerEntity>>> {
        Box::pin(async move {
            let conn = &mut self
                .pool
                .get()
                .await
                .context("Failed to obtain a DB connection pool")?;

            customers::table
                .filter(customers::phone.eq(phone))
                .order_by(customers::created_at.asc())
                .select(CustomerEntity::as_select())
                .first(conn)
                .await
                .optional()
                .context("Failed to look up customer")
        })
    }

    fn insert_customer(&self, customer: NewCustomerEntity) -> BoxFuture<'_, Result<CustomerEntity>> {
        Box::pin(async move {
            let conn = &mut self
                .pool
                .get()
                .await
                .context("Failed to obtain a DB connection pool")?;

            diesel::insert_into(customers::table)
                .values(&customer)
                .returning(CustomerEntity::as_returning())
                .get_result(conn)
                .await
                .context("Failed to create customer")
        })
    }

    fn update_customer(
        &self,
        id: Uuid,
        changes: CustomerChangeset,
    ) -> BoxFuture<'_, Result<CustomerEntity>> {
        Box::pin(async move {
            let conn = &mut self
                .pool
                .get()
                .await
                .context("Failed to obtain a DB connection pool")?;

            diesel::update(customers::table.find(id))
                .set(&changes)
                .returning(CustomerEntity::as_returning())
                .get_result(conn)
                .await
                .context("Failed to update customer")
        })
    }

    fn insert_order(
        &self,
        order: NewOrderEntity,
        notification: Option<OutboundSms>,
    ) -> BoxFuture<'_, Result<OrderEntity>> {
        Box::pin(async move {
            let conn = &mut self
                .pool
                .get()
                .await
                .context("Failed to obtain a DB connection pool")?;

            conn.transaction(move |conn| {
                Box::pin(async move {
                    let order = diesel::insert_into(orders::table)
                        .values(&order)
                        .returning(OrderEntity::as_returning())
                        .get_result(conn)
                        .await
                        .context("Failed to create order")?;

                    if let Some(sms) = &notification {
                        publish(conn, sms.kind.event_type(), sms).await?;
                    }

                    Ok::<OrderEntity, anyhow::Error>(order)
                })
            })
            .await
        })
    }
}

impl FeedbackRepository for PgStore {
    fn order_exists(&self, order_id: Uuid) -> BoxFuture<'_, Result<bool>> {
        Box::pin(async move {
            let conn = &mut self
                .pool
                .get()
                .await
                .context("Failed to obtain a DB connection pool")?;

            let order: Option<Uuid> = orders::table
                .find(order_id)
                .select(orders::id)
                .first(conn)
                .await
                .optional()
                .context("Failed to get order")?;

            Ok(order.is_some())
        })
    }

    fn find_feedback(&self, order_id: Uuid) -> BoxFuture<'_, Result<Option<FeedbackEntity>>> {
        Box::pin(async move {
            let conn = &mut self
                .pool
                .get()
                .await
                .context("Failed to obtain a DB connection pool")?;

            feedback::table
                .filter(feedback::order_id.eq(order_id))
                .select(FeedbackEntity::as_select())
                .first(conn)
                .await
                .optional()
                .context("Failed to get feedback")
        })
    }

    fn insert_feedback(
        &self,
        entry: NewFeedbackEntity,
    ) -> BoxFuture<'_, Result<Option<FeedbackEntity>>> {
        Box::pin(async move {
            let conn = &mut self
                .pool
                .get()
                .await
                .context("Failed to obtain a DB connection pool")?;

            match diesel::insert_into(feedback::table)
                .values(&entry)
                .returning(FeedbackEntity::as_returning())
                .get_result(conn)
                .await
            {
                Ok(stored) => Ok(Some(stored)),
                Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => Ok(None),
                Err(err) => Err(anyhow::Error::new(err).context("Failed to store feedback")),
            }
        })
    }
}

impl OutboxStore for PgStore {
    fn claim_pending(&self, limit: i64) -> BoxFuture<'_, Result<Vec<OutboxEntity>>> {
        Box::pin(async move {
            let conn = &mut self
                .pool
                .get()
                .await
                .context("Failed to obtain a DB connection pool")?;

            let mut claimed = conn
                .transaction(move |conn| {
                    Box::pin(async move {
                        let ids: Vec<i32> = outbox::table
                            .filter(outbox::status.eq(OutboxStatus::Pending.as_str()))
                            .order_by(outbox::created_at.asc())
                            .select(outbox::id)
                            .limit(limit)
                            .for_update()
                            .skip_locked()
                            .load(conn)
                            .await
                            .context("Failed to select pending outbox events")?;

                        if ids.is_empty() {
                            return Ok::<Vec<OutboxEntity>, anyhow::Error>(Vec::new());
                        }

                        diesel::update(outbox::table.filter(outbox::id.eq_any(&ids)))
                            .set((
                                outbox::status.eq(OutboxStatus::Processing.as_str()),
                                outbox::updated_at.eq(diesel::dsl::now),
                            ))
                            .returning(OutboxEntity::as_returning())
                            .get_results(conn)
                            .await
                            .context("Failed to claim outbox events")
                    })
                })
                .await?;

            claimed.sort_by_key(|event| (event.created_at, event.id));
            Ok(claimed)
        })
    }

    fn mark(&self, id: i32, status: OutboxStatus) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            let conn = &mut self
                .pool
                .get()
                .await
                .context("Failed to obtain a DB connection pool")?;

            diesel::update(outbox::table.find(id))
                .set((
                    outbox::status.eq(status.as_str()),
                    outbox::updated_at.eq(diesel::dsl::now),
                ))
                .execute(conn)
                .await
                .context("Failed to update outbox event")?;

            Ok(())
        })
    }
}

impl SmsLogStore for PgStore {
    fn append(&self, entry: NewSmsLogEntity) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            let conn = &mut self
                .pool
                .get()
                .await
                .context("Failed to obtain a DB connection pool")?;

            diesel::insert_into(sms_logs::table)
                .values(&entry)
                .execute(conn)
                .await
                .context("Failed to insert SMS log")?;

            Ok(())
        })
    }
}
