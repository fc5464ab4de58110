use chrono::{DateTime, Utc};
use diesel::{
    Selectable,
    prelude::{AsChangeset, Identifiable, Insertable, Queryable},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

// Customers

#[derive(Queryable, Selectable, Identifiable, Serialize, Deserialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::customers)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CustomerEntity {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::customers)]
pub struct NewCustomerEntity {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
}

/// Last-write-wins identity update: a missing email clears the stored one.
#[derive(AsChangeset, Debug, Clone)]
#[diesel(table_name = crate::schema::customers)]
#[diesel(treat_none_as_null = true)]
pub struct CustomerChangeset {
    pub name: String,
    pub email: Option<String>,
    pub updated_at: DateTime<Utc>,
}

// Products

#[derive(Queryable, Selectable, Identifiable, Serialize, Deserialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::products)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProductEntity {
    pub id: Uuid,
    pub brand: String,
    pub model: String,
    pub price: f64,
    pub storage_capacity: Option<String>,
    pub ram: Option<String>,
    pub has_5g: bool,
    pub color: Option<String>,
    pub image_url: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ProductEntity {
    /// Short description used in messages, e.g. `Acme X1`.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.brand, self.model)
    }
}

// Orders

#[derive(Queryable, Selectable, Identifiable, Serialize, Deserialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderEntity {
    pub id: Uuid,
    pub order_reference: String,
    pub customer_id: Uuid,
    pub product_id: Uuid,
    pub delivery_method: String,
    pub delivery_address: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub dispatched_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewOrderEntity {
    pub id: Uuid,
    pub order_reference: String,
    pub customer_id: Uuid,
    pub product_id: Uuid,
    pub delivery_method: String,
    pub delivery_address: Option<String>,
    pub status: String,
}

/// Columns written by a status transition. `None` timestamps are left untouched.
#[derive(AsChangeset, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::orders)]
pub struct StatusChangeset {
    pub status: String,
    pub dispatched_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

/// An order joined with the rows its notifications need.
#[derive(Serialize, Debug, Clone, ToSchema)]
pub struct OrderDetail {
    pub order: OrderEntity,
    pub customer: CustomerEntity,
    pub product: ProductEntity,
}

// Feedback

#[derive(Queryable, Selectable, Identifiable, Serialize, Deserialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::feedback)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct FeedbackEntity {
    pub id: Uuid,
    pub order_id: Uuid,
    pub overall_rating: i32,
    pub product_rating: i32,
    pub delivery_rating: i32,
    pub comments: Option<String>,
    pub would_recommend: Option<bool>,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::feedback)]
pub struct NewFeedbackEntity {
    pub order_id: Uuid,
    pub overall_rating: i32,
    pub product_rating: i32,
    pub delivery_rating: i32,
    pub comments: Option<String>,
    pub would_recommend: Option<bool>,
}

#[derive(Queryable, Selectable, Identifiable, Serialize, Deserialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::general_feedback)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct GeneralFeedbackEntity {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub message: String,
    pub rating: Option<i32>,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::general_feedback)]
pub struct NewGeneralFeedbackEntity {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub message: String,
    pub rating: Option<i32>,
}

// SMS logs

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::sms_logs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct SmsLogEntity {
    pub id: Uuid,
    pub order_id: Option<Uuid>,
    pub recipient_phone: String,
    pub message_type: String,
    pub message_content: String,
    pub status: String,
    pub response: Option<String>,
    pub sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::sms_logs)]
pub struct NewSmsLogEntity {
    pub order_id: Option<Uuid>,
    pub recipient_phone: String,
    pub message_type: String,
    pub message_content: String,
    pub status: String,
    pub response: Option<String>,
    pub sent_at: Option<DateTime<Utc>>,
}

// Admins

#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = crate::schema::admins)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct AdminEntity {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

// Outbox

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone)]
#[diesel(table_name = crate::schema::outbox)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OutboxEntity {
    pub id: i32,
    pub event_type: String,
    pub payload: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::outbox)]
pub struct NewOutboxEntity {
    pub event_type: String,
    pub payload: String,
    pub status: String,
}
