//! Ratings validation, averages and CSV exports for order and general feedback.

use anyhow::{Context, Result};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    models::{FeedbackEntity, GeneralFeedbackEntity, NewFeedbackEntity},
    platform::app_error::AppError,
    store::FeedbackRepository,
};

/// Accepts whole-star ratings only.
pub fn rating(field: &str, value: Option<i64>) -> Result<i32, AppError> {
    match value {
        Some(v @ 1..=5) => Ok(v as i32),
        Some(_) => Err(AppError::BadRequest(format!("{field} must be between 1 and 5"))),
        None => Err(AppError::BadRequest(format!("{field} is required"))),
    }
}

/// Stores the only feedback an existing order can receive.
pub async fn submit(
    repo: &dyn FeedbackRepository,
    entry: NewFeedbackEntity,
) -> Result<FeedbackEntity, AppError> {
    let order_id = entry.order_id;
    if !repo.order_exists(order_id).await? {
        return Err(AppError::NotFound("Order not found".to_string()));
    }

    let already_submitted =
        || AppError::BadRequest("Feedback already submitted for this order".to_string());
    if repo.find_feedback(order_id).await?.is_some() {
        return Err(already_submitted());
    }
    let stored = repo
        .insert_feedback(entry)
        .await?
        .ok_or_else(already_submitted)?;

    tracing::info!("Feedback received for order {}", order_id);
    Ok(stored)
}

pub async fn for_order(
    repo: &dyn FeedbackRepository,
    order_id: Uuid,
) -> Result<FeedbackEntity, AppError> {
    repo.find_feedback(order_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Feedback not found".to_string()))
}

/// Order feedback with the order and product it refers to.
#[derive(Serialize, Debug, Clone, ToSchema)]
pub struct FeedbackRow {
    #[serde(flatten)]
    pub feedback: FeedbackEntity,
    pub order_reference: String,
    pub product: String,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, ToSchema)]
pub struct Averages {
    pub overall: f64,
    pub product: f64,
    pub delivery: f64,
}

fn two_decimals(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn mean(values: impl Iterator<Item = i32>) -> Option<f64> {
    let (sum, count) = values.fold((0i64, 0u32), |(sum, count), v| (sum + v as i64, count + 1));
    (count > 0).then(|| two_decimals(sum as f64 / count as f64))
}

/// Zero across the board when there is nothing to average.
pub fn averages(rows: &[FeedbackRow]) -> Averages {
    let avg = |pick: fn(&FeedbackEntity) -> i32| {
        mean(rows.iter().map(|row| pick(&row.feedback))).unwrap_or(0.0)
    };

    Averages {
        overall: avg(|f| f.overall_rating),
        product: avg(|f| f.product_rating),
        delivery: avg(|f| f.delivery_rating),
    }
}

/// Mean over the entries that carry a rating.
pub fn general_average(rows: &[GeneralFeedbackEntity]) -> Option<f64> {
    mean(rows.iter().filter_map(|row| row.rating))
}

fn yes_no(value: Option<bool>) -> &'static str {
    match value {
        Some(true) => "Yes",
        Some(false) => "No",
        None => "N/A",
    }
}

pub fn feedback_csv(rows: &[FeedbackRow]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "Order ID",
        "Product",
        "Date",
        "Overall Rating",
        "Product Rating",
        "Delivery Rating",
        "Would Recommend",
        "Comments",
    ])?;

    for row in rows {
        let f = &row.feedback;
        writer.write_record([
            row.order_reference.clone(),
            row.product.clone(),
            f.created_at.format("%Y-%m-%d").to_string(),
            f.overall_rating.to_string(),
            f.product_rating.to_string(),
            f.delivery_rating.to_string(),
            yes_no(f.would_recommend).to_string(),
            f.comments.clone().unwrap_or_default(),
        ])?;
    }

    finish(writer)
}

pub fn general_feedback_csv(rows: &[GeneralFeedbackEntity]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["Name", "Email", "Phone", "Rating", "Date", "Message"])?;

    for row in rows {
        writer.write_record([
            row.name.clone(),
            row.email.clone().unwrap_or_else(|| "N/A".to_string()),
            row.phone.clone().unwrap_or_else(|| "N/A".to_string()),
            row.rating.map_or_else(|| "N/A".to_string(), |r| r.to_string()),
            row.created_at.format("%Y-%m-%d").to_string(),
            row.message.clone(),
        ])?;
    }

    finish(writer)
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<String> {
    let bytes = writer
        .into_inner()
        .map_err(|err| err.into_error())
        .context("Failed to flush CSV")?;
    String::from_utf8(bytes).context("CSV output is not UTF-8")
}
