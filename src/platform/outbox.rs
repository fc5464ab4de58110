use anyhow::{Context, Result};
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::Serialize;

use crate::{models::NewOutboxEntity, schema::outbox, store::OutboxStatus};

/// Enqueues an event in the outbox on the caller's connection, so it commits
/// or rolls back together with the surrounding transaction.
pub async fn publish<T: Serialize>(
    conn: &mut AsyncPgConnection,
    event_type: &str,
    payload: &T,
) -> Result<()> {
    let payload = serde_json::to_string(payload).context("Failed to serialize outbox payload")?;

    diesel::insert_into(outbox::table)
        .values(NewOutboxEntity {
            event_type: event_type.to_string(),
            payload,
            status: OutboxStatus::Pending.as_str().to_string(),
        })
        .execute(conn)
        .await
        .context("Failed to insert outbox event")?;

    Ok(())
}
