use std::{sync::Arc, time::Duration};

use anyhow::Result;
use tokio::{task::JoinHandle, time::MissedTickBehavior};
use tracing::{debug, error, info};

use crate::{
    platform::config::RelayConfig,
    sms::{NotificationGateway, OutboundSms},
    store::{OutboxStatus, OutboxStore},
};

/// Claims one batch of pending outbox rows and hands each to the gateway.
///
/// Every claimed row ends up `SENT` or `FAILED`; nothing is retried. Returns
/// how many rows were claimed.
pub async fn drain_once(
    outbox: &dyn OutboxStore,
    gateway: &NotificationGateway,
    batch_size: i64,
) -> Result<usize> {
    let events = outbox.claim_pending(batch_size).await?;
    let claimed = events.len();

    for event in events {
        info!("Received event: {} #{}", event.event_type, event.id);

        let status = match serde_json::from_str::<OutboundSms>(&event.payload) {
            Ok(sms) if gateway.deliver(&sms).await.is_sent() => OutboxStatus::Sent,
            Ok(_) => OutboxStatus::Failed,
            Err(err) => {
                error!("Outbox event #{} has an unreadable payload: {}", event.id, err);
                OutboxStatus::Failed
            }
        };

        if let Err(err) = outbox.mark(event.id, status).await {
            error!("Failed to mark outbox event #{}: {:#}", event.id, err);
        }
    }

    Ok(claimed)
}

/// Polls the outbox forever on the current runtime.
pub fn spawn_relay(
    outbox: Arc<dyn OutboxStore>,
    gateway: Arc<NotificationGateway>,
    config: RelayConfig,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let period = Duration::from_millis(config.poll_interval_ms.max(1));
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            match drain_once(outbox.as_ref(), &gateway, config.batch_size).await {
                Ok(0) => {}
                Ok(count) => debug!("Relayed {} outbox events", count),
                Err(err) => error!("Outbox relay failed: {:#}", err),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::{
        sms::{NotificationKind, SmsConfig, provider::RecordingTransport},
        store::memory::MemoryStore,
    };

    fn gateway(
        store: Arc<MemoryStore>,
        transport: Arc<RecordingTransport>,
    ) -> NotificationGateway {
        NotificationGateway::new(
            SmsConfig {
                endpoint: "http://sms.invalid".into(),
                api_key: Some("key".into()),
                shortcode: "SIMUHUB".into(),
            },
            transport,
            store,
        )
    }

    fn sms(recipient: &str) -> String {
        serde_json::to_string(&OutboundSms {
            kind: NotificationKind::OrderDispatched,
            recipient: recipient.into(),
            message: "Your order is on the way".into(),
            order_id: Some(Uuid::new_v4()),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn sent_rows_are_marked_sent_once() {
        let store = Arc::new(MemoryStore::default());
        let transport = Arc::new(RecordingTransport::accepting());
        let gateway = gateway(store.clone(), transport.clone());
        store.push_outbox("sms.order_dispatched", &sms("0700000001"));
        store.push_outbox("sms.order_dispatched", &sms("0700000002"));

        assert_eq!(drain_once(store.as_ref(), &gateway, 10).await.unwrap(), 2);
        assert_eq!(drain_once(store.as_ref(), &gateway, 10).await.unwrap(), 0);

        assert!(store.outbox().iter().all(|e| e.status == "SENT"));
        let recipients: Vec<_> = transport.requests().into_iter().map(|r| r.mobile).collect();
        assert_eq!(recipients, vec!["0700000001", "0700000002"]);
        assert_eq!(store.sms_logs().len(), 2);
    }

    #[tokio::test]
    async fn failures_are_not_retried() {
        let store = Arc::new(MemoryStore::default());
        let transport = Arc::new(RecordingTransport::unreachable());
        let gateway = gateway(store.clone(), transport.clone());
        store.push_outbox("sms.order_dispatched", &sms("0700000001"));

        drain_once(store.as_ref(), &gateway, 10).await.unwrap();
        drain_once(store.as_ref(), &gateway, 10).await.unwrap();

        assert_eq!(store.outbox()[0].status, "FAILED");
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn unreadable_payloads_fail_without_a_send() {
        let store = Arc::new(MemoryStore::default());
        let transport = Arc::new(RecordingTransport::accepting());
        let gateway = gateway(store.clone(), transport.clone());
        store.push_outbox("sms.order_dispatched", "{not json");

        drain_once(store.as_ref(), &gateway, 10).await.unwrap();

        assert_eq!(store.outbox()[0].status, "FAILED");
        assert!(transport.requests().is_empty());
        assert!(store.sms_logs().is_empty());
    }

    #[tokio::test]
    async fn batch_size_limits_each_pass() {
        let store = Arc::new(MemoryStore::default());
        let gateway = gateway(store.clone(), Arc::new(RecordingTransport::accepting()));
        for i in 0..3 {
            store.push_outbox("sms.order_dispatched", &sms(&format!("07000000{i:02}")));
        }

        assert_eq!(drain_once(store.as_ref(), &gateway, 2).await.unwrap(), 2);
        assert_eq!(drain_once(store.as_ref(), &gateway, 2).await.unwrap(), 1);
    }
}
