use std::sync::Arc;

use chrono::Utc;
use serde_json::{Value, json};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::{
    models::NewSmsLogEntity,
    sms::{OutboundSms, SmsConfig, provider},
    store::SmsLogStore,
};

use super::{ProviderRequest, SmsTransport};

/// Why a message was not delivered to the provider.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SmsFailure {
    #[error("{0}")]
    InvalidInput(&'static str),
    #[error("SMS service not configured")]
    NotConfigured,
    #[error("sender id is not registered with the provider: {0}")]
    InvalidSender(String),
    #[error("invalid mobile number: {0}")]
    InvalidPhone(String),
    #[error("insufficient SMS credit: {0}")]
    InsufficientCredit(String),
    #[error("invalid provider credentials: {0}")]
    InvalidCredentials(String),
    #[error("provider rejected the message (code {code}): {description}")]
    Rejected { code: String, description: String },
    #[error("provider returned HTTP {status}: {description}")]
    Http { status: u16, description: String },
    #[error("provider unreachable: {0}")]
    Unreachable(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    Sent {
        response: Value,
    },
    Failed {
        reason: SmsFailure,
        response: Option<Value>,
    },
}

impl SendOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, SendOutcome::Sent { .. })
    }

    fn failed(reason: SmsFailure, response: Option<Value>) -> Self {
        SendOutcome::Failed { reason, response }
    }
}

/// Sends one text message per call and records every attempt in the SMS log.
///
/// Never returns an error: every problem is reported as [`SendOutcome::Failed`]
/// so callers decide whether it matters.
pub struct NotificationGateway {
    config: SmsConfig,
    transport: Arc<dyn SmsTransport>,
    log: Arc<dyn SmsLogStore>,
}

impl NotificationGateway {
    pub fn new(
        config: SmsConfig,
        transport: Arc<dyn SmsTransport>,
        log: Arc<dyn SmsLogStore>,
    ) -> Self {
        Self {
            config,
            transport,
            log,
        }
    }

    pub async fn send(&self, recipient: &str, message: &str, order_id: Option<Uuid>) -> SendOutcome {
        self.dispatch("notification", recipient, message, order_id)
            .await
    }

    /// Sends a message taken from the outbox.
    pub async fn deliver(&self, sms: &OutboundSms) -> SendOutcome {
        self.dispatch(
            sms.kind.log_label(),
            &sms.recipient,
            &sms.message,
            sms.order_id,
        )
        .await
    }

    async fn dispatch(
        &self,
        message_type: &str,
        recipient: &str,
        message: &str,
        order_id: Option<Uuid>,
    ) -> SendOutcome {
        if recipient.trim().is_empty() {
            return SendOutcome::failed(SmsFailure::InvalidInput("recipient phone is required"), None);
        }
        if message.trim().is_empty() {
            return SendOutcome::failed(SmsFailure::InvalidInput("message body is required"), None);
        }

        let outcome = self.attempt(recipient, message).await;

        match &outcome {
            SendOutcome::Sent { .. } => info!("SMS ({message_type}) sent to {recipient}"),
            SendOutcome::Failed { reason, .. } => {
                warn!("SMS ({message_type}) to {recipient} failed: {reason}")
            }
        }

        let entry = log_entry(&outcome, message_type, recipient, message, order_id);
        if let Err(err) = self.log.append(entry).await {
            error!("Failed to record SMS log for {recipient}: {:#}", err);
        }

        outcome
    }

    async fn attempt(&self, recipient: &str, message: &str) -> SendOutcome {
        let Some(api_key) = self.config.api_key.as_deref().filter(|k| !k.is_empty()) else {
            warn!("SMS API key not configured, message to {recipient} not sent");
            return SendOutcome::failed(SmsFailure::NotConfigured, None);
        };

        let request = ProviderRequest::new(api_key, &self.config.shortcode, recipient, message);
        debug!(
            "Sending SMS to {} via {} as {}",
            request.mobile, self.config.endpoint, request.shortcode
        );

        let reply = match self.transport.post(&self.config.endpoint, &request).await {
            Ok(reply) => reply,
            Err(err) => {
                return SendOutcome::failed(SmsFailure::Unreachable(format!("{err:#}")), None);
            }
        };
        debug!("SMS provider answered HTTP {}: {}", reply.status, reply.body);

        match provider::interpret(&reply) {
            Ok(()) => SendOutcome::Sent {
                response: reply.body,
            },
            Err(reason) => SendOutcome::failed(reason, Some(reply.body)),
        }
    }
}

fn log_entry(
    outcome: &SendOutcome,
    message_type: &str,
    recipient: &str,
    message: &str,
    order_id: Option<Uuid>,
) -> NewSmsLogEntity {
    let (status, response, sent_at) = match outcome {
        SendOutcome::Sent { response } => ("sent", response.clone(), Some(Utc::now())),
        SendOutcome::Failed {
            response: Some(response),
            ..
        } => ("failed", response.clone(), None),
        SendOutcome::Failed {
            reason,
            response: None,
        } => ("failed", json!({ "error": reason.to_string() }), None),
    };

    NewSmsLogEntity {
        order_id,
        recipient_phone: recipient.to_string(),
        message_type: message_type.to_string(),
        message_content: message.to_string(),
        status: status.to_string(),
        response: Some(response.to_string()),
        sent_at,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{
        sms::{ProviderReply, provider::RecordingTransport},
        store::memory::MemoryStore,
    };

    fn config(api_key: Option<&str>) -> SmsConfig {
        SmsConfig {
            endpoint: "https://sms.example.test/send".into(),
            api_key: api_key.map(str::to_string),
            shortcode: "SIMUHUB".into(),
        }
    }

    fn gateway(
        api_key: Option<&str>,
        transport: Arc<RecordingTransport>,
        store: Arc<MemoryStore>,
    ) -> NotificationGateway {
        NotificationGateway::new(config(api_key), transport, store)
    }

    #[tokio::test]
    async fn successful_send_logs_one_sent_row() {
        let transport = Arc::new(RecordingTransport::replying(ProviderReply {
            status: 200,
            body: json!([{ "status_code": "1000", "message_id": "abc" }]),
        }));
        let store = Arc::new(MemoryStore::default());
        let order_id = Uuid::new_v4();

        let outcome = gateway(Some("key"), transport.clone(), store.clone())
            .send("+254 700 111 222", "hello", Some(order_id))
            .await;

        assert!(outcome.is_sent());
        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].mobile, "254700111222");
        assert_eq!(requests[0].api_key, "key");

        let logs = store.sms_logs();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].status, "sent");
        assert_eq!(logs[0].order_id, Some(order_id));
        assert_eq!(logs[0].recipient_phone, "+254 700 111 222");
        assert!(logs[0].sent_at.is_some());
    }

    #[tokio::test]
    async fn provider_rejection_is_a_failed_outcome() {
        let transport = Arc::new(RecordingTransport::replying(ProviderReply {
            status: 200,
            body: json!({ "status_code": 1004, "status_desc": "Insufficient credits" }),
        }));
        let store = Arc::new(MemoryStore::default());

        let outcome = gateway(Some("key"), transport, store.clone())
            .send("0700111222", "hello", None)
            .await;

        assert_eq!(
            outcome,
            SendOutcome::Failed {
                reason: SmsFailure::InsufficientCredit("Insufficient credits".into()),
                response: Some(json!({ "status_code": 1004, "status_desc": "Insufficient credits" })),
            }
        );
        let logs = store.sms_logs();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].status, "failed");
        assert!(logs[0].sent_at.is_none());
    }

    #[tokio::test]
    async fn missing_api_key_skips_the_network_but_logs() {
        let transport = Arc::new(RecordingTransport::replying(ProviderReply {
            status: 200,
            body: json!({ "status_code": 1000 }),
        }));
        let store = Arc::new(MemoryStore::default());

        let outcome = gateway(None, transport.clone(), store.clone())
            .send("0700111222", "hello", None)
            .await;

        assert_eq!(
            outcome,
            SendOutcome::Failed {
                reason: SmsFailure::NotConfigured,
                response: None
            }
        );
        assert!(transport.requests().is_empty());
        let logs = store.sms_logs();
        assert_eq!(logs.len(), 1);
        assert!(logs[0].response.as_deref().unwrap().contains("not configured"));
    }

    #[tokio::test]
    async fn unreachable_provider_is_reported_not_raised() {
        let transport = Arc::new(RecordingTransport::unreachable());
        let store = Arc::new(MemoryStore::default());

        let outcome = gateway(Some("key"), transport, store.clone())
            .send("0700111222", "hello", None)
            .await;

        assert!(matches!(
            outcome,
            SendOutcome::Failed {
                reason: SmsFailure::Unreachable(_),
                ..
            }
        ));
        assert_eq!(store.sms_logs().len(), 1);
    }

    #[tokio::test]
    async fn blank_input_is_rejected_without_logging() {
        let transport = Arc::new(RecordingTransport::unreachable());
        let store = Arc::new(MemoryStore::default());
        let gateway = gateway(Some("key"), transport.clone(), store.clone());

        assert!(!gateway.send("  ", "hello", None).await.is_sent());
        assert!(!gateway.send("0700111222", "", None).await.is_sent());
        assert!(transport.requests().is_empty());
        assert!(store.sms_logs().is_empty());
    }
}
