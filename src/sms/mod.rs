//! Outbound SMS: provider wire format, the notification gateway and the
//! message templates used by the order workflow.

pub mod gateway;
pub mod provider;
pub mod templates;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use gateway::{NotificationGateway, SendOutcome, SmsFailure};
pub use provider::{ProviderReply, ProviderRequest, ReqwestTransport, SmsTransport};

/// Provider credentials and sender identity.
#[derive(Debug, Deserialize, Clone)]
pub struct SmsConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub shortcode: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    OwnerNewOrder,
    OrderDispatched,
    OrderReady,
    FeedbackRequest,
}

impl NotificationKind {
    pub fn event_type(self) -> &'static str {
        match self {
            NotificationKind::OwnerNewOrder => "sms.owner_new_order",
            NotificationKind::OrderDispatched => "sms.order_dispatched",
            NotificationKind::OrderReady => "sms.order_ready",
            NotificationKind::FeedbackRequest => "sms.feedback_request",
        }
    }

    /// Value written to `sms_logs.message_type`.
    pub fn log_label(self) -> &'static str {
        match self {
            NotificationKind::OwnerNewOrder => "owner_new_order",
            NotificationKind::OrderDispatched => "dispatched",
            NotificationKind::OrderReady => "ready_for_pickup",
            NotificationKind::FeedbackRequest => "feedback_request",
        }
    }
}

/// A text message waiting in the outbox.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct OutboundSms {
    pub kind: NotificationKind,
    pub recipient: String,
    pub message: String,
    pub order_id: Option<Uuid>,
}
