use std::sync::Mutex;

use anyhow::{Context, Result};
use futures::future::BoxFuture;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use crate::sms::SmsFailure;

/// Bulk-SMS request body understood by the provider.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ProviderRequest {
    pub api_key: String,
    pub service: u8,
    pub mobile: String,
    pub response_type: &'static str,
    pub shortcode: String,
    pub message: String,
}

impl ProviderRequest {
    pub fn new(api_key: &str, shortcode: &str, recipient: &str, message: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            service: 0,
            mobile: normalize_phone(recipient),
            response_type: "json",
            shortcode: shortcode.to_string(),
            message: message.to_string(),
        }
    }
}

/// Raw HTTP status and body returned by the provider. Non-JSON bodies are kept
/// as a JSON string.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderReply {
    pub status: u16,
    pub body: Value,
}

pub trait SmsTransport: Send + Sync {
    fn post<'a>(
        &'a self,
        endpoint: &'a str,
        request: &'a ProviderRequest,
    ) -> BoxFuture<'a, Result<ProviderReply>>;
}

pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl SmsTransport for ReqwestTransport {
    fn post<'a>(
        &'a self,
        endpoint: &'a str,
        request: &'a ProviderRequest,
    ) -> BoxFuture<'a, Result<ProviderReply>> {
        Box::pin(async move {
            let response = self
                .client
                .post(endpoint)
                .json(request)
                .send()
                .await
                .context("Failed to reach SMS provider")?;

            let status = response.status().as_u16();
            let text = response
                .text()
                .await
                .context("Failed to read SMS provider response")?;
            let body = serde_json::from_str(&text).unwrap_or(Value::String(text));

            Ok(ProviderReply { status, body })
        })
    }
}

/// Transport that records requests instead of sending them, answering with a
/// canned reply. `None` simulates an unreachable provider.
#[derive(Default)]
pub struct RecordingTransport {
    reply: Option<ProviderReply>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl RecordingTransport {
    pub fn replying(reply: ProviderReply) -> Self {
        Self {
            reply: Some(reply),
            requests: Mutex::default(),
        }
    }

    pub fn accepting() -> Self {
        Self::replying(ProviderReply {
            status: 200,
            body: serde_json::json!([{ "status_code": "1000", "status_desc": "Success" }]),
        })
    }

    pub fn unreachable() -> Self {
        Self::default()
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }
}

impl SmsTransport for RecordingTransport {
    fn post<'a>(
        &'a self,
        _endpoint: &'a str,
        request: &'a ProviderRequest,
    ) -> BoxFuture<'a, Result<ProviderReply>> {
        Box::pin(async move {
            if let Ok(mut requests) = self.requests.lock() {
                requests.push(request.clone());
            }
            self.reply
                .clone()
                .ok_or_else(|| anyhow::anyhow!("connection refused"))
        })
    }
}

/// Strips all whitespace and one leading `+`.
pub fn normalize_phone(phone: &str) -> String {
    let compact: String = phone.chars().filter(|c| !c.is_whitespace()).collect();
    match compact.strip_prefix('+') {
        Some(rest) => rest.to_string(),
        None => compact,
    }
}

/// Decides whether the provider accepted the message.
///
/// The provider answers with one object or an array holding one object. A
/// `status_code` of `1000` or `1` (number or string) means accepted; any other
/// code is a rejection. Without a code, the HTTP status decides.
pub fn interpret(reply: &ProviderReply) -> Result<(), SmsFailure> {
    let payload = match &reply.body {
        Value::Array(items) => items.first(),
        other => Some(other),
    };
    let description = payload
        .and_then(|p| p.get("status_desc"))
        .and_then(Value::as_str)
        .unwrap_or("SMS sending failed")
        .to_string();

    if let Some(code) = payload.and_then(|p| p.get("status_code")).and_then(status_code) {
        match code.as_str() {
            "1000" | "1" => {}
            "1001" => return Err(SmsFailure::InvalidSender(description)),
            "1003" => return Err(SmsFailure::InvalidPhone(description)),
            "1004" => return Err(SmsFailure::InsufficientCredit(description)),
            "1006" | "1013" => return Err(SmsFailure::InvalidCredentials(description)),
            _ => return Err(SmsFailure::Rejected { code, description }),
        }
    }

    if !(200..300).contains(&reply.status) {
        let description = reply
            .body
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("SMS sending failed")
            .to_string();
        return Err(SmsFailure::Http {
            status: reply.status,
            description,
        });
    }

    Ok(())
}

// Empty strings and zero count as "no code".
fn status_code(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        _ => None,
    }
}
