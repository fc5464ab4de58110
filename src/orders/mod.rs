//! Order lifecycle: intake, status transitions and the notifications they emit.

pub mod intake;
pub mod reference;
pub mod transition;
pub mod workflow;

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Dispatched,
    Ready,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Dispatched,
        OrderStatus::Ready,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Dispatched => "dispatched",
            OrderStatus::Ready => "ready",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid status")]
pub struct InvalidStatus;

impl FromStr for OrderStatus {
    type Err = InvalidStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or(InvalidStatus)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMethod {
    Doorstep,
    Pickup,
}

impl DeliveryMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            DeliveryMethod::Doorstep => "doorstep",
            DeliveryMethod::Pickup => "pickup",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DeliveryMethod::Doorstep => "Doorstep",
            DeliveryMethod::Pickup => "Pickup",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid delivery method")]
pub struct InvalidDeliveryMethod;

impl FromStr for DeliveryMethod {
    type Err = InvalidDeliveryMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "doorstep" => Ok(DeliveryMethod::Doorstep),
            "pickup" => Ok(DeliveryMethod::Pickup),
            _ => Err(InvalidDeliveryMethod),
        }
    }
}
