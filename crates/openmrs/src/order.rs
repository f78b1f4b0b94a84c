//! Order representations (`/order`).
//!
//! Lab orders are OpenMRS `testorder`s. Their progress through the laboratory is tracked by the
//! fulfiller fields, which are written through `/order/{uuid}/fulfillerdetails`.

use crate::Ref;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fulfiller status of an order as reported by OpenMRS.
///
/// An order with no fulfiller status has not been picked up by the lab yet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FulfillerStatus {
    Received,
    InProgress,
    Exception,
    OnHold,
    Declined,
    Completed,
}

impl FulfillerStatus {
    pub const ALL: [FulfillerStatus; 6] = [
        FulfillerStatus::Received,
        FulfillerStatus::InProgress,
        FulfillerStatus::Exception,
        FulfillerStatus::OnHold,
        FulfillerStatus::Declined,
        FulfillerStatus::Completed,
    ];

    /// Wire value, e.g. `IN_PROGRESS`.
    pub fn as_wire(self) -> &'static str {
        match self {
            FulfillerStatus::Received => "RECEIVED",
            FulfillerStatus::InProgress => "IN_PROGRESS",
            FulfillerStatus::Exception => "EXCEPTION",
            FulfillerStatus::OnHold => "ON_HOLD",
            FulfillerStatus::Declined => "DECLINED",
            FulfillerStatus::Completed => "COMPLETED",
        }
    }

    /// Label shown in lab worklists.
    pub fn label(self) -> &'static str {
        match self {
            FulfillerStatus::Received => "Received",
            FulfillerStatus::InProgress => "In progress",
            FulfillerStatus::Exception => "Exception",
            FulfillerStatus::OnHold => "On hold",
            FulfillerStatus::Declined => "Declined",
            FulfillerStatus::Completed => "Completed",
        }
    }
}

impl fmt::Display for FulfillerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

impl FromStr for FulfillerStatus {
    type Err = crate::OpenMrsError;

    /// Accepts the wire form (`IN_PROGRESS`) case-insensitively, with `-` or space in place of
    /// `_`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalised = s.trim().to_ascii_uppercase().replace(['-', ' '], "_");
        FulfillerStatus::ALL
            .into_iter()
            .find(|status| status.as_wire() == normalised)
            .ok_or_else(|| crate::OpenMrsError::InvalidInput(format!("unknown fulfiller status: {s}")))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub uuid: String,
    #[serde(default)]
    pub order_number: Option<String>,
    #[serde(default)]
    pub display: Option<String>,
    pub concept: Ref,
    #[serde(default)]
    pub encounter: Option<Ref>,
    #[serde(default)]
    pub patient: Option<Ref>,
    #[serde(default)]
    pub orderer: Option<Ref>,
    #[serde(default)]
    pub order_type: Option<Ref>,
    #[serde(default)]
    pub fulfiller_status: Option<FulfillerStatus>,
    #[serde(default)]
    pub fulfiller_comment: Option<String>,
    #[serde(default)]
    pub urgency: Option<String>,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub date_activated: Option<String>,
    #[serde(default)]
    pub date_stopped: Option<String>,
}

impl Order {
    /// Name of the ordered test, falling back to the order's own display text.
    pub fn test_name(&self) -> &str {
        self.concept
            .display
            .as_deref()
            .or(self.display.as_deref())
            .unwrap_or("")
    }

    /// Patient display with the leading identifier stripped (`"100J - Jane Doe"` → `"Jane Doe"`).
    pub fn patient_name(&self) -> &str {
        let display = self
            .patient
            .as_ref()
            .and_then(|p| p.display.as_deref())
            .unwrap_or("");
        match display.split_once(" - ") {
            Some((_, name)) => name,
            None => display,
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.date_stopped.is_some() || self.action.as_deref() == Some("DISCONTINUE")
    }
}

/// Body posted to `/order/{uuid}/fulfillerdetails`.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FulfillerDetails {
    pub fulfiller_status: FulfillerStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fulfiller_comment: Option<String>,
}
