//! Observation representations (`/obs`).

use crate::{format_number, Ref};
use serde::{Deserialize, Serialize};

/// Value of an observation.
///
/// OpenMRS serialises the value according to the concept datatype: numbers for numeric concepts,
/// strings for text/date concepts, and a concept reference for coded answers. Anything else
/// (complex obs) is kept raw.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ObsValue {
    Boolean(bool),
    Numeric(f64),
    Text(String),
    Coded(CodedValue),
    Other(serde_json::Value),
}

/// Coded answer embedded as an observation value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CodedValue {
    pub uuid: String,
    #[serde(default)]
    pub display: Option<String>,
}

impl ObsValue {
    pub fn display(&self) -> String {
        match self {
            ObsValue::Boolean(b) => if *b { "Yes" } else { "No" }.to_string(),
            ObsValue::Numeric(n) => format_number(*n),
            ObsValue::Text(s) => s.clone(),
            ObsValue::Coded(c) => c.display.clone().unwrap_or_else(|| c.uuid.clone()),
            ObsValue::Other(v) => v.to_string(),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            ObsValue::Numeric(n) => Some(*n),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Obs {
    pub uuid: String,
    #[serde(default)]
    pub display: Option<String>,
    pub concept: Ref,
    #[serde(default)]
    pub value: Option<ObsValue>,
    #[serde(default)]
    pub order: Option<Ref>,
    #[serde(default)]
    pub encounter: Option<Ref>,
    #[serde(default)]
    pub obs_datetime: Option<String>,
    #[serde(default)]
    pub group_members: Option<Vec<Obs>>,
    #[serde(default)]
    pub interpretation: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl Obs {
    /// True when the observation groups other observations (a lab panel).
    pub fn is_panel(&self) -> bool {
        self.group_members
            .as_ref()
            .is_some_and(|members| !members.is_empty())
    }

    pub fn members(&self) -> &[Obs] {
        self.group_members.as_deref().unwrap_or(&[])
    }

    pub fn order_uuid(&self) -> Option<&str> {
        self.order.as_ref().map(|o| o.uuid.as_str())
    }

    /// Concept name, falling back to the observation's display text up to the first `:`
    /// (OpenMRS renders obs as `"Haemoglobin: 13.2"`).
    pub fn concept_name(&self) -> String {
        if let Some(name) = self.concept.display.as_deref() {
            return name.to_string();
        }
        self.display
            .as_deref()
            .map(|d| d.split(':').next().unwrap_or(d).trim().to_string())
            .unwrap_or_default()
    }

    pub fn value_display(&self) -> String {
        self.value.as_ref().map(ObsValue::display).unwrap_or_default()
    }
}

/// Body posted to `/obs` when recording a result.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewObs {
    pub person: String,
    pub concept: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encounter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<String>,
    pub obs_datetime: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub group_members: Vec<NewObs>,
}
