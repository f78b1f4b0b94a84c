//! `Condition`: problem list entries.

use crate::common::{CodeableConcept, Reference};
use crate::Resource;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    pub id: String,
    #[serde(default)]
    pub clinical_status: Option<CodeableConcept>,
    #[serde(default)]
    pub verification_status: Option<CodeableConcept>,
    #[serde(default)]
    pub code: Option<CodeableConcept>,
    #[serde(default)]
    pub subject: Option<Reference>,
    #[serde(default)]
    pub onset_date_time: Option<String>,
    #[serde(default)]
    pub recorded_date: Option<String>,
}

impl Resource for Condition {
    const RESOURCE_TYPE: &'static str = "Condition";
}

impl Condition {
    pub fn name(&self) -> &str {
        self.code
            .as_ref()
            .and_then(CodeableConcept::display)
            .unwrap_or("")
    }

    /// A condition without a clinical status is treated as active.
    pub fn is_active(&self) -> bool {
        self.clinical_status
            .as_ref()
            .map_or(true, |s| s.has_code("active") || s.has_code("recurrence"))
    }
}
