//! `MedicationRequest`: a prescription as exposed by the FHIR2 module.

use crate::common::{CodeableConcept, Dosage, Quantity, Reference};
use crate::Resource;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationRequest {
    pub id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub intent: Option<String>,
    #[serde(default)]
    pub medication_reference: Option<Reference>,
    #[serde(default)]
    pub medication_codeable_concept: Option<CodeableConcept>,
    #[serde(default)]
    pub subject: Option<Reference>,
    #[serde(default)]
    pub encounter: Option<Reference>,
    #[serde(default)]
    pub requester: Option<Reference>,
    #[serde(default)]
    pub authored_on: Option<String>,
    #[serde(default)]
    pub dosage_instruction: Vec<Dosage>,
    #[serde(default)]
    pub dispense_request: Option<DispenseRequest>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispenseRequest {
    #[serde(default)]
    pub quantity: Option<Quantity>,
    #[serde(default)]
    pub number_of_repeats_allowed: Option<u32>,
}

impl Resource for MedicationRequest {
    const RESOURCE_TYPE: &'static str = "MedicationRequest";
}

impl MedicationRequest {
    pub fn is_active(&self) -> bool {
        self.status
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case("active"))
    }

    pub fn medication_display(&self) -> &str {
        self.medication_reference
            .as_ref()
            .and_then(|r| r.display.as_deref())
            .or_else(|| {
                self.medication_codeable_concept
                    .as_ref()
                    .and_then(CodeableConcept::display)
            })
            .unwrap_or("")
    }

    /// Dosage text lines joined with `; `.
    pub fn dosage_text(&self) -> String {
        self.dosage_instruction
            .iter()
            .filter_map(|d| d.text.as_deref())
            .collect::<Vec<_>>()
            .join("; ")
    }

    pub fn prescribed_quantity(&self) -> Option<&Quantity> {
        self.dispense_request.as_ref().and_then(|d| d.quantity.as_ref())
    }
}
