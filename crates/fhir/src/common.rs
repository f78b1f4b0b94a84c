//! FHIR R4 datatypes shared by the modelled resources.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

impl Reference {
    /// Literal reference such as `Patient/123`.
    pub fn to(resource_type: &str, id: &str) -> Self {
        Self {
            reference: Some(format!("{resource_type}/{id}")),
            type_: Some(resource_type.to_string()),
            display: None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Coding {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CodeableConcept {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub coding: Vec<Coding>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl CodeableConcept {
    /// `text`, else the first coding display, else the first code.
    pub fn display(&self) -> Option<&str> {
        self.text
            .as_deref()
            .or_else(|| self.coding.iter().find_map(|c| c.display.as_deref()))
            .or_else(|| self.coding.iter().find_map(|c| c.code.as_deref()))
    }

    /// True if any coding carries `code` (case-insensitive).
    pub fn has_code(&self, code: &str) -> bool {
        self.coding
            .iter()
            .filter_map(|c| c.code.as_deref())
            .any(|c| c.eq_ignore_ascii_case(code))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Quantity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Period {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Dosage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<CodeableConcept>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_reference_names_type_and_id() {
        let reference = Reference::to("Patient", "abc");
        assert_eq!(reference.reference.as_deref(), Some("Patient/abc"));
        assert_eq!(reference.type_.as_deref(), Some("Patient"));
    }

    #[test]
    fn codeable_concept_display_prefers_text() {
        let concept = CodeableConcept {
            coding: vec![Coding {
                system: None,
                code: Some("A01".into()),
                display: Some("Typhoid".into()),
            }],
            text: None,
        };
        assert_eq!(concept.display(), Some("Typhoid"));
        assert!(concept.has_code("a01"));

        let with_text = CodeableConcept {
            text: Some("Typhoid fever".into()),
            ..concept
        };
        assert_eq!(with_text.display(), Some("Typhoid fever"));
    }
}
