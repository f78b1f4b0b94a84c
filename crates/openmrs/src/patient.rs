//! Patient representations (`/patient`).

use crate::Ref;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub uuid: String,
    #[serde(default)]
    pub display: Option<String>,
    #[serde(default)]
    pub identifiers: Vec<PatientIdentifier>,
    #[serde(default)]
    pub person: Option<Person>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientIdentifier {
    #[serde(default)]
    pub identifier: Option<String>,
    #[serde(default)]
    pub identifier_type: Option<Ref>,
    #[serde(default)]
    pub preferred: bool,
    #[serde(default)]
    pub display: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    #[serde(default)]
    pub uuid: Option<String>,
    #[serde(default)]
    pub display: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub birthdate: Option<String>,
    #[serde(default)]
    pub dead: bool,
}

impl Patient {
    /// Preferred identifier, else the first one listed.
    pub fn primary_identifier(&self) -> Option<&str> {
        self.identifiers
            .iter()
            .find(|i| i.preferred)
            .or_else(|| self.identifiers.first())
            .and_then(|i| i.identifier.as_deref())
    }

    /// Person name, else the patient display with its identifier prefix removed.
    pub fn name(&self) -> String {
        if let Some(name) = self.person.as_ref().and_then(|p| p.display.as_deref()) {
            return name.to_string();
        }
        let display = self.display.as_deref().unwrap_or("");
        display
            .split_once(" - ")
            .map(|(_, name)| name)
            .unwrap_or(display)
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;

    #[test]
    fn primary_identifier_prefers_flagged_entry() {
        let patient: Patient = parse(
            r#"{"uuid": "p-1", "display": "100J - Jane Doe",
                "identifiers": [
                    {"identifier": "OLD-1", "preferred": false},
                    {"identifier": "100J", "preferred": true}
                ],
                "person": {"display": "Jane Doe", "gender": "F", "age": 34, "birthdate": "1992-03-01T00:00:00.000+0000"}}"#,
            "patient",
        )
        .expect("parse patient");
        assert_eq!(patient.primary_identifier(), Some("100J"));
        assert_eq!(patient.name(), "Jane Doe");
    }

    #[test]
    fn name_falls_back_to_display() {
        let patient: Patient =
            parse(r#"{"uuid": "p-2", "display": "200K - John Roe"}"#, "patient").expect("parse");
        assert_eq!(patient.name(), "John Roe");
        assert_eq!(patient.primary_identifier(), None);
    }
}
