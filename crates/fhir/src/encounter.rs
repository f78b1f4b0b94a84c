//! `Encounter`: visit history.

use crate::common::{CodeableConcept, Coding, Period, Reference};
use crate::Resource;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Encounter {
    pub id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub class: Option<Coding>,
    #[serde(default, rename = "type")]
    pub type_: Vec<CodeableConcept>,
    #[serde(default)]
    pub subject: Option<Reference>,
    #[serde(default)]
    pub period: Option<Period>,
    #[serde(default)]
    pub location: Vec<EncounterLocation>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EncounterLocation {
    pub location: Reference,
}

impl Resource for Encounter {
    const RESOURCE_TYPE: &'static str = "Encounter";
}

impl Encounter {
    pub fn type_display(&self) -> &str {
        self.type_
            .iter()
            .find_map(CodeableConcept::display)
            .unwrap_or("")
    }

    pub fn start(&self) -> Option<&str> {
        self.period.as_ref().and_then(|p| p.start.as_deref())
    }

    pub fn location_display(&self) -> &str {
        self.location
            .iter()
            .find_map(|l| l.location.display.as_deref())
            .unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_resource;

    #[test]
    fn parses_type_and_location() {
        let encounter: Encounter = parse_resource(
            r#"{"resourceType": "Encounter", "id": "e1", "status": "unknown",
                "class": {"code": "AMB"},
                "type": [{"coding": [{"display": "Lab Results"}]}],
                "period": {"start": "2026-10-01T08:00:00+00:00"},
                "location": [{"location": {"reference": "Location/l1", "display": "Laboratory"}}]}"#,
        )
        .expect("parse encounter");
        assert_eq!(encounter.type_display(), "Lab Results");
        assert_eq!(encounter.start(), Some("2026-10-01T08:00:00+00:00"));
        assert_eq!(encounter.location_display(), "Laboratory");
    }
}
