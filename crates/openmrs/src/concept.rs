//! Concept representations (`/concept`).

use crate::{format_number, Ref};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Concept {
    pub uuid: String,
    #[serde(default)]
    pub display: Option<String>,
    #[serde(default)]
    pub datatype: Option<Ref>,
    #[serde(default)]
    pub concept_class: Option<Ref>,
    #[serde(default)]
    pub set: bool,
    #[serde(default)]
    pub set_members: Vec<Ref>,
    #[serde(default)]
    pub units: Option<String>,
    #[serde(default)]
    pub hi_normal: Option<f64>,
    #[serde(default)]
    pub low_normal: Option<f64>,
    #[serde(default)]
    pub hi_critical: Option<f64>,
    #[serde(default)]
    pub low_critical: Option<f64>,
}

impl Concept {
    pub fn name(&self) -> &str {
        self.display.as_deref().unwrap_or("")
    }

    pub fn units_or_empty(&self) -> &str {
        self.units.as_deref().unwrap_or("")
    }

    /// Normal range as displayed next to a result.
    pub fn reference_range(&self) -> String {
        match (self.low_normal, self.hi_normal) {
            (Some(low), Some(high)) => format!("{} - {}", format_number(low), format_number(high)),
            (Some(low), None) => format!("> {}", format_number(low)),
            (None, Some(high)) => format!("< {}", format_number(high)),
            (None, None) => String::new(),
        }
    }

    /// True when a numeric value lies outside the critical limits.
    pub fn is_critical(&self, value: f64) -> bool {
        self.low_critical.is_some_and(|low| value < low)
            || self.hi_critical.is_some_and(|high| value > high)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;

    fn numeric(low: Option<f64>, high: Option<f64>) -> Concept {
        Concept {
            uuid: "hb".into(),
            display: Some("Haemoglobin".into()),
            datatype: Some(Ref {
                uuid: "8d4a4488-c2cc-11de-8d13-0010c6dffd0f".into(),
                display: Some("Numeric".into()),
            }),
            concept_class: None,
            set: false,
            set_members: Vec::new(),
            units: Some("g/dL".into()),
            hi_normal: high,
            low_normal: low,
            hi_critical: Some(20.0),
            low_critical: Some(5.0),
        }
    }

    #[test]
    fn reference_range_formats_each_bound_combination() {
        assert_eq!(numeric(Some(12.0), Some(16.5)).reference_range(), "12 - 16.5");
        assert_eq!(numeric(Some(12.0), None).reference_range(), "> 12");
        assert_eq!(numeric(None, Some(16.5)).reference_range(), "< 16.5");
        assert_eq!(numeric(None, None).reference_range(), "");
    }

    #[test]
    fn critical_limits() {
        let concept = numeric(Some(12.0), Some(16.0));
        assert!(concept.is_critical(4.9));
        assert!(concept.is_critical(20.1));
        assert!(!concept.is_critical(13.0));
    }

    #[test]
    fn parses_set_concept() {
        let concept: Concept = parse(
            r#"{"uuid": "cbc", "display": "Complete blood count", "set": true,
                "datatype": {"uuid": "d", "display": "N/A"},
                "conceptClass": {"uuid": "c", "display": "LabSet"},
                "setMembers": [{"uuid": "hb", "display": "Haemoglobin"}, {"uuid": "wbc"}]}"#,
            "concept",
        )
        .expect("parse concept");
        assert!(concept.set);
        assert_eq!(concept.set_members.len(), 2);
        assert_eq!(concept.units_or_empty(), "");
    }
}
