//! Encounter representations (`/encounter`).

use crate::{Obs, Ref};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Encounter {
    pub uuid: String,
    #[serde(default)]
    pub display: Option<String>,
    #[serde(default)]
    pub encounter_datetime: Option<String>,
    #[serde(default)]
    pub patient: Option<Ref>,
    #[serde(default)]
    pub location: Option<Ref>,
    #[serde(default)]
    pub encounter_type: Option<Ref>,
    #[serde(default)]
    pub obs: Vec<Obs>,
    #[serde(default)]
    pub orders: Vec<Ref>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;

    #[test]
    fn parses_encounter_with_embedded_obs() {
        let encounter: Encounter = parse(
            r#"{"uuid": "enc-1", "encounterDatetime": "2026-10-01T08:00:00.000+0000",
                "patient": {"uuid": "p-1"}, "encounterType": {"uuid": "t", "display": "Lab Results"},
                "obs": [{"uuid": "o1", "concept": {"uuid": "hb"}, "value": 11}],
                "orders": [{"uuid": "ord-1"}]}"#,
            "encounter",
        )
        .expect("parse encounter");
        assert_eq!(encounter.obs.len(), 1);
        assert_eq!(encounter.orders[0].uuid, "ord-1");
        assert_eq!(
            encounter.encounter_type.and_then(|t| t.display).as_deref(),
            Some("Lab Results")
        );
    }
}
