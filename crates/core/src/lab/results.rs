//! Flattening matched observations into result rows.

use crate::export::CsvRow;
use openmrs::{Concept, Obs};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// One line of a lab result sheet.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ResultRow {
    /// Name of the panel the test belongs to, empty for stand-alone tests.
    pub panel: String,
    pub test_name: String,
    pub value: String,
    pub units: String,
    pub reference_range: String,
    /// True when a numeric value is outside the concept's critical limits.
    pub critical: bool,
}

impl CsvRow for ResultRow {
    fn csv_fields(&self) -> Vec<String> {
        vec![
            self.panel.clone(),
            self.test_name.clone(),
            self.value.clone(),
            self.units.clone(),
            self.reference_range.clone(),
        ]
    }
}

/// Concepts whose metadata (units, ranges) the rows for `matched` need.
pub fn concept_uuids(matched: &[Obs]) -> Vec<String> {
    let mut seen = HashSet::new();
    leaves(matched)
        .map(|obs| obs.concept.uuid.clone())
        .filter(|uuid| seen.insert(uuid.clone()))
        .collect()
}

/// Reshape matched observations into rows; panels expand into one row per member.
///
/// Observations that also appear as a member of a matched panel are only emitted once, under
/// their panel.
pub fn reshape(matched: &[Obs], concepts: &HashMap<String, Concept>) -> Vec<ResultRow> {
    let nested: HashSet<&str> = matched
        .iter()
        .flat_map(|o| o.members())
        .map(|m| m.uuid.as_str())
        .collect();

    let mut rows = Vec::new();
    for obs in matched.iter().filter(|o| !nested.contains(o.uuid.as_str())) {
        if obs.is_panel() {
            let panel = obs.concept_name();
            rows.extend(obs.members().iter().map(|m| row(&panel, m, concepts)));
        } else {
            rows.push(row("", obs, concepts));
        }
    }
    rows
}

fn leaves(matched: &[Obs]) -> impl Iterator<Item = &Obs> {
    matched.iter().flat_map(|obs| {
        if obs.is_panel() {
            obs.members().iter().collect::<Vec<_>>()
        } else {
            vec![obs]
        }
    })
}

fn row(panel: &str, obs: &Obs, concepts: &HashMap<String, Concept>) -> ResultRow {
    let concept = concepts.get(&obs.concept.uuid);
    let critical = match (concept, obs.value.as_ref().and_then(|v| v.as_number())) {
        (Some(concept), Some(value)) => concept.is_critical(value),
        _ => false,
    };

    ResultRow {
        panel: panel.to_string(),
        test_name: concept
            .map(|c| c.name().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| obs.concept_name()),
        value: obs.value_display(),
        units: concept.map(|c| c.units_or_empty().to_string()).unwrap_or_default(),
        reference_range: concept.map(Concept::reference_range).unwrap_or_default(),
        critical,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lab::matching::fixtures::{obs, panel};
    use openmrs::ObsValue;

    fn concept(uuid: &str, name: &str, units: &str, low: f64, high: f64) -> Concept {
        openmrs::parse(
            &serde_json::json!({
                "uuid": uuid,
                "display": name,
                "units": units,
                "lowNormal": low,
                "hiNormal": high,
                "hiCritical": high * 2.0
            })
            .to_string(),
            "concept",
        )
        .expect("concept")
    }

    #[test]
    fn panels_expand_into_member_rows() {
        let mut hb = obs("p1", "hb", None);
        hb.value = Some(ObsValue::Numeric(13.2));
        let mut wbc = obs("p2", "wbc", None);
        wbc.value = Some(ObsValue::Numeric(40.0));
        let matched = vec![panel("p", "cbc", vec![hb, wbc]), obs("x", "malaria", None)];

        let concepts: HashMap<String, Concept> = [
            concept("hb", "Haemoglobin", "g/dL", 12.0, 16.0),
            concept("wbc", "White cells", "10^9/L", 4.0, 11.0),
        ]
        .into_iter()
        .map(|c| (c.uuid.clone(), c))
        .collect();

        let rows = reshape(&matched, &concepts);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].panel, "cbc name");
        assert_eq!(rows[0].test_name, "Haemoglobin");
        assert_eq!(rows[0].value, "13.2");
        assert_eq!(rows[0].units, "g/dL");
        assert_eq!(rows[0].reference_range, "12 - 16");
        assert!(!rows[0].critical);
        assert!(rows[1].critical);

        assert_eq!(rows[2].panel, "");
        assert_eq!(rows[2].test_name, "malaria name");
        assert_eq!(rows[2].units, "");
    }

    #[test]
    fn members_listed_alongside_their_panel_appear_once() {
        let member = obs("p1", "hb", Some("ord-1"));
        let matched = vec![panel("p", "cbc", vec![member.clone()]), member];
        let rows = reshape(&matched, &HashMap::new());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].panel, "cbc name");
    }

    #[test]
    fn concept_uuids_are_leaf_concepts_without_duplicates() {
        let matched = vec![
            panel("p", "cbc", vec![obs("p1", "hb", None), obs("p2", "wbc", None)]),
            obs("x", "hb", None),
        ];
        assert_eq!(concept_uuids(&matched), vec!["hb".to_string(), "wbc".into()]);
    }
}
