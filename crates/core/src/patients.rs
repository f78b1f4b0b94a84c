//! Patient search.

use crate::client::EmrClient;
use crate::constants::{DEFAULT_PATIENT_SEARCH_LIMIT, MAX_PAGE_SIZE, MIN_PATIENT_QUERY_LEN};
use crate::{ClinicError, ClinicResult};
use openmrs::{Patient, Results};
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PatientSummary {
    pub uuid: String,
    pub name: String,
    pub identifier: String,
    pub gender: String,
    pub age: Option<u32>,
    pub birthdate: String,
    pub dead: bool,
}

impl From<&Patient> for PatientSummary {
    fn from(patient: &Patient) -> Self {
        let person = patient.person.as_ref();
        PatientSummary {
            uuid: patient.uuid.clone(),
            name: patient.name(),
            identifier: patient.primary_identifier().unwrap_or("").to_string(),
            gender: person.and_then(|p| p.gender.clone()).unwrap_or_default(),
            age: person.and_then(|p| p.age),
            birthdate: person.and_then(|p| p.birthdate.clone()).unwrap_or_default(),
            dead: person.is_some_and(|p| p.dead),
        }
    }
}

#[derive(Clone, Debug)]
pub struct PatientDirectory {
    client: EmrClient,
}

impl PatientDirectory {
    pub fn new(client: EmrClient) -> Self {
        Self { client }
    }

    /// Search patients by name or identifier.
    ///
    /// `limit` defaults to 50 and is capped at the maximum page size.
    ///
    /// # Errors
    ///
    /// Returns [`ClinicError::InvalidInput`] if the query is shorter than two characters.
    pub async fn search(&self, query: &str, limit: Option<usize>) -> ClinicResult<Vec<PatientSummary>> {
        let query = query.trim();
        if query.chars().count() < MIN_PATIENT_QUERY_LEN {
            return Err(ClinicError::InvalidInput(format!(
                "patient search needs at least {MIN_PATIENT_QUERY_LEN} characters"
            )));
        }
        let limit = limit
            .unwrap_or(DEFAULT_PATIENT_SEARCH_LIMIT)
            .clamp(1, MAX_PAGE_SIZE)
            .to_string();

        let patients: Results<Patient> = self
            .client
            .rest_get(
                "patient",
                &[("q", query), ("v", "full"), ("limit", limit.as_str())],
                "patients",
            )
            .await?;
        Ok(patients.results.iter().map(PatientSummary::from).collect())
    }
}
