//! Pharmacy views over the FHIR API: prescriptions, conditions, encounters and dispensing.

use crate::client::EmrClient;
use crate::export::CsvRow;
use crate::{ClinicError, ClinicResult};
use chrono::{SecondsFormat, Utc};
use clinic_types::EmrUuid;
use fhir::{
    Condition, DispensePerformer, Encounter, MedicationDispense, MedicationRequest, Quantity,
    Reference, Resource,
};
use openmrs::format_number;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PrescriptionRow {
    pub id: String,
    pub medication: String,
    pub status: String,
    pub dosage: String,
    pub quantity: String,
    pub prescriber: String,
    pub date_written: String,
}

impl From<&MedicationRequest> for PrescriptionRow {
    fn from(request: &MedicationRequest) -> Self {
        PrescriptionRow {
            id: request.id.clone(),
            medication: request.medication_display().to_string(),
            status: request.status.clone().unwrap_or_default(),
            dosage: request.dosage_text(),
            quantity: request
                .prescribed_quantity()
                .map(quantity_display)
                .unwrap_or_default(),
            prescriber: request
                .requester
                .as_ref()
                .and_then(|r| r.display.clone())
                .unwrap_or_default(),
            date_written: request.authored_on.clone().unwrap_or_default(),
        }
    }
}

impl CsvRow for PrescriptionRow {
    fn csv_fields(&self) -> Vec<String> {
        vec![
            self.medication.clone(),
            self.status.clone(),
            self.dosage.clone(),
            self.quantity.clone(),
            self.prescriber.clone(),
            self.date_written.clone(),
        ]
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ConditionRow {
    pub id: String,
    pub name: String,
    pub active: bool,
    pub onset: String,
    pub recorded: String,
}

impl From<&Condition> for ConditionRow {
    fn from(condition: &Condition) -> Self {
        ConditionRow {
            id: condition.id.clone(),
            name: condition.name().to_string(),
            active: condition.is_active(),
            onset: condition.onset_date_time.clone().unwrap_or_default(),
            recorded: condition.recorded_date.clone().unwrap_or_default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EncounterRow {
    pub id: String,
    pub encounter_type: String,
    pub status: String,
    pub start: String,
    pub location: String,
}

impl From<&Encounter> for EncounterRow {
    fn from(encounter: &Encounter) -> Self {
        EncounterRow {
            id: encounter.id.clone(),
            encounter_type: encounter.type_display().to_string(),
            status: encounter.status.clone().unwrap_or_default(),
            start: encounter.start().unwrap_or("").to_string(),
            location: encounter.location_display().to_string(),
        }
    }
}

/// Everything the pharmacy screen shows for one patient.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PatientOverview {
    pub prescriptions: Vec<PrescriptionRow>,
    pub conditions: Vec<ConditionRow>,
    pub encounters: Vec<EncounterRow>,
}

/// A medication handed over against a prescription.
#[derive(Clone, Debug, PartialEq)]
pub struct NewDispense {
    pub prescription: EmrUuid,
    pub quantity: f64,
    /// Defaults to the prescribed unit.
    pub unit: Option<String>,
    /// Defaults to the configured clinic location.
    pub location: Option<EmrUuid>,
    /// Practitioner handing over the medication.
    pub performer: Option<EmrUuid>,
}

#[derive(Clone, Debug)]
pub struct PharmacyService {
    client: EmrClient,
}

impl PharmacyService {
    pub fn new(client: EmrClient) -> Self {
        Self { client }
    }

    /// Active prescriptions of a patient.
    ///
    /// FHIR servers differ in which search parameters they honour, so three queries are tried in
    /// turn until one returns prescriptions. A query the server rejects is skipped; an
    /// authentication failure ends the search.
    pub async fn active_prescriptions(&self, patient: &EmrUuid) -> ClinicResult<Vec<PrescriptionRow>> {
        let subject = format!("Patient/{patient}");
        let strategies: [(&str, Vec<(&str, &str)>, bool); 3] = [
            (
                "patient+status",
                vec![("patient", patient.as_str()), ("status", "active")],
                false,
            ),
            (
                "subject+status",
                vec![("subject", subject.as_str()), ("status", "active")],
                false,
            ),
            ("patient", vec![("patient", patient.as_str())], true),
        ];

        for (name, query, filter_active) in strategies {
            let requests = match self.client.fhir_search::<MedicationRequest>(&query).await {
                Ok(bundle) if bundle.is_empty() => {
                    tracing::debug!("no prescriptions found by {}", name);
                    continue;
                }
                Ok(bundle) => bundle.into_resources(),
                Err(err @ ClinicError::Status { .. }) => {
                    tracing::warn!("prescription search by {} failed, trying next: {}", name, err);
                    continue;
                }
                Err(err) => return Err(err),
            };

            let rows: Vec<PrescriptionRow> = requests
                .iter()
                .filter(|r| !filter_active || r.is_active())
                .map(PrescriptionRow::from)
                .collect();
            if !rows.is_empty() {
                tracing::debug!("{} prescription(s) found by {}", rows.len(), name);
                return Ok(rows);
            }
        }

        Ok(Vec::new())
    }

    pub async fn conditions(&self, patient: &EmrUuid) -> ClinicResult<Vec<ConditionRow>> {
        let bundle = self
            .client
            .fhir_search::<Condition>(&[("patient", patient.as_str())])
            .await?;
        Ok(bundle.resources().map(ConditionRow::from).collect())
    }

    /// Encounters of a patient, most recent first.
    pub async fn encounters(&self, patient: &EmrUuid) -> ClinicResult<Vec<EncounterRow>> {
        let bundle = self
            .client
            .fhir_search::<Encounter>(&[("patient", patient.as_str()), ("_sort", "-date")])
            .await?;
        Ok(bundle.resources().map(EncounterRow::from).collect())
    }

    pub async fn overview(&self, patient: &EmrUuid) -> ClinicResult<PatientOverview> {
        let (prescriptions, conditions, encounters) = tokio::try_join!(
            self.active_prescriptions(patient),
            self.conditions(patient),
            self.encounters(patient),
        )?;
        Ok(PatientOverview {
            prescriptions,
            conditions,
            encounters,
        })
    }

    /// Record a completed `MedicationDispense` against an active prescription.
    pub async fn dispense(&self, request: &NewDispense) -> ClinicResult<MedicationDispense> {
        if !request.quantity.is_finite() || request.quantity <= 0.0 {
            return Err(ClinicError::InvalidInput(format!(
                "dispensed quantity must be greater than zero, got {}",
                request.quantity
            )));
        }

        let prescription: MedicationRequest =
            self.client.fhir_read(request.prescription.as_str()).await?;
        if let Some(status) = prescription.status.as_deref() {
            if !prescription.is_active() {
                return Err(ClinicError::InvalidInput(format!(
                    "prescription {} is {status}, not active",
                    prescription.id
                )));
            }
        }

        let unit = request.unit.clone().or_else(|| {
            prescription
                .prescribed_quantity()
                .and_then(|q| q.unit.clone())
        });
        let location = request
            .location
            .as_ref()
            .or(self.client.config().location_uuid())
            .map(|l| Reference::to("Location", l.as_str()));

        let dispense = MedicationDispense {
            resource_type: MedicationDispense::RESOURCE_TYPE.to_string(),
            id: None,
            status: "completed".to_string(),
            medication_reference: prescription.medication_reference.clone(),
            medication_codeable_concept: prescription.medication_codeable_concept.clone(),
            subject: prescription.subject.clone(),
            performer: request
                .performer
                .iter()
                .map(|p| DispensePerformer {
                    actor: Reference::to("Practitioner", p.as_str()),
                })
                .collect(),
            location,
            authorizing_prescription: vec![Reference::to("MedicationRequest", &prescription.id)],
            quantity: Some(Quantity {
                value: Some(request.quantity),
                unit,
                system: None,
                code: None,
            }),
            when_handed_over: Some(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)),
            dosage_instruction: prescription.dosage_instruction.clone(),
        };

        let created = self.client.fhir_create(&dispense).await?;
        tracing::info!(
            "dispensed {} against prescription {}",
            format_number(request.quantity),
            prescription.id
        );
        Ok(created)
    }
}

fn quantity_display(quantity: &Quantity) -> String {
    match (quantity.value, quantity.unit.as_deref()) {
        (Some(value), Some(unit)) => format!("{} {}", format_number(value), unit),
        (Some(value), None) => format_number(value),
        (None, _) => String::new(),
    }
}
