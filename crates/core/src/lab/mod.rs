//! Laboratory workflow: the lab worklist, order status updates, and result entry and review.

pub mod matching;
pub mod results;
pub mod status;

pub use matching::{match_observations, MatchStrategy, ObservationMatch};
pub use results::ResultRow;
pub use status::{allowed_transitions, check_transition};

use crate::client::EmrClient;
use crate::constants::OPENMRS_DATETIME_FORMAT;
use crate::export::CsvRow;
use crate::{ClinicError, ClinicResult};
use chrono::{NaiveDate, Utc};
use futures::future::try_join_all;
use clinic_types::{EmrUuid, NonEmptyText};
use openmrs::{Concept, FulfillerDetails, FulfillerStatus, NewObs, Obs, Order, Results};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::str::FromStr;

/// Status filter for the lab worklist.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OrderStatusFilter {
    /// Orders the lab has not picked up yet (no fulfiller status).
    Pending,
    Fulfiller(FulfillerStatus),
}

impl OrderStatusFilter {
    fn keeps(self, status: Option<FulfillerStatus>) -> bool {
        match self {
            OrderStatusFilter::Pending => status.is_none(),
            OrderStatusFilter::Fulfiller(wanted) => status == Some(wanted),
        }
    }
}

impl FromStr for OrderStatusFilter {
    type Err = ClinicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if matches!(s.trim().to_ascii_lowercase().as_str(), "pending" | "new") {
            return Ok(OrderStatusFilter::Pending);
        }
        FulfillerStatus::from_str(s)
            .map(OrderStatusFilter::Fulfiller)
            .map_err(|e| ClinicError::InvalidInput(e.to_string()))
    }
}

#[derive(Clone, Debug, Default)]
pub struct LabOrderQuery {
    pub patient: Option<EmrUuid>,
    pub status: Option<OrderStatusFilter>,
    pub activated_on_or_after: Option<NaiveDate>,
    /// Include discontinued and stopped orders.
    pub include_stopped: bool,
}

/// A lab order as shown in the worklist.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LabOrderRow {
    pub uuid: String,
    pub order_number: String,
    pub patient_uuid: Option<String>,
    pub patient_name: String,
    pub test_name: String,
    pub concept_uuid: String,
    pub urgency: String,
    pub status: Option<FulfillerStatus>,
    pub status_label: String,
    pub comment: String,
    pub date_activated: String,
    /// Statuses the order may move to next.
    pub next_statuses: Vec<FulfillerStatus>,
}

impl From<&Order> for LabOrderRow {
    fn from(order: &Order) -> Self {
        LabOrderRow {
            uuid: order.uuid.clone(),
            order_number: order.order_number.clone().unwrap_or_default(),
            patient_uuid: order.patient.as_ref().map(|p| p.uuid.clone()),
            patient_name: order.patient_name().to_string(),
            test_name: order.test_name().to_string(),
            concept_uuid: order.concept.uuid.clone(),
            urgency: order.urgency.clone().unwrap_or_default(),
            status: order.fulfiller_status,
            status_label: order
                .fulfiller_status
                .map(FulfillerStatus::label)
                .unwrap_or("New")
                .to_string(),
            comment: order.fulfiller_comment.clone().unwrap_or_default(),
            date_activated: order.date_activated.clone().unwrap_or_default(),
            next_statuses: allowed_transitions(order.fulfiller_status).to_vec(),
        }
    }
}

impl CsvRow for LabOrderRow {
    fn csv_fields(&self) -> Vec<String> {
        vec![
            self.order_number.clone(),
            self.patient_name.clone(),
            self.test_name.clone(),
            self.urgency.clone(),
            self.status_label.clone(),
            self.date_activated.clone(),
            self.comment.clone(),
        ]
    }
}

/// The result sheet of one order.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OrderResults {
    pub order: LabOrderRow,
    pub encounter_uuid: String,
    pub strategy: MatchStrategy,
    /// Set when the rows could not be tied to the order and cover the whole encounter.
    pub needs_review: bool,
    pub rows: Vec<ResultRow>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ResultValue {
    Numeric(f64),
    Text(NonEmptyText),
    /// Answer concept.
    Coded(EmrUuid),
}

impl ResultValue {
    fn to_wire(&self) -> ClinicResult<serde_json::Value> {
        match self {
            ResultValue::Numeric(n) if !n.is_finite() => Err(ClinicError::InvalidInput(format!(
                "result value must be a finite number, got {n}"
            ))),
            ResultValue::Numeric(n) => Ok(serde_json::json!(n)),
            ResultValue::Text(text) => Ok(serde_json::json!(text.as_str())),
            ResultValue::Coded(answer) => Ok(serde_json::json!(answer.as_str())),
        }
    }
}

/// One entered result.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResultEntry {
    pub concept_uuid: EmrUuid,
    pub value: ResultValue,
}

#[derive(Clone, Debug)]
pub struct LabService {
    client: EmrClient,
}

impl LabService {
    pub fn new(client: EmrClient) -> Self {
        Self { client }
    }

    pub async fn list_orders(&self, query: &LabOrderQuery) -> ClinicResult<Vec<LabOrderRow>> {
        let order_type = self.client.config().lab_order_type_uuid().to_string();
        let activated = query
            .activated_on_or_after
            .map(|d| d.format("%Y-%m-%d").to_string());

        let mut params: Vec<(&str, &str)> = vec![("orderType", order_type.as_str()), ("v", "full")];
        if let Some(patient) = &query.patient {
            params.push(("patient", patient.as_str()));
        }
        if let Some(date) = &activated {
            params.push(("activatedOnOrAfterDate", date.as_str()));
        }

        let orders: Results<Order> = self.client.rest_get("order", &params, "orders").await?;
        let rows: Vec<LabOrderRow> = orders
            .results
            .iter()
            .filter(|o| query.include_stopped || !o.is_stopped())
            .filter(|o| query.status.map_or(true, |f| f.keeps(o.fulfiller_status)))
            .map(LabOrderRow::from)
            .collect();

        tracing::debug!(
            "lab worklist: {} of {} orders kept",
            rows.len(),
            orders.results.len()
        );
        Ok(rows)
    }

    pub async fn get_order(&self, uuid: &EmrUuid) -> ClinicResult<Order> {
        self.client
            .rest_get(&format!("order/{uuid}"), &[("v", "full")], "order")
            .await
    }

    /// Move an order to `next`, recording `comment` as the fulfiller comment.
    ///
    /// # Errors
    ///
    /// Returns [`ClinicError::InvalidInput`] without writing anything if the workflow does not
    /// allow the move.
    pub async fn update_status(
        &self,
        uuid: &EmrUuid,
        next: FulfillerStatus,
        comment: Option<String>,
    ) -> ClinicResult<LabOrderRow> {
        let mut order = self.get_order(uuid).await?;
        check_transition(order.fulfiller_status, next)?;

        let comment = comment.map(|c| c.trim().to_string()).filter(|c| !c.is_empty());
        self.write_status(uuid, next, comment.clone()).await?;
        tracing::info!("order {} moved to {}", uuid, next);

        order.fulfiller_status = Some(next);
        if comment.is_some() {
            order.fulfiller_comment = comment;
        }
        Ok(LabOrderRow::from(&order))
    }

    pub async fn get_order_results(&self, uuid: &EmrUuid) -> ClinicResult<OrderResults> {
        let order = self.get_order(uuid).await?;
        let encounter = order.encounter.as_ref().ok_or_else(|| {
            ClinicError::InvalidInput(format!("order {uuid} is not linked to an encounter"))
        })?;

        let observations: Results<Obs> = self
            .client
            .rest_get(
                "obs",
                &[("encounter", encounter.uuid.as_str()), ("v", "full")],
                "observations",
            )
            .await?;

        let matched = match_observations(&order.uuid, &order.concept.uuid, &observations.results);

        let lookups = results::concept_uuids(&matched.observations)
            .into_iter()
            .map(|concept_uuid| async move {
                let concept: Concept = self
                    .client
                    .rest_get(&format!("concept/{concept_uuid}"), &[("v", "full")], "concept")
                    .await?;
                Ok::<_, ClinicError>((concept_uuid, concept))
            });
        let concepts: HashMap<String, Concept> =
            try_join_all(lookups).await?.into_iter().collect();

        Ok(OrderResults {
            order: LabOrderRow::from(&order),
            encounter_uuid: encounter.uuid.clone(),
            strategy: matched.strategy,
            needs_review: matched.strategy.is_fallback(),
            rows: results::reshape(&matched.observations, &concepts),
        })
    }

    /// Record results for an order and mark it completed.
    ///
    /// A single entry for the order's own concept is saved as one observation; anything else is
    /// saved as a panel under the order's concept with one member per entry.
    pub async fn submit_results(&self, uuid: &EmrUuid, entries: &[ResultEntry]) -> ClinicResult<Obs> {
        if entries.is_empty() {
            return Err(ClinicError::InvalidInput("no results to submit".into()));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = entries.iter().find(|e| !seen.insert(&e.concept_uuid)) {
            return Err(ClinicError::InvalidInput(format!(
                "more than one result for concept {}",
                dup.concept_uuid
            )));
        }

        let order = self.get_order(uuid).await?;
        check_transition(order.fulfiller_status, FulfillerStatus::Completed)?;
        let encounter = order.encounter.as_ref().ok_or_else(|| {
            ClinicError::InvalidInput(format!("order {uuid} is not linked to an encounter"))
        })?;
        let patient = order.patient.as_ref().ok_or_else(|| {
            ClinicError::InvalidInput(format!("order {uuid} has no patient"))
        })?;

        let obs_datetime = Utc::now().format(OPENMRS_DATETIME_FORMAT).to_string();
        let new_obs = |concept: &str, value: Option<serde_json::Value>| NewObs {
            person: patient.uuid.clone(),
            concept: concept.to_string(),
            encounter: Some(encounter.uuid.clone()),
            order: Some(order.uuid.clone()),
            obs_datetime: obs_datetime.clone(),
            value,
            group_members: Vec::new(),
        };

        let body = match entries {
            [single] if single.concept_uuid.as_str() == order.concept.uuid => {
                new_obs(&order.concept.uuid, Some(single.value.to_wire()?))
            }
            _ => {
                let members = entries
                    .iter()
                    .map(|e| Ok(new_obs(e.concept_uuid.as_str(), Some(e.value.to_wire()?))))
                    .collect::<ClinicResult<Vec<_>>>()?;
                NewObs {
                    group_members: members,
                    ..new_obs(&order.concept.uuid, None)
                }
            }
        };

        let saved: Obs = self.client.rest_post("obs", &body, "observation").await?;
        if let Err(err) = self
            .write_status(uuid, FulfillerStatus::Completed, None)
            .await
        {
            tracing::warn!(
                "order {}: results saved as obs {} but the order was not completed; \
                 void that obs before submitting again: {}",
                uuid,
                saved.uuid,
                err
            );
            return Err(err);
        }
        tracing::info!(
            "order {}: {} result(s) saved as obs {}",
            uuid,
            entries.len(),
            saved.uuid
        );
        Ok(saved)
    }

    async fn write_status(
        &self,
        uuid: &EmrUuid,
        status: FulfillerStatus,
        comment: Option<String>,
    ) -> ClinicResult<()> {
        let details = FulfillerDetails {
            fulfiller_status: status,
            fulfiller_comment: comment,
        };
        self.client
            .rest_post_discard(&format!("order/{uuid}/fulfillerdetails"), &details)
            .await
    }
}
