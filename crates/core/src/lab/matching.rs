//! Deciding which observations of an encounter belong to a lab order.
//!
//! OpenMRS does not always link result observations to their order, so the observations of the
//! order's encounter are narrowed down by a chain of strategies. The first strategy that selects
//! anything wins; later strategies are only tried when every earlier one selected nothing.

use openmrs::Obs;
use serde::Serialize;

/// Which strategy produced an [`ObservationMatch`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    /// Observations whose `order.uuid` is the order.
    OrderReference,
    /// Panel observations whose concept is the order's concept.
    Panel,
    /// Observations whose concept is the order's concept.
    Concept,
    /// Nothing matched, so every observation of the encounter was returned. The rows may belong
    /// to other orders and should be reviewed before use.
    EncounterFallback,
}

impl MatchStrategy {
    pub fn is_fallback(self) -> bool {
        self == MatchStrategy::EncounterFallback
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ObservationMatch {
    pub strategy: MatchStrategy,
    pub observations: Vec<Obs>,
}

pub fn match_observations(
    order_uuid: &str,
    concept_uuid: &str,
    observations: &[Obs],
) -> ObservationMatch {
    let select = |keep: &dyn Fn(&Obs) -> bool| -> Vec<Obs> {
        observations.iter().filter(|o| keep(o)).cloned().collect()
    };

    let strategies: [(MatchStrategy, &dyn Fn(&Obs) -> bool); 3] = [
        (MatchStrategy::OrderReference, &|o: &Obs| {
            o.order_uuid() == Some(order_uuid)
        }),
        (MatchStrategy::Panel, &|o: &Obs| {
            o.is_panel() && o.concept.uuid == concept_uuid
        }),
        (MatchStrategy::Concept, &|o: &Obs| o.concept.uuid == concept_uuid),
    ];

    for (strategy, keep) in strategies {
        let matched = select(keep);
        if !matched.is_empty() {
            tracing::debug!(
                "order {}: {} observation(s) matched by {:?}",
                order_uuid,
                matched.len(),
                strategy
            );
            return ObservationMatch {
                strategy,
                observations: matched,
            };
        }
    }

    if !observations.is_empty() {
        tracing::warn!(
            "order {}: no observation references the order or its concept {}; returning all {} encounter observations",
            order_uuid,
            concept_uuid,
            observations.len()
        );
    }
    ObservationMatch {
        strategy: MatchStrategy::EncounterFallback,
        observations: observations.to_vec(),
    }
}
