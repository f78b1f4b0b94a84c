//! Stock-take reconciliation: physical counts against the system's inventory.

use crate::export::CsvRow;
use crate::{ClinicError, ClinicResult};
use clinic_types::EmrUuid;
use openmrs::{format_number, StockInventory};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Quantity counted on the shelf for one item (and batch).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PhysicalCount {
    pub stock_item_uuid: EmrUuid,
    #[serde(default)]
    pub batch_no: Option<String>,
    pub quantity: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReconciliationItem {
    pub stock_item_uuid: String,
    pub name: String,
    pub batch_no: Option<String>,
    pub stock_batch_uuid: Option<String>,
    pub system_quantity: f64,
    pub physical_quantity: f64,
}

impl ReconciliationItem {
    /// Physical minus system quantity; positive when more stock was found than recorded.
    pub fn difference(&self) -> f64 {
        self.physical_quantity - self.system_quantity
    }

    /// Difference as a percentage of the system quantity. `None` when the system holds nothing.
    pub fn variance_percent(&self) -> Option<f64> {
        (self.system_quantity != 0.0).then(|| self.difference() / self.system_quantity * 100.0)
    }

    pub fn has_variance(&self) -> bool {
        self.difference() != 0.0
    }
}

impl CsvRow for ReconciliationItem {
    fn csv_fields(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.batch_no.clone().unwrap_or_default(),
            format_number(self.system_quantity),
            format_number(self.physical_quantity),
            format_number(self.difference()),
            self.variance_percent()
                .map(|p| format!("{p:.1}"))
                .unwrap_or_default(),
        ]
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReconciliationSummary {
    pub location_uuid: String,
    pub items: Vec<ReconciliationItem>,
    pub total_items: usize,
    pub items_with_variance: usize,
    /// Sum of the signed differences.
    pub total_variance: f64,
}

impl ReconciliationSummary {
    pub fn from_items(location_uuid: impl Into<String>, items: Vec<ReconciliationItem>) -> Self {
        ReconciliationSummary {
            location_uuid: location_uuid.into(),
            total_items: items.len(),
            items_with_variance: items.iter().filter(|i| i.has_variance()).count(),
            total_variance: items.iter().map(ReconciliationItem::difference).sum(),
            items,
        }
    }

    pub fn variances(&self) -> impl Iterator<Item = &ReconciliationItem> {
        self.items.iter().filter(|i| i.has_variance())
    }
}

type LineKey<'a> = (&'a str, Option<&'a str>);

/// Batch numbers compare trimmed; a blank batch is no batch.
fn batch_key(batch: Option<&str>) -> Option<&str> {
    batch.map(str::trim).filter(|b| !b.is_empty())
}

/// Pair each count with the system quantity of the same item and batch.
///
/// Only counted lines are reconciled. A count for a line the system does not hold is reconciled
/// against zero.
///
/// # Errors
///
/// Returns [`ClinicError::InvalidInput`] if a count is negative or not finite, or if the same
/// item and batch is counted twice.
pub fn reconcile(
    inventory: &[StockInventory],
    counts: &[PhysicalCount],
) -> ClinicResult<Vec<ReconciliationItem>> {
    let mut system: HashMap<LineKey, (f64, &StockInventory)> = HashMap::new();
    for line in inventory {
        let key = (line.stock_item_uuid.as_str(), batch_key(line.batch_number.as_deref()));
        system
            .entry(key)
            .and_modify(|(quantity, _)| *quantity += line.quantity)
            .or_insert((line.quantity, line));
    }

    let mut seen: HashSet<LineKey> = HashSet::new();
    let mut items = Vec::with_capacity(counts.len());
    for count in counts {
        if !count.quantity.is_finite() || count.quantity < 0.0 {
            return Err(ClinicError::InvalidInput(format!(
                "count for {} must be a number of at least zero, got {}",
                count.stock_item_uuid, count.quantity
            )));
        }
        let batch = batch_key(count.batch_no.as_deref());
        let key = (count.stock_item_uuid.as_str(), batch);
        if !seen.insert(key) {
            return Err(ClinicError::InvalidInput(format!(
                "{} batch {} is counted more than once",
                count.stock_item_uuid,
                batch.unwrap_or("(none)")
            )));
        }

        let recorded = system.get(&key);
        items.push(ReconciliationItem {
            stock_item_uuid: count.stock_item_uuid.to_string(),
            name: recorded
                .and_then(|(_, line)| line.stock_item_name.clone())
                .unwrap_or_default(),
            batch_no: batch.map(str::to_string),
            stock_batch_uuid: recorded.and_then(|(_, line)| line.stock_batch_uuid.clone()),
            system_quantity: recorded.map_or(0.0, |(quantity, _)| *quantity),
            physical_quantity: count.quantity,
        });
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inventory(item: &str, batch: Option<&str>, quantity: f64) -> StockInventory {
        StockInventory {
            stock_item_uuid: item.to_string(),
            stock_item_name: Some(format!("{item} name")),
            party_uuid: Some("loc-1".into()),
            party_name: None,
            stock_batch_uuid: batch.map(|b| format!("batch-{b}")),
            batch_number: batch.map(str::to_string),
            quantity,
            quantity_uom: None,
            expiration: None,
        }
    }

    fn count(item: &str, batch: Option<&str>, quantity: f64) -> PhysicalCount {
        PhysicalCount {
            stock_item_uuid: EmrUuid::parse(item).expect("id"),
            batch_no: batch.map(str::to_string),
            quantity,
        }
    }

    #[test]
    fn differences_and_percentages() {
        let items = reconcile(
            &[
                inventory("para", Some("B1"), 100.0),
                inventory("amox", None, 0.0),
            ],
            &[count("para", Some("B1"), 90.0), count("amox", None, 5.0)],
        )
        .expect("reconciled");

        assert_eq!(items[0].name, "para name");
        assert_eq!(items[0].stock_batch_uuid.as_deref(), Some("batch-B1"));
        assert_eq!(items[0].difference(), -10.0);
        assert_eq!(items[0].variance_percent(), Some(-10.0));
        assert_eq!(items[1].difference(), 5.0);
        assert_eq!(items[1].variance_percent(), None);
    }

    #[test]
    fn only_counted_lines_are_reconciled() {
        let items = reconcile(
            &[inventory("para", None, 10.0), inventory("gauze", None, 3.0)],
            &[count("para", None, 10.0), count("new-item", None, 2.0)],
        )
        .expect("reconciled");
        assert_eq!(items.len(), 2);
        assert!(!items[0].has_variance());
        assert_eq!(items[1].system_quantity, 0.0);
        assert_eq!(items[1].name, "");
    }

    #[test]
    fn split_inventory_lines_are_summed() {
        let items = reconcile(
            &[inventory("para", Some("B1"), 4.0), inventory("para", Some("B1"), 6.0)],
            &[count("para", Some(" B1 "), 10.0)],
        )
        .expect("reconciled");
        assert_eq!(items[0].system_quantity, 10.0);
        assert!(!items[0].has_variance());
    }

    #[test]
    fn padded_and_blank_inventory_batches_match_their_counts() {
        let items = reconcile(
            &[inventory("para", Some(" B1"), 12.0), inventory("amox", Some(""), 7.0)],
            &[count("para", Some("B1"), 12.0), count("amox", None, 5.0)],
        )
        .expect("reconciled");
        assert_eq!(items[0].system_quantity, 12.0);
        assert_eq!(items[0].batch_no.as_deref(), Some("B1"));
        assert!(!items[0].has_variance());
        assert_eq!(items[1].system_quantity, 7.0);
        assert_eq!(items[1].difference(), -2.0);
    }

    #[test]
    fn rejects_bad_counts() {
        assert!(reconcile(&[], &[count("para", None, -1.0)]).is_err());
        assert!(reconcile(&[], &[count("para", None, f64::NAN)]).is_err());
        let dup = reconcile(&[], &[count("para", Some("B1"), 1.0), count("para", Some("B1"), 2.0)])
            .expect_err("duplicate");
        assert!(dup.to_string().contains("more than once"));
    }

    #[test]
    fn summary_totals() {
        let items = reconcile(
            &[inventory("a", None, 10.0), inventory("b", None, 5.0), inventory("c", None, 1.0)],
            &[count("a", None, 8.0), count("b", None, 5.0), count("c", None, 4.0)],
        )
        .expect("reconciled");
        let summary = ReconciliationSummary::from_items("loc-1", items);
        assert_eq!(summary.total_items, 3);
        assert_eq!(summary.items_with_variance, 2);
        assert_eq!(summary.total_variance, 1.0);
        assert_eq!(summary.variances().count(), 2);

        let csv = crate::export::to_csv(
            &crate::export::RECONCILIATION_HEADERS,
            &summary.items,
        )
        .expect("csv");
        assert_eq!(csv.lines().nth(1), Some("a name,,10,8,-2,-20.0"));
    }
}
