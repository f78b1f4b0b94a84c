//! Stock management (the OpenMRS `stockmanagement` module): items, operations, inventory and
//! stock-take reconciliation.

pub mod reconciliation;

pub use reconciliation::{PhysicalCount, ReconciliationItem, ReconciliationSummary};

use crate::client::EmrClient;
use crate::constants::{ADJUSTMENT_OPERATION_TYPE, OPENMRS_DATETIME_FORMAT};
use crate::export::CsvRow;
use crate::{ClinicError, ClinicResult};
use chrono::Utc;
use clinic_types::EmrUuid;
use openmrs::{
    format_number, NewStockOperation, NewStockOperationItem, Results, StockInventory, StockItem,
    StockOperation, StockOperationStatus, StockOperationType,
};
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StockItemRow {
    pub uuid: String,
    pub name: String,
    pub category: String,
    pub dispensing_unit: String,
    pub reorder_level: Option<f64>,
    pub is_drug: bool,
    pub has_expiration: bool,
}

impl From<&StockItem> for StockItemRow {
    fn from(item: &StockItem) -> Self {
        StockItemRow {
            uuid: item.uuid.clone(),
            name: item.name().to_string(),
            category: item.category_name.clone().unwrap_or_default(),
            dispensing_unit: item.dispensing_unit_name.clone().unwrap_or_default(),
            reorder_level: item.reorder_level,
            is_drug: item.is_drug,
            has_expiration: item.has_expiration,
        }
    }
}

impl CsvRow for StockItemRow {
    fn csv_fields(&self) -> Vec<String> {
        let yes_no = |b: bool| if b { "Yes" } else { "No" }.to_string();
        vec![
            self.name.clone(),
            self.category.clone(),
            self.dispensing_unit.clone(),
            self.reorder_level.map(format_number).unwrap_or_default(),
            yes_no(self.is_drug),
            yes_no(self.has_expiration),
        ]
    }
}

#[derive(Clone, Debug)]
pub struct StockService {
    client: EmrClient,
}

impl StockService {
    pub fn new(client: EmrClient) -> Self {
        Self { client }
    }

    /// Stock items, optionally narrowed by a server-side name search.
    pub async fn list_items(&self, query: Option<&str>) -> ClinicResult<Vec<StockItemRow>> {
        let mut params = vec![("v", "default")];
        if let Some(q) = query.map(str::trim).filter(|q| !q.is_empty()) {
            params.push(("q", q));
        }
        let items: Results<StockItem> = self
            .client
            .rest_get("stockmanagement/stockitem", &params, "stock items")
            .await?;
        Ok(items.results.iter().map(StockItemRow::from).collect())
    }

    pub async fn get_item(&self, uuid: &EmrUuid) -> ClinicResult<StockItem> {
        self.client
            .rest_get(
                &format!("stockmanagement/stockitem/{uuid}"),
                &[("v", "full")],
                "stock item",
            )
            .await
    }

    /// Stock operations, newest first as the server returns them, optionally of one status.
    pub async fn list_operations(
        &self,
        status: Option<StockOperationStatus>,
    ) -> ClinicResult<Vec<StockOperation>> {
        let operations: Results<StockOperation> = self
            .client
            .rest_get(
                "stockmanagement/stockoperation",
                &[("v", "default")],
                "stock operations",
            )
            .await?;
        Ok(operations
            .results
            .into_iter()
            .filter(|op| status.map_or(true, |s| op.status == s))
            .collect())
    }

    /// # Errors
    ///
    /// Returns [`ClinicError::InvalidInput`] if the operation has no items, an item id is
    /// malformed, or a quantity is zero or not finite.
    pub async fn create_operation(&self, operation: &NewStockOperation) -> ClinicResult<StockOperation> {
        validate_operation(operation)?;
        let created: StockOperation = self
            .client
            .rest_post("stockmanagement/stockoperation", operation, "stock operation")
            .await?;
        tracing::info!(
            "stock operation {} created with {} item(s)",
            created.operation_number.as_deref().unwrap_or(&created.uuid),
            operation.stock_operation_items.len()
        );
        Ok(created)
    }

    /// Inventory held at a location, one line per item and batch.
    pub async fn inventory(&self, location: &EmrUuid) -> ClinicResult<Vec<StockInventory>> {
        let inventory: Results<StockInventory> = self
            .client
            .rest_get(
                "stockmanagement/stockiteminventory",
                &[
                    ("v", "default"),
                    ("locationUuid", location.as_str()),
                    ("groupBy", "LocationStockItemBatchNo"),
                ],
                "stock inventory",
            )
            .await?;
        Ok(inventory.results)
    }

    pub async fn reconcile(
        &self,
        location: &EmrUuid,
        counts: &[PhysicalCount],
    ) -> ClinicResult<ReconciliationSummary> {
        if counts.is_empty() {
            return Err(ClinicError::InvalidInput("no physical counts given".into()));
        }
        let inventory = self.inventory(location).await?;
        let items = reconciliation::reconcile(&inventory, counts)?;
        Ok(ReconciliationSummary::from_items(location.as_str(), items))
    }

    /// Post the variances of a reconciliation as an adjustment operation at `location`.
    ///
    /// # Errors
    ///
    /// Returns [`ClinicError::InvalidInput`] if no line has a variance or the summary was taken
    /// at another location, and [`ClinicError::NotFound`] if the EMR has no adjustment operation
    /// type.
    pub async fn submit_reconciliation(
        &self,
        location: &EmrUuid,
        summary: &ReconciliationSummary,
        remarks: Option<String>,
    ) -> ClinicResult<StockOperation> {
        if summary.location_uuid != location.as_str() {
            return Err(ClinicError::InvalidInput(format!(
                "reconciliation was taken at {}, not {location}",
                summary.location_uuid
            )));
        }
        let lines: Vec<NewStockOperationItem> = summary
            .variances()
            .map(|item| NewStockOperationItem {
                stock_item_uuid: item.stock_item_uuid.clone(),
                stock_batch_uuid: item.stock_batch_uuid.clone(),
                batch_no: item.batch_no.clone(),
                quantity: item.difference(),
                packaging_uom_uuid: None,
            })
            .collect();
        if lines.is_empty() {
            return Err(ClinicError::InvalidInput(
                "no variances to submit: physical counts match the system".into(),
            ));
        }

        let operation_type = self.adjustment_type().await?;
        let operation = NewStockOperation {
            operation_type_uuid: operation_type.uuid,
            at_location_uuid: Some(location.to_string()),
            source_uuid: None,
            destination_uuid: None,
            operation_date: Utc::now().format(OPENMRS_DATETIME_FORMAT).to_string(),
            remarks: remarks.map(|r| r.trim().to_string()).filter(|r| !r.is_empty()),
            stock_operation_items: lines,
        };
        self.create_operation(&operation).await
    }

    async fn adjustment_type(&self) -> ClinicResult<StockOperationType> {
        let types: Results<StockOperationType> = self
            .client
            .rest_get(
                "stockmanagement/stockoperationtype",
                &[("v", "default")],
                "stock operation types",
            )
            .await?;
        types
            .results
            .into_iter()
            .find(|t| t.is(ADJUSTMENT_OPERATION_TYPE))
            .ok_or_else(|| {
                ClinicError::NotFound(format!(
                    "stock operation type '{ADJUSTMENT_OPERATION_TYPE}'"
                ))
            })
    }
}

fn validate_operation(operation: &NewStockOperation) -> ClinicResult<()> {
    EmrUuid::parse(&operation.operation_type_uuid)?;
    if operation.stock_operation_items.is_empty() {
        return Err(ClinicError::InvalidInput(
            "a stock operation needs at least one item".into(),
        ));
    }
    for (index, item) in operation.stock_operation_items.iter().enumerate() {
        EmrUuid::parse(&item.stock_item_uuid)?;
        if !item.quantity.is_finite() || item.quantity == 0.0 {
            return Err(ClinicError::InvalidInput(format!(
                "item {} quantity must be a non-zero number, got {}",
                index + 1,
                item.quantity
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::test_support::{emr, rest};
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn id(s: &str) -> EmrUuid {
        EmrUuid::parse(s).expect("valid id")
    }

    async fn mount_inventory(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path(rest("stockmanagement/stockiteminventory")))
            .and(query_param("locationUuid", "loc-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": [
                {"stockItemUuid": "para", "stockItemName": "Paracetamol", "batchNumber": "B1",
                 "stockBatchUuid": "sb-1", "quantity": 100},
                {"stockItemUuid": "amox", "stockItemName": "Amoxicillin", "quantity": 20}
            ]})))
            .mount(server)
            .await;
    }

    fn counts() -> Vec<PhysicalCount> {
        vec![
            PhysicalCount {
                stock_item_uuid: id("para"),
                batch_no: Some("B1".into()),
                quantity: 96.0,
            },
            PhysicalCount {
                stock_item_uuid: id("amox"),
                batch_no: None,
                quantity: 20.0,
            },
        ]
    }

    #[tokio::test]
    async fn lists_items_with_search() {
        let (server, client) = emr().await;
        Mock::given(method("GET"))
            .and(path(rest("stockmanagement/stockitem")))
            .and(query_param("q", "para"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": [
                {"uuid": "si-1", "drugName": "Paracetamol 500mg", "isDrug": true,
                 "categoryName": "Analgesic", "reorderLevel": 100}
            ]})))
            .expect(1)
            .mount(&server)
            .await;

        let rows = StockService::new(client)
            .list_items(Some(" para "))
            .await
            .expect("items");
        assert_eq!(rows[0].name, "Paracetamol 500mg");
        assert_eq!(
            rows[0].csv_fields(),
            vec!["Paracetamol 500mg", "Analgesic", "", "100", "Yes", "No"]
        );
    }

    #[tokio::test]
    async fn operations_filter_by_status() {
        let (server, client) = emr().await;
        Mock::given(method("GET"))
            .and(path(rest("stockmanagement/stockoperation")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": [
                {"uuid": "op-1", "status": "NEW"},
                {"uuid": "op-2", "status": "COMPLETED"}
            ]})))
            .mount(&server)
            .await;

        let ops = StockService::new(client)
            .list_operations(Some(StockOperationStatus::Completed))
            .await
            .expect("operations");
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].uuid, "op-2");
    }

    #[tokio::test]
    async fn create_operation_validates_quantities() {
        let (server, client) = emr().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        let operation = NewStockOperation {
            operation_type_uuid: "receipt-type".into(),
            at_location_uuid: Some("loc-1".into()),
            source_uuid: None,
            destination_uuid: None,
            operation_date: "2026-10-19T08:00:00.000+0000".into(),
            remarks: None,
            stock_operation_items: vec![NewStockOperationItem {
                stock_item_uuid: "para".into(),
                stock_batch_uuid: None,
                batch_no: None,
                quantity: 0.0,
                packaging_uom_uuid: None,
            }],
        };
        let err = StockService::new(client)
            .create_operation(&operation)
            .await
            .expect_err("zero quantity");
        assert!(matches!(err, ClinicError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn reconcile_against_location_inventory() {
        let (server, client) = emr().await;
        mount_inventory(&server).await;

        let summary = StockService::new(client)
            .reconcile(&id("loc-1"), &counts())
            .await
            .expect("summary");
        assert_eq!(summary.total_items, 2);
        assert_eq!(summary.items_with_variance, 1);
        assert_eq!(summary.total_variance, -4.0);
        assert_eq!(summary.items[0].name, "Paracetamol");
    }

    #[tokio::test]
    async fn submit_posts_only_variances_as_adjustment() {
        let (server, client) = emr().await;
        mount_inventory(&server).await;
        Mock::given(method("GET"))
            .and(path(rest("stockmanagement/stockoperationtype")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": [
                {"uuid": "type-receipt", "name": "Receipt", "operationType": "receipt"},
                {"uuid": "type-adjust", "name": "Adjustment", "operationType": "adjustment"}
            ]})))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(rest("stockmanagement/stockoperation")))
            .and(body_partial_json(json!({
                "operationTypeUuid": "type-adjust",
                "atLocationUuid": "loc-1",
                "remarks": "Monthly count",
                "stockOperationItems": [
                    {"stockItemUuid": "para", "stockBatchUuid": "sb-1", "batchNo": "B1", "quantity": -4.0}
                ]
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "uuid": "op-9", "operationNumber": "ADJ-9", "status": "NEW"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let stock = StockService::new(client);
        let summary = stock.reconcile(&id("loc-1"), &counts()).await.expect("summary");
        let op = stock
            .submit_reconciliation(&id("loc-1"), &summary, Some("Monthly count".into()))
            .await
            .expect("submitted");
        assert_eq!(op.uuid, "op-9");
    }

    #[tokio::test]
    async fn nothing_to_submit_without_variances() {
        let (_server, client) = emr().await;
        let summary = ReconciliationSummary::from_items(
            "loc-1",
            vec![ReconciliationItem {
                stock_item_uuid: "para".into(),
                name: "Paracetamol".into(),
                batch_no: None,
                stock_batch_uuid: None,
                system_quantity: 5.0,
                physical_quantity: 5.0,
            }],
        );
        let stock = StockService::new(client);

        let err = stock
            .submit_reconciliation(&id("loc-1"), &summary, None)
            .await
            .expect_err("no variances");
        assert!(matches!(err, ClinicError::InvalidInput(_)));

        let elsewhere = stock
            .submit_reconciliation(&id("loc-2"), &summary, None)
            .await
            .expect_err("other location");
        assert!(elsewhere.to_string().contains("loc-1"));
    }
}
