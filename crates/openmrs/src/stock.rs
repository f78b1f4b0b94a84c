//! Stock management module representations (`/stockmanagement/*`).
//!
//! These mirror the flattened DTOs of the OpenMRS stock management module, which (unlike core
//! resources) embeds related objects as `xxxUuid`/`xxxName` pairs.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockItem {
    pub uuid: String,
    #[serde(default)]
    pub drug_uuid: Option<String>,
    #[serde(default)]
    pub drug_name: Option<String>,
    #[serde(default)]
    pub concept_uuid: Option<String>,
    #[serde(default)]
    pub concept_name: Option<String>,
    #[serde(default)]
    pub common_name: Option<String>,
    #[serde(default)]
    pub acronym: Option<String>,
    #[serde(default)]
    pub is_drug: bool,
    #[serde(default)]
    pub has_expiration: bool,
    #[serde(default)]
    pub category_name: Option<String>,
    #[serde(default)]
    pub dispensing_unit_name: Option<String>,
    #[serde(default)]
    pub reorder_level: Option<f64>,
    #[serde(default, rename = "reorderLevelUoMName")]
    pub reorder_level_uom_name: Option<String>,
    #[serde(default)]
    pub purchase_price: Option<f64>,
    #[serde(default)]
    pub expiry_notice: Option<i64>,
}

impl StockItem {
    /// Best available name: drug, then common name, then concept.
    pub fn name(&self) -> &str {
        self.drug_name
            .as_deref()
            .or(self.common_name.as_deref())
            .or(self.concept_name.as_deref())
            .unwrap_or("")
    }
}

/// Lifecycle of a stock operation in the stock management module.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StockOperationStatus {
    New,
    Submitted,
    Dispatched,
    Completed,
    Cancelled,
    Rejected,
    Returned,
    #[serde(other)]
    Unknown,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockOperation {
    pub uuid: String,
    #[serde(default)]
    pub operation_number: Option<String>,
    #[serde(default)]
    pub operation_type: Option<String>,
    #[serde(default)]
    pub operation_type_uuid: Option<String>,
    #[serde(default)]
    pub operation_type_name: Option<String>,
    #[serde(default)]
    pub operation_date: Option<String>,
    pub status: StockOperationStatus,
    #[serde(default)]
    pub source_uuid: Option<String>,
    #[serde(default)]
    pub source_name: Option<String>,
    #[serde(default)]
    pub destination_uuid: Option<String>,
    #[serde(default)]
    pub destination_name: Option<String>,
    #[serde(default)]
    pub at_location_uuid: Option<String>,
    #[serde(default)]
    pub at_location_name: Option<String>,
    #[serde(default)]
    pub remarks: Option<String>,
    #[serde(default)]
    pub stock_operation_items: Vec<StockOperationItem>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockOperationItem {
    #[serde(default)]
    pub uuid: Option<String>,
    pub stock_item_uuid: String,
    #[serde(default)]
    pub stock_item_name: Option<String>,
    #[serde(default)]
    pub stock_batch_uuid: Option<String>,
    #[serde(default)]
    pub batch_no: Option<String>,
    pub quantity: f64,
    #[serde(default, rename = "stockItemPackagingUOMName")]
    pub packaging_uom_name: Option<String>,
    #[serde(default)]
    pub expiration: Option<String>,
}

/// A row of `/stockmanagement/stockiteminventory`, grouped by location, item and batch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockInventory {
    pub stock_item_uuid: String,
    #[serde(default)]
    pub stock_item_name: Option<String>,
    #[serde(default)]
    pub party_uuid: Option<String>,
    #[serde(default)]
    pub party_name: Option<String>,
    #[serde(default)]
    pub stock_batch_uuid: Option<String>,
    #[serde(default)]
    pub batch_number: Option<String>,
    pub quantity: f64,
    #[serde(default, rename = "quantityUoM")]
    pub quantity_uom: Option<String>,
    #[serde(default)]
    pub expiration: Option<String>,
}

/// A configured stock operation type (`/stockmanagement/stockoperationtype`).
///
/// `operation_type` is the machine name (`adjustment`, `stocktake`, `receipt`, ...).
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockOperationType {
    pub uuid: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub operation_type: Option<String>,
}

impl StockOperationType {
    pub fn is(&self, operation_type: &str) -> bool {
        self.operation_type
            .as_deref()
            .is_some_and(|t| t.eq_ignore_ascii_case(operation_type))
    }
}

/// Body posted to `/stockmanagement/stockoperation`.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStockOperation {
    pub operation_type_uuid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub at_location_uuid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_uuid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_uuid: Option<String>,
    pub operation_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
    pub stock_operation_items: Vec<NewStockOperationItem>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStockOperationItem {
    pub stock_item_uuid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock_batch_uuid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_no: Option<String>,
    pub quantity: f64,
    #[serde(
        rename = "stockItemPackagingUOMUuid",
        skip_serializing_if = "Option::is_none"
    )]
    pub packaging_uom_uuid: Option<String>,
}
