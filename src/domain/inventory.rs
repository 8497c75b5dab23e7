use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::column::{Align, ColumnDescriptor, as_number, plain_text};
use crate::utils::format_grouped;

/// Filters of the inventory master table, named as the `/table/items/`
/// endpoint expects them.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct InventoryFilters {
    #[serde(rename = "product_types", skip_serializing_if = "Vec::is_empty", default)]
    pub product_type_ids: Vec<i64>,
    #[serde(rename = "value_ranges", skip_serializing_if = "Vec::is_empty", default)]
    pub value_range_ids: Vec<i64>,
    #[serde(rename = "days_until_stockout", skip_serializing_if = "Vec::is_empty", default)]
    pub days_until_stockout_ids: Vec<i64>,
    #[serde(rename = "statuses", skip_serializing_if = "Vec::is_empty", default)]
    pub status_ids: Vec<i64>,
}

impl InventoryFilters {
    pub fn is_empty(&self) -> bool {
        self.product_type_ids.is_empty()
            && self.value_range_ids.is_empty()
            && self.days_until_stockout_ids.is_empty()
            && self.status_ids.is_empty()
    }

    /// Local evaluation for rows carrying `typeId`/`statusId` fields.
    pub fn matches(&self, row: &Value) -> bool {
        let id_in = |field: &str, ids: &[i64]| {
            ids.is_empty()
                || row
                    .get(field)
                    .and_then(Value::as_i64)
                    .is_some_and(|id| ids.contains(&id))
        };
        id_in("typeId", &self.product_type_ids) && id_in("statusId", &self.status_ids)
    }
}

pub const INVENTORY_ENDPOINT: &str = "/table/items/";

pub fn inventory_columns() -> Vec<ColumnDescriptor> {
    vec![
        ColumnDescriptor::text("partNumber", "Part Number"),
        ColumnDescriptor::text("type", "Type"),
        ColumnDescriptor::numeric("totalStock", "Total Stock", 0),
        ColumnDescriptor::numeric("available", "Available", 0),
        ColumnDescriptor::numeric("allocated", "Allocated", 0),
        ColumnDescriptor::custom("onOrderLbs", "On Order", |value| match as_number(value) {
            Some(lbs) => format!("{} lbs", format_grouped(lbs, 0)),
            None => plain_text(value),
        })
        .aligned(Align::Right),
        ColumnDescriptor::currency("unitPrice", "Unit Price"),
        ColumnDescriptor::currency("totalValue", "Total Value"),
        ColumnDescriptor::custom("daysUntilStockout", "Days Until Stockout", |value| {
            format!("{} days", plain_text(value))
        })
        .aligned(Align::Right),
        ColumnDescriptor::text("status", "Status"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_filters_use_backend_names() {
        let filters = InventoryFilters {
            status_ids: vec![2],
            ..Default::default()
        };
        let json = serde_json::to_value(&filters).unwrap();
        assert_eq!(json, json!({"statuses": [2]}));
        assert!(!filters.is_empty());
        assert!(InventoryFilters::default().is_empty());
    }

    #[test]
    fn test_local_matching() {
        let row = json!({"partNumber": "A-1", "typeId": 3, "statusId": 1});
        let mut filters = InventoryFilters::default();
        assert!(filters.matches(&row));

        filters.product_type_ids = vec![3, 4];
        assert!(filters.matches(&row));

        filters.status_ids = vec![2];
        assert!(!filters.matches(&row));
    }

    #[test]
    fn test_on_order_column_renders_pounds() {
        let columns = inventory_columns();
        let on_order = columns.iter().find(|c| c.id == "onOrderLbs").unwrap();
        assert_eq!(on_order.render_cell(&json!({"onOrderLbs": 12500})), "12,500 lbs");
    }
}
