use serde_json::{Value, json};

use crate::domain::pagination::IdName;

const PRODUCT_TYPES: [(i64, &str); 4] = [(1, "Steel"), (2, "Aluminum"), (3, "Brass"), (4, "Copper")];

const STATUSES: [(i64, &str); 4] = [
    (1, "In Stock"),
    (2, "Low Stock"),
    (3, "Out of Stock"),
    (4, "Overstock"),
];

fn id_names(pairs: &[(i64, &str)]) -> Vec<IdName> {
    pairs
        .iter()
        .map(|(id, value)| IdName {
            id: *id,
            value: value.to_string(),
        })
        .collect()
}

pub fn sample_product_types() -> Vec<IdName> {
    id_names(&PRODUCT_TYPES)
}

pub fn sample_statuses() -> Vec<IdName> {
    id_names(&STATUSES)
}

/// Deterministic inventory rows for mock mode.
pub fn sample_inventory() -> Vec<Value> {
    (0..64_i64)
        .map(|i| {
            let (type_id, type_name) = PRODUCT_TYPES[(i % 4) as usize];
            let total_stock = (i * 137) % 2_000;
            let allocated = total_stock / 3;
            let status_index = match total_stock {
                0 => 2,
                1..=199 => 1,
                1_600.. => 3,
                _ => 0,
            };
            let (status_id, status) = STATUSES[status_index];
            let unit_price = 1.25 + (i % 9) as f64 * 3.5;
            let days_until_stockout = if total_stock == 0 { Value::Null } else { json!(total_stock / 12) };

            json!({
                "id": i + 1,
                "partNumber": format!("{}-{:04}", &type_name[..2].to_uppercase(), 1000 + i * 7),
                "type": type_name,
                "typeId": type_id,
                "totalStock": total_stock,
                "available": total_stock - allocated,
                "allocated": allocated,
                "onOrderLbs": (i % 5) * 250,
                "unitPrice": unit_price,
                "totalValue": unit_price * total_stock as f64,
                "daysUntilStockout": days_until_stockout,
                "status": status,
                "statusId": status_id,
            })
        })
        .collect()
}
