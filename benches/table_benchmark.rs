use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use msm::domain::inventory::inventory_columns;
use msm::services::table_key::compute_table_key;
use msm::services::{DataTableState, TableAction};
use rand::Rng;
use serde_json::{Map, Value, json};
use std::time::Duration;

const TYPES: [&str; 4] = ["Steel", "Aluminum", "Brass", "Copper"];

fn create_inventory_rows(count: usize) -> Vec<Value> {
    let mut rng = rand::thread_rng();

    (0..count)
        .map(|i| {
            let kind = TYPES[rng.gen_range(0..TYPES.len())];
            let total_stock: u32 = rng.gen_range(0..5_000);
            let unit_price: f64 = rng.gen_range(0.5..250.0);
            let days_until_stockout = if rng.gen_bool(0.1) {
                Value::Null
            } else {
                json!(rng.gen_range(0..365))
            };
            json!({
                "partNumber": format!("PN-{i:06}"),
                "type": kind,
                "totalStock": total_stock,
                "available": total_stock / 2,
                "allocated": total_stock / 2,
                "onOrderLbs": rng.gen_range(0..10_000),
                "unitPrice": unit_price,
                "totalValue": unit_price * total_stock as f64,
                "daysUntilStockout": days_until_stockout,
                "status": "In Stock",
            })
        })
        .collect()
}

fn benchmark_client_view(c: &mut Criterion) {
    let mut group = c.benchmark_group("client_view");
    group.measurement_time(Duration::from_secs(10));

    let columns = inventory_columns();

    for size in [100, 1_000, 10_000].iter() {
        let rows = create_inventory_rows(*size);

        let mut sorted = DataTableState::client(25);
        sorted.apply(TableAction::ToggleSorting {
            column_id: "totalValue".to_string(),
            multi: false,
        });
        group.bench_with_input(BenchmarkId::new("sorted", size), &rows, |b, rows| {
            b.iter(|| black_box(sorted.view(rows, &columns, None)));
        });

        let mut searched = DataTableState::client(25);
        searched.apply(TableAction::SetGlobalFilter("brass".to_string()));
        group.bench_with_input(BenchmarkId::new("global_filter", size), &rows, |b, rows| {
            b.iter(|| black_box(searched.view(rows, &columns, None)));
        });
    }

    group.finish();
}

fn benchmark_table_key(c: &mut Criterion) {
    let mut record = Map::new();
    record.insert("search".to_string(), json!("hex bolt"));
    record.insert("product_types".to_string(), json!([1, 2, 3]));
    record.insert("statuses".to_string(), json!([4]));
    record.insert("value_ranges".to_string(), json!({"min": 10, "max": 500}));

    c.bench_function("compute_table_key", |b| {
        b.iter(|| black_box(compute_table_key(black_box(&record))));
    });
}

criterion_group!(benches, benchmark_client_view, benchmark_table_key);
criterion_main!(benches);
