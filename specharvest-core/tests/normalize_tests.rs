// Tests for table-level column normalization

use specharvest_core::normalize::rules::{BLUETOOTH_UNKNOWN, WIFI_UNKNOWN};
use specharvest_core::normalize::{ColumnNormalizer, NormalizedDataset, OUTPUT_COLUMNS, Value};
use specharvest_core::store::RawTable;

fn raw_table() -> RawTable {
    let header = [
        "Name",
        "Price",
        "Seria",
        "Przekątna ekranu",
        "Procesor",
        "Pamięć RAM",
        "Pojemność SSD",
        "Producent karty graficznej",
        "Pojemność akumulatora, Wh",
        "Karty sieciowe",
        "Krótka charakterystyka",
        "Kolor",
    ];
    let rows: [[&str; 12]; 3] = [
        [
            " Laptop Apple MacBook Air 13 M2 ",
            "4 999 zł",
            "",
            "13.6\"",
            "Ośmiordzeniowy Apple M2",
            "8 GB",
            "256 GB",
            "Apple",
            "52.6",
            "Wi-Fi 6 (802.11ax) Bluetooth 5.3",
            "Lekki laptop",
            "Srebrny",
        ],
        [
            "Apple MacBook Pro 16",
            "12 499 zł",
            "MacBook Pro",
            "16.2\"",
            "Dwunastordzeniowy Apple M2 Max",
            "32 GB",
            "1 TB",
            "Apple",
            "100",
            "802.11ax",
            "",
            "Gwiezdna szarość",
        ],
        [
            "Refurbished notebook",
            "N/A",
            "",
            "",
            "",
            "",
            "-",
            "",
            "",
            "",
            "",
            "",
        ],
    ];
    RawTable {
        header: header.iter().map(|h| h.to_string()).collect(),
        rows: rows
            .iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect(),
    }
}

fn cell<'a>(dataset: &'a NormalizedDataset, row: usize, column: &str) -> &'a Value {
    &dataset.rows[row][dataset.column_index(column).unwrap()]
}

fn as_table(dataset: &NormalizedDataset) -> RawTable {
    RawTable {
        header: dataset.columns.clone(),
        rows: dataset
            .rows
            .iter()
            .map(|row| row.iter().map(|v| v.to_string()).collect())
            .collect(),
    }
}

// ============================================================================
// Full table
// ============================================================================

#[test]
fn test_normalize_full_table() {
    let out = ColumnNormalizer::default().normalize(&raw_table()).unwrap();

    assert_eq!(out.columns, OUTPUT_COLUMNS);
    assert_eq!(out.len(), 3);

    assert_eq!(cell(&out, 0, "Name"), &Value::text("Laptop Apple MacBook Air 13 M2"));
    assert_eq!(cell(&out, 0, "Price_zl"), &Value::Float(4999.0));
    assert_eq!(cell(&out, 0, "Series"), &Value::text("MacBook Air"));
    assert_eq!(cell(&out, 0, "Screen_Diagonal_inches"), &Value::Float(13.6));
    assert_eq!(cell(&out, 0, "Processor"), &Value::text("Apple M2"));
    assert_eq!(cell(&out, 0, "Processor_Cores"), &Value::Int(8));
    assert_eq!(cell(&out, 0, "RAM_Memory_GB"), &Value::Int(8));
    assert_eq!(cell(&out, 0, "SSD_Capacity_GB"), &Value::Int(256));
    assert_eq!(cell(&out, 0, "Battery_Capacity_Wh"), &Value::Float(52.6));
    assert_eq!(cell(&out, 0, "Network_Cards_Wi-Fi"), &Value::text("Wi-Fi 6 (802.11ax)"));
    assert_eq!(
        cell(&out, 0, "Network_Cards_Bluetooth_Version"),
        &Value::text("Bluetooth 5.3")
    );

    assert_eq!(cell(&out, 1, "Series"), &Value::text("MacBook Pro"));
    assert_eq!(cell(&out, 1, "Processor_Cores"), &Value::Int(12));
    assert_eq!(cell(&out, 1, "SSD_Capacity_GB"), &Value::Int(1024));
    assert_eq!(cell(&out, 1, "Network_Cards_Wi-Fi"), &Value::text("Wi-Fi 802.11ax"));
    assert_eq!(
        cell(&out, 1, "Network_Cards_Bluetooth_Version"),
        &Value::text(BLUETOOTH_UNKNOWN)
    );
}

#[test]
fn test_unparsable_cells_become_null_and_rows_survive() {
    let out = ColumnNormalizer::default().normalize(&raw_table()).unwrap();

    assert_eq!(cell(&out, 2, "Name"), &Value::text("Refurbished notebook"));
    assert_eq!(cell(&out, 2, "Price_zl"), &Value::Null);
    assert_eq!(cell(&out, 2, "Series"), &Value::text("Refurbished notebook"));
    assert_eq!(cell(&out, 2, "RAM_Memory_GB"), &Value::Null);
    assert_eq!(cell(&out, 2, "SSD_Capacity_GB"), &Value::Null);
    assert_eq!(cell(&out, 2, "Processor"), &Value::Null);
    assert_eq!(cell(&out, 2, "Network_Cards_Wi-Fi"), &Value::text(WIFI_UNKNOWN));
    assert_eq!(
        cell(&out, 2, "Network_Cards_Bluetooth_Version"),
        &Value::text(BLUETOOTH_UNKNOWN)
    );
}

#[test]
fn test_untranslated_columns_are_dropped() {
    let out = ColumnNormalizer::default().normalize(&raw_table()).unwrap();
    assert!(out.column_index("Kolor").is_none());
}

#[test]
fn test_missing_columns_are_empty() {
    let table = RawTable {
        header: vec!["Name".to_string(), "Price".to_string()],
        rows: vec![vec!["Air".to_string(), "3 999".to_string()]],
    };
    let out = ColumnNormalizer::default().normalize(&table).unwrap();

    assert_eq!(cell(&out, 0, "Price_zl"), &Value::Float(3999.0));
    assert_eq!(cell(&out, 0, "RAM_Memory_GB"), &Value::Null);
    assert_eq!(cell(&out, 0, "Network_Cards_Wi-Fi"), &Value::text(WIFI_UNKNOWN));
}

#[test]
fn test_empty_table() {
    let table = RawTable {
        header: vec!["Name".to_string()],
        rows: Vec::new(),
    };
    let out = ColumnNormalizer::default().normalize(&table).unwrap();
    assert!(out.is_empty());
    assert_eq!(out.columns.len(), OUTPUT_COLUMNS.len());
}

// ============================================================================
// Idempotence
// ============================================================================

#[test]
fn test_normalizing_twice_changes_nothing() {
    let normalizer = ColumnNormalizer::default();
    let once = normalizer.normalize(&raw_table()).unwrap();
    let twice = normalizer.normalize(&as_table(&once)).unwrap();
    assert_eq!(once, twice);
}
