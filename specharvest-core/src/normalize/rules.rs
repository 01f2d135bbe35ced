//! The per-column rule table and the transforms behind it.
//!
//! Every transform is a plain function from the source cell (plus read access
//! to the rest of the row) to the values of the rule's output columns, so each
//! one can be tested on its own and new columns only need a new table entry.

use super::{Row, Value};
use regex::Regex;
use std::sync::LazyLock;

pub const WIFI_UNKNOWN: &str = "Wi-Fi Unknown";
pub const BLUETOOTH_UNKNOWN: &str = "Bluetooth Unknown";

/// Signature shared by all rules: `(source cell, whole row) -> output cells`.
pub type Transform = fn(&Value, &Row) -> Vec<Value>;

/// One entry of the rule table. The first output column is the source column
/// itself; further outputs are derived columns.
pub struct ColumnRule {
    pub column: &'static str,
    pub outputs: &'static [&'static str],
    pub transform: Transform,
}

/// Site field labels and their analysis column names.
pub const TRANSLATIONS: &[(&str, &str)] = &[
    ("Name", "Name"),
    ("Price", "Price_zl"),
    ("Seria", "Series"),
    ("Przekątna ekranu", "Screen_Diagonal_inches"),
    ("Procesor", "Processor"),
    ("Pamięć RAM", "RAM_Memory_GB"),
    ("Pojemność SSD", "SSD_Capacity_GB"),
    ("Producent karty graficznej", "Graphics Card Manufacturer"),
    ("Pojemność akumulatora, Wh", "Battery_Capacity_Wh"),
    ("Karty sieciowe", "Network_Cards_Wi-Fi"),
    ("Krótka charakterystyka", "Short_Description"),
];

/// Column order of the normalized dataset.
pub const OUTPUT_COLUMNS: &[&str] = &[
    "Name",
    "Price_zl",
    "Series",
    "Screen_Diagonal_inches",
    "Processor",
    "Processor_Cores",
    "RAM_Memory_GB",
    "SSD_Capacity_GB",
    "Graphics Card Manufacturer",
    "Battery_Capacity_Wh",
    "Network_Cards_Wi-Fi",
    "Network_Cards_Bluetooth_Version",
    "Short_Description",
];

/// Core-count words used in processor descriptions.
pub const CORE_COUNTS: &[(&str, i64)] = &[
    ("Ośmiordzeniowy", 8),
    ("10-rdzeniowy", 10),
    ("Jedenastordzeniowy", 11),
    ("Dwunastordzeniowy", 12),
    ("12-rdzeniowy", 12),
    ("Czternastordzeniowy", 14),
    ("Szesnastordzeniowy", 16),
];

pub const COLUMN_RULES: &[ColumnRule] = &[
    ColumnRule {
        column: "Series",
        outputs: &["Series"],
        transform: |value, row| vec![normalize_series(value, row.get("Name"))],
    },
    ColumnRule {
        column: "Price_zl",
        outputs: &["Price_zl"],
        transform: |value, _| vec![normalize_price(value)],
    },
    ColumnRule {
        column: "Screen_Diagonal_inches",
        outputs: &["Screen_Diagonal_inches"],
        transform: |value, _| vec![normalize_screen_diagonal(value)],
    },
    ColumnRule {
        column: "Processor",
        outputs: &["Processor", "Processor_Cores"],
        transform: |value, row| {
            let (processor, cores) = split_processor(value, row.get("Processor_Cores"));
            vec![processor, cores]
        },
    },
    ColumnRule {
        column: "RAM_Memory_GB",
        outputs: &["RAM_Memory_GB"],
        transform: |value, _| vec![normalize_ram(value)],
    },
    ColumnRule {
        column: "SSD_Capacity_GB",
        outputs: &["SSD_Capacity_GB"],
        transform: |value, _| vec![normalize_ssd(value)],
    },
    ColumnRule {
        column: "Battery_Capacity_Wh",
        outputs: &["Battery_Capacity_Wh"],
        transform: |value, _| vec![normalize_battery(value)],
    },
    ColumnRule {
        column: "Network_Cards_Wi-Fi",
        outputs: &["Network_Cards_Wi-Fi", "Network_Cards_Bluetooth_Version"],
        transform: |value, row| {
            let (wifi, bluetooth) =
                split_network(value, row.get("Network_Cards_Bluetooth_Version"));
            vec![wifi, bluetooth]
        },
    },
];

static SERIES_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"MacBook\s*\w{0,3}").expect("series pattern"));

// Longer alternatives first so "802.11ax" and "802.11ac" are not reported
// as "802.11a".
static WIFI_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"6E \(802\.11ax\)|6 \(802\.11ax\)|802\.11ax|802\.11ac|802\.11a")
        .expect("wifi pattern")
});

static BLUETOOTH_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Bluetooth \d+\.\d+").expect("bluetooth pattern"));

/// Series falls back to the product name, then is cut down to "MacBook <model>".
pub fn normalize_series(series: &Value, name: &Value) -> Value {
    let fallback = if series.is_null() { name } else { series };
    match fallback {
        Value::Text(s) => match SERIES_PATTERN.find(s) {
            Some(m) => Value::text(m.as_str()),
            None => fallback.clone(),
        },
        other => other.clone(),
    }
}

/// Strip currency signs, thousands separators and whitespace, then parse.
pub fn normalize_price(value: &Value) -> Value {
    let Some(text) = value.to_plain_string() else {
        return Value::Null;
    };
    let digits: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    parse_float(&digits)
}

/// Keep digits and the decimal point only: `13.3"` becomes `13.3`.
pub fn normalize_screen_diagonal(value: &Value) -> Value {
    let Some(text) = value.to_plain_string() else {
        return Value::Null;
    };
    let digits: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    parse_float(&digits)
}

/// Split "<core count> Apple <chip>" into `(processor, cores)`.
///
/// Text before the first "Apple" is the core-count candidate and is mapped
/// through [`CORE_COUNTS`]; text without "Apple" stays as processor and is
/// also the core-count candidate. An empty candidate keeps `existing_cores`
/// so normalizing an already-normalized row changes nothing.
pub fn split_processor(value: &Value, existing_cores: &Value) -> (Value, Value) {
    let Value::Text(text) = value else {
        return (value.clone(), existing_cores.clone());
    };

    match text.find("Apple") {
        Some(pos) => {
            let candidate = text[..pos].trim();
            let cores = if candidate.is_empty() {
                lookup_cores(existing_cores)
            } else {
                lookup_cores(&Value::text(candidate))
            };
            (Value::text(&text[pos..]), cores)
        }
        None => (value.clone(), lookup_cores(value)),
    }
}

/// Map a core-count word to its integer; anything else is kept as it is.
///
/// Numeric text such as `"8"` also becomes an integer. A normalized CSV reads
/// its counts back as text, and this keeps a second normalization pass from
/// turning them into strings.
pub fn lookup_cores(candidate: &Value) -> Value {
    let Value::Text(text) = candidate else {
        return candidate.clone();
    };
    if let Some((_, cores)) = CORE_COUNTS.iter().find(|(word, _)| *word == text.as_str()) {
        return Value::Int(*cores);
    }
    match text.parse::<i64>() {
        Ok(cores) => Value::Int(cores),
        Err(_) => candidate.clone(),
    }
}

/// Digits only, parsed as an integer number of gigabytes.
pub fn normalize_ram(value: &Value) -> Value {
    parse_digits(value).map_or(Value::Null, Value::Int)
}

/// Digits only; values below 10 are terabytes and are rescaled to gigabytes.
pub fn normalize_ssd(value: &Value) -> Value {
    match parse_digits(value) {
        Some(capacity) if capacity < 10 => Value::Int(capacity * 1024),
        Some(capacity) => Value::Int(capacity),
        None => Value::Null,
    }
}

pub fn normalize_battery(value: &Value) -> Value {
    match value {
        Value::Float(_) => value.clone(),
        Value::Int(i) => Value::Float(*i as f64),
        Value::Text(s) => parse_float(s.trim()),
        Value::Null => Value::Null,
    }
}

/// Derive `(Wi-Fi standard, Bluetooth version)` from the network card text.
///
/// A missing Bluetooth token falls back to a previously derived version in
/// `existing_bluetooth`, which keeps the rule stable on normalized input.
pub fn split_network(value: &Value, existing_bluetooth: &Value) -> (Value, Value) {
    let Value::Text(text) = value else {
        return (Value::text(WIFI_UNKNOWN), Value::text(BLUETOOTH_UNKNOWN));
    };

    let wifi = match WIFI_PATTERN.find(text) {
        Some(m) => Value::Text(format!("Wi-Fi {}", m.as_str())),
        None => Value::text(WIFI_UNKNOWN),
    };

    let bluetooth = BLUETOOTH_PATTERN
        .find(text)
        .or_else(|| {
            existing_bluetooth
                .as_text()
                .and_then(|previous| BLUETOOTH_PATTERN.find(previous))
        })
        .map(|m| Value::text(m.as_str()))
        .unwrap_or_else(|| Value::text(BLUETOOTH_UNKNOWN));

    (wifi, bluetooth)
}

fn parse_float(text: &str) -> Value {
    match text.parse::<f64>() {
        Ok(x) if x.is_finite() => Value::Float(x),
        _ => Value::Null,
    }
}

fn parse_digits(value: &Value) -> Option<i64> {
    let text = value.to_plain_string()?;
    let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse::<i64>().ok()
}
