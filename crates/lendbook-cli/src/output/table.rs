use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

/// Format output as tables using the tabled crate.
///
/// Scalar fields of the result go into a Field/Value table; nested lists
/// (installments, applications, agenda rows) get a table of their own.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => match map.get("result") {
            Some(result) => {
                print_section(result);
                print_notes(map);
            }
            None => print_section(value),
        },
        Value::Array(arr) => print_array_table(arr),
        _ => println!("{}", value),
    }
}

fn print_section(value: &Value) {
    match value {
        Value::Object(map) => print_object(map),
        Value::Array(arr) => print_array_table(arr),
        _ => println!("{}", format_value(value)),
    }
}

fn print_object(map: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    let mut nested: Vec<(&String, &Value)> = Vec::new();

    for (key, val) in map {
        if is_table_like(val) {
            nested.push((key, val));
        } else {
            builder.push_record([key.as_str(), &format_value(val)]);
        }
    }
    println!("{}", Table::from(builder));

    for (key, val) in nested {
        println!("\n{}:", key);
        match val {
            Value::Object(inner) if inner.values().all(Value::is_object) => print_keyed_table(inner),
            _ => print_section(val),
        }
    }
}

/// Objects and lists of objects are printed as their own table.
fn is_table_like(value: &Value) -> bool {
    match value {
        Value::Object(_) => true,
        Value::Array(arr) => arr.first().map_or(false, Value::is_object),
        _ => false,
    }
}

/// A map of records (e.g. totals per loan status): one row per key.
fn print_keyed_table(map: &Map<String, Value>) {
    let Some(Value::Object(first)) = map.values().next() else {
        println!("(empty)");
        return;
    };
    let columns: Vec<String> = first.keys().cloned().collect();

    let mut builder = Builder::default();
    builder.push_record(std::iter::once(String::new()).chain(columns.iter().cloned()));
    for (key, row) in map {
        let cells = columns
            .iter()
            .map(|c| row.get(c.as_str()).map(format_value).unwrap_or_default());
        builder.push_record(std::iter::once(key.clone()).chain(cells));
    }
    println!("{}", Table::from(builder));
}

fn print_array_table(arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<String> = first.keys().cloned().collect();
        let mut builder = Builder::default();
        builder.push_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(h.as_str()).map(format_value).unwrap_or_default())
                    .collect();
                builder.push_record(row);
            }
        }
        println!("{}", Table::from(builder));
    } else {
        for item in arr {
            println!("{}", format_value(item));
        }
    }
}

fn print_notes(envelope: &Map<String, Value>) {
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "-".to_string(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            items.join(", ")
        }
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nested_records_get_their_own_table() {
        assert!(is_table_like(&json!([{ "number": 1 }])));
        assert!(is_table_like(&json!({ "Active": { "count": 2 } })));
        assert!(!is_table_like(&json!(["a", "b"])));
        assert!(!is_table_like(&json!([])));
        assert!(!is_table_like(&json!("11000")));
    }

    #[test]
    fn test_null_renders_as_dash() {
        assert_eq!(format_value(&Value::Null), "-");
        assert_eq!(format_value(&json!(["a", "b"])), "a, b");
    }
}
