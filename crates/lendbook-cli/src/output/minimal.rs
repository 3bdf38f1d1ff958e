use serde_json::Value;

/// Fields that answer the question a command was asked, most specific first.
const PRIORITY_KEYS: [&str; 6] = [
    "total_amount",
    "branch",
    "open_outstanding",
    "outstanding_balance",
    "status",
    "id",
];

/// Print just the key answer value from the output: the first priority
/// field present, the entry count for list results, or the first field.
pub fn print_minimal(value: &Value) {
    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    match result {
        Value::Object(map) => {
            for key in PRIORITY_KEYS {
                if let Some(val) = map.get(key).filter(|v| !v.is_null()) {
                    println!("{}", format_minimal(val));
                    return;
                }
            }
            if let Some((key, val)) = map.iter().next() {
                println!("{}: {}", key, format_minimal(val));
            }
        }
        Value::Array(arr) => println!("{}", arr.len()),
        _ => println!("{}", format_minimal(result)),
    }
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
