use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

/// Format output as tables using the tabled crate.
///
/// Scalar result fields go in a Field/Value table. Arrays of objects
/// (comparison rows, peers) and metric-keyed maps of objects (benchmarks,
/// trends) each get their own titled table.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(result) = map.get("result") {
                print_result_table(result, map);
            } else {
                print_object(map);
            }
        }
        Value::Array(arr) => print_array_table(arr),
        _ => println!("{}", value),
    }
}

fn print_result_table(result: &Value, envelope: &Map<String, Value>) {
    match result {
        Value::Object(res_map) => print_object(res_map),
        other => println!("{}", format_value(other)),
    }

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

fn print_object(map: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    let mut sections: Vec<(&String, &Value)> = Vec::new();

    for (key, val) in map {
        if is_section(val) {
            sections.push((key, val));
        } else {
            builder.push_record([key.as_str(), &format_value(val)]);
        }
    }
    println!("{}", Table::from(builder));

    for (title, val) in sections {
        println!("\n{}:", title);
        match val {
            Value::Array(arr) => print_array_table(arr),
            Value::Object(inner) => print_keyed_table(inner),
            _ => {}
        }
    }
}

/// Arrays of objects and maps whose values are all objects.
fn is_section(value: &Value) -> bool {
    match value {
        Value::Array(arr) => matches!(arr.first(), Some(Value::Object(_))),
        Value::Object(map) => !map.is_empty() && map.values().all(Value::is_object),
        _ => false,
    }
}

fn print_keyed_table(map: &Map<String, Value>) {
    let Some(Value::Object(first)) = map.values().next() else {
        return;
    };
    let mut headers: Vec<String> = vec!["key".to_string()];
    headers.extend(first.keys().cloned());

    let mut builder = Builder::default();
    builder.push_record(&headers);
    for (key, row) in map {
        if let Value::Object(fields) = row {
            let mut record = vec![key.clone()];
            record.extend(
                headers[1..]
                    .iter()
                    .map(|h| fields.get(h.as_str()).map(format_value).unwrap_or_default()),
            );
            builder.push_record(record);
        }
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

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
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
    fn test_sections_are_split_from_scalars() {
        assert!(is_section(&json!([{"metric": "margin"}])));
        assert!(is_section(&json!({"margin": {"value": "25.8"}})));
        assert!(!is_section(&json!({"margin": "25.8"})));
        assert!(!is_section(&json!(["a", "b"])));
    }
}
