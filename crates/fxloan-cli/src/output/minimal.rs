use serde_json::Value;

use super::cell;

/// Fields worth printing on their own, most important first.
const PRIORITY_KEYS: [&str; 6] = [
    "monthly_payment",
    "latest_rate",
    "median",
    "total_interest",
    "interest_saved",
    "rate",
];

/// Print just the headline figure.
///
/// Searches the `result` envelope (and one level of nested objects) for a
/// priority key; row lists print their last row's headline instead.
pub fn print_minimal(value: &Value) {
    let target = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    if let Some(Value::Array(rows)) = value.get("results") {
        match rows.last().and_then(find_priority) {
            Some(v) => println!("{}", cell(v)),
            None => println!("{} rows", rows.len()),
        }
        return;
    }

    if let Some(v) = find_priority(target) {
        println!("{}", cell(v));
        return;
    }

    if let Some((key, val)) = target.as_object().and_then(|m| m.iter().next()) {
        println!("{key}: {}", cell(val));
        return;
    }

    println!("{}", cell(target));
}

fn find_priority(value: &Value) -> Option<&Value> {
    let map = value.as_object()?;
    for key in PRIORITY_KEYS {
        if let Some(v) = map.get(key).filter(|v| !v.is_null()) {
            return Some(v);
        }
    }
    // One level down: loan summaries nest under `summary`, snapshots in `latest`.
    map.values().find_map(|nested| match nested {
        Value::Object(_) => PRIORITY_KEYS
            .iter()
            .find_map(|k| nested.get(*k).filter(|v| !v.is_null())),
        Value::Array(items) => items.first().and_then(|first| {
            PRIORITY_KEYS
                .iter()
                .find_map(|k| first.get(*k).filter(|v| !v.is_null()))
        }),
        _ => None,
    })
}
