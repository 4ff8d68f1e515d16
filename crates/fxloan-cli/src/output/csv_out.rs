use serde_json::{Map, Value};
use std::io;

use super::cell;

type StdoutWriter<'a> = csv::Writer<io::StdoutLock<'a>>;

/// Write output as CSV to stdout.
///
/// A rate dashboard exports its table rows (most recent bucket first); row
/// lists (`results`) export one line per row; anything else becomes
/// `field,value` pairs with nested keys joined by dots.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    let outcome = match value {
        Value::Object(map) => {
            let result = map.get("result");
            if let Some(Value::Array(rows)) = map.get("results") {
                write_rows(&mut wtr, rows)
            } else if let Some(Value::Array(rows)) = result.and_then(|r| r.get("table_rows")) {
                write_rows(&mut wtr, rows)
            } else if let Some(Value::Object(obj)) = result {
                write_pairs(&mut wtr, obj)
            } else {
                write_pairs(&mut wtr, map)
            }
        }
        Value::Array(rows) => write_rows(&mut wtr, rows),
        _ => wtr.write_record([cell(value)]),
    };

    if let Err(e) = outcome.and_then(|_| wtr.flush().map_err(csv::Error::from)) {
        eprintln!("CSV write error: {e}");
    }
}

fn write_rows(wtr: &mut StdoutWriter<'_>, rows: &[Value]) -> csv::Result<()> {
    let Some(Value::Object(first)) = rows.first() else {
        for item in rows {
            wtr.write_record([cell(item)])?;
        }
        return Ok(());
    };

    let headers: Vec<&str> = first.keys().map(String::as_str).collect();
    wtr.write_record(&headers)?;
    for item in rows {
        if let Value::Object(map) = item {
            let record: Vec<String> = headers
                .iter()
                .map(|h| map.get(*h).map(csv_cell).unwrap_or_default())
                .collect();
            wtr.write_record(&record)?;
        }
    }
    Ok(())
}

fn write_pairs(wtr: &mut StdoutWriter<'_>, map: &Map<String, Value>) -> csv::Result<()> {
    wtr.write_record(["field", "value"])?;
    let mut pairs = Vec::new();
    flatten("", map, &mut pairs);
    for (key, val) in pairs {
        wtr.write_record([key, val])?;
    }
    Ok(())
}

fn flatten(prefix: &str, map: &Map<String, Value>, out: &mut Vec<(String, String)>) {
    for (key, val) in map {
        let name = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match val {
            Value::Object(inner) => flatten(&name, inner, out),
            other => out.push((name, csv_cell(other))),
        }
    }
}

/// Missing values are empty cells in CSV rather than `-`.
fn csv_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        other => cell(other),
    }
}
