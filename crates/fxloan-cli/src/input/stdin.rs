use serde_json::Value;
use std::io::{self, Read};

/// JSON piped on stdin. `None` when stdin is an interactive terminal, so
/// commands can fall back to flags or the HTTP feed.
pub fn read_stdin() -> Result<Option<Value>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }
    read_piped(io::stdin().lock())
}

/// Parse a whole piped document; blank input counts as "nothing piped".
fn read_piped<R: Read>(mut reader: R) -> Result<Option<Value>, Box<dyn std::error::Error>> {
    let mut buffer = String::new();
    reader.read_to_string(&mut buffer)?;

    let body = buffer.trim();
    if body.is_empty() {
        return Ok(None);
    }

    let value: Value =
        serde_json::from_str(body).map_err(|e| format!("Failed to parse stdin as JSON: {e}"))?;
    tracing::debug!(bytes = body.len(), "read input from stdin");
    Ok(Some(value))
}
