//! Field-level change summaries for audit entries

use serde_json::Value;

const MAX_SHOWN_CHARS: usize = 40;

/// Summarize the top-level fields that differ between two snapshots
///
/// Returns `None` when nothing changed. Inline screenshots are shown as
/// `<image>` rather than their base64 payload.
pub fn generate_diff(before: &Value, after: &Value) -> Option<String> {
    let changes = match (before, after) {
        (Value::Object(before_obj), Value::Object(after_obj)) => {
            let mut changes = Vec::new();
            for (key, old) in before_obj {
                match after_obj.get(key) {
                    Some(new) if new != old => {
                        changes.push(format!("{}: {} -> {}", key, show(old), show(new)))
                    }
                    Some(_) => {}
                    None => changes.push(format!("{}: {} -> (removed)", key, show(old))),
                }
            }
            for (key, new) in after_obj {
                if !before_obj.contains_key(key) {
                    changes.push(format!("{}: (added) -> {}", key, show(new)));
                }
            }
            changes
        }
        _ if before != after => vec![format!("{} -> {}", show(before), show(after))],
        _ => Vec::new(),
    };

    if changes.is_empty() {
        None
    } else {
        Some(changes.join(", "))
    }
}

fn show(value: &Value) -> String {
    match value {
        Value::String(s) if s.starts_with("data:") => "<image>".to_string(),
        Value::String(s) if s.chars().count() > MAX_SHOWN_CHARS => {
            let head: String = s.chars().take(MAX_SHOWN_CHARS - 3).collect();
            format!("\"{}...\"", head)
        }
        Value::String(s) => format!("\"{}\"", s),
        Value::Array(items) => format!("[{} items]", items.len()),
        Value::Object(fields) => format!("{{{} fields}}", fields.len()),
        other => other.to_string(),
    }
}
