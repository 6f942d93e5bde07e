//! Parameter substitution for hand-written query text
//!
//! - `@Name` is a value parameter, rendered as a quoted SQL literal.
//! - `$Name` is a name parameter, rendered as a bracketed identifier.
//!
//! Markers glued to an identifier (`#Moons_@Id`, `[@]`) and server values
//! (`@@identity`) are column aliases for the object mapper and pass through
//! untouched.

use crate::error::{RecastError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

static PARAMETER_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[@$][A-Za-z][A-Za-z0-9_]*").unwrap()
});

/// Substitute the parameters referenced by `query` with values from `params`.
///
/// `params` is a JSON object; pass `Value::Null` for a query without
/// parameters.
pub fn build_query(query: &str, params: &Value) -> Result<String> {
    let mut output = String::with_capacity(query.len());
    let mut last = 0;
    let mut substituted = 0usize;

    for m in PARAMETER_REGEX.find_iter(query) {
        let before = query[..m.start()].chars().next_back();
        if before.is_some_and(is_alias_char) {
            continue;
        }

        let name = &m.as_str()[1..];
        let value = params
            .get(name)
            .ok_or_else(|| RecastError::MissingParameter { name: name.to_string() })?;

        output.push_str(&query[last..m.start()]);
        if m.as_str().starts_with('$') {
            output.push_str(&render_name(name, value)?);
        } else {
            let after = query[m.end()..].chars().next();
            let quoted = before == Some('\'') && after == Some('\'');
            output.push_str(&render_value(value, quoted));
        }
        last = m.end();
        substituted += 1;
    }

    output.push_str(&query[last..]);
    debug!(parameters = substituted, "built query");
    Ok(output)
}

fn is_alias_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '#' | '[' | '@' | '$')
}

fn render_value(value: &Value, quoted: bool) -> String {
    match value {
        Value::Array(items) => items
            .iter()
            .map(|item| render_value(item, quoted))
            .collect::<Vec<_>>()
            .join(", "),
        Value::Null if !quoted => String::from("NULL"),
        other => {
            let text = plain_text(other).replace('\'', "''");
            if quoted {
                text
            } else {
                format!("'{}'", text)
            }
        }
    }
}

fn render_name(name: &str, value: &Value) -> Result<String> {
    let text = plain_text(value);
    if text.contains(['[', ']']) {
        return Err(RecastError::InvalidNameParameter {
            name: name.to_string(),
            value: text,
        });
    }
    Ok(format!("[{}]", text))
}

fn plain_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
