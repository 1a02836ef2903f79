use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;
use rand::seq::SliceRandom;
use serde_json::Value;

/// Named pools of values for `{{name}}` placeholders. Each request picks one
/// value per pool at random. Values are JSON scalars so a payload leaf can
/// receive a number or a boolean.
#[derive(Debug, Default, Clone)]
pub struct TemplateVars {
    pools: BTreeMap<String, Vec<Value>>,
}

impl TemplateVars {
    #[must_use]
    pub const fn new(pools: BTreeMap<String, Vec<Value>>) -> Self {
        Self { pools }
    }

    #[cfg(test)]
    pub(crate) fn names(&self) -> Vec<&str> {
        self.pools.keys().map(String::as_str).collect()
    }

    pub(crate) fn sample<R: Rng + ?Sized>(&self, seq: u64, rng: &mut R) -> BTreeMap<String, Value> {
        let mut vars = BTreeMap::new();
        for (name, values) in &self.pools {
            if let Some(value) = values.choose(rng) {
                vars.insert(name.clone(), value.clone());
            }
        }

        let now_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |duration| duration.as_millis());
        let now_ms = u64::try_from(now_ms).unwrap_or(u64::MAX);
        vars.insert("seq".to_owned(), Value::from(seq));
        vars.insert("timestamp_ms".to_owned(), Value::from(now_ms));
        vars.insert(
            "timestamp_s".to_owned(),
            Value::from(now_ms.checked_div(1000).unwrap_or(0)),
        );
        vars
    }
}

/// Text form of a variable inside a larger string.
fn as_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::Array(_) | Value::Object(_) => {
            value.to_string()
        }
    }
}

/// Replaces `{{key}}` placeholders. Unknown keys and unterminated braces are
/// kept verbatim.
pub(crate) fn render_template(input: &str, vars: &BTreeMap<String, Value>) -> String {
    let mut rest = input;
    let mut output = String::with_capacity(input.len());

    loop {
        let Some(start) = rest.find("{{") else {
            output.push_str(rest);
            break;
        };
        let (before, after_start) = rest.split_at(start);
        output.push_str(before);
        let Some(after) = after_start.strip_prefix("{{") else {
            output.push_str(after_start);
            break;
        };
        let Some(end) = after.find("}}") else {
            output.push_str(after_start);
            break;
        };
        let (key_part, after_end) = after.split_at(end);
        let remaining = after_end.get(2..).unwrap_or_default();
        match vars.get(key_part.trim()) {
            Some(value) => output.push_str(&as_text(value)),
            None => {
                let placeholder_len = after_start.len().saturating_sub(remaining.len());
                output.push_str(after_start.get(..placeholder_len).unwrap_or(after_start));
            }
        }
        rest = remaining;
    }

    output
}

/// A string that is exactly one known placeholder takes the variable's own
/// JSON type.
fn whole_placeholder<'vars>(
    text: &str,
    vars: &'vars BTreeMap<String, Value>,
) -> Option<&'vars Value> {
    let key = text.trim().strip_prefix("{{")?.strip_suffix("}}")?;
    if key.contains("{{") || key.contains("}}") {
        return None;
    }
    vars.get(key.trim())
}

/// Renders every string leaf (and object key) of a JSON payload template.
pub(crate) fn render_json(value: &Value, vars: &BTreeMap<String, Value>) -> Value {
    match value {
        Value::String(text) => whole_placeholder(text, vars)
            .cloned()
            .unwrap_or_else(|| Value::String(render_template(text, vars))),
        Value::Array(items) => Value::Array(items.iter().map(|item| render_json(item, vars)).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, item)| (render_template(key, vars), render_json(item, vars)))
                .collect(),
        ),
        Value::Null | Value::Bool(_) | Value::Number(_) => value.clone(),
    }
}
