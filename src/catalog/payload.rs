use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{AppError, AppResult, HttpError};

pub(crate) const JSON_CONTENT_TYPE: &str = "application/json";
const TEXT_CONTENT_TYPE: &str = "text/plain";
/// Size of the padding field added by [`ErrorVariant::Oversized`].
const OVERSIZED_PADDING_BYTES: usize = 256 * 1024;

/// Ways a JSON payload is broken when an error is injected.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ErrorVariant {
    /// Syntactically invalid JSON.
    MalformedJson,
    /// An empty object: every required field is missing.
    MissingFields,
    /// Arrays emptied, e.g. an order without items.
    EmptyItems,
    /// Scalars swapped for values of the wrong type.
    WrongTypes,
    /// No body at all, still labelled as JSON.
    MissingBody,
    /// The valid payload wrapped with a large padding field.
    Oversized,
    /// The valid payload sent as `text/plain`.
    WrongContentType,
}

impl ErrorVariant {
    pub const ALL: [ErrorVariant; 7] = [
        ErrorVariant::MalformedJson,
        ErrorVariant::MissingFields,
        ErrorVariant::EmptyItems,
        ErrorVariant::WrongTypes,
        ErrorVariant::MissingBody,
        ErrorVariant::Oversized,
        ErrorVariant::WrongContentType,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ErrorVariant::MalformedJson => "malformed_json",
            ErrorVariant::MissingFields => "missing_fields",
            ErrorVariant::EmptyItems => "empty_items",
            ErrorVariant::WrongTypes => "wrong_types",
            ErrorVariant::MissingBody => "missing_body",
            ErrorVariant::Oversized => "oversized",
            ErrorVariant::WrongContentType => "wrong_content_type",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PayloadBody {
    pub(crate) bytes: Vec<u8>,
    pub(crate) content_type: &'static str,
}

pub(crate) fn encode_valid(value: &Value) -> AppResult<PayloadBody> {
    Ok(PayloadBody {
        bytes: to_json(value)?,
        content_type: JSON_CONTENT_TYPE,
    })
}

pub(crate) fn corrupt(value: &Value, variant: ErrorVariant) -> AppResult<PayloadBody> {
    let (bytes, content_type) = match variant {
        ErrorVariant::MalformedJson => {
            let mut bytes = to_json(value)?;
            bytes.pop();
            if bytes.is_empty() {
                bytes.push(b'{');
            }
            bytes.extend_from_slice(b",");
            (bytes, JSON_CONTENT_TYPE)
        }
        ErrorVariant::MissingFields => (b"{}".to_vec(), JSON_CONTENT_TYPE),
        ErrorVariant::EmptyItems => (to_json(&empty_arrays(value))?, JSON_CONTENT_TYPE),
        ErrorVariant::WrongTypes => (to_json(&wrong_types(value))?, JSON_CONTENT_TYPE),
        ErrorVariant::MissingBody => (Vec::new(), JSON_CONTENT_TYPE),
        ErrorVariant::Oversized => {
            let mut wrapper = Map::new();
            wrapper.insert("data".to_owned(), value.clone());
            wrapper.insert(
                "padding".to_owned(),
                Value::String("x".repeat(OVERSIZED_PADDING_BYTES)),
            );
            (to_json(&Value::Object(wrapper))?, JSON_CONTENT_TYPE)
        }
        ErrorVariant::WrongContentType => (to_json(value)?, TEXT_CONTENT_TYPE),
    };
    Ok(PayloadBody {
        bytes,
        content_type,
    })
}

fn to_json(value: &Value) -> AppResult<Vec<u8>> {
    serde_json::to_vec(value)
        .map_err(|err| AppError::http(HttpError::SerializePayload { source: err }))
}

fn empty_arrays(value: &Value) -> Value {
    match value {
        Value::Array(_) => Value::Array(Vec::new()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, item)| (key.clone(), empty_arrays(item)))
                .collect(),
        ),
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => value.clone(),
    }
}

fn wrong_types(value: &Value) -> Value {
    match value {
        Value::Number(_) => Value::String("not-a-number".to_owned()),
        Value::Bool(_) => Value::String("not-a-bool".to_owned()),
        Value::String(_) => Value::from(0),
        Value::Array(items) => Value::Array(items.iter().map(wrong_types).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, item)| (key.clone(), wrong_types(item)))
                .collect(),
        ),
        Value::Null => Value::Null,
    }
}
