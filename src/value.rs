//! Resource value representation and codec
//!
//! Resource values travel as a compact binary form chosen by the declared
//! value kind: minimal-width big-endian integers, 8-byte floats, one-byte
//! booleans, raw bytes for strings and opaque data, and a repeated-record
//! wrapper for multiple-instance resources. Decoding accepts exactly the
//! encodings this module produces, so `decode(encode(v)) == v` holds for
//! every representable value.
//!
//! A JSON representation (`application/vnd.oma.lwm2m+json`) is provided for
//! the same values, with opaque data carried as base64.

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};

use crate::coap_types::ContentFormat;
use crate::error::{Lwm2mError, Result};
use crate::registry::ResourceTypeId;

/// Declared kind of a resource value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    String,
    Integer,
    Float,
    Boolean,
    Opaque,
    Time,
}

impl ValueKind {
    /// Parse a kind from its object-model spelling
    pub fn from_model_str(s: &str) -> Option<Self> {
        match s {
            "string" => Some(ValueKind::String),
            "integer" => Some(ValueKind::Integer),
            "float" => Some(ValueKind::Float),
            "boolean" => Some(ValueKind::Boolean),
            "opaque" => Some(ValueKind::Opaque),
            "time" => Some(ValueKind::Time),
            _ => None,
        }
    }
}

/// A typed resource value
///
/// `Multiple` holds the per-instance values of a multiple-cardinality
/// resource; its elements are always scalars.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Opaque(Vec<u8>),
    /// Seconds since the Unix epoch
    Time(i64),
    Multiple(Vec<Value>),
}

impl Value {
    /// The declared kind this value belongs to, `None` for `Multiple`
    pub fn kind(&self) -> Option<ValueKind> {
        match self {
            Value::String(_) => Some(ValueKind::String),
            Value::Integer(_) => Some(ValueKind::Integer),
            Value::Float(_) => Some(ValueKind::Float),
            Value::Boolean(_) => Some(ValueKind::Boolean),
            Value::Opaque(_) => Some(ValueKind::Opaque),
            Value::Time(_) => Some(ValueKind::Time),
            Value::Multiple(_) => None,
        }
    }
}

/// Content-format marker for an outgoing value
///
/// Tags the response payload so the receiving party can decode it without
/// out-of-band schema knowledge.
pub fn media_type(value: &Value) -> ContentFormat {
    match value {
        Value::Multiple(_) => ContentFormat::Tlv,
        Value::Opaque(_) => ContentFormat::Opaque,
        Value::String(_) => ContentFormat::TextPlain,
        Value::Integer(_) | Value::Float(_) | Value::Boolean(_) | Value::Time(_) => {
            ContentFormat::Tlv
        }
    }
}

/// Encode a value into its compact binary form
///
/// `multiple` must match the resource's declared cardinality: a
/// single-cardinality value must be a scalar, a multiple-cardinality value
/// must be `Value::Multiple`. The resource id is carried in every record of
/// the multiple wrapper.
pub fn encode(resource_id: ResourceTypeId, multiple: bool, value: &Value) -> Result<Vec<u8>> {
    match (multiple, value) {
        (true, Value::Multiple(elements)) => {
            let mut out = Vec::new();
            for (index, element) in elements.iter().enumerate() {
                let bytes = encode_scalar(element)?;
                out.extend_from_slice(&resource_id.to_be_bytes());
                out.extend_from_slice(&(index as u16).to_be_bytes());
                out.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
                out.extend_from_slice(&bytes);
            }
            Ok(out)
        }
        (true, _) => Err(Lwm2mError::ValueEncode(
            "multiple-cardinality resource requires a Multiple value".into(),
        )),
        (false, Value::Multiple(_)) => Err(Lwm2mError::ValueEncode(
            "single-cardinality resource cannot hold a Multiple value".into(),
        )),
        (false, scalar) => encode_scalar(scalar),
    }
}

/// Decode a binary payload as the given declared kind and cardinality
pub fn decode(bytes: &[u8], kind: ValueKind, multiple: bool) -> Result<Value> {
    if multiple {
        decode_multiple(bytes, kind)
    } else {
        decode_scalar(bytes, kind)
    }
}

fn encode_scalar(value: &Value) -> Result<Vec<u8>> {
    match value {
        Value::String(s) => Ok(s.as_bytes().to_vec()),
        Value::Opaque(b) => Ok(b.clone()),
        Value::Integer(n) | Value::Time(n) => Ok(encode_int(*n)),
        Value::Float(f) => Ok(f.to_be_bytes().to_vec()),
        Value::Boolean(b) => Ok(vec![u8::from(*b)]),
        Value::Multiple(_) => Err(Lwm2mError::ValueEncode(
            "nested Multiple values are not representable".into(),
        )),
    }
}

fn decode_scalar(bytes: &[u8], kind: ValueKind) -> Result<Value> {
    match kind {
        ValueKind::String => {
            let s = std::str::from_utf8(bytes)
                .map_err(|e| Lwm2mError::ValueDecode(format!("invalid UTF-8 string: {}", e)))?;
            Ok(Value::String(s.to_string()))
        }
        ValueKind::Opaque => Ok(Value::Opaque(bytes.to_vec())),
        ValueKind::Integer => Ok(Value::Integer(decode_int(bytes)?)),
        ValueKind::Time => Ok(Value::Time(decode_int(bytes)?)),
        ValueKind::Float => match bytes.len() {
            4 => {
                let mut buf = [0u8; 4];
                buf.copy_from_slice(bytes);
                Ok(Value::Float(f32::from_be_bytes(buf) as f64))
            }
            8 => {
                let mut buf = [0u8; 8];
                buf.copy_from_slice(bytes);
                Ok(Value::Float(f64::from_be_bytes(buf)))
            }
            n => Err(Lwm2mError::ValueDecode(format!(
                "float payload must be 4 or 8 bytes, got {}",
                n
            ))),
        },
        ValueKind::Boolean => match bytes {
            [0] => Ok(Value::Boolean(false)),
            [1] => Ok(Value::Boolean(true)),
            _ => Err(Lwm2mError::ValueDecode(
                "boolean payload must be a single 0x00/0x01 byte".into(),
            )),
        },
    }
}

/// Minimal-width big-endian two's complement: 1, 2, 4 or 8 bytes
fn encode_int(n: i64) -> Vec<u8> {
    if let Ok(v) = i8::try_from(n) {
        v.to_be_bytes().to_vec()
    } else if let Ok(v) = i16::try_from(n) {
        v.to_be_bytes().to_vec()
    } else if let Ok(v) = i32::try_from(n) {
        v.to_be_bytes().to_vec()
    } else {
        n.to_be_bytes().to_vec()
    }
}

fn decode_int(bytes: &[u8]) -> Result<i64> {
    match bytes.len() {
        1 => Ok(i64::from(bytes[0] as i8)),
        2 => {
            let mut buf = [0u8; 2];
            buf.copy_from_slice(bytes);
            Ok(i64::from(i16::from_be_bytes(buf)))
        }
        4 => {
            let mut buf = [0u8; 4];
            buf.copy_from_slice(bytes);
            Ok(i64::from(i32::from_be_bytes(buf)))
        }
        8 => {
            let mut buf = [0u8; 8];
            buf.copy_from_slice(bytes);
            Ok(i64::from_be_bytes(buf))
        }
        n => Err(Lwm2mError::ValueDecode(format!(
            "integer payload must be 1, 2, 4 or 8 bytes, got {}",
            n
        ))),
    }
}

fn decode_multiple(bytes: &[u8], kind: ValueKind) -> Result<Value> {
    let mut elements = Vec::new();
    let mut pos = 0usize;

    while pos < bytes.len() {
        if bytes.len() - pos < 8 {
            return Err(Lwm2mError::ValueDecode(
                "truncated multiple-value record header".into(),
            ));
        }
        // [u16 resource-id][u16 index][u32 len][bytes]
        let len = u32::from_be_bytes([
            bytes[pos + 4],
            bytes[pos + 5],
            bytes[pos + 6],
            bytes[pos + 7],
        ]) as usize;
        pos += 8;

        if bytes.len() - pos < len {
            return Err(Lwm2mError::ValueDecode(
                "truncated multiple-value record payload".into(),
            ));
        }
        elements.push(decode_scalar(&bytes[pos..pos + len], kind)?);
        pos += len;
    }

    Ok(Value::Multiple(elements))
}

/// Convert a value to its JSON representation
pub fn to_json(value: &Value) -> Result<serde_json::Value> {
    match value {
        Value::String(s) => Ok(serde_json::Value::String(s.clone())),
        Value::Integer(n) | Value::Time(n) => Ok(serde_json::Value::Number((*n).into())),
        Value::Float(f) => serde_json::Number::from_f64(*f)
            .map(serde_json::Value::Number)
            .ok_or_else(|| {
                Lwm2mError::ValueEncode("non-finite float is not representable in JSON".into())
            }),
        Value::Boolean(b) => Ok(serde_json::Value::Bool(*b)),
        Value::Opaque(bytes) => Ok(serde_json::Value::String(BASE64.encode(bytes))),
        Value::Multiple(elements) => {
            let arr: Result<Vec<_>> = elements.iter().map(to_json).collect();
            Ok(serde_json::Value::Array(arr?))
        }
    }
}

/// Convert a JSON document back to a typed value
pub fn from_json(json: &serde_json::Value, kind: ValueKind, multiple: bool) -> Result<Value> {
    if multiple {
        let arr = json.as_array().ok_or_else(|| {
            Lwm2mError::ValueDecode("multiple-cardinality resource expects a JSON array".into())
        })?;
        let elements: Result<Vec<_>> = arr.iter().map(|v| from_json(v, kind, false)).collect();
        return Ok(Value::Multiple(elements?));
    }

    match kind {
        ValueKind::String => {
            let s = json
                .as_str()
                .ok_or_else(|| Lwm2mError::ValueDecode("expected JSON string".into()))?;
            Ok(Value::String(s.to_string()))
        }
        ValueKind::Integer => {
            let n = json
                .as_i64()
                .ok_or_else(|| Lwm2mError::ValueDecode("expected JSON integer".into()))?;
            Ok(Value::Integer(n))
        }
        ValueKind::Time => {
            let n = json
                .as_i64()
                .ok_or_else(|| Lwm2mError::ValueDecode("expected JSON integer time".into()))?;
            Ok(Value::Time(n))
        }
        ValueKind::Float => {
            let f = json
                .as_f64()
                .ok_or_else(|| Lwm2mError::ValueDecode("expected JSON number".into()))?;
            Ok(Value::Float(f))
        }
        ValueKind::Boolean => {
            let b = json
                .as_bool()
                .ok_or_else(|| Lwm2mError::ValueDecode("expected JSON boolean".into()))?;
            Ok(Value::Boolean(b))
        }
        ValueKind::Opaque => {
            let s = json
                .as_str()
                .ok_or_else(|| Lwm2mError::ValueDecode("expected base64 JSON string".into()))?;
            let bytes = BASE64
                .decode(s)
                .map_err(|e| Lwm2mError::ValueDecode(format!("base64 decode: {}", e)))?;
            Ok(Value::Opaque(bytes))
        }
    }
}

/// Encode a value as a JSON payload
pub fn encode_json(value: &Value) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(&to_json(value)?)?)
}

/// Decode a JSON payload as the given declared kind and cardinality
pub fn decode_json(bytes: &[u8], kind: ValueKind, multiple: bool) -> Result<Value> {
    let json: serde_json::Value = serde_json::from_slice(bytes)?;
    from_json(&json, kind, multiple)
}
