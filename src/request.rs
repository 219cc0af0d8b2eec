//! LWM2M request model
//!
//! An inbound transport request is classified into one of the five LWM2M
//! operations and rebound to an [`Lwm2mRequest`] before it reaches an
//! enabler, so handlers never see transport-level details beyond the raw
//! payload.

use crate::coap_types::ContentFormat;
use crate::error::{Lwm2mError, Result};
use crate::registry::{InstanceId, ObjectTypeId, ResourceTypeId};
use crate::value::{self, Value, ValueKind};

/// The five LWM2M operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationType {
    Read,
    Write,
    Execute,
    Create,
    Delete,
}

impl std::fmt::Display for OperationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OperationType::Read => f.write_str("Read"),
            OperationType::Write => f.write_str("Write"),
            OperationType::Execute => f.write_str("Execute"),
            OperationType::Create => f.write_str("Create"),
            OperationType::Delete => f.write_str("Delete"),
        }
    }
}

/// Parsed request path: object id plus optional instance and resource ids
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestPath {
    pub object: ObjectTypeId,
    pub instance: Option<InstanceId>,
    pub resource: Option<ResourceTypeId>,
}

impl RequestPath {
    /// Parse a URI path of 1-3 decimal segments, e.g. "/3/0/1"
    ///
    /// Only the leading and trailing slash are optional; an empty interior
    /// segment ("/3//1") is malformed.
    pub fn parse(path: &str) -> Result<Self> {
        let trimmed = path.strip_prefix('/').unwrap_or(path);
        let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
        let segments: Vec<&str> = trimmed.split('/').collect();

        let (&first, rest) = segments
            .split_first()
            .ok_or_else(|| Lwm2mError::InvalidPath(path.to_string()))?;
        if rest.len() > 2 {
            return Err(Lwm2mError::InvalidPath(path.to_string()));
        }

        let parse_id = |segment: &str| {
            segment
                .parse::<u16>()
                .map_err(|_| Lwm2mError::InvalidPath(path.to_string()))
        };

        Ok(Self {
            object: parse_id(first)?,
            instance: rest.first().map(|s| parse_id(s)).transpose()?,
            resource: rest.get(1).map(|s| parse_id(s)).transpose()?,
        })
    }

    /// Number of path segments present
    pub fn depth(&self) -> usize {
        1 + usize::from(self.instance.is_some()) + usize::from(self.resource.is_some())
    }
}

impl std::fmt::Display for RequestPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "/{}", self.object)?;
        if let Some(instance) = self.instance {
            write!(f, "/{}", instance)?;
        }
        if let Some(resource) = self.resource {
            write!(f, "/{}", resource)?;
        }
        Ok(())
    }
}

/// The request value handed to an enabler
#[derive(Debug, Clone)]
pub struct Lwm2mRequest {
    /// The classified operation
    pub operation: OperationType,
    /// Parsed object/instance/resource path
    pub path: RequestPath,
    /// Raw payload bytes from the transport request
    pub payload: Vec<u8>,
    /// Content format of the payload, when the transport carried one
    pub content_format: Option<ContentFormat>,
}

impl Lwm2mRequest {
    pub fn new(operation: OperationType, path: RequestPath) -> Self {
        Self {
            operation,
            path,
            payload: Vec::new(),
            content_format: None,
        }
    }

    /// Attach the transport payload
    pub fn with_payload(mut self, payload: Vec<u8>, format: Option<ContentFormat>) -> Self {
        self.payload = payload;
        self.content_format = format;
        self
    }

    /// Decode the payload as the declared kind and cardinality
    ///
    /// Dispatches on the request's content format: JSON payloads go through
    /// the JSON codec, everything else through the binary codec. Write,
    /// Create and Execute handlers use this to parse inbound values with
    /// the same codec that produced them.
    pub fn decode_value(&self, kind: ValueKind, multiple: bool) -> Result<Value> {
        match self.content_format {
            Some(ContentFormat::Json) => value::decode_json(&self.payload, kind, multiple),
            _ => value::decode(&self.payload, kind, multiple),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_path() {
        let path = RequestPath::parse("/3/0/1").unwrap();
        assert_eq!(path.object, 3);
        assert_eq!(path.instance, Some(0));
        assert_eq!(path.resource, Some(1));
        assert_eq!(path.depth(), 3);
        assert_eq!(path.to_string(), "/3/0/1");
    }

    #[test]
    fn test_parse_partial_paths() {
        let path = RequestPath::parse("3").unwrap();
        assert_eq!((path.object, path.instance, path.resource), (3, None, None));

        let path = RequestPath::parse("/5/1").unwrap();
        assert_eq!((path.object, path.instance, path.resource), (5, Some(1), None));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(RequestPath::parse("").is_err());
        assert!(RequestPath::parse("/").is_err());
        assert!(RequestPath::parse("/3/x/1").is_err());
        assert!(RequestPath::parse("/3/0/1/2").is_err());
        assert!(RequestPath::parse("/-1").is_err());
        assert!(RequestPath::parse("/70000").is_err());
    }

    #[test]
    fn test_parse_rejects_empty_interior_segment() {
        assert!(RequestPath::parse("/3//1").is_err());
        assert!(RequestPath::parse("//0/1").is_err());

        // a trailing slash is tolerated, an empty segment is not
        let path = RequestPath::parse("/3/0/").unwrap();
        assert_eq!((path.object, path.instance, path.resource), (3, Some(0), None));
    }

    #[test]
    fn test_decode_value_dispatches_on_format() {
        let path = RequestPath::parse("/3/0/1").unwrap();

        let binary = Lwm2mRequest::new(OperationType::Write, path)
            .with_payload(vec![0x2a], Some(ContentFormat::Tlv));
        assert_eq!(
            binary.decode_value(ValueKind::Integer, false).unwrap(),
            Value::Integer(42)
        );

        let json = Lwm2mRequest::new(OperationType::Write, path)
            .with_payload(b"42".to_vec(), Some(ContentFormat::Json));
        assert_eq!(
            json.decode_value(ValueKind::Integer, false).unwrap(),
            Value::Integer(42)
        );
    }
}
