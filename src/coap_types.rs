//! Transport-facing CoAP types
//!
//! This module defines the CoAP-level types the core exchanges with a
//! transport layer. These abstractions allow the library to work with any
//! CoAP implementation.

/// CoAP Content-Format identifiers used by LWM2M payloads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ContentFormat {
    /// text/plain;charset=utf-8
    TextPlain = 0,
    /// application/octet-stream
    Opaque = 42,
    /// application/vnd.oma.lwm2m+tlv
    Tlv = 11542,
    /// application/vnd.oma.lwm2m+json
    Json = 11543,
}

impl ContentFormat {
    /// Convert from raw content-format ID
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            0 => Some(Self::TextPlain),
            42 => Some(Self::Opaque),
            11542 => Some(Self::Tlv),
            11543 => Some(Self::Json),
            _ => None,
        }
    }

    /// Get the raw content-format ID
    pub fn as_u16(self) -> u16 {
        self as u16
    }
}

/// CoAP request methods understood by the router
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Put,
    Post,
    Delete,
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Method::Get => f.write_str("GET"),
            Method::Put => f.write_str("PUT"),
            Method::Post => f.write_str("POST"),
            Method::Delete => f.write_str("DELETE"),
        }
    }
}

/// CoAP response codes used by the LWM2M operations
///
/// These are the only status outcomes a handler may signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseCode {
    // Success codes
    /// 2.01 Created
    Created,
    /// 2.02 Deleted
    Deleted,
    /// 2.04 Changed
    Changed,
    /// 2.05 Content
    Content,

    // Client error codes
    /// 4.00 Bad Request
    BadRequest,
    /// 4.01 Unauthorized
    Unauthorized,
    /// 4.04 Not Found
    NotFound,
    /// 4.05 Method Not Allowed
    MethodNotAllowed,
    /// 4.09 Conflict
    Conflict,
}

impl std::fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (class, detail) = self.to_code_pair();
        write!(f, "{}.{:02}", class, detail)
    }
}

impl ResponseCode {
    /// Convert to CoAP response code format (class.detail)
    pub fn to_code_pair(self) -> (u8, u8) {
        match self {
            Self::Created => (2, 1),
            Self::Deleted => (2, 2),
            Self::Changed => (2, 4),
            Self::Content => (2, 5),
            Self::BadRequest => (4, 0),
            Self::Unauthorized => (4, 1),
            Self::NotFound => (4, 4),
            Self::MethodNotAllowed => (4, 5),
            Self::Conflict => (4, 9),
        }
    }

    /// Check if this is a success code
    pub fn is_success(self) -> bool {
        matches!(
            self,
            Self::Created | Self::Deleted | Self::Changed | Self::Content
        )
    }
}

/// An inbound transport request (transport-agnostic)
///
/// The path carries 1-3 decimal segments: `/{object}[/{instance}[/{resource}]]`.
#[derive(Debug, Clone)]
pub struct Request {
    /// The request method
    pub method: Method,
    /// URI path, e.g. "/3/0/1"
    pub path: String,
    /// Raw payload bytes
    pub payload: Vec<u8>,
    /// Content format of the payload
    pub content_format: Option<ContentFormat>,
}

impl Request {
    /// Create a new request with an empty payload
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            payload: Vec::new(),
            content_format: None,
        }
    }

    /// Set the payload
    pub fn with_payload(mut self, payload: Vec<u8>, format: ContentFormat) -> Self {
        self.payload = payload;
        self.content_format = Some(format);
        self
    }
}

/// An outbound transport response (transport-agnostic)
#[derive(Debug, Clone)]
pub struct Response {
    /// Response code
    pub code: ResponseCode,
    /// Encoded payload bytes
    pub payload: Vec<u8>,
    /// Content format of the payload
    pub content_format: Option<ContentFormat>,
    /// Location-Path option (set by registration interfaces)
    pub location_path: Option<String>,
}

impl Response {
    /// Create a response with a bare status and no payload
    pub fn empty(code: ResponseCode) -> Self {
        Self {
            code,
            payload: Vec::new(),
            content_format: None,
            location_path: None,
        }
    }

    /// Create a 2.05 Content response carrying an encoded payload
    pub fn content(payload: Vec<u8>, format: ContentFormat) -> Self {
        Self {
            code: ResponseCode::Content,
            payload,
            content_format: Some(format),
            location_path: None,
        }
    }
}
