//! Operation outcomes signalled by enablers
//!
//! One sum type with nine named constructors replaces the per-status
//! response objects of older LWM2M stacks: a fixed status code paired with
//! an optional value. Only `content` carries a value.

use crate::coap_types::ResponseCode;
use crate::value::Value;

/// Outcome of an enabler operation: a canonical status and an optional
/// typed payload value
#[derive(Debug, Clone, PartialEq)]
pub struct Lwm2mResponse {
    pub code: ResponseCode,
    pub value: Option<Value>,
}

impl Lwm2mResponse {
    /// 2.01 Created
    pub fn created() -> Self {
        Self::empty(ResponseCode::Created)
    }

    /// 2.02 Deleted
    pub fn deleted() -> Self {
        Self::empty(ResponseCode::Deleted)
    }

    /// 2.04 Changed
    pub fn changed() -> Self {
        Self::empty(ResponseCode::Changed)
    }

    /// 2.05 Content, carrying the read value
    pub fn content(value: Value) -> Self {
        Self {
            code: ResponseCode::Content,
            value: Some(value),
        }
    }

    /// 4.00 Bad Request
    pub fn bad_request() -> Self {
        Self::empty(ResponseCode::BadRequest)
    }

    /// 4.01 Unauthorized
    pub fn unauthorized() -> Self {
        Self::empty(ResponseCode::Unauthorized)
    }

    /// 4.04 Not Found
    pub fn not_found() -> Self {
        Self::empty(ResponseCode::NotFound)
    }

    /// 4.05 Method Not Allowed
    pub fn method_not_allowed() -> Self {
        Self::empty(ResponseCode::MethodNotAllowed)
    }

    /// 4.09 Conflict
    pub fn conflict() -> Self {
        Self::empty(ResponseCode::Conflict)
    }

    fn empty(code: ResponseCode) -> Self {
        Self { code, value: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors_map_to_codes() {
        assert_eq!(Lwm2mResponse::created().code, ResponseCode::Created);
        assert_eq!(Lwm2mResponse::deleted().code, ResponseCode::Deleted);
        assert_eq!(Lwm2mResponse::changed().code, ResponseCode::Changed);
        assert_eq!(Lwm2mResponse::bad_request().code, ResponseCode::BadRequest);
        assert_eq!(Lwm2mResponse::unauthorized().code, ResponseCode::Unauthorized);
        assert_eq!(Lwm2mResponse::not_found().code, ResponseCode::NotFound);
        assert_eq!(
            Lwm2mResponse::method_not_allowed().code,
            ResponseCode::MethodNotAllowed
        );
        assert_eq!(Lwm2mResponse::conflict().code, ResponseCode::Conflict);
    }

    #[test]
    fn test_only_content_carries_a_value() {
        let response = Lwm2mResponse::content(Value::String("1.0".into()));
        assert_eq!(response.code, ResponseCode::Content);
        assert_eq!(response.value, Some(Value::String("1.0".into())));
        assert!(Lwm2mResponse::changed().value.is_none());
    }
}
