//! Error types for rust-lwm2m

use thiserror::Error;

use crate::registry::{InstanceId, ObjectTypeId, ResourceTypeId};

/// Main error type for LWM2M client operations
#[derive(Debug, Error)]
pub enum Lwm2mError {
    /// Object type is already present in the enabled-objects table
    #[error("Object type {0} is already enabled")]
    AlreadyEnabled(ObjectTypeId),

    /// Operation requires the object type to be enabled first
    #[error("Object type {0} is not enabled")]
    ObjectNotEnabled(ObjectTypeId),

    /// Object type has no definition in the registry
    #[error("No definition in registry for object type {0}")]
    UnknownObjectType(ObjectTypeId),

    /// Instance id already recorded for this object
    #[error("Instance {instance} already exists on object type {object}")]
    DuplicateInstance {
        object: ObjectTypeId,
        instance: InstanceId,
    },

    /// Two resource definitions share an id within one object definition
    #[error("Duplicate resource id {resource} in object definition {object}")]
    DuplicateResource {
        object: ObjectTypeId,
        resource: ResourceTypeId,
    },

    /// Registration endpoint name exceeds the protocol limit
    #[error("Client name can not exceed 50 characters (got {0})")]
    EndpointNameTooLong(usize),

    /// Request path is not 1-3 decimal segments
    #[error("Malformed request path: {0}")]
    InvalidPath(String),

    /// Payload could not be decoded as the declared value kind
    #[error("Value decode error: {0}")]
    ValueDecode(String),

    /// Value could not be encoded (e.g. nested multiple-value)
    #[error("Value encode error: {0}")]
    ValueEncode(String),

    /// IO error (model file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing/serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Object model document is structurally invalid
    #[error("Invalid object model: {0}")]
    InvalidModel(String),

    /// Registration/deregistration send failure from the transport
    #[error("Transport error: {0}")]
    Transport(String),
}

/// Result type alias for LWM2M operations
pub type Result<T> = std::result::Result<T, Lwm2mError>;
