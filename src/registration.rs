//! Registration payload building
//!
//! A client registers with a management server by presenting its endpoint
//! name and a CoRE-link serialization of every enabled object and instance,
//! e.g. `</3/0>,</5>`. The server answers with a session location path used
//! for deregistration.

use crate::error::{Lwm2mError, Result};
use crate::objects::Object;

/// Upper bound on the endpoint client name
pub const MAX_ENDPOINT_NAME_LEN: usize = 50;

/// Validate an endpoint client name against the protocol limit
pub fn validate_endpoint_name(name: &str) -> Result<()> {
    if name.len() > MAX_ENDPOINT_NAME_LEN {
        return Err(Lwm2mError::EndpointNameTooLong(name.len()));
    }
    Ok(())
}

/// Serialize the enabled-objects table as a CoRE-link payload
///
/// Objects with instances contribute one `</obj/inst>` link per instance;
/// objects without instances contribute a bare `</obj>` link.
pub fn build_registration_payload(objects: &[Object]) -> String {
    let mut links = Vec::new();

    for object in objects {
        if object.instances().is_empty() {
            links.push(format!("</{}>", object.type_id()));
        } else {
            for instance in object.instances() {
                links.push(format!("</{}/{}>", object.type_id(), instance));
            }
        }
    }

    links.join(",")
}
