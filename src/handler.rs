//! LWM2M request router
//!
//! CoAP-library-agnostic dispatch for the five LWM2M operations. This is
//! the core of the library: a transport hands in a method + path request,
//! the router resolves the enabled object, enforces the resource operation
//! mask against the registry schema and invokes the bound enabler. Every
//! path through the router produces a response; no fault escapes as a
//! panic or error value.
//!
//! Method + path shape maps to the operations as:
//!
//! | shape                  | operation |
//! |------------------------|-----------|
//! | GET /o, /o/i, /o/i/r   | Read      |
//! | PUT /o/i, /o/i/r       | Write     |
//! | DELETE /o/i            | Delete    |
//! | POST /o/i/r            | Execute   |
//! | POST /o/i              | Create    |
//!
//! An unenabled object type answers Method-Not-Allowed rather than
//! Not-Found: the path may be valid in the schema while inactive on this
//! client.

use std::sync::Arc;

use log::debug;

use crate::coap_types::{Method, Request, Response, ResponseCode};
use crate::objects::ObjectStore;
use crate::registry::ResourceDef;
use crate::request::{Lwm2mRequest, OperationType, RequestPath};
use crate::response::Lwm2mResponse;
use crate::value;

/// Routes transport requests to enabled-object enablers
#[derive(Debug, Clone)]
pub struct RequestHandler {
    store: Arc<ObjectStore>,
}

impl RequestHandler {
    pub fn new(store: Arc<ObjectStore>) -> Self {
        Self { store }
    }

    /// Handle one inbound transport request
    pub fn handle(&self, request: &Request) -> Response {
        let path = match RequestPath::parse(&request.path) {
            Ok(path) => path,
            Err(_) => return Response::empty(ResponseCode::BadRequest),
        };

        let Some(operation) = classify(request.method, &path) else {
            return Response::empty(ResponseCode::MethodNotAllowed);
        };

        debug!("{} request {}", operation, path);

        match operation {
            OperationType::Read => self.handle_read(request, path),
            OperationType::Write => self.handle_write(request, path),
            OperationType::Execute => self.handle_execute(request, path),
            OperationType::Create => self.handle_create(request, path),
            OperationType::Delete => self.handle_delete(request, path),
        }
    }

    fn handle_read(&self, request: &Request, path: RequestPath) -> Response {
        let Some(object) = self.store.object(path.object) else {
            return Response::empty(ResponseCode::MethodNotAllowed);
        };

        // Object- and instance-level reads have no resource definition to
        // resolve; they report Not-Found.
        let (Some(instance), Some(resource_id)) = (path.instance, path.resource) else {
            return Response::empty(ResponseCode::NotFound);
        };
        let Some(resource) = object.definition().resource(resource_id).cloned() else {
            return Response::empty(ResponseCode::NotFound);
        };
        if !resource.access.readable() {
            return Response::empty(ResponseCode::MethodNotAllowed);
        }

        let lw_request = bind(OperationType::Read, path, request);
        let response = object.enabler().on_read(instance, resource_id, &lw_request);
        encode_read_response(response, &resource)
    }

    fn handle_write(&self, request: &Request, path: RequestPath) -> Response {
        let Some(object) = self.store.object(path.object) else {
            return Response::empty(ResponseCode::MethodNotAllowed);
        };

        let (Some(instance), Some(resource_id)) = (path.instance, path.resource) else {
            return Response::empty(ResponseCode::NotFound);
        };
        let Some(resource) = object.definition().resource(resource_id) else {
            return Response::empty(ResponseCode::NotFound);
        };
        if !resource.access.writable() {
            return Response::empty(ResponseCode::MethodNotAllowed);
        }

        let lw_request = bind(OperationType::Write, path, request);
        let response = object.enabler().on_write(instance, resource_id, &lw_request);
        Response::empty(response.code)
    }

    fn handle_execute(&self, request: &Request, path: RequestPath) -> Response {
        let Some(object) = self.store.object(path.object) else {
            return Response::empty(ResponseCode::MethodNotAllowed);
        };

        // A missing resource definition short-circuits before the
        // permission check; an undefined resource is never executable.
        let (Some(instance), Some(resource_id)) = (path.instance, path.resource) else {
            return Response::empty(ResponseCode::MethodNotAllowed);
        };
        let Some(resource) = object.definition().resource(resource_id) else {
            return Response::empty(ResponseCode::MethodNotAllowed);
        };
        if !resource.access.executable() {
            return Response::empty(ResponseCode::MethodNotAllowed);
        }

        let lw_request = bind(OperationType::Execute, path, request);
        let response = object.enabler().on_execute(instance, resource_id, &lw_request);
        Response::empty(response.code)
    }

    fn handle_create(&self, request: &Request, path: RequestPath) -> Response {
        let Some(object) = self.store.object(path.object) else {
            return Response::empty(ResponseCode::MethodNotAllowed);
        };
        let Some(instance) = path.instance else {
            return Response::empty(ResponseCode::MethodNotAllowed);
        };

        let lw_request = bind(OperationType::Create, path, request);
        let response = object
            .enabler()
            .on_create(instance, path.resource, &lw_request);
        Response::empty(response.code)
    }

    fn handle_delete(&self, request: &Request, path: RequestPath) -> Response {
        let Some(object) = self.store.object(path.object) else {
            return Response::empty(ResponseCode::MethodNotAllowed);
        };
        let Some(instance) = path.instance else {
            return Response::empty(ResponseCode::MethodNotAllowed);
        };

        let lw_request = bind(OperationType::Delete, path, request);
        let response = object.enabler().on_delete(instance, &lw_request);
        Response::empty(response.code)
    }

    #[cfg(test)]
    fn store(&self) -> &Arc<ObjectStore> {
        &self.store
    }
}

/// Map a method + path shape onto an LWM2M operation
fn classify(method: Method, path: &RequestPath) -> Option<OperationType> {
    let instance = path.instance.is_some();
    let resource = path.resource.is_some();

    match (method, instance, resource) {
        (Method::Get, _, _) => Some(OperationType::Read),
        (Method::Put, true, _) => Some(OperationType::Write),
        (Method::Delete, true, false) => Some(OperationType::Delete),
        (Method::Post, true, true) => Some(OperationType::Execute),
        (Method::Post, true, false) => Some(OperationType::Create),
        _ => None,
    }
}

fn bind(operation: OperationType, path: RequestPath, request: &Request) -> Lwm2mRequest {
    Lwm2mRequest::new(operation, path)
        .with_payload(request.payload.clone(), request.content_format)
}

/// Encode a read outcome: status from the enabler, payload and
/// content-format marker from the value codec.
fn encode_read_response(response: Lwm2mResponse, resource: &ResourceDef) -> Response {
    let Some(val) = response.value else {
        return Response::empty(response.code);
    };

    match value::encode(resource.id, resource.multiple, &val) {
        Ok(payload) => Response {
            code: response.code,
            payload,
            content_format: Some(value::media_type(&val)),
            location_path: None,
        },
        Err(e) => {
            log::warn!("read value for resource {} not encodable: {}", resource.id, e);
            Response::empty(ResponseCode::BadRequest)
        }
    }
}
