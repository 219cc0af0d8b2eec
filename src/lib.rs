//! rust-lwm2m - Device-side LWM2M client core
//!
//! This library provides the object/resource model and request-dispatch
//! engine of an LWM2M client: a typed registry of object schemas, an
//! enabled-objects table backed by pluggable enablers, a router mapping
//! CoAP-level method + path requests onto the five LWM2M operations with
//! per-resource access enforcement, and a compact binary value codec.
//! Transport concerns (sockets, retransmission, observe bookkeeping) stay
//! behind small boundary traits, so the core plugs into any CoAP stack.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use rust_lwm2m::{
//!     Access, DeviceClient, Lwm2mRequest, Lwm2mResponse, ObjectDef, ObjectEnabler,
//!     Registry, ResourceDef, Value, ValueKind,
//! };
//! use rust_lwm2m::coap_types::{Method, Request};
//!
//! struct Device;
//!
//! impl ObjectEnabler for Device {
//!     fn on_read(&self, _inst: u16, _rsrc: u16, _req: &Lwm2mRequest) -> Lwm2mResponse {
//!         Lwm2mResponse::content(Value::String("ACME".into()))
//!     }
//!     fn on_write(&self, _: u16, _: u16, _: &Lwm2mRequest) -> Lwm2mResponse {
//!         Lwm2mResponse::changed()
//!     }
//!     fn on_execute(&self, _: u16, _: u16, _: &Lwm2mRequest) -> Lwm2mResponse {
//!         Lwm2mResponse::changed()
//!     }
//!     fn on_create(&self, _: u16, _: Option<u16>, _: &Lwm2mRequest) -> Lwm2mResponse {
//!         Lwm2mResponse::created()
//!     }
//!     fn on_delete(&self, _: u16, _: &Lwm2mRequest) -> Lwm2mResponse {
//!         Lwm2mResponse::deleted()
//!     }
//! }
//!
//! let registry = Arc::new(Registry::new(vec![
//!     ObjectDef::new(3, "Device", true, vec![
//!         ResourceDef::new(0, "Manufacturer", ValueKind::String, Access::R),
//!     ]).unwrap(),
//! ]).unwrap());
//!
//! let client = DeviceClient::new(registry);
//! client.set_enabler(3, Arc::new(Device)).unwrap();
//! client.add_instance(3, 0).unwrap();
//!
//! // Hand the handler to a CoAP transport loop
//! let handler = client.handler();
//! let response = handler.handle(&Request::new(Method::Get, "/3/0/0"));
//! assert_eq!(response.payload, b"ACME");
//! ```

mod client;
pub mod coap_types;
mod error;
pub mod handler;
mod objects;
pub mod registration;
pub mod registry;
mod request;
mod response;
pub mod value;

pub use client::{DeviceClient, Transport};
pub use error::{Lwm2mError, Result};
pub use handler::RequestHandler;
pub use objects::{NullEnabler, Object, ObjectEnabler, ObjectStore};
pub use registry::{
    Access, InstanceId, ObjectDef, ObjectTypeId, Registry, ResourceDef, ResourceTypeId,
};
pub use request::{Lwm2mRequest, OperationType, RequestPath};
pub use response::Lwm2mResponse;
pub use value::{Value, ValueKind};
