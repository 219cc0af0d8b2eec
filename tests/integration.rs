//! Integration tests using an embedded object model
//!
//! These exercise the full dispatch path: transport request in, routed
//! through schema and permission checks to an enabler, response and
//! payload encoding out.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use rust_lwm2m::coap_types::{ContentFormat, Method, Request, ResponseCode};
use rust_lwm2m::{
    DeviceClient, InstanceId, Lwm2mError, Lwm2mRequest, Lwm2mResponse, ObjectEnabler, Registry,
    RequestHandler, ResourceTypeId, Transport, Value, ValueKind,
};

const SAMPLE_MODEL: &str = r#"{
    "objects": [
        {
            "id": 3,
            "name": "Device",
            "mandatory": true,
            "resources": [
                {"id": 0, "name": "Manufacturer", "type": "string", "access": "R"},
                {"id": 1, "name": "Firmware Version", "type": "string", "access": "R"},
                {"id": 4, "name": "Reboot", "type": "opaque", "access": "E"},
                {"id": 13, "name": "Current Time", "type": "time", "access": "RW"}
            ]
        },
        {"id": 5, "name": "Firmware Update", "resources": []}
    ]
}"#;

/// Enabler counting invocations so tests can assert the router never
/// called through on a gated operation.
#[derive(Default)]
struct CountingEnabler {
    reads: AtomicUsize,
    writes: AtomicUsize,
    executes: AtomicUsize,
}

impl ObjectEnabler for CountingEnabler {
    fn on_read(&self, _: InstanceId, resource: ResourceTypeId, _: &Lwm2mRequest) -> Lwm2mResponse {
        self.reads.fetch_add(1, Ordering::SeqCst);
        match resource {
            1 => Lwm2mResponse::content(Value::String("1.0".into())),
            _ => Lwm2mResponse::not_found(),
        }
    }

    fn on_write(&self, _: InstanceId, _: ResourceTypeId, _: &Lwm2mRequest) -> Lwm2mResponse {
        self.writes.fetch_add(1, Ordering::SeqCst);
        Lwm2mResponse::changed()
    }

    fn on_execute(&self, _: InstanceId, _: ResourceTypeId, _: &Lwm2mRequest) -> Lwm2mResponse {
        self.executes.fetch_add(1, Ordering::SeqCst);
        Lwm2mResponse::changed()
    }

    fn on_create(&self, _: InstanceId, _: Option<ResourceTypeId>, _: &Lwm2mRequest) -> Lwm2mResponse {
        Lwm2mResponse::created()
    }

    fn on_delete(&self, _: InstanceId, _: &Lwm2mRequest) -> Lwm2mResponse {
        Lwm2mResponse::deleted()
    }
}

fn create_client() -> (DeviceClient, Arc<CountingEnabler>) {
    let registry = Arc::new(Registry::from_json_str(SAMPLE_MODEL).unwrap());
    let client = DeviceClient::new(registry);
    let enabler = Arc::new(CountingEnabler::default());
    // object 3 is mandatory, auto-enabled with the null enabler
    client.set_enabler(3, enabler.clone()).unwrap();
    client.add_instance(3, 0).unwrap();
    (client, enabler)
}

fn handler() -> (RequestHandler, Arc<CountingEnabler>) {
    let (client, enabler) = create_client();
    (client.handler(), enabler)
}

#[test]
fn test_successful_read_roundtrips_payload() {
    let (handler, enabler) = handler();

    let response = handler.handle(&Request::new(Method::Get, "/3/0/1"));

    assert_eq!(response.code, ResponseCode::Content);
    assert_eq!(response.content_format, Some(ContentFormat::TextPlain));
    let decoded = rust_lwm2m::value::decode(&response.payload, ValueKind::String, false).unwrap();
    assert_eq!(decoded, Value::String("1.0".into()));
    assert_eq!(enabler.reads.load(Ordering::SeqCst), 1);
}

#[test]
fn test_read_unknown_resource_is_not_found() {
    let (handler, enabler) = handler();

    let response = handler.handle(&Request::new(Method::Get, "/3/0/9"));

    assert_eq!(response.code, ResponseCode::NotFound);
    assert_eq!(enabler.reads.load(Ordering::SeqCst), 0);
}

#[test]
fn test_write_to_read_only_resource_never_reaches_enabler() {
    let (handler, enabler) = handler();

    let request = Request::new(Method::Put, "/3/0/1")
        .with_payload(b"2.0".to_vec(), ContentFormat::TextPlain);
    let response = handler.handle(&request);

    assert_eq!(response.code, ResponseCode::MethodNotAllowed);
    assert_eq!(enabler.writes.load(Ordering::SeqCst), 0);
}

#[test]
fn test_write_to_writable_resource() {
    let (handler, enabler) = handler();

    let request = Request::new(Method::Put, "/3/0/13")
        .with_payload(vec![0x65, 0x43, 0x8e, 0x00], ContentFormat::Tlv);
    let response = handler.handle(&request);

    assert_eq!(response.code, ResponseCode::Changed);
    assert_eq!(enabler.writes.load(Ordering::SeqCst), 1);
}

#[test]
fn test_execute_on_disabled_object() {
    let (handler, enabler) = handler();

    // object 42 has no definition, object 5 is defined but never enabled;
    // both report Method-Not-Allowed
    for path in ["/5/0/1", "/42/0/1"] {
        let response = handler.handle(&Request::new(Method::Post, path));
        assert_eq!(response.code, ResponseCode::MethodNotAllowed);
    }
    assert_eq!(enabler.executes.load(Ordering::SeqCst), 0);
}

#[test]
fn test_unenabled_type_gates_every_operation() {
    let (handler, _) = handler();

    for request in [
        Request::new(Method::Get, "/5/0/1"),
        Request::new(Method::Put, "/5/0/1"),
        Request::new(Method::Post, "/5/0/1"),
        Request::new(Method::Post, "/5/0"),
        Request::new(Method::Delete, "/5/0"),
    ] {
        let response = handler.handle(&request);
        assert_eq!(
            response.code,
            ResponseCode::MethodNotAllowed,
            "{} {}",
            request.method,
            request.path
        );
    }
}

#[test]
fn test_execute_permission_gating() {
    let (handler, enabler) = handler();

    // executable resource dispatches
    let response = handler.handle(&Request::new(Method::Post, "/3/0/4"));
    assert_eq!(response.code, ResponseCode::Changed);
    assert_eq!(enabler.executes.load(Ordering::SeqCst), 1);

    // read-only resource and undefined resource both gate
    for path in ["/3/0/1", "/3/0/77"] {
        let response = handler.handle(&Request::new(Method::Post, path));
        assert_eq!(response.code, ResponseCode::MethodNotAllowed);
    }
    assert_eq!(enabler.executes.load(Ordering::SeqCst), 1);
}

#[test]
fn test_create_and_delete_lifecycle() {
    let (handler, _) = handler();

    assert_eq!(
        handler.handle(&Request::new(Method::Post, "/3/1")).code,
        ResponseCode::Created
    );
    assert_eq!(
        handler.handle(&Request::new(Method::Delete, "/3/1")).code,
        ResponseCode::Deleted
    );
}

#[test]
fn test_enable_is_not_an_overwrite() {
    let (client, _) = create_client();

    let second = Arc::new(CountingEnabler::default());
    let result = client.enable_object(3, second.clone());
    assert!(matches!(result, Err(Lwm2mError::AlreadyEnabled(3))));

    // the original enabler still answers
    let response = client.handler().handle(&Request::new(Method::Get, "/3/0/1"));
    assert_eq!(response.code, ResponseCode::Content);
    assert_eq!(second.reads.load(Ordering::SeqCst), 0);
}

#[derive(Default)]
struct MockTransport {
    registered: Option<(String, String)>,
    deregistered: Vec<String>,
}

impl Transport for MockTransport {
    fn register(&mut self, endpoint: &str, payload: &str) -> rust_lwm2m::Result<String> {
        self.registered = Some((endpoint.to_string(), payload.to_string()));
        Ok("/rd/1".to_string())
    }

    fn deregister(&mut self, path: &str) -> rust_lwm2m::Result<()> {
        self.deregistered.push(path.to_string());
        Ok(())
    }

    fn notify(&mut self, _path: &str, _payload: &[u8]) -> rust_lwm2m::Result<()> {
        Ok(())
    }
}

#[test]
fn test_registration_roundtrip() {
    let (mut client, _) = create_client();
    client.enable_object_default(5).unwrap();
    client.add_instance(3, 1).unwrap();

    let mut transport = MockTransport::default();
    let path = client.register(&mut transport, "thermostat-7").unwrap();

    assert_eq!(path, "/rd/1");
    let (endpoint, payload) = transport.registered.clone().unwrap();
    assert_eq!(endpoint, "thermostat-7");
    assert_eq!(payload, "</3/0>,</3/1>,</5>");

    client.deregister(&mut transport);
    assert_eq!(transport.deregistered, vec!["/rd/1"]);
    assert_eq!(client.session_path(), None);
}

#[test]
fn test_registry_from_file() {
    use std::io::Write as _;

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(SAMPLE_MODEL.as_bytes()).unwrap();

    let registry = Registry::from_file(file.path()).unwrap();
    assert!(registry.definition(3).unwrap().mandatory);
    assert_eq!(registry.definition(3).unwrap().resource(4).unwrap().name, "Reboot");
}

#[test]
fn test_concurrent_dispatch() {
    let (handler, enabler) = handler();

    std::thread::scope(|scope| {
        for _ in 0..4 {
            let handler = handler.clone();
            scope.spawn(move || {
                for _ in 0..50 {
                    let response = handler.handle(&Request::new(Method::Get, "/3/0/1"));
                    assert_eq!(response.code, ResponseCode::Content);
                }
            });
        }
    });

    assert_eq!(enabler.reads.load(Ordering::SeqCst), 200);
}
