//! LWM2M device CoAP server CLI
//!
//! Usage:
//!   cargo run --example coap_server -- [--model objects.json] [--port 5683]
//!
//! Serves a demo Device object (/3) over UDP CoAP so the dispatch core can
//! be poked with any CoAP client:
//!   coap-client -m get coap://127.0.0.1:5683/3/0/0

use clap::{Parser, Subcommand};
use coap_lite::{CoapOption, CoapRequest, MessageClass, Packet, RequestType, ResponseType};
use rust_lwm2m::coap_types::{ContentFormat, Method, Request, Response};
use rust_lwm2m::{
    DeviceClient, InstanceId, Lwm2mRequest, Lwm2mResponse, ObjectEnabler, Registry,
    ResourceTypeId, Value, ValueKind,
};
use std::net::UdpSocket;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

const DEFAULT_MODEL: &str = r#"{
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
        }
    ]
}"#;

#[derive(Parser, Debug)]
#[command(name = "lwm2m-server")]
#[command(about = "LWM2M device core - serve a demo Device object via CoAP")]
struct Args {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to a JSON object-model file (built-in Device model if omitted)
    #[arg(short, long, global = true)]
    model: Option<String>,

    /// UDP port to listen on
    #[arg(short, long, default_value = "5683")]
    port: u16,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List all objects and resources in the model
    List,
}

/// Demo Device object: static identity, writable clock, reboot hook
struct DemoDevice {
    time_offset: Mutex<i64>,
}

impl DemoDevice {
    fn new() -> Self {
        Self {
            time_offset: Mutex::new(0),
        }
    }

    fn now(&self) -> i64 {
        let epoch = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);
        epoch + *self.time_offset.lock().unwrap()
    }
}

impl ObjectEnabler for DemoDevice {
    fn on_read(&self, _: InstanceId, resource: ResourceTypeId, _: &Lwm2mRequest) -> Lwm2mResponse {
        match resource {
            0 => Lwm2mResponse::content(Value::String("rust-lwm2m demo".into())),
            1 => Lwm2mResponse::content(Value::String("1.0.0".into())),
            13 => Lwm2mResponse::content(Value::Time(self.now())),
            _ => Lwm2mResponse::not_found(),
        }
    }

    fn on_write(
        &self,
        _: InstanceId,
        resource: ResourceTypeId,
        request: &Lwm2mRequest,
    ) -> Lwm2mResponse {
        match resource {
            13 => match request.decode_value(ValueKind::Time, false) {
                Ok(Value::Time(t)) => {
                    *self.time_offset.lock().unwrap() = t - self.now();
                    Lwm2mResponse::changed()
                }
                _ => Lwm2mResponse::bad_request(),
            },
            _ => Lwm2mResponse::not_found(),
        }
    }

    fn on_execute(&self, _: InstanceId, resource: ResourceTypeId, _: &Lwm2mRequest) -> Lwm2mResponse {
        if resource == 4 {
            println!("  [device] reboot requested");
            Lwm2mResponse::changed()
        } else {
            Lwm2mResponse::not_found()
        }
    }

    fn on_create(&self, _: InstanceId, _: Option<ResourceTypeId>, _: &Lwm2mRequest) -> Lwm2mResponse {
        Lwm2mResponse::method_not_allowed()
    }

    fn on_delete(&self, _: InstanceId, _: &Lwm2mRequest) -> Lwm2mResponse {
        Lwm2mResponse::method_not_allowed()
    }
}

fn main() -> std::io::Result<()> {
    let args = Args::parse();

    let registry = match &args.model {
        Some(path) => Registry::from_file(path).expect("Failed to load object model"),
        None => Registry::from_json_str(DEFAULT_MODEL).expect("Failed to parse built-in model"),
    };

    match args.command {
        Some(Commands::List) => list_objects(&registry),
        None => run_server(registry, args.port, args.verbose)?,
    }

    Ok(())
}

fn list_objects(registry: &Registry) {
    println!("Objects in model:");
    for definition in registry.definitions() {
        let flag = if definition.mandatory { " (mandatory)" } else { "" };
        println!("  /{:<5} {}{}", definition.id, definition.name, flag);
        for resource in definition.resources() {
            let mut ops = String::new();
            if resource.access.readable() {
                ops.push('R');
            }
            if resource.access.writable() {
                ops.push('W');
            }
            if resource.access.executable() {
                ops.push('E');
            }
            let card = if resource.multiple { " [multiple]" } else { "" };
            println!(
                "      /{:<3} {:<24} {:<3} {:?}{}",
                resource.id, resource.name, ops, resource.kind, card
            );
        }
    }
}

fn run_server(registry: Registry, port: u16, verbose: bool) -> std::io::Result<()> {
    let client = DeviceClient::new(Arc::new(registry));
    client
        .set_enabler(3, Arc::new(DemoDevice::new()))
        .expect("Device object missing from model");
    client.add_instance(3, 0).expect("instance setup");
    let handler = client.handler();

    // Set up Ctrl+C handler
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        println!("\n\nReceived Ctrl+C, shutting down...");
        r.store(false, Ordering::SeqCst);
    })
    .expect("Error setting Ctrl+C handler");

    let bind_addr = format!("0.0.0.0:{}", port);
    let socket = UdpSocket::bind(&bind_addr)?;
    socket.set_read_timeout(Some(std::time::Duration::from_millis(500)))?;

    println!("────────────────────────────────────────────────────────────────");
    println!("LWM2M device listening on: coap://0.0.0.0:{}", port);
    println!("Enabled objects:           {:?}", client.enabled_objects());
    println!("────────────────────────────────────────────────────────────────");
    println!("\nQuick test:");
    println!("  coap-client -m get coap://127.0.0.1:{}/3/0/1", port);
    println!("\nWaiting for requests... (Ctrl+C to stop)\n");

    let mut buf = [0u8; 1500];

    while running.load(Ordering::SeqCst) {
        let (len, src) = match socket.recv_from(&mut buf) {
            Ok(r) => r,
            Err(e)
                if e.kind() == std::io::ErrorKind::WouldBlock
                    || e.kind() == std::io::ErrorKind::TimedOut
                    || e.kind() == std::io::ErrorKind::Interrupted =>
            {
                continue; // Check running flag (also handles Ctrl+C interrupt)
            }
            Err(e) => return Err(e),
        };

        let Ok(packet) = Packet::from_bytes(&buf[..len]) else {
            continue;
        };
        // Skip empty ACK packets
        if matches!(packet.header.code, MessageClass::Empty) {
            continue;
        }

        let coap_request = CoapRequest::from_packet(packet, src);
        if verbose {
            println!(
                "[{}] {} /{} ({} bytes)",
                src,
                format_method(&coap_request.message.header.code),
                coap_request.get_path(),
                coap_request.message.payload.len()
            );
        }

        let response_packet = handle_coap_request(&handler, &coap_request);
        let response_bytes = response_packet.to_bytes().unwrap_or_default();
        socket.send_to(&response_bytes, src)?;

        if verbose {
            println!(
                "  → {} ({} bytes)\n",
                format_response(&response_packet.header.code),
                response_packet.payload.len()
            );
        } else {
            print!(".");
            use std::io::Write;
            std::io::stdout().flush().ok();
        }
    }

    println!("\nDone.");
    Ok(())
}

fn handle_coap_request(
    handler: &rust_lwm2m::RequestHandler,
    coap_request: &CoapRequest<std::net::SocketAddr>,
) -> Packet {
    let packet = &coap_request.message;

    let method = match packet.header.code {
        MessageClass::Request(RequestType::Get) => Some(Method::Get),
        MessageClass::Request(RequestType::Put) => Some(Method::Put),
        MessageClass::Request(RequestType::Post) => Some(Method::Post),
        MessageClass::Request(RequestType::Delete) => Some(Method::Delete),
        _ => None,
    };

    let Some(method) = method else {
        return build_packet(packet, Response::empty(rust_lwm2m::coap_types::ResponseCode::MethodNotAllowed));
    };

    let mut request = Request::new(method, format!("/{}", coap_request.get_path()));
    request.payload = packet.payload.clone();
    request.content_format = read_content_format(packet);

    let response = handler.handle(&request);
    build_packet(packet, response)
}

fn build_packet(request: &Packet, response: Response) -> Packet {
    let mut packet = Packet::new();
    packet.header.message_id = request.header.message_id;
    packet.set_token(request.get_token().to_vec());

    let (class, detail) = response.code.to_code_pair();
    packet.header.code = match (class, detail) {
        (2, 1) => MessageClass::Response(ResponseType::Created),
        (2, 2) => MessageClass::Response(ResponseType::Deleted),
        (2, 4) => MessageClass::Response(ResponseType::Changed),
        (2, 5) => MessageClass::Response(ResponseType::Content),
        (4, 0) => MessageClass::Response(ResponseType::BadRequest),
        (4, 1) => MessageClass::Response(ResponseType::Unauthorized),
        (4, 4) => MessageClass::Response(ResponseType::NotFound),
        (4, 5) => MessageClass::Response(ResponseType::MethodNotAllowed),
        (4, 9) => MessageClass::Response(ResponseType::Conflict),
        _ => MessageClass::Response(ResponseType::InternalServerError),
    };

    if !response.payload.is_empty() {
        packet.payload = response.payload;
        if let Some(format) = response.content_format {
            packet.add_option(
                CoapOption::ContentFormat,
                format.as_u16().to_be_bytes().to_vec(),
            );
        }
    }

    packet
}

/// Raw Content-Format option bytes, so the LWM2M media types survive even
/// when the CoAP library's enum doesn't know them.
fn read_content_format(packet: &Packet) -> Option<ContentFormat> {
    let raw = packet.get_option(CoapOption::ContentFormat)?.front()?;
    let id = match raw.len() {
        0 => 0,
        1 => u16::from(raw[0]),
        2 => u16::from_be_bytes([raw[0], raw[1]]),
        _ => return None,
    };
    ContentFormat::from_u16(id)
}

fn format_method(code: &MessageClass) -> &'static str {
    match code {
        MessageClass::Request(RequestType::Get) => "GET",
        MessageClass::Request(RequestType::Post) => "POST",
        MessageClass::Request(RequestType::Put) => "PUT",
        MessageClass::Request(RequestType::Delete) => "DELETE",
        MessageClass::Empty => "EMPTY",
        _ => "???",
    }
}

fn format_response(code: &MessageClass) -> String {
    match code {
        MessageClass::Response(r) => format!("{:?}", r),
        _ => "???".to_string(),
    }
}
