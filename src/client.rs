//! LWM2M device client
//!
//! `DeviceClient` owns the enabled-objects table and the registry
//! reference, exposes the setup operations (enable, bind enablers, record
//! instances) and drives registration, deregistration and value-change
//! notification through a pluggable [`Transport`]. Request dispatch itself
//! lives in [`RequestHandler`](crate::RequestHandler); `handler()` hands a
//! transport loop a shareable dispatcher over the same table.

use std::sync::Arc;

use log::{info, warn};

use crate::error::Result;
use crate::handler::RequestHandler;
use crate::objects::{Object, ObjectEnabler, ObjectStore};
use crate::registration::{build_registration_payload, validate_endpoint_name};
use crate::registry::{InstanceId, ObjectTypeId, Registry};

/// Outbound side of the transport collaborator
///
/// The core never opens sockets; registration, deregistration and the
/// notify hook go through this boundary. Implementations map failures to
/// [`Lwm2mError::Transport`](crate::Lwm2mError::Transport).
pub trait Transport {
    /// POST the registration payload to the server's resource directory;
    /// returns the session location path.
    fn register(&mut self, endpoint: &str, payload: &str) -> Result<String>;

    /// DELETE the session location path.
    fn deregister(&mut self, path: &str) -> Result<()>;

    /// Push a value-change notification for the given resource path.
    fn notify(&mut self, path: &str, payload: &[u8]) -> Result<()>;
}

/// Device-side LWM2M client state
#[derive(Debug)]
pub struct DeviceClient {
    store: Arc<ObjectStore>,
    session_path: Option<String>,
}

impl DeviceClient {
    /// Create a client over the given registry, enabling every mandatory
    /// object type with the null enabler.
    pub fn new(registry: Arc<Registry>) -> Self {
        let store = Arc::new(ObjectStore::new(registry));
        for definition in store.registry().mandatory() {
            if let Err(e) = store.enable(definition.id, None) {
                warn!("mandatory object {} not enabled: {}", definition.id, e);
            }
        }
        Self {
            store,
            session_path: None,
        }
    }

    /// The registry this client was constructed with
    pub fn registry(&self) -> &Arc<Registry> {
        self.store.registry()
    }

    /// A request dispatcher sharing this client's enabled-objects table
    pub fn handler(&self) -> RequestHandler {
        RequestHandler::new(self.store.clone())
    }

    /// Enable an object type with the given enabler
    pub fn enable_object(
        &self,
        type_id: ObjectTypeId,
        enabler: Arc<dyn ObjectEnabler>,
    ) -> Result<()> {
        self.store.enable(type_id, Some(enabler))
    }

    /// Enable an object type with the null enabler
    pub fn enable_object_default(&self, type_id: ObjectTypeId) -> Result<()> {
        self.store.enable(type_id, None)
    }

    /// Replace the enabler bound to an enabled object type
    pub fn set_enabler(&self, type_id: ObjectTypeId, enabler: Arc<dyn ObjectEnabler>) -> Result<()> {
        self.store.set_enabler(type_id, enabler)
    }

    /// Record a new instance of an enabled object type
    pub fn add_instance(&self, type_id: ObjectTypeId, instance: InstanceId) -> Result<()> {
        self.store.add_instance(type_id, instance)
    }

    /// Record several instances of an enabled object type
    pub fn add_instances(&self, type_id: ObjectTypeId, instances: &[InstanceId]) -> Result<()> {
        for instance in instances {
            self.store.add_instance(type_id, *instance)?;
        }
        Ok(())
    }

    /// Remove an instance; returns whether it was present
    pub fn remove_instance(&self, type_id: ObjectTypeId, instance: InstanceId) -> Result<bool> {
        self.store.remove_instance(type_id, instance)
    }

    /// Snapshot of one enabled object record
    pub fn object(&self, type_id: ObjectTypeId) -> Option<Object> {
        self.store.object(type_id)
    }

    /// Ids of all enabled object types
    pub fn enabled_objects(&self) -> Vec<ObjectTypeId> {
        self.store.enabled_types()
    }

    /// Register this client with a management server
    ///
    /// The endpoint name must not exceed 50 characters. On success the
    /// returned session path is retained for deregistration.
    pub fn register<T: Transport>(&mut self, transport: &mut T, name: &str) -> Result<String> {
        validate_endpoint_name(name)?;

        let payload = build_registration_payload(&self.store.snapshot());
        let path = transport.register(name, &payload)?;

        info!("registered as '{}' at {}", name, path);
        self.session_path = Some(path.clone());
        Ok(path)
    }

    /// Deregister from the management server
    ///
    /// Fire-and-forget on teardown: a transport failure is logged, not
    /// propagated. The session path is cleared either way.
    pub fn deregister<T: Transport>(&mut self, transport: &mut T) {
        if let Some(path) = self.session_path.take() {
            if let Err(e) = transport.deregister(&path) {
                warn!("deregistration of {} failed: {}", path, e);
            }
        }
    }

    /// Push a value-change notification through the transport
    pub fn notify<T: Transport>(
        &self,
        transport: &mut T,
        path: &str,
        payload: &[u8],
    ) -> Result<()> {
        transport.notify(path, payload)
    }

    /// Session path from the last successful registration
    pub fn session_path(&self) -> Option<&str> {
        self.session_path.as_deref()
    }
}
