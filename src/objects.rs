//! Runtime object table and enabler binding
//!
//! An enabled object type pairs its registry definition with an
//! [`ObjectEnabler`] — the pluggable handler supplying the actual behavior
//! for its instances and resources — plus the set of instantiated instance
//! ids. The table is guarded by a read-write lock: setup calls write, the
//! request router reads.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::error::{Lwm2mError, Result};
use crate::registry::{InstanceId, ObjectDef, ObjectTypeId, Registry, ResourceTypeId};
use crate::request::Lwm2mRequest;
use crate::response::Lwm2mResponse;

/// Behavior bound to one enabled object type
///
/// Every non-null enabler implements all five operations. The router
/// checks the resource operation mask before any of these is invoked, so
/// an enabler never sees a disallowed operation.
pub trait ObjectEnabler: Send + Sync {
    fn on_read(
        &self,
        instance: InstanceId,
        resource: ResourceTypeId,
        request: &Lwm2mRequest,
    ) -> Lwm2mResponse;

    fn on_write(
        &self,
        instance: InstanceId,
        resource: ResourceTypeId,
        request: &Lwm2mRequest,
    ) -> Lwm2mResponse;

    fn on_execute(
        &self,
        instance: InstanceId,
        resource: ResourceTypeId,
        request: &Lwm2mRequest,
    ) -> Lwm2mResponse;

    /// Create has no resource segment in its route shape; the resource id
    /// is passed through when present and may be ignored.
    fn on_create(
        &self,
        instance: InstanceId,
        resource: Option<ResourceTypeId>,
        request: &Lwm2mRequest,
    ) -> Lwm2mResponse;

    fn on_delete(&self, instance: InstanceId, request: &Lwm2mRequest) -> Lwm2mResponse;
}

/// Enabler substituted when an object type is enabled without a handler;
/// rejects every operation with Method-Not-Allowed.
#[derive(Debug, Default)]
pub struct NullEnabler;

impl ObjectEnabler for NullEnabler {
    fn on_read(&self, _: InstanceId, _: ResourceTypeId, _: &Lwm2mRequest) -> Lwm2mResponse {
        Lwm2mResponse::method_not_allowed()
    }

    fn on_write(&self, _: InstanceId, _: ResourceTypeId, _: &Lwm2mRequest) -> Lwm2mResponse {
        Lwm2mResponse::method_not_allowed()
    }

    fn on_execute(&self, _: InstanceId, _: ResourceTypeId, _: &Lwm2mRequest) -> Lwm2mResponse {
        Lwm2mResponse::method_not_allowed()
    }

    fn on_create(&self, _: InstanceId, _: Option<ResourceTypeId>, _: &Lwm2mRequest) -> Lwm2mResponse {
        Lwm2mResponse::method_not_allowed()
    }

    fn on_delete(&self, _: InstanceId, _: &Lwm2mRequest) -> Lwm2mResponse {
        Lwm2mResponse::method_not_allowed()
    }
}

/// Runtime record of one enabled object type
#[derive(Clone)]
pub struct Object {
    type_id: ObjectTypeId,
    definition: Arc<ObjectDef>,
    enabler: Arc<dyn ObjectEnabler>,
    instances: Vec<InstanceId>,
}

impl Object {
    fn new(definition: Arc<ObjectDef>, enabler: Arc<dyn ObjectEnabler>) -> Self {
        Self {
            type_id: definition.id,
            definition,
            enabler,
            instances: Vec::new(),
        }
    }

    pub fn type_id(&self) -> ObjectTypeId {
        self.type_id
    }

    pub fn definition(&self) -> &Arc<ObjectDef> {
        &self.definition
    }

    pub fn enabler(&self) -> &Arc<dyn ObjectEnabler> {
        &self.enabler
    }

    /// Instance ids in the order they were added
    pub fn instances(&self) -> &[InstanceId] {
        &self.instances
    }
}

impl std::fmt::Debug for Object {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Object")
            .field("type_id", &self.type_id)
            .field("instances", &self.instances)
            .finish()
    }
}

/// The enabled-objects table, safe for concurrent setup and dispatch
#[derive(Debug)]
pub struct ObjectStore {
    registry: Arc<Registry>,
    objects: RwLock<BTreeMap<ObjectTypeId, Object>>,
}

impl ObjectStore {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self {
            registry,
            objects: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Enable an object type, binding the given enabler (or the null
    /// enabler when none is supplied). Enabling twice is an error, not an
    /// overwrite: the original enabler stays bound.
    pub fn enable(
        &self,
        type_id: ObjectTypeId,
        enabler: Option<Arc<dyn ObjectEnabler>>,
    ) -> Result<()> {
        let definition = self
            .registry
            .definition(type_id)
            .ok_or(Lwm2mError::UnknownObjectType(type_id))?
            .clone();

        let mut objects = self.objects.write().unwrap_or_else(PoisonError::into_inner);
        if objects.contains_key(&type_id) {
            return Err(Lwm2mError::AlreadyEnabled(type_id));
        }
        let enabler = enabler.unwrap_or_else(|| Arc::new(NullEnabler));
        objects.insert(type_id, Object::new(definition, enabler));
        Ok(())
    }

    /// Replace the enabler bound to an already-enabled object type
    pub fn set_enabler(&self, type_id: ObjectTypeId, enabler: Arc<dyn ObjectEnabler>) -> Result<()> {
        let mut objects = self.objects.write().unwrap_or_else(PoisonError::into_inner);
        let object = objects
            .get_mut(&type_id)
            .ok_or(Lwm2mError::ObjectNotEnabled(type_id))?;
        object.enabler = enabler;
        Ok(())
    }

    /// Record an instance id on an enabled object type; duplicates are
    /// rejected.
    pub fn add_instance(&self, type_id: ObjectTypeId, instance: InstanceId) -> Result<()> {
        let mut objects = self.objects.write().unwrap_or_else(PoisonError::into_inner);
        let object = objects
            .get_mut(&type_id)
            .ok_or(Lwm2mError::ObjectNotEnabled(type_id))?;
        if object.instances.contains(&instance) {
            return Err(Lwm2mError::DuplicateInstance {
                object: type_id,
                instance,
            });
        }
        object.instances.push(instance);
        Ok(())
    }

    /// Remove an instance id; returns whether it was present
    pub fn remove_instance(&self, type_id: ObjectTypeId, instance: InstanceId) -> Result<bool> {
        let mut objects = self.objects.write().unwrap_or_else(PoisonError::into_inner);
        let object = objects
            .get_mut(&type_id)
            .ok_or(Lwm2mError::ObjectNotEnabled(type_id))?;
        let before = object.instances.len();
        object.instances.retain(|i| *i != instance);
        Ok(object.instances.len() != before)
    }

    /// Snapshot of one enabled object record
    pub fn object(&self, type_id: ObjectTypeId) -> Option<Object> {
        let objects = self.objects.read().unwrap_or_else(PoisonError::into_inner);
        objects.get(&type_id).cloned()
    }

    /// Ids of all enabled object types, ascending
    pub fn enabled_types(&self) -> Vec<ObjectTypeId> {
        let objects = self.objects.read().unwrap_or_else(PoisonError::into_inner);
        objects.keys().copied().collect()
    }

    /// Snapshot of the whole table, for registration payload building
    pub fn snapshot(&self) -> Vec<Object> {
        let objects = self.objects.read().unwrap_or_else(PoisonError::into_inner);
        objects.values().cloned().collect()
    }
}
