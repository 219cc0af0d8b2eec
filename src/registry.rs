//! Object and resource schema catalog
//!
//! The registry is the read-only catalog of object-type definitions: which
//! resources each object carries, their value kinds, access masks and
//! cardinality. It is constructed once at startup (programmatically or from
//! a JSON object-model document), shared by reference and never mutated, so
//! concurrent reads need no locking.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;

use crate::error::{Lwm2mError, Result};
use crate::value::ValueKind;

/// Identifier of an object type, globally unique within a registry
pub type ObjectTypeId = u16;
/// Identifier of a resource slot, unique within one object definition
pub type ResourceTypeId = u16;
/// Identifier of an object instance, caller-assigned
pub type InstanceId = u16;

/// Per-resource operation mask: read, write and execute bits are
/// independently settable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Access(u8);

impl Access {
    pub const NONE: Access = Access(0);
    pub const R: Access = Access(0b001);
    pub const W: Access = Access(0b010);
    pub const E: Access = Access(0b100);
    pub const RW: Access = Access(0b011);
    pub const RE: Access = Access(0b101);
    pub const WE: Access = Access(0b110);
    pub const RWE: Access = Access(0b111);

    pub fn readable(self) -> bool {
        self.0 & Self::R.0 != 0
    }

    pub fn writable(self) -> bool {
        self.0 & Self::W.0 != 0
    }

    pub fn executable(self) -> bool {
        self.0 & Self::E.0 != 0
    }

    /// Parse the object-model spelling: any combination of 'R', 'W', 'E'
    pub fn from_model_str(s: &str) -> Option<Self> {
        let mut mask = Access::NONE;
        for c in s.chars() {
            match c {
                'R' => mask.0 |= Self::R.0,
                'W' => mask.0 |= Self::W.0,
                'E' => mask.0 |= Self::E.0,
                _ => return None,
            }
        }
        Some(mask)
    }
}

impl std::ops::BitOr for Access {
    type Output = Access;

    fn bitor(self, rhs: Access) -> Access {
        Access(self.0 | rhs.0)
    }
}

/// Immutable schema entry for one resource slot
#[derive(Debug, Clone)]
pub struct ResourceDef {
    pub id: ResourceTypeId,
    pub name: String,
    pub kind: ValueKind,
    pub access: Access,
    /// Whether the resource may hold multiple values per instance
    pub multiple: bool,
}

impl ResourceDef {
    pub fn new(
        id: ResourceTypeId,
        name: impl Into<String>,
        kind: ValueKind,
        access: Access,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            access,
            multiple: false,
        }
    }

    /// Mark the resource as multiple-cardinality
    pub fn multiple(mut self) -> Self {
        self.multiple = true;
        self
    }
}

/// Immutable schema entry for one object type
#[derive(Debug, Clone)]
pub struct ObjectDef {
    pub id: ObjectTypeId,
    pub name: String,
    pub mandatory: bool,
    resources: Vec<ResourceDef>,
}

impl ObjectDef {
    /// Create an object definition; resource ids must be unique
    pub fn new(
        id: ObjectTypeId,
        name: impl Into<String>,
        mandatory: bool,
        resources: Vec<ResourceDef>,
    ) -> Result<Self> {
        for (i, res) in resources.iter().enumerate() {
            if resources[..i].iter().any(|r| r.id == res.id) {
                return Err(Lwm2mError::DuplicateResource {
                    object: id,
                    resource: res.id,
                });
            }
        }
        Ok(Self {
            id,
            name: name.into(),
            mandatory,
            resources,
        })
    }

    /// Look up one resource definition by id
    pub fn resource(&self, id: ResourceTypeId) -> Option<&ResourceDef> {
        self.resources.iter().find(|r| r.id == id)
    }

    /// All resource definitions, in declaration order
    pub fn resources(&self) -> &[ResourceDef] {
        &self.resources
    }
}

/// Read-only catalog mapping object type ids to their definitions
#[derive(Debug, Default)]
pub struct Registry {
    objects: BTreeMap<ObjectTypeId, Arc<ObjectDef>>,
}

impl Registry {
    /// Build a registry from a list of object definitions
    pub fn new(definitions: Vec<ObjectDef>) -> Result<Self> {
        let mut objects = BTreeMap::new();
        for def in definitions {
            let id = def.id;
            if objects.insert(id, Arc::new(def)).is_some() {
                return Err(Lwm2mError::InvalidModel(format!(
                    "duplicate object type id {}",
                    id
                )));
            }
        }
        Ok(Self { objects })
    }

    /// Parse a registry from a JSON object-model document
    pub fn from_json_str(content: &str) -> Result<Self> {
        let raw: RawModel = serde_json::from_str(content)?;
        let mut definitions = Vec::with_capacity(raw.objects.len());

        for obj in raw.objects {
            let mut resources = Vec::with_capacity(obj.resources.len());
            for res in obj.resources {
                let kind = ValueKind::from_model_str(&res.kind).ok_or_else(|| {
                    Lwm2mError::InvalidModel(format!(
                        "unknown value kind '{}' on resource {}/{}",
                        res.kind, obj.id, res.id
                    ))
                })?;
                let access = Access::from_model_str(&res.access).ok_or_else(|| {
                    Lwm2mError::InvalidModel(format!(
                        "invalid access mask '{}' on resource {}/{}",
                        res.access, obj.id, res.id
                    ))
                })?;
                let mut def = ResourceDef::new(res.id, res.name, kind, access);
                def.multiple = res.multiple;
                resources.push(def);
            }
            definitions.push(ObjectDef::new(obj.id, obj.name, obj.mandatory, resources)?);
        }

        Self::new(definitions)
    }

    /// Load a registry from a JSON object-model file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    /// Look up the definition for an object type
    ///
    /// A miss means the type is unknown to the schema; callers surface it
    /// as a protocol-level Not-Found.
    pub fn definition(&self, id: ObjectTypeId) -> Option<&Arc<ObjectDef>> {
        self.objects.get(&id)
    }

    /// All mandatory object definitions, in ascending id order
    pub fn mandatory(&self) -> Vec<Arc<ObjectDef>> {
        self.objects
            .values()
            .filter(|d| d.mandatory)
            .cloned()
            .collect()
    }

    /// All object definitions, in ascending id order
    pub fn definitions(&self) -> impl Iterator<Item = &Arc<ObjectDef>> {
        self.objects.values()
    }
}

/// Raw object-model structure for deserialization
#[derive(Debug, Deserialize)]
struct RawModel {
    objects: Vec<RawObject>,
}

#[derive(Debug, Deserialize)]
struct RawObject {
    id: ObjectTypeId,
    name: String,
    #[serde(default)]
    mandatory: bool,
    #[serde(default)]
    resources: Vec<RawResource>,
}

#[derive(Debug, Deserialize)]
struct RawResource {
    id: ResourceTypeId,
    name: String,
    #[serde(rename = "type")]
    kind: String,
    access: String,
    #[serde(default)]
    multiple: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device_def() -> ObjectDef {
        ObjectDef::new(
            3,
            "Device",
            true,
            vec![
                ResourceDef::new(0, "Manufacturer", ValueKind::String, Access::R),
                ResourceDef::new(1, "Firmware Version", ValueKind::String, Access::R),
                ResourceDef::new(4, "Reboot", ValueKind::Opaque, Access::E),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_access_bits() {
        assert!(Access::R.readable());
        assert!(!Access::R.writable());
        assert!(Access::RW.writable());
        assert!((Access::R | Access::E).executable());
        assert_eq!(Access::from_model_str("RW"), Some(Access::RW));
        assert_eq!(Access::from_model_str(""), Some(Access::NONE));
        assert_eq!(Access::from_model_str("RX"), None);
    }

    #[test]
    fn test_resource_lookup() {
        let def = device_def();
        assert_eq!(def.resource(1).unwrap().name, "Firmware Version");
        assert!(def.resource(9).is_none());
    }

    #[test]
    fn test_duplicate_resource_rejected() {
        let result = ObjectDef::new(
            3,
            "Device",
            false,
            vec![
                ResourceDef::new(0, "A", ValueKind::String, Access::R),
                ResourceDef::new(0, "B", ValueKind::String, Access::R),
            ],
        );
        assert!(matches!(
            result,
            Err(Lwm2mError::DuplicateResource { object: 3, resource: 0 })
        ));
    }

    #[test]
    fn test_registry_lookup_and_mandatory_order() {
        let optional = ObjectDef::new(5, "Firmware Update", false, vec![]).unwrap();
        let server = ObjectDef::new(1, "Server", true, vec![]).unwrap();
        let registry = Registry::new(vec![device_def(), optional, server]).unwrap();

        assert!(registry.definition(3).is_some());
        assert!(registry.definition(42).is_none());

        let mandatory: Vec<_> = registry.mandatory().iter().map(|d| d.id).collect();
        assert_eq!(mandatory, vec![1, 3]);
    }

    #[test]
    fn test_duplicate_object_rejected() {
        let a = ObjectDef::new(3, "Device", true, vec![]).unwrap();
        let b = ObjectDef::new(3, "Device again", false, vec![]).unwrap();
        assert!(Registry::new(vec![a, b]).is_err());
    }

    #[test]
    fn test_from_json_str() {
        let model = r#"{
            "objects": [
                {
                    "id": 3,
                    "name": "Device",
                    "mandatory": true,
                    "resources": [
                        {"id": 0, "name": "Manufacturer", "type": "string", "access": "R"},
                        {"id": 6, "name": "Power Sources", "type": "integer", "access": "R", "multiple": true},
                        {"id": 4, "name": "Reboot", "type": "opaque", "access": "E"}
                    ]
                },
                {"id": 5, "name": "Firmware Update", "resources": []}
            ]
        }"#;

        let registry = Registry::from_json_str(model).unwrap();
        let device = registry.definition(3).unwrap();
        assert!(device.mandatory);
        assert_eq!(device.resource(0).unwrap().kind, ValueKind::String);
        assert!(device.resource(6).unwrap().multiple);
        assert!(device.resource(4).unwrap().access.executable());
        assert!(!registry.definition(5).unwrap().mandatory);
    }

    #[test]
    fn test_from_json_rejects_bad_kind() {
        let model = r#"{"objects": [{"id": 3, "name": "X", "resources":
            [{"id": 0, "name": "A", "type": "blob", "access": "R"}]}]}"#;
        assert!(matches!(
            Registry::from_json_str(model),
            Err(Lwm2mError::InvalidModel(_))
        ));
    }
}
