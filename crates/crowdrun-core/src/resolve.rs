//! Resolution of loosely-typed entity configs into typed entities.
//!
//! Every operation that takes a project, training or pool accepts it in any
//! of four shapes (see [`EntityRef`]). This module is the single place where
//! those shapes are told apart; everything downstream works with typed
//! entities only.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{CoreError, Pool, Project, Training};

/// A platform entity that can be referenced from a config.
pub trait Entity: Serialize + DeserializeOwned + Clone + fmt::Debug {
    /// Short lowercase name used in errors and blob envelopes.
    const KIND: &'static str;

    /// Identifier type assigned by the platform.
    type Id: Clone + fmt::Debug + fmt::Display + From<String>;

    /// The platform id, `None` until the entity has been created.
    fn id(&self) -> Option<&Self::Id>;
}

/// An entity given in any accepted representation.
#[derive(Debug, Clone, PartialEq)]
pub enum EntityRef<T> {
    /// Already a typed entity.
    Typed(T),
    /// A key-value mapping, e.g. a parsed JSON config file.
    Mapping(Map<String, Value>),
    /// A JSON document, or a bare id.
    Text(String),
    /// Bytes produced by [`encode_blob`], or UTF-8 JSON text.
    Blob(Vec<u8>),
}

impl<T> EntityRef<T> {
    /// Reinterpret an untyped config as a config for another entity type.
    ///
    /// Returns `None` for [`EntityRef::Typed`], which cannot change type.
    pub fn recast<U>(self) -> Option<EntityRef<U>> {
        match self {
            Self::Typed(_) => None,
            Self::Mapping(map) => Some(EntityRef::Mapping(map)),
            Self::Text(text) => Some(EntityRef::Text(text)),
            Self::Blob(bytes) => Some(EntityRef::Blob(bytes)),
        }
    }
}

macro_rules! typed_ref {
    ($($entity:ty),*) => {
        $(
            impl From<$entity> for EntityRef<$entity> {
                fn from(entity: $entity) -> Self {
                    Self::Typed(entity)
                }
            }
        )*
    };
}

typed_ref!(Project, Training, Pool);

impl<T> From<Map<String, Value>> for EntityRef<T> {
    fn from(map: Map<String, Value>) -> Self {
        Self::Mapping(map)
    }
}

impl<T> From<Value> for EntityRef<T> {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => Self::Mapping(map),
            Value::String(text) => Self::Text(text),
            other => Self::Text(other.to_string()),
        }
    }
}

impl<T> From<String> for EntityRef<T> {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl<T> From<&str> for EntityRef<T> {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl<T> From<Vec<u8>> for EntityRef<T> {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Blob(bytes)
    }
}

/// Binary envelope written by [`encode_blob`].
#[derive(Serialize, Deserialize)]
struct EntityBlob {
    kind: String,
    document: String,
}

/// Encode an entity into the crate's native binary form.
///
/// The JSON document is kept as text inside the envelope so exact decimals
/// and unknown fields survive the trip.
pub fn encode_blob<T: Entity>(entity: &T) -> Result<Vec<u8>, CoreError> {
    let document =
        serde_json::to_string(entity).map_err(|e| CoreError::Serialization(e.to_string()))?;
    let blob = EntityBlob {
        kind: T::KIND.to_string(),
        document,
    };
    bincode::serialize(&blob).map_err(|e| CoreError::Serialization(e.to_string()))
}

fn decode_blob<T: Entity>(bytes: &[u8]) -> Option<T> {
    let blob: EntityBlob = bincode::deserialize(bytes).ok()?;
    if blob.kind != T::KIND {
        return None;
    }
    serde_json::from_str(&blob.document).ok()
}

/// Coerce any accepted representation into a typed entity.
pub fn resolve<T: Entity>(reference: EntityRef<T>) -> Result<T, CoreError> {
    match reference {
        EntityRef::Typed(entity) => Ok(entity),
        EntityRef::Mapping(map) => structure(Value::Object(map)),
        EntityRef::Text(text) => {
            let document: Value = serde_json::from_str(&text)
                .map_err(|e| CoreError::resolution(T::KIND, e))?;
            structure(document)
        }
        EntityRef::Blob(bytes) => {
            if let Some(entity) = decode_blob(&bytes) {
                return Ok(entity);
            }
            let text = String::from_utf8(bytes).map_err(|e| CoreError::resolution(T::KIND, e))?;
            resolve(EntityRef::Text(text))
        }
    }
}

fn structure<T: Entity>(document: Value) -> Result<T, CoreError> {
    serde_json::from_value(document).map_err(|e| CoreError::resolution(T::KIND, e))
}

/// Extract the platform id from any accepted representation.
///
/// A JSON integer or string scalar is returned as-is, without structuring a
/// whole entity. Text that is not JSON at all fails like [`resolve`] would.
pub fn extract_id<T: Entity>(reference: EntityRef<T>) -> Result<T::Id, CoreError> {
    let reference = match reference {
        EntityRef::Text(text) => {
            if text.trim().is_empty() {
                return Err(CoreError::MissingIdentifier(T::KIND));
            }
            match serde_json::from_str::<Value>(&text) {
                Err(e) => return Err(CoreError::resolution(T::KIND, e)),
                Ok(Value::Number(n)) if n.is_u64() || n.is_i64() => {
                    return Ok(T::Id::from(n.to_string()))
                }
                Ok(Value::String(id)) => return Ok(T::Id::from(id)),
                Ok(Value::Object(map)) => EntityRef::Mapping(map),
                Ok(other) => {
                    return Err(CoreError::resolution(
                        T::KIND,
                        format!("expected an id or an object, got {other}"),
                    ))
                }
            }
        }
        other => other,
    };

    let entity = resolve(reference)?;
    entity
        .id()
        .cloned()
        .ok_or(CoreError::MissingIdentifier(T::KIND))
}

/// Turn a typed result back into a plain JSON document for the caller.
pub fn unstructure<T: Serialize>(entity: &T) -> Result<Value, CoreError> {
    serde_json::to_value(entity).map_err(|e| CoreError::Serialization(e.to_string()))
}
