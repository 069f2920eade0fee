//! Optional cross-references between entities.

use crate::resolve::{extract_id, Entity, EntityRef};
use crate::CoreError;

/// A related entity given as a config, as a bare id, or not at all.
///
/// Replaces the `project` / `project_id` style parameter pairs: callers pick
/// one variant and the id is resolved once, at the call boundary.
#[derive(Debug, Clone)]
pub enum Reference<T: Entity> {
    /// The entity itself, in any accepted representation.
    Entity(EntityRef<T>),
    /// The platform id of the entity.
    Id(T::Id),
    /// Not supplied.
    Absent,
}

impl<T: Entity> Default for Reference<T> {
    fn default() -> Self {
        Self::Absent
    }
}

impl<T: Entity> Reference<T> {
    /// Reference by entity or config.
    pub fn entity(reference: impl Into<EntityRef<T>>) -> Self {
        Self::Entity(reference.into())
    }

    /// Reference by id.
    pub fn id(id: impl Into<T::Id>) -> Self {
        Self::Id(id.into())
    }

    /// Build from an optional object and an optional id; the object wins.
    pub fn from_parts(entity: Option<EntityRef<T>>, id: Option<T::Id>) -> Self {
        match (entity, id) {
            (Some(entity), _) => Self::Entity(entity),
            (None, Some(id)) => Self::Id(id),
            (None, None) => Self::Absent,
        }
    }

    /// Returns true if nothing was supplied.
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// Resolve to the referenced entity's id.
    ///
    /// Fails with [`CoreError::MissingReference`] when absent.
    pub fn resolve_id(self) -> Result<T::Id, CoreError> {
        match self {
            Self::Entity(reference) => extract_id(reference),
            Self::Id(id) => Ok(id),
            Self::Absent => Err(CoreError::MissingReference(T::KIND)),
        }
    }
}
