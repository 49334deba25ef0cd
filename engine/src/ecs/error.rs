//! Misuse reporting.
//!
//! Every violation of the registry's calling contract is a programmer error. There is no
//! recoverable path: the violation is logged at error level and the thread panics with the same
//! message. Build with `panic = "abort"` to turn these into process aborts.
use std::fmt;

use crate::ecs::entity::Entity;

/// A violated registry or pool contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The entity already has a component of this type.
    AlreadyHas {
        entity: Entity,
        component: &'static str,
    },
    /// The entity does not have a component of this type.
    Missing {
        entity: Entity,
        component: &'static str,
    },
    /// The component type was already registered with this registry.
    AlreadyRegistered { component: &'static str },
    /// An owning group was requested over a pool another group already owns.
    PoolAlreadyOwned { component: &'static str },
    /// The same component type appears more than once in a view's tag list.
    DuplicateTag { component: &'static str },
    /// A typed access used a type that does not match the pool's component type.
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
    /// No more component type ids are available.
    TooManyComponents { limit: usize },
    /// Every entity identifier is in use.
    EntitiesExhausted,
    /// The entity is not alive in this registry.
    DeadEntity { entity: Entity },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::AlreadyHas { entity, component } => {
                write!(f, "entity {entity} already has component {component}")
            }
            Error::Missing { entity, component } => {
                write!(f, "entity {entity} does not have component {component}")
            }
            Error::AlreadyRegistered { component } => {
                write!(f, "component {component} is already registered")
            }
            Error::PoolAlreadyOwned { component } => {
                write!(f, "pool for component {component} is already owned by a group")
            }
            Error::DuplicateTag { component } => {
                write!(f, "component {component} appears more than once in a view")
            }
            Error::TypeMismatch { expected, found } => {
                write!(f, "type mismatch: pool stores {expected}, accessed as {found}")
            }
            Error::TooManyComponents { limit } => {
                write!(f, "cannot register more than {limit} component types")
            }
            Error::EntitiesExhausted => write!(f, "entity identifiers exhausted"),
            Error::DeadEntity { entity } => write!(f, "entity {entity} is not alive"),
        }
    }
}

impl std::error::Error for Error {}

/// Log the error and abort the current operation.
#[cold]
#[track_caller]
pub fn fatal(error: Error) -> ! {
    log::error!("{error}");
    panic!("{error}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_entity_and_component() {
        // Given
        let error = Error::AlreadyHas {
            entity: Entity::from_parts(3, 1),
            component: "i32",
        };

        // Then
        assert_eq!(error.to_string(), "entity 3v1 already has component i32");
    }

    #[test]
    #[should_panic(expected = "entity identifiers exhausted")]
    fn fatal_panics_with_message() {
        fatal(Error::EntitiesExhausted);
    }
}
