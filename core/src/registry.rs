//! Name-to-factory table used to rehydrate envelopes.
//!
//! # Design
//! The registry is filled once at startup, one [`TypeRegistry::register`]
//! call per participating type, and then shared read-only (typically behind an
//! `Arc`). Lookup is a plain `Option`; turning a miss into an error is the
//! unmarshaller's job.

use std::collections::HashMap;

use tracing::warn;

use crate::data::ObjectRef;
use crate::info::{TypeInfo, Typed};

/// What the registry knows about one type.
#[derive(Debug, Clone, Copy)]
pub struct Registration {
    info: &'static TypeInfo,
    factory: fn() -> ObjectRef,
}

impl Registration {
    pub fn of<T: Typed + Default>() -> Self {
        Self {
            info: T::type_info(),
            factory: instantiate::<T>,
        }
    }

    #[inline]
    pub fn info(&self) -> &'static TypeInfo {
        self.info
    }

    /// Allocate a default-valued instance. No user constructor runs.
    pub fn instantiate(&self) -> ObjectRef {
        (self.factory)()
    }
}

fn instantiate<T: Typed + Default>() -> ObjectRef {
    ObjectRef::new(T::default())
}

/// Registry of marshallable types keyed by their fully-qualified name.
///
/// ```
/// use dmaw_core::{dmaw_object, TypeRegistry};
///
/// #[derive(Default)]
/// struct Ping { seq: u64 }
///
/// dmaw_object! {
///     #[dmaw(include)]
///     Ping as "net::Ping" { seq }
/// }
///
/// let registry = TypeRegistry::new().with::<Ping>();
/// assert!(registry.contains("net::Ping"));
/// assert!(registry.get("net::Pong").is_none());
/// ```
#[derive(Debug, Default, Clone)]
pub struct TypeRegistry {
    types: HashMap<&'static str, Registration>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `T` under its type name.
    ///
    /// Registering a second type under an existing name replaces the first.
    pub fn register<T: Typed + Default>(&mut self) -> &mut Self {
        let registration = Registration::of::<T>();
        let name = registration.info().name();
        if self.types.insert(name, registration).is_some() {
            warn!(class = name, "type registered twice, keeping the latest");
        }
        self
    }

    /// Builder form of [`register`](Self::register).
    pub fn with<T: Typed + Default>(mut self) -> Self {
        self.register::<T>();
        self
    }

    pub fn get(&self, name: &str) -> Option<&Registration> {
        self.types.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Registered names, in no particular order.
    pub fn type_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.types.keys().copied()
    }
}
