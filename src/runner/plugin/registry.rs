//! Name-keyed factories for host types.
//!
//! The host constructs types from string identifiers (a class named in a payload, an
//! iterator class chosen at runtime). These registries stand in for that: names are matched
//! case-insensitively and map to plain Rust constructors.

use std::collections::HashMap;

use log::debug;

use crate::runner::ds::error::{ContainerError, Result};
use crate::runner::ds::iterator::{ArrayIterator, HostIterator, DEFAULT_ITERATOR_CLASS};
use crate::runner::ds::object::{ClassInstance, ObjectType, PlainObject, PLAIN_OBJECT_CLASS};
use crate::runner::ds::value::{HostValue, ObjectRef};

pub type IteratorFactory = Box<dyn Fn(HostValue) -> Box<dyn HostIterator>>;

pub type ObjectFactory = Box<dyn Fn() -> ObjectType>;

struct Registered<F> {
    name: String,
    factory: F,
}

/// Iterator classes by name.
pub struct IteratorRegistry {
    factories: HashMap<String, Registered<IteratorFactory>>,
}

impl IteratorRegistry {
    pub fn new() -> Self {
        IteratorRegistry {
            factories: HashMap::new(),
        }
    }

    /// A registry that knows the built-in `ArrayIterator`.
    pub fn with_core() -> Self {
        let mut registry = Self::new();
        registry.register(DEFAULT_ITERATOR_CLASS, |storage| {
            Box::new(ArrayIterator::new(storage)) as Box<dyn HostIterator>
        });
        registry
    }

    pub fn register<F>(&mut self, name: &str, factory: F)
    where
        F: Fn(HostValue) -> Box<dyn HostIterator> + 'static,
    {
        debug!("registering iterator class {}", name);
        self.factories.insert(
            name.to_ascii_lowercase(),
            Registered {
                name: name.to_string(),
                factory: Box::new(factory),
            },
        );
    }

    pub fn has_iterator(&self, name: &str) -> bool {
        self.factories.contains_key(&name.to_ascii_lowercase())
    }

    /// Instantiates `name` with `storage` as its only argument.
    pub fn construct(&self, name: &str, storage: HostValue) -> Result<Box<dyn HostIterator>> {
        let registered = self
            .factories
            .get(&name.to_ascii_lowercase())
            .ok_or_else(|| ContainerError::UnknownClass(name.to_string()))?;
        Ok((registered.factory)(storage))
    }

    /// Registered names as they were spelled at registration, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.values().map(|r| r.name.as_str()).collect();
        names.sort_unstable();
        names
    }
}

impl Default for IteratorRegistry {
    fn default() -> Self {
        Self::with_core()
    }
}

/// Object classes by name. Unknown names still construct: they yield a generic
/// [`ClassInstance`] that carries the name, so decoded data is never dropped.
pub struct ClassRegistry {
    factories: HashMap<String, Registered<ObjectFactory>>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        ClassRegistry {
            factories: HashMap::new(),
        }
    }

    pub fn with_core() -> Self {
        let mut registry = Self::new();
        registry.register(PLAIN_OBJECT_CLASS, || ObjectType::Plain(PlainObject::new()));
        registry
    }

    pub fn register<F>(&mut self, name: &str, factory: F)
    where
        F: Fn() -> ObjectType + 'static,
    {
        debug!("registering class {}", name);
        self.factories.insert(
            name.to_ascii_lowercase(),
            Registered {
                name: name.to_string(),
                factory: Box::new(factory),
            },
        );
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.factories.contains_key(&name.to_ascii_lowercase())
    }

    pub fn construct(&self, name: &str) -> ObjectRef {
        match self.factories.get(&name.to_ascii_lowercase()) {
            Some(registered) => (registered.factory)().into_ref(),
            None => {
                debug!("class {} is not registered, using a generic instance", name);
                ObjectType::Instance(Box::new(ClassInstance::new(name))).into_ref()
            }
        }
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.values().map(|r| r.name.as_str()).collect();
        names.sort_unstable();
        names
    }
}

impl Default for ClassRegistry {
    fn default() -> Self {
        Self::with_core()
    }
}
