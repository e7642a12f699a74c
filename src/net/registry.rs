use std::fmt;

use fxhash::FxHashMap;

use super::{Component, ComponentInit, ConfigError};

/// The function that creates a component from its construction context.
pub type ComponentFactory = fn(&mut ComponentInit<'_>) -> Result<Box<dyn Component>, ConfigError>;

///
/// A port a component type may expose.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortDescriptor {
    /// The name used when wiring links.
    pub name: &'static str,
    /// A human readable description.
    pub description: &'static str,
}

impl PortDescriptor {
    /// Creates a new port descriptor.
    #[must_use]
    pub const fn new(name: &'static str, description: &'static str) -> Self {
        Self { name, description }
    }
}

///
/// A parameter a component type understands.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamDescriptor {
    /// The parameter key.
    pub name: &'static str,
    /// A human readable description.
    pub description: &'static str,
    /// The value used when the parameter is not set.
    pub default: &'static str,
}

impl ParamDescriptor {
    /// Creates a new parameter descriptor.
    #[must_use]
    pub const fn new(name: &'static str, description: &'static str, default: &'static str) -> Self {
        Self {
            name,
            description,
            default,
        }
    }
}

///
/// The static description of a component type: its declared
/// ports and parameters, and the factory that creates instances.
///
#[derive(Clone, Copy)]
pub struct ComponentDescriptor {
    /// The library the element belongs to.
    pub library: &'static str,
    /// The element name within the library.
    pub name: &'static str,
    /// A human readable description.
    pub description: &'static str,
    /// All ports instances may expose.
    pub ports: &'static [PortDescriptor],
    /// All parameters instances understand.
    pub params: &'static [ParamDescriptor],
    /// Creates a new instance.
    pub factory: ComponentFactory,
}

impl ComponentDescriptor {
    /// The fully qualified type name `<library>.<name>`.
    #[must_use]
    pub fn type_name(&self) -> String {
        format!("{}.{}", self.library, self.name)
    }

    /// The declared port with the given name, if any.
    #[must_use]
    pub fn port(&self, name: &str) -> Option<&'static PortDescriptor> {
        self.ports.iter().find(|p| p.name == name)
    }
}

impl fmt::Debug for ComponentDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentDescriptor")
            .field("library", &self.library)
            .field("name", &self.name)
            .field("ports", &self.ports)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// A registry of all known component types.
pub struct ElementRegistry {
    map: FxHashMap<String, ComponentDescriptor>,
}

impl ElementRegistry {
    /// Creates a new empty registry.
    #[must_use]
    pub fn new() -> ElementRegistry {
        Self {
            map: FxHashMap::default(),
        }
    }

    /// Creates a registry containing the elements of this crate.
    #[must_use]
    pub fn with_builtin() -> ElementRegistry {
        let mut registry = Self::new();
        registry.register(crate::pingpong::Ping::DESCRIPTOR);
        registry.register(crate::pingpong::Pong::DESCRIPTOR);
        registry
    }

    /// Adds a new element, returning the one it replaced.
    pub fn register(&mut self, desc: ComponentDescriptor) -> Option<ComponentDescriptor> {
        self.map.insert(desc.type_name(), desc)
    }

    /// Retrieves the descriptor for a type name.
    #[must_use]
    pub fn get(&self, ty: &str) -> Option<&ComponentDescriptor> {
        self.map.get(ty)
    }

    /// All registered elements, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &ComponentDescriptor> {
        self.map.values()
    }
}

impl Default for ElementRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ElementRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut types = self.map.keys().collect::<Vec<_>>();
        types.sort();
        f.debug_struct("ElementRegistry")
            .field("types", &types)
            .finish()
    }
}
