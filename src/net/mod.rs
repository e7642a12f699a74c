//! Components, the links between them and the topologies they form.
//!
//! A [`TopologyDef`] names component instances and the links between their
//! ports. Each instance refers to a [`ComponentDescriptor`] in an
//! [`ElementRegistry`], which declares the ports and parameters of the type
//! and holds the factory that creates it.

mod component;
mod error;
mod link;
mod message;
mod params;
mod registry;
mod topology;

pub use self::component::*;
pub use self::error::*;
pub use self::link::*;
pub use self::message::*;
pub use self::params::*;
pub use self::registry::*;
pub use self::topology::{ComponentDef, Endpoint, LinkDef, TopologyDef};
