//! Common imports.

pub use crate::net::{
    Component, ComponentDescriptor, ComponentInit, ConfigError, Context, ElementRegistry,
    Endpoint, Event, EventKind, LinkStats, ParamDescriptor, Params, PortDescriptor, PortId,
    ProtocolViolation, Rank, StringEvent, TopologyDef,
};
pub use crate::pingpong::{Ping, Pong};
pub use crate::runtime::{
    Builder, ComponentFault, RuntimeError, RuntimeLimit, SimReport, Simulation, Termination,
    TerminationVoter,
};
pub use crate::time::{Duration, SimTime};
