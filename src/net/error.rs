use std::{error::Error, fmt::Display};

/// An error in the configuration of a simulation.
///
/// Configuration errors are detected while building a
/// [`Simulation`](crate::runtime::Simulation) and are never recoverable:
/// no component of a misconfigured simulation reaches a runnable state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Two components share a name.
    DuplicateComponent(String),
    /// Two links share a name.
    DuplicateLink(String),
    /// No element with the given type name was registered.
    UnknownComponentType {
        /// The component requesting the type.
        component: String,
        /// The requested type name.
        ty: String,
    },
    /// A link refers to a component that does not exist.
    UnknownComponent {
        /// The link.
        link: String,
        /// The missing component.
        component: String,
    },
    /// A link refers to a port the component type does not declare.
    UnknownPort {
        /// The component.
        component: String,
        /// The undeclared port.
        port: String,
    },
    /// A port is attached to more than one link.
    PortAlreadyLinked {
        /// The component.
        component: String,
        /// The port.
        port: String,
    },
    /// Both ends of a link name the same port.
    SelfLink(String),
    /// An endpoint is not written as `component.port`.
    InvalidEndpoint(String),
    /// A component tried to configure a port without a link attached.
    UnboundPort {
        /// The component.
        component: String,
        /// The port.
        port: String,
    },
    /// A port is wired although the component uses a wiring that excludes it.
    ConflictingPort {
        /// The component.
        component: String,
        /// The port that cannot be used.
        port: String,
        /// The port whose wiring excludes it.
        with: String,
    },
    /// A link between two ranks must have a positive latency.
    ZeroLatencyCrossRank(String),
    /// A link latency is negative, not a number or too large.
    InvalidLatency {
        /// The link.
        link: String,
        /// The rejected value in seconds.
        latency: String,
    },
    /// A parameter value could not be parsed.
    InvalidParam {
        /// The component.
        component: String,
        /// The parameter key.
        key: String,
        /// The rejected value.
        value: String,
    },
    /// A topology file could not be parsed.
    Parse(String),
    /// A topology file could not be read.
    Io(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateComponent(name) => write!(f, "component '{name}' is defined twice"),
            Self::DuplicateLink(name) => write!(f, "link '{name}' is defined twice"),
            Self::UnknownComponentType { component, ty } => {
                write!(f, "component '{component}' has unknown type '{ty}'")
            }
            Self::UnknownComponent { link, component } => {
                write!(f, "link '{link}' refers to unknown component '{component}'")
            }
            Self::UnknownPort { component, port } => {
                write!(f, "component '{component}' declares no port '{port}'")
            }
            Self::PortAlreadyLinked { component, port } => {
                write!(f, "port '{component}.{port}' is attached to more than one link")
            }
            Self::SelfLink(link) => write!(f, "link '{link}' connects a port to itself"),
            Self::InvalidEndpoint(s) => {
                write!(f, "invalid endpoint '{s}', expected 'component.port'")
            }
            Self::UnboundPort { component, port } => {
                write!(f, "failed to configure port '{port}' on component '{component}'")
            }
            Self::ConflictingPort {
                component,
                port,
                with,
            } => write!(
                f,
                "port '{component}.{port}' is wired but cannot be used together with '{with}'"
            ),
            Self::ZeroLatencyCrossRank(link) => {
                write!(f, "link '{link}' crosses ranks and must have a non-zero latency")
            }
            Self::InvalidLatency { link, latency } => {
                write!(f, "link '{link}' has invalid latency {latency}")
            }
            Self::InvalidParam {
                component,
                key,
                value,
            } => write!(
                f,
                "parameter '{key}' of component '{component}' has invalid value '{value}'"
            ),
            Self::Parse(msg) => write!(f, "failed to parse topology: {msg}"),
            Self::Io(msg) => write!(f, "failed to read topology: {msg}"),
        }
    }
}

impl Error for ConfigError {}
