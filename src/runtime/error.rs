use std::{any::Any, error::Error as StdError, fmt::Display};

use crate::net::{ProtocolViolation, Rank};

/// An error that occurred during the simulation.
///
/// Any error type can be boxed into a `RuntimeError`, the original
/// can be recovered with [`RuntimeError::downcast_ref`].
#[derive(Debug)]
pub struct RuntimeError {
    inner: Box<dyn StdErrorAny>,
}

impl RuntimeError {
    /// As any
    pub fn as_any(&self) -> &dyn Any {
        self.inner.as_any()
    }

    /// Returns the boxed error if it is of type `T`.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.as_any().downcast_ref()
    }
}

impl Display for RuntimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.inner.fmt(f)
    }
}

impl<T: StdError + Send + Any + 'static> From<T> for RuntimeError {
    fn from(err: T) -> Self {
        RuntimeError {
            inner: Box::new(err),
        }
    }
}

trait StdErrorAny: StdError + Send + Any {
    fn as_any(&self) -> &dyn Any;
}
impl<T: StdError + Send + Any + 'static> StdErrorAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A component reported a protocol violation, aborting the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentFault {
    /// The name of the faulty component.
    pub component: String,
    /// The violated protocol.
    pub violation: ProtocolViolation,
}

impl Display for ComponentFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "component '{}' failed: {}", self.component, self.violation)
    }
}

impl StdError for ComponentFault {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(&self.violation)
    }
}

/// An event was routed to a rank that does not own its receiver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingError {
    /// The link that carried the event.
    pub link: String,
    /// The rank that received it.
    pub rank: Rank,
}

impl Display for RoutingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "rank {} received an event over link '{}' for a component it does not own",
            self.rank, self.link
        )
    }
}

impl StdError for RoutingError {}
