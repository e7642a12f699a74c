use std::{error::Error, fmt::Display};

///
/// The kind of an [`Event`], used to report mismatches.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// An event carrying a [`StringEvent`].
    String,
    /// An event without payload.
    Null,
}

impl Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::String => write!(f, "StringEvent"),
            Self::Null => write!(f, "NullEvent"),
        }
    }
}

///
/// A message travelling over a link.
///
/// Ownership of an event moves from the sending component into the link
/// and from the link into the handler of the receiving component. Handlers
/// consume the event, so each event is dropped exactly once, after its
/// forwarding decision was made.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A text message.
    String(StringEvent),
    /// An event without payload.
    Null,
}

impl Event {
    /// The kind of this event.
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            Self::String(_) => EventKind::String,
            Self::Null => EventKind::Null,
        }
    }
}

impl From<StringEvent> for Event {
    fn from(value: StringEvent) -> Self {
        Event::String(value)
    }
}

///
/// An immutable text payload.
///
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StringEvent {
    payload: String,
}

impl StringEvent {
    /// Creates a new event from some text.
    pub fn new(payload: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
        }
    }

    /// The text carried by this event.
    #[must_use]
    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// Consumes the event, returning its text.
    #[must_use]
    pub fn into_payload(self) -> String {
        self.payload
    }
}

impl Display for StringEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.payload)
    }
}

impl TryFrom<Event> for StringEvent {
    type Error = ProtocolViolation;

    fn try_from(event: Event) -> Result<Self, Self::Error> {
        match event {
            Event::String(event) => Ok(event),
            other => Err(ProtocolViolation::UnexpectedEventKind {
                expected: EventKind::String,
                found: other.kind(),
            }),
        }
    }
}

///
/// A message that does not fit the agreed protocol of a link.
///
/// Correctly wired topologies never produce these, so the runtime
/// aborts the run when a handler reports one.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolViolation {
    /// The event was not of the expected kind.
    UnexpectedEventKind {
        /// The kind the receiver accepts.
        expected: EventKind,
        /// The kind that arrived.
        found: EventKind,
    },
    /// An event arrived on a port that has no handler, either because it
    /// was configured as send-only or not configured at all.
    NoHandler {
        /// The name of the port.
        port: String,
    },
    /// A component sent on a port it never configured.
    UnconfiguredPort {
        /// The name of the port.
        port: String,
    },
}

impl Display for ProtocolViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnexpectedEventKind { expected, found } => {
                write!(f, "expected a {expected}, received a {found}")
            }
            Self::NoHandler { port } => {
                write!(f, "received an event on port '{port}' which has no handler")
            }
            Self::UnconfiguredPort { port } => {
                write!(f, "sent an event on unconfigured port '{port}'")
            }
        }
    }
}

impl Error for ProtocolViolation {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundary_check() {
        let event: Event = StringEvent::new("ping").into();
        assert_eq!(event.kind(), EventKind::String);
        let msg = StringEvent::try_from(event).unwrap();
        assert_eq!(msg.payload(), "ping");

        assert_eq!(
            StringEvent::try_from(Event::Null),
            Err(ProtocolViolation::UnexpectedEventKind {
                expected: EventKind::String,
                found: EventKind::Null
            })
        );
    }

    #[test]
    fn fmt() {
        let err = StringEvent::try_from(Event::Null).unwrap_err();
        assert_eq!(err.to_string(), "expected a StringEvent, received a NullEvent");
        assert_eq!(
            ProtocolViolation::NoHandler {
                port: "output".to_string()
            }
            .to_string(),
            "received an event on port 'output' which has no handler"
        );
    }
}
