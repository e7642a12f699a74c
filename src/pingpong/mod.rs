//! The two components that play ping pong.
//!
//! An initiator ([`Ping`]) and a responder ([`Pong`]) bounce a
//! [`StringEvent`](crate::net::StringEvent) back and forth. Both come in two
//! variants, picked by the ports a topology wires:
//!
//! - a direct loop over a single bidirectional `inout` port, with the fixed
//!   payloads `"ping"` and `"pong"`,
//! - a relay over separate `input` and `output` ports, where every hop
//!   appends the role and rank of the component it passed, so the route
//!   of a message can be read from its payload.

pub mod architecture;

mod ping;
mod pong;

pub use self::ping::*;
pub use self::pong::*;

use crate::net::{ComponentInit, ConfigError, PortDescriptor, PortId, Rank};

pub(crate) const PORTS: &[PortDescriptor] = &[
    PortDescriptor::new("inout", "bidirectional port of the direct loop"),
    PortDescriptor::new("input", "receives messages in a relay"),
    PortDescriptor::new("output", "sends messages in a relay"),
];

/// The ports a component was wired with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wiring {
    /// A single bidirectional port.
    Loop {
        /// The `inout` port.
        inout: PortId,
    },
    /// Separate ports for receiving and sending, tagging every payload
    /// with the role and rank of the component.
    Relay {
        /// The `input` port.
        input: PortId,
        /// The `output` port, configured send-only.
        output: PortId,
    },
}

impl Wiring {
    /// Binds `inout` if it is wired, otherwise `input` and `output`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnboundPort`] if neither variant is wired,
    /// and [`ConfigError::ConflictingPort`] if `inout` is wired together
    /// with `input` or `output`.
    pub fn configure(init: &mut ComponentInit<'_>) -> Result<Wiring, ConfigError> {
        if init.is_wired("inout") {
            if let Some(port) = ["input", "output"].into_iter().find(|p| init.is_wired(p)) {
                return Err(ConfigError::ConflictingPort {
                    component: init.name().to_string(),
                    port: port.to_string(),
                    with: "inout".to_string(),
                });
            }
            Ok(Wiring::Loop {
                inout: init.configure_link("inout")?,
            })
        } else {
            let input = init.configure_link("input")?;
            let output = init.configure_output("output")?;
            Ok(Wiring::Relay { input, output })
        }
    }

    /// The port outgoing messages are sent on.
    #[must_use]
    pub fn output(&self) -> PortId {
        match self {
            Self::Loop { inout } => *inout,
            Self::Relay { output, .. } => *output,
        }
    }

    /// Whether payloads are tagged per hop.
    #[must_use]
    pub fn is_relay(&self) -> bool {
        matches!(self, Self::Relay { .. })
    }

    fn forward(&self, received: &str, role: &str, fixed: &str, rank: Rank) -> String {
        match self {
            Self::Loop { .. } => fixed.to_string(),
            Self::Relay { .. } => format!("{received}-{role}{rank}"),
        }
    }
}
