use std::any::Any;

use tracing::info;

use super::{Wiring, PORTS};
use crate::net::{
    Component, ComponentDescriptor, ComponentInit, ConfigError, Context, Event, PortId,
    ProtocolViolation, Rank, StringEvent,
};

///
/// The responder of the exchange.
///
/// Every received message is answered with exactly one new message.
/// A `Pong` never ends the simulation on its own.
///
#[derive(Debug)]
pub struct Pong {
    wiring: Wiring,
    rank: Rank,
    sent: usize,
    received: usize,
    last_payload: Option<String>,
}

impl Pong {
    /// The registry entry of `pingpong.Pong`.
    pub const DESCRIPTOR: ComponentDescriptor = ComponentDescriptor {
        library: "pingpong",
        name: "Pong",
        description: "answers every message",
        ports: PORTS,
        params: &[],
        factory: Pong::create,
    };

    fn create(init: &mut ComponentInit<'_>) -> Result<Box<dyn Component>, ConfigError> {
        Ok(Box::new(Pong {
            wiring: Wiring::configure(init)?,
            rank: init.rank(),
            sent: 0,
            received: 0,
            last_payload: None,
        }))
    }

    /// Messages sent.
    #[must_use]
    pub fn messages_sent(&self) -> usize {
        self.sent
    }

    /// Messages received.
    #[must_use]
    pub fn messages_received(&self) -> usize {
        self.received
    }

    /// The payload of the last received message.
    #[must_use]
    pub fn last_payload(&self) -> Option<&str> {
        self.last_payload.as_deref()
    }
}

impl Component for Pong {
    fn handle_event(
        &mut self,
        ctx: &mut Context<'_>,
        _port: PortId,
        event: Event,
    ) -> Result<(), ProtocolViolation> {
        let msg = StringEvent::try_from(event)?;
        self.received += 1;
        info!("Received message: {msg}");

        let next = self.wiring.forward(msg.payload(), "Pong", "pong", self.rank);
        self.last_payload = Some(msg.into_payload());

        info!("Sent message: {next}");
        ctx.send(self.wiring.output(), StringEvent::new(next));
        self.sent += 1;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
