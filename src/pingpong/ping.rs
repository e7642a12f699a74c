use std::any::Any;

use tracing::info;

use super::{Wiring, PORTS};
use crate::net::{
    Component, ComponentDescriptor, ComponentInit, ConfigError, Context, Event, ParamDescriptor,
    PortId, ProtocolViolation, Rank, StringEvent,
};
use crate::runtime::TerminationVoter;

///
/// The initiator of the exchange.
///
/// A `Ping` sends the first message during setup and counts every
/// message it receives. Once `model` messages were received it votes
/// to end the simulation and stops forwarding.
///
#[derive(Debug)]
pub struct Ping {
    wiring: Wiring,
    rank: Rank,
    round_count: u64,
    max_rounds: u64,
    sent: usize,
    received: usize,
    last_payload: Option<String>,
    voter: TerminationVoter,
}

impl Ping {
    /// The registry entry of `pingpong.Ping`.
    pub const DESCRIPTOR: ComponentDescriptor = ComponentDescriptor {
        library: "pingpong",
        name: "Ping",
        description: "initiates the ping pong and decides when it ends",
        ports: PORTS,
        params: &[ParamDescriptor::new(
            "model",
            "number of received messages before voting to end",
            "10",
        )],
        factory: Ping::create,
    };

    fn create(init: &mut ComponentInit<'_>) -> Result<Box<dyn Component>, ConfigError> {
        let max_rounds = init.params().find::<u64>("model", 10)?;
        info!("Maximum Repeats: {max_rounds}");

        let wiring = Wiring::configure(init)?;

        let mut voter = init.termination_voter();
        voter.mark_as_voting_participant();

        Ok(Box::new(Ping {
            wiring,
            rank: init.rank(),
            round_count: 0,
            max_rounds,
            sent: 0,
            received: 0,
            last_payload: None,
            voter,
        }))
    }

    /// Messages received so far.
    #[must_use]
    pub fn round_count(&self) -> u64 {
        self.round_count
    }

    /// The configured limit.
    #[must_use]
    pub fn max_rounds(&self) -> u64 {
        self.max_rounds
    }

    /// Messages sent, including the initial one.
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

    /// Whether this component voted to end the simulation.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.voter.is_ready()
    }

    /// The ports this instance was wired with.
    #[must_use]
    pub fn wiring(&self) -> Wiring {
        self.wiring
    }

    fn send(&mut self, ctx: &mut Context<'_>, payload: String) {
        info!("Sent message: {payload}");
        ctx.send(self.wiring.output(), StringEvent::new(payload));
        self.sent += 1;
    }
}

impl Component for Ping {
    fn setup(&mut self, ctx: &mut Context<'_>) {
        let payload = if self.wiring.is_relay() {
            format!("Ping{}", self.rank)
        } else {
            "ping".to_string()
        };
        self.send(ctx, payload);
    }

    fn handle_event(
        &mut self,
        ctx: &mut Context<'_>,
        _port: PortId,
        event: Event,
    ) -> Result<(), ProtocolViolation> {
        let msg = StringEvent::try_from(event)?;
        self.received += 1;
        info!("Received message: {msg}");

        let next = self.wiring.forward(msg.payload(), "Ping", "ping", self.rank);
        self.last_payload = Some(msg.into_payload());

        self.round_count += 1;
        info!("Repeats: {}", self.round_count);
        if self.round_count >= self.max_rounds {
            self.voter.signal_ready();
            return Ok(());
        }

        self.send(ctx, next);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
