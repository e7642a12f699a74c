use std::any::Any;
use std::fmt::Display;
use std::sync::Arc;

use fxhash::FxHashMap;

use crate::net::{ConfigError, Event, LinkId, Params, ProtocolViolation, Side};
use crate::runtime::{TerminationVoter, VoteTally};
use crate::time::SimTime;

///
/// The identity of a parallel execution unit.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Rank(pub u32);

impl Display for Rank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

///
/// A simulation unique identifier for a component.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(pub(crate) usize);

///
/// A port on a component, indexing the ports declared by its
/// [`ComponentDescriptor`](crate::net::ComponentDescriptor).
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PortId(pub(crate) usize);

///
/// How a configured port participates in the exchange.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortMode {
    /// Events can be sent and received.
    Duplex,
    /// Events can only be sent, arrivals are protocol violations.
    SendOnly,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PortBinding {
    pub(crate) name: String,
    pub(crate) link: LinkId,
    pub(crate) side: Side,
    pub(crate) mode: PortMode,
}

///
/// A simulated component.
///
/// The runtime never calls two hooks of the same component concurrently,
/// and every hook runs to completion. Sends issued through the [`Context`]
/// are handed to the links once the hook returns.
///
pub trait Component: Any + Send {
    ///
    /// Called once for every component before simulated time begins.
    ///
    #[allow(unused_variables)]
    fn setup(&mut self, ctx: &mut Context<'_>) {}

    ///
    /// Called for every event delivered to one of the components ports.
    ///
    /// # Errors
    ///
    /// Returns a [`ProtocolViolation`] if the event does not fit the
    /// protocol agreed for the port. This aborts the simulation.
    ///
    fn handle_event(
        &mut self,
        ctx: &mut Context<'_>,
        port: PortId,
        event: Event,
    ) -> Result<(), ProtocolViolation>;

    ///
    /// Called once the simulation has ended. Events sent from this
    /// hook are discarded.
    ///
    #[allow(unused_variables)]
    fn finish(&mut self, ctx: &mut Context<'_>) {}

    /// Downcast support for inspecting finished components.
    fn as_any(&self) -> &dyn Any;
}

///
/// The context handed to a component factory.
///
/// A factory uses it to bind the ports it needs, read its parameters
/// and obtain a [`TerminationVoter`].
///
#[derive(Debug)]
pub struct ComponentInit<'a> {
    name: &'a str,
    rank: Rank,
    params: &'a Params,
    declared: &'static [super::PortDescriptor],
    wiring: &'a FxHashMap<PortId, (LinkId, Side)>,
    tally: &'a Arc<VoteTally>,
    ports: Vec<Option<PortBinding>>,
}

impl<'a> ComponentInit<'a> {
    pub(crate) fn new(
        name: &'a str,
        rank: Rank,
        params: &'a Params,
        declared: &'static [super::PortDescriptor],
        wiring: &'a FxHashMap<PortId, (LinkId, Side)>,
        tally: &'a Arc<VoteTally>,
    ) -> Self {
        Self {
            name,
            rank,
            params,
            declared,
            wiring,
            tally,
            ports: vec![None; declared.len()],
        }
    }

    /// The name of the component under construction.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name
    }

    /// The rank the component will run on.
    #[must_use]
    pub fn rank(&self) -> Rank {
        self.rank
    }

    /// The parameters assigned to the component.
    #[must_use]
    pub fn params(&self) -> &Params {
        self.params
    }

    /// Whether a link is attached to the named port.
    #[must_use]
    pub fn is_wired(&self, port: &str) -> bool {
        self.port_id(port)
            .is_some_and(|id| self.wiring.contains_key(&id))
    }

    ///
    /// Binds a port for sending and receiving.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnboundPort`] if no link is attached to the port.
    ///
    pub fn configure_link(&mut self, port: &str) -> Result<PortId, ConfigError> {
        self.configure(port, PortMode::Duplex)
    }

    ///
    /// Binds a port for sending only.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnboundPort`] if no link is attached to the port.
    ///
    pub fn configure_output(&mut self, port: &str) -> Result<PortId, ConfigError> {
        self.configure(port, PortMode::SendOnly)
    }

    /// Creates a termination voter bound to the rank of this component.
    #[must_use]
    pub fn termination_voter(&self) -> TerminationVoter {
        TerminationVoter::new(self.tally.clone())
    }

    fn port_id(&self, port: &str) -> Option<PortId> {
        self.declared
            .iter()
            .position(|p| p.name == port)
            .map(PortId)
    }

    fn configure(&mut self, port: &str, mode: PortMode) -> Result<PortId, ConfigError> {
        let unbound = || ConfigError::UnboundPort {
            component: self.name.to_string(),
            port: port.to_string(),
        };

        let id = self.port_id(port).ok_or_else(unbound)?;
        let &(link, side) = self.wiring.get(&id).ok_or_else(unbound)?;

        self.ports[id.0] = Some(PortBinding {
            name: port.to_string(),
            link,
            side,
            mode,
        });
        Ok(id)
    }

    pub(crate) fn into_ports(self) -> Vec<Option<PortBinding>> {
        self.ports
    }
}

///
/// The context handed to a component while one of its hooks runs.
///
#[derive(Debug)]
pub struct Context<'a> {
    name: &'a str,
    rank: Rank,
    outbox: &'a mut Vec<(PortId, Event)>,
}

impl<'a> Context<'a> {
    pub(crate) fn new(name: &'a str, rank: Rank, outbox: &'a mut Vec<(PortId, Event)>) -> Self {
        Self { name, rank, outbox }
    }

    /// The name of the component.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name
    }

    /// The rank the component runs on.
    #[must_use]
    pub fn rank(&self) -> Rank {
        self.rank
    }

    /// The current simulation time.
    #[must_use]
    pub fn now(&self) -> SimTime {
        SimTime::now()
    }

    /// Sends an event through the link attached to `port`.
    ///
    /// Ownership of the event passes to the link once the current hook
    /// returns.
    pub fn send(&mut self, port: PortId, event: impl Into<Event>) {
        self.outbox.push((port, event.into()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::PortDescriptor;

    const PORTS: &[PortDescriptor] = &[
        PortDescriptor::new("input", "receives"),
        PortDescriptor::new("output", "sends"),
    ];

    #[test]
    fn configure_wired_ports() {
        let params = Params::new("c");
        let tally = VoteTally::new();
        let mut wiring = FxHashMap::default();
        wiring.insert(PortId(1), (LinkId(7), Side::B));

        let mut init = ComponentInit::new("c", Rank(2), &params, PORTS, &wiring, &tally);
        assert!(init.is_wired("output"));
        assert!(!init.is_wired("input"));
        assert_eq!(init.rank(), Rank(2));

        assert_eq!(init.configure_output("output"), Ok(PortId(1)));
        assert_eq!(
            init.configure_link("input"),
            Err(ConfigError::UnboundPort {
                component: "c".to_string(),
                port: "input".to_string()
            })
        );
        assert!(matches!(
            init.configure_link("missing"),
            Err(ConfigError::UnboundPort { .. })
        ));

        let ports = init.into_ports();
        assert_eq!(ports[0], None);
        assert_eq!(
            ports[1],
            Some(PortBinding {
                name: "output".to_string(),
                link: LinkId(7),
                side: Side::B,
                mode: PortMode::SendOnly
            })
        );
    }

    #[test]
    fn context_buffers_sends() {
        let mut outbox = Vec::new();
        let mut ctx = Context::new("c", Rank(0), &mut outbox);
        ctx.send(PortId(0), crate::net::StringEvent::new("a"));
        ctx.send(PortId(0), Event::Null);
        assert_eq!(outbox.len(), 2);
        assert_eq!(outbox[1], (PortId(0), Event::Null));
    }
}
