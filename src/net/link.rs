use std::fmt::Display;

use crate::net::{ComponentId, PortId, Rank};
use crate::time::Duration;

///
/// A runtime unique identifier for a link.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LinkId(pub(crate) usize);

impl LinkId {
    /// The raw index of the link within its simulation.
    #[must_use]
    pub fn raw(&self) -> usize {
        self.0
    }
}

///
/// One of the two ends of a link.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// The first endpoint, as written in the link definition.
    A,
    /// The second endpoint.
    B,
}

impl Side {
    /// The other end.
    #[must_use]
    pub fn opposite(self) -> Side {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }

    fn idx(self) -> usize {
        match self {
            Side::A => 0,
            Side::B => 1,
        }
    }
}

///
/// The component port a link end is attached to.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkEnd {
    /// The attached component.
    pub component: ComponentId,
    /// The port on the component.
    pub port: PortId,
    /// The rank that owns the component.
    pub rank: Rank,
}

///
/// A channel between exactly two component ports.
///
/// A link carries events in both directions. Each direction is independent:
/// events sent from side A arrive at side B after `latency` and vice versa.
/// With a fixed latency and a scheduler that breaks ties by scheduling
/// order, every direction is FIFO.
///
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    id: LinkId,
    name: String,
    latency: Duration,
    ends: [LinkEnd; 2],
}

impl Link {
    pub(crate) fn new(id: LinkId, name: String, latency: Duration, ends: [LinkEnd; 2]) -> Self {
        Self {
            id,
            name,
            latency,
            ends,
        }
    }

    /// The identifier of the link.
    #[must_use]
    pub fn id(&self) -> LinkId {
        self.id
    }

    /// The name used in the topology definition.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The delay every event endures on this link.
    #[must_use]
    pub fn latency(&self) -> Duration {
        self.latency
    }

    /// The endpoint at the given side.
    #[must_use]
    pub fn end(&self, side: Side) -> &LinkEnd {
        &self.ends[side.idx()]
    }

    /// Whether the two ends live on different ranks.
    #[must_use]
    pub fn is_cross_rank(&self) -> bool {
        self.ends[0].rank != self.ends[1].rank
    }
}

///
/// The state of one hop on a link direction.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HopState {
    /// No event is travelling in this direction.
    Idle,
    /// At least one event was sent but not yet delivered.
    InFlight,
}

///
/// Counters for one direction of a link.
///
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct DirectionStats {
    /// Events handed to the link.
    pub sent: usize,
    /// Events handed to the receiving component.
    pub delivered: usize,
}

impl DirectionStats {
    /// The number of events sent but not yet delivered.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.sent.saturating_sub(self.delivered)
    }

    /// The hop state derived from the counters.
    #[must_use]
    pub fn state(&self) -> HopState {
        if self.in_flight() == 0 {
            HopState::Idle
        } else {
            HopState::InFlight
        }
    }

    pub(crate) fn merge(&mut self, other: &DirectionStats) {
        self.sent += other.sent;
        self.delivered += other.delivered;
    }
}

///
/// Counters for both directions of a link.
///
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkStats {
    /// The name of the link.
    pub name: String,
    /// Events travelling from side A to side B.
    pub a_to_b: DirectionStats,
    /// Events travelling from side B to side A.
    pub b_to_a: DirectionStats,
}

impl LinkStats {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// The counters of the direction leaving `from`.
    #[must_use]
    pub fn direction(&self, from: Side) -> &DirectionStats {
        match from {
            Side::A => &self.a_to_b,
            Side::B => &self.b_to_a,
        }
    }

    pub(crate) fn direction_mut(&mut self, from: Side) -> &mut DirectionStats {
        match from {
            Side::A => &mut self.a_to_b,
            Side::B => &mut self.b_to_a,
        }
    }

    /// The total number of events sent in both directions.
    #[must_use]
    pub fn total_sent(&self) -> usize {
        self.a_to_b.sent + self.b_to_a.sent
    }

    /// The total number of events delivered in both directions.
    #[must_use]
    pub fn total_delivered(&self) -> usize {
        self.a_to_b.delivered + self.b_to_a.delivered
    }

    pub(crate) fn merge(&mut self, other: &LinkStats) {
        self.a_to_b.merge(&other.a_to_b);
        self.b_to_a.merge(&other.b_to_a);
    }
}

impl Display for LinkStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} (a->b {}/{}, b->a {}/{})",
            self.name,
            self.a_to_b.delivered,
            self.a_to_b.sent,
            self.b_to_a.delivered,
            self.b_to_a.sent
        )
    }
}
