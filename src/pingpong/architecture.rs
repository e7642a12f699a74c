//! Ready made topologies for the ping pong components.

use std::fmt::Display;

use crate::net::{Endpoint, TopologyDef};

/// The part a component plays in the exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Starts the exchange and decides when it ends (`pingpong.Ping`).
    Initiator,
    /// Answers every message (`pingpong.Pong`).
    Responder,
}

impl Role {
    /// The registered element type.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Initiator => "pingpong.Ping",
            Self::Responder => "pingpong.Pong",
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initiator => write!(f, "Ping"),
            Self::Responder => write!(f, "Pong"),
        }
    }
}

/// A `Ping` and a `Pong` on rank 0, joined by a 1s link between
/// their `inout` ports.
#[must_use]
pub fn simple_loop(max_rounds: u64) -> TopologyDef {
    let mut topo = TopologyDef::new();
    topo.add_component("ping", Role::Initiator.type_name(), 0, [("model", max_rounds)])
        .add_component("pong", Role::Responder.type_name(), 0, Vec::<(&str, u64)>::new())
        .add_link(
            "ping_pong",
            1.0,
            Endpoint::new("ping", "inout"),
            Endpoint::new("pong", "inout"),
        );
    topo
}

/// A ring of relay stages.
///
/// Stage `i` is named `<Role><i>` and runs on the given rank. Its
/// `output` is wired to the `input` of stage `i + 1` (wrapping around)
/// with a 1s link. Initiators receive `max_rounds` as `model`.
#[must_use]
pub fn relay_chain(stages: &[(Role, u32)], max_rounds: u64) -> TopologyDef {
    let name = |i: usize| format!("{}{}", stages[i].0, i);

    let mut topo = TopologyDef::new();
    for (i, (role, rank)) in stages.iter().enumerate() {
        let params = match role {
            Role::Initiator => vec![("model", max_rounds)],
            Role::Responder => Vec::new(),
        };
        topo.add_component(name(i), role.type_name(), *rank, params);
    }
    for i in 0..stages.len() {
        let next = (i + 1) % stages.len();
        topo.add_link(
            format!("link{i}"),
            1.0,
            Endpoint::new(name(i), "output"),
            Endpoint::new(name(next), "input"),
        );
    }
    topo
}

/// `num` ping pong assemblies connected in a loop.
///
/// Assembly `i` places `PingPong<i>.Ping` and `PingPong<i>.Pong` on rank
/// `i`, wired by a 1s link from `Ping.output` to `Pong.input`. The
/// `output` of every `Pong` is wired to the `input` of the next
/// assembly's `Ping` with a 2s link.
#[must_use]
pub fn relay_ring(num: u32, repeats: u64) -> TopologyDef {
    let ping = |i: u32| format!("PingPong{i}.Ping");
    let pong = |i: u32| format!("PingPong{i}.Pong");

    let mut topo = TopologyDef::new();
    for i in 0..num {
        topo.add_component(ping(i), Role::Initiator.type_name(), i, [("model", repeats)])
            .add_component(pong(i), Role::Responder.type_name(), i, Vec::<(&str, u64)>::new())
            .add_link(
                format!("PingPong{i}.link"),
                1.0,
                Endpoint::new(ping(i), "output"),
                Endpoint::new(pong(i), "input"),
            );
    }
    for i in 0..num {
        topo.add_link(
            format!("ring{i}"),
            2.0,
            Endpoint::new(pong(i), "output"),
            Endpoint::new(ping((i + 1) % num), "input"),
        );
    }
    topo
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_wiring() {
        let topo = relay_chain(&[(Role::Initiator, 0), (Role::Responder, 1)], 1);
        assert_eq!(topo.components[0].name, "Ping0");
        assert_eq!(topo.components[1].name, "Pong1");
        assert_eq!(topo.components[1].rank, 1);
        assert!(topo.components[1].params.is_empty());
        assert_eq!(topo.links[0].ends[0].to_string(), "Ping0.output");
        assert_eq!(topo.links[1].ends[1].to_string(), "Ping0.input");
    }

    #[test]
    fn ring_wiring() {
        let topo = relay_ring(3, 5);
        assert_eq!(topo.components.len(), 6);
        assert_eq!(topo.links.len(), 6);
        assert_eq!(topo.components[4].name, "PingPong2.Ping");
        assert_eq!(topo.components[4].rank, 2);

        let last = &topo.links[5];
        assert_eq!(last.latency, 2.0);
        assert_eq!(last.ends[0].to_string(), "PingPong2.Pong.output");
        assert_eq!(last.ends[1].to_string(), "PingPong0.Ping.input");
    }
}
