use pingpong::architecture::{relay_chain, relay_ring, Role};
use pingpong::prelude::*;

fn run(topo: &TopologyDef) -> SimReport {
    Builder::new()
        .quiet()
        .build(topo, &ElementRegistry::with_builtin())
        .unwrap()
        .run()
        .unwrap()
}

#[test]
fn chain_over_two_ranks() {
    let topo = relay_chain(&[(Role::Initiator, 0), (Role::Responder, 1)], 3);
    let sim = Simulation::new(&topo, &ElementRegistry::with_builtin()).unwrap();
    assert_eq!(sim.ranks().count(), 2);
    assert_eq!(sim.lookahead(), Some(Duration::from_secs(1)));

    let report = Builder::new()
        .quiet()
        .build(&topo, &ElementRegistry::with_builtin())
        .unwrap()
        .run()
        .unwrap();
    assert_eq!(report.reason, Termination::AllVotersReady);

    let ping = report.component::<Ping>("Ping0").unwrap();
    assert_eq!(
        ping.last_payload(),
        Some("Ping0-Pong1-Ping0-Pong1-Ping0-Pong1")
    );
    assert_eq!(ping.round_count(), 3);
    assert_eq!(report.end_time, SimTime::from(6.0));
    assert_eq!(report.messages_sent(), report.messages_delivered());
}

#[test]
fn ring_ends_when_every_rank_voted() {
    let report = run(&relay_ring(2, 5));
    assert_eq!(report.reason, Termination::AllVotersReady);
    assert_eq!(report.ranks.len(), 2);

    for rank in &report.ranks {
        assert_eq!(rank.participants, 1);
        assert_eq!(rank.ready, 1);
    }
    for i in 0..2 {
        let ping = report
            .component::<Ping>(&format!("PingPong{i}.Ping"))
            .unwrap();
        assert_eq!(ping.round_count(), 5);
        assert!(ping.is_ready());
    }
    assert_eq!(report.end_time, SimTime::from(15.0));
}

#[test]
fn ring_payload_crosses_ranks() {
    let report = run(&relay_ring(3, 1));
    let ping = report.component::<Ping>("PingPong1.Ping").unwrap();
    assert_eq!(ping.last_payload(), Some("Ping0-Pong0"));
    let ping = report.component::<Ping>("PingPong0.Ping").unwrap();
    assert_eq!(ping.last_payload(), Some("Ping2-Pong2"));
}

#[test]
fn ring_is_deterministic() {
    let a = run(&relay_ring(4, 3));
    let b = run(&relay_ring(4, 3));
    assert_eq!(a.events, b.events);
    assert_eq!(a.end_time, b.end_time);
    for i in 0..4 {
        let name = format!("PingPong{i}.Ping");
        assert_eq!(
            a.component::<Ping>(&name).unwrap().last_payload(),
            b.component::<Ping>(&name).unwrap().last_payload()
        );
    }
}

#[test]
fn single_rank_ring_matches_chain() {
    let report = run(&relay_ring(1, 2));
    assert_eq!(report.ranks.len(), 1);
    let ping = report.component::<Ping>("PingPong0.Ping").unwrap();
    assert_eq!(ping.last_payload(), Some("Ping0-Pong0-Ping0-Pong0"));
    assert_eq!(report.end_time, SimTime::from(6.0));
}
