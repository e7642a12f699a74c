use pingpong::architecture::{relay_chain, simple_loop, Role};
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
fn two_rounds() {
    let report = run(&simple_loop(2));
    assert_eq!(report.reason, Termination::AllVotersReady);
    assert_eq!(report.messages_sent(), 4);
    assert_eq!(report.end_time, SimTime::from(4.0));

    let ping = report.component::<Ping>("ping").unwrap();
    assert_eq!(ping.round_count(), 2);
    assert_eq!(ping.messages_sent(), 2);
    assert!(ping.is_ready());
    assert_eq!(ping.last_payload(), Some("pong"));

    let pong = report.component::<Pong>("pong").unwrap();
    assert_eq!(pong.messages_received(), 2);
    assert_eq!(pong.messages_sent(), 2);
    assert_eq!(pong.last_payload(), Some("ping"));
}

#[test]
fn zero_rounds_still_exchanges_once() {
    let report = run(&simple_loop(0));
    assert_eq!(report.reason, Termination::AllVotersReady);
    assert_eq!(report.messages_sent(), 2);
    assert_eq!(report.end_time, SimTime::from(2.0));

    let ping = report.component::<Ping>("ping").unwrap();
    assert_eq!(ping.messages_received(), 1);
    assert_eq!(ping.round_count(), 1);
}

#[test]
fn one_relay_round_across_ranks() {
    let topo = relay_chain(&[(Role::Initiator, 0), (Role::Responder, 1)], 1);
    let report = run(&topo);
    assert_eq!(report.reason, Termination::AllVotersReady);
    assert_eq!(report.ranks.len(), 2);
    assert_eq!(report.end_time, SimTime::from(2.0));

    let ping = report.component::<Ping>("Ping0").unwrap();
    assert_eq!(ping.last_payload(), Some("Ping0-Pong1"));
    let pong = report.component::<Pong>("Pong1").unwrap();
    assert_eq!(pong.last_payload(), Some("Ping0"));
}

#[test]
fn round_count_never_exceeds_limit() {
    for n in 0..=12u64 {
        let report = run(&simple_loop(n));
        let ping = report.component::<Ping>("ping").unwrap();
        assert_eq!(ping.round_count(), n.max(1), "model = {n}");
        assert_eq!(ping.messages_received() as u64, n.max(1));
        assert_eq!(report.messages_sent() as u64, 2 * n.max(1));
        assert_eq!(report.end_time, SimTime::from(2.0 * n.max(1) as f64));
    }
}

#[test]
fn sent_messages_are_delivered() {
    let report = run(&simple_loop(7));
    assert_eq!(report.messages_sent(), report.messages_delivered());

    let link = report.link("ping_pong").unwrap();
    assert_eq!(link.a_to_b.sent, 7);
    assert_eq!(link.b_to_a.sent, 7);
    assert_eq!(link.a_to_b.in_flight(), 0);
    assert_eq!(link.total_delivered(), 14);
}

#[test]
fn relay_payload_records_route() {
    let topo = relay_chain(&[(Role::Initiator, 0), (Role::Responder, 0)], 4);
    let report = run(&topo);
    let ping = report.component::<Ping>("Ping0").unwrap();
    assert_eq!(
        ping.last_payload(),
        Some("Ping0-Pong0-Ping0-Pong0-Ping0-Pong0-Ping0-Pong0")
    );
    assert_eq!(report.end_time, SimTime::from(8.0));
}

#[test]
fn time_limit_stops_early() {
    let report = Builder::new()
        .quiet()
        .max_time(SimTime::from(4.5))
        .build(&simple_loop(100), &ElementRegistry::with_builtin())
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(report.reason, Termination::LimitReached);
    assert_eq!(report.end_time, SimTime::from(4.0));
    let ping = report.component::<Ping>("ping").unwrap();
    assert_eq!(ping.round_count(), 2);
    assert!(!ping.is_ready());
}

#[test]
fn event_limit_stops_early() {
    let report = Builder::new()
        .quiet()
        .max_itr(3)
        .build(&simple_loop(100), &ElementRegistry::with_builtin())
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(report.reason, Termination::LimitReached);
    assert_eq!(report.events, 3);
    assert_eq!(report.ranks[0].pending, 1);
}

#[test]
fn pong_alone_exhausts_events() {
    let mut topo = TopologyDef::new();
    topo.add_component("a", "pingpong.Pong", 0, Vec::<(&str, u64)>::new())
        .add_component("b", "pingpong.Pong", 0, Vec::<(&str, u64)>::new())
        .add_link("ab", 1.0, Endpoint::new("a", "inout"), Endpoint::new("b", "inout"));

    let report = run(&topo);
    assert_eq!(report.reason, Termination::EventsExhausted);
    assert_eq!(report.events, 0);
    assert_eq!(report.ranks[0].participants, 0);
}
