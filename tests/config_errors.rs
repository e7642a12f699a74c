use pingpong::prelude::*;

fn build(topo: &TopologyDef) -> Result<Simulation, ConfigError> {
    Builder::new()
        .quiet()
        .build(topo, &ElementRegistry::with_builtin())
}

fn build_yaml(yaml: &str) -> Result<Simulation, ConfigError> {
    build(&TopologyDef::from_yaml_str(yaml)?)
}

#[test]
fn unlinked_ping_fails_to_configure() {
    let mut topo = TopologyDef::new();
    topo.add_component("ping", "pingpong.Ping", 0, [("model", 3)]);

    assert_eq!(
        build(&topo).unwrap_err(),
        ConfigError::UnboundPort {
            component: "ping".to_string(),
            port: "input".to_string()
        }
    );
}

#[test]
fn relay_without_output_fails() {
    let err = build_yaml(
        r#"
components:
  - name: a
    type: pingpong.Ping
  - name: b
    type: pingpong.Pong
links:
  - name: l
    ends: [b.output, a.input]
"#,
    )
    .unwrap_err();

    assert_eq!(
        err,
        ConfigError::UnboundPort {
            component: "a".to_string(),
            port: "output".to_string()
        }
    );
    assert_eq!(
        err.to_string(),
        "failed to configure port 'output' on component 'a'"
    );
}

#[test]
fn malformed_model() {
    let err = build_yaml(
        r#"
components:
  - name: ping
    type: pingpong.Ping
    params:
      model: abc
  - name: pong
    type: pingpong.Pong
links:
  - name: l
    ends: [ping.inout, pong.inout]
"#,
    )
    .unwrap_err();

    assert_eq!(
        err,
        ConfigError::InvalidParam {
            component: "ping".to_string(),
            key: "model".to_string(),
            value: "abc".to_string()
        }
    );
}

#[test]
fn negative_model() {
    let mut topo = TopologyDef::new();
    topo.add_component("ping", "pingpong.Ping", 0, [("model", -1)])
        .add_component("pong", "pingpong.Pong", 0, Vec::<(&str, u64)>::new())
        .add_link(
            "l",
            1.0,
            Endpoint::new("ping", "inout"),
            Endpoint::new("pong", "inout"),
        );

    assert!(matches!(
        build(&topo),
        Err(ConfigError::InvalidParam { ref key, .. }) if key == "model"
    ));
}

#[test]
fn unknown_type() {
    let err = build_yaml(
        r#"
components:
  - name: x
    type: pingpong.Pang
"#,
    )
    .unwrap_err();

    assert_eq!(
        err,
        ConfigError::UnknownComponentType {
            component: "x".to_string(),
            ty: "pingpong.Pang".to_string()
        }
    );
}

#[test]
fn zero_latency_between_ranks() {
    let err = build_yaml(
        r#"
components:
  - name: ping
    type: pingpong.Ping
  - name: pong
    type: pingpong.Pong
    rank: 1
links:
  - name: l
    latency: 0.0
    ends: [ping.inout, pong.inout]
"#,
    )
    .unwrap_err();
    assert_eq!(err, ConfigError::ZeroLatencyCrossRank("l".to_string()));
}

#[test]
fn zero_latency_on_one_rank_is_allowed() {
    let sim = build_yaml(
        r#"
components:
  - name: ping
    type: pingpong.Ping
    params:
      model: 3
  - name: pong
    type: pingpong.Pong
links:
  - name: l
    latency: 0.0
    ends: [ping.inout, pong.inout]
"#,
    )
    .unwrap();

    let report = sim.run().unwrap();
    assert_eq!(report.reason, Termination::AllVotersReady);
    assert_eq!(report.end_time, SimTime::ZERO);
    assert_eq!(report.messages_sent(), 6);
}

#[test]
fn invalid_yaml() {
    assert!(matches!(
        TopologyDef::from_yaml_str("components: [name: ]]"),
        Err(ConfigError::Parse(_))
    ));
    assert!(matches!(
        TopologyDef::from_yaml_str("links:\n  - name: l\n    ends: [a, b.c]\n"),
        Err(ConfigError::Parse(_))
    ));
}

#[test]
fn missing_file() {
    assert!(matches!(
        TopologyDef::from_yaml_file("does/not/exist.yml"),
        Err(ConfigError::Io(_))
    ));
}

#[test]
fn latency_beyond_representable_time() {
    let err = build_yaml(
        r#"
components:
  - name: ping
    type: pingpong.Ping
  - name: pong
    type: pingpong.Pong
links:
  - name: far
    latency: 1.0e20
    ends: [ping.inout, pong.inout]
"#,
    )
    .unwrap_err();

    assert_eq!(
        err,
        ConfigError::InvalidLatency {
            link: "far".to_string(),
            latency: 1.0e20f64.to_string()
        }
    );
    assert!(err.to_string().starts_with("link 'far' has invalid latency"));
}

#[test]
fn loop_and_relay_ports_together() {
    let err = build_yaml(
        r#"
components:
  - name: ping
    type: pingpong.Ping
  - name: pong
    type: pingpong.Pong
  - name: other
    type: pingpong.Pong
links:
  - name: loop
    ends: [ping.inout, pong.inout]
  - name: extra
    ends: [other.output, ping.input]
"#,
    )
    .unwrap_err();

    assert_eq!(
        err,
        ConfigError::ConflictingPort {
            component: "ping".to_string(),
            port: "input".to_string(),
            with: "inout".to_string()
        }
    );
    assert_eq!(
        err.to_string(),
        "port 'ping.input' is wired but cannot be used together with 'inout'"
    );
}
