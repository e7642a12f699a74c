//!
//! Two discrete event simulation components playing ping pong.
//!
//! An initiator ([`Ping`](crate::pingpong::Ping)) and a responder
//! ([`Pong`](crate::pingpong::Pong)) exchange string messages over links
//! with a fixed latency. The initiator counts the messages it receives and,
//! once its configured limit is reached, votes to end the simulation
//! instead of answering.
//!
//! # Modules
//!
//! - [`net`] holds the component API, links, parameters, the element
//!   registry and topology definitions.
//! - [`runtime`] holds the event loop, termination voting and the
//!   rank-parallel executor.
//! - [`pingpong`] holds the components and ready made topologies.
//! - [`tracing`] formats log output with simulation time.
//!
//! # Example
//!
//! ```
//! use pingpong::prelude::*;
//! use pingpong::architecture::{relay_chain, Role};
//!
//! let topo = relay_chain(&[(Role::Initiator, 0), (Role::Responder, 1)], 1);
//! let report = Builder::new()
//!     .quiet()
//!     .build(&topo, &ElementRegistry::with_builtin())
//!     .unwrap()
//!     .run()
//!     .unwrap();
//!
//! let ping = report.component::<Ping>("Ping0").unwrap();
//! assert_eq!(ping.last_payload(), Some("Ping0-Pong1"));
//! assert_eq!(report.end_time, SimTime::from(2.0));
//! ```
#![warn(missing_docs, missing_debug_implementations)]

pub mod net;
pub mod pingpong;
pub mod prelude;
pub mod runtime;
pub mod time;
pub mod tracing;

pub use pingpong::architecture;
