//! Central primitives for running a discrete event simulation.
//!
//! A [`Simulation`] is created from a [`TopologyDef`](crate::net::TopologyDef)
//! by a [`Builder`]. It owns one runtime per rank, each with its own
//! future event set, and drives them to completion in [`Simulation::run`].

mod builder;
mod error;
mod event_set;
mod limit;
mod par;
mod voter;

pub use self::builder::*;
pub use self::error::*;
pub use self::limit::*;
pub use self::voter::*;

pub(crate) use self::event_set::*;
pub use self::par::RankPanicked;
pub(crate) use self::par::RemoteEvent;

use std::{any::Any, fmt::Display, sync::Arc};

use tracing::{error, info_span, trace};

use crate::net::{
    Component, ComponentId, Context, Event, Link, LinkStats, PortBinding, PortDescriptor,
    PortId, PortMode, ProtocolViolation, Rank,
};
use crate::time::SimTime;

pub(crate) struct ComponentSlot {
    pub(crate) name: String,
    pub(crate) component: Box<dyn Component>,
    pub(crate) declared: &'static [PortDescriptor],
    pub(crate) ports: Vec<Option<PortBinding>>,
}

impl ComponentSlot {
    fn port_name(&self, port: PortId) -> String {
        self.declared
            .get(port.0)
            .map_or_else(|| format!("#{}", port.0), |p| p.name.to_string())
    }
}

/// The outcome of a call to [`Runtime::dispatch_until`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Dispatch {
    /// No events are left before the requested bound.
    Idle,
    /// All voting participants of this rank are ready.
    Voted,
    /// The next event would exceed the runtime limit.
    LimitReached,
}

///
/// The event loop of a single rank.
///
/// A runtime owns the components of its rank and delivers the events
/// addressed to them in order of (time, schedule order). Events for
/// components on other ranks are collected and must be forwarded by
/// the caller.
///
pub(crate) struct Runtime {
    rank: Rank,
    slots: Vec<Option<ComponentSlot>>,
    links: Arc<[Link]>,
    stats: Vec<LinkStats>,

    future_event_set: FutureEventSet,
    remote: Vec<RemoteEvent>,
    outbox: Vec<(PortId, Event)>,
    remote_seq: u64,

    tally: Arc<VoteTally>,
    limit: RuntimeLimit,
    itr: usize,
    last_event_time: SimTime,
}

impl Runtime {
    pub(crate) fn new(
        rank: Rank,
        slots: Vec<Option<ComponentSlot>>,
        links: Arc<[Link]>,
        tally: Arc<VoteTally>,
        limit: RuntimeLimit,
    ) -> Self {
        let stats = links.iter().map(|l| LinkStats::new(l.name())).collect();
        Self {
            rank,
            slots,
            links,
            stats,

            future_event_set: FutureEventSet::new(),
            remote: Vec::new(),
            outbox: Vec::new(),
            remote_seq: 0,

            tally,
            limit,
            itr: 0,
            last_event_time: SimTime::ZERO,
        }
    }

    pub(crate) fn rank(&self) -> Rank {
        self.rank
    }

    pub(crate) fn tally(&self) -> &VoteTally {
        &self.tally
    }

    pub(crate) fn num_events_dispatched(&self) -> usize {
        self.itr
    }

    pub(crate) fn num_events_pending(&self) -> usize {
        self.future_event_set.len()
    }

    pub(crate) fn next_event_time(&self) -> Option<SimTime> {
        self.future_event_set.peek_time()
    }

    pub(crate) fn last_event_time(&self) -> SimTime {
        self.last_event_time
    }

    pub(crate) fn descriptor(&self) -> String {
        self.future_event_set.descriptor()
    }

    /// Calls the setup hook of every local component in registration order.
    pub(crate) fn start(&mut self) -> Result<(), RuntimeError> {
        SimTime::set_now(SimTime::ZERO);
        for idx in 0..self.slots.len() {
            let Some(slot) = self.slots[idx].as_mut() else {
                continue;
            };

            let span = info_span!("component", name = %slot.name, rank = %self.rank);
            let _guard = span.enter();
            slot.component
                .setup(&mut Context::new(&slot.name, self.rank, &mut self.outbox));
            self.flush(ComponentId(idx))?;
        }
        Ok(())
    }

    /// Dispatches events scheduled strictly before `end`.
    ///
    /// If `stop_on_vote` is set, the loop returns right after the event in
    /// which the last voting participant of this rank became ready.
    pub(crate) fn dispatch_until(
        &mut self,
        end: Option<SimTime>,
        stop_on_vote: bool,
    ) -> Result<Dispatch, RuntimeError> {
        if stop_on_vote && self.tally.all_ready() {
            return Ok(Dispatch::Voted);
        }

        while let Some(time) = self.future_event_set.peek_time() {
            if end.is_some_and(|end| time >= end) {
                return Ok(Dispatch::Idle);
            }
            if self.limit.applies(self.itr + 1, time) {
                return Ok(Dispatch::LimitReached);
            }

            let Some(node) = self.future_event_set.fetch_next() else {
                break;
            };
            self.dispatch_event(node)?;

            if stop_on_vote && self.tally.all_ready() {
                return Ok(Dispatch::Voted);
            }
        }
        Ok(Dispatch::Idle)
    }

    /// Calls the finish hook of every local component. Sends issued
    /// from these hooks are discarded.
    pub(crate) fn finish(&mut self) {
        for slot in self.slots.iter_mut().flatten() {
            let span = info_span!("component", name = %slot.name, rank = %self.rank);
            let _guard = span.enter();
            slot.component
                .finish(&mut Context::new(&slot.name, self.rank, &mut self.outbox));
            if !self.outbox.is_empty() {
                trace!("discarding {} events sent after the end", self.outbox.len());
                self.outbox.clear();
            }
        }
    }

    /// Takes the events addressed to other ranks.
    pub(crate) fn take_remote(&mut self) -> Vec<RemoteEvent> {
        std::mem::take(&mut self.remote)
    }

    /// Schedules events that arrived from other ranks.
    ///
    /// Events are inserted ordered by (time, origin, send order), so the
    /// result does not depend on the order of arrival.
    pub(crate) fn receive(&mut self, mut events: Vec<RemoteEvent>) {
        events.sort_by_key(|e| (e.time, e.origin, e.seq));
        for e in events {
            self.future_event_set.add(
                e.time,
                RuntimeEvent::Deliver {
                    link: e.link,
                    to: e.to,
                    event: e.event,
                },
            );
        }
    }

    /// Takes the components and link statistics out of a finished runtime.
    pub(crate) fn into_parts(self) -> (Vec<Option<ComponentSlot>>, Vec<LinkStats>) {
        (self.slots, self.stats)
    }

    fn dispatch_event(&mut self, node: EventNode) -> Result<(), RuntimeError> {
        self.itr += 1;

        SimTime::set_now(node.time);
        self.last_event_time = node.time;

        let RuntimeEvent::Deliver { link, to, event } = node.event;
        let end = self.links[link.0].end(to);
        let (component, port) = (end.component, end.port);

        let Some(slot) = self.slots[component.0].as_mut() else {
            return Err(RoutingError {
                link: self.links[link.0].name().to_string(),
                rank: self.rank,
            }
            .into());
        };
        self.stats[link.0].direction_mut(to.opposite()).delivered += 1;

        let span = info_span!("component", name = %slot.name, rank = %self.rank);
        let _guard = span.enter();

        let result = match slot.ports.get(port.0).and_then(Option::as_ref) {
            Some(binding) if binding.mode == PortMode::Duplex => slot.component.handle_event(
                &mut Context::new(&slot.name, self.rank, &mut self.outbox),
                port,
                event,
            ),
            _ => Err(ProtocolViolation::NoHandler {
                port: slot.port_name(port),
            }),
        };

        if let Err(violation) = result {
            error!("{violation}");
            self.outbox.clear();
            return Err(ComponentFault {
                component: slot.name.clone(),
                violation,
            }
            .into());
        }

        self.flush(component)
    }

    /// Hands the sends of the last hook over to the links.
    fn flush(&mut self, component: ComponentId) -> Result<(), RuntimeError> {
        if self.outbox.is_empty() {
            return Ok(());
        }
        let Some(slot) = self.slots[component.0].as_ref() else {
            return Ok(());
        };

        let now = SimTime::now();
        for (port, event) in self.outbox.drain(..) {
            let Some(binding) = slot.ports.get(port.0).and_then(Option::as_ref) else {
                error!("sent on port '{}' without configuring it", slot.port_name(port));
                return Err(ComponentFault {
                    component: slot.name.clone(),
                    violation: ProtocolViolation::UnconfiguredPort {
                        port: slot.port_name(port),
                    },
                }
                .into());
            };

            let link = &self.links[binding.link.0];
            let to = binding.side.opposite();
            let target = link.end(to);
            let time = now.saturating_add(link.latency());
            self.stats[link.id().0].direction_mut(binding.side).sent += 1;

            if target.rank == self.rank {
                self.future_event_set.add(
                    time,
                    RuntimeEvent::Deliver {
                        link: link.id(),
                        to,
                        event,
                    },
                );
            } else {
                self.remote.push(RemoteEvent {
                    target: target.rank,
                    origin: self.rank,
                    seq: self.remote_seq,
                    time,
                    link: link.id(),
                    to,
                    event,
                });
                self.remote_seq += 1;
            }
        }
        Ok(())
    }
}

/// The reason a simulation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Termination {
    /// Every voting participant signaled that it is ready.
    AllVotersReady,
    /// No events were left on any rank.
    EventsExhausted,
    /// The configured [`RuntimeLimit`] was reached.
    LimitReached,
}

impl Display for Termination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AllVotersReady => write!(f, "all voters ready"),
            Self::EventsExhausted => write!(f, "events exhausted"),
            Self::LimitReached => write!(f, "limit reached"),
        }
    }
}

/// The state of a single rank after the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankReport {
    /// The rank.
    pub rank: Rank,
    /// The number of events dispatched on this rank.
    pub events: usize,
    /// The number of events left undispatched.
    pub pending: usize,
    /// The time of the last event dispatched on this rank.
    pub end_time: SimTime,
    /// Registered voting participants.
    pub participants: usize,
    /// Participants that signaled readiness.
    pub ready: usize,
}

/// The result of a simulation run.
pub struct SimReport {
    /// The time of the last dispatched event.
    pub end_time: SimTime,
    /// Why the run ended.
    pub reason: Termination,
    /// The total number of dispatched events.
    pub events: usize,
    /// Per rank results, ordered by rank.
    pub ranks: Vec<RankReport>,
    /// Per link statistics, merged across ranks.
    pub links: Vec<LinkStats>,
    components: Vec<(String, Box<dyn Component>)>,
}

impl SimReport {
    /// The finished component with the given name, if it is of type `T`.
    #[must_use]
    pub fn component<T: Any>(&self, name: &str) -> Option<&T> {
        self.components
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, c)| c.as_any().downcast_ref())
    }

    /// The names of all components, in registration order.
    pub fn component_names(&self) -> impl Iterator<Item = &str> {
        self.components.iter().map(|(n, _)| n.as_str())
    }

    /// The statistics of the link with the given name.
    #[must_use]
    pub fn link(&self, name: &str) -> Option<&LinkStats> {
        self.links.iter().find(|l| l.name == name)
    }

    /// The total number of events handed to links.
    #[must_use]
    pub fn messages_sent(&self) -> usize {
        self.links.iter().map(LinkStats::total_sent).sum()
    }

    /// The total number of events handed to components.
    #[must_use]
    pub fn messages_delivered(&self) -> usize {
        self.links.iter().map(LinkStats::total_delivered).sum()
    }
}

impl std::fmt::Debug for SimReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimReport")
            .field("end_time", &self.end_time)
            .field("reason", &self.reason)
            .field("events", &self.events)
            .field("ranks", &self.ranks)
            .field("links", &self.links)
            .finish_non_exhaustive()
    }
}

///
/// A fully configured simulation, ready to run.
///
/// # Examples
///
/// ```
/// use pingpong::prelude::*;
///
/// let topo = pingpong::architecture::simple_loop(2);
/// let sim = Builder::new()
///     .quiet()
///     .build(&topo, &ElementRegistry::with_builtin())
///     .unwrap();
///
/// let report = sim.run().unwrap();
/// assert_eq!(report.reason, Termination::AllVotersReady);
/// assert_eq!(report.messages_sent(), 4);
/// ```
pub struct Simulation {
    runtimes: Vec<Runtime>,
    lookahead: Option<crate::time::Duration>,
    limit: RuntimeLimit,
    quiet: bool,
}

impl Simulation {
    /// The ranks of this simulation, in ascending order.
    pub fn ranks(&self) -> impl Iterator<Item = Rank> + '_ {
        self.runtimes.iter().map(Runtime::rank)
    }

    /// The width of a synchronisation window, the smallest latency of
    /// all links between ranks.
    #[must_use]
    pub fn lookahead(&self) -> Option<crate::time::Duration> {
        self.lookahead
    }

    ///
    /// Runs the simulation until all voters agree, no events are left
    /// or the limit is reached.
    ///
    /// # Errors
    ///
    /// Returns an error if a component violated its protocol. A
    /// [`ComponentFault`] can be recovered with [`RuntimeError::downcast_ref`].
    ///
    pub fn run(mut self) -> Result<SimReport, RuntimeError> {
        if !self.quiet {
            println!("\u{23A1}");
            println!("\u{23A2} Simulation starting");
            println!(
                "\u{23A2}  Ranks := {} (lookahead {})",
                self.runtimes.len(),
                self.lookahead
                    .map_or_else(|| "none".to_string(), |l| format!("{l:?}"))
            );
            if let Some(rt) = self.runtimes.first() {
                println!("\u{23A2}  Executor := {}", rt.descriptor());
            }
            println!("\u{23A2}  Event limit := {}", self.limit);
            println!("\u{23A3}");
        }

        let reason = if self.runtimes.len() <= 1 {
            self.run_single()?
        } else {
            par::run_windowed(&mut self.runtimes, self.lookahead)?
        };

        Ok(self.report(reason))
    }

    fn run_single(&mut self) -> Result<Termination, RuntimeError> {
        let Some(rt) = self.runtimes.first_mut() else {
            return Ok(Termination::EventsExhausted);
        };

        rt.start()?;
        let reason = match rt.dispatch_until(None, true)? {
            Dispatch::Voted => Termination::AllVotersReady,
            Dispatch::Idle => Termination::EventsExhausted,
            Dispatch::LimitReached => Termination::LimitReached,
        };
        rt.finish();
        Ok(reason)
    }

    fn report(self, reason: Termination) -> SimReport {
        let mut ranks = Vec::with_capacity(self.runtimes.len());
        let mut links: Vec<LinkStats> = Vec::new();
        let mut slots: Vec<Option<ComponentSlot>> = Vec::new();

        for rt in self.runtimes {
            ranks.push(RankReport {
                rank: rt.rank(),
                events: rt.num_events_dispatched(),
                pending: rt.num_events_pending(),
                end_time: rt.last_event_time(),
                participants: rt.tally().participants(),
                ready: rt.tally().ready(),
            });

            let (rank_slots, rank_stats) = rt.into_parts();
            if links.is_empty() {
                links = rank_stats;
            } else {
                for (merged, stats) in links.iter_mut().zip(&rank_stats) {
                    merged.merge(stats);
                }
            }

            slots.resize_with(rank_slots.len(), || None);
            for (target, slot) in slots.iter_mut().zip(rank_slots) {
                if slot.is_some() {
                    *target = slot;
                }
            }
        }

        let end_time = ranks
            .iter()
            .map(|r| r.end_time)
            .max()
            .unwrap_or(SimTime::ZERO);
        let events = ranks.iter().map(|r| r.events).sum();

        if !self.quiet {
            println!("\u{23A1}");
            println!("\u{23A2} Simulation ended ({reason})");
            println!("\u{23A2}  Ended at event #{events} after {end_time}");
            println!("\u{23A3}");
        }

        SimReport {
            end_time,
            reason,
            events,
            ranks,
            links,
            components: slots
                .into_iter()
                .flatten()
                .map(|slot| (slot.name, slot.component))
                .collect(),
        }
    }
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("ranks", &self.runtimes.len())
            .field("lookahead", &self.lookahead)
            .field("limit", &self.limit)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runtimes_move_between_threads() {
        fn is_send<T: Send>() {}
        is_send::<Runtime>();
        is_send::<Simulation>();
    }

    #[test]
    fn termination_fmt() {
        assert_eq!(Termination::AllVotersReady.to_string(), "all voters ready");
        assert_eq!(Termination::LimitReached.to_string(), "limit reached");
    }
}
