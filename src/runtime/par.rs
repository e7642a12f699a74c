//! Conservative parallel execution of several ranks.
//!
//! Every rank runs on its own thread. Time advances in windows whose width
//! is the smallest latency of any link between two ranks, so an event sent
//! to another rank during a window can never be due within that window.
//! Between two windows all ranks meet at a barrier, exchange the events
//! addressed to each other and publish their status. Every rank then
//! derives the same decision from the published status.

use std::{
    panic::{self, AssertUnwindSafe},
    sync::{
        mpsc::{self, Receiver, Sender},
        Barrier,
    },
    thread,
};

use fxhash::FxHashMap;
use spin::Mutex;
use tracing::{debug, trace};

use super::{Dispatch, Runtime, RuntimeError, Termination};
use crate::net::{Event, LinkId, Rank, Side};
use crate::time::{Duration, SimTime};

/// An event travelling between two ranks. Only the event itself
/// crosses the boundary.
#[derive(Debug)]
pub(crate) struct RemoteEvent {
    pub(crate) target: Rank,
    pub(crate) origin: Rank,
    pub(crate) seq: u64,
    pub(crate) time: SimTime,
    pub(crate) link: LinkId,
    pub(crate) to: Side,
    pub(crate) event: Event,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct RankStatus {
    next_event: Option<SimTime>,
    participants: usize,
    ready: usize,
    failed: bool,
    limit_hit: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decision {
    Continue(SimTime),
    Stop(Termination),
    Abort,
}

fn decide(status: &[RankStatus]) -> Decision {
    if status.iter().any(|s| s.failed) {
        return Decision::Abort;
    }

    let participants = status.iter().map(|s| s.participants).sum::<usize>();
    let ready = status.iter().map(|s| s.ready).sum::<usize>();
    if participants > 0 && ready == participants {
        return Decision::Stop(Termination::AllVotersReady);
    }

    let next = status.iter().filter_map(|s| s.next_event).min();
    let Some(next) = next else {
        return Decision::Stop(Termination::EventsExhausted);
    };

    if status.iter().any(|s| s.limit_hit) {
        return Decision::Stop(Termination::LimitReached);
    }

    Decision::Continue(next)
}

struct Shared<'a> {
    barrier: &'a Barrier,
    status: &'a [Mutex<RankStatus>],
    index: &'a FxHashMap<Rank, usize>,
    lookahead: Option<Duration>,
}

/// Runs all ranks to completion, one thread per rank.
pub(crate) fn run_windowed(
    runtimes: &mut [Runtime],
    lookahead: Option<Duration>,
) -> Result<Termination, RuntimeError> {
    let n = runtimes.len();
    let ranks = runtimes.iter().map(Runtime::rank).collect::<Vec<_>>();
    let index = runtimes
        .iter()
        .enumerate()
        .map(|(i, rt)| (rt.rank(), i))
        .collect::<FxHashMap<_, _>>();
    let (senders, receivers): (Vec<_>, Vec<_>) = (0..n).map(|_| mpsc::channel()).unzip();
    let barrier = Barrier::new(n);
    let status = (0..n)
        .map(|_| Mutex::new(RankStatus::default()))
        .collect::<Vec<_>>();

    let shared = Shared {
        barrier: &barrier,
        status: &status,
        index: &index,
        lookahead,
    };
    let dispatch = tracing::dispatcher::get_default(Clone::clone);

    let results = thread::scope(|s| {
        let handles = runtimes
            .iter_mut()
            .zip(receivers)
            .enumerate()
            .map(|(me, (rt, rx))| {
                let senders = senders.clone();
                let shared = &shared;
                let dispatch = &dispatch;
                s.spawn(move || {
                    tracing::dispatcher::with_default(dispatch, || {
                        rank_main(me, rt, &rx, &senders, shared)
                    })
                })
            })
            .collect::<Vec<_>>();

        handles
            .into_iter()
            .enumerate()
            .map(|(me, handle)| {
                handle.join().unwrap_or_else(|payload| {
                    Err(RankPanicked {
                        rank: ranks[me],
                        message: panic_message(payload.as_ref()),
                    }
                    .into())
                })
            })
            .collect::<Vec<_>>()
    });

    let mut reason = None;
    let mut peer_abort = None;
    for result in results {
        match result {
            Ok(r) => reason = Some(r),
            Err(e) if e.downcast_ref::<PeerAborted>().is_some() => peer_abort = Some(e),
            Err(e) => return Err(e),
        }
    }

    match (reason, peer_abort) {
        (_, Some(e)) => Err(e),
        (Some(reason), None) => Ok(reason),
        (None, None) => Ok(Termination::EventsExhausted),
    }
}

fn rank_main(
    me: usize,
    rt: &mut Runtime,
    rx: &Receiver<RemoteEvent>,
    senders: &[Sender<RemoteEvent>],
    shared: &Shared<'_>,
) -> Result<Termination, RuntimeError> {
    let rank = rt.rank();
    let mut failure = guarded(rank, || rt.start()).err();
    let mut start = SimTime::ZERO;
    let mut round = 0usize;

    let decision = loop {
        let mut limit_hit = false;
        if failure.is_none() {
            let end = shared.lookahead.map(|l| start.saturating_add(l));
            // without links between ranks, every rank runs on its own
            let stop_on_vote = end.is_none() && round == 0;
            trace!(%rank, "window {start} .. {}", end.unwrap_or(SimTime::MAX));

            match guarded(rank, || rt.dispatch_until(end, stop_on_vote)) {
                Ok(Dispatch::LimitReached) => limit_hit = true,
                Ok(_) => {}
                Err(e) => failure = Some(e),
            }
        }
        if failure.is_none() {
            if let Err(e) = forward(rt.take_remote(), senders, shared.index) {
                failure = Some(e);
            }
        }
        shared.barrier.wait();

        rt.receive(rx.try_iter().collect());
        *shared.status[me].lock() = RankStatus {
            next_event: rt.next_event_time(),
            participants: rt.tally().participants(),
            ready: rt.tally().ready(),
            failed: failure.is_some(),
            limit_hit,
        };
        shared.barrier.wait();

        let status = shared
            .status
            .iter()
            .map(|s| *s.lock())
            .collect::<Vec<_>>();
        match decide(&status) {
            Decision::Continue(next) => start = next,
            decision => break decision,
        }
        round += 1;
    };

    match decision {
        Decision::Stop(reason) => {
            debug!(%rank, "stopping after {round} windows: {reason}");
            guarded(rank, || {
                rt.finish();
                Ok(())
            })?;
            Ok(reason)
        }
        _ => Err(failure.unwrap_or_else(|| PeerAborted(rank).into())),
    }
}

fn forward(
    events: Vec<RemoteEvent>,
    senders: &[Sender<RemoteEvent>],
    index: &FxHashMap<Rank, usize>,
) -> Result<(), RuntimeError> {
    for event in events {
        let target = *index.get(&event.target).ok_or(UnknownRank(event.target))?;
        senders[target].send(event)?;
    }
    Ok(())
}

fn guarded<T>(
    rank: Rank,
    f: impl FnOnce() -> Result<T, RuntimeError>,
) -> Result<T, RuntimeError> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => Err(RankPanicked {
            rank,
            message: panic_message(payload.as_ref()),
        }
        .into()),
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// A component panicked while running on a rank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankPanicked {
    /// The rank that panicked.
    pub rank: Rank,
    /// The panic message.
    pub message: String,
}

impl std::fmt::Display for RankPanicked {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "rank {} panicked: {}", self.rank, self.message)
    }
}

impl std::error::Error for RankPanicked {}

/// Another rank failed, so this rank stopped as well.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PeerAborted(Rank);

impl std::fmt::Display for PeerAborted {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "rank {} stopped because a peer aborted", self.0)
    }
}

impl std::error::Error for PeerAborted {}

/// An event was addressed to a rank that does not exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct UnknownRank(Rank);

impl std::fmt::Display for UnknownRank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "event addressed to unknown rank {}", self.0)
    }
}

impl std::error::Error for UnknownRank {}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(next: Option<f64>, participants: usize, ready: usize) -> RankStatus {
        RankStatus {
            next_event: next.map(SimTime::from),
            participants,
            ready,
            ..Default::default()
        }
    }

    #[test]
    fn continue_at_earliest_event() {
        let s = [status(Some(4.0), 1, 0), status(Some(2.0), 0, 0), status(None, 0, 0)];
        assert_eq!(decide(&s), Decision::Continue(2.0.into()));
    }

    #[test]
    fn votes_are_summed_over_ranks() {
        let s = [status(Some(4.0), 1, 1), status(Some(2.0), 1, 0)];
        assert_eq!(decide(&s), Decision::Continue(2.0.into()));

        let s = [status(Some(4.0), 1, 1), status(Some(2.0), 1, 1)];
        assert_eq!(decide(&s), Decision::Stop(Termination::AllVotersReady));
    }

    #[test]
    fn stop_reasons() {
        let s = [status(None, 1, 0), status(None, 0, 0)];
        assert_eq!(decide(&s), Decision::Stop(Termination::EventsExhausted));

        let mut s = [status(Some(1.0), 0, 0), status(None, 0, 0)];
        s[1].limit_hit = true;
        assert_eq!(decide(&s), Decision::Stop(Termination::LimitReached));

        s[0].failed = true;
        assert_eq!(decide(&s), Decision::Abort);
    }

    #[test]
    fn panic_messages() {
        let payload: Box<dyn std::any::Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn std::any::Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
    }
}
