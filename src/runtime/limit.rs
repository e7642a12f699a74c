use crate::time::SimTime;
use std::{fmt::Display, mem};

///
/// A composed limit that stops the event execution of
/// a simulation before it ends on its own.
///
/// In runs with several ranks, event counts are checked against the
/// events dispatched by each rank on its own.
///
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RuntimeLimit {
    /// An unbounded run, that only ends once all voters agree or
    /// no events are left.
    #[default]
    None,

    /// A bound on the number of dispatched events.
    /// Exactly this many events are dispatched before the run stops.
    EventCount(usize),

    /// A bound on the simulation time. Events scheduled after
    /// this point in time are never dispatched.
    SimTime(SimTime),

    /// Stops only when both limits apply.
    CombinedAnd(Box<RuntimeLimit>, Box<RuntimeLimit>),

    /// Stops when either limit applies.
    CombinedOr(Box<RuntimeLimit>, Box<RuntimeLimit>),
}

impl RuntimeLimit {
    /// Whether dispatching event number `itr_count` at `time` would
    /// exceed the limit.
    pub(crate) fn applies(&self, itr_count: usize, time: SimTime) -> bool {
        match self {
            Self::None => false,

            Self::EventCount(e) => itr_count > *e,
            Self::SimTime(t) => time > *t,

            Self::CombinedAnd(lhs, rhs) => {
                lhs.applies(itr_count, time) && rhs.applies(itr_count, time)
            }
            Self::CombinedOr(lhs, rhs) => {
                lhs.applies(itr_count, time) || rhs.applies(itr_count, time)
            }
        }
    }

    /// Adds another limit, stopping when either applies.
    pub(crate) fn add(&mut self, limit: RuntimeLimit) {
        match (&*self, &limit) {
            (_, Self::None) => {}
            (Self::None, _) => *self = limit,
            _ => {
                let prev = mem::take(self);
                *self = Self::CombinedOr(Box::new(prev), Box::new(limit));
            }
        }
    }
}

impl Display for RuntimeLimit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "None"),

            Self::EventCount(e) => write!(f, "MaxEventCount({e})"),
            Self::SimTime(t) => write!(f, "MaxSimTime({t})"),

            Self::CombinedAnd(lhs, rhs) => write!(f, "{lhs} and {rhs}"),
            Self::CombinedOr(lhs, rhs) => write!(f, "{lhs} or {rhs}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_count_is_inclusive() {
        let limit = RuntimeLimit::EventCount(4);
        assert_eq!(limit.to_string(), "MaxEventCount(4)");
        assert!(!limit.applies(4, 1.0.into()));
        assert!(limit.applies(5, 1.0.into()));
        assert!(!RuntimeLimit::None.applies(usize::MAX, SimTime::MAX));
    }

    #[test]
    fn sim_time_allows_events_at_the_bound() {
        let limit = RuntimeLimit::SimTime(3.0.into());
        assert_eq!(limit.to_string(), "MaxSimTime(3s)");
        assert!(!limit.applies(0, 3.0.into()));
        assert!(limit.applies(0, 3.5.into()));
    }

    #[test]
    fn combine() {
        use RuntimeLimit::*;

        let and = CombinedAnd(Box::new(EventCount(10)), Box::new(SimTime(2.0.into())));
        assert_eq!(and.to_string(), "MaxEventCount(10) and MaxSimTime(2s)");
        assert!(!and.applies(11, 1.0.into()));
        assert!(and.applies(11, 4.0.into()));

        let mut limit = None;
        limit.add(None);
        assert_eq!(limit, None);
        limit.add(EventCount(10));
        assert_eq!(limit, EventCount(10));
        limit.add(SimTime(2.0.into()));
        assert_eq!(
            limit,
            CombinedOr(Box::new(EventCount(10)), Box::new(SimTime(2.0.into())))
        );
        assert!(limit.applies(1, 4.0.into()));
        assert!(limit.applies(11, 1.0.into()));
        assert!(!limit.applies(10, 2.0.into()));
    }
}
