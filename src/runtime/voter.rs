use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use tracing::{debug, warn};

///
/// The votes collected on one rank.
///
/// The runtime of a rank reads the tally after every event (and at every
/// synchronisation point in parallel runs) to decide whether the
/// simulation may end.
///
#[derive(Debug, Default)]
pub struct VoteTally {
    participants: AtomicUsize,
    ready: AtomicUsize,
}

impl VoteTally {
    /// Creates an empty tally.
    #[must_use]
    pub fn new() -> Arc<VoteTally> {
        Arc::new(VoteTally::default())
    }

    /// The number of registered voting participants.
    #[must_use]
    pub fn participants(&self) -> usize {
        self.participants.load(Ordering::SeqCst)
    }

    /// The number of participants that agreed to end the simulation.
    #[must_use]
    pub fn ready(&self) -> usize {
        self.ready.load(Ordering::SeqCst)
    }

    /// Whether at least one participant exists and all of them are ready.
    #[must_use]
    pub fn all_ready(&self) -> bool {
        let participants = self.participants();
        participants > 0 && self.ready() == participants
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum VoterState {
    Unregistered,
    Voting,
    Ready,
}

///
/// The vote of a single component on the end of the simulation.
///
/// A component that owns a voter and marks it as a participant
/// prevents the simulation from ending until it signals that it is
/// ready. Signals are one-shot: repeated calls have no further effect.
///
#[derive(Debug)]
pub struct TerminationVoter {
    tally: Arc<VoteTally>,
    state: VoterState,
}

impl TerminationVoter {
    pub(crate) fn new(tally: Arc<VoteTally>) -> Self {
        Self {
            tally,
            state: VoterState::Unregistered,
        }
    }

    /// Registers the owner as a component that must agree before
    /// the simulation ends.
    pub fn mark_as_voting_participant(&mut self) {
        if self.state == VoterState::Unregistered {
            self.tally.participants.fetch_add(1, Ordering::SeqCst);
            self.state = VoterState::Voting;
        }
    }

    /// Signals that the owner no longer objects to ending the simulation.
    pub fn signal_ready(&mut self) {
        match self.state {
            VoterState::Voting => {
                self.tally.ready.fetch_add(1, Ordering::SeqCst);
                self.state = VoterState::Ready;
                debug!("vote cast, ready to end the simulation");
            }
            VoterState::Ready => {}
            VoterState::Unregistered => {
                warn!("ignoring termination signal of a component that is not a voting participant");
            }
        }
    }

    /// Whether this voter is a registered participant.
    #[must_use]
    pub fn is_participant(&self) -> bool {
        self.state != VoterState::Unregistered
    }

    /// Whether this voter has signaled readiness.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.state == VoterState::Ready
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_shot_signal() {
        let tally = VoteTally::new();
        let mut voter = TerminationVoter::new(tally.clone());
        voter.mark_as_voting_participant();
        voter.mark_as_voting_participant();
        assert_eq!(tally.participants(), 1);
        assert!(!tally.all_ready());

        voter.signal_ready();
        voter.signal_ready();
        assert!(voter.is_ready());
        assert_eq!(tally.ready(), 1);
        assert!(tally.all_ready());
    }

    #[test]
    fn unregistered_signal_is_ignored() {
        let tally = VoteTally::new();
        let mut voter = TerminationVoter::new(tally.clone());
        voter.signal_ready();
        assert!(!voter.is_ready());
        assert!(!voter.is_participant());
        assert_eq!(tally.ready(), 0);
        assert!(!tally.all_ready());
    }

    #[test]
    fn all_participants_must_agree() {
        let tally = VoteTally::new();
        let mut a = TerminationVoter::new(tally.clone());
        let mut b = TerminationVoter::new(tally.clone());
        a.mark_as_voting_participant();
        b.mark_as_voting_participant();

        a.signal_ready();
        assert!(!tally.all_ready());
        b.signal_ready();
        assert!(tally.all_ready());
    }
}
