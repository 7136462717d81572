//! Status decisions for deals.
//!
//! The evaluator is pure: it reads a deal and a [`ModeConfig`] snapshot and
//! says which transition, if any, is warranted. Applying it is a separate
//! step so callers control timestamps and event publication.

use super::{Mode, ModeConfig};
use crate::events::Event;
use crate::state::{Deal, DealStatus};
use chrono::{DateTime, Utc};

/// A one-way move out of `pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Promote,
    Verify,
    Reject,
}

impl Transition {
    /// Status the deal ends up in.
    pub fn status(&self) -> DealStatus {
        match self {
            Self::Promote => DealStatus::Promoted,
            Self::Verify => DealStatus::Verified,
            Self::Reject => DealStatus::Rejected,
        }
    }

    /// Whether alerts should be evaluated after this transition.
    pub fn is_success(&self) -> bool {
        self.status().is_success()
    }

    /// Move the deal to its new status and stamp the transition time.
    ///
    /// Returns false, leaving the deal untouched, if it already left `pending`.
    pub fn apply(&self, deal: &mut Deal, now: DateTime<Utc>) -> bool {
        if !deal.is_pending() {
            return false;
        }
        deal.status = self.status();
        match self {
            Self::Promote => deal.promoted_at = Some(now),
            Self::Verify => deal.verified_at = Some(now),
            Self::Reject => {}
        }
        true
    }

    /// Event announcing the transition.
    pub fn event(&self, deal: Deal) -> Event {
        match self {
            Self::Promote => Event::DealPromoted { deal },
            Self::Verify => Event::DealVerified { deal },
            Self::Reject => Event::DealRejected { deal },
        }
    }
}

/// Decides transitions against one configuration snapshot.
#[derive(Debug, Clone, Copy)]
pub struct Evaluator {
    config: ModeConfig,
}

impl Evaluator {
    pub fn new(config: ModeConfig) -> Self {
        Self { config }
    }

    /// Decision for the single delayed promotion check.
    pub fn on_promotion_check(&self, deal: &Deal) -> Option<Transition> {
        if self.config.mode != Mode::Centralized || !deal.is_pending() {
            return None;
        }
        (deal.votes >= self.config.promotion_threshold).then_some(Transition::Promote)
    }

    /// Decision after a verification was recorded.
    ///
    /// Valid consensus is checked before invalid consensus.
    pub fn on_verification(&self, deal: &Deal) -> Option<Transition> {
        if self.config.mode != Mode::Decentralized || !deal.is_pending() {
            return None;
        }
        let threshold = self.config.consensus_threshold;
        if deal.valid_count() >= threshold {
            Some(Transition::Verify)
        } else if deal.invalid_count() >= threshold {
            Some(Transition::Reject)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{DealDraft, DealState, Verdict};
    use rust_decimal_macros::dec;
    use std::time::Duration;

    fn config(mode: Mode) -> ModeConfig {
        ModeConfig {
            mode,
            promotion_threshold: 5,
            consensus_threshold: 3,
            promotion_delay: Duration::from_secs(30),
        }
    }

    fn pending_deal(state: &mut DealState) -> String {
        state
            .insert(
                DealDraft {
                    title: "RTX 4080".to_string(),
                    price: Some(dec!(650)),
                    original_price: None,
                    url: "https://shop.example/rtx".to_string(),
                    category: "Electronics".to_string(),
                    submitter_id: "alice".to_string(),
                },
                Utc::now(),
            )
            .unwrap()
            .id
    }

    fn verify(state: &mut DealState, deal_id: &str, verdicts: &[Verdict]) {
        for (i, verdict) in verdicts.iter().enumerate() {
            state
                .add_verification(deal_id, &format!("verifier_{}", i), *verdict, None, Utc::now())
                .unwrap();
        }
    }

    #[test]
    fn test_three_valid_verifies() {
        let mut state = DealState::default();
        let id = pending_deal(&mut state);
        verify(&mut state, &id, &[Verdict::Valid; 3]);

        let evaluator = Evaluator::new(config(Mode::Decentralized));
        assert_eq!(
            evaluator.on_verification(state.get(&id).unwrap()),
            Some(Transition::Verify)
        );
    }

    #[test]
    fn test_three_invalid_two_valid_rejects() {
        let mut state = DealState::default();
        let id = pending_deal(&mut state);
        verify(
            &mut state,
            &id,
            &[
                Verdict::Invalid,
                Verdict::Valid,
                Verdict::Invalid,
                Verdict::Valid,
                Verdict::Invalid,
            ],
        );

        let evaluator = Evaluator::new(config(Mode::Decentralized));
        assert_eq!(
            evaluator.on_verification(state.get(&id).unwrap()),
            Some(Transition::Reject)
        );
    }

    #[test]
    fn test_valid_consensus_checked_first() {
        let mut state = DealState::default();
        let id = pending_deal(&mut state);
        verify(
            &mut state,
            &id,
            &[
                Verdict::Invalid,
                Verdict::Invalid,
                Verdict::Invalid,
                Verdict::Valid,
                Verdict::Valid,
                Verdict::Valid,
            ],
        );

        let evaluator = Evaluator::new(config(Mode::Decentralized));
        assert_eq!(
            evaluator.on_verification(state.get(&id).unwrap()),
            Some(Transition::Verify)
        );
    }

    #[test]
    fn test_sub_threshold_stays_pending() {
        let mut state = DealState::default();
        let id = pending_deal(&mut state);
        verify(&mut state, &id, &[Verdict::Valid, Verdict::Invalid, Verdict::Valid]);

        let evaluator = Evaluator::new(config(Mode::Decentralized));
        assert_eq!(evaluator.on_verification(state.get(&id).unwrap()), None);
    }

    #[test]
    fn test_consensus_ignored_in_centralized_mode() {
        let mut state = DealState::default();
        let id = pending_deal(&mut state);
        verify(&mut state, &id, &[Verdict::Valid; 3]);

        let evaluator = Evaluator::new(config(Mode::Centralized));
        assert_eq!(evaluator.on_verification(state.get(&id).unwrap()), None);
    }

    #[test]
    fn test_promotion_threshold() {
        let mut state = DealState::default();
        let id = pending_deal(&mut state);
        let evaluator = Evaluator::new(config(Mode::Centralized));

        for _ in 0..4 {
            state.add_vote(&id).unwrap();
        }
        assert_eq!(evaluator.on_promotion_check(state.get(&id).unwrap()), None);

        state.add_vote(&id).unwrap();
        assert_eq!(
            evaluator.on_promotion_check(state.get(&id).unwrap()),
            Some(Transition::Promote)
        );

        let decentralized = Evaluator::new(config(Mode::Decentralized));
        assert_eq!(decentralized.on_promotion_check(state.get(&id).unwrap()), None);
    }

    #[test]
    fn test_apply_is_one_way() {
        let mut state = DealState::default();
        let id = pending_deal(&mut state);
        let deal = state.require_mut(&id).unwrap();
        let now = Utc::now();

        assert!(Transition::Reject.apply(deal, now));
        assert_eq!(deal.status, DealStatus::Rejected);

        assert!(!Transition::Verify.apply(deal, now));
        assert_eq!(deal.status, DealStatus::Rejected);
        assert!(deal.verified_at.is_none());

        let evaluator = Evaluator::new(config(Mode::Decentralized));
        assert_eq!(evaluator.on_verification(deal), None);
    }

    #[test]
    fn test_apply_stamps_timestamps() {
        let mut state = DealState::default();
        let id = pending_deal(&mut state);
        let deal = state.require_mut(&id).unwrap();
        let now = Utc::now();

        assert!(Transition::Promote.apply(deal, now));
        assert_eq!(deal.promoted_at, Some(now));
        assert!(matches!(
            Transition::Promote.event(deal.clone()),
            Event::DealPromoted { .. }
        ));
    }
}
