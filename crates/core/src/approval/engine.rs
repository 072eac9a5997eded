//! Stateless evaluation of approval chains.
//!
//! A record's position in a chain is never stored; it is recomputed from
//! the history of the record under the chain's action. Level `i` is complete
//! once `max(count, 1)` distinct users have acted on it, and the record sits
//! after the longest run of complete levels starting at level 1.

use std::collections::{BTreeMap, HashSet};

use crate::approval::error::ApprovalError;
use crate::approval::types::{Approval, ChainLevel, Decision, LevelDraft, NextStep, Outcome};

/// Stateless engine for walking approval chains.
pub struct ApprovalEngine;

impl ApprovalEngine {
    /// Distinct users who acted at `definition_id`.
    fn approvers_at(history: &[Approval], definition_id: i32) -> HashSet<i32> {
        history
            .iter()
            .filter(|h| h.definition_id == definition_id)
            .map(|h| h.user_id)
            .collect()
    }

    /// Number of leading complete levels.
    ///
    /// `chain` must be ordered by level.
    #[must_use]
    pub fn completed_levels(chain: &[ChainLevel], history: &[Approval]) -> usize {
        chain
            .iter()
            .take_while(|level| {
                Self::approvers_at(history, level.definition_id).len() >= level.required()
            })
            .count()
    }

    /// Whether the record has walked the whole chain.
    #[must_use]
    pub fn is_closed(chain: &[ChainLevel], history: &[Approval]) -> bool {
        !chain.is_empty() && Self::completed_levels(chain, history) == chain.len()
    }

    /// Evaluates an action by `user_id`, optionally pinned to `requested_level`.
    ///
    /// # Errors
    ///
    /// - `AlreadyClosed` when every level is complete
    /// - `NotApprover` when the user is eligible at no level
    /// - `OutOfOrder` when the pinned level is not the next one, or the
    ///   user is only eligible at other levels
    pub fn act(
        chain: &[ChainLevel],
        history: &[Approval],
        user_id: i32,
        requested_level: Option<i32>,
    ) -> Result<Decision, ApprovalError> {
        let completed = Self::completed_levels(chain, history);
        let Some(next) = chain.get(completed) else {
            return Err(ApprovalError::AlreadyClosed);
        };

        if !chain.iter().any(|level| level.is_approver(user_id)) {
            return Err(ApprovalError::NotApprover(user_id));
        }

        if let Some(requested) = requested_level
            && requested != next.level
        {
            return Err(ApprovalError::OutOfOrder {
                expected: next.level,
                requested,
            });
        }

        if !next.is_approver(user_id) {
            let requested = chain
                .iter()
                .find(|level| level.is_approver(user_id))
                .map_or(next.level, |level| level.level);
            return Err(ApprovalError::OutOfOrder {
                expected: next.level,
                requested,
            });
        }

        let acted = Self::approvers_at(history, next.definition_id);
        if acted.contains(&user_id) {
            return Ok(Decision {
                definition_id: next.definition_id,
                outcome: Outcome::Duplicate { level: next.level },
            });
        }

        let approvals = acted.len() + 1;
        let required = next.required();
        let outcome = if approvals >= required {
            Outcome::Advanced {
                level: next.level,
                status: next.status.clone(),
                closed: completed + 1 == chain.len(),
            }
        } else {
            Outcome::Recorded {
                level: next.level,
                approvals,
                required,
            }
        };

        Ok(Decision {
            definition_id: next.definition_id,
            outcome,
        })
    }

    /// The step awaiting approval, or `None` on a closed or empty chain.
    #[must_use]
    pub fn next_step(chain: &[ChainLevel], history: &[Approval]) -> Option<NextStep> {
        let completed = Self::completed_levels(chain, history);
        let next = chain.get(completed)?;
        let current = completed.checked_sub(1).and_then(|i| chain.get(i));

        Some(NextStep {
            current_level: current.map_or(0, |level| level.level),
            current_status: current.map(|level| level.status.clone()),
            next_level: next.level,
            next_status: next.status.clone(),
            next_action: next.action.clone(),
            next_count: next.count,
            next_approvals: Self::approvers_at(history, next.definition_id).len(),
        })
    }

    /// The next step if `user_id` is expected to act on it and has not yet.
    #[must_use]
    pub fn pending_for(chain: &[ChainLevel], history: &[Approval], user_id: i32) -> Option<NextStep> {
        let completed = Self::completed_levels(chain, history);
        let next = chain.get(completed)?;
        if !next.is_approver(user_id)
            || Self::approvers_at(history, next.definition_id).contains(&user_id)
        {
            return None;
        }
        Self::next_step(chain, history)
    }

    /// Statuses a record can hold while its chain is still open.
    #[must_use]
    pub fn open_statuses(chain: &[ChainLevel]) -> Vec<String> {
        let mut statuses = vec![crate::approval::types::PENDING.to_string()];
        if let Some((_, intermediate)) = chain.split_last() {
            for level in intermediate {
                if !statuses.contains(&level.status) {
                    statuses.push(level.status.clone());
                }
            }
        }
        statuses
    }

    /// Rejects a record whose stored status is not an open one for `chain`.
    ///
    /// History is keyed by definition, so a replaced chain no longer sees
    /// the approvals that closed a record; the status column still does.
    ///
    /// # Errors
    ///
    /// Returns `ApprovalError::AlreadyClosed` when `status` is terminal.
    pub fn ensure_open(chain: &[ChainLevel], status: &str) -> Result<(), ApprovalError> {
        if Self::open_statuses(chain).iter().any(|open| open == status) {
            Ok(())
        } else {
            Err(ApprovalError::AlreadyClosed)
        }
    }

    /// Validates a full chain replacement for one menu.
    ///
    /// Per action, levels must be exactly `1..=N`; every level needs a
    /// status, a count of at least one, and at least `count` distinct
    /// approvers.
    ///
    /// # Errors
    ///
    /// Returns `ApprovalError::InvalidChain` describing the first violation.
    pub fn validate_chain(levels: &[LevelDraft]) -> Result<(), ApprovalError> {
        let mut by_action: BTreeMap<&str, Vec<i32>> = BTreeMap::new();

        for draft in levels {
            let action = draft.action.trim();
            if action.is_empty() {
                return Err(ApprovalError::InvalidChain("action is required".into()));
            }
            if draft.status.trim().is_empty() {
                return Err(ApprovalError::InvalidChain(format!(
                    "{action} level {}: status is required",
                    draft.level
                )));
            }
            if draft.count < 1 {
                return Err(ApprovalError::InvalidChain(format!(
                    "{action} level {}: count must be at least 1",
                    draft.level
                )));
            }
            let distinct: HashSet<i32> = draft.approvers.iter().copied().collect();
            if usize::try_from(draft.count).unwrap_or(usize::MAX) > distinct.len() {
                return Err(ApprovalError::InvalidChain(format!(
                    "{action} level {}: count {} exceeds {} approvers",
                    draft.level,
                    draft.count,
                    distinct.len()
                )));
            }
            by_action.entry(action).or_default().push(draft.level);
        }

        for (action, mut numbers) in by_action {
            numbers.sort_unstable();
            for (expected, actual) in (1..).zip(&numbers) {
                if *actual != expected {
                    return Err(ApprovalError::InvalidChain(format!(
                        "{action} levels must run 1..{} without gaps or duplicates",
                        numbers.len()
                    )));
                }
            }
        }

        Ok(())
    }

    /// Renumbering needed after removing the level `removed` from a chain.
    ///
    /// `levels` holds `(definition_id, level)` of the remaining rows of the
    /// same chain; returns `(definition_id, new_level)` for rows that move.
    #[must_use]
    pub fn renumber_after_removal(levels: &[(i32, i32)], removed: i32) -> Vec<(i32, i32)> {
        let mut moved: Vec<(i32, i32)> = levels
            .iter()
            .filter(|(_, level)| *level > removed)
            .map(|(id, level)| (*id, level - 1))
            .collect();
        moved.sort_by_key(|(_, level)| *level);
        moved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE: i32 = 1;
    const BOB: i32 = 2;
    const CAROL: i32 = 3;
    const MALLORY: i32 = 99;

    fn level(definition_id: i32, level: i32, status: &str, count: i32, approvers: &[i32]) -> ChainLevel {
        ChainLevel {
            definition_id,
            level,
            action: "create".to_string(),
            status: status.to_string(),
            count,
            approvers: approvers.to_vec(),
        }
    }

    fn two_level_chain() -> Vec<ChainLevel> {
        vec![
            level(10, 1, "review", 1, &[ALICE]),
            level(11, 2, "approved", 1, &[BOB]),
        ]
    }

    fn approval(definition_id: i32, user_id: i32) -> Approval {
        Approval {
            definition_id,
            user_id,
        }
    }

    #[test]
    fn test_walks_chain_to_close() {
        let chain = two_level_chain();
        let mut history = Vec::new();

        let first = ApprovalEngine::act(&chain, &history, ALICE, None).unwrap();
        assert_eq!(first.new_status(), Some("review"));
        assert!(first.writes_history());
        history.push(approval(first.definition_id, ALICE));

        let second = ApprovalEngine::act(&chain, &history, BOB, None).unwrap();
        assert_eq!(
            second.outcome,
            Outcome::Advanced {
                level: 2,
                status: "approved".into(),
                closed: true
            }
        );
        history.push(approval(second.definition_id, BOB));

        assert!(ApprovalEngine::is_closed(&chain, &history));
        assert!(matches!(
            ApprovalEngine::act(&chain, &history, BOB, None),
            Err(ApprovalError::AlreadyClosed)
        ));
    }

    #[test]
    fn test_terminal_status_is_closed_without_history() {
        let chain = two_level_chain();
        assert!(ApprovalEngine::ensure_open(&chain, "pending").is_ok());
        assert!(ApprovalEngine::ensure_open(&chain, "review").is_ok());
        assert!(matches!(
            ApprovalEngine::ensure_open(&chain, "approved"),
            Err(ApprovalError::AlreadyClosed)
        ));
        assert!(matches!(
            ApprovalEngine::ensure_open(&chain, "active"),
            Err(ApprovalError::AlreadyClosed)
        ));
    }

    #[test]
    fn test_out_of_order_for_later_level_approver() {
        let chain = two_level_chain();
        let err = ApprovalEngine::act(&chain, &[], BOB, None).unwrap_err();
        assert!(matches!(
            err,
            ApprovalError::OutOfOrder {
                expected: 1,
                requested: 2
            }
        ));
    }

    #[test]
    fn test_out_of_order_for_pinned_level() {
        let chain = two_level_chain();
        let err = ApprovalEngine::act(&chain, &[], ALICE, Some(2)).unwrap_err();
        assert!(matches!(err, ApprovalError::OutOfOrder { expected: 1, .. }));
        assert!(ApprovalEngine::act(&chain, &[], ALICE, Some(1)).is_ok());
    }

    #[test]
    fn test_stranger_is_forbidden() {
        let chain = two_level_chain();
        assert!(matches!(
            ApprovalEngine::act(&chain, &[], MALLORY, None),
            Err(ApprovalError::NotApprover(MALLORY))
        ));
    }

    #[test]
    fn test_count_requires_distinct_users() {
        let chain = vec![level(20, 1, "approved", 2, &[ALICE, BOB, CAROL])];
        let mut history = Vec::new();

        let first = ApprovalEngine::act(&chain, &history, ALICE, None).unwrap();
        assert_eq!(
            first.outcome,
            Outcome::Recorded {
                level: 1,
                approvals: 1,
                required: 2
            }
        );
        history.push(approval(20, ALICE));

        let repeat = ApprovalEngine::act(&chain, &history, ALICE, None).unwrap();
        assert_eq!(repeat.outcome, Outcome::Duplicate { level: 1 });
        assert!(!repeat.writes_history());

        let second = ApprovalEngine::act(&chain, &history, CAROL, None).unwrap();
        assert_eq!(second.new_status(), Some("approved"));
    }

    #[test]
    fn test_zero_count_treated_as_one() {
        let chain = vec![level(30, 1, "approved", 0, &[ALICE])];
        let decision = ApprovalEngine::act(&chain, &[], ALICE, None).unwrap();
        assert_eq!(decision.new_status(), Some("approved"));
    }

    #[test]
    fn test_empty_chain_is_closed_for_actions() {
        assert!(matches!(
            ApprovalEngine::act(&[], &[], ALICE, None),
            Err(ApprovalError::AlreadyClosed)
        ));
        assert!(!ApprovalEngine::is_closed(&[], &[]));
    }

    #[test]
    fn test_next_step_and_pending_for() {
        let chain = two_level_chain();
        let history = vec![approval(10, ALICE)];

        let step = ApprovalEngine::next_step(&chain, &history).unwrap();
        assert_eq!(step.current_level, 1);
        assert_eq!(step.current_status.as_deref(), Some("review"));
        assert_eq!(step.next_level, 2);
        assert_eq!(step.next_status, "approved");
        assert_eq!(step.next_action, "create");

        assert!(ApprovalEngine::pending_for(&chain, &history, BOB).is_some());
        assert!(ApprovalEngine::pending_for(&chain, &history, ALICE).is_none());
        assert!(ApprovalEngine::pending_for(&chain, &[], ALICE).is_some());
    }

    #[test]
    fn test_open_statuses_exclude_terminal() {
        let chain = two_level_chain();
        assert_eq!(ApprovalEngine::open_statuses(&chain), vec!["pending", "review"]);
    }

    fn draft(action: &str, level: i32, count: i32, approvers: &[i32]) -> LevelDraft {
        LevelDraft {
            action: action.to_string(),
            level,
            status: format!("s{level}"),
            count,
            approvers: approvers.to_vec(),
        }
    }

    #[test]
    fn test_validate_chain() {
        assert!(ApprovalEngine::validate_chain(&[
            draft("create", 1, 1, &[ALICE]),
            draft("create", 2, 2, &[BOB, CAROL]),
            draft("deactivate", 1, 1, &[ALICE]),
        ])
        .is_ok());

        let gap = [draft("create", 1, 1, &[ALICE]), draft("create", 3, 1, &[BOB])];
        assert!(ApprovalEngine::validate_chain(&gap).is_err());

        let dup = [draft("create", 1, 1, &[ALICE]), draft("create", 1, 1, &[BOB])];
        assert!(ApprovalEngine::validate_chain(&dup).is_err());

        let too_many = [draft("create", 1, 2, &[ALICE, ALICE])];
        assert!(ApprovalEngine::validate_chain(&too_many).is_err());

        let zero = [draft("create", 1, 0, &[ALICE])];
        assert!(ApprovalEngine::validate_chain(&zero).is_err());

        let mut blank = draft("create", 1, 1, &[ALICE]);
        blank.status = " ".into();
        assert!(ApprovalEngine::validate_chain(&[blank]).is_err());
    }

    #[test]
    fn test_renumber_after_removal() {
        let remaining = [(10, 1), (12, 3), (13, 4)];
        assert_eq!(
            ApprovalEngine::renumber_after_removal(&remaining, 2),
            vec![(12, 2), (13, 3)]
        );
        assert!(ApprovalEngine::renumber_after_removal(&remaining, 5).is_empty());
    }
}
