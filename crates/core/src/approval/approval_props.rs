//! Property-based tests for the approval engine.

use std::collections::HashSet;

use proptest::prelude::*;

use crate::approval::engine::ApprovalEngine;
use crate::approval::error::ApprovalError;
use crate::approval::types::{Approval, ChainLevel};

/// Chains of 1..=4 levels, each with 1..=3 approvers drawn from users 1..=5.
fn arb_chain() -> impl Strategy<Value = Vec<ChainLevel>> {
    prop::collection::vec(
        (prop::collection::hash_set(1i32..=5, 1..=3), 1i32..=3),
        1..=4,
    )
    .prop_map(|levels| {
        levels
            .into_iter()
            .zip(1..)
            .map(|((approvers, count), level)| {
                let approvers: Vec<i32> = approvers.into_iter().collect();
                let count = count.min(i32::try_from(approvers.len()).unwrap_or(1));
                ChainLevel {
                    definition_id: 100 + level,
                    level,
                    action: "create".to_string(),
                    status: format!("status-{level}"),
                    count,
                    approvers,
                }
            })
            .collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Replaying random actions: progress never goes backwards, a user acts
    /// at most once per level, and a closed chain rejects everything.
    #[test]
    fn prop_random_walk_respects_chain(
        chain in arb_chain(),
        actors in prop::collection::vec(1i32..=6, 0..40),
    ) {
        let mut history: Vec<Approval> = Vec::new();
        let mut completed = 0;

        for user in actors {
            let before_closed = ApprovalEngine::is_closed(&chain, &history);
            match ApprovalEngine::act(&chain, &history, user, None) {
                Ok(decision) => {
                    prop_assert!(!before_closed);
                    if decision.writes_history() {
                        history.push(Approval { definition_id: decision.definition_id, user_id: user });
                    }
                }
                Err(ApprovalError::AlreadyClosed) => prop_assert!(before_closed),
                Err(ApprovalError::NotApprover(_) | ApprovalError::OutOfOrder { .. }) => {}
                Err(other) => prop_assert!(false, "unexpected error {other:?}"),
            }

            let now = ApprovalEngine::completed_levels(&chain, &history);
            prop_assert!(now >= completed);
            prop_assert!(now <= chain.len());
            completed = now;
        }

        let unique: HashSet<(i32, i32)> =
            history.iter().map(|h| (h.definition_id, h.user_id)).collect();
        prop_assert_eq!(unique.len(), history.len());
    }

    /// Every accepted history row belongs to the level that was next when it was written.
    #[test]
    fn prop_history_only_on_next_level(
        chain in arb_chain(),
        actors in prop::collection::vec(1i32..=5, 0..30),
    ) {
        let mut history: Vec<Approval> = Vec::new();
        for user in actors {
            let next = ApprovalEngine::completed_levels(&chain, &history);
            if let Ok(decision) = ApprovalEngine::act(&chain, &history, user, None) {
                prop_assert_eq!(decision.definition_id, chain[next].definition_id);
                if decision.writes_history() {
                    history.push(Approval { definition_id: decision.definition_id, user_id: user });
                }
            }
        }
    }

    /// Removing any level and renumbering leaves levels 1..N-1.
    #[test]
    fn prop_renumber_keeps_levels_contiguous(len in 1i32..10, removed_seed in 0i32..10) {
        let removed = removed_seed % len + 1;
        let remaining: Vec<(i32, i32)> = (1..=len)
            .filter(|level| *level != removed)
            .map(|level| (level * 10, level))
            .collect();

        let moved = ApprovalEngine::renumber_after_removal(&remaining, removed);
        let mut levels: Vec<i32> = remaining
            .iter()
            .map(|(id, level)| {
                moved.iter().find(|(m, _)| m == id).map_or(*level, |(_, new)| *new)
            })
            .collect();
        levels.sort_unstable();

        prop_assert_eq!(levels, (1..len).collect::<Vec<_>>());
    }
}
