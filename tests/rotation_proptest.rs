//! Property-based tests for the rotation state machine.
//!
//! Drives a `Group` with arbitrary contribution attempts and checks after
//! every step that:
//! - the balance equals the contribution amount times the contributor count
//! - the recipient is always `members[round % members.len()]`
//! - a rejected call leaves the group untouched
//! - a round advances exactly once, on its last required contribution
use proptest::prelude::*;
use rosca::domain::group::Group;
use rosca::domain::member::{GroupId, MemberId};
use rosca::error::RoscaError;

fn member_ids(size: usize) -> Vec<MemberId> {
    (0..size).map(|i| MemberId::new(format!("M{i}"))).collect()
}

fn assert_invariants(group: &Group) {
    let n = group.members().len() as u64;
    assert_eq!(
        group.balance(),
        group.contribution_amount().value() * group.contributor_count() as u64
    );
    assert_eq!(
        group.current_recipient(),
        &group.members()[(group.current_round() % n) as usize]
    );
    assert!(group.contributor_count() < group.required_contributions());
    assert!(!group.has_contributed(group.current_recipient()));
}

// Each step picks a member index (one past the end is a stranger) and
// whether to pay the exact amount.
fn steps() -> impl Strategy<Value = Vec<(usize, bool)>> {
    prop::collection::vec((0usize..10, prop::bool::weighted(0.85)), 0..200)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_invariants_hold_for_any_call_sequence(
        size in 2usize..9,
        amount in 1u64..1_000,
        steps in steps(),
    ) {
        let members = member_ids(size);
        let mut group = Group::new(GroupId(1), members.clone(), amount).unwrap();
        assert_invariants(&group);

        for (pick, exact) in steps {
            let member = if pick < size {
                members[pick].clone()
            } else {
                MemberId::from("stranger")
            };
            let paid = if exact { amount } else { amount + 1 };
            let before = group.clone();

            match group.contribute(&member, paid) {
                Ok(receipt) => {
                    prop_assert!(exact);
                    prop_assert!(before.is_member(&member));
                    prop_assert!(!before.has_contributed(&member));
                    prop_assert_eq!(receipt.round, before.current_round());
                    prop_assert_eq!(receipt.contributors, before.contributor_count() + 1);
                    if receipt.round_completed {
                        prop_assert_eq!(receipt.contributors, size - 1);
                        prop_assert_eq!(group.current_round(), before.current_round() + 1);
                        prop_assert_eq!(group.contributor_count(), 0);
                        let payout = receipt.payout.expect("completed round pays out");
                        prop_assert_eq!(payout.amount, amount * (size as u64 - 1));
                        prop_assert_eq!(&payout.recipient, before.current_recipient());
                    } else {
                        prop_assert!(receipt.payout.is_none());
                        prop_assert_eq!(group.current_round(), before.current_round());
                        prop_assert!(group.has_contributed(&member));
                    }
                }
                Err(e) => {
                    prop_assert_eq!(&group, &before);
                    match e {
                        RoscaError::NotAMember { .. } => {
                            prop_assert!(pick >= size);
                        }
                        RoscaError::RecipientCannotContribute { .. } => {
                            prop_assert_eq!(&member, before.current_recipient());
                        }
                        RoscaError::DuplicateContribution { .. } => {
                            prop_assert!(before.has_contributed(&member));
                        }
                        RoscaError::WrongAmount { .. } => {
                            prop_assert!(!exact);
                        }
                        other => {
                            prop_assert!(false, "unexpected error {}", other);
                        }
                    }
                }
            }
            assert_invariants(&group);
        }
    }

    #[test]
    fn test_full_rounds_round_trip(size in 2usize..10, rounds in 0u64..30) {
        let members = member_ids(size);
        let mut group = Group::new(GroupId(1), members.clone(), 7).unwrap();

        for round in 0..rounds {
            let recipient = members[(round % size as u64) as usize].clone();
            let mut completions = 0;
            for member in members.iter().filter(|m| **m != recipient) {
                if group.contribute(member, 7).unwrap().round_completed {
                    completions += 1;
                }
            }
            prop_assert_eq!(completions, 1);
            prop_assert_eq!(group.contributor_count(), 0);
            prop_assert_eq!(group.balance(), 0);
        }

        prop_assert_eq!(group.current_round(), rounds);
        prop_assert_eq!(group.cycle(), rounds / size as u64);
    }

    #[test]
    fn test_duplicate_membership_is_always_rejected(
        size in 2usize..8,
        dup in 0usize..8,
    ) {
        let mut members = member_ids(size);
        members.push(members[dup % size].clone());
        prop_assert!(matches!(
            Group::new(GroupId(1), members, 1),
            Err(RoscaError::InvalidMembership(_))
        ));
    }
}
