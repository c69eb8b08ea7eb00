use super::member::{Amount, GroupId, MemberId};
use crate::error::{Result, RoscaError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

/// Pooled funds handed to a round's recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payout {
    pub group: GroupId,
    pub round: u64,
    pub recipient: MemberId,
    pub amount: u64,
}

/// Outcome of an accepted contribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContributionReceipt {
    pub group: GroupId,
    pub member: MemberId,
    /// Round the contribution was recorded in.
    pub round: u64,
    /// Round the group is in after the contribution, one ahead of `round`
    /// when this contribution completed it.
    pub current_round: u64,
    /// Contributions recorded toward `round`, this one included.
    pub contributors: usize,
    pub round_completed: bool,
    pub payout: Option<Payout>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoundAdvance {
    pub group: GroupId,
    pub completed_round: u64,
    pub payout: Payout,
    pub current_round: u64,
    pub current_recipient: MemberId,
}

/// Read-only snapshot of a group, as returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupView {
    pub id: GroupId,
    pub current_round: u64,
    /// Number of complete rotations through the member list.
    pub cycle: u64,
    pub contribution_amount: u64,
    pub current_recipient: MemberId,
    pub recipient_index: usize,
    /// Contributors of the current round, in member order.
    pub contributors: Vec<MemberId>,
    pub required_contributions: usize,
    pub balance: u64,
    pub members: Vec<MemberId>,
}

/// A rotating savings group.
///
/// Every round, all members except the round's recipient pay
/// `contribution_amount`. The last contribution pays the pooled balance out
/// to the recipient and moves the rotation to the next member. The recipient
/// is always `members[current_round % members.len()]`.
///
/// Fields are private so the invariants below can only change through
/// [`Group::contribute`] and [`Group::advance_round`]:
///
/// * `members` has at least two unique, non-empty entries and never changes.
/// * `contributions` holds members other than the current recipient.
/// * `balance == contribution_amount * contributions.len()`.
///
/// Deserialized groups go through [`Group::validate`] before they exist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "GroupRecord")]
pub struct Group {
    id: GroupId,
    members: Vec<MemberId>,
    contribution_amount: Amount,
    current_round: u64,
    contributions: BTreeSet<MemberId>,
    balance: u64,
    version: u64,
}

/// Stored shape of a [`Group`], before its invariants are checked.
#[derive(Deserialize)]
struct GroupRecord {
    id: GroupId,
    members: Vec<MemberId>,
    contribution_amount: Amount,
    current_round: u64,
    contributions: BTreeSet<MemberId>,
    balance: u64,
    version: u64,
}

impl TryFrom<GroupRecord> for Group {
    type Error = RoscaError;

    fn try_from(record: GroupRecord) -> Result<Self> {
        let group = Self {
            id: record.id,
            members: record.members,
            contribution_amount: record.contribution_amount,
            current_round: record.current_round,
            contributions: record.contributions,
            balance: record.balance,
            version: record.version,
        };
        group.validate()?;
        Ok(group)
    }
}

impl Group {
    /// Checks creation constraints without building a group.
    pub fn validate_terms(members: &[MemberId], contribution_amount: u64) -> Result<Amount> {
        if members.len() < 2 {
            return Err(RoscaError::InvalidMembership(format!(
                "Need at least 2 members, got {}",
                members.len()
            )));
        }

        let mut seen = HashSet::with_capacity(members.len());
        for member in members {
            if member.as_str().is_empty() {
                return Err(RoscaError::InvalidMembership(
                    "Member identifiers must not be empty".to_string(),
                ));
            }
            if !seen.insert(member) {
                return Err(RoscaError::InvalidMembership(format!(
                    "Duplicate member {member}"
                )));
            }
        }

        let amount = Amount::new(contribution_amount)?;

        // Bounds every balance the group can ever hold.
        amount
            .value()
            .checked_mul(members.len() as u64 - 1)
            .ok_or_else(|| {
                RoscaError::InvalidMembership(format!(
                    "Pool of {} members at {} units overflows",
                    members.len(),
                    amount
                ))
            })?;

        Ok(amount)
    }

    pub fn new(id: GroupId, members: Vec<MemberId>, contribution_amount: u64) -> Result<Self> {
        let contribution_amount = Self::validate_terms(&members, contribution_amount)?;
        Ok(Self {
            id,
            members,
            contribution_amount,
            current_round: 0,
            contributions: BTreeSet::new(),
            balance: 0,
            version: 0,
        })
    }

    pub fn id(&self) -> GroupId {
        self.id
    }

    pub fn members(&self) -> &[MemberId] {
        &self.members
    }

    pub fn contribution_amount(&self) -> Amount {
        self.contribution_amount
    }

    pub fn current_round(&self) -> u64 {
        self.current_round
    }

    pub fn cycle(&self) -> u64 {
        self.current_round / self.members.len() as u64
    }

    pub fn recipient_index(&self) -> usize {
        (self.current_round % self.members.len() as u64) as usize
    }

    pub fn current_recipient(&self) -> &MemberId {
        &self.members[self.recipient_index()]
    }

    pub fn balance(&self) -> u64 {
        self.balance
    }

    /// Commit counter, bumped by every state transition.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn contributor_count(&self) -> usize {
        self.contributions.len()
    }

    /// The recipient is exempt, so everyone else has to pay in.
    pub fn required_contributions(&self) -> usize {
        self.members.len() - 1
    }

    pub fn is_round_complete(&self) -> bool {
        self.contributions.len() == self.required_contributions()
    }

    pub fn is_member(&self, member: &MemberId) -> bool {
        self.members.contains(member)
    }

    pub fn has_contributed(&self, member: &MemberId) -> bool {
        self.contributions.contains(member)
    }

    /// Records a contribution and, if it completes the round, advances it.
    ///
    /// Nothing changes when an error is returned.
    pub fn contribute(&mut self, member: &MemberId, amount: u64) -> Result<ContributionReceipt> {
        if !self.is_member(member) {
            return Err(RoscaError::NotAMember {
                group: self.id,
                member: member.clone(),
            });
        }
        if member == self.current_recipient() {
            return Err(RoscaError::RecipientCannotContribute {
                group: self.id,
                member: member.clone(),
                round: self.current_round,
            });
        }
        if self.has_contributed(member) {
            return Err(RoscaError::DuplicateContribution {
                group: self.id,
                member: member.clone(),
                round: self.current_round,
            });
        }
        if amount != self.contribution_amount.value() {
            return Err(RoscaError::WrongAmount {
                group: self.id,
                expected: self.contribution_amount.value(),
                actual: amount,
            });
        }

        let round = self.current_round;
        self.contributions.insert(member.clone());
        self.balance += amount;
        let contributors = self.contributions.len();

        let payout = if self.is_round_complete() {
            Some(self.pay_out())
        } else {
            None
        };
        self.version += 1;

        Ok(ContributionReceipt {
            group: self.id,
            member: member.clone(),
            round,
            current_round: self.current_round,
            contributors,
            round_completed: payout.is_some(),
            payout,
        })
    }

    /// Pays out a complete round and moves to the next recipient.
    pub fn advance_round(&mut self) -> Result<RoundAdvance> {
        if !self.is_round_complete() {
            return Err(RoscaError::RoundIncomplete {
                group: self.id,
                round: self.current_round,
                contributed: self.contributions.len(),
                required: self.required_contributions(),
            });
        }

        let completed_round = self.current_round;
        let payout = self.pay_out();
        self.version += 1;

        Ok(RoundAdvance {
            group: self.id,
            completed_round,
            payout,
            current_round: self.current_round,
            current_recipient: self.current_recipient().clone(),
        })
    }

    fn pay_out(&mut self) -> Payout {
        let payout = Payout {
            group: self.id,
            round: self.current_round,
            recipient: self.current_recipient().clone(),
            amount: self.balance,
        };
        self.balance = 0;
        self.contributions.clear();
        self.current_round += 1;
        payout
    }

    pub fn view(&self) -> GroupView {
        GroupView {
            id: self.id,
            current_round: self.current_round,
            cycle: self.cycle(),
            contribution_amount: self.contribution_amount.value(),
            current_recipient: self.current_recipient().clone(),
            recipient_index: self.recipient_index(),
            contributors: self
                .members
                .iter()
                .filter(|m| self.contributions.contains(*m))
                .cloned()
                .collect(),
            required_contributions: self.required_contributions(),
            balance: self.balance,
            members: self.members.clone(),
        }
    }

    /// Re-checks every invariant, for records loaded from storage.
    pub fn validate(&self) -> Result<()> {
        Self::validate_terms(&self.members, self.contribution_amount.value())?;

        if let Some(stranger) = self.contributions.iter().find(|m| !self.is_member(m)) {
            return Err(RoscaError::internal(format!(
                "Group {} records a contribution from non-member {stranger}",
                self.id
            )));
        }
        if self.has_contributed(self.current_recipient()) {
            return Err(RoscaError::internal(format!(
                "Group {} records a contribution from its recipient",
                self.id
            )));
        }
        if self.contributions.len() > self.required_contributions() {
            return Err(RoscaError::internal(format!(
                "Group {} has more contributions than members can make",
                self.id
            )));
        }
        let expected = self.contribution_amount.value() * self.contributions.len() as u64;
        if self.balance != expected {
            return Err(RoscaError::internal(format!(
                "Group {} balance {} does not match {} recorded contributions",
                self.id,
                self.balance,
                self.contributions.len()
            )));
        }
        Ok(())
    }
}
