use crate::domain::group::{ContributionReceipt, Group, GroupView, Payout, RoundAdvance};
use crate::domain::member::{Amount, GroupId, MemberId};
use crate::domain::ports::{GroupStoreBox, PayoutLedgerBox};
use crate::error::{Result, RoscaError};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

/// The main entry point for running rotating savings groups.
///
/// `RotationEngine` owns the storage backend and the payout ledger. Every
/// mutation of a group runs under that group's own lock and is committed with
/// a single versioned store update, so a contribution and the round advance it
/// triggers are observed together or not at all. Groups never share a lock.
pub struct RotationEngine {
    store: GroupStoreBox,
    ledger: PayoutLedgerBox,
    locks: Mutex<HashMap<GroupId, Arc<Mutex<()>>>>,
}

impl RotationEngine {
    /// Creates a new `RotationEngine` instance.
    ///
    /// # Arguments
    ///
    /// * `store` - The store holding group state.
    /// * `ledger` - Where payouts are sent once a round advance is committed.
    pub fn new(store: GroupStoreBox, ledger: PayoutLedgerBox) -> Self {
        Self {
            store,
            ledger,
            locks: Mutex::new(HashMap::new()),
        }
    }

    // Groups are never removed, so only ids that exist get a lock entry.
    async fn lock_for(&self, id: GroupId) -> Result<Arc<Mutex<()>>> {
        if let Some(lock) = self.locks.lock().await.get(&id) {
            return Ok(lock.clone());
        }
        if self.store.get(id).await?.is_none() {
            return Err(RoscaError::GroupNotFound(id));
        }
        Ok(self.locks.lock().await.entry(id).or_default().clone())
    }

    async fn load(&self, id: GroupId) -> Result<Group> {
        self.store
            .get(id)
            .await?
            .ok_or(RoscaError::GroupNotFound(id))
    }

    /// Creates a group and returns its engine-assigned id.
    ///
    /// The terms are validated before an id is allocated, so rejected groups
    /// leave no gap in the id sequence.
    pub async fn create_group(
        &self,
        members: Vec<MemberId>,
        contribution_amount: u64,
    ) -> Result<GroupId> {
        Group::validate_terms(&members, contribution_amount)?;

        let id = self.store.next_id().await?;
        let group = Group::new(id, members, contribution_amount)?;
        let size = group.members().len();
        self.store.insert(group).await?;

        info!(group = %id, members = size, contribution_amount, "group created");
        Ok(id)
    }

    /// Records a contribution, advancing the round when it is the last one.
    pub async fn contribute(
        &self,
        id: GroupId,
        member: &MemberId,
        amount: u64,
    ) -> Result<ContributionReceipt> {
        let lock = self.lock_for(id).await?;
        let receipt = {
            let _guard = lock.lock().await;
            let mut group = self.load(id).await?;
            let expected = group.version();
            let receipt = group.contribute(member, amount)?;
            self.store.update(group, expected).await?;
            receipt
        };

        debug!(
            group = %id,
            member = %member,
            round = receipt.round,
            contributors = receipt.contributors,
            "contribution recorded"
        );
        if let Some(payout) = &receipt.payout {
            info!(group = %id, round = payout.round, current_round = receipt.current_round, "round advanced");
            self.disburse(payout).await;
        }
        Ok(receipt)
    }

    /// Pays out and advances a round that is complete but was not advanced.
    pub async fn advance_round(&self, id: GroupId) -> Result<RoundAdvance> {
        let lock = self.lock_for(id).await?;
        let advance = {
            let _guard = lock.lock().await;
            let mut group = self.load(id).await?;
            let expected = group.version();
            let advance = group.advance_round()?;
            self.store.update(group, expected).await?;
            advance
        };

        info!(group = %id, round = advance.completed_round, current_round = advance.current_round, "round advanced");
        self.disburse(&advance.payout).await;
        Ok(advance)
    }

    // The transition is already committed, so a ledger failure cannot undo
    // it. The payout travels back in the receipt for reconciliation.
    async fn disburse(&self, payout: &Payout) {
        if let Err(e) = self.ledger.disburse(payout).await {
            error!(
                group = %payout.group,
                round = payout.round,
                recipient = %payout.recipient,
                amount = payout.amount,
                error = %e,
                "payout disbursement failed"
            );
        }
    }

    /// Returns the latest committed state of a group.
    pub async fn get_state(&self, id: GroupId) -> Result<GroupView> {
        Ok(self.load(id).await?.view())
    }

    pub async fn current_round(&self, id: GroupId) -> Result<u64> {
        Ok(self.load(id).await?.current_round())
    }

    pub async fn contribution_amount(&self, id: GroupId) -> Result<Amount> {
        Ok(self.load(id).await?.contribution_amount())
    }

    pub async fn current_recipient(&self, id: GroupId) -> Result<MemberId> {
        Ok(self.load(id).await?.current_recipient().clone())
    }

    pub async fn has_contributed(&self, id: GroupId, member: &MemberId) -> Result<bool> {
        let group = self.load(id).await?;
        if !group.is_member(member) {
            return Err(RoscaError::NotAMember {
                group: id,
                member: member.clone(),
            });
        }
        Ok(group.has_contributed(member))
    }

    /// Snapshots of every group, ordered by id.
    pub async fn groups(&self) -> Result<Vec<GroupView>> {
        Ok(self
            .store
            .get_all()
            .await?
            .iter()
            .map(Group::view)
            .collect())
    }
}
