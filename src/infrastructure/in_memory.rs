use crate::domain::group::{Group, Payout};
use crate::domain::member::GroupId;
use crate::domain::ports::{GroupStore, PayoutLedger};
use crate::error::{Result, RoscaError};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

/// A thread-safe in-memory store for groups.
///
/// Uses `Arc<RwLock<BTreeMap<GroupId, Group>>>`, so clones share the same
/// groups. Ideal for testing or a single process that needs no persistence.
#[derive(Clone)]
pub struct InMemoryGroupStore {
    groups: Arc<RwLock<BTreeMap<GroupId, Group>>>,
    last_id: Arc<AtomicU64>,
}

impl InMemoryGroupStore {
    /// Creates a new, empty in-memory group store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Default for InMemoryGroupStore {
    fn default() -> Self {
        Self {
            groups: Arc::new(RwLock::new(BTreeMap::new())),
            last_id: Arc::new(AtomicU64::new(0)),
        }
    }
}

#[async_trait]
impl GroupStore for InMemoryGroupStore {
    async fn next_id(&self) -> Result<GroupId> {
        Ok(GroupId(self.last_id.fetch_add(1, Ordering::SeqCst) + 1))
    }

    async fn insert(&self, group: Group) -> Result<()> {
        let mut groups = self.groups.write().await;
        if groups.contains_key(&group.id()) {
            return Err(RoscaError::internal(format!(
                "Group {} already exists",
                group.id()
            )));
        }
        groups.insert(group.id(), group);
        Ok(())
    }

    async fn get(&self, id: GroupId) -> Result<Option<Group>> {
        let groups = self.groups.read().await;
        Ok(groups.get(&id).cloned())
    }

    async fn update(&self, group: Group, expected_version: u64) -> Result<()> {
        let mut groups = self.groups.write().await;
        let stored = groups
            .get_mut(&group.id())
            .ok_or(RoscaError::GroupNotFound(group.id()))?;
        if stored.version() != expected_version {
            return Err(RoscaError::ConcurrentModification {
                group: group.id(),
                expected: expected_version,
            });
        }
        *stored = group;
        Ok(())
    }

    async fn get_all(&self) -> Result<Vec<Group>> {
        let groups = self.groups.read().await;
        Ok(groups.values().cloned().collect())
    }
}

/// Records payouts instead of moving funds.
///
/// Clones share the same record, so a caller can keep a handle after boxing
/// one into the engine.
#[derive(Default, Clone)]
pub struct InMemoryPayoutLedger {
    payouts: Arc<RwLock<Vec<Payout>>>,
}

impl InMemoryPayoutLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every payout disbursed so far, in disbursement order.
    pub async fn payouts(&self) -> Vec<Payout> {
        self.payouts.read().await.clone()
    }
}

#[async_trait]
impl PayoutLedger for InMemoryPayoutLedger {
    async fn disburse(&self, payout: &Payout) -> Result<()> {
        self.payouts.write().await.push(payout.clone());
        Ok(())
    }
}
