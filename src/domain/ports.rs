use super::group::{Group, Payout};
use super::member::GroupId;
use crate::error::Result;
use async_trait::async_trait;

/// Persistence port for groups.
///
/// Implementations must store a group as a single unit so readers never see
/// a partially applied transition.
#[async_trait]
pub trait GroupStore: Send + Sync {
    /// Allocates the next group id.
    async fn next_id(&self) -> Result<GroupId>;
    /// Stores a freshly created group. Fails if the id is already taken.
    async fn insert(&self, group: Group) -> Result<()>;
    async fn get(&self, id: GroupId) -> Result<Option<Group>>;
    /// Replaces a stored group, provided it is still at `expected_version`.
    ///
    /// Returns `ConcurrentModification` when another writer got there first;
    /// the stored group is left untouched in that case.
    async fn update(&self, group: Group, expected_version: u64) -> Result<()>;
    /// All groups, ordered by id.
    async fn get_all(&self) -> Result<Vec<Group>>;
}

/// External ledger that moves pooled funds to a round's recipient.
#[async_trait]
pub trait PayoutLedger: Send + Sync {
    async fn disburse(&self, payout: &Payout) -> Result<()>;
}

pub type GroupStoreBox = Box<dyn GroupStore>;
pub type PayoutLedgerBox = Box<dyn PayoutLedger>;
