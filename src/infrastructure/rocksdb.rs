use crate::domain::group::Group;
use crate::domain::member::GroupId;
use crate::domain::ports::GroupStore;
use crate::error::{Result, RoscaError};
use async_trait::async_trait;
use rocksdb::{ColumnFamilyDescriptor, DB, IteratorMode, Options};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Column Family for storing group state.
pub const CF_GROUPS: &str = "groups";
/// Column Family for store metadata such as the id counter.
pub const CF_META: &str = "meta";

const LAST_GROUP_ID: &[u8] = b"last_group_id";

/// A persistent group store using RocksDB.
///
/// Groups are serialized with `serde_json` under their big-endian id, so
/// iteration yields them in id order. Every record is validated on the way
/// out; a record that breaks a group invariant is reported as corrupt.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
    // Serializes read-compare-write sequences; RocksDB itself has no CAS.
    write_lock: Arc<Mutex<()>>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures that the required column families ("groups" and "meta") exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_groups = ColumnFamilyDescriptor::new(CF_GROUPS, Options::default());
        let cf_meta = ColumnFamilyDescriptor::new(CF_META, Options::default());

        let db = DB::open_cf_descriptors(&opts, path, vec![cf_groups, cf_meta])?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    fn cf(&self, name: &str) -> Result<&rocksdb::ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| RoscaError::internal(format!("Column family {name} not found")))
    }

    fn read_group(&self, id: GroupId) -> Result<Option<Group>> {
        let cf = self.cf(CF_GROUPS)?;
        match self.db.get_cf(cf, id.0.to_be_bytes())? {
            Some(bytes) => decode(&bytes).map(Some),
            None => Ok(None),
        }
    }

    fn write_group(&self, group: &Group) -> Result<()> {
        let cf = self.cf(CF_GROUPS)?;
        let value = serde_json::to_vec(group)
            .map_err(|e| RoscaError::internal(format!("Serialization error: {e}")))?;
        self.db.put_cf(cf, group.id().0.to_be_bytes(), value)?;
        Ok(())
    }
}

fn decode(bytes: &[u8]) -> Result<Group> {
    // Deserializing a `Group` runs its invariant checks.
    serde_json::from_slice(bytes)
        .map_err(|e| RoscaError::internal(format!("Corrupt group record: {e}")))
}

#[async_trait]
impl GroupStore for RocksDBStore {
    async fn next_id(&self) -> Result<GroupId> {
        let _guard = self.write_lock.lock().await;
        let cf = self.cf(CF_META)?;

        let last = match self.db.get_cf(cf, LAST_GROUP_ID)? {
            Some(bytes) => {
                let raw: [u8; 8] = bytes
                    .as_slice()
                    .try_into()
                    .map_err(|_| RoscaError::internal("Corrupt group id counter"))?;
                u64::from_be_bytes(raw)
            }
            None => 0,
        };
        let next = last + 1;
        self.db.put_cf(cf, LAST_GROUP_ID, next.to_be_bytes())?;
        Ok(GroupId(next))
    }

    async fn insert(&self, group: Group) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        if self.read_group(group.id())?.is_some() {
            return Err(RoscaError::internal(format!(
                "Group {} already exists",
                group.id()
            )));
        }
        self.write_group(&group)
    }

    async fn get(&self, id: GroupId) -> Result<Option<Group>> {
        self.read_group(id)
    }

    async fn update(&self, group: Group, expected_version: u64) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let stored = self
            .read_group(group.id())?
            .ok_or(RoscaError::GroupNotFound(group.id()))?;
        if stored.version() != expected_version {
            return Err(RoscaError::ConcurrentModification {
                group: group.id(),
                expected: expected_version,
            });
        }
        self.write_group(&group)
    }

    async fn get_all(&self) -> Result<Vec<Group>> {
        let cf = self.cf(CF_GROUPS)?;
        let mut groups = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_key, value) = item?;
            groups.push(decode(&value)?);
        }
        Ok(groups)
    }
}
