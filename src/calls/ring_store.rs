//! Persistence of group ring state, keyed by ring id.
//!
//! A ring is only rung once per device: the record survives restarts so a
//! late duplicate `Requested` update is recognized.

use super::error::RingStoreError;
use async_trait::async_trait;
use callcore::types::GroupRingRecord;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::{Mutex, mpsc};

const TAG: &str = "calling_rust::calls::ring_store";

pub type Result<T> = std::result::Result<T, RingStoreError>;

#[async_trait]
pub trait RingStore: Send + Sync {
    async fn get_ring(&self, ring_id: i64) -> Result<Option<GroupRingRecord>>;

    /// Inserts the record or replaces the one with the same ring id.
    async fn insert_or_update_ring(&self, record: GroupRingRecord) -> Result<()>;

    async fn all_rings(&self) -> Result<Vec<GroupRingRecord>>;

    /// Drops rings whose timestamp is before `timestamp`; returns how many went.
    async fn remove_older_than(&self, timestamp: i64) -> Result<usize>;
}

#[derive(Default)]
pub struct MemoryRingStore {
    rings: Mutex<HashMap<i64, GroupRingRecord>>,
}

impl MemoryRingStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RingStore for MemoryRingStore {
    async fn get_ring(&self, ring_id: i64) -> Result<Option<GroupRingRecord>> {
        Ok(self.rings.lock().await.get(&ring_id).copied())
    }

    async fn insert_or_update_ring(&self, record: GroupRingRecord) -> Result<()> {
        self.rings.lock().await.insert(record.ring_id, record);
        Ok(())
    }

    async fn all_rings(&self) -> Result<Vec<GroupRingRecord>> {
        Ok(sorted(self.rings.lock().await.values().copied().collect()))
    }

    async fn remove_older_than(&self, timestamp: i64) -> Result<usize> {
        let mut rings = self.rings.lock().await;
        let before = rings.len();
        rings.retain(|_, record| record.timestamp >= timestamp);
        Ok(before - rings.len())
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct RingDocument {
    rings: Vec<GroupRingRecord>,
}

/// Keeps every ring in one JSON document, rewritten on each change.
pub struct FileRingStore {
    path: PathBuf,
    rings: Mutex<HashMap<i64, GroupRingRecord>>,
}

impl FileRingStore {
    /// Opens the document at `path`, starting empty if it does not exist yet.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).await?;
        }

        let document = read_json::<RingDocument>(&path).await?.unwrap_or_default();
        let rings = document
            .rings
            .into_iter()
            .map(|record| (record.ring_id, record))
            .collect();

        Ok(Self {
            path,
            rings: Mutex::new(rings),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, rings: &HashMap<i64, GroupRingRecord>) -> Result<()> {
        let document = RingDocument {
            rings: sorted(rings.values().copied().collect()),
        };
        write_json(&self.path, &document).await
    }
}

#[async_trait]
impl RingStore for FileRingStore {
    async fn get_ring(&self, ring_id: i64) -> Result<Option<GroupRingRecord>> {
        Ok(self.rings.lock().await.get(&ring_id).copied())
    }

    async fn insert_or_update_ring(&self, record: GroupRingRecord) -> Result<()> {
        let mut rings = self.rings.lock().await;
        if rings.get(&record.ring_id) == Some(&record) {
            return Ok(());
        }
        rings.insert(record.ring_id, record);
        self.persist(&rings).await
    }

    async fn all_rings(&self) -> Result<Vec<GroupRingRecord>> {
        Ok(sorted(self.rings.lock().await.values().copied().collect()))
    }

    async fn remove_older_than(&self, timestamp: i64) -> Result<usize> {
        let mut rings = self.rings.lock().await;
        let before = rings.len();
        rings.retain(|_, record| record.timestamp >= timestamp);
        let removed = before - rings.len();
        if removed > 0 {
            self.persist(&rings).await?;
        }
        Ok(removed)
    }
}

/// A change to the persisted rings, queued by the interactor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RingWrite {
    Upsert(GroupRingRecord),
    /// Drop every ring stamped before this instant.
    Prune { before: i64 },
}

/// Applies queued writes one at a time in queue order; returns once every
/// sender is gone and the queue is drained.
pub(crate) async fn write_rings(
    store: Arc<dyn RingStore>,
    mut writes: mpsc::UnboundedReceiver<RingWrite>,
) {
    while let Some(write) = writes.recv().await {
        match write {
            RingWrite::Upsert(record) => {
                if let Err(e) = store.insert_or_update_ring(record).await {
                    warn!(target: TAG, "Failed to persist ring {}: {e}", record.ring_id);
                }
            }
            RingWrite::Prune { before } => match store.remove_older_than(before).await {
                Ok(removed) => debug!(target: TAG, "Pruned {removed} rings before {before}"),
                Err(e) => warn!(target: TAG, "Failed to prune rings before {before}: {e}"),
            },
        }
    }
    debug!(target: TAG, "Ring writer drained");
}

fn sorted(mut records: Vec<GroupRingRecord>) -> Vec<GroupRingRecord> {
    records.sort_by_key(|record| record.ring_id);
    records
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match fs::read(path).await {
        Ok(data) => serde_json::from_slice(&data)
            .map(Some)
            .map_err(|e| RingStoreError::Serialization(e.to_string())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(RingStoreError::Io(e)),
    }
}

async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let data = serde_json::to_vec_pretty(value)
        .map_err(|e| RingStoreError::Serialization(e.to_string()))?;
    fs::write(path, data).await.map_err(RingStoreError::Io)
}
