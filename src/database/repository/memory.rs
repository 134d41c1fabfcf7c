//! In-memory prefix store for tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::Mutex;

use super::PrefixStore;
use crate::database::models::{CustomPrefix, GuildBotId, PrefixRecord};
use crate::error::PrefixError;

#[derive(Clone, Default)]
pub struct MemoryPrefixStore {
    records: Arc<Mutex<HashMap<GuildBotId, PrefixRecord>>>,
    reads: Arc<AtomicUsize>,
    writes: Arc<AtomicUsize>,
    pub fail_reads: Arc<AtomicBool>,
    pub fail_writes: Arc<AtomicBool>,
}

impl MemoryPrefixStore {
    pub fn insert(&self, key: GuildBotId, prefix: Option<&str>) {
        let mut record = PrefixRecord::new(key);
        record.prefix = prefix.map(str::to_string);
        self.records.lock().insert(key, record);
    }

    pub fn stored(&self, key: GuildBotId) -> Option<PrefixRecord> {
        self.records.lock().get(&key).cloned()
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl PrefixStore for MemoryPrefixStore {
    async fn load_prefix(&self, key: GuildBotId) -> Result<CustomPrefix, PrefixError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(PrefixError::Unavailable("read refused".to_string()));
        }
        Ok(self
            .records
            .lock()
            .get(&key)
            .map(PrefixRecord::custom_prefix)
            .unwrap_or_default())
    }

    async fn update_prefix<F>(&self, key: GuildBotId, mutate: F) -> Result<(), PrefixError>
    where
        F: FnOnce(&mut PrefixRecord) + Send,
    {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(PrefixError::Unavailable("write refused".to_string()));
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        let mut records = self.records.lock();
        let record = records.entry(key).or_insert_with(|| PrefixRecord::new(key));
        mutate(record);
        Ok(())
    }
}
