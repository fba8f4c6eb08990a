//! File-backed store with atomic writes.
//!
//! One JSON record per code under `dirs::data_dir()/<namespace>/`. Filenames
//! are derived from the SHA-256 of the code value so bearer secrets never
//! appear in directory listings. Writes go through temp file + rename, so a
//! request aborted mid-consume cannot leave a half-updated record. An
//! in-process mutex serializes the load-check-mutate-save cycle; this store
//! assumes a single writing process.

use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use crate::errors::CodewardenError;
use crate::store::record::ActivationCode;
use crate::store::CodeStore;

/// Transient I/O attempts before surfacing a storage error.
const IO_ATTEMPTS: u32 = 3;

/// Base delay between I/O retries; doubled per attempt.
const IO_RETRY_DELAY: Duration = Duration::from_millis(10);

/// Directory-of-JSON-files store backend.
pub struct FileStore {
    dir: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    /// Create a store under `dirs::data_dir()/<namespace>/`.
    pub fn new(namespace: &str) -> Result<Self, CodewardenError> {
        let base_dir = dirs::data_dir()
            .ok_or_else(|| CodewardenError::StoreIo("could not find data directory".to_string()))?;
        Self::with_path(base_dir.join(namespace))
    }

    /// Create a store at an explicit directory.
    pub fn with_path(dir: PathBuf) -> Result<Self, CodewardenError> {
        fs::create_dir_all(&dir)
            .map_err(|e| CodewardenError::StoreIo(format!("failed to create store dir: {e}")))?;
        Ok(Self {
            dir,
            lock: Mutex::new(()),
        })
    }

    fn record_path(&self, code: &str) -> PathBuf {
        let hash = hash_code_value(code);
        self.dir.join(format!("{}.json", &hash[..16]))
    }

    fn load_at(&self, path: &PathBuf) -> Result<Option<ActivationCode>, CodewardenError> {
        if !path.exists() {
            return Ok(None);
        }
        let json = retrying(|| fs::read_to_string(path))
            .map_err(|e| CodewardenError::StoreIo(format!("failed to read record: {e}")))?;
        let record = serde_json::from_str(&json)
            .map_err(|e| CodewardenError::StoreIo(format!("failed to parse record: {e}")))?;
        Ok(Some(record))
    }

    /// Atomic write via temp + rename.
    fn save(&self, record: &ActivationCode) -> Result<(), CodewardenError> {
        let target = self.record_path(&record.value);
        let temp = target.with_extension("tmp");

        let json = serde_json::to_string_pretty(record)
            .map_err(|e| CodewardenError::StoreIo(format!("failed to serialize record: {e}")))?;

        retrying(|| fs::write(&temp, &json))
            .map_err(|e| CodewardenError::StoreIo(format!("failed to write temp file: {e}")))?;
        retrying(|| fs::rename(&temp, &target))
            .map_err(|e| CodewardenError::StoreIo(format!("failed to rename record: {e}")))?;
        Ok(())
    }

    fn locked(&self) -> Result<std::sync::MutexGuard<'_, ()>, CodewardenError> {
        self.lock
            .lock()
            .map_err(|_| CodewardenError::StoreIo("store lock poisoned".to_string()))
    }
}

impl CodeStore for FileStore {
    fn create(&self, record: ActivationCode) -> Result<(), CodewardenError> {
        let _guard = self.locked()?;
        if self.record_path(&record.value).exists() {
            return Err(CodewardenError::CodeExists);
        }
        self.save(&record)
    }

    fn get(&self, code: &str) -> Result<Option<ActivationCode>, CodewardenError> {
        let _guard = self.locked()?;
        self.load_at(&self.record_path(code))
    }

    fn try_consume(
        &self,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<ActivationCode, CodewardenError> {
        let _guard = self.locked()?;
        let mut record = self
            .load_at(&self.record_path(code))?
            .ok_or(CodewardenError::CodeNotFound)?;
        record.check_redeemable(now)?;
        record.mark_consumed(now);
        self.save(&record)?;
        Ok(record)
    }

    fn revoke(&self, code: &str) -> Result<(), CodewardenError> {
        let _guard = self.locked()?;
        let mut record = self
            .load_at(&self.record_path(code))?
            .ok_or(CodewardenError::CodeNotFound)?;
        record.active = false;
        self.save(&record)
    }

    fn list(&self) -> Result<Vec<ActivationCode>, CodewardenError> {
        let _guard = self.locked()?;
        let entries = fs::read_dir(&self.dir)
            .map_err(|e| CodewardenError::StoreIo(format!("failed to read store dir: {e}")))?;

        let mut records = Vec::new();
        for entry in entries {
            let entry =
                entry.map_err(|e| CodewardenError::StoreIo(format!("failed to read entry: {e}")))?;
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                if let Some(record) = self.load_at(&path)? {
                    records.push(record);
                }
            }
        }
        Ok(records)
    }
}

/// SHA-256 of a code value, hex-encoded.
///
/// Codes are bearer secrets; this is the only form in which they appear in
/// filenames and log lines.
pub fn hash_code_value(code: &str) -> String {
    hex::encode(Sha256::digest(code.as_bytes()))
}

/// Retry a transient I/O operation with bounded backoff.
fn retrying<T>(mut op: impl FnMut() -> io::Result<T>) -> io::Result<T> {
    let mut delay = IO_RETRY_DELAY;
    let mut attempt = 1;
    loop {
        match op() {
            Ok(value) => return Ok(value),
            Err(e) if attempt < IO_ATTEMPTS && e.kind() != io::ErrorKind::NotFound => {
                std::thread::sleep(delay);
                delay *= 2;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::record::UsagePolicy;
    use chrono::TimeZone;
    use std::sync::{Arc, Barrier};
    use std::thread;
    use tempfile::TempDir;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap()
    }

    fn store_in(dir: &TempDir) -> FileStore {
        FileStore::with_path(dir.path().to_path_buf()).unwrap()
    }

    fn insert(store: &FileStore, value: &str, policy: UsagePolicy) {
        store
            .create(ActivationCode::new(value.to_string(), now(), None, policy))
            .unwrap();
    }

    #[test]
    fn create_then_get_roundtrips() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        insert(&store, "K7H2PX", UsagePolicy::SingleUse);

        let record = store.get("K7H2PX").unwrap().unwrap();
        assert_eq!(record.value, "K7H2PX");
        assert!(record.active);
    }

    #[test]
    fn duplicate_create_conflicts() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        insert(&store, "K7H2PX", UsagePolicy::SingleUse);

        let result = store.create(ActivationCode::new(
            "K7H2PX".to_string(),
            now(),
            None,
            UsagePolicy::Unlimited,
        ));
        assert!(matches!(result, Err(CodewardenError::CodeExists)));
    }

    #[test]
    fn filenames_do_not_contain_the_code() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        insert(&store, "SECRETCODE", UsagePolicy::SingleUse);

        for entry in fs::read_dir(dir.path()).unwrap() {
            let name = entry.unwrap().file_name();
            assert!(!name.to_string_lossy().contains("SECRETCODE"));
        }
    }

    #[test]
    fn consumption_survives_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let store = store_in(&dir);
            insert(&store, "K7H2PX", UsagePolicy::LimitedUse(3));
            store.try_consume("K7H2PX", now()).unwrap();
        }
        {
            let store = store_in(&dir);
            let record = store.get("K7H2PX").unwrap().unwrap();
            assert_eq!(record.usage_count, 1);
            assert_eq!(record.last_used_at, Some(now()));
        }
    }

    #[test]
    fn revocation_survives_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let store = store_in(&dir);
            insert(&store, "K7H2PX", UsagePolicy::Unlimited);
            store.revoke("K7H2PX").unwrap();
        }
        {
            let store = store_in(&dir);
            assert!(matches!(
                store.try_consume("K7H2PX", now()),
                Err(CodewardenError::CodeInactive)
            ));
        }
    }

    #[test]
    fn single_use_second_consume_fails() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        insert(&store, "K7H2PX", UsagePolicy::SingleUse);

        assert!(store.try_consume("K7H2PX", now()).is_ok());
        assert!(matches!(
            store.try_consume("K7H2PX", now()),
            Err(CodewardenError::UsageExhausted)
        ));
    }

    #[test]
    fn list_returns_all_records() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        insert(&store, "AAAAAA", UsagePolicy::SingleUse);
        insert(&store, "BBBBBB", UsagePolicy::Unlimited);

        let mut values: Vec<String> = store
            .list()
            .unwrap()
            .into_iter()
            .map(|r| r.value)
            .collect();
        values.sort();
        assert_eq!(values, vec!["AAAAAA", "BBBBBB"]);
    }

    #[test]
    fn corrupt_record_surfaces_store_error() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        insert(&store, "K7H2PX", UsagePolicy::SingleUse);

        let path = store.record_path("K7H2PX");
        fs::write(&path, "not json").unwrap();

        assert!(matches!(
            store.get("K7H2PX"),
            Err(CodewardenError::StoreIo(_))
        ));
    }

    #[test]
    fn concurrent_single_use_has_exactly_one_winner() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(store_in(&dir));
        insert(&store, "RACE01", UsagePolicy::SingleUse);

        let threads = 8;
        let barrier = Arc::new(Barrier::new(threads));
        let mut handles = Vec::with_capacity(threads);
        for _ in 0..threads {
            let store = Arc::clone(&store);
            let barrier = Arc::clone(&barrier);
            handles.push(thread::spawn(move || {
                barrier.wait();
                store.try_consume("RACE01", now()).is_ok()
            }));
        }

        let wins = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(wins, 1);
    }
}
