//! In-memory store backend.
//!
//! The map mutex is the atomicity mechanism: redeemability check and
//! counter increment happen under one lock acquisition, which rules out the
//! read-then-write TOCTOU race between concurrent redeemers.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use crate::errors::CodewardenError;
use crate::store::record::ActivationCode;
use crate::store::CodeStore;

/// Map-backed store. State is lost on process exit.
#[derive(Default)]
pub struct MemoryStore {
    codes: Mutex<HashMap<String, ActivationCode>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn locked(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<String, ActivationCode>>, CodewardenError> {
        self.codes
            .lock()
            .map_err(|_| CodewardenError::StoreIo("store lock poisoned".to_string()))
    }
}

impl CodeStore for MemoryStore {
    fn create(&self, record: ActivationCode) -> Result<(), CodewardenError> {
        let mut codes = self.locked()?;
        if codes.contains_key(&record.value) {
            return Err(CodewardenError::CodeExists);
        }
        codes.insert(record.value.clone(), record);
        Ok(())
    }

    fn get(&self, code: &str) -> Result<Option<ActivationCode>, CodewardenError> {
        Ok(self.locked()?.get(code).cloned())
    }

    fn try_consume(
        &self,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<ActivationCode, CodewardenError> {
        let mut codes = self.locked()?;
        let record = codes.get_mut(code).ok_or(CodewardenError::CodeNotFound)?;
        record.check_redeemable(now)?;
        record.mark_consumed(now);
        Ok(record.clone())
    }

    fn revoke(&self, code: &str) -> Result<(), CodewardenError> {
        let mut codes = self.locked()?;
        let record = codes.get_mut(code).ok_or(CodewardenError::CodeNotFound)?;
        record.active = false;
        Ok(())
    }

    fn list(&self) -> Result<Vec<ActivationCode>, CodewardenError> {
        Ok(self.locked()?.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::record::UsagePolicy;
    use chrono::TimeZone;
    use std::sync::{Arc, Barrier};
    use std::thread;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap()
    }

    fn insert(store: &MemoryStore, value: &str, policy: UsagePolicy) {
        store
            .create(ActivationCode::new(value.to_string(), now(), None, policy))
            .unwrap();
    }

    #[test]
    fn create_then_get_roundtrips() {
        let store = MemoryStore::new();
        insert(&store, "K7H2PX", UsagePolicy::SingleUse);
        let record = store.get("K7H2PX").unwrap().unwrap();
        assert_eq!(record.value, "K7H2PX");
        assert_eq!(record.usage_count, 0);
    }

    #[test]
    fn duplicate_create_conflicts() {
        let store = MemoryStore::new();
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
    fn get_missing_returns_none() {
        let store = MemoryStore::new();
        assert!(store.get("BOGUS1").unwrap().is_none());
    }

    #[test]
    fn consume_missing_is_not_found() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.try_consume("BOGUS1", now()),
            Err(CodewardenError::CodeNotFound)
        ));
    }

    #[test]
    fn single_use_consumes_exactly_once() {
        let store = MemoryStore::new();
        insert(&store, "K7H2PX", UsagePolicy::SingleUse);

        let consumed = store.try_consume("K7H2PX", now()).unwrap();
        assert_eq!(consumed.usage_count, 1);
        assert_eq!(consumed.last_used_at, Some(now()));

        assert!(matches!(
            store.try_consume("K7H2PX", now()),
            Err(CodewardenError::UsageExhausted)
        ));
    }

    #[test]
    fn revoke_is_idempotent_and_blocks_consume() {
        let store = MemoryStore::new();
        insert(&store, "K7H2PX", UsagePolicy::Unlimited);

        store.revoke("K7H2PX").unwrap();
        store.revoke("K7H2PX").unwrap();

        assert!(matches!(
            store.try_consume("K7H2PX", now()),
            Err(CodewardenError::CodeInactive)
        ));
    }

    #[test]
    fn revoke_unknown_is_not_found() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.revoke("BOGUS1"),
            Err(CodewardenError::CodeNotFound)
        ));
    }

    #[test]
    fn list_returns_all_records() {
        let store = MemoryStore::new();
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
    fn concurrent_single_use_has_exactly_one_winner() {
        let store = Arc::new(MemoryStore::new());
        insert(&store, "RACE01", UsagePolicy::SingleUse);

        let threads = 16;
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
        assert_eq!(store.get("RACE01").unwrap().unwrap().usage_count, 1);
    }

    #[test]
    fn concurrent_limited_use_wins_exactly_n_times() {
        let store = Arc::new(MemoryStore::new());
        insert(&store, "RACE05", UsagePolicy::LimitedUse(5));

        let threads = 16;
        let barrier = Arc::new(Barrier::new(threads));
        let mut handles = Vec::with_capacity(threads);
        for _ in 0..threads {
            let store = Arc::clone(&store);
            let barrier = Arc::clone(&barrier);
            handles.push(thread::spawn(move || {
                barrier.wait();
                store.try_consume("RACE05", now()).is_ok()
            }));
        }

        let wins = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(wins, 5);
        assert_eq!(store.get("RACE05").unwrap().unwrap().usage_count, 5);
    }
}
