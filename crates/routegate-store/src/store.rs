//! The session store: the four session markers as one logical unit.
//!
//! [`SessionStore`] is the seam the rest of Routegate is written against.
//! The evaluator and guard never touch storage keys directly; they read a
//! whole [`SessionRecord`], write a whole record, or clear it.
//!
//! [`KvSessionStore`] is the implementation over any [`KeyValueStorage`],
//! using the canonical key layout in [`keys`].

use std::sync::Arc;

use crate::{
    CachedUser, KeyValueStorage, SessionRecord, StoreError, StoredTimestamp,
};

/// Storage keys of the canonical layout.
pub mod keys {
    /// The opaque bearer token.
    pub const ACCESS_TOKEN: &str = "access_token";
    /// Issue time, decimal epoch milliseconds.
    pub const TOKEN_TIMESTAMP: &str = "token_timestamp";
    /// Last confirmed-valid navigation, decimal epoch milliseconds.
    pub const LAST_ACTIVITY: &str = "last_activity";
    /// Cached user profile as JSON.
    pub const USER: &str = "user";
    /// Token-only key written by older builds. Removed on open.
    pub const LEGACY_AUTH_TOKEN: &str = "auth_token";

    /// Every key owned by a session, cleared together.
    pub const ALL: [&str; 4] = [ACCESS_TOKEN, TOKEN_TIMESTAMP, LAST_ACTIVITY, USER];
}

/// Reads, writes, and clears the persisted session as one unit.
///
/// # Trait bounds
///
/// `Send + Sync + 'static` because a single store is shared (behind an
/// `Arc`) by every in-flight navigation.
pub trait SessionStore: Send + Sync + 'static {
    /// Returns the stored session, or `None` if any required marker is
    /// missing.
    fn read(&self) -> Result<Option<SessionRecord>, StoreError>;

    /// Replaces the stored session with `record`.
    fn write(&self, record: &SessionRecord) -> Result<(), StoreError>;

    /// Removes every session marker.
    fn clear(&self) -> Result<(), StoreError>;
}

/// Lets callers keep an `Arc<S>` and still pass it where a store is expected.
impl<S: SessionStore> SessionStore for Arc<S> {
    fn read(&self) -> Result<Option<SessionRecord>, StoreError> {
        (**self).read()
    }

    fn write(&self, record: &SessionRecord) -> Result<(), StoreError> {
        (**self).write(record)
    }

    fn clear(&self) -> Result<(), StoreError> {
        (**self).clear()
    }
}

// ---------------------------------------------------------------------------
// KvSessionStore
// ---------------------------------------------------------------------------

/// A [`SessionStore`] laid out over a flat string map.
#[derive(Debug)]
pub struct KvSessionStore<K: KeyValueStorage> {
    storage: K,
}

impl<K: KeyValueStorage> KvSessionStore<K> {
    /// Wraps `storage`, migrating away from the legacy layout first.
    ///
    /// Older builds kept only `auth_token`, with no timestamps. Such a token
    /// can never pass the expiry checks, so it is dropped and the user logs
    /// in again.
    ///
    /// # Errors
    /// Propagates storage failures from the migration.
    pub fn open(storage: K) -> Result<Self, StoreError> {
        if storage.get(keys::LEGACY_AUTH_TOKEN)?.is_some() {
            storage.remove_many(&[keys::LEGACY_AUTH_TOKEN])?;
            tracing::warn!("discarded legacy auth_token without timestamps");
        }
        Ok(Self { storage })
    }

    /// The underlying storage medium.
    pub fn storage(&self) -> &K {
        &self.storage
    }
}

impl<K: KeyValueStorage> SessionStore for KvSessionStore<K> {
    fn read(&self) -> Result<Option<SessionRecord>, StoreError> {
        let mut values = self.storage.snapshot(&keys::ALL)?.into_iter();
        // Order matches `keys::ALL`.
        let (Some(token), Some(issued_at), Some(last_activity), user) = (
            values.next().flatten(),
            values.next().flatten(),
            values.next().flatten(),
            values.next().flatten(),
        ) else {
            return Ok(None);
        };

        if token.is_empty() {
            return Ok(None);
        }

        let user = user.and_then(|raw| match serde_json::from_str::<CachedUser>(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::warn!(error = %e, "ignoring unreadable cached user");
                None
            }
        });

        Ok(Some(SessionRecord {
            token,
            issued_at: StoredTimestamp::raw(issued_at),
            last_activity: StoredTimestamp::raw(last_activity),
            user,
        }))
    }

    fn write(&self, record: &SessionRecord) -> Result<(), StoreError> {
        // Keep last_activity >= issued_at whenever both are numbers.
        let last_activity = match (record.issued_at.parse(), record.last_activity.parse()) {
            (Some(issued), Some(last)) if last < issued => StoredTimestamp::from(issued),
            _ => record.last_activity.clone(),
        };

        let mut entries = vec![
            (keys::ACCESS_TOKEN, record.token.clone()),
            (keys::TOKEN_TIMESTAMP, record.issued_at.as_str().to_string()),
            (keys::LAST_ACTIVITY, last_activity.as_str().to_string()),
        ];

        // A stale profile from a previous login must not survive.
        let mut removals: Vec<&str> = Vec::new();
        match &record.user {
            Some(user) => {
                let json = serde_json::to_string(user).map_err(StoreError::Serialize)?;
                entries.push((keys::USER, json));
            }
            None => removals.push(keys::USER),
        }
        self.storage.apply(&entries, &removals)
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.storage.remove_many(&keys::ALL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EpochMillis, MemoryStorage};

    fn store() -> KvSessionStore<MemoryStorage> {
        KvSessionStore::open(MemoryStorage::new()).unwrap()
    }

    fn admin() -> CachedUser {
        CachedUser::new("root", "admin")
    }

    // =====================================================================
    // read()
    // =====================================================================

    #[test]
    fn test_read_empty_store_returns_none() {
        assert_eq!(store().read().unwrap(), None);
    }

    #[test]
    fn test_read_partial_triple_returns_none() {
        // Token without timestamps is an absent session, not a half-valid one.
        let store = store();
        store
            .storage()
            .set_many(&[
                (keys::ACCESS_TOKEN, "tok".to_string()),
                (keys::TOKEN_TIMESTAMP, "1".to_string()),
            ])
            .unwrap();

        assert_eq!(store.read().unwrap(), None);
    }

    #[test]
    fn test_read_empty_token_returns_none() {
        let store = store();
        store
            .storage()
            .set_many(&[
                (keys::ACCESS_TOKEN, String::new()),
                (keys::TOKEN_TIMESTAMP, "1".to_string()),
                (keys::LAST_ACTIVITY, "1".to_string()),
            ])
            .unwrap();

        assert_eq!(store.read().unwrap(), None);
    }

    #[test]
    fn test_read_keeps_malformed_timestamp_raw() {
        let store = store();
        store
            .storage()
            .set_many(&[
                (keys::ACCESS_TOKEN, "tok".to_string()),
                (keys::TOKEN_TIMESTAMP, "yesterday".to_string()),
                (keys::LAST_ACTIVITY, "5".to_string()),
            ])
            .unwrap();

        let rec = store.read().unwrap().expect("triple is present");
        assert_eq!(rec.issued_at.as_str(), "yesterday");
        assert_eq!(rec.issued_at.parse(), None);
    }

    #[test]
    fn test_read_unreadable_user_yields_none_user() {
        let store = store();
        store
            .write(&SessionRecord::issued("tok", EpochMillis(1), None))
            .unwrap();
        store
            .storage()
            .set_many(&[(keys::USER, "{not json".to_string())])
            .unwrap();

        let rec = store.read().unwrap().unwrap();
        assert_eq!(rec.user, None);
        assert_eq!(rec.token, "tok");
    }

    // =====================================================================
    // write()
    // =====================================================================

    #[test]
    fn test_write_then_read_returns_record() {
        let store = store();
        let rec = SessionRecord::issued("tok", EpochMillis(1_000), Some(admin()));

        store.write(&rec).unwrap();

        assert_eq!(store.read().unwrap(), Some(rec));
    }

    #[test]
    fn test_write_clamps_last_activity_to_issued_at() {
        let store = store();
        let rec = SessionRecord::issued("tok", EpochMillis(1_000), None)
            .with_last_activity(EpochMillis(500));

        store.write(&rec).unwrap();

        let read = store.read().unwrap().unwrap();
        assert_eq!(read.last_activity.parse(), Some(EpochMillis(1_000)));
    }

    #[test]
    fn test_write_without_user_drops_previous_user() {
        let store = store();
        store
            .write(&SessionRecord::issued("a", EpochMillis(1), Some(admin())))
            .unwrap();

        store
            .write(&SessionRecord::issued("b", EpochMillis(2), None))
            .unwrap();

        assert_eq!(store.read().unwrap().unwrap().user, None);
        assert_eq!(store.storage().get(keys::USER).unwrap(), None);
    }

    // =====================================================================
    // clear() / open()
    // =====================================================================

    #[test]
    fn test_clear_removes_all_markers() {
        let store = store();
        store
            .write(&SessionRecord::issued("tok", EpochMillis(1), Some(admin())))
            .unwrap();

        store.clear().unwrap();

        assert_eq!(store.read().unwrap(), None);
        assert!(store.storage().is_empty());
    }

    #[test]
    fn test_open_discards_legacy_token() {
        let storage = MemoryStorage::new();
        storage
            .set_many(&[(keys::LEGACY_AUTH_TOKEN, "old".to_string())])
            .unwrap();

        let store = KvSessionStore::open(storage).unwrap();

        assert_eq!(store.storage().get(keys::LEGACY_AUTH_TOKEN).unwrap(), None);
        assert_eq!(store.read().unwrap(), None);
    }

    #[test]
    fn test_arc_store_delegates() {
        let store = Arc::new(store());
        let rec = SessionRecord::issued("tok", EpochMillis(7), None);

        SessionStore::write(&store, &rec).unwrap();

        assert_eq!(SessionStore::read(&store).unwrap(), Some(rec));
    }
}
